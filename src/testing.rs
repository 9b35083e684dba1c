//! Scripted I2C bus and IRQ pin used by the driver tests.

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation, SevenBitAddress};

use crate::common::TD_STATUS_ADDR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BusError;

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// A fake FT6x36.
///
/// Reads of `TD_STATUS` are served from a queue of packets (`None` fails the
/// read); once the queue is empty they report no touch. Every other register is
/// served from a flat register file.
pub(crate) struct FakeBus {
    pub(crate) registers: [u8; 256],
    pub(crate) packets: VecDeque<Option<[u8; 5]>>,
    /// Registers whose reads fail.
    pub(crate) failing: Vec<u8>,
    /// Every read as `(address, register, length)`.
    pub(crate) reads: Vec<(u8, u8, usize)>,
}

impl FakeBus {
    pub(crate) fn new() -> Self {
        Self {
            registers: [0; 256],
            packets: VecDeque::new(),
            failing: Vec::new(),
            reads: Vec::new(),
        }
    }

    pub(crate) fn with_packets<const N: usize>(packets: [[u8; 5]; N]) -> Self {
        let mut bus = Self::new();
        bus.packets.extend(packets.into_iter().map(Some));
        bus
    }

    pub(crate) fn packet_reads(&self) -> usize {
        self.reads
            .iter()
            .filter(|(_, reg, _)| *reg == TD_STATUS_ADDR)
            .count()
    }

    fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), BusError> {
        let mut register = 0u8;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some(first) = bytes.first() {
                        register = *first;
                    }
                }
                Operation::Read(buf) => {
                    self.reads.push((address, register, buf.len()));
                    if self.failing.contains(&register) {
                        return Err(BusError);
                    }
                    if register == TD_STATUS_ADDR && buf.len() == 5 {
                        match self.packets.pop_front().unwrap_or(Some([0; 5])) {
                            Some(packet) => buf.copy_from_slice(&packet),
                            None => return Err(BusError),
                        }
                    } else {
                        let start = register as usize;
                        for (i, byte) in buf.iter_mut().enumerate() {
                            *byte = self.registers[(start + i) % 256];
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl i2c::ErrorType for FakeBus {
    type Error = BusError;
}

impl i2c::I2c<SevenBitAddress> for FakeBus {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}

impl embedded_hal_async::i2c::I2c<SevenBitAddress> for FakeBus {
    async fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}

/// An IRQ line that is always asserted, or always broken.
pub(crate) struct FakeIrq {
    pub(crate) broken: bool,
    pub(crate) edges: usize,
}

impl FakeIrq {
    pub(crate) fn new() -> Self {
        Self {
            broken: false,
            edges: 0,
        }
    }

    fn edge(&mut self) -> Result<(), BusError> {
        if self.broken {
            return Err(BusError);
        }
        self.edges += 1;
        Ok(())
    }
}

impl embedded_hal::digital::Error for BusError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::digital::ErrorType for FakeIrq {
    type Error = BusError;
}

impl embedded_hal_async::digital::Wait for FakeIrq {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.edge()
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        self.edge()
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.edge()
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.edge()
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        self.edge()
    }
}
