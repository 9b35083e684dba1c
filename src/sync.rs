use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::{
    common::{
        self, Session, GEST_ID_ADDR, ID_REGISTERS, ID_REGISTER_COUNT, PACKET_LEN, TD_STATUS_ADDR,
    },
    Config, DeviceInfo, DriverError, GestureType, PointerData, TouchInput, TouchMailbox,
};

/// An FT6x36 device.
///
/// This struct contains the blocking interface to the FT6x36 device. Call
/// [`FT6x36::init`] once, then [`FT6x36::poll`] at the cadence of your input layer.
pub struct FT6x36<'a, I2C, M: RawMutex = NoopRawMutex> {
    i2c: I2C,
    session: Session<'a, M>,
}

impl<'a, I2C: I2c<SevenBitAddress>> FT6x36<'a, I2C> {
    pub fn new(i2c: I2C, config: Config) -> Self {
        Self {
            i2c,
            session: Session::new(config),
        }
    }
}

impl<'a, I2C: I2c<SevenBitAddress>, M: RawMutex> FT6x36<'a, I2C, M> {
    /// Attach the mailbox that receives every published sample.
    ///
    /// It is only used when [`Config::enable_notification_channel`] is set, and
    /// must be attached before [`FT6x36::init`].
    pub fn with_mailbox<N: RawMutex>(self, mailbox: &'a TouchMailbox<N>) -> FT6x36<'a, I2C, N> {
        FT6x36 {
            i2c: self.i2c,
            session: self.session.with_mailbox(mailbox),
        }
    }

    /// Open the session with the device at `address` and read its identification
    /// registers.
    ///
    /// Identification read failures are logged and never fatal. The only error is
    /// [`DriverError::MailboxUnavailable`], in which case the driver is still
    /// initialized and polls normally without notifications.
    pub fn init(&mut self, address: u8) -> Result<DeviceInfo, DriverError<I2C::Error>> {
        self.session.begin(address);

        let mut ids = [None; ID_REGISTER_COUNT];
        for (id, (reg, name)) in ids.iter_mut().zip(ID_REGISTERS) {
            let mut buf = [0u8; 1];
            let read = self.i2c.write_read(address, &[reg], &mut buf).map(|()| buf[0]);
            *id = common::id_register_from_read(name, read);
        }

        self.session.finish_init(ids)
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_initialized()
    }

    /// The identification registers read by the last [`FT6x36::init`].
    pub fn device_info(&self) -> DeviceInfo {
        self.session.info()
    }

    pub fn config(&self) -> &Config {
        &self.session.config
    }

    /// The retained sample, without touching the bus.
    pub fn last_input(&self) -> TouchInput {
        self.session.sample()
    }

    /// Read the raw gesture ID.
    ///
    /// Returns `0x00` without touching the bus if the driver is not initialized.
    /// A failed read is logged and yields `0x00` as well.
    pub fn gesture_id(&mut self) -> u8 {
        if !self.session.ready() {
            return 0x00;
        }

        let mut buf = [0u8; 1];
        if let Err(_err) = self
            .i2c
            .write_read(self.session.address, &[GEST_ID_ADDR], &mut buf)
        {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Error reading from device: {}",
                defmt::Debug2Format(&_err)
            );
        }
        buf[0]
    }

    /// Read the gesture ID as a [`GestureType`].
    pub fn gesture(&mut self) -> GestureType {
        GestureType::from(self.gesture_id())
    }

    /// Read the touch status and update the retained sample.
    ///
    /// Only a report with exactly one touch point counts as a press. Anything
    /// else, including a failed read, releases a pressed sample and keeps the last
    /// coordinates.
    pub fn poll(&mut self) -> TouchInput {
        if !self.session.ready() {
            return self.session.sample();
        }

        let read = self.read_packet();
        self.session.update(read)
    }

    /// Poll and fill in the pointer record.
    ///
    /// Always returns false: there is never more than one buffered sample.
    pub fn read_into(&mut self, data: &mut PointerData) -> bool {
        *data = self.poll().into();
        false
    }

    /// Read a byte from any register.
    /// Provided as a catch-all for missing api.
    pub fn read_register(&mut self, reg: u8) -> Result<u8, DriverError<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.read_register_multivalue(reg, &mut buf)?;
        Ok(buf[0])
    }

    /// Read multiple bytes starting at any register.
    /// Provided as a catch-all for missing api.
    pub fn read_register_multivalue(
        &mut self,
        reg: u8,
        buf: &mut [u8],
    ) -> Result<(), DriverError<I2C::Error>> {
        if !self.session.ready() {
            return Err(DriverError::NotInitialized);
        }
        self.i2c.write_read(self.session.address, &[reg], buf)?;
        Ok(())
    }

    /// Safely clean up the device, returning any owned peripherals.
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    fn read_packet(&mut self) -> Result<[u8; PACKET_LEN], DriverError<I2C::Error>> {
        // TD_STATUS, P1_XH, P1_XL, P1_YH, P1_YL
        let mut buf = [0u8; PACKET_LEN];
        self.i2c
            .write_read(self.session.address, &[TD_STATUS_ADDR], &mut buf)?;
        Ok(buf)
    }
}
