use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
use embedded_hal_async::{
    digital::Wait,
    i2c::{I2c, SevenBitAddress},
};

use crate::{
    common::{
        self, Session, GEST_ID_ADDR, ID_REGISTERS, ID_REGISTER_COUNT, PACKET_LEN, TD_STATUS_ADDR,
    },
    Config, DeviceInfo, DriverError, GestureType, PointerData, TouchInput, TouchMailbox,
};

/// An FT6x36 device.
///
/// This struct contains the async interface to the FT6x36 device. It decodes
/// exactly like [`crate::FT6x36`], and can additionally wait on the interrupt line.
pub struct FT6x36Async<'a, I2C, P, M: RawMutex = NoopRawMutex> {
    i2c: I2C,
    irq_pin: Option<P>,
    session: Session<'a, M>,
}

impl<'a, I2C: I2c<SevenBitAddress>, P: Wait> FT6x36Async<'a, I2C, P> {
    pub fn new(i2c: I2C, config: Config) -> Self {
        Self {
            i2c,
            irq_pin: None,
            session: Session::new(config),
        }
    }
}

impl<'a, I2C: I2c<SevenBitAddress>, P: Wait, M: RawMutex> FT6x36Async<'a, I2C, P, M> {
    /// Set the IRQ pin.
    ///
    /// Use before calling [`FT6x36Async::wait_for_touch`].
    pub fn with_irq_pin(mut self, pin: P) -> Self {
        self.irq_pin = Some(pin);
        self
    }

    /// Attach the mailbox that receives every published sample.
    ///
    /// It is only used when [`Config::enable_notification_channel`] is set, and
    /// must be attached before [`FT6x36Async::init`].
    pub fn with_mailbox<N: RawMutex>(
        self,
        mailbox: &'a TouchMailbox<N>,
    ) -> FT6x36Async<'a, I2C, P, N> {
        FT6x36Async {
            i2c: self.i2c,
            irq_pin: self.irq_pin,
            session: self.session.with_mailbox(mailbox),
        }
    }

    /// Open the session with the device at `address` and read its identification
    /// registers.
    ///
    /// See [`crate::FT6x36::init`].
    pub async fn init(&mut self, address: u8) -> Result<DeviceInfo, DriverError<I2C::Error>> {
        self.session.begin(address);

        let mut ids = [None; ID_REGISTER_COUNT];
        for (id, (reg, name)) in ids.iter_mut().zip(ID_REGISTERS) {
            let mut buf = [0u8; 1];
            let read = self
                .i2c
                .write_read(address, &[reg], &mut buf)
                .await
                .map(|()| buf[0]);
            *id = common::id_register_from_read(name, read);
        }

        self.session.finish_init(ids)
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_initialized()
    }

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

    /// Wait for the next touch interrupt, then poll.
    ///
    /// If the IRQ pin isn't set, this will return [`DriverError::IrqPinNotSet`].
    /// Set the IRQ pin with [`FT6x36Async::with_irq_pin`].
    pub async fn wait_for_touch(&mut self) -> Result<TouchInput, DriverError<I2C::Error>> {
        let Some(ref mut irq_pin) = self.irq_pin else {
            return Err(DriverError::IrqPinNotSet);
        };

        irq_pin
            .wait_for_falling_edge()
            .await
            .map_err(|_| DriverError::IrqError)?;
        Ok(self.poll().await)
    }

    /// Read the raw gesture ID. See [`crate::FT6x36::gesture_id`].
    pub async fn gesture_id(&mut self) -> u8 {
        if !self.session.ready() {
            return 0x00;
        }

        let mut buf = [0u8; 1];
        if let Err(_err) = self
            .i2c
            .write_read(self.session.address, &[GEST_ID_ADDR], &mut buf)
            .await
        {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Error reading from device: {}",
                defmt::Debug2Format(&_err)
            );
        }
        buf[0]
    }

    pub async fn gesture(&mut self) -> GestureType {
        GestureType::from(self.gesture_id().await)
    }

    /// Read the touch status and update the retained sample.
    /// See [`crate::FT6x36::poll`].
    pub async fn poll(&mut self) -> TouchInput {
        if !self.session.ready() {
            return self.session.sample();
        }

        let read = self.read_packet().await;
        self.session.update(read)
    }

    /// Poll and fill in the pointer record. Always returns false.
    pub async fn read_into(&mut self, data: &mut PointerData) -> bool {
        *data = self.poll().await.into();
        false
    }

    /// Read a byte from any register.
    /// Provided as a catch-all for missing api.
    pub async fn read_register(&mut self, reg: u8) -> Result<u8, DriverError<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.read_register_multivalue(reg, &mut buf).await?;
        Ok(buf[0])
    }

    /// Read multiple bytes starting at any register.
    /// Provided as a catch-all for missing api.
    pub async fn read_register_multivalue(
        &mut self,
        reg: u8,
        buf: &mut [u8],
    ) -> Result<(), DriverError<I2C::Error>> {
        if !self.session.ready() {
            return Err(DriverError::NotInitialized);
        }
        self.i2c
            .write_read(self.session.address, &[reg], buf)
            .await?;
        Ok(())
    }

    /// Safely clean up the device, returning any owned peripherals.
    pub fn destroy(self) -> (I2C, Option<P>) {
        (self.i2c, self.irq_pin)
    }

    async fn read_packet(&mut self) -> Result<[u8; PACKET_LEN], DriverError<I2C::Error>> {
        let mut buf = [0u8; PACKET_LEN];
        self.i2c
            .write_read(self.session.address, &[TD_STATUS_ADDR], &mut buf)
            .await?;
        Ok(buf)
    }
}
