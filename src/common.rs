//! Common helper functions and constants.
//!
//! This module holds the register map, the packet decoding and the session state
//! shared by both sync and async drivers. The drivers only perform the bus reads.

use core::fmt::Debug;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::{Config, DeviceInfo, DriverError, TouchInput, TouchMailbox, TouchState};

// Register addresses
pub(crate) const DEV_MODE_ADDR: u8 = 0x00;
pub(crate) const GEST_ID_ADDR: u8 = 0x01;
pub(crate) const TD_STATUS_ADDR: u8 = 0x02;
pub(crate) const CHIP_ID_ADDR: u8 = 0xA3;
pub(crate) const FIRMWARE_ID_ADDR: u8 = 0xA6;
pub(crate) const PANEL_ID_ADDR: u8 = 0xA8;
pub(crate) const RELEASE_CODE_ADDR: u8 = 0xAF;

/// `TD_STATUS` followed by `P1_XH`, `P1_XL`, `P1_YH` and `P1_YL`.
pub(crate) const PACKET_LEN: usize = 5;

pub(crate) const ID_REGISTER_COUNT: usize = 5;

/// Identification registers read during init, in the order they are reported.
pub(crate) const ID_REGISTERS: [(u8, &str); ID_REGISTER_COUNT] = [
    (PANEL_ID_ADDR, "Device ID"),
    (CHIP_ID_ADDR, "Chip ID"),
    (DEV_MODE_ADDR, "Device mode"),
    (FIRMWARE_ID_ADDR, "Firmware ID"),
    (RELEASE_CODE_ADDR, "Release code"),
];

/// High bits of a coordinate kept from the `Pn_XH`/`Pn_YH` registers.
const COORD_MSB_MASK: u8 = 0x3F;

/// State owned by one driver instance: the device session, the retained sample
/// and the optional mailbox.
pub(crate) struct Session<'a, M: RawMutex> {
    pub(crate) address: u8,
    pub(crate) config: Config,
    initialized: bool,
    sample: TouchInput,
    info: DeviceInfo,
    mailbox: Option<&'a TouchMailbox<M>>,
    mailbox_active: bool,
}

impl<'a, M: RawMutex> Session<'a, M> {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            address: crate::DEFAULT_ADDRESS,
            config,
            initialized: false,
            sample: TouchInput::NEVER_TOUCHED,
            info: DeviceInfo::default(),
            mailbox: None,
            mailbox_active: false,
        }
    }

    /// Move the session onto a mailbox of any mutex flavour.
    pub(crate) fn with_mailbox<N: RawMutex>(self, mailbox: &'a TouchMailbox<N>) -> Session<'a, N> {
        Session {
            address: self.address,
            config: self.config,
            initialized: self.initialized,
            sample: self.sample,
            info: self.info,
            mailbox: Some(mailbox),
            mailbox_active: false,
        }
    }

    pub(crate) fn sample(&self) -> TouchInput {
        self.sample
    }

    pub(crate) fn info(&self) -> DeviceInfo {
        self.info
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns true if the session may talk to the device, logging otherwise.
    pub(crate) fn ready(&self) -> bool {
        if !self.initialized {
            #[cfg(feature = "defmt")]
            defmt::error!("FT6x36 not initialized, call init first");
        }
        self.initialized
    }

    /// Open the session. Reads are permitted from here on.
    pub(crate) fn begin(&mut self, address: u8) {
        self.address = address;
        self.initialized = true;
        #[cfg(feature = "defmt")]
        defmt::info!("Found touch panel controller at 0x{:02x}", address);
    }

    /// Record the identification registers and bring up the mailbox.
    pub(crate) fn finish_init<E>(
        &mut self,
        ids: [Option<u8>; ID_REGISTER_COUNT],
    ) -> Result<DeviceInfo, DriverError<E>> {
        let [panel_id, chip_id, device_mode, firmware_id, release_code] = ids;
        self.info = DeviceInfo {
            panel_id,
            chip_id,
            device_mode,
            firmware_id,
            release_code,
        };

        if !self.config.enable_notification_channel {
            self.mailbox_active = false;
            return Ok(self.info);
        }

        match self.mailbox {
            Some(mailbox) => {
                mailbox.set(self.sample);
                self.mailbox_active = true;
                Ok(self.info)
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::error!("Notification channel enabled but no touch mailbox attached");
                self.mailbox_active = false;
                Err(DriverError::MailboxUnavailable)
            }
        }
    }

    /// Fold one packet read into the retained sample and return it.
    ///
    /// A failed read counts as a packet without touch points.
    pub(crate) fn update<E: Debug>(
        &mut self,
        read: Result<[u8; PACKET_LEN], DriverError<E>>,
    ) -> TouchInput {
        let point = match read {
            Ok(packet) => decode_point(&packet, &self.config),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "Error talking to touch IC: {}",
                    defmt::Debug2Format(&_err)
                );
                None
            }
        };

        match point {
            Some((x, y)) => {
                self.sample = TouchInput {
                    x,
                    y,
                    state: TouchState::Pressed,
                };
                #[cfg(feature = "defmt")]
                defmt::trace!("X={} Y={}", x, y);
                self.publish();
            }
            None => {
                if self.sample.state == TouchState::Pressed {
                    self.sample.state = TouchState::Released;
                    self.publish();
                }
            }
        }

        self.sample
    }

    fn publish(&self) {
        if !self.mailbox_active {
            return;
        }
        if let Some(mailbox) = self.mailbox {
            mailbox.set(self.sample);
        }
    }
}

/// Log one identification register read and keep the value if it succeeded.
pub(crate) fn id_register_from_read<E: Debug>(_name: &str, read: Result<u8, E>) -> Option<u8> {
    match read {
        Ok(value) => {
            #[cfg(feature = "defmt")]
            defmt::info!("\t{}: 0x{:02x}", _name, value);
            Some(value)
        }
        Err(_err) => {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Error reading {} from device: {}",
                _name,
                defmt::Debug2Format(&_err)
            );
            None
        }
    }
}

/*
 -- Common register data processing --
*/

/// Decode the single touch point of a status packet, with transforms applied.
///
/// Returns `None` unless exactly one touch point is reported.
pub(crate) fn decode_point(packet: &[u8; PACKET_LEN], config: &Config) -> Option<(i16, i16)> {
    if !is_single_touch(packet[0]) {
        return None;
    }

    let x = coord_from_registers(packet[1], packet[2]);
    let y = coord_from_registers(packet[3], packet[4]);
    Some(transform(config, x, y))
}

/// Returns true if the status byte reports exactly one touch point.
///
/// The whole byte is compared, so no touch and multi-touch both fail.
fn is_single_touch(status: u8) -> bool {
    status == 1
}

/// Extracts the 14 bit coordinate from the msb and lsb registers.
fn coord_from_registers(msb: u8, lsb: u8) -> i16 {
    let msb = msb & COORD_MSB_MASK;
    ((msb as i16) << 8) | lsb as i16
}

/// Apply swap, then x inversion, then y inversion.
fn transform(config: &Config, x: i16, y: i16) -> (i16, i16) {
    let (mut x, mut y) = if config.swap_axes { (y, x) } else { (x, y) };
    if config.invert_x {
        x = config.horizontal_resolution.wrapping_sub(x);
    }
    if config.invert_y {
        y = config.vertical_resolution.wrapping_sub(y);
    }
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type TestError = DriverError<()>;

    fn ready_session(config: Config) -> Session<'static, NoopRawMutex> {
        let mut session = Session::new(config);
        session.begin(crate::DEFAULT_ADDRESS);
        session
    }

    #[test]
    fn coordinate_keeps_six_high_bits() {
        assert_eq!(coord_from_registers(0x00, 0x64), 100);
        assert_eq!(coord_from_registers(0x01, 0x2C), 300);
        // Event flag bits 7:6 are dropped.
        assert_eq!(coord_from_registers(0xC1, 0x2C), 300);
        assert_eq!(coord_from_registers(0xFF, 0xFF), 0x3FFF);
    }

    #[test]
    fn only_one_touch_point_is_valid() {
        let config = Config::default();
        assert_eq!(decode_point(&[0, 0, 10, 0, 20], &config), None);
        assert_eq!(decode_point(&[1, 0, 10, 0, 20], &config), Some((10, 20)));
        assert_eq!(decode_point(&[2, 0, 10, 0, 20], &config), None);
        assert_eq!(decode_point(&[0x11, 0, 10, 0, 20], &config), None);
    }

    #[test]
    fn swap_then_invert_x() {
        let config = Config {
            swap_axes: true,
            invert_x: true,
            horizontal_resolution: 240,
            ..Config::default()
        };
        assert_eq!(transform(&config, 10, 20), (220, 10));
    }

    #[test]
    fn invert_y_uses_vertical_resolution() {
        let config = Config {
            invert_y: true,
            vertical_resolution: 320,
            ..Config::default()
        };
        assert_eq!(transform(&config, 10, 20), (10, 300));
    }

    #[test]
    fn failed_read_releases_and_keeps_position() {
        let mut session = ready_session(Config::default());
        session.update::<()>(Ok([1, 0x00, 0x64, 0x00, 0xC8]));

        let sample = session.update::<()>(Err(TestError::I2cError(())));
        assert_eq!(
            sample,
            TouchInput {
                x: 100,
                y: 200,
                state: TouchState::Released,
            }
        );
    }

    #[test]
    fn never_touched_stays_sentinel() {
        let mut session = ready_session(Config::default());
        for packet in [[0u8; 5], [2, 0, 5, 0, 6], [3, 1, 1, 1, 1]] {
            assert_eq!(session.update::<()>(Ok(packet)), TouchInput::NEVER_TOUCHED);
        }
    }

    #[test]
    fn enabled_channel_without_mailbox_is_reported() {
        let config = Config {
            enable_notification_channel: true,
            ..Config::default()
        };
        let mut session = ready_session(config);
        let result = session.finish_init::<()>([Some(1), None, None, None, None]);
        assert!(matches!(result, Err(DriverError::MailboxUnavailable)));
        assert_eq!(session.info().panel_id, Some(1));

        // Decoding keeps working without the mailbox.
        let sample = session.update::<()>(Ok([1, 0, 7, 0, 8]));
        assert_eq!((sample.x, sample.y), (7, 8));
    }
}
