#![cfg_attr(not(test), no_std)]
//! A polled, single-point driver for FT6x36 family capacitive touch controllers.
//!
//! The driver reads the touch status registers on every call to `poll`, collapses
//! the report to either one pressed point or a release, and keeps the most recent
//! sample so a release still carries the last known position. It fits the
//! "read the current pointer state" callback style used by GUI input layers.
//!
//! Optionally, every relevant update is also written to a [`TouchMailbox`], a
//! single-slot cell another task can take the latest sample from.

mod asynch;
mod common;
mod mailbox;
mod sync;
#[cfg(test)]
mod testing;

pub use asynch::FT6x36Async;
pub use mailbox::TouchMailbox;
pub use sync::FT6x36;

/// The factory 7-bit I2C address of FT6x36 controllers.
pub const DEFAULT_ADDRESS: u8 = 0x38;

/// Whether the panel is currently touched.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchState {
    Pressed,
    #[default]
    Released,
}

/// The retained touch sample.
///
/// Coordinates are only updated by a valid single-point report. A release keeps
/// the coordinates of the last press.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchInput {
    /// The x position after the configured transforms, or -1 if never touched.
    pub x: i16,
    /// The y position after the configured transforms, or -1 if never touched.
    pub y: i16,
    pub state: TouchState,
}

impl TouchInput {
    /// The sample held before the first press.
    pub const NEVER_TOUCHED: Self = Self {
        x: -1,
        y: -1,
        state: TouchState::Released,
    };

    pub fn is_pressed(&self) -> bool {
        self.state == TouchState::Pressed
    }

    /// Returns false until the first valid press has been decoded.
    pub fn has_position(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }
}

impl Default for TouchInput {
    fn default() -> Self {
        Self::NEVER_TOUCHED
    }
}

/// The output record filled in for a pointer input layer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PointerData {
    pub x: i16,
    pub y: i16,
    pub state: TouchState,
}

impl From<TouchInput> for PointerData {
    fn from(value: TouchInput) -> Self {
        Self {
            x: value.x,
            y: value.y,
            state: value.state,
        }
    }
}

/// The type of gesture reported in the `GEST_ID` register.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GestureType {
    MoveUp,
    MoveRight,
    MoveDown,
    MoveLeft,
    ZoomIn,
    ZoomOut,
    NoGesture,
    Invalid,
}

impl From<u8> for GestureType {
    fn from(value: u8) -> Self {
        match value {
            0x10 => Self::MoveUp,
            0x14 => Self::MoveRight,
            0x18 => Self::MoveDown,
            0x1C => Self::MoveLeft,
            0x48 => Self::ZoomIn,
            0x49 => Self::ZoomOut,
            0x00 => Self::NoGesture,
            _ => Self::Invalid,
        }
    }
}

/// Identification registers read by `init`.
///
/// A field is `None` when its register could not be read. These values are
/// diagnostic only and never gate touch decoding.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    /// `FOCALTECH_ID` register (0xA8).
    pub panel_id: Option<u8>,
    /// `CIPHER` register (0xA3), e.g. 0x06 for FT6206 or 0x36 for FT6236.
    pub chip_id: Option<u8>,
    /// `DEV_MODE` register (0x00).
    pub device_mode: Option<u8>,
    /// `FIRMID` register (0xA6).
    pub firmware_id: Option<u8>,
    /// `RELEASE_CODE_ID` register (0xAF).
    pub release_code: Option<u8>,
}

/// Driver settings fixed at construction.
///
/// Transforms are applied to every decoded press in this order: swap axes,
/// invert x, invert y.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Exchange the x and y coordinates.
    pub swap_axes: bool,
    /// Report `horizontal_resolution - x` instead of `x`.
    pub invert_x: bool,
    /// Report `vertical_resolution - y` instead of `y`.
    pub invert_y: bool,
    /// Publish samples to the attached [`TouchMailbox`].
    pub enable_notification_channel: bool,
    pub horizontal_resolution: i16,
    pub vertical_resolution: i16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            swap_axes: false,
            invert_x: false,
            invert_y: false,
            enable_notification_channel: false,
            horizontal_resolution: 320,
            vertical_resolution: 240,
        }
    }
}

/// A driver error.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError<I2CError> {
    /// A generic I2c communication error.
    I2cError(I2CError),
    /// An operation that talks to the device was called before `init`.
    NotInitialized,
    /// The notification channel is enabled but no mailbox was attached.
    ///
    /// The driver keeps working without notifications.
    MailboxUnavailable,
    /// The IRQ pin was not set. Set it with [`FT6x36Async::with_irq_pin`].
    IrqPinNotSet,
    /// Waiting on the IRQ pin failed.
    IrqError,
}

impl<I2CError> From<I2CError> for DriverError<I2CError> {
    fn from(value: I2CError) -> Self {
        Self::I2cError(value)
    }
}
