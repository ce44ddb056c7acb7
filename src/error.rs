//! Timing errors.

use crate::instance::Family;

/// Status reported by a register-level timer driver.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum DriverError {
    /// Generic failure.
    Error,
    /// Peripheral busy.
    Busy,
    /// Peripheral did not respond in time.
    Timeout,
    /// Requested mode not supported by the peripheral.
    Unsupported,
}

/// Timing error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Instance index beyond the units fitted on this part.
    Range {
        /// Family of the rejected instance.
        family: Family,
        /// Rejected unit number.
        index: u8,
    },
    /// No register-level driver is bound for the family.
    NoDriver(Family),
    /// Configuration extension does not belong to the family.
    ExtensionMismatch(Family),
    /// Configured channel beyond the channels of the instance.
    ChannelRange {
        /// Rejected channel.
        channel: u8,
    },
    /// Instance-level driver initialization failed.
    Driver(DriverError),
    /// Channel-level driver initialization failed.
    ChannelInit {
        /// First channel that failed.
        channel: u8,
        /// Driver status.
        error: DriverError,
    },
    /// Clock too slow for the requested granularity: less than one unit per tick.
    Resolution,
    /// Channel is not counting.
    Idle,
}

impl From<DriverError> for Error {
    fn from(error: DriverError) -> Self {
        Error::Driver(error)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Range { family, index } => write!(f, "{:?} instance {} not fitted", family, index),
            Error::NoDriver(family) => write!(f, "no {:?} driver bound", family),
            Error::ExtensionMismatch(family) => write!(f, "extension does not fit {:?}", family),
            Error::ChannelRange { channel } => write!(f, "channel {} out of range", channel),
            Error::Driver(e) => write!(f, "driver error: {:?}", e),
            Error::ChannelInit { channel, error } => write!(f, "channel {} init failed: {:?}", channel, error),
            Error::Resolution => f.write_str("tick shorter than the requested unit"),
            Error::Idle => f.write_str("channel idle"),
        }
    }
}

/// Timing result.
pub type Result<T> = core::result::Result<T, Error>;
