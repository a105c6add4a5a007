//! Error types

use core::fmt;

/// Errors reported by the drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Pin number outside of the port (0-15)
    InvalidPin(u8),
    /// ADC channel the converter does not have
    InvalidChannel(u8),
    /// The end of conversion flag never came up within the poll budget
    ConversionTimeout {
        /// Number of times the status register was polled
        polls: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "invalid pin number {}", pin),
            Self::InvalidChannel(channel) => write!(f, "invalid adc channel {}", channel),
            Self::ConversionTimeout { polls } => {
                write!(f, "adc conversion timed out after {} polls", polls)
            }
        }
    }
}

/// Result type for driver operations
pub type Result<T> = core::result::Result<T, Error>;
