//! Driver error taxonomy

use core::fmt;

use hsi_hal::TransferError;

/// Errors returned synchronously by driver operations
///
/// Transfer outcomes are never reported here; they arrive through the
/// completion callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HsiError {
    /// Malformed or missing parameter, bad config field, channel not open,
    /// request already pending
    InvalidArgument,
    /// Channel already open
    Busy,
    /// Requested physical capability is absent
    NoDevice,
    /// Unknown control command
    NotSupported,
    /// Hardware did not acknowledge in time
    Timeout,
    /// Backend failure, passed through unchanged
    Transfer(TransferError),
}

impl From<TransferError> for HsiError {
    fn from(err: TransferError) -> Self {
        HsiError::Transfer(err)
    }
}

impl fmt::Display for HsiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HsiError::InvalidArgument => f.write_str("invalid argument"),
            HsiError::Busy => f.write_str("channel busy"),
            HsiError::NoDevice => f.write_str("no such device"),
            HsiError::NotSupported => f.write_str("command not supported"),
            HsiError::Timeout => f.write_str("hardware timeout"),
            HsiError::Transfer(TransferError(code)) => write!(f, "transfer error {}", code),
        }
    }
}
