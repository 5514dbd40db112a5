//! Countdown error types.
//!
//! State-machine operations never fail; refusals such as a start while
//! offline are reported through the listener. These errors only cover
//! construction and talking to a driver that has already exited.

use thiserror::Error;

/// Errors that can occur when building or driving a countdown.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CountdownError {
    /// Configured duration is zero.
    #[error("countdown duration must be greater than zero (got {0} ms)")]
    InvalidDuration(u64),

    /// Configured tick interval is zero.
    #[error("tick interval must be greater than zero (got {0} ms)")]
    InvalidTickInterval(u64),

    /// The driver task has shut down and no longer accepts commands.
    #[error("countdown driver is no longer running")]
    DriverClosed,
}

impl CountdownError {
    /// Returns true if this error comes from configuration validation.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidDuration(_) | Self::InvalidTickInterval(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CountdownError::InvalidDuration(0);
        assert!(err.to_string().contains("duration"));
        assert!(err.to_string().contains("0 ms"));

        let err = CountdownError::InvalidTickInterval(0);
        assert!(err.to_string().contains("tick interval"));

        let err = CountdownError::DriverClosed;
        assert!(err.to_string().contains("no longer running"));
    }

    #[test]
    fn test_is_config_error() {
        assert!(CountdownError::InvalidDuration(0).is_config_error());
        assert!(CountdownError::InvalidTickInterval(0).is_config_error());
        assert!(!CountdownError::DriverClosed.is_config_error());
    }
}
