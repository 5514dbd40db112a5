//! Core data types for the countdown button.
//!
//! This module defines the data structures used for:
//! - Countdown status and state
//! - Snapshots handed to the presentation layer
//! - Countdown configuration with validation

use serde::{Deserialize, Serialize};

use crate::countdown::CountdownError;

// ============================================================================
// CountdownStatus
// ============================================================================

/// Represents the current status of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownStatus {
    /// Never started
    #[default]
    Idle,
    /// Countdown is running
    Counting,
    /// Countdown elapsed or was stopped; may be restarted
    Over,
}

impl CountdownStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownStatus::Idle => "idle",
            CountdownStatus::Counting => "counting",
            CountdownStatus::Over => "over",
        }
    }

    /// Returns true if the countdown is actively running.
    pub fn is_counting(&self) -> bool {
        matches!(self, CountdownStatus::Counting)
    }
}

// ============================================================================
// CountdownConfig
// ============================================================================

fn default_duration_ms() -> u64 {
    30_000
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

/// Configuration for a countdown instance.
///
/// Supplied once when the engine is built. Changing it afterwards has no
/// effect on an engine that already owns a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Countdown length in milliseconds (> 0)
    #[serde(rename = "durationMs", default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Nominal period between ticks in milliseconds (> 0)
    #[serde(rename = "tickIntervalMs", default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl CountdownConfig {
    /// Creates a new configuration with the specified duration in milliseconds.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Creates a new configuration with the specified duration in seconds.
    pub fn with_duration_secs(self, seconds: u64) -> Self {
        self.with_duration_ms(seconds.saturating_mul(1_000))
    }

    /// Creates a new configuration with the specified tick interval.
    pub fn with_tick_interval_ms(mut self, interval_ms: u64) -> Self {
        self.tick_interval_ms = interval_ms;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the duration or tick interval is zero.
    pub fn validate(&self) -> Result<(), CountdownError> {
        if self.duration_ms == 0 {
            return Err(CountdownError::InvalidDuration(self.duration_ms));
        }
        if self.tick_interval_ms == 0 {
            return Err(CountdownError::InvalidTickInterval(self.tick_interval_ms));
        }
        Ok(())
    }
}

// ============================================================================
// CountdownState
// ============================================================================

/// Externally observable state of a countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownState {
    /// Current status
    pub status: CountdownStatus,
    /// Remaining milliseconds; equal to the configured duration unless counting
    #[serde(rename = "remainingMs")]
    pub remaining_ms: u64,
    /// Last connectivity value pushed by the host
    #[serde(rename = "isConnected")]
    pub is_connected: bool,
}

impl CountdownState {
    /// Creates a new idle state for the given duration.
    pub fn new(duration_ms: u64) -> Self {
        Self {
            status: CountdownStatus::Idle,
            remaining_ms: duration_ms,
            is_connected: true,
        }
    }

    /// Returns the snapshot the presentation layer renders.
    pub fn snapshot(&self) -> CountdownSnapshot {
        CountdownSnapshot {
            status: self.status,
            remaining_seconds: remaining_seconds(self.remaining_ms),
        }
    }
}

/// Rounds remaining milliseconds up to whole seconds.
fn remaining_seconds(remaining_ms: u64) -> u64 {
    remaining_ms.div_ceil(1_000)
}

// ============================================================================
// CountdownSnapshot
// ============================================================================

/// Data handed to the presentation layer on every observable change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    /// Current status
    pub status: CountdownStatus,
    /// Remaining whole seconds, rounded up
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u64,
}

impl CountdownSnapshot {
    /// Returns true if the button should accept a press.
    pub fn is_pressable(&self) -> bool {
        !self.status.is_counting()
    }
}

// ============================================================================
// Tests
// ============================================================================
