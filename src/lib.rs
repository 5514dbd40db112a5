//! Countdown Button Library
//!
//! This library provides the core of a "resend code in Ns" button:
//! - Countdown state machine with drift-free remaining time
//! - Connectivity gating at start
//! - Resynchronization across application suspend/resume
//! - A tokio driver that delivers ticks and host signals
//! - CLI parsing and display for the demo binary

pub mod cli;
pub mod countdown;
pub mod types;

// Re-export commonly used types for convenience
pub use countdown::{
    Clock, CountdownDriver, CountdownEngine, CountdownError, CountdownEvent, CountdownHandle,
    CountdownListener, MockCountdownListener, SystemClock,
};
pub use types::{CountdownConfig, CountdownSnapshot, CountdownState, CountdownStatus};
