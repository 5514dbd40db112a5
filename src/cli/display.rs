//! Display utilities for the countdown demo CLI.
//!
//! Turns countdown events into the text a resend-code button would show.

use crate::countdown::CountdownEvent;
use crate::types::{CountdownSnapshot, CountdownStatus};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows one countdown event.
    pub fn show_event(event: &CountdownEvent, json: bool) {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => Self::show_error(&e.to_string()),
            }
            return;
        }

        match event {
            CountdownEvent::Changed { snapshot } => println!("{}", Self::button_title(snapshot)),
            CountdownEvent::Finished => println!("* Countdown finished"),
            CountdownEvent::NetworkFailed => Self::show_network_failed(),
        }
    }

    /// Shows the refusal to start while offline.
    pub fn show_network_failed() {
        eprintln!("! Network unavailable, countdown not started");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Returns the button label for a snapshot.
    pub fn button_title(snapshot: &CountdownSnapshot) -> String {
        match snapshot.status {
            CountdownStatus::Idle => "[ Send code ]".to_string(),
            CountdownStatus::Counting => {
                let (minutes, seconds) = Self::format_time(snapshot.remaining_seconds);
                if minutes > 0 {
                    format!("[ Resend in {}:{:02} ]", minutes, seconds)
                } else {
                    format!("[ Resend in {}s ]", seconds)
                }
            }
            CountdownStatus::Over => "[ Resend code ]".to_string(),
        }
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u64) -> (u64, u64) {
        (total_seconds / 60, total_seconds % 60)
    }
}
