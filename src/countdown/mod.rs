//! Countdown engine and its host-side plumbing.
//!
//! # Architecture
//!
//! ```text
//!  connectivity / lifecycle / taps
//!              │
//!              ▼
//! ┌──────────────────┐   ticks   ┌──────────────────┐
//! │ CountdownDriver  │──────────▶│ CountdownEngine  │◀── Clock
//! └──────────────────┘           └────────┬─────────┘
//!                                         │
//!                                         ▼
//!                                ┌──────────────────┐
//!                                │CountdownListener │ → presentation
//!                                └──────────────────┘
//! ```
//!
//! The engine is a plain state machine: it never sleeps and never spawns.
//! It records the tick it wants next and the driver delivers it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use countdown_button::countdown::{CountdownDriver, CountdownEngine, SystemClock};
//! use countdown_button::types::CountdownConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let engine = CountdownEngine::new(CountdownConfig::default(), SystemClock, tx)?;
//! let (driver, handle) = CountdownDriver::new(engine);
//! tokio::spawn(driver.run());
//!
//! handle.start()?;
//! while let Some(event) = rx.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod driver;
pub mod engine;
pub mod error;
pub mod listener;

pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use driver::{CountdownCommand, CountdownDriver, CountdownHandle};
pub use engine::{CountdownEngine, ScheduledTick, TickOutcome, TickToken};
pub use error::CountdownError;
pub use listener::{CountdownEvent, CountdownListener, MockCountdownListener};
