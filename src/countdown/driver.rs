//! Host event loop for a countdown engine.
//!
//! The driver owns one engine and is the only place its operations run.
//! Host signals arrive as [`CountdownCommand`]s on one channel and scheduled
//! ticks are delivered from the same loop, so every event is processed to
//! completion before the next one starts.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::clock::Clock;
use super::engine::{CountdownEngine, ScheduledTick, TickToken};
use super::error::CountdownError;
use super::listener::CountdownListener;
use crate::types::CountdownState;

// ============================================================================
// CountdownCommand
// ============================================================================

/// Signals a host pushes into the driver.
#[derive(Debug)]
pub enum CountdownCommand {
    /// User asked to start
    Start,
    /// User asked to stop
    Stop,
    /// Connectivity observer fired
    SetConnectivity(bool),
    /// Application moved to the background
    Suspend,
    /// Application returned to the foreground
    Resume,
    /// Query the current state
    State(oneshot::Sender<CountdownState>),
    /// Tear the engine down and exit the loop
    Shutdown,
}

// ============================================================================
// CountdownHandle
// ============================================================================

/// Cloneable sender side of a running driver.
#[derive(Debug, Clone)]
pub struct CountdownHandle {
    tx: mpsc::UnboundedSender<CountdownCommand>,
}

impl CountdownHandle {
    /// Requests a countdown start.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::DriverClosed` if the driver has exited.
    pub fn start(&self) -> Result<(), CountdownError> {
        self.send(CountdownCommand::Start)
    }

    /// Requests a countdown stop.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::DriverClosed` if the driver has exited.
    pub fn stop(&self) -> Result<(), CountdownError> {
        self.send(CountdownCommand::Stop)
    }

    /// Pushes the current connectivity flag.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::DriverClosed` if the driver has exited.
    pub fn set_connectivity(&self, is_connected: bool) -> Result<(), CountdownError> {
        self.send(CountdownCommand::SetConnectivity(is_connected))
    }

    /// Reports that the application was suspended.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::DriverClosed` if the driver has exited.
    pub fn suspend(&self) -> Result<(), CountdownError> {
        self.send(CountdownCommand::Suspend)
    }

    /// Reports that the application was resumed.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::DriverClosed` if the driver has exited.
    pub fn resume(&self) -> Result<(), CountdownError> {
        self.send(CountdownCommand::Resume)
    }

    /// Returns the engine state once all earlier commands have been handled.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::DriverClosed` if the driver has exited.
    pub async fn state(&self) -> Result<CountdownState, CountdownError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CountdownCommand::State(reply_tx))?;
        reply_rx.await.map_err(|_| CountdownError::DriverClosed)
    }

    /// Asks the driver to tear down its engine and exit.
    ///
    /// # Errors
    ///
    /// Returns `CountdownError::DriverClosed` if the driver has exited.
    pub fn shutdown(&self) -> Result<(), CountdownError> {
        self.send(CountdownCommand::Shutdown)
    }

    fn send(&self, command: CountdownCommand) -> Result<(), CountdownError> {
        self.tx
            .send(command)
            .map_err(|_| CountdownError::DriverClosed)
    }
}

// ============================================================================
// CountdownDriver
// ============================================================================

/// Runs a countdown engine on the current tokio runtime.
pub struct CountdownDriver<C, L> {
    engine: CountdownEngine<C, L>,
    rx: mpsc::UnboundedReceiver<CountdownCommand>,
}

impl<C: Clock, L: CountdownListener> CountdownDriver<C, L> {
    /// Wraps an engine and returns the handle used to signal it.
    pub fn new(engine: CountdownEngine<C, L>) -> (Self, CountdownHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { engine, rx }, CountdownHandle { tx })
    }

    /// Runs the event loop.
    ///
    /// Returns after a `Shutdown` command or once every handle is dropped,
    /// handing back the torn-down engine.
    pub async fn run(mut self) -> CountdownEngine<C, L> {
        loop {
            let pending = self.engine.pending_tick();
            let now = self.engine.clock().now_ms();

            tokio::select! {
                command = self.rx.recv() => {
                    let Some(command) = command else { break };
                    if !self.apply(command) {
                        break;
                    }
                }
                token = wait_for_tick(pending, now) => {
                    self.engine.tick(token);
                }
            }
        }

        debug!("Countdown driver shutting down");
        self.engine.teardown();
        self.engine
    }

    /// Applies one command. Returns false once the loop should exit.
    fn apply(&mut self, command: CountdownCommand) -> bool {
        trace!(?command, "Countdown command");
        match command {
            CountdownCommand::Start => self.engine.start(),
            CountdownCommand::Stop => self.engine.stop(),
            CountdownCommand::SetConnectivity(is_connected) => {
                self.engine.set_connectivity(is_connected)
            }
            CountdownCommand::Suspend => self.engine.on_application_suspend(),
            CountdownCommand::Resume => self.engine.on_application_resume(),
            CountdownCommand::State(reply) => {
                let _ = reply.send(self.engine.state().clone());
            }
            CountdownCommand::Shutdown => return false,
        }
        true
    }
}

/// Sleeps until the pending tick is due, or forever if none is pending.
async fn wait_for_tick(pending: Option<ScheduledTick>, now_ms: u64) -> TickToken {
    match pending {
        Some(tick) => {
            let delay = tick.due_at_ms.saturating_sub(now_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            tick.token
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
