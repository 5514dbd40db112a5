//! Countdown engine for the countdown button.
//!
//! This module provides the core state machine:
//! - State transitions (Idle → Counting → Over → Counting ...)
//! - Drift-free remaining time derived from an absolute target timestamp
//! - Connectivity gating at start
//! - Resynchronization after the host application is suspended

use tracing::{debug, trace, warn};

use super::clock::Clock;
use super::error::CountdownError;
use super::listener::CountdownListener;
use crate::types::{CountdownConfig, CountdownSnapshot, CountdownState, CountdownStatus};

// ============================================================================
// Tick scheduling
// ============================================================================

/// Identifies one scheduled tick.
///
/// Each schedule hands out a fresh token, so a tick delivered after its
/// schedule was cancelled or replaced can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

/// A tick the engine wants delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    /// Token to hand back when the tick fires
    pub token: TickToken,
    /// Wall-clock time the tick is due, in epoch milliseconds
    pub due_at_ms: u64,
}

/// What a delivered tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Token did not match the pending tick
    Stale,
    /// Remaining time was refreshed and the next tick scheduled
    Ticked,
    /// The deadline passed and the countdown entered Over
    Finished,
}

// ============================================================================
// CountdownEngine
// ============================================================================

/// Countdown state machine anchored to an absolute target time.
pub struct CountdownEngine<C, L> {
    config: CountdownConfig,
    clock: C,
    listener: L,
    state: CountdownState,
    /// Deadline in epoch milliseconds; set only while counting
    target_at_ms: Option<u64>,
    /// When the host was suspended mid-countdown
    suspended_at_ms: Option<u64>,
    pending_tick: Option<ScheduledTick>,
    next_token: u64,
}

impl<C: Clock, L: CountdownListener> CountdownEngine<C, L> {
    /// Creates an idle engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: CountdownConfig, clock: C, listener: L) -> Result<Self, CountdownError> {
        config.validate()?;

        Ok(Self {
            state: CountdownState::new(config.duration_ms),
            config,
            clock,
            listener,
            target_at_ms: None,
            suspended_at_ms: None,
            pending_tick: None,
            next_token: 0,
        })
    }

    /// Starts a countdown.
    ///
    /// Does nothing while already counting. If the host reports no
    /// connectivity the listener's `on_network_failed` fires and the state
    /// is left untouched.
    pub fn start(&mut self) {
        if self.state.status.is_counting() {
            debug!("Countdown already running, ignoring start");
            return;
        }

        if !self.listener.should_start() {
            debug!("Start vetoed by listener");
            return;
        }

        if !self.state.is_connected {
            warn!("Countdown start refused: network unavailable");
            self.listener.on_network_failed();
            return;
        }

        let now = self.clock.now_ms();
        let target = now.saturating_add(self.config.duration_ms);

        self.target_at_ms = Some(target);
        self.suspended_at_ms = None;
        self.state.status = CountdownStatus::Counting;
        self.state.remaining_ms = self.config.duration_ms;
        self.schedule_tick(now, target);

        debug!(
            duration_ms = self.config.duration_ms,
            target_at_ms = target,
            "Countdown started"
        );
        self.listener.on_change(self.state.snapshot());
    }

    /// Stops the countdown from any status and enters Over.
    ///
    /// Always fires `on_finished`. Calling it again only resets the
    /// remaining time once more.
    pub fn stop(&mut self) {
        debug!(from = self.state.status.as_str(), "Countdown stopped");
        self.finish();
    }

    /// Records the connectivity flag pushed by the host.
    ///
    /// Only consulted by [`start`](Self::start); a running countdown is not
    /// affected.
    pub fn set_connectivity(&mut self, is_connected: bool) {
        if self.state.is_connected != is_connected {
            debug!(is_connected, "Connectivity changed");
        }
        self.state.is_connected = is_connected;
    }

    /// Handles the host application moving to the background.
    pub fn on_application_suspend(&mut self) {
        if !self.state.status.is_counting() {
            return;
        }

        let now = self.clock.now_ms();
        let suspended_at = *self.suspended_at_ms.get_or_insert(now);
        self.cancel_tick();

        debug!(suspended_at_ms = suspended_at, "Countdown suspended");
    }

    /// Handles the host application returning to the foreground.
    ///
    /// Finishes immediately if the deadline passed while suspended,
    /// otherwise resumes ticking against the unchanged target.
    pub fn on_application_resume(&mut self) {
        let suspended_at = self.suspended_at_ms.take();
        if !self.state.status.is_counting() {
            return;
        }
        let Some(target) = self.target_at_ms else {
            return;
        };

        let now = self.clock.now_ms();
        if let Some(suspended_at) = suspended_at {
            debug!(
                suspended_for_ms = now.saturating_sub(suspended_at),
                "Countdown resumed"
            );
        }

        let remaining = target.saturating_sub(now);
        if remaining == 0 {
            debug!("Countdown elapsed while suspended");
            self.finish();
            return;
        }

        self.state.remaining_ms = remaining;
        self.schedule_tick(now, target);
        self.listener.on_change(self.state.snapshot());
    }

    /// Delivers a scheduled tick.
    ///
    /// Ticks whose token is not the pending one are ignored.
    pub(crate) fn tick(&mut self, token: TickToken) -> TickOutcome {
        match self.pending_tick {
            Some(pending) if pending.token == token => {}
            _ => {
                trace!(?token, "Ignoring stale tick");
                return TickOutcome::Stale;
            }
        }
        self.pending_tick = None;

        let Some(target) = self.target_at_ms else {
            return TickOutcome::Stale;
        };

        let now = self.clock.now_ms();
        let remaining = target.saturating_sub(now);
        if remaining == 0 {
            debug!("Countdown elapsed");
            self.finish();
            return TickOutcome::Finished;
        }

        trace!(remaining_ms = remaining, "Tick");
        self.state.remaining_ms = remaining;
        self.schedule_tick(now, target);
        self.listener.on_change(self.state.snapshot());
        TickOutcome::Ticked
    }

    /// Cancels any pending tick, leaving the state as it is.
    ///
    /// Used when the owner tears the widget down. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.cancel_tick();
        self.suspended_at_ms = None;
    }

    /// Returns a reference to the current state.
    pub fn state(&self) -> &CountdownState {
        &self.state
    }

    /// Returns the snapshot the presentation layer renders.
    pub fn snapshot(&self) -> CountdownSnapshot {
        self.state.snapshot()
    }

    /// Returns the configuration this engine was built with.
    pub fn config(&self) -> &CountdownConfig {
        &self.config
    }

    /// Returns the tick the engine is waiting for, if any.
    pub fn pending_tick(&self) -> Option<ScheduledTick> {
        self.pending_tick
    }

    /// Returns the clock this engine reads.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn finish(&mut self) {
        self.cancel_tick();
        self.target_at_ms = None;
        self.suspended_at_ms = None;
        self.state.status = CountdownStatus::Over;
        self.state.remaining_ms = self.config.duration_ms;

        self.listener.on_finished();
        self.listener.on_change(self.state.snapshot());
    }

    fn schedule_tick(&mut self, now: u64, target: u64) {
        let delay = self
            .config
            .tick_interval_ms
            .min(target.saturating_sub(now));
        let token = TickToken(self.next_token);
        self.next_token += 1;

        self.pending_tick = Some(ScheduledTick {
            token,
            due_at_ms: now.saturating_add(delay),
        });
    }

    fn cancel_tick(&mut self) {
        if let Some(pending) = self.pending_tick.take() {
            trace!(token = ?pending.token, "Tick cancelled");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::clock::ManualClock;
    use crate::countdown::listener::MockCountdownListener;

    const T0: u64 = 1_700_000_000_000;

    fn create_engine(
        duration_ms: u64,
    ) -> (
        CountdownEngine<ManualClock, MockCountdownListener>,
        ManualClock,
        MockCountdownListener,
    ) {
        let clock = ManualClock::new(T0);
        let listener = MockCountdownListener::new();
        let config = CountdownConfig::default().with_duration_ms(duration_ms);
        let engine = CountdownEngine::new(config, clock.clone(), listener.clone()).unwrap();
        (engine, clock, listener)
    }

    /// Advances the clock to the pending tick and delivers it.
    fn fire_next_tick(
        engine: &mut CountdownEngine<ManualClock, MockCountdownListener>,
        clock: &ManualClock,
    ) -> TickOutcome {
        let pending = engine.pending_tick().expect("no pending tick");
        if pending.due_at_ms > clock.now_ms() {
            clock.set(pending.due_at_ms);
        }
        engine.tick(pending.token)
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    mod construction_tests {
        use super::*;

        #[test]
        fn test_new_engine_is_idle() {
            let (engine, _clock, listener) = create_engine(30_000);
            let state = engine.state();

            assert_eq!(state.status, CountdownStatus::Idle);
            assert_eq!(state.remaining_ms, 30_000);
            assert!(state.is_connected);
            assert!(engine.pending_tick().is_none());
            assert!(listener.changes().is_empty());
        }

        #[test]
        fn test_new_rejects_zero_duration() {
            let config = CountdownConfig::default().with_duration_ms(0);
            let result =
                CountdownEngine::new(config, ManualClock::new(0), MockCountdownListener::new());
            assert!(matches!(result, Err(CountdownError::InvalidDuration(0))));
        }

        #[test]
        fn test_new_rejects_zero_tick_interval() {
            let config = CountdownConfig::default().with_tick_interval_ms(0);
            let result =
                CountdownEngine::new(config, ManualClock::new(0), MockCountdownListener::new());
            assert!(matches!(result, Err(CountdownError::InvalidTickInterval(0))));
        }
    }

    // ------------------------------------------------------------------------
    // Start / Stop
    // ------------------------------------------------------------------------

    mod start_stop_tests {
        use super::*;

        #[test]
        fn test_start() {
            let (mut engine, _clock, listener) = create_engine(30_000);

            engine.start();

            assert_eq!(engine.state().status, CountdownStatus::Counting);
            assert_eq!(engine.state().remaining_ms, 30_000);
            assert_eq!(
                engine.pending_tick().map(|t| t.due_at_ms),
                Some(T0 + 1_000)
            );
            assert_eq!(
                listener.last_change(),
                Some(CountdownSnapshot {
                    status: CountdownStatus::Counting,
                    remaining_seconds: 30
                })
            );
        }

        #[test]
        fn test_start_while_counting_is_noop() {
            let (mut engine, clock, listener) = create_engine(30_000);

            engine.start();
            let first = engine.pending_tick();
            clock.advance(5_000);
            engine.start();

            assert_eq!(engine.pending_tick(), first);
            assert_eq!(listener.changes().len(), 1);
            assert_eq!(listener.should_start_count(), 1);
        }

        #[test]
        fn test_start_vetoed_by_listener() {
            let (mut engine, _clock, listener) = create_engine(30_000);
            listener.set_allow_start(false);

            engine.start();

            assert_eq!(engine.state().status, CountdownStatus::Idle);
            assert!(engine.pending_tick().is_none());
            assert_eq!(listener.network_failed_count(), 0);
            assert!(listener.changes().is_empty());
        }

        #[test]
        fn test_stop_from_counting() {
            let (mut engine, clock, listener) = create_engine(30_000);

            engine.start();
            clock.advance(3_000);
            engine.stop();

            let state = engine.state();
            assert_eq!(state.status, CountdownStatus::Over);
            assert_eq!(state.remaining_ms, 30_000);
            assert!(engine.pending_tick().is_none());
            assert_eq!(listener.finished_count(), 1);
            assert_eq!(
                listener.last_change(),
                Some(CountdownSnapshot {
                    status: CountdownStatus::Over,
                    remaining_seconds: 30
                })
            );
        }

        #[test]
        fn test_stop_from_idle() {
            let (mut engine, _clock, listener) = create_engine(30_000);

            engine.stop();

            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(listener.finished_count(), 1);
        }

        #[test]
        fn test_stop_twice_is_idempotent() {
            let (mut engine, _clock, _listener) = create_engine(30_000);

            engine.start();
            engine.stop();
            let once = engine.state().clone();
            engine.stop();

            assert_eq!(engine.state(), &once);
            assert!(engine.pending_tick().is_none());
        }

        #[test]
        fn test_restart_from_over_uses_fresh_target() {
            let (mut engine, clock, _listener) = create_engine(30_000);

            engine.start();
            clock.advance(12_000);
            engine.stop();

            clock.advance(100_000);
            let restarted_at = clock.now_ms();
            engine.start();

            assert_eq!(engine.state().status, CountdownStatus::Counting);
            assert_eq!(engine.state().remaining_ms, 30_000);
            assert_eq!(
                engine.pending_tick().map(|t| t.due_at_ms),
                Some(restarted_at + 1_000)
            );

            // Deadline is now + duration, not the first run's deadline.
            while fire_next_tick(&mut engine, &clock) == TickOutcome::Ticked {}

            assert_eq!(clock.now_ms(), restarted_at + 30_000);
            assert_eq!(engine.state().status, CountdownStatus::Over);
        }
    }

    // ------------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------------

    mod tick_tests {
        use super::*;

        #[test]
        fn test_runs_to_completion_exactly_once() {
            for duration in [1, 999, 1_000, 1_001, 5_500, 30_000] {
                let (mut engine, clock, listener) = create_engine(duration);
                engine.start();

                let mut outcome = TickOutcome::Ticked;
                while outcome == TickOutcome::Ticked {
                    outcome = fire_next_tick(&mut engine, &clock);
                }

                assert_eq!(outcome, TickOutcome::Finished, "duration {}", duration);
                assert_eq!(clock.now_ms(), T0 + duration, "duration {}", duration);
                assert_eq!(engine.state().status, CountdownStatus::Over);
                assert_eq!(listener.finished_count(), 1, "duration {}", duration);
                assert!(engine.pending_tick().is_none());
            }
        }

        #[test]
        fn test_tick_recomputes_from_target() {
            let (mut engine, clock, listener) = create_engine(30_000);
            engine.start();

            // Tick arrives 400ms late.
            let pending = engine.pending_tick().unwrap();
            clock.set(pending.due_at_ms + 400);
            assert_eq!(engine.tick(pending.token), TickOutcome::Ticked);

            assert_eq!(engine.state().remaining_ms, 28_600);
            assert_eq!(listener.last_change().unwrap().remaining_seconds, 29);
        }

        #[test]
        fn test_final_tick_clamped_to_deadline() {
            let (mut engine, clock, _listener) = create_engine(2_500);
            engine.start();

            fire_next_tick(&mut engine, &clock);
            fire_next_tick(&mut engine, &clock);

            assert_eq!(
                engine.pending_tick().map(|t| t.due_at_ms),
                Some(T0 + 2_500)
            );
        }

        #[test]
        fn test_late_and_dropped_ticks_reach_zero() {
            let (mut engine, clock, listener) = create_engine(10_000);
            engine.start();

            // Several ticks never arrive; the next one is very late.
            let pending = engine.pending_tick().unwrap();
            clock.advance(25_000);
            assert_eq!(engine.tick(pending.token), TickOutcome::Finished);

            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(listener.finished_count(), 1);
            assert!(listener
                .changes()
                .iter()
                .all(|s| s.status != CountdownStatus::Counting || s.remaining_seconds > 0));
        }

        #[test]
        fn test_stale_tick_after_stop_is_ignored() {
            let (mut engine, clock, listener) = create_engine(30_000);
            engine.start();
            let pending = engine.pending_tick().unwrap();

            engine.stop();
            clock.advance(1_000);

            assert_eq!(engine.tick(pending.token), TickOutcome::Stale);
            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(listener.finished_count(), 1);
        }

        #[test]
        fn test_stale_tick_from_previous_run_is_ignored() {
            let (mut engine, clock, _listener) = create_engine(30_000);
            engine.start();
            let old = engine.pending_tick().unwrap();
            engine.stop();
            engine.start();

            clock.advance(1_000);
            assert_eq!(engine.tick(old.token), TickOutcome::Stale);
            assert_eq!(engine.state().remaining_ms, 30_000);
            assert!(engine.pending_tick().is_some());
        }

        #[test]
        fn test_teardown_cancels_pending_tick() {
            let (mut engine, _clock, _listener) = create_engine(30_000);
            engine.teardown();
            engine.start();
            let pending = engine.pending_tick().unwrap();

            engine.teardown();
            engine.teardown();

            assert!(engine.pending_tick().is_none());
            assert_eq!(engine.tick(pending.token), TickOutcome::Stale);
        }
    }

    // ------------------------------------------------------------------------
    // Connectivity
    // ------------------------------------------------------------------------

    mod connectivity_tests {
        use super::*;

        #[test]
        fn test_start_while_offline_is_gated() {
            let (mut engine, _clock, listener) = create_engine(30_000);
            engine.set_connectivity(false);

            engine.start();

            assert_eq!(engine.state().status, CountdownStatus::Idle);
            assert!(!engine.state().is_connected);
            assert!(engine.pending_tick().is_none());
            assert_eq!(listener.network_failed_count(), 1);
            assert_eq!(listener.finished_count(), 0);
            assert!(listener.changes().is_empty());
        }

        #[test]
        fn test_start_while_offline_from_over_keeps_over() {
            let (mut engine, _clock, listener) = create_engine(30_000);
            engine.stop();
            engine.set_connectivity(false);

            engine.start();

            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(listener.network_failed_count(), 1);
            assert_eq!(listener.finished_count(), 1);
        }

        #[test]
        fn test_reconnect_allows_start() {
            let (mut engine, _clock, listener) = create_engine(30_000);
            engine.set_connectivity(false);
            engine.start();
            engine.set_connectivity(true);
            engine.start();

            assert_eq!(engine.state().status, CountdownStatus::Counting);
            assert_eq!(listener.network_failed_count(), 1);
        }

        #[test]
        fn test_disconnect_mid_countdown_does_not_interrupt() {
            let (mut engine, clock, listener) = create_engine(3_000);
            engine.start();
            engine.set_connectivity(false);

            while fire_next_tick(&mut engine, &clock) == TickOutcome::Ticked {}

            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(listener.finished_count(), 1);
            assert_eq!(listener.network_failed_count(), 0);
        }
    }

    // ------------------------------------------------------------------------
    // Suspend / Resume
    // ------------------------------------------------------------------------

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_resume_after_deadline_finishes_immediately() {
            let (mut engine, clock, listener) = create_engine(30_000);
            engine.start();

            clock.set(T0 + 20_000);
            engine.on_application_suspend();
            assert!(engine.pending_tick().is_none());

            clock.set(T0 + 40_000);
            engine.on_application_resume();

            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(engine.state().remaining_ms, 30_000);
            assert_eq!(listener.finished_count(), 1);
            assert!(engine.pending_tick().is_none());
        }

        #[test]
        fn test_resume_before_deadline_keeps_counting() {
            let (mut engine, clock, listener) = create_engine(30_000);
            engine.start();

            clock.set(T0 + 10_000);
            engine.on_application_suspend();
            clock.set(T0 + 15_000);
            engine.on_application_resume();

            assert_eq!(engine.state().status, CountdownStatus::Counting);
            assert_eq!(engine.state().remaining_ms, 15_000);
            assert_eq!(listener.last_change().unwrap().remaining_seconds, 15);
            assert_eq!(
                engine.pending_tick().map(|t| t.due_at_ms),
                Some(T0 + 16_000)
            );
            assert_eq!(listener.finished_count(), 0);
        }

        #[test]
        fn test_tick_scheduled_before_suspend_is_stale() {
            let (mut engine, clock, _listener) = create_engine(30_000);
            engine.start();
            let before = engine.pending_tick().unwrap();

            engine.on_application_suspend();
            clock.advance(2_000);
            engine.on_application_resume();

            assert_eq!(engine.tick(before.token), TickOutcome::Stale);
            assert_eq!(engine.state().remaining_ms, 28_000);
        }

        #[test]
        fn test_suspend_when_not_counting_is_noop() {
            let (mut engine, clock, listener) = create_engine(30_000);

            engine.on_application_suspend();
            clock.advance(60_000);
            engine.on_application_resume();

            assert_eq!(engine.state().status, CountdownStatus::Idle);
            assert_eq!(listener.finished_count(), 0);
            assert!(listener.changes().is_empty());
        }

        #[test]
        fn test_resume_after_stop_is_noop() {
            let (mut engine, clock, listener) = create_engine(30_000);
            engine.start();
            engine.on_application_suspend();
            engine.stop();

            clock.advance(60_000);
            engine.on_application_resume();

            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(listener.finished_count(), 1);
        }

        #[test]
        fn test_double_suspend_keeps_first_timestamp() {
            let (mut engine, clock, _listener) = create_engine(30_000);
            engine.start();

            clock.set(T0 + 5_000);
            engine.on_application_suspend();
            clock.set(T0 + 8_000);
            engine.on_application_suspend();

            assert_eq!(engine.suspended_at_ms, Some(T0 + 5_000));
        }

        #[test]
        fn test_resume_exactly_at_deadline_finishes() {
            let (mut engine, clock, listener) = create_engine(30_000);
            engine.start();
            engine.on_application_suspend();

            clock.set(T0 + 30_000);
            engine.on_application_resume();

            assert_eq!(engine.state().status, CountdownStatus::Over);
            assert_eq!(listener.finished_count(), 1);
        }
    }
}
