//! Screen-level owner of a routine player and its periodic tick timer.
//!
//! The session converts wall-clock time into player ticks. It keeps a timer
//! only while the screen is visible and the player is `Running`:
//!
//! - hiding the screen cancels the timer immediately, discarding any
//!   partially elapsed interval, so no tick can fire afterwards
//! - showing it again arms a fresh timer if the player is still running
//! - every transition re-synchronises the timer (pausing, reaching a
//!   repetition exercise or finishing all cancel it)
//! - a manual advance, retreat or restart starts a fresh timer; only the
//!   automatic advance inside `advance_clock` carries the leftover time

use std::time::Duration;

use crate::player::{RoutinePlayer, TICK_INTERVAL_MS};
use crate::types::{PlaybackState, PlayerPhase, Routine};

/// An armed periodic timer with the time accumulated toward its next tick
#[derive(Debug, Default)]
struct TickTimer {
    pending_ms: u64,
}

/// Drives a [`RoutinePlayer`] from an external clock.
#[derive(Debug)]
pub struct RoutineSession {
    player: RoutinePlayer,
    timer: Option<TickTimer>,
    visible: bool,
}

impl Default for RoutineSession {
    fn default() -> Self {
        Self::new(RoutinePlayer::new())
    }
}

impl RoutineSession {
    /// Wrap a player for a screen that is currently visible
    pub fn new(player: RoutinePlayer) -> Self {
        let mut session = Self {
            player,
            timer: None,
            visible: true,
        };
        session.sync_timer();
        session
    }

    pub fn player(&self) -> &RoutinePlayer {
        &self.player
    }

    pub fn state(&self) -> PlaybackState {
        self.player.state()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while a periodic timer is armed
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&PlaybackState) + 'static,
    {
        self.player.set_listener(listener);
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Screen hidden or destroyed: cancel the timer synchronously.
    pub fn on_hide(&mut self) {
        self.visible = false;
        if self.timer.take().is_some() {
            tracing::debug!("Tick timer cancelled (screen hidden)");
        }
    }

    /// Screen visible again: re-arm the timer if playback is running.
    pub fn on_show(&mut self) {
        self.visible = true;
        self.sync_timer();
    }

    /// Feed elapsed wall-clock time, firing one tick per whole interval.
    ///
    /// Returns the number of ticks delivered to the player. Stops early
    /// when a tick cancels the timer (routine finished, repetition
    /// exercise reached).
    pub fn advance_clock(&mut self, elapsed: Duration) -> usize {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        match self.timer.as_mut() {
            Some(timer) => timer.pending_ms = timer.pending_ms.saturating_add(elapsed_ms),
            None => return 0,
        }

        let mut fired = 0;
        loop {
            match self.timer.as_mut() {
                Some(timer) if timer.pending_ms >= TICK_INTERVAL_MS => {
                    timer.pending_ms -= TICK_INTERVAL_MS;
                }
                _ => break,
            }
            self.player.tick();
            fired += 1;
            self.sync_timer();
        }
        fired
    }

    // ── User actions ─────────────────────────────────────────────────

    pub fn start(&mut self, routine: Routine) -> Option<PlaybackState> {
        // A new routine always starts with a fresh timer.
        self.timer = None;
        self.apply(|player| player.start(routine))
    }

    pub fn advance(&mut self) -> Option<PlaybackState> {
        self.apply_reload(RoutinePlayer::advance)
    }

    pub fn retreat(&mut self) -> Option<PlaybackState> {
        self.apply_reload(RoutinePlayer::retreat)
    }

    pub fn pause(&mut self) -> Option<PlaybackState> {
        self.apply(RoutinePlayer::pause)
    }

    pub fn resume(&mut self) -> Option<PlaybackState> {
        self.apply(RoutinePlayer::resume)
    }

    pub fn restart(&mut self) -> Option<PlaybackState> {
        self.apply_reload(RoutinePlayer::restart)
    }

    pub fn mark_repetition_done(&mut self) -> Option<PlaybackState> {
        self.apply(RoutinePlayer::mark_repetition_done)
    }

    pub fn finish(&mut self) -> Option<PlaybackState> {
        self.apply(RoutinePlayer::finish)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn apply<F>(&mut self, transition: F) -> Option<PlaybackState>
    where
        F: FnOnce(&mut RoutinePlayer) -> Option<PlaybackState>,
    {
        let result = transition(&mut self.player);
        self.sync_timer();
        result
    }

    /// Manual jumps reload the countdown, so any partial interval is dropped.
    fn apply_reload<F>(&mut self, transition: F) -> Option<PlaybackState>
    where
        F: FnOnce(&mut RoutinePlayer) -> Option<PlaybackState>,
    {
        let result = transition(&mut self.player);
        if result.is_some() {
            self.timer = None;
        }
        self.sync_timer();
        result
    }

    fn sync_timer(&mut self) {
        let should_run = self.visible && self.player.phase() == PlayerPhase::Running;
        match (should_run, self.timer.is_some()) {
            (true, false) => {
                self.timer = Some(TickTimer::default());
                tracing::debug!("Tick timer armed");
            }
            (false, true) => {
                self.timer = None;
                tracing::debug!("Tick timer cancelled");
            }
            _ => {}
        }
    }
}
