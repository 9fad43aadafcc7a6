//! Routine player state machine.
//!
//! The player holds one routine and walks through it exercise by exercise.
//! It owns no timer: the caller (see [`crate::session`]) calls `tick()` once
//! per [`TICK_INTERVAL_MS`] while the phase is `Running`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |  ^
//!           v  |
//!   AwaitingRepetitions
//!
//! any active phase -> Finished
//! ```
//!
//! `AwaitingRepetitions` replaces `Running` whenever the current exercise is
//! repetition-based. Transitions that do not apply in the current phase are
//! ignored and return `None`; applied ones notify the listener and return
//! the new snapshot.

use crate::types::{Exercise, PlaybackState, PlayerPhase, Routine};

/// Length of one countdown tick.
pub const TICK_INTERVAL_MS: u64 = 1000;

type Listener = Box<dyn FnMut(&PlaybackState)>;

/// Plays back a [`Routine`], emitting a [`PlaybackState`] after each change.
pub struct RoutinePlayer {
    routine: Option<Routine>,
    state: PlaybackState,
    listener: Option<Listener>,
}

impl Default for RoutinePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoutinePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutinePlayer")
            .field("routine", &self.routine)
            .field("state", &self.state)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl RoutinePlayer {
    /// Create an idle player with no routine loaded
    pub fn new() -> Self {
        Self {
            routine: None,
            state: PlaybackState::IDLE,
            listener: None,
        }
    }

    /// Register the single listener receiving every emitted snapshot.
    ///
    /// Replaces any previously registered listener.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&PlaybackState) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn phase(&self) -> PlayerPhase {
        self.state.phase
    }

    pub fn routine(&self) -> Option<&Routine> {
        self.routine.as_ref()
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.routine.as_ref()?.get(self.state.current_index)
    }

    /// The exercise after the current one, if any
    pub fn next_exercise(&self) -> Option<&Exercise> {
        self.routine.as_ref()?.get(self.state.current_index + 1)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Load a routine and begin with its first exercise.
    ///
    /// Valid from any phase; a finished or running routine is replaced.
    pub fn start(&mut self, routine: Routine) -> Option<PlaybackState> {
        tracing::info!(
            "Starting '{}' routine with {} exercises",
            routine.category(),
            routine.len()
        );
        self.routine = Some(routine);
        self.enter_exercise(0, false)
    }

    /// Count down one interval; reaching zero advances automatically.
    pub fn tick(&mut self) -> Option<PlaybackState> {
        if self.state.phase != PlayerPhase::Running {
            return None;
        }

        self.state.remaining_ms = self.state.remaining_ms.saturating_sub(TICK_INTERVAL_MS);
        if self.state.remaining_ms == 0 {
            tracing::debug!("Exercise {} countdown expired", self.state.current_index);
            return self.advance();
        }
        Some(self.emit())
    }

    /// Move to the next exercise, or finish after the last one.
    pub fn advance(&mut self) -> Option<PlaybackState> {
        let last_index = self.active_routine()?.last_index();
        if self.state.current_index >= last_index {
            return self.finish();
        }
        self.enter_exercise(self.state.current_index + 1, false)
    }

    /// Go back one exercise. Ignored on the first exercise.
    ///
    /// A paused player stays paused on the previous exercise.
    pub fn retreat(&mut self) -> Option<PlaybackState> {
        self.active_routine()?;
        if self.state.current_index == 0 {
            return None;
        }
        let paused = self.state.phase == PlayerPhase::Paused;
        self.enter_exercise(self.state.current_index - 1, paused)
    }

    /// Halt the countdown, preserving the remaining time.
    pub fn pause(&mut self) -> Option<PlaybackState> {
        match self.state.phase {
            PlayerPhase::Running | PlayerPhase::AwaitingRepetitions => {
                self.state.phase = PlayerPhase::Paused;
                self.state.is_paused = true;
                self.state.is_running = false;
                Some(self.emit())
            }
            _ => None,
        }
    }

    /// Continue from the preserved remaining time.
    pub fn resume(&mut self) -> Option<PlaybackState> {
        if self.state.phase != PlayerPhase::Paused {
            return None;
        }
        self.set_playing();
        Some(self.emit())
    }

    /// Reset the current exercise's countdown and keep playing it.
    pub fn restart(&mut self) -> Option<PlaybackState> {
        let index = self.state.current_index;
        self.active_routine()?;
        self.enter_exercise(index, false)
    }

    /// Complete a repetition-based exercise; behaves like `advance()`.
    pub fn mark_repetition_done(&mut self) -> Option<PlaybackState> {
        let is_repetition = self
            .active_routine()?
            .get(self.state.current_index)
            .is_some_and(Exercise::is_repetition_based);
        if !is_repetition {
            return None;
        }
        self.advance()
    }

    /// Leave the routine early, regardless of position.
    pub fn finish(&mut self) -> Option<PlaybackState> {
        if !self.state.phase.is_active() {
            return None;
        }
        self.state.phase = PlayerPhase::Finished;
        self.state.is_paused = false;
        self.state.is_running = false;
        tracing::info!("Routine finished at exercise {}", self.state.current_index);
        Some(self.emit())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// The loaded routine, only while playback is active
    fn active_routine(&self) -> Option<&Routine> {
        if self.state.phase.is_active() {
            self.routine.as_ref()
        } else {
            None
        }
    }

    fn enter_exercise(&mut self, index: usize, paused: bool) -> Option<PlaybackState> {
        let full_ms = self.routine.as_ref()?.get(index)?.full_duration_ms();
        self.state.current_index = index;
        self.state.remaining_ms = full_ms;
        if paused {
            self.state.phase = PlayerPhase::Paused;
            self.state.is_paused = true;
            self.state.is_running = false;
        } else {
            self.set_playing();
        }
        Some(self.emit())
    }

    /// Running or AwaitingRepetitions, depending on the current exercise
    fn set_playing(&mut self) {
        let is_repetition = self
            .current_exercise()
            .is_some_and(Exercise::is_repetition_based);
        self.state.is_paused = false;
        if is_repetition {
            self.state.phase = PlayerPhase::AwaitingRepetitions;
            self.state.is_running = false;
            self.state.remaining_ms = 0;
        } else {
            self.state.phase = PlayerPhase::Running;
            self.state.is_running = true;
        }
    }

    fn emit(&mut self) -> PlaybackState {
        let snapshot = self.state;
        if let Some(listener) = self.listener.as_mut() {
            listener(&snapshot);
        }
        snapshot
    }
}
