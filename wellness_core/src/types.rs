//! Core domain types for the wellness tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and routines played back by the routine player
//! - Playback state snapshots
//! - Records stored in the document store (profiles, habits, moods, quotes)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

// ============================================================================
// Exercise Types
// ============================================================================

/// One unit of activity inside a routine.
///
/// Either time-based (counted down by the player) or repetition-based
/// (completed manually). Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exercise {
    name: String,
    display_duration: String,
    description: String,
    duration_seconds: u32,
    is_repetition_based: bool,
    repetition_count: u32,
}

impl Exercise {
    /// A countdown exercise lasting `seconds`
    pub fn timed(name: impl Into<String>, description: impl Into<String>, seconds: u32) -> Self {
        Self {
            name: name.into(),
            display_duration: format_seconds(seconds),
            description: description.into(),
            duration_seconds: seconds,
            is_repetition_based: false,
            repetition_count: 0,
        }
    }

    /// An exercise completed manually after `count` repetitions
    pub fn repetitions(
        name: impl Into<String>,
        description: impl Into<String>,
        count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            display_duration: format!("{} reps", count),
            description: description.into(),
            duration_seconds: 0,
            is_repetition_based: true,
            repetition_count: count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_duration(&self) -> &str {
        &self.display_duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn is_repetition_based(&self) -> bool {
        self.is_repetition_based
    }

    pub fn repetition_count(&self) -> u32 {
        self.repetition_count
    }

    /// Countdown length in milliseconds; zero for repetition-based exercises
    pub fn full_duration_ms(&self) -> u64 {
        if self.is_repetition_based {
            0
        } else {
            u64::from(self.duration_seconds) * 1000
        }
    }
}

/// "45 sec", "1 min", "2 min 30 sec"
fn format_seconds(seconds: u32) -> String {
    match (seconds / 60, seconds % 60) {
        (0, s) => format!("{} sec", s),
        (m, 0) => format!("{} min", m),
        (m, s) => format!("{} min {} sec", m, s),
    }
}

/// An ordered, non-empty list of exercises selected by category
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Routine {
    category: String,
    exercises: Vec<Exercise>,
}

impl Routine {
    /// Build a routine, rejecting an empty exercise list
    pub fn new(category: impl Into<String>, exercises: Vec<Exercise>) -> Result<Self> {
        if exercises.is_empty() {
            return Err(Error::EmptyRoutine);
        }
        Ok(Self {
            category: category.into(),
            exercises,
        })
    }

    /// Catalog lists are never empty
    pub(crate) fn from_non_empty(category: String, exercises: Vec<Exercise>) -> Self {
        debug_assert!(!exercises.is_empty());
        Self {
            category,
            exercises,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Exercise> {
        self.exercises.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.exercises.len() - 1
    }
}

// ============================================================================
// Playback Types
// ============================================================================

/// Where the routine player currently is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerPhase {
    /// No routine started yet
    Idle,
    /// Counting down a timed exercise
    Running,
    /// Waiting for the user to finish a repetition-based exercise
    AwaitingRepetitions,
    /// Countdown halted; remaining time preserved
    Paused,
    /// Routine completed or exited early
    Finished,
}

impl PlayerPhase {
    /// True while a routine is loaded and not finished
    pub fn is_active(self) -> bool {
        matches!(
            self,
            PlayerPhase::Running | PlayerPhase::AwaitingRepetitions | PlayerPhase::Paused
        )
    }
}

/// Snapshot handed to the view layer after every transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub remaining_ms: u64,
    pub is_paused: bool,
    pub is_running: bool,
    pub phase: PlayerPhase,
}

impl PlaybackState {
    pub(crate) const IDLE: PlaybackState = PlaybackState {
        current_index: 0,
        remaining_ms: 0,
        is_paused: false,
        is_running: false,
        phase: PlayerPhase::Idle,
    };

    pub fn is_finished(&self) -> bool {
        self.phase == PlayerPhase::Finished
    }

    /// Remaining time rounded up to whole seconds, for display
    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_ms.div_ceil(1000)
    }
}

// ============================================================================
// Stored Records
// ============================================================================

/// Profile document created alongside an auth account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// A habit with the set of days it was completed on
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_dates: BTreeSet<NaiveDate>,
}

impl Habit {
    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    /// Consecutive completed days ending today
    ///
    /// A streak that ended yesterday still counts while today is open.
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let mut day = if self.is_completed_on(today) {
            today
        } else {
            match today.pred_opt() {
                Some(yesterday) => yesterday,
                None => return 0,
            }
        };

        let mut streak = 0;
        while self.is_completed_on(day) {
            streak += 1;
            day = match day.pred_opt() {
                Some(prev) => prev,
                None => break,
            };
        }
        streak
    }
}

/// Mood states a user can log
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodKind {
    Happy,
    Calm,
    Neutral,
    Tired,
    Sad,
    Anxious,
    Angry,
}

impl MoodKind {
    pub const ALL: [MoodKind; 7] = [
        MoodKind::Happy,
        MoodKind::Calm,
        MoodKind::Neutral,
        MoodKind::Tired,
        MoodKind::Sad,
        MoodKind::Anxious,
        MoodKind::Angry,
    ];

    /// 1 (worst) to 5 (best)
    pub fn score(self) -> u8 {
        match self {
            MoodKind::Happy => 5,
            MoodKind::Calm => 4,
            MoodKind::Neutral => 3,
            MoodKind::Tired | MoodKind::Sad | MoodKind::Anxious => 2,
            MoodKind::Angry => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoodKind::Happy => "happy",
            MoodKind::Calm => "calm",
            MoodKind::Neutral => "neutral",
            MoodKind::Tired => "tired",
            MoodKind::Sad => "sad",
            MoodKind::Anxious => "anxious",
            MoodKind::Angry => "angry",
        }
    }
}

impl fmt::Display for MoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        MoodKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "unknown mood '{}' (expected one of: {})",
                    s,
                    MoodKind::ALL.map(MoodKind::as_str).join(", ")
                ))
            })
    }
}

/// One logged mood
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub mood: MoodKind,
    #[serde(default)]
    pub note: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub logged_at: DateTime<Utc>,
}

/// A motivational quote
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_with(dates: &[NaiveDate]) -> Habit {
        Habit {
            id: "h1".into(),
            user_id: "u1".into(),
            name: "Drink water".into(),
            description: String::new(),
            created_at: Utc::now(),
            completed_dates: dates.iter().copied().collect(),
        }
    }

    #[test]
    fn test_timed_exercise_display() {
        assert_eq!(Exercise::timed("Plank", "", 45).display_duration(), "45 sec");
        assert_eq!(Exercise::timed("Run", "", 120).display_duration(), "2 min");
        assert_eq!(Exercise::timed("Row", "", 90).display_duration(), "1 min 30 sec");
    }

    #[test]
    fn test_repetition_exercise_has_no_countdown() {
        let squats = Exercise::repetitions("Squats", "", 12);
        assert!(squats.is_repetition_based());
        assert_eq!(squats.repetition_count(), 12);
        assert_eq!(squats.full_duration_ms(), 0);
        assert_eq!(squats.display_duration(), "12 reps");
    }

    #[test]
    fn test_empty_routine_rejected() {
        assert!(matches!(
            Routine::new("cardio", vec![]),
            Err(Error::EmptyRoutine)
        ));
    }

    #[test]
    fn test_mood_parse_case_insensitive() {
        assert_eq!(" Happy ".parse::<MoodKind>().unwrap(), MoodKind::Happy);
        assert_eq!("ANXIOUS".parse::<MoodKind>().unwrap(), MoodKind::Anxious);
        assert!("elated".parse::<MoodKind>().is_err());
    }

    #[test]
    fn test_streak_counts_through_today() {
        let habit = habit_with(&[day(2024, 3, 8), day(2024, 3, 9), day(2024, 3, 10)]);
        assert_eq!(habit.current_streak(day(2024, 3, 10)), 3);
    }

    #[test]
    fn test_streak_open_today_counts_yesterday() {
        let habit = habit_with(&[day(2024, 3, 8), day(2024, 3, 9)]);
        assert_eq!(habit.current_streak(day(2024, 3, 10)), 2);
    }

    #[test]
    fn test_streak_broken() {
        let habit = habit_with(&[day(2024, 3, 6), day(2024, 3, 7)]);
        assert_eq!(habit.current_streak(day(2024, 3, 10)), 0);
    }

    #[test]
    fn test_remaining_seconds_rounds_up() {
        let state = PlaybackState {
            remaining_ms: 29_001,
            ..PlaybackState::IDLE
        };
        assert_eq!(state.remaining_seconds(), 30);
    }
}
