//! Aggregated statistics over mood entries and habits.

use crate::{Habit, MoodEntry, MoodKind};
use chrono::{Days, Duration, NaiveDate};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Distribution and average of a set of mood entries
#[derive(Clone, Debug, PartialEq)]
pub struct MoodSummary {
    pub total: usize,
    pub counts: BTreeMap<MoodKind, usize>,
    /// Mean of [`MoodKind::score`], `None` without entries
    pub average_score: Option<f64>,
    /// Ties go to the better mood
    pub most_frequent: Option<MoodKind>,
}

impl MoodSummary {
    pub fn from_entries(entries: &[MoodEntry]) -> Self {
        let mut counts = BTreeMap::new();
        for entry in entries {
            *counts.entry(entry.mood).or_insert(0) += 1;
        }

        let total = entries.len();
        let average_score = if total == 0 {
            None
        } else {
            let sum: u32 = entries.iter().map(|e| u32::from(e.mood.score())).sum();
            Some(f64::from(sum) / total as f64)
        };

        let most_frequent = counts
            .iter()
            .max_by_key(|(kind, count)| (**count, kind.score(), Reverse(**kind)))
            .map(|(kind, _)| *kind);

        Self {
            total,
            counts,
            average_score,
            most_frequent,
        }
    }
}

/// Average mood score per (UTC) day
pub fn daily_mood_averages(entries: &[MoodEntry]) -> BTreeMap<NaiveDate, f64> {
    let mut totals: BTreeMap<NaiveDate, (u32, u32)> = BTreeMap::new();
    for entry in entries {
        let slot = totals.entry(entry.logged_at.date_naive()).or_insert((0, 0));
        slot.0 += u32::from(entry.mood.score());
        slot.1 += 1;
    }
    totals
        .into_iter()
        .map(|(day, (sum, count))| (day, f64::from(sum) / f64::from(count)))
        .collect()
}

/// The habit with the longest running streak
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BestStreak {
    pub habit_name: String,
    pub days: u32,
}

/// Completion overview across all of a user's habits
#[derive(Clone, Debug, PartialEq)]
pub struct HabitSummary {
    pub total_habits: usize,
    pub completed_today: usize,
    pub window_days: u32,
    /// Completed habit-days over possible habit-days in the window;
    /// days before a habit existed are not counted
    pub completion_rate: Option<f64>,
    pub best_streak: Option<BestStreak>,
}

impl HabitSummary {
    pub fn compute(habits: &[Habit], today: NaiveDate, window_days: u32) -> Self {
        let window_days = window_days.max(1);
        let window_start = today
            .checked_sub_days(Days::new(u64::from(window_days) - 1))
            .unwrap_or(NaiveDate::MIN);

        let mut possible = 0u32;
        let mut completed = 0u32;
        for habit in habits {
            let first_day = habit.created_at.date_naive().max(window_start);
            let mut day = first_day;
            while day <= today {
                possible += 1;
                if habit.is_completed_on(day) {
                    completed += 1;
                }
                day += Duration::days(1);
            }
        }

        let best_streak = habits
            .iter()
            .map(|h| (h, h.current_streak(today)))
            .filter(|(_, days)| *days > 0)
            .max_by_key(|(_, days)| *days)
            .map(|(h, days)| BestStreak {
                habit_name: h.name.clone(),
                days,
            });

        Self {
            total_habits: habits.len(),
            completed_today: habits.iter().filter(|h| h.is_completed_on(today)).count(),
            window_days,
            completion_rate: if possible == 0 {
                None
            } else {
                Some(f64::from(completed) / f64::from(possible))
            },
            best_streak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn mood(kind: MoodKind, d: u32) -> MoodEntry {
        MoodEntry {
            id: String::new(),
            user_id: "u1".into(),
            mood: kind,
            note: String::new(),
            logged_at: Utc.with_ymd_and_hms(2024, 7, d, 12, 0, 0).unwrap(),
        }
    }

    fn habit(name: &str, created: u32, done: &[u32]) -> Habit {
        Habit {
            id: String::new(),
            user_id: "u1".into(),
            name: name.into(),
            description: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 7, created, 8, 0, 0).unwrap(),
            completed_dates: done.iter().map(|d| day(*d)).collect(),
        }
    }

    #[test]
    fn test_empty_mood_summary() {
        let summary = MoodSummary::from_entries(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_score, None);
        assert_eq!(summary.most_frequent, None);
    }

    #[test]
    fn test_mood_summary() {
        let entries = vec![
            mood(MoodKind::Happy, 1),
            mood(MoodKind::Sad, 2),
            mood(MoodKind::Happy, 3),
            mood(MoodKind::Angry, 4),
        ];
        let summary = MoodSummary::from_entries(&entries);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.counts[&MoodKind::Happy], 2);
        assert_eq!(summary.average_score, Some(13.0 / 4.0));
        assert_eq!(summary.most_frequent, Some(MoodKind::Happy));
    }

    #[test]
    fn test_most_frequent_tie_prefers_better_mood() {
        let entries = vec![mood(MoodKind::Sad, 1), mood(MoodKind::Calm, 2)];
        let summary = MoodSummary::from_entries(&entries);
        assert_eq!(summary.most_frequent, Some(MoodKind::Calm));
    }

    #[test]
    fn test_daily_averages() {
        let entries = vec![
            mood(MoodKind::Happy, 1),
            mood(MoodKind::Neutral, 1),
            mood(MoodKind::Angry, 2),
        ];
        let averages = daily_mood_averages(&entries);
        assert_eq!(averages[&day(1)], 4.0);
        assert_eq!(averages[&day(2)], 1.0);
    }

    #[test]
    fn test_habit_summary() {
        let habits = vec![
            // existed the whole 7-day window (4..=10): 5 of 7 done
            habit("Walk", 1, &[4, 5, 7, 9, 10]),
            // created on the 9th: 1 of 2 done
            habit("Read", 9, &[9]),
        ];
        let summary = HabitSummary::compute(&habits, day(10), 7);
        assert_eq!(summary.total_habits, 2);
        assert_eq!(summary.completed_today, 1);
        assert_eq!(summary.completion_rate, Some(6.0 / 9.0));
        assert_eq!(
            summary.best_streak,
            Some(BestStreak {
                habit_name: "Walk".into(),
                days: 2
            })
        );
    }

    #[test]
    fn test_habit_summary_without_habits() {
        let summary = HabitSummary::compute(&[], day(10), 7);
        assert_eq!(summary.completion_rate, None);
        assert_eq!(summary.best_streak, None);
    }

    #[test]
    fn test_huge_window_clamps_to_earliest_date() {
        let habits = vec![habit("Walk", 1, &[9, 10])];
        let summary = HabitSummary::compute(&habits, day(10), u32::MAX);
        assert_eq!(summary.window_days, u32::MAX);
        assert_eq!(summary.completion_rate, Some(2.0 / 10.0));
    }

    #[test]
    fn test_habit_created_after_today_is_not_counted() {
        let habits = vec![habit("Future", 20, &[])];
        let summary = HabitSummary::compute(&habits, day(10), 7);
        assert_eq!(summary.completion_rate, None);
    }
}
