//! Streak derivation over tracking history.
//!
//! A day is "met" against its own suggested target when one was set, and
//! against the habit's final goal otherwise. Directionality follows the goal
//! type: increase goals need count >= target, decrease goals count <= target.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::database::queries;
use crate::error::Result;
use crate::models::{GoalType, Habit, HabitStreaks, StreakSummary, TrackingEntry};
use crate::utils::parse_date;

pub fn goal_met(habit: &Habit, entry: &TrackingEntry) -> bool {
    let target_to_check = if entry.suggested_target > 0 {
        entry.suggested_target
    } else {
        habit.target_count
    };
    match habit.goal_type {
        GoalType::Increase => entry.count >= target_to_check,
        GoalType::Decrease => entry.count <= target_to_check,
    }
}

/// Current and longest streaks for a habit over its full history. Rows with
/// malformed dates and rows dated after `today` are skipped.
pub fn compute_streaks(habit: &Habit, entries: &[TrackingEntry], today: NaiveDate) -> StreakSummary {
    let mut days: Vec<(NaiveDate, bool)> = entries
        .iter()
        .filter_map(|entry| {
            let date = match parse_date(&entry.date) {
                Some(d) => d,
                None => {
                    log::warn!(
                        "habit {}: skipping tracking row with malformed date {:?}",
                        habit.id,
                        entry.date
                    );
                    return None;
                }
            };
            if date > today {
                return None;
            }
            Some((date, goal_met(habit, entry)))
        })
        .collect();
    days.sort_by_key(|(date, _)| *date);
    days.dedup_by_key(|(date, _)| *date);

    // Current streak: walk backward from the most recent day, stop at the
    // first miss.
    let mut current_streak = 0;
    for (_, met) in days.iter().rev() {
        if !met {
            break;
        }
        current_streak += 1;
    }

    // Longest streak: max run length over the whole history.
    let mut longest_streak = 0;
    let mut run = 0;
    for (_, met) in &days {
        if *met {
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 0;
        }
    }

    StreakSummary {
        current_streak,
        longest_streak,
    }
}

/// Streak summaries for every habit a user owns, keyed by habit id.
pub fn user_streaks(
    conn: &Connection,
    username: &str,
    today: NaiveDate,
) -> Result<BTreeMap<i64, HabitStreaks>> {
    let mut out = BTreeMap::new();
    for habit in queries::list_habits(conn, username)? {
        let entries = queries::list_tracking_entries(conn, habit.id)?;
        let summary = compute_streaks(&habit, &entries, today);
        out.insert(
            habit.id,
            HabitStreaks {
                habit_name: habit.name,
                current_streak: summary.current_streak,
                longest_streak: summary.longest_streak,
            },
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(goal_type: GoalType, target_count: i64) -> Habit {
        Habit {
            id: 1,
            username: "ada".to_string(),
            name: "test".to_string(),
            is_positive: true,
            goal_type,
            baseline_count: 0,
            target_count,
            target_date: "2030-01-01".to_string(),
        }
    }

    fn entry(date: &str, count: i64, target: i64) -> TrackingEntry {
        TrackingEntry {
            habit_id: 1,
            date: date.to_string(),
            count,
            suggested_target: target,
        }
    }

    #[test]
    fn empty_history_has_no_streaks() {
        let h = habit(GoalType::Increase, 5);
        let s = compute_streaks(&h, &[], day(2024, 6, 10));
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.longest_streak, 0);
    }

    #[test]
    fn met_met_miss_met_splits_the_runs() {
        let h = habit(GoalType::Increase, 5);
        let entries = vec![
            entry("2024-06-07", 5, 5),
            entry("2024-06-08", 6, 5),
            entry("2024-06-09", 2, 5),
            entry("2024-06-10", 5, 5),
        ];
        let s = compute_streaks(&h, &entries, day(2024, 6, 10));
        assert_eq!(s.longest_streak, 2);
        assert_eq!(s.current_streak, 1);
    }

    #[test]
    fn current_streak_is_zero_after_a_recent_miss() {
        let h = habit(GoalType::Increase, 5);
        let entries = vec![entry("2024-06-09", 7, 5), entry("2024-06-10", 1, 5)];
        let s = compute_streaks(&h, &entries, day(2024, 6, 10));
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.longest_streak, 1);
    }

    #[test]
    fn decrease_goals_count_low_days_as_met() {
        let h = habit(GoalType::Decrease, 3);
        let entries = vec![
            entry("2024-06-08", 2, 4),
            entry("2024-06-09", 4, 4),
            entry("2024-06-10", 5, 4),
        ];
        let s = compute_streaks(&h, &entries, day(2024, 6, 10));
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.longest_streak, 2);
    }

    #[test]
    fn zero_target_rows_fall_back_to_the_final_goal() {
        // Fallback-inserted rows carry target 0; they are judged against the
        // habit's target_count instead.
        let h = habit(GoalType::Increase, 3);
        let entries = vec![entry("2024-06-10", 4, 0)];
        let s = compute_streaks(&h, &entries, day(2024, 6, 10));
        assert_eq!(s.current_streak, 1);
    }

    #[test]
    fn future_and_malformed_dates_are_skipped() {
        let h = habit(GoalType::Increase, 5);
        let entries = vec![
            entry("2024-06-09", 6, 5),
            entry("garbage", 6, 5),
            entry("2024-06-10", 6, 5),
            entry("2024-06-11", 6, 5), // tomorrow
        ];
        let s = compute_streaks(&h, &entries, day(2024, 6, 10));
        assert_eq!(s.current_streak, 2);
        assert_eq!(s.longest_streak, 2);
    }

    #[test]
    fn user_streaks_reports_per_habit() {
        let conn = crate::database::init_in_memory().unwrap();
        let today = day(2024, 6, 10);
        let h = crate::services::habits::add_habit(
            &conn,
            crate::models::NewHabit {
                username: "ada".to_string(),
                name: "stretching".to_string(),
                is_positive: true,
                goal_type: GoalType::Increase,
                baseline_count: 1,
                target_count: 5,
                target_date: "2024-06-30".to_string(),
            },
            today,
        )
        .unwrap();
        // Day-zero target is 1; one increment meets it.
        crate::services::habits::increment_habit(&conn, h.id, today).unwrap();

        let streaks = user_streaks(&conn, "ada", today).unwrap();
        let mine = streaks.get(&h.id).unwrap();
        assert_eq!(mine.habit_name, "stretching");
        assert_eq!(mine.current_streak, 1);
        assert_eq!(mine.longest_streak, 1);
    }
}
