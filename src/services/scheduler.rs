//! Adaptive daily target scheduler.
//!
//! Once per habit per calendar day, blends pace-to-deadline with yesterday's
//! performance and the user's discipline trait to produce a suggested target
//! that converges on the final goal without overshooting it.

use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use crate::database::queries;
use crate::error::{Error, Result};
use crate::models::{GoalType, Habit, TrackingEntry};
use crate::utils::{format_date, parse_date};

const OVER_PERFORM_MULTIPLIER: f64 = 1.4;
const UNDER_PERFORM_MULTIPLIER: f64 = 0.75;
// Over-performance bands: at or below 80% of target for decrease goals,
// at or above 120% for increase goals.
const DECREASE_OVER_PERFORM_RATIO: f64 = 0.8;
const INCREASE_OVER_PERFORM_RATIO: f64 = 1.2;

const HIGH_DISCIPLINE: i64 = 8;
const LOW_DISCIPLINE: i64 = 3;
const HIGH_DISCIPLINE_FACTOR: f64 = 1.2;
const LOW_DISCIPLINE_FACTOR: f64 = 0.8;

pub(crate) fn discipline_factor(discipline: i64) -> f64 {
    if discipline >= HIGH_DISCIPLINE {
        HIGH_DISCIPLINE_FACTOR
    } else if discipline <= LOW_DISCIPLINE {
        LOW_DISCIPLINE_FACTOR
    } else {
        1.0
    }
}

/// Compute the suggested target for `today` from yesterday's row (if any).
/// Pure: reads nothing but its arguments.
pub fn next_target(
    habit: &Habit,
    previous: Option<&TrackingEntry>,
    discipline: i64,
    today: NaiveDate,
) -> i64 {
    let Some(target_date) = parse_date(&habit.target_date) else {
        log::warn!(
            "habit {} has unparseable target date {:?}, holding at final goal",
            habit.id,
            habit.target_date
        );
        return habit.target_count;
    };

    let current_target = previous
        .map(|p| p.suggested_target)
        .unwrap_or(habit.baseline_count);

    let days_remaining = (target_date - today).num_days();
    if days_remaining <= 0 {
        // Deadline reached or passed: hold at the final goal.
        return habit.target_count;
    }

    let points_remaining = match habit.goal_type {
        GoalType::Decrease => current_target - habit.target_count,
        GoalType::Increase => habit.target_count - current_target,
    };
    let base_daily_change = points_remaining as f64 / days_remaining as f64;

    let performance_multiplier = match previous {
        Some(prev) if prev.suggested_target > 0 => {
            let target = prev.suggested_target as f64;
            let actual = prev.count as f64;
            match habit.goal_type {
                GoalType::Decrease => {
                    if actual <= target * DECREASE_OVER_PERFORM_RATIO {
                        OVER_PERFORM_MULTIPLIER
                    } else if actual <= target {
                        1.0
                    } else {
                        UNDER_PERFORM_MULTIPLIER
                    }
                }
                GoalType::Increase => {
                    if actual >= target * INCREASE_OVER_PERFORM_RATIO {
                        OVER_PERFORM_MULTIPLIER
                    } else if actual >= target {
                        1.0
                    } else {
                        UNDER_PERFORM_MULTIPLIER
                    }
                }
            }
        }
        _ => 1.0,
    };

    let daily_change = base_daily_change * performance_multiplier * discipline_factor(discipline);

    // The final goal is a hard clamp in either direction.
    let new_target = match habit.goal_type {
        GoalType::Decrease => (current_target as f64 - daily_change).max(habit.target_count as f64),
        GoalType::Increase => (current_target as f64 + daily_change).min(habit.target_count as f64),
    };

    new_target.round() as i64
}

/// Return today's tracking row, computing and inserting it first if absent.
/// Idempotent: a second call for the same day returns the stored row
/// unchanged. A concurrent insert losing the race is absorbed by re-reading.
pub fn ensure_today_target(
    conn: &Connection,
    habit: &Habit,
    discipline: i64,
    today: NaiveDate,
) -> Result<TrackingEntry> {
    let today_str = format_date(today);
    if let Some(existing) = queries::get_tracking_entry(conn, habit.id, &today_str)? {
        return Ok(existing);
    }

    let yesterday = format_date(today - Duration::days(1));
    let previous = queries::get_tracking_entry(conn, habit.id, &yesterday)?;
    let target = next_target(habit, previous.as_ref(), discipline, today);

    if queries::insert_tracking_entry_if_absent(conn, habit.id, &today_str, 0, target)? {
        log::info!(
            "habit {}: materialized target {} for {}",
            habit.id,
            target,
            today_str
        );
    }

    queries::get_tracking_entry(conn, habit.id, &today_str)?.ok_or_else(|| {
        Error::NotFound(format!(
            "tracking entry for habit {} on {}",
            habit.id, today_str
        ))
    })
}

/// Session-start hook: materialize today's row for every habit the user
/// owns. The discipline trait is fetched once and shared across habits.
pub fn ensure_daily_targets(
    conn: &Connection,
    username: &str,
    today: NaiveDate,
) -> Result<Vec<TrackingEntry>> {
    let discipline = queries::get_user_traits(conn, username)?
        .unwrap_or_default()
        .discipline;
    let habits = queries::list_habits(conn, username)?;

    let mut entries = Vec::with_capacity(habits.len());
    for habit in &habits {
        entries.push(ensure_today_target(conn, habit, discipline, today)?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::models::NewHabit;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(goal_type: GoalType, baseline: i64, target: i64, target_date: &str) -> Habit {
        Habit {
            id: 1,
            username: "ada".to_string(),
            name: "test habit".to_string(),
            is_positive: true,
            goal_type,
            baseline_count: baseline,
            target_count: target,
            target_date: target_date.to_string(),
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
    fn first_day_decrease_moves_one_linear_step() {
        // baseline 10 -> 0 over 10 days, neutral discipline: 10 - 1 = 9
        let h = habit(GoalType::Decrease, 10, 0, "2024-06-20");
        let today = day(2024, 6, 10);
        assert_eq!(next_target(&h, None, 5, today), 9);
    }

    #[test]
    fn under_performance_slows_a_decrease_goal() {
        // Yesterday's target was 9 but the user logged 11: over target, so
        // the 0.75 under-performance multiplier applies (not 1.4).
        let h = habit(GoalType::Decrease, 10, 0, "2024-06-20");
        let prev = entry("2024-06-10", 11, 9);
        let today = day(2024, 6, 11);
        // 9 points over 9 days = 1.0/day, * 0.75 => 9 - 0.75 = 8.25 -> 8
        assert_eq!(next_target(&h, Some(&prev), 5, today), 8);
    }

    #[test]
    fn over_performance_accelerates_a_decrease_goal() {
        let h = habit(GoalType::Decrease, 10, 0, "2024-06-20");
        // 7 <= 9 * 0.8, comfortably over-performed
        let prev = entry("2024-06-10", 7, 9);
        let today = day(2024, 6, 11);
        // 9 / 9 * 1.4 = 1.4 => 9 - 1.4 = 7.6 -> 8
        assert_eq!(next_target(&h, Some(&prev), 5, today), 8);
    }

    #[test]
    fn increase_goal_multiplier_bands() {
        let h = habit(GoalType::Increase, 0, 30, "2024-06-21");
        let today = day(2024, 6, 11);
        // 20 points over 10 days = 2.0/day base
        let met = entry("2024-06-10", 10, 10);
        assert_eq!(next_target(&h, Some(&met), 5, today), 12);
        let crushed = entry("2024-06-10", 12, 10); // >= 120%
        assert_eq!(next_target(&h, Some(&crushed), 5, today), 13); // 10 + 2.8
        let missed = entry("2024-06-10", 9, 10);
        assert_eq!(next_target(&h, Some(&missed), 5, today), 12); // 10 + 1.5 rounds up
    }

    #[test]
    fn discipline_scales_the_daily_change() {
        let h = habit(GoalType::Increase, 0, 100, "2024-06-20");
        let today = day(2024, 6, 10);
        // 100 points over 10 days = 10/day base, no previous entry
        assert_eq!(next_target(&h, None, 5, today), 10);
        assert_eq!(next_target(&h, None, 8, today), 12);
        assert_eq!(next_target(&h, None, 3, today), 8);
    }

    #[test]
    fn past_deadline_pins_to_final_goal() {
        let h = habit(GoalType::Decrease, 10, 2, "2024-06-10");
        let prev = entry("2024-06-11", 0, 5);
        assert_eq!(next_target(&h, Some(&prev), 5, day(2024, 6, 10)), 2);
        assert_eq!(next_target(&h, Some(&prev), 5, day(2024, 6, 12)), 2);
    }

    #[test]
    fn target_never_overshoots_final_goal() {
        // One day left with a big gap: clamp at target_count.
        let h = habit(GoalType::Increase, 0, 50, "2024-06-11");
        let prev = entry("2024-06-09", 45, 40);
        let today = day(2024, 6, 10);
        assert_eq!(next_target(&h, Some(&prev), 8, today), 50);
    }

    #[test]
    fn increase_targets_are_non_decreasing_until_goal() {
        let h = habit(GoalType::Increase, 5, 40, "2024-06-30");
        let mut today = day(2024, 6, 10);
        let mut prev: Option<TrackingEntry> = None;
        let mut last = h.baseline_count;
        for _ in 0..30 {
            let target = next_target(&h, prev.as_ref(), 5, today);
            assert!(target >= last, "target regressed: {} < {}", target, last);
            assert!(target <= h.target_count);
            // Simulate always meeting the suggested target exactly.
            prev = Some(entry(&format_date(today), target, target));
            last = target;
            today += Duration::days(1);
        }
        assert_eq!(last, h.target_count);
    }

    #[test]
    fn decrease_targets_are_non_increasing_until_goal() {
        let h = habit(GoalType::Decrease, 40, 5, "2024-06-30");
        let mut today = day(2024, 6, 10);
        let mut prev: Option<TrackingEntry> = None;
        let mut last = h.baseline_count;
        for _ in 0..30 {
            let target = next_target(&h, prev.as_ref(), 5, today);
            assert!(target <= last, "target regressed: {} > {}", target, last);
            assert!(target >= h.target_count);
            prev = Some(entry(&format_date(today), target, target));
            last = target;
            today += Duration::days(1);
        }
        assert_eq!(last, h.target_count);
    }

    #[test]
    fn ensure_today_target_is_idempotent() {
        let conn = database::init_in_memory().unwrap();
        let today = day(2024, 6, 10);
        let h = crate::services::habits::add_habit(
            &conn,
            NewHabit {
                username: "ada".to_string(),
                name: "pages read".to_string(),
                is_positive: true,
                goal_type: GoalType::Increase,
                baseline_count: 5,
                target_count: 50,
                target_date: "2024-06-30".to_string(),
            },
            day(2024, 6, 9),
        )
        .unwrap();

        let first = ensure_today_target(&conn, &h, 5, today).unwrap();
        let second = ensure_today_target(&conn, &h, 5, today).unwrap();
        assert_eq!(first, second);

        let rows = queries::list_tracking_entries(&conn, h.id).unwrap();
        // Day-zero row from creation plus exactly one row for today.
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn ensure_uses_yesterdays_row_not_baseline() {
        let conn = database::init_in_memory().unwrap();
        let h = crate::services::habits::add_habit(
            &conn,
            NewHabit {
                username: "ada".to_string(),
                name: "soda cans".to_string(),
                is_positive: false,
                goal_type: GoalType::Decrease,
                baseline_count: 10,
                target_count: 0,
                target_date: "2024-06-20".to_string(),
            },
            day(2024, 6, 9),
        )
        .unwrap();

        // Day zero stores the baseline as the target; the next day steps
        // down from it (met yesterday: count 0 <= 10).
        let next = ensure_today_target(&conn, &h, 5, day(2024, 6, 10)).unwrap();
        // 10 points over 10 days, over-performed (0 <= 8.0): 10 - 1.4 -> 9
        assert_eq!(next.suggested_target, 9);
        assert_eq!(next.count, 0);
    }

    #[test]
    fn ensure_daily_targets_covers_every_habit() {
        let conn = database::init_in_memory().unwrap();
        queries::insert_user(&conn, "ada", crate::models::UserTraits::default()).unwrap();
        for name in ["a", "b", "c"] {
            crate::services::habits::add_habit(
                &conn,
                NewHabit {
                    username: "ada".to_string(),
                    name: name.to_string(),
                    is_positive: true,
                    goal_type: GoalType::Increase,
                    baseline_count: 0,
                    target_count: 10,
                    target_date: "2024-07-01".to_string(),
                },
                day(2024, 6, 9),
            )
            .unwrap();
        }

        let entries = ensure_daily_targets(&conn, "ada", day(2024, 6, 10)).unwrap();
        assert_eq!(entries.len(), 3);
        for e in &entries {
            assert_eq!(e.date, "2024-06-10");
            assert_eq!(e.count, 0);
        }
    }
}
