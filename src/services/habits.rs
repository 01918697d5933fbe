//! Habit definitions and per-day tracking counts.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::database::queries;
use crate::error::{Error, Result};
use crate::models::{GoalType, Habit, NewHabit, TrackingEntry};
use crate::utils::{format_date, parse_date};

/// Validate and create a habit. The day-zero tracking row is inserted in the
/// same transaction with the baseline as its suggested target, so a habit
/// created and checked the same day never runs the scheduler.
pub fn add_habit(conn: &Connection, habit: NewHabit, today: NaiveDate) -> Result<Habit> {
    if habit.username.trim().is_empty() {
        return Err(Error::Validation("username is required".to_string()));
    }
    if habit.name.trim().is_empty() {
        return Err(Error::Validation("habit name is required".to_string()));
    }
    if habit.baseline_count < 0 || habit.target_count < 0 {
        return Err(Error::Validation(
            "baseline and target counts must be non-negative".to_string(),
        ));
    }

    let target_date = parse_date(&habit.target_date).ok_or_else(|| {
        Error::Validation(format!(
            "target date {:?} is not a valid YYYY-MM-DD date",
            habit.target_date
        ))
    })?;
    if target_date <= today {
        return Err(Error::Validation(
            "target date must be in the future".to_string(),
        ));
    }

    match habit.goal_type {
        GoalType::Increase if habit.target_count <= habit.baseline_count => {
            return Err(Error::Validation(
                "an increase goal needs a target above the baseline".to_string(),
            ));
        }
        GoalType::Decrease if habit.target_count >= habit.baseline_count => {
            return Err(Error::Validation(
                "a decrease goal needs a target below the baseline".to_string(),
            ));
        }
        _ => {}
    }

    let tx = conn.unchecked_transaction()?;
    let id = queries::insert_habit(&tx, &habit)?;
    queries::insert_tracking_entry(&tx, id, &format_date(today), 0, habit.baseline_count)?;
    tx.commit()?;

    queries::get_habit(conn, id)?
        .ok_or_else(|| Error::NotFound(format!("habit {} after insert", id)))
}

pub fn get_habit(conn: &Connection, habit_id: i64) -> Result<Habit> {
    queries::get_habit(conn, habit_id)?
        .ok_or_else(|| Error::NotFound(format!("habit {}", habit_id)))
}

pub fn list_habits(conn: &Connection, username: &str) -> Result<Vec<Habit>> {
    queries::list_habits(conn, username)
}

/// Add one to today's count and return the updated row. When today's row is
/// missing (the scheduler has not run) a fallback row is inserted with the
/// increment already applied and no target.
pub fn increment_habit(conn: &Connection, habit_id: i64, today: NaiveDate) -> Result<TrackingEntry> {
    // Surface unknown ids as NotFound rather than a silent zero-row update.
    let _ = get_habit(conn, habit_id)?;

    let date = format_date(today);
    if queries::increment_count(conn, habit_id, &date)? == 0 {
        if !queries::insert_tracking_entry_if_absent(conn, habit_id, &date, 1, 0)? {
            // Lost a race with a concurrent insert; count the increment there.
            queries::increment_count(conn, habit_id, &date)?;
        }
    }

    queries::get_tracking_entry(conn, habit_id, &date)?.ok_or_else(|| {
        Error::NotFound(format!("tracking entry for habit {} on {}", habit_id, date))
    })
}

pub fn today_entry(
    conn: &Connection,
    habit_id: i64,
    today: NaiveDate,
) -> Result<Option<TrackingEntry>> {
    queries::get_tracking_entry(conn, habit_id, &format_date(today))
}

pub fn delete_habit(conn: &Connection, habit_id: i64) -> Result<()> {
    if queries::delete_habit(conn, habit_id)? == 0 {
        return Err(Error::NotFound(format!("habit {}", habit_id)));
    }
    Ok(())
}

/// Estimated average daily change for a prospective habit, with the
/// discipline factor applied. Used to sanity-check goals before creation.
pub fn pace_preview(
    baseline: i64,
    target: i64,
    target_date: &str,
    discipline: i64,
    today: NaiveDate,
) -> Result<f64> {
    let target_date = parse_date(target_date).ok_or_else(|| {
        Error::Validation(format!(
            "target date {:?} is not a valid YYYY-MM-DD date",
            target_date
        ))
    })?;

    let days = (target_date - today).num_days();
    if days <= 0 {
        return Err(Error::Validation(
            "target date must be in the future".to_string(),
        ));
    }

    let avg_daily = (target - baseline).abs() as f64 / days as f64;
    Ok(avg_daily * super::scheduler::discipline_factor(discipline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_habit(goal_type: GoalType, baseline: i64, target: i64, date: &str) -> NewHabit {
        NewHabit {
            username: "ada".to_string(),
            name: "water glasses".to_string(),
            is_positive: true,
            goal_type,
            baseline_count: baseline,
            target_count: target,
            target_date: date.to_string(),
        }
    }

    #[test]
    fn add_habit_inserts_day_zero_row_at_baseline() {
        let conn = database::init_in_memory().unwrap();
        let today = day(2024, 6, 10);
        let habit =
            add_habit(&conn, new_habit(GoalType::Increase, 2, 8, "2024-06-30"), today).unwrap();

        let entry = today_entry(&conn, habit.id, today).unwrap().unwrap();
        assert_eq!(entry.count, 0);
        assert_eq!(entry.suggested_target, 2);
    }

    #[test]
    fn add_habit_rejects_past_and_same_day_target_dates() {
        let conn = database::init_in_memory().unwrap();
        let today = day(2024, 6, 10);
        for date in ["2024-06-10", "2024-06-01", "junk"] {
            let err = add_habit(&conn, new_habit(GoalType::Increase, 0, 5, date), today)
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{:?}", err);
        }
    }

    #[test]
    fn add_habit_rejects_inconsistent_goal_direction() {
        let conn = database::init_in_memory().unwrap();
        let today = day(2024, 6, 10);

        let err = add_habit(&conn, new_habit(GoalType::Increase, 8, 2, "2024-06-30"), today)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = add_habit(&conn, new_habit(GoalType::Decrease, 2, 8, "2024-06-30"), today)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn add_habit_rejects_negative_counts() {
        let conn = database::init_in_memory().unwrap();
        let err = add_habit(
            &conn,
            new_habit(GoalType::Increase, -1, 5, "2024-06-30"),
            day(2024, 6, 10),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn increment_bumps_today_and_only_today() {
        let conn = database::init_in_memory().unwrap();
        let today = day(2024, 6, 10);
        let habit =
            add_habit(&conn, new_habit(GoalType::Increase, 0, 5, "2024-06-30"), today).unwrap();

        increment_habit(&conn, habit.id, today).unwrap();
        let entry = increment_habit(&conn, habit.id, today).unwrap();
        assert_eq!(entry.count, 2);
        // Day-zero target stays at the baseline (0 for this habit).
        assert_eq!(entry.suggested_target, 0);
        assert!(today_entry(&conn, habit.id, day(2024, 6, 11))
            .unwrap()
            .is_none());
    }

    #[test]
    fn increment_without_todays_row_inserts_fallback() {
        let conn = database::init_in_memory().unwrap();
        let habit = add_habit(
            &conn,
            new_habit(GoalType::Increase, 0, 5, "2024-06-30"),
            day(2024, 6, 10),
        )
        .unwrap();

        // Next day, scheduler never ran.
        let entry = increment_habit(&conn, habit.id, day(2024, 6, 11)).unwrap();
        assert_eq!(entry.count, 1);
        assert_eq!(entry.suggested_target, 0);
    }

    #[test]
    fn increment_unknown_habit_is_not_found() {
        let conn = database::init_in_memory().unwrap();
        let err = increment_habit(&conn, 999, day(2024, 6, 10)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn delete_cascades_tracking_rows() {
        let conn = database::init_in_memory().unwrap();
        let today = day(2024, 6, 10);
        let habit =
            add_habit(&conn, new_habit(GoalType::Increase, 0, 5, "2024-06-30"), today).unwrap();
        increment_habit(&conn, habit.id, today).unwrap();

        delete_habit(&conn, habit.id).unwrap();
        let rows = queries::list_tracking_entries(&conn, habit.id).unwrap();
        assert!(rows.is_empty());

        let err = delete_habit(&conn, habit.id).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn pace_preview_applies_discipline() {
        let today = day(2024, 6, 10);
        let base = pace_preview(0, 20, "2024-06-20", 5, today).unwrap();
        assert!((base - 2.0).abs() < 1e-9);
        let driven = pace_preview(0, 20, "2024-06-20", 9, today).unwrap();
        assert!((driven - 2.4).abs() < 1e-9);
        let relaxed = pace_preview(0, 20, "2024-06-20", 2, today).unwrap();
        assert!((relaxed - 1.6).abs() < 1e-9);

        assert!(pace_preview(0, 20, "2024-06-10", 5, today).is_err());
    }
}
