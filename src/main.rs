use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;

use habitflow::database::{self, queries};
use habitflow::models::{GoalType, NewHabit, TimeRange, UserTraits};
use habitflow::services::{analytics, habits, scheduler, streaks, tasks, users};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_usage();
        return Ok(());
    };

    let db_path = PathBuf::from(
        env::var("HABITFLOW_DB").unwrap_or_else(|_| "habitflow.db".to_string()),
    );
    let conn = database::init_database(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;
    let today = Utc::now().date_naive();

    match command {
        "session" => {
            let username = arg(&args, 1, "username")?;
            if !queries::user_exists(&conn, username)? {
                users::create_user(&conn, username, session_traits(&args)?)?;
                log::info!("created user {}", username);
            }
            // Lazy daily recompute: fill in today's targets before reporting.
            scheduler::ensure_daily_targets(&conn, username, today)?;

            let habit_list = habits::list_habits(&conn, username)?;
            let mut entries = Vec::with_capacity(habit_list.len());
            for habit in &habit_list {
                entries.push(habits::today_entry(&conn, habit.id, today)?);
            }
            print_json(&json!({
                "username": username,
                "date": today.to_string(),
                "habits": habit_list,
                "today": entries,
            }))?;
        }
        "add-habit" => {
            let username = arg(&args, 1, "username")?;
            let name = arg(&args, 2, "name")?;
            let goal_type = GoalType::from_str(arg(&args, 3, "goal type")?);
            let baseline_count = parse_int(arg(&args, 4, "baseline count")?)?;
            let target_count = parse_int(arg(&args, 5, "target count")?)?;
            let target_date = arg(&args, 6, "target date")?;

            let habit = habits::add_habit(
                &conn,
                NewHabit {
                    username: username.to_string(),
                    name: name.to_string(),
                    is_positive: goal_type == GoalType::Increase,
                    goal_type,
                    baseline_count,
                    target_count,
                    target_date: target_date.to_string(),
                },
                today,
            )?;
            print_json(&habit)?;
        }
        "habits" => {
            let username = arg(&args, 1, "username")?;
            print_json(&habits::list_habits(&conn, username)?)?;
        }
        "increment" => {
            let habit_id = parse_int(arg(&args, 1, "habit id")?)?;
            print_json(&habits::increment_habit(&conn, habit_id, today)?)?;
        }
        "streaks" => {
            let username = arg(&args, 1, "username")?;
            print_json(&streaks::user_streaks(&conn, username, today)?)?;
        }
        "add-task" => {
            let username = arg(&args, 1, "username")?;
            let title = arg(&args, 2, "title")?;
            let description = args.get(3).map(String::as_str);
            print_json(&tasks::add_task(&conn, username, title, description)?)?;
        }
        "tasks" => {
            let username = arg(&args, 1, "username")?;
            print_json(&tasks::list_tasks(&conn, username)?)?;
        }
        "complete-task" => {
            let task_id = parse_int(arg(&args, 1, "task id")?)?;
            tasks::complete_task(&conn, task_id)?;
            print_json(&json!({ "id": task_id, "status": "completed" }))?;
        }
        "stats" => {
            let username = arg(&args, 1, "username")?;
            let range = TimeRange::from_str(args.get(2).map(String::as_str).unwrap_or("all_time"));
            print_stats(&conn, username, range, today)?;
        }
        "forecast" => {
            let username = arg(&args, 1, "username")?;
            print_json(&json!({
                "tasks": analytics::task_forecast(&conn, username, today)?,
                "habits": analytics::habit_forecasts(&conn, username, today)?,
            }))?;
        }
        other => {
            print_usage();
            bail!("unknown command {:?}", other);
        }
    }

    Ok(())
}

fn print_stats(
    conn: &Connection,
    username: &str,
    range: TimeRange,
    today: chrono::NaiveDate,
) -> Result<()> {
    print_json(&json!({
        "tasks": analytics::task_stats(conn, username, range, today)?,
        "task_trends": analytics::task_trends(conn, username, range, today)?,
        "task_comparison": analytics::task_comparison(conn, username, today)?,
        "habits": analytics::habit_stats(conn, username, range, today)?,
        "habit_trends": analytics::habit_trends(conn, username, range, today)?,
        "habit_comparison": analytics::habit_comparison(conn, username, today)?,
        "productivity_score": analytics::productivity_score(conn, username, range, today)?,
        "overall_trends": analytics::overall_trends(conn, username, range, today)?,
    }))?;
    Ok(())
}

/// Traits from the optional trailing `session` arguments, clamped to 1-10.
fn session_traits(args: &[String]) -> Result<UserTraits> {
    let mut traits = UserTraits::default();
    if let Some(value) = args.get(2) {
        traits.concentration = parse_int(value)?;
    }
    if let Some(value) = args.get(3) {
        traits.discipline = parse_int(value)?;
    }
    if let Some(value) = args.get(4) {
        traits.motivation = parse_int(value)?;
    }
    if let Some(value) = args.get(5) {
        traits.energy = parse_int(value)?;
    }
    Ok(traits.clamped())
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .with_context(|| format!("missing argument: {}", name))
}

fn parse_int(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .with_context(|| format!("expected a number, got {:?}", value))
}

fn print_json<T: serde::Serialize>(value: &T) -> habitflow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage() {
    eprintln!("usage: habitflow <command> [args]");
    eprintln!();
    eprintln!("  session       <username> [concentration discipline motivation energy]");
    eprintln!("  add-habit     <username> <name> <increase|decrease> <baseline> <target> <YYYY-MM-DD>");
    eprintln!("  habits        <username>");
    eprintln!("  increment     <habit-id>");
    eprintln!("  streaks       <username>");
    eprintln!("  add-task      <username> <title> [description]");
    eprintln!("  tasks         <username>");
    eprintln!("  complete-task <task-id>");
    eprintln!("  stats         <username> [today|this_week|this_month|all_time]");
    eprintln!("  forecast      <username>");
    eprintln!();
    eprintln!("database path comes from HABITFLOW_DB (default habitflow.db)");
}
