//! Task CRUD. Thin wrappers over the query layer with input validation.

use rusqlite::Connection;

use crate::database::queries;
use crate::error::{Error, Result};
use crate::models::{Task, STATUS_COMPLETED, STATUS_PENDING};

pub fn add_task(
    conn: &Connection,
    username: &str,
    title: &str,
    description: Option<&str>,
) -> Result<Task> {
    if username.trim().is_empty() || title.trim().is_empty() {
        return Err(Error::Validation(
            "username and title are required".to_string(),
        ));
    }
    queries::insert_task(conn, username, title, description)
}

pub fn list_tasks(conn: &Connection, username: &str) -> Result<Vec<Task>> {
    queries::list_tasks(conn, username)
}

pub fn set_task_status(conn: &Connection, task_id: i64, status: &str) -> Result<()> {
    if status != STATUS_PENDING && status != STATUS_COMPLETED {
        return Err(Error::Validation(format!("unknown status {:?}", status)));
    }
    if queries::update_task_status(conn, task_id, status)? == 0 {
        return Err(Error::NotFound(format!("task {}", task_id)));
    }
    Ok(())
}

pub fn complete_task(conn: &Connection, task_id: i64) -> Result<()> {
    set_task_status(conn, task_id, STATUS_COMPLETED)
}

pub fn delete_task(conn: &Connection, task_id: i64) -> Result<()> {
    if queries::delete_task(conn, task_id)? == 0 {
        return Err(Error::NotFound(format!("task {}", task_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    #[test]
    fn add_and_list_newest_first() {
        let conn = database::init_in_memory().unwrap();
        add_task(&conn, "ada", "write report", None).unwrap();
        add_task(&conn, "ada", "file taxes", Some("before deadline")).unwrap();

        let tasks = list_tasks(&conn, "ada").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "file taxes");
        assert_eq!(tasks[1].title, "write report");
        assert_eq!(tasks[0].status, STATUS_PENDING);
    }

    #[test]
    fn add_task_requires_title_and_username() {
        let conn = database::init_in_memory().unwrap();
        assert!(matches!(
            add_task(&conn, "", "x", None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            add_task(&conn, "ada", "  ", None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn complete_then_reopen() {
        let conn = database::init_in_memory().unwrap();
        let task = add_task(&conn, "ada", "water plants", None).unwrap();

        complete_task(&conn, task.id).unwrap();
        assert_eq!(list_tasks(&conn, "ada").unwrap()[0].status, STATUS_COMPLETED);

        set_task_status(&conn, task.id, STATUS_PENDING).unwrap();
        assert_eq!(list_tasks(&conn, "ada").unwrap()[0].status, STATUS_PENDING);

        assert!(matches!(
            set_task_status(&conn, task.id, "paused"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn missing_ids_surface_not_found() {
        let conn = database::init_in_memory().unwrap();
        assert!(matches!(complete_task(&conn, 7), Err(Error::NotFound(_))));
        assert!(matches!(delete_task(&conn, 7), Err(Error::NotFound(_))));
    }
}
