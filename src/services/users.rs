//! User rows exist to own the trait scores; there is no authentication.

use rusqlite::Connection;

use crate::database::queries;
use crate::error::{Error, Result};
use crate::models::UserTraits;

pub fn create_user(conn: &Connection, username: &str, traits: UserTraits) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::Validation("username is required".to_string()));
    }
    if queries::user_exists(conn, username)? {
        return Err(Error::Validation(format!(
            "user {:?} already exists",
            username
        )));
    }
    queries::insert_user(conn, username, traits.clamped())
}

/// Stored traits, or all-5 defaults when the user row is missing.
pub fn get_user_traits(conn: &Connection, username: &str) -> Result<UserTraits> {
    Ok(queries::get_user_traits(conn, username)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    #[test]
    fn create_clamps_traits_and_rejects_duplicates() {
        let conn = database::init_in_memory().unwrap();
        let traits = UserTraits {
            concentration: 0,
            discipline: 14,
            motivation: 5,
            energy: 5,
        };
        create_user(&conn, "ada", traits).unwrap();

        let stored = get_user_traits(&conn, "ada").unwrap();
        assert_eq!(stored.concentration, 1);
        assert_eq!(stored.discipline, 10);

        let err = create_user(&conn, "ada", UserTraits::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn missing_users_get_neutral_traits() {
        let conn = database::init_in_memory().unwrap();
        let traits = get_user_traits(&conn, "nobody").unwrap();
        assert_eq!(traits.discipline, 5);
    }
}
