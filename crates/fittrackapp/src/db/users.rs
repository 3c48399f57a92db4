//! Accounts, credentials and preferences

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use super::{ensure_user, SqlStore};
use crate::auth;
use crate::error::{FitError, Result};
use crate::model::{PreferenceUpdate, User};
use crate::period;
use crate::validation::{self, ValidationError};

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, weight_goal, preferred_language, dark_mode, created_at";

pub(crate) fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        weight_goal: row.get("weight_goal")?,
        preferred_language: row.get("preferred_language")?,
        dark_mode: row.get("dark_mode")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
    Ok(conn
        .query_row(&sql, [username], user_from_row)
        .optional()?)
}

fn find_by_id(conn: &Connection, user_id: i64) -> Result<User> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    conn.query_row(&sql, [user_id], user_from_row)
        .optional()?
        .ok_or(FitError::UserNotFound)
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl SqlStore {
    /// Register a new account.
    ///
    /// The password is hashed before it reaches the database. Duplicate
    /// usernames or emails fail with [`FitError::Conflict`] and write nothing.
    pub fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim();
        let email = email.trim();
        validation::validate_username(username)?;
        if email.is_empty() {
            return Err(ValidationError::MissingField("email").into());
        }
        validation::validate_password(password)?;

        let password_hash = auth::hash_password(password)?;

        let user = self.unit_of_work(|tx| {
            let taken = |column: &str, value: &str| -> Result<bool> {
                let sql = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {} = ?1)", column);
                Ok(tx.query_row(&sql, [value], |row| row.get(0))?)
            };
            if taken("username", username)? {
                return Err(FitError::Conflict("Username already exists".to_string()));
            }
            if taken("email", email)? {
                return Err(FitError::Conflict("Email already exists".to_string()));
            }

            tx.execute(
                "INSERT INTO users (username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, Utc::now()],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    FitError::Conflict("Username or email already exists".to_string())
                } else {
                    FitError::Database(e)
                }
            })?;

            find_by_id(tx, tx.last_insert_rowid())
        });

        match &user {
            Ok(u) => info!(user_id = u.id, username = %u.username, "user created"),
            Err(e) => warn!(username, error = %e, "user creation failed"),
        }
        user
    }

    /// Check a username and password.
    ///
    /// Every failure, including an unknown username or a database error,
    /// surfaces as [`FitError::AuthenticationFailed`].
    pub fn authenticate_user(&self, username: &str, password: &str) -> Result<User> {
        let checked = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, password_hash FROM users WHERE username = ?1",
                USER_COLUMNS
            );
            let found = conn
                .query_row(&sql, [username], |row| {
                    Ok((user_from_row(row)?, row.get::<_, String>("password_hash")?))
                })
                .optional()?;
            match found {
                Some((user, hash)) => Ok(auth::verify_password(password, &hash)?.then_some(user)),
                None => {
                    auth::verify_unknown_user(password);
                    Ok(None)
                }
            }
        });

        match checked {
            Ok(Some(user)) => {
                debug!(user_id = user.id, "user authenticated");
                Ok(user)
            }
            Ok(None) => {
                warn!(username, "authentication failed");
                Err(FitError::AuthenticationFailed)
            }
            Err(e) => {
                warn!(username, error = %e, "authentication failed");
                Err(FitError::AuthenticationFailed)
            }
        }
    }

    /// Issue a fresh remember token (`generate = true`) or clear the current
    /// one (`generate = false`). Returns the new token when one was issued.
    pub fn set_remember_token(&self, user_id: i64, generate: bool) -> Result<Option<String>> {
        let token = generate.then(auth::generate_token);
        let issued_at = token.as_ref().map(|_| Utc::now());

        self.unit_of_work(|tx| {
            let updated = tx.execute(
                "UPDATE users SET remember_token = ?1, remember_token_issued_at = ?2
                 WHERE id = ?3",
                params![token, issued_at, user_id],
            )?;
            if updated == 0 {
                return Err(FitError::UserNotFound);
            }
            Ok(())
        })?;

        if generate {
            info!(user_id, "remember token issued");
        } else {
            info!(user_id, "remember token cleared");
        }
        Ok(token)
    }

    /// Log in with a remember token. Failures are reported like
    /// [`Self::authenticate_user`].
    pub fn authenticate_by_token(&self, username: &str, token: &str) -> Result<User> {
        if token.is_empty() {
            return Err(FitError::AuthenticationFailed);
        }
        let found = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM users WHERE username = ?1 AND remember_token = ?2",
                USER_COLUMNS
            );
            Ok(conn
                .query_row(&sql, params![username, token], user_from_row)
                .optional()?)
        });

        match found {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                warn!(username, "token authentication failed");
                Err(FitError::AuthenticationFailed)
            }
            Err(e) => {
                warn!(username, error = %e, "token authentication failed");
                Err(FitError::AuthenticationFailed)
            }
        }
    }

    /// Clear remember tokens issued more than `days_old` days ago. Returns the
    /// number of tokens cleared.
    pub fn cleanup_old_tokens(&self, days_old: i64) -> Result<usize> {
        let cutoff =
            period::days_before(Utc::now().naive_utc(), days_old).map(|dt| dt.and_utc());
        let cleared = self.unit_of_work(|tx| {
            Ok(tx.execute(
                "UPDATE users SET remember_token = NULL, remember_token_issued_at = NULL
                 WHERE remember_token IS NOT NULL
                   AND (remember_token_issued_at IS NULL OR remember_token_issued_at < ?1)",
                params![cutoff],
            )?)
        })?;
        if cleared > 0 {
            info!(cleared, days_old, "old remember tokens cleared");
        }
        Ok(cleared)
    }

    pub fn get_user_by_id(&self, user_id: i64) -> Result<User> {
        self.with_conn(|conn| find_by_id(conn, user_id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.with_conn(|conn| find_by_username(conn, username))?
            .ok_or(FitError::UserNotFound)
    }

    /// Apply whitelisted preference changes. All updates are validated first;
    /// if any is invalid nothing is written.
    pub fn update_user_preferences(
        &self,
        user_id: i64,
        updates: &[PreferenceUpdate],
    ) -> Result<User> {
        for update in updates {
            update.validate()?;
        }

        let user = self.unit_of_work(|tx| {
            ensure_user(tx, user_id)?;
            for update in updates {
                match update {
                    PreferenceUpdate::Language(lang) => tx.execute(
                        "UPDATE users SET preferred_language = ?1 WHERE id = ?2",
                        params![lang, user_id],
                    )?,
                    PreferenceUpdate::DarkMode(dark) => tx.execute(
                        "UPDATE users SET dark_mode = ?1 WHERE id = ?2",
                        params![dark, user_id],
                    )?,
                    PreferenceUpdate::WeightGoal(goal) => tx.execute(
                        "UPDATE users SET weight_goal = ?1 WHERE id = ?2",
                        params![goal, user_id],
                    )?,
                };
            }
            find_by_id(tx, user_id)
        })?;

        info!(user_id, count = updates.len(), "preferences updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Duration;

    fn store_with_bob() -> (SqlStore, User) {
        let store = SqlStore::open_in_memory().unwrap();
        let bob = store.create_user("bob", "bob@x.com", "secret1").unwrap();
        (store, bob)
    }

    #[test]
    fn create_user_sets_defaults() {
        let (_store, bob) = store_with_bob();
        assert_eq!(bob.username, "bob");
        assert_eq!(bob.preferred_language, "en");
        assert!(!bob.dark_mode);
        assert_eq!(bob.weight_goal, None);
    }

    #[test]
    fn password_is_stored_hashed() {
        let (store, bob) = store_with_bob();
        let hash: String = store
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT password_hash FROM users WHERE id = ?1",
                    [bob.id],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("secret1"));
    }

    #[test]
    fn duplicate_email_conflicts() {
        let (store, _) = store_with_bob();
        let err = store
            .create_user("robert", "bob@x.com", "secret1")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[test]
    fn registration_validates_input() {
        let store = SqlStore::open_in_memory().unwrap();
        for (name, email, password) in [
            ("al", "a@x.com", "secret1"),
            ("alice", "", "secret1"),
            ("alice", "a@x.com", "12345"),
        ] {
            let err = store.create_user(name, email, password).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert_eq!(store.stats().unwrap().user_count, 0);
    }

    #[test]
    fn authentication_failures_are_indistinguishable() {
        let (store, bob) = store_with_bob();
        assert_eq!(store.authenticate_user("bob", "secret1").unwrap().id, bob.id);

        let wrong_password = store.authenticate_user("bob", "nope").unwrap_err();
        let unknown_user = store.authenticate_user("carol", "secret1").unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn remember_token_lifecycle() {
        let (store, bob) = store_with_bob();
        let token = store.set_remember_token(bob.id, true).unwrap().unwrap();
        assert_eq!(
            store.authenticate_by_token("bob", &token).unwrap().id,
            bob.id
        );
        assert!(store.authenticate_by_token("bob", "forged").is_err());

        assert_eq!(store.set_remember_token(bob.id, false).unwrap(), None);
        assert!(store.authenticate_by_token("bob", &token).is_err());
        assert!(store.authenticate_by_token("bob", "").is_err());

        assert!(store.set_remember_token(999, true).unwrap_err().is_not_found());
    }

    #[test]
    fn cleanup_clears_only_old_tokens() {
        let store = SqlStore::open_in_memory().unwrap();
        let old = store.create_user("olduser", "o@x.com", "secret1").unwrap();
        let fresh = store.create_user("newuser", "n@x.com", "secret1").unwrap();
        store.set_remember_token(old.id, true).unwrap();
        let fresh_token = store.set_remember_token(fresh.id, true).unwrap().unwrap();

        let long_ago = Utc::now() - Duration::days(45);
        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE users SET remember_token_issued_at = ?1 WHERE id = ?2",
                    params![long_ago, old.id],
                )?;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.cleanup_old_tokens(30).unwrap(), 1);
        assert!(store
            .authenticate_by_token("newuser", &fresh_token)
            .is_ok());
        assert_eq!(store.cleanup_old_tokens(30).unwrap(), 0);
    }

    #[test]
    fn cleanup_window_past_calendar_start_keeps_issued_tokens() {
        let (store, bob) = store_with_bob();
        let token = store.set_remember_token(bob.id, true).unwrap().unwrap();

        assert_eq!(store.cleanup_old_tokens(i64::MAX).unwrap(), 0);
        assert_eq!(store.cleanup_old_tokens(200_000_000).unwrap(), 0);
        assert!(store.authenticate_by_token("bob", &token).is_ok());
    }

    #[test]
    fn preferences_are_all_or_nothing() {
        let (store, bob) = store_with_bob();
        let user = store
            .update_user_preferences(
                bob.id,
                &[
                    PreferenceUpdate::Language("fr".into()),
                    PreferenceUpdate::DarkMode(true),
                    PreferenceUpdate::WeightGoal(Some(72.5)),
                ],
            )
            .unwrap();
        assert_eq!(user.preferred_language, "fr");
        assert!(user.dark_mode);
        assert_eq!(user.weight_goal, Some(72.5));

        let err = store
            .update_user_preferences(
                bob.id,
                &[
                    PreferenceUpdate::DarkMode(false),
                    PreferenceUpdate::Language("xx".into()),
                ],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.get_user_by_id(bob.id).unwrap().dark_mode);
    }

    #[test]
    fn lookups_report_missing_users() {
        let (store, bob) = store_with_bob();
        assert_eq!(store.get_user_by_username("bob").unwrap().id, bob.id);
        assert!(store.get_user_by_id(bob.id + 1).unwrap_err().is_not_found());
        assert!(store
            .update_user_preferences(bob.id + 1, &[PreferenceUpdate::DarkMode(true)])
            .unwrap_err()
            .is_not_found());
    }
}
