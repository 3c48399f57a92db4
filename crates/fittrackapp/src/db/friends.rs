//! Friendships and the friends' activity feed

use chrono::Utc;
use rusqlite::params;
use tracing::info;

use super::activities::{activity_from_row, ACTIVITY_COLUMNS};
use super::users::{find_by_username, user_from_row};
use super::{ensure_user, SqlStore};
use crate::error::{FitError, Result};
use crate::model::{FriendActivity, User};
use crate::validation::ValidationError;

impl SqlStore {
    /// Befriend the user named `friend_username`. Both directions of the
    /// relation are stored. Returns the friend.
    pub fn add_friend(&self, user_id: i64, friend_username: &str) -> Result<User> {
        let friend = self.unit_of_work(|tx| {
            ensure_user(tx, user_id)?;
            let friend = find_by_username(tx, friend_username.trim())?
                .ok_or(FitError::UserNotFound)?;
            if friend.id == user_id {
                return Err(ValidationError::SelfFriendship.into());
            }

            let already: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM friendships WHERE user_id = ?1 AND friend_id = ?2)",
                params![user_id, friend.id],
                |row| row.get(0),
            )?;
            if already {
                return Err(FitError::Conflict("Already friends".to_string()));
            }

            let now = Utc::now();
            let mut insert = tx.prepare(
                "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at)
                 VALUES (?1, ?2, ?3)",
            )?;
            insert.execute(params![user_id, friend.id, now])?;
            insert.execute(params![friend.id, user_id, now])?;
            Ok(friend)
        })?;

        info!(user_id, friend_id = friend.id, "friend added");
        Ok(friend)
    }

    /// The user's friends, by username.
    pub fn get_user_friends(&self, user_id: i64) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.email, u.weight_goal, u.preferred_language,
                        u.dark_mode, u.created_at
                 FROM friendships f
                 JOIN users u ON u.id = f.friend_id
                 WHERE f.user_id = ?1
                 ORDER BY u.username",
            )?;
            let rows = stmt.query_map([user_id], user_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Activities of all the user's friends, newest first, at most `limit`.
    pub fn get_friends_recent_activities(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<FriendActivity>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, u.username FROM activities a
                 JOIN friendships f ON f.friend_id = a.user_id
                 JOIN users u ON u.id = a.user_id
                 WHERE f.user_id = ?1
                 ORDER BY a.date DESC, a.id DESC
                 LIMIT ?2",
                ACTIVITY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id, limit as i64], |row| {
                Ok(FriendActivity {
                    activity: activity_from_row(row)?,
                    username: row.get(7)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }
}
