//! Weight entry rows and the [`WeightStore`] implementation for [`UserStore`]

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::{ensure_user, SqlStore, UserStore};
use crate::error::{FitError, Result};
use crate::model::{NewWeightEntry, WeightEntry};
use crate::store::WeightStore;
use crate::validation;

fn weight_from_row(row: &Row) -> rusqlite::Result<WeightEntry<i64>> {
    Ok(WeightEntry {
        id: row.get("id")?,
        weight: row.get("weight")?,
        date: row.get("date")?,
    })
}

fn select_weights(conn: &Connection, user_id: i64) -> Result<Vec<WeightEntry<i64>>> {
    let mut stmt = conn.prepare(
        "SELECT id, weight, date FROM weight_entries
         WHERE user_id = ?1
         ORDER BY date ASC, id ASC",
    )?;
    let rows = stmt.query_map([user_id], weight_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

impl SqlStore {
    /// A user's weight entries, oldest first.
    pub fn get_user_weight_data(&self, user_id: i64) -> Result<Vec<WeightEntry<i64>>> {
        self.with_conn(|conn| select_weights(conn, user_id))
    }
}

impl WeightStore for UserStore<'_> {
    type EntryId = i64;

    fn add_weight_entry(&mut self, entry: &NewWeightEntry) -> Result<i64> {
        validation::validate_weight_entry(entry)?;
        let user_id = self.user_id;

        let id = self.db.unit_of_work(|tx| {
            ensure_user(tx, user_id)?;
            tx.execute(
                "INSERT INTO weight_entries (user_id, weight, date, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, entry.weight, entry.date, Utc::now()],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        info!(user_id, id, weight = entry.weight, "weight entry added");
        Ok(id)
    }

    fn update_weight_entry(&mut self, id: &i64, entry: &NewWeightEntry) -> Result<()> {
        validation::validate_weight_entry(entry)?;
        let user_id = self.user_id;

        self.db.unit_of_work(|tx| {
            let updated = tx.execute(
                "UPDATE weight_entries SET weight = ?1, date = ?2
                 WHERE id = ?3 AND user_id = ?4",
                params![entry.weight, entry.date, id, user_id],
            )?;
            if updated == 0 {
                return Err(FitError::WeightEntryNotFound(id.to_string()));
            }
            Ok(())
        })?;

        info!(user_id, id, "weight entry updated");
        Ok(())
    }

    fn delete_weight_entry(&mut self, id: &i64) -> Result<()> {
        let user_id = self.user_id;
        self.db.unit_of_work(|tx| {
            let deleted = tx.execute(
                "DELETE FROM weight_entries WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            if deleted == 0 {
                return Err(FitError::WeightEntryNotFound(id.to_string()));
            }
            Ok(())
        })?;

        info!(user_id, id, "weight entry deleted");
        Ok(())
    }

    fn weight_entries(&self) -> Result<Vec<WeightEntry<i64>>> {
        self.db.get_user_weight_data(self.user_id)
    }

    fn weight_goal(&self) -> Result<Option<f64>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT weight_goal FROM users WHERE id = ?1",
                [self.user_id],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()?
            .ok_or(FitError::UserNotFound)
        })
    }

    fn set_weight_goal(&mut self, goal: Option<f64>) -> Result<()> {
        validation::validate_weight_goal(goal)?;
        let user_id = self.user_id;
        self.db.unit_of_work(|tx| {
            let updated = tx.execute(
                "UPDATE users SET weight_goal = ?1 WHERE id = ?2",
                params![goal, user_id],
            )?;
            if updated == 0 {
                return Err(FitError::UserNotFound);
            }
            Ok(())
        })?;
        info!(user_id, ?goal, "weight goal set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period;
    use chrono::Duration;

    #[test]
    fn update_replaces_single_entry() {
        let store = SqlStore::open_in_memory().unwrap();
        let alice = store.create_user("alice", "a@x.com", "secret1").unwrap();
        let mut view = store.for_user(alice.id);
        let date = period::now();

        let id = view
            .add_weight_entry(&NewWeightEntry::new(71.5, date))
            .unwrap();
        view.update_weight_entry(&id, &NewWeightEntry::new(70.0, date))
            .unwrap();

        let entries = view.weight_entries().unwrap();
        assert_eq!(entries, vec![WeightEntry { id, weight: 70.0, date }]);
    }

    #[test]
    fn entries_are_oldest_first_and_scoped() {
        let store = SqlStore::open_in_memory().unwrap();
        let alice = store.create_user("alice", "a@x.com", "secret1").unwrap();
        let bob = store.create_user("bob", "b@x.com", "secret1").unwrap();
        let now = period::now();

        let mut view = store.for_user(alice.id);
        view.add_weight_entry(&NewWeightEntry::new(70.0, now))
            .unwrap();
        let older = view
            .add_weight_entry(&NewWeightEntry::new(72.0, now - Duration::days(7)))
            .unwrap();

        let weights: Vec<f64> = store
            .get_user_weight_data(alice.id)
            .unwrap()
            .iter()
            .map(|e| e.weight)
            .collect();
        assert_eq!(weights, vec![72.0, 70.0]);

        let mut bob_view = store.for_user(bob.id);
        assert!(bob_view.delete_weight_entry(&older).unwrap_err().is_not_found());
        assert!(bob_view.weight_entries().unwrap().is_empty());
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let store = SqlStore::open_in_memory().unwrap();
        let alice = store.create_user("alice", "a@x.com", "secret1").unwrap();
        let mut view = store.for_user(alice.id);
        assert!(view
            .add_weight_entry(&NewWeightEntry::new(15.0, period::now()))
            .is_err());
        assert_eq!(store.stats().unwrap().weight_entry_count, 0);
    }

    #[test]
    fn weight_goal_lives_on_the_user() {
        let store = SqlStore::open_in_memory().unwrap();
        let alice = store.create_user("alice", "a@x.com", "secret1").unwrap();
        let mut view = store.for_user(alice.id);

        assert_eq!(view.weight_goal().unwrap(), None);
        view.set_weight_goal(Some(65.0)).unwrap();
        assert_eq!(view.weight_goal().unwrap(), Some(65.0));
        assert_eq!(store.get_user_by_id(alice.id).unwrap().weight_goal, Some(65.0));

        assert!(store.for_user(999).weight_goal().unwrap_err().is_not_found());
        assert!(store
            .for_user(999)
            .set_weight_goal(Some(65.0))
            .unwrap_err()
            .is_not_found());
    }
}
