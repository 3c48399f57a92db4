//! Activity rows and the [`ActivityStore`] implementation for [`UserStore`]

use chrono::{NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use super::{ensure_user, SqlStore, UserStore};
use crate::error::{FitError, Result};
use crate::model::{round_one_decimal, Activity, ActivityStats, Intensity, NewActivity};
use crate::period::{self, Period};
use crate::store::{ActivityQuery, ActivityStore};
use crate::validation;

pub(crate) const ACTIVITY_COLUMNS: &str =
    "a.id, a.type, a.duration, a.intensity, a.date, a.description, a.adaptation";

impl ToSql for Intensity {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Intensity {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

pub(crate) fn activity_from_row(row: &Row) -> rusqlite::Result<Activity<i64>> {
    Ok(Activity {
        id: row.get(0)?,
        activity_type: row.get(1)?,
        duration: row.get(2)?,
        intensity: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        adaptation: row.get(6)?,
    })
}

/// Activities of one user, newest first.
fn select_activities(
    conn: &Connection,
    user_id: i64,
    since: Option<NaiveDateTime>,
    limit: usize,
) -> Result<Vec<Activity<i64>>> {
    let sql = format!(
        "SELECT {} FROM activities a
         WHERE a.user_id = ?1 AND (?2 IS NULL OR a.date >= ?2)
         ORDER BY a.date DESC, a.id DESC
         LIMIT ?3",
        ACTIVITY_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, since, limit as i64], activity_from_row)?;
    let activities = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(user_id, count = activities.len(), "activities queried");
    Ok(activities)
}

impl SqlStore {
    /// A user's activities within `period`, newest first, at most `limit`
    /// (or the configured query limit).
    pub fn get_user_activities(
        &self,
        user_id: i64,
        period: Period,
        limit: Option<usize>,
    ) -> Result<Vec<Activity<i64>>> {
        let since = period.cutoff(period::now());
        let limit = limit.unwrap_or(self.query_limit);
        self.with_conn(|conn| select_activities(conn, user_id, since, limit))
    }

    /// Count, total and mean duration of a user's activities over the last
    /// `period_days` days.
    pub fn activity_statistics(&self, user_id: i64, period_days: i64) -> Result<ActivityStats> {
        let since = period::days_before(period::now(), period_days);
        self.with_conn(|conn| {
            let (count, total, avg): (i64, i64, Option<f64>) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration), 0), AVG(duration)
                 FROM activities WHERE user_id = ?1 AND (?2 IS NULL OR date >= ?2)",
                params![user_id, since],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            Ok(ActivityStats {
                total_activities: count as u64,
                total_duration: total,
                avg_duration: avg.map(round_one_decimal).unwrap_or(0.0),
            })
        })
    }
}

impl ActivityStore for UserStore<'_> {
    type ActivityId = i64;

    fn add_activity(&mut self, activity: &NewActivity) -> Result<i64> {
        validation::validate_activity(activity)?;
        let activity = activity.normalized();
        let user_id = self.user_id;

        let id = self.db.unit_of_work(|tx| {
            ensure_user(tx, user_id)?;
            tx.execute(
                "INSERT INTO activities
                    (user_id, type, duration, intensity, date, description, adaptation, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user_id,
                    activity.activity_type,
                    activity.duration,
                    activity.intensity,
                    activity.date,
                    activity.description,
                    activity.adaptation,
                    Utc::now(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        info!(user_id, id, activity_type = %activity.activity_type, "activity added");
        Ok(id)
    }

    fn update_activity(&mut self, id: &i64, activity: &NewActivity) -> Result<()> {
        validation::validate_activity(activity)?;
        let activity = activity.normalized();
        let user_id = self.user_id;

        self.db.unit_of_work(|tx| {
            let updated = tx.execute(
                "UPDATE activities
                 SET type = ?1, duration = ?2, intensity = ?3, date = ?4,
                     description = ?5, adaptation = ?6
                 WHERE id = ?7 AND user_id = ?8",
                params![
                    activity.activity_type,
                    activity.duration,
                    activity.intensity,
                    activity.date,
                    activity.description,
                    activity.adaptation,
                    id,
                    user_id,
                ],
            )?;
            if updated == 0 {
                return Err(FitError::ActivityNotFound(id.to_string()));
            }
            Ok(())
        })?;

        info!(user_id, id, "activity updated");
        Ok(())
    }

    fn delete_activity(&mut self, id: &i64) -> Result<()> {
        let user_id = self.user_id;
        self.db.unit_of_work(|tx| {
            let deleted = tx.execute(
                "DELETE FROM activities WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            if deleted == 0 {
                return Err(FitError::ActivityNotFound(id.to_string()));
            }
            Ok(())
        })?;

        info!(user_id, id, "activity deleted");
        Ok(())
    }

    fn list_activities(&self, query: ActivityQuery) -> Result<Vec<Activity<i64>>> {
        let limit = query.limit.unwrap_or(self.db.query_limit);
        self.db
            .with_conn(|conn| select_activities(conn, self.user_id, query.since, limit))
    }

    fn activity_stats(&self, period_days: i64) -> Result<ActivityStats> {
        self.db.activity_statistics(self.user_id, period_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;
    use chrono::Duration;

    fn setup() -> (SqlStore, User, User) {
        let store = SqlStore::open_in_memory().unwrap();
        let alice = store.create_user("alice", "a@x.com", "secret1").unwrap();
        let bob = store.create_user("bob", "b@x.com", "secret1").unwrap();
        (store, alice, bob)
    }

    fn run(days_ago: i64, duration: i64) -> NewActivity {
        NewActivity::new(
            "Running",
            duration,
            Intensity::Medium,
            period::now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn add_and_list_round_trip() {
        let (store, alice, _) = setup();
        let mut view = store.for_user(alice.id);
        let input = run(1, 45)
            .with_description("easy")
            .with_adaptation("Endurance");
        let id = view.add_activity(&input).unwrap();

        let listed = view.list_activities(ActivityQuery::all()).unwrap();
        assert_eq!(listed, vec![input.into_activity(id)]);
    }

    #[test]
    fn ids_are_not_reused() {
        let (store, alice, _) = setup();
        let mut view = store.for_user(alice.id);
        let first = view.add_activity(&run(0, 30)).unwrap();
        view.delete_activity(&first).unwrap();
        let second = view.add_activity(&run(0, 30)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn other_users_rows_are_out_of_reach() {
        let (store, alice, bob) = setup();
        let id = store.for_user(alice.id).add_activity(&run(0, 30)).unwrap();

        let mut bob_view = store.for_user(bob.id);
        assert!(bob_view
            .update_activity(&id, &run(0, 60))
            .unwrap_err()
            .is_not_found());
        assert!(bob_view.delete_activity(&id).unwrap_err().is_not_found());
        assert!(bob_view
            .list_activities(ActivityQuery::all())
            .unwrap()
            .is_empty());

        let alices = store.for_user(alice.id).recent_activities(10).unwrap();
        assert_eq!(alices[0].duration, 30);
    }

    #[test]
    fn add_for_unknown_user_fails() {
        let (store, _, _) = setup();
        let err = store.for_user(999).add_activity(&run(0, 30)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.stats().unwrap().activity_count, 0);
    }

    #[test]
    fn invalid_activity_writes_nothing() {
        let (store, alice, _) = setup();
        let mut view = store.for_user(alice.id);
        assert!(view.add_activity(&run(0, 0)).is_err());
        assert!(view.add_activity(&run(0, 1441)).is_err());
        assert_eq!(store.stats().unwrap().activity_count, 0);
    }

    #[test]
    fn period_listing_and_limit() {
        let (store, alice, _) = setup();
        let mut view = store.for_user(alice.id);
        for days in [0, 10, 40] {
            view.add_activity(&run(days, 30)).unwrap();
        }

        assert_eq!(
            store
                .get_user_activities(alice.id, Period::Week, None)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            store
                .get_user_activities(alice.id, Period::Month, None)
                .unwrap()
                .len(),
            2
        );
        let all = store
            .get_user_activities(alice.id, Period::AllTime, Some(2))
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].date > all[1].date);
    }

    #[test]
    fn unbounded_listing_is_capped() {
        let store = SqlStore::open_in_memory().unwrap().with_query_limit(2);
        let alice = store.create_user("alice", "a@x.com", "secret1").unwrap();
        let mut view = store.for_user(alice.id);
        for days in 0..3 {
            view.add_activity(&run(days, 30)).unwrap();
        }
        assert_eq!(view.list_activities(ActivityQuery::all()).unwrap().len(), 2);
    }

    #[test]
    fn statistics_aggregate_window() {
        let (store, alice, _) = setup();
        let mut view = store.for_user(alice.id);
        view.add_activity(&run(1, 30)).unwrap();
        view.add_activity(&run(2, 45)).unwrap();
        view.add_activity(&run(3, 50)).unwrap();
        view.add_activity(&run(60, 90)).unwrap();

        let stats = store.activity_statistics(alice.id, 30).unwrap();
        assert_eq!(stats.total_activities, 3);
        assert_eq!(stats.total_duration, 125);
        assert_eq!(stats.avg_duration, 41.7);
        assert_eq!(view.activity_stats(30).unwrap(), stats);

        let empty = store.activity_statistics(alice.id, 0).unwrap();
        assert_eq!(empty, ActivityStats::default());
    }

    #[test]
    fn statistics_window_past_calendar_start_counts_everything() {
        let (store, alice, _) = setup();
        let mut view = store.for_user(alice.id);
        view.add_activity(&run(1, 30)).unwrap();
        view.add_activity(&run(4000, 60)).unwrap();

        let stats = store.activity_statistics(alice.id, 200_000_000).unwrap();
        assert_eq!(stats.total_activities, 2);
        assert_eq!(stats.total_duration, 90);
        assert_eq!(view.activity_stats(i64::MAX).unwrap(), stats);
    }

    #[test]
    fn empty_text_fields_read_back_as_absent() {
        let (store, alice, _) = setup();
        let mut view = store.for_user(alice.id);
        let input = run(0, 30).with_description("").with_adaptation("");
        let id = view.add_activity(&input).unwrap();

        let listed = view.list_activities(ActivityQuery::all()).unwrap();
        assert_eq!(listed, vec![input.normalized().into_activity(id)]);
        assert_eq!(listed[0].description, None);
        assert_eq!(listed[0].adaptation, None);
    }
}
