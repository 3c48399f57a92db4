//! # Storage Layer
//!
//! Two interchangeable persistence backends implement the same capability
//! traits, [`ActivityStore`] and [`WeightStore`]:
//!
//! - [`fs::FileStore`]: single-user JSON documents on disk, with an
//!   in-process read cache.
//! - [`crate::db::UserStore`]: a per-user view over the SQLite database,
//!   obtained from [`crate::db::SqlStore::for_user`].
//!
//! Callers pick one at startup (see [`crate::init`]) and from then on only see
//! the traits.
//!
//! ## JSON Store Architecture
//!
//! The file store is split the same way as the rest of the storage code:
//! [`json_store::JsonStore`] holds the logic (validation, id assignment,
//! ordering, caching), and a [`backend::StorageBackend`] does the raw document
//! I/O:
//!
//! - [`fs_backend::FsBackend`]: files in a data directory, written atomically
//!   (temp file in the same directory, then rename).
//! - [`mem_backend::MemBackend`]: in-memory documents for tests, with write
//!   failure simulation.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── activities.json   # [ {id, type, duration, intensity, date, description, adaptation}, ... ]
//! ├── weight.json       # [ {id, weight, date}, ... ]
//! └── settings.json     # {"weight_goal": number | null, ...}
//! ```
//!
//! ## Ordering
//!
//! Activity listings are newest first. Weight listings are oldest first, which
//! is the order a trend chart consumes them in.
//!
//! ## Failure Semantics
//!
//! Mutations validate first, then load, mutate and save. A rejected input or a
//! failed write leaves the persisted documents untouched. Read-only listings
//! on the file store never fail: a missing or corrupt document is logged and
//! read as empty.

use crate::error::Result;
use crate::model::{Activity, ActivityStats, NewActivity, NewWeightEntry, WeightEntry};
use crate::period::{self, Period};
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

pub mod backend;
pub mod cache;
pub mod fs;
pub mod fs_backend;
pub mod json_store;
pub mod mem_backend;
pub mod memory;

/// Filter for activity listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Only activities dated at or after this instant.
    pub since: Option<NaiveDateTime>,
    /// At most this many activities (newest first).
    pub limit: Option<usize>,
}

impl ActivityQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_period(period: Period, now: NaiveDateTime) -> Self {
        Self {
            since: period.cutoff(now),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Activity persistence.
pub trait ActivityStore {
    type ActivityId: Clone + PartialEq + fmt::Debug + fmt::Display + FromStr;

    /// Validate and persist a new activity, returning its freshly assigned id.
    fn add_activity(&mut self, activity: &NewActivity) -> Result<Self::ActivityId>;

    /// Replace every mutable field of an existing activity.
    fn update_activity(&mut self, id: &Self::ActivityId, activity: &NewActivity) -> Result<()>;

    /// Hard delete. Fails with a not-found error if the id is unknown.
    fn delete_activity(&mut self, id: &Self::ActivityId) -> Result<()>;

    /// Activities matching the query, newest first.
    fn list_activities(&self, query: ActivityQuery) -> Result<Vec<Activity<Self::ActivityId>>>;

    fn activities_for_period_at(
        &self,
        period: Period,
        now: NaiveDateTime,
    ) -> Result<Vec<Activity<Self::ActivityId>>> {
        self.list_activities(ActivityQuery::for_period(period, now))
    }

    fn activities_for_period(&self, period: Period) -> Result<Vec<Activity<Self::ActivityId>>> {
        self.activities_for_period_at(period, period::now())
    }

    fn recent_activities(&self, limit: usize) -> Result<Vec<Activity<Self::ActivityId>>> {
        self.list_activities(ActivityQuery::all().with_limit(limit))
    }

    /// Count, total and mean duration over the last `period_days` days.
    fn activity_stats(&self, period_days: i64) -> Result<ActivityStats> {
        let since = period::days_before(period::now(), period_days);
        let activities = self.list_activities(ActivityQuery {
            since,
            limit: None,
        })?;
        Ok(ActivityStats::from_activities(&activities))
    }
}

/// Body-weight persistence, including the weight goal.
pub trait WeightStore {
    type EntryId: Clone + PartialEq + fmt::Debug + fmt::Display + FromStr;

    fn add_weight_entry(&mut self, entry: &NewWeightEntry) -> Result<Self::EntryId>;

    fn update_weight_entry(&mut self, id: &Self::EntryId, entry: &NewWeightEntry) -> Result<()>;

    fn delete_weight_entry(&mut self, id: &Self::EntryId) -> Result<()>;

    /// All entries, oldest first.
    fn weight_entries(&self) -> Result<Vec<WeightEntry<Self::EntryId>>>;

    fn weight_goal(&self) -> Result<Option<f64>>;

    /// `None` clears the goal.
    fn set_weight_goal(&mut self, goal: Option<f64>) -> Result<()>;
}
