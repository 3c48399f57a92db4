use super::backend::{Document, StorageBackend};
use super::cache::{CacheStatus, DocumentCache, DEFAULT_MAX_AGE};
use super::{ActivityQuery, ActivityStore, WeightStore};
use crate::error::{FitError, Result};
use crate::model::{date_format, Activity, NewActivity, NewWeightEntry, Settings, WeightEntry};
use crate::validation;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A weight record as stored on disk.
///
/// Older files may lack an `id` or a `weight`; see [`JsonStore::get_weight_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(with = "date_format")]
    pub date: NaiveDateTime,
}

/// Cache diagnostics for both collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub activities: CacheStatus,
    pub weights: CacheStatus,
}

/// JSON-document store, generic over the raw I/O backend.
pub struct JsonStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    activities: DocumentCache<Vec<Activity>>,
    weights: DocumentCache<Vec<WeightRecord>>,
}

impl<B: StorageBackend> JsonStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self::with_backend_and_max_age(backend, DEFAULT_MAX_AGE)
    }

    pub fn with_backend_and_max_age(backend: B, max_age: Duration) -> Self {
        Self {
            backend,
            activities: DocumentCache::new(max_age),
            weights: DocumentCache::new(max_age),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create missing documents with their default content.
    pub fn initialize(&self) -> Result<()> {
        self.backend.ensure_documents()
    }

    // --- Generic document plumbing ---

    /// Strict load: missing document is empty, corrupt document is an error.
    fn read_collection<T: DeserializeOwned>(&self, doc: Document) -> Result<Vec<T>> {
        match self.backend.read_document(doc)? {
            None => Ok(Vec::new()),
            Some(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(FitError::Serialization),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, doc: Document, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value).map_err(FitError::Serialization)?;
        self.backend.write_document(doc, &content)
    }

    // --- Activities ---

    fn try_load_activities(&self) -> Result<Vec<Activity>> {
        let mtime = self.backend.modified(Document::Activities)?;
        if let Some(cached) = self.activities.get(mtime) {
            debug!("activities served from cache");
            return Ok(cached);
        }

        let mut activities: Vec<Activity> = self.read_collection(Document::Activities)?;
        sort_newest_first(&mut activities);
        debug!(count = activities.len(), "activities loaded from disk");
        if mtime.is_some() {
            self.activities.store(activities.clone(), mtime);
        }
        Ok(activities)
    }

    /// All activities, newest first. Never fails: a missing or corrupt
    /// document is logged and read as empty.
    pub fn load_activities(&self) -> Vec<Activity> {
        self.try_load_activities().unwrap_or_else(|e| {
            warn!(
                path = %self.backend.document_path(Document::Activities).display(),
                error = %e,
                "failed to load activities, treating as empty"
            );
            Vec::new()
        })
    }

    /// Persist the full collection atomically, then refresh the cache.
    pub fn save_activities(&self, activities: &[Activity]) -> Result<()> {
        let mut sorted = activities.to_vec();
        sort_newest_first(&mut sorted);
        if let Err(e) = self.write_json(Document::Activities, &sorted) {
            warn!(error = %e, "failed to save activities");
            return Err(e);
        }
        // The data is on disk; an unreadable mtime only costs the cache.
        match self.backend.modified(Document::Activities) {
            Ok(mtime) => self.activities.store(sorted, mtime),
            Err(e) => {
                warn!(error = %e, "activities saved but mtime unavailable, cache dropped");
                self.activities.invalidate();
            }
        }
        Ok(())
    }

    pub fn get_recent_activities(&self, limit: usize) -> Vec<Activity> {
        self.load_activities().into_iter().take(limit).collect()
    }

    pub fn clear_all_activities(&mut self) -> Result<()> {
        self.activities.invalidate();
        self.save_activities(&[])?;
        info!("all activities cleared");
        Ok(())
    }

    // --- Weight entries ---

    fn try_load_weight_records(&self) -> Result<Vec<WeightRecord>> {
        let mtime = self.backend.modified(Document::Weights)?;
        if let Some(cached) = self.weights.get(mtime) {
            debug!("weight entries served from cache");
            return Ok(cached);
        }

        let mut records: Vec<WeightRecord> = self.read_collection(Document::Weights)?;
        assign_missing_ids(&mut records);
        records.sort_by_key(|r| r.date);
        debug!(count = records.len(), "weight entries loaded from disk");
        if mtime.is_some() {
            self.weights.store(records.clone(), mtime);
        }
        Ok(records)
    }

    /// Raw weight records, oldest first. Never fails (see [`Self::load_activities`]).
    pub fn load_weight_records(&self) -> Vec<WeightRecord> {
        self.try_load_weight_records().unwrap_or_else(|e| {
            warn!(
                path = %self.backend.document_path(Document::Weights).display(),
                error = %e,
                "failed to load weight entries, treating as empty"
            );
            Vec::new()
        })
    }

    pub fn save_weight_records(&self, records: &[WeightRecord]) -> Result<()> {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.date);
        if let Err(e) = self.write_json(Document::Weights, &sorted) {
            warn!(error = %e, "failed to save weight entries");
            return Err(e);
        }
        match self.backend.modified(Document::Weights) {
            Ok(mtime) => self.weights.store(sorted, mtime),
            Err(e) => {
                warn!(error = %e, "weight entries saved but mtime unavailable, cache dropped");
                self.weights.invalidate();
            }
        }
        Ok(())
    }

    /// Entries that carry a weight, oldest first.
    pub fn load_weight_entries(&self) -> Vec<WeightEntry> {
        self.load_weight_records()
            .into_iter()
            .filter_map(|r| {
                Some(WeightEntry {
                    id: r.id?,
                    weight: r.weight?,
                    date: r.date,
                })
            })
            .collect()
    }

    /// Date-sorted weight series with gaps forward-filled: a record without a
    /// weight inherits the previous record's value. Leading gaps are dropped.
    pub fn get_weight_data(&self) -> Vec<WeightEntry> {
        let mut last: Option<f64> = None;
        let mut series = Vec::new();
        for record in self.load_weight_records() {
            let weight = record.weight.or(last);
            if let (Some(id), Some(weight)) = (record.id, weight) {
                series.push(WeightEntry {
                    id,
                    weight,
                    date: record.date,
                });
                last = Some(weight);
            }
        }
        series
    }

    pub fn clear_all_weight_entries(&mut self) -> Result<()> {
        self.weights.invalidate();
        self.save_weight_records(&[])?;
        info!("all weight entries cleared");
        Ok(())
    }

    // --- Settings ---

    /// The settings document; defaults if missing or unreadable.
    pub fn load_settings(&self) -> Settings {
        let parsed = self
            .backend
            .read_document(Document::Settings)
            .and_then(|raw| match raw {
                Some(raw) => serde_json::from_str(&raw).map_err(FitError::Serialization),
                None => Ok(Settings::default()),
            });
        parsed.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load settings, using defaults");
            Settings::default()
        })
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write_json(Document::Settings, settings).inspect_err(|e| {
            warn!(error = %e, "failed to save settings");
        })
    }

    pub fn get_weight_goal(&self) -> Option<f64> {
        self.load_settings().weight_goal
    }

    // --- Diagnostics ---

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            activities: self.activities.status(),
            weights: self.weights.status(),
        }
    }
}

impl<B: StorageBackend> ActivityStore for JsonStore<B> {
    type ActivityId = Uuid;

    fn add_activity(&mut self, activity: &NewActivity) -> Result<Uuid> {
        validation::validate_activity(activity)?;
        let activity = activity.normalized();
        let mut activities = self.try_load_activities()?;

        let id = Uuid::new_v4();
        activities.push(activity.clone().into_activity(id));
        self.save_activities(&activities)?;

        info!(%id, activity_type = %activity.activity_type, "activity added");
        Ok(id)
    }

    fn update_activity(&mut self, id: &Uuid, activity: &NewActivity) -> Result<()> {
        validation::validate_activity(activity)?;
        let activity = activity.normalized();
        let mut activities = self.try_load_activities()?;

        let existing = activities
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or_else(|| FitError::ActivityNotFound(id.to_string()))?;
        existing.apply(&activity);
        self.save_activities(&activities)?;

        info!(%id, "activity updated");
        Ok(())
    }

    fn delete_activity(&mut self, id: &Uuid) -> Result<()> {
        let mut activities = self.try_load_activities()?;
        let position = activities
            .iter()
            .position(|a| a.id == *id)
            .ok_or_else(|| FitError::ActivityNotFound(id.to_string()))?;
        activities.remove(position);
        self.save_activities(&activities)?;

        info!(%id, "activity deleted");
        Ok(())
    }

    fn list_activities(&self, query: ActivityQuery) -> Result<Vec<Activity>> {
        let matching = self
            .load_activities()
            .into_iter()
            .filter(|a| query.since.map_or(true, |since| a.date >= since));
        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }
}

impl<B: StorageBackend> WeightStore for JsonStore<B> {
    type EntryId = Uuid;

    fn add_weight_entry(&mut self, entry: &NewWeightEntry) -> Result<Uuid> {
        validation::validate_weight_entry(entry)?;
        let mut records = self.try_load_weight_records()?;

        let id = Uuid::new_v4();
        records.push(WeightRecord {
            id: Some(id),
            weight: Some(entry.weight),
            date: entry.date,
        });
        self.save_weight_records(&records)?;

        info!(%id, weight = entry.weight, "weight entry added");
        Ok(id)
    }

    fn update_weight_entry(&mut self, id: &Uuid, entry: &NewWeightEntry) -> Result<()> {
        validation::validate_weight_entry(entry)?;
        let mut records = self.try_load_weight_records()?;

        let existing = records
            .iter_mut()
            .find(|r| r.id == Some(*id))
            .ok_or_else(|| FitError::WeightEntryNotFound(id.to_string()))?;
        existing.weight = Some(entry.weight);
        existing.date = entry.date;
        self.save_weight_records(&records)?;

        info!(%id, "weight entry updated");
        Ok(())
    }

    fn delete_weight_entry(&mut self, id: &Uuid) -> Result<()> {
        let mut records = self.try_load_weight_records()?;
        let position = records
            .iter()
            .position(|r| r.id == Some(*id))
            .ok_or_else(|| FitError::WeightEntryNotFound(id.to_string()))?;
        records.remove(position);
        self.save_weight_records(&records)?;

        info!(%id, "weight entry deleted");
        Ok(())
    }

    fn weight_entries(&self) -> Result<Vec<WeightEntry>> {
        Ok(self.load_weight_entries())
    }

    fn weight_goal(&self) -> Result<Option<f64>> {
        Ok(self.get_weight_goal())
    }

    fn set_weight_goal(&mut self, goal: Option<f64>) -> Result<()> {
        validation::validate_weight_goal(goal)?;
        let mut settings = self.load_settings();
        settings.weight_goal = goal;
        self.save_settings(&settings)?;
        info!(?goal, "weight goal set");
        Ok(())
    }
}

fn sort_newest_first(activities: &mut [Activity]) {
    activities.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Gives id-less legacy records a deterministic id derived from their position
/// and content, so the same unmodified file always yields the same ids. The ids
/// reach disk with the next save.
fn assign_missing_ids(records: &mut [WeightRecord]) {
    for (index, record) in records.iter_mut().enumerate() {
        if record.id.is_none() {
            let name = format!("{}|{}|{:?}", index, record.date, record.weight);
            record.id = Some(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()));
        }
    }
}
