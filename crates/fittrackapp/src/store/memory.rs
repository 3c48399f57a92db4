use super::json_store::JsonStore;
use super::mem_backend::MemBackend;

pub type InMemoryStore = JsonStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        JsonStore::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Intensity, NewActivity, NewWeightEntry};
    use crate::store::{ActivityStore, WeightStore};
    use chrono::{Duration, NaiveDateTime};

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        /// One activity per entry of `days_ago`, counted back from `now`.
        pub fn with_activities_days_ago(mut self, now: NaiveDateTime, days_ago: &[i64]) -> Self {
            for (i, days) in days_ago.iter().enumerate() {
                let activity = NewActivity::new(
                    "Running",
                    30 + i as i64,
                    Intensity::Medium,
                    now - Duration::days(*days),
                )
                .with_description(format!("Run {}", i + 1));
                self.store.add_activity(&activity).unwrap();
            }
            self
        }

        pub fn with_activity(mut self, activity: NewActivity) -> Self {
            self.store.add_activity(&activity).unwrap();
            self
        }

        /// Daily weigh-ins ending at `now`, oldest first.
        pub fn with_weights(mut self, now: NaiveDateTime, weights: &[f64]) -> Self {
            let count = weights.len() as i64;
            for (i, weight) in weights.iter().enumerate() {
                let date = now - Duration::days(count - 1 - i as i64);
                self.store
                    .add_weight_entry(&NewWeightEntry::new(*weight, date))
                    .unwrap();
            }
            self
        }

        pub fn with_goal(mut self, goal: f64) -> Self {
            self.store.set_weight_goal(Some(goal)).unwrap();
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::StoreFixture;
    use super::*;
    use crate::error::FitError;
    use crate::period::Period;
    use crate::store::{ActivityStore, WeightStore};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_delete_not_found() {
        let mut store = InMemoryStore::new();
        let id = Uuid::new_v4();
        match store.delete_activity(&id) {
            Err(FitError::ActivityNotFound(err_id)) => assert_eq!(err_id, id.to_string()),
            _ => panic!("Expected ActivityNotFound"),
        }
        match store.delete_weight_entry(&id) {
            Err(FitError::WeightEntryNotFound(_)) => {}
            _ => panic!("Expected WeightEntryNotFound"),
        }
    }

    #[test]
    fn test_fixtures_coverage() {
        let fixture = StoreFixture::default()
            .with_activities_days_ago(now(), &[0, 3, 20])
            .with_weights(now(), &[80.0, 79.5, 79.0])
            .with_goal(75.0);

        let store = &fixture.store;
        assert_eq!(store.list_activities(Default::default()).unwrap().len(), 3);
        assert_eq!(
            store
                .activities_for_period_at(Period::Week, now())
                .unwrap()
                .len(),
            2
        );

        let weights = store.weight_entries().unwrap();
        assert_eq!(weights.len(), 3);
        assert_eq!(weights.last().unwrap().date, now());
        assert_eq!(store.weight_goal().unwrap(), Some(75.0));
    }

    #[test]
    fn test_empty_store_reads_empty() {
        let store = InMemoryStore::new();
        assert!(store.load_activities().is_empty());
        assert!(store.weight_entries().unwrap().is_empty());
        assert_eq!(store.weight_goal().unwrap(), None);
    }
}
