//! # Aggregate Store
//!
//! Two long-lived append-only files, one line per week or month:
//!
//! ```text
//! weeks_average.txt   2025-W09 H:54.80 T:20.90 S:307
//! months_average.txt  2025-02 H:54.80 T:20.90 S:307
//! ```
//!
//! Lookups match the label as a substring and the most recent matching
//! line wins, so a re-triggered period simply shadows the older line.

use std::sync::Arc;

use tracing::debug;

use super::{append_line, last_matching, open_lines, read_lines, LogLines, StorageBackend};
use crate::error::Result;
use crate::record::codec::encode_period_aggregate;
use crate::record::{Granularity, PeriodAggregate};

/// Append-only store of weekly and monthly aggregates
#[derive(Clone)]
pub struct AggregateStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for AggregateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateStore").finish_non_exhaustive()
    }
}

impl AggregateStore {
    /// Create a store over the given storage backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Append one period line to the file of `granularity`
    pub fn append_period_aggregate(
        &self,
        granularity: Granularity,
        aggregate: &PeriodAggregate,
    ) -> Result<()> {
        let line = encode_period_aggregate(aggregate);
        append_line(self.backend.as_ref(), granularity.file_name(), &line)?;
        debug!("Appended {} aggregate: {}", granularity, line);
        Ok(())
    }

    /// The last line of the `granularity` file containing `label`
    ///
    /// Returns `None` when the file is absent or nothing matches.
    pub fn find_period_aggregate(&self, granularity: Granularity, label: &str) -> Option<String> {
        last_matching(self.read_all_lines(granularity), |line| line.contains(label))
    }

    /// Every line of the `granularity` file; empty when absent
    pub fn read_all_lines(&self, granularity: Granularity) -> LogLines {
        read_lines(self.backend.as_ref(), granularity.file_name())
    }

    /// Lines of the `granularity` file, or `None` when it does not exist
    pub fn open_lines(&self, granularity: Granularity) -> Option<LogLines> {
        open_lines(self.backend.as_ref(), granularity.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DailyAggregate;
    use crate::store::backend::FsBackend;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, AggregateStore) {
        let dir = TempDir::new().unwrap();
        let store = AggregateStore::new(Arc::new(FsBackend::new(dir.path())));
        (dir, store)
    }

    fn period(label: &str, humidity: f32) -> PeriodAggregate {
        PeriodAggregate {
            label: label.to_string(),
            values: DailyAggregate {
                mean_air_humidity: humidity,
                mean_air_temperature: 20.0,
                mean_soil_humidity: 300,
            },
        }
    }

    #[test]
    fn test_week_and_month_use_separate_files() {
        let (dir, store) = temp_store();
        store.append_period_aggregate(Granularity::Week, &period("2025-W09", 50.0)).unwrap();
        store.append_period_aggregate(Granularity::Month, &period("2025-02", 51.0)).unwrap();

        assert!(dir.path().join("weeks_average.txt").exists());
        assert!(dir.path().join("months_average.txt").exists());
        assert_eq!(store.read_all_lines(Granularity::Week).count(), 1);
        assert_eq!(store.read_all_lines(Granularity::Month).count(), 1);
    }

    #[test]
    fn test_find_by_label() {
        let (_dir, store) = temp_store();
        store.append_period_aggregate(Granularity::Week, &period("2025-W08", 40.0)).unwrap();
        store.append_period_aggregate(Granularity::Week, &period("2025-W09", 50.0)).unwrap();

        assert_eq!(
            store.find_period_aggregate(Granularity::Week, "2025-W08").as_deref(),
            Some("2025-W08 H:40.00 T:20.00 S:300")
        );
    }

    #[test]
    fn test_duplicate_label_most_recent_wins() {
        let (_dir, store) = temp_store();
        store.append_period_aggregate(Granularity::Month, &period("2025-02", 40.0)).unwrap();
        store.append_period_aggregate(Granularity::Month, &period("2025-02", 45.0)).unwrap();

        assert_eq!(
            store.find_period_aggregate(Granularity::Month, "2025-02").as_deref(),
            Some("2025-02 H:45.00 T:20.00 S:300")
        );
    }

    #[test]
    fn test_label_matches_as_substring() {
        let (_dir, store) = temp_store();
        store.append_period_aggregate(Granularity::Month, &period("2025-01", 40.0)).unwrap();
        store.append_period_aggregate(Granularity::Month, &period("2025-10", 41.0)).unwrap();

        // "2025-1" is a prefix of "2025-10" only
        assert_eq!(
            store.find_period_aggregate(Granularity::Month, "2025-1").as_deref(),
            Some("2025-10 H:41.00 T:20.00 S:300")
        );
    }

    #[test]
    fn test_missing_file_or_label() {
        let (_dir, store) = temp_store();
        assert!(store.find_period_aggregate(Granularity::Week, "2025-W09").is_none());
        assert!(store.open_lines(Granularity::Week).is_none());

        store.append_period_aggregate(Granularity::Week, &period("2025-W09", 50.0)).unwrap();
        assert!(store.find_period_aggregate(Granularity::Week, "2024-W09").is_none());
    }
}
