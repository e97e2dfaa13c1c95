//! # Day Log Store
//!
//! One append-only partition file per calendar day holding sample lines and,
//! once the day is rolled up, an `AVG:` line.

use std::sync::Arc;

use chrono::NaiveTime;
use tracing::debug;

use super::{append_line, last_matching, open_lines, read_lines, LogLines, Partition, StorageBackend};
use crate::error::Result;
use crate::record::codec::{encode_aggregate, encode_sample, is_aggregate_line};
use crate::record::{DailyAggregate, Sample};

/// Minimum length of a line reported by [`DayLogStore::last_sample_line`];
/// shorter lines are stray line endings
const MIN_SAMPLE_LINE_LEN: usize = 3;

/// Append-only store of day partitions
#[derive(Clone)]
pub struct DayLogStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for DayLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DayLogStore").finish_non_exhaustive()
    }
}

impl DayLogStore {
    /// Create a store over the given storage backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Append one sample line to the partition
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the medium is unmounted or full. Callers
    /// treat this as non-fatal.
    pub fn append_sample(
        &self,
        partition: impl Into<Partition>,
        sample: &Sample,
        time_of_day: NaiveTime,
    ) -> Result<()> {
        let partition = partition.into();
        let line = encode_sample(sample, time_of_day);
        append_line(self.backend.as_ref(), &partition.file_name(), &line)?;
        debug!("Appended to {}: {}", partition, line);
        Ok(())
    }

    /// Append the `AVG:` line of a day partition
    pub fn append_daily_aggregate(
        &self,
        partition: impl Into<Partition>,
        aggregate: &DailyAggregate,
    ) -> Result<()> {
        let partition = partition.into();
        append_line(
            self.backend.as_ref(),
            &partition.file_name(),
            &encode_aggregate(aggregate),
        )
    }

    /// Every line of the partition, oldest first; empty when absent
    pub fn read_all_lines(&self, partition: impl Into<Partition>) -> LogLines {
        read_lines(self.backend.as_ref(), &partition.into().file_name())
    }

    /// Lines of the partition, or `None` when the file does not exist
    pub fn open_lines(&self, partition: impl Into<Partition>) -> Option<LogLines> {
        open_lines(self.backend.as_ref(), &partition.into().file_name())
    }

    /// The last `AVG:` line of the partition, if any
    pub fn find_daily_aggregate(&self, partition: impl Into<Partition>) -> Option<String> {
        last_matching(self.read_all_lines(partition), is_aggregate_line)
    }

    /// The last sample line of the partition, ignoring `AVG:` lines
    pub fn last_sample_line(&self, partition: impl Into<Partition>) -> Option<String> {
        last_matching(self.read_all_lines(partition), |line| {
            line.len() >= MIN_SAMPLE_LINE_LEN && !is_aggregate_line(line)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backend::{FsBackend, MockStorageBackend};
    use chrono::NaiveDate;
    use std::io;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn temp_store() -> (TempDir, DayLogStore) {
        let dir = TempDir::new().unwrap();
        let store = DayLogStore::new(Arc::new(FsBackend::new(dir.path())));
        (dir, store)
    }

    #[test]
    fn test_append_and_read_back() {
        let (dir, store) = temp_store();
        let day = date(2025, 6, 26);

        store.append_sample(day, &Sample::new(55.2, 21.35, 312), time(8, 0, 0)).unwrap();
        store.append_sample(day, &Sample::new(56.0, 22.0, 310), time(8, 0, 5)).unwrap();

        let lines: Vec<String> = store.read_all_lines(day).collect();
        assert_eq!(
            lines,
            vec!["08:00:00 H:55.20 T:21.35 S:312", "08:00:05 H:56.00 T:22.00 S:310"]
        );
        assert!(dir.path().join("2025-06-26.txt").exists());
    }

    #[test]
    fn test_missing_partition_reads_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.read_all_lines(date(2020, 1, 1)).count(), 0);
        assert!(store.open_lines(date(2020, 1, 1)).is_none());
    }

    #[test]
    fn test_read_all_lines_is_restartable() {
        let (_dir, store) = temp_store();
        let day = date(2025, 6, 26);
        store.append_sample(day, &Sample::new(50.0, 20.0, 300), time(9, 0, 0)).unwrap();

        assert_eq!(store.read_all_lines(day).count(), 1);
        assert_eq!(store.read_all_lines(day).count(), 1);
    }

    #[test]
    fn test_find_daily_aggregate_last_wins() {
        let (_dir, store) = temp_store();
        let day = date(2025, 6, 26);
        store.append_sample(day, &Sample::new(50.0, 20.0, 300), time(9, 0, 0)).unwrap();
        store
            .append_daily_aggregate(
                day,
                &DailyAggregate {
                    mean_air_humidity: 10.0,
                    mean_air_temperature: 11.0,
                    mean_soil_humidity: 12,
                },
            )
            .unwrap();
        store
            .append_daily_aggregate(
                day,
                &DailyAggregate {
                    mean_air_humidity: 20.0,
                    mean_air_temperature: 21.0,
                    mean_soil_humidity: 22,
                },
            )
            .unwrap();

        assert_eq!(
            store.find_daily_aggregate(day).as_deref(),
            Some("AVG: H:20.00 T:21.00 S:22")
        );
    }

    #[test]
    fn test_find_daily_aggregate_absent() {
        let (_dir, store) = temp_store();
        let day = date(2025, 6, 26);
        assert!(store.find_daily_aggregate(day).is_none());

        store.append_sample(day, &Sample::new(50.0, 20.0, 300), time(9, 0, 0)).unwrap();
        assert!(store.find_daily_aggregate(day).is_none());
    }

    #[test]
    fn test_last_sample_line_skips_aggregate() {
        let (_dir, store) = temp_store();
        let day = date(2025, 6, 26);
        store.append_sample(day, &Sample::new(50.0, 20.0, 300), time(23, 50, 0)).unwrap();
        store
            .append_daily_aggregate(
                day,
                &DailyAggregate {
                    mean_air_humidity: 50.0,
                    mean_air_temperature: 20.0,
                    mean_soil_humidity: 300,
                },
            )
            .unwrap();

        assert_eq!(
            store.last_sample_line(day).as_deref(),
            Some("23:50:00 H:50.00 T:20.00 S:300")
        );
    }

    #[test]
    fn test_unknown_partition() {
        let (dir, store) = temp_store();
        store
            .append_sample(Partition::Unknown, &Sample::new(50.0, 20.0, 300), time(0, 0, 0))
            .unwrap();
        assert!(dir.path().join("unknown.txt").exists());
    }

    #[test]
    fn test_append_failure_is_reported() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_open_for_append()
            .returning(|_| Err(io::Error::new(io::ErrorKind::NotFound, "card not mounted")));

        let store = DayLogStore::new(Arc::new(backend));
        let result = store.append_sample(date(2025, 6, 26), &Sample::new(1.0, 2.0, 3), time(1, 2, 3));
        assert!(result.is_err());
    }
}
