//! # Averaging Module
//!
//! Computes mean air humidity, mean air temperature and truncated mean soil
//! humidity over stored lines.
//!
//! Two sources are supported:
//! - the raw sample lines of one day partition (daily rollup)
//! - the `AVG:` lines of a run of day partitions (weekly / monthly rollup)
//!
//! Lines without the `H:` < `T:` < `S:` marker layout are skipped without
//! aborting the scan. The soil mean uses integer division and therefore
//! truncates toward zero; stored files depend on that rounding.

use chrono::NaiveDate;
use tracing::debug;

use crate::record::codec::{decode_sample_fields, is_aggregate_line};
use crate::record::{DailyAggregate, SampleFields};
use crate::store::{DayLogStore, Partition};

/// Running sums over valid entries
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    humidity: f64,
    temperature: f64,
    soil: i64,
    count: u32,
}

impl Accumulator {
    fn add(&mut self, fields: SampleFields) {
        self.humidity += f64::from(fields.humidity);
        self.temperature += f64::from(fields.temperature);
        self.soil += i64::from(fields.soil);
        self.count += 1;
    }

    /// Mean of the accumulated entries, `None` when there were none
    fn finish(&self) -> Option<DailyAggregate> {
        if self.count == 0 {
            return None;
        }

        let count = f64::from(self.count);
        Some(DailyAggregate {
            mean_air_humidity: (self.humidity / count) as f32,
            mean_air_temperature: (self.temperature / count) as f32,
            mean_soil_humidity: (self.soil / i64::from(self.count)) as i32,
        })
    }
}

/// Average the daily aggregates of `dates`
///
/// Dates with no `AVG:` line, or whose line is malformed, are skipped.
///
/// # Returns
///
/// `None` when no date contributed a valid aggregate
pub fn average_over_dates(day_log: &DayLogStore, dates: &[NaiveDate]) -> Option<DailyAggregate> {
    let mut acc = Accumulator::default();

    for &date in dates {
        let Some(line) = day_log.find_daily_aggregate(date) else {
            continue;
        };

        match decode_sample_fields(&line) {
            Some(fields) => acc.add(fields),
            None => debug!("Skipping malformed aggregate for {}: {}", date, line),
        }
    }

    acc.finish()
}

/// Average the raw sample lines of one partition
///
/// Blank lines, `AVG:` lines and lines without the marker layout are
/// skipped.
///
/// # Returns
///
/// `None` when the partition held no valid sample line
pub fn average_over_day_log(
    day_log: &DayLogStore,
    partition: impl Into<Partition>,
) -> Option<DailyAggregate> {
    let mut acc = Accumulator::default();

    for line in day_log.read_all_lines(partition) {
        let line = line.trim();
        if line.is_empty() || is_aggregate_line(line) {
            continue;
        }

        if let Some(fields) = decode_sample_fields(line) {
            acc.add(fields);
        }
    }

    acc.finish()
}

/// `n` calendar dates walking backward one day at a time from `reference`
/// (inclusive)
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use greenhouse_logger::averaging::last_n_dates;
///
/// let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let dates = last_n_dates(start, 3);
/// assert_eq!(dates[1], NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
/// ```
pub fn last_n_dates(reference: NaiveDate, n: usize) -> Vec<NaiveDate> {
    std::iter::successors(Some(reference), |date| date.pred_opt())
        .take(n)
        .collect()
}
