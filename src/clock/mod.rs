//! # Clock Module
//!
//! Best-effort local wall-clock time.
//!
//! The host clock is synchronised externally (NTP). Until it is, the clock
//! reads close to the epoch; those readings are reported as unavailable so
//! that partitions are not named after 1970 and no rollup fires.

use chrono::{Datelike, Local, NaiveDateTime};

/// Source of the current local time
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send {
    /// Current local time, or `None` while the time source is unavailable
    fn current_local_time(&self) -> Option<NaiveDateTime>;
}

/// Clock backed by the system's local time zone
#[derive(Debug, Clone)]
pub struct SystemClock {
    min_valid_year: i32,
}

impl SystemClock {
    /// Create a clock that treats years before `min_valid_year` as unsynchronised
    pub fn new(min_valid_year: i32) -> Self {
        Self { min_valid_year }
    }
}

impl Clock for SystemClock {
    fn current_local_time(&self) -> Option<NaiveDateTime> {
        validated(Local::now().naive_local(), self.min_valid_year)
    }
}

/// `time` if it is plausible for a synchronised clock
fn validated(time: NaiveDateTime, min_valid_year: i32) -> Option<NaiveDateTime> {
    (time.year() >= min_valid_year).then_some(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_epoch_reading_is_unavailable() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 12)
            .unwrap();
        assert!(validated(epoch, 2020).is_none());
    }

    #[test]
    fn test_synchronised_reading_passes() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 26)
            .unwrap()
            .and_hms_opt(23, 55, 0)
            .unwrap();
        assert_eq!(validated(now, 2020), Some(now));
    }

    #[test]
    fn test_threshold_year_is_valid() {
        let new_year = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(validated(new_year, 2020), Some(new_year));
        assert!(validated(new_year, 2021).is_none());
    }

    #[test]
    fn test_system_clock_applies_threshold() {
        // Independent of whether the host clock is synchronised
        assert!(SystemClock::new(i32::MIN).current_local_time().is_some());
        assert!(SystemClock::new(i32::MAX).current_local_time().is_none());
    }
}
