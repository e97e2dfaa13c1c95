//! # Rollover Scheduler
//!
//! Clock-driven state machine deciding when the daily, weekly and monthly
//! aggregates are due and persisting each of them once per trigger window.
//!
//! ## Trigger Windows
//!
//! | Rollup | Window                          | Source                        | Destination        |
//! |--------|---------------------------------|-------------------------------|--------------------|
//! | Day    | 23:55 to 23:59                  | today's sample lines          | today's partition  |
//! | Week   | any time on Sunday              | last 7 daily aggregates       | `weeks_average.txt`  |
//! | Month  | any time on the 1st             | last 29 daily aggregates      | `months_average.txt` |
//!
//! Each rollup has a latch. It is set once the aggregate has been written
//! (or found to have no data) and cleared as soon as the clock leaves the
//! window. A failed append leaves the latch clear so the next tick retries.
//! Latches live in memory only, so a restart inside a window writes again.
//!
//! The month window is a fixed 29-day span, not the length of the previous
//! calendar month.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use tracing::{info, warn};

use crate::averaging::{average_over_dates, average_over_day_log, last_n_dates};
use crate::config::SchedulerConfig;
use crate::record::{DailyAggregate, Granularity, PeriodAggregate};
use crate::store::{AggregateStore, DayLogStore};

/// Hour in which the daily rollup window opens
pub const DAY_ROLLOVER_HOUR: u32 = 23;

/// Weekday on which the weekly rollup runs
pub const WEEK_ROLLOVER_DAY: Weekday = Weekday::Sun;

/// Day of month on which the monthly rollup runs
pub const MONTH_ROLLOVER_DAY: u32 = 1;

/// In-memory "done" latches, one per rollup
///
/// A fresh state (all pending) is built at every start-up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RolloverState {
    pub day_done: bool,
    pub week_done: bool,
    pub month_done: bool,
    /// Reserved for a yearly rollup; no trigger sets it
    pub year_done: bool,
}

/// Which rollup an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverKind {
    Day,
    Week,
    Month,
}

/// Result of one rollover action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RolloverOutcome {
    /// Aggregate computed and appended
    Written(DailyAggregate),

    /// Nothing to average; nothing appended
    NoData,

    /// Append failed; the window stays pending
    Failed,
}

/// One rollover action taken during a tick
#[derive(Debug, Clone, PartialEq)]
pub struct RolloverEvent {
    pub kind: RolloverKind,

    /// Partition date, ISO week or year-month the aggregate belongs to
    pub label: String,

    pub outcome: RolloverOutcome,
}

/// Decides and performs the scheduled rollups
#[derive(Debug, Clone)]
pub struct RolloverScheduler {
    state: RolloverState,
    day_window_start_minute: u32,
    week_window_days: usize,
    month_window_days: usize,
}

impl RolloverScheduler {
    /// Create a scheduler with every rollup pending
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            state: RolloverState::default(),
            day_window_start_minute: config.day_window_start_minute,
            week_window_days: config.week_window_days,
            month_window_days: config.month_window_days,
        }
    }

    /// Current latch values
    pub fn state(&self) -> RolloverState {
        self.state
    }

    /// Evaluate the windows against `now` and perform at most one due rollup
    ///
    /// Rollups are considered in order day, week, month. With no local time
    /// available nothing is triggered and no latch changes.
    pub fn tick(
        &mut self,
        now: Option<NaiveDateTime>,
        day_log: &DayLogStore,
        aggregates: &AggregateStore,
    ) -> Option<RolloverEvent> {
        let now = now?;
        self.reset_expired(now);

        let today = now.date();

        if !self.state.day_done && self.day_window_open(now) {
            return Some(self.run_daily(today, day_log));
        }

        if !self.state.week_done && today.weekday() == WEEK_ROLLOVER_DAY {
            return Some(self.run_weekly(today, day_log, aggregates));
        }

        if !self.state.month_done && today.day() == MONTH_ROLLOVER_DAY {
            return Some(self.run_monthly(today, day_log, aggregates));
        }

        None
    }

    fn day_window_open(&self, now: NaiveDateTime) -> bool {
        now.hour() == DAY_ROLLOVER_HOUR && now.minute() >= self.day_window_start_minute
    }

    /// Re-arm every latch whose window the clock has left
    fn reset_expired(&mut self, now: NaiveDateTime) {
        if now.hour() != DAY_ROLLOVER_HOUR {
            self.state.day_done = false;
        }
        if now.date().weekday() != WEEK_ROLLOVER_DAY {
            self.state.week_done = false;
        }
        if now.date().day() != MONTH_ROLLOVER_DAY {
            self.state.month_done = false;
        }
    }

    fn run_daily(&mut self, today: NaiveDate, day_log: &DayLogStore) -> RolloverEvent {
        let label = today.format("%Y-%m-%d").to_string();

        let outcome = match average_over_day_log(day_log, today) {
            None => {
                warn!("No valid data for daily average of {}", label);
                self.state.day_done = true;
                RolloverOutcome::NoData
            }
            Some(aggregate) => match day_log.append_daily_aggregate(today, &aggregate) {
                Ok(()) => {
                    info!("Wrote daily average for {}", label);
                    self.state.day_done = true;
                    RolloverOutcome::Written(aggregate)
                }
                Err(e) => {
                    warn!("Failed to append daily average for {}: {}", label, e);
                    RolloverOutcome::Failed
                }
            },
        };

        RolloverEvent {
            kind: RolloverKind::Day,
            label,
            outcome,
        }
    }

    fn run_weekly(
        &mut self,
        today: NaiveDate,
        day_log: &DayLogStore,
        aggregates: &AggregateStore,
    ) -> RolloverEvent {
        let label = week_label(today);
        let dates = last_n_dates(today, self.week_window_days);
        let outcome = persist_period(
            Granularity::Week,
            &label,
            average_over_dates(day_log, &dates),
            aggregates,
        );

        if outcome != RolloverOutcome::Failed {
            self.state.week_done = true;
        }

        RolloverEvent {
            kind: RolloverKind::Week,
            label,
            outcome,
        }
    }

    fn run_monthly(
        &mut self,
        today: NaiveDate,
        day_log: &DayLogStore,
        aggregates: &AggregateStore,
    ) -> RolloverEvent {
        let label = previous_month_label(today);
        let dates = last_n_dates(today, self.month_window_days);
        let outcome = persist_period(
            Granularity::Month,
            &label,
            average_over_dates(day_log, &dates),
            aggregates,
        );

        if outcome != RolloverOutcome::Failed {
            self.state.month_done = true;
        }

        RolloverEvent {
            kind: RolloverKind::Month,
            label,
            outcome,
        }
    }
}

/// Append a period aggregate if there is one
fn persist_period(
    granularity: Granularity,
    label: &str,
    aggregate: Option<DailyAggregate>,
    aggregates: &AggregateStore,
) -> RolloverOutcome {
    let Some(values) = aggregate else {
        warn!("No data for {} average {}", granularity, label);
        return RolloverOutcome::NoData;
    };

    let period = PeriodAggregate {
        label: label.to_string(),
        values,
    };

    match aggregates.append_period_aggregate(granularity, &period) {
        Ok(()) => {
            info!("Wrote {} average for {}", granularity, label);
            RolloverOutcome::Written(values)
        }
        Err(e) => {
            warn!("Failed to append {} average for {}: {}", granularity, label, e);
            RolloverOutcome::Failed
        }
    }
}

/// ISO week label (`YYYY-Www`, ISO week-based year)
pub fn week_label(date: NaiveDate) -> String {
    date.format("%G-W%V").to_string()
}

/// Year-month label (`YYYY-MM`) of the calendar month before `date`'s month
pub fn previous_month_label(date: NaiveDate) -> String {
    let last_of_previous = date
        .with_day(1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date);
    last_of_previous.format("%Y-%m").to_string()
}
