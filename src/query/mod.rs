//! # Query Module
//!
//! Request/response protocol exposing stored data over the character-stream
//! transport.
//!
//! This module handles:
//! - Parsing request lines into [`Command`]s
//! - Reading the day and aggregate stores
//! - Streaming response lines, always closed by a single `.` line
//!
//! Missing data is never a protocol error: it is answered with a plain
//! sentence followed by the terminator. Only commands outside the grammar
//! get `404 Not Found`.

pub mod command;

use chrono::NaiveDate;
use tracing::debug;

pub use command::Command;

use crate::averaging::last_n_dates;
use crate::record::codec::is_aggregate_line;
use crate::record::Granularity;
use crate::store::{AggregateStore, DayLogStore, LogLines, Partition};

/// Line closing every response
pub const TERMINATOR: &str = ".";

/// Response to a command outside the grammar
pub const NOT_FOUND: &str = "404 Not Found";

/// Response to `GET /last` when today has no sample yet
pub const NO_DATA: &str = "No data found";

/// Response when a requested day or period has no stored data
pub const DATA_NOT_FOUND: &str = "Data not found please verify the date is correct or that the date is not too early and that data exist for that period of time";

/// Response to `GET /last/days/<n>` with a non-numeric count
pub const INVALID_DAY_COUNT: &str = "Invalid number of days";

/// Response when the request needs today's date and the clock is unavailable
pub const DATE_UNAVAILABLE: &str = "Current date unavailable";

/// Destination of response lines
pub trait ResponseSink {
    /// Emit one response line (without line ending)
    fn write_line(&mut self, line: &str);
}

impl ResponseSink for Vec<String> {
    fn write_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Maps request lines to store reads
#[derive(Debug, Clone, Copy)]
pub struct QueryDispatcher<'a> {
    day_log: &'a DayLogStore,
    aggregates: &'a AggregateStore,
    max_days: usize,
}

impl<'a> QueryDispatcher<'a> {
    /// Create a dispatcher over the stores
    ///
    /// `max_days` caps the span of `GET /last/days/<n>`.
    pub fn new(day_log: &'a DayLogStore, aggregates: &'a AggregateStore, max_days: usize) -> Self {
        Self {
            day_log,
            aggregates,
            max_days,
        }
    }

    /// Answer one request line
    ///
    /// `today` is the current local date, if known. Returns `false` (and
    /// writes nothing) for an empty line; otherwise the response written to
    /// `sink` ends with exactly one [`TERMINATOR`] line.
    pub fn dispatch(&self, line: &str, today: Option<NaiveDate>, sink: &mut dyn ResponseSink) -> bool {
        let Some(command) = Command::parse(line) else {
            return false;
        };

        debug!("Dispatching {:?}", command);

        match command {
            Command::Last => {
                let last = self.day_log.last_sample_line(Partition::from(today));
                emit(sink, last.as_deref().unwrap_or(NO_DATA));
            }
            Command::AvgDay(date) => {
                let line = parse_date(&date).and_then(|date| self.day_log.find_daily_aggregate(date));
                emit(sink, line.as_deref().unwrap_or(DATA_NOT_FOUND));
            }
            Command::AvgWeek(label) => self.period_average(Granularity::Week, &label, sink),
            Command::AvgMonth(label) => self.period_average(Granularity::Month, &label, sink),
            Command::AllDay(date) => {
                let lines = parse_date(&date).and_then(|date| self.day_log.open_lines(date));
                stream(sink, lines, |line| !line.is_empty() && !is_aggregate_line(line));
            }
            Command::AllWeek => stream(sink, self.aggregates.open_lines(Granularity::Week), |_| true),
            Command::AllMonth => stream(sink, self.aggregates.open_lines(Granularity::Month), |_| true),
            Command::LastDays(count) => self.last_days(&count, today, sink),
            Command::Unknown(raw) => {
                debug!("Unknown command: {}", raw);
                sink.write_line(NOT_FOUND);
            }
        }

        sink.write_line(TERMINATOR);
        true
    }

    fn period_average(&self, granularity: Granularity, label: &str, sink: &mut dyn ResponseSink) {
        let line = if label.is_empty() {
            None
        } else {
            self.aggregates.find_period_aggregate(granularity, label)
        };
        emit(sink, line.as_deref().unwrap_or(DATA_NOT_FOUND));
    }

    fn last_days(&self, count: &str, today: Option<NaiveDate>, sink: &mut dyn ResponseSink) {
        let Ok(count) = count.parse::<usize>() else {
            sink.write_line(INVALID_DAY_COUNT);
            return;
        };

        let Some(today) = today else {
            sink.write_line(DATE_UNAVAILABLE);
            return;
        };

        let mut found = 0;
        for date in last_n_dates(today, count.min(self.max_days)) {
            if let Some(avg) = self.day_log.find_daily_aggregate(date) {
                sink.write_line(&format!("{} {}", date.format("%Y-%m-%d"), avg));
                found += 1;
            }
        }

        if found == 0 {
            sink.write_line(NO_DATA);
        }
    }
}

/// Parse a `YYYY-MM-DD` request argument
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Write one data line, never letting it impersonate the terminator
fn emit(sink: &mut dyn ResponseSink, line: &str) {
    if line.trim() != TERMINATOR {
        sink.write_line(line);
    }
}

/// Stream the lines accepted by `keep`, or the not-found sentence when the
/// file is absent
fn stream<F>(sink: &mut dyn ResponseSink, lines: Option<LogLines>, keep: F)
where
    F: Fn(&str) -> bool,
{
    match lines {
        Some(lines) => {
            for line in lines.filter(|line| keep(line.as_str())) {
                emit(sink, &line);
            }
        }
        None => sink.write_line(DATA_NOT_FOUND),
    }
}
