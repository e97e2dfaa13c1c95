//! # Station Module
//!
//! Application core driven by the binary's event loop.
//!
//! This module handles:
//! - Filtering and persisting samples from the radio link
//! - Answering request lines from the command transport
//! - Running the rollover scheduler on each tick
//!
//! Every operation reads the clock itself, so partition names and rollover
//! windows always follow the latest local time.

use chrono::{NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{Config, ZeroFilter};
use crate::query::QueryDispatcher;
use crate::record::Sample;
use crate::scheduler::{RolloverEvent, RolloverScheduler, RolloverState};
use crate::store::{AggregateStore, DayLogStore, Partition, StorageBackend};

/// What happened to an incoming sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Appended to a day (or the unknown) partition
    Stored,

    /// Dropped by the zero filter
    Discarded,

    /// Storage rejected the append; the sample is lost
    Failed,
}

/// Stores, scheduler and clock of one logger instance
pub struct Station {
    day_log: DayLogStore,
    aggregates: AggregateStore,
    scheduler: RolloverScheduler,
    clock: Box<dyn Clock>,
    zero_filter: ZeroFilter,
    max_days: usize,
    clock_available: bool,
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station")
            .field("day_log", &self.day_log)
            .field("aggregates", &self.aggregates)
            .field("scheduler", &self.scheduler)
            .field("zero_filter", &self.zero_filter)
            .field("max_days", &self.max_days)
            .field("clock_available", &self.clock_available)
            .finish_non_exhaustive()
    }
}

impl Station {
    /// Assemble a station over a storage backend
    ///
    /// # Arguments
    ///
    /// * `backend` - Storage shared by the day log and the aggregate files
    /// * `clock` - Local time source
    /// * `config` - Validated configuration
    pub fn new(backend: Arc<dyn StorageBackend>, clock: Box<dyn Clock>, config: &Config) -> Self {
        Self {
            day_log: DayLogStore::new(backend.clone()),
            aggregates: AggregateStore::new(backend),
            scheduler: RolloverScheduler::new(&config.scheduler),
            clock,
            zero_filter: config.ingest.zero_filter,
            max_days: config.query.max_days,
            clock_available: true,
        }
    }

    /// Persist one sample from the radio link
    ///
    /// Without a local time the sample goes to the unknown partition with a
    /// midnight timestamp.
    pub fn ingest(&mut self, sample: Sample) -> IngestOutcome {
        if self.is_filtered(&sample) {
            info!("Discarding sample {:?} ({:?})", sample, self.zero_filter);
            return IngestOutcome::Discarded;
        }

        let (partition, time) = match self.now() {
            Some(now) => (Partition::Day(now.date()), now.time()),
            None => (Partition::Unknown, NaiveTime::MIN),
        };

        match self.day_log.append_sample(partition, &sample, time) {
            Ok(()) => {
                debug!("Stored sample in {}", partition);
                IngestOutcome::Stored
            }
            Err(e) => {
                warn!("Failed to store sample in {}: {}", partition, e);
                IngestOutcome::Failed
            }
        }
    }

    /// Answer one request line
    ///
    /// # Returns
    ///
    /// * `Some(lines)` - Response lines, the last one being the terminator
    /// * `None` - Empty request line, nothing to send
    pub fn handle_command(&mut self, line: &str) -> Option<Vec<String>> {
        let today = self.now().map(|now| now.date());
        let dispatcher = QueryDispatcher::new(&self.day_log, &self.aggregates, self.max_days);

        let mut response = Vec::new();
        dispatcher
            .dispatch(line, today, &mut response)
            .then_some(response)
    }

    /// Give the rollover scheduler a chance to run
    pub fn tick(&mut self) -> Option<RolloverEvent> {
        let now = self.now();
        self.scheduler.tick(now, &self.day_log, &self.aggregates)
    }

    /// Current rollover latches
    pub fn rollover_state(&self) -> RolloverState {
        self.scheduler.state()
    }

    fn is_filtered(&self, sample: &Sample) -> bool {
        match self.zero_filter {
            ZeroFilter::AllZero => sample.is_all_zero(),
            ZeroFilter::AnyZero => sample.has_zero_reading(),
            ZeroFilter::Off => false,
        }
    }

    /// Read the clock, logging when it goes away or comes back
    fn now(&mut self) -> Option<NaiveDateTime> {
        let now = self.clock.current_local_time();

        match (now.is_some(), self.clock_available) {
            (false, true) => warn!("Local time unavailable, samples go to the unknown partition"),
            (true, false) => info!("Local time available again"),
            _ => {}
        }
        self.clock_available = now.is_some();

        now
    }
}
