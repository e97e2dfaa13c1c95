//! # Record Module
//!
//! Data model and on-disk text format for sensor samples and aggregates.
//!
//! This module handles:
//! - Sample and aggregate types
//! - Encoding sample and aggregate lines (`HH:MM:SS H:.. T:.. S:..`, `AVG: ...`)
//! - Marker-based parsing of the `H:` / `T:` / `S:` fields
//! - Decoding the fixed 12-byte radio frame

pub mod types;
pub mod codec;
pub mod binary;

pub use types::{DailyAggregate, Granularity, PeriodAggregate, Sample, SampleFields};
