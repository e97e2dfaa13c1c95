//! # Greenhouse Logger Library
//!
//! Log greenhouse sensor readings and serve rollup averages over a serial link.
//!
//! This library provides the core functionality for receiving air humidity,
//! air temperature and soil moisture samples from a radio receiver, storing
//! them in day-partitioned text files, computing daily, weekly and monthly
//! averages, and answering a small line-oriented query protocol.

pub mod averaging;
pub mod clock;
pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod scheduler;
pub mod serial;
pub mod station;
pub mod store;
