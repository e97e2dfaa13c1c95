//! # Record Types
//!
//! Core data definitions shared by the stores, the averaging engine and the
//! query protocol.

/// Marker that tags a daily aggregate line inside a day partition
pub const AGGREGATE_MARKER: &str = "AVG:";

/// Air humidity field marker
pub const HUMIDITY_MARKER: &str = "H:";

/// Air temperature field marker
pub const TEMPERATURE_MARKER: &str = "T:";

/// Soil humidity field marker
pub const SOIL_MARKER: &str = "S:";

/// One sensor observation as delivered by the radio link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Air humidity in percent
    pub air_humidity: f32,

    /// Air temperature in degrees Celsius
    pub air_temperature: f32,

    /// Soil humidity in raw sensor units
    pub soil_humidity: i16,
}

impl Sample {
    /// Create a new sample
    pub fn new(air_humidity: f32, air_temperature: f32, soil_humidity: i16) -> Self {
        Self {
            air_humidity,
            air_temperature,
            soil_humidity,
        }
    }

    /// True when every reading is exactly zero
    pub fn is_all_zero(&self) -> bool {
        self.air_humidity == 0.0 && self.air_temperature == 0.0 && self.soil_humidity == 0
    }

    /// True when at least one reading is exactly zero
    pub fn has_zero_reading(&self) -> bool {
        self.air_humidity == 0.0 || self.air_temperature == 0.0 || self.soil_humidity == 0
    }
}

/// The three numeric fields recovered from a stored line
///
/// Produced both from raw sample lines and from aggregate lines, since
/// they share the `H:` / `T:` / `S:` field layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleFields {
    pub humidity: f32,
    pub temperature: f32,
    pub soil: i32,
}

/// Mean values over a set of samples or daily aggregates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAggregate {
    /// Mean air humidity
    pub mean_air_humidity: f32,

    /// Mean air temperature
    pub mean_air_temperature: f32,

    /// Mean soil humidity, truncated toward zero
    pub mean_soil_humidity: i32,
}

/// Aggregate for one week or one month, keyed by its period label
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodAggregate {
    /// `YYYY-Www` for weeks, `YYYY-MM` for months
    pub label: String,

    /// The averaged values
    pub values: DailyAggregate,
}

/// Period granularity of a long-lived aggregate file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Week,
    Month,
}

impl Granularity {
    /// Name of the aggregate file backing this granularity
    pub fn file_name(&self) -> &'static str {
        match self {
            Granularity::Week => "weeks_average.txt",
            Granularity::Month => "months_average.txt",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
        }
    }
}
