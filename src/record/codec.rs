//! # Record Codec
//!
//! Text encoding of sample and aggregate lines, and the marker-based field
//! parser used when reading them back.
//!
//! ## Line Layout
//!
//! ```text
//! 14:03:12 H:55.20 T:21.35 S:312        sample line
//! AVG: H:54.80 T:20.90 S:307            daily aggregate (day partition)
//! 2025-W09 H:54.80 T:20.90 S:307        weekly aggregate
//! 2025-02 H:54.80 T:20.90 S:307         monthly aggregate
//! ```
//!
//! Parsing locates the first `H:`, `T:` and `S:` markers and requires them
//! in that order. Each field reads its longest leading number (`S:300 ok`
//! reads 300); a field without one reads as zero instead of rejecting the
//! whole line.

use chrono::NaiveTime;

use super::types::*;

/// Encode a sample line stamped with the local time of day
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use greenhouse_logger::record::{codec::encode_sample, Sample};
///
/// let time = NaiveTime::from_hms_opt(14, 3, 12).unwrap();
/// let line = encode_sample(&Sample::new(55.2, 21.35, 312), time);
/// assert_eq!(line, "14:03:12 H:55.20 T:21.35 S:312");
/// ```
pub fn encode_sample(sample: &Sample, time_of_day: NaiveTime) -> String {
    format!(
        "{} {}{:.2} {}{:.2} {}{}",
        time_of_day.format("%H:%M:%S"),
        HUMIDITY_MARKER,
        sample.air_humidity,
        TEMPERATURE_MARKER,
        sample.air_temperature,
        SOIL_MARKER,
        sample.soil_humidity
    )
}

/// Encode the `H:.. T:.. S:..` field group of an aggregate
pub fn encode_fields(aggregate: &DailyAggregate) -> String {
    format!(
        "{}{:.2} {}{:.2} {}{}",
        HUMIDITY_MARKER,
        aggregate.mean_air_humidity,
        TEMPERATURE_MARKER,
        aggregate.mean_air_temperature,
        SOIL_MARKER,
        aggregate.mean_soil_humidity
    )
}

/// Encode a daily aggregate line, tagged with the `AVG:` marker
pub fn encode_aggregate(aggregate: &DailyAggregate) -> String {
    format!("{} {}", AGGREGATE_MARKER, encode_fields(aggregate))
}

/// Encode a weekly or monthly aggregate line, prefixed with its label
pub fn encode_period_aggregate(aggregate: &PeriodAggregate) -> String {
    format!("{} {}", aggregate.label, encode_fields(&aggregate.values))
}

/// True iff the line carries the `AVG:` marker
pub fn is_aggregate_line(line: &str) -> bool {
    line.contains(AGGREGATE_MARKER)
}

/// Byte offsets of the three field markers in a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarkerLayout {
    humidity: usize,
    temperature: usize,
    soil: usize,
}

impl MarkerLayout {
    /// Locate the markers, rejecting lines where any is missing or where
    /// they are not ordered `H:` < `T:` < `S:`
    fn locate(line: &str) -> Option<Self> {
        let humidity = line.find(HUMIDITY_MARKER)?;
        let temperature = line.find(TEMPERATURE_MARKER)?;
        let soil = line.find(SOIL_MARKER)?;

        if temperature > humidity && soil > temperature {
            Some(Self {
                humidity,
                temperature,
                soil,
            })
        } else {
            None
        }
    }
}

/// Parse the `H:` / `T:` / `S:` fields of a sample or aggregate line
///
/// Returns `None` when a marker is missing or the markers are out of order.
/// Text after a field's leading number is ignored; a field with no leading
/// number reads as zero.
///
/// # Examples
///
/// ```
/// use greenhouse_logger::record::codec::decode_sample_fields;
///
/// let fields = decode_sample_fields("H:12.5 T:21.0 S:300").unwrap();
/// assert_eq!(fields.humidity, 12.5);
/// assert_eq!(fields.soil, 300);
///
/// assert!(decode_sample_fields("T:21.0 H:12.5 S:300").is_none());
/// ```
pub fn decode_sample_fields(line: &str) -> Option<SampleFields> {
    let layout = MarkerLayout::locate(line)?;

    let humidity_text = &line[layout.humidity + HUMIDITY_MARKER.len()..layout.temperature];
    let temperature_text = &line[layout.temperature + TEMPERATURE_MARKER.len()..layout.soil];
    let soil_text = &line[layout.soil + SOIL_MARKER.len()..];

    Some(SampleFields {
        humidity: numeric_prefix(humidity_text, true).parse().unwrap_or(0.0),
        temperature: numeric_prefix(temperature_text, true).parse().unwrap_or(0.0),
        soil: numeric_prefix(soil_text, false).parse().unwrap_or(0),
    })
}

/// Longest leading `[+-]digits[.digits]` of `text` after leading whitespace
fn numeric_prefix(text: &str, allow_fraction: bool) -> &str {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut end: usize| {
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        end
    };

    let mut end = if matches!(bytes.first(), Some(b'+' | b'-')) { 1 } else { 0 };
    end = digits_from(end);
    if allow_fraction && bytes.get(end) == Some(&b'.') {
        end = digits_from(end + 1);
    }

    &text[..end]
}
