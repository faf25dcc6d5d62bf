//! Mapping from channel [`Record`]s to numeric metric values.
//!
//! The status page embeds a unit suffix in most cells (`"36.00 MHz"`,
//! `"46.50 dBmV"`). Each extracted field carries a [`Unit`] descriptor so
//! one parsing routine serves all of them. Parsing is tolerant by design: a
//! malformed or missing field becomes `0.0` rather than failing the whole
//! poll cycle over one bad cell.
//!
//! The field sets are a fixed contract per channel direction, not
//! configuration: downstream rows yield six metrics, upstream rows two.

use crate::table::Record;

/// Field name carrying the downstream channel id.
pub const DOWNSTREAM_ID_FIELD: &str = "DCID";

/// Field name carrying the upstream channel id.
pub const UPSTREAM_ID_FIELD: &str = "UCID";

/// The unlabeled leading column holds the channel name (`"Downstream 1"`).
pub const NAME_FIELD: &str = "";

/// Channel direction, as reflected in metric names and the status page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Downstream,
    Upstream,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Downstream => "downstream",
            Direction::Upstream => "upstream",
        }
    }
}

/// Expected unit suffix of one field's raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// `"114.00 MHz"`
    MegaHertz,
    /// `"46.50 dBmV"`
    DecibelMillivolt,
    /// `"32.77 dB"`
    Decibel,
    /// Bare counter, e.g. `"1144704283"`
    Count,
}

impl Unit {
    fn suffix(self) -> Option<&'static str> {
        match self {
            Unit::MegaHertz => Some("MHz"),
            Unit::DecibelMillivolt => Some("dBmV"),
            Unit::Decibel => Some("dB"),
            Unit::Count => None,
        }
    }
}

/// Parse a unit-suffixed value, yielding `0.0` on any mismatch.
///
/// The suffix must match exactly (so `"46.50 dBmV"` does not pass for
/// [`Unit::Decibel`]); whitespace between number and suffix is optional.
pub fn parse_value(raw: &str, unit: Unit) -> f64 {
    let trimmed = raw.trim();
    let number = match unit.suffix() {
        Some(suffix) => match trimmed.strip_suffix(suffix) {
            Some(rest) => rest.trim_end(),
            None => return 0.0,
        },
        None => trimmed,
    };
    number.parse::<f64>().unwrap_or(0.0)
}

fn field<'a>(record: &'a Record, name: &str) -> &'a str {
    record.get(name).map(String::as_str).unwrap_or("")
}

/// Parsed metric values of one downstream channel row.
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamReading {
    pub id: String,
    pub name: String,
    pub freq: f64,
    pub power: f64,
    pub snr: f64,
    pub octets: f64,
    pub correcteds: f64,
    pub uncorrectables: f64,
}

/// Parsed metric values of one upstream channel row.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReading {
    pub id: String,
    pub name: String,
    pub freq: f64,
    pub power: f64,
}

/// Extract the six downstream metrics plus the {id, name} label pair.
pub fn downstream_reading(record: &Record) -> DownstreamReading {
    DownstreamReading {
        id: field(record, DOWNSTREAM_ID_FIELD).to_string(),
        name: field(record, NAME_FIELD).to_string(),
        freq: parse_value(field(record, "Freq"), Unit::MegaHertz),
        power: parse_value(field(record, "Power"), Unit::DecibelMillivolt),
        snr: parse_value(field(record, "SNR"), Unit::Decibel),
        octets: parse_value(field(record, "Octets"), Unit::Count),
        correcteds: parse_value(field(record, "Correcteds"), Unit::Count),
        uncorrectables: parse_value(field(record, "Uncorrectables"), Unit::Count),
    }
}

/// Extract the two upstream metrics plus the {id, name} label pair.
pub fn upstream_reading(record: &Record) -> UpstreamReading {
    UpstreamReading {
        id: field(record, UPSTREAM_ID_FIELD).to_string(),
        name: field(record, NAME_FIELD).to_string(),
        freq: parse_value(field(record, "Freq"), Unit::MegaHertz),
        power: parse_value(field(record, "Power"), Unit::DecibelMillivolt),
    }
}
