use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Wire format for record timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Lower bound (inclusive) for generated durations, in seconds.
pub const DURATION_MIN: f64 = 0.5;
/// Upper bound (inclusive) for generated durations, in seconds.
pub const DURATION_MAX: f64 = 120.0;

/// Result category of a synthetic event.
///
/// Variants are declared in report order, so `Ord` and `BTreeMap` iteration
/// yield `failure, timeout, cancelled, success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Failure,
    Timeout,
    Cancelled,
    Success,
}

impl Outcome {
    /// Generation vocabulary in its canonical order.
    pub const ALL: [Outcome; 4] = [
        Outcome::Success,
        Outcome::Failure,
        Outcome::Timeout,
        Outcome::Cancelled,
    ];

    /// Fixed ordering used by distribution reports.
    pub const REPORT_ORDER: [Outcome; 4] = [
        Outcome::Failure,
        Outcome::Timeout,
        Outcome::Cancelled,
        Outcome::Success,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Failure => "failure",
            Outcome::Timeout => "timeout",
            Outcome::Cancelled => "cancelled",
            Outcome::Success => "success",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "failure" => Ok(Outcome::Failure),
            "timeout" => Ok(Outcome::Timeout),
            "cancelled" => Ok(Outcome::Cancelled),
            "success" => Ok(Outcome::Success),
            _ => Err(CoreError::UnknownCategory {
                kind: "outcome",
                value: value.to_string(),
            }),
        }
    }
}

/// Priority category of a synthetic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(CoreError::UnknownCategory {
                kind: "priority",
                value: value.to_string(),
            }),
        }
    }
}

/// A single synthetic log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(with = "wire_timestamp")]
    pub timestamp: NaiveDateTime,
    /// Seconds, rounded to two decimal places.
    pub duration: f64,
    pub outcome: Outcome,
    pub priority: Priority,
}

/// Parse a timestamp in the `YYYY-MM-DD HH:MM:SS` wire format.
///
/// A `T` separator is accepted as well so ISO-style CLI input works.
pub fn parse_timestamp(value: &str) -> crate::Result<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| CoreError::InvalidTimestamp(value.to_string()))
}

mod wire_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_wire_timestamp() {
        let record = Record {
            timestamp: parse_timestamp("2025-01-01 08:00:05").expect("timestamp"),
            duration: 12.5,
            outcome: Outcome::Timeout,
            priority: Priority::High,
        };
        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(
            json,
            r#"{"timestamp":"2025-01-01 08:00:05","duration":12.5,"outcome":"timeout","priority":"high"}"#
        );
        let parsed: Record = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, record);
    }

    #[test]
    fn parses_categories_case_insensitively() {
        assert_eq!("Success".parse::<Outcome>().ok(), Some(Outcome::Success));
        assert_eq!(" critical ".parse::<Priority>().ok(), Some(Priority::Critical));
        assert!("unknown".parse::<Outcome>().is_err());
    }

    #[test]
    fn report_order_matches_ord() {
        let mut sorted = Outcome::ALL;
        sorted.sort();
        assert_eq!(sorted, Outcome::REPORT_ORDER);
    }

    #[test]
    fn accepts_iso_separator() {
        let a = parse_timestamp("2025-01-01T08:00:00").expect("iso");
        let b = parse_timestamp("2025-01-01 08:00:00").expect("wire");
        assert_eq!(a, b);
        assert!(parse_timestamp("01/01/2025").is_err());
    }
}
