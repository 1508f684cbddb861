//! Weekday names and the deadline timestamp format

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::{CoreError, Result};

/// Day a class meets on, serialized by its English name ("Monday")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = CoreError;

    /// Accepts full names and three-letter abbreviations, case-insensitively
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Day::ALL
            .into_iter()
            .find(|day| {
                let name = day.as_str();
                name.eq_ignore_ascii_case(needle) || name[..3].eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| CoreError::UnknownWeekday(s.to_string()))
    }
}

impl From<time::Weekday> for Day {
    fn from(weekday: time::Weekday) -> Self {
        match weekday {
            time::Weekday::Monday => Day::Monday,
            time::Weekday::Tuesday => Day::Tuesday,
            time::Weekday::Wednesday => Day::Wednesday,
            time::Weekday::Thursday => Day::Thursday,
            time::Weekday::Friday => Day::Friday,
            time::Weekday::Saturday => Day::Saturday,
            time::Weekday::Sunday => Day::Sunday,
        }
    }
}

/// Local date-time without offset, as produced by a `datetime-local` input
const DEADLINE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

const DEADLINE_FORMAT_SECONDS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Parse a deadline such as `2025-03-01T23:59` (seconds are optional)
pub fn parse_deadline(value: &str) -> Result<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value, DEADLINE_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(value, DEADLINE_FORMAT_SECONDS))
        .map_err(|_| CoreError::InvalidDeadline(value.to_string()))
}

/// Format a deadline, keeping seconds only when they are set
pub fn format_deadline(value: &PrimitiveDateTime) -> String {
    let format = if value.second() == 0 {
        DEADLINE_FORMAT
    } else {
        DEADLINE_FORMAT_SECONDS
    };
    // Only fails for years outside 0..=9999, which parse_deadline never yields.
    value
        .format(format)
        .unwrap_or_else(|_| value.to_string())
}

/// Serde adapter for deadline fields
pub mod deadline {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub fn serialize<S: Serializer>(
        value: &PrimitiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_deadline(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<PrimitiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_deadline(&raw).map_err(serde::de::Error::custom)
    }
}
