//! OAI-PMH datestamps and granularity.
//!
//! Harvesters bound selective requests with `from`/`until` arguments written
//! either as a day (`YYYY-MM-DD`) or as a UTC second
//! (`YYYY-MM-DDThh:mm:ssZ`). Day-granular bounds are inclusive: `until` covers
//! the whole named day.

use crate::error::ProtocolError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DAY_FORMAT: &str = "%Y-%m-%d";
const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Datestamp granularity supported by a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "YYYY-MM-DD")]
    Day,
    #[serde(rename = "YYYY-MM-DDThh:mm:ssZ")]
    Second,
}

impl Granularity {
    /// The value published in the `granularity` element of Identify.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "YYYY-MM-DD",
            Granularity::Second => "YYYY-MM-DDThh:mm:ssZ",
        }
    }

    /// Render an instant at this granularity.
    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        match self {
            Granularity::Day => instant.format(DAY_FORMAT).to_string(),
            Granularity::Second => instant.format(SECOND_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render an instant as a full-precision OAI datestamp.
pub fn format_utc(instant: &DateTime<Utc>) -> String {
    Granularity::Second.format(instant)
}

/// A parsed `from`/`until` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datestamp {
    Day(NaiveDate),
    Second(DateTime<Utc>),
}

impl Datestamp {
    pub fn granularity(&self) -> Granularity {
        match self {
            Datestamp::Day(_) => Granularity::Day,
            Datestamp::Second(_) => Granularity::Second,
        }
    }

    /// First instant covered by this datestamp.
    pub fn lower_bound(&self) -> DateTime<Utc> {
        match self {
            Datestamp::Day(date) => date.and_time(NaiveTime::MIN).and_utc(),
            Datestamp::Second(instant) => *instant,
        }
    }

    /// Last instant covered by this datestamp.
    pub fn upper_bound(&self) -> DateTime<Utc> {
        match self {
            Datestamp::Day(date) => {
                date.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
                    - Duration::seconds(1)
            }
            Datestamp::Second(instant) => *instant,
        }
    }
}

impl FromStr for Datestamp {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::bad_argument(format!("'{value}' is not a valid datestamp"));

        match value.len() {
            10 => NaiveDate::parse_from_str(value, DAY_FORMAT)
                .map(Datestamp::Day)
                .map_err(|_| invalid()),
            20 => NaiveDateTime::parse_from_str(value, SECOND_FORMAT)
                .map(|naive| Datestamp::Second(naive.and_utc()))
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Datestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datestamp::Day(date) => write!(f, "{}", date.format(DAY_FORMAT)),
            Datestamp::Second(instant) => f.write_str(&format_utc(instant)),
        }
    }
}
