//! Cutoff dates: parsing and filtering.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::release::ReleaseEntry;

use super::error::{ConfigError, Result};

/// Age boundary of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff {
    /// Keep everything
    Disabled,
    /// Keep releases published strictly after this instant
    After(DateTime<Utc>),
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cutoff::Disabled => write!(f, "off"),
            Cutoff::After(date) => write!(f, "{}", date.format("%Y-%m-%dT%H:%M:%SZ")),
        }
    }
}

/// `cutoff-date` as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCutoff {
    Flag(bool),
    Date(String),
}

impl Cutoff {
    /// The built-in default: one year before `now`.
    pub fn default_for(now: DateTime<Utc>) -> Self {
        Cutoff::After(now.checked_sub_months(Months::new(12)).unwrap_or(now))
    }

    pub fn from_raw(raw: &RawCutoff, now: DateTime<Utc>, scope: &str) -> Result<Self> {
        match raw {
            RawCutoff::Flag(false) => Ok(Cutoff::Disabled),
            RawCutoff::Flag(true) => Err(ConfigError::InvalidCutoff {
                scope: scope.to_string(),
                value: "true".to_string(),
            }),
            RawCutoff::Date(value) => parse_cutoff(value, now)
                .map(Cutoff::After)
                .ok_or_else(|| ConfigError::InvalidCutoff {
                    scope: scope.to_string(),
                    value: value.clone(),
                }),
        }
    }

    /// Keep the entries published strictly after the cutoff.
    pub fn apply(&self, entries: Vec<ReleaseEntry>) -> Vec<ReleaseEntry> {
        match self {
            Cutoff::Disabled => entries,
            Cutoff::After(cutoff) => entries
                .into_iter()
                .filter(|e| e.release.published_at > *cutoff)
                .collect(),
        }
    }
}

/// Parse an absolute ISO date/datetime or a relative `-N[dwmy]` shorthand.
///
/// Dates and datetimes without an offset are taken as UTC.
pub fn parse_cutoff(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Some(relative) = value.strip_prefix('-') {
        return parse_relative(relative, now);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_relative(spec: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let unit = spec.chars().last()?;
    let amount: u32 = spec[..spec.len() - unit.len_utf8()].parse().ok()?;

    match unit.to_ascii_lowercase() {
        'd' => now.checked_sub_signed(Duration::days(i64::from(amount))),
        'w' => now.checked_sub_signed(Duration::weeks(i64::from(amount))),
        'm' => now.checked_sub_months(Months::new(amount)),
        'y' => now.checked_sub_months(Months::new(amount.checked_mul(12)?)),
        _ => None,
    }
}
