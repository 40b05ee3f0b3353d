//! Inheritable per-category settings.
//!
//! Each overridable key is in one of three states:
//!
//! - absent: inherit the parent's effective value, or the configured default
//!   at the root
//! - explicit `null`: reset to the configured default, ignoring the parent
//! - any other value (including `false`): use it as is

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

use super::category::{InheritMode, Overrides};
use super::cutoff::Cutoff;
use super::error::{ConfigError, Result};
use super::latest::LatestMatch;

/// Built-in default for `max-displayed`.
pub const DEFAULT_MAX_DISPLAYED: usize = 100;

/// Three-state override value.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting<T> {
    Absent,
    Reset,
    Explicit(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Absent
    }
}

/// Absent keys come from `#[serde(default)]`, so deserialization only sees
/// present keys: `null` resets, anything else is explicit.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Setting<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Setting::Explicit(value),
            None => Setting::Reset,
        })
    }
}

impl<T> Setting<T> {
    /// Effective value given the parent's value (if any) and the configured default.
    pub fn resolve(&self, inherited: Option<&T>, default: &T) -> T
    where
        T: Clone,
    {
        match self {
            Setting::Absent => inherited.unwrap_or(default).clone(),
            Setting::Reset => default.clone(),
            Setting::Explicit(value) => value.clone(),
        }
    }

    /// Convert the explicit value, keeping the absent/reset state.
    pub fn try_map<U, E>(
        &self,
        f: impl FnOnce(&T) -> std::result::Result<U, E>,
    ) -> std::result::Result<Setting<U>, E> {
        Ok(match self {
            Setting::Absent => Setting::Absent,
            Setting::Reset => Setting::Reset,
            Setting::Explicit(value) => Setting::Explicit(f(value)?),
        })
    }
}

/// Display limit of a scope. The engine only records it; truncation is up to
/// the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxDisplayed {
    Unlimited,
    Limit(NonZeroUsize),
}

/// `max-displayed` as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMaxDisplayed {
    Flag(bool),
    Count(i64),
}

impl MaxDisplayed {
    pub fn from_raw(raw: &RawMaxDisplayed, scope: &str) -> Result<Self> {
        let invalid = |value: String| ConfigError::InvalidMaxDisplayed {
            scope: scope.to_string(),
            value,
        };
        match raw {
            RawMaxDisplayed::Flag(false) => Ok(MaxDisplayed::Unlimited),
            RawMaxDisplayed::Flag(true) => Err(invalid("true".to_string())),
            RawMaxDisplayed::Count(count) => usize::try_from(*count)
                .ok()
                .and_then(NonZeroUsize::new)
                .map(MaxDisplayed::Limit)
                .ok_or_else(|| invalid(count.to_string())),
        }
    }

    /// `None` means unbounded.
    pub fn limit(&self) -> Option<usize> {
        match self {
            MaxDisplayed::Unlimited => None,
            MaxDisplayed::Limit(n) => Some(n.get()),
        }
    }
}

impl fmt::Display for MaxDisplayed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxDisplayed::Unlimited => write!(f, "unlimited"),
            MaxDisplayed::Limit(n) => write!(f, "{}", n),
        }
    }
}

impl Default for MaxDisplayed {
    fn default() -> Self {
        match NonZeroUsize::new(DEFAULT_MAX_DISPLAYED) {
            Some(n) => MaxDisplayed::Limit(n),
            None => MaxDisplayed::Unlimited,
        }
    }
}

/// Configured defaults, used at the root and whenever a key is reset.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub latest_match: LatestMatch,
    pub cutoff: Cutoff,
    pub max_displayed: MaxDisplayed,
}

impl Defaults {
    /// Built-in defaults: newest release is latest, one year cutoff, 100 releases.
    pub fn builtin(now: DateTime<Utc>) -> Self {
        Self {
            latest_match: LatestMatch::Newest,
            cutoff: Cutoff::default_for(now),
            max_displayed: MaxDisplayed::default(),
        }
    }
}

/// Effective settings of one node, threaded down to its children.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub latest_match: LatestMatch,
    pub cutoff: Cutoff,
    pub max_displayed: MaxDisplayed,
    pub inherit: InheritMode,
}

impl Resolved {
    /// Resolve a node's overrides against its parent's effective settings.
    pub fn resolve(
        overrides: &Overrides,
        parent: Option<&Resolved>,
        defaults: &Defaults,
    ) -> Self {
        Self {
            latest_match: overrides
                .latest_match
                .resolve(parent.map(|p| &p.latest_match), &defaults.latest_match),
            cutoff: overrides
                .cutoff
                .resolve(parent.map(|p| &p.cutoff), &defaults.cutoff),
            max_displayed: overrides
                .max_displayed
                .resolve(parent.map(|p| &p.max_displayed), &defaults.max_displayed),
            inherit: overrides
                .inherit
                .resolve(parent.map(|p| &p.inherit), &InheritMode::Off),
        }
    }
}
