//! Category matching with optional inheritance of the parent's result.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::release::ReleaseEntry;

use super::cutoff::Cutoff;
use super::error::{ConfigError, Result};
use super::latest::LatestMatch;
use super::matcher::Matcher;
use super::settings::{MaxDisplayed, Setting};

/// How a category combines its own match result with its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InheritMode {
    #[default]
    Off,
    And,
    Or,
}

impl fmt::Display for InheritMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InheritMode::Off => write!(f, "off"),
            InheritMode::And => write!(f, "and"),
            InheritMode::Or => write!(f, "or"),
        }
    }
}

/// `inherit-parent-matchers` as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInheritMode {
    Flag(bool),
    Mode(String),
}

impl InheritMode {
    pub fn from_raw(raw: &RawInheritMode, scope: &str) -> Result<Self> {
        match raw {
            RawInheritMode::Flag(true) => Ok(InheritMode::And),
            RawInheritMode::Flag(false) => Ok(InheritMode::Off),
            RawInheritMode::Mode(mode) => match mode.to_lowercase().as_str() {
                "and" => Ok(InheritMode::And),
                "or" => Ok(InheritMode::Or),
                _ => Err(ConfigError::InvalidInheritMode {
                    scope: scope.to_string(),
                    value: mode.clone(),
                }),
            },
        }
    }
}

/// Per-node overrides of the inheritable settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub latest_match: Setting<LatestMatch>,
    pub cutoff: Setting<Cutoff>,
    pub max_displayed: Setting<MaxDisplayed>,
    pub inherit: Setting<InheritMode>,
}

/// A compiled category configuration node.
#[derive(Debug, Clone, Default)]
pub struct Category {
    pub name: String,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub matcher: Matcher,
    pub overrides: Overrides,
    /// When false the node still runs its matchers (children may inherit the
    /// result) but lists no releases of its own.
    pub show_releases: bool,
    pub children: Vec<Category>,
}

impl Category {
    /// Match a release against this category.
    ///
    /// A category without matchers of its own matches nothing, unless it
    /// inherits and a parent result is available, in which case it passes the
    /// parent's result through.
    pub fn matches(&self, entry: &ReleaseEntry, parent: Option<bool>, inherit: InheritMode) -> bool {
        if !self.matcher.is_declared() {
            return match (inherit, parent) {
                (InheritMode::Off, _) | (_, None) => false,
                (_, Some(parent)) => parent,
            };
        }

        let own = self.matcher.test(entry);
        match (inherit, parent) {
            (InheritMode::And, Some(parent)) => own && parent,
            (InheritMode::Or, Some(parent)) => own || parent,
            _ => own,
        }
    }
}

/// Match a release against a global filter.
///
/// Unlike [`Category::matches`], a filter without matchers lets everything through.
pub fn matches_filter(entry: &ReleaseEntry, filter: &Matcher) -> bool {
    !filter.is_declared() || filter.test(entry)
}
