//! Site configuration.
//!
//! The configuration is a YAML document with kebab-case keys. It is parsed
//! into the raw shapes below and then compiled: regexes are built, cutoff
//! dates resolved against the run's start time and display limits validated.
//! Any problem aborts the run before a single release is classified.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::classify::{
    self, Category, Classification, ConfigError, Cutoff, Defaults, InheritMode, LatestMatch,
    Matcher, MatcherSpec, MaxDisplayed, Overrides, RawCutoff, RawInheritMode, RawLatestMatch,
    RawMaxDisplayed, Setting, category_scope,
};
use crate::provider::RepoId;
use crate::release::Release;
use crate::runtime::Runtime;

const DEFAULT_TITLE: &str = "Releases";

/// The three inheritable display settings, as written in `defaults` and `unmatched`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub latest_match: Setting<RawLatestMatch>,
    #[serde(default)]
    pub cutoff_date: Setting<RawCutoff>,
    #[serde(default)]
    pub max_displayed: Setting<RawMaxDisplayed>,
}

/// A category as written in the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub latest_match: Setting<RawLatestMatch>,
    #[serde(default)]
    pub cutoff_date: Setting<RawCutoff>,
    #[serde(default)]
    pub max_displayed: Setting<RawMaxDisplayed>,
    #[serde(default)]
    pub inherit_parent_matchers: Setting<RawInheritMode>,
    #[serde(default = "default_show_releases")]
    pub show_releases: bool,
    #[serde(default)]
    pub categories: Vec<RawCategory>,
    /// Direct matcher keys (`tag`, `title-not`, `match-any`, ...)
    #[serde(flatten)]
    pub matcher: MatcherSpec,
    /// Keys claimed by neither the category nor its matcher. `flatten` rules
    /// out `deny_unknown_fields`, so they are rejected while compiling.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

fn default_show_releases() -> bool {
    true
}

/// The configuration file as written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub defaults: RawSettings,
    #[serde(default)]
    pub filter: MatcherSpec,
    #[serde(default)]
    pub categories: Vec<RawCategory>,
    #[serde(default)]
    pub unmatched: RawSettings,
}

/// Compiled site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub title: String,
    pub repo: Option<RepoId>,
    pub filter: Matcher,
    pub defaults: Defaults,
    pub categories: Vec<Category>,
    pub unmatched: Overrides,
}

impl SiteConfig {
    /// Load and compile the configuration file, resolving relative dates
    /// against the runtime clock.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        debug!("Loading configuration from {:?}", path);
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {:?}", path))?;
        Self::from_yaml(&content, runtime.now())
            .with_context(|| format!("Invalid configuration file {:?}", path))
    }

    pub fn from_yaml(yaml: &str, now: DateTime<Utc>) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml).context("Failed to parse YAML")?;
        Self::compile(raw, now)
    }

    pub fn compile(raw: RawConfig, now: DateTime<Utc>) -> Result<Self> {
        let repo = raw
            .repo
            .as_deref()
            .map(str::parse::<RepoId>)
            .transpose()
            .context("Invalid `repo`")?;

        let defaults = compile_defaults(&raw.defaults, now)?;
        let filter = Matcher::compile(&raw.filter, "filter")?;
        let categories = raw
            .categories
            .iter()
            .map(|c| compile_category(c, now))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let unmatched = compile_settings(&raw.unmatched, "unmatched", now)?;

        Ok(Self {
            title: raw.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            repo,
            filter,
            defaults,
            categories,
            unmatched,
        })
    }

    /// Run the classification engine over the given releases.
    pub fn classify(&self, releases: Vec<Release>) -> Classification {
        classify::classify(
            releases,
            &self.filter,
            &self.categories,
            &self.defaults,
            &self.unmatched,
        )
    }
}

/// Configured defaults: absent and `null` keys fall back to the built-in values.
fn compile_defaults(raw: &RawSettings, now: DateTime<Utc>) -> Result<Defaults, ConfigError> {
    let builtin = Defaults::builtin(now);
    let settings = compile_settings(raw, "defaults", now)?;
    Ok(Defaults {
        latest_match: settings.latest_match.resolve(None, &builtin.latest_match),
        cutoff: settings.cutoff.resolve(None, &builtin.cutoff),
        max_displayed: settings.max_displayed.resolve(None, &builtin.max_displayed),
    })
}

fn compile_settings(
    raw: &RawSettings,
    scope: &str,
    now: DateTime<Utc>,
) -> Result<Overrides, ConfigError> {
    Ok(Overrides {
        latest_match: raw
            .latest_match
            .try_map(|r| LatestMatch::from_raw(r, scope))?,
        cutoff: raw.cutoff_date.try_map(|r| Cutoff::from_raw(r, now, scope))?,
        max_displayed: raw
            .max_displayed
            .try_map(|r| MaxDisplayed::from_raw(r, scope))?,
        inherit: Setting::Absent,
    })
}

fn compile_category(raw: &RawCategory, now: DateTime<Utc>) -> Result<Category, ConfigError> {
    let scope = category_scope(&raw.name);
    if !raw.unknown.is_empty() {
        return Err(ConfigError::UnknownKeys {
            scope,
            keys: raw.unknown.keys().cloned().collect::<Vec<_>>().join(", "),
        });
    }

    let overrides = Overrides {
        latest_match: raw
            .latest_match
            .try_map(|r| LatestMatch::from_raw(r, &scope))?,
        cutoff: raw.cutoff_date.try_map(|r| Cutoff::from_raw(r, now, &scope))?,
        max_displayed: raw
            .max_displayed
            .try_map(|r| MaxDisplayed::from_raw(r, &scope))?,
        inherit: raw
            .inherit_parent_matchers
            .try_map(|r| InheritMode::from_raw(r, &scope))?,
    };

    let children = raw
        .categories
        .iter()
        .map(|c| compile_category(c, now))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Category {
        name: raw.name.clone(),
        description: raw.description.clone(),
        tooltip: raw.tooltip.clone(),
        matcher: Matcher::compile(&raw.matcher, &scope)?,
        overrides,
        show_releases: raw.show_releases,
        children,
    })
}
