//! Release data model.
//!
//! [`Release`] is the immutable fact fetched from the provider (or read from the
//! cache file). [`ReleaseEntry`] is the per-scope display copy: it shares the
//! underlying release and layers the scope-specific `is_latest` flag on top.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stable release identifier, unique per repository.
pub type ReleaseId = u64;

/// A downloadable asset attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// Size in bytes, unknown for generated source archives
    #[serde(default)]
    pub size: Option<u64>,
    /// Archive generated by the host from the tagged source tree
    #[serde(default)]
    pub is_source_code: bool,
}

/// A published release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Release {
    pub id: ReleaseId,
    /// Version tag (e.g., "v1.0.0")
    pub tag: String,
    /// Release name/title
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: String,
    /// Markdown release notes
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    #[serde(default)]
    pub author: Option<serde_json::Value>,
    #[serde(default)]
    pub reactions: Option<serde_json::Value>,
}

impl Release {
    /// Display title, falling back to the tag when the name is absent or empty.
    pub fn title(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.tag,
        }
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Names of uploaded (non source-code) assets, one per line.
    pub fn asset_names(&self) -> String {
        self.assets
            .iter()
            .filter(|a| !a.is_source_code)
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A release as displayed inside one scope (category or unmatched bucket).
///
/// The same release can sit in several scopes at once, each with its own
/// `is_latest` flag, so entries are cloned per scope while the release itself
/// stays shared.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReleaseEntry {
    #[serde(flatten)]
    pub release: Arc<Release>,
    pub is_latest: bool,
}

impl ReleaseEntry {
    pub fn new(release: Arc<Release>) -> Self {
        Self {
            release,
            is_latest: false,
        }
    }

    pub fn id(&self) -> ReleaseId {
        self.release.id
    }
}
