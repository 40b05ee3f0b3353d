//! Release cache file.
//!
//! `relcat fetch` stores the fetched release list so that `relcat build` can
//! run offline and reproducibly.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::release::Release;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseCache {
    pub repo: String,
    pub fetched_at: DateTime<Utc>,
    pub releases: Vec<Release>,
}

impl ReleaseCache {
    pub fn new(repo: String, fetched_at: DateTime<Utc>, releases: Vec<Release>) -> Self {
        Self {
            repo,
            fetched_at,
            releases,
        }
    }

    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read release cache {:?}", path))?;
        let cache: ReleaseCache = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse release cache {:?}", path))?;
        debug!(
            "Loaded {} releases of {} fetched at {}",
            cache.releases.len(),
            cache.repo,
            cache.fetched_at
        );
        Ok(cache)
    }

    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !runtime.exists(parent) {
                runtime.create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        runtime
            .write(path, json.as_bytes())
            .with_context(|| format!("Failed to write release cache {:?}", path))
    }
}
