//! GitHub release source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::http::{HttpClient, Page};
use crate::release::{Release, ReleaseAsset};
use crate::runtime::Runtime;

use super::{ReleaseSource, RepoId};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Upper bound on followed pages (100 releases each).
const MAX_PAGES: usize = 10;
const PER_PAGE: usize = 100;

/// GitHub API response types (internal).
mod api {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub id: u64,
        pub tag_name: String,
        pub name: Option<String>,
        #[serde(default)]
        pub html_url: String,
        pub body: Option<String>,
        #[serde(default)]
        pub draft: bool,
        #[serde(default)]
        pub prerelease: bool,
        pub published_at: Option<DateTime<Utc>>,
        pub tarball_url: Option<String>,
        pub zipball_url: Option<String>,
        #[serde(default)]
        pub assets: Vec<Asset>,
        pub author: Option<serde_json::Value>,
        pub reactions: Option<serde_json::Value>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Asset {
        pub name: String,
        pub size: u64,
        pub browser_download_url: String,
    }
}

/// GitHub REST API release source.
pub struct GitHubProvider {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubProvider {
    /// Create a provider, authenticating with `GITHUB_TOKEN` when it is set.
    pub fn new<R: Runtime>(runtime: &R, api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for authentication");
        }

        let client = Client::builder()
            .user_agent("relcat")
            .default_headers(headers)
            .build()?;

        Ok(Self::from_http_client(
            HttpClient::new(client),
            api_url.as_deref().unwrap_or(DEFAULT_API_URL),
        ))
    }

    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn fetch_all(&self, repo: &RepoId) -> Result<Vec<api::Release>> {
        let mut releases = Vec::new();
        let mut url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.repo);
        let per_page = PER_PAGE.to_string();
        let first_query = [("per_page", per_page.as_str())];
        let mut query: &[(&str, &str)] = &first_query;

        for page in 1..=MAX_PAGES {
            debug!("Fetching releases page {} from {}...", page, url);

            let Page { data, next } = self
                .http_client
                .get_json_page::<Vec<api::Release>>(&url, query)
                .await
                .with_context(|| format!("Failed to fetch releases of {}", repo))?;

            let short_page = data.len() < PER_PAGE;
            releases.extend(data);
            if short_page {
                break;
            }

            match next {
                // The next link already carries the query string.
                Some(next) => {
                    url = next;
                    query = &[];
                }
                None => break,
            }
        }

        Ok(releases)
    }
}

#[async_trait]
impl ReleaseSource for GitHubProvider {
    #[tracing::instrument(skip(self))]
    async fn fetch_releases(&self, repo: &RepoId) -> Result<Vec<Release>> {
        let fetched = self.fetch_all(repo).await?;
        let total = fetched.len();

        let releases: Vec<Release> = fetched.into_iter().filter_map(convert_release).collect();
        debug!(
            "Fetched {} releases of {} ({} drafts or unpublished skipped)",
            releases.len(),
            repo,
            total - releases.len()
        );
        Ok(releases)
    }
}

/// Convert an API release; drafts and unpublished releases are skipped.
fn convert_release(r: api::Release) -> Option<Release> {
    if r.draft {
        return None;
    }
    let published_at: DateTime<Utc> = r.published_at?;

    let mut assets: Vec<ReleaseAsset> = r
        .assets
        .into_iter()
        .map(|a| ReleaseAsset {
            name: a.name,
            url: a.browser_download_url,
            size: Some(a.size),
            is_source_code: false,
        })
        .collect();
    let archives = [
        ("Source code (zip)", r.zipball_url),
        ("Source code (tar.gz)", r.tarball_url),
    ];
    for (name, url) in archives {
        if let Some(url) = url {
            assets.push(ReleaseAsset {
                name: name.to_string(),
                url,
                size: None,
                is_source_code: true,
            });
        }
    }

    Some(Release {
        id: r.id,
        tag: r.tag_name,
        name: r.name,
        url: r.html_url,
        body: r.body,
        prerelease: r.prerelease,
        published_at,
        assets,
        author: r.author,
        reactions: r.reactions,
    })
}
