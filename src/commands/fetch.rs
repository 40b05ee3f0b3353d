use anyhow::Result;
use log::info;
use std::path::Path;

use crate::{
    cache::ReleaseCache,
    provider::{ReleaseSource, RepoId},
    runtime::Runtime,
};

use super::config::Config;

#[tracing::instrument(skip(runtime, api_url))]
pub async fn fetch<R: Runtime>(
    runtime: R,
    repo_str: &str,
    output: &Path,
    api_url: Option<String>,
) -> Result<()> {
    let config = Config::new(runtime, api_url)?;
    run(config, repo_str, output).await
}

#[tracing::instrument(skip(config))]
pub async fn run<R: Runtime, S: ReleaseSource>(
    config: Config<R, S>,
    repo_str: &str,
    output: &Path,
) -> Result<()> {
    let repo = repo_str.parse::<RepoId>()?;
    info!("Fetching releases of {}...", repo);
    let releases = config.source.fetch_releases(&repo).await?;
    let count = releases.len();

    let cache = ReleaseCache::new(repo.to_string(), config.runtime.now(), releases);
    cache.save(&config.runtime, output)?;

    println!("Fetched {} releases of {} into {}", count, repo, output.display());
    Ok(())
}
