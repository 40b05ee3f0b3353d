use anyhow::{Context, Result, bail};
use log::info;
use std::path::PathBuf;

use crate::{
    cache::ReleaseCache,
    config::SiteConfig,
    provider::{ReleaseSource, RepoId},
    release::Release,
    runtime::Runtime,
    site::write_site,
};

use super::config::Config;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub config_path: PathBuf,
    /// Release cache to read instead of fetching
    pub releases: Option<PathBuf>,
    /// Overrides `repo` from the configuration
    pub repo: Option<String>,
    pub output: PathBuf,
}

#[tracing::instrument(skip(runtime, api_url))]
pub async fn build<R: Runtime>(
    runtime: R,
    options: BuildOptions,
    api_url: Option<String>,
) -> Result<()> {
    let config = Config::new(runtime, api_url)?;
    run(config, options).await
}

#[tracing::instrument(skip(config))]
pub async fn run<R: Runtime, S: ReleaseSource>(
    config: Config<R, S>,
    options: BuildOptions,
) -> Result<()> {
    let site = SiteConfig::load(&config.runtime, &options.config_path)?;
    let releases = load_releases(&config, &site, &options).await?;
    let total = releases.len();

    let classification = site.classify(releases);
    info!(
        "Classified {} releases into {} top-level categories, {} unmatched",
        total,
        classification.categories.len(),
        classification.unmatched.len()
    );

    write_site(&config.runtime, &options.output, &site.title, &classification)?;
    println!(
        "Built {} ({} releases) into {}",
        site.title,
        total,
        options.output.display()
    );
    Ok(())
}

async fn load_releases<R: Runtime, S: ReleaseSource>(
    config: &Config<R, S>,
    site: &SiteConfig,
    options: &BuildOptions,
) -> Result<Vec<Release>> {
    if let Some(path) = &options.releases {
        return Ok(ReleaseCache::load(&config.runtime, path)?.releases);
    }

    let repo = match (&options.repo, &site.repo) {
        (Some(repo), _) => repo.parse::<RepoId>().context("Invalid --repo")?,
        (None, Some(repo)) => repo.clone(),
        (None, None) => bail!(
            "No repository to fetch releases from: pass --repo, --releases or set `repo` in {:?}",
            options.config_path
        ),
    };
    info!("Fetching releases of {}...", repo);
    config.source.fetch_releases(&repo).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockReleaseSource;
    use crate::runtime::MockRuntime;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const CONFIG: &str = r#"
title: Tool releases
repo: owner/tool
categories:
  - name: Stable
    is-prerelease: false
  - name: Beta
    is-prerelease: true
"#;

    type Written = Arc<Mutex<HashMap<PathBuf, String>>>;

    fn make_release(id: u64, tag: &str, prerelease: bool) -> Release {
        Release {
            id,
            tag: tag.into(),
            prerelease,
            published_at: Utc.with_ymd_and_hms(2024, 3, id as u32, 0, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    fn mock_runtime(files: Vec<(&'static str, String)>) -> (MockRuntime, Written) {
        let mut runtime = MockRuntime::new();
        let files: HashMap<PathBuf, String> = files
            .into_iter()
            .map(|(p, c)| (PathBuf::from(p), c))
            .collect();
        runtime.expect_read_to_string().returning(move |path| {
            files
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such file: {:?}", path))
        });
        runtime
            .expect_now()
            .returning(|| Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap());
        runtime.expect_exists().returning(|_| true);

        let written: Written = Arc::new(Mutex::new(HashMap::new()));
        let sink = written.clone();
        runtime.expect_write().returning(move |path, contents| {
            sink.lock()
                .unwrap()
                .insert(path.to_path_buf(), String::from_utf8_lossy(contents).into_owned());
            Ok(())
        });
        (runtime, written)
    }

    fn options() -> BuildOptions {
        BuildOptions {
            config_path: PathBuf::from("relcat.yaml"),
            releases: None,
            repo: None,
            output: PathBuf::from("site"),
        }
    }

    #[tokio::test]
    async fn test_build_fetches_from_configured_repo() {
        let (runtime, written) = mock_runtime(vec![("relcat.yaml", CONFIG.to_string())]);
        let mut source = MockReleaseSource::new();
        source
            .expect_fetch_releases()
            .with(eq(RepoId {
                owner: "owner".into(),
                repo: "tool".into(),
            }))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    make_release(1, "v1.0.0", false),
                    make_release(2, "v1.1.0-rc.1", true),
                ])
            });

        run(Config { runtime, source }, options()).await.unwrap();

        let written = written.lock().unwrap();
        let data: serde_json::Value =
            serde_json::from_str(&written[Path::new("site/releases.json")]).unwrap();
        assert_eq!(data["categories"][0]["id"], "stable");
        assert_eq!(data["categories"][0]["releases"][0]["tag"], "v1.0.0");
        assert_eq!(data["categories"][0]["releases"][0]["is_latest"], true);
        assert_eq!(data["categories"][1]["releases"][0]["tag"], "v1.1.0-rc.1");

        let page = &written[Path::new("site/index.html")];
        assert!(page.contains("<h1>Tool releases</h1>"));
    }

    #[tokio::test]
    async fn test_build_repo_flag_overrides_config() {
        let (runtime, _written) = mock_runtime(vec![("relcat.yaml", CONFIG.to_string())]);
        let mut source = MockReleaseSource::new();
        source
            .expect_fetch_releases()
            .with(eq(RepoId {
                owner: "other".into(),
                repo: "fork".into(),
            }))
            .times(1)
            .returning(|_| Ok(vec![]));

        let mut options = options();
        options.repo = Some("other/fork".into());
        run(Config { runtime, source }, options).await.unwrap();
    }

    #[tokio::test]
    async fn test_build_from_release_cache() {
        let cache = ReleaseCache::new(
            "owner/tool".into(),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
            vec![make_release(3, "v2.0.0", false)],
        );
        let (runtime, written) = mock_runtime(vec![
            ("relcat.yaml", CONFIG.to_string()),
            ("cache.json", serde_json::to_string(&cache).unwrap()),
        ]);
        let mut source = MockReleaseSource::new();
        source.expect_fetch_releases().never();

        let mut options = options();
        options.releases = Some(PathBuf::from("cache.json"));
        run(Config { runtime, source }, options).await.unwrap();

        let written = written.lock().unwrap();
        assert!(written[Path::new("site/releases.json")].contains("v2.0.0"));
    }

    #[tokio::test]
    async fn test_build_without_repo_fails() {
        let (runtime, _written) = mock_runtime(vec![(
            "relcat.yaml",
            "categories:\n  - name: All\n    tag: .\n".to_string(),
        )]);
        let mut source = MockReleaseSource::new();
        source.expect_fetch_releases().never();

        let err = run(Config { runtime, source }, options()).await.unwrap_err();
        assert!(err.to_string().contains("No repository"));
    }

    #[tokio::test]
    async fn test_build_invalid_config_fails_before_fetch() {
        let (runtime, _written) = mock_runtime(vec![(
            "relcat.yaml",
            "repo: owner/tool\ncategories:\n  - name: Broken\n    tag: \"(\"\n".to_string(),
        )]);
        let mut source = MockReleaseSource::new();
        source.expect_fetch_releases().never();

        let err = run(Config { runtime, source }, options()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Broken"));
    }
}
