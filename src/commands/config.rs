use anyhow::Result;

use crate::{
    provider::{GitHubProvider, ReleaseSource},
    runtime::Runtime,
};

/// Collaborators shared by the commands.
pub struct Config<R: Runtime, S: ReleaseSource> {
    pub runtime: R,
    pub source: S,
}

impl<R: Runtime> Config<R, GitHubProvider> {
    pub fn new(runtime: R, api_url: Option<String>) -> Result<Self> {
        let source = GitHubProvider::new(&runtime, api_url)?;
        Ok(Self { runtime, source })
    }
}
