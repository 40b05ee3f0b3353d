//! Static site output.
//!
//! Writes `releases.json` (the serialized classification) and `index.html`
//! into an output directory.

mod html;

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::classify::Classification;
use crate::runtime::Runtime;

pub use html::{escape, render};

pub const DATA_FILE: &str = "releases.json";
pub const PAGE_FILE: &str = "index.html";

/// Write the site into `output_dir`, creating it if needed.
#[tracing::instrument(skip(runtime, classification))]
pub fn write_site<R: Runtime>(
    runtime: &R,
    output_dir: &Path,
    title: &str,
    classification: &Classification,
) -> Result<()> {
    if !runtime.exists(output_dir) {
        runtime
            .create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;
    }

    let data = serde_json::to_string_pretty(classification)
        .context("Failed to serialize classification")?;
    let data_path = output_dir.join(DATA_FILE);
    runtime
        .write(&data_path, data.as_bytes())
        .with_context(|| format!("Failed to write {:?}", data_path))?;

    let page = render(title, classification);
    let page_path = output_dir.join(PAGE_FILE);
    runtime
        .write(&page_path, page.as_bytes())
        .with_context(|| format!("Failed to write {:?}", page_path))?;

    info!("Site written to {:?}", output_dir);
    Ok(())
}
