use anyhow::Result;
use std::path::Path;

use crate::{
    classify::{Category, Resolved},
    config::SiteConfig,
    runtime::Runtime,
};

/// Validate a configuration file and print its category outline.
#[tracing::instrument(skip(runtime))]
pub fn check<R: Runtime>(runtime: &R, config_path: &Path) -> Result<()> {
    let site = SiteConfig::load(runtime, config_path)?;
    print!("{}", outline(&site));
    Ok(())
}

/// Category outline with every node's effective settings.
pub fn outline(site: &SiteConfig) -> String {
    let mut out = format!("Title: {}\n", site.title);
    if let Some(repo) = &site.repo {
        out.push_str(&format!("Repository: {}\n", repo));
    }
    out.push_str(&format!(
        "Defaults: latest-match={} cutoff-date={} max-displayed={}\n",
        site.defaults.latest_match, site.defaults.cutoff, site.defaults.max_displayed
    ));
    if site.filter.is_declared() {
        out.push_str("Filter: declared\n");
    }

    out.push_str("Categories:\n");
    if site.categories.is_empty() {
        out.push_str("  (none)\n");
    }
    for category in &site.categories {
        outline_category(&mut out, site, category, None, 1);
    }

    let unmatched = Resolved::resolve(&site.unmatched, None, &site.defaults);
    out.push_str(&format!("Unmatched: {}\n", describe(&unmatched)));
    out
}

fn outline_category(
    out: &mut String,
    site: &SiteConfig,
    category: &Category,
    parent: Option<&Resolved>,
    depth: usize,
) {
    let resolved = Resolved::resolve(&category.overrides, parent, &site.defaults);
    let mut line = format!(
        "{}{}: {} inherit={}",
        "  ".repeat(depth),
        category.name,
        describe(&resolved),
        resolved.inherit
    );
    if !category.show_releases {
        line.push_str(" (releases hidden)");
    }
    out.push_str(&line);
    out.push('\n');

    for child in &category.children {
        outline_category(out, site, child, Some(&resolved), depth + 1);
    }
}

fn describe(resolved: &Resolved) -> String {
    format!(
        "latest-match={} cutoff-date={} max-displayed={}",
        resolved.latest_match, resolved.cutoff, resolved.max_displayed
    )
}
