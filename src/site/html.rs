//! Single-page HTML rendering of a classification.

use crate::classify::{CategoryNode, Classification};
use crate::release::{ReleaseAsset, ReleaseEntry};

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the whole page.
pub fn render(title: &str, classification: &Classification) -> String {
    let title = escape(title);
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n</head>\n<body>\n", title));
    html.push_str(&format!("<h1>{}</h1>\n", title));

    if !classification.categories.is_empty() {
        html.push_str("<nav>\n");
        render_outline(&mut html, &classification.categories);
        html.push_str("</nav>\n");
    }

    for node in &classification.categories {
        render_category(&mut html, node, 2);
    }

    if !classification.unmatched.is_empty() {
        html.push_str("<section id=\"other-releases\" class=\"category\">\n");
        html.push_str("<h2>Other releases</h2>\n");
        render_releases(
            &mut html,
            &classification.unmatched,
            classification.unmatched_max_displayed,
        );
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_outline(html: &mut String, nodes: &[CategoryNode]) {
    html.push_str("<ul>\n");
    for node in nodes {
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a> ({})",
            escape(&node.id),
            escape(&node.name),
            node.total_releases()
        ));
        if !node.categories.is_empty() {
            html.push('\n');
            render_outline(html, &node.categories);
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
}

fn render_category(html: &mut String, node: &CategoryNode, level: usize) {
    let level = level.min(6);
    html.push_str(&format!(
        "<section id=\"{}\" class=\"category\">\n",
        escape(&node.id)
    ));
    match &node.tooltip {
        Some(tooltip) => html.push_str(&format!(
            "<h{level} title=\"{}\">{}</h{level}>\n",
            escape(tooltip),
            escape(&node.name)
        )),
        None => html.push_str(&format!("<h{level}>{}</h{level}>\n", escape(&node.name))),
    }
    if let Some(description) = &node.description {
        html.push_str(&format!(
            "<p class=\"description\">{}</p>\n",
            escape(description)
        ));
    }

    if !node.releases.is_empty() {
        render_releases(html, &node.releases, node.max_displayed);
    }
    for child in &node.categories {
        render_category(html, child, level + 1);
    }
    html.push_str("</section>\n");
}

/// Render a release list, truncated to `max_displayed`.
fn render_releases(html: &mut String, releases: &[ReleaseEntry], max_displayed: Option<usize>) {
    let total = releases.len();
    let shown = max_displayed.map_or(total, |limit| limit.min(total));

    html.push_str("<ol class=\"releases\">\n");
    for entry in &releases[..shown] {
        render_release(html, entry);
    }
    html.push_str("</ol>\n");

    if shown < total {
        html.push_str(&format!(
            "<p class=\"truncated\">Showing {} of {} releases</p>\n",
            shown, total
        ));
    }
}

fn render_release(html: &mut String, entry: &ReleaseEntry) {
    let release = &entry.release;
    html.push_str("<li class=\"release\">\n");
    html.push_str(&format!(
        "<h4><a href=\"{}\">{}</a>",
        escape(&release.url),
        escape(release.title())
    ));
    if entry.is_latest {
        html.push_str(" <span class=\"badge latest\">Latest</span>");
    }
    if release.prerelease {
        html.push_str(" <span class=\"badge prerelease\">Pre-release</span>");
    }
    html.push_str("</h4>\n");
    html.push_str(&format!(
        "<p class=\"meta\"><code>{}</code> published <time datetime=\"{}\">{}</time></p>\n",
        escape(&release.tag),
        release.published_at.to_rfc3339(),
        release.published_at.format("%Y-%m-%d")
    ));

    let body = release.body();
    if !body.trim().is_empty() {
        html.push_str(&format!("<pre class=\"notes\">{}</pre>\n", escape(body)));
    }

    if !release.assets.is_empty() {
        html.push_str("<ul class=\"assets\">\n");
        for asset in &release.assets {
            render_asset(html, asset);
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</li>\n");
}

fn render_asset(html: &mut String, asset: &ReleaseAsset) {
    let size = asset
        .size
        .map(|s| format!(" ({})", format_size(s)))
        .unwrap_or_default();
    html.push_str(&format!(
        "<li><a href=\"{}\">{}</a>{}</li>\n",
        escape(&asset.url),
        escape(&asset.name),
        size
    ));
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
