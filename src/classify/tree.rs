//! Tree builder: turns the flat release list into the annotated category tree.
//!
//! Every category is evaluated against the complete release list, so a
//! release can land in several categories. Parents are processed before their
//! children; each child receives the parent's effective settings and its
//! per-release match results. Ids matched anywhere are returned alongside the
//! nodes, and whatever no category matched ends up in the unmatched bucket.

use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::release::{Release, ReleaseEntry, ReleaseId};

use super::category::{Category, Overrides};
use super::settings::{Defaults, Resolved};
use super::slug::child_id;

/// A category of the resolved tree.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    /// Slug path, e.g. `tools/cli`
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    /// Latest releases first, then newest first
    pub releases: Vec<ReleaseEntry>,
    pub categories: Vec<CategoryNode>,
    /// `None` means unbounded
    pub max_displayed: Option<usize>,
}

impl CategoryNode {
    /// Number of releases in this node and all of its descendants.
    pub fn total_releases(&self) -> usize {
        self.releases.len()
            + self
                .categories
                .iter()
                .map(CategoryNode::total_releases)
                .sum::<usize>()
    }
}

/// Result of a classification run.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub categories: Vec<CategoryNode>,
    pub unmatched: Vec<ReleaseEntry>,
    pub default_max_displayed: Option<usize>,
    pub unmatched_max_displayed: Option<usize>,
}

/// Context a node passes down to its children.
struct ParentContext<'a> {
    id: &'a str,
    settings: &'a Resolved,
    matches: &'a HashMap<ReleaseId, bool>,
}

pub struct TreeBuilder<'a> {
    releases: &'a [Arc<Release>],
    defaults: &'a Defaults,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(releases: &'a [Arc<Release>], defaults: &'a Defaults) -> Self {
        Self { releases, defaults }
    }

    /// Build the pruned category tree and the unmatched bucket.
    #[tracing::instrument(skip_all, fields(releases = self.releases.len()))]
    pub fn build(&self, categories: &[Category], unmatched: &Overrides) -> Classification {
        let (nodes, matched) = self.build_level(categories, None);
        let categories = prune(nodes);

        let settings = Resolved::resolve(unmatched, None, self.defaults);
        let leftovers = self
            .releases
            .iter()
            .filter(|r| !matched.contains(&r.id))
            .map(|r| ReleaseEntry::new(r.clone()))
            .collect();
        let unmatched = finish_scope(leftovers, &settings);

        debug!(
            "Classified {} releases: {} matched, {} unmatched after filtering",
            self.releases.len(),
            matched.len(),
            unmatched.len()
        );

        Classification {
            categories,
            unmatched,
            default_max_displayed: self.defaults.max_displayed.limit(),
            unmatched_max_displayed: settings.max_displayed.limit(),
        }
    }

    fn build_level(
        &self,
        categories: &[Category],
        parent: Option<&ParentContext<'_>>,
    ) -> (Vec<CategoryNode>, HashSet<ReleaseId>) {
        let mut nodes = Vec::with_capacity(categories.len());
        let mut matched = HashSet::new();
        let mut used_ids = HashSet::new();

        for category in categories {
            let id = unique_id(child_id(parent.map(|p| p.id), &category.name), &mut used_ids);
            let (node, node_matched) = self.build_node(category, id, parent);
            matched.extend(node_matched);
            nodes.push(node);
        }

        (nodes, matched)
    }

    fn build_node(
        &self,
        category: &Category,
        id: String,
        parent: Option<&ParentContext<'_>>,
    ) -> (CategoryNode, HashSet<ReleaseId>) {
        let settings = Resolved::resolve(&category.overrides, parent.map(|p| p.settings), self.defaults);

        let mut matches = HashMap::with_capacity(self.releases.len());
        let mut matched = HashSet::new();
        let mut entries = Vec::new();

        for release in self.releases {
            let entry = ReleaseEntry::new(release.clone());
            let parent_match = parent.and_then(|p| p.matches.get(&release.id).copied());
            let is_match = category.matches(&entry, parent_match, settings.inherit);

            matches.insert(release.id, is_match);
            if is_match {
                matched.insert(release.id);
                if category.show_releases {
                    entries.push(entry);
                }
            }
        }

        let releases = finish_scope(entries, &settings);
        debug!(
            "Category {}: {} matched, {} kept",
            id,
            matched.len(),
            releases.len()
        );

        let context = ParentContext {
            id: &id,
            settings: &settings,
            matches: &matches,
        };
        let (children, child_matched) = self.build_level(&category.children, Some(&context));
        matched.extend(child_matched);

        let node = CategoryNode {
            id,
            name: category.name.clone(),
            description: category.description.clone(),
            tooltip: category.tooltip.clone(),
            releases,
            categories: children,
            max_displayed: settings.max_displayed.limit(),
        };
        (node, matched)
    }
}

/// Cutoff, newest-first sort and latest selection for one scope.
fn finish_scope(entries: Vec<ReleaseEntry>, settings: &Resolved) -> Vec<ReleaseEntry> {
    let mut entries = settings.cutoff.apply(entries);
    entries.sort_by(|a, b| b.release.published_at.cmp(&a.release.published_at));
    settings.latest_match.apply(entries)
}

/// Sibling ids are made unique by appending `-2`, `-3`, ...
fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if used.insert(candidate.clone()) {
            warn!("Duplicate category id {:?}, using {:?}", base, candidate);
            return candidate;
        }
        n += 1;
    }
}

/// Drop categories without releases anywhere in their subtree.
fn prune(nodes: Vec<CategoryNode>) -> Vec<CategoryNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            node.categories = prune(node.categories);
            (!node.releases.is_empty() || !node.categories.is_empty()).then_some(node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::category::InheritMode;
    use crate::classify::cutoff::Cutoff;
    use crate::classify::latest::LatestMatch;
    use crate::classify::matcher::{Matcher, MatcherSpec};
    use crate::classify::settings::{MaxDisplayed, Setting};
    use chrono::{TimeZone, Utc};
    use std::num::NonZeroUsize;

    fn make_release(id: u64, tag: &str, published_at: &str) -> Arc<Release> {
        Arc::new(Release {
            id,
            tag: tag.to_string(),
            published_at: published_at.parse().unwrap(),
            ..Default::default()
        })
    }

    /// R1 newest, R3 oldest.
    fn three_releases() -> Vec<Arc<Release>> {
        vec![
            make_release(2, "v2.0.0", "2024-02-01T00:00:00Z"),
            make_release(3, "v1.0.0", "2024-01-01T00:00:00Z"),
            make_release(1, "v3.0.0", "2024-03-01T00:00:00Z"),
        ]
    }

    fn defaults() -> Defaults {
        Defaults {
            latest_match: LatestMatch::Newest,
            cutoff: Cutoff::Disabled,
            max_displayed: MaxDisplayed::default(),
        }
    }

    fn make_category(name: &str, matcher_yaml: &str, children: Vec<Category>) -> Category {
        let spec: MatcherSpec = serde_yaml::from_str(matcher_yaml).unwrap();
        Category {
            name: name.to_string(),
            matcher: Matcher::compile(&spec, name).unwrap(),
            show_releases: true,
            children,
            ..Default::default()
        }
    }

    fn limit(n: usize) -> MaxDisplayed {
        MaxDisplayed::Limit(NonZeroUsize::new(n).unwrap())
    }

    fn ids(entries: &[ReleaseEntry]) -> Vec<u64> {
        entries.iter().map(|e| e.id()).collect()
    }

    fn build(releases: &[Arc<Release>], categories: &[Category]) -> Classification {
        let defaults = defaults();
        TreeBuilder::new(releases, &defaults).build(categories, &Overrides::default())
    }

    #[test]
    fn test_default_settings_sort_and_latest() {
        let releases = three_releases();
        let result = build(&releases, &[make_category("All", "tag: '^v'", vec![])]);

        let node = &result.categories[0];
        assert_eq!(ids(&node.releases), vec![1, 2, 3]);
        assert!(node.releases[0].is_latest);
        assert!(!node.releases[1].is_latest);
        assert!(!node.releases[2].is_latest);
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_cutoff_excludes_older_releases() {
        let releases = three_releases();
        let mut category = make_category("All", "tag: '^v'", vec![]);
        category.overrides.cutoff = Setting::Explicit(Cutoff::After(
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        ));

        let result = build(&releases, &[category]);
        assert_eq!(ids(&result.categories[0].releases), vec![1, 2]);
        // Matched but cut off is not unmatched.
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_max_displayed_is_recorded_not_applied() {
        let releases = three_releases();
        let mut category = make_category("All", "tag: '^v'", vec![]);
        category.overrides.max_displayed = Setting::Explicit(limit(2));

        let result = build(&releases, &[category]);
        assert_eq!(result.categories[0].max_displayed, Some(2));
        assert_eq!(result.categories[0].releases.len(), 3);
    }

    #[test]
    fn test_unlimited_max_displayed_is_none() {
        let releases = three_releases();
        let mut category = make_category("All", "tag: '^v'", vec![]);
        category.overrides.max_displayed = Setting::Explicit(MaxDisplayed::Unlimited);

        let result = build(&releases, &[category]);
        assert_eq!(result.categories[0].max_displayed, None);
        assert_eq!(result.default_max_displayed, Some(100));
    }

    #[test]
    fn test_release_in_sibling_categories_is_cloned() {
        let releases = three_releases();
        let mut b = make_category("B", "tag: '^v3'", vec![]);
        b.overrides.latest_match = Setting::Explicit(LatestMatch::Disabled);
        let result = build(&releases, &[make_category("A", "tag: '^v3'", vec![]), b]);

        let a = &result.categories[0].releases;
        let b = &result.categories[1].releases;
        assert_eq!(ids(a), vec![1]);
        assert_eq!(ids(b), vec![1]);
        assert!(a[0].is_latest);
        assert!(!b[0].is_latest);
        assert!(Arc::ptr_eq(&a[0].release, &b[0].release));

        let mut copy = a[0].clone();
        copy.is_latest = false;
        assert!(result.categories[0].releases[0].is_latest);
    }

    #[test]
    fn test_leaf_without_matchers_matches_nothing() {
        let releases = three_releases();
        let child = make_category("Child", "{}", vec![]);
        let parent = make_category("Parent", "tag: '^v3'", vec![child]);

        let result = build(&releases, &[parent]);
        assert!(result.categories[0].categories.is_empty());
    }

    #[test]
    fn test_leaf_inheriting_parent_matches() {
        let releases = three_releases();
        let mut child = make_category("Child", "{}", vec![]);
        child.overrides.inherit = Setting::Explicit(InheritMode::And);
        let parent = make_category("Parent", "tag: '^v3'", vec![child]);

        let result = build(&releases, &[parent]);
        let child = &result.categories[0].categories[0];
        assert_eq!(child.id, "parent/child");
        assert_eq!(ids(&child.releases), vec![1]);
    }

    #[test]
    fn test_inherit_or_widens_child() {
        let releases = three_releases();
        let mut child = make_category("Child", "tag: '^v1'", vec![]);
        child.overrides.inherit = Setting::Explicit(InheritMode::Or);
        let parent = make_category("Parent", "tag: '^v3'", vec![child]);

        let result = build(&releases, &[parent]);
        assert_eq!(ids(&result.categories[0].categories[0].releases), vec![1, 3]);
    }

    #[test]
    fn test_max_displayed_reset_vs_inherit() {
        let releases = three_releases();
        let mut inherit = make_category("Inherit", "tag: '^v'", vec![]);
        inherit.overrides.max_displayed = Setting::Absent;
        let mut reset = make_category("Reset", "tag: '^v'", vec![]);
        reset.overrides.max_displayed = Setting::Reset;
        let mut parent = make_category("Parent", "tag: '^v'", vec![inherit, reset]);
        parent.overrides.max_displayed = Setting::Explicit(limit(40));

        let result = build(&releases, &[parent]);
        let parent = &result.categories[0];
        assert_eq!(parent.max_displayed, Some(40));
        assert_eq!(parent.categories[0].max_displayed, Some(40));
        assert_eq!(parent.categories[1].max_displayed, Some(100));
    }

    #[test]
    fn test_hidden_category_still_counts_as_matched() {
        let releases = three_releases();
        let mut hidden = make_category("Hidden", "tag: '^v1'", vec![]);
        hidden.show_releases = false;

        let result = build(&releases, &[hidden, make_category("Three", "tag: '^v3'", vec![])]);
        assert_eq!(result.categories.len(), 1);
        assert_eq!(result.categories[0].name, "Three");
        assert_eq!(ids(&result.unmatched), vec![2]);
        assert!(result.unmatched[0].is_latest);
    }

    #[test]
    fn test_hidden_parent_feeds_inheriting_child() {
        let releases = three_releases();
        let mut child = make_category("Child", "{}", vec![]);
        child.overrides.inherit = Setting::Explicit(InheritMode::And);
        let mut parent = make_category("Parent", "tag: '^v2'", vec![child]);
        parent.show_releases = false;

        let result = build(&releases, &[parent]);
        let parent = &result.categories[0];
        assert!(parent.releases.is_empty());
        assert_eq!(ids(&parent.categories[0].releases), vec![2]);
    }

    #[test]
    fn test_unmatched_is_set_difference() {
        let releases = three_releases();
        let nested = make_category("Nested", "tag: '^v2'", vec![]);
        let container = make_category("Container", "{}", vec![nested]);

        let result = build(&releases, &[container]);
        assert_eq!(ids(&result.unmatched), vec![1, 3]);
        assert_eq!(result.categories[0].id, "container");
        assert_eq!(result.categories[0].categories[0].id, "container/nested");
    }

    #[test]
    fn test_empty_containers_are_pruned() {
        let releases = three_releases();
        let empty_leaf = make_category("Nothing", "tag: nope", vec![]);
        let container = make_category("Container", "{}", vec![empty_leaf]);

        let result = build(&releases, &[container]);
        assert!(result.categories.is_empty());
        assert_eq!(result.unmatched.len(), 3);
    }

    #[test]
    fn test_unmatched_uses_own_settings() {
        let releases = three_releases();
        let defaults = defaults();
        let unmatched = Overrides {
            latest_match: Setting::Explicit(LatestMatch::Disabled),
            max_displayed: Setting::Explicit(limit(5)),
            ..Default::default()
        };

        let result = TreeBuilder::new(&releases, &defaults).build(&[], &unmatched);
        assert_eq!(ids(&result.unmatched), vec![1, 2, 3]);
        assert!(result.unmatched.iter().all(|e| !e.is_latest));
        assert_eq!(result.unmatched_max_displayed, Some(5));
        assert_eq!(result.default_max_displayed, Some(100));
    }

    #[test_log::test]
    fn test_sibling_id_collisions_get_suffix() {
        let releases = three_releases();
        let result = build(
            &releases,
            &[
                make_category("Beta", "tag: '^v'", vec![]),
                make_category("beta", "tag: '^v'", vec![]),
                make_category("BETA!", "tag: '^v'", vec![]),
            ],
        );
        let ids: Vec<_> = result.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["beta", "beta-2", "beta-3"]);
    }

    #[test]
    fn test_total_releases_counts_subtree() {
        let releases = three_releases();
        let child = make_category("Child", "tag: '^v1'", vec![]);
        let parent = make_category("Parent", "tag: '^v[23]'", vec![child]);

        let result = build(&releases, &[parent]);
        assert_eq!(result.categories[0].total_releases(), 3);
    }
}
