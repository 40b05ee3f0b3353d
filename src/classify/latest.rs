//! Latest selection: which releases of a scope get the "latest" badge.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::release::{ReleaseEntry, ReleaseId};

use super::error::{ConfigError, Result};
use super::matcher::{Matcher, MatcherSpec};

/// Rule deciding the latest releases of a scope.
#[derive(Debug, Clone, Default)]
pub enum LatestMatch {
    /// No release is marked latest
    Disabled,
    /// Only the newest release is marked latest
    #[default]
    Newest,
    /// Every release satisfying the matcher is marked latest
    Rule(Matcher),
}

impl fmt::Display for LatestMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatestMatch::Disabled => write!(f, "off"),
            LatestMatch::Newest => write!(f, "newest"),
            LatestMatch::Rule(_) => write!(f, "rule"),
        }
    }
}

/// `latest-match` as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLatestMatch {
    Flag(bool),
    Keyword(String),
    Rules(Vec<MatcherSpec>),
    Rule(MatcherSpec),
}

impl LatestMatch {
    pub fn from_raw(raw: &RawLatestMatch, scope: &str) -> Result<Self> {
        match raw {
            RawLatestMatch::Flag(false) => Ok(LatestMatch::Disabled),
            RawLatestMatch::Flag(true) => Ok(LatestMatch::Newest),
            RawLatestMatch::Keyword(keyword) if keyword.eq_ignore_ascii_case("newest") => {
                Ok(LatestMatch::Newest)
            }
            RawLatestMatch::Keyword(keyword) => Err(ConfigError::InvalidLatestMatch {
                scope: scope.to_string(),
                value: keyword.clone(),
            }),
            RawLatestMatch::Rules(specs) => Ok(LatestMatch::Rule(Matcher::compile_all(specs, scope)?)),
            RawLatestMatch::Rule(spec) => Ok(LatestMatch::Rule(Matcher::compile(spec, scope)?)),
        }
    }

    /// Select the latest releases of a scope sorted newest first.
    ///
    /// Rules are evaluated with the newest release provisionally flagged as
    /// latest, so an `is-latest` leaf can refer to "the newest release".
    pub fn select(&self, entries: &[ReleaseEntry]) -> HashSet<ReleaseId> {
        match self {
            LatestMatch::Disabled => HashSet::new(),
            LatestMatch::Newest => entries.first().map(ReleaseEntry::id).into_iter().collect(),
            LatestMatch::Rule(matcher) => entries
                .iter()
                .enumerate()
                .filter(|(index, entry)| {
                    let probe = ReleaseEntry {
                        release: entry.release.clone(),
                        is_latest: *index == 0,
                    };
                    matcher.test(&probe)
                })
                .map(|(_, entry)| entry.id())
                .collect(),
        }
    }

    /// Flag the selected releases and move them to the front.
    ///
    /// The order within the latest and non-latest groups is preserved.
    pub fn apply(&self, mut entries: Vec<ReleaseEntry>) -> Vec<ReleaseEntry> {
        let latest = self.select(&entries);
        for entry in &mut entries {
            entry.is_latest = latest.contains(&entry.id());
        }
        entries.sort_by_key(|e| !e.is_latest);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::Release;
    use std::sync::Arc;

    fn make_entry(id: u64, tag: &str, prerelease: bool) -> ReleaseEntry {
        ReleaseEntry::new(Arc::new(Release {
            id,
            tag: tag.to_string(),
            prerelease,
            ..Default::default()
        }))
    }

    fn sample() -> Vec<ReleaseEntry> {
        vec![
            make_entry(3, "v3.0.0-rc1", true),
            make_entry(2, "v2.0.0", false),
            make_entry(1, "v1.0.0", false),
        ]
    }

    fn rule(yaml: &str) -> LatestMatch {
        let raw: RawLatestMatch = serde_yaml::from_str(yaml).unwrap();
        LatestMatch::from_raw(&raw, "test").unwrap()
    }

    fn ids(entries: &[ReleaseEntry]) -> Vec<u64> {
        entries.iter().map(|e| e.id()).collect()
    }

    #[test]
    fn test_disabled_selects_nothing() {
        assert!(LatestMatch::Disabled.select(&sample()).is_empty());
        let applied = LatestMatch::Disabled.apply(sample());
        assert!(applied.iter().all(|e| !e.is_latest));
        assert_eq!(ids(&applied), vec![3, 2, 1]);
    }

    #[test]
    fn test_newest_selects_first() {
        let selected = LatestMatch::Newest.select(&sample());
        assert_eq!(selected, HashSet::from([3]));
        assert!(LatestMatch::Newest.select(&[]).is_empty());
    }

    #[test]
    fn test_rule_selects_every_match() {
        let latest = rule("is-prerelease: false");
        assert_eq!(latest.select(&sample()), HashSet::from([2, 1]));
    }

    #[test]
    fn test_rule_can_reference_newest() {
        let latest = rule("- is-latest: true\n- is-prerelease: false");
        assert!(latest.select(&sample()).is_empty());

        let latest = rule("match-any:\n  - is-latest: true\n  - tag: '^v1'");
        assert_eq!(latest.select(&sample()), HashSet::from([3, 1]));
    }

    #[test]
    fn test_apply_moves_latest_first_keeping_order() {
        let latest = rule("is-prerelease: false");
        let applied = latest.apply(sample());
        assert_eq!(ids(&applied), vec![2, 1, 3]);
        assert!(applied[0].is_latest && applied[1].is_latest);
        assert!(!applied[2].is_latest);
    }

    #[test]
    fn test_raw_keywords() {
        assert!(matches!(rule("newest"), LatestMatch::Newest));
        assert!(matches!(rule("true"), LatestMatch::Newest));
        assert!(matches!(rule("false"), LatestMatch::Disabled));

        let raw = RawLatestMatch::Keyword("oldest".into());
        assert!(LatestMatch::from_raw(&raw, "test").is_err());
    }
}
