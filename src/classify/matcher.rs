//! Release matchers.
//!
//! A matcher is a tree of predicates over a single release. Leaf keys test one
//! field with a case-insensitive regex search (or a boolean flag), while
//! `match-all` / `match-any` nest further matchers. Every condition present on
//! a node must hold.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize};

use crate::release::ReleaseEntry;

use super::error::{ConfigError, Result};

/// Matcher as written in the configuration file.
///
/// Unknown keys are rejected so a misspelled condition cannot silently turn
/// into "no condition".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MatcherSpec {
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub title_not: Option<String>,
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub tag_not: Option<String>,
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub body_not: Option<String>,
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(default, deserialize_with = "pattern", skip_serializing_if = "Option::is_none")]
    pub assets_not: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_prerelease: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_latest: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_all: Option<Vec<MatcherSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_any: Option<Vec<MatcherSpec>>,
}

/// Patterns are strings, but unquoted YAML like `tag: 2024` reads as an
/// integer; take it verbatim. Floats are not accepted since `1.10` would
/// not survive the round trip.
fn pattern<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Unsigned(n) => n.to_string(),
        Scalar::Signed(n) => n.to_string(),
    }))
}

/// Release field a pattern leaf is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Tag,
    Body,
    Assets,
}

#[derive(Debug, Clone)]
struct PatternLeaf {
    field: Field,
    /// `-not` leaves reject the release when the pattern matches
    negate: bool,
    regex: Regex,
}

impl PatternLeaf {
    fn test(&self, entry: &ReleaseEntry) -> bool {
        let release = &entry.release;
        let found = match self.field {
            Field::Title => self.regex.is_match(release.title()),
            Field::Tag => self.regex.is_match(&release.tag),
            Field::Body => self.regex.is_match(release.body()),
            Field::Assets => self.regex.is_match(&release.asset_names()),
        };
        found != self.negate
    }
}

/// Compiled matcher, ready to be evaluated against releases.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    patterns: Vec<PatternLeaf>,
    is_prerelease: Option<bool>,
    is_latest: Option<bool>,
    match_all: Option<Vec<Matcher>>,
    match_any: Option<Vec<Matcher>>,
}

impl Matcher {
    /// Compile a matcher spec. Invalid patterns fail with the offending key.
    pub fn compile(spec: &MatcherSpec, scope: &str) -> Result<Self> {
        let leaves = [
            ("title", Field::Title, false, &spec.title),
            ("title-not", Field::Title, true, &spec.title_not),
            ("tag", Field::Tag, false, &spec.tag),
            ("tag-not", Field::Tag, true, &spec.tag_not),
            ("body", Field::Body, false, &spec.body),
            ("body-not", Field::Body, true, &spec.body_not),
            ("assets", Field::Assets, false, &spec.assets),
            ("assets-not", Field::Assets, true, &spec.assets_not),
        ];

        let mut patterns = Vec::new();
        for (key, field, negate, pattern) in leaves {
            let Some(pattern) = pattern else {
                continue;
            };
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .multi_line(field == Field::Assets)
                .build()
                .map_err(|source| ConfigError::InvalidPattern {
                    scope: scope.to_string(),
                    key,
                    source,
                })?;
            patterns.push(PatternLeaf {
                field,
                negate,
                regex,
            });
        }

        Ok(Self {
            patterns,
            is_prerelease: spec.is_prerelease,
            is_latest: spec.is_latest,
            match_all: compile_group(spec.match_all.as_deref(), scope)?,
            match_any: compile_group(spec.match_any.as_deref(), scope)?,
        })
    }

    /// Compile a list of specs as one implicit `match-all` group.
    pub fn compile_all(specs: &[MatcherSpec], scope: &str) -> Result<Self> {
        Ok(Self {
            match_all: compile_group(Some(specs), scope)?,
            ..Default::default()
        })
    }

    /// Whether any condition was declared at all.
    ///
    /// An empty `match-any: []` or `match-all: []` still counts as declared.
    pub fn is_declared(&self) -> bool {
        !self.patterns.is_empty()
            || self.is_prerelease.is_some()
            || self.is_latest.is_some()
            || self.match_all.is_some()
            || self.match_any.is_some()
    }

    /// Evaluate the matcher. A matcher without conditions is vacuously true.
    pub fn test(&self, entry: &ReleaseEntry) -> bool {
        if let Some(all) = &self.match_all {
            if !all.iter().all(|m| m.test(entry)) {
                return false;
            }
        }

        if let Some(any) = &self.match_any {
            // An empty match-any does not reject.
            if !any.is_empty() && !any.iter().any(|m| m.test(entry)) {
                return false;
            }
        }

        if let Some(expected) = self.is_prerelease {
            if entry.release.prerelease != expected {
                return false;
            }
        }

        if let Some(expected) = self.is_latest {
            if entry.is_latest != expected {
                return false;
            }
        }

        self.patterns.iter().all(|p| p.test(entry))
    }
}

fn compile_group(specs: Option<&[MatcherSpec]>, scope: &str) -> Result<Option<Vec<Matcher>>> {
    specs
        .map(|specs| {
            specs
                .iter()
                .map(|s| Matcher::compile(s, scope))
                .collect::<Result<Vec<_>>>()
        })
        .transpose()
}
