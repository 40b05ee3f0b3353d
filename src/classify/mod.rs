//! Classification engine.
//!
//! Turns a flat release list plus a category configuration into an annotated,
//! filtered category tree and the residual unmatched bucket. The engine is
//! pure: configuration errors are raised while compiling the configuration,
//! building the tree itself cannot fail.
//!
//! # Structure
//!
//! - `matcher` - Regex / flag predicates and `match-all` / `match-any` groups
//! - `category` - Category matching with parent inheritance, global filter
//! - `cutoff` - Cutoff date parsing and filtering
//! - `latest` - Latest release selection
//! - `settings` - Three-state inheritable settings
//! - `tree` - Tree builder orchestrating all of the above

mod category;
mod cutoff;
mod error;
mod latest;
mod matcher;
mod settings;
mod slug;
mod tree;

use std::sync::Arc;

use crate::release::{Release, ReleaseEntry};

pub use category::{Category, InheritMode, Overrides, RawInheritMode, matches_filter};
pub use cutoff::{Cutoff, RawCutoff, parse_cutoff};
pub use error::{ConfigError, category_scope};
pub use latest::{LatestMatch, RawLatestMatch};
pub use matcher::{Matcher, MatcherSpec};
pub use settings::{DEFAULT_MAX_DISPLAYED, Defaults, MaxDisplayed, RawMaxDisplayed, Resolved, Setting};
pub use slug::slugify;
pub use tree::{CategoryNode, Classification, TreeBuilder};

/// Apply the global filter, then build the category tree.
pub fn classify(
    releases: Vec<Release>,
    filter: &Matcher,
    categories: &[Category],
    defaults: &Defaults,
    unmatched: &Overrides,
) -> Classification {
    let releases: Vec<Arc<Release>> = releases
        .into_iter()
        .map(Arc::new)
        .filter(|r| matches_filter(&ReleaseEntry::new(r.clone()), filter))
        .collect();

    TreeBuilder::new(&releases, defaults).build(categories, unmatched)
}
