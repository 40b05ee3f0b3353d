use thiserror::Error;

/// Configuration problems detected while compiling the site configuration.
///
/// `scope` names where the problem sits: `category "Name"`, `defaults`,
/// `unmatched` or `filter`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid regex for `{key}` in {scope}: {source}")]
    InvalidPattern {
        scope: String,
        key: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("max-displayed in {scope} must be a positive integer or false, got {value}")]
    InvalidMaxDisplayed { scope: String, value: String },

    #[error("cannot parse cutoff-date {value:?} in {scope}")]
    InvalidCutoff { scope: String, value: String },

    #[error("invalid latest-match {value:?} in {scope}: expected false, \"newest\" or matcher rules")]
    InvalidLatestMatch { scope: String, value: String },

    #[error("unknown key(s) in {scope}: {keys}")]
    UnknownKeys { scope: String, keys: String },

    #[error("invalid inherit-parent-matchers {value:?} in {scope}: expected true, false, \"and\" or \"or\"")]
    InvalidInheritMode { scope: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Human readable scope label for a category.
pub fn category_scope(name: &str) -> String {
    format!("category {:?}", name)
}
