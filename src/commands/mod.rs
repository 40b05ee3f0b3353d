//! Command implementations behind the CLI.
//!
//! Each command has a thin entry point taking the real runtime and a `run`
//! function taking a [`Config`] so tests can inject mocks.

mod build;
mod check;
pub mod config;
mod fetch;

pub use build::{BuildOptions, build};
pub use check::{check, outline};
pub use fetch::fetch;

pub use config::Config;
