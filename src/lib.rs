pub mod cache;
pub mod classify;
pub mod commands;
pub mod config;
pub mod http;
pub mod provider;
pub mod release;
pub mod runtime;
pub mod site;
