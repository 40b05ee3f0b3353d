//! HTTP client module with retry logic and error handling.

mod client;
mod retry;

pub use client::{HttpClient, Page};
pub use retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, classify_status};
