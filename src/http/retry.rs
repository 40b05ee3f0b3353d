//! Retry policy for API requests and classification of HTTP failures.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts per request.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// Failures that will not go away by asking again.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("Rate limit exceeded: {0}. Try again later or set the GITHUB_TOKEN environment variable.")]
    RateLimitExceeded(String),

    #[error("Authentication failed: {0}. Check your GITHUB_TOKEN.")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access forbidden: {0}. You may need authentication.")]
    Forbidden(String),

    #[error("Request error: {0}")]
    ClientError(String),
}

/// Map an HTTP status to a non-retryable error, or `None` for statuses worth
/// retrying (5xx). `detail` is the response text, used to tell GitHub's
/// rate-limit 403 apart from a plain 403.
pub fn classify_status(status: StatusCode, detail: &str) -> Option<NonRetryableError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(NonRetryableError::AuthenticationFailed(
            "Invalid or missing authentication token".to_string(),
        )),
        StatusCode::FORBIDDEN if detail.to_lowercase().contains("rate limit") => Some(
            NonRetryableError::RateLimitExceeded("GitHub API rate limit exceeded".to_string()),
        ),
        StatusCode::FORBIDDEN => Some(NonRetryableError::Forbidden(
            "Access to this resource is forbidden".to_string(),
        )),
        StatusCode::TOO_MANY_REQUESTS => Some(NonRetryableError::RateLimitExceeded(
            "Too many requests".to_string(),
        )),
        StatusCode::NOT_FOUND => Some(NonRetryableError::NotFound(
            "The requested resource was not found".to_string(),
        )),
        s if s.is_client_error() => Some(NonRetryableError::ClientError(format!(
            "HTTP {} error",
            s.as_u16()
        ))),
        _ => None,
    }
}

/// Whether an error from a request attempt should be retried.
///
/// Connection problems, timeouts and server errors are retried; anything
/// classified as [`NonRetryableError`] is not.
pub fn is_retryable(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_retryable_error_display() {
        let err = NonRetryableError::RateLimitExceeded("test".to_string());
        assert!(err.to_string().contains("Rate limit"));
        assert!(err.to_string().contains("GITHUB_TOKEN"));

        let err = NonRetryableError::AuthenticationFailed("test".to_string());
        assert!(err.to_string().contains("Authentication"));

        let err = NonRetryableError::ClientError("HTTP 400".to_string());
        assert!(err.to_string().contains("HTTP 400"));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            Some(NonRetryableError::AuthenticationFailed(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, ""),
            Some(NonRetryableError::Forbidden(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, "API rate limit exceeded for 1.2.3.4"),
            Some(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            Some(NonRetryableError::RateLimitExceeded(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, ""),
            Some(NonRetryableError::NotFound(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, ""),
            Some(NonRetryableError::ClientError(_))
        ));
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(classify_status(StatusCode::INTERNAL_SERVER_ERROR, "").is_none());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_none());
    }

    #[test]
    fn test_is_retryable() {
        let err = anyhow::Error::from(NonRetryableError::NotFound("test".to_string()));
        assert!(!is_retryable(&err));

        let err = anyhow::anyhow!("connection reset by peer");
        assert!(is_retryable(&err));
    }
}
