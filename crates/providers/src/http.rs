//! Shared HTTP plumbing: client construction, URL building, and status mapping.

use std::time::Duration;

use vaxchecker_core::error::InvocationError;

/// Build a reqwest client with the given request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, InvocationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| InvocationError::NotConfigured(format!("Failed to create HTTP client: {e}")))
}

/// Append path segments to a base URL, percent-encoding each segment.
pub(crate) fn join_segments(base: &str, segments: &[&str]) -> Result<reqwest::Url, InvocationError> {
    let mut url = reqwest::Url::parse(base)
        .map_err(|e| InvocationError::NotConfigured(format!("Invalid endpoint '{base}': {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| InvocationError::NotConfigured(format!("Endpoint '{base}' cannot be a base URL")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Map a transport-level failure.
pub(crate) fn transport_error(err: reqwest::Error) -> InvocationError {
    if err.is_timeout() {
        InvocationError::Timeout(err.to_string())
    } else {
        InvocationError::Network(err.to_string())
    }
}

/// Map a non-success HTTP status to an invocation error.
pub(crate) fn status_error(service: &str, status: u16, body: String) -> InvocationError {
    match status {
        429 => InvocationError::RateLimited { retry_after_secs: 5 },
        401 | 403 => InvocationError::AuthenticationFailed(format!("{service} rejected credentials")),
        408 | 504 => InvocationError::Timeout(format!("{service} returned {status}")),
        _ => InvocationError::ApiError {
            status_code: status,
            message: body,
        },
    }
}
