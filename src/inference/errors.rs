//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. The fail-soft
//! operations (health check, model listing) still surface these through their
//! `probe_*`/`fetch_*` variants so callers can tell an unreachable server from
//! a malformed reply before collapsing both to `false` / empty.

use thiserror::Error;

/// Errors that can occur while talking to the inference server.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// TCP/HTTP connection to the server failed (refused, DNS, reset).
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed {
        endpoint: String,
        reason: String,
    },

    /// The server did not respond within the request timeout.
    #[error("request timeout after {duration_secs}s")]
    Timeout {
        duration_secs: u64,
    },

    /// Non-2xx HTTP response.
    #[error("HTTP {status}: {body}")]
    HttpError {
        status: u16,
        body: String,
    },

    /// The body was not JSON or lacked the fields the operation reads.
    #[error("unexpected response format: {reason}")]
    ResponseFormat {
        reason: String,
    },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    ConfigError {
        reason: String,
    },
}

impl InferenceError {
    /// Whether the server could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            InferenceError::ConnectionFailed { .. } | InferenceError::Timeout { .. }
        )
    }

    /// Whether the server answered but with a body we could not use.
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, InferenceError::ResponseFormat { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unreachable() {
        let refused = InferenceError::ConnectionFailed {
            endpoint: "http://localhost:8080/health".into(),
            reason: "connection refused".into(),
        };
        assert!(refused.is_unreachable());
        assert!(InferenceError::Timeout { duration_secs: 5 }.is_unreachable());
        assert!(!InferenceError::HttpError {
            status: 503,
            body: String::new()
        }
        .is_unreachable());
    }

    #[test]
    fn test_malformed_is_distinct_from_unreachable() {
        let err = InferenceError::ResponseFormat {
            reason: "missing choices".into(),
        };
        assert!(err.is_malformed_response());
        assert!(!err.is_unreachable());
    }

    #[test]
    fn test_http_error_display_carries_body() {
        let err = InferenceError::HttpError {
            status: 500,
            body: "model crashed".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500: model crashed");
    }

    #[test]
    fn test_display_includes_endpoint() {
        let err = InferenceError::ConnectionFailed {
            endpoint: "http://10.0.0.1:8080/completion".into(),
            reason: "refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "connection failed to http://10.0.0.1:8080/completion: refused"
        );
    }
}
