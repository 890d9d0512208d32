//! Error types for Conductor
//!
//! Three families live here:
//!
//! - [`RouteError`] and [`ContextError`] are configuration errors. They are
//!   returned while routes are being registered or context values written and
//!   are meant to abort startup.
//! - [`ConfigError`] is returned when application settings cannot be read.
//! - [`ApiError`] is an HTTP-facing error that renders as a JSON response.

use http::{Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Result type alias for Conductor operations
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Environment variable that selects the [`Environment`]
pub const ENV_VAR: &str = "CONDUCTOR_ENV";

/// Deployment environment, used to decide how much error detail leaves the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Full error messages in responses
    Development,
    /// Server error messages are replaced with a generic message
    Production,
}

impl Environment {
    /// Read the environment from `CONDUCTOR_ENV` (`production`/`prod`, anything else is development)
    pub fn from_env() -> Self {
        match std::env::var(ENV_VAR) {
            Ok(value) if matches!(value.to_ascii_lowercase().as_str(), "production" | "prod") => {
                Environment::Production
            }
            _ => Environment::Development,
        }
    }

    /// Whether this is the production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// Get the process environment, read once from `CONDUCTOR_ENV`
pub fn get_environment() -> Environment {
    *ENVIRONMENT.get_or_init(Environment::from_env)
}

/// Error raised while building a route table.
///
/// Registration errors are configuration mistakes. Route tables are expected
/// to be complete before serving starts, so callers should treat any of these
/// as fatal.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The pattern string was empty
    #[error("route pattern must not be empty")]
    EmptyPattern,

    /// The pattern did not compile to a valid regular expression
    #[error("invalid route pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The pattern as registered
        pattern: String,
        /// The regex compiler error
        #[source]
        source: regex::Error,
    },

    /// The pattern is already registered for the same method
    #[error("duplicate route pattern {pattern:?} for {}", method_label(.method))]
    Duplicate {
        /// Method the route was registered for, `None` for any method
        method: Option<Method>,
        /// The pattern as registered
        pattern: String,
    },
}

fn method_label(method: &Option<Method>) -> String {
    match method {
        Some(method) => method.to_string(),
        None => "any method".to_string(),
    }
}

/// Error raised when writing to a [`RequestContext`](crate::RequestContext)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// A value of this type was already stored for the request
    #[error("request context already holds a value of type {type_name}")]
    AlreadySet {
        /// Rust type name of the rejected value
        type_name: &'static str,
    },
}

/// Error raised while loading [`AppConfig`](crate::AppConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A `CONDUCTOR_*` variable could not be parsed
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),

    /// The listen address is not a socket address
    #[error("invalid listen address {addr:?}: {source}")]
    Addr {
        /// The address as configured
        addr: String,
        /// The parse failure
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Standard API error type
///
/// Provides structured error responses following a consistent JSON format.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error type identifier
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Internal details (logged, never sent)
    pub(crate) internal: Option<String>,
    /// Request identifier echoed in the body
    pub(crate) request_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error_type: error_type.into(),
            message: message.into(),
            internal: None,
            request_id: None,
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Add internal details (for logging, never part of the response)
    pub fn with_internal(mut self, details: impl Into<String>) -> Self {
        self.internal = Some(details.into());
        self
    }

    /// Attach the request identifier so clients can quote it
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Internal details, if any
    pub fn internal_details(&self) -> Option<&str> {
        self.internal.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApiError {}

/// JSON representation of API error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl ErrorResponse {
    /// Build the response body, masking server error messages in production
    pub(crate) fn from_error(err: ApiError, environment: Environment) -> Self {
        if let Some(ref internal) = err.internal {
            tracing::error!(
                error_type = %err.error_type,
                status = %err.status.as_u16(),
                internal = %internal,
                "{}",
                err.message
            );
        }

        let message = if environment.is_production() && err.status.is_server_error() {
            "An internal error occurred".to_string()
        } else {
            err.message
        };

        Self {
            error: ErrorBody {
                error_type: err.error_type,
                message,
            },
            request_id: err.request_id,
        }
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self::from_error(err, get_environment())
    }
}

// Conversion from common error types
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal("I/O error").with_internal(err.to_string())
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        ApiError::internal("HTTP error").with_internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_messages() {
        let err = RouteError::Duplicate {
            method: Some(Method::GET),
            pattern: "/posts".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate route pattern \"/posts\" for GET");

        let err = RouteError::Duplicate {
            method: None,
            pattern: "/posts".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate route pattern \"/posts\" for any method"
        );

        assert_eq!(
            RouteError::EmptyPattern.to_string(),
            "route pattern must not be empty"
        );
    }

    #[test]
    fn test_invalid_pattern_keeps_source() {
        let source = regex::Regex::new("([0-9]+").unwrap_err();
        let err = RouteError::InvalidPattern {
            pattern: "/posts/([0-9]+".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("invalid route pattern \"/posts/([0-9]+\""));
    }

    #[test]
    fn test_production_masks_server_errors() {
        let err = ApiError::internal("database exploded").with_internal("connection reset");
        let body = ErrorResponse::from_error(err, Environment::Production);
        assert_eq!(body.error.message, "An internal error occurred");
        assert_eq!(body.error.error_type, "internal_error");

        let err = ApiError::not_found("No such post");
        let body = ErrorResponse::from_error(err, Environment::Production);
        assert_eq!(body.error.message, "No such post");
    }

    #[test]
    fn test_development_keeps_messages() {
        let err = ApiError::internal("database exploded");
        let body = ErrorResponse::from_error(err, Environment::Development);
        assert_eq!(body.error.message, "database exploded");
        assert!(body.request_id.is_none());
    }

    #[test]
    fn test_request_id_is_serialized() {
        let err = ApiError::not_found("gone").with_request_id("abc-123");
        let body = ErrorResponse::from_error(err, Environment::Development);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["request_id"], "abc-123");
        assert_eq!(json["error"]["type"], "not_found");
    }

    #[test]
    fn test_context_error_display() {
        let err = ContextError::AlreadySet { type_name: "RequestId" };
        assert_eq!(
            err.to_string(),
            "request context already holds a value of type RequestId"
        );
    }
}
