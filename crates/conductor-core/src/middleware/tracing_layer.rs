//! Tracing middleware
//!
//! Opens an `http_request` span per request and records the status code and
//! duration once the response is ready.

use super::layer::{BoxedNext, MiddlewareLayer};
use crate::context::RequestId;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use std::time::Instant;
use tracing::{info_span, Instrument, Level};

/// Middleware layer that creates tracing spans for requests
///
/// The span carries the method, path, request id (when a
/// [`RequestIdLayer`](super::RequestIdLayer) runs before it), status code,
/// duration, and any custom fields configured with [`with_field`](Self::with_field).
///
/// ```rust,ignore
/// let mut router = Router::new();
/// router.use_layer(RequestIdLayer::new());
/// router.use_layer(TracingLayer::new().with_field("service", "blog"));
/// ```
#[derive(Clone)]
pub struct TracingLayer {
    level: Level,
    custom_fields: Vec<(String, String)>,
}

impl TracingLayer {
    /// Create a new TracingLayer with default INFO level
    pub fn new() -> Self {
        Self {
            level: Level::INFO,
            custom_fields: Vec::new(),
        }
    }

    /// Create a TracingLayer with a specific level for successful requests
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            custom_fields: Vec::new(),
        }
    }

    /// Add a custom field to every completion event
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.push((key.into(), value.into()));
        self
    }
}

impl Default for TracingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareLayer for TracingLayer {
    fn call(&self, req: Request, next: BoxedNext) -> BoxFuture<Response> {
        let level = self.level;
        let method = req.method().to_string();
        let path = req.path().to_string();
        let fields = render_fields(&self.custom_fields);

        let request_id = req
            .context()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Box::pin(async move {
            let start = Instant::now();

            let span = info_span!(
                "http_request",
                method = %method,
                path = %path,
                request_id = %request_id,
                status = tracing::field::Empty,
                duration_ms = tracing::field::Empty,
                error = tracing::field::Empty,
            );

            let response = next(req).instrument(span.clone()).await;

            let duration_ms = start.elapsed().as_millis() as u64;
            let status = response.status();
            span.record("status", status.as_u16());
            span.record("duration_ms", duration_ms);

            let _enter = span.enter();
            if status.is_client_error() || status.is_server_error() {
                span.record("error", true);
                tracing::warn!(
                    status = status.as_u16(),
                    duration_ms,
                    fields = %fields,
                    "Request failed"
                );
            } else {
                match level {
                    Level::TRACE => {
                        tracing::trace!(status = status.as_u16(), duration_ms, fields = %fields, "Request completed")
                    }
                    Level::DEBUG => {
                        tracing::debug!(status = status.as_u16(), duration_ms, fields = %fields, "Request completed")
                    }
                    Level::INFO => {
                        tracing::info!(status = status.as_u16(), duration_ms, fields = %fields, "Request completed")
                    }
                    Level::WARN => {
                        tracing::warn!(status = status.as_u16(), duration_ms, fields = %fields, "Request completed")
                    }
                    Level::ERROR => {
                        tracing::error!(status = status.as_u16(), duration_ms, fields = %fields, "Request completed")
                    }
                }
            }

            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

// Custom fields are not known when the span is declared, so they travel as
// one `key=value` list on the completion event.
fn render_fields(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}
