//! Request start/completion logging middleware
//!
//! Each request produces two lines:
//!
//! ```text
//! [4f1c...] Started GET /posts/23 for 10.0.0.7
//! [4f1c...] Completed 200 OK in 1.204ms
//! ```
//!
//! The `[id] ` prefix appears when a request id is known, either from the
//! request context or the `X-Request-ID` header. The remote address comes
//! from `X-Forwarded-For`, falling back to the peer address recorded by the
//! server.
//!
//! Where the lines go is chosen by the caller through a [`LogSink`]; there is
//! no shared default logger.
//!
//! # Example
//!
//! ```rust,ignore
//! use conductor_core::App;
//! use conductor_extras::{RequestLogLayer, TracingSink};
//! use tracing::Level;
//!
//! let app = App::new()
//!     .layer(RequestLogLayer::new(TracingSink::new(Level::INFO)))
//!     .route_fn("/", |_req| async { "hello" })?;
//! ```

use conductor_core::{
    middleware::{BoxedNext, MiddlewareLayer},
    BoxFuture, ClientAddr, Request, RequestId, Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REQUEST_ID: &str = "x-request-id";

/// Destination for request log lines
pub trait LogSink: Send + Sync + 'static {
    /// Write one formatted line
    fn write_line(&self, line: &str);
}

/// Sink that emits each line as a `tracing` event at a fixed level
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    level: Level,
}

impl TracingSink {
    /// Emit lines at `level`
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl LogSink for TracingSink {
    fn write_line(&self, line: &str) {
        match self.level {
            Level::TRACE => tracing::trace!(target: "conductor::request", "{}", line),
            Level::DEBUG => tracing::debug!(target: "conductor::request", "{}", line),
            Level::INFO => tracing::info!(target: "conductor::request", "{}", line),
            Level::WARN => tracing::warn!(target: "conductor::request", "{}", line),
            _ => tracing::error!(target: "conductor::request", "{}", line),
        }
    }
}

/// Request logging configuration
#[derive(Clone, Debug, Default)]
pub struct RequestLogConfig {
    /// Path prefixes that are not logged
    pub skip_paths: Vec<String>,
}

/// Middleware layer logging the start and completion of each request
#[derive(Clone)]
pub struct RequestLogLayer {
    sink: Arc<dyn LogSink>,
    config: RequestLogConfig,
}

impl RequestLogLayer {
    /// Log to `sink`
    pub fn new<S: LogSink>(sink: S) -> Self {
        Self::with_config(sink, RequestLogConfig::default())
    }

    /// Log to `sink` with custom configuration
    pub fn with_config<S: LogSink>(sink: S, config: RequestLogConfig) -> Self {
        Self {
            sink: Arc::new(sink),
            config,
        }
    }

    /// Log as `tracing` events at `level`
    pub fn tracing(level: Level) -> Self {
        Self::new(TracingSink::new(level))
    }

    /// Add a path prefix to skip
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.config.skip_paths.push(path.into());
        self
    }
}

impl MiddlewareLayer for RequestLogLayer {
    fn call(&self, req: Request, next: BoxedNext) -> BoxFuture<Response> {
        if self
            .config
            .skip_paths
            .iter()
            .any(|prefix| req.path().starts_with(prefix.as_str()))
        {
            return next(req);
        }

        let sink = self.sink.clone();
        let prefix = request_id_prefix(&req);
        let started = format!(
            "{}Started {} {} for {}",
            prefix,
            req.method(),
            req.path(),
            remote_addr(&req)
        );

        Box::pin(async move {
            let start = Instant::now();
            sink.write_line(&started);

            let response = next(req).await;

            let status = response.status();
            sink.write_line(&format!(
                "{}Completed {} {} in {:?}",
                prefix,
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                start.elapsed()
            ));
            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

fn request_id_prefix(req: &Request) -> String {
    let id = RequestId::from_request(req)
        .map(|id| id.to_string())
        .or_else(|| {
            req.headers()
                .get(REQUEST_ID)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        });

    match id {
        Some(id) => format!("[{}] ", id),
        None => String::new(),
    }
}

fn remote_addr(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        return forwarded.to_string();
    }

    req.context()
        .get::<ClientAddr>()
        .map(|addr| addr.0.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
