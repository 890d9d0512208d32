//! # Conductor
//!
//! A regex-pattern HTTP router with composable middleware.
//!
//! Routes are registered as patterns: plain paths (`/posts`), paths with named
//! segments (`/posts/:id`), or raw regular expressions, optionally qualified
//! by host (`example.com/posts/([0-9]+)$`). The longest matching pattern wins,
//! and host-qualified patterns are preferred over path-only ones.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conductor::prelude::*;
//!
//! async fn show(req: Request) -> String {
//!     format!("post {}", req.route_param("id").unwrap_or_default())
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     App::new()
//!         .layer(RequestIdLayer::new())
//!         .layer(RequestLogLayer::tracing(Level::INFO))
//!         .route_fn("/", |_req| async { "hello" })?
//!         .route_method_fn(Method::GET, "/posts/:id", show)?
//!         .run("127.0.0.1:8080")
//!         .await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `extras` (default) - request logging, JSON helpers and REST resources
//! - `test-utils` - `TestClient` for driving an app without a socket

// Re-export core functionality
pub use conductor_core::*;

// Re-export extras (feature-gated)
#[cfg(feature = "extras")]
pub use conductor_extras::{json, request_log, resource};
#[cfg(feature = "extras")]
pub use conductor_extras::{
    read_json, register_resource, write_json, Created, Json, LogSink, RequestLogConfig,
    RequestLogLayer, Resource, ResourceHandler, TracingSink,
};

/// Prelude module - import everything you need with `use conductor::prelude::*`
pub mod prelude {
    // Core types
    pub use conductor_core::{
        // Middleware
        from_fn,
        init_tracing,
        // Server
        serve,
        wrap_fn,
        // Error handling
        ApiError,
        // App builder
        App,
        AppConfig,
        BoxFuture,
        BoxedNext,
        Html,
        // Response types
        IntoResponse,
        Method,
        MiddlewareLayer,
        NoContent,
        PositionalKeys,
        // Request context
        Request,
        RequestId,
        RequestIdLayer,
        Response,
        Result,
        RouteError,
        RouteParams,
        // Router
        Router,
        RouterConfig,
        StatusCode,
        TracingLayer,
    };

    // Extras (feature-gated)
    #[cfg(feature = "extras")]
    pub use conductor_extras::{
        read_json, register_resource, write_json, Created, Json, RequestLogLayer, Resource,
        ResourceHandler,
    };

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;
    pub use tracing::{debug, error, info, trace, warn, Level};
}
