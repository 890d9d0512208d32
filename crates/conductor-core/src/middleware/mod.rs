//! Middleware infrastructure for Conductor
//!
//! Middleware is added with [`Router::use_layer`](crate::Router::use_layer)
//! or [`App::layer`](crate::App::layer).
//!
//! # Example
//!
//! ```rust,ignore
//! use conductor_core::middleware::{RequestIdLayer, TracingLayer};
//!
//! App::new()
//!     .layer(RequestIdLayer::new())
//!     .layer(TracingLayer::new())
//!     .route_fn("/", |_req| async { "hello" })?
//!     .run("127.0.0.1:8080")
//!     .await
//! ```

mod layer;
mod request_id;
mod tracing_layer;

pub use layer::{from_fn, wrap_fn, BoxedNext, FromFn, LayerStack, MiddlewareLayer, WrapFn};
pub use request_id::{RequestIdLayer, REQUEST_ID_HEADER};
pub use tracing_layer::TracingLayer;
