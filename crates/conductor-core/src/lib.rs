//! # Conductor Core
//!
//! Core library providing the foundational types for Conductor: the route
//! pattern compiler, the precedence router, the middleware composer, and the
//! request context that carries route parameters and request ids.
//!
//! This crate is not meant to be used directly. Use `conductor` instead.

mod app;
pub mod context;
mod error;
mod handler;
pub mod middleware;
mod params;
mod pattern;
mod request;
mod response;
mod router;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

// Public API
pub use app::{init_tracing, App, AppConfig, CONFIG_ENV_PREFIX, DEFAULT_ADDR};
pub use context::{ClientAddr, RequestContext, RequestId};
pub use error::{
    get_environment, ApiError, ConfigError, ContextError, Environment, Result, RouteError,
};
pub use handler::{handler_fn, into_boxed_handler, BoxFuture, BoxedHandler, Handler, HandlerFn};
pub use http::{HeaderMap, Method, StatusCode};
pub use middleware::{
    from_fn, wrap_fn, BoxedNext, LayerStack, MiddlewareLayer, RequestIdLayer, TracingLayer,
};
pub use params::{PositionalKeys, RouteParams};
pub use pattern::Pattern;
pub use request::Request;
pub use response::{Html, IntoResponse, NoContent, Response};
pub use router::{RouteMatch, Router, RouterConfig};
pub use server::serve;
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
