//! Handler trait and utilities
//!
//! A [`Handler`] turns a [`Request`] into a [`Response`]. Async closures are
//! adapted with [`handler_fn`]; a [`Router`](crate::Router) is itself a
//! handler, which is how routers nest.

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed, sendable future
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A terminal request handler shared between requests
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture<Response> + Send + Sync>;

/// Trait representing an async request handler
pub trait Handler: Send + Sync + 'static {
    /// Handle the request
    fn call(&self, req: Request) -> BoxFuture<Response>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        (**self).call(req)
    }
}

/// Adapter that lets an async closure act as a [`Handler`]
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`Handler`]
///
/// ```rust,ignore
/// let hello = handler_fn(|req: Request| async move {
///     format!("hello {}", req.route_param("name").unwrap_or("world"))
/// });
/// ```
pub fn handler_fn<F, Fut, Res>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse,
{
    HandlerFn { f }
}

impl<F, Fut, Res> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture<Response> {
        let fut = (self.f)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Erase a handler into the shared closure form used by the middleware chain
pub fn into_boxed_handler<H: Handler>(handler: H) -> BoxedHandler {
    let handler = Arc::new(handler);
    Arc::new(move |req: Request| handler.call(req))
}
