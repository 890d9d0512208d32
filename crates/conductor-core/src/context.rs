//! Request-scoped context
//!
//! Every [`Request`](crate::Request) carries a [`RequestContext`]: a typed
//! key/value store that travels with the request through each middleware
//! layer and into the handler. Keys are Rust types, so two components can
//! never collide on a string key.
//!
//! Values are write-once. Inserting a second value of a type that is already
//! present fails with [`ContextError::AlreadySet`]. The one exception is
//! [`RouteParams`], which the router owns: each routing level (a router
//! mounted inside another router) replaces it with the merged parameter set.

use crate::error::ContextError;
use crate::params::RouteParams;
use http::Extensions;
use std::fmt;
use std::net::SocketAddr;

/// Typed, write-once store attached to a single request
#[derive(Clone, Default)]
pub struct RequestContext {
    values: Extensions,
}

impl RequestContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self {
            values: Extensions::new(),
        }
    }

    /// Get the value stored for type `T`
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Whether a value of type `T` is stored
    pub fn contains<T: Clone + Send + Sync + 'static>(&self) -> bool {
        self.values.get::<T>().is_some()
    }

    /// Store a value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::AlreadySet`] if the context already holds a `T`;
    /// the stored value is left untouched.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Result<(), ContextError> {
        if self.contains::<T>() {
            return Err(ContextError::AlreadySet {
                type_name: std::any::type_name::<T>(),
            });
        }
        self.values.insert(value);
        Ok(())
    }

    /// Parameters of the matched route
    pub fn route_params(&self) -> Option<&RouteParams> {
        self.values.get::<RouteParams>()
    }

    /// Record the parameters of a match, overlaying any set recorded by an
    /// outer router.
    pub(crate) fn set_route_params(&mut self, params: RouteParams) {
        let merged = match self.values.remove::<RouteParams>() {
            Some(outer) => outer.merged_with(params),
            None => params,
        };
        self.values.insert(merged);
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("route_params", &self.route_params())
            .field("request_id", &self.get::<RequestId>())
            .finish()
    }
}

/// Unique identifier of a request, set by
/// [`RequestIdLayer`](crate::middleware::RequestIdLayer)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the identifier stored in a request's context
    pub fn from_request(req: &crate::Request) -> Option<&RequestId> {
        req.context().get::<RequestId>()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Socket address of the connected peer, recorded by the server loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);
