//! Pattern router
//!
//! Routes are registered with a pattern (see [`Pattern`] for the pattern
//! language) and a handler, either for one HTTP method or for any method.
//!
//! # Matching
//!
//! For a request with method `M`, host `H` and path `P` the candidates are
//! the routes registered for `M` followed by the routes registered for any
//! method.
//!
//! 1. If a candidate set holds a host-qualified pattern, `H + P` is matched
//!    against the host-qualified candidates, with `H` lowercased. The longest
//!    matching pattern wins and path-only routes are not consulted.
//! 2. Otherwise `P` is matched against the path-only candidates and the
//!    longest matching pattern wins.
//!
//! "Longest" is the length of the pattern as registered. Between two
//! matching patterns of equal length the one visited first wins: routes are
//! visited in registration order, method routes before any-method routes.
//!
//! When nothing matches the router answers `404 Not Found`.
//!
//! # Example
//!
//! ```rust,ignore
//! use conductor_core::{Router, Method};
//!
//! let mut router = Router::new();
//! router.use_layer(RequestIdLayer::new());
//! router.handle_fn("/posts", |_req| async { "all posts" })?;
//! router.handle_route_fn(Method::GET, "/posts/:id", |req| async move {
//!     format!("post {}", req.route_param("id").unwrap_or_default())
//! })?;
//! ```
//!
//! # Middleware
//!
//! A route is composed with the layers added to the router so far when it is
//! registered. Layers added afterwards do not wrap routes that already exist.

use crate::context::RequestId;
use crate::error::{ApiError, RouteError};
use crate::handler::{handler_fn, into_boxed_handler, BoxFuture, BoxedHandler, Handler};
use crate::middleware::{LayerStack, MiddlewareLayer};
use crate::params::{PositionalKeys, RouteParams};
use crate::pattern::Pattern;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use http::Method;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;

/// Router configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterConfig {
    /// Key convention for unnamed capture groups
    pub positional_keys: PositionalKeys,
}

impl RouterConfig {
    /// Default configuration: `$N` positional keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key convention for unnamed capture groups
    pub fn positional_keys(mut self, keys: PositionalKeys) -> Self {
        self.positional_keys = keys;
        self
    }
}

/// A compiled pattern bound to a handler
struct Route {
    pattern: Pattern,
    handler: BoxedHandler,
}

/// Routes registered for one method filter, in registration order
#[derive(Default)]
struct RouteSet {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
    has_host: bool,
}

impl RouteSet {
    fn insert(&mut self, method: Option<&Method>, route: Route) -> Result<(), RouteError> {
        let key = route.pattern.as_str();
        if self.index.contains_key(key) {
            return Err(RouteError::Duplicate {
                method: method.cloned(),
                pattern: key.to_string(),
            });
        }

        self.index.insert(key.to_string(), self.routes.len());
        self.has_host |= route.pattern.is_host_qualified();
        self.routes.push(route);
        Ok(())
    }

    fn get(&self, pattern: &str) -> Option<&Route> {
        self.index.get(pattern).map(|&position| &self.routes[position])
    }
}

/// Method-keyed route storage
#[derive(Default)]
struct RouteTable {
    methods: HashMap<Method, RouteSet>,
    any: RouteSet,
}

impl RouteTable {
    fn insert(&mut self, method: Option<Method>, route: Route) -> Result<(), RouteError> {
        match method {
            Some(method) => {
                let set = self.methods.entry(method.clone()).or_default();
                set.insert(Some(&method), route)
            }
            None => self.any.insert(None, route),
        }
    }

    fn find(&self, method: &Method, host: &str, path: &str, keys: PositionalKeys) -> Option<RouteMatch> {
        let sets: Vec<&RouteSet> = self
            .methods
            .get(method)
            .into_iter()
            .chain(std::iter::once(&self.any))
            .collect();

        if sets.iter().any(|set| set.has_host) {
            let target = format!("{}{}", host.to_ascii_lowercase(), path);
            let host_routes = sets
                .iter()
                .flat_map(|set| set.routes.iter())
                .filter(|route| route.pattern.is_host_qualified());
            if let Some(found) = longest_match(host_routes, &target, keys) {
                tracing::trace!(pattern = %found.pattern, target = %target, "host route matched");
                return Some(found);
            }
        }

        let path_routes = sets
            .iter()
            .flat_map(|set| set.routes.iter())
            .filter(|route| !route.pattern.is_host_qualified());
        let found = longest_match(path_routes, path, keys);
        if let Some(ref found) = found {
            tracing::trace!(pattern = %found.pattern, path = %path, "path route matched");
        }
        found
    }
}

/// Pick the longest matching pattern; the first one visited wins a tie
fn longest_match<'a>(
    routes: impl Iterator<Item = &'a Route>,
    target: &str,
    keys: PositionalKeys,
) -> Option<RouteMatch> {
    let mut best: Option<&Route> = None;
    for route in routes {
        if !route.pattern.is_match(target) {
            continue;
        }
        match best {
            Some(current) if current.pattern.precedence() >= route.pattern.precedence() => {}
            _ => best = Some(route),
        }
    }

    let route = best?;
    let captures = route.pattern.captures(target)?;
    Some(RouteMatch {
        pattern: route.pattern.as_str().to_string(),
        params: RouteParams::from_captures(&route.pattern, &captures, keys),
        handler: route.handler.clone(),
    })
}

/// The route selected for a request
pub struct RouteMatch {
    pattern: String,
    params: RouteParams,
    handler: BoxedHandler,
}

impl RouteMatch {
    /// The winning pattern as registered
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parameters captured by the winning pattern
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// Give up the parameters
    pub fn into_params(self) -> RouteParams {
        self.params
    }
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish()
    }
}

/// Main router
pub struct Router {
    table: RwLock<RouteTable>,
    layers: LayerStack,
    config: RouterConfig,
}

impl Router {
    /// Create a new router
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Create a router with explicit configuration
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            table: RwLock::new(RouteTable::default()),
            layers: LayerStack::new(),
            config,
        }
    }

    /// The router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register `handler` for `pattern` under every method
    ///
    /// # Errors
    ///
    /// See [`handle_route`](Self::handle_route).
    pub fn handle<H: Handler>(&self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register(None, pattern, handler)
    }

    /// Register an async closure for `pattern` under every method
    pub fn handle_fn<F, Fut, Res>(&self, pattern: &str, f: F) -> Result<(), RouteError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Res> + Send + 'static,
        Res: IntoResponse,
    {
        self.handle(pattern, handler_fn(f))
    }

    /// Register `handler` for `pattern` under one method
    ///
    /// # Errors
    ///
    /// - [`RouteError::EmptyPattern`] if `pattern` is empty
    /// - [`RouteError::InvalidPattern`] if it does not compile
    /// - [`RouteError::Duplicate`] if it is already registered for `method`
    pub fn handle_route<H: Handler>(&self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.register(Some(method), pattern, handler)
    }

    /// Register an async closure for `pattern` under one method
    pub fn handle_route_fn<F, Fut, Res>(&self, method: Method, pattern: &str, f: F) -> Result<(), RouteError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Res> + Send + 'static,
        Res: IntoResponse,
    {
        self.handle_route(method, pattern, handler_fn(f))
    }

    /// Append a middleware layer
    ///
    /// The layer wraps every route registered after this call.
    pub fn use_layer<L: MiddlewareLayer>(&mut self, layer: L) -> &mut Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Append several middleware layers, outermost first
    pub fn use_layers<I>(&mut self, layers: I) -> &mut Self
    where
        I: IntoIterator<Item = Box<dyn MiddlewareLayer>>,
    {
        for layer in layers {
            self.layers.push(layer);
        }
        self
    }

    /// Builder form of [`use_layer`](Self::use_layer)
    pub fn layer<L: MiddlewareLayer>(mut self, layer: L) -> Self {
        self.use_layer(layer);
        self
    }

    /// The middleware layers added so far
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    fn register<H: Handler>(&self, method: Option<Method>, pattern: &str, handler: H) -> Result<(), RouteError> {
        let compiled = Pattern::compile(pattern)?;
        let handler = self.layers.compose(into_boxed_handler(handler));
        let route = Route {
            pattern: compiled,
            handler,
        };

        self.table.write().insert(method.clone(), route)?;

        tracing::debug!(
            method = %method.as_ref().map(Method::as_str).unwrap_or("*"),
            pattern = %pattern,
            layers = self.layers.len(),
            "route registered"
        );
        Ok(())
    }

    /// Select the route for a method, host and path
    pub fn lookup(&self, method: &Method, host: &str, path: &str) -> Option<RouteMatch> {
        self.table
            .read()
            .find(method, host, path, self.config.positional_keys)
    }

    /// Whether `pattern` is registered for `method` (`None` for any method)
    pub fn contains(&self, method: Option<&Method>, pattern: &str) -> bool {
        let table = self.table.read();
        match method {
            Some(method) => table
                .methods
                .get(method)
                .map_or(false, |set| set.get(pattern).is_some()),
            None => table.any.get(pattern).is_some(),
        }
    }

    /// Registered routes as `(method, pattern)`, method routes first
    pub fn routes(&self) -> Vec<(Option<Method>, String)> {
        let table = self.table.read();
        let mut methods: Vec<&Method> = table.methods.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let mut routes = Vec::new();
        for method in methods {
            for route in &table.methods[method].routes {
                routes.push((Some(method.clone()), route.pattern.as_str().to_string()));
            }
        }
        for route in &table.any.routes {
            routes.push((None, route.pattern.as_str().to_string()));
        }
        routes
    }

    /// Route a request to its handler
    ///
    /// The route table lock is released before the returned future runs.
    pub fn dispatch(&self, mut req: Request) -> BoxFuture<Response> {
        let found = self.lookup(req.method(), req.host(), req.path());

        match found {
            Some(found) => {
                let handler = found.handler;
                req.context_mut().set_route_params(found.params);
                handler(req)
            }
            None => {
                tracing::trace!(method = %req.method(), path = %req.path(), "no route matched");
                let mut err = ApiError::not_found(format!(
                    "No route found for {} {}",
                    req.method(),
                    req.path()
                ));
                if let Some(id) = RequestId::from_request(&req) {
                    err = err.with_request_id(id.as_str());
                }
                Box::pin(async move { err.into_response() })
            }
        }
    }
}

impl Handler for Router {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        self.dispatch(req)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes())
            .field("layers", &self.layers)
            .field("config", &self.config)
            .finish()
    }
}
