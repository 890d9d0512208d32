//! Conductor application builder

use crate::error::{ConfigError, RouteError};
use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use crate::middleware::{LayerStack, MiddlewareLayer};
use crate::params::PositionalKeys;
use crate::request::Request;
use crate::response::IntoResponse;
use crate::router::{Router, RouterConfig};
use crate::server::Server;
use http::Method;
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prefix of the environment variables read by [`AppConfig::from_env`]
pub const CONFIG_ENV_PREFIX: &str = "CONDUCTOR_";

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Application settings
///
/// Read from `CONDUCTOR_ADDR` and `CONDUCTOR_POSITIONAL_KEYS`
/// (`dollar` or `numeric`); missing variables keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address [`App::listen`] binds to
    pub addr: String,
    /// Key convention for unnamed capture groups
    pub positional_keys: PositionalKeys,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            positional_keys: PositionalKeys::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from `CONDUCTOR_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(CONFIG_ENV_PREFIX).from_env::<Self>()?)
    }

    /// Load settings from an iterator of `(name, value)` pairs, as if they were the environment
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(CONFIG_ENV_PREFIX).from_iter::<_, Self>(vars)?)
    }

    /// The listen address as a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.addr.parse().map_err(|source| ConfigError::Addr {
            addr: self.addr.clone(),
            source,
        })
    }

    /// The router settings derived from this configuration
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig::new().positional_keys(self.positional_keys)
    }
}

/// Main application builder for Conductor
///
/// An `App` owns a [`Router`] and an app-wide [`LayerStack`]. App layers wrap
/// the whole router, so they also see requests that match no route.
///
/// # Example
///
/// ```rust,ignore
/// use conductor::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     App::new()
///         .layer(RequestIdLayer::new())
///         .route_fn("/", |_req| async { "hello" })?
///         .route_method_fn(Method::GET, "/posts/:id", show_post)?
///         .run("127.0.0.1:8080")
///         .await
/// }
/// ```
pub struct App {
    router: Router,
    layers: LayerStack,
    config: AppConfig,
}

impl App {
    /// Create a new application with default settings
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create an application from `CONDUCTOR_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::with_config(AppConfig::from_env()?))
    }

    /// Create an application with explicit settings
    pub fn with_config(config: AppConfig) -> Self {
        init_tracing();

        Self {
            router: Router::with_config(config.router_config()),
            layers: LayerStack::new(),
            config,
        }
    }

    /// The application settings
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Add an app-wide middleware layer
    ///
    /// App layers are composed around the router when the app is turned
    /// into a handler, in the order they were added.
    pub fn layer<L: MiddlewareLayer>(mut self, layer: L) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Add a layer that wraps only the routes registered after it
    pub fn route_layer<L: MiddlewareLayer>(mut self, layer: L) -> Self {
        self.router.use_layer(layer);
        self
    }

    /// Register a handler for every method
    pub fn route<H: Handler>(self, pattern: &str, handler: H) -> Result<Self, RouteError> {
        self.router.handle(pattern, handler)?;
        Ok(self)
    }

    /// Register an async closure for every method
    pub fn route_fn<F, Fut, Res>(self, pattern: &str, f: F) -> Result<Self, RouteError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Res> + Send + 'static,
        Res: IntoResponse,
    {
        self.router.handle_fn(pattern, f)?;
        Ok(self)
    }

    /// Register a handler for one method
    pub fn route_method<H: Handler>(self, method: Method, pattern: &str, handler: H) -> Result<Self, RouteError> {
        self.router.handle_route(method, pattern, handler)?;
        Ok(self)
    }

    /// Register an async closure for one method
    pub fn route_method_fn<F, Fut, Res>(self, method: Method, pattern: &str, f: F) -> Result<Self, RouteError>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Res> + Send + 'static,
        Res: IntoResponse,
    {
        self.router.handle_route_fn(method, pattern, f)?;
        Ok(self)
    }

    /// Mount another router under `pattern`
    ///
    /// The mounted router sees the full request path and merges its
    /// parameters over the ones captured by `pattern`.
    pub fn mount(self, pattern: &str, router: Router) -> Result<Self, RouteError> {
        self.route(pattern, router)
    }

    /// The application router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Mutable access to the application router
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Get the layer stack (for testing)
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// Compose the app layers around the router
    pub fn into_handler(self) -> BoxedHandler {
        self.layers.compose(into_boxed_handler(self.router))
    }

    /// Run the server on `addr`
    ///
    /// ```rust,ignore
    /// App::new()
    ///     .route_fn("/", |_req| async { "hello" })?
    ///     .run("127.0.0.1:8080")
    ///     .await
    /// ```
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        Server::new(self.into_handler()).run(listener).await
    }

    /// Run the server on the configured address
    pub async fn listen(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        Server::new(self.into_handler()).run(listener).await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the default `tracing` subscriber unless one is already set
///
/// The filter comes from `RUST_LOG`, defaulting to `info,conductor=debug`.
/// [`App::new`] calls this; programs serving a bare [`Router`] call it
/// themselves.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,conductor=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
