//! REST resource scaffolding
//!
//! A [`Resource`] bundles the five CRUD actions of a collection. Registering
//! it under `/photos` maps:
//!
//! | Action    | Method   | Path           |
//! |-----------|----------|----------------|
//! | `index`   | `GET`    | `/photos`      |
//! | `create`  | `POST`   | `/photos`      |
//! | `show`    | `GET`    | `/photos/:id`  |
//! | `update`  | `PUT`    | `/photos/:id`  |
//! | `destroy` | `DELETE` | `/photos/:id`  |
//!
//! The item id is available as `req.route_param("id")`.

use conductor_core::{
    ApiError, BoxFuture, Handler, IntoResponse, Method, Request, Response, RouteError, Router,
    StatusCode,
};
use std::sync::Arc;

/// CRUD actions for a REST collection
///
/// Every action defaults to `405 Method Not Allowed`, so a read-only
/// resource only implements `index` and `show`.
///
/// ```rust,ignore
/// struct Posts { store: Arc<RwLock<Vec<Post>>> }
///
/// impl Resource for Posts {
///     fn index(self: Arc<Self>, _req: Request) -> BoxFuture<Response> {
///         Box::pin(async move { Json(self.store.read().clone()).into_response() })
///     }
/// }
/// ```
pub trait Resource: Send + Sync + 'static {
    /// `GET /collection`
    fn index(self: Arc<Self>, req: Request) -> BoxFuture<Response> {
        not_allowed(req)
    }

    /// `POST /collection`
    fn create(self: Arc<Self>, req: Request) -> BoxFuture<Response> {
        not_allowed(req)
    }

    /// `GET /collection/:id`
    fn show(self: Arc<Self>, req: Request) -> BoxFuture<Response> {
        not_allowed(req)
    }

    /// `PUT /collection/:id`
    fn update(self: Arc<Self>, req: Request) -> BoxFuture<Response> {
        not_allowed(req)
    }

    /// `DELETE /collection/:id`
    fn destroy(self: Arc<Self>, req: Request) -> BoxFuture<Response> {
        not_allowed(req)
    }
}

fn not_allowed(req: Request) -> BoxFuture<Response> {
    let message = format!("{} is not supported on {}", req.method(), req.path());
    Box::pin(async move {
        ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", message).into_response()
    })
}

/// Collection and item patterns for a resource mounted at `path`
fn resource_paths(path: &str) -> (String, String) {
    let collection = match path.trim_end_matches('/') {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    };
    let item = if collection == "/" {
        "/:id".to_string()
    } else {
        format!("{}/:id", collection)
    };
    (collection, item)
}

/// Register the five resource routes on `router`
///
/// Fails like any other registration if one of the routes already exists.
pub fn register_resource<R: Resource>(
    router: &Router,
    path: &str,
    resource: Arc<R>,
) -> Result<(), RouteError> {
    let (collection, item) = resource_paths(path);

    let r = resource.clone();
    router.handle_route_fn(Method::GET, &collection, move |req| r.clone().index(req))?;
    let r = resource.clone();
    router.handle_route_fn(Method::POST, &collection, move |req| r.clone().create(req))?;
    let r = resource.clone();
    router.handle_route_fn(Method::GET, &item, move |req| r.clone().show(req))?;
    let r = resource.clone();
    router.handle_route_fn(Method::PUT, &item, move |req| r.clone().update(req))?;
    let r = resource;
    router.handle_route_fn(Method::DELETE, &item, move |req| r.clone().destroy(req))?;

    tracing::debug!(collection = %collection, item = %item, "registered resource");
    Ok(())
}

/// A handler serving one resource through its own router
///
/// The collection pattern (`/posts`) only matches the collection itself, so
/// mount the handler under both `/posts` and `/posts/`; wrap it in an `Arc`
/// to share it between the two routes.
pub struct ResourceHandler {
    path: String,
    router: Router,
}

impl ResourceHandler {
    /// Build the routes for `resource` under `path`
    pub fn new<R: Resource>(path: &str, resource: R) -> Result<Self, RouteError> {
        let router = Router::new();
        register_resource(&router, path, Arc::new(resource))?;
        Ok(Self {
            path: path.to_string(),
            router,
        })
    }

    /// The path the resource was built for
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The inner router
    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Handler for ResourceHandler {
    fn call(&self, req: Request) -> BoxFuture<Response> {
        self.router.dispatch(req)
    }
}

impl std::fmt::Debug for ResourceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandler")
            .field("path", &self.path)
            .field("routes", &self.router.routes())
            .finish()
    }
}
