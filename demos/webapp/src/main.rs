//! Web application example for Conductor
//!
//! This example demonstrates:
//! - App-wide middleware (request id, request log, a custom layer)
//! - Plain routes
//! - A regex router mounted under a prefix
//! - A JSON REST resource
//!
//! Run with: cargo run -p webapp
//! Then test:
//!   curl http://127.0.0.1:8080/hello
//!   curl http://127.0.0.1:8080/list/5
//!   curl -d '{"title":"First"}' http://127.0.0.1:8080/posts

use conductor::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ============================================
// Handlers
// ============================================

async fn hello(req: Request) -> String {
    info!("Running hello handler");
    format!("Hello, {:?}", req.path())
}

async fn goodbye(req: Request) -> String {
    info!("Running goodbye handler");
    format!("Goodbye, {:?}", req.path())
}

async fn list(req: Request) -> Response {
    info!("Running list handler");
    let count = match req.route_param("$1").map(str::parse::<usize>) {
        Some(Ok(count)) => count,
        _ => return ApiError::bad_request("count must be a number").into_response(),
    };

    (0..count)
        .map(|i| format!("{}\n", i))
        .collect::<String>()
        .into_response()
}

// ============================================
// Posts resource
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Post {
    title: String,
}

#[derive(Default)]
struct Posts {
    store: Mutex<BTreeMap<u64, Post>>,
}

impl Resource for Posts {
    fn index(self: Arc<Self>, _req: Request) -> BoxFuture<Response> {
        Box::pin(async move {
            let posts = match self.store.lock() {
                Ok(store) => store.clone(),
                Err(_) => return ApiError::internal("store poisoned").into_response(),
            };
            Json(posts).into_response()
        })
    }

    fn create(self: Arc<Self>, mut req: Request) -> BoxFuture<Response> {
        Box::pin(async move {
            let post: Post = match read_json(&mut req) {
                Ok(post) => post,
                Err(err) => return err.into_response(),
            };
            let mut store = match self.store.lock() {
                Ok(store) => store,
                Err(_) => return ApiError::internal("store poisoned").into_response(),
            };
            let id = store.keys().next_back().map_or(1, |last| last + 1);
            store.insert(id, post);
            Created(json!({ "id": id })).into_response()
        })
    }

    fn show(self: Arc<Self>, req: Request) -> BoxFuture<Response> {
        let id = req.route_param("id").and_then(|id| id.parse::<u64>().ok());
        Box::pin(async move {
            let post = id.and_then(|id| self.store.lock().ok()?.get(&id).cloned());
            match post {
                Some(post) => Json(post).into_response(),
                None => ApiError::not_found("no such post").into_response(),
            }
        })
    }
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let announce = from_fn(|req: Request, next: BoxedNext| async move {
        info!("middleware before");
        let response = next(req).await;
        info!("middleware after");
        response
    });

    let lists = Router::new();
    lists.handle_route_fn(Method::GET, "/list/([0-9]+)$", list)?;

    let app = App::from_env()?
        .layer(RequestIdLayer::new())
        .layer(RequestLogLayer::tracing(Level::INFO))
        .layer(announce)
        .route_fn("/hello", hello)?
        .route_fn("/goodbye", goodbye)?
        .mount("/list/", lists)?;
    register_resource(app.router(), "/posts", Arc::new(Posts::default()))?;

    info!("Starting server on {}...", app.config().addr);
    app.listen().await
}
