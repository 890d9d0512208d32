//! Regex routing example for Conductor
//!
//! Every request goes to a nested router that only knows regex patterns;
//! unnamed groups show up as `$1`, `$2`, ...
//!
//! Run with: cargo run -p regexp
//! Then test: curl http://127.0.0.1:8080/list/3

use conductor::prelude::*;

async fn list(req: Request) -> Response {
    info!("Running list handler");
    if let Some(params) = req.route_params() {
        info!(?params, "matches");
    }

    match req.route_param("$1").map(str::parse::<usize>) {
        Some(Ok(count)) => (0..count)
            .map(|i| format!("{}\n", i))
            .collect::<String>()
            .into_response(),
        _ => ApiError::bad_request("count must be a number").into_response(),
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing();

    let patterns = Router::new();
    patterns.handle_fn("/list/([0-9]+)$", list)?;

    let mut router = Router::new();
    router
        .use_layer(RequestIdLayer::new())
        .use_layer(RequestLogLayer::tracing(Level::INFO))
        .use_layer(from_fn(|req: Request, next: BoxedNext| async move {
            info!("middleware before");
            let response = next(req).await;
            info!("middleware after");
            response
        }));

    // Route everything to the regex router
    router.handle("/", patterns)?;

    let config = AppConfig::from_env()?;
    info!("Starting server on {}...", config.addr);
    serve(router, &config.addr).await
}
