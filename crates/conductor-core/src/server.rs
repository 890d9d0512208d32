//! HTTP server implementation

use crate::context::ClientAddr;
use crate::error::ApiError;
use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Serve `handler` on `addr` until the listener fails
///
/// ```rust,ignore
/// let router = Router::new();
/// router.handle_fn("/", |_req| async { "hello" })?;
/// conductor_core::serve(router, "127.0.0.1:8080").await?;
/// ```
pub async fn serve<H: Handler>(
    handler: H,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    Server::new(into_boxed_handler(handler)).run(listener).await
}

/// Internal server struct
pub(crate) struct Server {
    handler: BoxedHandler,
}

impl Server {
    pub fn new(handler: BoxedHandler) -> Self {
        Self { handler }
    }

    /// Accept connections on `listener`, one task per connection
    pub async fn run(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let local_addr = listener.local_addr()?;
        info!("Conductor listening on http://{}", local_addr);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let handler = self.handler.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let handler = handler.clone();
                    async move {
                        let response = handle_request(handler, req, remote_addr).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Buffer the body, record the peer address, and run the handler chain
async fn handle_request(
    handler: BoxedHandler,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let response = ApiError::bad_request("Failed to read request body")
                .with_internal(err.to_string())
                .into_response();
            log_request(&method, &path, response.status(), start);
            return response;
        }
    };

    let mut request = Request::new(parts, body);
    if let Err(err) = request.context_mut().insert(ClientAddr(remote_addr)) {
        warn!(error = %err, "failed to record client address");
    }

    let response = handler(request).await;

    log_request(&method, &path, response.status(), start);
    response
}

/// Log request completion
fn log_request(method: &Method, path: &str, status: StatusCode, start: std::time::Instant) {
    let elapsed = start.elapsed();

    if status.is_server_error() {
        error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    } else {
        debug!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    }
}
