//! Request ID middleware
//!
//! Tags every request with an identifier. An inbound `X-Request-ID` header is
//! kept as is; otherwise a UUID v4 is generated and written to the request
//! header so downstream code sees one consistent value. The identifier is
//! stored in the request context as [`RequestId`] and echoed on the response.

use super::layer::{BoxedNext, MiddlewareLayer};
use crate::context::RequestId;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use http::{HeaderName, HeaderValue};

/// Default header carrying the request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware layer that assigns a [`RequestId`] to each request
#[derive(Clone, Debug)]
pub struct RequestIdLayer {
    header: HeaderName,
}

impl RequestIdLayer {
    /// Use the `X-Request-ID` header
    pub fn new() -> Self {
        Self {
            header: HeaderName::from_static(REQUEST_ID_HEADER),
        }
    }

    /// Use a different header name
    pub fn with_header(header: HeaderName) -> Self {
        Self { header }
    }

    fn inbound_id(&self, req: &Request) -> Option<String> {
        req.headers()
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

impl Default for RequestIdLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareLayer for RequestIdLayer {
    fn call(&self, mut req: Request, next: BoxedNext) -> BoxFuture<Response> {
        // An outer router already tagged this request
        if let Some(existing) = req.context().get::<RequestId>() {
            tracing::trace!(request_id = %existing, "request id already assigned");
            return next(req);
        }

        let header = self.header.clone();
        let id = match self.inbound_id(&req) {
            Some(id) => id,
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&id) {
                    req.headers_mut().insert(header.clone(), value);
                }
                id
            }
        };

        if let Err(err) = req.context_mut().insert(RequestId::new(id.clone())) {
            tracing::warn!(error = %err, "failed to store request id");
        }

        Box::pin(async move {
            let mut response = next(req).await;
            if let Ok(value) = HeaderValue::from_str(&id) {
                response.headers_mut().insert(header, value);
            }
            response
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}
