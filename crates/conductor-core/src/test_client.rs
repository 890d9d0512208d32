//! TestClient for integration testing without network binding
//!
//! Sends simulated requests through the full middleware and routing
//! pipeline without opening a socket.
//!
//! # Example
//!
//! ```rust,ignore
//! use conductor_core::{App, TestClient};
//!
//! #[tokio::test]
//! async fn test_hello() {
//!     let app = App::new().route_fn("/", |_req| async { "Hello, World!" }).unwrap();
//!     let client = TestClient::new(app);
//!
//!     let response = client.get("/").await;
//!     response.assert_status(200);
//!     assert_eq!(response.text(), "Hello, World!");
//! }
//! ```

use crate::app::App;
use crate::context::ClientAddr;
use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};
use std::net::SocketAddr;

/// Test client for integration testing without network binding
pub struct TestClient {
    handler: BoxedHandler,
    remote_addr: Option<SocketAddr>,
}

impl TestClient {
    /// Create a test client for an application, app layers included
    pub fn new(app: App) -> Self {
        Self {
            handler: app.into_handler(),
            remote_addr: None,
        }
    }

    /// Create a test client for any handler, such as a bare [`Router`](crate::Router)
    pub fn from_handler<H: Handler>(handler: H) -> Self {
        Self {
            handler: into_boxed_handler(handler),
            remote_addr: None,
        }
    }

    /// Pretend requests arrive from `addr`, as the server would record it
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a DELETE request
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(TestRequest::delete(path)).await
    }

    /// Send a POST request with JSON body
    ///
    /// ```rust,ignore
    /// let response = client.post_json("/posts", &NewPost { title: "Hi" }).await;
    /// ```
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    /// Send a PUT request with JSON body
    pub async fn put_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::put(path).json(body)).await
    }

    /// Send a request with full control
    ///
    /// ```rust,ignore
    /// let response = client.request(
    ///     TestRequest::get("/posts/1")
    ///         .host("blog.example.com")
    ///         .header("X-Request-ID", "abc")
    /// ).await;
    /// ```
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let mut builder = http::Request::builder().method(req.method).uri(req.path.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(req.headers);
        }

        let http_req = match builder.body(req.body.unwrap_or_default()) {
            Ok(http_req) => http_req,
            Err(err) => panic!("invalid test request for {:?}: {}", req.path, err),
        };

        let mut request = Request::from_http(http_req);
        if let Some(addr) = self.remote_addr {
            let _ = request.context_mut().insert(ClientAddr(addr));
        }

        let response = (self.handler)(request).await;
        TestResponse::from_response(response).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    /// Create a new request with the given method and path
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a PATCH request
    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a DELETE request
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header to the request
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Set the `Host` header
    pub fn host(self, host: &str) -> Self {
        self.header("host", host)
    }

    /// Set the request body as JSON
    ///
    /// This also sets the Content-Type header to `application/json`.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Set the request body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body: body_bytes,
        }
    }

    /// Get the response status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the response body as bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert that the response has the expected status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        let expected = match StatusCode::from_u16(expected) {
            Ok(status) => status,
            Err(err) => panic!("invalid expected status {}: {}", expected, err),
        };
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert that the response has the expected header value
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self
            .headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert that the response body matches the expected JSON value
    ///
    /// # Panics
    ///
    /// Panics if the body can't be parsed as JSON or doesn't match.
    pub fn assert_json<T: DeserializeOwned + PartialEq + std::fmt::Debug>(&self, expected: &T) -> &Self {
        let actual: T = match self.json() {
            Ok(actual) => actual,
            Err(err) => panic!("Failed to parse response body as JSON: {}", err),
        };
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Assert that the response body equals `expected`
    pub fn assert_text(&self, expected: &str) -> &Self {
        assert_eq!(self.text(), expected, "body mismatch");
        self
    }
}
