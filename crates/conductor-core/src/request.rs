//! Request types for Conductor

use crate::context::RequestContext;
use crate::params::RouteParams;
use bytes::Bytes;
use http::{header, request::Parts, Extensions, HeaderMap, Method, Uri, Version};

/// HTTP Request wrapper
///
/// Provides access to all parts of an incoming HTTP request plus the
/// request-scoped [`RequestContext`].
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Option<Bytes>,
    pub(crate) context: RequestContext,
}

impl Request {
    /// Create a new request from parts
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body: Some(body),
            context: RequestContext::new(),
        }
    }

    /// Create a request from an `http::Request` with a buffered body
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body)
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get mutable headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Host the request was sent to, without a port.
    ///
    /// Taken from the URI authority when the request line is absolute,
    /// otherwise from the `Host` header. Empty when neither is present.
    pub fn host(&self) -> &str {
        let raw = match self.parts.uri.host() {
            Some(host) => host,
            None => self
                .parts
                .headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
                .unwrap_or(""),
        };
        strip_port(raw)
    }

    /// Get request extensions (the raw `http` extensions, not the context)
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Take the body bytes (can only be called once)
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// The request-scoped context
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Mutable access to the request-scoped context
    pub fn context_mut(&mut self) -> &mut RequestContext {
        &mut self.context
    }

    /// Parameters captured by the matched route
    pub fn route_params(&self) -> Option<&RouteParams> {
        self.context.route_params()
    }

    /// Get a single route parameter
    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.context.route_params().and_then(|params| params.get(name))
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("context", &self.context)
            .finish()
    }
}

/// Strip a `:port` suffix, leaving bracketed IPv6 literals intact
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
