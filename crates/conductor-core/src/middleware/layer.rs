//! Middleware chain composition
//!
//! A middleware layer sees the request before the handler and the response
//! after it. Layers are registered in order on a [`LayerStack`] and composed
//! around a terminal handler so that the first layer registered is the
//! outermost one:
//!
//! ```text
//! [A, B, C] + H  =>  A pre -> B pre -> C pre -> H -> C post -> B post -> A post
//! ```

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::sync::Arc;

/// A boxed next function for middleware chains
pub type BoxedNext = BoxedHandler;

/// Trait for middleware that can be applied to a router or app
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Apply this middleware to a request, calling `next` to continue the chain
    fn call(&self, req: Request, next: BoxedNext) -> BoxFuture<Response>;

    /// Clone this middleware into a boxed trait object
    fn clone_box(&self) -> Box<dyn MiddlewareLayer>;

    /// Wrap `next` into a new handler that runs this layer first
    fn wrap(&self, next: BoxedNext) -> BoxedNext {
        let layer: Arc<dyn MiddlewareLayer> = Arc::from(self.clone_box());
        Arc::new(move |req: Request| layer.call(req, next.clone()))
    }
}

impl Clone for Box<dyn MiddlewareLayer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Middleware built from an async closure taking the request and the rest of the chain
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

/// Create middleware from an async closure
///
/// ```rust,ignore
/// let auth = from_fn(|req: Request, next: BoxedNext| async move {
///     if req.headers().contains_key("authorization") {
///         next(req).await
///     } else {
///         StatusCode::UNAUTHORIZED.into_response()
///     }
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, BoxedNext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn { f }
}

impl<F, Fut> MiddlewareLayer for FromFn<F>
where
    F: Fn(Request, BoxedNext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request, next: BoxedNext) -> BoxFuture<Response> {
        Box::pin((self.f)(req, next))
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

/// Middleware built from a function that wraps one handler in another
pub struct WrapFn<F> {
    f: Arc<F>,
}

impl<F> Clone for WrapFn<F> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

/// Create middleware from a handler-to-handler function
pub fn wrap_fn<F>(f: F) -> WrapFn<F>
where
    F: Fn(BoxedNext) -> BoxedNext + Send + Sync + 'static,
{
    WrapFn { f: Arc::new(f) }
}

impl<F> MiddlewareLayer for WrapFn<F>
where
    F: Fn(BoxedNext) -> BoxedNext + Send + Sync + 'static,
{
    fn call(&self, req: Request, next: BoxedNext) -> BoxFuture<Response> {
        (self.f)(next)(req)
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }

    fn wrap(&self, next: BoxedNext) -> BoxedNext {
        (self.f)(next)
    }
}

/// A stack of middleware layers
#[derive(Clone, Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareLayer>>,
}

impl LayerStack {
    /// Create a new empty layer stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a middleware layer to the stack
    ///
    /// Layers run in the order they are added (outermost first).
    pub fn push(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.push(layer);
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Wrap `handler` in every layer of the stack
    ///
    /// The stack is folded from the last layer to the first, so the first
    /// layer registered ends up outermost. An empty stack returns the handler
    /// unchanged.
    pub fn compose(&self, handler: BoxedNext) -> BoxedNext {
        self.layers
            .iter()
            .rev()
            .fold(handler, |next, layer| layer.wrap(next))
    }

    /// Execute the middleware stack with a final handler
    pub fn execute(&self, req: Request, handler: BoxedNext) -> BoxFuture<Response> {
        if self.layers.is_empty() {
            return handler(req);
        }
        self.compose(handler)(req)
    }
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStack")
            .field("layers", &self.layers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::IntoResponse;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    type OrderLog = Arc<Mutex<Vec<(usize, &'static str)>>>;

    /// Create a test request with the given method and path
    fn create_test_request(method: Method, path: &str) -> Request {
        let req = http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap();
        Request::from_http(req)
    }

    fn status_handler(status: StatusCode) -> BoxedNext {
        Arc::new(move |_req: Request| {
            Box::pin(async move { status.into_response() }) as BoxFuture<Response>
        })
    }

    /// A simple test middleware that tracks execution order
    #[derive(Clone)]
    struct OrderTrackingMiddleware {
        id: usize,
        order: OrderLog,
    }

    impl OrderTrackingMiddleware {
        fn new(id: usize, order: OrderLog) -> Self {
            Self { id, order }
        }
    }

    impl MiddlewareLayer for OrderTrackingMiddleware {
        fn call(&self, req: Request, next: BoxedNext) -> BoxFuture<Response> {
            let id = self.id;
            let order = self.order.clone();

            Box::pin(async move {
                order.lock().unwrap().push((id, "pre"));
                let response = next(req).await;
                order.lock().unwrap().push((id, "post"));
                response
            })
        }

        fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
            Box::new(self.clone())
        }
    }

    /// A middleware that answers without calling next
    #[derive(Clone)]
    struct ShortCircuitMiddleware {
        error_status: StatusCode,
    }

    impl MiddlewareLayer for ShortCircuitMiddleware {
        fn call(&self, _req: Request, _next: BoxedNext) -> BoxFuture<Response> {
            let status = self.error_status;
            Box::pin(async move { status.into_response() })
        }

        fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
            Box::new(self.clone())
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_layer_preserves_handler_response(
            handler_status in 200u16..600u16,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let order = Arc::new(Mutex::new(Vec::new()));

                let mut stack = LayerStack::new();
                stack.push(Box::new(OrderTrackingMiddleware::new(1, order.clone())));

                let handler_status = StatusCode::from_u16(handler_status).unwrap_or(StatusCode::OK);
                let request = create_test_request(Method::GET, "/test");
                let response = stack.execute(request, status_handler(handler_status)).await;

                prop_assert_eq!(response.status(), handler_status);

                let execution_order = order.lock().unwrap();
                prop_assert_eq!(execution_order.len(), 2);
                prop_assert_eq!(execution_order[0], (1, "pre"));
                prop_assert_eq!(execution_order[1], (1, "post"));

                Ok(())
            });
            result?;
        }

        #[test]
        fn prop_middleware_execution_order(
            num_layers in 1usize..10usize,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let order = Arc::new(Mutex::new(Vec::new()));

                let mut stack = LayerStack::new();
                for i in 0..num_layers {
                    stack.push(Box::new(OrderTrackingMiddleware::new(i, order.clone())));
                }

                let composed = stack.compose(status_handler(StatusCode::OK));
                let _response = composed(create_test_request(Method::GET, "/test")).await;

                let execution_order = order.lock().unwrap();
                prop_assert_eq!(execution_order.len(), num_layers * 2);

                // Outermost first on the way in
                for i in 0..num_layers {
                    prop_assert_eq!(execution_order[i], (i, "pre"),
                        "pre-handler order mismatch at index {}", i);
                }

                // Innermost first on the way out
                for i in 0..num_layers {
                    let expected_id = num_layers - 1 - i;
                    prop_assert_eq!(execution_order[num_layers + i], (expected_id, "post"),
                        "post-handler order mismatch at index {}", i);
                }

                Ok(())
            });
            result?;
        }

        #[test]
        fn prop_middleware_short_circuit(
            error_status in 400u16..600u16,
            num_middleware_before in 0usize..5usize,
            num_middleware_after in 0usize..5usize,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let order = Arc::new(Mutex::new(Vec::new()));
                let handler_called = Arc::new(AtomicBool::new(false));

                let mut stack = LayerStack::new();
                for i in 0..num_middleware_before {
                    stack.push(Box::new(OrderTrackingMiddleware::new(i, order.clone())));
                }
                let error_status = StatusCode::from_u16(error_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                stack.push(Box::new(ShortCircuitMiddleware { error_status }));
                for i in 0..num_middleware_after {
                    stack.push(Box::new(OrderTrackingMiddleware::new(100 + i, order.clone())));
                }

                let called = handler_called.clone();
                let handler: BoxedNext = Arc::new(move |_req: Request| {
                    let called = called.clone();
                    Box::pin(async move {
                        called.store(true, Ordering::SeqCst);
                        StatusCode::OK.into_response()
                    }) as BoxFuture<Response>
                });

                let response = stack.execute(create_test_request(Method::GET, "/test"), handler).await;

                prop_assert_eq!(response.status(), error_status);
                prop_assert!(!handler_called.load(Ordering::SeqCst));

                let execution_order = order.lock().unwrap();
                let pre_count = execution_order.iter().filter(|(id, phase)| *id < 100 && *phase == "pre").count();
                let post_count = execution_order.iter().filter(|(id, phase)| *id < 100 && *phase == "post").count();
                prop_assert_eq!(pre_count, num_middleware_before);
                prop_assert_eq!(post_count, num_middleware_before);

                let after_entries = execution_order.iter().filter(|(id, _)| *id >= 100).count();
                prop_assert_eq!(after_entries, 0);

                Ok(())
            });
            result?;
        }
    }

    #[tokio::test]
    async fn test_empty_stack_returns_handler_unchanged() {
        let stack = LayerStack::new();
        let response = stack
            .execute(create_test_request(Method::GET, "/"), status_handler(StatusCode::ACCEPTED))
            .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_from_fn_can_modify_response() {
        let mut stack = LayerStack::new();
        stack.push(Box::new(from_fn(|req: Request, next: BoxedNext| async move {
            let mut response = next(req).await;
            response
                .headers_mut()
                .insert("x-layer", http::HeaderValue::from_static("from_fn"));
            response
        })));

        let response = stack
            .execute(create_test_request(Method::GET, "/"), status_handler(StatusCode::OK))
            .await;
        assert_eq!(response.headers().get("x-layer").unwrap(), "from_fn");
    }

    #[tokio::test]
    async fn test_wrap_fn_replaces_handler() {
        let mut stack = LayerStack::new();
        stack.push(Box::new(wrap_fn(|_next: BoxedNext| -> BoxedNext {
            status_handler(StatusCode::GONE)
        })));

        let response = stack
            .execute(create_test_request(Method::GET, "/"), status_handler(StatusCode::OK))
            .await;
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_composed_handler_is_reusable() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut stack = LayerStack::new();
        stack.push(Box::new(OrderTrackingMiddleware::new(7, order.clone())));

        let composed = stack.compose(status_handler(StatusCode::OK));
        composed(create_test_request(Method::GET, "/a")).await;
        composed(create_test_request(Method::GET, "/b")).await;

        assert_eq!(order.lock().unwrap().len(), 4);
    }
}
