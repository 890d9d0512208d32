//! JSON request and response helpers
//!
//! Responses are pretty-printed with a two-space indent and carry
//! `Content-Type: application/json`.

use bytes::Bytes;
use conductor_core::{ApiError, IntoResponse, Request, Response, StatusCode};
use http::{header, HeaderValue};
use http_body_util::Full;
use serde::{de::DeserializeOwned, Serialize};

/// Decode the request body as JSON
///
/// The body can be read once; a second call fails with `400 Bad Request`,
/// as does a body that is not valid JSON for `T`.
pub fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ApiError> {
    let body = req
        .take_body()
        .ok_or_else(|| ApiError::bad_request("Body already consumed"))?;

    serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request(format!("Invalid JSON body: {}", err)))
}

/// Encode `value` as an indented JSON response with status `200 OK`
pub fn write_json<T: Serialize>(value: &T) -> Result<Response, ApiError> {
    json_response(StatusCode::OK, value)
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, ApiError> {
    let body = serde_json::to_vec_pretty(value)
        .map_err(|err| ApiError::internal("Failed to encode JSON").with_internal(err.to_string()))?;

    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

/// JSON response wrapper
///
/// ```rust,ignore
/// async fn show(_req: Request) -> Json<Post> {
///     Json(Post { id: 23, title: "Hello".into() })
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Json(value)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match write_json(&self.0) {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

/// JSON response with a `201 Created` status
#[derive(Debug, Clone)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        match json_response(StatusCode::CREATED, &self.0) {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Post {
        id: u32,
        title: String,
    }

    fn request(body: &str) -> Request {
        Request::from_http(
            http::Request::builder()
                .method("POST")
                .uri("/posts")
                .body(Bytes::from(body.to_string()))
                .unwrap(),
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn reads_a_json_body() {
        let mut req = request(r#"{"id": 23, "title": "Hello"}"#);
        let post: Post = read_json(&mut req).unwrap();
        assert_eq!(
            post,
            Post {
                id: 23,
                title: "Hello".to_string()
            }
        );
    }

    #[test]
    fn body_can_only_be_read_once() {
        let mut req = request(r#"{"id": 1, "title": "x"}"#);
        let _: Post = read_json(&mut req).unwrap();

        let err = read_json::<Post>(&mut req).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        let mut req = request("{not json");
        let err = read_json::<Post>(&mut req).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let mut req = request(r#"{"id": "twenty"}"#);
        let err = read_json::<Post>(&mut req).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn writes_indented_json() {
        let response = write_json(&json!({"id": 23})).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_text(response).await, "{\n  \"id\": 23\n}");
    }

    #[tokio::test]
    async fn json_wrapper_and_created() {
        let response = Json(vec![1, 2]).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "[\n  1,\n  2\n]");

        let response = Created(json!({"ok": true})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
