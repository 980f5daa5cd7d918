use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::util::ServiceExt;

/// Sends one in-process request; a JSON body sets the content type.
pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
    headers: &[(&str, String)],
) -> Response {
    let mut builder = headers
        .iter()
        .fold(Request::builder().method(method).uri(path), |b, (k, v)| {
            b.header(*k, v.as_str())
        });

    let body = match body {
        Some(payload) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(payload.to_string())
        }
        None => Body::empty(),
    };

    let req = builder.body(body).expect("build request");
    app.clone().oneshot(req).await.expect("router response")
}

/// Status, headers and the body parsed as JSON (`{}` when empty).
pub async fn response_json(resp: Response) -> (StatusCode, HeaderMap, Value) {
    let (parts, body) = resp.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.expect("collect body");

    let json = if bytes.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            panic!(
                "body is not JSON ({e}): {}",
                String::from_utf8_lossy(&bytes)
            )
        })
    };

    (parts.status, parts.headers, json)
}

/// Error envelope with the expected code and a trace id.
pub fn assert_json_error(body: &Value, code: &str) {
    assert_eq!(body["success"], false, "body: {body}");
    assert_eq!(body["code"], code, "body: {body}");
    assert!(body["message"].is_string(), "body: {body}");
    assert!(body["traceId"].is_string(), "body: {body}");
}

/// Success envelope carrying a `data` field.
pub fn assert_status_ok_json(status: StatusCode, body: &Value) {
    assert!(status.is_success(), "status {status}, body: {body}");
    assert_eq!(body["success"], true, "body: {body}");
    assert!(body.get("data").is_some(), "body: {body}");
}
