mod common;

use axum::http::{Method, StatusCode};

use common::app::{spawn_with, TestOptions};
use common::http::{assert_json_error, request, response_json};

#[tokio::test]
async fn it_limits_api_but_not_health() {
    let app = spawn_with(TestOptions {
        api_limit: 2,
        ..TestOptions::default()
    })
    .await;

    for _ in 0..2 {
        let resp = request(&app.app, Method::GET, "/api/opportunities", None, &[]).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("ratelimit-remaining"));
    }

    let resp = request(&app.app, Method::GET, "/api/opportunities", None, &[]).await;
    let (status, headers, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_json_error(&body, "RATE_LIMITED");
    assert_eq!(headers["retry-after"], "60");
    assert!(body["traceId"].is_string());

    let resp = request(&app.app, Method::GET, "/health/live", None, &[]).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
