use crate::helpers::{make_test_app, send_json};
use axum::http::StatusCode;

#[tokio::test]
async fn health_check_is_public_and_ok() {
    let (app, _) = make_test_app().await;
    let (status, json) = send_json(&app, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
}
