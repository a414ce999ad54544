use crate::helpers::{make_test_app, send_json};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn notice_with_no_sockets_delivers_nothing() {
    let (app, _) = make_test_app().await;
    let (status, json) = send_json(
        &app,
        "POST",
        "/api/system/notices",
        Some(json!({ "message": "maintenance at 18:00" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["delivered"], 0);
}

#[tokio::test]
async fn empty_notice_is_rejected() {
    let (app, _) = make_test_app().await;
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/system/notices",
        Some(json!({ "level": "warning", "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
