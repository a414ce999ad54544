use crate::helpers::{create_session, make_test_app, send_json, send_raw};
use axum::http::StatusCode;
use axum::Router;
use serde_json::json;

async fn issue(app: &Router, id: i64) -> String {
    let (_, tok) = send_json(app, "POST", &format!("/api/sessions/{id}/token"), None).await;
    tok["data"]["value"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn redeem_records_presence_once() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let token = issue(&app, id).await;

    let body = json!({
        "token": token,
        "student_id": "u21",
        "lat": -25.75,
        "long": 28.23,
        "accuracy": 12.5
    });
    let (status, first) = send_json(&app, "POST", "/api/attendance/redeem", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["data"]["status"], "present");
    assert_eq!(first["data"]["source"], "token_scan");
    assert_eq!(first["data"]["marked_by"], "u21");
    assert_eq!(first["data"]["lat"], -25.75);

    let (status, second) = send_json(&app, "POST", "/api/attendance/redeem", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["id"], first["data"]["id"]);

    let (_, list) = send_json(&app, "GET", &format!("/api/sessions/{id}/records"), None).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn redeem_accepts_typed_lowercase_token() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let token = issue(&app, id).await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/redeem",
        Some(json!({ "token": format!(" {} ", token.to_lowercase()), "student_id": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn redeem_error_statuses() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let token = issue(&app, id).await;

    let cases = [
        (json!({ "token": "ZZZZZZ", "student_id": "u1" }), StatusCode::BAD_REQUEST),
        (json!({ "token": "", "student_id": "u1" }), StatusCode::UNPROCESSABLE_ENTITY),
        (json!({ "token": token, "student_id": "  " }), StatusCode::UNPROCESSABLE_ENTITY),
        (
            json!({ "token": token, "student_id": "u1", "lat": 95.0, "long": 0.0 }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "token": token, "student_id": "u1", "lat": 10.0 }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "token": token, "student_id": "u1", "lat": 1.0, "long": 1.0, "accuracy": -3.0 }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
    ];

    for (body, expected) in cases {
        let (status, json) = send_json(&app, "POST", "/api/attendance/redeem", Some(body.clone())).await;
        assert_eq!(status, expected, "{body} -> {json}");
        assert_eq!(json["success"], false);
    }

    let (_, list) = send_json(&app, "GET", &format!("/api/sessions/{id}/records"), None).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unreadable_bodies_come_back_as_api_errors() {
    let (app, _) = make_test_app().await;

    let cases = [
        (Some("application/json"), "{\"token\": \"ABC"),
        (Some("application/json"), "{\"token\": \"ABC234\"}"),
        (Some("application/json"), "{\"token\": 7, \"student_id\": \"u1\"}"),
        (None, "{\"token\": \"ABC234\", \"student_id\": \"u1\"}"),
    ];

    for (content_type, body) in cases {
        let (status, json) =
            send_raw(&app, "POST", "/api/attendance/redeem", content_type, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(json["success"], false, "{body} -> {json}");
        assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}
