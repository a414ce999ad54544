use crate::helpers::{create_session, make_test_app, send_json};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn create_and_fetch_session() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "per_student").await;

    let (status, json) = send_json(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id);
    assert_eq!(json["data"]["class_id"], 7);
    assert_eq!(json["data"]["date"], "2025-09-08");
    assert_eq!(json["data"]["start_time"], "09:00");
    assert_eq!(json["data"]["check_in_mode"], "per_student");
    assert_eq!(json["data"]["geo_required"], false);
}

#[tokio::test]
async fn create_session_rejects_inverted_times() {
    let (app, _) = make_test_app().await;
    let (status, json) = send_json(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({
            "class_id": 1,
            "date": "2025-09-08",
            "start_time": "11:00:00",
            "end_time": "10:00:00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn unknown_session_is_404() {
    let (app, _) = make_test_app().await;

    for (method, uri) in [
        ("GET", "/api/sessions/999"),
        ("DELETE", "/api/sessions/999"),
        ("POST", "/api/sessions/999/token"),
        ("GET", "/api/sessions/999/token"),
        ("GET", "/api/sessions/999/records"),
    ] {
        let (status, json) = send_json(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(json["message"], "Session 999 not found");
    }
}

#[tokio::test]
async fn token_issue_rotate_and_peek() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let uri = format!("/api/sessions/{id}/token");

    let (status, json) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].is_null());

    let (status, first) = send_json(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let value = first["data"]["value"].as_str().unwrap().to_owned();
    assert_eq!(value.len(), 6);
    assert!(first["data"]["expires_at"].is_string());

    let (_, peek) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(peek["data"]["value"], value.as_str());

    let (_, second) = send_json(&app, "POST", &uri, None).await;
    let rotated = second["data"]["value"].as_str().unwrap();
    if rotated != value {
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/attendance/redeem",
            Some(json!({ "token": value, "student_id": "u1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn token_refused_when_check_in_off() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "off").await;

    let (status, json) = send_json(&app, "POST", &format!("/api/sessions/{id}/token"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn bulk_mark_then_list() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;

    let (status, json) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{id}/records/bulk"),
        Some(json!({
            "default_status": "absent",
            "marked_by": "lecturer1",
            "overrides": [
                { "student_id": "s1" },
                { "student_id": "s2", "status": "late", "note": "bus" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["status"], "absent");
    assert_eq!(json["data"][1]["status"], "late");
    assert_eq!(json["data"][1]["source"], "manual");

    let (status, list) = send_json(&app, "GET", &format!("/api/sessions/{id}/records"), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = list["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["marked_by"] == "lecturer1"));
}

#[tokio::test]
async fn bulk_mark_validation() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let uri = format!("/api/sessions/{id}/records/bulk");

    let (status, _) = send_json(
        &app,
        "POST",
        &uri,
        Some(json!({ "default_status": "absent", "marked_by": "t", "overrides": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = send_json(
        &app,
        "POST",
        &uri,
        Some(json!({
            "default_status": "absent",
            "marked_by": "t",
            "overrides": [{ "student_id": "a" }, { "student_id": "a" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["message"].as_str().unwrap().contains("more than once"));
}

#[tokio::test]
async fn delete_session_cascades() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let (_, tok) = send_json(&app, "POST", &format!("/api/sessions/{id}/token"), None).await;
    let value = tok["data"]["value"].as_str().unwrap().to_owned();

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/redeem",
        Some(json!({ "token": value, "student_id": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/redeem",
        Some(json!({ "token": value, "student_id": "u2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_session_fields_are_enveloped() {
    let (app, _) = make_test_app().await;

    let bodies = [
        json!({ "class_id": 7, "date": "08/09/2025" }),
        json!({ "class_id": 7, "date": "2025-09-08", "check_in_mode": "sometimes" }),
        json!({ "date": "2025-09-08" }),
    ];
    for body in bodies {
        let (status, json) = send_json(&app, "POST", "/api/sessions", Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(json["success"], false, "{body} -> {json}");
    }
}
