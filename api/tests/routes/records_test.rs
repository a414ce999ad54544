use crate::helpers::{create_session, make_test_app, send_json};
use axum::http::StatusCode;
use db::models::audit_log::Model as AuditLog;
use serde_json::json;

#[tokio::test]
async fn patch_changes_status_and_audits() {
    let (app, state) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let (_, tok) = send_json(&app, "POST", &format!("/api/sessions/{id}/token"), None).await;
    let (_, rec) = send_json(
        &app,
        "POST",
        "/api/attendance/redeem",
        Some(json!({ "token": tok["data"]["value"], "student_id": "u1" })),
    )
    .await;
    let record_id = rec["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/records/{record_id}");

    // unchanged status, no note: nothing to audit
    let (status, same) = send_json(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "status": "present", "updated_by": "lecturer-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(same["data"]["marked_by"], "u1");
    assert!(
        AuditLog::for_entity(state.db(), "attendance_record", record_id)
            .await
            .unwrap()
            .is_empty()
    );

    let (status, changed) = send_json(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "status": "late", "note": "train delay", "updated_by": "lecturer-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(changed["data"]["status"], "late");
    assert_eq!(changed["data"]["note"], "train delay");
    assert_eq!(changed["data"]["marked_by"], "lecturer-1");

    let logs = AuditLog::for_entity(state.db(), "attendance_record", record_id)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].actor, "lecturer-1");
    assert_eq!(logs[0].diff["status"]["to"], "late");
}

#[tokio::test]
async fn patch_missing_record_is_404() {
    let (app, _) = make_test_app().await;
    let (status, json) = send_json(
        &app,
        "PATCH",
        "/api/records/4040",
        Some(json!({ "status": "late", "updated_by": "lecturer-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Attendance record 4040 not found");
}

#[tokio::test]
async fn patch_requires_actor() {
    let (app, _) = make_test_app().await;
    let (status, _) = send_json(
        &app,
        "PATCH",
        "/api/records/1",
        Some(json!({ "status": "late", "updated_by": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
