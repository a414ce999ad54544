use crate::helpers::{connect_ws, create_session, make_test_app, next_json, send_json, spawn_server};
use futures_util::SinkExt;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_tungstenite::tungstenite::protocol::Message;
use util::state::AppState;

async fn send(ws: &mut crate::helpers::ws::Ws, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

/// Drains frames until one with `"type": ty` arrives.
async fn expect_type(ws: &mut crate::helpers::ws::Ws, ty: &str) -> Value {
    while let Some(v) = next_json(ws).await {
        if v["type"] == ty {
            return v;
        }
    }
    panic!("no {ty} frame");
}

/// Collects live events until the socket goes quiet.
async fn events(ws: &mut crate::helpers::ws::Ws) -> Vec<Value> {
    let mut out = Vec::new();
    while let Some(v) = next_json(ws).await {
        if v["type"] == "event" {
            out.push(v);
        }
    }
    out
}

async fn wait_for_disconnect(state: &AppState, session_id: i64) {
    for _ in 0..50 {
        if state.broker().subscribers(session_id).await.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("connection still subscribed to {session_id}");
}

#[tokio::test]
async fn ping_and_bad_frames() {
    let (app, _) = make_test_app().await;
    let addr = spawn_server(app).await;
    let (mut ws, conn) = connect_ws(addr).await;
    assert!(conn.starts_with("conn-"));

    send(&mut ws, json!({ "type": "ping" })).await;
    expect_type(&mut ws, "pong").await;

    send(&mut ws, json!({ "type": "shout" })).await;
    let err = expect_type(&mut ws, "error").await;
    assert_eq!(err["code"], "bad_request");
}

#[tokio::test]
async fn subscribe_rejects_unknown_sessions() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let addr = spawn_server(app).await;
    let (mut ws, _) = connect_ws(addr).await;

    send(&mut ws, json!({ "type": "subscribe", "session_ids": [id, 999] })).await;
    let ok = expect_type(&mut ws, "subscribe_ok").await;
    assert_eq!(ok["accepted"], json!([id]));
    assert_eq!(ok["rejected"][0]["session_id"], 999);
    assert_eq!(ok["rejected"][0]["code"], "not_found");
}

#[tokio::test]
async fn redemption_reaches_only_that_sessions_watchers() {
    let (app, _) = make_test_app().await;
    let s1 = create_session(&app, "session_wide").await;
    let s2 = create_session(&app, "session_wide").await;
    let addr = spawn_server(app.clone()).await;

    let (mut only_s1, _) = connect_ws(addr).await;
    let (mut both, _) = connect_ws(addr).await;
    send(&mut only_s1, json!({ "type": "subscribe", "session_ids": [s1] })).await;
    expect_type(&mut only_s1, "subscribe_ok").await;
    send(&mut both, json!({ "type": "subscribe", "session_ids": [s1, s2] })).await;
    expect_type(&mut both, "subscribe_ok").await;

    let (_, t2) = send_json(&app, "POST", &format!("/api/sessions/{s2}/token"), None).await;
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/attendance/redeem",
        Some(json!({ "token": t2["data"]["value"], "student_id": "u7" })),
    )
    .await;
    assert!(status.is_success());

    assert!(events(&mut only_s1).await.is_empty());

    let got = events(&mut both).await;
    let update = got
        .iter()
        .find(|e| e["event"] == "attendance.updated")
        .expect("attendance.updated");
    assert_eq!(update["topic"], format!("attendance:session:{s2}"));
    assert_eq!(update["payload"]["session_id"], s2);
    assert_eq!(update["payload"]["student_id"], "u7");
    assert_eq!(update["payload"]["status"], "present");
    assert_eq!(update["payload"]["marked_by"], "u7");
    assert!(update["ts"].is_string());

    let stats = got
        .iter()
        .find(|e| e["event"] == "attendance.session_stats")
        .expect("attendance.session_stats");
    assert_eq!(stats["payload"]["present"], 1);
}

#[tokio::test]
async fn unsubscribe_stops_the_feed() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let addr = spawn_server(app.clone()).await;
    let (mut ws, _) = connect_ws(addr).await;

    send(&mut ws, json!({ "type": "subscribe", "session_ids": [id] })).await;
    expect_type(&mut ws, "subscribe_ok").await;
    send(&mut ws, json!({ "type": "unsubscribe", "session_ids": [id] })).await;
    let ok = expect_type(&mut ws, "unsubscribe_ok").await;
    assert_eq!(ok["session_ids"], json!([id]));

    send_json(
        &app,
        "POST",
        &format!("/api/sessions/{id}/records/bulk"),
        Some(json!({
            "default_status": "absent",
            "marked_by": "t",
            "overrides": [{ "student_id": "s1" }]
        })),
    )
    .await;

    assert!(events(&mut ws).await.is_empty());
}

#[tokio::test]
async fn closing_the_socket_drops_every_subscription() {
    let (app, state) = make_test_app().await;
    let s1 = create_session(&app, "session_wide").await;
    let s2 = create_session(&app, "session_wide").await;
    let addr = spawn_server(app).await;
    let (mut ws, _) = connect_ws(addr).await;

    send(&mut ws, json!({ "type": "subscribe", "session_ids": [s1, s2] })).await;
    expect_type(&mut ws, "subscribe_ok").await;
    assert_eq!(state.broker().subscribers(s1).await.len(), 1);

    ws.close(None).await.unwrap();

    wait_for_disconnect(&state, s1).await;
    wait_for_disconnect(&state, s2).await;
}

#[tokio::test]
async fn system_notice_reaches_unsubscribed_sockets() {
    let (app, _) = make_test_app().await;
    let addr = spawn_server(app.clone()).await;
    let (mut ws, _) = connect_ws(addr).await;

    let (_, json) = send_json(
        &app,
        "POST",
        "/api/system/notices",
        Some(json!({ "level": "warning", "message": "restart soon" })),
    )
    .await;
    assert_eq!(json["data"]["delivered"], 1);

    let got = events(&mut ws).await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0]["event"], "system.notice");
    assert_eq!(got[0]["topic"], "system");
    assert_eq!(got[0]["payload"]["message"], "restart soon");
}

#[tokio::test]
async fn deleting_a_session_notifies_watchers() {
    let (app, _) = make_test_app().await;
    let id = create_session(&app, "session_wide").await;
    let addr = spawn_server(app.clone()).await;
    let (mut ws, _) = connect_ws(addr).await;

    send(&mut ws, json!({ "type": "subscribe", "session_ids": [id] })).await;
    expect_type(&mut ws, "subscribe_ok").await;

    send_json(&app, "DELETE", &format!("/api/sessions/{id}"), None).await;

    let got = events(&mut ws).await;
    assert_eq!(got.len(), 1);
    assert_eq!(got[0]["event"], "attendance.session_deleted");
    assert_eq!(got[0]["payload"]["session_id"], id);
}
