//! Single-socket multiplexer over session feeds.
//!
//! Each socket gets a [`ConnectionId`] and an outbox registered with the
//! broker. A writer task drains the outbox into the socket; the read loop
//! handles subscribe / unsubscribe / ping frames. Whatever ends the read
//! loop, the connection is dropped from every session before returning.

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use db::models::session::Model as Session;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use util::config;
use util::state::AppState;
use util::ws::{ConnectionId, Outbox};

use super::types::{Rejected, WsIn, WsOut};

/// GET /ws
pub async fn ws_multiplex_entry(ws: WebSocketUpgrade, State(app): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve(socket, app))
}

async fn serve(socket: WebSocket, app: AppState) {
    let conn = ConnectionId::next();
    let broker = app.broker_clone();
    let (mut sink, mut stream) = socket.split();

    let (tx_out, mut rx_out) = mpsc::channel::<String>(config::ws_outbox_capacity());
    let writer = tokio::spawn(async move {
        while let Some(text) = rx_out.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    reply(
        &tx_out,
        &WsOut::Ready {
            connection_id: conn.to_string(),
        },
    )
    .await;

    broker.connect(conn, tx_out.clone()).await;
    info!(%conn, "socket connected");

    while let Some(Ok(frame)) = stream.next().await {
        match frame {
            Message::Text(txt) => match serde_json::from_str::<WsIn>(txt.as_str()) {
                Ok(WsIn::Ping) => reply(&tx_out, &WsOut::Pong).await,

                Ok(WsIn::Subscribe { session_ids }) => {
                    let mut accepted = Vec::new();
                    let mut rejected = Vec::new();

                    for session_id in session_ids {
                        match Session::find(app.db(), session_id).await {
                            Ok(Some(_)) => {
                                if broker.subscribe(session_id, conn).await {
                                    accepted.push(session_id);
                                } else {
                                    rejected.push(Rejected {
                                        session_id,
                                        code: "not_connected",
                                    });
                                }
                            }
                            Ok(None) => rejected.push(Rejected {
                                session_id,
                                code: "not_found",
                            }),
                            Err(e) => {
                                warn!(%conn, session_id, error = %e, "session lookup failed");
                                rejected.push(Rejected {
                                    session_id,
                                    code: "internal",
                                });
                            }
                        }
                    }

                    debug!(%conn, ?accepted, rejected = rejected.len(), "subscribe");
                    reply(&tx_out, &WsOut::SubscribeOk { accepted, rejected }).await;
                }

                Ok(WsIn::Unsubscribe { session_ids }) => {
                    for session_id in &session_ids {
                        broker.unsubscribe(*session_id, conn).await;
                    }
                    reply(&tx_out, &WsOut::UnsubscribeOk { session_ids }).await;
                }

                Err(e) => {
                    reply(
                        &tx_out,
                        &WsOut::Error {
                            code: "bad_request",
                            message: format!("invalid frame: {e}"),
                        },
                    )
                    .await;
                }
            },

            Message::Binary(_) => {
                reply(
                    &tx_out,
                    &WsOut::Error {
                        code: "bad_request",
                        message: "binary frames are not supported".into(),
                    },
                )
                .await;
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    broker.on_disconnect(conn).await;
    drop(tx_out);
    let _ = writer.await;
    info!(%conn, "socket disconnected");
}

async fn reply<T: Serialize>(outbox: &Outbox, msg: &T) {
    match serde_json::to_string(msg) {
        Ok(text) => {
            let _ = outbox.send(text).await;
        }
        Err(e) => warn!(error = %e, "failed to encode control frame"),
    }
}
