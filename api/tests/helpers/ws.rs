use axum::Router;
use futures_util::StreamExt;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::client::IntoClientRequest,
    tungstenite::protocol::Message,
};
use url::Url;

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawns the app on a random local port.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Opens `/ws` and consumes the `ready` frame.
pub async fn connect_ws(addr: SocketAddr) -> (Ws, String) {
    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    let req = url.as_str().into_client_request().unwrap();
    let (mut ws, _) = connect_async(req).await.unwrap();

    let ready = next_json(&mut ws).await.expect("ready frame");
    assert_eq!(ready["type"], "ready");
    let conn = ready["connection_id"].as_str().unwrap().to_owned();
    (ws, conn)
}

/// Next text frame as JSON, or `None` if nothing arrives within 300ms.
pub async fn next_json(ws: &mut Ws) -> Option<Value> {
    loop {
        match tokio::time::timeout(Duration::from_millis(300), ws.next()).await {
            Ok(Some(Ok(Message::Text(txt)))) => return Some(serde_json::from_str(&txt).unwrap()),
            Ok(Some(Ok(_))) => continue,
            _ => return None,
        }
    }
}
