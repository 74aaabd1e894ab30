use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures_util::stream::SplitSink;
use futures_util::{future, SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::Envelope;
use crate::utils::ip::client_ip;
use crate::ws::session::SessionEngine;
use crate::ws::transport::{ClientSink, TransportError};
use crate::AppState;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(app): State<Arc<AppState>>,
) -> Response {
    info!("New WebSocket connection attempt from {}", addr);
    ws.on_upgrade(move |socket| handle_socket(socket, addr, app))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, addr: SocketAddr, app: Arc<AppState>) {
    // The write half is shared between this session and the dispatcher.
    let (sender, receiver) = socket.split();
    let sink = Arc::new(WsSink {
        sender: Mutex::new(sender),
    });

    let frames = Box::pin(receiver.filter_map(|msg| future::ready(inbound(msg))));
    let engine = SessionEngine::connect(app, client_ip(&addr), sink).await;
    engine.run(frames).await;
    info!("WebSocket connection from {} terminated", addr);
}

/// Map a websocket message onto a text frame. Ping/pong are skipped.
fn inbound(msg: Result<Message, axum::Error>) -> Option<Result<String, TransportError>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(text)),
        Ok(Message::Binary(_)) => Some(Err(TransportError::UnexpectedBinary)),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Ok(Message::Close(_)) => Some(Err(TransportError::Closed)),
        Err(e) => Some(Err(TransportError::WebSocket(e.to_string()))),
    }
}

struct WsSink {
    sender: Mutex<SplitSink<WebSocket, Message>>,
}

#[async_trait]
impl ClientSink for WsSink {
    async fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let text = serde_json::to_string(envelope)?;
        self.sender
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn close(&self) {
        if let Err(e) = self.sender.lock().await.close().await {
            debug!("Closing websocket failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_websocket_messages_to_frames() {
        assert_eq!(inbound(Ok(Message::Text("hi".to_string()))).unwrap().unwrap(), "hi");
        assert!(inbound(Ok(Message::Ping(vec![1]))).is_none());
        assert!(inbound(Ok(Message::Pong(vec![1]))).is_none());
        assert!(matches!(inbound(Ok(Message::Binary(vec![0]))), Some(Err(TransportError::UnexpectedBinary))));
        assert!(matches!(inbound(Ok(Message::Close(None))), Some(Err(TransportError::Closed))));
    }
}
