//! WebSocket Mock Server for the realtime model
//!
//! Accepts connections the way the model endpoint does and hands each one to the
//! test as a pair of JSON channels, so tests can script the model's side.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// One accepted model connection.
pub struct MockModelConnection {
    /// `Authorization` header sent during the handshake
    pub authorization: Option<String>,
    /// Request path and query
    pub uri: String,
    events: mpsc::UnboundedReceiver<Value>,
    frames: mpsc::UnboundedSender<Value>,
}

impl MockModelConnection {
    /// Next client event, or `None` once the bridge closed the socket.
    pub async fn next_event(&mut self) -> Option<Value> {
        timeout(RECV_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for a client event")
    }

    /// Next client event of the given `type`, skipping others.
    pub async fn expect_event(&mut self, event_type: &str) -> Value {
        loop {
            let event = self
                .next_event()
                .await
                .unwrap_or_else(|| panic!("connection closed while waiting for {event_type}"));
            if event["type"] == event_type {
                return event;
            }
        }
    }

    /// Send a server event to the bridge.
    pub fn send(&self, event: Value) {
        self.frames.send(event).expect("mock connection task ended");
    }
}

/// Realtime model mock listening on a random local port.
pub struct MockRealtimeServer {
    pub url: String,
    connections: mpsc::UnboundedReceiver<MockModelConnection>,
}

impl MockRealtimeServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (conn_tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let conn_tx = conn_tx.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, conn_tx).await;
                });
            }
        });

        Self {
            url: format!("ws://{addr}/v1/realtime"),
            connections,
        }
    }

    /// Wait for the bridge to open a model connection.
    pub async fn accept(&mut self) -> MockModelConnection {
        timeout(RECV_TIMEOUT, self.connections.recv())
            .await
            .expect("timed out waiting for a model connection")
            .expect("mock server stopped")
    }
}

async fn handle_connection(
    stream: TcpStream,
    conn_tx: mpsc::UnboundedSender<MockModelConnection>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let handshake: Arc<Mutex<(Option<String>, String)>> = Arc::new(Mutex::new((None, String::new())));
    let captured = handshake.clone();
    let ws_stream = accept_hdr_async(stream, move |req: &Request, resp: Response| {
        let mut captured = captured.lock().unwrap();
        captured.0 = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.1 = req.uri().to_string();
        Ok(resp)
    })
    .await?;
    let (mut write, mut read) = ws_stream.split();

    let (events_tx, events) = mpsc::unbounded_channel();
    let (frames, mut frames_rx) = mpsc::unbounded_channel::<Value>();
    let (authorization, uri) = handshake.lock().unwrap().clone();
    let connection = MockModelConnection {
        authorization,
        uri,
        events,
        frames,
    };
    if conn_tx.send(connection).is_err() {
        return Ok(());
    }

    loop {
        tokio::select! {
            frame = frames_rx.recv() => match frame {
                Some(event) => write.send(Message::Text(event.to_string().into())).await?,
                None => break,
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(event) = serde_json::from_str::<Value>(text.as_str()) {
                        let _ = events_tx.send(event);
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    Ok(())
}
