//! JSON frame codec shared by the telephony and model connections.
//!
//! Both connections speak JSON text frames. Decoding never fails loudly: a frame
//! that cannot be parsed is reported as `None` and the caller drops it. Sending is
//! best-effort: a connection that is no longer open silently swallows the frame.
//!
//! Each live connection is represented by an [`Outbound`] handle that feeds a
//! writer task through a bounded channel. The handle and the writer task share an
//! `open` flag so either side can observe closure without locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{error, trace};

/// Frame queued for a connection writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// JSON text frame
    Text(String),
    /// Close the underlying socket
    Close,
}

/// Sending half of a connection.
///
/// Cloning is cheap; all clones share the same open flag.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<OutboundFrame>,
    open: Arc<AtomicBool>,
}

/// Receiving half drained by a connection writer task.
#[derive(Debug)]
pub struct OutboundReceiver {
    rx: mpsc::Receiver<OutboundFrame>,
    open: Arc<AtomicBool>,
}

impl Outbound {
    /// Create an open connection handle and the receiver for its writer task.
    pub fn channel(capacity: usize) -> (Outbound, OutboundReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        let open = Arc::new(AtomicBool::new(true));
        (
            Outbound {
                tx,
                open: open.clone(),
            },
            OutboundReceiver { rx, open },
        )
    }

    /// Whether frames sent now can still reach the socket.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.tx.is_closed()
    }

    /// Close the connection. Idempotent.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            // The writer may already be gone; nothing left to close then.
            let _ = self.tx.try_send(OutboundFrame::Close);
        }
    }
}

impl OutboundReceiver {
    /// Next frame to write, or `None` once every handle is dropped.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        self.rx.recv().await
    }

    /// Record that the socket can no longer be written to.
    pub fn mark_closed(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        self.rx.close();
    }
}

/// Parse a text frame. Returns `None` on any parse failure.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(message) => Some(message),
        Err(e) => {
            trace!("Dropping undecodable frame: {}", e);
            None
        }
    }
}

/// Text carried by a binary frame. Returns `None` when it is not UTF-8.
pub fn binary_text(data: &[u8]) -> Option<String> {
    match std::str::from_utf8(data) {
        Ok(text) => Some(text.to_owned()),
        Err(_) => {
            trace!("Dropping non UTF-8 binary frame");
            None
        }
    }
}

/// Serialize a message into a text frame.
pub fn encode<T: Serialize + ?Sized>(message: &T) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(frame) => Some(frame),
        Err(e) => {
            error!("Failed to serialize outgoing frame: {}", e);
            None
        }
    }
}

/// Encode and transmit a message if the connection is open.
///
/// Never fails: a closed connection turns this into a no-op.
pub async fn send<T: Serialize + ?Sized>(link: &Outbound, message: &T) {
    if !link.is_open() {
        trace!("Connection not open, dropping outgoing frame");
        return;
    }

    let Some(frame) = encode(message) else {
        return;
    };

    if link.tx.send(OutboundFrame::Text(frame)).await.is_err() {
        // Writer task exited between the check and the send.
        link.open.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_decode_valid_json() {
        let value: Option<Value> = decode(r#"{"event":"media"}"#);
        assert_eq!(value, Some(json!({"event": "media"})));
    }

    #[test]
    fn test_decode_invalid_json_returns_none() {
        assert!(decode::<Value>("{not json").is_none());
        assert!(decode::<Value>("").is_none());
    }

    #[test]
    fn test_binary_text_rejects_invalid_utf8() {
        assert!(binary_text(&[0xff, 0xfe, 0x00]).is_none());
        assert_eq!(binary_text(br#"{"a":1}"#).as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_encode() {
        assert_eq!(
            encode(&json!({"type": "response.create"})).as_deref(),
            Some(r#"{"type":"response.create"}"#)
        );
    }

    #[tokio::test]
    async fn test_send_on_open_connection() {
        let (link, mut rx) = Outbound::channel(4);
        send(&link, &json!({"event": "mark"})).await;

        assert_eq!(
            rx.recv().await,
            Some(OutboundFrame::Text(r#"{"event":"mark"}"#.to_string()))
        );
    }

    #[tokio::test]
    async fn test_send_on_closed_connection_is_noop() {
        let (link, mut rx) = Outbound::channel(4);
        link.close();
        assert!(!link.is_open());

        // Only the close marker is queued.
        assert_eq!(rx.recv().await, Some(OutboundFrame::Close));

        send(&link, &json!({"type": "input_audio_buffer.append", "audio": "AAAA"})).await;
        send(&link, &json!({"type": "response.create"})).await;

        assert!(!link.is_open());
        assert!(rx.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_after_writer_dropped() {
        let (link, rx) = Outbound::channel(4);
        drop(rx);

        assert!(!link.is_open());
        send(&link, &json!({"type": "response.create"})).await;
        assert!(!link.is_open());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (link, mut rx) = Outbound::channel(4);
        link.close();
        link.close();

        assert_eq!(rx.recv().await, Some(OutboundFrame::Close));
        drop(link);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_mark_closed_visible_to_handle() {
        let (link, mut rx) = Outbound::channel(4);
        rx.mark_closed();
        assert!(!link.is_open());
    }
}
