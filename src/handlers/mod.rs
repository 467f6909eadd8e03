//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check and fallback
//! - `incoming_call` - Call webhook answering with TwiML
//! - `media_stream` - Telephony media-stream WebSocket bridged to the model

pub mod api;
pub mod incoming_call;
pub mod media_stream;

pub use incoming_call::incoming_call_handler;
pub use media_stream::media_stream_handler;
