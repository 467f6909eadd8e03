//! Telephony side of the bridge: the media-stream protocol and the call-control
//! markup that points an incoming call at the media-stream route.

pub mod messages;
mod twiml;

pub use messages::{MediaPayload, StreamStart, TelephonyCommand, TelephonyEvent};
pub use twiml::{MEDIA_STREAM_SEGMENT, build_connect_response, media_stream_url};
