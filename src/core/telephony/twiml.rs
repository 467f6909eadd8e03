//! Call-control markup returned to the telephony platform when a call arrives.

/// Path marker identifying the call-audio route.
pub const MEDIA_STREAM_SEGMENT: &str = "media-stream";

/// Build the stream URL a call should connect its audio to.
pub fn media_stream_url(host: &str, agent: &str, routing_key: &str) -> String {
    format!("wss://{host}/agents/{agent}/{routing_key}/{MEDIA_STREAM_SEGMENT}")
}

/// Build the TwiML document instructing the platform to open a bidirectional
/// media stream back to this server.
pub fn build_connect_response(host: &str, agent: &str, routing_key: &str) -> String {
    let url = escape_attribute(&media_stream_url(host, agent, routing_key));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
    <Say>Connected</Say>
    <Connect>
        <Stream url="{url}" />
    </Connect>
</Response>"#
    )
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
