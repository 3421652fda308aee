//! Line format of the pixelport socket.
//!
//! Outbound: `<channel_id> <pon payload>`
//! Inbound:  `<channel_id> <status> <pon body>`
//!
//! One message per line. Payload line breaks are flattened to spaces before
//! sending; an empty inbound body decodes as `Nil`.

use std::fmt;

use pon::Pon;

use crate::error::ClientError;

/// Correlation id for one request or stream.
pub type ChannelId = u64;

/// Name of the remote command that tears down a stream.
pub const CLOSE_STREAM_CALL: &str = "close_stream";

/// Status word of an inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// `err`, and anything else that is not `ok`.
    Err,
}

impl Status {
    #[must_use]
    pub fn from_word(word: &str) -> Self {
        if word == "ok" { Self::Ok } else { Self::Err }
    }

    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Err => "err",
        })
    }
}

/// One inbound line split into its three parts. `body` is unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inbound<'a> {
    pub channel_id: ChannelId,
    pub status: Status,
    pub body: &'a str,
}

/// Split an inbound line into `(channel_id, status, body)`.
///
/// # Errors
///
/// Returns [`ClientError::Wire`] when the id is missing or not a positive
/// integer, or the status word is missing.
pub fn parse_inbound(line: &str) -> Result<Inbound<'_>, ClientError> {
    let line = line.trim_end_matches('\r').trim_start();
    let (id_text, rest) = split_word(line);
    if id_text.is_empty() {
        return Err(ClientError::Wire("empty line".into()));
    }
    let channel_id = id_text
        .parse::<ChannelId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ClientError::Wire(format!("bad channel id '{id_text}'")))?;

    let (status_text, body) = split_word(rest.trim_start());
    if status_text.is_empty() {
        return Err(ClientError::Wire(format!("missing status for channel {channel_id}")));
    }

    Ok(Inbound { channel_id, status: Status::from_word(status_text), body: body.trim() })
}

fn split_word(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(at) => (&s[..at], &s[at..]),
        None => (s, ""),
    }
}

/// Decode an inbound body. Empty text is `Nil`.
///
/// # Errors
///
/// Returns [`ClientError::MalformedInput`] when the body is not valid Pon.
pub fn decode_body(body: &str) -> Result<Pon, ClientError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Pon::Nil);
    }
    Ok(pon::parse(body)?)
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// What a caller hands to `request` / `subscribe`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A value, serialized with `pon::stringify` on send.
    Pon(Pon),
    /// Text that is already Pon. Sent as-is, without validation.
    Text(String),
}

impl Payload {
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Pon(value) => pon::stringify(value),
            Self::Text(text) => text.clone(),
        }
    }
}

impl From<Pon> for Payload {
    fn from(value: Pon) -> Self {
        Self::Pon(value)
    }
}

impl From<&Pon> for Payload {
    fn from(value: &Pon) -> Self {
        Self::Pon(value.clone())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Render one outbound line, without the trailing newline.
#[must_use]
pub fn format_request(channel_id: ChannelId, payload: &Payload) -> String {
    let text = payload.to_text();
    let flat: String = text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }).collect();
    format!("{channel_id} {flat}")
}

/// Payload asking the remote to stop stream `stream_id`.
#[must_use]
pub fn close_stream_payload(stream_id: ChannelId) -> Payload {
    let arg = Pon::map([("channel_id", Pon::string(stream_id.to_string()))]);
    Payload::Pon(Pon::call(CLOSE_STREAM_CALL, arg))
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
