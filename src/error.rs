//! Error type shared by every client operation.

use pon::{Pon, PonError};

use crate::wire::ChannelId;

/// Error returned by client operations and delivered to waiters.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A Pon body (or payload) failed to parse.
    #[error("malformed pon: {0}")]
    MalformedInput(#[from] PonError),
    /// An inbound line did not have the `<id> <status> <body>` shape.
    #[error("malformed line: {0}")]
    Wire(String),
    /// A response arrived for a channel with no registered waiter.
    #[error("no waiter for channel {0}")]
    UnknownChannel(ChannelId),
    /// The remote answered with a non-`ok` status.
    ///
    /// `message` is the raw body text; `body` is set when that text is valid Pon.
    #[error("remote operation failed: {message}")]
    RemoteOperationFailed { message: String, body: Option<Pon> },
    /// A write was attempted while the connection is not established.
    #[error("not connected")]
    NotConnected,
    /// Socket-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    /// The connection dropped before the channel completed.
    #[error("connection lost")]
    ConnectionLost,
    /// A stream ended before producing the awaited message.
    #[error("stream {0} closed")]
    StreamClosed(ChannelId),
    /// Invalid client configuration.
    #[error("invalid config: {0}")]
    Config(String),
}

impl ClientError {
    /// Build the error for an `err` response body.
    pub(crate) fn remote(body_text: &str) -> Self {
        let message = body_text.trim().to_owned();
        let body = pon::parse(&message).ok();
        Self::RemoteOperationFailed { message, body }
    }

    /// True for errors caused by the connection going away.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::NotConnected | Self::ConnectionLost | Self::Transport(_))
    }
}
