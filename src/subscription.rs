//! Handle for a long-lived response stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use pon::Pon;
use tokio::sync::mpsc;

use crate::client::Client;
use crate::error::ClientError;
use crate::wire::ChannelId;

/// Notification delivered to a [`Subscription`].
#[derive(Debug)]
pub enum StreamEvent {
    /// One `ok` response body.
    Message(Pon),
    /// The stream failed. Nothing follows.
    Error(ClientError),
    /// The remote acknowledged `close`. Nothing follows.
    Closed,
}

/// Open stream returned by [`Client::subscribe`].
///
/// Yields [`StreamEvent`]s in arrival order, either through [`Subscription::next`]
/// or as a `futures` [`Stream`]. Dropping an open subscription sends the close
/// command without waiting for the acknowledgement.
pub struct Subscription {
    id: ChannelId,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    client: Client,
}

impl Subscription {
    pub(crate) fn new(id: ChannelId, events: mpsc::UnboundedReceiver<StreamEvent>, client: Client) -> Self {
        Self { id, events, client }
    }

    #[must_use]
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// True until the stream errors, is closed, or the connection drops.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.client.has_stream(self.id)
    }

    /// Next event, or `None` once the stream has ended and been drained.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Next message body, turning `Error` into `Err` and the end of the
    /// stream into `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the error the stream ended with.
    pub async fn next_message(&mut self) -> Result<Option<Pon>, ClientError> {
        match self.events.recv().await {
            Some(StreamEvent::Message(value)) => Ok(Some(value)),
            Some(StreamEvent::Error(e)) => Err(e),
            Some(StreamEvent::Closed) | None => Ok(None),
        }
    }

    /// Ask the remote to stop the stream and wait for its acknowledgement.
    ///
    /// Messages read before the acknowledgement are still queued, followed
    /// by `Closed`; lines for this stream read after it are dropped. Closing
    /// an already-ended stream is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the error of the close request itself. The local registration
    /// is removed either way.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        if !self.client.has_stream(self.id) {
            return Ok(());
        }
        let ack = self.client.close_stream(self.id).await;
        // Covers a close request that never got an acknowledgement.
        self.client.finish_stream(self.id);
        ack.map(|_| ())
    }
}

impl Stream for Subscription {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamEvent>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.client.abandon_stream(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}
