//! Channel table: id allocation and routing of inbound lines to waiters.
//!
//! DESIGN
//! ======
//! Every outbound request gets a fresh channel id. The table maps that id to
//! a waiter:
//! - single-shot: a `oneshot` resolved by the first response, then removed
//! - stream: an unbounded queue that receives every response until the
//!   stream errors or is closed
//! - close ack: a single-shot for a `close_stream` request; its response
//!   also ends the stream it names, under the same lock, so no stream line
//!   read after the ack is delivered
//!
//! Delivery never blocks, so a slow consumer cannot stall dispatch of the
//! next line. The id counter lives for the whole client and is not reset
//! when the connection is re-established.

use std::collections::HashMap;

use pon::Pon;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::ClientError;
use crate::subscription::StreamEvent;
use crate::wire::{self, ChannelId, Status};

pub(crate) type SingleShotTx = oneshot::Sender<Result<Pon, ClientError>>;
pub(crate) type StreamTx = mpsc::UnboundedSender<StreamEvent>;

enum Waiter {
    SingleShot(SingleShotTx),
    Stream(StreamTx),
    CloseAck { stream: ChannelId, tx: SingleShotTx },
}

#[derive(Default)]
pub struct ChannelTable {
    last_id: ChannelId,
    waiters: HashMap<ChannelId, Waiter>,
}

impl ChannelTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next channel id. Starts at 1 and only grows.
    pub fn allocate_id(&mut self) -> ChannelId {
        self.last_id += 1;
        self.last_id
    }

    pub(crate) fn register_single_shot(&mut self, id: ChannelId, tx: SingleShotTx) {
        self.waiters.insert(id, Waiter::SingleShot(tx));
    }

    pub(crate) fn register_stream(&mut self, id: ChannelId, tx: StreamTx) {
        self.waiters.insert(id, Waiter::Stream(tx));
    }

    /// Register the request closing `stream`. Its response, `ok` or `err`,
    /// ends the stream with `Closed`.
    pub(crate) fn register_close_ack(&mut self, id: ChannelId, stream: ChannelId, tx: SingleShotTx) {
        self.waiters.insert(id, Waiter::CloseAck { stream, tx });
    }

    /// Drop a registration without notifying its waiter.
    pub fn remove(&mut self, id: ChannelId) -> bool {
        self.waiters.remove(&id).is_some()
    }

    #[must_use]
    pub fn contains(&self, id: ChannelId) -> bool {
        self.waiters.contains_key(&id)
    }

    #[must_use]
    pub fn is_stream(&self, id: ChannelId) -> bool {
        matches!(self.waiters.get(&id), Some(Waiter::Stream(_)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Route one inbound response to its waiter.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownChannel`] when nothing is registered
    /// under `id`. The line is dropped; callers treat this as informational.
    pub fn dispatch(&mut self, id: ChannelId, status: Status, body: &str) -> Result<(), ClientError> {
        let Some(waiter) = self.waiters.remove(&id) else {
            return Err(ClientError::UnknownChannel(id));
        };
        match waiter {
            Waiter::SingleShot(tx) => {
                if tx.send(single_shot_result(status, body)).is_err() {
                    debug!(channel_id = id, "channel: request waiter went away");
                }
            }
            Waiter::CloseAck { stream, tx } => {
                self.close_stream_local(stream);
                if tx.send(single_shot_result(status, body)).is_err() {
                    debug!(channel_id = id, stream, "channel: close waiter went away");
                }
            }
            Waiter::Stream(tx) => {
                let event = if status.is_ok() {
                    match wire::decode_body(body) {
                        Ok(value) => StreamEvent::Message(value),
                        Err(e) => StreamEvent::Error(e),
                    }
                } else {
                    StreamEvent::Error(ClientError::remote(body))
                };
                let terminal = matches!(event, StreamEvent::Error(_));
                if tx.send(event).is_err() {
                    debug!(channel_id = id, "channel: stream receiver dropped");
                } else if !terminal {
                    self.waiters.insert(id, Waiter::Stream(tx));
                }
            }
        }
        Ok(())
    }

    /// Fail the waiter under `id` with `error` and forget it.
    ///
    /// Returns false when nothing is registered under `id`.
    pub fn reject(&mut self, id: ChannelId, error: ClientError) -> bool {
        let Some(waiter) = self.waiters.remove(&id) else {
            return false;
        };
        match waiter {
            Waiter::SingleShot(tx) | Waiter::CloseAck { tx, .. } => {
                let _ = tx.send(Err(error));
            }
            Waiter::Stream(tx) => {
                let _ = tx.send(StreamEvent::Error(error));
            }
        }
        true
    }

    /// Deliver `Closed` to a stream and forget it.
    pub fn close_stream_local(&mut self, id: ChannelId) {
        if let Some(Waiter::Stream(tx)) = self.waiters.remove(&id) {
            let _ = tx.send(StreamEvent::Closed);
        }
    }

    /// Fail every registered waiter with `ConnectionLost` and empty the table.
    ///
    /// Returns how many waiters were failed.
    pub fn fail_all(&mut self) -> usize {
        let count = self.waiters.len();
        for (_, waiter) in self.waiters.drain() {
            match waiter {
                Waiter::SingleShot(tx) | Waiter::CloseAck { tx, .. } => {
                    let _ = tx.send(Err(ClientError::ConnectionLost));
                }
                Waiter::Stream(tx) => {
                    let _ = tx.send(StreamEvent::Error(ClientError::ConnectionLost));
                }
            }
        }
        count
    }
}

fn single_shot_result(status: Status, body: &str) -> Result<Pon, ClientError> {
    if status.is_ok() { wire::decode_body(body) } else { Err(ClientError::remote(body)) }
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
