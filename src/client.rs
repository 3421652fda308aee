//! Request / subscribe facade over one connection.

use std::sync::{Arc, Mutex};

use pon::Pon;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::subscription::{StreamEvent, Subscription};
use crate::transport::{self, ConnectionEvent, ConnectionState, Session, Shared};
use crate::wire::{self, ChannelId, Payload};

/// Cheap-to-clone handle to one connection and its channel table.
///
/// The connection stays up while any clone (or any [`Subscription`]) is
/// alive, or until [`Client::shutdown`].
#[derive(Clone)]
pub struct Client {
    handle: Arc<Handle>,
}

struct Handle {
    config: ClientConfig,
    shared: Arc<Shared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl Client {
    /// Build a client without connecting. Subscribe to [`Client::events`]
    /// before [`Client::open`] to observe the initial `Connected`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            handle: Arc::new(Handle { config, shared: Arc::new(Shared::new()), supervisor: Mutex::new(None) }),
        }
    }

    /// Build a client and open its connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the first connection attempt
    /// fails. Reconnection only applies to connections that were once up.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Self::new(config);
        client.open().await?;
        Ok(client)
    }

    /// Open the connection and start the supervisor task. No-op when
    /// already running.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the socket cannot be opened,
    /// or [`ClientError::NotConnected`] after [`Client::shutdown`].
    pub async fn open(&self) -> Result<(), ClientError> {
        let shared = &self.handle.shared;
        if shared.shutdown.is_cancelled() {
            return Err(ClientError::NotConnected);
        }
        if self.lock_supervisor().as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }

        let config = &self.handle.config;
        let stream = transport::open(shared, &config.address).await?;
        let session = Session::attach(shared, stream, config.max_line_bytes);
        shared.emit_connected();
        info!(address = %config.address, "client: connected");

        let task = tokio::spawn(transport::supervise(Arc::clone(shared), config.clone(), session));
        *self.lock_supervisor() = Some(task);
        Ok(())
    }

    /// Send one request and wait for its response.
    ///
    /// `payload` is a [`Pon`] value or pre-serialized Pon text.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] when no connection is up
    /// - [`ClientError::RemoteOperationFailed`] for an `err` response
    /// - [`ClientError::MalformedInput`] when the response body is not Pon
    /// - [`ClientError::ConnectionLost`] when the connection drops first
    pub async fn request(&self, payload: impl Into<Payload>) -> Result<Pon, ClientError> {
        self.send_single_shot(&payload.into(), None).await
    }

    /// Open a stream. Every response on its channel arrives as a
    /// [`StreamEvent`] until it errors or is closed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] when no connection is up.
    pub fn subscribe(&self, payload: impl Into<Payload>) -> Result<Subscription, ClientError> {
        let payload = payload.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.handle.shared.lock();
            let writer = inner.writer.clone().ok_or(ClientError::NotConnected)?;
            let id = inner.channels.allocate_id();
            inner.channels.register_stream(id, tx);
            if writer.send(wire::format_request(id, &payload)).is_err() {
                inner.channels.remove(id);
                return Err(ClientError::NotConnected);
            }
            id
        };
        debug!(channel_id = id, "client: stream opened");
        Ok(Subscription::new(id, rx, self.clone()))
    }

    /// Subscribe, return the first message matching `predicate`, and close.
    ///
    /// # Errors
    ///
    /// Returns the stream's error, or [`ClientError::StreamClosed`] if it
    /// ends before a match.
    pub async fn wait_for<F>(&self, payload: impl Into<Payload>, mut predicate: F) -> Result<Pon, ClientError>
    where
        F: FnMut(&Pon) -> bool,
    {
        // Dropping `subscription` on return sends the close.
        let mut subscription = self.subscribe(payload)?;
        loop {
            match subscription.next().await {
                Some(StreamEvent::Message(value)) if predicate(&value) => return Ok(value),
                Some(StreamEvent::Message(_)) => {}
                Some(StreamEvent::Error(e)) => return Err(e),
                Some(StreamEvent::Closed) | None => return Err(ClientError::StreamClosed(subscription.id())),
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.handle.shared.state()
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.handle.shared.watch_state()
    }

    /// Lifecycle events emitted after this call.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.handle.shared.subscribe_events()
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.handle.config
    }

    /// Close the connection for good. Pending waiters get `ConnectionLost`
    /// and no reconnection is attempted.
    pub async fn shutdown(&self) {
        self.handle.shared.shutdown.cancel();
        let task = self.lock_supervisor().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    pub(crate) fn has_stream(&self, id: ChannelId) -> bool {
        self.handle.shared.lock().channels.is_stream(id)
    }

    /// Send the close command for stream `id` and wait for its
    /// acknowledgement. The stream ends when the acknowledgement is routed.
    pub(crate) async fn close_stream(&self, id: ChannelId) -> Result<Pon, ClientError> {
        self.send_single_shot(&wire::close_stream_payload(id), Some(id)).await
    }

    /// Register a single-shot waiter, write `payload` on its channel, and
    /// wait. `closes` names the stream the request closes, if any.
    async fn send_single_shot(&self, payload: &Payload, closes: Option<ChannelId>) -> Result<Pon, ClientError> {
        let rx = {
            let mut inner = self.handle.shared.lock();
            let writer = inner.writer.clone().ok_or(ClientError::NotConnected)?;
            let id = inner.channels.allocate_id();
            let (tx, rx) = oneshot::channel();
            match closes {
                Some(stream) => inner.channels.register_close_ack(id, stream, tx),
                None => inner.channels.register_single_shot(id, tx),
            }
            if writer.send(wire::format_request(id, payload)).is_err() {
                inner.channels.remove(id);
                return Err(ClientError::NotConnected);
            }
            debug!(channel_id = id, "client: request sent");
            rx
        };
        rx.await.map_err(|_| ClientError::ConnectionLost)?
    }

    pub(crate) fn finish_stream(&self, id: ChannelId) {
        self.handle.shared.lock().channels.close_stream_local(id);
    }

    /// Forget stream `id` and, if connected, send its close command without
    /// waiting for the acknowledgement.
    pub(crate) fn abandon_stream(&self, id: ChannelId) {
        let mut inner = self.handle.shared.lock();
        if !inner.channels.is_stream(id) {
            return;
        }
        inner.channels.remove(id);
        let Some(writer) = inner.writer.clone() else {
            return;
        };
        let close_id = inner.channels.allocate_id();
        // Registered so the acknowledgement is not reported as unknown.
        let (tx, _) = oneshot::channel();
        inner.channels.register_single_shot(close_id, tx);
        if writer.send(wire::format_request(close_id, &wire::close_stream_payload(id))).is_err() {
            inner.channels.remove(close_id);
        }
        debug!(channel_id = id, "client: stream dropped, close sent");
    }

    fn lock_supervisor(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.supervisor.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("address", &self.handle.config.address)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
