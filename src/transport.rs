//! Line transport: one TCP connection, framed into text lines.
//!
//! DESIGN
//! ======
//! A supervisor task owns the socket. Each connection runs a `select!` loop:
//! - inbound line -> split -> route through the channel table
//! - outbound line from the writer queue -> socket
//! - shutdown token -> stop for good
//!
//! Inbound lines are routed one at a time, in arrival order, before the next
//! line is read.
//!
//! LIFECYCLE
//! =========
//! 1. `open` connects, installs the writer queue, state = Connected
//! 2. Connection ends (EOF, socket error, shutdown) -> teardown: writer
//!    removed, every waiter failed with `ConnectionLost`, state = Disconnected
//! 3. Reconnect enabled -> Reconnecting, back off, connect, Connected again
//! 4. Retries exhausted -> `GaveUp`, stays Disconnected

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::channel::ChannelTable;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::wire::{self, ChannelId};

const EVENT_CAPACITY: usize = 64;

// =============================================================================
// STATE AND EVENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Connection lifecycle notifications, fanned out to every `events()` receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// First connection established.
    Connected,
    /// About to wait `delay` before reconnect attempt `attempt`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Reconnect attempt `attempt` succeeded.
    Reconnected { attempt: u32 },
    /// The connection dropped. Pending waiters have been failed.
    Disconnected,
    /// Socket-level problem; the text is the underlying error.
    SocketError(String),
    /// Reconnect retries are exhausted.
    GaveUp,
}

pub(crate) struct Inner {
    pub channels: ChannelTable,
    /// Present only while Connected.
    pub writer: Option<mpsc::UnboundedSender<String>>,
}

/// State shared by the client handle and the supervisor task.
pub(crate) struct Shared {
    inner: Mutex<Inner>,
    state: watch::Sender<ConnectionState>,
    events: broadcast::Sender<ConnectionEvent>,
    pub shutdown: CancellationToken,
}

impl Shared {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner { channels: ChannelTable::new(), writer: None }),
            state,
            events,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: ConnectionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub fn emit_connected(&self) {
        self.emit(ConnectionEvent::Connected);
    }

    /// Split one inbound line and hand it to the channel table.
    fn handle_line(&self, line: &str) {
        trace!(line, "transport: recv");
        let inbound = match wire::parse_inbound(line) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "transport: dropping malformed line");
                return;
            }
        };
        let mut inner = self.lock();
        match inner.channels.dispatch(inbound.channel_id, inbound.status, inbound.body) {
            Ok(()) => debug!(channel_id = inbound.channel_id, status = %inbound.status, "transport: dispatched"),
            Err(e) => debug!(error = %e, "transport: dropped response"),
        }
    }

    /// Fail the waiter behind a line that could not be decoded as text.
    fn reject_line(&self, channel_id: Option<ChannelId>) {
        warn!(?channel_id, "transport: dropping line that is not valid utf-8");
        let Some(id) = channel_id else {
            return;
        };
        let error = ClientError::Wire(format!("line for channel {id} is not valid utf-8"));
        if !self.lock().channels.reject(id, error) {
            debug!(channel_id = id, "transport: no waiter for invalid line");
        }
    }

    /// Drop the writer and fail every waiter.
    fn teardown(&self) {
        let failed = {
            let mut inner = self.lock();
            inner.writer = None;
            inner.channels.fail_all()
        };
        self.set_state(ConnectionState::Disconnected);
        self.emit(ConnectionEvent::Disconnected);
        info!(failed, "transport: disconnected");
    }
}

// =============================================================================
// LINE CODEC
// =============================================================================

/// One decoded inbound frame.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Text(String),
    /// A line past the length cap; its bytes are skipped.
    Oversized,
    /// A complete line that is not UTF-8. Carries its channel id when the
    /// leading digits could still be read.
    Invalid(Option<ChannelId>),
}

/// `LinesCodec` that reports bad lines as items instead of errors, so the
/// read half keeps going after one.
struct InboundCodec {
    lines: LinesCodec,
    /// Set after an oversized line until the next line is delivered; the
    /// front of the buffer may still be the skipped line's tail.
    skipping: bool,
}

impl InboundCodec {
    fn new(max_line_bytes: usize) -> Self {
        Self { lines: LinesCodec::new_with_max_length(max_line_bytes), skipping: false }
    }

    fn next_line(&mut self, src: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        // The inner codec splits a line off the front of `src` before it
        // checks the encoding, so the id has to be read first.
        let channel_id = if self.skipping { None } else { leading_channel_id(src) };
        let line = match self.lines.decode(src) {
            Ok(None) => return Ok(None),
            Ok(Some(text)) => Line::Text(text),
            Err(LinesCodecError::MaxLineLengthExceeded) => Line::Oversized,
            Err(LinesCodecError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => Line::Invalid(channel_id),
            Err(e) => return Err(e),
        };
        self.skipping = line == Line::Oversized;
        Ok(Some(line))
    }
}

/// Digits before the first space of `src`, if they form a channel id.
fn leading_channel_id(src: &[u8]) -> Option<ChannelId> {
    // u64::MAX has 20 digits.
    let end = src.iter().take(21).position(|&b| b == b' ')?;
    let digits = std::str::from_utf8(&src[..end]).ok()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl Decoder for InboundCodec {
    type Item = Line;
    type Error = LinesCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        self.next_line(src)
    }

    /// Only newline-terminated lines are delivered. A fragment left when the
    /// socket closes is discarded.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        let line = self.next_line(src)?;
        if line.is_none() && !src.is_empty() {
            warn!(
                bytes = src.len(),
                fragment = %String::from_utf8_lossy(&src[..src.len().min(64)]),
                "transport: discarding unterminated line at eof"
            );
            src.clear();
        }
        Ok(line)
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

/// One live socket plus the queue feeding its write half.
pub(crate) struct Session {
    lines: FramedRead<OwnedReadHalf, InboundCodec>,
    sink: FramedWrite<OwnedWriteHalf, LinesCodec>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl Session {
    /// Wrap `stream` and publish its writer queue. State becomes Connected.
    pub fn attach(shared: &Shared, stream: TcpStream, max_line_bytes: usize) -> Self {
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();
        let (tx, outbound) = mpsc::unbounded_channel();
        shared.lock().writer = Some(tx);
        shared.set_state(ConnectionState::Connected);
        Self {
            lines: FramedRead::new(read_half, InboundCodec::new(max_line_bytes)),
            sink: FramedWrite::new(write_half, LinesCodec::new()),
            outbound,
        }
    }

    /// Relay lines until the socket closes, fails, or shutdown is requested.
    async fn run(mut self, shared: &Shared) {
        loop {
            tokio::select! {
                () = shared.shutdown.cancelled() => break,
                frame = self.lines.next() => match frame {
                    Some(Ok(Line::Text(line))) => shared.handle_line(&line),
                    Some(Ok(Line::Oversized)) => {
                        warn!("transport: discarding oversized line");
                        shared.emit(ConnectionEvent::SocketError("inbound line exceeds max length".into()));
                    }
                    Some(Ok(Line::Invalid(channel_id))) => shared.reject_line(channel_id),
                    Some(Err(e)) => {
                        warn!(error = %e, "transport: read failed");
                        shared.emit(ConnectionEvent::SocketError(e.to_string()));
                        break;
                    }
                    None => {
                        info!("transport: remote closed connection");
                        break;
                    }
                },
                Some(line) = self.outbound.recv() => {
                    trace!(line = %line, "transport: send");
                    if let Err(e) = self.sink.send(line).await {
                        warn!(error = %e, "transport: write failed");
                        shared.emit(ConnectionEvent::SocketError(e.to_string()));
                        break;
                    }
                }
            }
        }
    }
}

/// Connect to `address`, moving the state to Connecting first.
///
/// # Errors
///
/// Returns [`ClientError::Transport`] when the socket cannot be opened.
pub(crate) async fn open(shared: &Shared, address: &str) -> Result<TcpStream, ClientError> {
    shared.set_state(ConnectionState::Connecting);
    match TcpStream::connect(address).await {
        Ok(stream) => Ok(stream),
        Err(e) => {
            shared.set_state(ConnectionState::Disconnected);
            warn!(%address, error = %e, "transport: connect failed");
            Err(ClientError::Transport(e))
        }
    }
}

/// Serve `session`, then reconnect per policy until shutdown or give-up.
pub(crate) async fn supervise(shared: Arc<Shared>, config: ClientConfig, session: Session) {
    let mut session = session;
    loop {
        session.run(&shared).await;
        shared.teardown();

        if shared.shutdown.is_cancelled() {
            info!("transport: shut down");
            return;
        }
        match reconnect(&shared, &config).await {
            Some(next) => session = next,
            None => {
                shared.set_state(ConnectionState::Disconnected);
                return;
            }
        }
    }
}

async fn reconnect(shared: &Shared, config: &ClientConfig) -> Option<Session> {
    if !config.reconnect.is_enabled() {
        return None;
    }
    let mut attempt = 0_u32;
    loop {
        attempt = attempt.saturating_add(1);
        let Some(delay) = config.reconnect.next_delay(attempt) else {
            warn!(attempts = attempt - 1, "transport: giving up on reconnect");
            shared.set_state(ConnectionState::Disconnected);
            shared.emit(ConnectionEvent::GaveUp);
            return None;
        };

        shared.set_state(ConnectionState::Reconnecting);
        shared.emit(ConnectionEvent::Reconnecting { attempt, delay });
        info!(attempt, delay_ms = delay.as_millis(), "transport: reconnecting");

        tokio::select! {
            () = shared.shutdown.cancelled() => return None,
            () = tokio::time::sleep(delay) => {}
        }

        let connected = tokio::select! {
            () = shared.shutdown.cancelled() => return None,
            result = TcpStream::connect(config.address.as_str()) => result,
        };
        match connected {
            Ok(stream) => {
                let session = Session::attach(shared, stream, config.max_line_bytes);
                shared.emit(ConnectionEvent::Reconnected { attempt });
                info!(attempt, address = %config.address, "transport: reconnected");
                return Some(session);
            }
            Err(e) => {
                warn!(attempt, error = %e, "transport: reconnect attempt failed");
                shared.emit(ConnectionEvent::SocketError(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
