//! Client protocol engine for the pixelport line socket.
//!
//! One TCP connection carries many concurrent exchanges. Every request is a
//! single line, `<channel_id> <pon payload>`, and every response is a line
//! `<channel_id> <ok|err> <pon body>`. A [`Client`] allocates the channel
//! ids, writes requests, and routes each response back to whoever is
//! waiting on that id: a single-shot [`Client::request`] or a long-lived
//! [`Subscription`].
//!
//! Payloads and bodies use the Pon notation from the [`pon`] crate.
//!
//! ```no_run
//! # async fn demo() -> Result<(), pixelport::ClientError> {
//! use pixelport::{Client, ClientConfig, StreamEvent};
//!
//! let client = Client::connect(ClientConfig::new("127.0.0.1:8081")).await?;
//! let reply = client.request("get_entity { selector: #root }").await?;
//! println!("{reply}");
//!
//! let mut ticks = client.subscribe("listen_frame ()")?;
//! while let Some(StreamEvent::Message(body)) = ticks.next().await {
//!     println!("{body}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod subscription;
pub mod transport;
pub mod wire;

pub use client::Client;
pub use config::{Backoff, ClientConfig, ReconnectPolicy};
pub use error::ClientError;
pub use subscription::{StreamEvent, Subscription};
pub use transport::{ConnectionEvent, ConnectionState};
pub use wire::{ChannelId, Payload, Status};

pub use pon;
pub use pon::Pon;
