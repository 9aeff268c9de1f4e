//! # Channel Capability
//!
//! The transport seam. Anything that can move key-value containers both
//! ways and surface connection lifecycle transitions can carry this
//! protocol; the traits here are the whole contract. The layer above never
//! sees transport internals, only [`ChannelEvent`]s and reply slots.

use crate::envelope::ReplySlot;
use crate::error::RpcError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Identity linking a solicited reply to the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw message delivered by the transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// The untyped container exactly as it crossed the boundary.
    pub body: Value,
    /// Reply linkage. `None` means fire-and-forget: the sender is not
    /// waiting and no reply container can exist for this message.
    pub correlation: Option<CorrelationId>,
}

/// One event delivered to the server-side pump.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A message container arrived.
    Message(InboundMessage),
    /// The connection became invalid; no further events will follow it.
    ConnectionInvalid,
    /// The peer went away; it may reconnect later.
    ConnectionInterrupted,
    /// The hosting process is about to be terminated.
    TerminationImminent,
    /// Anything the transport could not classify.
    Unknown,
}

/// Client-side sending capability.
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    /// Sends a fire-and-forget container.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ConnectionInvalid`] when the connection can no
    /// longer carry messages.
    async fn send(&self, container: Value) -> Result<(), RpcError>;

    /// Sends a container and waits for the linked reply container.
    ///
    /// There is no timeout at this layer: the call completes when the
    /// reply arrives or fails when the connection dies.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ConnectionInvalid`] when the message cannot be
    /// sent and [`RpcError::ConnectionInterrupted`] when the connection
    /// dies while waiting.
    async fn send_expecting_reply(&self, container: Value) -> Result<Value, RpcError>;
}

/// Server-side connection capability.
///
/// `Sync` because dispatch may hold a shared reference across await
/// points while replying.
#[async_trait]
pub trait InboundChannel: Send + Sync {
    /// Transport-level peer handle the authenticator inspects.
    type Peer: Send + Sync;

    /// The peer on the far end of this connection.
    fn peer(&self) -> &Self::Peer;

    /// Waits for the next event. `None` ends the pump for this connection.
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    /// Creates the reply container for a message, or `None` when the
    /// message does not solicit a reply.
    fn create_reply(&self, message: &InboundMessage) -> Option<ReplySlot>;

    /// Sends a populated reply container back to the waiting sender.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ConnectionInterrupted`] when the sender is no
    /// longer there to receive it.
    async fn send_reply(&self, reply: ReplySlot) -> Result<(), RpcError>;
}

/// Accepts inbound connections.
#[async_trait]
pub trait ChannelListener: Send {
    /// Connection type produced by this listener.
    type Conn: InboundChannel;

    /// Waits for the next connection. `None` means the listener is closed.
    async fn accept(&mut self) -> Option<Self::Conn>;
}
