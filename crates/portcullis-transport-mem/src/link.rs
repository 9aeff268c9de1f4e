//! Connection plumbing: the connect queue, per-connection message stream,
//! and the correlation map that links replies back to waiting callers.

use crate::auth::MemPeer;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use dashmap::DashMap;
use portcullis_types::{
    ChannelEvent, ChannelListener, CorrelationId, InboundChannel, InboundMessage, OutboundChannel,
    ReplySlot, RpcError,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// One container in flight, with its reply linkage when solicited.
struct Transfer {
    body: Value,
    correlation: Option<CorrelationId>,
}

/// Callers waiting on replies, keyed by correlation id.
type PendingReplies = Arc<DashMap<CorrelationId, oneshot::Sender<Value>>>;

/// Creates a connected listener/connector pair.
///
/// The listener is the server end; hand it to `Server::serve`. The
/// connector is cheap to clone and can open any number of connections.
#[must_use]
pub fn pair() -> (MemListener, MemConnector) {
    let (connections, accepted) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
    (
        MemListener {
            connections: accepted,
        },
        MemConnector { connections },
    )
}

/// Opens connections toward the paired [`MemListener`].
#[derive(Clone)]
pub struct MemConnector {
    connections: mpsc::Sender<MemConnection>,
}

impl MemConnector {
    /// Opens a connection presenting `peer` as the sender identity.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ConnectionInvalid`] when the listener side is
    /// gone.
    pub async fn connect(&self, peer: MemPeer) -> Result<MemClientChannel, RpcError> {
        let (messages, inbox) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let pending: PendingReplies = Arc::new(DashMap::new());
        let connection = MemConnection {
            peer,
            messages: inbox,
            pending: Arc::clone(&pending),
            ended: false,
        };
        self.connections
            .send(connection)
            .await
            .map_err(|_| RpcError::ConnectionInvalid)?;
        debug!("in-memory connection established");
        Ok(MemClientChannel { messages, pending })
    }
}

/// Accepts connections opened by the paired [`MemConnector`].
pub struct MemListener {
    connections: mpsc::Receiver<MemConnection>,
}

#[async_trait]
impl ChannelListener for MemListener {
    type Conn = MemConnection;

    async fn accept(&mut self) -> Option<MemConnection> {
        self.connections.recv().await
    }
}

/// Server end of one connection.
///
/// Yields each inbound container as a message event. When every client
/// handle is gone it yields a single `ConnectionInvalid`, then end of
/// stream. Dropping it fails all callers still waiting on replies.
pub struct MemConnection {
    peer: MemPeer,
    messages: mpsc::Receiver<Transfer>,
    pending: PendingReplies,
    ended: bool,
}

#[async_trait]
impl InboundChannel for MemConnection {
    type Peer = MemPeer;

    fn peer(&self) -> &MemPeer {
        &self.peer
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        if self.ended {
            return None;
        }
        match self.messages.recv().await {
            Some(transfer) => Some(ChannelEvent::Message(InboundMessage {
                body: transfer.body,
                correlation: transfer.correlation,
            })),
            None => {
                self.ended = true;
                Some(ChannelEvent::ConnectionInvalid)
            }
        }
    }

    fn create_reply(&self, message: &InboundMessage) -> Option<ReplySlot> {
        message.correlation.map(ReplySlot::new)
    }

    async fn send_reply(&self, reply: ReplySlot) -> Result<(), RpcError> {
        let correlation = reply.correlation();
        let Some((_, waiter)) = self.pending.remove(&correlation) else {
            debug!(%correlation, "no caller waiting on reply");
            return Err(RpcError::ConnectionInterrupted);
        };
        waiter
            .send(reply.into_body())
            .map_err(|_| RpcError::ConnectionInterrupted)
    }
}

impl Drop for MemConnection {
    fn drop(&mut self) {
        // Dropping the waiters fails their oneshot receivers, which the
        // client side surfaces as ConnectionInterrupted.
        self.pending.clear();
    }
}

/// Client end of one connection.
///
/// Clones share the connection; the server side sees it end only when all
/// of them are dropped.
#[derive(Clone)]
pub struct MemClientChannel {
    messages: mpsc::Sender<Transfer>,
    pending: PendingReplies,
}

#[async_trait]
impl OutboundChannel for MemClientChannel {
    async fn send(&self, message: Value) -> Result<(), RpcError> {
        self.messages
            .send(Transfer {
                body: message,
                correlation: None,
            })
            .await
            .map_err(|_| RpcError::ConnectionInvalid)
    }

    async fn send_expecting_reply(&self, message: Value) -> Result<Value, RpcError> {
        let correlation = CorrelationId::new();
        let (waiter, reply) = oneshot::channel();
        self.pending.insert(correlation, waiter);
        let sent = self
            .messages
            .send(Transfer {
                body: message,
                correlation: Some(correlation),
            })
            .await;
        if sent.is_err() {
            self.pending.remove(&correlation);
            return Err(RpcError::ConnectionInvalid);
        }
        reply.await.map_err(|_| RpcError::ConnectionInterrupted)
    }
}
