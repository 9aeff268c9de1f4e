//! # Dispatch
//!
//! The per-event state machine. The order is load-bearing:
//!
//! 1. Classify the channel event.
//! 2. Authenticate the sender, before anything reads the container.
//! 3. Ask the transport for the reply container.
//! 4. Decode the header (route, payload presence).
//! 5. Look up the handler bucket for the wire shape.
//! 6. Invoke the erased handler.
//! 7. Encode and send the reply on success.
//! 8. Otherwise reply with the wire form where possible and report the
//!    full error to the sink.
//!
//! Authentication precedes decoding so unauthenticated bytes never reach
//! the codec. Gate denials are silent toward the peer.

use crate::Server;
use portcullis_types::{
    envelope, Authenticator, ChannelEvent, ChannelListener, InboundChannel, InboundMessage,
    PayloadCodec, ReplySlot, RpcError,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

impl<A, C> Server<A, C>
where
    A: Authenticator,
    C: PayloadCodec + Clone + 'static,
{
    /// Serves connections from `listener` until it closes.
    ///
    /// Each accepted connection gets its own task, so distinct connections
    /// dispatch concurrently; events within one connection are processed
    /// in order. Returns when the listener reports no further connections.
    pub async fn serve<L>(self: Arc<Self>, mut listener: L)
    where
        L: ChannelListener,
        L::Conn: InboundChannel<Peer = A::Peer> + 'static,
        A: 'static,
    {
        while let Some(connection) = listener.accept().await {
            debug!("connection accepted");
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                server.drive_connection(connection).await;
            });
        }
        debug!("listener closed, serve loop ending");
    }

    /// Pumps one connection's events through the state machine until the
    /// transport reports the end of the stream.
    pub async fn drive_connection<Ch>(&self, mut channel: Ch)
    where
        Ch: InboundChannel<Peer = A::Peer>,
    {
        loop {
            let event = match channel.next_event().await {
                Some(event) => event,
                None => {
                    debug!("event stream ended, connection pump stopping");
                    break;
                }
            };
            self.handle_event(&channel, event).await;
        }
    }

    /// Runs one channel event through the dispatch state machine.
    ///
    /// Public so embedders with exotic transports can drive dispatch by
    /// hand; [`Server::serve`] is this in a loop behind an accept call.
    pub async fn handle_event<Ch>(&self, channel: &Ch, event: ChannelEvent)
    where
        Ch: InboundChannel<Peer = A::Peer>,
    {
        match event {
            ChannelEvent::Message(message) => self.handle_message(channel, message).await,
            ChannelEvent::ConnectionInvalid => self.report_lifecycle(RpcError::ConnectionInvalid),
            ChannelEvent::ConnectionInterrupted => {
                self.report_lifecycle(RpcError::ConnectionInterrupted);
            }
            ChannelEvent::TerminationImminent => {
                self.report_lifecycle(RpcError::TerminationImminent);
            }
            ChannelEvent::Unknown => self.report_lifecycle(RpcError::Unrecognized),
        }
    }

    async fn handle_message<Ch>(&self, channel: &Ch, message: InboundMessage)
    where
        Ch: InboundChannel<Peer = A::Peer>,
    {
        self.stats.messages_received.fetch_add(1, Ordering::Relaxed);

        if !self.gate.accept(channel.peer()) {
            self.stats.gate_rejections.fetch_add(1, Ordering::Relaxed);
            self.report(RpcError::InsecureConnection);
            return;
        }

        let slot = channel.create_reply(&message);

        let header = match envelope::decode_header(&message.body) {
            Ok(header) => header,
            Err(error) => {
                self.reply_or_report(channel, slot, error).await;
                return;
            }
        };

        debug!(
            route = %header.route,
            payload = header.payload_present,
            reply = slot.is_some(),
            "dispatching message"
        );

        let outcome = self.registry.dispatch(
            &header.route,
            header.payload_present,
            slot.is_some(),
            &message.body,
        );

        match outcome {
            Ok(Some(payload)) => {
                // The registry returns a payload exactly when a reply was
                // expected, so the slot is present here.
                if let Some(mut slot) = slot {
                    slot.fill_payload(payload);
                    self.send_reply(channel, slot).await;
                }
            }
            Ok(None) => {}
            Err(error) => self.reply_or_report(channel, slot, error).await,
        }
    }

    /// Error tail of the state machine: the sink always receives the full
    /// error once; a waiting client additionally gets the wire form when
    /// one exists for this kind.
    async fn reply_or_report<Ch>(&self, channel: &Ch, slot: Option<ReplySlot>, error: RpcError)
    where
        Ch: InboundChannel<Peer = A::Peer>,
    {
        if let (Some(mut slot), Some(wire)) = (slot, error.to_wire()) {
            match slot.fill_error(&wire) {
                Ok(()) => self.send_reply(channel, slot).await,
                Err(encode_failure) => {
                    // No secondary reporting channel exists once the error
                    // reply itself cannot be encoded; the exchange ends
                    // here and the client side observes only silence.
                    debug!(%encode_failure, "error reply could not be encoded");
                }
            }
        }
        self.report(error);
    }

    async fn send_reply<Ch>(&self, channel: &Ch, slot: ReplySlot)
    where
        Ch: InboundChannel<Peer = A::Peer>,
    {
        match channel.send_reply(slot).await {
            Ok(()) => {
                self.stats.replies_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                // The peer vanished mid-exchange. Its lifecycle event
                // reports the death, so the failed send is only traced.
                debug!(%error, "reply send failed");
            }
        }
    }

    fn report_lifecycle(&self, error: RpcError) {
        self.stats.lifecycle_events.fetch_add(1, Ordering::Relaxed);
        self.report(error);
    }

    /// Traces an error and forwards it to the sink. The sink and the trace
    /// are separate channels; installing a sink does not quiet the trace.
    /// Without a sink the trace escalates to a warning and the error is
    /// dropped.
    fn report(&self, error: RpcError) {
        self.stats.errors_reported.fetch_add(1, Ordering::Relaxed);
        debug!(%error, "dispatch error");
        let sink = self.error_sink.read().clone();
        match sink {
            Some(handler) => handler(error),
            None => warn!(%error, "dispatch error with no error handler set"),
        }
    }
}
