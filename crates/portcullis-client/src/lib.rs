//! # Portcullis Client
//!
//! The caller side of the protocol. A [`Client`] wraps an outbound channel
//! and a payload codec; the four send methods mirror the four route shapes.
//!
//! ```text
//! typed value ──codec──► container ──channel──► server
//!                                       │
//! typed reply ◄──codec── container ◄────┘ (solicited shapes only)
//! ```
//!
//! ## Remote Errors
//!
//! A solicited reply carries either a payload or a wire error, never both.
//! Wire errors are rehydrated into [`RpcError`] and returned from the call;
//! handler failures arrive as description-only, their original source stays
//! on the server side.
//!
//! ## Silence
//!
//! If the server denies the sender at its acceptance gate, no reply comes
//! back at all. An awaited call then resolves only when the connection
//! itself dies; callers that cannot tolerate that wrap calls in a timeout.

use portcullis_types::{
    envelope, CallRoute, JsonCodec, MessageRoute, OutboundChannel, PayloadCodec, QueryRoute, Route,
    RpcError, SignalRoute,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A typed caller bound to one outbound channel.
pub struct Client<T, C = JsonCodec>
where
    T: OutboundChannel,
    C: PayloadCodec,
{
    channel: T,
    codec: C,
}

impl<T: OutboundChannel> Client<T, JsonCodec> {
    /// Creates a client with the default JSON codec.
    pub fn new(channel: T) -> Self {
        Self::with_codec(channel, JsonCodec)
    }
}

impl<T, C> Client<T, C>
where
    T: OutboundChannel,
    C: PayloadCodec,
{
    /// Creates a client with a custom payload codec.
    ///
    /// Both sides of a channel must agree on the codec, since payloads are
    /// encoded on one side and decoded on the other.
    pub fn with_codec(channel: T, codec: C) -> Self {
        Self { channel, codec }
    }

    /// Fires a bare message at a route, expecting no reply.
    ///
    /// Success means the container was handed to the channel, not that any
    /// handler ran. Server-side failures surface only through the server's
    /// error sink.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Encoding`] when the route cannot be serialized,
    /// or the channel's error when the send fails.
    pub async fn send_signal(&self, route: &SignalRoute) -> Result<(), RpcError> {
        let container = envelope::encode_message(route.identity())?;
        self.channel.send(container).await
    }

    /// Sends a typed message at a route, expecting no reply.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Encoding`] when the message cannot be encoded,
    /// or the channel's error when the send fails.
    pub async fn send_message<M>(&self, route: &MessageRoute<M>, message: &M) -> Result<(), RpcError>
    where
        M: Serialize,
    {
        let container =
            envelope::encode_message_with_payload(&self.codec, route.identity(), message)?;
        self.channel.send(container).await
    }

    /// Sends a bare message at a route and awaits its typed reply.
    ///
    /// # Errors
    ///
    /// Returns the remote error when the reply carries one, a decoding
    /// failure when the reply payload does not match `R`, or the channel's
    /// error when the exchange breaks.
    pub async fn query<R>(&self, route: &QueryRoute<R>) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        let container = envelope::encode_message(route.identity())?;
        let reply = self.channel.send_expecting_reply(container).await?;
        self.decode_reply(route.identity(), &reply)
    }

    /// Sends a typed message at a route and awaits its typed reply.
    ///
    /// # Errors
    ///
    /// Returns the remote error when the reply carries one, a codec failure
    /// on either edge of the exchange, or the channel's error when the
    /// exchange breaks.
    pub async fn call<M, R>(&self, route: &CallRoute<M, R>, message: &M) -> Result<R, RpcError>
    where
        M: Serialize,
        R: DeserializeOwned,
    {
        let container =
            envelope::encode_message_with_payload(&self.codec, route.identity(), message)?;
        let reply = self.channel.send_expecting_reply(container).await?;
        self.decode_reply(route.identity(), &reply)
    }

    /// Splits a reply container: remote error if present, payload otherwise.
    fn decode_reply<R>(&self, route: &Route, reply: &Value) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        if let Some(remote) = envelope::decode_reply_error(reply)? {
            debug!(route = %route, error = %remote, "reply carried a remote error");
            return Err(remote);
        }
        envelope::decode_reply_payload(&self.codec, reply)
    }
}
