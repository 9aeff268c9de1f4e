//! # Container Protocol
//!
//! Messages and replies travel as untyped key-value containers
//! (`serde_json::Value` objects). This module owns the reserved keys and
//! every read or write of them, so nothing else in the stack touches raw
//! key strings.
//!
//! ## Reserved Keys
//!
//! - Messages: `route` (always), `payload` (when the shape has a message).
//! - Replies: at most one of `payload` / `error`.
//!
//! These names are the wire contract and must stay stable across client and
//! server versions.

use crate::channel::CorrelationId;
use crate::codec::PayloadCodec;
use crate::error::{CodecFailure, RpcError, WireError};
use crate::route::Route;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Reserved key holding the route identity in a message container.
pub const ROUTE_KEY: &str = "route";
/// Reserved key holding the encoded payload in messages and replies.
pub const PAYLOAD_KEY: &str = "payload";
/// Reserved key holding the encoded error in replies.
pub const ERROR_KEY: &str = "error";

/// Route and payload presence extracted from a message container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// The decoded route identity.
    pub route: Route,
    /// Whether a `payload` key is present. Presence is structural; nothing
    /// here attempts to decode the value under it.
    pub payload_present: bool,
}

fn route_value(route: &Route) -> Result<Value, RpcError> {
    serde_json::to_value(route)
        .map_err(|e| RpcError::Encoding(CodecFailure::new::<Route>(e.to_string())))
}

/// Builds a message container for a route with no message payload.
///
/// # Errors
///
/// Returns [`RpcError::Encoding`] when the route itself cannot be
/// serialized.
pub fn encode_message(route: &Route) -> Result<Value, RpcError> {
    let mut container = Map::new();
    container.insert(ROUTE_KEY.to_owned(), route_value(route)?);
    Ok(Value::Object(container))
}

/// Builds a message container carrying an encoded payload.
///
/// # Errors
///
/// Returns [`RpcError::Encoding`] when the route or the payload cannot be
/// encoded.
pub fn encode_message_with_payload<C, M>(
    codec: &C,
    route: &Route,
    message: &M,
) -> Result<Value, RpcError>
where
    C: PayloadCodec,
    M: Serialize,
{
    let mut container = Map::new();
    container.insert(ROUTE_KEY.to_owned(), route_value(route)?);
    container.insert(PAYLOAD_KEY.to_owned(), codec.encode(message)?);
    Ok(Value::Object(container))
}

/// Extracts the route and payload presence from a message container.
///
/// # Errors
///
/// Returns [`RpcError::Decoding`] when the container is not an object, the
/// `route` key is missing, or the route value is malformed.
pub fn decode_header(container: &Value) -> Result<MessageHeader, RpcError> {
    let object = container.as_object().ok_or_else(|| {
        RpcError::Decoding(CodecFailure::new::<MessageHeader>(
            "message container is not an object",
        ))
    })?;
    let route_value = object
        .get(ROUTE_KEY)
        .ok_or_else(|| RpcError::Decoding(CodecFailure::new::<Route>("missing `route` key")))?;
    let route: Route = serde_json::from_value(route_value.clone())
        .map_err(|e| RpcError::Decoding(CodecFailure::new::<Route>(e.to_string())))?;
    Ok(MessageHeader {
        route,
        payload_present: object.contains_key(PAYLOAD_KEY),
    })
}

/// Decodes the message payload into `M`.
///
/// # Errors
///
/// Returns [`RpcError::Decoding`] when the `payload` key is absent or the
/// codec rejects the value under it.
pub fn decode_payload<C, M>(codec: &C, container: &Value) -> Result<M, RpcError>
where
    C: PayloadCodec,
    M: DeserializeOwned,
{
    let value = container
        .get(PAYLOAD_KEY)
        .ok_or_else(|| RpcError::Decoding(CodecFailure::new::<M>("missing `payload` key")))?;
    codec.decode(value)
}

/// A reply container under construction.
///
/// The transport hands one out per solicited message; dispatch populates it
/// in place and sends it back over the same channel. The correlation id is
/// the reply linkage: the transport routes the finished container to the
/// sender waiting on it.
#[derive(Debug)]
pub struct ReplySlot {
    correlation: CorrelationId,
    body: Map<String, Value>,
}

impl ReplySlot {
    /// Creates an empty slot linked to `correlation`.
    #[must_use]
    pub fn new(correlation: CorrelationId) -> Self {
        Self {
            correlation,
            body: Map::new(),
        }
    }

    /// The reply linkage identity.
    #[must_use]
    pub fn correlation(&self) -> CorrelationId {
        self.correlation
    }

    /// Writes the success payload. A reply carries at most one of
    /// `payload` / `error`; callers must not have written an error first.
    pub fn fill_payload(&mut self, payload: Value) {
        debug_assert!(
            !self.body.contains_key(ERROR_KEY),
            "reply already carries an error"
        );
        self.body.insert(PAYLOAD_KEY.to_owned(), payload);
    }

    /// Writes an encoded error.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Encoding`] when the wire error itself cannot be
    /// serialized; the exchange then ends without a reply.
    pub fn fill_error(&mut self, error: &WireError) -> Result<(), RpcError> {
        debug_assert!(
            !self.body.contains_key(PAYLOAD_KEY),
            "reply already carries a payload"
        );
        let encoded = serde_json::to_value(error)
            .map_err(|e| RpcError::Encoding(CodecFailure::new::<WireError>(e.to_string())))?;
        self.body.insert(ERROR_KEY.to_owned(), encoded);
        Ok(())
    }

    /// Consumes the slot, yielding the finished container.
    #[must_use]
    pub fn into_body(self) -> Value {
        Value::Object(self.body)
    }
}

/// Reads the remote error out of a reply container, if any.
///
/// `Ok(None)` means no `error` key is present.
///
/// # Errors
///
/// Returns [`RpcError::Decoding`] when the key is present but holds
/// something other than a wire error.
pub fn decode_reply_error(reply: &Value) -> Result<Option<RpcError>, RpcError> {
    let Some(value) = reply.get(ERROR_KEY) else {
        return Ok(None);
    };
    let wire: WireError = serde_json::from_value(value.clone())
        .map_err(|e| RpcError::Decoding(CodecFailure::new::<WireError>(e.to_string())))?;
    Ok(Some(RpcError::from_wire(wire)))
}

/// Decodes the reply payload into `R`.
///
/// # Errors
///
/// Returns [`RpcError::Decoding`] when the `payload` key is absent (a
/// solicited reply that carried neither payload nor error) or the codec
/// rejects the value under it.
pub fn decode_reply_payload<C, R>(codec: &C, reply: &Value) -> Result<R, RpcError>
where
    C: PayloadCodec,
    R: DeserializeOwned,
{
    let value = reply
        .get(PAYLOAD_KEY)
        .ok_or_else(|| RpcError::Decoding(CodecFailure::new::<R>("reply carried no payload")))?;
    codec.decode(value)
}
