//! # Portcullis Types Crate
//!
//! The wire model shared by every process that speaks the protocol: route
//! identities, the message/response container operations, the closed error
//! taxonomy, and the capability seams (codec, channel, authenticator).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: client and server link the same revision of
//!   this crate, so recorded type names and reserved container keys always
//!   agree on both sides of the channel.
//! - **Containers Stay Untyped**: transports move `serde_json::Value`
//!   objects; typed views exist only at the edges, behind the codec seam.
//! - **Closed Taxonomy**: every failure this layer can produce is one of the
//!   [`RpcError`] kinds, and only four of them may cross the wire.

pub mod auth;
pub mod channel;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod route;

pub use auth::{Authenticator, TieredAuthenticator};
pub use channel::{
    ChannelEvent, ChannelListener, CorrelationId, InboundChannel, InboundMessage, OutboundChannel,
};
pub use codec::{JsonCodec, PayloadCodec};
pub use envelope::{MessageHeader, ReplySlot, ERROR_KEY, PAYLOAD_KEY, ROUTE_KEY};
pub use error::{CodecFailure, HandlerError, RpcError, WireError};
pub use route::{CallRoute, MessageRoute, QueryRoute, Route, RouteShape, SignalRoute};
