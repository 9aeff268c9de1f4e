//! # Error Taxonomy
//!
//! Every failure this layer can produce is one of the [`RpcError`] kinds.
//! The set is closed on purpose: embedders match on it exhaustively, and
//! the wire projection ([`WireError`]) admits exactly the four kinds a
//! server may return to a client in-band. Lifecycle signals and security
//! rejections stay on the server.

use crate::route::Route;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Boxed error type returned by user handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured detail for a codec failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecFailure {
    /// Name of the Rust type the codec was converting to or from.
    pub type_name: String,
    /// Codec-reported reason, including the offending field where known.
    pub reason: String,
}

impl CodecFailure {
    /// Captures a failure for type `T` with the codec's reason.
    #[must_use]
    pub fn new<T: ?Sized>(reason: impl Into<String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>().to_owned(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CodecFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.reason)
    }
}

/// Errors surfaced by the RPC layer.
///
/// Server side, every dispatch failure reaches the error sink as one of
/// these. Client side, a remote failure decodes back into the matching
/// kind; handler sources do not survive the wire.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A container or payload could not be decoded.
    #[error("Decoding failed: {0}")]
    Decoding(CodecFailure),

    /// A payload or reply could not be encoded.
    #[error("Encoding failed: {0}")]
    Encoding(CodecFailure),

    /// No handler is registered for the route and shape on the wire.
    #[error("Route not registered: {route}")]
    RouteNotRegistered {
        /// The route as it arrived.
        route: Route,
    },

    /// A user handler failed. Locally `source` holds the original error;
    /// across the wire only the description survives.
    #[error("Handler failed: {description}")]
    HandlerFailure {
        /// Display rendering of the original error.
        description: String,
        /// The original error, present only on the side that ran the
        /// handler.
        #[source]
        source: Option<HandlerError>,
    },

    /// The sender did not satisfy any acceptance requirement. Never sent
    /// to the peer; the rejection is silent on the wire.
    #[error("Insecure connection: sender failed acceptance requirements")]
    InsecureConnection,

    /// The connection became invalid and will deliver no further events.
    #[error("Connection invalid")]
    ConnectionInvalid,

    /// The peer went away; it may reconnect later.
    #[error("Connection interrupted")]
    ConnectionInterrupted,

    /// The hosting process is about to be terminated.
    #[error("Termination imminent")]
    TerminationImminent,

    /// The channel delivered an event this layer cannot classify.
    #[error("Unrecognized channel event")]
    Unrecognized,
}

impl RpcError {
    /// Builds a handler failure, keeping the original error for the sink.
    #[must_use]
    pub fn handler_failure(source: HandlerError) -> Self {
        RpcError::HandlerFailure {
            description: source.to_string(),
            source: Some(source),
        }
    }

    /// Projects this error onto its wire form.
    ///
    /// Returns `None` for the kinds that must never cross the wire:
    /// lifecycle signals and security rejections.
    #[must_use]
    pub fn to_wire(&self) -> Option<WireError> {
        match self {
            RpcError::Decoding(failure) => Some(WireError::Decoding {
                failure: failure.clone(),
            }),
            RpcError::Encoding(failure) => Some(WireError::Encoding {
                failure: failure.clone(),
            }),
            RpcError::RouteNotRegistered { route } => Some(WireError::RouteNotRegistered {
                route: route.clone(),
            }),
            RpcError::HandlerFailure { description, .. } => Some(WireError::HandlerFailure {
                description: description.clone(),
            }),
            RpcError::InsecureConnection
            | RpcError::ConnectionInvalid
            | RpcError::ConnectionInterrupted
            | RpcError::TerminationImminent
            | RpcError::Unrecognized => None,
        }
    }

    /// Reconstructs the client-side error from its wire form.
    #[must_use]
    pub fn from_wire(wire: WireError) -> Self {
        match wire {
            WireError::Decoding { failure } => RpcError::Decoding(failure),
            WireError::Encoding { failure } => RpcError::Encoding(failure),
            WireError::RouteNotRegistered { route } => RpcError::RouteNotRegistered { route },
            WireError::HandlerFailure { description } => RpcError::HandlerFailure {
                description,
                source: None,
            },
        }
    }
}

/// The serializable projection of [`RpcError`]: the only kinds a server may
/// return to a client under a reply's `error` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireError {
    /// Request decoding failed on the server.
    Decoding {
        /// What failed to decode and why.
        failure: CodecFailure,
    },
    /// Reply encoding failed on the server.
    Encoding {
        /// What failed to encode and why.
        failure: CodecFailure,
    },
    /// The requested route has no handler for the wire shape.
    RouteNotRegistered {
        /// The route as it arrived.
        route: Route,
    },
    /// A handler failed; only its description survives the wire.
    HandlerFailure {
        /// Display rendering of the original error.
        description: String,
    },
}
