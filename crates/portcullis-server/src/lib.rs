//! # Portcullis Server
//!
//! The privileged side of the protocol: register typed handlers on routes,
//! configure the acceptance gate, then serve connections from a channel
//! listener.
//!
//! ## Lifecycle
//!
//! Registration happens strictly before serving. The `register_*` methods
//! take `&mut self` and `serve` takes `Arc<Self>`, so the borrow checker
//! enforces the happens-before edge and the registry needs no locking on
//! the dispatch path.
//!
//! ```text
//! Server::new(authenticator, requirements)
//!     │ register_signal / register_message / register_query / register_call
//!     │ set_error_handler
//!     ▼
//! Arc::new(server) ── serve(listener) ──► task per connection ──► dispatch
//! ```
//!
//! ## Error Reporting
//!
//! Dispatch failures go to the error sink exactly once each. Reply-able
//! kinds additionally go back to a waiting client in wire form; gate
//! rejections and lifecycle signals never do. Every reported error is
//! also traced, whether or not a sink is installed; with no sink the
//! trace escalates to a warning.

mod dispatch;
mod gate;
mod registry;

pub use gate::AcceptanceGate;

use parking_lot::RwLock;
use portcullis_types::{
    envelope, Authenticator, CallRoute, HandlerError, JsonCodec, MessageRoute, PayloadCodec,
    QueryRoute, Route, RpcError, SignalRoute,
};
use registry::HandlerRegistry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Replaceable sink for dispatch errors.
pub type ErrorHandler = Arc<dyn Fn(RpcError) + Send + Sync>;

/// Counters for dispatch activity.
///
/// All counters are monotonic and updated with relaxed ordering; they are
/// operational signals, not synchronization.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Message containers received, before the gate.
    pub messages_received: AtomicU64,
    /// Reply containers sent, success and error replies alike.
    pub replies_sent: AtomicU64,
    /// Messages denied by the acceptance gate.
    pub gate_rejections: AtomicU64,
    /// Errors forwarded to the sink, all kinds.
    pub errors_reported: AtomicU64,
    /// Lifecycle events observed on connections.
    pub lifecycle_events: AtomicU64,
}

/// The server: registry, gate, codec, and error sink in one place.
///
/// Generic over the authenticator (which fixes the peer type its
/// connections must expose) and the payload codec.
pub struct Server<A: Authenticator, C: PayloadCodec = JsonCodec> {
    registry: HandlerRegistry,
    gate: AcceptanceGate<A>,
    codec: C,
    error_sink: RwLock<Option<ErrorHandler>>,
    stats: DispatchStats,
}

impl<A: Authenticator> Server<A, JsonCodec> {
    /// Creates a server with the default JSON codec.
    ///
    /// `requirements` is the acceptance set: a sender is admitted when its
    /// identity satisfies any one of them. An empty set denies everything.
    pub fn new(authenticator: A, requirements: Vec<A::Requirement>) -> Self {
        Self::with_codec(authenticator, requirements, JsonCodec)
    }
}

impl<A, C> Server<A, C>
where
    A: Authenticator,
    C: PayloadCodec + Clone + 'static,
{
    /// Creates a server with a custom payload codec.
    pub fn with_codec(authenticator: A, requirements: Vec<A::Requirement>, codec: C) -> Self {
        Self {
            registry: HandlerRegistry::default(),
            gate: AcceptanceGate::new(authenticator, requirements),
            codec,
            error_sink: RwLock::new(None),
            stats: DispatchStats::default(),
        }
    }

    /// Replaces the error sink.
    ///
    /// The sink receives every dispatch failure exactly once, including
    /// handler errors with their original source attached. It can be
    /// replaced at any time, also while serving. Errors are traced
    /// regardless of the sink; while none is set, the trace escalates to
    /// a warning and the error is dropped.
    pub fn set_error_handler(&self, handler: impl Fn(RpcError) + Send + Sync + 'static) {
        *self.error_sink.write() = Some(Arc::new(handler));
    }

    /// Dispatch activity counters.
    #[must_use]
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Registers a handler for a route with no message and no reply.
    ///
    /// Replaces any handler previously registered for the same route.
    pub fn register_signal<F>(&mut self, route: &SignalRoute, handler: F)
    where
        F: Fn() -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.registry.insert_signal(
            route.identity().clone(),
            Box::new(move || handler().map_err(RpcError::handler_failure)),
        );
    }

    /// Registers a handler for a route carrying a message with no reply.
    ///
    /// The message is decoded before the handler runs; decode failures are
    /// reported without invoking it. Replaces any handler previously
    /// registered for the same route.
    pub fn register_message<M, F>(&mut self, route: &MessageRoute<M>, handler: F)
    where
        M: DeserializeOwned + 'static,
        F: Fn(M) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let codec = self.codec.clone();
        self.registry.insert_message(
            route.identity().clone(),
            Box::new(move |container| {
                let message: M = envelope::decode_payload(&codec, container)?;
                handler(message).map_err(RpcError::handler_failure)
            }),
        );
    }

    /// Registers a handler for a route with no message that returns a
    /// reply.
    ///
    /// Replaces any handler previously registered for the same route.
    pub fn register_query<R, F>(&mut self, route: &QueryRoute<R>, handler: F)
    where
        R: Serialize + 'static,
        F: Fn() -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let codec = self.codec.clone();
        self.registry.insert_query(
            route.identity().clone(),
            Box::new(move || {
                let reply = handler().map_err(RpcError::handler_failure)?;
                codec.encode(&reply)
            }),
        );
    }

    /// Registers a handler for a route carrying a message that returns a
    /// reply.
    ///
    /// Replaces any handler previously registered for the same route.
    pub fn register_call<M, R, F>(&mut self, route: &CallRoute<M, R>, handler: F)
    where
        M: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(M) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let codec = self.codec.clone();
        self.registry.insert_call(
            route.identity().clone(),
            Box::new(move |container| {
                let message: M = envelope::decode_payload(&codec, container)?;
                let reply = handler(message).map_err(RpcError::handler_failure)?;
                codec.encode(&reply)
            }),
        );
    }

    /// Routes registered across all shape buckets, for diagnostics.
    #[must_use]
    pub fn registered_routes(&self) -> Vec<Route> {
        self.registry.routes()
    }
}
