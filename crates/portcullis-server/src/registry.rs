//! # Handler Registry
//!
//! Four disjoint buckets, one per route shape. Handlers are stored erased:
//! typed decode and encode happen inside the boxed closure, so the registry
//! itself never sees a concrete payload type. Bucket selection at dispatch
//! uses what is actually on the wire (payload presence, reply expectation),
//! which is why a shape mismatch surfaces as an unregistered route instead
//! of a cross-shape invocation.

use portcullis_types::{Route, RpcError};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

pub(crate) type SignalHandler = Box<dyn Fn() -> Result<(), RpcError> + Send + Sync>;
pub(crate) type MessageHandler = Box<dyn Fn(&Value) -> Result<(), RpcError> + Send + Sync>;
pub(crate) type QueryHandler = Box<dyn Fn() -> Result<Value, RpcError> + Send + Sync>;
pub(crate) type CallHandler = Box<dyn Fn(&Value) -> Result<Value, RpcError> + Send + Sync>;

/// Erased handler storage, one bucket per shape.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    signal: HashMap<Route, SignalHandler>,
    message: HashMap<Route, MessageHandler>,
    query: HashMap<Route, QueryHandler>,
    call: HashMap<Route, CallHandler>,
}

fn check_path(route: &Route) {
    if route.path.is_empty() {
        warn!(route = %route, "registered a route with an empty path; it can never match");
    }
}

impl HandlerRegistry {
    pub(crate) fn insert_signal(&mut self, route: Route, handler: SignalHandler) {
        check_path(&route);
        if self.signal.insert(route.clone(), handler).is_some() {
            debug!(route = %route, "replaced existing signal handler");
        }
    }

    pub(crate) fn insert_message(&mut self, route: Route, handler: MessageHandler) {
        check_path(&route);
        if self.message.insert(route.clone(), handler).is_some() {
            debug!(route = %route, "replaced existing message handler");
        }
    }

    pub(crate) fn insert_query(&mut self, route: Route, handler: QueryHandler) {
        check_path(&route);
        if self.query.insert(route.clone(), handler).is_some() {
            debug!(route = %route, "replaced existing query handler");
        }
    }

    pub(crate) fn insert_call(&mut self, route: Route, handler: CallHandler) {
        check_path(&route);
        if self.call.insert(route.clone(), handler).is_some() {
            debug!(route = %route, "replaced existing call handler");
        }
    }

    /// All registered routes across the four buckets.
    pub(crate) fn routes(&self) -> Vec<Route> {
        self.signal
            .keys()
            .chain(self.message.keys())
            .chain(self.query.keys())
            .chain(self.call.keys())
            .cloned()
            .collect()
    }

    /// Looks up and invokes the handler matching the wire shape.
    ///
    /// Returns `Some` with the encoded reply payload for reply-expecting
    /// shapes, `None` for fire-and-forget shapes.
    ///
    /// # Errors
    ///
    /// `RouteNotRegistered` when the shape bucket has no entry for the
    /// route; otherwise whatever the handler produced.
    pub(crate) fn dispatch(
        &self,
        route: &Route,
        payload_present: bool,
        expects_reply: bool,
        container: &Value,
    ) -> Result<Option<Value>, RpcError> {
        match (payload_present, expects_reply) {
            (false, false) => {
                let handler = self.signal.get(route).ok_or_else(|| not_registered(route))?;
                handler().map(|()| None)
            }
            (true, false) => {
                let handler = self
                    .message
                    .get(route)
                    .ok_or_else(|| not_registered(route))?;
                handler(container).map(|()| None)
            }
            (false, true) => {
                let handler = self.query.get(route).ok_or_else(|| not_registered(route))?;
                handler().map(Some)
            }
            (true, true) => {
                let handler = self.call.get(route).ok_or_else(|| not_registered(route))?;
                handler(container).map(Some)
            }
        }
    }
}

fn not_registered(route: &Route) -> RpcError {
    warn!(route = %route, "no handler registered for this route and shape");
    RpcError::RouteNotRegistered {
        route: route.clone(),
    }
}
