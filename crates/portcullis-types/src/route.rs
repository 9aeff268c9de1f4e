//! # Route Identity
//!
//! Routes name server-side handlers. A route is a hierarchical string path
//! plus the *shape* of the exchange: whether a message payload accompanies
//! the request and whether a reply is expected. Two routes with the same
//! path but different shapes address different handlers.
//!
//! ## Typed Facades
//!
//! [`SignalRoute`], [`MessageRoute`], [`QueryRoute`], and [`CallRoute`]
//! carry the payload types at compile time and record their names into the
//! erased [`Route`] identity, so registration and invocation agree on types
//! without any runtime negotiation.

use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// The erased route identity used as the registry key and wire form.
///
/// Equality and hashing cover the path and both recorded type names, so the
/// same path registered under different shapes occupies different slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Ordered path segments. Must be non-empty for a matchable route.
    pub path: Vec<String>,
    /// Recorded name of the expected message type, absent for shapes
    /// without a message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// Recorded name of the expected reply type, absent for shapes without
    /// a reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_type: Option<String>,
}

impl Route {
    /// The shape implied by the recorded type names.
    #[must_use]
    pub fn shape(&self) -> RouteShape {
        RouteShape::from_expectations(self.message_type.is_some(), self.reply_type.is_some())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("/"))?;
        if self.message_type.is_some() || self.reply_type.is_some() {
            write!(
                f,
                " [message={}, reply={}]",
                self.message_type.as_deref().unwrap_or("none"),
                self.reply_type.as_deref().unwrap_or("none"),
            )?;
        }
        Ok(())
    }
}

/// Which of {message, reply} an exchange carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteShape {
    /// No message, no reply: fire-and-forget trigger.
    Signal,
    /// Message, no reply.
    Message,
    /// No message, reply expected.
    Query,
    /// Message and reply.
    Call,
}

impl RouteShape {
    /// Derives the shape from the two expectation flags.
    #[must_use]
    pub fn from_expectations(has_message: bool, has_reply: bool) -> Self {
        match (has_message, has_reply) {
            (false, false) => RouteShape::Signal,
            (true, false) => RouteShape::Message,
            (false, true) => RouteShape::Query,
            (true, true) => RouteShape::Call,
        }
    }
}

fn collect_path<I, S>(path: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    path.into_iter().map(Into::into).collect()
}

/// Route for exchanges with no message and no reply.
#[derive(Debug, Clone)]
pub struct SignalRoute {
    identity: Route,
}

impl SignalRoute {
    /// Creates a signal route from path segments.
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: Route {
                path: collect_path(path),
                message_type: None,
                reply_type: None,
            },
        }
    }

    /// The erased identity used on the wire and as the registry key.
    #[must_use]
    pub fn identity(&self) -> &Route {
        &self.identity
    }
}

/// Route for exchanges carrying a message of type `M` with no reply.
#[derive(Debug, Clone)]
pub struct MessageRoute<M> {
    identity: Route,
    _message: PhantomData<fn() -> M>,
}

impl<M> MessageRoute<M> {
    /// Creates a message route from path segments, recording `M`'s name.
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: Route {
                path: collect_path(path),
                message_type: Some(type_name::<M>().to_owned()),
                reply_type: None,
            },
            _message: PhantomData,
        }
    }

    /// The erased identity used on the wire and as the registry key.
    #[must_use]
    pub fn identity(&self) -> &Route {
        &self.identity
    }
}

/// Route for exchanges with no message that expect a reply of type `R`.
#[derive(Debug, Clone)]
pub struct QueryRoute<R> {
    identity: Route,
    _reply: PhantomData<fn() -> R>,
}

impl<R> QueryRoute<R> {
    /// Creates a query route from path segments, recording `R`'s name.
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: Route {
                path: collect_path(path),
                message_type: None,
                reply_type: Some(type_name::<R>().to_owned()),
            },
            _reply: PhantomData,
        }
    }

    /// The erased identity used on the wire and as the registry key.
    #[must_use]
    pub fn identity(&self) -> &Route {
        &self.identity
    }
}

/// Route for exchanges carrying a message of type `M` that expect a reply
/// of type `R`.
#[derive(Debug, Clone)]
pub struct CallRoute<M, R> {
    identity: Route,
    _message: PhantomData<fn() -> M>,
    _reply: PhantomData<fn() -> R>,
}

impl<M, R> CallRoute<M, R> {
    /// Creates a call route from path segments, recording both type names.
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identity: Route {
                path: collect_path(path),
                message_type: Some(type_name::<M>().to_owned()),
                reply_type: Some(type_name::<R>().to_owned()),
            },
            _message: PhantomData,
            _reply: PhantomData,
        }
    }

    /// The erased identity used on the wire and as the registry key.
    #[must_use]
    pub fn identity(&self) -> &Route {
        &self.identity
    }
}
