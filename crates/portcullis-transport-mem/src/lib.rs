//! # In-Memory Transport
//!
//! A complete in-process transport for the protocol, used as the reference
//! channel implementation and as the harness for integration tests. Both
//! ends live in one process and exchange containers over tokio channels.
//!
//! ```text
//! MemConnector ──connect(peer)──► MemListener ──accept──► MemConnection
//!      │                                                      │
//! MemClientChannel ══ messages (mpsc) ════════════════════════╡
//!      │                                                      │
//!      └────────── pending replies (correlation map) ◄────────┘
//! ```
//!
//! ## Lifecycle Mapping
//!
//! - All client handles dropped: the server side observes one
//!   `ConnectionInvalid` event, then end of stream.
//! - Server connection dropped mid-call: waiting callers observe
//!   `ConnectionInterrupted`.
//! - Listener dropped: further connects fail with `ConnectionInvalid`.
//!
//! ## Peers
//!
//! A [`MemPeer`] carries a label and an optional token stamped with a
//! shared secret. [`TokenAuthenticator`] admits only verifiable stamps;
//! [`LabelAuthenticator`] trusts bare labels for same-trust-domain setups;
//! [`DenyAllAuthenticator`] stands in where no identity source exists.

mod auth;
mod link;

pub use auth::{
    stamp_token, DenyAllAuthenticator, LabelAuthenticator, MemPeer, TokenAuthenticator,
};
pub use link::{pair, MemClientChannel, MemConnection, MemConnector, MemListener};

/// Buffer depth of the per-connection message channel and of the connect
/// queue. Senders back-pressure when a receiver falls this far behind.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
