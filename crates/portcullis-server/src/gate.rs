//! # Acceptance Gate
//!
//! Every message is gated on the sender's identity before anything looks
//! at the container. The policy is deny-by-default: no resolvable identity
//! means deny, an empty requirement set means deny, and acceptance needs
//! one satisfied requirement out of the configured set.

use portcullis_types::Authenticator;
use tracing::warn;

/// Default-deny acceptance check over a requirement set.
pub struct AcceptanceGate<A: Authenticator> {
    authenticator: A,
    requirements: Vec<A::Requirement>,
}

impl<A: Authenticator> AcceptanceGate<A> {
    /// Creates a gate. An empty requirement set denies everything.
    pub fn new(authenticator: A, requirements: Vec<A::Requirement>) -> Self {
        Self {
            authenticator,
            requirements,
        }
    }

    /// Whether a message from `peer` may proceed to dispatch.
    ///
    /// Acceptance needs a resolvable identity and at least one satisfied
    /// requirement. Denials carry no detail back to the peer; they are
    /// logged at warn level and callers report them through the error
    /// sink.
    pub fn accept(&self, peer: &A::Peer) -> bool {
        let Some(identity) = self.authenticator.identify(peer) else {
            warn!("gate denial: peer identity unresolvable");
            return false;
        };
        if self.requirements.is_empty() {
            warn!("gate denial: no acceptance requirements configured");
            return false;
        }
        let accepted = self
            .requirements
            .iter()
            .any(|requirement| self.authenticator.satisfies(&identity, requirement));
        if !accepted {
            warn!("gate denial: no acceptance requirement satisfied");
        }
        accepted
    }
}
