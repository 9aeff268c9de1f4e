//! # Authenticator Seam
//!
//! Establishes who a peer is and whether an acceptance requirement is met.
//! The trait is deliberately small: `identify` may fail (`None`), and a
//! failed identification is never an excuse to guess. The server's gate
//! turns `None` into a silent deny.

use tracing::debug;

/// Resolves peer identities and evaluates acceptance requirements.
pub trait Authenticator: Send + Sync {
    /// Transport-level peer handle this authenticator understands.
    type Peer;
    /// Established identity of a peer.
    type Identity;
    /// One acceptance requirement an identity can satisfy.
    type Requirement: Send + Sync + 'static;

    /// Establishes the peer's identity, or `None` when it cannot be
    /// resolved. Implementations must not panic or abort on unresolvable
    /// peers.
    fn identify(&self, peer: &Self::Peer) -> Option<Self::Identity>;

    /// Whether `identity` satisfies `requirement`.
    fn satisfies(&self, identity: &Self::Identity, requirement: &Self::Requirement) -> bool;
}

/// Two identification strategies with one selected at construction.
///
/// Hosts probe once for the preferred mechanism (newer platform API,
/// richer attestation) and arm the legacy one when it is missing. Both
/// tiers share peer, identity, and requirement types. The legacy tier
/// signals unresolvable identities through `identify() -> None`; combined
/// with the gate's default-deny, an unidentifiable peer is rejected
/// instead of taking the process down.
#[derive(Debug)]
pub struct TieredAuthenticator<P, L> {
    tier: Tier<P, L>,
}

#[derive(Debug)]
enum Tier<P, L> {
    Preferred(P),
    Legacy(L),
}

impl<P, L> TieredAuthenticator<P, L> {
    /// Selects the tier from a capability probe evaluated by the caller.
    pub fn select(preferred_available: bool, preferred: P, legacy: L) -> Self {
        let tier = if preferred_available {
            debug!(tier = "preferred", "authenticator tier selected");
            Tier::Preferred(preferred)
        } else {
            debug!(tier = "legacy", "authenticator tier selected");
            Tier::Legacy(legacy)
        };
        Self { tier }
    }
}

impl<P, L> Authenticator for TieredAuthenticator<P, L>
where
    P: Authenticator,
    L: Authenticator<Peer = P::Peer, Identity = P::Identity, Requirement = P::Requirement>,
{
    type Peer = P::Peer;
    type Identity = P::Identity;
    type Requirement = P::Requirement;

    fn identify(&self, peer: &Self::Peer) -> Option<Self::Identity> {
        match &self.tier {
            Tier::Preferred(authenticator) => authenticator.identify(peer),
            Tier::Legacy(authenticator) => authenticator.identify(peer),
        }
    }

    fn satisfies(&self, identity: &Self::Identity, requirement: &Self::Requirement) -> bool {
        match &self.tier {
            Tier::Preferred(authenticator) => authenticator.satisfies(identity, requirement),
            Tier::Legacy(authenticator) => authenticator.satisfies(identity, requirement),
        }
    }
}
