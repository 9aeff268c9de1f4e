//! Peer identity for the in-memory transport.
//!
//! A peer presents a label and, optionally, a token: the HMAC-SHA256 of the
//! label under a secret shared with the server. The token makes the label
//! verifiable across trust domains without the transport itself enforcing
//! anything; enforcement lives in the server's acceptance gate.

use hmac::{Hmac, Mac};
use portcullis_types::Authenticator;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Sender identity presented on connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemPeer {
    label: String,
    token: Option<Vec<u8>>,
}

impl MemPeer {
    /// A peer with a bare, unverifiable label.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: None,
        }
    }

    /// A peer whose label is stamped under `secret`.
    #[must_use]
    pub fn stamped(label: impl Into<String>, secret: &[u8]) -> Self {
        let label = label.into();
        let token = stamp_token(secret, &label);
        Self {
            label,
            token: Some(token),
        }
    }

    /// The self-reported label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The token stamped over the label, when present.
    #[must_use]
    pub fn token(&self) -> Option<&[u8]> {
        self.token.as_deref()
    }
}

/// Stamps `label` under `secret`, yielding the token bytes.
#[must_use]
pub fn stamp_token(secret: &[u8], label: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(label.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Checks `token` against the stamp of `label` under `secret`.
///
/// Uses constant-time comparison.
fn verify_token(secret: &[u8], label: &str, token: &[u8]) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(label.as_bytes());
    mac.verify_slice(token).is_ok()
}

/// Admits peers whose token verifies under the shared secret.
///
/// Identities are verified labels; requirements are the labels to accept.
pub struct TokenAuthenticator {
    secret: Vec<u8>,
}

impl TokenAuthenticator {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl Authenticator for TokenAuthenticator {
    type Peer = MemPeer;
    type Identity = String;
    type Requirement = String;

    fn identify(&self, peer: &MemPeer) -> Option<String> {
        let Some(token) = peer.token() else {
            debug!(label = %peer.label(), "peer presented no token");
            return None;
        };
        if verify_token(&self.secret, peer.label(), token) {
            Some(peer.label().to_owned())
        } else {
            debug!(label = %peer.label(), "peer token failed verification");
            None
        }
    }

    fn satisfies(&self, identity: &String, requirement: &String) -> bool {
        identity == requirement
    }
}

/// Trusts self-reported labels.
///
/// Only safe where every connectable process is already inside the trust
/// boundary, such as tests and single-process setups.
pub struct LabelAuthenticator;

impl Authenticator for LabelAuthenticator {
    type Peer = MemPeer;
    type Identity = String;
    type Requirement = String;

    fn identify(&self, peer: &MemPeer) -> Option<String> {
        Some(peer.label().to_owned())
    }

    fn satisfies(&self, identity: &String, requirement: &String) -> bool {
        identity == requirement
    }
}

/// Resolves no identity for any peer.
///
/// The stand-in for platforms with no usable identity source: composed as
/// the fallback tier it turns every message into a silent gate rejection
/// instead of a crash or an accidental admit.
pub struct DenyAllAuthenticator;

impl Authenticator for DenyAllAuthenticator {
    type Peer = MemPeer;
    type Identity = String;
    type Requirement = String;

    fn identify(&self, _peer: &MemPeer) -> Option<String> {
        None
    }

    fn satisfies(&self, _identity: &String, _requirement: &String) -> bool {
        false
    }
}
