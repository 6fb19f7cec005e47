//! Shared-secret check for administrative operations.
//!
//! # Security Properties
//!
//! - The configured secret is read once at startup and kept in a `SecretString`
//! - Both the configured and the submitted secret are reduced to HMAC-SHA256
//!   digests under a random per-process key, so the comparison always runs
//!   over 32 bytes regardless of input length
//! - Digests are compared with `subtle::ConstantTimeEq`

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Administrator secret verifier.
///
/// Immutable after construction; share it behind an `Arc`.
pub struct AdminGate {
    digest_key: [u8; 32],
    expected: [u8; 32],
}

impl AdminGate {
    /// Build the gate from the configured administrator secret.
    pub fn new(secret: &SecretString) -> Self {
        let digest_key: [u8; 32] = rand::random();
        let expected = digest(&digest_key, secret.expose_secret().as_bytes());
        Self {
            digest_key,
            expected,
        }
    }

    /// Whether `candidate` matches the administrator secret.
    ///
    /// A mismatch is a normal `false`, never an error.
    pub fn authorize(&self, candidate: &str) -> bool {
        let submitted = digest(&self.digest_key, candidate.as_bytes());
        let matched: bool = submitted.ct_eq(&self.expected).into();
        if !matched {
            tracing::warn!("admin secret rejected");
        }
        matched
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate").finish_non_exhaustive()
    }
}

fn digest(key: &[u8; 32], message: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key length is valid");
    mac.update(message);
    mac.finalize().into_bytes().into()
}
