//! Password-based key derivation.
//!
//! Keys are derived with PBKDF2-HMAC-SHA256 over a fixed, configured salt so
//! that both parties get the same key from the same password without
//! exchanging any per-message material.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Default PBKDF2 salt. Not secret; identical for every message.
pub const DEFAULT_SALT: &[u8] = b"genstega-static-salt-v1";

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Lowest iteration count accepted from configuration.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Derived key size in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key, wiped from memory on drop.
pub type DerivedKey = Zeroizing<[u8; KEY_SIZE]>;

/// Key derivation parameters shared by sender and recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Fixed salt. Must match between encode and decode.
    pub salt: Vec<u8>,

    /// PBKDF2 round count. Must match between encode and decode.
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            salt: DEFAULT_SALT.to_vec(),
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Create parameters with a custom salt and round count.
    pub fn new(salt: impl Into<Vec<u8>>, iterations: u32) -> Self {
        Self {
            salt: salt.into(),
            iterations,
        }
    }
}

/// Derives a 256-bit key from a password.
///
/// Deterministic: the same `(password, params)` always yields the same key.
/// An empty password is accepted.
pub fn derive_key(password: &str, params: &KdfParams) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        &params.salt,
        params.iterations,
        key.as_mut(),
    );
    key
}
