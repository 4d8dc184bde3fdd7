//! Time-boxed secret envelopes.
//!
//! A secret is wrapped in a [`SecretEnvelope`] carrying its expiry, serialized
//! with bincode and sealed with ChaCha20-Poly1305 under a password-derived key.
//!
//! Ciphertext format: nonce (12 bytes) || ciphertext (variable, includes auth tag)
//!
//! The nonce is random per call, so sealing the same text twice produces
//! unrelated ciphertexts. The AEAD tag makes the format self-framing: no
//! length header is needed and any truncation or bit flip fails authentication.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf::{derive_key, KdfParams};

/// Nonce size for ChaCha20Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag size.
pub const TAG_SIZE: usize = 16;

/// Default lifetime of a sealed secret.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Errors that can occur while sealing or opening an envelope.
///
/// `DecryptionFailed` deliberately covers wrong passwords, tampered bytes and
/// inputs that were never envelopes: callers cannot tell them apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Invalid password or corrupted data")]
    DecryptionFailed,

    #[error("Secret has expired")]
    Expired,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
}

/// The record that gets encrypted as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretEnvelope {
    /// The secret text.
    pub text: String,

    /// Unix timestamp (seconds) from which the envelope is no longer valid.
    pub expires_at: u64,
}

impl SecretEnvelope {
    /// Returns true if the envelope is no longer valid at `now`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Current time as a Unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Seals `text` so that it expires `ttl` from now.
pub fn encrypt(
    text: &str,
    password: &str,
    ttl: Duration,
    params: &KdfParams,
) -> Result<Vec<u8>, EnvelopeError> {
    let expires_at = unix_now().saturating_add(ttl.as_secs());
    encrypt_at(text, password, expires_at, params)
}

/// Seals `text` with an explicit absolute expiry.
pub fn encrypt_at(
    text: &str,
    password: &str,
    expires_at: u64,
    params: &KdfParams,
) -> Result<Vec<u8>, EnvelopeError> {
    let envelope = SecretEnvelope {
        text: text.to_owned(),
        expires_at,
    };

    let mut serialized = bincode::serialize(&envelope)
        .map_err(|e| EnvelopeError::EncryptionFailed(e.to_string()))?;

    let key = derive_key(password, params);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_ref())
        .map_err(|e| EnvelopeError::EncryptionFailed(e.to_string()))?;

    let sealed = cipher.encrypt(nonce, serialized.as_slice());
    serialized.zeroize();
    let ciphertext = sealed.map_err(|e| EnvelopeError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// Opens an envelope and returns the secret text if it has not expired.
pub fn decrypt(data: &[u8], password: &str, params: &KdfParams) -> Result<String, EnvelopeError> {
    decrypt_at(data, password, unix_now(), params)
}

/// Opens an envelope, judging expiry against the given Unix time.
pub fn decrypt_at(
    data: &[u8],
    password: &str,
    now: u64,
    params: &KdfParams,
) -> Result<String, EnvelopeError> {
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(EnvelopeError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let key = derive_key(password, params);

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_ref())
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    let decoded = bincode::deserialize::<SecretEnvelope>(&plaintext);
    plaintext.zeroize();
    let envelope = decoded.map_err(|_| EnvelopeError::DecryptionFailed)?;

    if envelope.is_expired_at(now) {
        return Err(EnvelopeError::Expired);
    }

    Ok(envelope.text.clone())
}
