//! Cryptographic operations for genstega.
//!
//! This module provides:
//! - Password-based key derivation (PBKDF2-HMAC-SHA256, fixed configured salt)
//! - Time-boxed secret envelopes (bincode + ChaCha20Poly1305)

pub mod envelope;
pub mod kdf;

pub use envelope::{
    decrypt, decrypt_at, encrypt, encrypt_at, unix_now, EnvelopeError, SecretEnvelope,
    DEFAULT_TTL,
};
pub use kdf::{derive_key, DerivedKey, KdfParams, DEFAULT_ITERATIONS, MIN_ITERATIONS};
