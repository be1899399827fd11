// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Envelope Cryptography
//!
//! Two layers of AES-256-GCM share one envelope layout:
//!
//! ```text
//! nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! - [`FileCipher`] seals file payloads under a per-file [`ContentKey`].
//! - [`KeyWrapCipher`] seals content keys under the process-wide [`MasterKey`].
//!
//! Every seal draws a fresh nonce from the operating system CSPRNG. Nothing
//! here keeps counters or other shared state, so all operations are safe to
//! call concurrently without locking.

pub mod aead;
pub mod file_cipher;
pub mod key_wrap;
pub mod master_key;

pub use file_cipher::{ContentKey, FileCipher};
pub use key_wrap::KeyWrapCipher;
pub use master_key::MasterKey;

/// Symmetric key length for AES-256-GCM.
pub const KEY_LEN: usize = 32;

/// Nonce length (96 bits).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length (128 bits).
pub const TAG_LEN: usize = 16;

/// Smallest well-formed envelope: an empty plaintext still carries nonce and tag.
pub const MIN_ENVELOPE_LEN: usize = NONCE_LEN + TAG_LEN;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Tag did not authenticate, or the envelope is too short to carry one.
    /// Either the data was tampered with or the wrong key was used.
    #[error("integrity check failed")]
    Integrity,

    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("secure random source unavailable")]
    RandomUnavailable,

    /// The cipher refused to seal, e.g. a payload beyond the AEAD limit.
    #[error("encryption failed")]
    Encryption,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
