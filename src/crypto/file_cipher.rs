// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-file payload encryption.

use ring::rand::{SecureRandom, SystemRandom};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{aead, CryptoError, CryptoResult, KEY_LEN};

/// Random 256-bit key protecting exactly one file.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ContentKey([u8; KEY_LEN]);

impl ContentKey {
    pub fn generate() -> CryptoResult<Self> {
        let mut key = [0u8; KEY_LEN];
        SystemRandom::new()
            .fill(&mut key)
            .map_err(|_| CryptoError::RandomUnavailable)?;
        Ok(Self(key))
    }

    pub(crate) fn from_vec(mut bytes: Vec<u8>) -> CryptoResult<Self> {
        let result = <[u8; KEY_LEN]>::try_from(bytes.as_slice())
            .map(Self)
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_LEN,
                got: bytes.len(),
            });
        bytes.zeroize();
        result
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Whole-buffer AEAD for file payloads.
#[derive(Clone)]
pub struct FileCipher {
    rng: SystemRandom,
}

impl Default for FileCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCipher {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Encrypt a payload into `nonce || ciphertext || tag`.
    pub fn encrypt(&self, key: &ContentKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        aead::seal(&self.rng, key.expose(), plaintext)
    }

    /// Decrypt an envelope. [`CryptoError::Integrity`] means the file is
    /// corrupted or the key is wrong; it never means the file is missing.
    pub fn decrypt(&self, key: &ContentKey, envelope: &[u8]) -> CryptoResult<Vec<u8>> {
        aead::open(key.expose(), envelope)
    }
}
