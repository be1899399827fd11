// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wraps per-file content keys under the master key.

use std::sync::Arc;

use ring::rand::SystemRandom;

use super::{aead, ContentKey, CryptoError, CryptoResult, MasterKey};

/// AEAD key wrapping under one injected [`MasterKey`].
///
/// Wrapped layout: `nonce(12) || encrypted key(32) || tag(16)`.
#[derive(Clone)]
pub struct KeyWrapCipher {
    master: Arc<MasterKey>,
    rng: SystemRandom,
}

impl KeyWrapCipher {
    pub fn new(master: Arc<MasterKey>) -> Self {
        Self {
            master,
            rng: SystemRandom::new(),
        }
    }

    pub fn wrap(&self, key: &ContentKey) -> CryptoResult<Vec<u8>> {
        aead::seal(&self.rng, self.master.expose(), key.expose())
    }

    /// Recover a content key. A wrapped key that fails authentication, or
    /// that decrypts to anything but 32 bytes, is an integrity failure.
    pub fn unwrap(&self, wrapped: &[u8]) -> CryptoResult<ContentKey> {
        let plaintext = aead::open(self.master.expose(), wrapped)?;
        ContentKey::from_vec(plaintext).map_err(|_| CryptoError::Integrity)
    }
}
