// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide master key.
//!
//! Loaded once at startup from an external secret (the `MASTER_KEY`
//! environment variable, hex encoded) and shared read-only for the process
//! lifetime. It is never persisted, serialized, or printed: `Debug` is
//! redacted and the bytes are zeroized on drop.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{CryptoError, CryptoResult, KEY_LEN};

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    /// Build from raw key bytes. Anything other than 32 bytes is rejected.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Parse a hex-encoded key (64 hex characters).
    pub fn from_hex(encoded: &str) -> CryptoResult<Self> {
        let mut bytes = hex::decode(encoded.trim()).map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_LEN,
            got: encoded.trim().len() / 2,
        })?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}
