// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share tokens and passphrases.

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

use crate::crypto::CryptoError;

/// Random bytes behind each share token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of generated passphrases.
pub const PASSPHRASE_LEN: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above it are discarded so every symbol is equally likely.
const REJECTION_LIMIT: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// New URL-safe share token. Independent of file id and creation order.
pub fn generate_token() -> Result<String, CryptoError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| CryptoError::RandomUnavailable)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Human-typeable alphanumeric passphrase of `len` characters.
pub fn generate_passphrase(len: usize) -> Result<String, CryptoError> {
    let rng = SystemRandom::new();
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 32];

    while out.len() < len {
        rng.fill(&mut buf)
            .map_err(|_| CryptoError::RandomUnavailable)?;
        for &b in buf.iter().filter(|&&b| b < REJECTION_LIMIT) {
            if out.len() == len {
                break;
            }
            out.push(ALPHABET[b as usize % ALPHABET.len()] as char);
        }
    }
    Ok(out)
}

/// Constant-time passphrase comparison.
pub fn passphrase_matches(expected: &str, supplied: &str) -> bool {
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}
