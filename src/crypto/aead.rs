// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM seal/open over `nonce || ciphertext || tag` envelopes.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use super::{CryptoError, CryptoResult, KEY_LEN, MIN_ENVELOPE_LEN, NONCE_LEN};

fn aead_key(key: &[u8; KEY_LEN]) -> CryptoResult<LessSafeKey> {
    let unbound = UnboundKey::new(&AES_256_GCM, key).map_err(|_| CryptoError::InvalidKeyLength {
        expected: KEY_LEN,
        got: key.len(),
    })?;
    Ok(LessSafeKey::new(unbound))
}

/// Draw a fresh nonce. Never derived from a counter.
fn random_nonce(rng: &SystemRandom) -> CryptoResult<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill(&mut nonce)
        .map_err(|_| CryptoError::RandomUnavailable)?;
    Ok(nonce)
}

/// Encrypt `plaintext`, returning `nonce || ciphertext || tag`.
pub fn seal(rng: &SystemRandom, key: &[u8; KEY_LEN], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let key = aead_key(key)?;
    let nonce_bytes = random_nonce(rng)?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| CryptoError::Encryption)?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + in_out.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&in_out);
    Ok(envelope)
}

/// Authenticate and decrypt an envelope produced by [`seal`].
///
/// Any failure, including a truncated envelope, is [`CryptoError::Integrity`].
/// No plaintext is returned unless the tag verifies.
pub fn open(key: &[u8; KEY_LEN], envelope: &[u8]) -> CryptoResult<Vec<u8>> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return Err(CryptoError::Integrity);
    }

    let key = aead_key(key)?;
    let (nonce_bytes, sealed) = envelope.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CryptoError::Integrity)?;

    let mut in_out = sealed.to_vec();
    let plaintext_len = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Integrity)?
        .len();
    in_out.truncate(plaintext_len);
    Ok(in_out)
}

/// Nonce prefix of an envelope, if it is long enough to carry one.
pub fn envelope_nonce(envelope: &[u8]) -> Option<&[u8]> {
    envelope.get(..NONCE_LEN)
}
