// Copyright (c) 2019-2024 The Caracal Project

//! One-time ("stealth") output key derivation.
//!
//! Senders derive a fresh output key for every destination from the
//! Diffie–Hellman point `D = 8 * (r * V)` shared with the recipient's view
//! key, so only the recipient can link the output back to their address:
//!
//! ```text
//! D        = 8 * (tx_secret * view_public)
//! s_i      = H_s(D ‖ varint(i))
//! out_key  = s_i * G + spend_public
//! ```
//!
//! The same scalar `s_i` doubles as the per-output amount key for RingCT
//! amount encryption and commitment-mask derivation.

use crate::domain_separators::{
    AMOUNT_DOMAIN_TAG, COMMITMENT_MASK_DOMAIN_TAG, ENCRYPTED_PAYMENT_ID_TAIL, VIEW_TAG_DOMAIN_TAG,
};
use alloc::vec::Vec;
use caracal_crypto_keys::{hash_to_scalar, keccak256, KeyError, PublicKey, SecretKey};
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The shared-secret point of an output derivation, in compressed form.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, Zeroize)]
pub struct KeyDerivation([u8; 32]);

impl KeyDerivation {
    /// View the compressed shared point as bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Wrap raw derivation bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

// CryptoNote varints: LEB128 without a length cap beyond u64.
fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

/// `D = 8 * (secret * P)`, the Diffie–Hellman half of output derivation.
///
/// The cofactor multiplication forces the result into the prime-order
/// subgroup regardless of the peer-supplied point.
pub fn generate_key_derivation(
    public: &PublicKey,
    secret: &SecretKey,
) -> Result<KeyDerivation, KeyError> {
    let point = public.decompress()?;
    let shared = (secret.as_scalar() * point).mul_by_cofactor();
    Ok(KeyDerivation(shared.compress().to_bytes()))
}

/// `H_s(D ‖ varint(i))` — the per-output scalar, also the amount key.
pub fn derivation_to_scalar(derivation: &KeyDerivation, output_index: u64) -> Scalar {
    let mut buf = Vec::with_capacity(32 + 10);
    buf.extend_from_slice(derivation.as_bytes());
    encode_varint(output_index, &mut buf);
    hash_to_scalar(&buf)
}

/// Derive the one-time output public key `H_s(D ‖ i) * G + spend_public`.
pub fn derive_public_key(
    derivation: &KeyDerivation,
    output_index: u64,
    spend_public: &PublicKey,
) -> Result<PublicKey, KeyError> {
    let scalar = derivation_to_scalar(derivation, output_index);
    let spend = spend_public.decompress()?;
    Ok(PublicKey::from(EdwardsPoint::mul_base(&scalar) + spend))
}

/// Derive the one-time output secret key `H_s(D ‖ i) + spend_secret`.
pub fn derive_secret_key(
    derivation: &KeyDerivation,
    output_index: u64,
    spend_secret: &SecretKey,
) -> SecretKey {
    let scalar = derivation_to_scalar(derivation, output_index);
    SecretKey::from_scalar(scalar + spend_secret.as_scalar())
}

/// Recover the spend public key an output was derived for:
/// `out_key - H_s(D ‖ i) * G`.
///
/// Wallets use this against their subaddress table to decide ownership.
pub fn recover_public_spend_key(
    derivation: &KeyDerivation,
    output_index: u64,
    output_key: &PublicKey,
) -> Result<PublicKey, KeyError> {
    let scalar = derivation_to_scalar(derivation, output_index);
    let out_point = output_key.decompress()?;
    Ok(PublicKey::from(
        out_point - EdwardsPoint::mul_base(&scalar),
    ))
}

/// The one-byte scan hint: `keccak("view_tag" ‖ D ‖ varint(i))[0]`.
pub fn derive_view_tag(derivation: &KeyDerivation, output_index: u64) -> u8 {
    let mut buf = Vec::with_capacity(VIEW_TAG_DOMAIN_TAG.len() + 32 + 10);
    buf.extend_from_slice(VIEW_TAG_DOMAIN_TAG);
    buf.extend_from_slice(derivation.as_bytes());
    encode_varint(output_index, &mut buf);
    keccak256(&buf)[0]
}

/// Deterministic commitment mask: `H_s("commitment_mask" ‖ k)`.
pub fn commitment_mask(amount_key: &Scalar) -> Scalar {
    let mut buf = Vec::with_capacity(COMMITMENT_MASK_DOMAIN_TAG.len() + 32);
    buf.extend_from_slice(COMMITMENT_MASK_DOMAIN_TAG);
    buf.extend_from_slice(&amount_key.to_bytes());
    let mask = hash_to_scalar(&buf);
    buf.zeroize();
    mask
}

fn amount_keystream(amount_key: &Scalar) -> [u8; 8] {
    let mut buf = Vec::with_capacity(AMOUNT_DOMAIN_TAG.len() + 32);
    buf.extend_from_slice(AMOUNT_DOMAIN_TAG);
    buf.extend_from_slice(&amount_key.to_bytes());
    let digest = keccak256(&buf);
    buf.zeroize();
    digest[0..8].try_into().expect("8-byte prefix of a 32-byte digest")
}

/// Encrypt an amount for the ECDH info field: XOR against
/// `keccak("amount" ‖ k)[0..8]`.
pub fn encrypt_amount(amount: u64, amount_key: &Scalar) -> [u8; 8] {
    let keystream = amount_keystream(amount_key);
    let mut out = amount.to_le_bytes();
    for (byte, pad) in out.iter_mut().zip(keystream.iter()) {
        *byte ^= pad;
    }
    out
}

/// Inverse of [`encrypt_amount`].
pub fn decrypt_amount(encrypted: &[u8; 8], amount_key: &Scalar) -> u64 {
    let keystream = amount_keystream(amount_key);
    let mut out = *encrypted;
    for (byte, pad) in out.iter_mut().zip(keystream.iter()) {
        *byte ^= pad;
    }
    u64::from_le_bytes(out)
}

/// XOR a short payment id with `keccak(D ‖ 0x8d)[0..8]`.
///
/// Applying the keystream twice decrypts, so the same routine serves both
/// directions.
pub fn encrypt_short_payment_id(payment_id: [u8; 8], derivation: &KeyDerivation) -> [u8; 8] {
    let mut buf = Vec::with_capacity(33);
    buf.extend_from_slice(derivation.as_bytes());
    buf.push(ENCRYPTED_PAYMENT_ID_TAIL);
    let digest = keccak256(&buf);
    let mut out = payment_id;
    for (byte, pad) in out.iter_mut().zip(digest[0..8].iter()) {
        *byte ^= pad;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn test_derivation(seed: u8) -> (SecretKey, SecretKey, KeyDerivation) {
        let mut rng = StdRng::from_seed([seed; 32]);
        let tx_secret = SecretKey::random(&mut rng);
        let view_secret = SecretKey::random(&mut rng);
        let derivation =
            generate_key_derivation(&view_secret.public_key(), &tx_secret).unwrap();
        (tx_secret, view_secret, derivation)
    }

    #[test]
    fn derivation_commutes() {
        let (tx_secret, view_secret, sender_side) = test_derivation(21);
        let receiver_side =
            generate_key_derivation(&tx_secret.public_key(), &view_secret).unwrap();
        assert_eq!(sender_side, receiver_side);
    }

    #[test]
    fn derived_public_matches_derived_secret() {
        let mut rng = StdRng::from_seed([22u8; 32]);
        let spend = SecretKey::random(&mut rng);
        let (_, _, derivation) = test_derivation(23);

        let derived_public = derive_public_key(&derivation, 3, &spend.public_key()).unwrap();
        let derived_secret = derive_secret_key(&derivation, 3, &spend);
        assert_eq!(derived_secret.public_key(), derived_public);
    }

    #[test]
    fn recover_spend_key_inverts_derivation() {
        let mut rng = StdRng::from_seed([24u8; 32]);
        let spend_public = SecretKey::random(&mut rng).public_key();
        let (_, _, derivation) = test_derivation(25);

        let out_key = derive_public_key(&derivation, 7, &spend_public).unwrap();
        let recovered = recover_public_spend_key(&derivation, 7, &out_key).unwrap();
        assert_eq!(recovered, spend_public);
    }

    #[test]
    fn scalars_differ_by_output_index() {
        let (_, _, derivation) = test_derivation(26);
        assert_ne!(
            derivation_to_scalar(&derivation, 0),
            derivation_to_scalar(&derivation, 1)
        );
    }

    #[test]
    fn view_tag_is_stable() {
        let (_, _, derivation) = test_derivation(27);
        assert_eq!(
            derive_view_tag(&derivation, 0),
            derive_view_tag(&derivation, 0)
        );
    }

    #[test]
    fn amount_encryption_roundtrip() {
        let (_, _, derivation) = test_derivation(28);
        let amount_key = derivation_to_scalar(&derivation, 0);
        let encrypted = encrypt_amount(123_456_789, &amount_key);
        assert_ne!(encrypted, 123_456_789u64.to_le_bytes());
        assert_eq!(decrypt_amount(&encrypted, &amount_key), 123_456_789);
    }

    #[test]
    fn payment_id_encryption_is_an_involution() {
        let (_, _, derivation) = test_derivation(29);
        let payment_id = [0x5au8; 8];
        let encrypted = encrypt_short_payment_id(payment_id, &derivation);
        assert_ne!(encrypted, payment_id);
        assert_eq!(encrypt_short_payment_id(encrypted, &derivation), payment_id);
    }

    #[test]
    fn varint_encoding_of_large_indices() {
        // Indices above 127 must take the multi-byte path and still produce
        // distinct scalars.
        let (_, _, derivation) = test_derivation(30);
        assert_ne!(
            derivation_to_scalar(&derivation, 127),
            derivation_to_scalar(&derivation, 128)
        );
    }
}
