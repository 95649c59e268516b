// Copyright (c) 2019-2024 The Caracal Project

//! Legacy (v1) ring signatures.
//!
//! One `(c, r)` pair per ring member; the challenge scalars are forced to
//! sum to `H_s(prefix_hash ‖ L_0 ‖ R_0 ‖ … ‖ L_{n-1} ‖ R_{n-1})`, which the
//! real signer can only arrange with knowledge of one member's secret key
//! and the matching key image.

use crate::{Error, KeyImage};
use alloc::{vec, vec::Vec};
use caracal_crypto_keys::{hash_to_point, hash_to_scalar, PublicKey, SecretKey};
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar, traits::VartimeMultiscalarMul};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// One ring member's share of a v1 ring signature.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RingSigElement {
    /// Challenge share.
    pub c: Scalar,
    /// Response.
    pub r: Scalar,
}

/// Sign `prefix_hash` over `ring` with the secret at `real_index`.
///
/// `key_image` must be `secret * Hp(ring[real_index])`; consensus links
/// double-spends through it, so a mismatched image produces a signature
/// that verifiers reject.
pub fn generate_ring_signature<RNG: CryptoRng + RngCore>(
    prefix_hash: &[u8; 32],
    key_image: &KeyImage,
    ring: &[PublicKey],
    secret: &SecretKey,
    real_index: usize,
    rng: &mut RNG,
) -> Result<Vec<RingSigElement>, Error> {
    let ring_size = ring.len();
    if ring_size == 0 || real_index >= ring_size {
        return Err(Error::IndexOutOfBounds);
    }

    let I = key_image
        .point
        .decompress()
        .ok_or(Error::InvalidKeyImage)?;

    let mut buf = Vec::with_capacity(32 + ring_size * 64);
    buf.extend_from_slice(prefix_hash);

    let mut sigs = vec![RingSigElement::default(); ring_size];
    let mut challenge_sum = Scalar::ZERO;
    // The real member's nonce; wiped when signing completes.
    let k = Zeroizing::new(Scalar::random(rng));

    for (i, member) in ring.iter().enumerate() {
        let P = member.decompress()?;
        let Hp = hash_to_point(member.as_bytes());

        let (L, R) = if i == real_index {
            (EdwardsPoint::mul_base(&k), *k * Hp)
        } else {
            sigs[i].c = Scalar::random(rng);
            sigs[i].r = Scalar::random(rng);
            challenge_sum += sigs[i].c;
            let L = EdwardsPoint::mul_base(&sigs[i].r) + sigs[i].c * P;
            let R = EdwardsPoint::vartime_multiscalar_mul([sigs[i].r, sigs[i].c], [Hp, I]);
            (L, R)
        };

        buf.extend_from_slice(L.compress().as_bytes());
        buf.extend_from_slice(R.compress().as_bytes());
    }

    let challenge = hash_to_scalar(&buf);
    sigs[real_index].c = challenge - challenge_sum;
    sigs[real_index].r = *k - sigs[real_index].c * secret.as_scalar();

    Ok(sigs)
}

/// Verify a v1 ring signature.
pub fn check_ring_signature(
    prefix_hash: &[u8; 32],
    key_image: &KeyImage,
    ring: &[PublicKey],
    sigs: &[RingSigElement],
) -> bool {
    if ring.is_empty() || sigs.len() != ring.len() {
        return false;
    }
    let Some(I) = key_image.point.decompress() else {
        return false;
    };

    let mut buf = Vec::with_capacity(32 + ring.len() * 64);
    buf.extend_from_slice(prefix_hash);
    let mut challenge_sum = Scalar::ZERO;

    for (member, sig) in ring.iter().zip(sigs.iter()) {
        let Ok(P) = member.decompress() else {
            return false;
        };
        let Hp = hash_to_point(member.as_bytes());

        let L = EdwardsPoint::mul_base(&sig.r) + sig.c * P;
        let R = EdwardsPoint::vartime_multiscalar_mul([sig.r, sig.c], [Hp, I]);

        buf.extend_from_slice(L.compress().as_bytes());
        buf.extend_from_slice(R.compress().as_bytes());
        challenge_sum += sig.c;
    }

    hash_to_scalar(&buf) == challenge_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn make_ring(rng: &mut StdRng, size: usize, real_index: usize) -> (Vec<PublicKey>, SecretKey) {
        let secret = SecretKey::random(rng);
        let mut ring: Vec<PublicKey> = (0..size)
            .map(|_| SecretKey::random(rng).public_key())
            .collect();
        ring[real_index] = secret.public_key();
        (ring, secret)
    }

    #[test]
    fn sign_and_verify() {
        let mut rng = StdRng::from_seed([31u8; 32]);
        let (ring, secret) = make_ring(&mut rng, 11, 4);
        let key_image = KeyImage::from(&secret);
        let prefix_hash = [9u8; 32];

        let sigs =
            generate_ring_signature(&prefix_hash, &key_image, &ring, &secret, 4, &mut rng)
                .unwrap();
        assert_eq!(sigs.len(), ring.len());
        assert!(check_ring_signature(&prefix_hash, &key_image, &ring, &sigs));
    }

    #[test]
    fn rejects_wrong_message() {
        let mut rng = StdRng::from_seed([32u8; 32]);
        let (ring, secret) = make_ring(&mut rng, 5, 0);
        let key_image = KeyImage::from(&secret);

        let sigs =
            generate_ring_signature(&[1u8; 32], &key_image, &ring, &secret, 0, &mut rng).unwrap();
        assert!(!check_ring_signature(&[2u8; 32], &key_image, &ring, &sigs));
    }

    #[test]
    fn rejects_wrong_key_image() {
        let mut rng = StdRng::from_seed([33u8; 32]);
        let (ring, secret) = make_ring(&mut rng, 5, 2);
        let key_image = KeyImage::from(&secret);
        let wrong_image = KeyImage::from(77u64);

        let sigs =
            generate_ring_signature(&[3u8; 32], &key_image, &ring, &secret, 2, &mut rng).unwrap();
        assert!(!check_ring_signature(&[3u8; 32], &wrong_image, &ring, &sigs));
    }

    #[test]
    fn real_index_out_of_bounds_is_an_error() {
        let mut rng = StdRng::from_seed([34u8; 32]);
        let (ring, secret) = make_ring(&mut rng, 3, 0);
        let key_image = KeyImage::from(&secret);

        assert_eq!(
            generate_ring_signature(&[0u8; 32], &key_image, &ring, &secret, 3, &mut rng),
            Err(Error::IndexOutOfBounds)
        );
    }
}
