// Copyright (c) 2019-2024 The Caracal Project

//! Keccak-256 hashing primitives for key derivation.

use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
    traits::IsIdentity,
};
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `H_s`: Keccak-256 reduced into the scalar field.
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order(keccak256(data))
}

/// `H_p`: map arbitrary bytes to a prime-order Edwards point.
///
/// Iterated Keccak-256 until the digest decompresses, then the cofactor is
/// cleared by multiplying by 8. The iteration count is data-dependent but
/// the output is deterministic, which is what key images require; this map
/// is a consensus constant of the chain.
pub fn hash_to_point(data: &[u8]) -> EdwardsPoint {
    let mut candidate = keccak256(data);
    loop {
        if let Some(point) = CompressedEdwardsY(candidate).decompress() {
            let point = point.mul_by_cofactor();
            if !point.is_identity() {
                return point;
            }
        }
        candidate = keccak256(&candidate);
    }
}
