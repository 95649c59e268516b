// Copyright (c) 2019-2024 The Caracal Project

//! Pedersen commitments over the Ed25519 group.

use crate::Error;
use caracal_crypto_keys::hash_to_point;
use core::fmt;
use curve25519_dalek::{
    constants::ED25519_BASEPOINT_COMPRESSED,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The value generator `H = Hp(G)`.
///
/// Nothing knows a discrete log relation between `G` and `H`, which is what
/// makes `xG + aH` binding.
pub fn generator_h() -> EdwardsPoint {
    hash_to_point(ED25519_BASEPOINT_COMPRESSED.as_bytes())
}

/// A Pedersen commitment `C = blinding * G + value * H` in decompressed form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Commitment {
    /// The commitment point.
    pub point: EdwardsPoint,
}

impl Commitment {
    /// Commit to `value` under `blinding`.
    pub fn new(value: u64, blinding: Scalar) -> Self {
        Self {
            point: EdwardsPoint::mul_base(&blinding) + Scalar::from(value) * generator_h(),
        }
    }

    /// Compress the commitment.
    pub fn compress(&self) -> CompressedCommitment {
        CompressedCommitment {
            point: self.point.compress(),
        }
    }
}

/// A compressed Pedersen commitment, as carried on outputs and ring members.
#[derive(Clone, Copy, Default, Eq, PartialEq, Zeroize)]
pub struct CompressedCommitment {
    /// The compressed commitment point.
    pub point: CompressedEdwardsY,
}

// Serialized as the raw 32 compressed bytes.
impl Serialize for CompressedCommitment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompressedCommitment {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bytes(<[u8; 32]>::deserialize(deserializer)?))
    }
}

impl CompressedCommitment {
    /// View the compressed point as bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.point.as_bytes()
    }

    /// Wrap raw compressed bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            point: CompressedEdwardsY(bytes),
        }
    }

    /// Decompress, failing on an invalid encoding.
    pub fn decompress(&self) -> Result<Commitment, Error> {
        Ok(Commitment {
            point: self.point.decompress().ok_or(Error::InvalidCurvePoint)?,
        })
    }
}

impl From<&Commitment> for CompressedCommitment {
    fn from(src: &Commitment) -> Self {
        src.compress()
    }
}

impl fmt::Debug for CompressedCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressedCommitment(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::traits::IsIdentity;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn generator_h_is_not_g_and_not_identity() {
        let H = generator_h();
        assert!(!H.is_identity());
        assert_ne!(
            H.compress(),
            curve25519_dalek::constants::ED25519_BASEPOINT_COMPRESSED
        );
    }

    #[test]
    fn commitments_are_homomorphic() {
        let mut rng = StdRng::from_seed([11u8; 32]);
        let b1 = Scalar::random(&mut rng);
        let b2 = Scalar::random(&mut rng);

        let sum = Commitment::new(3, b1).point + Commitment::new(4, b2).point;
        assert_eq!(sum, Commitment::new(7, b1 + b2).point);
    }

    #[test]
    fn compression_roundtrip() {
        let mut rng = StdRng::from_seed([12u8; 32]);
        let commitment = Commitment::new(1234, Scalar::random(&mut rng));
        let compressed = commitment.compress();
        assert_eq!(compressed.decompress().unwrap(), commitment);
    }
}
