// Copyright (c) 2019-2024 The Caracal Project

//! Caracal curve key types.
//!
//! Thin newtypes over curve25519-dalek Ed25519 scalars and compressed
//! points, plus the Keccak-256 `H_s` / `H_p` primitives the CryptoNote
//! key derivation scheme is built from. Secret material zeroizes when it
//! goes out of scope.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

mod hashes;

pub use hashes::{hash_to_point, hash_to_scalar, keccak256};

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use displaydoc::Display;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

/// An error that can occur when handling key material.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum KeyError {
    /// Bytes do not encode a valid curve point
    InvalidPoint,

    /// Bytes do not encode a canonical scalar
    InvalidScalar,

    /// Expected {0} bytes, found {1}
    LengthMismatch(usize, usize),
}

/// A compressed Ed25519 point.
///
/// The all-zero byte string is the distinguished null point; it is not a
/// valid curve point and decompression of it fails.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct PublicKey(CompressedEdwardsY);

// Serialized as the raw 32 compressed bytes.
impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bytes(<[u8; 32]>::deserialize(deserializer)?))
    }
}

impl PublicKey {
    /// The all-zero null point.
    pub const fn null() -> Self {
        Self(CompressedEdwardsY([0u8; 32]))
    }

    /// Wrap raw compressed-point bytes. Validity is checked on decompression.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(CompressedEdwardsY(bytes))
    }

    /// View the compressed point as bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Copy the compressed point out as bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Decompress to an Edwards point.
    pub fn decompress(&self) -> Result<EdwardsPoint, KeyError> {
        self.0.decompress().ok_or(KeyError::InvalidPoint)
    }

    /// Whether this is the all-zero null point.
    pub fn is_null(&self) -> bool {
        bool::from(self.0.as_bytes().ct_eq(&[0u8; 32]))
    }
}

impl From<EdwardsPoint> for PublicKey {
    fn from(point: EdwardsPoint) -> Self {
        Self(point.compress())
    }
}

impl From<&EdwardsPoint> for PublicKey {
    fn from(point: &EdwardsPoint) -> Self {
        Self(point.compress())
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;

    fn try_from(src: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = src
            .try_into()
            .map_err(|_| KeyError::LengthMismatch(32, src.len()))?;
        Ok(Self::from_bytes(bytes))
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.as_bytes()[..]
    }
}

// Comparisons run over the compressed bytes, which is also the order
// consensus rules are phrased in (memcmp).
impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Zeroize for PublicKey {
    fn zeroize(&mut self) {
        self.0 .0.zeroize()
    }
}

/// A curve scalar used as secret key material.
///
/// Zeroized on drop. The all-zero scalar is the distinguished null secret,
/// used by watch-only accounts that hold no spend authority.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey(Scalar);

impl SecretKey {
    /// The all-zero null secret.
    pub const fn null() -> Self {
        Self(Scalar::ZERO)
    }

    /// Wrap an already-reduced scalar.
    pub const fn from_scalar(scalar: Scalar) -> Self {
        Self(scalar)
    }

    /// Reduce 32 bytes into the scalar field.
    pub fn from_bytes_mod_order(bytes: [u8; 32]) -> Self {
        Self(Scalar::from_bytes_mod_order(bytes))
    }

    /// Interpret bytes as a canonical scalar, rejecting unreduced values.
    pub fn from_canonical_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))
            .map(Self)
            .ok_or(KeyError::InvalidScalar)
    }

    /// Sample a uniformly random scalar.
    pub fn random<T: RngCore + CryptoRng>(rng: &mut T) -> Self {
        Self(Scalar::random(rng))
    }

    /// Borrow the underlying scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// Copy the scalar out as bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// The public point `secret · G`.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(EdwardsPoint::mul_base(&self.0))
    }

    /// Whether this is the all-zero null secret. Constant time.
    pub fn is_null(&self) -> bool {
        bool::from(self.0.to_bytes().ct_eq(&[0u8; 32]))
    }
}

impl From<Scalar> for SecretKey {
    fn from(scalar: Scalar) -> Self {
        Self(scalar)
    }
}

impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret scalars.
        write!(f, "SecretKey(<redacted>)")
    }
}

/// A (secret scalar, derived public point) pair.
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct Keypair {
    /// The secret scalar.
    pub secret: SecretKey,
    /// The public point `secret · G`.
    pub public: PublicKey,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn generate<T: RngCore + CryptoRng>(rng: &mut T) -> Self {
        Self::from_secret(SecretKey::random(rng))
    }

    /// Build the keypair for a known secret.
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Reduce a 32-byte seed into the scalar field and derive the public
    /// point. The reduction step is consensus-visible for deterministic
    /// keypairs and must not be skipped.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_secret(SecretKey::from_bytes_mod_order(*seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn public_key_matches_base_mul() {
        let mut rng = StdRng::from_seed([1u8; 32]);
        let keypair = Keypair::generate(&mut rng);
        let expected = PublicKey::from(EdwardsPoint::mul_base(keypair.secret.as_scalar()));
        assert_eq!(keypair.public, expected);
    }

    #[test]
    fn from_seed_reduces_and_is_deterministic() {
        let seed = [0xffu8; 32];
        let a = Keypair::from_seed(&seed);
        let b = Keypair::from_seed(&seed);
        assert_eq!(a.public, b.public);
        // The unreduced seed is above the group order, so the stored scalar
        // must differ from the raw seed bytes.
        assert_ne!(a.secret.to_bytes(), seed);
        assert_eq!(a.public, a.secret.public_key());
    }

    #[test]
    fn null_point_does_not_decompress() {
        assert!(PublicKey::null().is_null());
        assert!(PublicKey::null().decompress().is_err());
    }

    #[test]
    fn null_secret_detected() {
        assert!(SecretKey::null().is_null());
        let mut rng = StdRng::from_seed([2u8; 32]);
        assert!(!SecretKey::random(&mut rng).is_null());
    }

    #[test]
    fn public_key_ordering_is_byte_order() {
        let a = PublicKey::from_bytes([1u8; 32]);
        let b = PublicKey::from_bytes([2u8; 32]);
        assert!(a < b);
    }

    #[test]
    fn try_from_rejects_wrong_length() {
        let short = [0u8; 16];
        assert_eq!(
            PublicKey::try_from(&short[..]),
            Err(KeyError::LengthMismatch(32, 16))
        );
    }

    #[test]
    fn canonical_scalar_roundtrip() {
        let mut rng = StdRng::from_seed([3u8; 32]);
        let secret = SecretKey::random(&mut rng);
        let recovered = SecretKey::from_canonical_bytes(secret.to_bytes()).unwrap();
        assert_eq!(secret, recovered);

        // All-ones is far above the group order and must be rejected.
        assert_eq!(
            SecretKey::from_canonical_bytes([0xffu8; 32]),
            Err(KeyError::InvalidScalar)
        );
    }
}
