// Copyright (c) 2019-2024 The Caracal Project

use crate::Error;
use caracal_crypto_keys::{hash_to_point, PublicKey, SecretKey};
use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The "image" of a private key `x`: `I = x * Hp(P)`.
///
/// Consensus compares key images as raw bytes, so the ordering impls run
/// over the compressed encoding.
#[derive(Clone, Copy, Default, Zeroize)]
pub struct KeyImage {
    /// The curve point corresponding to the key image.
    pub point: CompressedEdwardsY,
}

// Serialized as the raw 32 compressed bytes.
impl Serialize for KeyImage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeyImage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            point: CompressedEdwardsY(<[u8; 32]>::deserialize(deserializer)?),
        })
    }
}

impl KeyImage {
    /// View the underlying compressed point as an array of bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.point.as_bytes()
    }

    /// Copies `self` into a new array.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.point.to_bytes()
    }

    /// Compute the image of `secret` against a known one-time output key.
    ///
    /// `public` must be the output key the secret opens; callers that have
    /// only the secret can use the `From` impl instead.
    pub fn generate(secret: &SecretKey, public: &PublicKey) -> Self {
        let Hp = hash_to_point(public.as_bytes());
        Self {
            point: (secret.as_scalar() * Hp).compress(),
        }
    }
}

impl From<&SecretKey> for KeyImage {
    fn from(x: &SecretKey) -> Self {
        let P = x.public_key();
        Self::generate(x, &P)
    }
}

// Many tests use this.
impl From<u64> for KeyImage {
    fn from(n: u64) -> Self {
        let secret = SecretKey::from_scalar(curve25519_dalek::scalar::Scalar::from(n));
        Self::from(&secret)
    }
}

impl TryFrom<[u8; 32]> for KeyImage {
    type Error = Error;

    fn try_from(src: [u8; 32]) -> Result<Self, Error> {
        Ok(Self {
            point: CompressedEdwardsY(src),
        })
    }
}

impl TryFrom<&[u8]> for KeyImage {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; 32] = src
            .try_into()
            .map_err(|_| Error::LengthMismatch(src.len(), 32))?;
        Self::try_from(bytes)
    }
}

impl AsRef<[u8; 32]> for KeyImage {
    fn as_ref(&self) -> &[u8; 32] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for KeyImage {
    fn as_ref(&self) -> &[u8] {
        &self.as_bytes()[..]
    }
}

impl PartialEq for KeyImage {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for KeyImage {}

impl Ord for KeyImage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl PartialOrd for KeyImage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for KeyImage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl fmt::Debug for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyImage(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn key_image_is_deterministic() {
        let mut rng = StdRng::from_seed([7u8; 32]);
        let secret = SecretKey::random(&mut rng);
        assert_eq!(KeyImage::from(&secret), KeyImage::from(&secret));
    }

    #[test]
    fn different_keys_different_images() {
        let mut rng = StdRng::from_seed([8u8; 32]);
        let a = SecretKey::random(&mut rng);
        let b = SecretKey::random(&mut rng);
        assert_ne!(KeyImage::from(&a), KeyImage::from(&b));
    }

    #[test]
    fn generate_matches_from_when_key_is_own_base_image() {
        let mut rng = StdRng::from_seed([9u8; 32]);
        let secret = SecretKey::random(&mut rng);
        let public = secret.public_key();
        assert_eq!(KeyImage::generate(&secret, &public), KeyImage::from(&secret));
    }

    #[test]
    fn bytes_roundtrip() {
        let image = KeyImage::from(42u64);
        let recovered = KeyImage::try_from(image.to_bytes()).unwrap();
        assert_eq!(image, recovered);
    }

    #[test]
    fn slice_with_wrong_length_is_rejected() {
        let short = [0u8; 16];
        assert_eq!(
            KeyImage::try_from(&short[..]),
            Err(Error::LengthMismatch(16, 32))
        );
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        let lo = KeyImage::try_from([1u8; 32]).unwrap();
        let hi = KeyImage::try_from([2u8; 32]).unwrap();
        assert!(lo < hi);
    }
}
