// Copyright (c) 2019-2024 The Caracal Project

use crate::domain_separators::SUBADDRESS_DOMAIN_TAG;
use alloc::{collections::BTreeMap, vec::Vec};
use caracal_crypto_keys::{hash_to_scalar, KeyError, PublicKey, SecretKey};
use core::fmt;
use curve25519_dalek::edwards::EdwardsPoint;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// A Caracal public address: the `(spend, view)` point pair a sender
/// derives stealth outputs against.
///
/// Subaddresses carry the same shape but a different derivation path;
/// the flag changes how the transaction public key is formed when a
/// subaddress is the sole destination.
#[derive(
    Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Zeroize,
)]
pub struct PublicAddress {
    /// The public spend key `B` (or subaddress spend key `D`).
    spend_public: PublicKey,

    /// The public view key `A` (or subaddress view key `C`).
    view_public: PublicKey,

    /// Whether this address was derived through the subaddress path.
    is_subaddress: bool,
}

impl PublicAddress {
    /// Create a standard address from its key pair.
    pub fn new(spend_public: PublicKey, view_public: PublicKey) -> Self {
        Self {
            spend_public,
            view_public,
            is_subaddress: false,
        }
    }

    /// Create a subaddress from its derived key pair.
    pub fn new_subaddress(spend_public: PublicKey, view_public: PublicKey) -> Self {
        Self {
            spend_public,
            view_public,
            is_subaddress: true,
        }
    }

    /// Parse an address from hex-encoded spend and view keys.
    ///
    /// Point validity is checked on first use, as with any compressed key.
    pub fn from_hex(spend_hex: &str, view_hex: &str, is_subaddress: bool) -> Result<Self, KeyError> {
        let parse = |src: &str| -> Result<PublicKey, KeyError> {
            let bytes: Vec<u8> =
                hex::decode(src).map_err(|_| KeyError::LengthMismatch(64, src.len()))?;
            PublicKey::try_from(&bytes[..])
        };
        Ok(Self {
            spend_public: parse(spend_hex)?,
            view_public: parse(view_hex)?,
            is_subaddress,
        })
    }

    /// Get the public spend key.
    pub fn spend_public_key(&self) -> &PublicKey {
        &self.spend_public
    }

    /// Get the public view key.
    pub fn view_public_key(&self) -> &PublicKey {
        &self.view_public
    }

    /// Whether this address was derived through the subaddress path.
    pub fn is_subaddress(&self) -> bool {
        self.is_subaddress
    }
}

impl fmt::Display for PublicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Car")?;
        for byte in self
            .spend_public
            .as_bytes()
            .iter()
            .chain(self.view_public.as_bytes().iter())
        {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A subaddress position within an account: `(major, minor)`.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct SubaddressIndex {
    /// The account ("major") index.
    pub major: u32,
    /// The address ("minor") index within the account.
    pub minor: u32,
}

impl SubaddressIndex {
    /// Build an index pair.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// `(0, 0)` addresses the account's standard address.
    pub const fn is_zero(&self) -> bool {
        self.major == 0 && self.minor == 0
    }
}

/// Complete account keys: the `(a, b)` secret pair and the standard
/// address derived from it. Watch-only accounts carry the null spend
/// secret and can derive everything except signatures.
///
/// This should only ever be present in client code.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct AccountKeys {
    /// Private key `a` used for view-key matching.
    view_secret: SecretKey,

    /// Private key `b` used for spending; all-zero for watch-only.
    spend_secret: SecretKey,

    /// The standard address `(B, A)`.
    address: PublicAddress,
}

impl AccountKeys {
    /// A user's account keys.
    ///
    /// # Arguments
    /// * `spend_secret` - The user's private spend key `b`.
    /// * `view_secret` - The user's private view key `a`.
    pub fn new(spend_secret: SecretKey, view_secret: SecretKey) -> Self {
        let address = PublicAddress::new(spend_secret.public_key(), view_secret.public_key());
        Self {
            view_secret,
            spend_secret,
            address,
        }
    }

    /// Watch-only account keys: the view secret plus the public spend key.
    pub fn view_only(view_secret: SecretKey, spend_public: PublicKey) -> Self {
        let address = PublicAddress::new(spend_public, view_secret.public_key());
        Self {
            view_secret,
            spend_secret: SecretKey::null(),
            address,
        }
    }

    /// Create account keys with random secrets (intended for tests).
    pub fn random<T: RngCore + CryptoRng>(rng: &mut T) -> Self {
        Self::new(SecretKey::random(rng), SecretKey::random(rng))
    }

    /// Get the view private key.
    pub fn view_secret_key(&self) -> &SecretKey {
        &self.view_secret
    }

    /// Get the spend private key.
    pub fn spend_secret_key(&self) -> &SecretKey {
        &self.spend_secret
    }

    /// Get the standard address.
    pub fn address(&self) -> &PublicAddress {
        &self.address
    }

    /// Whether this account holds no spend authority. Constant time over
    /// the secret bytes.
    pub fn is_watch_only(&self) -> bool {
        self.spend_secret.is_null()
    }

    /// The subaddress secret `m = H_s("SubAddr\0" ‖ a ‖ major ‖ minor)`.
    pub fn subaddress_secret(&self, index: SubaddressIndex) -> SecretKey {
        let mut buf = Vec::with_capacity(SUBADDRESS_DOMAIN_TAG.len() + 32 + 8);
        buf.extend_from_slice(SUBADDRESS_DOMAIN_TAG);
        buf.extend_from_slice(&self.view_secret.to_bytes());
        buf.extend_from_slice(&index.major.to_le_bytes());
        buf.extend_from_slice(&index.minor.to_le_bytes());
        let scalar = hash_to_scalar(&buf);
        buf.zeroize();
        SecretKey::from_scalar(scalar)
    }

    /// The spend secret opening outputs sent to the given subaddress:
    /// `b + m` (just `b` at index zero).
    pub fn subaddress_spend_secret(&self, index: SubaddressIndex) -> SecretKey {
        if index.is_zero() {
            return self.spend_secret.clone();
        }
        let m = self.subaddress_secret(index);
        SecretKey::from_scalar(self.spend_secret.as_scalar() + m.as_scalar())
    }

    /// The i^th subaddress `(D, C) = (B + m·G, a·D)`.
    pub fn subaddress(&self, index: SubaddressIndex) -> Result<PublicAddress, KeyError> {
        if index.is_zero() {
            return Ok(self.address.clone());
        }
        let m = self.subaddress_secret(index);
        let spend_point = self.address.spend_public_key().decompress()?
            + EdwardsPoint::mul_base(m.as_scalar());
        let view_point = self.view_secret.as_scalar() * spend_point;
        Ok(PublicAddress::new_subaddress(
            PublicKey::from(spend_point),
            PublicKey::from(view_point),
        ))
    }

    /// Build the spend-key lookup table wallets scan against, covering
    /// `major ∈ [0, majors)` × `minor ∈ [0, minors)`.
    pub fn subaddress_map(
        &self,
        majors: u32,
        minors: u32,
    ) -> Result<BTreeMap<PublicKey, SubaddressIndex>, KeyError> {
        let mut map = BTreeMap::new();
        for major in 0..majors {
            for minor in 0..minors {
                let index = SubaddressIndex::new(major, minor);
                let address = self.subaddress(index)?;
                map.insert(*address.spend_public_key(), index);
            }
        }
        Ok(map)
    }

    /// The one-entry map covering only the standard address.
    pub fn default_subaddress_map(&self) -> BTreeMap<PublicKey, SubaddressIndex> {
        let mut map = BTreeMap::new();
        map.insert(*self.address.spend_public_key(), SubaddressIndex::default());
        map
    }
}

impl fmt::Debug for AccountKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets stay out of logs; the address identifies the account.
        f.debug_struct("AccountKeys")
            .field("address", &self.address)
            .field("watch_only", &self.is_watch_only())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn test_account() -> AccountKeys {
        let mut rng = StdRng::from_seed([17u8; 32]);
        AccountKeys::random(&mut rng)
    }

    #[test]
    fn standard_address_matches_secrets() {
        let account = test_account();
        assert_eq!(
            account.address().spend_public_key(),
            &account.spend_secret_key().public_key()
        );
        assert_eq!(
            account.address().view_public_key(),
            &account.view_secret_key().public_key()
        );
        assert!(!account.address().is_subaddress());
    }

    #[test]
    fn subaddress_zero_is_the_standard_address() {
        let account = test_account();
        let sub = account.subaddress(SubaddressIndex::new(0, 0)).unwrap();
        assert_eq!(&sub, account.address());
    }

    #[test]
    fn subaddress_spend_key_opens_subaddress() {
        let account = test_account();
        let index = SubaddressIndex::new(1, 3);
        let sub = account.subaddress(index).unwrap();
        assert!(sub.is_subaddress());
        assert_eq!(
            &account.subaddress_spend_secret(index).public_key(),
            sub.spend_public_key()
        );
    }

    #[test]
    fn distinct_indices_give_distinct_subaddresses() {
        let account = test_account();
        let a = account.subaddress(SubaddressIndex::new(0, 1)).unwrap();
        let b = account.subaddress(SubaddressIndex::new(0, 2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn subaddress_map_covers_window_and_finds_standard_address() {
        let account = test_account();
        let map = account.subaddress_map(2, 3).unwrap();
        assert_eq!(map.len(), 6);
        assert_eq!(
            map.get(account.address().spend_public_key()),
            Some(&SubaddressIndex::new(0, 0))
        );
    }

    #[test]
    fn watch_only_account_has_null_spend_secret() {
        let full = test_account();
        let watch = AccountKeys::view_only(
            full.view_secret_key().clone(),
            *full.address().spend_public_key(),
        );
        assert!(watch.is_watch_only());
        assert!(!full.is_watch_only());
        assert_eq!(watch.address(), full.address());
    }

    #[test]
    fn address_hex_roundtrip() {
        let account = test_account();
        let spend_hex = alloc::format!("{}", account.address().spend_public_key());
        let view_hex = alloc::format!("{}", account.address().view_public_key());
        let parsed = PublicAddress::from_hex(&spend_hex, &view_hex, false).unwrap();
        assert_eq!(&parsed, account.address());
    }
}
