// Copyright (c) 2019-2024 The Caracal Project

//! Caracal transaction data types and construction primitives.
//!
//! The consensus-critical pieces live here: the transaction model, its
//! canonical encoding, the extra-field TLV, amount decomposition and the
//! RingCT bundle. The builders in `caracal-transaction-builder` orchestrate
//! these into finished transactions.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

mod amount;
mod tx;

pub mod constants;
pub mod extra;
pub mod ring_ct;
pub mod serialization;

pub use amount::{decompose_amount, decompose_amount_into_digits};
pub use serialization::SerializationError;
pub use tx::{Transaction, TxIn, TxOut, TxOutTarget};

// One-time key derivation historically lived next to the ring signatures;
// re-export it here where most callers look for it.
pub use caracal_crypto_ring_signature::onetime_keys;

// Re-export the account types the construction APIs are phrased in.
pub use caracal_account_keys::{AccountKeys, Network, PublicAddress, SubaddressIndex};

use alloc::collections::BTreeMap;
use caracal_crypto_keys::{KeyError, Keypair, PublicKey};
use caracal_crypto_ring_signature::{onetime_keys::KeyDerivation, KeyImage};
use displaydoc::Display;

/// An error that can occur when recovering the one-time keys of an owned
/// output.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum OwnedOutputError {
    /// No subaddress entry matches the output's derivation
    NotOwned,

    /// Key arithmetic: {0}
    Key(KeyError),
}

impl From<KeyError> for OwnedOutputError {
    fn from(src: KeyError) -> Self {
        Self::Key(src)
    }
}

/// Recompute the one-time ephemeral keypair and key image of an output the
/// account owns.
///
/// The derivation is tried against the main transaction key first, then the
/// per-output additional key; whichever recovers a spend key present in
/// `subaddresses` wins. For a watch-only account (null spend secret) the
/// ephemeral public key is taken from the output itself and the key image
/// is not usable for signing.
///
/// # Arguments
/// * `account` - The receiving account's keys.
/// * `subaddresses` - Spend-key lookup table for the scanned window.
/// * `out_key` - The output's one-time public key.
/// * `tx_public_key` - The transaction public key `R`.
/// * `additional_tx_public_keys` - Per-output additional keys, if present.
/// * `real_output_in_tx_index` - The output's index in its transaction.
pub fn generate_key_image_helper(
    account: &AccountKeys,
    subaddresses: &BTreeMap<PublicKey, SubaddressIndex>,
    out_key: &PublicKey,
    tx_public_key: &PublicKey,
    additional_tx_public_keys: &[PublicKey],
    real_output_in_tx_index: u64,
) -> Result<(Keypair, KeyImage), OwnedOutputError> {
    let find = |derivation: &KeyDerivation| -> Result<Option<SubaddressIndex>, KeyError> {
        let spend_key = onetime_keys::recover_public_spend_key(
            derivation,
            real_output_in_tx_index,
            out_key,
        )?;
        Ok(subaddresses.get(&spend_key).copied())
    };

    let main_derivation =
        onetime_keys::generate_key_derivation(tx_public_key, account.view_secret_key())?;
    let mut owned = find(&main_derivation)?.map(|index| (main_derivation, index));

    if owned.is_none() {
        if let Some(additional_key) =
            additional_tx_public_keys.get(real_output_in_tx_index as usize)
        {
            let derivation =
                onetime_keys::generate_key_derivation(additional_key, account.view_secret_key())?;
            owned = find(&derivation)?.map(|index| (derivation, index));
        }
    }

    let (derivation, subaddress_index) = owned.ok_or(OwnedOutputError::NotOwned)?;

    let spend_secret = account.subaddress_spend_secret(subaddress_index);
    let secret =
        onetime_keys::derive_secret_key(&derivation, real_output_in_tx_index, &spend_secret);

    // A watch-only account cannot reproduce the secret, but the output key
    // itself is known; constructions that skip signing still need it.
    let public = if account.is_watch_only() {
        *out_key
    } else {
        secret.public_key()
    };

    let key_image = KeyImage::generate(&secret, out_key);
    Ok((Keypair { secret, public }, key_image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use caracal_crypto_keys::SecretKey;
    use caracal_crypto_ring_signature::onetime_keys::{
        derive_public_key, derive_view_tag, generate_key_derivation,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn send_to(
        rng: &mut StdRng,
        recipient: &PublicAddress,
        output_index: u64,
    ) -> (PublicKey, PublicKey) {
        let tx_secret = SecretKey::random(rng);
        let derivation =
            generate_key_derivation(recipient.view_public_key(), &tx_secret).unwrap();
        let out_key =
            derive_public_key(&derivation, output_index, recipient.spend_public_key()).unwrap();
        (out_key, tx_secret.public_key())
    }

    #[test]
    fn recovers_standard_address_output() {
        let mut rng = StdRng::from_seed([61u8; 32]);
        let account = AccountKeys::random(&mut rng);
        let (out_key, tx_public) = send_to(&mut rng, account.address(), 0);

        let (ephemeral, _image) = generate_key_image_helper(
            &account,
            &account.default_subaddress_map(),
            &out_key,
            &tx_public,
            &[],
            0,
        )
        .unwrap();

        assert_eq!(ephemeral.public, out_key);
        assert_eq!(ephemeral.secret.public_key(), out_key);
    }

    #[test]
    fn recovers_subaddress_output() {
        let mut rng = StdRng::from_seed([62u8; 32]);
        let account = AccountKeys::random(&mut rng);
        let index = SubaddressIndex::new(0, 2);
        let subaddress = account.subaddress(index).unwrap();

        // A subaddress destination publishes `R = r * D`, so the receiver's
        // `a * R` meets the sender's `r * C`.
        let tx_secret = SecretKey::random(&mut rng);
        let tx_public = PublicKey::from(
            tx_secret.as_scalar() * subaddress.spend_public_key().decompress().unwrap(),
        );
        let derivation =
            generate_key_derivation(subaddress.view_public_key(), &tx_secret).unwrap();
        let out_key =
            derive_public_key(&derivation, 1, subaddress.spend_public_key()).unwrap();

        let map = account.subaddress_map(1, 4).unwrap();
        let (ephemeral, _image) =
            generate_key_image_helper(&account, &map, &out_key, &tx_public, &[], 1).unwrap();

        assert_eq!(ephemeral.public, out_key);
        assert_eq!(ephemeral.secret.public_key(), out_key);
    }

    #[test]
    fn unknown_output_is_not_owned() {
        let mut rng = StdRng::from_seed([63u8; 32]);
        let account = AccountKeys::random(&mut rng);
        let stranger = AccountKeys::random(&mut rng);
        let (out_key, tx_public) = send_to(&mut rng, stranger.address(), 0);

        let result = generate_key_image_helper(
            &account,
            &account.default_subaddress_map(),
            &out_key,
            &tx_public,
            &[],
            0,
        );
        assert_eq!(result.err(), Some(OwnedOutputError::NotOwned));
    }

    #[test]
    fn additional_key_path_is_tried() {
        let mut rng = StdRng::from_seed([64u8; 32]);
        let account = AccountKeys::random(&mut rng);

        // Output derived from an additional key, with a decoy main tx key.
        let (out_key, additional_public) = send_to(&mut rng, account.address(), 0);
        let decoy_tx_public = SecretKey::random(&mut rng).public_key();

        let (ephemeral, _image) = generate_key_image_helper(
            &account,
            &account.default_subaddress_map(),
            &out_key,
            &decoy_tx_public,
            &[additional_public],
            0,
        )
        .unwrap();
        assert_eq!(ephemeral.public, out_key);
    }

    #[test]
    fn watch_only_account_still_recovers_the_output_key() {
        let mut rng = StdRng::from_seed([65u8; 32]);
        let full = AccountKeys::random(&mut rng);
        let watch = AccountKeys::view_only(
            full.view_secret_key().clone(),
            *full.address().spend_public_key(),
        );
        let (out_key, tx_public) = send_to(&mut rng, full.address(), 0);

        let (ephemeral, _image) = generate_key_image_helper(
            &watch,
            &watch.default_subaddress_map(),
            &out_key,
            &tx_public,
            &[],
            0,
        )
        .unwrap();

        // The public half is correct even though the secret is not.
        assert_eq!(ephemeral.public, out_key);
        assert_ne!(ephemeral.secret.public_key(), out_key);
    }

    #[test]
    fn view_tags_derive_identically_for_sender_and_receiver() {
        let mut rng = StdRng::from_seed([66u8; 32]);
        let account = AccountKeys::random(&mut rng);
        let tx_secret = SecretKey::random(&mut rng);

        let sender_side =
            generate_key_derivation(account.address().view_public_key(), &tx_secret).unwrap();
        let receiver_side =
            generate_key_derivation(&tx_secret.public_key(), account.view_secret_key()).unwrap();
        assert_eq!(
            derive_view_tag(&sender_side, 0),
            derive_view_tag(&receiver_side, 0)
        );
    }
}
