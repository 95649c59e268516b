// Copyright (c) 2019-2024 The Caracal Project

//! The signing-device seam.
//!
//! All key-touching steps of construction go through [`SigningDevice`], so
//! a hardware wallet can hold the secrets while the builder orchestrates.
//! [`SoftwareDevice`] is the in-process implementation used by ordinary
//! wallets; hardware backends live behind their own transports.
//!
//! Device usage is bracketed: the spend orchestrator calls
//! [`SigningDevice::open_tx`] first and guarantees
//! [`SigningDevice::close_tx`] on every exit path.

use crate::entries::TxDestinationEntry;
use alloc::vec::Vec;
use caracal_account_keys::{AccountKeys, PublicAddress};
use caracal_crypto_keys::{KeyError, PublicKey, SecretKey};
use caracal_crypto_ring_signature::{
    onetime_keys::{
        derivation_to_scalar, derive_public_key, derive_view_tag, encrypt_short_payment_id,
        generate_key_derivation, KeyDerivation,
    },
    Scalar,
};
use caracal_transaction_core::extra::ShortPaymentId;
use displaydoc::Display;
use rand_core::{CryptoRng, RngCore};

/// An error reported by a signing device.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum DeviceError {
    /// The device failed or rejected the operation
    OperationFailed,

    /// No additional tx key was supplied for output {0}
    MissingAdditionalKey(usize),

    /// Key arithmetic: {0}
    Key(KeyError),
}

impl From<KeyError> for DeviceError {
    fn from(src: KeyError) -> Self {
        Self::Key(src)
    }
}

/// The operations construction needs from a signing device.
pub trait SigningDevice {
    /// Begin a transaction bracket and hand back the fresh tx secret key.
    fn open_tx(&mut self) -> Result<SecretKey, DeviceError>;

    /// Close the transaction bracket. Called on every exit path.
    fn close_tx(&mut self) -> Result<(), DeviceError>;

    /// `8 * (secret * P)`.
    fn generate_key_derivation(
        &self,
        public: &PublicKey,
        secret: &SecretKey,
    ) -> Result<KeyDerivation, DeviceError>;

    /// One-time output key for `(derivation, index, spend_public)`.
    fn derive_public_key(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        spend_public: &PublicKey,
    ) -> Result<PublicKey, DeviceError>;

    /// `secret · G`.
    fn scalarmult_base(&self, secret: &SecretKey) -> Result<PublicKey, DeviceError>;

    /// `secret · P` (no cofactor clearing).
    fn scalarmult_key(
        &self,
        public: &PublicKey,
        secret: &SecretKey,
    ) -> Result<PublicKey, DeviceError>;

    /// XOR a short payment id with the keystream shared with `view_public`.
    fn encrypt_payment_id(
        &self,
        payment_id: ShortPaymentId,
        view_public: &PublicKey,
        tx_secret: &SecretKey,
    ) -> Result<ShortPaymentId, DeviceError>;

    /// Derive one output's ephemeral key, amount key and optional view
    /// tag, producing the additional tx public key alongside when the
    /// transaction needs per-output keys.
    #[allow(clippy::too_many_arguments)]
    fn generate_output_ephemeral_keys(
        &self,
        tx_version: u16,
        sender: &AccountKeys,
        tx_public_key: &PublicKey,
        tx_secret: &SecretKey,
        destination: &TxDestinationEntry,
        change_addr: Option<&PublicAddress>,
        output_index: usize,
        need_additional_tx_keys: bool,
        additional_tx_secrets: &[SecretKey],
        additional_tx_public_keys: &mut Vec<PublicKey>,
        amount_keys: &mut Vec<Scalar>,
        use_view_tags: bool,
    ) -> Result<(PublicKey, Option<u8>), DeviceError>;
}

/// The in-process software device.
pub struct SoftwareDevice<RNG> {
    rng: RNG,
}

impl<RNG: CryptoRng + RngCore> SoftwareDevice<RNG> {
    /// Wrap a cryptographic RNG as a signing device.
    pub fn new(rng: RNG) -> Self {
        Self { rng }
    }
}

impl<RNG: CryptoRng + RngCore> SigningDevice for SoftwareDevice<RNG> {
    fn open_tx(&mut self) -> Result<SecretKey, DeviceError> {
        Ok(SecretKey::random(&mut self.rng))
    }

    fn close_tx(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn generate_key_derivation(
        &self,
        public: &PublicKey,
        secret: &SecretKey,
    ) -> Result<KeyDerivation, DeviceError> {
        Ok(generate_key_derivation(public, secret)?)
    }

    fn derive_public_key(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        spend_public: &PublicKey,
    ) -> Result<PublicKey, DeviceError> {
        Ok(derive_public_key(derivation, output_index, spend_public)?)
    }

    fn scalarmult_base(&self, secret: &SecretKey) -> Result<PublicKey, DeviceError> {
        Ok(secret.public_key())
    }

    fn scalarmult_key(
        &self,
        public: &PublicKey,
        secret: &SecretKey,
    ) -> Result<PublicKey, DeviceError> {
        let point = public.decompress()?;
        Ok(PublicKey::from(secret.as_scalar() * point))
    }

    fn encrypt_payment_id(
        &self,
        payment_id: ShortPaymentId,
        view_public: &PublicKey,
        tx_secret: &SecretKey,
    ) -> Result<ShortPaymentId, DeviceError> {
        let derivation = generate_key_derivation(view_public, tx_secret)?;
        Ok(ShortPaymentId(encrypt_short_payment_id(
            payment_id.0,
            &derivation,
        )))
    }

    fn generate_output_ephemeral_keys(
        &self,
        _tx_version: u16,
        sender: &AccountKeys,
        tx_public_key: &PublicKey,
        tx_secret: &SecretKey,
        destination: &TxDestinationEntry,
        change_addr: Option<&PublicAddress>,
        output_index: usize,
        need_additional_tx_keys: bool,
        additional_tx_secrets: &[SecretKey],
        additional_tx_public_keys: &mut Vec<PublicKey>,
        amount_keys: &mut Vec<Scalar>,
        use_view_tags: bool,
    ) -> Result<(PublicKey, Option<u8>), DeviceError> {
        let is_change = change_addr == Some(&destination.addr);

        // Change comes back to us: derive with our own view key against the
        // canonical tx public key, exactly as the wallet will when it scans
        // the chain. Everything else derives against the recipient's view
        // key, with the per-output key when this destination requires one.
        let derivation = if is_change {
            generate_key_derivation(tx_public_key, sender.view_secret_key())?
        } else {
            let derivation_secret = if destination.addr.is_subaddress() && need_additional_tx_keys
            {
                additional_tx_secrets
                    .get(output_index)
                    .ok_or(DeviceError::MissingAdditionalKey(output_index))?
            } else {
                tx_secret
            };
            generate_key_derivation(destination.addr.view_public_key(), derivation_secret)?
        };

        if need_additional_tx_keys {
            let additional_secret = additional_tx_secrets
                .get(output_index)
                .ok_or(DeviceError::MissingAdditionalKey(output_index))?;
            let additional_public = if destination.addr.is_subaddress() {
                self.scalarmult_key(destination.addr.spend_public_key(), additional_secret)?
            } else {
                additional_secret.public_key()
            };
            additional_tx_public_keys.push(additional_public);
        }

        amount_keys.push(derivation_to_scalar(&derivation, output_index as u64));

        let out_ephemeral = derive_public_key(
            &derivation,
            output_index as u64,
            destination.addr.spend_public_key(),
        )?;
        let view_tag = use_view_tags.then(|| derive_view_tag(&derivation, output_index as u64));

        Ok((out_ephemeral, view_tag))
    }
}
