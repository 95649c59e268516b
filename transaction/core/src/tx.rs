// Copyright (c) 2019-2024 The Caracal Project

//! Transaction data types.
//!
//! Inputs and outputs are tagged unions because the wire format is
//! tag-driven; the discriminants live in [`crate::serialization`].

use crate::{
    ring_ct::RctSignatures,
    serialization::{self, SerializationError},
};
use alloc::{vec, vec::Vec};
use caracal_crypto_keys::{keccak256, PublicKey};
use caracal_crypto_ring_signature::{KeyImage, RingSigElement};
use serde::{Deserialize, Serialize};

/// A transaction input.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TxIn {
    /// The single coinbase input minting the reward at `height`.
    Gen {
        /// Height of the block this coinbase belongs to.
        height: u64,
    },
    /// A spend of an existing output, hidden inside a ring.
    ToKey {
        /// Cleartext amount; zero once RingCT masks it.
        amount: u64,
        /// Ring member positions; first absolute, the rest deltas.
        key_offsets: Vec<u64>,
        /// The spent output's key image.
        key_image: KeyImage,
    },
}

/// The spendable payload of an output.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TxOutTarget {
    /// A plain one-time key.
    ToKey {
        /// The one-time output key.
        key: PublicKey,
    },
    /// A one-time key plus the one-byte scan hint added at a later fork.
    ToTaggedKey {
        /// The one-time output key.
        key: PublicKey,
        /// The scan hint.
        view_tag: u8,
    },
}

/// A transaction output.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TxOut {
    /// Cleartext amount; zero once RingCT masks it.
    pub amount: u64,
    /// The output target.
    pub target: TxOutTarget,
}

impl TxOut {
    /// Build an output, tagged when a view tag is supplied.
    pub fn new(amount: u64, key: PublicKey, view_tag: Option<u8>) -> Self {
        let target = match view_tag {
            Some(view_tag) => TxOutTarget::ToTaggedKey { key, view_tag },
            None => TxOutTarget::ToKey { key },
        };
        Self { amount, target }
    }

    /// The one-time output key, whichever target variant carries it.
    pub fn public_key(&self) -> &PublicKey {
        match &self.target {
            TxOutTarget::ToKey { key } => key,
            TxOutTarget::ToTaggedKey { key, .. } => key,
        }
    }
}

/// A Caracal transaction.
///
/// Built once by a constructor call and not mutated afterwards; any code
/// that does mutate one must call [`Transaction::invalidate_hashes`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Transaction {
    /// Format version: 1 for cleartext amounts, 2 for RingCT.
    pub version: u16,
    /// Height or timestamp before which outputs cannot be spent.
    pub unlock_time: u64,
    /// Inputs, sorted by key image in descending byte order.
    pub vin: Vec<TxIn>,
    /// Outputs, in caller order after the optional shuffle.
    pub vout: Vec<TxOut>,
    /// TLV-encoded extra field.
    pub extra: Vec<u8>,
    /// v1 ring signatures, one row per input.
    pub signatures: Vec<Vec<RingSigElement>>,
    /// v2 RingCT signature bundle.
    pub rct_signatures: Option<RctSignatures>,

    #[serde(skip)]
    pub(crate) cached_hash: Option<[u8; 32]>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            version: 1,
            unlock_time: 0,
            vin: Vec::new(),
            vout: Vec::new(),
            extra: Vec::new(),
            signatures: Vec::new(),
            rct_signatures: None,
            cached_hash: None,
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        // The hash cache is derived state and never part of equality.
        self.version == other.version
            && self.unlock_time == other.unlock_time
            && self.vin == other.vin
            && self.vout == other.vout
            && self.extra == other.extra
            && self.signatures == other.signatures
            && self.rct_signatures == other.rct_signatures
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// A fresh empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the empty state.
    pub fn set_null(&mut self) {
        *self = Self::default();
    }

    /// Drop any cached hash. Must follow every mutation.
    pub fn invalidate_hashes(&mut self) {
        self.cached_hash = None;
    }

    /// Hash of the prefix: everything except the signature section.
    ///
    /// This is the message ring signatures commit to.
    pub fn prefix_hash(&self) -> [u8; 32] {
        keccak256(&serialization::serialize_tx_prefix(self))
    }

    /// Hash of the full serialized transaction, cached until the next
    /// [`Transaction::invalidate_hashes`].
    pub fn hash(&mut self) -> [u8; 32] {
        if let Some(hash) = self.cached_hash {
            return hash;
        }
        let hash = keccak256(&Transaction::serialize(self));
        self.cached_hash = Some(hash);
        hash
    }

    /// Canonical consensus encoding.
    pub fn serialize(&self) -> Vec<u8> {
        serialization::serialize_transaction(self)
    }

    /// Parse a canonical consensus encoding.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, SerializationError> {
        serialization::deserialize_transaction(bytes)
    }

    /// Whether this is a coinbase: exactly one `gen` input.
    pub fn is_coinbase(&self) -> bool {
        matches!(self.vin.as_slice(), [TxIn::Gen { .. }])
    }

    /// Allocate empty v1 signature rows matching `vin`, used by watch-only
    /// construction where the rows must exist but stay zero-filled.
    pub fn allocate_empty_signatures(&mut self) {
        self.signatures = self
            .vin
            .iter()
            .map(|input| match input {
                TxIn::ToKey { key_offsets, .. } => {
                    vec![RingSigElement::default(); key_offsets.len()]
                }
                TxIn::Gen { .. } => Vec::new(),
            })
            .collect();
    }
}
