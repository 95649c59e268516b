// Copyright (c) 2019-2024 The Caracal Project

//! Inputs and outputs as the caller hands them to the spend builder.

use alloc::vec::Vec;
use caracal_account_keys::PublicAddress;
use caracal_crypto_keys::PublicKey;
use caracal_crypto_ring_signature::Scalar;
use caracal_transaction_core::ring_ct::RingEntry;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// One payment the transaction should make.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Zeroize)]
pub struct TxDestinationEntry {
    /// Amount in atomic units.
    pub amount: u64,
    /// The recipient; `addr.is_subaddress()` switches the derivation path.
    pub addr: PublicAddress,
}

impl TxDestinationEntry {
    /// Bundle an amount with its recipient.
    pub fn new(amount: u64, addr: PublicAddress) -> Self {
        Self { amount, addr }
    }
}

/// One unspent output being consumed, with its decoy ring.
///
/// `outputs` is ordered by global index; `real_output` points at the real
/// member inside it. The commitment `mask` is the secret opening of the
/// real member's amount commitment.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TxSourceEntry {
    /// The ring: `(global_index, (output key, commitment))` per member.
    pub outputs: Vec<(u64, RingEntry)>,
    /// Index of the real member within `outputs`.
    pub real_output: usize,
    /// The tx public key of the transaction that created the real output.
    pub real_out_tx_key: PublicKey,
    /// Additional tx public keys of that transaction, if it carried any.
    pub real_out_additional_tx_keys: Vec<PublicKey>,
    /// The real output's index inside its transaction.
    pub real_output_in_tx_index: u64,
    /// Amount of the real output, in atomic units.
    pub amount: u64,
    /// Whether the real output is RingCT (masked amount).
    pub rct: bool,
    /// The commitment mask of the real output.
    pub mask: Scalar,
}

impl TxSourceEntry {
    /// The real ring member's output key.
    pub fn real_output_key(&self) -> Option<&PublicKey> {
        self.outputs
            .get(self.real_output)
            .map(|(_, entry)| &entry.dest)
    }
}
