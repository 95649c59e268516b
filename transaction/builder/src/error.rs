// Copyright (c) 2019-2024 The Caracal Project

//! Errors surfaced by the transaction builders.

use crate::device::DeviceError;
use caracal_crypto_keys::KeyError;
use caracal_crypto_ring_signature::Error as SignatureError;
use caracal_transaction_core::{extra::ExtraError, ring_ct::RctError};
use displaydoc::Display;

/// An error that can occur when constructing a transaction.
///
/// Construction never recovers internally: every variant aborts the build
/// and the caller receives no transaction.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum TxBuilderError {
    /// No sources provided
    EmptySources,

    /// Real output index {0} out of bounds for a ring of {1}
    SourceRingIndexOutOfBounds(usize, usize),

    /// Derived ephemeral key does not match the output key of input {0}
    DerivedKeyMismatch(usize),

    /// Block is too big for the reward schedule
    BlockTooBig,

    /// Decomposed into {0} outputs, more than the allowed {1}
    MaxOutsExceeded(usize, usize),

    /// Tx extra: {0}
    ExtraParse(ExtraError),

    /// Tx extra size {0} exceeds the maximum {1}
    ExtraTooLarge(usize, usize),

    /// Failed to encrypt the payment id
    PaymentIdEncryptionFailed,

    /// Destinations do not collapse to a unique view key
    NoUniqueDestinationViewKey,

    /// Output total {1} exceeds input total {0}
    AmountImbalance(u64, u64),

    /// Zero-amount destination in a v1 transaction
    ZeroAmountDestination,

    /// Got {0} additional tx keys for {1} destinations
    AdditionalKeyCountMismatch(usize, usize),

    /// Non-simple RingCT requires a shared real output index
    NonSimpleRctRealIndexMismatch,

    /// Non-simple RingCT requires a uniform ring size
    NonSimpleRctRingSizeMismatch,

    /// Coinbase outputs sum to {0}, expected {1}
    RewardSumMismatch(u64, u64),

    /// Signing device: {0}
    Device(DeviceError),

    /// RingCT: {0}
    RingCt(RctError),

    /// Ring signature: {0}
    Signature(SignatureError),

    /// Key arithmetic: {0}
    Key(KeyError),
}

impl From<ExtraError> for TxBuilderError {
    fn from(src: ExtraError) -> Self {
        match src {
            ExtraError::TooLarge(size, max) => Self::ExtraTooLarge(size, max),
            other => Self::ExtraParse(other),
        }
    }
}

impl From<DeviceError> for TxBuilderError {
    fn from(src: DeviceError) -> Self {
        Self::Device(src)
    }
}

impl From<RctError> for TxBuilderError {
    fn from(src: RctError) -> Self {
        Self::RingCt(src)
    }
}

impl From<SignatureError> for TxBuilderError {
    fn from(src: SignatureError) -> Self {
        Self::Signature(src)
    }
}

impl From<KeyError> for TxBuilderError {
    fn from(src: KeyError) -> Self {
        Self::Key(src)
    }
}
