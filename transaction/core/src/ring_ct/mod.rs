// Copyright (c) 2019-2024 The Caracal Project

//! The RingCT signature bundle and its signer.
//!
//! Amounts live inside Pedersen commitments; the cleartext amount fields of
//! a v2 transaction are zeroed before the prefix is hashed. Range proofs
//! come from an external library behind [`RangeProofProvider`].

mod sign;

pub use sign::{gen_rct_full, gen_rct_simple};

use alloc::vec::Vec;
use caracal_crypto_keys::PublicKey;
use caracal_crypto_ring_signature::{CompressedCommitment, RingMlsag, Scalar};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Discriminant of a RingCT bundle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[repr(u8)]
pub enum RctType {
    /// No confidential signature (coinbase v2).
    Null = 0,
    /// One aggregate MLSAG over transposed rings; legacy Borromean only.
    Full = 1,
    /// One MLSAG per input with pseudo-output commitments; the norm.
    Simple = 2,
}

impl RctType {
    /// Decode a wire discriminant.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Null),
            1 => Some(Self::Full),
            2 => Some(Self::Simple),
            _ => None,
        }
    }
}

/// Which range-proof system the external prover runs.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RangeProofType {
    /// Legacy per-bit Borromean proofs.
    Borromean,
    /// Bulletproofs.
    Bulletproof,
    /// Bulletproofs+.
    BulletproofPlus,
}

/// RingCT configuration chosen by the wallet for a given fork window.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RctConfig {
    /// The range-proof system to request from the prover.
    pub range_proof_type: RangeProofType,
    /// Bulletproof format revision.
    pub bp_version: u8,
}

/// One ring member: an output key and its amount commitment.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RingEntry {
    /// The member's one-time output key.
    pub dest: PublicKey,
    /// The member's amount commitment.
    pub commitment: CompressedCommitment,
}

/// The secret opening of one input: its one-time key and commitment mask.
///
/// Wiped on drop; leftover copies leak spend capability.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CtKey {
    /// The one-time output secret key.
    pub dest: Scalar,
    /// The commitment blinding factor.
    pub mask: Scalar,
}

/// Encrypted amount material for one output.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EcdhInfo {
    /// The amount, XORed with the recipient's keystream.
    pub amount: [u8; 8],
}

/// An opaque range proof produced by the external prover.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RangeProof(pub Vec<u8>);

/// The secret side of one produced output, returned to the builder so a
/// wallet can persist the opening; dropped material is wiped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct OutputSecret {
    /// The commitment blinding factor.
    pub mask: Scalar,
}

/// The external range-proof library.
pub trait RangeProofProvider {
    /// Prove each `amounts[i]` lies in range under `blindings[i]`.
    fn prove(
        &self,
        amounts: &[u64],
        blindings: &[Scalar],
        config: &RctConfig,
    ) -> Result<RangeProof, RctError>;
}

/// A complete RingCT signature bundle.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RctSignatures {
    /// Bundle discriminant.
    pub rct_type: RctType,
    /// The cleartext fee, `Σ inputs − Σ outputs`.
    pub fee: u64,
    /// Per-input pseudo-output commitments (simple only).
    pub pseudo_outs: Vec<CompressedCommitment>,
    /// Per-output encrypted amounts.
    pub ecdh_info: Vec<EcdhInfo>,
    /// Per-output amount commitments.
    pub out_pk: Vec<CompressedCommitment>,
    /// The external range proof over all outputs.
    pub range_proof: RangeProof,
    /// The ring signatures: one per input (simple) or one aggregate (full).
    pub mlsags: Vec<RingMlsag>,
}

/// An error that can occur when producing a RingCT bundle.
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum RctError {
    /// Incorrect length, provided `{0}`, required `{1}`
    LengthMismatch(usize, usize),

    /// Real index out of bounds
    IndexOutOfBounds,

    /// Invalid curve point in a ring member
    InvalidCurvePoint,

    /// Input and output values do not balance
    ValueNotConserved,

    /// The range-proof provider failed
    RangeProofFailed,

    /// Ring signature: {0}
    Signature(caracal_crypto_ring_signature::Error),
}

impl From<caracal_crypto_ring_signature::Error> for RctError {
    fn from(src: caracal_crypto_ring_signature::Error) -> Self {
        match src {
            caracal_crypto_ring_signature::Error::InvalidCurvePoint => Self::InvalidCurvePoint,
            other => Self::Signature(other),
        }
    }
}
