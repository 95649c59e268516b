// Copyright (c) 2019-2024 The Caracal Project

//! Caracal ring signatures.
//!
//! Key images, the legacy per-member `(c, r)` ring signature used by v1
//! transactions, MLSAG used by the RingCT bundle, and Pedersen commitments.
//! One-time output-key derivation lives in [`onetime_keys`].

#![no_std]
#![deny(missing_docs)]
#![allow(non_snake_case)]

extern crate alloc;

mod commitment;
mod error;
mod key_image;
mod mlsag;
mod ring_signature;

pub mod domain_separators;
pub mod onetime_keys;

pub use commitment::{generator_h, Commitment, CompressedCommitment};
pub use error::Error;
pub use key_image::KeyImage;
pub use mlsag::{mlsag_sign, mlsag_verify, RingMlsag};
pub use ring_signature::{check_ring_signature, generate_ring_signature, RingSigElement};

/// Re-export of the curve scalar type used across signing interfaces.
pub use curve25519_dalek::scalar::Scalar;
