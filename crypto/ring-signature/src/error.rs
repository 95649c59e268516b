// Copyright (c) 2019-2024 The Caracal Project

//! Errors which can occur when producing or checking ring signatures.

use displaydoc::Display;
use serde::{Deserialize, Serialize};

/// An error which can occur when signing or verifying a ring signature.
#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Error {
    /// Incorrect length, provided `{0}`, required `{1}`
    LengthMismatch(usize, usize),

    /// Index out of bounds
    IndexOutOfBounds,

    /// Invalid curve point
    InvalidCurvePoint,

    /// The signature was not able to be validated
    InvalidSignature,

    /// Failed to compress/decompress a KeyImage
    InvalidKeyImage,

    /// Value not conserved
    ValueNotConserved,
}

impl From<caracal_crypto_keys::KeyError> for Error {
    fn from(_: caracal_crypto_keys::KeyError) -> Self {
        Self::InvalidCurvePoint
    }
}
