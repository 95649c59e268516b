// Copyright (c) 2019-2024 The Caracal Project

//! The transaction `extra` field.
//!
//! A TLV byte string: `tag (u8) ‖ len (varint, omitted for fixed-size tags)
//! ‖ value`. The canonical form is sorted ascending by tag with duplicate
//! tx-public-key fields coalesced to the last one added, and is bounded by
//! [`crate::constants::MAX_TX_EXTRA_SIZE`].

use crate::constants::MAX_TX_EXTRA_SIZE;
use alloc::vec::Vec;
use caracal_crypto_keys::PublicKey;
use core::fmt;
use displaydoc::Display;
use serde::{Deserialize, Serialize};

/// Tag of a run of zero padding bytes.
pub const TX_EXTRA_TAG_PADDING: u8 = 0x00;
/// Tag of the canonical transaction public key (fixed 32 bytes).
pub const TX_EXTRA_TAG_PUBKEY: u8 = 0x01;
/// Tag of the opaque extra nonce (length-prefixed).
pub const TX_EXTRA_TAG_NONCE: u8 = 0x02;
/// Tag of the per-output additional public keys (count-prefixed).
pub const TX_EXTRA_TAG_ADDITIONAL_PUBKEYS: u8 = 0x04;

/// Nonce sub-tag of a 32-byte plaintext payment id.
pub const TX_EXTRA_NONCE_PAYMENT_ID: u8 = 0x00;
/// Nonce sub-tag of an 8-byte encrypted payment id.
pub const TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID: u8 = 0x01;

/// Longest admissible nonce payload.
pub const TX_EXTRA_NONCE_MAX_COUNT: usize = 255;
/// Longest admissible padding run.
pub const TX_EXTRA_PADDING_MAX_COUNT: usize = 255;

/// A 32-byte plaintext payment id.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LongPaymentId(pub [u8; 32]);

/// An 8-byte payment id, stored encrypted on the wire.
#[derive(Clone, Copy, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShortPaymentId(pub [u8; 8]);

impl fmt::Debug for ShortPaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortPaymentId(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// An error that can occur when handling the extra field.
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ExtraError {
    /// Truncated field with tag {0}
    Truncated(u8),

    /// Unknown tag {0}
    UnknownTag(u8),

    /// Padding is not a zero run within the cap
    InvalidPadding,

    /// Nonce length {0} exceeds the cap
    NonceTooLong(usize),

    /// Extra size {0} exceeds the maximum {1}
    TooLarge(usize, usize),
}

/// One parsed extra field.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ExtraField {
    /// A run of zero bytes.
    Padding(usize),
    /// The canonical transaction public key.
    TxPublicKey(PublicKey),
    /// Opaque nonce, usually a payment id.
    Nonce(Vec<u8>),
    /// Per-output additional transaction public keys.
    AdditionalPublicKeys(Vec<PublicKey>),
}

impl ExtraField {
    /// The wire tag of this field.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Padding(_) => TX_EXTRA_TAG_PADDING,
            Self::TxPublicKey(_) => TX_EXTRA_TAG_PUBKEY,
            Self::Nonce(_) => TX_EXTRA_TAG_NONCE,
            Self::AdditionalPublicKeys(_) => TX_EXTRA_TAG_ADDITIONAL_PUBKEYS,
        }
    }
}

fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
}

fn read_varint(bytes: &[u8], pos: &mut usize, tag: u8) -> Result<u64, ExtraError> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *bytes.get(*pos).ok_or(ExtraError::Truncated(tag))?;
        *pos += 1;
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > 63 {
            return Err(ExtraError::Truncated(tag));
        }
    }
}

/// Parse an extra blob into its fields.
pub fn parse_tx_extra(extra: &[u8]) -> Result<Vec<ExtraField>, ExtraError> {
    let mut fields = Vec::new();
    let mut pos = 0;
    while pos < extra.len() {
        let tag = extra[pos];
        pos += 1;
        match tag {
            TX_EXTRA_TAG_PADDING => {
                // Padding runs to the end of extra and must stay zero.
                let run = &extra[pos..];
                if run.len() + 1 > TX_EXTRA_PADDING_MAX_COUNT
                    || run.iter().any(|&byte| byte != 0)
                {
                    return Err(ExtraError::InvalidPadding);
                }
                fields.push(ExtraField::Padding(run.len() + 1));
                pos = extra.len();
            }
            TX_EXTRA_TAG_PUBKEY => {
                let end = pos.checked_add(32).ok_or(ExtraError::Truncated(tag))?;
                let bytes = extra.get(pos..end).ok_or(ExtraError::Truncated(tag))?;
                fields.push(ExtraField::TxPublicKey(
                    PublicKey::try_from(bytes).map_err(|_| ExtraError::Truncated(tag))?,
                ));
                pos = end;
            }
            TX_EXTRA_TAG_NONCE => {
                let len = read_varint(extra, &mut pos, tag)? as usize;
                if len > TX_EXTRA_NONCE_MAX_COUNT {
                    return Err(ExtraError::NonceTooLong(len));
                }
                let end = pos.checked_add(len).ok_or(ExtraError::Truncated(tag))?;
                let bytes = extra.get(pos..end).ok_or(ExtraError::Truncated(tag))?;
                fields.push(ExtraField::Nonce(bytes.to_vec()));
                pos = end;
            }
            TX_EXTRA_TAG_ADDITIONAL_PUBKEYS => {
                let count = read_varint(extra, &mut pos, tag)? as usize;
                let mut keys = Vec::with_capacity(count);
                for _ in 0..count {
                    let end = pos.checked_add(32).ok_or(ExtraError::Truncated(tag))?;
                    let bytes = extra.get(pos..end).ok_or(ExtraError::Truncated(tag))?;
                    keys.push(PublicKey::try_from(bytes).map_err(|_| ExtraError::Truncated(tag))?);
                    pos = end;
                }
                fields.push(ExtraField::AdditionalPublicKeys(keys));
            }
            tag => return Err(ExtraError::UnknownTag(tag)),
        }
    }
    Ok(fields)
}

/// Serialize fields back into an extra blob.
pub fn write_tx_extra(fields: &[ExtraField]) -> Vec<u8> {
    let mut buf = Vec::new();
    for field in fields {
        match field {
            ExtraField::Padding(len) => {
                buf.extend(core::iter::repeat(0u8).take(*len));
            }
            ExtraField::TxPublicKey(key) => {
                buf.push(TX_EXTRA_TAG_PUBKEY);
                buf.extend_from_slice(key.as_bytes());
            }
            ExtraField::Nonce(nonce) => {
                buf.push(TX_EXTRA_TAG_NONCE);
                write_varint(&mut buf, nonce.len() as u64);
                buf.extend_from_slice(nonce);
            }
            ExtraField::AdditionalPublicKeys(keys) => {
                buf.push(TX_EXTRA_TAG_ADDITIONAL_PUBKEYS);
                write_varint(&mut buf, keys.len() as u64);
                for key in keys {
                    buf.extend_from_slice(key.as_bytes());
                }
            }
        }
    }
    buf
}

/// Canonicalize an extra blob: coalesce duplicate tx-public-key fields to
/// the last one added, then stable-sort ascending by tag.
///
/// Running this twice is a no-op.
pub fn sort_tx_extra(extra: &[u8]) -> Result<Vec<u8>, ExtraError> {
    let fields = parse_tx_extra(extra)?;

    let last_pubkey = fields
        .iter()
        .rposition(|field| matches!(field, ExtraField::TxPublicKey(_)));
    let mut fields: Vec<ExtraField> = fields
        .into_iter()
        .enumerate()
        .filter(|(i, field)| {
            !matches!(field, ExtraField::TxPublicKey(_)) || Some(*i) == last_pubkey
        })
        .map(|(_, field)| field)
        .collect();

    fields.sort_by_key(ExtraField::tag);
    Ok(write_tx_extra(&fields))
}

/// Append the canonical tx public key field.
pub fn add_tx_public_key_to_extra(extra: &mut Vec<u8>, key: &PublicKey) {
    extra.push(TX_EXTRA_TAG_PUBKEY);
    extra.extend_from_slice(key.as_bytes());
}

/// Append the additional tx public keys field.
pub fn add_additional_tx_public_keys_to_extra(extra: &mut Vec<u8>, keys: &[PublicKey]) {
    extra.push(TX_EXTRA_TAG_ADDITIONAL_PUBKEYS);
    write_varint(extra, keys.len() as u64);
    for key in keys {
        extra.extend_from_slice(key.as_bytes());
    }
}

/// Append an extra nonce, bounded by [`TX_EXTRA_NONCE_MAX_COUNT`].
pub fn add_extra_nonce_to_tx_extra(extra: &mut Vec<u8>, nonce: &[u8]) -> Result<(), ExtraError> {
    if nonce.len() > TX_EXTRA_NONCE_MAX_COUNT {
        return Err(ExtraError::NonceTooLong(nonce.len()));
    }
    extra.push(TX_EXTRA_TAG_NONCE);
    write_varint(extra, nonce.len() as u64);
    extra.extend_from_slice(nonce);
    Ok(())
}

/// Remove every field carrying `tag`, leaving the rest in place.
pub fn remove_field_from_tx_extra(extra: &mut Vec<u8>, tag: u8) -> Result<(), ExtraError> {
    let fields = parse_tx_extra(extra)?;
    let kept: Vec<ExtraField> = fields
        .into_iter()
        .filter(|field| field.tag() != tag)
        .collect();
    *extra = write_tx_extra(&kept);
    Ok(())
}

/// The first tx public key field, if any.
pub fn find_tx_public_key(fields: &[ExtraField]) -> Option<PublicKey> {
    fields.iter().find_map(|field| match field {
        ExtraField::TxPublicKey(key) => Some(*key),
        _ => None,
    })
}

/// The first nonce field, if any.
pub fn find_tx_extra_nonce(fields: &[ExtraField]) -> Option<&[u8]> {
    fields.iter().find_map(|field| match field {
        ExtraField::Nonce(nonce) => Some(nonce.as_slice()),
        _ => None,
    })
}

/// Encode an encrypted short payment id as a nonce payload.
pub fn encrypted_payment_id_to_nonce(id: ShortPaymentId) -> Vec<u8> {
    let mut nonce = Vec::with_capacity(9);
    nonce.push(TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID);
    nonce.extend_from_slice(&id.0);
    nonce
}

/// Encode a long payment id as a nonce payload.
pub fn payment_id_to_nonce(id: LongPaymentId) -> Vec<u8> {
    let mut nonce = Vec::with_capacity(33);
    nonce.push(TX_EXTRA_NONCE_PAYMENT_ID);
    nonce.extend_from_slice(&id.0);
    nonce
}

/// Decode an encrypted short payment id from a nonce payload.
pub fn encrypted_payment_id_from_nonce(nonce: &[u8]) -> Option<ShortPaymentId> {
    match nonce.split_first() {
        Some((&TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID, rest)) if rest.len() == 8 => {
            Some(ShortPaymentId(rest.try_into().ok()?))
        }
        _ => None,
    }
}

/// Decode a long payment id from a nonce payload.
pub fn payment_id_from_nonce(nonce: &[u8]) -> Option<LongPaymentId> {
    match nonce.split_first() {
        Some((&TX_EXTRA_NONCE_PAYMENT_ID, rest)) if rest.len() == 32 => {
            Some(LongPaymentId(rest.try_into().ok()?))
        }
        _ => None,
    }
}

/// Check the canonical size bound.
pub fn check_tx_extra_size(extra: &[u8]) -> Result<(), ExtraError> {
    if extra.len() > MAX_TX_EXTRA_SIZE {
        return Err(ExtraError::TooLarge(extra.len(), MAX_TX_EXTRA_SIZE));
    }
    Ok(())
}
