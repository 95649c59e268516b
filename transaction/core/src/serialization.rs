// Copyright (c) 2019-2024 The Caracal Project

//! Canonical consensus encoding.
//!
//! `version ‖ unlock_time ‖ vin ‖ vout ‖ extra ‖ signatures`, all integers
//! as LEB128 varints, inputs and outputs as tagged unions. This encoding is
//! consensus-critical: it must be byte-identical across implementations,
//! and everything the core produces round-trips through it.

use crate::{
    ring_ct::{EcdhInfo, RangeProof, RctSignatures, RctType},
    tx::{Transaction, TxIn, TxOut, TxOutTarget},
};
use alloc::vec::Vec;
use caracal_crypto_keys::PublicKey;
use caracal_crypto_ring_signature::{
    CompressedCommitment, KeyImage, RingMlsag, RingSigElement, Scalar,
};
use displaydoc::Display;
use serde::{Deserialize, Serialize};

/// Discriminant of the coinbase input variant.
pub const TXIN_GEN_TAG: u8 = 0xff;
/// Discriminant of the key-spend input variant.
pub const TXIN_TO_KEY_TAG: u8 = 0x02;
/// Discriminant of the plain-key output target.
pub const TXOUT_TO_KEY_TAG: u8 = 0x02;
/// Discriminant of the view-tagged output target.
pub const TXOUT_TO_TAGGED_KEY_TAG: u8 = 0x03;

/// An error that can occur when decoding a transaction.
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum SerializationError {
    /// Unexpected end of input
    UnexpectedEof,

    /// Varint does not fit in 64 bits
    VarintOverflow,

    /// Unsupported transaction version {0}
    InvalidVersion(u64),

    /// Unknown input tag {0}
    InvalidInputTag(u8),

    /// Unknown output tag {0}
    InvalidOutputTag(u8),

    /// Unknown RingCT type {0}
    InvalidRctType(u8),

    /// Non-canonical scalar encoding
    InvalidScalar,

    /// Trailing bytes after the transaction
    TrailingBytes,
}

/// Append a LEB128 varint.
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
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

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn read_u8(&mut self) -> Result<u8, SerializationError> {
        let (&byte, rest) = self
            .bytes
            .split_first()
            .ok_or(SerializationError::UnexpectedEof)?;
        self.bytes = rest;
        Ok(byte)
    }

    fn read_array(&mut self) -> Result<[u8; 32], SerializationError> {
        if self.bytes.len() < 32 {
            return Err(SerializationError::UnexpectedEof);
        }
        let (head, rest) = self.bytes.split_at(32);
        self.bytes = rest;
        Ok(head.try_into().expect("split at 32"))
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], SerializationError> {
        if self.bytes.len() < len {
            return Err(SerializationError::UnexpectedEof);
        }
        let (head, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok(head)
    }

    fn read_varint(&mut self) -> Result<u64, SerializationError> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(SerializationError::VarintOverflow);
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(SerializationError::VarintOverflow);
            }
        }
    }

    fn read_scalar(&mut self) -> Result<Scalar, SerializationError> {
        Option::<Scalar>::from(Scalar::from_canonical_bytes(self.read_array()?))
            .ok_or(SerializationError::InvalidScalar)
    }
}

fn write_tx_in(buf: &mut Vec<u8>, input: &TxIn) {
    match input {
        TxIn::Gen { height } => {
            buf.push(TXIN_GEN_TAG);
            write_varint(buf, *height);
        }
        TxIn::ToKey {
            amount,
            key_offsets,
            key_image,
        } => {
            buf.push(TXIN_TO_KEY_TAG);
            write_varint(buf, *amount);
            write_varint(buf, key_offsets.len() as u64);
            for offset in key_offsets {
                write_varint(buf, *offset);
            }
            buf.extend_from_slice(key_image.as_bytes());
        }
    }
}

fn read_tx_in(reader: &mut Reader<'_>) -> Result<TxIn, SerializationError> {
    match reader.read_u8()? {
        TXIN_GEN_TAG => Ok(TxIn::Gen {
            height: reader.read_varint()?,
        }),
        TXIN_TO_KEY_TAG => {
            let amount = reader.read_varint()?;
            let count = reader.read_varint()? as usize;
            let mut key_offsets = Vec::with_capacity(count);
            for _ in 0..count {
                key_offsets.push(reader.read_varint()?);
            }
            let key_image =
                KeyImage::try_from(reader.read_array()?).expect("32-byte key image");
            Ok(TxIn::ToKey {
                amount,
                key_offsets,
                key_image,
            })
        }
        tag => Err(SerializationError::InvalidInputTag(tag)),
    }
}

fn write_tx_out(buf: &mut Vec<u8>, output: &TxOut) {
    write_varint(buf, output.amount);
    match &output.target {
        TxOutTarget::ToKey { key } => {
            buf.push(TXOUT_TO_KEY_TAG);
            buf.extend_from_slice(key.as_bytes());
        }
        TxOutTarget::ToTaggedKey { key, view_tag } => {
            buf.push(TXOUT_TO_TAGGED_KEY_TAG);
            buf.extend_from_slice(key.as_bytes());
            buf.push(*view_tag);
        }
    }
}

fn read_tx_out(reader: &mut Reader<'_>) -> Result<TxOut, SerializationError> {
    let amount = reader.read_varint()?;
    let target = match reader.read_u8()? {
        TXOUT_TO_KEY_TAG => TxOutTarget::ToKey {
            key: PublicKey::from_bytes(reader.read_array()?),
        },
        TXOUT_TO_TAGGED_KEY_TAG => TxOutTarget::ToTaggedKey {
            key: PublicKey::from_bytes(reader.read_array()?),
            view_tag: reader.read_u8()?,
        },
        tag => return Err(SerializationError::InvalidOutputTag(tag)),
    };
    Ok(TxOut { amount, target })
}

/// Serialize the prefix: everything except the signature section.
pub fn serialize_tx_prefix(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64 + tx.vin.len() * 64 + tx.vout.len() * 40 + tx.extra.len());
    write_varint(&mut buf, u64::from(tx.version));
    write_varint(&mut buf, tx.unlock_time);
    write_varint(&mut buf, tx.vin.len() as u64);
    for input in &tx.vin {
        write_tx_in(&mut buf, input);
    }
    write_varint(&mut buf, tx.vout.len() as u64);
    for output in &tx.vout {
        write_tx_out(&mut buf, output);
    }
    write_varint(&mut buf, tx.extra.len() as u64);
    buf.extend_from_slice(&tx.extra);
    buf
}

fn write_rct_signatures(buf: &mut Vec<u8>, rct: &RctSignatures) {
    buf.push(rct.rct_type as u8);
    write_varint(buf, rct.fee);
    if rct.rct_type == RctType::Simple {
        write_varint(buf, rct.pseudo_outs.len() as u64);
        for pseudo in &rct.pseudo_outs {
            buf.extend_from_slice(pseudo.as_bytes());
        }
    }
    write_varint(buf, rct.ecdh_info.len() as u64);
    for ecdh in &rct.ecdh_info {
        buf.extend_from_slice(&ecdh.amount);
    }
    write_varint(buf, rct.out_pk.len() as u64);
    for out in &rct.out_pk {
        buf.extend_from_slice(out.as_bytes());
    }
    write_varint(buf, rct.range_proof.0.len() as u64);
    buf.extend_from_slice(&rct.range_proof.0);
    write_varint(buf, rct.mlsags.len() as u64);
    for mlsag in &rct.mlsags {
        write_varint(buf, mlsag.ss.len() as u64);
        let rows = mlsag.ss.first().map_or(0, Vec::len);
        write_varint(buf, rows as u64);
        for column in &mlsag.ss {
            for scalar in column {
                buf.extend_from_slice(&scalar.to_bytes());
            }
        }
        buf.extend_from_slice(&mlsag.cc.to_bytes());
        write_varint(buf, mlsag.key_images.len() as u64);
        for image in &mlsag.key_images {
            buf.extend_from_slice(image.as_bytes());
        }
    }
}

fn read_rct_signatures(
    reader: &mut Reader<'_>,
    rct_type: RctType,
) -> Result<RctSignatures, SerializationError> {
    let fee = reader.read_varint()?;
    let pseudo_outs = if rct_type == RctType::Simple {
        let count = reader.read_varint()? as usize;
        let mut pseudo_outs = Vec::with_capacity(count);
        for _ in 0..count {
            pseudo_outs.push(CompressedCommitment::from_bytes(reader.read_array()?));
        }
        pseudo_outs
    } else {
        Vec::new()
    };

    let count = reader.read_varint()? as usize;
    let mut ecdh_info = Vec::with_capacity(count);
    for _ in 0..count {
        let bytes: [u8; 8] = reader
            .read_slice(8)?
            .try_into()
            .expect("8-byte ecdh amount");
        ecdh_info.push(EcdhInfo { amount: bytes });
    }

    let count = reader.read_varint()? as usize;
    let mut out_pk = Vec::with_capacity(count);
    for _ in 0..count {
        out_pk.push(CompressedCommitment::from_bytes(reader.read_array()?));
    }

    let proof_len = reader.read_varint()? as usize;
    let range_proof = RangeProof(reader.read_slice(proof_len)?.to_vec());

    let count = reader.read_varint()? as usize;
    let mut mlsags = Vec::with_capacity(count);
    for _ in 0..count {
        let cols = reader.read_varint()? as usize;
        let rows = reader.read_varint()? as usize;
        let mut ss = Vec::with_capacity(cols);
        for _ in 0..cols {
            let mut column = Vec::with_capacity(rows);
            for _ in 0..rows {
                column.push(reader.read_scalar()?);
            }
            ss.push(column);
        }
        let cc = reader.read_scalar()?;
        let image_count = reader.read_varint()? as usize;
        let mut key_images = Vec::with_capacity(image_count);
        for _ in 0..image_count {
            key_images.push(KeyImage::try_from(reader.read_array()?).expect("32-byte key image"));
        }
        mlsags.push(RingMlsag { ss, cc, key_images });
    }

    Ok(RctSignatures {
        rct_type,
        fee,
        pseudo_outs,
        ecdh_info,
        out_pk,
        range_proof,
        mlsags,
    })
}

/// Serialize a full transaction including its signature section.
pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let mut buf = serialize_tx_prefix(tx);
    if tx.version == 1 {
        if !tx.signatures.is_empty() {
            debug_assert_eq!(tx.signatures.len(), tx.vin.len());
            for sigs in &tx.signatures {
                for element in sigs {
                    buf.extend_from_slice(&element.c.to_bytes());
                    buf.extend_from_slice(&element.r.to_bytes());
                }
            }
        }
    } else {
        match &tx.rct_signatures {
            Some(rct) => write_rct_signatures(&mut buf, rct),
            None => buf.push(RctType::Null as u8),
        }
    }
    buf
}

/// Parse a full transaction, rejecting trailing bytes.
pub fn deserialize_transaction(bytes: &[u8]) -> Result<Transaction, SerializationError> {
    let mut reader = Reader::new(bytes);

    let version = reader.read_varint()?;
    if version != 1 && version != 2 {
        return Err(SerializationError::InvalidVersion(version));
    }
    let unlock_time = reader.read_varint()?;

    let vin_count = reader.read_varint()? as usize;
    let mut vin = Vec::with_capacity(vin_count);
    for _ in 0..vin_count {
        vin.push(read_tx_in(&mut reader)?);
    }

    let vout_count = reader.read_varint()? as usize;
    let mut vout = Vec::with_capacity(vout_count);
    for _ in 0..vout_count {
        vout.push(read_tx_out(&mut reader)?);
    }

    let extra_len = reader.read_varint()? as usize;
    let extra = reader.read_slice(extra_len)?.to_vec();

    let mut signatures = Vec::new();
    let mut rct_signatures = None;
    if version == 1 {
        for input in &vin {
            let row = match input {
                TxIn::ToKey { key_offsets, .. } => {
                    let mut row = Vec::with_capacity(key_offsets.len());
                    for _ in 0..key_offsets.len() {
                        row.push(RingSigElement {
                            c: reader.read_scalar()?,
                            r: reader.read_scalar()?,
                        });
                    }
                    row
                }
                TxIn::Gen { .. } => Vec::new(),
            };
            signatures.push(row);
        }
        // A coinbase (or otherwise signature-free) v1 transaction encodes no
        // rows at all.
        if signatures.iter().all(Vec::is_empty) {
            signatures = Vec::new();
        }
    } else {
        let type_byte = reader.read_u8()?;
        let rct_type = RctType::from_u8(type_byte)
            .ok_or(SerializationError::InvalidRctType(type_byte))?;
        rct_signatures = match rct_type {
            RctType::Null => None,
            rct_type => Some(read_rct_signatures(&mut reader, rct_type)?),
        };
    }

    if !reader.is_empty() {
        return Err(SerializationError::TrailingBytes);
    }

    Ok(Transaction {
        version: version as u16,
        unlock_time,
        vin,
        vout,
        extra,
        signatures,
        rct_signatures,
        ..Transaction::default()
    })
}
