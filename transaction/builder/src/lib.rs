// Copyright (c) 2019-2024 The Caracal Project

//! Caracal transaction construction.
//!
//! The two builders — [`construct_miner_tx`] for coinbases and
//! [`construct_tx_and_get_tx_key`] for spends — sit on the cryptographic
//! critical path: key derivation, output emission, canonical input
//! ordering, and the hand-off to the v1 ring signer or the RingCT signer.
//! The governance module carries the deterministic payout scheme, and the
//! pow module routes block blobs to the right long-hash function.
//!
//! Everything here is synchronous and free of global state; the signing
//! device, reward schedule, range-proof library and chain handle are all
//! passed in as trait objects.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

mod classify;
mod device;
mod entries;
mod error;
mod miner;
mod spend;

pub mod governance;
pub mod pow;

pub use classify::{classify_addresses, destination_view_key_pub, AddressSplit};
pub use device::{DeviceError, SigningDevice, SoftwareDevice};
pub use entries::{TxDestinationEntry, TxSourceEntry};
pub use error::TxBuilderError;
pub use miner::{
    construct_miner_tx, MinerTxParams, RewardError, RewardSchedule, StandardRewardSchedule,
};
pub use spend::{
    construct_tx, construct_tx_and_get_tx_key, construct_tx_with_tx_key, SpendTxOptions,
};

// The account and network types every construction API is phrased in.
pub use caracal_account_keys::{AccountKeys, Network, PublicAddress, SubaddressIndex};
