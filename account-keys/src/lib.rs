// Copyright (c) 2019-2024 The Caracal Project

//! Caracal account keys.
//!
//! An account is a pair of private keys `(a, b)` used for identifying owned
//! outputs and spending them, respectively. Senders are handed either the
//! standard address `(B, A)` or a derived subaddress `(D_i, C_i)`; the
//! subaddress derivation path is what lets one account present unlinkable
//! receiving identities.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

mod account_keys;
mod domain_separators;

pub use account_keys::{AccountKeys, PublicAddress, SubaddressIndex};

use serde::{Deserialize, Serialize};

/// Which chain a set of addresses belongs to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Network {
    /// The production chain.
    Mainnet,
    /// The public test chain.
    Testnet,
    /// The staging chain.
    Stagenet,
}
