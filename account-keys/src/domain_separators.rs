// Copyright (c) 2019-2024 The Caracal Project

//! Domain separation tags for account-key derivations.

/// Prefix of the subaddress secret hash, including the trailing NUL the
/// wallet protocol fixed long ago.
pub const SUBADDRESS_DOMAIN_TAG: &[u8] = b"SubAddr\0";
