// Copyright (c) 2019-2024 The Caracal Project

//! Consensus tunables of the transaction layer.

/// Blocks a coinbase output stays locked after the block it was mined in.
pub const MINED_MONEY_UNLOCK_WINDOW: u64 = 60;

/// Upper bound on the serialized `extra` field of any transaction.
pub const MAX_TX_EXTRA_SIZE: usize = 1060;

/// Miner rewards between fork versions 2 and 4 are clamped down to a
/// multiple of this, pushing the remainder back onto the emission curve.
pub const BASE_REWARD_CLAMP_THRESHOLD: u64 = 100_000_000;

/// Decomposition chunks below this count as dust before fork version 2.
pub const DEFAULT_DUST_THRESHOLD: u64 = 2_000_000_000;

/// First fork version hashed with RandomX.
pub const RX_BLOCK_VERSION: u8 = 12;

/// First fork version with rotating governance and the Felidae hash on
/// governance blocks.
pub const FELIDAE_BLOCK_VERSION: u8 = 13;

/// Every fourth block is a governance block under rotating governance.
pub const GOVERNANCE_BLOCK_CADENCE: u64 = 4;

/// Size of the legacy governance payout table; also the height modulus
/// that selects an entry from it.
pub const LEGACY_GOVERNANCE_TABLE_SIZE: u64 = 16;

/// First height at which the legacy governance carve-out applies.
pub const LEGACY_GOVERNANCE_START_HEIGHT: u64 = 16;

/// Blocks up to this weight take the full reward; the quadratic penalty
/// applies between one and two times the effective median above it.
pub const BLOCK_GRANTED_FULL_REWARD_ZONE: usize = 300_000;

/// Total atomic units the emission curve approaches.
pub const MONEY_SUPPLY: u64 = u64::MAX;

/// Right-shift applied to the remaining supply to obtain a base reward.
pub const EMISSION_SPEED_FACTOR: u32 = 19;

/// Reward floor once the curve has flattened out.
pub const TAIL_EMISSION_REWARD: u64 = 600_000_000;

/// RandomX re-seeds once per this many blocks.
pub const RX_SEEDHASH_EPOCH_BLOCKS: u64 = 2048;

/// Blocks of lag before a new RandomX seed takes effect, giving miners
/// time to re-initialize their datasets.
pub const RX_SEEDHASH_EPOCH_LAG: u64 = 64;
