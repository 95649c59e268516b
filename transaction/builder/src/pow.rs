// Copyright (c) 2019-2024 The Caracal Project

//! The proof-of-work long-hash dispatcher.
//!
//! Three hash functions share the chain's history: CryptoNight variants up
//! to the RandomX fork, RandomX after it, and Felidae on governance blocks
//! once rotating governance activates. The dispatcher routes a block
//! hashing blob to the right one from `(major_version, height)`; the hash
//! implementations themselves live outside this crate behind [`PowHashes`].

use caracal_crypto_keys::PublicKey;
use caracal_transaction_core::constants::{
    FELIDAE_BLOCK_VERSION, GOVERNANCE_BLOCK_CADENCE, RX_BLOCK_VERSION, RX_SEEDHASH_EPOCH_BLOCKS,
    RX_SEEDHASH_EPOCH_LAG,
};

/// The external long-hash implementations.
pub trait PowHashes {
    /// Felidae hash of a block blob.
    fn felidae(&self, blob: &[u8], variant: u32) -> [u8; 32];

    /// RandomX against the epoch seed.
    fn randomx(&self, seed: &[u8; 32], blob: &[u8]) -> [u8; 32];

    /// CryptoNight with the given variant.
    fn cn_slow(&self, blob: &[u8], variant: u8, height: u64) -> [u8; 32];
}

/// What the dispatcher and governance check need from the chain.
pub trait ChainReader {
    /// The current chain height.
    fn current_height(&self) -> u64;

    /// The pending block id at `height`, used as the RandomX seed.
    fn pending_block_id_by_height(&self, height: u64) -> [u8; 32];

    /// The final coinbase output `(index, key)` of the block at `height`.
    fn last_coinbase_output(&self, height: u64) -> Option<(u64, PublicKey)>;
}

/// The height whose block id seeds RandomX for blocks at `height`.
///
/// Seeds change once per epoch, lagged so miners can re-init datasets
/// ahead of the switch.
pub fn rx_seed_height(height: u64) -> u64 {
    if height <= RX_SEEDHASH_EPOCH_BLOCKS + RX_SEEDHASH_EPOCH_LAG {
        0
    } else {
        (height - RX_SEEDHASH_EPOCH_LAG - 1) & !(RX_SEEDHASH_EPOCH_BLOCKS - 1)
    }
}

/// Long-hash a block hashing blob.
///
/// Governance blocks (`major_version >= 13`, `height % 4 == 0`) take
/// Felidae; otherwise RandomX from [`RX_BLOCK_VERSION`] with the seed
/// taken from `seed_hash`, the chain, or all-zeroes when neither exists
/// (genesis); earlier versions take CryptoNight with
/// `variant = major_version - 6` from version 7, variant 0 before.
pub fn get_block_longhash(
    chain: Option<&dyn ChainReader>,
    hashes: &dyn PowHashes,
    blob: &[u8],
    height: u64,
    major_version: u8,
    seed_hash: Option<&[u8; 32]>,
) -> [u8; 32] {
    if major_version >= FELIDAE_BLOCK_VERSION && height % GOVERNANCE_BLOCK_CADENCE == 0 {
        return hashes.felidae(blob, 1);
    }
    if major_version >= RX_BLOCK_VERSION {
        let seed = match seed_hash {
            Some(seed) => *seed,
            None => match chain {
                Some(chain) => chain.pending_block_id_by_height(rx_seed_height(height)),
                // Only happens when generating the genesis block.
                None => [0u8; 32],
            },
        };
        return hashes.randomx(&seed, blob);
    }
    let variant = if major_version >= 7 {
        major_version - 6
    } else {
        0
    };
    hashes.cn_slow(blob, variant, height)
}

/// Long-hash an alternative-chain block with an explicit seed, skipping
/// the chain lookup.
pub fn get_altblock_longhash(
    hashes: &dyn PowHashes,
    blob: &[u8],
    height: u64,
    major_version: u8,
    seed_hash: &[u8; 32],
) -> [u8; 32] {
    if major_version >= FELIDAE_BLOCK_VERSION && height % GOVERNANCE_BLOCK_CADENCE == 0 {
        hashes.felidae(blob, 1)
    } else {
        hashes.randomx(seed_hash, blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tags the output with the function that produced it.
    struct TaggingHashes;

    impl PowHashes for TaggingHashes {
        fn felidae(&self, _blob: &[u8], variant: u32) -> [u8; 32] {
            let mut out = [0xf1u8; 32];
            out[1] = variant as u8;
            out
        }

        fn randomx(&self, seed: &[u8; 32], _blob: &[u8]) -> [u8; 32] {
            let mut out = [0x22u8; 32];
            out[1] = seed[0];
            out
        }

        fn cn_slow(&self, _blob: &[u8], variant: u8, _height: u64) -> [u8; 32] {
            let mut out = [0x33u8; 32];
            out[1] = variant;
            out
        }
    }

    struct FixedChain;

    impl ChainReader for FixedChain {
        fn current_height(&self) -> u64 {
            5000
        }

        fn pending_block_id_by_height(&self, height: u64) -> [u8; 32] {
            let mut id = [0u8; 32];
            id[0] = (height / RX_SEEDHASH_EPOCH_BLOCKS) as u8 + 1;
            id
        }

        fn last_coinbase_output(&self, _height: u64) -> Option<(u64, PublicKey)> {
            None
        }
    }

    #[test]
    fn governance_blocks_take_felidae() {
        let hash = get_block_longhash(None, &TaggingHashes, b"blob", 400, 13, None);
        assert_eq!(hash[0], 0xf1);
        assert_eq!(hash[1], 1);
    }

    #[test]
    fn non_governance_heights_fall_through_to_randomx() {
        let hash = get_block_longhash(None, &TaggingHashes, b"blob", 401, 13, None);
        assert_eq!(hash[0], 0x22);
        // Genesis-style: no chain handle means an all-zero seed.
        assert_eq!(hash[1], 0);
    }

    #[test]
    fn randomx_seed_comes_from_the_chain() {
        let hash = get_block_longhash(Some(&FixedChain), &TaggingHashes, b"blob", 4001, 12, None);
        assert_eq!(hash[0], 0x22);
        assert_eq!(hash[1], FixedChain.pending_block_id_by_height(rx_seed_height(4001))[0]);
    }

    #[test]
    fn provided_seed_wins_over_the_chain() {
        let seed = [9u8; 32];
        let hash =
            get_block_longhash(Some(&FixedChain), &TaggingHashes, b"blob", 4001, 12, Some(&seed));
        assert_eq!(hash[1], 9);
    }

    #[test]
    fn pre_randomx_versions_take_cryptonight_variants() {
        let hash = get_block_longhash(None, &TaggingHashes, b"blob", 10, 11, None);
        assert_eq!(hash[0], 0x33);
        assert_eq!(hash[1], 5);

        let hash = get_block_longhash(None, &TaggingHashes, b"blob", 10, 6, None);
        assert_eq!(hash[1], 0);
    }

    #[test]
    fn seed_height_schedule() {
        assert_eq!(rx_seed_height(0), 0);
        assert_eq!(rx_seed_height(RX_SEEDHASH_EPOCH_BLOCKS + RX_SEEDHASH_EPOCH_LAG), 0);
        assert_eq!(
            rx_seed_height(RX_SEEDHASH_EPOCH_BLOCKS + RX_SEEDHASH_EPOCH_LAG + 1),
            RX_SEEDHASH_EPOCH_BLOCKS
        );
        assert_eq!(rx_seed_height(3 * RX_SEEDHASH_EPOCH_BLOCKS), 2 * RX_SEEDHASH_EPOCH_BLOCKS);
    }

    #[test]
    fn altblock_variant_uses_the_explicit_seed() {
        let seed = [7u8; 32];
        let hash = get_altblock_longhash(&TaggingHashes, b"blob", 4001, 13, &seed);
        assert_eq!(hash[0], 0x22);
        assert_eq!(hash[1], 7);

        let hash = get_altblock_longhash(&TaggingHashes, b"blob", 4000, 13, &seed);
        assert_eq!(hash[0], 0xf1);
    }
}
