// Copyright (c) 2019-2024 The Caracal Project

//! Coinbase construction.
//!
//! A miner transaction mints the block reward into stealth outputs for the
//! miner, decomposed into round denominations, plus the governance
//! carve-out output under the legacy regime. The reward schedule itself is
//! host-supplied through [`RewardSchedule`].

use crate::{
    error::TxBuilderError,
    governance::{
        get_deterministic_keypair_from_height, get_deterministic_output_key, governance_address_v1,
        governance_reward, is_governance_miner,
    },
};
use caracal_account_keys::{Network, PublicAddress};
use caracal_crypto_keys::Keypair;
use caracal_crypto_ring_signature::onetime_keys::{derive_public_key, generate_key_derivation};
use caracal_transaction_core::{
    constants::{
        BASE_REWARD_CLAMP_THRESHOLD, BLOCK_GRANTED_FULL_REWARD_ZONE, DEFAULT_DUST_THRESHOLD,
        EMISSION_SPEED_FACTOR, FELIDAE_BLOCK_VERSION, GOVERNANCE_BLOCK_CADENCE,
        LEGACY_GOVERNANCE_START_HEIGHT, MINED_MONEY_UNLOCK_WINDOW, MONEY_SUPPLY,
        TAIL_EMISSION_REWARD,
    },
    decompose_amount,
    extra::{add_extra_nonce_to_tx_extra, add_tx_public_key_to_extra, sort_tx_extra},
    Transaction, TxIn, TxOut,
};
use displaydoc::Display;
use rand_core::{CryptoRng, RngCore};

/// An error from the reward schedule.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum RewardError {
    /// Block weight exceeds twice the effective median
    BlockTooBig,
}

/// The host-supplied emission schedule.
pub trait RewardSchedule {
    /// Base reward for a block of `current_weight` against the median,
    /// given the coins already generated.
    fn block_reward(
        &self,
        median_weight: usize,
        current_weight: usize,
        already_generated: u64,
        fork_version: u8,
        height: u64,
    ) -> Result<u64, RewardError>;
}

/// The standard emission curve: remaining supply shifted down by the
/// emission speed factor, floored at the tail emission, with the quadratic
/// penalty for blocks between one and two times the effective median.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardRewardSchedule;

impl RewardSchedule for StandardRewardSchedule {
    fn block_reward(
        &self,
        median_weight: usize,
        current_weight: usize,
        already_generated: u64,
        _fork_version: u8,
        _height: u64,
    ) -> Result<u64, RewardError> {
        let mut base_reward = (MONEY_SUPPLY - already_generated) >> EMISSION_SPEED_FACTOR;
        if base_reward < TAIL_EMISSION_REWARD {
            base_reward = TAIL_EMISSION_REWARD;
        }

        let median = median_weight.max(BLOCK_GRANTED_FULL_REWARD_ZONE);
        if current_weight <= median {
            return Ok(base_reward);
        }
        if current_weight > median * 2 {
            return Err(RewardError::BlockTooBig);
        }

        // reward * (1 - ((w - m) / m)^2), computed in u128 to dodge the
        // overflow on w - m up to m.
        let excess = (current_weight - median) as u128;
        let median = median as u128;
        let penalty = (u128::from(base_reward) * excess * excess) / (median * median);
        Ok(base_reward - penalty as u64)
    }
}

/// Everything the coinbase builder needs to know about the block.
#[derive(Clone, Debug)]
pub struct MinerTxParams<'a> {
    /// Height of the block being built.
    pub height: u64,
    /// Median block weight over the reward window.
    pub median_weight: usize,
    /// Coins emitted before this block.
    pub already_generated_coins: u64,
    /// Weight of the block being built.
    pub current_block_weight: usize,
    /// Total fees of the included transactions.
    pub fee: u64,
    /// The miner's payout address.
    pub miner_address: &'a PublicAddress,
    /// Opaque extra nonce from the pool or miner, may be empty.
    pub extra_nonce: &'a [u8],
    /// Maximum number of outputs the coinbase may carry.
    pub max_outs: usize,
    /// Hard-fork version the block is built under.
    pub fork_version: u8,
    /// Which chain the block belongs to.
    pub network: Network,
}

/// Whether the legacy governance carve-out applies to this block.
///
/// The genesis era (`already_generated_coins == 0`) emits no governance
/// output, so nothing is carved out of the reward either.
fn legacy_governance_active(params: &MinerTxParams<'_>) -> bool {
    (2..FELIDAE_BLOCK_VERSION).contains(&params.fork_version)
        && params.height >= LEGACY_GOVERNANCE_START_HEIGHT
        && params.already_generated_coins != 0
}

/// Assemble a coinbase transaction.
///
/// Under legacy governance a quarter of the base reward is carved out to
/// the table address for this height, emitted as one extra output under a
/// second, deterministic tx key. Under rotating governance a matching
/// miner on a governance block uses the deterministic height-keyed tx
/// secret outright and receives the whole reward.
pub fn construct_miner_tx<RNG: CryptoRng + RngCore>(
    params: &MinerTxParams<'_>,
    schedule: &dyn RewardSchedule,
    rng: &mut RNG,
) -> Result<Transaction, TxBuilderError> {
    let mut tx = Transaction::new();

    let governance_block = params.fork_version >= FELIDAE_BLOCK_VERSION
        && params.height % GOVERNANCE_BLOCK_CADENCE == 0;
    let governance_miner =
        governance_block && is_governance_miner(params.miner_address, params.network);

    let tx_keypair = if governance_block && governance_miner {
        get_deterministic_keypair_from_height(params.height)
    } else {
        Keypair::generate(rng)
    };

    add_tx_public_key_to_extra(&mut tx.extra, &tx_keypair.public);
    if !params.extra_nonce.is_empty() {
        add_extra_nonce_to_tx_extra(&mut tx.extra, params.extra_nonce)?;
    }
    tx.extra = sort_tx_extra(&tx.extra)?;

    let mut block_reward = schedule
        .block_reward(
            params.median_weight,
            params.current_block_weight,
            params.already_generated_coins,
            params.fork_version,
            params.height,
        )
        .map_err(|_| TxBuilderError::BlockTooBig)?;

    let legacy_governance = legacy_governance_active(params);
    let mut carved_reward = 0u64;
    if legacy_governance {
        carved_reward = governance_reward(block_reward);
        block_reward -= carved_reward;
    }

    block_reward += params.fee;

    // Between forks 2 and 4 the low digits are cut off entirely, keeping
    // the coinbase small; the remainder returns to the emission schedule.
    if (2..4).contains(&params.fork_version) {
        block_reward -= block_reward % BASE_REWARD_CLAMP_THRESHOLD;
    }

    let dust_threshold = if params.fork_version >= 2 {
        0
    } else {
        DEFAULT_DUST_THRESHOLD
    };
    let mut out_amounts = decompose_amount(block_reward, dust_threshold);

    if params.max_outs == 0 {
        return Err(TxBuilderError::MaxOutsExceeded(out_amounts.len(), 0));
    }
    if params.height == 0 || params.fork_version >= 4 {
        // The genesis block was never decomposed; later forks fold the low
        // denominations together until the count fits.
        while out_amounts.len() > params.max_outs {
            let lowest = out_amounts.remove(0);
            out_amounts[0] += lowest;
        }
    } else if out_amounts.len() > params.max_outs {
        return Err(TxBuilderError::MaxOutsExceeded(
            out_amounts.len(),
            params.max_outs,
        ));
    }

    let derivation =
        generate_key_derivation(params.miner_address.view_public_key(), &tx_keypair.secret)?;
    let mut summary_amounts = 0u64;
    for (output_index, amount) in out_amounts.iter().enumerate() {
        let out_ephemeral = derive_public_key(
            &derivation,
            output_index as u64,
            params.miner_address.spend_public_key(),
        )?;
        tx.vout.push(TxOut::new(*amount, out_ephemeral, None));
        summary_amounts += amount;
    }

    if legacy_governance {
        let governance_keypair = get_deterministic_keypair_from_height(params.height);
        // Appended after the canonical sort: the coinbase legitimately
        // carries two tx-public-key fields and sorting again would
        // coalesce them.
        add_tx_public_key_to_extra(&mut tx.extra, &governance_keypair.public);

        let governance_address = governance_address_v1(params.height, params.network);
        let out_ephemeral =
            get_deterministic_output_key(&governance_address, &governance_keypair, 1)?;
        summary_amounts += carved_reward;
        tx.vout.push(TxOut::new(carved_reward, out_ephemeral, None));

        if summary_amounts != block_reward + carved_reward {
            return Err(TxBuilderError::RewardSumMismatch(
                summary_amounts,
                block_reward + carved_reward,
            ));
        }
    }

    tx.version = if params.fork_version >= 4 { 2 } else { 1 };
    tx.unlock_time = params.height + MINED_MONEY_UNLOCK_WINDOW;
    tx.vin.push(TxIn::Gen {
        height: params.height,
    });
    tx.invalidate_hashes();

    log::debug!(
        "miner tx built: height {}, reward {} (+{} governance), {} outputs",
        params.height,
        block_reward,
        carved_reward,
        tx.vout.len()
    );
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use caracal_account_keys::AccountKeys;
    use rand::{rngs::StdRng, SeedableRng};

    /// Fixed-reward schedule for exercising the builder in isolation.
    pub(crate) struct FixedReward(pub u64);

    impl RewardSchedule for FixedReward {
        fn block_reward(
            &self,
            _median_weight: usize,
            _current_weight: usize,
            _already_generated: u64,
            _fork_version: u8,
            _height: u64,
        ) -> Result<u64, RewardError> {
            Ok(self.0)
        }
    }

    fn miner_params<'a>(
        miner_address: &'a PublicAddress,
        height: u64,
        fork_version: u8,
        max_outs: usize,
    ) -> MinerTxParams<'a> {
        MinerTxParams {
            height,
            median_weight: 300_000,
            already_generated_coins: 0,
            current_block_weight: 1_000,
            fee: 0,
            miner_address,
            extra_nonce: &[],
            max_outs,
            fork_version,
            network: Network::Mainnet,
        }
    }

    #[test]
    fn single_digit_reward_is_one_output() {
        let mut rng = StdRng::from_seed([91u8; 32]);
        let miner = AccountKeys::random(&mut rng);
        let params = miner_params(miner.address(), 100, 5, 4);

        let tx = construct_miner_tx(&params, &FixedReward(10_000_000_000), &mut rng).unwrap();
        assert_eq!(tx.version, 2);
        assert_eq!(tx.unlock_time, 100 + MINED_MONEY_UNLOCK_WINDOW);
        assert_eq!(tx.vin, alloc::vec![TxIn::Gen { height: 100 }]);
        assert_eq!(tx.vout.len(), 1);
        assert_eq!(tx.vout[0].amount, 10_000_000_000);
    }

    #[test]
    fn multi_digit_rewards_fold_into_max_outs() {
        let mut rng = StdRng::from_seed([92u8; 32]);
        let miner = AccountKeys::random(&mut rng);
        let params = miner_params(miner.address(), 100, 5, 1);

        let tx = construct_miner_tx(&params, &FixedReward(1234), &mut rng).unwrap();
        assert_eq!(tx.vout.len(), 1);
        assert_eq!(tx.vout[0].amount, 1234);
    }

    #[test]
    fn height_zero_folds_regardless_of_fork() {
        let mut rng = StdRng::from_seed([93u8; 32]);
        let miner = AccountKeys::random(&mut rng);
        let params = miner_params(miner.address(), 0, 1, 2);

        let tx = construct_miner_tx(&params, &FixedReward(1234), &mut rng).unwrap();
        assert_eq!(tx.vout.len(), 2);
        let total: u64 = tx.vout.iter().map(|out| out.amount).sum();
        assert_eq!(total, 1234);
    }

    #[test]
    fn early_forks_reject_overflowing_decomposition() {
        let mut rng = StdRng::from_seed([94u8; 32]);
        let miner = AccountKeys::random(&mut rng);
        // Fork 3 decomposes without folding.
        let params = miner_params(miner.address(), 10, 3, 1);

        let result = construct_miner_tx(&params, &FixedReward(1_200_000_000), &mut rng);
        assert!(matches!(
            result,
            Err(TxBuilderError::MaxOutsExceeded(_, 1))
        ));
    }

    #[test]
    fn version_follows_the_fork() {
        let mut rng = StdRng::from_seed([95u8; 32]);
        let miner = AccountKeys::random(&mut rng);

        let params = miner_params(miner.address(), 7, 1, 16);
        let tx = construct_miner_tx(&params, &FixedReward(5_000_000_000), &mut rng).unwrap();
        assert_eq!(tx.version, 1);

        let params = miner_params(miner.address(), 7, 4, 16);
        let tx = construct_miner_tx(&params, &FixedReward(5_000_000_000), &mut rng).unwrap();
        assert_eq!(tx.version, 2);
    }

    #[test]
    fn legacy_governance_carves_a_quarter() {
        let mut rng = StdRng::from_seed([97u8; 32]);
        let miner = AccountKeys::random(&mut rng);
        let mut params = miner_params(miner.address(), 32, 10, 4);
        params.already_generated_coins = 1_000_000;

        let tx = construct_miner_tx(&params, &FixedReward(4_000), &mut rng).unwrap();
        assert_eq!(tx.vout.len(), 2);
        assert_eq!(tx.vout[0].amount, 3_000);
        assert_eq!(tx.vout[1].amount, 1_000);

        // Two tx-public-key fields: the miner's and the deterministic one.
        let fields =
            caracal_transaction_core::extra::parse_tx_extra(&tx.extra).unwrap();
        let pubkeys = fields
            .iter()
            .filter(|field| {
                matches!(
                    field,
                    caracal_transaction_core::extra::ExtraField::TxPublicKey(_)
                )
            })
            .count();
        assert_eq!(pubkeys, 2);
    }

    #[test]
    fn block_too_big_propagates() {
        let mut rng = StdRng::from_seed([96u8; 32]);
        let miner = AccountKeys::random(&mut rng);
        let mut params = miner_params(miner.address(), 100, 5, 4);
        params.current_block_weight = 700_000;

        assert_eq!(
            construct_miner_tx(&params, &StandardRewardSchedule, &mut rng).err(),
            Some(TxBuilderError::BlockTooBig)
        );
    }

    #[test]
    fn standard_schedule_penalizes_oversize_blocks() {
        let schedule = StandardRewardSchedule;
        let full = schedule.block_reward(0, 100_000, 0, 5, 10).unwrap();
        let penalized = schedule.block_reward(0, 450_000, 0, 5, 10).unwrap();
        assert!(penalized < full);
        assert!(penalized > 0);
        assert_eq!(
            schedule.block_reward(0, 600_001, 0, 5, 10),
            Err(RewardError::BlockTooBig)
        );
    }

    #[test]
    fn tail_emission_floors_the_reward() {
        let schedule = StandardRewardSchedule;
        let reward = schedule
            .block_reward(0, 1_000, MONEY_SUPPLY - 1, 20, 1_000_000)
            .unwrap();
        assert_eq!(reward, TAIL_EMISSION_REWARD);
    }
}
