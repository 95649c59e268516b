// Copyright (c) 2019-2024 The Caracal Project

//! Spend-transaction construction.
//!
//! [`construct_tx_with_tx_key`] turns sources and destinations into a
//! signed transaction: payment-id normalization, input construction with
//! key images, canonical input ordering, stealth output emission through
//! the signing device, extra finalization, then the v1 ring signatures or
//! the RingCT bundle. [`construct_tx_and_get_tx_key`] wraps it in the
//! device bracket and generates the transaction keys.

use crate::{
    classify::{classify_addresses, destination_view_key_pub},
    device::SigningDevice,
    entries::{TxDestinationEntry, TxSourceEntry},
    error::TxBuilderError,
};
use alloc::{collections::BTreeMap, vec::Vec};
use caracal_account_keys::{AccountKeys, PublicAddress, SubaddressIndex};
use caracal_crypto_keys::{Keypair, PublicKey, SecretKey};
use caracal_crypto_ring_signature::{generate_ring_signature, Scalar};
use caracal_transaction_core::{
    extra::{
        self, add_additional_tx_public_keys_to_extra, add_extra_nonce_to_tx_extra,
        add_tx_public_key_to_extra, check_tx_extra_size, encrypted_payment_id_from_nonce,
        encrypted_payment_id_to_nonce, payment_id_from_nonce, remove_field_from_tx_extra,
        sort_tx_extra, ShortPaymentId, TX_EXTRA_TAG_ADDITIONAL_PUBKEYS, TX_EXTRA_TAG_NONCE,
        TX_EXTRA_TAG_PUBKEY,
    },
    generate_key_image_helper,
    ring_ct::{
        gen_rct_full, gen_rct_simple, CtKey, RangeProofProvider, RangeProofType, RctConfig,
        RingEntry,
    },
    Transaction, TxIn, TxOut,
};
use rand::seq::SliceRandom;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Construction switches for a spend transaction.
#[derive(Clone, Copy, Debug)]
pub struct SpendTxOptions {
    /// Minimum height or timestamp at which the outputs unlock.
    pub unlock_time: u64,
    /// Whether to produce a v2 RingCT transaction.
    pub rct: bool,
    /// RingCT configuration; relevant only when `rct` is set.
    pub rct_config: RctConfig,
    /// Fisher–Yates shuffle the destinations before output emission.
    pub shuffle_outs: bool,
    /// Emit view tags on outputs.
    pub use_view_tags: bool,
}

impl Default for SpendTxOptions {
    fn default() -> Self {
        Self {
            unlock_time: 0,
            rct: false,
            rct_config: RctConfig {
                range_proof_type: RangeProofType::Borromean,
                bp_version: 0,
            },
            shuffle_outs: true,
            use_view_tags: false,
        }
    }
}

/// Convert absolute ring offsets into the relative form carried on the
/// wire: the first stays absolute, every later entry becomes the delta to
/// its predecessor.
///
/// Offsets are expected sorted ascending; construction does not sort them.
fn absolute_output_offsets_to_relative(offsets: &[u64]) -> Vec<u64> {
    let mut relative = offsets.to_vec();
    for i in (1..relative.len()).rev() {
        relative[i] = relative[i].wrapping_sub(relative[i - 1]);
    }
    relative
}

/// Apply `permutation` through a swap callback, cycle by cycle, so that
/// parallel containers can be reordered in lockstep. After the call,
/// position `i` holds what was at `permutation[i]`.
fn apply_permutation<F: FnMut(usize, usize)>(mut permutation: Vec<usize>, mut swap: F) {
    for i in 0..permutation.len() {
        let mut current = i;
        while i != permutation[current] {
            let next = permutation[current];
            swap(current, next);
            permutation[current] = current;
            current = next;
        }
        permutation[current] = current;
    }
}

/// Normalize the payment id carried in `tx.extra` (spec step one of the
/// build): encrypt a short id against the unique payee view key, leave a
/// long id alone, and otherwise synthesize an encrypted dummy for small
/// transactions so that every transaction carries some nonce.
fn normalize_payment_id(
    tx: &mut Transaction,
    destinations: &[TxDestinationEntry],
    change_addr: Option<&PublicAddress>,
    tx_secret: &SecretKey,
    device: &mut dyn SigningDevice,
) -> Result<(), TxBuilderError> {
    let fields = extra::parse_tx_extra(&tx.extra)?;
    let mut add_dummy_payment_id = true;

    if let Some(nonce) = extra::find_tx_extra_nonce(&fields) {
        if let Some(payment_id) = encrypted_payment_id_from_nonce(nonce) {
            let view_key_pub = destination_view_key_pub(destinations, change_addr)
                .ok_or(TxBuilderError::NoUniqueDestinationViewKey)?;
            let encrypted = device
                .encrypt_payment_id(payment_id, &view_key_pub, tx_secret)
                .map_err(|_| TxBuilderError::PaymentIdEncryptionFailed)?;
            remove_field_from_tx_extra(&mut tx.extra, TX_EXTRA_TAG_NONCE)?;
            add_extra_nonce_to_tx_extra(&mut tx.extra, &encrypted_payment_id_to_nonce(encrypted))?;
            log::debug!("encrypted payment id {encrypted:?}");
            add_dummy_payment_id = false;
        } else if payment_id_from_nonce(nonce).is_some() {
            add_dummy_payment_id = false;
        }
    }

    // More than one payee plus change: no dummy, it could not be encrypted
    // to a unique recipient anyway.
    if destinations.len() > 2 {
        add_dummy_payment_id = false;
    }

    if add_dummy_payment_id {
        match destination_view_key_pub(destinations, change_addr) {
            Some(view_key_pub) => {
                match device.encrypt_payment_id(ShortPaymentId::default(), &view_key_pub, tx_secret)
                {
                    Ok(encrypted) => {
                        add_extra_nonce_to_tx_extra(
                            &mut tx.extra,
                            &encrypted_payment_id_to_nonce(encrypted),
                        )?;
                    }
                    Err(_) => {
                        log::warn!("failed to encrypt dummy payment id, continuing without");
                    }
                }
            }
            None => {
                log::warn!("no unique view key to encrypt the dummy payment id with");
            }
        }
    }
    Ok(())
}

/// Build a spend transaction from pre-generated transaction keys.
///
/// `sources` and `destinations` are reordered in place: sources follow the
/// canonical descending-key-image input order, destinations the optional
/// shuffle. On error the caller receives no transaction and any partially
/// built state is discarded.
#[allow(clippy::too_many_arguments)]
pub fn construct_tx_with_tx_key<RNG: CryptoRng + RngCore>(
    sender: &AccountKeys,
    subaddresses: &BTreeMap<PublicKey, SubaddressIndex>,
    sources: &mut [TxSourceEntry],
    destinations: &mut Vec<TxDestinationEntry>,
    change_addr: Option<&PublicAddress>,
    extra: &[u8],
    tx_secret: &SecretKey,
    additional_tx_secrets: &[SecretKey],
    options: &SpendTxOptions,
    device: &mut dyn SigningDevice,
    range_prover: &dyn RangeProofProvider,
    rng: &mut RNG,
) -> Result<Transaction, TxBuilderError> {
    if sources.is_empty() {
        return Err(TxBuilderError::EmptySources);
    }

    let mut tx = Transaction::new();
    tx.version = if options.rct { 2 } else { 1 };
    tx.unlock_time = options.unlock_time;
    tx.extra = extra.to_vec();

    normalize_payment_id(&mut tx, destinations, change_addr, tx_secret, device)?;

    // Inputs: recompute each source's one-time keypair and key image, and
    // require the derived public key to hit the claimed output key before
    // anything gets signed.
    let mut in_contexts: Vec<Keypair> = Vec::with_capacity(sources.len());
    let mut summary_inputs_money: u128 = 0;
    for (idx, source) in sources.iter().enumerate() {
        if source.real_output >= source.outputs.len() {
            return Err(TxBuilderError::SourceRingIndexOutOfBounds(
                source.real_output,
                source.outputs.len(),
            ));
        }
        summary_inputs_money += u128::from(source.amount);

        let out_key = source.outputs[source.real_output].1.dest;
        let (ephemeral, key_image) = generate_key_image_helper(
            sender,
            subaddresses,
            &out_key,
            &source.real_out_tx_key,
            &source.real_out_additional_tx_keys,
            source.real_output_in_tx_index,
        )
        .map_err(|_| TxBuilderError::DerivedKeyMismatch(idx))?;

        if ephemeral.public != out_key {
            log::warn!(
                "derived public key mismatch with output public key at input {idx}, real out {}",
                source.real_output
            );
            return Err(TxBuilderError::DerivedKeyMismatch(idx));
        }
        in_contexts.push(ephemeral);

        let absolute: Vec<u64> = source.outputs.iter().map(|(index, _)| *index).collect();
        tx.vin.push(TxIn::ToKey {
            amount: source.amount,
            key_offsets: absolute_output_offsets_to_relative(&absolute),
            key_image,
        });
    }

    if options.shuffle_outs {
        destinations.shuffle(rng);
    }

    // Canonical input order: descending key image, one permutation applied
    // in lockstep to vin, the ephemeral contexts and the sources. The
    // contexts are not comparable, so they can never be sorted
    // independently.
    let key_image_of = |input: &TxIn| match input {
        TxIn::ToKey { key_image, .. } => *key_image,
        TxIn::Gen { .. } => Default::default(),
    };
    let mut order: Vec<usize> = (0..sources.len()).collect();
    order.sort_by(|&a, &b| key_image_of(&tx.vin[b]).cmp(&key_image_of(&tx.vin[a])));
    apply_permutation(order, |a, b| {
        tx.vin.swap(a, b);
        in_contexts.swap(a, b);
        sources.swap(a, b);
    });

    // Canonical tx public key: `r · D` when the sole payee is a
    // subaddress, `r · G` otherwise.
    let split = classify_addresses(destinations, change_addr);
    let tx_public_key = if split.is_single_subaddress_destination() {
        let subaddress = split
            .single_dest_subaddress
            .as_ref()
            .expect("should be unreachable, the classifier counted one subaddress");
        device.scalarmult_key(subaddress.spend_public_key(), tx_secret)?
    } else {
        device.scalarmult_base(tx_secret)?
    };
    remove_field_from_tx_extra(&mut tx.extra, TX_EXTRA_TAG_PUBKEY)?;
    add_tx_public_key_to_extra(&mut tx.extra, &tx_public_key);

    let need_additional_tx_keys = split.needs_additional_tx_keys();
    if need_additional_tx_keys && destinations.len() != additional_tx_secrets.len() {
        return Err(TxBuilderError::AdditionalKeyCountMismatch(
            additional_tx_secrets.len(),
            destinations.len(),
        ));
    }

    // Outputs: the device derives each stealth key and accumulates the
    // amount keys that later encrypt the RingCT amounts.
    let mut amount_keys: Vec<Scalar> = Vec::with_capacity(destinations.len());
    let mut additional_tx_public_keys: Vec<PublicKey> = Vec::new();
    let mut summary_outs_money: u128 = 0;
    for (output_index, destination) in destinations.iter().enumerate() {
        if destination.amount == 0 && tx.version == 1 {
            return Err(TxBuilderError::ZeroAmountDestination);
        }
        let (out_ephemeral, view_tag) = device.generate_output_ephemeral_keys(
            tx.version,
            sender,
            &tx_public_key,
            tx_secret,
            destination,
            change_addr,
            output_index,
            need_additional_tx_keys,
            additional_tx_secrets,
            &mut additional_tx_public_keys,
            &mut amount_keys,
            options.use_view_tags,
        )?;
        tx.vout
            .push(TxOut::new(destination.amount, out_ephemeral, view_tag));
        summary_outs_money += u128::from(destination.amount);
    }
    if additional_tx_public_keys.len() != additional_tx_secrets.len() {
        return Err(TxBuilderError::AdditionalKeyCountMismatch(
            additional_tx_public_keys.len(),
            additional_tx_secrets.len(),
        ));
    }

    remove_field_from_tx_extra(&mut tx.extra, TX_EXTRA_TAG_ADDITIONAL_PUBKEYS)?;
    if need_additional_tx_keys {
        add_additional_tx_public_keys_to_extra(&mut tx.extra, &additional_tx_public_keys);
    }
    tx.extra = sort_tx_extra(&tx.extra)?;
    check_tx_extra_size(&tx.extra)?;

    if summary_outs_money > summary_inputs_money {
        return Err(TxBuilderError::AmountImbalance(
            summary_inputs_money.try_into().unwrap_or(u64::MAX),
            summary_outs_money.try_into().unwrap_or(u64::MAX),
        ));
    }

    let watch_only = sender.is_watch_only();
    if watch_only {
        log::debug!("null spend secret key, skipping signatures");
    }

    if tx.version == 1 {
        if watch_only {
            // Cold-prep path: rows exist but stay zero-filled.
            tx.allocate_empty_signatures();
        } else {
            let prefix_hash = tx.prefix_hash();
            for (i, source) in sources.iter().enumerate() {
                let ring: Vec<PublicKey> =
                    source.outputs.iter().map(|(_, entry)| entry.dest).collect();
                let TxIn::ToKey { key_image, .. } = &tx.vin[i] else {
                    unreachable!("spend inputs are always to_key");
                };
                let row = generate_ring_signature(
                    &prefix_hash,
                    key_image,
                    &ring,
                    &in_contexts[i].secret,
                    source.real_output,
                    rng,
                )?;
                tx.signatures.push(row);
            }
        }
    } else {
        // Non-simple RingCT assumes one shared real index and a uniform
        // ring size; it only ever applies to single-input Borromean
        // transactions.
        let n_total_outs = sources[0].outputs.len();
        let use_simple_rct =
            sources.len() > 1 || options.rct_config.range_proof_type != RangeProofType::Borromean;
        if !use_simple_rct {
            if sources
                .iter()
                .any(|source| source.real_output != sources[0].real_output)
            {
                return Err(TxBuilderError::NonSimpleRctRealIndexMismatch);
            }
            if sources
                .iter()
                .any(|source| source.outputs.len() != n_total_outs)
            {
                return Err(TxBuilderError::NonSimpleRctRingSizeMismatch);
            }
        }

        let mut in_sk: Vec<CtKey> = sources
            .iter()
            .zip(in_contexts.iter())
            .map(|(source, context)| CtKey {
                dest: *context.secret.as_scalar(),
                mask: source.mask,
            })
            .collect();
        let in_amounts: Vec<u64> = sources.iter().map(|source| source.amount).collect();
        let real_indices: Vec<usize> = sources.iter().map(|source| source.real_output).collect();
        let destination_keys: Vec<PublicKey> =
            tx.vout.iter().map(|out| *out.public_key()).collect();
        let mut out_amounts: Vec<u64> = tx.vout.iter().map(|out| out.amount).collect();

        let amount_in = summary_inputs_money.try_into().unwrap_or(u64::MAX);
        let amount_out: u64 = summary_outs_money.try_into().unwrap_or(u64::MAX);
        let fee = amount_in - amount_out;

        let mix_ring: Vec<Vec<RingEntry>> = if use_simple_rct {
            sources
                .iter()
                .map(|source| source.outputs.iter().map(|(_, entry)| *entry).collect())
                .collect()
        } else {
            // Transposed for the aggregate signature: member n of input i
            // lands at mix_ring[n][i].
            (0..n_total_outs)
                .map(|n| sources.iter().map(|source| source.outputs[n].1).collect())
                .collect()
        };

        if !use_simple_rct && fee > 0 {
            out_amounts.push(fee);
        }

        // Mask the cleartext amounts; the real values live only in the
        // commitments and the encrypted amount keys from here on.
        for (input, source) in tx.vin.iter_mut().zip(sources.iter()) {
            if source.rct {
                if let TxIn::ToKey { amount, .. } = input {
                    *amount = 0;
                }
            }
        }
        for out in tx.vout.iter_mut() {
            out.amount = 0;
        }

        let prefix_hash = tx.prefix_hash();
        let result = if use_simple_rct {
            gen_rct_simple(
                &prefix_hash,
                &in_sk,
                &destination_keys,
                &in_amounts,
                &out_amounts,
                fee,
                &mix_ring,
                &amount_keys,
                &real_indices,
                &options.rct_config,
                range_prover,
                rng,
            )
        } else {
            gen_rct_full(
                &prefix_hash,
                &in_sk,
                &destination_keys,
                &out_amounts,
                &mix_ring,
                &amount_keys,
                sources[0].real_output,
                &options.rct_config,
                range_prover,
                rng,
            )
        };
        in_sk.zeroize();
        let (rct_signatures, out_sk) = result?;

        if out_sk.len() != tx.vout.len() {
            return Err(TxBuilderError::RingCt(
                caracal_transaction_core::ring_ct::RctError::LengthMismatch(
                    out_sk.len(),
                    tx.vout.len(),
                ),
            ));
        }
        // out_sk holds the output commitment openings; dropping it wipes
        // them.
        drop(out_sk);

        tx.rct_signatures = Some(rct_signatures);
    }

    amount_keys.zeroize();
    tx.invalidate_hashes();
    Ok(tx)
}

/// Build a spend transaction inside the device bracket, generating the tx
/// secret and any per-destination additional secrets on the device.
///
/// Returns the transaction together with the tx secret key and the
/// additional secrets, which wallets persist for payment proofs. The
/// device is closed on every exit path, including failures mid-signing.
#[allow(clippy::too_many_arguments)]
pub fn construct_tx_and_get_tx_key<RNG: CryptoRng + RngCore>(
    sender: &AccountKeys,
    subaddresses: &BTreeMap<PublicKey, SubaddressIndex>,
    sources: &mut [TxSourceEntry],
    destinations: &mut Vec<TxDestinationEntry>,
    change_addr: Option<&PublicAddress>,
    extra: &[u8],
    options: &SpendTxOptions,
    device: &mut dyn SigningDevice,
    range_prover: &dyn RangeProofProvider,
    rng: &mut RNG,
) -> Result<(Transaction, SecretKey, Vec<SecretKey>), TxBuilderError> {
    let tx_secret = device.open_tx()?;

    let mut build = || -> Result<(Transaction, Vec<SecretKey>), TxBuilderError> {
        let split = classify_addresses(destinations, change_addr);
        let mut additional_tx_secrets = Vec::new();
        if split.needs_additional_tx_keys() {
            for _ in 0..destinations.len() {
                additional_tx_secrets.push(SecretKey::random(rng));
            }
        }
        let tx = construct_tx_with_tx_key(
            sender,
            subaddresses,
            sources,
            destinations,
            change_addr,
            extra,
            &tx_secret,
            &additional_tx_secrets,
            options,
            device,
            range_prover,
            rng,
        )?;
        Ok((tx, additional_tx_secrets))
    };

    let result = build();
    let close_result = device.close_tx();
    let (tx, additional_tx_secrets) = result?;
    close_result?;
    Ok((tx, tx_secret, additional_tx_secrets))
}

struct NoRangeProofs;

impl RangeProofProvider for NoRangeProofs {
    fn prove(
        &self,
        _amounts: &[u64],
        _blindings: &[Scalar],
        _config: &RctConfig,
    ) -> Result<caracal_transaction_core::ring_ct::RangeProof, caracal_transaction_core::ring_ct::RctError>
    {
        Err(caracal_transaction_core::ring_ct::RctError::RangeProofFailed)
    }
}

/// Build a plain v1 transaction against the sender's standard address:
/// default subaddress map, device-generated tx key, shuffled outputs.
pub fn construct_tx<RNG: CryptoRng + RngCore>(
    sender: &AccountKeys,
    sources: &mut [TxSourceEntry],
    destinations: &[TxDestinationEntry],
    change_addr: Option<&PublicAddress>,
    extra: &[u8],
    unlock_time: u64,
    device: &mut dyn SigningDevice,
    rng: &mut RNG,
) -> Result<Transaction, TxBuilderError> {
    let subaddresses = sender.default_subaddress_map();
    let mut destinations_copy = destinations.to_vec();
    let options = SpendTxOptions {
        unlock_time,
        ..SpendTxOptions::default()
    };
    let (tx, _tx_secret, _additional) = construct_tx_and_get_tx_key(
        sender,
        &subaddresses,
        sources,
        &mut destinations_copy,
        change_addr,
        extra,
        &options,
        device,
        // v1 never reaches the range prover.
        &NoRangeProofs,
        rng,
    )?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn relative_offsets_keep_the_first_absolute() {
        assert_eq!(
            absolute_output_offsets_to_relative(&[4, 7, 15, 16]),
            vec![4, 3, 8, 1]
        );
        assert_eq!(absolute_output_offsets_to_relative(&[9]), vec![9]);
        assert!(absolute_output_offsets_to_relative(&[]).is_empty());
    }

    #[test]
    fn permutation_moves_sources_into_slots() {
        let mut data = vec!['a', 'b', 'c', 'd'];
        apply_permutation(vec![2, 0, 3, 1], |i, j| data.swap(i, j));
        assert_eq!(data, vec!['c', 'a', 'd', 'b']);
    }

    #[test]
    fn permutation_identity_is_a_noop() {
        let mut data = vec![1, 2, 3];
        apply_permutation(vec![0, 1, 2], |i, j| data.swap(i, j));
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn permutation_applies_in_lockstep() {
        let mut left = vec![10, 20, 30];
        let mut right = vec!['x', 'y', 'z'];
        apply_permutation(vec![1, 2, 0], |i, j| {
            left.swap(i, j);
            right.swap(i, j);
        });
        assert_eq!(left, vec![20, 30, 10]);
        assert_eq!(right, vec!['y', 'z', 'x']);
    }
}
