// Copyright (c) 2019-2024 The Caracal Project

//! RingCT signing.
//!
//! Two shapes, selected by the builder:
//! * [`gen_rct_simple`] — per-input pseudo-output commitments whose masks
//!   sum to the output masks, one 2-row MLSAG per input. Supports
//!   heterogeneous rings.
//! * [`gen_rct_full`] — a single aggregate MLSAG over transposed rings with
//!   a commitment balance row. Requires every input at the same ring index
//!   and uniform ring size; only used with Borromean range proofs.

use super::{
    CtKey, EcdhInfo, OutputSecret, RangeProof, RangeProofProvider, RctConfig, RctError,
    RctSignatures, RctType, RingEntry,
};
use alloc::{vec, vec::Vec};
use caracal_crypto_keys::{keccak256, PublicKey};
use caracal_crypto_ring_signature::{
    generator_h, mlsag_sign, onetime_keys::{commitment_mask, encrypt_amount}, Commitment,
    CompressedCommitment, RingMlsag, Scalar,
};
use curve25519_dalek::edwards::EdwardsPoint;
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

/// The message MLSAGs sign: the prefix hash bound to every public element
/// of the bundle, so none of them can be swapped after signing.
fn signing_digest(
    message: &[u8; 32],
    rct_type: RctType,
    fee: u64,
    pseudo_outs: &[CompressedCommitment],
    ecdh_info: &[EcdhInfo],
    out_pk: &[CompressedCommitment],
    range_proof: &RangeProof,
) -> [u8; 32] {
    let mut buf = Vec::with_capacity(
        32 + 1 + 8 + pseudo_outs.len() * 32 + ecdh_info.len() * 8 + out_pk.len() * 32 + 32,
    );
    buf.extend_from_slice(message);
    buf.push(rct_type as u8);
    buf.extend_from_slice(&fee.to_le_bytes());
    for pseudo in pseudo_outs {
        buf.extend_from_slice(pseudo.as_bytes());
    }
    for ecdh in ecdh_info {
        buf.extend_from_slice(&ecdh.amount);
    }
    for out in out_pk {
        buf.extend_from_slice(out.as_bytes());
    }
    buf.extend_from_slice(&keccak256(&range_proof.0));
    keccak256(&buf)
}

struct OutputCommitments {
    masks: Vec<Scalar>,
    out_pk: Vec<CompressedCommitment>,
    ecdh_info: Vec<EcdhInfo>,
}

fn build_output_commitments(out_amounts: &[u64], amount_keys: &[Scalar]) -> OutputCommitments {
    let mut masks = Vec::with_capacity(out_amounts.len());
    let mut out_pk = Vec::with_capacity(out_amounts.len());
    let mut ecdh_info = Vec::with_capacity(out_amounts.len());
    for (amount, amount_key) in out_amounts.iter().zip(amount_keys.iter()) {
        let mask = commitment_mask(amount_key);
        out_pk.push(Commitment::new(*amount, mask).compress());
        ecdh_info.push(EcdhInfo {
            amount: encrypt_amount(*amount, amount_key),
        });
        masks.push(mask);
    }
    OutputCommitments {
        masks,
        out_pk,
        ecdh_info,
    }
}

fn checked_sum(amounts: &[u64]) -> Result<u64, RctError> {
    amounts
        .iter()
        .try_fold(0u64, |acc, &amount| acc.checked_add(amount))
        .ok_or(RctError::ValueNotConserved)
}

/// Produce a simple-type bundle: one MLSAG per input.
///
/// # Arguments
/// * `message` - The (amount-masked) transaction prefix hash.
/// * `in_sk` - Per-input one-time secrets and commitment masks.
/// * `destinations` - One-time output keys, parallel to `out_amounts`.
/// * `in_amounts` / `out_amounts` - Cleartext values; `fee` must make them
///   balance exactly.
/// * `mix_ring` - `mix_ring[i][n]` is ring member `n` of input `i`.
/// * `amount_keys` - Per-output shared-secret scalars.
/// * `real_indices` - The real member's position in each ring.
#[allow(clippy::too_many_arguments)]
pub fn gen_rct_simple<RNG: CryptoRng + RngCore>(
    message: &[u8; 32],
    in_sk: &[CtKey],
    destinations: &[PublicKey],
    in_amounts: &[u64],
    out_amounts: &[u64],
    fee: u64,
    mix_ring: &[Vec<RingEntry>],
    amount_keys: &[Scalar],
    real_indices: &[usize],
    config: &RctConfig,
    range_prover: &dyn RangeProofProvider,
    rng: &mut RNG,
) -> Result<(RctSignatures, Vec<OutputSecret>), RctError> {
    let inputs = in_sk.len();
    if inputs == 0 {
        return Err(RctError::LengthMismatch(0, 1));
    }
    if in_amounts.len() != inputs {
        return Err(RctError::LengthMismatch(in_amounts.len(), inputs));
    }
    if mix_ring.len() != inputs {
        return Err(RctError::LengthMismatch(mix_ring.len(), inputs));
    }
    if real_indices.len() != inputs {
        return Err(RctError::LengthMismatch(real_indices.len(), inputs));
    }
    let outputs = destinations.len();
    if out_amounts.len() != outputs {
        return Err(RctError::LengthMismatch(out_amounts.len(), outputs));
    }
    if amount_keys.len() != outputs {
        return Err(RctError::LengthMismatch(amount_keys.len(), outputs));
    }

    let total_in = checked_sum(in_amounts)?;
    let total_out = checked_sum(out_amounts)?
        .checked_add(fee)
        .ok_or(RctError::ValueNotConserved)?;
    if total_in != total_out {
        return Err(RctError::ValueNotConserved);
    }

    let out = build_output_commitments(out_amounts, amount_keys);

    // Pseudo-output masks: all but the last are random, the last closes the
    // sum so that Σ pseudo masks == Σ output masks.
    let sum_out_masks: Scalar = out.masks.iter().sum();
    let mut pseudo_masks: Vec<Scalar> = (0..inputs - 1).map(|_| Scalar::random(rng)).collect();
    let partial_sum: Scalar = pseudo_masks.iter().sum();
    pseudo_masks.push(sum_out_masks - partial_sum);

    let pseudo_commitments: Vec<Commitment> = in_amounts
        .iter()
        .zip(pseudo_masks.iter())
        .map(|(&amount, &mask)| Commitment::new(amount, mask))
        .collect();
    let pseudo_outs: Vec<CompressedCommitment> =
        pseudo_commitments.iter().map(Commitment::compress).collect();

    let range_proof = range_prover.prove(out_amounts, &out.masks, config)?;

    let digest = signing_digest(
        message,
        RctType::Simple,
        fee,
        &pseudo_outs,
        &out.ecdh_info,
        &out.out_pk,
        &range_proof,
    );

    let mut mlsags: Vec<RingMlsag> = Vec::with_capacity(inputs);
    for i in 0..inputs {
        let ring = &mix_ring[i];
        let real_index = real_indices[i];
        if real_index >= ring.len() {
            return Err(RctError::IndexOutOfBounds);
        }
        // The claimed mask and amount must open the real member's
        // commitment, or the signature cannot balance.
        if ring[real_index].commitment != Commitment::new(in_amounts[i], in_sk[i].mask).compress()
        {
            return Err(RctError::ValueNotConserved);
        }

        let mut matrix = Vec::with_capacity(ring.len());
        for entry in ring {
            let dest = entry
                .dest
                .decompress()
                .map_err(|_| RctError::InvalidCurvePoint)?;
            let commitment = entry.commitment.decompress()?.point;
            matrix.push(vec![dest, commitment - pseudo_commitments[i].point]);
        }

        let secrets = Zeroizing::new(vec![in_sk[i].dest, in_sk[i].mask - pseudo_masks[i]]);
        mlsags.push(mlsag_sign(&digest, &matrix, &secrets, real_index, 1, rng)?);
    }
    pseudo_masks.zeroize();

    let out_sk = out
        .masks
        .into_iter()
        .map(|mask| OutputSecret { mask })
        .collect();

    Ok((
        RctSignatures {
            rct_type: RctType::Simple,
            fee,
            pseudo_outs,
            ecdh_info: out.ecdh_info,
            out_pk: out.out_pk,
            range_proof,
            mlsags,
        },
        out_sk,
    ))
}

/// Produce a full-type bundle: one aggregate MLSAG over transposed rings.
///
/// `mix_ring[n][i]` is ring member `n` of input `i` (every input shares the
/// same real index `real_index`). Entries of `out_amounts` beyond
/// `destinations.len()` accumulate into the fee.
#[allow(clippy::too_many_arguments)]
pub fn gen_rct_full<RNG: CryptoRng + RngCore>(
    message: &[u8; 32],
    in_sk: &[CtKey],
    destinations: &[PublicKey],
    out_amounts: &[u64],
    mix_ring: &[Vec<RingEntry>],
    amount_keys: &[Scalar],
    real_index: usize,
    config: &RctConfig,
    range_prover: &dyn RangeProofProvider,
    rng: &mut RNG,
) -> Result<(RctSignatures, Vec<OutputSecret>), RctError> {
    let inputs = in_sk.len();
    if inputs == 0 {
        return Err(RctError::LengthMismatch(0, 1));
    }
    let outputs = destinations.len();
    if out_amounts.len() < outputs {
        return Err(RctError::LengthMismatch(out_amounts.len(), outputs));
    }
    if amount_keys.len() != outputs {
        return Err(RctError::LengthMismatch(amount_keys.len(), outputs));
    }
    let ring_size = mix_ring.len();
    if ring_size == 0 || real_index >= ring_size {
        return Err(RctError::IndexOutOfBounds);
    }
    for column in mix_ring {
        if column.len() != inputs {
            return Err(RctError::LengthMismatch(column.len(), inputs));
        }
    }

    let fee = checked_sum(&out_amounts[outputs..])?;
    let out = build_output_commitments(&out_amounts[..outputs], &amount_keys[..outputs]);

    let range_proof = range_prover.prove(&out_amounts[..outputs], &out.masks, config)?;

    let digest = signing_digest(
        message,
        RctType::Full,
        fee,
        &[],
        &out.ecdh_info,
        &out.out_pk,
        &range_proof,
    );

    // Balance point subtracted from each column's commitment sum.
    let mut outflow = Scalar::from(fee) * generator_h();
    for compressed in &out.out_pk {
        outflow += compressed.decompress()?.point;
    }

    let mut matrix = Vec::with_capacity(ring_size);
    for column in mix_ring {
        let mut rows = Vec::with_capacity(inputs + 1);
        let mut commitment_sum = EdwardsPoint::default();
        for entry in column {
            rows.push(
                entry
                    .dest
                    .decompress()
                    .map_err(|_| RctError::InvalidCurvePoint)?,
            );
            commitment_sum += entry.commitment.decompress()?.point;
        }
        rows.push(commitment_sum - outflow);
        matrix.push(rows);
    }

    // Secrets: one-time keys, then the aggregate mask difference closing
    // the balance row.
    let sum_out_masks: Scalar = out.masks.iter().sum();
    let sum_in_masks: Scalar = in_sk.iter().map(|ctkey| ctkey.mask).sum();
    let balance_secret = sum_in_masks - sum_out_masks;

    let mut secrets = Zeroizing::new(Vec::with_capacity(inputs + 1));
    for ctkey in in_sk {
        secrets.push(ctkey.dest);
    }
    secrets.push(balance_secret);

    // The balance row of the real column must be opened by the aggregate
    // mask difference, or the amounts do not balance.
    if matrix[real_index][inputs] != EdwardsPoint::mul_base(&balance_secret) {
        return Err(RctError::ValueNotConserved);
    }

    let mlsag = mlsag_sign(&digest, &matrix, &secrets, real_index, inputs, rng)?;

    let out_sk = out
        .masks
        .into_iter()
        .map(|mask| OutputSecret { mask })
        .collect();

    Ok((
        RctSignatures {
            rct_type: RctType::Full,
            fee,
            pseudo_outs: Vec::new(),
            ecdh_info: out.ecdh_info,
            out_pk: out.out_pk,
            range_proof,
            mlsags: vec![mlsag],
        },
        out_sk,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use caracal_crypto_ring_signature::{mlsag_verify, onetime_keys::decrypt_amount};
    use caracal_crypto_keys::SecretKey;
    use rand::{rngs::StdRng, SeedableRng};

    struct MockProver;

    impl RangeProofProvider for MockProver {
        fn prove(
            &self,
            amounts: &[u64],
            blindings: &[Scalar],
            _config: &RctConfig,
        ) -> Result<RangeProof, RctError> {
            if amounts.len() != blindings.len() {
                return Err(RctError::RangeProofFailed);
            }
            // Deterministic stand-in blob, sized like one proof per output.
            Ok(RangeProof(vec![0xaa; 32 + amounts.len()]))
        }
    }

    const CONFIG: RctConfig = RctConfig {
        range_proof_type: RangeProofType::Bulletproof,
        bp_version: 1,
    };
    use super::super::RangeProofType;

    struct TestInput {
        ring: Vec<RingEntry>,
        secret: CtKey,
        real_index: usize,
    }

    fn make_input(rng: &mut StdRng, amount: u64, ring_size: usize, real_index: usize) -> TestInput {
        let onetime = SecretKey::random(rng);
        let mask = Scalar::random(rng);
        let mut ring: Vec<RingEntry> = (0..ring_size)
            .map(|_| RingEntry {
                dest: SecretKey::random(rng).public_key(),
                commitment: Commitment::new(999, Scalar::random(rng)).compress(),
            })
            .collect();
        ring[real_index] = RingEntry {
            dest: onetime.public_key(),
            commitment: Commitment::new(amount, mask).compress(),
        };
        TestInput {
            ring,
            secret: CtKey {
                dest: *onetime.as_scalar(),
                mask,
            },
            real_index,
        }
    }

    #[test]
    fn simple_bundle_signs_and_balances() {
        let mut rng = StdRng::from_seed([51u8; 32]);
        let a = make_input(&mut rng, 5, 11, 2);
        let b = make_input(&mut rng, 7, 11, 9);

        let amount_keys = [Scalar::random(&mut rng)];
        let destination = SecretKey::random(&mut rng).public_key();

        let (bundle, out_sk) = gen_rct_simple(
            &[3u8; 32],
            &[a.secret.clone(), b.secret.clone()],
            &[destination],
            &[5, 7],
            &[10],
            2,
            &[a.ring.clone(), b.ring.clone()],
            &amount_keys,
            &[a.real_index, b.real_index],
            &CONFIG,
            &MockProver,
            &mut rng,
        )
        .unwrap();

        assert_eq!(bundle.rct_type, RctType::Simple);
        assert_eq!(bundle.fee, 2);
        assert_eq!(bundle.mlsags.len(), 2);
        assert_eq!(out_sk.len(), 1);

        // Commitments balance: Σ pseudo == Σ out + fee·H.
        let pseudo_sum = bundle
            .pseudo_outs
            .iter()
            .fold(EdwardsPoint::default(), |acc, c| {
                acc + c.decompress().unwrap().point
            });
        let out_sum = bundle.out_pk.iter().fold(
            Scalar::from(bundle.fee) * generator_h(),
            |acc, c| acc + c.decompress().unwrap().point,
        );
        assert_eq!(pseudo_sum, out_sum);

        // The amount round-trips through the ECDH info.
        assert_eq!(decrypt_amount(&bundle.ecdh_info[0].amount, &amount_keys[0]), 10);
    }

    #[test]
    fn simple_mlsags_verify() {
        let mut rng = StdRng::from_seed([52u8; 32]);
        let input = make_input(&mut rng, 12, 5, 0);
        let amount_keys = [Scalar::random(&mut rng)];
        let destination = SecretKey::random(&mut rng).public_key();

        let (bundle, _) = gen_rct_simple(
            &[4u8; 32],
            &[input.secret.clone()],
            &[destination],
            &[12],
            &[11],
            1,
            &[input.ring.clone()],
            &amount_keys,
            &[input.real_index],
            &CONFIG,
            &MockProver,
            &mut rng,
        )
        .unwrap();

        let digest = signing_digest(
            &[4u8; 32],
            RctType::Simple,
            bundle.fee,
            &bundle.pseudo_outs,
            &bundle.ecdh_info,
            &bundle.out_pk,
            &bundle.range_proof,
        );
        let pseudo = bundle.pseudo_outs[0].decompress().unwrap().point;
        let matrix: Vec<Vec<EdwardsPoint>> = input
            .ring
            .iter()
            .map(|entry| {
                vec![
                    entry.dest.decompress().unwrap(),
                    entry.commitment.decompress().unwrap().point - pseudo,
                ]
            })
            .collect();
        mlsag_verify(&digest, &matrix, &bundle.mlsags[0], 1).unwrap();
    }

    #[test]
    fn simple_rejects_imbalance() {
        let mut rng = StdRng::from_seed([53u8; 32]);
        let input = make_input(&mut rng, 10, 3, 1);
        let amount_keys = [Scalar::random(&mut rng)];
        let destination = SecretKey::random(&mut rng).public_key();

        let result = gen_rct_simple(
            &[5u8; 32],
            &[input.secret.clone()],
            &[destination],
            &[10],
            &[9],
            2, // 9 + 2 != 10
            &[input.ring.clone()],
            &amount_keys,
            &[input.real_index],
            &CONFIG,
            &MockProver,
            &mut rng,
        );
        assert_eq!(result.err(), Some(RctError::ValueNotConserved));
    }

    #[test]
    fn full_bundle_signs_with_transposed_ring() {
        let mut rng = StdRng::from_seed([54u8; 32]);
        let ring_size = 4;
        let real_index = 2;
        let a = make_input(&mut rng, 6, ring_size, real_index);
        let b = make_input(&mut rng, 5, ring_size, real_index);

        // Transpose: mix_ring[n][i] = member n of input i.
        let mix_ring: Vec<Vec<RingEntry>> = (0..ring_size)
            .map(|n| vec![a.ring[n], b.ring[n]])
            .collect();

        let amount_keys = [Scalar::random(&mut rng)];
        let destination = SecretKey::random(&mut rng).public_key();

        // One destination of 10, fee 1 appended as a bare amount.
        let (bundle, out_sk) = gen_rct_full(
            &[6u8; 32],
            &[a.secret.clone(), b.secret.clone()],
            &[destination],
            &[10, 1],
            &mix_ring,
            &amount_keys,
            real_index,
            &RctConfig {
                range_proof_type: RangeProofType::Borromean,
                bp_version: 0,
            },
            &MockProver,
            &mut rng,
        )
        .unwrap();

        assert_eq!(bundle.rct_type, RctType::Full);
        assert_eq!(bundle.fee, 1);
        assert!(bundle.pseudo_outs.is_empty());
        assert_eq!(bundle.mlsags.len(), 1);
        assert_eq!(bundle.mlsags[0].key_images.len(), 2);
        assert_eq!(out_sk.len(), 1);
    }

    #[test]
    fn full_rejects_imbalance() {
        let mut rng = StdRng::from_seed([55u8; 32]);
        let input = make_input(&mut rng, 10, 3, 0);
        let mix_ring: Vec<Vec<RingEntry>> =
            input.ring.iter().map(|entry| vec![*entry]).collect();
        let amount_keys = [Scalar::random(&mut rng)];
        let destination = SecretKey::random(&mut rng).public_key();

        let result = gen_rct_full(
            &[7u8; 32],
            &[input.secret.clone()],
            &[destination],
            &[8, 1], // 8 + 1 != 10
            &mix_ring,
            &amount_keys,
            0,
            &RctConfig {
                range_proof_type: RangeProofType::Borromean,
                bp_version: 0,
            },
            &MockProver,
            &mut rng,
        );
        assert_eq!(result.err(), Some(RctError::ValueNotConserved));
    }
}
