// Copyright (c) 2019-2024 The Caracal Project

//! MLSAG (Multilayered Linkable Spontaneous Anonymous Group) signatures.
//!
//! An MLSAG signs a matrix of keys: one column per ring member, one row per
//! key the signer must know for the real column. The first `ds_rows` rows
//! are linkable and carry key images; the remaining rows (commitment
//! balance rows) do not.
//!
//! The RingCT bundle uses two shapes:
//! * simple: 2 rows (`output key`, `commitment − pseudo-out`), 1 linkable;
//! * full: `m + 1` rows for `m` inputs, `m` linkable, plus the balance row.

use crate::{Error, KeyImage};
use alloc::{vec, vec::Vec};
use caracal_crypto_keys::{hash_to_point, hash_to_scalar};
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar, traits::VartimeMultiscalarMul};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// An MLSAG signature over a key matrix.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RingMlsag {
    /// Responses, indexed `[column][row]`.
    pub ss: Vec<Vec<Scalar>>,
    /// The challenge entering column zero.
    pub cc: Scalar,
    /// Key images for the linkable rows.
    pub key_images: Vec<KeyImage>,
}

fn round_hash(
    message: &[u8],
    matrix: &[Vec<EdwardsPoint>],
    column: usize,
    responses: &[Scalar],
    challenge: Scalar,
    ds_rows: usize,
    key_images: &[EdwardsPoint],
) -> Scalar {
    let rows = responses.len();
    let mut buf = Vec::with_capacity(message.len() + rows * 96);
    buf.extend_from_slice(message);
    for j in 0..rows {
        let P = matrix[column][j];
        let L = EdwardsPoint::mul_base(&responses[j]) + challenge * P;
        buf.extend_from_slice(P.compress().as_bytes());
        buf.extend_from_slice(L.compress().as_bytes());
        if j < ds_rows {
            let Hp = hash_to_point(P.compress().as_bytes());
            let R = EdwardsPoint::vartime_multiscalar_mul(
                [responses[j], challenge],
                [Hp, key_images[j]],
            );
            buf.extend_from_slice(R.compress().as_bytes());
        }
    }
    hash_to_scalar(&buf)
}

/// Sign `message` over the key matrix with the secrets opening column
/// `real_index`.
///
/// # Arguments
/// * `message` - Message to be signed.
/// * `matrix` - Key matrix, indexed `[column][row]`; all columns must have
///   `secrets.len()` rows.
/// * `secrets` - One secret scalar per row, opening the real column.
/// * `real_index` - The column the secrets open.
/// * `ds_rows` - Number of leading linkable rows.
/// * `rng` - Cryptographic RNG.
pub fn mlsag_sign<RNG: CryptoRng + RngCore>(
    message: &[u8],
    matrix: &[Vec<EdwardsPoint>],
    secrets: &[Scalar],
    real_index: usize,
    ds_rows: usize,
    rng: &mut RNG,
) -> Result<RingMlsag, Error> {
    let cols = matrix.len();
    let rows = secrets.len();

    if cols == 0 || real_index >= cols {
        return Err(Error::IndexOutOfBounds);
    }
    if rows == 0 || ds_rows > rows {
        return Err(Error::IndexOutOfBounds);
    }
    for column in matrix {
        if column.len() != rows {
            return Err(Error::LengthMismatch(column.len(), rows));
        }
    }

    // Key images for the linkable rows, and their decompressed forms for
    // the ring walk.
    let mut key_images = Vec::with_capacity(ds_rows);
    let mut image_points = Vec::with_capacity(ds_rows);
    for j in 0..ds_rows {
        let Hp = hash_to_point(matrix[real_index][j].compress().as_bytes());
        let point = secrets[j] * Hp;
        key_images.push(KeyImage {
            point: point.compress(),
        });
        image_points.push(point);
    }

    // Nonces for the real column; wiped when signing completes.
    let alphas: Vec<Zeroizing<Scalar>> = (0..rows)
        .map(|_| Zeroizing::new(Scalar::random(rng)))
        .collect();

    let mut ss: Vec<Vec<Scalar>> = (0..cols)
        .map(|i| {
            (0..rows)
                .map(|_| {
                    if i == real_index {
                        Scalar::ZERO
                    } else {
                        Scalar::random(rng)
                    }
                })
                .collect()
        })
        .collect();

    // Initial challenge from the real column's nonce points.
    let mut buf = Vec::with_capacity(message.len() + rows * 96);
    buf.extend_from_slice(message);
    for j in 0..rows {
        let P = matrix[real_index][j];
        let L = EdwardsPoint::mul_base(&alphas[j]);
        buf.extend_from_slice(P.compress().as_bytes());
        buf.extend_from_slice(L.compress().as_bytes());
        if j < ds_rows {
            let Hp = hash_to_point(P.compress().as_bytes());
            let R = *alphas[j] * Hp;
            buf.extend_from_slice(R.compress().as_bytes());
        }
    }

    let mut challenges = vec![Scalar::ZERO; cols];
    let mut challenge = hash_to_scalar(&buf);
    challenges[(real_index + 1) % cols] = challenge;

    // Walk the ring from real_index + 1 back around to real_index.
    for n in 1..cols {
        let i = (real_index + n) % cols;
        challenge = round_hash(
            message,
            matrix,
            i,
            &ss[i],
            challenge,
            ds_rows,
            &image_points,
        );
        challenges[(i + 1) % cols] = challenge;
    }

    // Close the loop at the real column.
    let c_real = challenges[real_index];
    for j in 0..rows {
        ss[real_index][j] = *alphas[j] - c_real * secrets[j];
    }

    Ok(RingMlsag {
        ss,
        cc: challenges[0],
        key_images,
    })
}

/// Verify an MLSAG signature over the key matrix.
pub fn mlsag_verify(
    message: &[u8],
    matrix: &[Vec<EdwardsPoint>],
    signature: &RingMlsag,
    ds_rows: usize,
) -> Result<(), Error> {
    let cols = matrix.len();
    if cols == 0 {
        return Err(Error::IndexOutOfBounds);
    }
    if signature.ss.len() != cols {
        return Err(Error::LengthMismatch(signature.ss.len(), cols));
    }
    let rows = matrix[0].len();
    if signature.key_images.len() != ds_rows || ds_rows > rows {
        return Err(Error::LengthMismatch(signature.key_images.len(), ds_rows));
    }
    for column in matrix {
        if column.len() != rows {
            return Err(Error::LengthMismatch(column.len(), rows));
        }
    }

    let mut image_points = Vec::with_capacity(ds_rows);
    for image in &signature.key_images {
        image_points.push(image.point.decompress().ok_or(Error::InvalidKeyImage)?);
    }

    let mut challenge = signature.cc;
    for i in 0..cols {
        if signature.ss[i].len() != rows {
            return Err(Error::LengthMismatch(signature.ss[i].len(), rows));
        }
        challenge = round_hash(
            message,
            matrix,
            i,
            &signature.ss[i],
            challenge,
            ds_rows,
            &image_points,
        );
    }

    if challenge == signature.cc {
        Ok(())
    } else {
        Err(Error::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caracal_crypto_keys::SecretKey;
    use rand::{rngs::StdRng, SeedableRng};

    fn make_matrix(
        rng: &mut StdRng,
        cols: usize,
        rows: usize,
        real_index: usize,
    ) -> (Vec<Vec<EdwardsPoint>>, Vec<Scalar>) {
        let secrets: Vec<Scalar> = (0..rows).map(|_| Scalar::random(rng)).collect();
        let mut matrix: Vec<Vec<EdwardsPoint>> = (0..cols)
            .map(|_| {
                (0..rows)
                    .map(|_| SecretKey::random(rng).public_key().decompress().unwrap())
                    .collect()
            })
            .collect();
        matrix[real_index] = secrets.iter().map(EdwardsPoint::mul_base).collect();
        (matrix, secrets)
    }

    #[test]
    fn sign_and_verify_simple_shape() {
        let mut rng = StdRng::from_seed([41u8; 32]);
        let (matrix, secrets) = make_matrix(&mut rng, 11, 2, 3);

        let signature = mlsag_sign(b"message", &matrix, &secrets, 3, 1, &mut rng).unwrap();
        assert_eq!(signature.key_images.len(), 1);
        mlsag_verify(b"message", &matrix, &signature, 1).unwrap();
    }

    #[test]
    fn sign_and_verify_full_shape() {
        let mut rng = StdRng::from_seed([42u8; 32]);
        // 3 inputs + balance row, all input rows linkable.
        let (matrix, secrets) = make_matrix(&mut rng, 7, 4, 0);

        let signature = mlsag_sign(b"message", &matrix, &secrets, 0, 3, &mut rng).unwrap();
        assert_eq!(signature.key_images.len(), 3);
        mlsag_verify(b"message", &matrix, &signature, 3).unwrap();
    }

    #[test]
    fn rejects_tampered_message() {
        let mut rng = StdRng::from_seed([43u8; 32]);
        let (matrix, secrets) = make_matrix(&mut rng, 5, 2, 1);

        let signature = mlsag_sign(b"message", &matrix, &secrets, 1, 1, &mut rng).unwrap();
        assert_eq!(
            mlsag_verify(b"other", &matrix, &signature, 1),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn rejects_ragged_matrix() {
        let mut rng = StdRng::from_seed([44u8; 32]);
        let (mut matrix, secrets) = make_matrix(&mut rng, 5, 2, 1);
        matrix[4].pop();

        assert!(matches!(
            mlsag_sign(b"message", &matrix, &secrets, 1, 1, &mut rng),
            Err(Error::LengthMismatch(1, 2))
        ));
    }
}
