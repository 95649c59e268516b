// Copyright (c) 2019-2024 The Caracal Project

//! Decomposition of amounts into denomination chunks.
//!
//! Coinbase rewards are split into one chunk per nonzero decimal digit so
//! outputs land on round denominations (`1234 → 4, 30, 200, 1000`). Chunks
//! below the dust threshold are reported separately so callers can decide
//! what to do with them.

use alloc::vec::Vec;
use core::cell::RefCell;

/// Split `amount` into per-decimal-digit chunks, feeding chunks at or above
/// `dust_threshold` to `chunk_handler` and the rest to `dust_handler`.
///
/// Chunks are produced from the least significant digit upwards; zero
/// digits produce nothing.
pub fn decompose_amount_into_digits<C, D>(
    amount: u64,
    dust_threshold: u64,
    mut chunk_handler: C,
    mut dust_handler: D,
) where
    C: FnMut(u64),
    D: FnMut(u64),
{
    let mut remaining = amount;
    let mut order: u64 = 1;
    while remaining > 0 {
        let chunk = (remaining % 10) * order;
        remaining /= 10;
        order *= 10;
        if chunk > 0 {
            if chunk < dust_threshold {
                dust_handler(chunk);
            } else {
                chunk_handler(chunk);
            }
        }
    }
}

/// Convenience form collecting every chunk, dust included, in emission
/// order.
pub fn decompose_amount(amount: u64, dust_threshold: u64) -> Vec<u64> {
    let chunks = RefCell::new(Vec::new());
    decompose_amount_into_digits(
        amount,
        dust_threshold,
        |chunk| chunks.borrow_mut().push(chunk),
        |dust| chunks.borrow_mut().push(dust),
    );
    chunks.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn zero_yields_no_chunks() {
        assert!(decompose_amount(0, 0).is_empty());
    }

    #[test]
    fn one_yields_one_chunk() {
        assert_eq!(decompose_amount(1, 0), vec![1]);
    }

    #[test]
    fn powers_of_ten_yield_one_chunk() {
        assert_eq!(decompose_amount(1_000, 0), vec![1_000]);
        assert_eq!(decompose_amount(10_000_000_000, 0), vec![10_000_000_000]);
    }

    #[test]
    fn digits_become_chunks_least_significant_first() {
        assert_eq!(decompose_amount(1234, 0), vec![4, 30, 200, 1000]);
    }

    #[test]
    fn zero_digits_are_skipped() {
        assert_eq!(decompose_amount(1_002_030, 0), vec![30, 2_000, 1_000_000]);
    }

    #[test]
    fn chunks_sum_to_the_amount() {
        let amount = 987_654_321u64;
        let total: u64 = decompose_amount(amount, 0).iter().sum();
        assert_eq!(total, amount);
    }

    #[test]
    fn dust_threshold_routes_small_chunks() {
        let mut chunks = Vec::new();
        let mut dust = Vec::new();
        decompose_amount_into_digits(1234, 100, |c| chunks.push(c), |d| dust.push(d));
        assert_eq!(dust, vec![4, 30]);
        assert_eq!(chunks, vec![200, 1000]);
    }
}
