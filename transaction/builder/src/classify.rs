// Copyright (c) 2019-2024 The Caracal Project

//! Destination classification.
//!
//! The split between standard addresses and subaddresses drives two
//! decisions downstream: how the canonical tx public key is computed, and
//! whether per-output additional tx keys are needed.

use crate::entries::TxDestinationEntry;
use alloc::collections::BTreeSet;
use caracal_account_keys::PublicAddress;
use caracal_crypto_keys::PublicKey;

/// The classifier's verdict over a destination list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AddressSplit {
    /// Unique standard addresses among the payees.
    pub num_standard: usize,
    /// Unique subaddresses among the payees.
    pub num_subaddresses: usize,
    /// The last subaddress seen; meaningful when it is the only payee.
    pub single_dest_subaddress: Option<PublicAddress>,
}

impl AddressSplit {
    /// Additional per-output tx keys are needed whenever a subaddress is
    /// paid alongside anything else.
    pub fn needs_additional_tx_keys(&self) -> bool {
        self.num_subaddresses > 0 && (self.num_standard > 0 || self.num_subaddresses > 1)
    }

    /// Whether the single payee is a subaddress, which switches the
    /// canonical tx public key to `tx_secret · D`.
    pub fn is_single_subaddress_destination(&self) -> bool {
        self.num_standard == 0 && self.num_subaddresses == 1
    }
}

/// Partition destinations into standard and subaddress counts.
///
/// Destinations equal to the change address are skipped, and duplicates
/// count once.
pub fn classify_addresses(
    destinations: &[TxDestinationEntry],
    change_addr: Option<&PublicAddress>,
) -> AddressSplit {
    let mut split = AddressSplit::default();
    let mut unique: BTreeSet<&PublicAddress> = BTreeSet::new();
    for destination in destinations {
        if Some(&destination.addr) == change_addr {
            continue;
        }
        if unique.insert(&destination.addr) {
            if destination.addr.is_subaddress() {
                split.num_subaddresses += 1;
                split.single_dest_subaddress = Some(destination.addr.clone());
            } else {
                split.num_standard += 1;
            }
        }
    }
    log::debug!(
        "destinations include {} standard addresses and {} subaddresses",
        split.num_standard,
        split.num_subaddresses
    );
    split
}

/// The unique payee view key, used to encrypt payment ids.
///
/// Zero-amount entries and the change address are skipped; duplicate
/// payees collapse. Returns `None` when more than one payee remains, or
/// when there is none and no change address to fall back to.
pub fn destination_view_key_pub(
    destinations: &[TxDestinationEntry],
    change_addr: Option<&PublicAddress>,
) -> Option<PublicKey> {
    let mut found: Option<&PublicAddress> = None;
    for destination in destinations {
        if destination.amount == 0 {
            continue;
        }
        if Some(&destination.addr) == change_addr {
            continue;
        }
        if Some(&destination.addr) == found {
            continue;
        }
        if found.is_some() {
            return None;
        }
        found = Some(&destination.addr);
    }
    match found {
        Some(addr) => Some(*addr.view_public_key()),
        None => change_addr.map(|change| *change.view_public_key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caracal_account_keys::AccountKeys;
    use caracal_account_keys::SubaddressIndex;
    use rand::{rngs::StdRng, SeedableRng};

    fn accounts(seed: u8) -> (AccountKeys, AccountKeys) {
        let mut rng = StdRng::from_seed([seed; 32]);
        (AccountKeys::random(&mut rng), AccountKeys::random(&mut rng))
    }

    #[test]
    fn counts_unique_standard_and_subaddresses() {
        let (alice, bob) = accounts(71);
        let sub = alice.subaddress(SubaddressIndex::new(0, 1)).unwrap();

        let destinations = [
            TxDestinationEntry::new(1, alice.address().clone()),
            TxDestinationEntry::new(2, alice.address().clone()),
            TxDestinationEntry::new(3, bob.address().clone()),
            TxDestinationEntry::new(4, sub.clone()),
        ];
        let split = classify_addresses(&destinations, None);
        assert_eq!(split.num_standard, 2);
        assert_eq!(split.num_subaddresses, 1);
        assert_eq!(split.single_dest_subaddress, Some(sub));
        assert!(split.needs_additional_tx_keys());
    }

    #[test]
    fn change_address_is_skipped() {
        let (alice, bob) = accounts(72);
        let destinations = [
            TxDestinationEntry::new(1, bob.address().clone()),
            TxDestinationEntry::new(2, alice.address().clone()),
        ];
        let split = classify_addresses(&destinations, Some(alice.address()));
        assert_eq!(split.num_standard, 1);
        assert_eq!(split.num_subaddresses, 0);
        assert!(!split.needs_additional_tx_keys());
    }

    #[test]
    fn single_subaddress_destination_needs_no_additional_keys() {
        let (alice, _) = accounts(73);
        let sub = alice.subaddress(SubaddressIndex::new(1, 1)).unwrap();
        let destinations = [TxDestinationEntry::new(5, sub)];
        let split = classify_addresses(&destinations, None);
        assert!(split.is_single_subaddress_destination());
        assert!(!split.needs_additional_tx_keys());
    }

    #[test]
    fn view_key_collapses_to_the_single_payee() {
        let (alice, bob) = accounts(74);
        let destinations = [
            TxDestinationEntry::new(7, bob.address().clone()),
            TxDestinationEntry::new(3, alice.address().clone()),
        ];
        assert_eq!(
            destination_view_key_pub(&destinations, Some(alice.address())),
            Some(*bob.address().view_public_key())
        );
    }

    #[test]
    fn view_key_is_ambiguous_with_two_payees() {
        let (alice, bob) = accounts(75);
        let destinations = [
            TxDestinationEntry::new(7, bob.address().clone()),
            TxDestinationEntry::new(3, alice.address().clone()),
        ];
        assert_eq!(destination_view_key_pub(&destinations, None), None);
    }

    #[test]
    fn view_key_falls_back_to_change() {
        let (alice, _) = accounts(76);
        assert_eq!(
            destination_view_key_pub(&[], Some(alice.address())),
            Some(*alice.address().view_public_key())
        );
        assert_eq!(destination_view_key_pub(&[], None), None);
    }

    #[test]
    fn zero_amount_destinations_are_ignored() {
        let (alice, bob) = accounts(77);
        let destinations = [
            TxDestinationEntry::new(0, alice.address().clone()),
            TxDestinationEntry::new(1, bob.address().clone()),
        ];
        assert_eq!(
            destination_view_key_pub(&destinations, None),
            Some(*bob.address().view_public_key())
        );
    }
}
