//! Per-bank bookkeeping for the probing pass
//!
//! The controller addresses banks through a small lookup table. Before
//! probing it is the identity mapping and supplies the chip-enable bit for
//! each physical bank. As banks match, their physical index is appended to
//! the front of the table, so afterwards the first `valid_count` entries
//! list the populated banks in discovery order.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MAX_BANKS;

/// State of one physical bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BankSlot {
    /// Physical bank index
    pub index: u8,
    /// Position among the valid banks, if this bank matched
    pub logical: Option<u8>,
}

impl BankSlot {
    /// Check if the bank carries a supported device
    pub fn is_valid(&self) -> bool {
        self.logical.is_some()
    }
}

/// Bank table for one bring-up pass
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BankTable {
    slots: Vec<BankSlot, MAX_BANKS>,
    map: Vec<u8, MAX_BANKS>,
    valid_count: u8,
}

impl BankTable {
    /// Create an identity table for `bank_count` banks
    ///
    /// `bank_count` is clamped to [`MAX_BANKS`].
    pub fn identity(bank_count: usize) -> Self {
        let mut slots = Vec::new();
        let mut map = Vec::new();
        for bank in 0..bank_count.min(MAX_BANKS) as u8 {
            // Capacity is MAX_BANKS and the range is clamped to it
            let _ = slots.push(BankSlot {
                index: bank,
                logical: None,
            });
            let _ = map.push(bank);
        }
        Self {
            slots,
            map,
            valid_count: 0,
        }
    }

    /// Number of physical banks
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the table has no banks
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Chip-enable index for a physical bank
    pub fn chip_enable(&self, bank: u8) -> u8 {
        self.map.get(bank as usize).copied().unwrap_or(bank)
    }

    /// Record that `bank` matched the catalog
    ///
    /// Banks must be recorded in probe order. Recording the same bank twice
    /// or an index outside the table is ignored.
    pub fn record_valid(&mut self, bank: u8) {
        let position = self.valid_count;
        let Some(slot) = self.slots.get_mut(bank as usize) else {
            return;
        };
        if slot.logical.is_some() {
            return;
        }
        let Some(entry) = self.map.get_mut(position as usize) else {
            return;
        };
        slot.logical = Some(position);
        *entry = bank;
        self.valid_count += 1;
    }

    /// Number of banks that matched
    pub fn valid_count(&self) -> u8 {
        self.valid_count
    }

    /// Physical indices of the valid banks in discovery order
    pub fn valid_banks(&self) -> &[u8] {
        self.map.get(..self.valid_count as usize).unwrap_or(&[])
    }

    /// Check that the table could have come out of a probing pass
    ///
    /// Slots and map cover the same banks, every valid slot sits at its
    /// logical position in the map, and no other slot claims a position.
    pub fn is_consistent(&self) -> bool {
        let len = self.slots.len();
        let valid = self.valid_count as usize;
        if self.map.len() != len || valid > len {
            return false;
        }
        if self.map.iter().any(|&bank| bank as usize >= len) {
            return false;
        }

        let mut claimed = 0usize;
        for (position, slot) in self.slots.iter().enumerate() {
            if slot.index as usize != position {
                return false;
            }
            if let Some(logical) = slot.logical {
                if logical as usize >= valid || self.map[logical as usize] != slot.index {
                    return false;
                }
                claimed += 1;
            }
        }
        claimed == valid
    }

    /// All bank slots in physical order
    pub fn slots(&self) -> &[BankSlot] {
        &self.slots
    }
}
