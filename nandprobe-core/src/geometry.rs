//! Flash geometry derivation
//!
//! Every count here is derived from the matched descriptor and the number
//! of banks that carry it. Sub-blocks stripe one erase block across all
//! valid banks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::DeviceDescriptor;

/// Bytes per sector
pub const SECTOR_SIZE: usize = 512;

/// Sub-blocks kept back from the translation layer reserve
const FTL_RESERVE_OVERHEAD: u16 = 28;

/// Derived flash layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Geometry {
    pub banks_total: u32,
    pub blocks_per_bank: u32,
    pub pages_per_block: u32,
    pub sectors_per_page: u32,
    pub bytes_per_spare: u32,
    pub user_sub_blocks_total: u32,
    pub pages_per_bank: u32,
    pub pages_total: u32,
    pub pages_per_sub_block: u32,
    pub user_pages_total: u32,
    pub sub_blocks_total: u32,
    /// Read/ECC working buffer size in bytes
    pub ecc_buffer_size: usize,
    /// Spare-area working buffer size in bytes
    pub spare_buffer_size: usize,
    /// Pages of four sectors or more
    pub large_pages: bool,
}

impl Geometry {
    /// Derive the layout for `banks_total` banks of `device`
    pub fn derive(device: &DeviceDescriptor, banks_total: u32) -> Self {
        let blocks_per_bank = device.blocks_per_bank as u32;
        let pages_per_block = device.pages_per_block as u32;
        let sectors_per_page = device.sectors_per_page as u32;
        let user_sub_blocks_total = device.user_sub_blocks_total;

        let pages_per_bank = pages_per_block * blocks_per_bank;
        let pages_total = pages_per_bank * banks_total;
        let pages_per_sub_block = pages_per_block * banks_total;
        let user_pages_total = user_sub_blocks_total * pages_per_sub_block;
        // Reduces to blocks_per_bank; kept in this form. No banks, no sub-blocks.
        let sub_blocks_total = (banks_total * blocks_per_bank)
            .checked_div(banks_total)
            .unwrap_or(0);

        Self {
            banks_total,
            blocks_per_bank,
            pages_per_block,
            sectors_per_page,
            bytes_per_spare: device.bytes_per_spare as u32,
            user_sub_blocks_total,
            pages_per_bank,
            pages_total,
            pages_per_sub_block,
            user_pages_total,
            sub_blocks_total,
            ecc_buffer_size: SECTOR_SIZE * sectors_per_page as usize,
            spare_buffer_size: device.bytes_per_spare as usize,
            large_pages: sectors_per_page >= 4,
        }
    }
}

/// Sub-block reserve handed to the translation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FtlReserve {
    /// Sub-blocks not exposed to users, minus the fixed overhead
    pub reserved_sub_blocks: u16,
    /// Reserved sub-blocks plus the four metadata sub-blocks
    pub reserved_with_meta: u16,
    /// Sub-blocks holding the mapping table
    pub map_sub_blocks: u16,
    /// Concurrent log blocks
    pub log_blocks: u16,
    /// Left shifts of `log_blocks` (as a 32-bit word) that stay non-zero
    pub log_block_bits: u8,
}

impl FtlReserve {
    const MAP_SUB_BLOCKS: u16 = 3;
    const LOG_BLOCKS: u16 = 23;
    const META_SUB_BLOCKS: u16 = 4;

    /// Derive the reserve from the geometry
    ///
    /// Fields are 16 bits wide and wrap on underflow.
    pub fn derive(geometry: &Geometry) -> Self {
        let reserved_sub_blocks = (geometry.sub_blocks_total as u16)
            .wrapping_sub(geometry.user_sub_blocks_total as u16)
            .wrapping_sub(FTL_RESERVE_OVERHEAD);

        Self {
            reserved_sub_blocks,
            reserved_with_meta: Self::META_SUB_BLOCKS.wrapping_add(reserved_sub_blocks),
            map_sub_blocks: Self::MAP_SUB_BLOCKS,
            log_blocks: Self::LOG_BLOCKS,
            log_block_bits: shift_count(Self::LOG_BLOCKS as u32),
        }
    }
}

/// Count left shifts of `value` that leave a non-zero word
fn shift_count(value: u32) -> u8 {
    if value == 0 {
        0
    } else {
        (31 - value.trailing_zeros()) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use proptest::prelude::*;

    fn descriptor(blocks: u16, pages: u16, spp: u16, spare: u16, user: u32) -> DeviceDescriptor {
        let mut device = *catalog::lookup(0x2555_D5EC).unwrap();
        device.blocks_per_bank = blocks;
        device.pages_per_block = pages;
        device.sectors_per_page = spp;
        device.bytes_per_spare = spare;
        device.user_sub_blocks_total = user;
        device
    }

    #[test]
    fn test_scenario_four_banks() {
        let device = catalog::lookup(0x2555_D5EC).unwrap();
        let geometry = Geometry::derive(device, 4);

        assert_eq!(geometry.pages_per_bank, 128 * 8192);
        assert_eq!(geometry.pages_total, 128 * 8192 * 4);
        assert_eq!(geometry.pages_per_sub_block, 128 * 4);
        assert_eq!(geometry.user_pages_total, 7744 * 128 * 4);
        assert_eq!(geometry.sub_blocks_total, 8192);
        assert_eq!(geometry.ecc_buffer_size, 2048);
        assert_eq!(geometry.spare_buffer_size, 64);
        assert!(geometry.large_pages);
    }

    #[test]
    fn test_small_pages() {
        let device = descriptor(1024, 32, 1, 16, 900);
        let geometry = Geometry::derive(&device, 1);
        assert!(!geometry.large_pages);
        assert_eq!(geometry.ecc_buffer_size, 512);
    }

    #[test]
    fn test_zero_banks_has_no_sub_blocks() {
        let device = catalog::lookup(0x2555_D5EC).unwrap();
        let geometry = Geometry::derive(device, 0);
        assert_eq!(geometry.sub_blocks_total, 0);
        assert_eq!(geometry.pages_total, 0);
    }

    #[test]
    fn test_ftl_reserve() {
        let device = catalog::lookup(0x2555_D5EC).unwrap();
        let reserve = FtlReserve::derive(&Geometry::derive(device, 2));
        assert_eq!(reserve.reserved_sub_blocks, 8192 - 7744 - 28);
        assert_eq!(reserve.reserved_with_meta, 4 + 8192 - 7744 - 28);
        assert_eq!(reserve.map_sub_blocks, 3);
        assert_eq!(reserve.log_blocks, 23);
        assert_eq!(reserve.log_block_bits, 31);
    }

    #[test]
    fn test_shift_count() {
        assert_eq!(shift_count(0), 0);
        assert_eq!(shift_count(1), 31);
        assert_eq!(shift_count(0x8000_0000), 0);
        assert_eq!(shift_count(0x0000_0100), 23);
    }

    proptest! {
        #[test]
        fn prop_geometry_chain(
            blocks in 1u16..=16384,
            pages in 1u16..=256,
            spp in 1u16..=16,
            user in 0u32..=16384,
            banks in 1u32..=8,
        ) {
            let device = descriptor(blocks, pages, spp, 64, user);
            let g = Geometry::derive(&device, banks);
            prop_assert_eq!(g.pages_per_bank, pages as u32 * blocks as u32);
            prop_assert_eq!(g.pages_total, g.pages_per_bank * banks);
            prop_assert_eq!(g.pages_per_sub_block, pages as u32 * banks);
            prop_assert_eq!(g.user_pages_total, user * g.pages_per_sub_block);
            prop_assert_eq!(g.sub_blocks_total, blocks as u32);
        }
    }
}
