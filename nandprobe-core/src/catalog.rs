//! Supported NAND device catalog
//!
//! Static table of every flash device the controller knows how to drive,
//! keyed by the 32-bit value the ID register returns after a read-ID
//! command. The table ends with a zero-signature sentinel; lookups stop
//! there.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw timing constants of a device
///
/// Each value is expressed in cycles of the 100 MHz reference clock and is
/// rescaled to the real bus clock during bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConstants {
    pub setting1: u8,
    pub setting2: u8,
    pub setting3: u8,
    pub setting4: u8,
}

/// Signature and static parameters of one flash device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceDescriptor {
    /// Value read back from the ID register
    pub signature: u32,
    /// Erase blocks in one bank
    pub blocks_per_bank: u16,
    /// Pages in one erase block
    pub pages_per_block: u16,
    /// 512-byte sectors in one page
    pub sectors_per_page: u16,
    /// Spare (out-of-band) bytes per page
    pub bytes_per_spare: u16,
    /// Reference-clock timing constants
    pub timing: TimingConstants,
    /// Sub-blocks exposed to the translation layer
    pub user_sub_blocks_total: u32,
    /// Timing class code selecting the primary ECC mode
    pub ecc_class: u32,
    /// Timing class code selecting the secondary ECC mode
    pub ecc_class_alt: u32,
}

impl DeviceDescriptor {
    /// Table terminator
    pub const SENTINEL: Self = device(0, 0, 0, 0, 0, [0, 0, 0, 0], 0, 0, 0);

    /// Check if this entry is the table terminator
    pub const fn is_sentinel(&self) -> bool {
        self.signature == 0
    }
}

/// Build a table entry
///
/// `timing` is in table order: setting2, setting1, setting3, setting4.
#[allow(clippy::too_many_arguments)]
const fn device(
    signature: u32,
    blocks_per_bank: u16,
    pages_per_block: u16,
    sectors_per_page: u16,
    bytes_per_spare: u16,
    timing: [u8; 4],
    user_sub_blocks_total: u32,
    ecc_class: u32,
    ecc_class_alt: u32,
) -> DeviceDescriptor {
    DeviceDescriptor {
        signature,
        blocks_per_bank,
        pages_per_block,
        sectors_per_page,
        bytes_per_spare,
        timing: TimingConstants {
            setting2: timing[0],
            setting1: timing[1],
            setting3: timing[2],
            setting4: timing[3],
        },
        user_sub_blocks_total,
        ecc_class,
        ecc_class_alt,
    }
}

/// Every supported device, sentinel-terminated
#[rustfmt::skip]
pub static SUPPORTED_DEVICES: [DeviceDescriptor; 13] = [
    // Samsung
    device(0x2555_D5EC, 8192, 0x80, 4,  64, [4, 2, 4, 2], 7744, 4, 6),
    device(0xB614_D5EC, 4096, 0x80, 8, 128, [4, 2, 4, 2], 3872, 4, 6),
    device(0xB655_D7EC, 8192, 0x80, 8, 128, [4, 2, 4, 2], 7744, 4, 6),
    // Hynix
    device(0xA514_D3AD, 4096, 0x80, 4,  64, [4, 2, 4, 2], 3872, 4, 6),
    device(0xA555_D5AD, 8192, 0x80, 4,  64, [4, 2, 4, 2], 7744, 4, 6),
    // Toshiba
    device(0xA585_D598, 8320, 0x80, 4,  64, [6, 2, 4, 2], 7744, 4, 6),
    device(0xBA94_D598, 4096, 0x80, 8, 216, [6, 2, 4, 2], 3872, 8, 8),
    device(0xBA95_D798, 8192, 0x80, 8, 216, [6, 2, 4, 2], 7744, 8, 8),
    // Intel
    device(0x3ED5_D789, 8192, 0x80, 8, 216, [4, 2, 4, 2], 7744, 8, 8),
    device(0x3E94_D589, 4096, 0x80, 8, 216, [4, 2, 4, 2], 3872, 8, 8),
    // Micron
    device(0x3ED5_D72C, 8192, 0x80, 8, 216, [4, 2, 4, 2], 7744, 8, 8),
    device(0x3E94_D52C, 4096, 0x80, 8, 216, [4, 2, 4, 2], 3872, 8, 8),
    DeviceDescriptor::SENTINEL,
];

/// Iterate the live catalog entries (sentinel excluded)
pub fn iter() -> impl Iterator<Item = &'static DeviceDescriptor> {
    SUPPORTED_DEVICES.iter().take_while(|d| !d.is_sentinel())
}

/// Find the catalog entry for an ID register value
///
/// Returns `None` for unknown signatures, including zero (the sentinel is
/// never a match).
pub fn lookup(signature: u32) -> Option<&'static DeviceDescriptor> {
    iter().find(|d| d.signature == signature)
}
