//! Timing register derivation
//!
//! Device timing constants are given in cycles of a 100 MHz reference
//! clock. The controller counts in bus clock cycles, so each constant is
//! rescaled to the actual bus frequency, rounded up, and stored minus one
//! in a 3-bit field.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::{DeviceDescriptor, TimingConstants};

/// Largest value a timing field can hold
pub const TIMING_MAX: u8 = 7;

/// Clock the catalog timing constants are expressed in
pub const REFERENCE_CLOCK_HZ: u64 = 100_000_000;

/// Rescale one reference-clock constant to a register value
///
/// Computes `ceil(bus_hz * (constant + 1) / 100 MHz) - 1` in 64-bit
/// arithmetic and saturates at [`TIMING_MAX`]. A zero bus clock also
/// saturates.
pub fn derive_timing(bus_hz: u32, constant: u8) -> u8 {
    let cycles = (bus_hz as u64 * (constant as u64 + 1)).div_ceil(REFERENCE_CLOCK_HZ);
    match cycles.checked_sub(1) {
        Some(value) => value.min(TIMING_MAX as u64) as u8,
        None => TIMING_MAX,
    }
}

/// Controller timing register values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingSettings {
    pub setting1: u8,
    pub setting2: u8,
    pub setting3: u8,
    pub setting4: u8,
}

impl TimingSettings {
    /// Same value in every field
    pub const fn uniform(value: u8) -> Self {
        Self {
            setting1: value,
            setting2: value,
            setting3: value,
            setting4: value,
        }
    }

    /// Derive all four fields for the given bus clock
    pub fn derive(bus_hz: u32, constants: &TimingConstants) -> Self {
        Self {
            setting2: derive_timing(bus_hz, constants.setting2),
            setting1: derive_timing(bus_hz, constants.setting1),
            setting3: derive_timing(bus_hz, constants.setting3),
            setting4: derive_timing(bus_hz, constants.setting4),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self::uniform(TIMING_MAX)
    }
}

/// ECC mode selection derived from the device timing class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EccSelection {
    /// Mode for the setup register's ECC field
    pub setup_mode: u8,
    /// Correctable-bit budget per page
    pub correction_budget: u32,
    /// Secondary mode selector
    pub alt_mode: u8,
}

impl EccSelection {
    /// Select ECC modes for a device
    ///
    /// Classes outside {4, 6, 8} leave the corresponding fields of
    /// `previous` unchanged. The secondary selector only consults
    /// `ecc_class_alt` for class 6; its other two arms test `ecc_class`.
    pub fn select(device: &DeviceDescriptor, previous: EccSelection) -> Self {
        let spp = device.sectors_per_page as u32;
        let mut selection = previous;

        match device.ecc_class {
            6 => {
                selection.setup_mode = 4;
                selection.correction_budget = spp * 15;
            }
            8 => {
                selection.setup_mode = 8;
                selection.correction_budget = spp * 20;
            }
            4 => {
                selection.setup_mode = 0;
                selection.correction_budget = spp * 10;
            }
            _ => {}
        }

        if device.ecc_class_alt == 6 {
            selection.alt_mode = 4;
        } else if device.ecc_class == 8 {
            selection.alt_mode = 8;
        } else if device.ecc_class == 4 {
            selection.alt_mode = 0;
        }

        selection
    }
}
