//! Controller configuration
//!
//! Register layout, clock gates, timeouts and the hardware-revision
//! switches of the NAND controller. The defaults describe the controller
//! found on S5L8900-class SoCs; boards override individual fields.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timing::{TimingSettings, TIMING_MAX};

/// Maximum number of banks the controller can address
///
/// Bank completion flags occupy status bits 4 and up, one per bank.
pub const MAX_BANKS: usize = 8;

/// Register offsets and command values of the controller window
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegisterMap {
    /// Channel configuration (timing fields, chip enables)
    pub config: u32,
    /// Control register (starts address and transfer phases)
    pub control: u32,
    /// Command register
    pub command: u32,
    /// Column/row address, low word
    pub address_low: u32,
    /// Row address, high word
    pub address_high: u32,
    /// Transfer size for the data phase
    pub transfer_size: u32,
    /// ID/data FIFO
    pub id: u32,
    /// Status flags (write one to clear)
    pub status: u32,
    /// Global setup register
    pub setup: u32,

    /// Bits always set in the channel configuration
    pub config_defaults: u32,
    /// Shift of the first timing field in the channel configuration
    pub setting1_shift: u32,
    /// Shift of the second timing field in the channel configuration
    pub setting2_shift: u32,

    /// Reset command
    pub cmd_reset: u32,
    /// Read-ID command
    pub cmd_read_id: u32,

    /// Control value between operations
    pub control_idle: u32,
    /// Control value that starts the address phase
    pub control_start_address: u32,
    /// Control value that starts the data phase
    pub control_start_transfer: u32,
    /// Transfer size programmed for an ID read
    pub id_transfer_size: u32,

    /// Shift of the ECC mode field in the setup register
    pub setup_ecc_shift: u32,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            config: 0x00,
            control: 0x04,
            command: 0x08,
            address_low: 0x0C,
            address_high: 0x10,
            transfer_size: 0x14,
            id: 0x28,
            status: 0x48,
            setup: 0x80,
            config_defaults: 0x0000_0001,
            setting1_shift: 16,
            setting2_shift: 12,
            cmd_reset: 0xFF,
            cmd_read_id: 0x90,
            control_idle: 0x0000_0080,
            control_start_address: 1 << 0,
            control_start_transfer: 1 << 1,
            id_transfer_size: 1 << 3,
            setup_ecc_shift: 4,
        }
    }
}

impl RegisterMap {
    /// Bit mask of a timing field in the channel configuration
    pub const TIMING_FIELD_MASK: u32 = TIMING_MAX as u32;

    /// Channel configuration value selecting one chip enable
    ///
    /// Only the first two timing settings are encoded here; the other two
    /// are consumed by the data path above this crate.
    pub fn channel_config(&self, timings: &TimingSettings, chip_enable: u8) -> u32 {
        ((timings.setting1 as u32 & Self::TIMING_FIELD_MASK) << self.setting1_shift)
            | ((timings.setting2 as u32 & Self::TIMING_FIELD_MASK) << self.setting2_shift)
            | (1 << (chip_enable as u32 + 1))
            | self.config_defaults
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    /// Number of physical banks to probe (1-8)
    pub bank_count: u8,
    /// Always wait on bank 0's completion flag
    ///
    /// Early controller revisions only raise the bank-0 flag regardless of
    /// which bank finished.
    pub force_bank_zero: bool,
    /// ECC mode written to the setup register before probing
    pub ecc_setup_mode: u8,
    /// Timing value used for every field until the device is known
    pub initial_timing: u8,
    /// Clock gates the controller depends on
    pub gates: [u32; 2],
    /// Settle delay after a bank reset (µs)
    pub settle_us: u32,
    /// Bank reset timeout (ms)
    pub reset_timeout_ms: u32,
    /// Ready/address/transfer wait timeout during probing (ms)
    pub op_timeout_ms: u32,
    /// Bank handshake timeout during probing (ms)
    pub bank_handshake_timeout_ms: u32,
    /// Register layout
    pub registers: RegisterMap,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bank_count: MAX_BANKS as u8,
            force_bank_zero: true,
            ecc_setup_mode: 0,
            initial_timing: TIMING_MAX,
            gates: [0x08, 0x0C],
            settle_us: 1_000,
            reset_timeout_ms: 100,
            op_timeout_ms: 500,
            bank_handshake_timeout_ms: 100,
            registers: RegisterMap::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No banks to probe
    NoBanks,
    /// More banks than the status register has flags for
    TooManyBanks,
    /// Initial timing does not fit the 3-bit field
    TimingTooWide,
}

impl ControllerConfig {
    /// Check the configuration for values the controller cannot represent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bank_count == 0 {
            return Err(ConfigError::NoBanks);
        }
        if self.bank_count as usize > MAX_BANKS {
            return Err(ConfigError::TooManyBanks);
        }
        if self.initial_timing > TIMING_MAX {
            return Err(ConfigError::TimingTooWide);
        }
        Ok(())
    }

    /// Timing settings in effect before a device has been identified
    pub fn initial_timings(&self) -> TimingSettings {
        TimingSettings::uniform(self.initial_timing)
    }
}
