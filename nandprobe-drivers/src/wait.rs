//! Status register wait engine
//!
//! Every hardware synchronization point of the controller is a flag in the
//! status register. Waits busy-poll that register against the monotonic
//! clock; there is no interrupt or yield involved.
//!
//! Flags are level-triggered and acknowledged by writing the flag mask
//! back (write-one-to-clear). The ready flag is a plain level and is never
//! acknowledged.

use nandprobe_hal::{MonotonicTimer, RegisterAccess};

/// A wait exceeded its bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout;

/// Status register flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusFlag {
    /// Controller idle (bit 0)
    Ready,
    /// Address phase complete (bit 2)
    AddressDone,
    /// Data phase complete (bit 3)
    TransferDone,
    /// Bank operation complete (bit 4 + bank)
    Bank(u8),
}

impl StatusFlag {
    /// Bit mask of the flag
    ///
    /// A bank index past the end of the register yields an empty mask,
    /// which never reads as set.
    pub fn mask(self) -> u32 {
        match self {
            StatusFlag::Ready => 1 << 0,
            StatusFlag::AddressDone => 1 << 2,
            StatusFlag::TransferDone => 1 << 3,
            StatusFlag::Bank(bank) => 1u32.checked_shl(4 + bank as u32).unwrap_or(0),
        }
    }

    /// Whether a successful wait acknowledges the flag
    pub fn clears(self) -> bool {
        !matches!(self, StatusFlag::Ready)
    }
}

/// Timeout-bounded polling over the status register
pub struct WaitEngine<R, T> {
    regs: R,
    timer: T,
    status: u32,
    force_bank_zero: bool,
}

impl<R: RegisterAccess, T: MonotonicTimer> WaitEngine<R, T> {
    /// Create a wait engine
    ///
    /// # Arguments
    /// - `status`: Offset of the status register in the window
    /// - `force_bank_zero`: Bank completion waits always use bank 0's flag
    pub fn new(regs: R, timer: T, status: u32, force_bank_zero: bool) -> Self {
        Self {
            regs,
            timer,
            status,
            force_bank_zero,
        }
    }

    /// Wait until any bit of `mask` is set
    ///
    /// Returns immediately if the flag is already set. On success the mask
    /// is written back when `clear` is true.
    pub fn wait_until(&mut self, mask: u32, clear: bool, timeout_us: u64) -> Result<(), Timeout> {
        if self.is_set(mask) {
            self.acknowledge(mask, clear);
            return Ok(());
        }
        let start = self.timer.now_us();
        self.poll(mask, clear, start, timeout_us)
    }

    /// Wait for a status flag with a millisecond timeout
    pub fn wait_for(&mut self, flag: StatusFlag, timeout_ms: u32) -> Result<(), Timeout> {
        self.wait_until(flag.mask(), flag.clears(), ms_to_us(timeout_ms))
    }

    /// Wait for the controller ready flag
    pub fn wait_ready(&mut self, timeout_ms: u32) -> Result<(), Timeout> {
        self.wait_for(StatusFlag::Ready, timeout_ms)
    }

    /// Wait for the address phase to complete
    pub fn wait_address_done(&mut self, timeout_ms: u32) -> Result<(), Timeout> {
        self.wait_for(StatusFlag::AddressDone, timeout_ms)
    }

    /// Wait for the data phase to complete
    pub fn wait_transfer_done(&mut self, timeout_ms: u32) -> Result<(), Timeout> {
        self.wait_for(StatusFlag::TransferDone, timeout_ms)
    }

    /// Wait for a bank completion flag
    ///
    /// Unlike the other waits the clock starts before the first poll, so a
    /// flag that is already set still costs one timer read.
    pub fn wait_bank(&mut self, bank: u8, timeout_ms: u32) -> Result<(), Timeout> {
        let flag = StatusFlag::Bank(self.bank_flag_index(bank));
        let start = self.timer.now_us();
        self.poll(flag.mask(), true, start, ms_to_us(timeout_ms))
    }

    /// Bank index whose completion flag a wait on `bank` observes
    pub fn bank_flag_index(&self, bank: u8) -> u8 {
        if self.force_bank_zero {
            0
        } else {
            bank
        }
    }

    /// Register window
    pub fn regs(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Timebase
    pub fn timer(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Release the register window and timer
    pub fn into_parts(self) -> (R, T) {
        (self.regs, self.timer)
    }

    fn poll(&mut self, mask: u32, clear: bool, start: u64, timeout_us: u64) -> Result<(), Timeout> {
        while !self.is_set(mask) {
            if self.timer.elapsed_since(start, timeout_us) {
                return Err(Timeout);
            }
        }
        self.acknowledge(mask, clear);
        Ok(())
    }

    fn is_set(&mut self, mask: u32) -> bool {
        self.regs.read32(self.status) & mask != 0
    }

    fn acknowledge(&mut self, mask: u32, clear: bool) {
        if clear {
            self.regs.write32(self.status, mask);
        }
    }
}

fn ms_to_us(timeout_ms: u32) -> u64 {
    timeout_ms as u64 * 1_000
}
