//! Register-level controller simulator for tests
//!
//! Models the status handshakes of the controller closely enough to run
//! the full bring-up sequence: commands and control writes raise status
//! flags, status writes clear them, and the ID register returns the
//! signature of the bank selected in the channel configuration.

use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};
use nandprobe_core::config::RegisterMap;
use nandprobe_hal::{BufferAllocator, ClockGate, ClockService, DiagnosticSink, MonotonicTimer, RegisterAccess};

pub const READY: u32 = 1 << 0;
pub const ADDRESS_DONE: u32 = 1 << 2;
pub const TRANSFER_DONE: u32 = 1 << 3;

/// Simulated controller window
pub struct SimController {
    pub map: RegisterMap,
    regs: [u32; 64],
    pub status: u32,
    /// Signature each bank answers with (0 = empty bank)
    pub bank_ids: [u32; 8],
    /// Banks that never raise any flag
    pub silent_banks: u8,
    /// Hardware only raises the bank-0 completion flag
    pub bank_zero_only: bool,
    /// Banks that received a reset command
    pub reset_banks: u8,
    /// Every register write, in order
    pub writes: Vec<(u32, u32), 512>,
    latched_id: u32,
}

impl SimController {
    pub fn new(bank_ids: [u32; 8]) -> Self {
        Self {
            map: RegisterMap::default(),
            regs: [0; 64],
            status: 0,
            bank_ids,
            silent_banks: 0,
            bank_zero_only: true,
            reset_banks: 0,
            writes: Vec::new(),
            latched_id: 0,
        }
    }

    /// Bank selected by the chip-enable bits of the channel configuration
    pub fn selected_bank(&self) -> Option<u8> {
        let config = self.regs[(self.map.config / 4) as usize];
        (0..8u8).find(|bank| config & (1 << (bank + 1)) != 0)
    }

    /// Last value written to `offset`
    pub fn reg(&self, offset: u32) -> u32 {
        self.regs[(offset / 4) as usize]
    }

    /// Writes to `offset`, in order
    pub fn writes_to(&self, offset: u32) -> impl Iterator<Item = u32> + '_ {
        self.writes
            .iter()
            .filter(move |(o, _)| *o == offset)
            .map(|(_, v)| *v)
    }

    fn responsive(&self) -> Option<u8> {
        let bank = self.selected_bank()?;
        if self.silent_banks & (1 << bank) != 0 {
            None
        } else {
            Some(bank)
        }
    }

    fn bank_flag(&self, bank: u8) -> u32 {
        if self.bank_zero_only {
            1 << 4
        } else {
            1 << (4 + bank)
        }
    }
}

impl RegisterAccess for SimController {
    fn read32(&mut self, offset: u32) -> u32 {
        if offset == self.map.status {
            self.status
        } else if offset == self.map.id {
            self.latched_id
        } else {
            self.reg(offset)
        }
    }

    fn write32(&mut self, offset: u32, value: u32) {
        if self.writes.push((offset, value)).is_err() {
            panic!("write log full at offset {:#x}", offset);
        }

        if offset == self.map.status {
            self.status &= !value;
            return;
        }
        self.regs[(offset / 4) as usize] = value;

        if offset == self.map.command {
            // Busy until the selected bank answers
            self.status &= !READY;
            self.latched_id = 0;
            if value == self.map.cmd_reset {
                if let Some(bank) = self.selected_bank() {
                    self.reset_banks |= 1 << bank;
                }
            }
            if let Some(bank) = self.responsive() {
                if value == self.map.cmd_reset {
                    self.status |= READY | self.bank_flag(bank);
                } else if value == self.map.cmd_read_id {
                    self.status |= READY;
                }
            }
        } else if offset == self.map.control {
            if let Some(bank) = self.responsive() {
                if value == self.map.control_start_address {
                    self.status |= ADDRESS_DONE | self.bank_flag(bank);
                } else if value == self.map.control_start_transfer {
                    self.status |= TRANSFER_DONE;
                    self.latched_id = self.bank_ids[bank as usize];
                }
            }
        }
    }
}

/// Fake microsecond clock that advances on every read
pub struct SimClock {
    pub now: u64,
    pub step: u64,
    pub delayed_us: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            now: 0,
            step: 10,
            delayed_us: 0,
        }
    }
}

impl MonotonicTimer for SimClock {
    fn now_us(&mut self) -> u64 {
        self.now += self.step;
        self.now
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        let us = (ns as u64).div_ceil(1_000);
        self.now += us;
        self.delayed_us += us;
    }
}

/// Clock service with a fixed bus frequency
pub struct SimClocks {
    pub bus_hz: u32,
    pub enabled: Vec<ClockGate, 4>,
}

impl SimClocks {
    pub fn new(bus_hz: u32) -> Self {
        Self {
            bus_hz,
            enabled: Vec::new(),
        }
    }
}

impl ClockService for SimClocks {
    fn enable_gate(&mut self, gate: ClockGate) {
        let _ = self.enabled.push(gate);
    }

    fn bus_frequency(&self) -> u32 {
        self.bus_hz
    }
}

pub const POOL_BUFFER_SIZE: usize = 4096;

/// Allocator handing out fixed-capacity buffers
pub struct SimAllocator {
    /// Number of allocations that succeed before the pool runs dry
    pub capacity: usize,
    pub sizes: Vec<usize, 4>,
}

impl SimAllocator {
    pub fn new() -> Self {
        Self {
            capacity: usize::MAX,
            sizes: Vec::new(),
        }
    }
}

impl BufferAllocator for SimAllocator {
    type Buffer = Vec<u8, POOL_BUFFER_SIZE>;

    fn alloc(&mut self, size: usize) -> Option<Self::Buffer> {
        if self.sizes.len() >= self.capacity || size > POOL_BUFFER_SIZE {
            return None;
        }
        let _ = self.sizes.push(size);
        let mut buffer = Vec::new();
        buffer.resize(size, 0).ok()?;
        Some(buffer)
    }
}

/// Sink that keeps every line
pub struct SimSink {
    pub lines: Vec<String<64>, 64>,
}

impl SimSink {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl DiagnosticSink for SimSink {
    fn log(&mut self, line: &str) {
        let mut owned = String::new();
        let _ = owned.push_str(line);
        let _ = self.lines.push(owned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "write log full")]
    fn test_write_log_overflow_panics() {
        let mut sim = SimController::new([0; 8]);
        for _ in 0..=512 {
            sim.write32(0x00, 1);
        }
    }
}
