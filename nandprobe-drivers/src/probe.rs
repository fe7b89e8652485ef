//! Per-bank probe state machine
//!
//! A probe resets one bank, reads its ID register and matches the value
//! against the device catalog. Each call to [`BankProbe::advance`] performs
//! one hardware step:
//!
//! ```text
//! Idle → Resetting → ConfiguringRead → AwaitingReady → AwaitingOp
//!      → RequestingId → AwaitingIdReady → IdRead → Matched | Unmatched | Failed
//! ```
//!
//! Stage timeouts do not stop the probe. They are recorded in
//! [`StageTimeouts`] and the probe continues to the ID comparison with
//! whatever the ID register holds. Only a signature that differs from the
//! device already matched in this pass is a failure.

use embedded_hal::delay::DelayNs;
use nandprobe_core::catalog::{self, DeviceDescriptor};
use nandprobe_core::config::ControllerConfig;
use nandprobe_core::timing::TimingSettings;
use nandprobe_hal::{MonotonicTimer, RegisterAccess};

use crate::reset::BankReset;
use crate::wait::{Timeout, WaitEngine};

/// Probe states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeState {
    /// Not started
    Idle,
    /// Bank reset pending
    Resetting,
    /// Read-ID command pending
    ConfiguringRead,
    /// Waiting for the controller to accept the command
    AwaitingReady,
    /// Waiting for the address phase and bank handshake
    AwaitingOp,
    /// ID transfer pending
    RequestingId,
    /// Waiting for the ID transfer
    AwaitingIdReady,
    /// ID register ready to read
    IdRead,
    /// Bank carries a supported device
    Matched(&'static DeviceDescriptor),
    /// Bank is empty or carries an unknown device
    Unmatched { id: u32 },
    /// Bank carries a different device than an earlier bank
    Failed { expected: u32, found: u32 },
}

impl ProbeState {
    /// Check if the probe has finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProbeState::Matched(_) | ProbeState::Unmatched { .. } | ProbeState::Failed { .. }
        )
    }
}

/// Hardware waits inside a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ProbeStage {
    /// Bank reset sequence
    Reset = 0,
    /// Controller ready after the read-ID command
    Ready = 1,
    /// Address phase
    AddressDone = 2,
    /// Bank handshake before the data phase
    BankHandshake = 3,
    /// ID transfer
    TransferDone = 4,
}

impl ProbeStage {
    const ALL: [ProbeStage; 5] = [
        ProbeStage::Reset,
        ProbeStage::Ready,
        ProbeStage::AddressDone,
        ProbeStage::BankHandshake,
        ProbeStage::TransferDone,
    ];

    /// Short name for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            ProbeStage::Reset => "reset",
            ProbeStage::Ready => "ready",
            ProbeStage::AddressDone => "address",
            ProbeStage::BankHandshake => "bank handshake",
            ProbeStage::TransferDone => "transfer",
        }
    }
}

/// Set of stages that timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StageTimeouts(u8);

impl StageTimeouts {
    /// Record the result of a stage
    pub fn record(&mut self, stage: ProbeStage, result: Result<(), Timeout>) {
        if result.is_err() {
            self.0 |= 1 << stage as u8;
        }
    }

    /// Check if a stage timed out
    pub fn contains(&self, stage: ProbeStage) -> bool {
        self.0 & (1 << stage as u8) != 0
    }

    /// Check if every stage completed in time
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of stages that timed out
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Stages that timed out, in sequence order
    pub fn iter(&self) -> impl Iterator<Item = ProbeStage> + '_ {
        ProbeStage::ALL.into_iter().filter(|stage| self.contains(*stage))
    }
}

/// Outcome of probing one bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeOutcome {
    Matched(&'static DeviceDescriptor),
    Unmatched { id: u32 },
    Mismatch { expected: u32, found: u32 },
}

/// Audit record of one bank probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeReport {
    pub bank: u8,
    pub outcome: ProbeOutcome,
    pub timeouts: StageTimeouts,
}

/// Probe of a single bank
pub struct BankProbe<'a, R, T> {
    engine: &'a mut WaitEngine<R, T>,
    config: &'a ControllerConfig,
    timings: TimingSettings,
    bank: u8,
    chip_enable: u8,
    matched: Option<&'static DeviceDescriptor>,
    state: ProbeState,
    timeouts: StageTimeouts,
}

impl<'a, R, T> BankProbe<'a, R, T>
where
    R: RegisterAccess,
    T: MonotonicTimer + DelayNs,
{
    /// Create a probe for `bank`
    ///
    /// # Arguments
    /// - `chip_enable`: Bank table entry for `bank`
    /// - `timings`: Timing fields for the channel configuration
    /// - `matched`: Device matched earlier in this pass, if any
    pub fn new(
        engine: &'a mut WaitEngine<R, T>,
        config: &'a ControllerConfig,
        timings: TimingSettings,
        bank: u8,
        chip_enable: u8,
        matched: Option<&'static DeviceDescriptor>,
    ) -> Self {
        Self {
            engine,
            config,
            timings,
            bank,
            chip_enable,
            matched,
            state: ProbeState::Idle,
            timeouts: StageTimeouts::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// Stage timeouts so far
    pub fn timeouts(&self) -> StageTimeouts {
        self.timeouts
    }

    /// Perform one step and return the new state
    ///
    /// Terminal states are returned unchanged.
    pub fn advance(&mut self) -> ProbeState {
        let config = self.config;
        let map = &config.registers;

        self.state = match self.state {
            ProbeState::Idle => ProbeState::Resetting,
            ProbeState::Resetting => {
                let reset = BankReset::new(map, self.timings, config.settle_us);
                let result = reset.reset_bank(
                    self.engine,
                    self.bank,
                    self.chip_enable,
                    config.reset_timeout_ms,
                );
                self.timeouts.record(ProbeStage::Reset, result);
                ProbeState::ConfiguringRead
            }
            ProbeState::ConfiguringRead => {
                let channel = map.channel_config(&self.timings, self.chip_enable);
                let regs = self.engine.regs();
                regs.write32(map.control, map.control_idle);
                regs.write32(map.config, channel);
                regs.write32(map.command, map.cmd_read_id);
                ProbeState::AwaitingReady
            }
            ProbeState::AwaitingReady => {
                let result = self.engine.wait_ready(config.op_timeout_ms);
                self.timeouts.record(ProbeStage::Ready, result);

                let regs = self.engine.regs();
                regs.write32(map.address_high, 0);
                regs.write32(map.address_low, 0);
                regs.write32(map.control, map.control_start_address);
                ProbeState::AwaitingOp
            }
            ProbeState::AwaitingOp => {
                let result = self.engine.wait_address_done(config.op_timeout_ms);
                self.timeouts.record(ProbeStage::AddressDone, result);

                let result = self
                    .engine
                    .wait_bank(self.bank, config.bank_handshake_timeout_ms);
                self.timeouts.record(ProbeStage::BankHandshake, result);
                ProbeState::RequestingId
            }
            ProbeState::RequestingId => {
                let regs = self.engine.regs();
                regs.write32(map.transfer_size, map.id_transfer_size);
                regs.write32(map.control, map.control_start_transfer);
                ProbeState::AwaitingIdReady
            }
            ProbeState::AwaitingIdReady => {
                let result = self.engine.wait_transfer_done(config.op_timeout_ms);
                self.timeouts.record(ProbeStage::TransferDone, result);
                ProbeState::IdRead
            }
            ProbeState::IdRead => {
                let id = self.engine.regs().read32(map.id);
                let next = self.classify(id);
                self.engine.regs().write32(map.control, map.control_idle);
                next
            }
            terminal => terminal,
        };

        self.state
    }

    /// Run the probe to completion
    pub fn run(mut self) -> ProbeReport {
        while !self.advance().is_terminal() {}
        self.report()
    }

    /// Report of a finished probe
    ///
    /// Returns `None` while the probe is still running.
    pub fn finished(&self) -> Option<ProbeReport> {
        self.state.is_terminal().then(|| self.report())
    }

    fn classify(&self, id: u32) -> ProbeState {
        match (catalog::lookup(id), self.matched) {
            (None, _) => ProbeState::Unmatched { id },
            (Some(device), None) => ProbeState::Matched(device),
            (Some(device), Some(previous)) if device.signature == previous.signature => {
                ProbeState::Matched(device)
            }
            (Some(device), Some(previous)) => ProbeState::Failed {
                expected: previous.signature,
                found: device.signature,
            },
        }
    }

    fn report(&self) -> ProbeReport {
        let outcome = match self.state {
            ProbeState::Matched(device) => ProbeOutcome::Matched(device),
            ProbeState::Failed { expected, found } => ProbeOutcome::Mismatch { expected, found },
            ProbeState::Unmatched { id } => ProbeOutcome::Unmatched { id },
            _ => ProbeOutcome::Unmatched { id: 0 },
        };
        ProbeReport {
            bank: self.bank,
            outcome,
            timeouts: self.timeouts,
        }
    }
}
