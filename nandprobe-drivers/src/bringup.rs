//! Controller bring-up
//!
//! Runs one discovery pass over every bank, then derives the device
//! parameters and allocates the working buffers the data path needs.
//!
//! # Sequence
//!
//! 1. Validate the configuration
//! 2. Enable the controller clock gates
//! 3. Program the ECC setup mode
//! 4. Probe each bank in order, aborting on a device mismatch
//! 5. Derive timings, ECC selection, geometry and FTL reserve
//! 6. Report the geometry through the diagnostic sink
//! 7. Allocate the read/ECC and spare buffers

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};
use nandprobe_core::bank::BankTable;
use nandprobe_core::catalog::DeviceDescriptor;
use nandprobe_core::config::{ConfigError, ControllerConfig, MAX_BANKS};
use nandprobe_core::geometry::SECTOR_SIZE;
use nandprobe_core::params::DeviceParameters;
use nandprobe_core::timing::EccSelection;
use nandprobe_hal::{BufferAllocator, ClockGate, ClockService, DiagnosticSink, MonotonicTimer, RegisterAccess};

use crate::probe::{BankProbe, ProbeOutcome, ProbeReport};
use crate::wait::WaitEngine;

/// Capacity of one diagnostic line
const LINE_CAPACITY: usize = 64;

/// Fill byte for the first sector of the read/ECC buffer
const ERASED: u8 = 0xFF;

/// Bring-up errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupError {
    /// Configuration rejected before touching hardware
    Config(ConfigError),
    /// A bank carries a different device than an earlier bank
    DeviceMismatch { bank: u8, expected: u32, found: u32 },
    /// No bank carries a supported device
    NoSupportedDevice,
    /// A working buffer could not be allocated
    OutOfMemory { size: usize },
}

impl From<ConfigError> for BringupError {
    fn from(err: ConfigError) -> Self {
        BringupError::Config(err)
    }
}

/// Result of a successful bring-up
pub struct ControllerParameters<B> {
    pub device: DeviceParameters,
    pub banks: BankTable,
    /// Per-bank probe records in probe order
    pub reports: Vec<ProbeReport, MAX_BANKS>,
    /// Read/ECC buffer, first sector pre-filled with 0xFF
    pub read_ecc_buffer: B,
    pub spare_buffer: B,
}

#[cfg(feature = "serde")]
impl<B> ControllerParameters<B> {
    /// Record for the next boot stage
    pub fn handoff(&self) -> nandprobe_core::handoff::Handoff {
        nandprobe_core::handoff::Handoff {
            params: self.device,
            banks: self.banks.clone(),
        }
    }
}

/// One-shot bring-up over the controller collaborators
pub struct ControllerBringup<R, T, C, A, S> {
    regs: R,
    timer: T,
    clocks: C,
    allocator: A,
    sink: S,
    config: ControllerConfig,
}

impl<R, T, C, A, S> ControllerBringup<R, T, C, A, S>
where
    R: RegisterAccess,
    T: MonotonicTimer + DelayNs,
    C: ClockService,
    A: BufferAllocator,
    S: DiagnosticSink,
{
    /// Create a bring-up pass
    ///
    /// # Arguments
    /// - `regs`: Controller register window
    /// - `timer`: Timebase for waits and settle delays
    /// - `clocks`: Clock gates and bus frequency
    /// - `allocator`: Source of the read/ECC and spare buffers
    /// - `sink`: Receives the diagnostic lines
    /// - `config`: Validated when the pass starts
    pub fn new(regs: R, timer: T, clocks: C, allocator: A, sink: S, config: ControllerConfig) -> Self {
        Self {
            regs,
            timer,
            clocks,
            allocator,
            sink,
            config,
        }
    }

    /// Discover the attached flash and derive its parameters
    pub fn bring_up(self) -> Result<ControllerParameters<A::Buffer>, BringupError> {
        let Self {
            mut regs,
            timer,
            mut clocks,
            mut allocator,
            mut sink,
            config,
        } = self;

        config.validate()?;
        let map = &config.registers;

        sink.log("nand: Probing flash controller...");
        #[cfg(feature = "defmt")]
        defmt::info!("nand: probing {=u8} banks", config.bank_count);

        for gate in config.gates {
            clocks.enable_gate(ClockGate(gate));
        }

        let mut banks = BankTable::identity(config.bank_count as usize);

        regs.write32(map.setup, 0);
        let ecc_bits = (config.ecc_setup_mode as u32) << map.setup_ecc_shift;
        regs.modify32(map.setup, |value| value | ecc_bits);

        let timings = config.initial_timings();
        let mut engine = WaitEngine::new(regs, timer, map.status, config.force_bank_zero);
        let mut reports: Vec<ProbeReport, MAX_BANKS> = Vec::new();
        let mut matched: Option<&'static DeviceDescriptor> = None;

        for bank in 0..config.bank_count {
            let chip_enable = banks.chip_enable(bank);
            let report = BankProbe::new(&mut engine, &config, timings, bank, chip_enable, matched).run();
            log_timeouts(&mut sink, &report);
            // Capacity is MAX_BANKS and bank_count was validated against it
            let _ = reports.push(report);

            match report.outcome {
                ProbeOutcome::Matched(device) => {
                    matched = Some(device);
                    banks.record_valid(bank);
                }
                ProbeOutcome::Unmatched { .. } => {}
                ProbeOutcome::Mismatch { expected, found } => {
                    emit(
                        &mut sink,
                        format_args!("nand: Mismatched device IDs (0x{:08x} after 0x{:08x})", found, expected),
                    );
                    #[cfg(feature = "defmt")]
                    defmt::error!("nand: bank {=u8} id {=u32:08x} after {=u32:08x}", bank, found, expected);
                    return Err(BringupError::DeviceMismatch {
                        bank,
                        expected,
                        found,
                    });
                }
            }
        }

        let Some(device) = matched else {
            sink.log("nand: No supported NAND found");
            #[cfg(feature = "defmt")]
            defmt::error!("nand: no supported device");
            return Err(BringupError::NoSupportedDevice);
        };

        let previous_ecc = EccSelection {
            setup_mode: config.ecc_setup_mode,
            ..EccSelection::default()
        };
        let params = DeviceParameters::derive(
            device,
            banks.valid_count() as u32,
            clocks.bus_frequency(),
            previous_ecc,
        );
        report_geometry(&mut sink, &params);
        #[cfg(feature = "defmt")]
        defmt::info!(
            "nand: device {=u32:08x} on {=u8} banks",
            params.signature,
            banks.valid_count()
        );

        let mut read_ecc_buffer = alloc_buffer(&mut allocator, params.geometry.ecc_buffer_size)?;
        let prefill = SECTOR_SIZE.min(params.geometry.ecc_buffer_size);
        read_ecc_buffer.as_mut()[..prefill].fill(ERASED);
        let spare_buffer = alloc_buffer(&mut allocator, params.geometry.spare_buffer_size)?;

        Ok(ControllerParameters {
            device: params,
            banks,
            reports,
            read_ecc_buffer,
            spare_buffer,
        })
    }
}

fn alloc_buffer<A: BufferAllocator>(allocator: &mut A, size: usize) -> Result<A::Buffer, BringupError> {
    allocator
        .alloc(size)
        .ok_or(BringupError::OutOfMemory { size })
}

/// Format one diagnostic line; overflow truncates
fn emit<S: DiagnosticSink>(sink: &mut S, args: fmt::Arguments<'_>) {
    let mut line: String<LINE_CAPACITY> = String::new();
    let _ = line.write_fmt(args);
    sink.log(&line);
}

fn log_timeouts<S: DiagnosticSink>(sink: &mut S, report: &ProbeReport) {
    for stage in report.timeouts.iter() {
        emit(
            sink,
            format_args!("nand: bank {} {} timeout", report.bank, stage.name()),
        );
        #[cfg(feature = "defmt")]
        defmt::debug!("nand: bank {=u8} {} timeout", report.bank, stage);
    }
}

fn report_geometry<S: DiagnosticSink>(sink: &mut S, params: &DeviceParameters) {
    let g = &params.geometry;
    emit(sink, format_args!("nand: DEVICE: {:08x}", params.signature));
    emit(sink, format_args!("nand: BANKS_TOTAL: {}", g.banks_total));
    emit(sink, format_args!("nand: BLOCKS_PER_BANK: {}", g.blocks_per_bank));
    emit(sink, format_args!("nand: SUBLKS_TOTAL: {}", g.sub_blocks_total));
    emit(sink, format_args!("nand: USER_SUBLKS_TOTAL: {}", g.user_sub_blocks_total));
    emit(sink, format_args!("nand: PAGES_PER_SUBLK: {}", g.pages_per_sub_block));
    emit(sink, format_args!("nand: PAGES_PER_BANK: {}", g.pages_per_bank));
    emit(sink, format_args!("nand: SECTORS_PER_PAGE: {}", g.sectors_per_page));
    emit(sink, format_args!("nand: BYTES_PER_SPARE: {}", g.bytes_per_spare));
}
