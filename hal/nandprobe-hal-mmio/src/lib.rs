//! Memory-mapped implementations of the `nandprobe-hal` traits
//!
//! - [`MmioRegisters`] - Volatile access to a register window
//! - [`MmioClockGates`] - Gate bits in a clock controller window
//! - `EmbassyTimer` - Timebase on the embassy time driver (feature `embassy-time`)

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod registers;
#[cfg(feature = "embassy-time")]
pub mod timer;

pub use clock::MmioClockGates;
pub use registers::MmioRegisters;
#[cfg(feature = "embassy-time")]
pub use timer::EmbassyTimer;
