//! NAND controller bring-up drivers
//!
//! This crate drives the controller through the collaborator traits of
//! `nandprobe-hal`:
//!
//! - Status register polling with timeouts
//! - Per-bank reset sequence
//! - Per-bank probe state machine (reset, read ID, catalog match)
//! - Controller bring-up across all banks and parameter derivation

#![no_std]
#![deny(unsafe_code)]

pub mod bringup;
pub mod probe;
pub mod reset;
pub mod wait;

#[cfg(test)]
mod sim;

pub use bringup::{BringupError, ControllerBringup, ControllerParameters};
pub use probe::{BankProbe, ProbeOutcome, ProbeReport, ProbeStage, ProbeState, StageTimeouts};
pub use reset::BankReset;
pub use wait::{StatusFlag, Timeout, WaitEngine};
