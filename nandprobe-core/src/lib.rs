//! Board-agnostic core logic for NAND controller bring-up
//!
//! This crate contains everything that does not touch hardware:
//!
//! - Static catalog of supported flash devices
//! - Bank table bookkeeping for the probing pass
//! - Controller configuration and register layout
//! - Timing register derivation from the bus clock
//! - Geometry and translation-layer reserve derivation
//! - Handoff encoding of the derived parameters (with `serde`)

#![no_std]
#![deny(unsafe_code)]

pub mod bank;
pub mod catalog;
pub mod config;
pub mod geometry;
#[cfg(feature = "serde")]
pub mod handoff;
pub mod params;
pub mod timing;

pub use bank::{BankSlot, BankTable};
pub use catalog::{lookup, DeviceDescriptor};
pub use config::{ConfigError, ControllerConfig, RegisterMap, MAX_BANKS};
pub use geometry::{FtlReserve, Geometry, SECTOR_SIZE};
pub use params::DeviceParameters;
pub use timing::{EccSelection, TimingSettings};
