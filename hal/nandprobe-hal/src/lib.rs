//! nandprobe Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the bring-up core calls into.
//! Chip-specific crates provide the implementations, tests provide mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  nandprobe-drivers (bring-up, probe)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  nandprobe-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ nandprobe-hal-│       │  test mocks   │
//! │     mmio      │       │  (simulator)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`registers::RegisterAccess`] - 32-bit register window
//! - [`clock::ClockService`] - Clock gates and bus frequency
//! - [`timer::MonotonicTimer`] - Microsecond timebase
//! - [`diag::DiagnosticSink`] - Line-oriented diagnostics
//! - [`buffer::BufferAllocator`] - Working buffer allocation

#![no_std]
#![deny(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod buffer;
pub mod clock;
pub mod diag;
pub mod registers;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use buffer::BufferAllocator;
#[cfg(feature = "alloc")]
pub use buffer::HeapAllocator;
pub use clock::{ClockGate, ClockService};
pub use diag::{DiagnosticSink, NullSink};
pub use registers::RegisterAccess;
pub use timer::MonotonicTimer;
