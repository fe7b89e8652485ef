//! Device parameters derived at bring-up
//!
//! Everything the storage stack needs from the probing pass, computed from
//! the matched descriptor, the valid bank count and the bus clock.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::catalog::DeviceDescriptor;
use crate::geometry::{FtlReserve, Geometry};
use crate::timing::{EccSelection, TimingSettings};

/// Derived controller and layout parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceParameters {
    /// Signature of the matched device
    pub signature: u32,
    /// Timing register values for the bus clock
    pub timings: TimingSettings,
    /// ECC mode selection
    pub ecc: EccSelection,
    /// Flash layout
    pub geometry: Geometry,
    /// Translation layer reserve
    pub ftl: FtlReserve,
}

impl DeviceParameters {
    /// Derive all parameters
    ///
    /// `previous_ecc` supplies the values kept when the device's timing
    /// class is not one the selector knows.
    pub fn derive(
        device: &DeviceDescriptor,
        banks_total: u32,
        bus_hz: u32,
        previous_ecc: EccSelection,
    ) -> Self {
        let geometry = Geometry::derive(device, banks_total);
        Self {
            signature: device.signature,
            timings: TimingSettings::derive(bus_hz, &device.timing),
            ecc: EccSelection::select(device, previous_ecc),
            ftl: FtlReserve::derive(&geometry),
            geometry,
        }
    }

    /// Number of banks carrying the device
    pub fn banks_total(&self) -> u32 {
        self.geometry.banks_total
    }
}
