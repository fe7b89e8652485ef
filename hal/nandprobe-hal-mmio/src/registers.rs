//! Volatile register window

use core::ptr;

use nandprobe_hal::RegisterAccess;

/// Register window at a fixed physical address
pub struct MmioRegisters {
    base: *mut u32,
}

impl MmioRegisters {
    /// Create a window starting at `base`
    ///
    /// # Safety
    ///
    /// `base` must point to a mapped, 4-byte aligned register block that
    /// covers every offset accessed through this window, and nothing else
    /// may access that block while the window exists.
    #[allow(unsafe_code)]
    pub unsafe fn new(base: usize) -> Self {
        Self {
            base: base as *mut u32,
        }
    }

    fn register(&self, offset: u32) -> *mut u32 {
        self.base.wrapping_byte_add(offset as usize)
    }
}

#[allow(unsafe_code)]
impl RegisterAccess for MmioRegisters {
    fn read32(&mut self, offset: u32) -> u32 {
        // SAFETY: covered by the contract of `MmioRegisters::new`
        unsafe { ptr::read_volatile(self.register(offset)) }
    }

    fn write32(&mut self, offset: u32, value: u32) {
        // SAFETY: covered by the contract of `MmioRegisters::new`
        unsafe { ptr::write_volatile(self.register(offset), value) }
    }
}
