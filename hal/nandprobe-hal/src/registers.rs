//! Register window abstractions
//!
//! The controller is reached through a fixed memory-mapped window. Offsets
//! passed to these methods are relative to the start of that window.

/// 32-bit register access over a memory-mapped window
pub trait RegisterAccess {
    /// Read the register at `offset`
    fn read32(&mut self, offset: u32) -> u32;

    /// Write `value` to the register at `offset`
    fn write32(&mut self, offset: u32, value: u32);

    /// Read-modify-write the register at `offset`
    fn modify32<F>(&mut self, offset: u32, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read32(offset);
        self.write32(offset, f(value));
    }
}

impl<R: RegisterAccess + ?Sized> RegisterAccess for &mut R {
    fn read32(&mut self, offset: u32) -> u32 {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: u32, value: u32) {
        (**self).write32(offset, value)
    }
}
