//! Register window abstraction
//!
//! The controller owns exactly one implementation of this trait and only
//! uses it while holding its lock, so implementations need no locking of
//! their own.

/// 32-bit memory-mapped register window of one controller instance
pub trait RegisterAccess {
    /// Base address of the window (for diagnostics)
    fn base(&self) -> usize;

    /// Read the register at `offset` from the base
    fn read32(&mut self, offset: u32) -> u32;

    /// Write `value` to the register at `offset` from the base
    fn write32(&mut self, offset: u32, value: u32);

    /// Read-modify-write setting `bits`
    fn set_bits32(&mut self, offset: u32, bits: u32) {
        let value = self.read32(offset);
        self.write32(offset, value | bits);
    }

    /// Read-modify-write clearing `bits`
    fn clear_bits32(&mut self, offset: u32, bits: u32) {
        let value = self.read32(offset);
        self.write32(offset, value & !bits);
    }
}
