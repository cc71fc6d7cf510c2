// Memory Bus
//
// The LR35902 has a 16-bit address bus (64KB addressable space).
// At this layer the whole space is one flat array of byte cells; memory-mapped
// peripherals (video, audio, timer, joypad) live outside the core and observe
// or inject values through the read/write hooks.
//
// Conventional layout the ROM image is written over, starting at 0x0000:
// 0x0000-0x00FF: Restart and interrupt vectors
// 0x0100-0x014F: Cartridge header (entry point at 0x0100)
// 0x0150-0x7FFF: Cartridge program
// 0x8000-0xFFFF: VRAM, external RAM, WRAM, OAM, I/O, HRAM, IE
//
// 16-bit values are little-endian: low byte at addr, high byte at addr+1.

use crate::bits::{ByteValue, WordValue};
use crate::error::CpuError;

/// Size of the address space in bytes
pub const MEMORY_SIZE: usize = 0x1_0000;

/// Memory Bus - handles all memory read/write operations
#[derive(Clone, PartialEq, Eq)]
pub struct MemoryBus {
    cells: Box<[ByteValue]>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            cells: vec![ByteValue::ZERO; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Zero every cell
    pub fn clear(&mut self) {
        self.cells.fill(ByteValue::ZERO);
    }

    /// Copy a ROM image into memory starting at 0x0000
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), CpuError> {
        if image.len() > MEMORY_SIZE {
            return Err(CpuError::ImageTooLarge { len: image.len() });
        }
        for (cell, byte) in self.cells.iter_mut().zip(image) {
            *cell = ByteValue::new(*byte);
        }
        Ok(())
    }

    /// Read a byte from the given address
    pub fn read(&self, addr: impl Into<WordValue>) -> u8 {
        self.cells[Self::index(addr)].get()
    }

    /// Write a byte to the given address
    pub fn write(&mut self, addr: impl Into<WordValue>, value: impl Into<ByteValue>) {
        self.cells[Self::index(addr)] = value.into();
    }

    /// Read a 16-bit value (little-endian)
    pub fn read16(&self, addr: impl Into<WordValue>) -> u16 {
        let addr = addr.into();
        let lo = self.read(addr);
        let hi = self.read(addr.offset(1));
        WordValue::from_bytes(hi, lo).get()
    }

    /// Write a 16-bit value (little-endian)
    pub fn write16(&mut self, addr: impl Into<WordValue>, value: impl Into<WordValue>) {
        let addr = addr.into();
        let value = value.into();
        self.write(addr, value.low());
        self.write(addr.offset(1), value.high());
    }

    fn index(addr: impl Into<WordValue>) -> usize {
        addr.into().get() as usize
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBus")
            .field("size", &self.cells.len())
            .finish()
    }
}
