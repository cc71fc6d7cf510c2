// CPU Registers
//
// The LR35902 has the following registers:
//
// 8-bit registers: A, F, B, C, D, E, H, L
// These can be paired into 16-bit registers: AF, BC, DE, HL
//
// A (Accumulator): Main register for arithmetic operations
// F (Flags): Contains CPU flags (Z, N, H, C)
// B, C, D, E, H, L: General purpose registers
//
// Special 16-bit registers:
// SP (Stack Pointer): Points to current stack position
// PC (Program Counter): Address of next instruction
//
// Register pairs are views, not storage: the first-named register is the
// high byte (H in HL), the second the low byte.
//
// Flag Register (F) layout:
// Bit 7 6 5 4 3 2 1 0
//     Z N H C 0 0 0 0

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::bits::{ByteValue, WordValue};
use crate::error::CpuError;

bitflags! {
    /// Condition bits packed into the high nibble of F
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        /// Zero - set when result is 0
        const Z = 0b1000_0000;
        /// Subtract - set after subtraction
        const N = 0b0100_0000;
        /// Half carry - carry from bit 3 (or bit 11 for 16-bit adds)
        const H = 0b0010_0000;
        /// Carry - carry from bit 7 (or bit 15), or the bit shifted out
        const C = 0b0001_0000;
    }
}

/// Register identifiers accepted by [`RegisterFile::get`] / [`RegisterFile::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    PC,
    SP,
    AF,
    BC,
    DE,
    HL,
}

impl RegisterId {
    /// Every identifier, in name-table order
    pub const ALL: [RegisterId; 13] = [
        RegisterId::A,
        RegisterId::B,
        RegisterId::C,
        RegisterId::D,
        RegisterId::E,
        RegisterId::H,
        RegisterId::L,
        RegisterId::PC,
        RegisterId::SP,
        RegisterId::AF,
        RegisterId::BC,
        RegisterId::DE,
        RegisterId::HL,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            RegisterId::A => "A",
            RegisterId::B => "B",
            RegisterId::C => "C",
            RegisterId::D => "D",
            RegisterId::E => "E",
            RegisterId::H => "H",
            RegisterId::L => "L",
            RegisterId::PC => "PC",
            RegisterId::SP => "SP",
            RegisterId::AF => "AF",
            RegisterId::BC => "BC",
            RegisterId::DE => "DE",
            RegisterId::HL => "HL",
        }
    }
}

impl FromStr for RegisterId {
    type Err = CpuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegisterId::ALL
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CpuError::InvalidRegister(s.to_string()))
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CPU Registers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    a: ByteValue,
    f: ByteValue,
    b: ByteValue,
    c: ByteValue,
    d: ByteValue,
    e: ByteValue,
    h: ByteValue,
    l: ByteValue,
    sp: WordValue,
    pc: WordValue,
}

impl RegisterFile {
    /// All registers zeroed
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers as the DMG boot ROM leaves them
    /// Reference: Pan Docs - Power Up Sequence
    pub fn post_boot() -> Self {
        let mut regs = Self::new();
        regs.set(RegisterId::AF, 0x01B0u16);
        regs.set(RegisterId::BC, 0x0013u16);
        regs.set(RegisterId::DE, 0x00D8u16);
        regs.set(RegisterId::HL, 0x014Du16);
        regs.set(RegisterId::SP, 0xFFFEu16);
        regs.set(RegisterId::PC, 0x0100u16);
        regs
    }

    /// Read a register; 8-bit registers are zero-extended
    pub fn get(&self, id: RegisterId) -> u16 {
        match id {
            RegisterId::A => self.a.get() as u16,
            RegisterId::B => self.b.get() as u16,
            RegisterId::C => self.c.get() as u16,
            RegisterId::D => self.d.get() as u16,
            RegisterId::E => self.e.get() as u16,
            RegisterId::H => self.h.get() as u16,
            RegisterId::L => self.l.get() as u16,
            RegisterId::PC => self.pc.get(),
            RegisterId::SP => self.sp.get(),
            RegisterId::AF => WordValue::from_bytes(self.a.get(), self.f.get()).get(),
            RegisterId::BC => WordValue::from_bytes(self.b.get(), self.c.get()).get(),
            RegisterId::DE => WordValue::from_bytes(self.d.get(), self.e.get()).get(),
            RegisterId::HL => WordValue::from_bytes(self.h.get(), self.l.get()).get(),
        }
    }

    /// Write a register; the value is normalized to the register's width
    pub fn set(&mut self, id: RegisterId, value: impl Into<WordValue>) {
        let word: WordValue = value.into();
        let byte = ByteValue::new(word.low());
        match id {
            RegisterId::A => self.a = byte,
            RegisterId::B => self.b = byte,
            RegisterId::C => self.c = byte,
            RegisterId::D => self.d = byte,
            RegisterId::E => self.e = byte,
            RegisterId::H => self.h = byte,
            RegisterId::L => self.l = byte,
            RegisterId::PC => self.pc = word,
            RegisterId::SP => self.sp = word,
            RegisterId::AF => {
                self.a = ByteValue::new(word.high());
                self.f = ByteValue::new(word.low() & 0xF0); // Lower 4 bits always 0
            }
            RegisterId::BC => {
                self.b = ByteValue::new(word.high());
                self.c = byte;
            }
            RegisterId::DE => {
                self.d = ByteValue::new(word.high());
                self.e = byte;
            }
            RegisterId::HL => {
                self.h = ByteValue::new(word.high());
                self.l = byte;
            }
        }
    }

    /// Decode the flags from F
    pub fn flags(&self) -> Flags {
        Flags::from_bits_truncate(self.f.get())
    }

    /// Encode the flags into F
    pub fn set_flags(&mut self, flags: Flags) {
        self.f = ByteValue::new(flags.bits());
    }

    pub fn flag(&self, flag: Flags) -> bool {
        self.flags().contains(flag)
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AF={:04X} BC={:04X} DE={:04X} HL={:04X} SP={:04X} PC={:04X}",
            self.get(RegisterId::AF),
            self.get(RegisterId::BC),
            self.get(RegisterId::DE),
            self.get(RegisterId::HL),
            self.get(RegisterId::SP),
            self.get(RegisterId::PC),
        )
    }
}
