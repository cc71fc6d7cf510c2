// Opcode Tables
//
// Two fixed 256-entry tables:
//   base     - opcodes 0x00-0xFF
//   extended - opcodes following the 0xCB prefix
//
// Each entry is a descriptor: mnemonic, operands, cycle cost and the handler
// implementing it. Operands are plain `Copy` values stored in the entry, so a
// handler only ever sees the operands it was registered with.
//
// Regular opcode blocks are decoded from their bit fields:
//   r8 index (bits 2-0 or 5-3): B=0, C=1, D=2, E=3, H=4, L=5, (HL)=6, A=7
//   r16 index (bits 5-4):       BC=0, DE=1, HL=2, SP=3 (AF for PUSH/POP)
//   cc index (bits 4-3):        NZ=0, Z=1, NC=2, C=3
//
// Undefined base opcodes (0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED,
// 0xF4, 0xFC, 0xFD) have no entry.

use std::fmt;
use std::sync::OnceLock;

use super::registers::{Flags, RegisterId};
use super::{cb_instructions as cb, instructions as ops, Cpu};

/// Prefix byte selecting the extended table
pub const CB_PREFIX: u8 = 0xCB;

/// Handler signature. Returns true when a conditional branch was taken.
pub type Handler = fn(&mut Cpu, Operands) -> bool;

/// Where an instruction reads or writes a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// 8- or 16-bit register
    Reg(RegisterId),
    /// Memory at the address held in a register pair: (BC), (DE), (HL)
    Indirect(RegisterId),
    /// (HL) then HL += 1
    HlIncrement,
    /// (HL) then HL -= 1
    HlDecrement,
    /// 8-bit immediate
    Imm8,
    /// 16-bit immediate, little-endian
    Imm16,
    /// Signed 8-bit immediate
    Offset,
    /// Memory at a 16-bit immediate address: (a16)
    Absolute,
    /// Memory at 0xFF00 + 8-bit immediate: (a8)
    HighPage,
    /// Memory at 0xFF00 + C
    HighC,
    /// Bit number for BIT/RES/SET
    Bit(u8),
    /// Fixed RST target
    Vector(u16),
}

impl Operand {
    /// Immediate bytes this operand consumes
    pub const fn immediate_len(self) -> u8 {
        match self {
            Operand::Imm8 | Operand::Offset | Operand::HighPage => 1,
            Operand::Imm16 | Operand::Absolute => 2,
            _ => 0,
        }
    }

    /// True when accessing the operand touches memory at HL
    pub const fn is_hl_memory(self) -> bool {
        matches!(self, Operand::Indirect(RegisterId::HL))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(id) => write!(f, "{}", id),
            Operand::Indirect(id) => write!(f, "({})", id),
            Operand::HlIncrement => f.write_str("(HL+)"),
            Operand::HlDecrement => f.write_str("(HL-)"),
            Operand::Imm8 => f.write_str("d8"),
            Operand::Imm16 => f.write_str("d16"),
            Operand::Offset => f.write_str("r8"),
            Operand::Absolute => f.write_str("(a16)"),
            Operand::HighPage => f.write_str("(a8)"),
            Operand::HighC => f.write_str("(C)"),
            Operand::Bit(n) => write!(f, "{}", n),
            Operand::Vector(addr) => write!(f, "{:02X}H", addr),
        }
    }
}

/// Branch conditions tested against Z and C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

impl Condition {
    const TABLE: [Condition; 4] = [
        Condition::NotZero,
        Condition::Zero,
        Condition::NotCarry,
        Condition::Carry,
    ];

    pub fn holds(self, flags: Flags) -> bool {
        match self {
            Condition::NotZero => !flags.contains(Flags::Z),
            Condition::Zero => flags.contains(Flags::Z),
            Condition::NotCarry => !flags.contains(Flags::C),
            Condition::Carry => flags.contains(Flags::C),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Condition::NotZero => "NZ",
            Condition::Zero => "Z",
            Condition::NotCarry => "NC",
            Condition::Carry => "C",
        })
    }
}

/// Operands bound to an entry at registration time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operands {
    pub condition: Option<Condition>,
    pub first: Option<Operand>,
    pub second: Option<Operand>,
}

impl Operands {
    pub const NONE: Operands = Operands {
        condition: None,
        first: None,
        second: None,
    };

    pub const fn one(first: Operand) -> Self {
        Self {
            condition: None,
            first: Some(first),
            second: None,
        }
    }

    pub const fn two(first: Operand, second: Operand) -> Self {
        Self {
            condition: None,
            first: Some(first),
            second: Some(second),
        }
    }

    pub const fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// First operand; the table guarantees it for handlers that ask
    pub fn dst(&self) -> Operand {
        match self.first {
            Some(op) => op,
            None => unreachable!("opcode registered without an operand"),
        }
    }

    /// Second operand; the table guarantees it for handlers that ask
    pub fn src(&self) -> Operand {
        match self.second {
            Some(op) => op,
            None => unreachable!("opcode registered without a second operand"),
        }
    }

    fn iter(&self) -> impl Iterator<Item = Operand> {
        self.first.into_iter().chain(self.second)
    }
}

/// One decoded instruction descriptor
#[derive(Clone, Copy)]
pub struct OpcodeEntry {
    pub mnemonic: &'static str,
    pub operands: Operands,
    /// Cost in T-states when no branch is taken
    pub cycles: u8,
    /// Extra T-states when a conditional branch is taken
    pub branch_cycles: u8,
    pub extended: bool,
    pub handler: Handler,
}

impl OpcodeEntry {
    fn new(mnemonic: &'static str, operands: Operands, cycles: u8, handler: Handler) -> Self {
        Self {
            mnemonic,
            operands,
            cycles,
            branch_cycles: 0,
            extended: false,
            handler,
        }
    }

    fn branching(mut self, extra: u8) -> Self {
        self.branch_cycles = extra;
        self
    }

    /// Cost of one execution
    pub fn cost(&self, taken: bool) -> u32 {
        if taken {
            self.cycles as u32 + self.branch_cycles as u32
        } else {
            self.cycles as u32
        }
    }

    /// Encoded size in bytes, prefix included
    pub fn length(&self) -> u8 {
        let prefix = if self.extended { 2 } else { 1 };
        prefix + self.operands.iter().map(Operand::immediate_len).sum::<u8>()
    }
}

impl fmt::Debug for OpcodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpcodeEntry")
            .field("mnemonic", &self.mnemonic)
            .field("operands", &self.operands)
            .field("cycles", &self.cycles)
            .field("branch_cycles", &self.branch_cycles)
            .field("extended", &self.extended)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for OpcodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic)?;
        let mut sep = " ";
        if let Some(cond) = self.operands.condition {
            write!(f, "{}{}", sep, cond)?;
            sep = ", ";
        }
        for op in self.operands.iter() {
            write!(f, "{}{}", sep, op)?;
            sep = ", ";
        }
        Ok(())
    }
}

/// The two dispatch tables
pub struct OpcodeTable {
    base: [Option<OpcodeEntry>; 256],
    extended: [Option<OpcodeEntry>; 256],
}

/// Operand for an r8 index
const fn r8(idx: u8) -> Operand {
    match idx & 0x07 {
        0 => Operand::Reg(RegisterId::B),
        1 => Operand::Reg(RegisterId::C),
        2 => Operand::Reg(RegisterId::D),
        3 => Operand::Reg(RegisterId::E),
        4 => Operand::Reg(RegisterId::H),
        5 => Operand::Reg(RegisterId::L),
        6 => Operand::Indirect(RegisterId::HL),
        _ => Operand::Reg(RegisterId::A),
    }
}

/// Register pair for an r16 index
const fn r16(idx: u8) -> RegisterId {
    match idx & 0x03 {
        0 => RegisterId::BC,
        1 => RegisterId::DE,
        2 => RegisterId::HL,
        _ => RegisterId::SP,
    }
}

/// Register pair for an r16 index in PUSH/POP
const fn r16_stack(idx: u8) -> RegisterId {
    match idx & 0x03 {
        0 => RegisterId::BC,
        1 => RegisterId::DE,
        2 => RegisterId::HL,
        _ => RegisterId::AF,
    }
}

const A: Operand = Operand::Reg(RegisterId::A);
const HL: Operand = Operand::Reg(RegisterId::HL);
const SP: Operand = Operand::Reg(RegisterId::SP);

impl OpcodeTable {
    /// Shared, fully populated tables
    pub fn get() -> &'static OpcodeTable {
        static TABLE: OnceLock<OpcodeTable> = OnceLock::new();
        TABLE.get_or_init(OpcodeTable::build)
    }

    /// Base table lookup
    pub fn base(&self, opcode: u8) -> Option<&OpcodeEntry> {
        self.base[opcode as usize].as_ref()
    }

    /// Extended (0xCB-prefixed) table lookup
    pub fn extended(&self, opcode: u8) -> Option<&OpcodeEntry> {
        self.extended[opcode as usize].as_ref()
    }

    fn build() -> Self {
        let mut table = Self {
            base: [None; 256],
            extended: [None; 256],
        };
        table.register_base();
        table.register_extended();
        table
    }

    fn put(&mut self, opcode: u8, entry: OpcodeEntry) {
        debug_assert!(self.base[opcode as usize].is_none(), "0x{:02X} registered twice", opcode);
        self.base[opcode as usize] = Some(entry);
    }

    fn register_base(&mut self) {
        use OpcodeEntry as E;
        use Operand::*;
        use Operands as O;

        // ========== Control ==========
        self.put(0x00, E::new("NOP", O::NONE, 4, ops::nop));
        self.put(0x10, E::new("STOP", O::one(Imm8), 4, ops::stop));
        self.put(0x76, E::new("HALT", O::NONE, 4, ops::halt));
        self.put(0xF3, E::new("DI", O::NONE, 4, ops::di));
        self.put(0xFB, E::new("EI", O::NONE, 4, ops::ei));

        // ========== 8-bit loads ==========
        // LD r, r' (0x40-0x7F, 0x76 is HALT)
        for opcode in 0x40..=0x7Fu8 {
            if opcode == 0x76 {
                continue;
            }
            let dst = r8(opcode >> 3);
            let src = r8(opcode);
            let cycles = if dst.is_hl_memory() || src.is_hl_memory() { 8 } else { 4 };
            self.put(opcode, E::new("LD", O::two(dst, src), cycles, ops::ld8));
        }

        // LD r, d8
        for idx in 0..8u8 {
            let dst = r8(idx);
            let cycles = if dst.is_hl_memory() { 12 } else { 8 };
            self.put(0x06 | (idx << 3), E::new("LD", O::two(dst, Imm8), cycles, ops::ld8));
        }

        // LD (rr), A / LD A, (rr)
        let indirect = [
            Indirect(RegisterId::BC),
            Indirect(RegisterId::DE),
            HlIncrement,
            HlDecrement,
        ];
        for (idx, mem) in (0u8..).zip(indirect) {
            self.put(0x02 | (idx << 4), E::new("LD", O::two(mem, A), 8, ops::ld8));
            self.put(0x0A | (idx << 4), E::new("LD", O::two(A, mem), 8, ops::ld8));
        }

        self.put(0xEA, E::new("LD", O::two(Absolute, A), 16, ops::ld8));
        self.put(0xFA, E::new("LD", O::two(A, Absolute), 16, ops::ld8));
        self.put(0xE0, E::new("LDH", O::two(HighPage, A), 12, ops::ld8));
        self.put(0xF0, E::new("LDH", O::two(A, HighPage), 12, ops::ld8));
        self.put(0xE2, E::new("LD", O::two(HighC, A), 8, ops::ld8));
        self.put(0xF2, E::new("LD", O::two(A, HighC), 8, ops::ld8));

        // ========== 16-bit loads ==========
        for idx in 0..4u8 {
            let rr = Reg(r16(idx));
            self.put(0x01 | (idx << 4), E::new("LD", O::two(rr, Imm16), 12, ops::ld16));
            self.put(0xC1 | (idx << 4), E::new("POP", O::one(Reg(r16_stack(idx))), 12, ops::pop));
            self.put(0xC5 | (idx << 4), E::new("PUSH", O::one(Reg(r16_stack(idx))), 16, ops::push));
        }
        self.put(0x08, E::new("LD", O::two(Absolute, SP), 20, ops::ld16));
        self.put(0xF9, E::new("LD", O::two(SP, HL), 8, ops::ld16));
        self.put(0xF8, E::new("LD", O::two(HL, Offset), 12, ops::ld_hl_sp_offset));

        // ========== 8-bit arithmetic / logic ==========
        let alu: [(&'static str, Handler); 8] = [
            ("ADD", ops::add),
            ("ADC", ops::adc),
            ("SUB", ops::sub),
            ("SBC", ops::sbc),
            ("AND", ops::and),
            ("XOR", ops::xor),
            ("OR", ops::or),
            ("CP", ops::cp),
        ];
        for (idx, (mnemonic, handler)) in (0u8..).zip(alu) {
            // ALU A, r (0x80-0xBF)
            for reg in 0..8u8 {
                let src = r8(reg);
                let cycles = if src.is_hl_memory() { 8 } else { 4 };
                self.put(0x80 | (idx << 3) | reg, E::new(mnemonic, O::two(A, src), cycles, handler));
            }
            // ALU A, d8
            self.put(0xC6 | (idx << 3), E::new(mnemonic, O::two(A, Imm8), 8, handler));
        }

        // INC r / DEC r
        for idx in 0..8u8 {
            let target = r8(idx);
            let cycles = if target.is_hl_memory() { 12 } else { 4 };
            self.put(0x04 | (idx << 3), E::new("INC", O::one(target), cycles, ops::inc8));
            self.put(0x05 | (idx << 3), E::new("DEC", O::one(target), cycles, ops::dec8));
        }

        // ========== 16-bit arithmetic ==========
        for idx in 0..4u8 {
            let rr = Reg(r16(idx));
            self.put(0x03 | (idx << 4), E::new("INC", O::one(rr), 8, ops::inc16));
            self.put(0x0B | (idx << 4), E::new("DEC", O::one(rr), 8, ops::dec16));
            self.put(0x09 | (idx << 4), E::new("ADD", O::two(HL, rr), 8, ops::add_hl));
        }
        self.put(0xE8, E::new("ADD", O::two(SP, Offset), 16, ops::add_sp));

        // ========== Accumulator rotates and misc ==========
        self.put(0x07, E::new("RLCA", O::NONE, 4, ops::rlca));
        self.put(0x0F, E::new("RRCA", O::NONE, 4, ops::rrca));
        self.put(0x17, E::new("RLA", O::NONE, 4, ops::rla));
        self.put(0x1F, E::new("RRA", O::NONE, 4, ops::rra));
        self.put(0x27, E::new("DAA", O::NONE, 4, ops::daa));
        self.put(0x2F, E::new("CPL", O::NONE, 4, ops::cpl));
        self.put(0x37, E::new("SCF", O::NONE, 4, ops::scf));
        self.put(0x3F, E::new("CCF", O::NONE, 4, ops::ccf));

        // ========== Jumps, calls, returns ==========
        self.put(0xC3, E::new("JP", O::one(Imm16), 16, ops::jp));
        self.put(0xE9, E::new("JP", O::one(HL), 4, ops::jp));
        self.put(0x18, E::new("JR", O::one(Offset), 12, ops::jr));
        self.put(0xCD, E::new("CALL", O::one(Imm16), 24, ops::call));
        self.put(0xC9, E::new("RET", O::NONE, 16, ops::ret));
        self.put(0xD9, E::new("RETI", O::NONE, 16, ops::reti));

        for (idx, cond) in (0u8..).zip(Condition::TABLE) {
            let cc = idx << 3;
            self.put(0x20 | cc, E::new("JR", O::one(Offset).when(cond), 8, ops::jr).branching(4));
            self.put(0xC2 | cc, E::new("JP", O::one(Imm16).when(cond), 12, ops::jp).branching(4));
            self.put(0xC4 | cc, E::new("CALL", O::one(Imm16).when(cond), 12, ops::call).branching(12));
            self.put(0xC0 | cc, E::new("RET", O::NONE.when(cond), 8, ops::ret).branching(12));
        }

        // RST n
        for idx in 0..8u8 {
            let vector = (idx as u16) * 0x08;
            self.put(0xC7 | (idx << 3), E::new("RST", O::one(Vector(vector)), 16, ops::rst));
        }
    }

    fn register_extended(&mut self) {
        let shifts: [(&'static str, Handler); 8] = [
            ("RLC", cb::rlc),
            ("RRC", cb::rrc),
            ("RL", cb::rl),
            ("RR", cb::rr),
            ("SLA", cb::sla),
            ("SRA", cb::sra),
            ("SWAP", cb::swap),
            ("SRL", cb::srl),
        ];

        for opcode in 0..=0xFFu8 {
            let target = r8(opcode);
            let bit = (opcode >> 3) & 0x07;
            let hl = target.is_hl_memory();

            let entry = match opcode >> 6 {
                // Rotate / shift
                0 => {
                    let (mnemonic, handler) = shifts[bit as usize];
                    OpcodeEntry::new(mnemonic, Operands::one(target), if hl { 16 } else { 8 }, handler)
                }
                // BIT doesn't write back
                1 => OpcodeEntry::new(
                    "BIT",
                    Operands::two(Operand::Bit(bit), target),
                    if hl { 12 } else { 8 },
                    cb::bit,
                ),
                2 => OpcodeEntry::new(
                    "RES",
                    Operands::two(Operand::Bit(bit), target),
                    if hl { 16 } else { 8 },
                    cb::res,
                ),
                _ => OpcodeEntry::new(
                    "SET",
                    Operands::two(Operand::Bit(bit), target),
                    if hl { 16 } else { 8 },
                    cb::set,
                ),
            };

            self.extended[opcode as usize] = Some(OpcodeEntry {
                extended: true,
                ..entry
            });
        }
    }
}
