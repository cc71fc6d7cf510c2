// CPU Instructions
//
// Handlers for the base opcode table (0x00-0xFF).
// Each handler receives the operands bound to its table entry, reads any
// immediate bytes at PC, applies its effect and returns whether a
// conditional branch was taken (the dispatcher turns that into a cycle cost).
//
// Registers are only ever touched through RegisterFile::get/set, flags only
// through flags()/set_flags() as a read-modify-write.
//
// Stack layout (grows downward):
//   push: SP -= 1, write high byte, SP -= 1, write low byte
//   pop:  read low byte, SP += 1, read high byte, SP += 1

use super::alu;
use super::opcodes::{Operand, Operands};
use super::registers::{Flags, RegisterId};
use super::{Cpu, CpuState};

impl Cpu {
    // ========== Operand access ==========

    /// Fetch the next byte from PC and increment PC
    pub(super) fn fetch(&mut self) -> u8 {
        let pc = self.regs.get(RegisterId::PC);
        let byte = self.bus.read(pc);
        self.regs.set(RegisterId::PC, pc.wrapping_add(1));
        byte
    }

    /// Fetch a 16-bit value (little-endian)
    pub(super) fn fetch16(&mut self) -> u16 {
        let lo = self.fetch() as u16;
        let hi = self.fetch() as u16;
        (hi << 8) | lo
    }

    /// Resolve a memory operand to its address, consuming immediates
    fn address_of(&mut self, operand: Operand) -> u16 {
        match operand {
            Operand::Indirect(pair) => self.regs.get(pair),
            Operand::HlIncrement => {
                let hl = self.regs.get(RegisterId::HL);
                self.regs.set(RegisterId::HL, hl.wrapping_add(1));
                hl
            }
            Operand::HlDecrement => {
                let hl = self.regs.get(RegisterId::HL);
                self.regs.set(RegisterId::HL, hl.wrapping_sub(1));
                hl
            }
            Operand::Absolute => self.fetch16(),
            Operand::HighPage => 0xFF00 | self.fetch() as u16,
            Operand::HighC => 0xFF00 | self.regs.get(RegisterId::C),
            other => unreachable!("{} is not a memory operand", other),
        }
    }

    pub(super) fn read8(&mut self, operand: Operand) -> u8 {
        match operand {
            Operand::Reg(id) => self.regs.get(id) as u8,
            Operand::Imm8 => self.fetch(),
            _ => {
                let addr = self.address_of(operand);
                self.bus.read(addr)
            }
        }
    }

    pub(super) fn write8(&mut self, operand: Operand, value: u8) {
        match operand {
            Operand::Reg(id) => self.regs.set(id, value),
            _ => {
                let addr = self.address_of(operand);
                self.bus.write(addr, value);
            }
        }
    }

    fn read16(&mut self, operand: Operand) -> u16 {
        match operand {
            Operand::Reg(id) => self.regs.get(id),
            Operand::Imm16 => self.fetch16(),
            other => unreachable!("{} is not a 16-bit source", other),
        }
    }

    fn write16(&mut self, operand: Operand, value: u16) {
        match operand {
            Operand::Reg(id) => self.regs.set(id, value),
            Operand::Absolute => {
                let addr = self.fetch16();
                self.bus.write16(addr, value);
            }
            other => unreachable!("{} is not a 16-bit destination", other),
        }
    }

    // ========== Stack ==========

    fn push_word(&mut self, value: u16) {
        let sp = self.regs.get(RegisterId::SP).wrapping_sub(1);
        self.bus.write(sp, (value >> 8) as u8);
        let sp = sp.wrapping_sub(1);
        self.bus.write(sp, value as u8);
        self.regs.set(RegisterId::SP, sp);
    }

    fn pop_word(&mut self) -> u16 {
        let sp = self.regs.get(RegisterId::SP);
        let lo = self.bus.read(sp) as u16;
        let sp = sp.wrapping_add(1);
        let hi = self.bus.read(sp) as u16;
        self.regs.set(RegisterId::SP, sp.wrapping_add(1));
        (hi << 8) | lo
    }

    /// Unconditional entries always pass
    fn condition_met(&self, operands: Operands) -> bool {
        operands
            .condition
            .map_or(true, |cond| cond.holds(self.regs.flags()))
    }

    fn accumulator(&self) -> u8 {
        self.regs.get(RegisterId::A) as u8
    }

    /// Store an ALU result in A along with its flags
    fn store_accumulator(&mut self, (result, flags): (u8, Flags)) {
        self.regs.set(RegisterId::A, result);
        self.regs.set_flags(flags);
    }
}

// ========== Control ==========

pub(super) fn nop(_cpu: &mut Cpu, _ops: Operands) -> bool {
    false
}

pub(super) fn stop(cpu: &mut Cpu, _ops: Operands) -> bool {
    cpu.fetch(); // STOP is followed by a padding byte
    cpu.enter(CpuState::Stopped);
    false
}

pub(super) fn halt(cpu: &mut Cpu, _ops: Operands) -> bool {
    cpu.enter(CpuState::Halted);
    false
}

pub(super) fn di(cpu: &mut Cpu, _ops: Operands) -> bool {
    cpu.ime = false;
    cpu.ime_scheduled = false;
    false
}

pub(super) fn ei(cpu: &mut Cpu, _ops: Operands) -> bool {
    // Takes effect after the next instruction
    cpu.ime_scheduled = true;
    false
}

// ========== Loads ==========

pub(super) fn ld8(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    cpu.write8(ops.dst(), value);
    false
}

pub(super) fn ld16(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read16(ops.src());
    cpu.write16(ops.dst(), value);
    false
}

/// LD HL, SP+r8
pub(super) fn ld_hl_sp_offset(cpu: &mut Cpu, _ops: Operands) -> bool {
    let offset = cpu.fetch() as i8;
    let (result, flags) = alu::add_sp_offset(cpu.regs.get(RegisterId::SP), offset);
    cpu.regs.set(RegisterId::HL, result);
    cpu.regs.set_flags(flags);
    false
}

// ========== Arithmetic ==========

/// ADD SP, r8
pub(super) fn add_sp(cpu: &mut Cpu, _ops: Operands) -> bool {
    let offset = cpu.fetch() as i8;
    let (result, flags) = alu::add_sp_offset(cpu.regs.get(RegisterId::SP), offset);
    cpu.regs.set(RegisterId::SP, result);
    cpu.regs.set_flags(flags);
    false
}

pub(super) fn inc8(cpu: &mut Cpu, ops: Operands) -> bool {
    let target = ops.dst();
    let value = cpu.read8(target);
    let (result, flags) = alu::inc8(value, cpu.regs.flags());
    cpu.write8(target, result);
    cpu.regs.set_flags(flags);
    false
}

pub(super) fn dec8(cpu: &mut Cpu, ops: Operands) -> bool {
    let target = ops.dst();
    let value = cpu.read8(target);
    let (result, flags) = alu::dec8(value, cpu.regs.flags());
    cpu.write8(target, result);
    cpu.regs.set_flags(flags);
    false
}

/// INC rr - flags not affected
pub(super) fn inc16(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read16(ops.dst());
    cpu.write16(ops.dst(), value.wrapping_add(1));
    false
}

/// DEC rr - flags not affected
pub(super) fn dec16(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read16(ops.dst());
    cpu.write16(ops.dst(), value.wrapping_sub(1));
    false
}

pub(super) fn add_hl(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read16(ops.src());
    let hl = cpu.regs.get(RegisterId::HL);
    let (result, flags) = alu::add16(hl, value, cpu.regs.flags());
    cpu.regs.set(RegisterId::HL, result);
    cpu.regs.set_flags(flags);
    false
}

pub(super) fn add(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let result = alu::add8(cpu.accumulator(), value, false);
    cpu.store_accumulator(result);
    false
}

pub(super) fn adc(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let carry = cpu.regs.flag(Flags::C);
    let result = alu::add8(cpu.accumulator(), value, carry);
    cpu.store_accumulator(result);
    false
}

pub(super) fn sub(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let result = alu::sub8(cpu.accumulator(), value, false);
    cpu.store_accumulator(result);
    false
}

pub(super) fn sbc(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let carry = cpu.regs.flag(Flags::C);
    let result = alu::sub8(cpu.accumulator(), value, carry);
    cpu.store_accumulator(result);
    false
}

pub(super) fn and(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let result = alu::and8(cpu.accumulator(), value);
    cpu.store_accumulator(result);
    false
}

pub(super) fn xor(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let result = alu::xor8(cpu.accumulator(), value);
    cpu.store_accumulator(result);
    false
}

pub(super) fn or(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let result = alu::or8(cpu.accumulator(), value);
    cpu.store_accumulator(result);
    false
}

/// CP - subtraction that only keeps the flags
pub(super) fn cp(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let (_, flags) = alu::sub8(cpu.accumulator(), value, false);
    cpu.regs.set_flags(flags);
    false
}

// ========== Accumulator rotates / misc ==========
// RLCA, RRCA, RLA and RRA always clear Z, unlike their CB counterparts.

pub(super) fn rlca(cpu: &mut Cpu, _ops: Operands) -> bool {
    let (result, flags) = alu::rlc(cpu.accumulator());
    cpu.store_accumulator((result, flags - Flags::Z));
    false
}

pub(super) fn rrca(cpu: &mut Cpu, _ops: Operands) -> bool {
    let (result, flags) = alu::rrc(cpu.accumulator());
    cpu.store_accumulator((result, flags - Flags::Z));
    false
}

pub(super) fn rla(cpu: &mut Cpu, _ops: Operands) -> bool {
    let carry = cpu.regs.flag(Flags::C);
    let (result, flags) = alu::rl(cpu.accumulator(), carry);
    cpu.store_accumulator((result, flags - Flags::Z));
    false
}

pub(super) fn rra(cpu: &mut Cpu, _ops: Operands) -> bool {
    let carry = cpu.regs.flag(Flags::C);
    let (result, flags) = alu::rr(cpu.accumulator(), carry);
    cpu.store_accumulator((result, flags - Flags::Z));
    false
}

pub(super) fn daa(cpu: &mut Cpu, _ops: Operands) -> bool {
    let result = alu::daa(cpu.accumulator(), cpu.regs.flags());
    cpu.store_accumulator(result);
    false
}

pub(super) fn cpl(cpu: &mut Cpu, _ops: Operands) -> bool {
    let result = alu::cpl(cpu.accumulator(), cpu.regs.flags());
    cpu.store_accumulator(result);
    false
}

pub(super) fn scf(cpu: &mut Cpu, _ops: Operands) -> bool {
    let flags = alu::scf(cpu.regs.flags());
    cpu.regs.set_flags(flags);
    false
}

pub(super) fn ccf(cpu: &mut Cpu, _ops: Operands) -> bool {
    let flags = alu::ccf(cpu.regs.flags());
    cpu.regs.set_flags(flags);
    false
}

// ========== Control flow ==========
// Immediate operands are consumed whether or not the branch is taken.

/// JP a16 / JP cc, a16 / JP HL
pub(super) fn jp(cpu: &mut Cpu, ops: Operands) -> bool {
    let target = cpu.read16(ops.dst());
    if !cpu.condition_met(ops) {
        return false;
    }
    cpu.regs.set(RegisterId::PC, target);
    true
}

/// JR r8 / JR cc, r8 - offset is relative to the following instruction
pub(super) fn jr(cpu: &mut Cpu, ops: Operands) -> bool {
    let offset = cpu.fetch() as i8;
    if !cpu.condition_met(ops) {
        return false;
    }
    let pc = cpu.regs.get(RegisterId::PC);
    cpu.regs.set(RegisterId::PC, pc.wrapping_add(offset as u16));
    true
}

pub(super) fn call(cpu: &mut Cpu, ops: Operands) -> bool {
    let target = cpu.fetch16();
    if !cpu.condition_met(ops) {
        return false;
    }
    let ret = cpu.regs.get(RegisterId::PC);
    cpu.push_word(ret);
    cpu.regs.set(RegisterId::PC, target);
    true
}

pub(super) fn ret(cpu: &mut Cpu, ops: Operands) -> bool {
    if !cpu.condition_met(ops) {
        return false;
    }
    let addr = cpu.pop_word();
    cpu.regs.set(RegisterId::PC, addr);
    true
}

/// RETI - return and enable interrupts immediately
pub(super) fn reti(cpu: &mut Cpu, _ops: Operands) -> bool {
    let addr = cpu.pop_word();
    cpu.regs.set(RegisterId::PC, addr);
    cpu.ime = true;
    cpu.ime_scheduled = false;
    true
}

pub(super) fn rst(cpu: &mut Cpu, ops: Operands) -> bool {
    let vector = match ops.dst() {
        Operand::Vector(addr) => addr,
        other => unreachable!("RST bound to {}", other),
    };
    let ret = cpu.regs.get(RegisterId::PC);
    cpu.push_word(ret);
    cpu.regs.set(RegisterId::PC, vector);
    true
}

pub(super) fn push(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read16(ops.dst());
    cpu.push_word(value);
    false
}

pub(super) fn pop(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.pop_word();
    cpu.write16(ops.dst(), value);
    false
}
