// CB-Prefixed Instructions
//
// The CB prefix selects 256 extended opcodes:
// 0x00-0x3F: Rotate and shift (RLC, RRC, RL, RR, SLA, SRA, SWAP, SRL)
// 0x40-0x7F: BIT b, r - test bit
// 0x80-0xBF: RES b, r - reset bit
// 0xC0-0xFF: SET b, r - set bit
//
// Register encoding (bits 0-2): B, C, D, E, H, L, (HL), A
// Bit number (bits 3-5): 0-7

use super::alu;
use super::opcodes::{Operand, Operands};
use super::registers::Flags;
use super::Cpu;

/// Read the target, apply a rotate/shift, write back with the new flags
fn rotate(cpu: &mut Cpu, ops: Operands, op: impl FnOnce(u8, bool) -> (u8, Flags)) -> bool {
    let target = ops.dst();
    let value = cpu.read8(target);
    let (result, flags) = op(value, cpu.regs.flag(Flags::C));
    cpu.write8(target, result);
    cpu.regs.set_flags(flags);
    false
}

fn bit_index(ops: Operands) -> u8 {
    match ops.dst() {
        Operand::Bit(n) => n,
        other => unreachable!("bit operation bound to {}", other),
    }
}

// ========== Rotate / shift ==========

pub(super) fn rlc(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, |v, _| alu::rlc(v))
}

pub(super) fn rrc(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, |v, _| alu::rrc(v))
}

pub(super) fn rl(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, alu::rl)
}

pub(super) fn rr(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, alu::rr)
}

pub(super) fn sla(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, |v, _| alu::sla(v))
}

pub(super) fn sra(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, |v, _| alu::sra(v))
}

pub(super) fn swap(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, |v, _| alu::swap(v))
}

pub(super) fn srl(cpu: &mut Cpu, ops: Operands) -> bool {
    rotate(cpu, ops, |v, _| alu::srl(v))
}

// ========== Bit operations ==========

/// BIT b, r - result is only reflected in the flags
pub(super) fn bit(cpu: &mut Cpu, ops: Operands) -> bool {
    let value = cpu.read8(ops.src());
    let flags = alu::bit(value, bit_index(ops), cpu.regs.flags());
    cpu.regs.set_flags(flags);
    false
}

/// RES b, r - flags not affected
pub(super) fn res(cpu: &mut Cpu, ops: Operands) -> bool {
    let target = ops.src();
    let value = cpu.read8(target);
    cpu.write8(target, value & !(1 << bit_index(ops)));
    false
}

/// SET b, r - flags not affected
pub(super) fn set(cpu: &mut Cpu, ops: Operands) -> bool {
    let target = ops.src();
    let value = cpu.read8(target);
    cpu.write8(target, value | (1 << bit_index(ops)));
    false
}
