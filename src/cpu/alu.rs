// Arithmetic Logic Unit
//
// Pure functions: each takes its operands plus the current flags and returns
// the result with the updated flags. Bits an operation documents as
// "not affected" are carried over from the input flags unchanged.
//
// Flag rules:
//   Z - result is zero (8-bit ops)
//   N - set by subtraction-class ops (SUB, SBC, CP, DEC)
//   H - carry out of bit 3 (8-bit) or bit 11 (ADD HL,rr), borrow for subtraction
//   C - carry out of bit 7 (8-bit) or bit 15 (16-bit), or the bit shifted out

use super::registers::Flags;

/// Flags with Z, N, H, C set from the four booleans
fn znhc(z: bool, n: bool, h: bool, c: bool) -> Flags {
    let mut f = Flags::empty();
    f.set(Flags::Z, z);
    f.set(Flags::N, n);
    f.set(Flags::H, h);
    f.set(Flags::C, c);
    f
}

// ========== 8-bit arithmetic ==========

/// ADD / ADC
pub fn add8(a: u8, value: u8, carry_in: bool) -> (u8, Flags) {
    let carry = carry_in as u16;
    let sum = a as u16 + value as u16 + carry;
    let result = sum as u8;
    let half = (a & 0x0F) as u16 + (value & 0x0F) as u16 + carry > 0x0F;
    (result, znhc(result == 0, false, half, sum > 0xFF))
}

/// SUB / SBC / CP
pub fn sub8(a: u8, value: u8, carry_in: bool) -> (u8, Flags) {
    let carry = carry_in as i16;
    let diff = a as i16 - value as i16 - carry;
    let result = diff as u8;
    let half = ((a & 0x0F) as i16) - ((value & 0x0F) as i16) - carry < 0;
    (result, znhc(result == 0, true, half, diff < 0))
}

pub fn and8(a: u8, value: u8) -> (u8, Flags) {
    let result = a & value;
    (result, znhc(result == 0, false, true, false))
}

pub fn xor8(a: u8, value: u8) -> (u8, Flags) {
    let result = a ^ value;
    (result, znhc(result == 0, false, false, false))
}

pub fn or8(a: u8, value: u8) -> (u8, Flags) {
    let result = a | value;
    (result, znhc(result == 0, false, false, false))
}

/// INC r - C flag not affected
pub fn inc8(value: u8, flags: Flags) -> (u8, Flags) {
    let result = value.wrapping_add(1);
    let mut f = flags;
    f.set(Flags::Z, result == 0);
    f.remove(Flags::N);
    f.set(Flags::H, (value & 0x0F) == 0x0F);
    (result, f)
}

/// DEC r - C flag not affected
pub fn dec8(value: u8, flags: Flags) -> (u8, Flags) {
    let result = value.wrapping_sub(1);
    let mut f = flags;
    f.set(Flags::Z, result == 0);
    f.insert(Flags::N);
    f.set(Flags::H, (value & 0x0F) == 0);
    (result, f)
}

// ========== 16-bit arithmetic ==========

/// ADD HL, rr - Z flag not affected
pub fn add16(hl: u16, value: u16, flags: Flags) -> (u16, Flags) {
    let (result, carry) = hl.overflowing_add(value);
    let mut f = flags;
    f.remove(Flags::N);
    f.set(Flags::H, (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF);
    f.set(Flags::C, carry);
    (result, f)
}

/// SP + e8 (ADD SP,e8 and LD HL,SP+e8)
/// H and C come from the unsigned add of the low byte; Z and N are reset.
pub fn add_sp_offset(sp: u16, offset: i8) -> (u16, Flags) {
    let operand = offset as i16 as u16;
    let result = sp.wrapping_add(operand);
    let half = (sp & 0x0F) + (operand & 0x0F) > 0x0F;
    let carry = (sp & 0xFF) + (operand & 0xFF) > 0xFF;
    (result, znhc(false, false, half, carry))
}

// ========== Rotates and shifts ==========

/// RLC - Rotate Left Circular
pub fn rlc(value: u8) -> (u8, Flags) {
    let carry = value >> 7;
    let result = (value << 1) | carry;
    (result, znhc(result == 0, false, false, carry != 0))
}

/// RRC - Rotate Right Circular
pub fn rrc(value: u8) -> (u8, Flags) {
    let carry = value & 1;
    let result = (value >> 1) | (carry << 7);
    (result, znhc(result == 0, false, false, carry != 0))
}

/// RL - Rotate Left through Carry
pub fn rl(value: u8, carry_in: bool) -> (u8, Flags) {
    let result = (value << 1) | carry_in as u8;
    (result, znhc(result == 0, false, false, value & 0x80 != 0))
}

/// RR - Rotate Right through Carry
pub fn rr(value: u8, carry_in: bool) -> (u8, Flags) {
    let result = (value >> 1) | ((carry_in as u8) << 7);
    (result, znhc(result == 0, false, false, value & 1 != 0))
}

/// SLA - Shift Left Arithmetic (bit 7 to carry, 0 to bit 0)
pub fn sla(value: u8) -> (u8, Flags) {
    let result = value << 1;
    (result, znhc(result == 0, false, false, value & 0x80 != 0))
}

/// SRA - Shift Right Arithmetic (bit 0 to carry, bit 7 stays)
pub fn sra(value: u8) -> (u8, Flags) {
    let result = (value >> 1) | (value & 0x80);
    (result, znhc(result == 0, false, false, value & 1 != 0))
}

/// SRL - Shift Right Logical (bit 0 to carry, 0 to bit 7)
pub fn srl(value: u8) -> (u8, Flags) {
    let result = value >> 1;
    (result, znhc(result == 0, false, false, value & 1 != 0))
}

/// SWAP - Swap upper and lower nibbles
pub fn swap(value: u8) -> (u8, Flags) {
    let result = value.rotate_left(4);
    (result, znhc(result == 0, false, false, false))
}

/// BIT - Z set if the bit is 0, C not affected
pub fn bit(value: u8, bit: u8, flags: Flags) -> Flags {
    let mut f = flags;
    f.set(Flags::Z, value & (1 << bit) == 0);
    f.remove(Flags::N);
    f.insert(Flags::H);
    f
}

// ========== Accumulator adjustments ==========

/// DAA - Decimal Adjust Accumulator
/// N not affected, H reset, C set when the high digit was corrected.
pub fn daa(a: u8, flags: Flags) -> (u8, Flags) {
    let mut adjust = 0u8;
    let mut carry = flags.contains(Flags::C);

    let result = if flags.contains(Flags::N) {
        // After subtraction
        if flags.contains(Flags::C) {
            adjust |= 0x60;
        }
        if flags.contains(Flags::H) {
            adjust |= 0x06;
        }
        a.wrapping_sub(adjust)
    } else {
        // After addition
        if carry || a > 0x99 {
            adjust |= 0x60;
            carry = true;
        }
        if flags.contains(Flags::H) || (a & 0x0F) > 0x09 {
            adjust |= 0x06;
        }
        a.wrapping_add(adjust)
    };

    let mut f = flags;
    f.set(Flags::Z, result == 0);
    f.remove(Flags::H);
    f.set(Flags::C, carry);
    (result, f)
}

/// CPL - Complement A, Z and C not affected
pub fn cpl(a: u8, flags: Flags) -> (u8, Flags) {
    (!a, flags | Flags::N | Flags::H)
}

/// SCF - Set Carry Flag, Z not affected
pub fn scf(flags: Flags) -> Flags {
    (flags & Flags::Z) | Flags::C
}

/// CCF - Complement Carry Flag, Z not affected
pub fn ccf(flags: Flags) -> Flags {
    let mut f = flags & (Flags::Z | Flags::C);
    f.toggle(Flags::C);
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add8_carry_and_half() {
        let (r, f) = add8(0xFF, 0x01, false);
        assert_eq!(r, 0x00);
        assert_eq!(f, Flags::Z | Flags::H | Flags::C);

        let (r, f) = add8(0x3C, 0x0F, false);
        assert_eq!(r, 0x4B);
        assert_eq!(f, Flags::H);
    }

    #[test]
    fn test_adc_uses_carry_in() {
        let (r, f) = add8(0x0E, 0x01, true);
        assert_eq!(r, 0x10);
        assert_eq!(f, Flags::H);

        let (r, f) = add8(0xFE, 0x01, true);
        assert_eq!(r, 0x00);
        assert_eq!(f, Flags::Z | Flags::H | Flags::C);
    }

    #[test]
    fn test_sub8_borrow() {
        let (r, f) = sub8(0x10, 0x01, false);
        assert_eq!(r, 0x0F);
        assert_eq!(f, Flags::N | Flags::H);

        let (r, f) = sub8(0x00, 0x01, false);
        assert_eq!(r, 0xFF);
        assert_eq!(f, Flags::N | Flags::H | Flags::C);

        let (r, f) = sub8(0x42, 0x42, false);
        assert_eq!(r, 0x00);
        assert_eq!(f, Flags::Z | Flags::N);
    }

    #[test]
    fn test_sbc_uses_carry_in() {
        let (r, f) = sub8(0x10, 0x0F, true);
        assert_eq!(r, 0x00);
        assert_eq!(f, Flags::Z | Flags::N | Flags::H);
    }

    #[test]
    fn test_logic_flags() {
        assert_eq!(and8(0xF0, 0x0F), (0x00, Flags::Z | Flags::H));
        assert_eq!(or8(0xF0, 0x0F), (0xFF, Flags::empty()));
        assert_eq!(xor8(0xFF, 0xFF), (0x00, Flags::Z));
    }

    #[test]
    fn test_inc_dec_keep_carry() {
        let (r, f) = inc8(0x0F, Flags::C | Flags::N);
        assert_eq!(r, 0x10);
        assert_eq!(f, Flags::H | Flags::C);

        let (r, f) = dec8(0x01, Flags::C);
        assert_eq!(r, 0x00);
        assert_eq!(f, Flags::Z | Flags::N | Flags::C);

        let (r, f) = dec8(0x00, Flags::empty());
        assert_eq!(r, 0xFF);
        assert_eq!(f, Flags::N | Flags::H);
    }

    #[test]
    fn test_add16_keeps_zero() {
        let (r, f) = add16(0x0FFF, 0x0001, Flags::Z | Flags::N);
        assert_eq!(r, 0x1000);
        assert_eq!(f, Flags::Z | Flags::H);

        let (r, f) = add16(0xFFFF, 0x0001, Flags::empty());
        assert_eq!(r, 0x0000);
        assert_eq!(f, Flags::H | Flags::C);
    }

    #[test]
    fn test_add_sp_offset() {
        let (r, f) = add_sp_offset(0xFFF8, 8);
        assert_eq!(r, 0x0000);
        assert_eq!(f, Flags::H | Flags::C);

        let (r, f) = add_sp_offset(0x0005, -1);
        assert_eq!(r, 0x0004);
        assert_eq!(f, Flags::H | Flags::C);

        let (r, f) = add_sp_offset(0x1000, -1);
        assert_eq!(r, 0x0FFF);
        assert_eq!(f, Flags::empty());
    }

    #[test]
    fn test_rotates() {
        assert_eq!(rlc(0x85), (0x0B, Flags::C));
        assert_eq!(rrc(0x01), (0x80, Flags::C));
        assert_eq!(rl(0x80, true), (0x01, Flags::C));
        assert_eq!(rl(0x80, false), (0x00, Flags::Z | Flags::C));
        assert_eq!(rr(0x01, true), (0x80, Flags::C));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(sla(0x80), (0x00, Flags::Z | Flags::C));
        assert_eq!(sra(0x81), (0xC0, Flags::C));
        assert_eq!(srl(0x81), (0x40, Flags::C));
        assert_eq!(swap(0xAB), (0xBA, Flags::empty()));
        assert_eq!(swap(0x00), (0x00, Flags::Z));
    }

    #[test]
    fn test_bit_keeps_carry() {
        assert_eq!(bit(0x80, 7, Flags::C), Flags::H | Flags::C);
        assert_eq!(bit(0x80, 0, Flags::empty()), Flags::Z | Flags::H);
    }

    #[test]
    fn test_daa_after_add() {
        // 0x15 + 0x27 = 0x3C -> BCD 42
        let (r, f) = daa(0x3C, Flags::empty());
        assert_eq!(r, 0x42);
        assert_eq!(f, Flags::empty());

        // 0x99 + 0x01 = 0x9A -> BCD 00 with carry
        let (r, f) = daa(0x9A, Flags::empty());
        assert_eq!(r, 0x00);
        assert_eq!(f, Flags::Z | Flags::C);
    }

    #[test]
    fn test_daa_after_sub() {
        // 0x42 - 0x15 = 0x2D with half borrow -> BCD 27
        let (r, f) = daa(0x2D, Flags::N | Flags::H);
        assert_eq!(r, 0x27);
        assert_eq!(f, Flags::N);
    }

    #[test]
    fn test_flag_ops() {
        assert_eq!(cpl(0x0F, Flags::Z), (0xF0, Flags::Z | Flags::N | Flags::H));
        assert_eq!(scf(Flags::Z | Flags::N | Flags::H), Flags::Z | Flags::C);
        assert_eq!(ccf(Flags::C | Flags::H), Flags::empty());
        assert_eq!(ccf(Flags::Z), Flags::Z | Flags::C);
    }
}
