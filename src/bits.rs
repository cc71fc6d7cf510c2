// Wraparound Value Cells
//
// Every register and memory cell on the LR35902 is either 8 or 16 bits wide.
// Arithmetic on those cells wraps around silently, so instead of sprinkling
// `wrapping_add` and masks everywhere, values are normalized on construction:
//
//   ByteValue: integer in 0..=255    (modulo 256)
//   WordValue: integer in 0..=65535  (modulo 65536)
//
// Normalization uses the mathematical (non-negative) modulo, so
// ByteValue::of(-1) is 0xFF and WordValue::of(-2) is 0xFFFE.

use std::fmt;

/// An 8-bit cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteValue(u8);

/// A 16-bit cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WordValue(u16);

impl ByteValue {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Normalize any integer into 0..=255
    pub fn of(raw: i64) -> Self {
        Self(raw.rem_euclid(0x100) as u8)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Re-normalize `raw` into this cell and return the new value
    pub fn set(&mut self, raw: i64) -> Self {
        *self = Self::of(raw);
        *self
    }
}

impl WordValue {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Normalize any integer into 0..=65535
    pub fn of(raw: i64) -> Self {
        Self(raw.rem_euclid(0x1_0000) as u16)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// Re-normalize `raw` into this cell and return the new value
    pub fn set(&mut self, raw: i64) -> Self {
        *self = Self::of(raw);
        *self
    }

    /// Signed offset with wraparound (PC/SP arithmetic)
    pub fn offset(self, delta: i64) -> Self {
        Self::of((self.0 as i64).wrapping_add(delta))
    }

    /// High byte (bits 15-8)
    pub const fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Low byte (bits 7-0)
    pub const fn low(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Compose from a high and a low byte
    pub const fn from_bytes(high: u8, low: u8) -> Self {
        Self(((high as u16) << 8) | low as u16)
    }
}

// Unsigned inputs are masked, signed inputs go through the euclidean modulo.
macro_rules! impl_from_int {
    ($cell:ident, $mask:expr; unsigned: $($u:ty),*; signed: $($s:ty),*) => {
        $(
            impl From<$u> for $cell {
                fn from(value: $u) -> Self {
                    Self((value as u64 & $mask) as _)
                }
            }
        )*
        $(
            impl From<$s> for $cell {
                fn from(value: $s) -> Self {
                    Self::of(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(ByteValue, 0xFF; unsigned: u8, u16, u32, u64, usize; signed: i8, i16, i32, i64);
impl_from_int!(WordValue, 0xFFFF; unsigned: u8, u16, u32, u64, usize; signed: i8, i16, i32, i64);

impl From<ByteValue> for u8 {
    fn from(value: ByteValue) -> Self {
        value.0
    }
}

impl From<WordValue> for u16 {
    fn from(value: WordValue) -> Self {
        value.0
    }
}

impl From<ByteValue> for WordValue {
    fn from(value: ByteValue) -> Self {
        Self(value.0 as u16)
    }
}

impl fmt::Display for ByteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

impl fmt::Display for WordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_in_range() {
        assert_eq!(ByteValue::of(0).get(), 0);
        assert_eq!(ByteValue::of(255).get(), 255);
    }

    #[test]
    fn test_byte_wraps_over() {
        assert_eq!(ByteValue::of(256).get(), 0);
        assert_eq!(ByteValue::of(765).get(), 253);
        assert_eq!(ByteValue::of(1276).get(), 252);
    }

    #[test]
    fn test_byte_negative() {
        assert_eq!(ByteValue::of(-1).get(), 0xFF);
        assert_eq!(ByteValue::of(-256).get(), 0x00);
        assert_eq!(ByteValue::of(-257).get(), 0xFF);
    }

    #[test]
    fn test_byte_set_returns_new_value() {
        let mut cell = ByteValue::new(0x10);
        let v = cell.set(0x1FF);
        assert_eq!(v.get(), 0xFF);
        assert_eq!(cell.get(), 0xFF);
    }

    #[test]
    fn test_word_wraps_over() {
        assert_eq!(WordValue::of(65535).get(), 0xFFFF);
        assert_eq!(WordValue::of(65536).get(), 0);
        assert_eq!(WordValue::of(-1).get(), 0xFFFF);
        assert_eq!(WordValue::of(-2).get(), 0xFFFE);
    }

    #[test]
    fn test_word_offset() {
        assert_eq!(WordValue::new(0xFFFF).offset(1).get(), 0x0000);
        assert_eq!(WordValue::new(0x0000).offset(-1).get(), 0xFFFF);
        assert_eq!(WordValue::new(0xC002).offset(-2).get(), 0xC000);
    }

    #[test]
    fn test_word_offset_extreme_deltas() {
        assert_eq!(WordValue::new(5).offset(i64::MAX).get(), 4);
        assert_eq!(WordValue::new(5).offset(i64::MIN).get(), 5);
        assert_eq!(WordValue::new(0).offset(i64::MAX).get(), 0xFFFF);
        assert_eq!(WordValue::new(0xFFFF).offset(i64::MIN).get(), 0xFFFF);
    }

    #[test]
    fn test_word_bytes() {
        let w = WordValue::from_bytes(0x12, 0x34);
        assert_eq!(w.get(), 0x1234);
        assert_eq!(w.high(), 0x12);
        assert_eq!(w.low(), 0x34);
    }

    #[test]
    fn test_from_ints() {
        assert_eq!(ByteValue::from(0x1234u16).get(), 0x34);
        assert_eq!(ByteValue::from(-2i32).get(), 0xFE);
        assert_eq!(WordValue::from(0x1_2345usize).get(), 0x2345);
        assert_eq!(WordValue::from(-1i8).get(), 0xFFFF);
    }
}
