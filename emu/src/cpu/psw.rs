//! # Program Status Word
//!
//! ```text
//!   7    6    5     4       3     2     1      0
//! ┌────┬────┬────┬───────┬───────┬────┬──────┬───┐
//! │ CY │ AC │ -  │ IRBK1 │ IRBK0 │ OV │ RAMBK│ P │
//! └────┴────┴────┴───────┴───────┴────┴──────┴───┘
//! ```
//!
//! - **CY/AC/OV**: carry, auxiliary carry (out of bit 3) and signed overflow
//! - **IRBK**: which group of four indirect registers `@R0-@R3` is in use
//! - **RAMBK**: main RAM bank for addresses 0x000-0x0FF
//! - **P**: general purpose flag
//!
//! The PSW lives in the SFR area so firmware can push and pop it; [`Psw`]
//! is the typed view the interpreter works with.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// One of the four flags the interpreter reads and writes directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Carry,
    AuxiliaryCarry,
    Overflow,
    Parity,
}

impl Flag {
    pub const ALL: [Self; 4] = [
        Self::Carry,
        Self::AuxiliaryCarry,
        Self::Overflow,
        Self::Parity,
    ];

    const fn bit(self) -> u8 {
        match self {
            Self::Carry => 7,
            Self::AuxiliaryCarry => 6,
            Self::Overflow => 2,
            Self::Parity => 0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psw(u8);

impl Psw {
    #[must_use]
    pub fn flag(self, flag: Flag) -> bool {
        self.0.get_bit(flag.bit())
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        self.0.set_bit(flag.bit(), value);
    }

    /// CY => Bit 7
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.flag(Flag::Carry)
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.set_flag(Flag::Carry, value);
    }

    /// AC => Bit 6
    #[must_use]
    pub fn auxiliary_carry_flag(self) -> bool {
        self.flag(Flag::AuxiliaryCarry)
    }

    pub fn set_auxiliary_carry_flag(&mut self, value: bool) {
        self.set_flag(Flag::AuxiliaryCarry, value);
    }

    /// OV => Bit 2
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.flag(Flag::Overflow)
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.set_flag(Flag::Overflow, value);
    }

    /// P => Bit 0
    #[must_use]
    pub fn parity_flag(self) -> bool {
        self.flag(Flag::Parity)
    }

    /// IRBK1-IRBK0 => Bits 4-3
    #[must_use]
    pub fn indirect_bank(self) -> u8 {
        self.0.get_bits(3..=4)
    }

    /// RAMBK0 => Bit 1
    #[must_use]
    pub fn ram_bank(self) -> u8 {
        u8::from(self.0.get_bit(1))
    }

    pub fn set_arithmetic_flags(&mut self, result: &AluResult) {
        self.set_carry_flag(result.carry);
        self.set_auxiliary_carry_flag(result.auxiliary_carry);
        self.set_overflow_flag(result.overflow);
    }
}

impl From<u8> for Psw {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Psw> for u8 {
    fn from(psw: Psw) -> Self {
        psw.0
    }
}

/// Result of an 8-bit addition or subtraction with the flags it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub result: u8,
    pub carry: bool,
    pub auxiliary_carry: bool,
    pub overflow: bool,
}

impl AluResult {
    /// `lhs + rhs + carry_in`
    #[must_use]
    pub fn add(lhs: u8, rhs: u8, carry_in: bool) -> Self {
        let carry_in = u8::from(carry_in);
        let wide = u16::from(lhs) + u16::from(rhs) + u16::from(carry_in);
        let result = wide.get_bits(0..=7) as u8;

        Self {
            result,
            carry: wide > 0xFF,
            auxiliary_carry: (lhs & 0x0F) + (rhs & 0x0F) + carry_in > 0x0F,
            overflow: (lhs ^ result) & (rhs ^ result) & 0x80 != 0,
        }
    }

    /// `lhs - rhs - borrow_in`
    #[must_use]
    pub fn sub(lhs: u8, rhs: u8, borrow_in: bool) -> Self {
        let borrow_in = u8::from(borrow_in);
        let result = lhs.wrapping_sub(rhs).wrapping_sub(borrow_in);

        Self {
            result,
            carry: u16::from(lhs) < u16::from(rhs) + u16::from(borrow_in),
            auxiliary_carry: (lhs & 0x0F) < (rhs & 0x0F) + borrow_in,
            overflow: (lhs ^ rhs) & (lhs ^ result) & 0x80 != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn flags_are_independent() {
        for flag in Flag::ALL {
            let start: u8 = rand::random();
            let mut psw = Psw::from(start);

            psw.set_flag(flag, true);
            assert!(psw.flag(flag));
            psw.set_flag(flag, false);
            assert!(!psw.flag(flag));

            for other in Flag::ALL.into_iter().filter(|f| *f != flag) {
                assert_eq!(psw.flag(other), Psw::from(start).flag(other));
            }
        }
    }

    #[test]
    fn pack_unpack() {
        let mut psw = Psw::default();
        psw.set_carry_flag(true);
        psw.set_overflow_flag(true);
        assert_eq!(u8::from(psw), 0b1000_0100);

        let psw = Psw::from(0b0001_1010);
        assert_eq!(psw.indirect_bank(), 0b11);
        assert_eq!(psw.ram_bank(), 1);
        assert!(!psw.parity_flag());
    }

    #[test]
    fn add_flags() {
        let r = AluResult::add(0x0F, 0x01, false);
        assert_eq!(r.result, 0x10);
        assert!(r.auxiliary_carry);
        assert!(!r.carry);

        let r = AluResult::add(0xFF, 0x00, true);
        assert_eq!(r.result, 0x00);
        assert!(r.carry);

        let r = AluResult::add(0x7F, 0x01, false);
        assert!(r.overflow);
    }

    #[test]
    fn sub_flags() {
        let r = AluResult::sub(0x10, 0x01, false);
        assert_eq!(r.result, 0x0F);
        assert!(r.auxiliary_carry);
        assert!(!r.carry);

        let r = AluResult::sub(0x00, 0x00, true);
        assert_eq!(r.result, 0xFF);
        assert!(r.carry);

        let r = AluResult::sub(0x80, 0x01, false);
        assert!(r.overflow);
    }
}
