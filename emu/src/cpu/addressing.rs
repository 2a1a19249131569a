//! Operand decoding. Every helper that reads program memory consumes
//! exactly its operand width and advances `PC`; none of them touches flags.
//!
//! Operands are always read from the bank selected before the current
//! instruction started, see [`BankLatch`](crate::cpu::bank::BankLatch).

use crate::cpu::bank::Bank;
use crate::cpu::lc86k::Lc86k;

impl Lc86k {
    /// `#i8`
    pub(crate) fn operand_i8(&mut self) -> u8 {
        self.fetch()
    }

    /// `r8`, a signed displacement from the next instruction.
    pub(crate) fn operand_r8(&mut self) -> i8 {
        i8::from_ne_bytes([self.fetch()])
    }

    /// `r8` of the bit branches; the `b3` field is taken from the opcode
    /// separately by [`Lc86k::bit_b3`].
    pub(crate) fn operand_r8_b3(&mut self) -> i8 {
        self.operand_r8()
    }

    /// `r16`, little endian.
    pub(crate) fn operand_r16(&mut self) -> u16 {
        let low = self.fetch();
        let high = self.fetch();
        u16::from_le_bytes([low, high])
    }

    /// `d9`: opcode bit 0 is address bit 8.
    pub(crate) fn address_d9(&mut self, op_code: u8) -> u16 {
        let high = u16::from(op_code & 0x01) << 8;
        high | u16::from(self.fetch())
    }

    /// `d9` of the bit instructions: opcode bit 4 is address bit 8.
    pub(crate) fn address_d9_b3(&mut self, op_code: u8) -> u16 {
        let high = u16::from(op_code & 0x10) << 4;
        high | u16::from(self.fetch())
    }

    /// `b3`, the bit index in opcode bits 0-2.
    pub(crate) const fn bit_b3(op_code: u8) -> u8 {
        op_code & 0x07
    }

    /// `@Rj`: the indirect registers are the first 16 bytes of main RAM, four
    /// per `IRBK` group. `@R2`/`@R3` point into the SFR half.
    pub(crate) fn address_indirect(&self, op_code: u8) -> u16 {
        let j = op_code & 0x03;
        let register = self.psw().indirect_bank() * 4 + j;
        let pointer = u16::from(self.register(u16::from(register)));
        pointer | (u16::from(j & 0x02) << 7)
    }

    /// `a12` within the 4K page of the next instruction.
    pub(crate) fn address_a12(&mut self, op_code: u8) -> u16 {
        let bit_11 = u16::from(op_code & 0x10) << 7;
        let bits_8_10 = u16::from(op_code & 0x07) << 8;
        let low = u16::from(self.fetch());
        (self.pc & 0xF000) | bit_11 | bits_8_10 | low
    }

    /// `a16`, big endian.
    pub(crate) fn address_a16(&mut self) -> u16 {
        self.address_a16_in(self.ext.current())
    }

    /// `a16` read from an explicit program bank.
    ///
    /// Instructions always pass the current bank: an `EXT` write only takes
    /// effect at the next fetch, so a `JMPF` following it reads its operand
    /// from the bank it was itself fetched from.
    pub(crate) fn address_a16_in(&mut self, bank: Bank) -> u16 {
        let high = self.read_byte_in(bank, self.pc);
        let low = self.read_byte_in(bank, self.pc.wrapping_add(1));
        self.pc = self.pc.wrapping_add(2);
        u16::from_be_bytes([high, low])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::memory::MemoryRegion;
    use crate::memory::sfr::PSW;

    #[test]
    fn r8_is_signed() {
        let mut cpu = Lc86k::with_rom(&[0xFF, 0x7F, 0x80]);
        assert_eq!(cpu.operand_r8(), -1);
        assert_eq!(cpu.operand_r8(), 127);
        assert_eq!(cpu.operand_r8(), -128);
        assert_eq!(cpu.program_counter(), 3);
    }

    #[test]
    fn r8_b3_is_signed() {
        let mut cpu = Lc86k::with_rom(&[0xFF, 0x7F, 0x80]);
        assert_eq!(cpu.operand_r8_b3(), -1);
        assert_eq!(cpu.operand_r8_b3(), 127);
        assert_eq!(cpu.operand_r8_b3(), -128);
    }

    #[test]
    fn i8_and_r16() {
        let mut cpu = Lc86k::with_rom(&[0xAB, 0x34, 0x12]);
        assert_eq!(cpu.operand_i8(), 0xAB);
        assert_eq!(cpu.operand_r16(), 0x1234);
        assert_eq!(cpu.program_counter(), 3);
    }

    #[test]
    fn d9_takes_bit_8_from_opcode() {
        let mut cpu = Lc86k::with_rom(&[0x42, 0x42, 0x05, 0x05]);
        assert_eq!(cpu.address_d9(0x02), 0x042);
        assert_eq!(cpu.address_d9(0x03), 0x142);
        assert_eq!(cpu.address_d9_b3(0xED), 0x005);
        assert_eq!(cpu.address_d9_b3(0xFD), 0x105);
        assert_eq!(Lc86k::bit_b3(0xFD), 5);
    }

    #[test]
    fn indirect_follows_irbk() {
        let mut cpu = Lc86k::with_rom(&[]);
        cpu.write_to_ram(&[0x10, 0x11, 0x12, 0x13, 0x20, 0x21, 0x22, 0x23], 0);

        assert_eq!(cpu.address_indirect(0x04), 0x010);
        assert_eq!(cpu.address_indirect(0x07), 0x113);

        // IRBK = 1
        cpu.set_register(PSW, 0b0000_1000);
        assert_eq!(cpu.address_indirect(0x05), 0x021);
        assert_eq!(cpu.address_indirect(0x06), 0x122);
    }

    #[test]
    fn a12_stays_in_page() {
        let mut cpu = Lc86k::with_rom(&[]);
        cpu.write_to_rom(&[0x34], 0x5001);
        cpu.set_program_counter(0x5001);

        assert_eq!(cpu.address_a12(0x1F), 0x5F34);
    }

    #[test]
    fn a16_from_explicit_bank() {
        let mut cpu = Lc86k::with_rom(&[0x12, 0x34]);
        cpu.flash.borrow_mut().write(&[0xAB, 0xCD], 0);

        assert_eq!(cpu.address_a16_in(Bank::Flash), 0xABCD);
        cpu.set_program_counter(0);
        assert_eq!(cpu.address_a16_in(Bank::Rom), 0x1234);
        cpu.set_program_counter(0);
        assert_eq!(cpu.address_a16(), 0x1234);
    }
}
