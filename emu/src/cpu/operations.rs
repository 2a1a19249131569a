use crate::bitwise::Bits;
use crate::cpu::instruction::{Instruction, Opcode, Operand};
use crate::cpu::lc86k::Lc86k;
use crate::cpu::psw::{AluResult, Flag};
use crate::memory::sfr::{B, C, FPR, TRH, TRL};

impl Lc86k {
    /// Executes an already fetched opcode. Operand bytes are consumed here.
    pub fn execute(&mut self, opcode: Opcode) {
        use Instruction::*;

        let op_code = opcode.raw;
        match opcode.instruction {
            Nop => {}

            Ld(operand) => {
                let value = self.read_operand(op_code, operand);
                self.set_accumulator(value);
            }
            St(operand) => {
                let address = self.operand_address(op_code, operand);
                let value = self.accumulator();
                self.set_register(address, value);
            }
            Mov(operand) => {
                let address = self.operand_address(op_code, operand);
                let value = self.operand_i8();
                self.set_register(address, value);
            }
            Push => {
                let address = self.address_d9(op_code);
                let value = self.register(address);
                self.push(value);
            }
            Pop => {
                let address = self.address_d9(op_code);
                let value = self.pop();
                self.set_register(address, value);
            }
            Xch(operand) => {
                let address = self.operand_address(op_code, operand);
                let value = self.register(address);
                let accumulator = self.accumulator();
                self.set_register(address, accumulator);
                self.set_accumulator(value);
            }
            Ldc => self.ldc(),
            Ldf => self.ldf(),
            Stf => self.stf(),

            Add(operand) => self.add(op_code, operand, false),
            Addc(operand) => {
                let carry = self.psw().carry_flag();
                self.add(op_code, operand, carry);
            }
            Sub(operand) => self.sub(op_code, operand, false),
            Subc(operand) => {
                let borrow = self.psw().carry_flag();
                self.sub(op_code, operand, borrow);
            }
            Inc(operand) => self.modify(op_code, operand, |v| v.wrapping_add(1)),
            Dec(operand) => self.modify(op_code, operand, |v| v.wrapping_sub(1)),
            Mul => self.mul(),
            Div => self.div(),

            And(operand) => self.logic(op_code, operand, |a, v| a & v),
            Or(operand) => self.logic(op_code, operand, |a, v| a | v),
            Xor(operand) => self.logic(op_code, operand, |a, v| a ^ v),
            Rol => {
                let value = self.accumulator();
                self.set_accumulator(value.rotate_left(1));
            }
            Ror => {
                let value = self.accumulator();
                self.set_accumulator(value.rotate_right(1));
            }
            Rolc => self.rotate_through_carry(true),
            Rorc => self.rotate_through_carry(false),

            Set1 => self.modify_bit(op_code, |byte, bit| byte.set_bit(bit, true)),
            Clr1 => self.modify_bit(op_code, |byte, bit| byte.set_bit(bit, false)),
            Not1 => self.modify_bit(op_code, |byte, bit| byte.toggle_bit(bit)),

            Br => {
                let offset = self.operand_r8();
                self.branch(offset);
            }
            Brf => {
                let offset = self.operand_r16();
                self.pc = self.pc.wrapping_sub(1).wrapping_add(offset);
            }
            Bz => {
                let offset = self.operand_r8();
                if self.accumulator() == 0 {
                    self.branch(offset);
                }
            }
            Bnz => {
                let offset = self.operand_r8();
                if self.accumulator() != 0 {
                    self.branch(offset);
                }
            }
            Bp => self.bit_branch(op_code, |set| set, false),
            Bpc => self.bit_branch(op_code, |set| set, true),
            Bn => self.bit_branch(op_code, |set| !set, false),
            Be(operand) => self.compare_branch(op_code, operand, true),
            Bne(operand) => self.compare_branch(op_code, operand, false),
            Dbnz(operand) => {
                let address = self.operand_address(op_code, operand);
                let offset = self.operand_r8();
                let value = self.register(address).wrapping_sub(1);
                self.set_register(address, value);
                if value != 0 {
                    self.branch(offset);
                }
            }
            Jmp => self.pc = self.address_a12(op_code),
            Jmpf => self.pc = self.address_a16(),

            Call => {
                let target = self.address_a12(op_code);
                self.push_address(self.pc);
                self.pc = target;
            }
            Callf => {
                let target = self.address_a16();
                self.push_address(self.pc);
                self.pc = target;
            }
            Callr => {
                let offset = self.operand_r16();
                self.push_address(self.pc);
                self.pc = self.pc.wrapping_sub(1).wrapping_add(offset);
            }
            Ret => self.pc = self.pop_address(),
            Reti => self.return_from_interrupt(),
        }
    }

    /// RAM address of a `d9` or `@Rj` operand.
    fn operand_address(&mut self, op_code: u8, operand: Operand) -> u16 {
        match operand {
            Operand::Indirect => self.address_indirect(op_code),
            Operand::Direct | Operand::Immediate => self.address_d9(op_code),
        }
    }

    fn read_operand(&mut self, op_code: u8, operand: Operand) -> u8 {
        match operand {
            Operand::Immediate => self.operand_i8(),
            _ => {
                let address = self.operand_address(op_code, operand);
                self.register(address)
            }
        }
    }

    fn branch(&mut self, offset: i8) {
        self.pc = self.pc.wrapping_add_signed(i16::from(offset));
    }

    fn add(&mut self, op_code: u8, operand: Operand, carry: bool) {
        let value = self.read_operand(op_code, operand);
        let result = AluResult::add(self.accumulator(), value, carry);
        self.store_alu_result(&result);
    }

    fn sub(&mut self, op_code: u8, operand: Operand, borrow: bool) {
        let value = self.read_operand(op_code, operand);
        let result = AluResult::sub(self.accumulator(), value, borrow);
        self.store_alu_result(&result);
    }

    fn store_alu_result(&mut self, result: &AluResult) {
        self.set_accumulator(result.result);
        let mut psw = self.psw();
        psw.set_arithmetic_flags(result);
        self.set_psw(psw);
    }

    fn logic(&mut self, op_code: u8, operand: Operand, op: impl Fn(u8, u8) -> u8) {
        let value = self.read_operand(op_code, operand);
        let result = op(self.accumulator(), value);
        self.set_accumulator(result);
    }

    /// Read-modify-write of a RAM operand, flags untouched.
    fn modify(&mut self, op_code: u8, operand: Operand, op: impl Fn(u8) -> u8) {
        let address = self.operand_address(op_code, operand);
        let value = op(self.register(address));
        self.set_register(address, value);
    }

    fn modify_bit(&mut self, op_code: u8, op: impl Fn(&mut u8, u8)) {
        let address = self.address_d9_b3(op_code);
        let mut value = self.register(address);
        op(&mut value, Self::bit_b3(op_code));
        self.set_register(address, value);
    }

    /// `BP`, `BPC` and `BN`: branch when `taken` holds for the tested bit.
    fn bit_branch(&mut self, op_code: u8, taken: impl Fn(bool) -> bool, clear: bool) {
        let address = self.address_d9_b3(op_code);
        let offset = self.operand_r8_b3();
        let bit = Self::bit_b3(op_code);

        let mut value = self.register(address);
        if taken(value.get_bit(bit)) {
            if clear {
                value.set_bit(bit, false);
                self.set_register(address, value);
            }
            self.branch(offset);
        }
    }

    /// `BE`/`BNE`. CY is set when the left operand is below the right one.
    fn compare_branch(&mut self, op_code: u8, operand: Operand, on_equal: bool) {
        let (lhs, rhs) = match operand {
            Operand::Immediate => (self.accumulator(), self.operand_i8()),
            Operand::Direct => {
                let address = self.address_d9(op_code);
                (self.accumulator(), self.register(address))
            }
            Operand::Indirect => {
                let address = self.address_indirect(op_code);
                (self.register(address), self.operand_i8())
            }
        };
        let offset = self.operand_r8();

        self.write_flag(Flag::Carry, lhs < rhs);
        if (lhs == rhs) == on_equal {
            self.branch(offset);
        }
    }

    fn rotate_through_carry(&mut self, left: bool) {
        let value = self.accumulator();
        let carry_in = self.psw().carry_flag();

        let (result, carry_out) = if left {
            ((value << 1) | u8::from(carry_in), value.get_bit(7))
        } else {
            ((value >> 1) | (u8::from(carry_in) << 7), value.get_bit(0))
        };

        self.set_accumulator(result);
        self.write_flag(Flag::Carry, carry_out);
    }

    /// `B:ACC:C <- (ACC:C) * B`
    fn mul(&mut self) {
        let multiplicand = u32::from(u16::from_be_bytes([self.accumulator(), self.register(C)]));
        let product = multiplicand * u32::from(self.register(B));

        let [_, high, middle, low] = product.to_be_bytes();
        self.set_register(B, high);
        self.set_accumulator(middle);
        self.set_register(C, low);

        self.write_flag(Flag::Carry, false);
        self.write_flag(Flag::Overflow, product > 0xFFFF);
    }

    /// `ACC:C <- (ACC:C) / B`, `B <- remainder`
    fn div(&mut self) {
        let dividend = u16::from_be_bytes([self.accumulator(), self.register(C)]);
        let divisor = u16::from(self.register(B));

        if divisor == 0 {
            self.set_accumulator(0xFF);
            self.set_register(B, 0);
            self.write_flag(Flag::Overflow, true);
        } else {
            let [high, low] = (dividend / divisor).to_be_bytes();
            self.set_accumulator(high);
            self.set_register(C, low);
            self.set_register(B, (dividend % divisor) as u8);
            self.write_flag(Flag::Overflow, false);
        }
        self.write_flag(Flag::Carry, false);
    }

    fn table_address(&self) -> u16 {
        u16::from_be_bytes([self.register(TRH), self.register(TRL)])
    }

    /// `ACC <- program[TRH:TRL + ACC]` in the current bank.
    fn ldc(&mut self) {
        let address = self
            .table_address()
            .wrapping_add(u16::from(self.accumulator()));
        let value = self.read_byte_rf(address);
        self.set_accumulator(value);
    }

    /// `ACC <- flash[FPR.0:TRH:TRL]`
    fn ldf(&mut self) {
        let bank = self.register(FPR) & 1;
        let value = self.flash.borrow().read_banked(bank, self.table_address());
        self.set_accumulator(value);
    }

    /// `flash[FPR.0:TRH:TRL] <- ACC`
    fn stf(&mut self) {
        let bank = self.register(FPR) & 1;
        let address = self.table_address();
        let value = self.accumulator();
        self.flash.borrow_mut().write_banked(bank, address, value);
    }
}
