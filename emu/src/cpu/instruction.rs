//! # LC86K opcode map
//!
//! Every byte is a valid opcode. The low nibble selects the addressing mode
//! for most rows, the high nibble the operation:
//!
//! ```text
//!        0       1       2-3      4-7       8-F
//!  0x   NOP     BR      LD d9    LD @R     CALL a12
//!  1x   CALLR   BRF     ST d9    ST @R     CALL a12
//!  2x   CALLF   JMPF    MOV d9   MOV @R    JMP a12
//!  3x   MUL     BE #    BE d9    BE @R     JMP a12
//!  4x   DIV     BNE #   BNE d9   BNE @R    BPC d9,b3
//!  5x   LDF     STF     DBNZ d9  DBNZ @R   BPC d9,b3
//!  6x   PUSH    PUSH    INC d9   INC @R    BP d9,b3
//!  7x   POP     POP     DEC d9   DEC @R    BP d9,b3
//!  8x   BZ      ADD #   ADD d9   ADD @R    BN d9,b3
//!  9x   BNZ     ADDC #  ADDC d9  ADDC @R   BN d9,b3
//!  Ax   RET     SUB #   SUB d9   SUB @R    NOT1 d9,b3
//!  Bx   RETI    SUBC #  SUBC d9  SUBC @R   NOT1 d9,b3
//!  Cx   ROR     LDC     XCH d9   XCH @R    CLR1 d9,b3
//!  Dx   RORC    OR #    OR d9    OR @R     CLR1 d9,b3
//!  Ex   ROL     AND #   AND d9   AND @R    SET1 d9,b3
//!  Fx   ROLC    XOR #   XOR d9   XOR @R    SET1 d9,b3
//! ```
//!
//! Operand bits embedded in the opcode (bit 8 of `d9`, the `@Rj` index,
//! the `b3` field and the high bits of `a12`) stay in [`Opcode::raw`] and are
//! extracted by the addressing helpers at execution time.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Where the second operand of an instruction comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// `#i8`, the byte following the opcode.
    Immediate,
    /// `d9`, a direct RAM address.
    Direct,
    /// `@Rj`, a RAM address held in an indirect register.
    Indirect,
}

impl Operand {
    const fn from_low_nibble(low: u8) -> Self {
        match low {
            2 | 3 => Self::Direct,
            4..=7 => Self::Indirect,
            _ => Self::Immediate,
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => write!(f, "#i8"),
            Self::Direct => write!(f, "d9"),
            Self::Indirect => write!(f, "@R"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Nop,

    // Transfer
    Ld(Operand),
    St(Operand),
    /// `MOV #i8, d9` or `MOV #i8, @Rj`; the operand is the destination.
    Mov(Operand),
    Push,
    Pop,
    Xch(Operand),
    Ldc,
    Ldf,
    Stf,

    // Arithmetic
    Add(Operand),
    Addc(Operand),
    Sub(Operand),
    Subc(Operand),
    Inc(Operand),
    Dec(Operand),
    Mul,
    Div,

    // Logic
    And(Operand),
    Or(Operand),
    Xor(Operand),
    Rol,
    Rolc,
    Ror,
    Rorc,

    // Bit manipulation
    Set1,
    Clr1,
    Not1,

    // Branches
    Br,
    Brf,
    Bz,
    Bnz,
    Bp,
    Bpc,
    Bn,
    Be(Operand),
    Bne(Operand),
    Dbnz(Operand),
    Jmp,
    Jmpf,

    // Subroutines
    Call,
    Callf,
    Callr,
    Ret,
    Reti,
}

impl From<u8> for Instruction {
    fn from(op_code: u8) -> Self {
        let high = op_code >> 4;
        let low = op_code & 0x0F;

        if low >= 8 {
            return match high {
                0x0 | 0x1 => Self::Call,
                0x2 | 0x3 => Self::Jmp,
                0x4 | 0x5 => Self::Bpc,
                0x6 | 0x7 => Self::Bp,
                0x8 | 0x9 => Self::Bn,
                0xA | 0xB => Self::Not1,
                0xC | 0xD => Self::Clr1,
                _ => Self::Set1,
            };
        }

        let operand = Operand::from_low_nibble(low);
        match (high, low) {
            (0x0, 0) => Self::Nop,
            (0x0, 1) => Self::Br,
            (0x0, _) => Self::Ld(operand),
            (0x1, 0) => Self::Callr,
            (0x1, 1) => Self::Brf,
            (0x1, _) => Self::St(operand),
            (0x2, 0) => Self::Callf,
            (0x2, 1) => Self::Jmpf,
            (0x2, _) => Self::Mov(operand),
            (0x3, 0) => Self::Mul,
            (0x3, _) => Self::Be(operand),
            (0x4, 0) => Self::Div,
            (0x4, _) => Self::Bne(operand),
            (0x5, 0) => Self::Ldf,
            (0x5, 1) => Self::Stf,
            (0x5, _) => Self::Dbnz(operand),
            (0x6, 0 | 1) => Self::Push,
            (0x6, _) => Self::Inc(operand),
            (0x7, 0 | 1) => Self::Pop,
            (0x7, _) => Self::Dec(operand),
            (0x8, 0) => Self::Bz,
            (0x8, _) => Self::Add(operand),
            (0x9, 0) => Self::Bnz,
            (0x9, _) => Self::Addc(operand),
            (0xA, 0) => Self::Ret,
            (0xA, _) => Self::Sub(operand),
            (0xB, 0) => Self::Reti,
            (0xB, _) => Self::Subc(operand),
            (0xC, 0) => Self::Ror,
            (0xC, 1) => Self::Ldc,
            (0xC, _) => Self::Xch(operand),
            (0xD, 0) => Self::Rorc,
            (0xD, _) => Self::Or(operand),
            (0xE, 0) => Self::Rol,
            (0xE, _) => Self::And(operand),
            (0xF, 0) => Self::Rolc,
            _ => Self::Xor(operand),
        }
    }
}

impl Instruction {
    /// Machine cycles the instruction takes.
    #[must_use]
    pub const fn cycles(self) -> u8 {
        match self {
            Self::Nop
            | Self::Ld(_)
            | Self::St(_)
            | Self::Xch(_)
            | Self::Add(_)
            | Self::Addc(_)
            | Self::Sub(_)
            | Self::Subc(_)
            | Self::Inc(_)
            | Self::Dec(_)
            | Self::And(_)
            | Self::Or(_)
            | Self::Xor(_)
            | Self::Rol
            | Self::Rolc
            | Self::Ror
            | Self::Rorc
            | Self::Set1
            | Self::Clr1
            | Self::Not1 => 1,
            Self::Callr | Self::Brf => 4,
            Self::Mul | Self::Div => 7,
            _ => 2,
        }
    }

    /// Bytes the instruction occupies, opcode included.
    #[must_use]
    pub const fn size(self) -> u16 {
        match self {
            Self::Nop
            | Self::Ld(Operand::Indirect)
            | Self::St(Operand::Indirect)
            | Self::Xch(Operand::Indirect)
            | Self::Add(Operand::Indirect)
            | Self::Addc(Operand::Indirect)
            | Self::Sub(Operand::Indirect)
            | Self::Subc(Operand::Indirect)
            | Self::Inc(Operand::Indirect)
            | Self::Dec(Operand::Indirect)
            | Self::And(Operand::Indirect)
            | Self::Or(Operand::Indirect)
            | Self::Xor(Operand::Indirect)
            | Self::Mul
            | Self::Div
            | Self::Ldc
            | Self::Ldf
            | Self::Stf
            | Self::Rol
            | Self::Rolc
            | Self::Ror
            | Self::Rorc
            | Self::Ret
            | Self::Reti => 1,
            Self::Be(_)
            | Self::Bne(_)
            | Self::Mov(Operand::Direct)
            | Self::Dbnz(Operand::Direct)
            | Self::Bp
            | Self::Bpc
            | Self::Bn
            | Self::Callr
            | Self::Callf
            | Self::Brf
            | Self::Jmpf => 3,
            _ => 2,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "NOP"),
            Self::Ld(op) => write!(f, "LD {op}"),
            Self::St(op) => write!(f, "ST {op}"),
            Self::Mov(op) => write!(f, "MOV #i8,{op}"),
            Self::Push => write!(f, "PUSH d9"),
            Self::Pop => write!(f, "POP d9"),
            Self::Xch(op) => write!(f, "XCH {op}"),
            Self::Ldc => write!(f, "LDC"),
            Self::Ldf => write!(f, "LDF"),
            Self::Stf => write!(f, "STF"),
            Self::Add(op) => write!(f, "ADD {op}"),
            Self::Addc(op) => write!(f, "ADDC {op}"),
            Self::Sub(op) => write!(f, "SUB {op}"),
            Self::Subc(op) => write!(f, "SUBC {op}"),
            Self::Inc(op) => write!(f, "INC {op}"),
            Self::Dec(op) => write!(f, "DEC {op}"),
            Self::Mul => write!(f, "MUL"),
            Self::Div => write!(f, "DIV"),
            Self::And(op) => write!(f, "AND {op}"),
            Self::Or(op) => write!(f, "OR {op}"),
            Self::Xor(op) => write!(f, "XOR {op}"),
            Self::Rol => write!(f, "ROL"),
            Self::Rolc => write!(f, "ROLC"),
            Self::Ror => write!(f, "ROR"),
            Self::Rorc => write!(f, "RORC"),
            Self::Set1 => write!(f, "SET1 d9,b3"),
            Self::Clr1 => write!(f, "CLR1 d9,b3"),
            Self::Not1 => write!(f, "NOT1 d9,b3"),
            Self::Br => write!(f, "BR r8"),
            Self::Brf => write!(f, "BRF r16"),
            Self::Bz => write!(f, "BZ r8"),
            Self::Bnz => write!(f, "BNZ r8"),
            Self::Bp => write!(f, "BP d9,b3,r8"),
            Self::Bpc => write!(f, "BPC d9,b3,r8"),
            Self::Bn => write!(f, "BN d9,b3,r8"),
            Self::Be(Operand::Indirect) => write!(f, "BE @R,#i8,r8"),
            Self::Be(op) => write!(f, "BE {op},r8"),
            Self::Bne(Operand::Indirect) => write!(f, "BNE @R,#i8,r8"),
            Self::Bne(op) => write!(f, "BNE {op},r8"),
            Self::Dbnz(op) => write!(f, "DBNZ {op},r8"),
            Self::Jmp => write!(f, "JMP a12"),
            Self::Jmpf => write!(f, "JMPF a16"),
            Self::Call => write!(f, "CALL a12"),
            Self::Callf => write!(f, "CALLF a16"),
            Self::Callr => write!(f, "CALLR r16"),
            Self::Ret => write!(f, "RET"),
            Self::Reti => write!(f, "RETI"),
        }
    }
}

/// A fetched opcode byte together with its decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub instruction: Instruction,
    pub raw: u8,
}

impl From<u8> for Opcode {
    fn from(raw: u8) -> Self {
        Self {
            instruction: Instruction::from(raw),
            raw,
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}  {}", self.raw, self.instruction)
    }
}
