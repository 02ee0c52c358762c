use std::fmt;

use romstep_core::Instruction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

impl Mnemonic {
    pub fn name(&self) -> &'static str {
        match self {
            Mnemonic::Adc => "ADC",
            Mnemonic::And => "AND",
            Mnemonic::Asl => "ASL",
            Mnemonic::Bcc => "BCC",
            Mnemonic::Bcs => "BCS",
            Mnemonic::Beq => "BEQ",
            Mnemonic::Bit => "BIT",
            Mnemonic::Bmi => "BMI",
            Mnemonic::Bne => "BNE",
            Mnemonic::Bpl => "BPL",
            Mnemonic::Brk => "BRK",
            Mnemonic::Bvc => "BVC",
            Mnemonic::Bvs => "BVS",
            Mnemonic::Clc => "CLC",
            Mnemonic::Cld => "CLD",
            Mnemonic::Cli => "CLI",
            Mnemonic::Clv => "CLV",
            Mnemonic::Cmp => "CMP",
            Mnemonic::Cpx => "CPX",
            Mnemonic::Cpy => "CPY",
            Mnemonic::Dec => "DEC",
            Mnemonic::Dex => "DEX",
            Mnemonic::Dey => "DEY",
            Mnemonic::Eor => "EOR",
            Mnemonic::Inc => "INC",
            Mnemonic::Inx => "INX",
            Mnemonic::Iny => "INY",
            Mnemonic::Jmp => "JMP",
            Mnemonic::Jsr => "JSR",
            Mnemonic::Lda => "LDA",
            Mnemonic::Ldx => "LDX",
            Mnemonic::Ldy => "LDY",
            Mnemonic::Lsr => "LSR",
            Mnemonic::Nop => "NOP",
            Mnemonic::Ora => "ORA",
            Mnemonic::Pha => "PHA",
            Mnemonic::Php => "PHP",
            Mnemonic::Pla => "PLA",
            Mnemonic::Plp => "PLP",
            Mnemonic::Rol => "ROL",
            Mnemonic::Ror => "ROR",
            Mnemonic::Rti => "RTI",
            Mnemonic::Rts => "RTS",
            Mnemonic::Sbc => "SBC",
            Mnemonic::Sec => "SEC",
            Mnemonic::Sed => "SED",
            Mnemonic::Sei => "SEI",
            Mnemonic::Sta => "STA",
            Mnemonic::Stx => "STX",
            Mnemonic::Sty => "STY",
            Mnemonic::Tax => "TAX",
            Mnemonic::Tay => "TAY",
            Mnemonic::Tsx => "TSX",
            Mnemonic::Txa => "TXA",
            Mnemonic::Txs => "TXS",
            Mnemonic::Tya => "TYA",
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Mnemonic::Bcc
                | Mnemonic::Bcs
                | Mnemonic::Beq
                | Mnemonic::Bmi
                | Mnemonic::Bne
                | Mnemonic::Bpl
                | Mnemonic::Bvc
                | Mnemonic::Bvs
        )
    }

    /// Branches, jumps, calls and returns. `BRK` is not included: it halts the machine with
    /// the program counter just past itself.
    pub fn is_control_flow(&self) -> bool {
        self.is_branch()
            || matches!(
                self,
                Mnemonic::Jmp | Mnemonic::Jsr | Mnemonic::Rts | Mnemonic::Rti
            )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub const fn operand_len(&self) -> usize {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndirectX
            | AddressingMode::IndirectY
            | AddressingMode::Relative => 1,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
        }
    }
}

/// One row of the opcode table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpcodeDef {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Base machine cycles.
    pub cycles: u8,
    /// One extra cycle when indexing crosses a page boundary.
    pub page_penalty: bool,
}

impl OpcodeDef {
    pub const fn len_bytes(&self) -> usize {
        1 + self.mode.operand_len()
    }
}

/// A decoded operand, still in its encoded form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Implied,
    Accumulator,
    Immediate(u8),
    ZeroPage(u8),
    ZeroPageX(u8),
    ZeroPageY(u8),
    Absolute(u16),
    AbsoluteX(u16),
    AbsoluteY(u16),
    Indirect(u16),
    IndirectX(u8),
    IndirectY(u8),
    Relative(i8),
}

impl Operand {
    /// Builds the operand for `mode` from the bytes following the opcode.
    pub fn from_bytes(mode: AddressingMode, lo: u8, hi: u8) -> Self {
        let word = u16::from_le_bytes([lo, hi]);
        match mode {
            AddressingMode::Implied => Operand::Implied,
            AddressingMode::Accumulator => Operand::Accumulator,
            AddressingMode::Immediate => Operand::Immediate(lo),
            AddressingMode::ZeroPage => Operand::ZeroPage(lo),
            AddressingMode::ZeroPageX => Operand::ZeroPageX(lo),
            AddressingMode::ZeroPageY => Operand::ZeroPageY(lo),
            AddressingMode::Absolute => Operand::Absolute(word),
            AddressingMode::AbsoluteX => Operand::AbsoluteX(word),
            AddressingMode::AbsoluteY => Operand::AbsoluteY(word),
            AddressingMode::Indirect => Operand::Indirect(word),
            AddressingMode::IndirectX => Operand::IndirectX(lo),
            AddressingMode::IndirectY => Operand::IndirectY(lo),
            AddressingMode::Relative => Operand::Relative(lo as i8),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Implied => Ok(()),
            Operand::Accumulator => f.write_str(" A"),
            Operand::Immediate(value) => write!(f, " #${:02X}", value),
            Operand::ZeroPage(address) => write!(f, " ${:02X}", address),
            Operand::ZeroPageX(address) => write!(f, " ${:02X},X", address),
            Operand::ZeroPageY(address) => write!(f, " ${:02X},Y", address),
            Operand::Absolute(address) => write!(f, " ${:04X}", address),
            Operand::AbsoluteX(address) => write!(f, " ${:04X},X", address),
            Operand::AbsoluteY(address) => write!(f, " ${:04X},Y", address),
            Operand::Indirect(address) => write!(f, " (${:04X})", address),
            Operand::IndirectX(address) => write!(f, " (${:02X},X)", address),
            Operand::IndirectY(address) => write!(f, " (${:02X}),Y", address),
            Operand::Relative(offset) => write!(f, " *{:+}", offset),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mos6502Instruction {
    Op {
        opcode: u8,
        def: OpcodeDef,
        operand: Operand,
    },
    /// A byte with no documented meaning.
    Illegal(u8),
}

impl Mos6502Instruction {
    pub fn mnemonic(&self) -> Option<Mnemonic> {
        match self {
            Mos6502Instruction::Op { def, .. } => Some(def.mnemonic),
            Mos6502Instruction::Illegal(_) => None,
        }
    }
}

impl Instruction for Mos6502Instruction {
    fn len_bytes(&self) -> usize {
        match self {
            Mos6502Instruction::Op { def, .. } => def.len_bytes(),
            Mos6502Instruction::Illegal(_) => 1,
        }
    }

    fn is_control_flow(&self) -> bool {
        self.mnemonic().is_some_and(|mnemonic| mnemonic.is_control_flow())
    }

    fn is_illegal(&self) -> bool {
        matches!(self, Mos6502Instruction::Illegal(_))
    }
}

impl fmt::Display for Mos6502Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mos6502Instruction::Op { def, operand, .. } => {
                write!(f, "{}{}", def.mnemonic, operand)
            }
            Mos6502Instruction::Illegal(opcode) => write!(f, "??? (0x{:02X})", opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(
        opcode: u8,
        mnemonic: Mnemonic,
        mode: AddressingMode,
        lo: u8,
        hi: u8,
    ) -> Mos6502Instruction {
        Mos6502Instruction::Op {
            opcode,
            def: OpcodeDef {
                mnemonic,
                mode,
                cycles: 2,
                page_penalty: false,
            },
            operand: Operand::from_bytes(mode, lo, hi),
        }
    }

    #[test]
    fn operand_lengths() {
        assert_eq!(op(0xEA, Mnemonic::Nop, AddressingMode::Implied, 0, 0).len_bytes(), 1);
        assert_eq!(op(0xA9, Mnemonic::Lda, AddressingMode::Immediate, 0, 0).len_bytes(), 2);
        assert_eq!(op(0x4C, Mnemonic::Jmp, AddressingMode::Absolute, 0, 0).len_bytes(), 3);
        assert_eq!(Mos6502Instruction::Illegal(0x02).len_bytes(), 1);
    }

    #[test]
    fn relative_operand_is_signed() {
        assert_eq!(
            Operand::from_bytes(AddressingMode::Relative, 0xFE, 0x00),
            Operand::Relative(-2)
        );
    }

    #[test]
    fn display() {
        assert_eq!(
            op(0xA9, Mnemonic::Lda, AddressingMode::Immediate, 0x10, 0).to_string(),
            "LDA #$10"
        );
        assert_eq!(
            op(0x9D, Mnemonic::Sta, AddressingMode::AbsoluteX, 0x34, 0x12).to_string(),
            "STA $1234,X"
        );
        assert_eq!(
            op(0xB1, Mnemonic::Lda, AddressingMode::IndirectY, 0x80, 0).to_string(),
            "LDA ($80),Y"
        );
        assert_eq!(
            op(0xD0, Mnemonic::Bne, AddressingMode::Relative, 0xFB, 0).to_string(),
            "BNE *-5"
        );
        assert_eq!(
            op(0x0A, Mnemonic::Asl, AddressingMode::Accumulator, 0, 0).to_string(),
            "ASL A"
        );
        assert_eq!(Mos6502Instruction::Illegal(0xFF).to_string(), "??? (0xFF)");
    }

    #[test]
    fn control_flow_classification() {
        assert!(Mnemonic::Beq.is_control_flow());
        assert!(Mnemonic::Jsr.is_control_flow());
        assert!(Mnemonic::Rti.is_control_flow());
        assert!(!Mnemonic::Brk.is_control_flow());
        assert!(!Mnemonic::Lda.is_control_flow());
        assert!(!Mos6502Instruction::Illegal(0x02).is_control_flow());
    }
}
