use romstep_core::{Cpu, Execution, Isa, Memory};

use crate::decoder;
use crate::executor;
use crate::instructions::Mos6502Instruction;
use crate::registers::{Mos6502Registers, StatusFlags};

/// Address of the little-endian word loaded into `PC` on reset.
pub const RESET_VECTOR: usize = 0xFFFC;
pub const POWER_ON_SP: u8 = 0xFD;

/// The NMOS 6502 instruction set.
///
/// Decimal mode can be switched off to model parts such as the Ricoh 2A03, where `SED` still
/// sets the D flag but `ADC` and `SBC` always work in binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mos6502 {
    decimal_mode: bool,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self { decimal_mode: true }
    }
}

impl Mos6502 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decimal_mode(mut self, enabled: bool) -> Self {
        self.decimal_mode = enabled;
        self
    }

    pub fn decimal_mode(&self) -> bool {
        self.decimal_mode
    }
}

impl Isa for Mos6502 {
    type Registers = Mos6502Registers;
    type Instruction = Mos6502Instruction;

    const NAME: &'static str = "MOS 6502";
    const MEMORY_SIZE: usize = 0x10000;

    fn reset(&self, registers: &mut Mos6502Registers, memory: &Memory) {
        *registers = Mos6502Registers::default();
        registers.sp.write(POWER_ON_SP);
        registers.p = StatusFlags::INTERRUPT_DISABLE;
        registers.pc.write(memory.read_u16_le(RESET_VECTOR));
    }

    fn pc(&self, registers: &Mos6502Registers) -> usize {
        registers.pc.read_as()
    }

    fn decode(&self, memory: &Memory, pc: usize) -> Mos6502Instruction {
        decoder::decode(memory, pc)
    }

    fn execute(
        &self,
        instruction: &Mos6502Instruction,
        registers: &mut Mos6502Registers,
        memory: &mut Memory,
    ) -> Execution {
        executor::execute(instruction, registers, memory, self.decimal_mode)
    }
}

pub type Mos6502Cpu = Cpu<Mos6502>;
