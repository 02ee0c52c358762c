//! The MOS 6502, as a [`romstep_core::Isa`].

mod cpu;
mod decoder;
mod executor;
mod instructions;
mod registers;
mod stack;

pub use crate::cpu::{Mos6502, Mos6502Cpu, POWER_ON_SP, RESET_VECTOR};
pub use crate::decoder::{decode, OPCODE_TABLE};
pub use crate::instructions::{AddressingMode, Mnemonic, Mos6502Instruction, OpcodeDef, Operand};
pub use crate::registers::{Mos6502Registers, StatusFlags, BREAK_BIT, UNUSED_BIT};
pub use crate::stack::{Stack, STACK_PAGE};
