use std::fmt;

use thiserror::Error;

use crate::memory::Memory;

/// A decoded instruction, alive for exactly one decode/execute cycle.
pub trait Instruction: Clone + fmt::Debug + fmt::Display + PartialEq {
    /// Encoded length, including the opcode.
    fn len_bytes(&self) -> usize;

    /// True for branches, jumps, calls and returns: the only instructions allowed to move
    /// the program counter anywhere other than past themselves.
    fn is_control_flow(&self) -> bool;

    fn is_illegal(&self) -> bool;
}

/// Conditions raised by the emulated machine itself. These halt the machine and are
/// reported through the snapshot; they are never host errors.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum Fault {
    #[error("illegal opcode 0x{opcode:02X} at 0x{address:04X}")]
    IllegalOpcode { opcode: u8, address: usize },
}

/// What happened when an instruction was executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Execution {
    Continue { cycles: u32 },
    Halt { cycles: u32 },
    Fault(Fault),
}

/// An instruction set: the data-driven half of a CPU.
///
/// The aggregate [`Cpu`](crate::Cpu) only knows how to sequence reset, decode and
/// execute; everything machine-specific (register layout, address space, opcode table,
/// reset vector) lives behind this trait.
pub trait Isa: fmt::Debug {
    /// `Default` must be the all-zero, never-reset register file.
    type Registers: Clone + Default + fmt::Debug + fmt::Display + PartialEq;
    type Instruction: Instruction;

    const NAME: &'static str;
    const MEMORY_SIZE: usize;

    /// Puts `registers` into their power-on state. May read `memory` (reset vectors) but
    /// never writes it.
    fn reset(&self, registers: &mut Self::Registers, memory: &Memory);

    fn pc(&self, registers: &Self::Registers) -> usize;

    /// Pure: the same memory and `pc` always decode to the same instruction.
    fn decode(&self, memory: &Memory, pc: usize) -> Self::Instruction;

    /// Applies `instruction`, which was decoded at the current program counter.
    ///
    /// On [`Execution::Fault`] the implementation must leave `registers` and `memory`
    /// untouched.
    fn execute(
        &self,
        instruction: &Self::Instruction,
        registers: &mut Self::Registers,
        memory: &mut Memory,
    ) -> Execution;
}
