mod cpu;
mod error;
mod memory;
mod register;

pub use crate::cpu::isa::{Execution, Fault, Instruction, Isa};
pub use crate::cpu::snapshot::Snapshot;
pub use crate::cpu::{Cpu, CpuState, StepOutcome};
pub use crate::error::{CpuError, Result};
pub use crate::memory::{Memory, MemoryError};
pub use crate::register::{Reg16, Reg8, Register};
