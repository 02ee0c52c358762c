use std::fmt;

use crate::cpu::isa::Fault;
use crate::cpu::CpuState;

/// Read-only view of a CPU at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot<R> {
    pub registers: R,
    pub state: CpuState,
    pub halted: bool,
    /// Instructions retired since the last reset.
    pub cycle_count: u64,
    /// Machine clock cycles consumed by those instructions.
    pub clock_cycles: u64,
    pub fault: Option<Fault>,
}

impl<R: fmt::Display> fmt::Display for Snapshot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} CYC:{} CLK:{}",
            self.registers, self.cycle_count, self.clock_cycles
        )?;
        if self.halted {
            f.write_str(" HALTED")?;
        }
        if let Some(fault) = &self.fault {
            write!(f, " ({})", fault)?;
        }
        Ok(())
    }
}
