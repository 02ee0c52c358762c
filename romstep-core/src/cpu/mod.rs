pub mod isa;
pub mod snapshot;

use crate::error::Result;
use crate::memory::Memory;

use self::isa::{Execution, Fault, Isa};
use self::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CpuState {
    Uninitialized,
    Reset,
    Running,
    Halted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    Executed,
    /// The instruction just executed halted the machine.
    Halted,
    /// The instruction could not be executed; the machine is now halted.
    Faulted(Fault),
    /// The machine was already halted, nothing happened.
    AlreadyHalted,
}

/// A single emulated processor: memory, registers and the bookkeeping needed to step it.
///
/// The whole driving contract is [`Cpu::load`], [`Cpu::reset`], [`Cpu::step`] and
/// [`Cpu::snapshot`]. Each instance owns its memory outright, so independent machines
/// never share state.
#[derive(Clone, Debug)]
pub struct Cpu<I: Isa> {
    isa: I,
    memory: Memory,
    registers: I::Registers,
    state: CpuState,
    cycle_count: u64,
    clock_cycles: u64,
    fault: Option<Fault>,
}

impl<I: Isa> Cpu<I> {
    pub fn new(isa: I) -> Self {
        Self {
            isa,
            memory: Memory::new(I::MEMORY_SIZE),
            registers: I::Registers::default(),
            state: CpuState::Uninitialized,
            cycle_count: 0,
            clock_cycles: 0,
            fault: None,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn registers(&self) -> &I::Registers {
        &self.registers
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Places a program image in memory. Memory survives [`Cpu::reset`], so this is
    /// normally called once, before the first reset.
    pub fn load(&mut self, data: &[u8], base: usize) -> Result<()> {
        self.memory.load(data, base)?;
        tracing::debug!(
            "loaded {} bytes into {} memory at 0x{:04X}",
            data.len(),
            I::NAME,
            base
        );
        Ok(())
    }

    /// Returns registers to their power-on values and clears the halt latch and counters.
    /// Memory is left alone.
    pub fn reset(&mut self) {
        self.isa.reset(&mut self.registers, &self.memory);
        self.state = CpuState::Reset;
        self.cycle_count = 0;
        self.clock_cycles = 0;
        self.fault = None;
        tracing::debug!(
            "{} reset, pc = 0x{:04X}",
            I::NAME,
            self.isa.pc(&self.registers)
        );
    }

    /// Executes exactly one instruction. A halted CPU ignores the call.
    pub fn step(&mut self) -> StepOutcome {
        if self.is_halted() {
            tracing::trace!("step ignored, {} is halted", I::NAME);
            return StepOutcome::AlreadyHalted;
        }

        let pc = self.isa.pc(&self.registers);
        let instruction = self.isa.decode(&self.memory, pc);
        tracing::trace!("cycle {} | 0x{:04X}: {}", self.cycle_count, pc, instruction);

        let outcome = match self
            .isa
            .execute(&instruction, &mut self.registers, &mut self.memory)
        {
            Execution::Continue { cycles } => {
                self.retire(cycles);
                self.state = CpuState::Running;
                StepOutcome::Executed
            }
            Execution::Halt { cycles } => {
                self.retire(cycles);
                self.state = CpuState::Halted;
                tracing::debug!("{} halted by instruction at 0x{:04X}", I::NAME, pc);
                StepOutcome::Halted
            }
            Execution::Fault(fault) => {
                self.fault = Some(fault);
                self.state = CpuState::Halted;
                tracing::warn!("{} halted: {}", I::NAME, fault);
                StepOutcome::Faulted(fault)
            }
        };

        debug_assert!(self.isa.pc(&self.registers) < I::MEMORY_SIZE);
        outcome
    }

    pub fn snapshot(&self) -> Snapshot<I::Registers> {
        Snapshot {
            registers: self.registers.clone(),
            state: self.state,
            halted: self.is_halted(),
            cycle_count: self.cycle_count,
            clock_cycles: self.clock_cycles,
            fault: self.fault,
        }
    }

    fn retire(&mut self, cycles: u32) {
        self.cycle_count += 1;
        self.clock_cycles += u64::from(cycles);
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use rand::Rng;

    use super::isa::{Execution, Fault, Instruction, Isa};
    use super::{Cpu, CpuState, StepOutcome};
    use crate::memory::{Memory, MemoryError};
    use crate::register::Reg8;
    use crate::CpuError;

    // A four-instruction accumulator machine with a 256-byte address space.
    #[derive(Clone, Copy, Debug, Default)]
    struct Toy;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct ToyRegisters {
        pc: Reg8,
        acc: Reg8,
    }

    impl fmt::Display for ToyRegisters {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "PC:{} ACC:{}", self.pc, self.acc)
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum ToyInstruction {
        Nop,
        Add(u8),
        Jump(u8),
        Halt,
        Illegal(u8),
    }

    impl fmt::Display for ToyInstruction {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt::Debug::fmt(self, f)
        }
    }

    impl Instruction for ToyInstruction {
        fn len_bytes(&self) -> usize {
            match self {
                ToyInstruction::Add(_) | ToyInstruction::Jump(_) => 2,
                _ => 1,
            }
        }

        fn is_control_flow(&self) -> bool {
            matches!(self, ToyInstruction::Jump(_))
        }

        fn is_illegal(&self) -> bool {
            matches!(self, ToyInstruction::Illegal(_))
        }
    }

    impl Isa for Toy {
        type Registers = ToyRegisters;
        type Instruction = ToyInstruction;

        const NAME: &'static str = "toy";
        const MEMORY_SIZE: usize = 0x100;

        fn reset(&self, registers: &mut ToyRegisters, memory: &Memory) {
            *registers = ToyRegisters {
                pc: Reg8::new(memory.read_u8(0xFE)),
                acc: Reg8::default(),
            };
        }

        fn pc(&self, registers: &ToyRegisters) -> usize {
            registers.pc.read_as()
        }

        fn decode(&self, memory: &Memory, pc: usize) -> ToyInstruction {
            match memory.read_u8(pc) {
                0x00 => ToyInstruction::Nop,
                0x01 => ToyInstruction::Add(memory.read_u8(pc + 1)),
                0x02 => ToyInstruction::Jump(memory.read_u8(pc + 1)),
                0xFF => ToyInstruction::Halt,
                other => ToyInstruction::Illegal(other),
            }
        }

        fn execute(
            &self,
            instruction: &ToyInstruction,
            registers: &mut ToyRegisters,
            _memory: &mut Memory,
        ) -> Execution {
            let len = instruction.len_bytes() as u8;
            match instruction {
                ToyInstruction::Nop => {
                    registers.pc.wrapping_add(len);
                }
                ToyInstruction::Add(value) => {
                    registers.acc.wrapping_add(*value);
                    registers.pc.wrapping_add(len);
                }
                ToyInstruction::Jump(target) => registers.pc.write(*target),
                ToyInstruction::Halt => {
                    registers.pc.wrapping_add(len);
                    return Execution::Halt { cycles: 1 };
                }
                ToyInstruction::Illegal(opcode) => {
                    return Execution::Fault(Fault::IllegalOpcode {
                        opcode: *opcode,
                        address: registers.pc.read_as(),
                    })
                }
            }
            Execution::Continue { cycles: 2 }
        }
    }

    fn toy_with(program: &[u8]) -> Cpu<Toy> {
        let mut cpu = Cpu::new(Toy);
        cpu.load(program, 0).unwrap();
        cpu.reset();
        cpu
    }

    #[test]
    fn new_is_uninitialized() {
        let cpu = Cpu::new(Toy);
        let snapshot = cpu.snapshot();
        assert_eq!(snapshot.state, CpuState::Uninitialized);
        assert_eq!(snapshot.registers, ToyRegisters::default());
        assert!(!snapshot.halted);
        assert_eq!(snapshot.cycle_count, 0);
        assert_eq!(snapshot.fault, None);
    }

    #[test]
    fn load_out_of_bounds_fails() {
        let mut cpu = Cpu::new(Toy);
        let result = cpu.load(&[0; 4], 0xFE);
        assert_eq!(
            result,
            Err(CpuError::Memory(MemoryError::OutOfBounds {
                base: 0xFE,
                length: 4,
                size: 0x100,
            }))
        );
        assert_eq!(cpu.memory(), &Memory::new(0x100));
    }

    #[test]
    fn nop_then_halt() {
        let mut cpu = toy_with(&[0x00, 0xFF]);
        assert_eq!(cpu.state(), CpuState::Reset);

        assert_eq!(cpu.step(), StepOutcome::Executed);
        assert_eq!(cpu.registers().pc.read(), 1);
        assert_eq!(cpu.state(), CpuState::Running);

        assert_eq!(cpu.step(), StepOutcome::Halted);
        let halted = cpu.snapshot();
        assert!(halted.halted);
        assert_eq!(halted.cycle_count, 2);
        assert_eq!(halted.clock_cycles, 3);

        assert_eq!(cpu.step(), StepOutcome::AlreadyHalted);
        assert_eq!(cpu.snapshot(), halted);
    }

    #[test]
    fn illegal_opcode_faults_without_touching_registers() {
        let mut cpu = toy_with(&[0x01, 0x05, 0x7A]);
        cpu.step();
        let before = cpu.snapshot();

        assert_eq!(
            cpu.step(),
            StepOutcome::Faulted(Fault::IllegalOpcode {
                opcode: 0x7A,
                address: 2,
            })
        );
        let after = cpu.snapshot();
        assert!(after.halted);
        assert_eq!(after.registers, before.registers);
        assert_eq!(after.cycle_count, before.cycle_count);
        assert_eq!(
            after.fault,
            Some(Fault::IllegalOpcode {
                opcode: 0x7A,
                address: 2,
            })
        );
    }

    #[test]
    fn reset_clears_halt_and_counters_but_keeps_memory() {
        let mut cpu = toy_with(&[0x01, 0x10, 0xFF]);
        cpu.step();
        cpu.step();
        assert!(cpu.is_halted());

        cpu.reset();
        let snapshot = cpu.snapshot();
        assert_eq!(snapshot.state, CpuState::Reset);
        assert_eq!(snapshot.registers, ToyRegisters::default());
        assert_eq!(snapshot.cycle_count, 0);
        assert_eq!(snapshot.clock_cycles, 0);
        assert_eq!(cpu.memory().read(0, 3), vec![0x01, 0x10, 0xFF]);

        assert_eq!(cpu.step(), StepOutcome::Executed);
        assert_eq!(cpu.registers().acc.read(), 0x10);
    }

    #[test]
    fn reset_reads_vector() {
        let mut cpu = Cpu::new(Toy);
        cpu.load(&[0x40], 0xFE).unwrap();
        cpu.reset();
        assert_eq!(cpu.registers().pc.read(), 0x40);
    }

    #[test]
    fn step_before_reset_runs_from_zero() {
        let mut cpu = Cpu::new(Toy);
        cpu.load(&[0x01, 0x03], 0).unwrap();
        assert_eq!(cpu.step(), StepOutcome::Executed);
        assert_eq!(cpu.state(), CpuState::Running);
        assert_eq!(cpu.registers().acc.read(), 3);
    }

    #[test]
    fn pc_wraps_at_end_of_memory() {
        // the reset vector points at an ADD whose operand byte wraps around to address 0
        let mut cpu = Cpu::new(Toy);
        cpu.load(&[0x07], 0x00).unwrap();
        cpu.load(&[0xFF, 0x01], 0xFE).unwrap();
        cpu.reset();
        assert_eq!(cpu.registers().pc.read(), 0xFF);
        cpu.step();
        assert_eq!(cpu.registers().acc.read(), 0x07);
        assert_eq!(cpu.registers().pc.read(), 0x01);
    }

    #[test]
    fn stepping_is_deterministic() {
        let mut program = [0u8; 0x100];
        let mut rng = rand::thread_rng();
        for byte in program.iter_mut() {
            *byte = match rng.gen_range(0..4) {
                0 => 0x00,
                1 => 0x01,
                2 => 0x02,
                _ => rng.gen(),
            };
        }

        let mut a = Cpu::new(Toy);
        let mut b = Cpu::new(Toy);
        a.load(&program, 0).unwrap();
        b.load(&program, 0).unwrap();
        a.reset();
        b.reset();
        for _ in 0..512 {
            assert_eq!(a.snapshot(), b.snapshot());
            assert_eq!(a.step(), b.step());
        }
        assert_eq!(a.memory(), b.memory());
    }

    #[test]
    fn snapshot_display() {
        let mut cpu = toy_with(&[0x01, 0x2A, 0x33]);
        assert_eq!(cpu.snapshot().to_string(), "PC:00 ACC:00 CYC:0 CLK:0");
        cpu.step();
        cpu.step();
        assert_eq!(
            cpu.snapshot().to_string(),
            "PC:02 ACC:2A CYC:1 CLK:2 HALTED (illegal opcode 0x33 at 0x0002)"
        );
    }
}
