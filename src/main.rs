use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use romstep_6502::{Mos6502, Mos6502Cpu, RESET_VECTOR};
use romstep_core::{Isa, StepOutcome};
use tracing_subscriber::prelude::*;

mod config;
mod loader;

use crate::config::Args;

/// Prints the snapshot, then steps, `steps` times. Returns the number of instructions that
/// actually ran.
fn drive<W: Write>(
    cpu: &mut Mos6502Cpu,
    steps: u64,
    stop_on_halt: bool,
    out: &mut W,
) -> io::Result<u64> {
    let mut executed = 0;
    for _ in 0..steps {
        if stop_on_halt && cpu.is_halted() {
            break;
        }
        writeln!(out, "{}", cpu.snapshot())?;
        if matches!(cpu.step(), StepOutcome::Executed | StepOutcome::Halted) {
            executed += 1;
        }
    }
    out.flush()?;
    Ok(executed)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let stderr_format = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(args.level_filter());
    tracing_subscriber::registry().with(stderr_format).init();

    let rom = loader::read_rom(&args.rom, Mos6502::MEMORY_SIZE)?;
    let isa = Mos6502::new().with_decimal_mode(!args.no_decimal);
    let mut cpu = Mos6502Cpu::new(isa);
    cpu.load(&rom, usize::from(args.base))
        .with_context(|| format!("loading {} at 0x{:04X}", args.rom.display(), args.base))?;
    if let Some(entry) = args.entry {
        cpu.load(&entry.to_le_bytes(), RESET_VECTOR)
            .context("writing the reset vector")?;
    }
    cpu.reset();

    tracing::info!(
        "stepping {} for up to {} instructions",
        args.rom.display(),
        args.steps
    );
    let stdout = io::stdout();
    let executed = drive(&mut cpu, args.steps, args.stop_on_halt, &mut stdout.lock())
        .context("writing snapshots")?;
    tracing::info!("{} instructions executed, final state: {}", executed, cpu.snapshot());
    Ok(())
}
