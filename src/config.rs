use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing_subscriber::filter::LevelFilter;

/// Steps through a 6502 ROM image, printing a register snapshot before every instruction.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "romstep", version)]
pub struct Args {
    /// ROM image to load.
    #[arg(value_name = "ROM")]
    pub rom: PathBuf,

    /// Number of instructions to step.
    #[arg(default_value_t = 25)]
    pub steps: u64,

    /// Address the image is loaded at (hex with a 0x prefix, or decimal).
    #[arg(long, value_name = "ADDR", default_value = "0", value_parser = parse_address)]
    pub base: u16,

    /// Write ADDR into the reset vector before resetting.
    #[arg(long, value_name = "ADDR", value_parser = parse_address)]
    pub entry: Option<u16>,

    /// Ignore the D flag in ADC/SBC, like the Ricoh 2A03.
    #[arg(long, default_value_t = false)]
    pub no_decimal: bool,

    /// Stop stepping as soon as the CPU halts.
    #[arg(long, default_value_t = false)]
    pub stop_on_halt: bool,

    /// More log output on stderr (repeatable).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

impl Args {
    pub fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

pub fn parse_address(text: &str) -> Result<u16, String> {
    let text = text.trim();
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", text, e))
}
