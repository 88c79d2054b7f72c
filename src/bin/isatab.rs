use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use isatab::isa::InstructionTable;
use isatab::loader::isa::IsaLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One line per instruction with its opcodes and operand counts.
    Summary,
    /// The whole table as JSON.
    Json,
    /// SHA-256 of the canonical table.
    Fingerprint,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Build and validate an instruction-encoding table from an .isa description"
)]
struct Opts {
    #[arg(value_name = "ISAFILE")]
    input: PathBuf,
    #[arg(short, long, value_enum, default_value_t = Format::Summary)]
    format: Format,
    /// Log build progress (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let default_level = if opts.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let table = IsaLoader::new()
        .load_table(&opts.input)
        .with_context(|| format!("failed to build {}", opts.input.display()))?;

    match opts.format {
        Format::Summary => print_summary(&table),
        Format::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        Format::Fingerprint => println!("{}", table.fingerprint_hex()),
    }
    Ok(())
}

fn print_summary(table: &InstructionTable) {
    for instr in table.iter() {
        let opcode2 = instr
            .opcode2
            .map(|value| format!("{value:#x}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<24} {:#06x} {:>5} srcs={} dests={} sr={} mods={} shift={} mask={:#x}",
            instr.name,
            instr.opcode,
            opcode2,
            instr.sources.len(),
            instr.dests.len(),
            instr.staging.len(),
            instr.modifiers.len(),
            instr.secondary_shift(),
            instr.secondary_mask(),
        );
    }
    println!(
        "{} instructions, {} enums, {} immediates, {} warnings",
        table.len(),
        table.enums().len(),
        table.immediates().len(),
        table.warnings().len()
    );
}
