mod display;
mod elf;
mod repl;

use clap::Parser;
use display::{ErrorChain, RegisterTable};
use elf::ElfError;
use log::{error, info, warn};
use poly_riscv_core::{Config, ConstructionError, LoadError, Machine, StepError};
use std::path::PathBuf;
use std::process::ExitCode;
use stderrlog::LogLevelNum;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Program to execute, a flat image of little-endian instruction words loaded at address 0.
    binary: PathBuf,
    /// Treat the binary as an ELF file and load its segments instead.
    #[arg(short, long)]
    elf: bool,
    /// Size of memory in bytes.
    #[arg(long, default_value = "0x10000", value_parser = parse_size)]
    mem_size: usize,
    /// Size of the stack at the top of memory in bytes.
    #[arg(long, default_value = "0x8000", value_parser = parse_size)]
    stack_size: usize,
    /// Fill memory with a marker pattern instead of zeroes.
    #[arg(long)]
    no_zero_fill: bool,
    /// Reject loads and stores that are not naturally aligned.
    #[arg(long)]
    strict_alignment: bool,
    /// Execute this many instructions, print the registers and exit, instead of starting the
    /// interactive shell.
    #[arg(long)]
    steps: Option<u64>,
    /// Increase log verbosity. May be repeated.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load ELF file")]
    Elf(#[from] ElfError),
    #[error("invalid machine configuration")]
    Construction(#[from] ConstructionError),
    #[error("failed to load program")]
    Load(#[from] LoadError),
    #[error("execution stopped")]
    Step(#[from] StepError),
    #[error("terminal i/o failed")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let verbosity = match args.verbose {
        0 => LogLevelNum::Warn,
        1 => LogLevelNum::Info,
        2 => LogLevelNum::Debug,
        _ => LogLevelNum::Trace,
    };
    if let Err(e) = stderrlog::new()
        .verbosity(verbosity)
        .modules([module_path!(), "poly_riscv_core"])
        .init()
    {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", ErrorChain(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let buf = std::fs::read(&args.binary).map_err(|source| CliError::Read {
        path: args.binary.clone(),
        source,
    })?;
    let image = if args.elf {
        let image = elf::flatten(&buf)?;
        if image.base != 0 {
            warn!(
                "ELF image based at {:#x} is loaded at address 0 instead",
                image.base
            );
        }
        image.data
    } else {
        buf
    };

    let mut machine = Machine::new(Config {
        mem_size: args.mem_size,
        stack_size: args.stack_size,
        zero_fill: !args.no_zero_fill,
        support_misaligned_memory_access: !args.strict_alignment,
    })?;
    machine.load_program(&image)?;
    machine.reset();
    info!(
        "loaded {} bytes from {}",
        image.len(),
        args.binary.display()
    );

    match args.steps {
        Some(steps) => run_steps(&mut machine, steps),
        None => {
            let stdin = std::io::stdin();
            repl::run(&mut machine, stdin.lock(), std::io::stdout())?;
            Ok(())
        }
    }
}

fn run_steps(machine: &mut Machine, steps: u64) -> Result<(), CliError> {
    let result = (0..steps).try_for_each(|_| machine.step().map(|_| ()));
    print!("{}", RegisterTable(machine.registers()));
    result.map_err(CliError::from)
}

fn parse_size(s: &str) -> Result<usize, String> {
    let n = repl::command::parse_number(s).map_err(|e| format!("`{s}`: {e}"))?;
    usize::try_from(n).map_err(|_| format!("`{s}` is too large"))
}
