//! Interactive line-based debugger shell.

pub mod command;

use crate::display::{Disassembly, ErrorChain, HexDump, RegisterTable};
use command::{Command, HELP};
use log::{debug, info};
use poly_riscv_core::{abi, Machine};
use std::io::{self, BufRead, Write};

/// Steps of a single `step` command up to which each executed instruction is printed.
const MAX_ECHOED_STEPS: u64 = 32;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Reads commands from `input` until `quit` or end of input, writing responses to `output`.
pub fn run<R: BufRead, W: Write>(
    machine: &mut Machine,
    mut input: R,
    mut output: W,
) -> io::Result<()> {
    let mut last_command: Option<Command> = None;
    let mut line = String::new();
    loop {
        write!(output, "({:#010x}) > ", machine.pc())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        let command = match line.trim() {
            "" => match &last_command {
                Some(command) => command.clone(),
                None => continue,
            },
            command_str => match command_str.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    writeln!(output, "{e}")?;
                    continue;
                }
            },
        };
        debug!("running command `{command}`");
        last_command = Some(command.clone());

        if execute(machine, &command, &mut output)? == Flow::Quit {
            return Ok(());
        }
    }
}

fn execute<W: Write>(machine: &mut Machine, command: &Command, output: &mut W) -> io::Result<Flow> {
    match *command {
        Command::Step(count) => {
            let mut executed = 0;
            while executed < count {
                let pc = machine.pc();
                match machine.step() {
                    Ok(instruction) => {
                        if count <= MAX_ECHOED_STEPS {
                            writeln!(output, "{pc:#010x}: {instruction}")?;
                        }
                    }
                    Err(e) => {
                        writeln!(output, "error: {}", ErrorChain(&e))?;
                        break;
                    }
                }
                executed += 1;
            }
            if count > MAX_ECHOED_STEPS {
                writeln!(output, "executed {executed} instructions")?;
            }
            info!("pc = {:#010x} after {executed} steps", machine.pc());
        }
        Command::Registers => write!(output, "{}", RegisterTable(machine.registers()))?,
        Command::Register(specifier) => {
            let value = machine.registers().x(specifier);
            writeln!(
                output,
                "{} ({specifier}) = {value:#010x} ({})",
                abi::name(specifier),
                value as i32
            )?;
        }
        Command::Pc => writeln!(output, "{:#010x}", machine.pc())?,
        Command::Memory { address, len } => match machine.read_memory(address, len) {
            Ok(bytes) => write!(output, "{}", HexDump { address, bytes })?,
            Err(e) => writeln!(output, "error: {e}")?,
        },
        Command::Disassemble { address, count } => {
            let listing = Disassembly {
                memory: machine.memory(),
                address: address.unwrap_or(machine.pc()),
                count,
                pc: machine.pc(),
            };
            write!(output, "{listing}")?;
        }
        Command::Reset => {
            machine.reset();
            writeln!(output, "machine reset, pc = {:#010x}", machine.pc())?;
        }
        Command::Help => writeln!(output, "{HELP}")?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}
