use poly_riscv_core::abi;
use poly_riscv_core::registers::Specifier;
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Number of bytes shown by `mem` if no length is given.
pub const DEFAULT_DUMP_LEN: usize = 64;

/// Number of instructions shown by `dis` if no count is given.
pub const DEFAULT_DISASSEMBLY_COUNT: usize = 8;

pub const HELP: &str = "\
commands:
  s, step [n]            execute n instructions (default 1)
  r, regs                show all registers
  reg <name>             show one register, by ABI name or as x0..x31
  pc                     show the program counter
  m, mem <addr> [len]    dump len bytes of memory (default 64)
  d, dis [addr] [count]  disassemble count instructions (default: 8 at the pc)
  reset                  reset the registers, keeping memory
  h, help                show this message
  q, quit                exit
an empty line repeats the previous command, numbers may be given in decimal or 0x hex";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Step(u64),
    Registers,
    Register(Specifier),
    Pc,
    Memory { address: u32, len: usize },
    Disassemble { address: Option<u32>, count: usize },
    Reset,
    Help,
    Quit,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Step(count) => write!(f, "step {count}"),
            Command::Registers => write!(f, "regs"),
            Command::Register(specifier) => write!(f, "reg {}", abi::name(*specifier)),
            Command::Pc => write!(f, "pc"),
            Command::Memory { address, len } => write!(f, "mem {address:#x} {len}"),
            Command::Disassemble {
                address: Some(address),
                count,
            } => write!(f, "dis {address:#x} {count}"),
            Command::Disassemble { address: None, .. } => write!(f, "dis"),
            Command::Reset => write!(f, "reset"),
            Command::Help => write!(f, "help"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?;
        let args: Vec<&str> = words.collect();

        let command = match name {
            "s" | "step" => {
                expect_at_most("step", &args, 1)?;
                let count = args.first().map(|n| number(n)).transpose()?;
                Command::Step(count.unwrap_or(1))
            }
            "r" | "regs" => {
                expect_at_most("regs", &args, 0)?;
                Command::Registers
            }
            "reg" => {
                expect_at_most("reg", &args, 1)?;
                let name = args.first().ok_or(ParseError::MissingArgument {
                    command: "reg",
                    expected: "a register name",
                })?;
                let specifier =
                    abi::parse(name).ok_or_else(|| ParseError::UnknownRegister(name.to_string()))?;
                Command::Register(specifier)
            }
            "pc" => {
                expect_at_most("pc", &args, 0)?;
                Command::Pc
            }
            "m" | "mem" => {
                expect_at_most("mem", &args, 2)?;
                let address = args.first().ok_or(ParseError::MissingArgument {
                    command: "mem",
                    expected: "an address",
                })?;
                let len = args.get(1).map(|n| number(n)).transpose()?;
                Command::Memory {
                    address: address32(address)?,
                    len: len.map_or(Ok(DEFAULT_DUMP_LEN), |n| to_usize(n, args[1]))?,
                }
            }
            "d" | "dis" => {
                expect_at_most("dis", &args, 2)?;
                let address = args.first().map(|n| address32(n)).transpose()?;
                let count = args.get(1).map(|n| number(n)).transpose()?;
                Command::Disassemble {
                    address,
                    count: count.map_or(Ok(DEFAULT_DISASSEMBLY_COUNT), |n| to_usize(n, args[1]))?,
                }
            }
            "reset" => {
                expect_at_most("reset", &args, 0)?;
                Command::Reset
            }
            "h" | "help" => Command::Help,
            "q" | "quit" => Command::Quit,
            _ => return Err(ParseError::UnknownCommand(name.to_string())),
        };
        Ok(command)
    }
}

/// Parses a non-negative number in decimal, or in hexadecimal with a `0x` prefix.
pub fn parse_number(s: &str) -> Result<u64, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn number(s: &str) -> Result<u64, ParseError> {
    parse_number(s).map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

fn address32(s: &str) -> Result<u32, ParseError> {
    number(s).and_then(|n| u32::try_from(n).map_err(|_| ParseError::InvalidAddress(s.to_string())))
}

fn to_usize(n: u64, s: &str) -> Result<usize, ParseError> {
    usize::try_from(n).map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

fn expect_at_most(command: &'static str, args: &[&str], max: usize) -> Result<(), ParseError> {
    if args.len() > max {
        Err(ParseError::TooManyArguments(command))
    } else {
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`, type `help` for a list of commands")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("too many arguments for `{0}`")]
    TooManyArguments(&'static str),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("`{0}` is not a 32-bit address")]
    InvalidAddress(String),
    #[error("unknown register `{0}`")]
    UnknownRegister(String),
}
