//! Human readable views of machine state.

use poly_riscv_core::abi;
use poly_riscv_core::memory::Memory;
use poly_riscv_core::registers::Registers;
use poly_riscv_core::Instruction;
use std::error::Error;
use std::fmt;

/// All `x` registers, one per row, followed by the `pc`.
pub struct RegisterTable<'a>(pub &'a Registers);

impl fmt::Display for RegisterTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (specifier, value) in self.0.iter() {
            writeln!(
                f,
                "{:<4} {:<3}  {value:#010x}  {:>11}",
                abi::name(specifier),
                specifier.to_string(),
                value as i32
            )?;
        }
        writeln!(f, "pc        {:#010x}", self.0.pc())
    }
}

/// Classic hexdump of `bytes`, located at `address`: 16 bytes per row and an ASCII column.
pub struct HexDump<'a> {
    pub address: u32,
    pub bytes: &'a [u8],
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            let row_address = self.address.wrapping_add(row as u32 * 16);
            write!(f, "{row_address:08x}  ")?;
            for column in 0..16 {
                match chunk.get(column) {
                    Some(byte) => write!(f, "{byte:02x} ")?,
                    None => f.write_str("   ")?,
                }
                if column == 7 {
                    f.write_str(" ")?;
                }
            }
            f.write_str(" |")?;
            for &byte in chunk {
                let c = if byte.is_ascii_graphic() || byte == b' ' {
                    byte as char
                } else {
                    '.'
                };
                write!(f, "{c}")?;
            }
            writeln!(f, "|")?;
        }
        Ok(())
    }
}

/// Disassembly of `count` consecutive words starting at `address`.
///
/// The row at `pc` is marked with an arrow. Stops early at the end of memory.
pub struct Disassembly<'a> {
    pub memory: &'a Memory,
    pub address: u32,
    pub count: usize,
    pub pc: u32,
}

impl fmt::Display for Disassembly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addresses = (0..self.count).map(|i| self.address.wrapping_add(i as u32 * 4));
        for address in addresses {
            let Ok(raw_instruction) = self.memory.fetch_word(address) else {
                break;
            };
            let marker = if address == self.pc { "=>" } else { "  " };
            write!(f, "{marker} {address:08x}:  {raw_instruction:08x}  ")?;
            match Instruction::decode(raw_instruction) {
                Ok(instruction) => writeln!(f, "{instruction}")?,
                Err(_) => writeln!(f, "<illegal>")?,
            }
        }
        Ok(())
    }
}

/// An error followed by its chain of sources, separated by `: `.
pub struct ErrorChain<'a>(pub &'a dyn Error);

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
