//! Assembly text for decoded instructions.
//!
//! Registers are printed with their ABI names, immediates in decimal except for the upper
//! immediates of `lui`/`auipc`, which are printed as the 20-bit hexadecimal value written in
//! assembly source.

use super::{
    BranchCondition, FenceOrderCombination, Instruction, LoadWidth, RegImmOp, RegRegOp,
    RegShiftImmOp, StoreWidth,
};
use crate::abi;
use std::fmt;

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::OpImm {
                op,
                dest,
                src,
                immediate,
            } => write!(
                f,
                "{} {}, {}, {immediate}",
                op.mnemonic(),
                abi::name(dest),
                abi::name(src)
            ),
            Self::OpShiftImm {
                op,
                dest,
                src,
                shift_amount_u5,
            } => write!(
                f,
                "{} {}, {}, {shift_amount_u5}",
                op.mnemonic(),
                abi::name(dest),
                abi::name(src)
            ),
            Self::Auipc { dest, immediate } => {
                write!(f, "auipc {}, {:#x}", abi::name(dest), immediate as u32 >> 12)
            }
            Self::Lui { dest, immediate } => {
                write!(f, "lui {}, {:#x}", abi::name(dest), immediate as u32 >> 12)
            }
            Self::Op {
                op,
                dest,
                src1,
                src2,
            } => write!(
                f,
                "{} {}, {}, {}",
                op.mnemonic(),
                abi::name(dest),
                abi::name(src1),
                abi::name(src2)
            ),
            Self::Jal { dest, offset } => write!(f, "jal {}, {offset}", abi::name(dest)),
            Self::Jalr { dest, base, offset } => {
                write!(f, "jalr {}, {offset}({})", abi::name(dest), abi::name(base))
            }
            Self::Branch {
                condition,
                src1,
                src2,
                offset,
            } => write!(
                f,
                "{} {}, {}, {offset}",
                condition.mnemonic(),
                abi::name(src1),
                abi::name(src2)
            ),
            Self::Load {
                width,
                dest,
                base,
                offset,
            } => write!(
                f,
                "{} {}, {offset}({})",
                width.mnemonic(),
                abi::name(dest),
                abi::name(base)
            ),
            Self::Store {
                width,
                src,
                base,
                offset,
            } => write!(
                f,
                "{} {}, {offset}({})",
                width.mnemonic(),
                abi::name(src),
                abi::name(base)
            ),
            Self::Fence {
                predecessor,
                successor,
            } => write!(f, "fence {predecessor}, {successor}"),
            Self::Ecall => f.write_str("ecall"),
            Self::Ebreak => f.write_str("ebreak"),
        }
    }
}

impl fmt::Display for FenceOrderCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::default() {
            return f.write_str("0");
        }
        for (set, letter) in [
            (self.device_input, "i"),
            (self.device_output, "o"),
            (self.memory_reads, "r"),
            (self.memory_writes, "w"),
        ] {
            if set {
                f.write_str(letter)?;
            }
        }
        Ok(())
    }
}

impl RegImmOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Addi => "addi",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Xori => "xori",
            Self::Ori => "ori",
            Self::Andi => "andi",
        }
    }
}

impl RegShiftImmOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
        }
    }
}

impl RegRegOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sub => "sub",
            Self::Sra => "sra",
        }
    }
}

impl BranchCondition {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bltu => "bltu",
            Self::Bge => "bge",
            Self::Bgeu => "bgeu",
        }
    }
}

impl LoadWidth {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
        }
    }
}

impl StoreWidth {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disassemble(raw_instruction: u32) -> String {
        Instruction::decode(raw_instruction).unwrap().to_string()
    }

    #[test]
    fn test_disassemble() {
        assert_eq!("addi sp, zero, -80", disassemble(0xFB00_0113));
        assert_eq!("sub t0, t1, t2", disassemble(0x4073_02B3));
        assert_eq!("srai ra, sp, 31", disassemble(0x41F1_5093));
        assert_eq!("jal ra, 256", disassemble(0x1000_00EF));
        assert_eq!("bne ra, sp, -4", disassemble(0xFE20_9EE3));
        assert_eq!("sw ra, 12(sp)", disassemble(0x0011_2623));
        assert_eq!("lui a0, 0x12345", disassemble(0x1234_5537));
        assert_eq!("fence iorw, iorw", disassemble(0x0FF0_000F));
        assert_eq!("fence r, w", disassemble(0x0210_000F));
        assert_eq!("ecall", disassemble(0x0000_0073));
    }

    #[test]
    fn test_disassemble_jalr_and_loads() {
        // jalr zero, 0(ra), a.k.a. `ret`
        assert_eq!("jalr zero, 0(ra)", disassemble(0x0000_8067));
        // lbu a0, -1(s0)
        assert_eq!("lbu a0, -1(s0)", disassemble(0xFFF4_4503));
    }
}
