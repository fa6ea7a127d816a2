//! Encoding of decoded instructions back into raw instruction words.

use super::{
    BranchCondition, Instruction, LoadWidth, Opcode, RegImmOp, RegRegOp, RegShiftImmOp,
    StoreWidth,
};
use crate::registers::Specifier;

impl Instruction {
    /// Encodes this instruction into its raw 32-bit form.
    ///
    /// This is the inverse of [`Instruction::decode`]. Immediates and offsets that don't fit their
    /// field are truncated to the field width, and the always-zero low bits of branch and jump
    /// offsets are dropped. `fence` is always encoded with `fm`, `rs1` and `rd` set to zero.
    pub fn encode(&self) -> u32 {
        match *self {
            Self::OpImm {
                op,
                dest,
                src,
                immediate,
            } => place_i_imm(i_type(Opcode::OpImm, dest, op.funct3(), src), immediate),
            Self::OpShiftImm {
                op,
                dest,
                src,
                shift_amount_u5,
            } => {
                let (funct7, funct3) = op.functs();
                i_type(Opcode::OpImm, dest, funct3, src)
                    | (shift_amount_u5 & 0x1F) << 20
                    | u32::from(funct7) << 25
            }
            Self::Auipc { dest, immediate } => u_type(Opcode::Auipc, dest, immediate),
            Self::Lui { dest, immediate } => u_type(Opcode::Lui, dest, immediate),
            Self::Op {
                op,
                dest,
                src1,
                src2,
            } => {
                let (funct7, funct3) = op.functs();
                i_type(Opcode::Op, dest, funct3, src1)
                    | u32::from(src2) << 20
                    | u32::from(funct7) << 25
            }
            Self::Jal { dest, offset } => place_j_imm(
                Opcode::Jal as u32 | u32::from(dest) << 7,
                offset,
            ),
            Self::Jalr { dest, base, offset } => {
                place_i_imm(i_type(Opcode::Jalr, dest, 0b000, base), offset)
            }
            Self::Branch {
                condition,
                src1,
                src2,
                offset,
            } => place_b_imm(
                s_type(Opcode::Branch, condition.funct3(), src1, src2),
                offset,
            ),
            Self::Load {
                width,
                dest,
                base,
                offset,
            } => place_i_imm(i_type(Opcode::Load, dest, width.funct3(), base), offset),
            Self::Store {
                width,
                src,
                base,
                offset,
            } => place_s_imm(s_type(Opcode::Store, width.funct3(), base, src), offset),
            Self::Fence {
                predecessor,
                successor,
            } => Opcode::MiscMem as u32 | predecessor.to_u4() << 24 | successor.to_u4() << 20,
            Self::Ecall => Opcode::System as u32,
            Self::Ebreak => Opcode::System as u32 | 1 << 20,
        }
    }
}

/// Opcode, `rd`, `funct3` and `rs1`: the fields shared by R-type and I-type instructions.
fn i_type(opcode: Opcode, rd: Specifier, funct3: u8, rs1: Specifier) -> u32 {
    opcode as u32 | u32::from(rd) << 7 | u32::from(funct3) << 12 | u32::from(rs1) << 15
}

/// Opcode, `funct3`, `rs1` and `rs2`: the fields shared by S-type and B-type instructions.
fn s_type(opcode: Opcode, funct3: u8, rs1: Specifier, rs2: Specifier) -> u32 {
    opcode as u32 | u32::from(funct3) << 12 | u32::from(rs1) << 15 | u32::from(rs2) << 20
}

fn u_type(opcode: Opcode, rd: Specifier, immediate: i32) -> u32 {
    opcode as u32 | u32::from(rd) << 7 | (immediate as u32 & 0xFFFF_F000)
}

/// Places the low 12 bits of `immediate` into bits 31:20 of `raw_instruction`.
pub(super) fn place_i_imm(raw_instruction: u32, immediate: i32) -> u32 {
    raw_instruction | (immediate as u32 & 0xFFF) << 20
}

/// Places the low 12 bits of `immediate` into bits 31:25 and 11:7 of `raw_instruction`.
pub(super) fn place_s_imm(raw_instruction: u32, immediate: i32) -> u32 {
    let imm = immediate as u32;
    raw_instruction | (imm & 0xFE0) << 20 | (imm & 0x1F) << 7
}

/// Places bits 12:1 of `offset` into the scattered B-immediate positions of `raw_instruction`.
pub(super) fn place_b_imm(raw_instruction: u32, offset: i32) -> u32 {
    let imm = offset as u32;
    raw_instruction
        | (imm & 0x1000) << 19
        | (imm & 0x07E0) << 20
        | (imm & 0x001E) << 7
        | (imm & 0x0800) >> 4
}

/// Places bits 20:1 of `offset` into the scattered J-immediate positions of `raw_instruction`.
pub(super) fn place_j_imm(raw_instruction: u32, offset: i32) -> u32 {
    let imm = offset as u32;
    raw_instruction
        | (imm & 0x10_0000) << 11
        | (imm & 0x00_07FE) << 20
        | (imm & 0x00_0800) << 9
        | (imm & 0x0F_F000)
}

impl RegImmOp {
    fn funct3(self) -> u8 {
        match self {
            Self::Addi => 0b000,
            Self::Slti => 0b010,
            Self::Sltiu => 0b011,
            Self::Xori => 0b100,
            Self::Ori => 0b110,
            Self::Andi => 0b111,
        }
    }
}

impl RegShiftImmOp {
    /// Returns `(funct7, funct3)`.
    fn functs(self) -> (u8, u8) {
        match self {
            Self::Slli => (0b0000000, 0b001),
            Self::Srli => (0b0000000, 0b101),
            Self::Srai => (0b0100000, 0b101),
        }
    }
}

impl RegRegOp {
    /// Returns `(funct7, funct3)`.
    fn functs(self) -> (u8, u8) {
        match self {
            Self::Add => (0b0000000, 0b000),
            Self::Sll => (0b0000000, 0b001),
            Self::Slt => (0b0000000, 0b010),
            Self::Sltu => (0b0000000, 0b011),
            Self::Xor => (0b0000000, 0b100),
            Self::Srl => (0b0000000, 0b101),
            Self::Or => (0b0000000, 0b110),
            Self::And => (0b0000000, 0b111),
            Self::Sub => (0b0100000, 0b000),
            Self::Sra => (0b0100000, 0b101),
        }
    }
}

impl BranchCondition {
    fn funct3(self) -> u8 {
        match self {
            Self::Beq => 0b000,
            Self::Bne => 0b001,
            Self::Blt => 0b100,
            Self::Bge => 0b101,
            Self::Bltu => 0b110,
            Self::Bgeu => 0b111,
        }
    }
}

impl LoadWidth {
    fn funct3(self) -> u8 {
        match self {
            Self::Lb => 0b000,
            Self::Lh => 0b001,
            Self::Lw => 0b010,
            Self::Lbu => 0b100,
            Self::Lhu => 0b101,
        }
    }
}

impl StoreWidth {
    fn funct3(self) -> u8 {
        match self {
            Self::Sb => 0b000,
            Self::Sh => 0b001,
            Self::Sw => 0b010,
        }
    }
}
