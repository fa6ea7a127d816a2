//! Decoded RV32I instructions.
//!
//! [`Instruction::decode`] turns a raw instruction word into a closed set of variants, one per
//! instruction group, with the exact operation selected by a nested enum. Every combination of
//! `opcode`, `funct3` and `funct7`/`funct12` either maps to exactly one variant or to a
//! [`DecodeError`], so executing a decoded instruction never has to deal with unknown encodings.

mod disasm;
mod encode;
pub mod fields;

use crate::registers::Specifier;
use thiserror::Error;

/// Data structure that can hold any supported instruction in its decoded form.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instruction {
    OpImm {
        op: RegImmOp,
        dest: Specifier,
        src: Specifier,
        immediate: i32,
    },
    OpShiftImm {
        op: RegShiftImmOp,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    },
    Auipc {
        dest: Specifier,
        immediate: i32,
    },
    Lui {
        dest: Specifier,
        immediate: i32,
    },
    Op {
        op: RegRegOp,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
    },
    Jal {
        dest: Specifier,
        offset: i32,
    },
    Jalr {
        dest: Specifier,
        base: Specifier,
        offset: i32,
    },
    Branch {
        condition: BranchCondition,
        src1: Specifier,
        src2: Specifier,
        offset: i32,
    },
    Load {
        width: LoadWidth,
        dest: Specifier,
        base: Specifier,
        offset: i32,
    },
    Store {
        width: StoreWidth,
        src: Specifier,
        base: Specifier,
        offset: i32,
    },
    Fence {
        predecessor: FenceOrderCombination,
        successor: FenceOrderCombination,
    },
    Ecall,
    Ebreak,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegImmOp {
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegShiftImmOp {
    Slli,
    Srli,
    Srai,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegRegOp {
    Add,
    Slt,
    Sltu,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sub,
    Sra,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BranchCondition {
    Beq,
    Bne,
    Blt,
    Bltu,
    Bge,
    Bgeu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadWidth {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StoreWidth {
    Sb,
    Sh,
    Sw,
}

/// The set of accesses ordered by one side of a `fence`.
///
/// Since only a single hart without devices is simulated, fences have no observable effect. The
/// operands are still decoded so that they can be displayed and re-encoded.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct FenceOrderCombination {
    pub device_input: bool,
    pub device_output: bool,
    pub memory_reads: bool,
    pub memory_writes: bool,
}

impl FenceOrderCombination {
    /// All four kinds of access, written `iorw` in assembly.
    pub const ALL: Self = Self {
        device_input: true,
        device_output: true,
        memory_reads: true,
        memory_writes: true,
    };

    /// Builds a combination from its 4-bit `PI PO PR PW` (or `SI SO SR SW`) encoding.
    pub fn from_u4(value_u4: u32) -> Self {
        Self {
            device_input: (value_u4 >> 3) & 0b1 == 1,
            device_output: (value_u4 >> 2) & 0b1 == 1,
            memory_reads: (value_u4 >> 1) & 0b1 == 1,
            memory_writes: value_u4 & 0b1 == 1,
        }
    }

    /// Inverse of [`from_u4`](Self::from_u4).
    pub fn to_u4(self) -> u32 {
        (self.device_input as u32) << 3
            | (self.device_output as u32) << 2
            | (self.memory_reads as u32) << 1
            | self.memory_writes as u32
    }
}

impl Instruction {
    /// Decodes a raw instruction word.
    ///
    /// Decoding first looks at the opcode, then at `funct3`, then at `funct7` or `funct12` for the
    /// groups that need them. The first level that holds an unknown value is reported in the
    /// returned [`DecodeError`].
    pub fn decode(raw_instruction: u32) -> Result<Self, DecodeError> {
        let opcode_u7 = fields::opcode(raw_instruction);
        let funct3 = fields::funct3(raw_instruction);
        let unknown_funct3 = DecodeError::UnknownFunct3 {
            opcode: opcode_u7,
            funct3,
        };
        let unknown_funct7 = DecodeError::UnknownFunct7 {
            opcode: opcode_u7,
            funct3,
            funct7: fields::funct7(raw_instruction),
        };

        let opcode = Opcode::from_u7(opcode_u7).ok_or(DecodeError::UnknownOpcode {
            opcode: opcode_u7,
        })?;
        match opcode {
            Opcode::OpImm => match i_funct(funct3) {
                Some(op) => Ok(Self::OpImm {
                    op,
                    dest: fields::rd(raw_instruction),
                    src: fields::rs1(raw_instruction),
                    immediate: fields::imm_i(raw_instruction),
                }),
                None => match i_shfunct(raw_instruction) {
                    Some(op) => Ok(Self::OpShiftImm {
                        op,
                        dest: fields::rd(raw_instruction),
                        src: fields::rs1(raw_instruction),
                        shift_amount_u5: fields::shamt(raw_instruction),
                    }),
                    None => Err(unknown_funct7),
                },
            },
            Opcode::Auipc => Ok(Self::Auipc {
                dest: fields::rd(raw_instruction),
                immediate: fields::imm_u(raw_instruction),
            }),
            Opcode::Lui => Ok(Self::Lui {
                dest: fields::rd(raw_instruction),
                immediate: fields::imm_u(raw_instruction),
            }),
            Opcode::Op => match r_funct(raw_instruction) {
                Some(op) => Ok(Self::Op {
                    op,
                    dest: fields::rd(raw_instruction),
                    src1: fields::rs1(raw_instruction),
                    src2: fields::rs2(raw_instruction),
                }),
                None => Err(unknown_funct7),
            },
            Opcode::Jal => Ok(Self::Jal {
                dest: fields::rd(raw_instruction),
                offset: fields::imm_j(raw_instruction),
            }),
            Opcode::Jalr => match funct3 {
                0b000 => Ok(Self::Jalr {
                    dest: fields::rd(raw_instruction),
                    base: fields::rs1(raw_instruction),
                    offset: fields::imm_i(raw_instruction),
                }),
                _ => Err(unknown_funct3),
            },
            Opcode::Branch => match b_funct(funct3) {
                Some(condition) => Ok(Self::Branch {
                    condition,
                    src1: fields::rs1(raw_instruction),
                    src2: fields::rs2(raw_instruction),
                    offset: fields::imm_b(raw_instruction),
                }),
                None => Err(unknown_funct3),
            },
            Opcode::Load => match i_width(funct3) {
                Some(width) => Ok(Self::Load {
                    width,
                    dest: fields::rd(raw_instruction),
                    base: fields::rs1(raw_instruction),
                    offset: fields::imm_i(raw_instruction),
                }),
                None => Err(unknown_funct3),
            },
            Opcode::Store => match s_width(funct3) {
                Some(width) => Ok(Self::Store {
                    width,
                    src: fields::rs2(raw_instruction),
                    base: fields::rs1(raw_instruction),
                    offset: fields::imm_s(raw_instruction),
                }),
                None => Err(unknown_funct3),
            },
            Opcode::MiscMem => match funct3 {
                // The `fm`, `rs1` and `rd` fields are reserved for future use and must be treated
                // as a normal fence when they are nonzero.
                0b000 => Ok(Self::Fence {
                    predecessor: FenceOrderCombination::from_u4((raw_instruction >> 24) & 0xF),
                    successor: FenceOrderCombination::from_u4((raw_instruction >> 20) & 0xF),
                }),
                _ => Err(unknown_funct3),
            },
            Opcode::System => match funct3 {
                0b000 => match fields::funct12(raw_instruction) {
                    0x000 => Ok(Self::Ecall),
                    0x001 => Ok(Self::Ebreak),
                    funct12 => Err(DecodeError::UnknownFunct12 { funct12 }),
                },
                _ => Err(unknown_funct3),
            },
        }
    }
}

/// The reasons a raw instruction word can fail to decode.
///
/// Each variant corresponds to one level of the decoding decision and carries the values that
/// were inspected up to and including the offending one.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum DecodeError {
    #[error("unknown opcode {opcode:#04x}")]
    UnknownOpcode { opcode: u8 },
    #[error("unknown funct3 {funct3:#03b} for opcode {opcode:#04x}")]
    UnknownFunct3 { opcode: u8, funct3: u8 },
    #[error("unknown funct7 {funct7:#04x} for opcode {opcode:#04x} with funct3 {funct3:#03b}")]
    UnknownFunct7 { opcode: u8, funct3: u8, funct7: u8 },
    #[error("unknown funct12 {funct12:#05x} for SYSTEM opcode")]
    UnknownFunct12 { funct12: u16 },
}

impl DecodeError {
    /// Returns the opcode of the instruction that failed to decode.
    pub fn opcode(&self) -> u8 {
        match *self {
            Self::UnknownOpcode { opcode }
            | Self::UnknownFunct3 { opcode, .. }
            | Self::UnknownFunct7 { opcode, .. } => opcode,
            Self::UnknownFunct12 { .. } => Opcode::System as u8,
        }
    }
}

/// The major opcodes of RV32I. Every other 7-bit value is reserved, custom, or belongs to an
/// extension that isn't supported.
#[allow(clippy::unusual_byte_groupings)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub(crate) enum Opcode {
    Load = 0b00_000_11,
    MiscMem = 0b00_011_11,
    OpImm = 0b00_100_11,
    Auipc = 0b00_101_11,
    Store = 0b01_000_11,
    Op = 0b01_100_11,
    Lui = 0b01_101_11,
    Branch = 0b11_000_11,
    Jalr = 0b11_001_11,
    Jal = 0b11_011_11,
    System = 0b11_100_11,
}

impl Opcode {
    /// Returns the opcode for a 7-bit value, or `None` if it isn't supported.
    fn from_u7(value_u7: u8) -> Option<Self> {
        const ALL: [Opcode; 11] = [
            Opcode::Load,
            Opcode::MiscMem,
            Opcode::OpImm,
            Opcode::Auipc,
            Opcode::Store,
            Opcode::Op,
            Opcode::Lui,
            Opcode::Branch,
            Opcode::Jalr,
            Opcode::Jal,
            Opcode::System,
        ];
        ALL.into_iter().find(|&opcode| opcode as u8 == value_u7)
    }
}

fn i_funct(funct3: u8) -> Option<RegImmOp> {
    match funct3 {
        0b000 => Some(RegImmOp::Addi),
        0b010 => Some(RegImmOp::Slti),
        0b011 => Some(RegImmOp::Sltiu),
        0b100 => Some(RegImmOp::Xori),
        0b110 => Some(RegImmOp::Ori),
        0b111 => Some(RegImmOp::Andi),
        _ => None,
    }
}

fn i_shfunct(raw_instruction: u32) -> Option<RegShiftImmOp> {
    match (
        fields::funct7(raw_instruction),
        fields::funct3(raw_instruction),
    ) {
        (0b0000000, 0b001) => Some(RegShiftImmOp::Slli),
        (0b0000000, 0b101) => Some(RegShiftImmOp::Srli),
        (0b0100000, 0b101) => Some(RegShiftImmOp::Srai),
        _ => None,
    }
}

fn i_width(funct3: u8) -> Option<LoadWidth> {
    match funct3 {
        0b000 => Some(LoadWidth::Lb),
        0b001 => Some(LoadWidth::Lh),
        0b010 => Some(LoadWidth::Lw),
        0b100 => Some(LoadWidth::Lbu),
        0b101 => Some(LoadWidth::Lhu),
        _ => None,
    }
}

fn s_width(funct3: u8) -> Option<StoreWidth> {
    match funct3 {
        0b000 => Some(StoreWidth::Sb),
        0b001 => Some(StoreWidth::Sh),
        0b010 => Some(StoreWidth::Sw),
        _ => None,
    }
}

fn r_funct(raw_instruction: u32) -> Option<RegRegOp> {
    match (
        fields::funct7(raw_instruction),
        fields::funct3(raw_instruction),
    ) {
        (0b0000000, 0b000) => Some(RegRegOp::Add),
        (0b0000000, 0b001) => Some(RegRegOp::Sll),
        (0b0000000, 0b010) => Some(RegRegOp::Slt),
        (0b0000000, 0b011) => Some(RegRegOp::Sltu),
        (0b0000000, 0b100) => Some(RegRegOp::Xor),
        (0b0000000, 0b101) => Some(RegRegOp::Srl),
        (0b0000000, 0b110) => Some(RegRegOp::Or),
        (0b0000000, 0b111) => Some(RegRegOp::And),
        (0b0100000, 0b000) => Some(RegRegOp::Sub),
        (0b0100000, 0b101) => Some(RegRegOp::Sra),
        _ => None,
    }
}

fn b_funct(funct3: u8) -> Option<BranchCondition> {
    match funct3 {
        0b000 => Some(BranchCondition::Beq),
        0b001 => Some(BranchCondition::Bne),
        0b100 => Some(BranchCondition::Blt),
        0b101 => Some(BranchCondition::Bge),
        0b110 => Some(BranchCondition::Bltu),
        0b111 => Some(BranchCondition::Bgeu),
        _ => None,
    }
}
