//! Pure functions extracting the bit fields of a raw 32-bit instruction word.
//!
//! ```text
//!  31        25 24   20 19   15 14  12 11        7 6      0
//! +------------+-------+-------+------+-----------+--------+
//! |   funct7   |  rs2  |  rs1  |funct3|    rd     | opcode | R-type
//! |      imm[11:0]     |  rs1  |funct3|    rd     | opcode | I-type
//! | imm[11:5]  |  rs2  |  rs1  |funct3| imm[4:0]  | opcode | S-type
//! |imm[12|10:5]|  rs2  |  rs1  |funct3|imm[4:1|11]| opcode | B-type
//! |            imm[31:12]             |    rd     | opcode | U-type
//! |     imm[20|10:1|11|19:12]         |    rd     | opcode | J-type
//! +------------+-------+-------+------+-----------+--------+
//! ```
//!
//! None of these functions check whether the requested field is meaningful for the instruction
//! they are given; that is up to [`Instruction::decode`](super::Instruction::decode).

use crate::registers::Specifier;

/// Returns the 7-bit *opcode* value of the instruction.
pub fn opcode(raw_instruction: u32) -> u8 {
    (raw_instruction & 0x7F) as u8
}

/// Returns the 3-bit *funct3* value for R-type, I-type, S-type, B-type instructions.
pub fn funct3(raw_instruction: u32) -> u8 {
    ((raw_instruction >> 12) & 0b111) as u8
}

/// Returns the 7-bit *funct7* value for R-type instructions.
pub fn funct7(raw_instruction: u32) -> u8 {
    (raw_instruction >> 25) as u8
}

/// Returns the 12-bit *funct12* value of SYSTEM instructions.
pub fn funct12(raw_instruction: u32) -> u16 {
    (raw_instruction >> 20) as u16
}

/// Returns the 5-bit *rd* value for R-type, I-type, U-type, J-type instructions.
pub fn rd(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(((raw_instruction >> 7) & 0x1F) as u8)
}

/// Returns the 5-bit *rs1* value for R-type, I-type, S-type, B-type instructions.
pub fn rs1(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(((raw_instruction >> 15) & 0x1F) as u8)
}

/// Returns the 5-bit *rs2* value for R-type, S-type, B-type instructions.
pub fn rs2(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(((raw_instruction >> 20) & 0x1F) as u8)
}

/// Returns the 5-bit *shamt* value of the immediate shift instructions.
///
/// This is the low five bits of the I-immediate field.
pub fn shamt(raw_instruction: u32) -> u32 {
    (raw_instruction >> 20) & 0x1F
}

/// Returns the 12-bit I-immediate sign-extended to 32 bits.
pub fn imm_i(raw_instruction: u32) -> i32 {
    raw_instruction as i32 >> 20
}

/// Returns the I-immediate as the unsigned value `SLTIU` compares against.
///
/// The immediate is first sign-extended to 32 bits, then treated as an unsigned number. An
/// immediate of `-1` therefore compares as `0xFFFF_FFFF`.
pub fn imm_i_unsigned(raw_instruction: u32) -> u32 {
    imm_i(raw_instruction) as u32
}

/// Returns the 12-bit S-immediate sign-extended to 32 bits.
pub fn imm_s(raw_instruction: u32) -> i32 {
    let imm_11_5 = raw_instruction & 0xFE00_0000;
    let imm_4_0 = raw_instruction & 0x0000_0F80;
    (imm_11_5 | (imm_4_0 << 13)) as i32 >> 20
}

/// Returns the 13-bit B-immediate sign-extended to 32 bits. Bit 0 is always zero.
pub fn imm_b(raw_instruction: u32) -> i32 {
    let imm_12 = raw_instruction & 0x8000_0000;
    let imm_10_5 = raw_instruction & 0x7E00_0000;
    let imm_4_1 = raw_instruction & 0x0000_0F00;
    let imm_11 = raw_instruction & 0x0000_0080;
    (imm_12 | (imm_11 << 23) | (imm_10_5 >> 1) | (imm_4_1 << 12)) as i32 >> 19
}

/// Returns the U-immediate: the upper 20 bits of the word in place, lower 12 bits zero.
pub fn imm_u(raw_instruction: u32) -> i32 {
    (raw_instruction & 0xFFFF_F000) as i32
}

/// Returns the 21-bit J-immediate sign-extended to 32 bits. Bit 0 is always zero.
pub fn imm_j(raw_instruction: u32) -> i32 {
    let imm_20 = raw_instruction & 0x8000_0000;
    let imm_10_1 = raw_instruction & 0x7FE0_0000;
    let imm_11 = raw_instruction & 0x0010_0000;
    let imm_19_12 = raw_instruction & 0x000F_F000;
    (imm_20 | (imm_19_12 << 11) | (imm_11 << 2) | (imm_10_1 >> 9)) as i32 >> 11
}
