use crate::instruction::{
    BranchCondition, LoadWidth, RegImmOp, RegRegOp, RegShiftImmOp, StoreWidth,
};
use crate::memory::{Memory, MemoryError};
use crate::registers::{Registers, Specifier};
use log::debug;

/// Outcome of executing a single instruction. Only memory accesses can fail.
pub(super) type ExecutionResult = Result<(), MemoryError>;

/// Applies the effects of decoded instructions to a register file and memory.
///
/// When a handler runs, the `pc` register already holds the address of the next sequential
/// instruction. The address of the instruction itself is [`pc`](Self::pc), which is what all
/// pc-relative offsets are added to.
///
/// A handler that returns an error has not modified any state.
#[derive(Debug)]
pub(super) struct Executor<'a> {
    pub registers: &'a mut Registers,
    pub memory: &'a mut Memory,
    /// Address of the instruction being executed.
    pub pc: u32,
}

impl<'a> Executor<'a> {
    pub fn op_imm(&mut self, op: RegImmOp, dest: Specifier, src: Specifier, immediate: i32) {
        let result = op.apply(self.registers.x(src), immediate);
        self.registers.set_x(dest, result);
    }

    pub fn op_shift_imm(
        &mut self,
        op: RegShiftImmOp,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) {
        let result = op.apply(self.registers.x(src), shift_amount_u5);
        self.registers.set_x(dest, result);
    }

    pub fn op(&mut self, op: RegRegOp, dest: Specifier, src1: Specifier, src2: Specifier) {
        let result = op.apply(self.registers.x(src1), self.registers.x(src2));
        self.registers.set_x(dest, result);
    }

    /// The low 12 bits of `immediate` are ignored.
    pub fn lui(&mut self, dest: Specifier, immediate: i32) {
        self.registers.set_x(dest, immediate as u32 & !0xFFF);
    }

    /// Adds the upper immediate to the address of the `auipc` itself.
    pub fn auipc(&mut self, dest: Specifier, immediate: i32) {
        let result = self.pc.wrapping_add_signed(immediate & !0xFFF);
        self.registers.set_x(dest, result);
    }

    pub fn jal(&mut self, dest: Specifier, offset: i32) {
        let target = self.pc.wrapping_add_signed(offset);
        self.jump(dest, target);
    }

    pub fn jalr(&mut self, dest: Specifier, base: Specifier, offset: i32) {
        // `base` may equal `dest`, so the target is computed before the link is written
        let target = self.effective_address(base, offset) & !1;
        self.jump(dest, target);
    }

    pub fn branch(
        &mut self,
        condition: BranchCondition,
        src1: Specifier,
        src2: Specifier,
        offset: i32,
    ) {
        if condition.is_taken(self.registers.x(src1), self.registers.x(src2)) {
            *self.registers.pc_mut() = self.pc.wrapping_add_signed(offset);
        }
    }

    pub fn load(
        &mut self,
        width: LoadWidth,
        dest: Specifier,
        base: Specifier,
        offset: i32,
    ) -> ExecutionResult {
        let address = self.effective_address(base, offset);
        let value = match width {
            LoadWidth::Lb => self.memory.read_byte(address)? as i8 as u32,
            LoadWidth::Lh => self.memory.read_halfword(address)? as i16 as u32,
            LoadWidth::Lw => self.memory.read_word(address)?,
            LoadWidth::Lbu => self.memory.read_byte(address)? as u32,
            LoadWidth::Lhu => self.memory.read_halfword(address)? as u32,
        };
        self.registers.set_x(dest, value);
        Ok(())
    }

    /// Stores the low bits of `src` that fit in `width`.
    pub fn store(
        &mut self,
        width: StoreWidth,
        src: Specifier,
        base: Specifier,
        offset: i32,
    ) -> ExecutionResult {
        let address = self.effective_address(base, offset);
        let value = self.registers.x(src);
        match width {
            StoreWidth::Sb => self.memory.write_byte(address, value as u8),
            StoreWidth::Sh => self.memory.write_halfword(address, value as u16),
            StoreWidth::Sw => self.memory.write_word(address, value),
        }
    }

    pub fn ecall(&mut self) {
        debug!("ignoring ecall at {:#010x}, there is no execution environment", self.pc);
    }

    pub fn ebreak(&mut self) {
        debug!("ignoring ebreak at {:#010x}, there is no debugger attached", self.pc);
    }

    fn effective_address(&self, base: Specifier, offset: i32) -> u32 {
        self.registers.x(base).wrapping_add_signed(offset)
    }

    fn jump(&mut self, dest: Specifier, target: u32) {
        // The pc already holds the return address
        let link = std::mem::replace(self.registers.pc_mut(), target);
        self.registers.set_x(dest, link);
    }
}

impl RegImmOp {
    /// Combines a register value with a sign-extended 12-bit immediate.
    fn apply(self, src: u32, immediate: i32) -> u32 {
        match self {
            Self::Addi => src.wrapping_add_signed(immediate),
            Self::Slti => ((src as i32) < immediate) as u32,
            // The immediate is sign-extended before the unsigned comparison
            Self::Sltiu => (src < immediate as u32) as u32,
            Self::Xori => src ^ immediate as u32,
            Self::Ori => src | immediate as u32,
            Self::Andi => src & immediate as u32,
        }
    }
}

impl RegShiftImmOp {
    fn apply(self, src: u32, shift_amount_u5: u32) -> u32 {
        let shamt = shift_amount_u5 & 0x1F;
        match self {
            Self::Slli => src << shamt,
            Self::Srli => src >> shamt,
            Self::Srai => ((src as i32) >> shamt) as u32,
        }
    }
}

impl RegRegOp {
    /// Shifts only use the low 5 bits of `src2`. Overflow wraps.
    fn apply(self, src1: u32, src2: u32) -> u32 {
        let shamt = src2 & 0x1F;
        match self {
            Self::Add => src1.wrapping_add(src2),
            Self::Sub => src1.wrapping_sub(src2),
            Self::Slt => ((src1 as i32) < (src2 as i32)) as u32,
            Self::Sltu => (src1 < src2) as u32,
            Self::And => src1 & src2,
            Self::Or => src1 | src2,
            Self::Xor => src1 ^ src2,
            Self::Sll => src1 << shamt,
            Self::Srl => src1 >> shamt,
            Self::Sra => ((src1 as i32) >> shamt) as u32,
        }
    }
}

impl BranchCondition {
    fn is_taken(self, src1: u32, src2: u32) -> bool {
        match self {
            Self::Beq => src1 == src2,
            Self::Bne => src1 != src2,
            Self::Blt => (src1 as i32) < (src2 as i32),
            Self::Bge => (src1 as i32) >= (src2 as i32),
            Self::Bltu => src1 < src2,
            Self::Bgeu => src1 >= src2,
        }
    }
}
