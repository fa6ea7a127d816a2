//! The simulated machine: one hart, its registers and a flat main memory.

mod execute;

use crate::instruction::{DecodeError, Instruction};
use crate::memory::{Memory, MemoryError, UNINITIALIZED_FILL};
use crate::registers::{Registers, Specifier};
use execute::{ExecutionResult, Executor};
use log::{debug, trace, warn};
use thiserror::Error;

/// Parameters of a [`Machine`], fixed at construction.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    /// Size of main memory in bytes. Memory occupies addresses `0..mem_size`.
    pub mem_size: usize,
    /// Number of bytes at the top of memory reserved for the stack.
    pub stack_size: usize,
    /// Whether memory starts out zeroed. If `false`, every byte is set to
    /// [`UNINITIALIZED_FILL`] instead.
    pub zero_fill: bool,
    /// Whether loads and stores may access addresses that are not naturally aligned.
    pub support_misaligned_memory_access: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mem_size: 0x1_0000,
            stack_size: 0x8000,
            zero_fill: true,
            support_misaligned_memory_access: true,
        }
    }
}

impl Config {
    /// Checks the size constraints of a configuration.
    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.stack_size == 0 {
            return Err(ConstructionError::ZeroStackSize);
        }
        if self.stack_size > self.mem_size {
            return Err(ConstructionError::StackLargerThanMemory {
                stack_size: self.stack_size,
                mem_size: self.mem_size,
            });
        }
        if self.mem_size as u64 >= 1 << 32 {
            return Err(ConstructionError::MemoryTooLarge {
                mem_size: self.mem_size,
            });
        }
        Ok(())
    }
}

/// A single RV32I hart attached to main memory.
///
/// The stack occupies the top [`stack_size`](Config::stack_size) bytes of memory and grows
/// downward from [`stack_top`](Self::stack_top). After [`reset`](Self::reset), `sp` points at the
/// stack top and execution starts at address `0`.
#[derive(Debug, Clone)]
pub struct Machine {
    config: Config,
    registers: Registers,
    memory: Memory,
    stack_top: u32,
    stack_bottom: u32,
}

impl Machine {
    /// Creates a machine with memory allocated and filled according to `config`.
    ///
    /// The machine is returned in its reset state.
    pub fn new(config: Config) -> Result<Self, ConstructionError> {
        config.validate()?;

        let fill = if config.zero_fill {
            0
        } else {
            UNINITIALIZED_FILL
        };
        let memory = Memory::new(
            config.mem_size,
            fill,
            config.support_misaligned_memory_access,
        );
        // Validation guarantees `1 <= mem_size < 1 << 32`
        let stack_top = (config.mem_size - 1) as u32;
        debug!(
            "created machine with {:#x} bytes of memory, {:#x} bytes of stack",
            config.mem_size, config.stack_size
        );

        let mut machine = Self {
            config,
            registers: Registers::default(),
            memory,
            stack_top,
            stack_bottom: 0,
        };
        machine.reset();
        Ok(machine)
    }

    /// Copies a flat little-endian program image to address `0`.
    ///
    /// Memory past the end of the image is left untouched. The image must be non-empty and
    /// strictly smaller than memory. Registers are not affected, see [`reset`](Self::reset).
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), LoadError> {
        if image.is_empty() {
            return Err(LoadError::EmptyImage);
        }
        if image.len() >= self.memory.len() {
            return Err(LoadError::ImageTooLarge {
                len: image.len(),
                mem_size: self.memory.len(),
            });
        }

        self.memory.load_image(image);
        self.stack_bottom = image.len() as u32;

        let stack_start = self.config.mem_size - self.config.stack_size;
        if image.len() > stack_start {
            warn!(
                "program image ends at {:#x}, inside the stack region starting at {:#x}",
                image.len(),
                stack_start
            );
        }
        debug!("loaded program image of {} bytes", image.len());
        Ok(())
    }

    /// Loads a program given as instruction words, see [`load_program`](Self::load_program).
    pub fn load_words(&mut self, words: &[u32]) -> Result<(), LoadError> {
        let image: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        self.load_program(&image)
    }

    /// Zeroes all registers, sets the `pc` to `0` and points `sp` at the top of the stack.
    ///
    /// Memory is left as is, so a loaded program can be restarted.
    pub fn reset(&mut self) {
        self.registers = Registers::new(0);
        self.registers.set_x(Specifier::SP, self.stack_top);
        debug!("reset, sp = {:#010x}", self.stack_top);
    }

    /// Executes the instruction at the `pc` and returns it.
    ///
    /// If the instruction cannot be fetched, decoded or executed, the machine state is left
    /// exactly as it was before the call and the `pc` still points at the offending instruction.
    pub fn step(&mut self) -> Result<Instruction, StepError> {
        let pc = self.registers.pc();
        let raw_instruction = self
            .memory
            .fetch_word(pc)
            .map_err(|source| StepError::Fetch { pc, source })?;
        let instruction = Instruction::decode(raw_instruction).map_err(|source| {
            StepError::Decode {
                pc,
                raw_instruction,
                source,
            }
        })?;
        trace!(pc = pc, raw = raw_instruction; "{instruction}");

        *self.registers.pc_mut() = pc.wrapping_add(4);
        if let Err(source) = self.execute_instruction(pc, instruction) {
            *self.registers.pc_mut() = pc;
            return Err(StepError::Memory {
                pc,
                instruction,
                source,
            });
        }
        debug_assert_eq!(0, self.registers.x(Specifier::X0));
        Ok(instruction)
    }

    /// Executes `instruction` as if it was located at address `pc`.
    ///
    /// The `pc` register must already point at the instruction following it.
    fn execute_instruction(&mut self, pc: u32, instruction: Instruction) -> ExecutionResult {
        let mut executor = Executor {
            registers: &mut self.registers,
            memory: &mut self.memory,
            pc,
        };
        match instruction {
            Instruction::OpImm {
                op,
                dest,
                src,
                immediate,
            } => executor.op_imm(op, dest, src, immediate),
            Instruction::OpShiftImm {
                op,
                dest,
                src,
                shift_amount_u5,
            } => executor.op_shift_imm(op, dest, src, shift_amount_u5),
            Instruction::Auipc { dest, immediate } => executor.auipc(dest, immediate),
            Instruction::Lui { dest, immediate } => executor.lui(dest, immediate),
            Instruction::Op {
                op,
                dest,
                src1,
                src2,
            } => executor.op(op, dest, src1, src2),
            Instruction::Jal { dest, offset } => executor.jal(dest, offset),
            Instruction::Jalr { dest, base, offset } => executor.jalr(dest, base, offset),
            Instruction::Branch {
                condition,
                src1,
                src2,
                offset,
            } => executor.branch(condition, src1, src2, offset),
            Instruction::Load {
                width,
                dest,
                base,
                offset,
            } => return executor.load(width, dest, base, offset),
            Instruction::Store {
                width,
                src,
                base,
                offset,
            } => return executor.store(width, src, base, offset),
            // A single hart without devices observes all of its accesses in program order
            Instruction::Fence { .. } => {}
            Instruction::Ecall => executor.ecall(),
            Instruction::Ebreak => executor.ebreak(),
        }
        Ok(())
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Gives write access to the registers, e.g. for a debugger. `x0` stays hardwired to zero.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn pc(&self) -> u32 {
        self.registers.pc()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Returns `len` bytes of memory starting at `address`, regardless of alignment.
    pub fn read_memory(&self, address: u32, len: usize) -> Result<&[u8], MemoryError> {
        self.memory.read_range(address, len)
    }

    /// Writes `buf` to memory starting at `address`, regardless of alignment.
    pub fn write_memory(&mut self, address: u32, buf: &[u8]) -> Result<(), MemoryError> {
        self.memory.write_range(address, buf)
    }

    /// The highest address of the stack, which `sp` holds after a reset.
    pub fn stack_top(&self) -> u32 {
        self.stack_top
    }

    /// The first address past the loaded program image, `0` if nothing was loaded.
    pub fn stack_bottom(&self) -> u32 {
        self.stack_bottom
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ConstructionError {
    #[error("the stack size must not be zero")]
    ZeroStackSize,
    #[error("stack of {stack_size:#x} bytes does not fit in {mem_size:#x} bytes of memory")]
    StackLargerThanMemory { stack_size: usize, mem_size: usize },
    #[error("{mem_size:#x} bytes of memory cannot be addressed with 32 bits")]
    MemoryTooLarge { mem_size: usize },
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum LoadError {
    #[error("the program image is empty")]
    EmptyImage,
    #[error("program image of {len} bytes does not fit in {mem_size} bytes of memory")]
    ImageTooLarge { len: usize, mem_size: usize },
}

/// Reasons a [`Machine::step`] can fail. The machine state is unchanged in every case.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum StepError {
    #[error("failed to fetch instruction at {pc:#010x}")]
    Fetch {
        pc: u32,
        #[source]
        source: MemoryError,
    },
    #[error("illegal instruction {raw_instruction:#010x} at {pc:#010x}")]
    Decode {
        pc: u32,
        raw_instruction: u32,
        #[source]
        source: DecodeError,
    },
    #[error("`{instruction}` at {pc:#010x} failed")]
    Memory {
        pc: u32,
        instruction: Instruction,
        #[source]
        source: MemoryError,
    },
}

impl StepError {
    /// Address of the instruction that could not be executed.
    pub fn pc(&self) -> u32 {
        match *self {
            Self::Fetch { pc, .. } | Self::Decode { pc, .. } | Self::Memory { pc, .. } => pc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{
        BranchCondition, FenceOrderCombination, LoadWidth, RegImmOp, RegRegOp, RegShiftImmOp,
        StoreWidth,
    };
    use proptest::prelude::*;

    fn x(index: u8) -> Specifier {
        Specifier::from_u5(index)
    }

    fn machine(program: &[Instruction]) -> Machine {
        let mut machine = Machine::new(Config {
            mem_size: 0x2000,
            stack_size: 0x800,
            ..Config::default()
        })
        .unwrap();
        if !program.is_empty() {
            let words: Vec<u32> = program.iter().map(Instruction::encode).collect();
            machine.load_words(&words).unwrap();
        }
        machine
    }

    fn run(machine: &mut Machine, steps: usize) {
        for _ in 0..steps {
            machine.step().unwrap();
        }
    }

    fn addi(dest: u8, src: u8, immediate: i32) -> Instruction {
        Instruction::OpImm {
            op: RegImmOp::Addi,
            dest: x(dest),
            src: x(src),
            immediate,
        }
    }

    fn op(op: RegRegOp, dest: u8, src1: u8, src2: u8) -> Instruction {
        Instruction::Op {
            op,
            dest: x(dest),
            src1: x(src1),
            src2: x(src2),
        }
    }

    #[test]
    fn test_construct_and_reset() {
        let machine = Machine::new(Config {
            mem_size: 1024,
            stack_size: 512,
            zero_fill: true,
            support_misaligned_memory_access: false,
        })
        .unwrap();
        assert_eq!(1023, machine.stack_top());
        assert_eq!(0, machine.stack_bottom());
        assert_eq!(0, machine.pc());
        assert_eq!(1023, machine.registers().x(Specifier::SP));
        assert_eq!(1024, machine.memory().len());
        assert!(machine.read_memory(0, 1024).unwrap().iter().all(|&b| b == 0));

        let config = machine.config();
        assert_eq!(1024, config.mem_size);
        assert_eq!(512, config.stack_size);
        assert!(!config.support_misaligned_memory_access);
    }

    #[test]
    fn test_no_zero_fill() {
        let machine = Machine::new(Config {
            zero_fill: false,
            ..Config::default()
        })
        .unwrap();
        assert!(machine
            .read_memory(0, 16)
            .unwrap()
            .iter()
            .all(|&b| b == UNINITIALIZED_FILL));
    }

    #[test]
    fn test_construction_errors() {
        let config = |mem_size, stack_size| Config {
            mem_size,
            stack_size,
            ..Config::default()
        };
        assert_eq!(
            ConstructionError::ZeroStackSize,
            Machine::new(config(1024, 0)).unwrap_err()
        );
        assert_eq!(
            ConstructionError::StackLargerThanMemory {
                stack_size: 2048,
                mem_size: 1024
            },
            Machine::new(config(1024, 2048)).unwrap_err()
        );
        // Stack may occupy all of memory
        assert!(Machine::new(config(1024, 1024)).is_ok());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_memory_too_large() {
        // Validation happens before any allocation
        let config = Config {
            mem_size: 1 << 32,
            stack_size: 16,
            ..Config::default()
        };
        assert_eq!(
            Err(ConstructionError::MemoryTooLarge { mem_size: 1 << 32 }),
            config.validate()
        );
    }

    #[test]
    fn test_load_errors() {
        let mut machine = Machine::new(Config {
            mem_size: 16,
            stack_size: 8,
            ..Config::default()
        })
        .unwrap();
        assert_eq!(Err(LoadError::EmptyImage), machine.load_program(&[]));
        assert_eq!(
            Err(LoadError::ImageTooLarge {
                len: 16,
                mem_size: 16
            }),
            machine.load_program(&[0; 16])
        );
        assert_eq!(0, machine.stack_bottom());

        // Overlapping the stack region is allowed
        machine.load_program(&[1; 12]).unwrap();
        assert_eq!(12, machine.stack_bottom());
        assert_eq!(&[1, 0], machine.read_memory(11, 2).unwrap());
    }

    #[test]
    fn test_addi_negative_immediate() {
        let mut machine = Machine::new(Config {
            mem_size: 1024,
            stack_size: 512,
            zero_fill: true,
            support_misaligned_memory_access: true,
        })
        .unwrap();
        machine.load_program(&0xFB00_0113u32.to_le_bytes()).unwrap();
        machine.reset();

        assert_eq!(addi(2, 0, -80), machine.step().unwrap());
        assert_eq!(0xFFFF_FFB0, machine.registers().x(Specifier::SP));
        assert_eq!(-80, machine.registers().x_signed(Specifier::SP));
        assert_eq!(4, machine.pc());
    }

    #[test]
    fn test_jal_links_next_instruction() {
        let mut machine = machine(&[]);
        machine.write_memory(0x1000, &0x1000_00EFu32.to_le_bytes()).unwrap();
        *machine.registers_mut().pc_mut() = 0x1000;

        machine.step().unwrap();
        assert_eq!(0x1004, machine.registers().x(Specifier::RA));
        assert_eq!(0x1100, machine.pc());
    }

    #[test]
    fn test_jalr_clears_low_bit_and_reads_base_first() {
        let mut machine = machine(&[
            addi(5, 0, 0x41),
            Instruction::Jalr {
                dest: x(5),
                base: x(5),
                offset: 2,
            },
        ]);
        run(&mut machine, 2);
        assert_eq!(0x42, machine.pc());
        assert_eq!(8, machine.registers().x(x(5)));
    }

    #[test]
    fn test_branches() {
        let branch = |condition, src1, src2| Instruction::Branch {
            condition,
            src1: x(src1),
            src2: x(src2),
            offset: 8,
        };
        // x1 = -1, x2 = 1
        let setup = [addi(1, 0, -1), addi(2, 0, 1)];
        for (condition, src1, src2, taken) in [
            (BranchCondition::Beq, 1, 1, true),
            (BranchCondition::Beq, 1, 2, false),
            (BranchCondition::Bne, 1, 2, true),
            (BranchCondition::Blt, 1, 2, true),
            (BranchCondition::Bltu, 1, 2, false),
            (BranchCondition::Bge, 1, 2, false),
            (BranchCondition::Bgeu, 1, 2, true),
            (BranchCondition::Bge, 2, 2, true),
        ] {
            let mut program = setup.to_vec();
            program.push(branch(condition, src1, src2));
            let mut machine = machine(&program);
            run(&mut machine, 3);
            let expected = if taken { 8 + 8 } else { 8 + 4 };
            assert_eq!(expected, machine.pc(), "{condition:?} x{src1}, x{src2}");
        }
    }

    #[test]
    fn test_branch_offset_is_relative_to_branch_address() {
        const BEQ_RA_GP_8: u32 = 0x0030_8463;

        let mut taken = machine(&[]);
        taken.load_words(&[BEQ_RA_GP_8]).unwrap();
        taken.step().unwrap();
        assert_eq!(8, taken.pc());

        // Not taken continues with the next instruction
        let mut not_taken = machine(&[addi(1, 0, 1)]);
        not_taken.write_memory(4, &BEQ_RA_GP_8.to_le_bytes()).unwrap();
        run(&mut not_taken, 2);
        assert_eq!(8, not_taken.pc());

        // Further into the program the target is still the branch address plus the offset
        let mut later = machine(&[addi(1, 0, 0), addi(3, 0, 0)]);
        later.write_memory(8, &BEQ_RA_GP_8.to_le_bytes()).unwrap();
        run(&mut later, 3);
        assert_eq!(8 + 8, later.pc());
    }

    #[test]
    fn test_backward_branch_loop() {
        // Sum 1..=10 into a0
        let mut machine = machine(&[
            addi(5, 0, 10),
            addi(10, 10, 0),
            op(RegRegOp::Add, 10, 10, 5),
            addi(5, 5, -1),
            Instruction::Branch {
                condition: BranchCondition::Bne,
                src1: x(5),
                src2: x(0),
                offset: -8,
            },
        ]);
        while machine.pc() != 20 {
            machine.step().unwrap();
        }
        assert_eq!(55, machine.registers().x(x(10)));
    }

    #[test]
    fn test_shifts_of_sign_bit() {
        let mut machine = machine(&[
            Instruction::Lui {
                dest: x(1),
                immediate: 0x8000_0000u32 as i32,
            },
            addi(2, 0, 4),
            op(RegRegOp::Sra, 3, 1, 2),
            op(RegRegOp::Srl, 4, 1, 2),
            Instruction::OpShiftImm {
                op: RegShiftImmOp::Srai,
                dest: x(5),
                src: x(1),
                shift_amount_u5: 31,
            },
            Instruction::OpShiftImm {
                op: RegShiftImmOp::Srli,
                dest: x(7),
                src: x(1),
                shift_amount_u5: 31,
            },
            // Only the low 5 bits of the shift amount count: 36 & 0x1F == 4
            addi(2, 0, 36),
            op(RegRegOp::Sll, 6, 2, 2),
        ]);
        run(&mut machine, 8);
        let registers = machine.registers();
        assert_eq!(0xF800_0000, registers.x(x(3)));
        assert_eq!(0x0800_0000, registers.x(x(4)));
        assert_eq!(0xFFFF_FFFF, registers.x(x(5)));
        assert_eq!(1, registers.x(x(7)));
        assert_eq!(36 << 4, registers.x(x(6)));
    }

    #[test]
    fn test_set_less_than() {
        let mut machine = machine(&[
            addi(1, 0, -1),
            Instruction::OpImm {
                op: RegImmOp::Sltiu,
                dest: x(2),
                src: x(0),
                immediate: -1,
            },
            Instruction::OpImm {
                op: RegImmOp::Slti,
                dest: x(3),
                src: x(0),
                immediate: -1,
            },
            op(RegRegOp::Sltu, 4, 0, 1),
            op(RegRegOp::Slt, 5, 0, 1),
        ]);
        run(&mut machine, 5);
        let registers = machine.registers();
        // 0 < 0xFFFF_FFFF unsigned
        assert_eq!(1, registers.x(x(2)));
        assert_eq!(0, registers.x(x(3)));
        assert_eq!(1, registers.x(x(4)));
        assert_eq!(0, registers.x(x(5)));
    }

    #[test]
    fn test_lui_auipc() {
        let mut machine = machine(&[
            addi(0, 0, 0),
            Instruction::Lui {
                dest: x(1),
                immediate: 0x1234_5000,
            },
            Instruction::Auipc {
                dest: x(2),
                immediate: 0x0000_1000,
            },
        ]);
        run(&mut machine, 3);
        assert_eq!(0x1234_5000, machine.registers().x(x(1)));
        assert_eq!(0x1008, machine.registers().x(x(2)));
    }

    #[test]
    fn test_loads_extend() {
        let load = |width, dest| Instruction::Load {
            width,
            dest: x(dest),
            base: x(0),
            offset: 0x400,
        };
        let mut machine = machine(&[
            load(LoadWidth::Lb, 1),
            load(LoadWidth::Lbu, 2),
            load(LoadWidth::Lh, 3),
            load(LoadWidth::Lhu, 4),
            load(LoadWidth::Lw, 5),
        ]);
        machine.write_memory(0x400, &[0x80, 0xFF, 0x01, 0x02]).unwrap();
        run(&mut machine, 5);
        let registers = machine.registers();
        assert_eq!(0xFFFF_FF80, registers.x(x(1)));
        assert_eq!(0x80, registers.x(x(2)));
        assert_eq!(0xFFFF_FF80, registers.x(x(3)));
        assert_eq!(0xFF80, registers.x(x(4)));
        assert_eq!(0x0201_FF80, registers.x(x(5)));
    }

    #[test]
    fn test_stores_truncate() {
        let store = |width, offset| Instruction::Store {
            width,
            src: x(1),
            base: x(2),
            offset,
        };
        let mut machine = machine(&[
            Instruction::Lui {
                dest: x(1),
                immediate: 0x1122_3000,
            },
            addi(1, 1, 0x344),
            addi(2, 0, 0x500),
            store(StoreWidth::Sw, 0),
            store(StoreWidth::Sh, 4),
            store(StoreWidth::Sb, -1),
        ]);
        run(&mut machine, 6);
        assert_eq!(
            &[0x44, 0x44, 0x33, 0x22, 0x11, 0x44, 0x33, 0x00],
            machine.read_memory(0x4FF, 8).unwrap()
        );
    }

    #[test]
    fn test_stack_push_pop() {
        let mut machine = machine(&[
            addi(2, 2, -4),
            addi(1, 0, 42),
            Instruction::Store {
                width: StoreWidth::Sw,
                src: x(1),
                base: x(2),
                offset: 0,
            },
            Instruction::Load {
                width: LoadWidth::Lw,
                dest: x(3),
                base: x(2),
                offset: 0,
            },
            addi(2, 2, 4),
        ]);
        run(&mut machine, 5);
        assert_eq!(42, machine.registers().x(x(3)));
        assert_eq!(machine.stack_top(), machine.registers().x(Specifier::SP));
    }

    #[test]
    fn test_unknown_opcode_leaves_state_unchanged() {
        let mut machine = machine(&[addi(1, 0, 7)]);
        machine.write_memory(4, &[0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        machine.step().unwrap();
        let before = machine.clone();

        let error = machine.step().unwrap_err();
        assert!(matches!(
            error,
            StepError::Decode {
                pc: 4,
                raw_instruction: 0xFFFF_FFFF,
                source: DecodeError::UnknownOpcode { opcode: 0x7F },
            }
        ));
        assert_eq!(4, error.pc());
        assert_eq!(before.registers(), machine.registers());
        assert_eq!(before.memory(), machine.memory());
    }

    #[test]
    fn test_out_of_range_store_leaves_state_unchanged() {
        let mut machine = machine(&[
            addi(1, 0, -1),
            Instruction::Store {
                width: StoreWidth::Sw,
                src: x(1),
                base: x(2),
                offset: -2,
            },
        ]);
        machine.step().unwrap();
        // sp = 0x1FFF, so the word at 0x1FFD crosses the end of memory
        let before = machine.clone();
        let error = machine.step().unwrap_err();
        assert!(matches!(
            error,
            StepError::Memory {
                pc: 4,
                source: MemoryError::OutOfRange {
                    address: 0x1FFD,
                    size: 4
                },
                ..
            }
        ));
        assert_eq!(4, machine.pc());
        assert_eq!(before.registers(), machine.registers());
        assert_eq!(before.memory(), machine.memory());
    }

    #[test]
    fn test_strict_alignment() {
        let mut machine = Machine::new(Config {
            mem_size: 0x100,
            stack_size: 0x10,
            zero_fill: true,
            support_misaligned_memory_access: false,
        })
        .unwrap();
        machine
            .load_words(&[
                addi(1, 0, 0x42).encode(),
                Instruction::Load {
                    width: LoadWidth::Lw,
                    dest: x(2),
                    base: x(1),
                    offset: 0,
                }
                .encode(),
            ])
            .unwrap();
        machine.step().unwrap();
        assert!(matches!(
            machine.step(),
            Err(StepError::Memory {
                source: MemoryError::Misaligned {
                    address: 0x42,
                    size: 4
                },
                ..
            })
        ));
        assert_eq!(4, machine.pc());
    }

    #[test]
    fn test_fetch_past_end_of_memory() {
        let mut machine = machine(&[Instruction::Jal {
            dest: x(0),
            offset: 0x1FFE,
        }]);
        machine.step().unwrap();
        assert_eq!(0x1FFE, machine.pc());
        assert!(matches!(
            machine.step(),
            Err(StepError::Fetch {
                pc: 0x1FFE,
                source: MemoryError::OutOfRange { .. }
            })
        ));
    }

    #[test]
    fn test_system_instructions_only_advance() {
        let mut machine = machine(&[
            Instruction::Fence {
                predecessor: FenceOrderCombination::ALL,
                successor: FenceOrderCombination::ALL,
            },
            Instruction::Ecall,
            Instruction::Ebreak,
        ]);
        let registers = machine.registers().clone();
        run(&mut machine, 3);
        assert_eq!(12, machine.pc());
        assert!(registers
            .iter()
            .zip(machine.registers().iter())
            .all(|(a, b)| a == b));
    }

    #[test]
    fn test_reset_restarts_program() {
        let mut machine = machine(&[addi(1, 0, 1), addi(1, 1, 1)]);
        run(&mut machine, 2);
        assert_eq!(2, machine.registers().x(x(1)));
        machine.reset();
        assert_eq!(0, machine.registers().x(x(1)));
        run(&mut machine, 2);
        assert_eq!(2, machine.registers().x(x(1)));
    }

    fn any_alu_instruction() -> impl Strategy<Value = Instruction> {
        let reg = (0u8..32).prop_map(Specifier::from_u5);
        prop_oneof![
            (
                prop_oneof![
                    Just(RegImmOp::Addi),
                    Just(RegImmOp::Slti),
                    Just(RegImmOp::Sltiu),
                    Just(RegImmOp::Xori),
                    Just(RegImmOp::Ori),
                    Just(RegImmOp::Andi),
                ],
                reg.clone(),
                reg.clone(),
                -2048i32..2048
            )
                .prop_map(|(op, dest, src, immediate)| Instruction::OpImm {
                    op,
                    dest,
                    src,
                    immediate
                }),
            (
                prop_oneof![
                    Just(RegRegOp::Add),
                    Just(RegRegOp::Sub),
                    Just(RegRegOp::Sll),
                    Just(RegRegOp::Sra),
                    Just(RegRegOp::Xor),
                    Just(RegRegOp::Sltu),
                ],
                reg.clone(),
                reg.clone(),
                reg.clone()
            )
                .prop_map(|(op, dest, src1, src2)| Instruction::Op {
                    op,
                    dest,
                    src1,
                    src2
                }),
            (reg, any::<i32>()).prop_map(|(dest, immediate)| Instruction::Lui {
                dest,
                immediate: immediate & !0xFFF
            }),
        ]
    }

    proptest! {
        #[test]
        fn zero_register_stays_zero(
            program in prop::collection::vec(any_alu_instruction(), 1..32)
        ) {
            let mut machine = machine(&program);
            for _ in 0..program.len() {
                machine.step().unwrap();
                prop_assert_eq!(0, machine.registers().x(Specifier::X0));
            }
            prop_assert_eq!(4 * program.len() as u32, machine.pc());
        }
    }
}
