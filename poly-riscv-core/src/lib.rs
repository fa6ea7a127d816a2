//! Instruction-set simulator for a single RV32I hart with flat memory.
//!
//! The entry point is [`Machine`]: construct it from a [`Config`], load a flat program image,
//! [`reset`](Machine::reset) it and [`step`](Machine::step) through the program one instruction
//! at a time.
//!
//! ```
//! use poly_riscv_core::{Config, Machine};
//! use poly_riscv_core::registers::Specifier;
//!
//! let mut machine = Machine::new(Config {
//!     mem_size: 1024,
//!     stack_size: 512,
//!     ..Config::default()
//! })?;
//! machine.load_words(&[0xFB00_0113])?; // addi sp, zero, -80
//! machine.reset();
//! machine.step()?;
//! assert_eq!(-80, machine.registers().x_signed(Specifier::SP));
//! assert_eq!(4, machine.pc());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
extern crate static_assertions;

pub mod abi;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod registers;

pub use instruction::{DecodeError, Instruction};
pub use machine::{Config, ConstructionError, LoadError, Machine, StepError};
pub use memory::MemoryError;

/// Address alignment ranging from no alignment (`1`) to `1 << 31` alignment.
/// Representing `1 << 32` alignment is possible by specifying an alignment of `0`.
// Maintains the invariant that self.0 is a power of two, or 0.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Alignment(u32);

impl Alignment {
    /// Byte alignment is equivalent to no alignment.
    pub const BYTE: Self = Self(1);

    /// Halfword alignment means the address is a multiple of 2 (`address & 0b1 == 0`).
    pub const HALFWORD: Self = Self(2);

    /// Word alignment means the address is a multiple of 4 (`address & 0b11 == 0`).
    pub const WORD: Self = Self(4);

    /// Creates the natural alignment for a unit of size `size`. Returns `None` if `size` is not a
    /// power of two, except if it is `0`, in which case `1 << 32` alignment is returned.
    ///
    /// If `size` is a power of two, the alignment will be equal to the size.
    pub fn natural_for_size(size: u32) -> Option<Self> {
        if size == 0 {
            Some(Self(0))
        } else {
            size.is_power_of_two().then_some(Self(size))
        }
    }

    /// Returns `true` if `address` is aligned to this alignment.
    pub fn is_aligned(self, address: u32) -> bool {
        address & self.0.wrapping_sub(1) == 0
    }
}
