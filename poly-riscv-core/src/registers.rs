//! General purpose registers and the program counter.

use std::fmt;

/// Number of `x` registers, `x0` included.
pub const LEN: u8 = 32;

/// Register state of the hart: `x0` through `x31` and the `pc`, all 32 bits wide.
///
/// Values are stored as raw bits. [`x_signed`](Self::x_signed) gives the two's complement view
/// that signed instructions operate on.
///
/// `x0` has no storage: it reads as zero and writes to it are dropped. Because of this there is
/// no way to borrow an `x` register mutably.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Registers {
    /// `x1` up to `x31`.
    nonzero: [u32; LEN as usize - 1],
    pc: u32,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Registers {
    /// All `x` registers zero, execution starting at `initial_pc`.
    pub fn new(initial_pc: u32) -> Self {
        Self {
            nonzero: [0; LEN as usize - 1],
            pc: initial_pc,
        }
    }

    pub fn x(&self, specifier: Specifier) -> u32 {
        match specifier.0 {
            0 => 0,
            n => self.nonzero[n as usize - 1],
        }
    }

    pub fn x_signed(&self, specifier: Specifier) -> i32 {
        self.x(specifier) as i32
    }

    /// Writes an `x` register. Writing `x0` has no effect.
    pub fn set_x(&mut self, specifier: Specifier, value: u32) {
        if let Some(n) = specifier.0.checked_sub(1) {
            self.nonzero[n as usize] = value;
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn pc_mut(&mut self) -> &mut u32 {
        &mut self.pc
    }

    /// Every `x` register with its value, `x0` first.
    pub fn iter(&self) -> impl Iterator<Item = (Specifier, u32)> + '_ {
        Specifier::iter_all().map(|specifier| (specifier, self.x(specifier)))
    }
}

/// Index of an `x` register, always below [`LEN`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Specifier(u8);

impl Specifier {
    /// `x0`, hardwired to zero.
    pub const X0: Self = Self(0);

    /// `x1`, where calls leave their return address.
    pub const RA: Self = Self(1);

    /// `x2`, the stack pointer.
    pub const SP: Self = Self(2);

    /// Returns `None` for indices outside of `0..32`, including ones that don't fit a `u8`.
    pub fn new<U: TryInto<u8>>(index: U) -> Option<Self> {
        index
            .try_into()
            .ok()
            .filter(|&index| index < LEN)
            .map(Self)
    }

    /// Wraps a register field taken from an instruction word.
    ///
    /// # Panics
    ///
    /// If `value_u5` has bits set above the low five.
    pub fn from_u5(value_u5: u8) -> Self {
        const_assert_eq!(LEN, 1 << 5);
        assert!(value_u5 < LEN, "register index {value_u5} does not fit in 5 bits");
        Self(value_u5)
    }

    pub fn iter_all() -> impl Iterator<Item = Self> {
        (0..LEN).map(Self)
    }
}

impl From<Specifier> for u8 {
    fn from(specifier: Specifier) -> Self {
        specifier.0
    }
}

impl From<Specifier> for u32 {
    fn from(specifier: Specifier) -> Self {
        u32::from(specifier.0)
    }
}

impl From<Specifier> for usize {
    fn from(specifier: Specifier) -> Self {
        usize::from(specifier.0)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}
