//! Register names of the standard RISC-V calling convention.
//!
//! These names are only used for introspection: printing registers, disassembling instructions
//! and parsing register names typed by a user. Execution never depends on them.

use crate::registers::{Specifier, LEN};

/// ABI names for `x0` up to `x31`, indexed by register number.
pub const NAMES: [&str; LEN as usize] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Returns the ABI name of a register, e.g. `sp` for `x2`.
///
/// `x8` is reported as `s0`, never as its alias `fp`.
pub fn name(specifier: Specifier) -> &'static str {
    NAMES[usize::from(specifier)]
}

/// Parses either an ABI name (`a0`, `fp`, ...) or an architectural name (`x10`) into a register
/// specifier.
pub fn parse(name: &str) -> Option<Specifier> {
    if name == "fp" {
        return Some(Specifier::from_u5(8));
    }
    if let Some(index) = NAMES.iter().position(|&abi_name| abi_name == name) {
        return Specifier::new(index);
    }
    let index = name.strip_prefix('x')?;
    // Reject things like `x01` or `x+1` that `parse` would otherwise accept
    if index.is_empty() || (index.len() > 1 && index.starts_with('0')) {
        return None;
    }
    if !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Specifier::new(index.parse::<u8>().ok()?)
}
