//! Turning ELF executables into flat program images.

use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use log::{debug, warn};
use thiserror::Error;

/// Loadable contents of an ELF file laid out as they would be in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatImage {
    /// Physical address of the first byte of `data`.
    pub base: u64,
    pub data: Vec<u8>,
}

/// Lays out all `PT_LOAD` segments of `file` in a single buffer that starts at the lowest segment
/// address. Gaps between segments and the parts of segments not backed by the file are zero.
pub fn flatten(file: &[u8]) -> Result<FlatImage, ElfError> {
    let elf = Elf::parse(file)?;

    let segments: Vec<_> = elf
        .program_headers
        .iter()
        .filter(|h| h.p_type == PT_LOAD && h.p_memsz > 0)
        .collect();
    let base = segments
        .iter()
        .map(|h| h.p_paddr)
        .min()
        .ok_or(ElfError::NoLoadableSegments)?;
    let end = segments
        .iter()
        .map(|h| h.p_paddr.saturating_add(h.p_memsz))
        .max()
        .unwrap_or(base);
    let span = end - base;
    if span > u64::from(u32::MAX) {
        return Err(ElfError::TooLarge { span });
    }

    let mut data = vec![0; span as usize];
    for h in segments {
        debug!(
            "loading segment into memory at [{:#010x?}..{:#010x?}]",
            h.p_paddr,
            h.p_paddr + h.p_memsz,
        );
        let contents = file
            .get(h.file_range())
            .ok_or(ElfError::Truncated { address: h.p_paddr })?;
        let contents = &contents[..contents.len().min(h.p_memsz as usize)];
        let start = (h.p_paddr - base) as usize;
        data[start..start + contents.len()].copy_from_slice(contents);
    }

    if elf.entry != base {
        warn!(
            "entry point {:#x} differs from the image base {base:#x}, execution starts at the base",
            elf.entry
        );
    }
    Ok(FlatImage { base, data })
}

#[derive(Error, Debug)]
pub enum ElfError {
    #[error("failed to parse ELF file")]
    Parse(#[from] goblin::error::Error),
    #[error("ELF file has no loadable segments")]
    NoLoadableSegments,
    #[error("segment at {address:#x} extends past the end of the file")]
    Truncated { address: u64 },
    #[error("loadable segments span {span:#x} bytes, more than a 32-bit address space")]
    TooLarge { span: u64 },
}
