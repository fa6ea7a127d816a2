//! Flat, byte-addressable main memory.

use crate::Alignment;
use thiserror::Error;

macro_rules! access_fns {
    ( $( $read_fn:ident, $write_fn:ident => $u:ident ),* $(,)? ) => {
        $(
            /// Invoke a little-endian read for the specified address.
            ///
            /// The address doesn't need to be naturally aligned, unless misaligned accesses were
            /// disabled, in which case [`MemoryError::Misaligned`] is returned.
            pub fn $read_fn(&self, address: u32) -> Result<$u, MemoryError> {
                let mut buf = [0u8; std::mem::size_of::<$u>()];
                self.read(&mut buf, address).map(|()| $u::from_le_bytes(buf))
            }

            /// Invoke a little-endian write for the specified address.
            ///
            /// The address doesn't need to be naturally aligned, unless misaligned accesses were
            /// disabled, in which case [`MemoryError::Misaligned`] is returned.
            pub fn $write_fn(&mut self, address: u32, value: $u) -> Result<(), MemoryError> {
                self.write(address, &value.to_le_bytes())
            }
        )*
    };
}

/// The byte every memory cell holds after construction when zero-filling is disabled.
///
/// Reading memory that was never written is a bug in the simulated program. A recognizable
/// pattern makes such reads stand out in a memory dump.
pub const UNINITIALIZED_FILL: u8 = 0xA5;

/// Byte-based RAM starting at address `0`.
///
/// Every access is bounds-checked: an access of which any byte would fall outside of the memory
/// fails as a whole with [`MemoryError::OutOfRange`], without reading or writing anything.
/// Accesses never wrap around from the highest address to address `0`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Memory {
    data: Vec<u8>,
    support_misaligned_access: bool,
}

impl Memory {
    /// Creates a memory of `size` bytes, each set to `fill`.
    ///
    /// `size` must be addressable by a `u32`, which the caller is expected to have checked.
    pub(crate) fn new(size: usize, fill: u8, support_misaligned_access: bool) -> Self {
        const_assert!(usize::BITS >= 32);
        Self {
            data: vec![fill; size],
            support_misaligned_access,
        }
    }

    /// Returns the size expressed in bytes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Reads `buf.len()` consecutive bytes starting at `address` into `buf`.
    pub fn read(&self, buf: &mut [u8], address: u32) -> Result<(), MemoryError> {
        let range = self.access(address, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    /// Writes all bytes of `buf` to consecutive addresses starting at `address`.
    pub fn write(&mut self, address: u32, buf: &[u8]) -> Result<(), MemoryError> {
        let range = self.access(address, buf.len())?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }

    /// Returns a view of `len` bytes of memory starting at `address`.
    ///
    /// Unlike loads, this never fails because of misalignment.
    pub fn read_range(&self, address: u32, len: usize) -> Result<&[u8], MemoryError> {
        let range = self.bounds(address, len)?;
        Ok(&self.data[range])
    }

    /// Overwrites memory starting at `address` with `buf`.
    ///
    /// Like [`read_range`](Self::read_range), alignment is not checked.
    pub fn write_range(&mut self, address: u32, buf: &[u8]) -> Result<(), MemoryError> {
        let range = self.bounds(address, buf.len())?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }

    pub fn read_byte(&self, address: u32) -> Result<u8, MemoryError> {
        let mut buf = [0];
        self.read(&mut buf, address).map(|()| buf[0])
    }

    pub fn write_byte(&mut self, address: u32, value: u8) -> Result<(), MemoryError> {
        self.write(address, &[value])
    }

    access_fns! {
        read_halfword, write_halfword => u16,
        read_word, write_word => u32,
    }

    /// Reads the instruction word at `address`.
    ///
    /// Instruction fetches are not subject to the misaligned access setting; only bounds are
    /// checked.
    pub fn fetch_word(&self, address: u32) -> Result<u32, MemoryError> {
        let range = self.bounds(address, 4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[range]);
        Ok(u32::from_le_bytes(buf))
    }

    /// Copies `image` to the start of memory. The caller checks that the image fits.
    pub(crate) fn load_image(&mut self, image: &[u8]) {
        self.data[..image.len()].copy_from_slice(image);
    }

    /// Performs the alignment and bounds checks for a data access at `address` of `size` bytes.
    fn access(&self, address: u32, size: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let range = self.bounds(address, size)?;
        if !self.support_misaligned_access
            && !u32::try_from(size)
                .ok()
                .and_then(Alignment::natural_for_size)
                // If `size` is not a power of two, the access is always considered misaligned
                .is_some_and(|alignment| alignment.is_aligned(address))
        {
            return Err(MemoryError::Misaligned { address, size });
        }
        Ok(range)
    }

    fn bounds(&self, address: u32, size: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = address as usize;
        match start.checked_add(size) {
            Some(end) if end <= self.data.len() => Ok(start..end),
            _ => Err(MemoryError::OutOfRange { address, size }),
        }
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum MemoryError {
    #[error("address out of range: {size}-byte access at {address:#010x}")]
    OutOfRange { address: u32, size: usize },
    #[error("misaligned {size}-byte access at {address:#010x}")]
    Misaligned { address: u32, size: usize },
}
