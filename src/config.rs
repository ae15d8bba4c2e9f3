//! Formatter configuration and device geometry.

use crate::error::{Error, Result};
use crate::types::*;
use std::convert::TryFrom;

/// Block size, kept as the base-2 exponent stored in the superblock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockSize(u8);

impl BlockSize {
    pub fn from_exponent(exp: u8) -> Result<Self> {
        if (MIN_BLOCKSIZE..=MAX_BLOCKSIZE).contains(&exp) {
            Ok(BlockSize(exp))
        } else {
            Err(Error::InvalidBlockSize(1u64.checked_shl(exp.into()).unwrap_or(0)))
        }
    }

    /// Accepts 512, 1024, 2048 or 4096.
    pub fn from_bytes(bytes: u64) -> Result<Self> {
        if !bytes.is_power_of_two() {
            return Err(Error::InvalidBlockSize(bytes));
        }
        let exp = u8::try_from(bytes.trailing_zeros()).map_err(|_| Error::InvalidBlockSize(bytes))?;
        Self::from_exponent(exp).map_err(|_| Error::InvalidBlockSize(bytes))
    }

    pub fn exponent(self) -> u8 {
        self.0
    }

    pub fn bytes(self) -> usize {
        1 << self.0
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        BlockSize(DEFAULT_BLOCKSIZE)
    }
}

/// Width of a block address inside chain slots, in bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressLength(u8);

impl AddressLength {
    pub fn from_bytes(bytes: u8) -> Result<Self> {
        if (MIN_ADDRLEN..=MAX_ADDRLEN).contains(&bytes) {
            Ok(AddressLength(bytes))
        } else {
            Err(Error::InvalidAddressLength(u64::from(bytes) * 8))
        }
    }

    /// Accepts multiples of 8 from 8 to 64.
    pub fn from_bits(bits: u64) -> Result<Self> {
        if bits % 8 != 0 {
            return Err(Error::InvalidAddressLength(bits));
        }
        let bytes = u8::try_from(bits / 8).map_err(|_| Error::InvalidAddressLength(bits))?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(self) -> u8 {
        self.0
    }

    pub fn bits(self) -> u32 {
        u32::from(self.0) * 8
    }

    /// Number of distinct addresses, or `None` when it exceeds every `u64`
    /// block count.
    pub fn max_blocks(self) -> Option<u64> {
        1u64.checked_shl(self.bits())
    }

    pub fn fits(self, addr: Address) -> bool {
        self.max_blocks().map_or(true, |max| addr < max)
    }
}

impl Default for AddressLength {
    fn default() -> Self {
        AddressLength(DEFAULT_ADDRLEN)
    }
}

#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub block_size: BlockSize,
    pub address_length: AddressLength,
    pub label: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            block_size: BlockSize::default(),
            address_length: AddressLength::default(),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

/// What the device offers under a given configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub bytes: u64,
    /// Usable blocks, after clamping to the address space.
    pub blocks: u64,
    /// Blocks the device would hold without the address space clamp.
    pub device_blocks: u64,
    /// Trailing bytes that do not form a whole block.
    pub overhead: u64,
}

impl Geometry {
    pub fn probe(bytes: u64, block_size: BlockSize, addrlen: AddressLength) -> Result<Self> {
        let bs = block_size.bytes() as u64;
        let device_blocks = bytes / bs;
        if device_blocks < MIN_BLOCKS {
            return Err(Error::DeviceTooSmall {
                blocks: device_blocks,
                min: MIN_BLOCKS,
            });
        }
        let blocks = match addrlen.max_blocks() {
            Some(max) if device_blocks > max => max,
            _ => device_blocks,
        };
        Ok(Geometry {
            bytes,
            blocks,
            device_blocks,
            overhead: bytes % bs,
        })
    }

    pub fn clamped(&self) -> bool {
        self.blocks < self.device_blocks
    }
}
