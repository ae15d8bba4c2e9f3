//! Headers of the address-stream blocks: chain and extender.
//!
//! The slot arrays behind these headers are managed by
//! [`freechain`](crate::freechain).

use crate::converter::*;
use crate::types::Address;

const CHAIN_NEXT: usize = 4;
/// First slot of a chain block.
pub const CHAIN_HEADER_SIZE: usize = CHAIN_NEXT + 8;

const EXT_LEVEL: usize = 4;
/// First slot of an extender block.
pub const EXT_HEADER_SIZE: usize = EXT_LEVEL + 1;

/// Start of the opaque stream of a data block.
pub const DATA_HEADER_SIZE: usize = 4;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ChainHeader {
    /// Following chain block, 0 at the end of the chain.
    pub next: Address,
}

impl ChainHeader {
    pub fn decode(buf: &[u8]) -> Self {
        ChainHeader {
            next: get_u64(buf, CHAIN_NEXT),
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        put_u64(buf, CHAIN_NEXT, self.next);
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ExtHeader {
    /// Depth of indirection; 0 means the slots point at data blocks.
    pub level: u8,
}

impl ExtHeader {
    pub fn decode(buf: &[u8]) -> Self {
        ExtHeader {
            level: buf[EXT_LEVEL],
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf[EXT_LEVEL] = self.level;
    }
}

/// Slots of an extender block for the given geometry.
pub fn ext_slot_capacity(block_size: usize, addrlen: u8) -> usize {
    block_size.saturating_sub(EXT_HEADER_SIZE) / usize::from(addrlen.max(1))
}
