//! Free space bookkeeping.
//!
//! Free blocks are listed in a singly linked chain of chain blocks. Each
//! chain block holds a packed array of addresses ("slots"), each as wide as
//! the filesystem's address length. A zero slot is empty: address 0 is the
//! superblock and never free.

use crate::block::chain::{ChainHeader, CHAIN_HEADER_SIZE};
use crate::block::sblock::Superblock;
use crate::block::Block;
use crate::config::{AddressLength, BlockSize};
use crate::converter::*;
use crate::error::{Error, Result};
use crate::file::read_block;
use crate::types::*;
use log::debug;
use std::collections::HashSet;
use std::io::{Read, Seek};

/// Number of slots following a chain block's header.
pub fn slot_capacity(block_size: usize, addrlen: AddressLength) -> usize {
    block_size.saturating_sub(CHAIN_HEADER_SIZE) / usize::from(addrlen.bytes())
}

/// A chain block paired with the address length needed to read its slots.
#[derive(Debug, Clone)]
pub struct ChainBlock {
    block: Block,
    addrlen: AddressLength,
}

impl ChainBlock {
    pub fn new(addr: Address, block_size: usize, addrlen: AddressLength) -> Self {
        ChainBlock {
            block: Block::new(addr, block_size, BlockType::Chain),
            addrlen,
        }
    }

    /// Wraps a block read from disk; fails unless it is tagged as a chain.
    pub fn from_block(block: Block, addrlen: AddressLength) -> Result<Self> {
        block.expect_kind(BlockType::Chain)?;
        Ok(ChainBlock { block, addrlen })
    }

    pub fn addr(&self) -> Address {
        self.block.addr()
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    pub fn capacity(&self) -> usize {
        slot_capacity(self.block.size(), self.addrlen)
    }

    pub fn next(&self) -> Address {
        ChainHeader::decode(self.block.as_bytes()).next
    }

    pub fn set_next(&mut self, next: Address) {
        ChainHeader { next }.encode(self.block.as_bytes_mut())
    }

    fn slot_offset(&self, index: usize) -> usize {
        CHAIN_HEADER_SIZE + index * usize::from(self.addrlen.bytes())
    }

    /// Address stored in slot `index`, `Some(0)` for an empty slot and
    /// `None` past the last slot.
    pub fn read_slot(&self, index: usize) -> Option<Address> {
        if index >= self.capacity() {
            return None;
        }
        let width = usize::from(self.addrlen.bytes());
        Some(get_uint(self.block.as_bytes(), self.slot_offset(index), width))
    }

    /// Lowest empty slot.
    pub fn find_free_slot(&self) -> Option<usize> {
        (0..self.capacity()).find(|&i| self.read_slot(i) == Some(0))
    }

    /// Stores `addr` in the lowest empty slot and returns that slot.
    pub fn write_slot(&mut self, addr: Address) -> Result<usize> {
        if addr == SUPERBLOCK_ADDR {
            return Err(Error::ReservedAddress);
        }
        if !self.addrlen.fits(addr) {
            return Err(Error::AddressTooWide {
                addr,
                addrlen: self.addrlen.bytes(),
            });
        }
        let index = self
            .find_free_slot()
            .ok_or(Error::ChainFull { addr: self.addr() })?;
        let off = self.slot_offset(index);
        let width = usize::from(self.addrlen.bytes());
        put_uint(self.block.as_bytes_mut(), off, addr, width);
        Ok(index)
    }

    /// Every non-empty slot in slot order.
    pub fn addresses(&self) -> Vec<Address> {
        (0..self.capacity())
            .filter_map(|i| self.read_slot(i))
            .filter(|&a| a != 0)
            .collect()
    }
}

/// Result of following a free chain from its head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeChainSummary {
    /// Chain blocks in link order.
    pub chain_blocks: Vec<Address>,
    /// Free addresses in chain order.
    pub free: Vec<Address>,
}

impl FreeChainSummary {
    pub fn head(&self) -> Option<Address> {
        self.chain_blocks.first().copied()
    }

    pub fn tail(&self) -> Option<Address> {
        self.chain_blocks.last().copied()
    }
}

/// Follows the free chain described by `sb` and checks it is well formed:
/// every link is a chain block inside the filesystem, no block is visited
/// twice, no address is listed twice, and the walk ends at `freetail`.
pub fn walk_free_chain<D: Read + Seek>(dev: &mut D, sb: &Superblock) -> Result<FreeChainSummary> {
    let addrlen = AddressLength::from_bytes(sb.addrlen)?;
    let block_size = BlockSize::from_exponent(sb.blocksize)?.bytes();
    let corrupt = |addr: Address, detail: String| Error::CorruptChain { addr, detail };

    let mut summary = FreeChainSummary::default();
    let mut seen = HashSet::new();
    let mut current = sb.freehead;
    while current != 0 {
        if current >= sb.blocks {
            return Err(corrupt(current, format!("beyond the last block {}", sb.blocks)));
        }
        if !seen.insert(current) {
            return Err(corrupt(current, "listed twice".to_string()));
        }
        let chain = ChainBlock::from_block(read_block(&mut *dev, current, block_size)?, addrlen)?;
        debug!("walking chain block addr={} next={}", current, chain.next());
        for addr in chain.addresses() {
            if addr >= sb.blocks {
                return Err(corrupt(current, format!("slot points at block {}", addr)));
            }
            if !seen.insert(addr) {
                return Err(corrupt(current, format!("block {} listed twice", addr)));
            }
            summary.free.push(addr);
        }
        summary.chain_blocks.push(current);
        current = chain.next();
    }
    if summary.tail().unwrap_or(0) != sb.freetail {
        return Err(corrupt(
            summary.tail().unwrap_or(0),
            format!("chain ends here but freetail is {}", sb.freetail),
        ));
    }
    Ok(summary)
}
