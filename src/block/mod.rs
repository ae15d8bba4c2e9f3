//! On-disk block shapes.
//!
//! Every block starts with a type tag, one reserved byte and a 16-bit write
//! counter. What follows depends on the tag; [`Block::view`] decodes it.

pub mod chain;
pub mod node;
pub mod sblock;
pub mod timestamp;

use crate::converter::*;
use crate::error::{Error, Result};
use crate::types::*;
use chain::{ChainHeader, ExtHeader, CHAIN_HEADER_SIZE, DATA_HEADER_SIZE, EXT_HEADER_SIZE};
use node::{BTree, DirBlock, FileBlock, Meta, BTREE_OFFSET, DIR_SIZE, FILE_BLOCK_SIZE, META_OFFSET};
use sblock::{Superblock, SUPERBLOCK_SIZE};

const TYPE: usize = 0;
const WRCNT: usize = 2;

// every record must fit into the smallest legal block
const _: () = assert!(SUPERBLOCK_SIZE <= MIN_BLOCK_SIZE);
const _: () = assert!(DIR_SIZE <= MIN_BLOCK_SIZE);
const _: () = assert!(FILE_BLOCK_SIZE <= MIN_BLOCK_SIZE);
const _: () = assert!(CHAIN_HEADER_SIZE + (MAX_ADDRLEN as usize) <= MIN_BLOCK_SIZE);
const _: () = assert!(EXT_HEADER_SIZE + (MAX_ADDRLEN as usize) <= MIN_BLOCK_SIZE);

/// A block's contents decoded according to its type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockView {
    Free,
    Superblock(Superblock),
    Directory(DirBlock),
    File(FileBlock),
    Chain(ChainHeader),
    Extender(ExtHeader),
    Data,
    Bad,
}

/// One block held in memory together with its on-disk address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    addr: Address,
    data: Vec<u8>,
}

impl Block {
    /// Zeroed block of `block_size` bytes carrying `kind`'s tag.
    pub fn new(addr: Address, block_size: usize, kind: BlockType) -> Self {
        let mut data = vec![0u8; block_size.max(MIN_BLOCK_SIZE)];
        data[TYPE] = kind.tag();
        Block { addr, data }
    }

    pub fn from_bytes(addr: Address, data: Vec<u8>) -> Result<Self> {
        if data.len() < MIN_BLOCK_SIZE {
            return Err(Error::Truncated {
                needed: MIN_BLOCK_SIZE,
                actual: data.len() as u64,
            });
        }
        Ok(Block { addr, data })
    }

    pub fn addr(&self) -> Address {
        self.addr
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn tag(&self) -> u8 {
        self.data[TYPE]
    }

    pub fn kind(&self) -> Result<BlockType> {
        BlockType::from_tag(self.tag()).ok_or_else(|| Error::UnknownBlockType(self.tag()))
    }

    pub fn expect_kind(&self, kind: BlockType) -> Result<()> {
        if self.tag() != kind.tag() {
            return Err(Error::TypeMismatch {
                expected: kind.tag(),
                found: self.tag(),
            });
        }
        Ok(())
    }

    pub fn write_counter(&self) -> u16 {
        get_u16(&self.data, WRCNT)
    }

    /// Called once per physical write; wraps silently.
    pub fn bump_write_counter(&mut self) {
        let n = self.write_counter().wrapping_add(1);
        put_u16(&mut self.data, WRCNT, n);
    }

    pub fn view(&self) -> Result<BlockView> {
        let view = match self.kind()? {
            BlockType::Free => BlockView::Free,
            BlockType::Superblock => BlockView::Superblock(Superblock::decode(&self.data)?),
            BlockType::Directory => BlockView::Directory(DirBlock::decode(&self.data)),
            BlockType::File => BlockView::File(FileBlock::decode(&self.data)),
            BlockType::Chain => BlockView::Chain(ChainHeader::decode(&self.data)),
            BlockType::Extender => BlockView::Extender(ExtHeader::decode(&self.data)),
            BlockType::Data => BlockView::Data,
            BlockType::Bad => BlockView::Bad,
        };
        Ok(view)
    }

    /// Binary tree links at the offset directory and file blocks share,
    /// whatever this block's tag says.
    pub fn btree(&self) -> BTree {
        BTree::decode(&self.data[BTREE_OFFSET..])
    }

    pub fn set_btree(&mut self, btree: &BTree) {
        btree.encode(&mut self.data[BTREE_OFFSET..])
    }

    /// Metadata at the offset directory and file blocks share, whatever
    /// this block's tag says.
    pub fn meta(&self) -> Meta {
        Meta::decode(&self.data[META_OFFSET..])
    }

    /// Returns `true` if the name was truncated.
    pub fn set_meta(&mut self, meta: &Meta) -> bool {
        meta.encode(&mut self.data[META_OFFSET..])
    }

    pub fn set_superblock(&mut self, sb: &Superblock) -> bool {
        sb.encode(&mut self.data)
    }

    pub fn set_dir(&mut self, dir: &DirBlock) -> bool {
        dir.encode(&mut self.data)
    }

    pub fn set_file(&mut self, file: &FileBlock) -> bool {
        file.encode(&mut self.data)
    }

    pub fn data_stream(&self) -> &[u8] {
        &self.data[DATA_HEADER_SIZE..]
    }

    pub fn data_stream_mut(&mut self) -> &mut [u8] {
        &mut self.data[DATA_HEADER_SIZE..]
    }
}

/// Name up to the first NUL, lossily decoded.
pub(crate) fn decode_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Copies `name` into `field` and null-pads it. Names that do not fit are cut
/// at the last UTF-8 boundary that does; returns `true` in that case.
pub(crate) fn encode_name(name: &str, field: &mut [u8]) -> bool {
    let mut len = name.len().min(field.len());
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    field.iter_mut().for_each(|b| *b = 0);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
    len < name.len()
}
