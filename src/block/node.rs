//! Directory and file blocks, and the two records they share.
//!
//! Both kinds keep their binary tree links at [`BTREE_OFFSET`] and their
//! metadata at [`META_OFFSET`], so [`Block::btree`](super::Block::btree) and
//! [`Block::meta`](super::Block::meta) can read them without knowing which
//! kind of block they are looking at.

use super::timestamp::{Timestamp, TIMESTAMP_SIZE};
use super::{decode_name, encode_name};
use crate::converter::*;
use crate::types::*;
use bitflags::bitflags;

pub const BTREE_OFFSET: usize = 8;
pub const BTREE_SIZE: usize = 16;
pub const META_OFFSET: usize = 56;

const META_CREATED: usize = 0;
const META_MODIFIED: usize = META_CREATED + TIMESTAMP_SIZE;
const META_ATTR: usize = META_MODIFIED + TIMESTAMP_SIZE + 14; // 14 reserved bytes
const META_NAME: usize = META_ATTR + 2;
pub const META_SIZE: usize = META_NAME + NAME_LENGTH;

// directory fields
const DIR_SUBTREE: usize = BTREE_OFFSET + BTREE_SIZE;
pub const DIR_SIZE: usize = META_OFFSET + META_SIZE;

// file fields
const FILE_DATA: usize = BTREE_OFFSET + BTREE_SIZE;
const FILE_SIZE: usize = FILE_DATA + 8;
pub const FILE_BLOCK_SIZE: usize = META_OFFSET + META_SIZE;

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Attributes: u16 {
        const NOWRITE = 1 << 0;
        const NOEXEC = 1 << 1;
        const HIDDEN = 1 << 2;
        const ARCHIVE = 1 << 3;
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes::empty()
    }
}

/// Siblings sharing the same parent directory.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BTree {
    pub left: Address,
    pub right: Address,
}

impl BTree {
    pub fn decode(buf: &[u8]) -> Self {
        BTree {
            left: get_u64(buf, 0),
            right: get_u64(buf, 8),
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        put_u64(buf, 0, self.left);
        put_u64(buf, 8, self.right);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub created: Timestamp,
    pub modified: Timestamp,
    /// Unknown bits are kept as they were read.
    pub attr: Attributes,
    pub name: String,
}

impl Meta {
    pub fn new(name: &str) -> Self {
        let now = Timestamp::now();
        Meta {
            created: now,
            modified: now,
            attr: Attributes::empty(),
            name: name.to_string(),
        }
    }

    pub fn decode(buf: &[u8]) -> Self {
        Meta {
            created: Timestamp::decode(&buf[META_CREATED..]),
            modified: Timestamp::decode(&buf[META_MODIFIED..]),
            attr: Attributes::from_bits_retain(get_u16(buf, META_ATTR)),
            name: decode_name(&buf[META_NAME..META_NAME + NAME_LENGTH]),
        }
    }

    /// Returns `true` if the name was truncated.
    pub fn encode(&self, buf: &mut [u8]) -> bool {
        buf[..META_SIZE].iter_mut().for_each(|b| *b = 0);
        self.created.encode(&mut buf[META_CREATED..]);
        self.modified.encode(&mut buf[META_MODIFIED..]);
        put_u16(buf, META_ATTR, self.attr.bits());
        encode_name(&self.name, &mut buf[META_NAME..META_NAME + NAME_LENGTH])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirBlock {
    pub btree: BTree,
    /// Root of the binary tree of this directory's children.
    pub subtree: Address,
    pub meta: Meta,
}

impl DirBlock {
    pub fn decode(buf: &[u8]) -> Self {
        DirBlock {
            btree: BTree::decode(&buf[BTREE_OFFSET..]),
            subtree: get_u64(buf, DIR_SUBTREE),
            meta: Meta::decode(&buf[META_OFFSET..]),
        }
    }

    /// Writes the record body; the block header is left alone.
    pub fn encode(&self, buf: &mut [u8]) -> bool {
        buf[4..META_OFFSET].iter_mut().for_each(|b| *b = 0);
        self.btree.encode(&mut buf[BTREE_OFFSET..]);
        put_u64(buf, DIR_SUBTREE, self.subtree);
        self.meta.encode(&mut buf[META_OFFSET..])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBlock {
    pub btree: BTree,
    /// First extender or data block of the contents.
    pub data: Address,
    pub size: u64,
    pub meta: Meta,
}

impl FileBlock {
    pub fn decode(buf: &[u8]) -> Self {
        FileBlock {
            btree: BTree::decode(&buf[BTREE_OFFSET..]),
            data: get_u64(buf, FILE_DATA),
            size: get_u64(buf, FILE_SIZE),
            meta: Meta::decode(&buf[META_OFFSET..]),
        }
    }

    pub fn encode(&self, buf: &mut [u8]) -> bool {
        buf[4..META_OFFSET].iter_mut().for_each(|b| *b = 0);
        self.btree.encode(&mut buf[BTREE_OFFSET..]);
        put_u64(buf, FILE_DATA, self.data);
        put_u64(buf, FILE_SIZE, self.size);
        self.meta.encode(&mut buf[META_OFFSET..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(META_SIZE, 304);
        assert_eq!(DIR_SIZE, 360);
        assert_eq!(FILE_BLOCK_SIZE, 360);
    }

    #[test]
    fn meta_layout() {
        let mut m = Meta::new("LANYFSROOT");
        m.attr = Attributes::HIDDEN | Attributes::NOEXEC;
        let mut buf = [0u8; META_SIZE];
        assert!(!m.encode(&mut buf));
        assert_eq!(get_u16(&buf, 46), 0b0110);
        assert_eq!(&buf[48..58], b"LANYFSROOT");
        assert_eq!(buf[58], 0);
        assert_eq!(Meta::decode(&buf), m);
    }

    #[test]
    fn unknown_attribute_bits_survive() {
        let mut buf = [0u8; META_SIZE];
        put_u16(&mut buf, 46, 0x8001);
        let m = Meta::decode(&buf);
        assert!(m.attr.contains(Attributes::NOWRITE));
        assert_eq!(m.attr.bits(), 0x8001);
    }

    #[test]
    fn file_fields() {
        let f = FileBlock {
            btree: BTree { left: 5, right: 9 },
            data: 77,
            size: 1 << 40,
            meta: Meta::new("kernel.img"),
        };
        let mut buf = vec![0u8; 512];
        f.encode(&mut buf);
        assert_eq!(get_u64(&buf, 8), 5);
        assert_eq!(get_u64(&buf, 16), 9);
        assert_eq!(get_u64(&buf, 24), 77);
        assert_eq!(get_u64(&buf, 32), 1 << 40);
        assert_eq!(FileBlock::decode(&buf), f);
    }
}
