use super::timestamp::{Timestamp, TIMESTAMP_SIZE};
use super::{decode_name, encode_name};
use crate::converter::*;
use crate::error::{Error, Result};
use crate::types::*;

const TYPE: usize = 0;
const WRCNT: usize = 2;
const MAGIC: usize = 4;
const MAJOR: usize = 8;
const MINOR: usize = 10;
const BLOCKSIZE: usize = 12;
const ADDRLEN: usize = 14;
const ROOTDIR: usize = 16;
const BLOCKS: usize = 24;
const FREEHEAD: usize = 32;
const FREETAIL: usize = 40;
const FREEBLOCKS: usize = 48;
const CREATED: usize = 56;
const UPDATED: usize = CREATED + TIMESTAMP_SIZE;
const CHECKED: usize = UPDATED + TIMESTAMP_SIZE;
const BADBLOCKS: usize = CHECKED + TIMESTAMP_SIZE;
const LABEL: usize = BADBLOCKS + 16; // 8 reserved bytes follow badblocks

pub const SUPERBLOCK_SIZE: usize = LABEL + NAME_LENGTH;

/// Decoded superblock, always at address 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub tag: u8,
    pub wrcnt: u16,
    pub magic: u32,
    pub major: u8,
    pub minor: u8,
    /// Block size exponent.
    pub blocksize: u8,
    /// Address length in bytes.
    pub addrlen: u8,
    pub rootdir: Address,
    pub blocks: u64,
    pub freehead: Address,
    pub freetail: Address,
    pub freeblocks: u64,
    pub created: Timestamp,
    pub updated: Timestamp,
    pub checked: Timestamp,
    pub badblocks: Address,
    pub label: String,
}

impl Superblock {
    /// Fresh superblock for a new filesystem. Roots and free list are
    /// placeholders until the formatter fills them in.
    pub fn new(blocksize: u8, addrlen: u8, blocks: u64, label: &str) -> Self {
        let now = Timestamp::now();
        Superblock {
            tag: BlockType::Superblock.tag(),
            wrcnt: 0,
            magic: SUPER_MAGIC,
            major: MAJOR_VERSION,
            minor: MINOR_VERSION,
            blocksize,
            addrlen,
            rootdir: 0,
            blocks,
            freehead: 0,
            freetail: 0,
            freeblocks: 0,
            created: now,
            updated: now,
            checked: Timestamp::null(),
            badblocks: 0,
            label: label.to_string(),
        }
    }

    /// Decodes without validating; see [`Superblock::validate`].
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < SUPERBLOCK_SIZE {
            return Err(Error::Truncated {
                needed: SUPERBLOCK_SIZE,
                actual: buf.len() as u64,
            });
        }
        Ok(Superblock {
            tag: buf[TYPE],
            wrcnt: get_u16(buf, WRCNT),
            magic: get_u32(buf, MAGIC),
            major: buf[MAJOR],
            minor: buf[MINOR],
            blocksize: buf[BLOCKSIZE],
            addrlen: buf[ADDRLEN],
            rootdir: get_u64(buf, ROOTDIR),
            blocks: get_u64(buf, BLOCKS),
            freehead: get_u64(buf, FREEHEAD),
            freetail: get_u64(buf, FREETAIL),
            freeblocks: get_u64(buf, FREEBLOCKS),
            created: Timestamp::decode(&buf[CREATED..]),
            updated: Timestamp::decode(&buf[UPDATED..]),
            checked: Timestamp::decode(&buf[CHECKED..]),
            badblocks: get_u64(buf, BADBLOCKS),
            label: decode_name(&buf[LABEL..LABEL + NAME_LENGTH]),
        })
    }

    /// Encodes every field except the write counter, which belongs to the
    /// block being flushed. Returns `true` if the label was truncated.
    pub fn encode(&self, buf: &mut [u8]) -> bool {
        let wrcnt = get_u16(buf, WRCNT);
        buf[..SUPERBLOCK_SIZE].iter_mut().for_each(|b| *b = 0);
        buf[TYPE] = self.tag;
        put_u16(buf, WRCNT, wrcnt);
        put_u32(buf, MAGIC, self.magic);
        buf[MAJOR] = self.major;
        buf[MINOR] = self.minor;
        buf[BLOCKSIZE] = self.blocksize;
        buf[ADDRLEN] = self.addrlen;
        put_u64(buf, ROOTDIR, self.rootdir);
        put_u64(buf, BLOCKS, self.blocks);
        put_u64(buf, FREEHEAD, self.freehead);
        put_u64(buf, FREETAIL, self.freetail);
        put_u64(buf, FREEBLOCKS, self.freeblocks);
        self.created.encode(&mut buf[CREATED..]);
        self.updated.encode(&mut buf[UPDATED..]);
        self.checked.encode(&mut buf[CHECKED..]);
        put_u64(buf, BADBLOCKS, self.badblocks);
        encode_name(&self.label, &mut buf[LABEL..LABEL + NAME_LENGTH])
    }

    /// Refreshes `updated`; call after changing any field.
    pub fn touch(&mut self) {
        self.updated = Timestamp::now();
    }

    pub fn check_type(&self) -> Result<()> {
        if self.tag != BlockType::Superblock.tag() {
            return Err(Error::TypeMismatch {
                expected: BlockType::Superblock.tag(),
                found: self.tag,
            });
        }
        Ok(())
    }

    pub fn check_magic_number(&self) -> Result<()> {
        if self.magic != SUPER_MAGIC {
            return Err(Error::MagicMismatch {
                expected: SUPER_MAGIC,
                found: self.magic,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.check_type()?;
        self.check_magic_number()
    }

    /// Block size in bytes, `None` for an exponent no `u64` can hold.
    pub fn block_size(&self) -> Option<u64> {
        1u64.checked_shl(self.blocksize.into())
    }
}
