//! Turns a raw device into an empty LanyFS.
//!
//! Layout after formatting: superblock at 0, root directory at 1, then the
//! free chain. The first chain block sits at 2; each further chain block
//! takes the next unlisted address at the moment the previous one fills up,
//! so chain blocks are carved out of the very space they describe.
//!
//! A failed write aborts the run and leaves the device half formatted.

use crate::block::node::{DirBlock, Meta};
use crate::block::sblock::Superblock;
use crate::block::Block;
use crate::config::{FormatOptions, Geometry};
use crate::error::{Error, Result};
use crate::file::{flush_block, get_device_size, open_device};
use crate::freechain::ChainBlock;
use crate::types::*;
use log::{debug, info, warn};
use std::io::{Seek, Write};
use std::path::Path;

/// What a finished format run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatReport {
    pub geometry: Geometry,
    pub rootdir: Address,
    pub freehead: Address,
    pub freetail: Address,
    /// Addresses listed in chain slots. Chain blocks are not counted.
    pub freeblocks: u64,
    pub chain_blocks: u64,
    pub label_truncated: bool,
}

pub struct Formatter<'a, D> {
    dev: &'a mut D,
    options: FormatOptions,
}

impl<'a, D: Write + Seek> Formatter<'a, D> {
    pub fn new(dev: &'a mut D, options: FormatOptions) -> Self {
        Formatter { dev, options }
    }

    fn block_size(&self) -> usize {
        self.options.block_size.bytes()
    }

    fn flush(&mut self, block: &mut Block) -> Result<()> {
        debug!("write block addr={} type={:#x}", block.addr(), block.tag());
        flush_block(&mut *self.dev, block)
    }

    /// Measures the device and applies the address space clamp. Writes
    /// nothing.
    pub fn probe(&mut self) -> Result<Geometry> {
        let bytes = get_device_size(&mut *self.dev)?;
        let geometry = Geometry::probe(bytes, self.options.block_size, self.options.address_length)?;
        info!("address length: {} bit", self.options.address_length.bits());
        info!("blocksize: {} bytes", self.block_size());
        info!("volume label: {}", self.options.label);
        if geometry.clamped() {
            warn!(
                "address length not sufficient, using {} of {} blocks",
                geometry.blocks, geometry.device_blocks
            );
        }
        if geometry.overhead > 0 {
            warn!("device has {} bytes overhead", geometry.overhead);
        }
        Ok(geometry)
    }

    pub fn run(mut self) -> Result<FormatReport> {
        let geometry = self.probe()?;
        let bs = self.block_size();
        let addrlen = self.options.address_length;
        let mut current = SUPERBLOCK_ADDR + 1;

        let mut sb = Superblock::new(
            self.options.block_size.exponent(),
            addrlen.bytes(),
            geometry.blocks,
            &self.options.label,
        );
        let mut sb_block = Block::new(SUPERBLOCK_ADDR, bs, BlockType::Superblock);
        let label_truncated = sb_block.set_superblock(&sb);
        if label_truncated {
            warn!("volume label truncated to {} bytes", NAME_LENGTH);
        }
        info!("writing superblock");
        self.flush(&mut sb_block)?;

        info!("creating root directory");
        let mut root = Block::new(current, bs, BlockType::Directory);
        current += 1;
        root.set_dir(&DirBlock {
            meta: Meta::new(ROOTDIR_NAME),
            ..DirBlock::default()
        });
        self.flush(&mut root)?;
        sb.rootdir = root.addr();

        info!("mapping free space");
        let mut chain = ChainBlock::new(current, bs, addrlen);
        current += 1;
        sb.freehead = chain.addr();
        let mut chain_blocks = 1;
        let mut freeblocks = 0;
        while current < geometry.blocks {
            match chain.write_slot(current) {
                Ok(slot) => {
                    debug!(
                        "chain block at addr={} slot={} target={}",
                        chain.addr(),
                        slot,
                        current
                    );
                    freeblocks += 1;
                }
                Err(Error::ChainFull { .. }) => {
                    chain.set_next(current);
                    self.flush(chain.block_mut())?;
                    chain = ChainBlock::new(current, bs, addrlen);
                    chain_blocks += 1;
                    debug!("allocated chain block at addr={} ({}/{})", current, current, geometry.blocks);
                }
                Err(e) => return Err(e),
            }
            current += 1;
        }
        sb.freetail = chain.addr();
        self.flush(chain.block_mut())?;
        info!("mapped {} free blocks in {} chain blocks", freeblocks, chain_blocks);

        info!("updating superblock");
        sb.freeblocks = freeblocks;
        sb.touch();
        sb_block.set_superblock(&sb);
        self.flush(&mut sb_block)?;

        Ok(FormatReport {
            geometry,
            rootdir: sb.rootdir,
            freehead: sb.freehead,
            freetail: sb.freetail,
            freeblocks,
            chain_blocks,
            label_truncated,
        })
    }
}

pub fn format<D: Write + Seek>(dev: &mut D, options: FormatOptions) -> Result<FormatReport> {
    Formatter::new(dev, options).run()
}

/// Formats the device or image file at `path`, which must already exist.
pub fn format_device(path: &Path, options: FormatOptions) -> Result<FormatReport> {
    let mut file = open_device(path)?;
    let report = format(&mut file, options)?;
    file.sync_all()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AddressLength, BlockSize};
    use crate::file::read_block;
    use crate::freechain::walk_free_chain;
    use std::io::Cursor;

    fn options(exp: u8, addrlen: u8) -> FormatOptions {
        FormatOptions {
            block_size: BlockSize::from_exponent(exp).unwrap(),
            address_length: AddressLength::from_bytes(addrlen).unwrap(),
            ..FormatOptions::default()
        }
    }

    fn device(bytes: usize) -> Cursor<Vec<u8>> {
        Cursor::new(vec![0u8; bytes])
    }

    #[test]
    fn sixteen_mebibytes_with_defaults() {
        let mut dev = device(16 << 20);
        let report = format(&mut dev, FormatOptions::default()).unwrap();
        assert_eq!(report.geometry.blocks, 4096);
        assert_eq!(report.rootdir, 1);
        assert_eq!(report.freehead, 2);
        assert_eq!(report.chain_blocks, 5);
        assert_eq!(report.freetail, 4090);
        let blocks = 4096u64;
        assert_eq!(report.freeblocks, blocks - 2 - (blocks - 2 + 1020) / 1021);

        let sb = Superblock::decode(dev.get_ref()).unwrap();
        sb.validate().unwrap();
        assert_eq!((sb.rootdir, sb.blocks), (1, 4096));
        assert_eq!(sb.badblocks, 0);
        assert_eq!((sb.freehead, sb.freetail, sb.freeblocks), (2, 4090, 4089));
        assert_eq!(sb.label, DEFAULT_LABEL);
        assert!(sb.checked.is_null());
        assert_eq!(sb.wrcnt, 2);
    }

    #[test]
    fn chain_blocks_are_written_once() {
        let mut dev = device(16 << 20);
        format(&mut dev, FormatOptions::default()).unwrap();
        let root = read_block(&mut dev, 1, 4096).unwrap();
        assert_eq!(root.write_counter(), 1);
        assert_eq!(root.meta().name, ROOTDIR_NAME);
        for addr in [2u64, 1024, 2046, 3068, 4090].iter() {
            let b = read_block(&mut dev, *addr, 4096).unwrap();
            assert_eq!(b.tag(), BlockType::Chain.tag());
            assert_eq!(b.write_counter(), 1, "chain block {}", addr);
        }
    }

    #[test]
    fn walk_covers_every_block_once() {
        let mut dev = device(16 << 20);
        let report = format(&mut dev, FormatOptions::default()).unwrap();
        let sb = Superblock::decode(dev.get_ref()).unwrap();
        let walk = walk_free_chain(&mut dev, &sb).unwrap();
        assert_eq!(walk.chain_blocks, vec![2, 1024, 2046, 3068, 4090]);
        assert_eq!(walk.free.len() as u64, report.freeblocks);
        let mut all: Vec<u64> = walk.free.iter().chain(walk.chain_blocks.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (2..4096).collect::<Vec<_>>());
    }

    #[test]
    fn last_chain_block_exactly_full() {
        // 62 slots per block; two chain blocks hold 2 * 63 addresses
        let mut dev = device(128 * 512);
        let report = format(&mut dev, options(9, 8)).unwrap();
        assert_eq!(report.chain_blocks, 2);
        assert_eq!(report.freetail, 65);
        assert_eq!(report.freeblocks, 124);
        let sb = Superblock::decode(dev.get_ref()).unwrap();
        let walk = walk_free_chain(&mut dev, &sb).unwrap();
        assert_eq!(walk.free.last(), Some(&127));
        let tail = ChainBlock::from_block(
            read_block(&mut dev, 65, 512).unwrap(),
            AddressLength::from_bytes(8).unwrap(),
        )
        .unwrap();
        assert_eq!(tail.find_free_slot(), None);
        assert_eq!(tail.next(), 0);
    }

    #[test]
    fn one_block_past_a_full_chain_becomes_an_empty_chain_block() {
        let mut dev = device(129 * 512);
        let report = format(&mut dev, options(9, 8)).unwrap();
        assert_eq!(report.chain_blocks, 3);
        assert_eq!(report.freetail, 128);
        assert_eq!(report.freeblocks, 124);
        let sb = Superblock::decode(dev.get_ref()).unwrap();
        let walk = walk_free_chain(&mut dev, &sb).unwrap();
        assert_eq!(walk.chain_blocks, vec![2, 65, 128]);
        assert_eq!(walk.free.len(), 124);
    }

    #[test]
    fn too_small_writes_nothing() {
        let mut dev = Cursor::new(vec![0xABu8; 15 * 4096]);
        let err = format(&mut dev, FormatOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DeviceTooSmall { blocks: 15, min: MIN_BLOCKS }));
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        assert!(dev.get_ref().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn smallest_device() {
        let mut dev = device(16 * 512);
        let report = format(&mut dev, options(9, 4)).unwrap();
        assert_eq!(report.chain_blocks, 1);
        assert_eq!(report.freeblocks, 13);
        assert_eq!((report.freehead, report.freetail), (2, 2));
    }

    #[test]
    fn clamps_to_the_address_space() {
        let mut dev = Cursor::new(vec![0xCDu8; 1000 * 512 + 7]);
        let report = format(&mut dev, options(9, 1)).unwrap();
        assert!(report.geometry.clamped());
        assert_eq!(report.geometry.blocks, 256);
        assert_eq!(report.geometry.overhead, 7);
        let sb = Superblock::decode(dev.get_ref()).unwrap();
        assert_eq!(sb.blocks, 256);
        let walk = walk_free_chain(&mut dev, &sb).unwrap();
        assert_eq!(walk.free.len() as u64, sb.freeblocks);
        assert!(walk.free.iter().all(|&a| a < 256));
        assert!(dev.get_ref()[256 * 512..].iter().all(|&b| b == 0xCD));
    }

    #[test]
    fn long_labels_are_truncated() {
        let mut opts = options(9, 4);
        opts.label = "x".repeat(300);
        let mut dev = device(16 * 512);
        let report = format(&mut dev, opts).unwrap();
        assert!(report.label_truncated);
        let sb = Superblock::decode(dev.get_ref()).unwrap();
        assert_eq!(sb.label.len(), NAME_LENGTH);
    }
}
