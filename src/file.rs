use crate::block::Block;
use crate::converter::block_addr_to_byte_range;
use crate::error::{Error, Result};
use crate::types::Address;
use memmap::{Mmap, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Opens an existing device or image for formatting. Never creates or
/// truncates.
pub fn open_device(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

pub fn open_readonly_device(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

/// Size in bytes, found by seeking to the end so block devices (whose
/// metadata length is 0) are measured too. Leaves the position at 0.
pub fn get_device_size<D: Seek>(dev: &mut D) -> io::Result<u64> {
    let size = dev.seek(SeekFrom::End(0))?;
    dev.seek(SeekFrom::Start(0))?;
    Ok(size)
}

/// Maps the first `len` bytes of `file` read-only. Fails with
/// [`Error::Truncated`] if the file is shorter.
pub fn get_memory_mapped_region(file: &mut File, len: usize) -> Result<Mmap> {
    let size = get_device_size(file)?;
    if size < len as u64 {
        return Err(Error::Truncated {
            needed: len,
            actual: size,
        });
    }
    let map = unsafe { MmapOptions::new().len(len).map(file)? };
    Ok(map)
}

fn seek_block<D: Seek>(dev: &mut D, addr: Address, block_size: usize) -> Result<()> {
    let pos = block_addr_to_byte_range(addr, block_size)
        .ok_or_else(|| {
            Error::block_io("seek", addr)(io::Error::new(
                io::ErrorKind::InvalidInput,
                "offset out of range",
            ))
        })?
        .start;
    dev.seek(SeekFrom::Start(pos))
        .map_err(Error::block_io("seek", addr))?;
    Ok(())
}

pub fn read_block<D: Read + Seek>(dev: &mut D, addr: Address, block_size: usize) -> Result<Block> {
    seek_block(dev, addr, block_size)?;
    let mut data = vec![0u8; block_size];
    dev.read_exact(&mut data)
        .map_err(Error::block_io("read", addr))?;
    Block::from_bytes(addr, data)
}

/// Writes `block` at its address, bumping its write counter first.
pub fn flush_block<D: Write + Seek>(dev: &mut D, block: &mut Block) -> Result<()> {
    seek_block(dev, block.addr(), block.size())?;
    block.bump_write_counter();
    dev.write_all(block.as_bytes())
        .map_err(Error::block_io("write", block.addr()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockType;
    use std::io::Cursor;

    #[test]
    fn size_by_seeking() {
        let mut dev = Cursor::new(vec![0u8; 3000]);
        dev.set_position(17);
        assert_eq!(get_device_size(&mut dev).unwrap(), 3000);
        assert_eq!(dev.position(), 0);
    }

    #[test]
    fn flush_then_read() {
        let mut dev = Cursor::new(vec![0u8; 4 * 512]);
        let mut block = Block::new(2, 512, BlockType::Data);
        block.data_stream_mut()[0] = 0x5A;
        flush_block(&mut dev, &mut block).unwrap();
        flush_block(&mut dev, &mut block).unwrap();
        assert_eq!(block.write_counter(), 2);
        let back = read_block(&mut dev, 2, 512).unwrap();
        assert_eq!(back, block);
        assert!(dev.get_ref()[..1024].iter().all(|&b| b == 0));
    }

    #[test]
    fn reading_past_the_end_names_the_block() {
        let mut dev = Cursor::new(vec![0u8; 1024]);
        let err = read_block(&mut dev, 5, 512).unwrap_err();
        assert!(matches!(err, Error::BlockIo { op: "read", addr: 5, .. }));
    }

    #[test]
    fn mapping_a_short_file_fails_cleanly() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&[1u8; 100]).unwrap();
        assert!(matches!(
            get_memory_mapped_region(&mut file, 512),
            Err(Error::Truncated { needed: 512, actual: 100 })
        ));
        file.seek(SeekFrom::End(0)).unwrap();
        file.write_all(&[2u8; 412]).unwrap();
        let map = get_memory_mapped_region(&mut file, 512).unwrap();
        assert_eq!(map.len(), 512);
        assert_eq!((map[0], map[511]), (1, 2));
    }
}
