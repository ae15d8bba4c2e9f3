//! Reports whether a device holds a LanyFS.
//!
//! Every field is printed before the next check runs, so a rejected device
//! still shows how far it got.

use crate::block::sblock::Superblock;
use crate::error::Result;
use crate::file::{get_memory_mapped_region, open_readonly_device};
use crate::types::MIN_BLOCK_SIZE;
use log::debug;
use std::io::Write;
use std::path::Path;

/// Bytes read from the start of the device: one block of the smallest size.
pub const DETECT_SIZE: usize = MIN_BLOCK_SIZE;

/// Prints the superblock in `region` to `out`, validating type tag and magic
/// as soon as each has been printed.
pub fn detect_superblock<W: Write>(region: &[u8], out: &mut W) -> Result<Superblock> {
    let sb = Superblock::decode(region)?;
    writeln!(out, "blocktype: {:#x}", sb.tag)?;
    sb.check_type()?;
    writeln!(out, "write counter: {}", sb.wrcnt)?;
    writeln!(out, "magic: {:#x}", sb.magic)?;
    sb.check_magic_number()?;
    writeln!(out, "version: {}.{}", sb.major, sb.minor)?;
    writeln!(out, "address length: {} bit", u32::from(sb.addrlen) * 8)?;
    match sb.block_size() {
        Some(bytes) => writeln!(out, "blocksize: {} bytes", bytes)?,
        None => writeln!(out, "blocksize: 2^{} bytes", sb.blocksize)?,
    }
    writeln!(out, "root dir: {}", sb.rootdir)?;
    writeln!(out, "total blocks: {}", sb.blocks)?;
    writeln!(out, "free head: {}", sb.freehead)?;
    writeln!(out, "free tail: {}", sb.freetail)?;
    writeln!(out, "free blocks: {}", sb.freeblocks)?;
    writeln!(out, "created: {}", sb.created)?;
    writeln!(out, "updated: {}", sb.updated)?;
    writeln!(out, "checked: {}", sb.checked)?;
    writeln!(out, "badblocks: {}", sb.badblocks)?;
    writeln!(out, "volume label: {}", sb.label)?;
    Ok(sb)
}

/// Maps the first [`DETECT_SIZE`] bytes of `path` and runs
/// [`detect_superblock`] on them. The device is closed on every path out.
pub fn detect_device<W: Write>(path: &Path, out: &mut W) -> Result<Superblock> {
    let mut file = open_readonly_device(path)?;
    let region = get_memory_mapped_region(&mut file, DETECT_SIZE)?;
    debug!("mapped {} bytes of {}", region.len(), path.display());
    detect_superblock(&region, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::*;

    fn region(sb: &Superblock) -> Vec<u8> {
        let mut buf = vec![0u8; DETECT_SIZE];
        sb.encode(&mut buf);
        buf
    }

    #[test]
    fn prints_every_field() {
        let mut sb = Superblock::new(12, 4, 4096, "scratch");
        sb.rootdir = 1;
        let mut out = Vec::new();
        let back = detect_superblock(&region(&sb), &mut out).unwrap();
        assert_eq!(back, sb);
        let text = String::from_utf8(out).unwrap();
        let keys: Vec<&str> = text.lines().map(|l| l.split(':').next().unwrap()).collect();
        assert_eq!(
            keys,
            vec![
                "blocktype",
                "write counter",
                "magic",
                "version",
                "address length",
                "blocksize",
                "root dir",
                "total blocks",
                "free head",
                "free tail",
                "free blocks",
                "created",
                "updated",
                "checked",
                "badblocks",
                "volume label",
            ]
        );
        assert!(text.contains("blocktype: 0xd0\n"));
        assert!(text.contains("magic: 0x594e414c\n"));
        assert!(text.contains("version: 1.4\n"));
        assert!(text.contains("address length: 32 bit\n"));
        assert!(text.contains("blocksize: 4096 bytes\n"));
        assert!(text.contains("checked: 0000-00-00T00:00:00.0+00:00\n"));
        assert!(text.ends_with("volume label: scratch\n"));
    }

    #[test]
    fn wrong_type_stops_after_the_tag() {
        let mut sb = Superblock::new(12, 4, 4096, "");
        sb.tag = BlockType::Directory.tag();
        let mut out = Vec::new();
        let err = detect_superblock(&region(&sb), &mut out).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { found: 0x10, .. }));
        assert_eq!(String::from_utf8(out).unwrap(), "blocktype: 0x10\n");
    }

    #[test]
    fn wrong_magic_is_printed_before_failing() {
        let mut sb = Superblock::new(12, 4, 4096, "");
        sb.magic = 0x1020_3040;
        let mut out = Vec::new();
        let err = detect_superblock(&region(&sb), &mut out).unwrap_err();
        assert!(matches!(err, Error::MagicMismatch { found: 0x1020_3040, .. }));
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("magic: 0x10203040\n"));
        assert!(!text.contains("version"));
    }

    #[test]
    fn absurd_blocksize_still_prints() {
        let mut sb = Superblock::new(12, 4, 4096, "");
        sb.blocksize = 70;
        let mut out = Vec::new();
        detect_superblock(&region(&sb), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("blocksize: 2^70 bytes\n"));
    }
}
