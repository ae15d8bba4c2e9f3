//! Conversion between host integers and the on-disk byte order.
//!
//! LanyFS stores every multi-byte integer little endian. The `to_disk*` and
//! `from_disk*` pairs are identities on little endian hosts and byte swaps
//! elsewhere. Block code does not call them: it goes through the `get_*`/`put_*`
//! helpers, which read and write fields in disk order straight out of a block
//! buffer at a byte offset.

use crate::types::Address;
use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;

/// Byte order of every on-disk integer.
pub type DiskOrder = LittleEndian;

pub fn to_disk16(n: u16) -> u16 {
    n.to_le()
}

pub fn from_disk16(n: u16) -> u16 {
    u16::from_le(n)
}

pub fn to_disk64(n: u64) -> u64 {
    n.to_le()
}

pub fn from_disk64(n: u64) -> u64 {
    u64::from_le(n)
}

pub fn get_u16(buf: &[u8], off: usize) -> u16 {
    DiskOrder::read_u16(&buf[off..off + 2])
}

pub fn put_u16(buf: &mut [u8], off: usize, n: u16) {
    DiskOrder::write_u16(&mut buf[off..off + 2], n)
}

pub fn get_i16(buf: &[u8], off: usize) -> i16 {
    DiskOrder::read_i16(&buf[off..off + 2])
}

pub fn put_i16(buf: &mut [u8], off: usize, n: i16) {
    DiskOrder::write_i16(&mut buf[off..off + 2], n)
}

pub fn get_u32(buf: &[u8], off: usize) -> u32 {
    DiskOrder::read_u32(&buf[off..off + 4])
}

pub fn put_u32(buf: &mut [u8], off: usize, n: u32) {
    DiskOrder::write_u32(&mut buf[off..off + 4], n)
}

pub fn get_u64(buf: &[u8], off: usize) -> u64 {
    DiskOrder::read_u64(&buf[off..off + 8])
}

pub fn put_u64(buf: &mut [u8], off: usize, n: u64) {
    DiskOrder::write_u64(&mut buf[off..off + 8], n)
}

/// Reads an unsigned integer `width` bytes wide (1 to 8).
pub fn get_uint(buf: &[u8], off: usize, width: usize) -> u64 {
    DiskOrder::read_uint(&buf[off..off + width], width)
}

/// Writes the low `width` bytes of `n`. `n` must fit in `width` bytes.
pub fn put_uint(buf: &mut [u8], off: usize, n: u64, width: usize) {
    DiskOrder::write_uint(&mut buf[off..off + width], n, width)
}

/// Byte range occupied by the block at `addr`, or `None` if it lies beyond
/// what a `u64` offset can express.
pub fn block_addr_to_byte_range(addr: Address, block_size: usize) -> Option<Range<u64>> {
    let start = addr.checked_mul(block_size as u64)?;
    let end = start.checked_add(block_size as u64)?;
    Some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_16(n in any::<u16>()) {
            prop_assert_eq!(from_disk16(to_disk16(n)), n);
        }

        #[test]
        fn round_trip_64(n in any::<u64>()) {
            prop_assert_eq!(from_disk64(to_disk64(n)), n);
        }

        #[test]
        fn put_then_get_any_width(n in any::<u64>(), width in 1usize..=8) {
            let mask = if width == 8 { u64::MAX } else { (1u64 << (width * 8)) - 1 };
            let mut buf = [0u8; 16];
            put_uint(&mut buf, 3, n & mask, width);
            prop_assert_eq!(get_uint(&buf, 3, width), n & mask);
        }
    }

    #[test]
    fn fields_are_little_endian() {
        let mut buf = [0u8; 8];
        put_u16(&mut buf, 0, 0x1234);
        assert_eq!(&buf[..2], &[0x34, 0x12]);
        put_u64(&mut buf, 0, 0x0102_0304_0506_0708);
        assert_eq!(buf, [8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(to_disk64(0x0102_0304_0506_0708).to_ne_bytes(), buf);
    }

    #[test]
    fn narrow_slot_leaves_neighbours_alone() {
        let mut buf = [0xFFu8; 6];
        put_uint(&mut buf, 1, 0x00AB_CDEF, 3);
        assert_eq!(buf, [0xFF, 0xEF, 0xCD, 0xAB, 0xFF, 0xFF]);
    }

    #[test]
    fn block_ranges() {
        assert_eq!(block_addr_to_byte_range(0, 512), Some(0..512));
        assert_eq!(block_addr_to_byte_range(3, 4096), Some(12288..16384));
        assert_eq!(block_addr_to_byte_range(u64::MAX, 4096), None);
    }
}
