/// On-disk block address. The stored width is [`AddressLength`](crate::config::AddressLength)
/// bytes inside chain slots and always 8 bytes in fixed record fields.
pub type Address = u64;

pub const SUPER_MAGIC: u32 = 0x594E_414C; // "LANY" read little endian

pub const MAJOR_VERSION: u8 = 1;
pub const MINOR_VERSION: u8 = 4;

pub const SUPERBLOCK_ADDR: Address = 0; // address 0 is never a payload value
pub const MIN_ADDRLEN: u8 = 1;
pub const MAX_ADDRLEN: u8 = 8;
pub const MIN_BLOCKSIZE: u8 = 9; // 2^9
pub const MAX_BLOCKSIZE: u8 = 12; // 2^12
pub const MIN_BLOCK_SIZE: usize = 1 << MIN_BLOCKSIZE;
pub const MAX_BLOCK_SIZE: usize = 1 << MAX_BLOCKSIZE;
pub const NAME_LENGTH: usize = 256; // label and file/directory names

// tool defaults
pub const DEFAULT_LABEL: &str = "LanyFS Storage";
pub const DEFAULT_BLOCKSIZE: u8 = 12;
pub const DEFAULT_ADDRLEN: u8 = 4;
pub const MIN_BLOCKS: u64 = 16;
pub const ROOTDIR_NAME: &str = "LANYFSROOT";

/// Block type tag stored in the first byte of every block.
///
/// The high nibble selects the category, the low nibble is reserved for
/// future extensions of a category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockType {
    Free = 0x00,
    Directory = 0x10,
    File = 0x20,
    Chain = 0x70,
    Extender = 0x80,
    Data = 0xA0,
    Superblock = 0xD0,
    Bad = 0xE0,
}

impl BlockType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        use BlockType::*;
        match tag {
            0x00 => Some(Free),
            0x10 => Some(Directory),
            0x20 => Some(File),
            0x70 => Some(Chain),
            0x80 => Some(Extender),
            0xA0 => Some(Data),
            0xD0 => Some(Superblock),
            0xE0 => Some(Bad),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use BlockType::*;
        match self {
            Free => write!(f, "free"),
            Directory => write!(f, "directory"),
            File => write!(f, "file"),
            Chain => write!(f, "chain"),
            Extender => write!(f, "extender"),
            Data => write!(f, "data"),
            Superblock => write!(f, "superblock"),
            Bad => write!(f, "bad block"),
        }
    }
}
