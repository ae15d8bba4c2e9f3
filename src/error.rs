use crate::types::Address;
use std::io;
use thiserror::Error;

/// Coarse classification of [`Error`]. Every kind is fatal for the tools.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before anything was written.
    Configuration,
    Io,
    /// The on-disk bytes are not what the format requires.
    Validation,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{op} error at block {addr}: {source}")]
    BlockIo {
        op: &'static str,
        addr: Address,
        #[source]
        source: io::Error,
    },

    #[error("invalid blocksize: {0}")]
    InvalidBlockSize(u64),

    #[error("invalid address length: {0} bit")]
    InvalidAddressLength(u64),

    #[error("device fits {blocks} blocks, at least {min} required")]
    DeviceTooSmall { blocks: u64, min: u64 },

    #[error("device holds {actual} bytes, at least {needed} required")]
    Truncated { needed: usize, actual: u64 },

    #[error("block type mismatch: expected {expected:#x}, found {found:#x}")]
    TypeMismatch { expected: u8, found: u8 },

    #[error("magic mismatch: expected {expected:#x}, found {found:#x}")]
    MagicMismatch { expected: u32, found: u32 },

    #[error("unknown block type {0:#x}")]
    UnknownBlockType(u8),

    #[error("chain block {addr} has no free slot")]
    ChainFull { addr: Address },

    #[error("address 0 is reserved for the superblock")]
    ReservedAddress,

    #[error("address {addr} does not fit in {addrlen} bytes")]
    AddressTooWide { addr: Address, addrlen: u8 },

    #[error("corrupt free chain at block {addr}: {detail}")]
    CorruptChain { addr: Address, detail: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            InvalidBlockSize(_) | InvalidAddressLength(_) | DeviceTooSmall { .. } => {
                ErrorKind::Configuration
            }
            Io(_) | BlockIo { .. } => ErrorKind::Io,
            Truncated { .. }
            | TypeMismatch { .. }
            | MagicMismatch { .. }
            | UnknownBlockType(_)
            | ChainFull { .. }
            | ReservedAddress
            | AddressTooWide { .. }
            | CorruptChain { .. } => ErrorKind::Validation,
        }
    }

    pub(crate) fn block_io(op: &'static str, addr: Address) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::BlockIo { op, addr, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
