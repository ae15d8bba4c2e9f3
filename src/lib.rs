//! Userspace tools for the Lanyard filesystem (LanyFS).
//!
//! [`formatter`] writes an empty filesystem onto a device, [`detector`]
//! reads a device's superblock back and checks it.

pub mod block;
pub mod config;
pub mod converter;
pub mod detector;
pub mod error;
pub mod file;
pub mod formatter;
pub mod freechain;
pub mod logging;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use types::BlockType;
