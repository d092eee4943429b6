// Codec error handling

use std::fmt;

use crate::block::BlockType;

pub type Result<T> = std::result::Result<T, StarsError>;

/// Fatal errors surfaced to callers of the file codec.
///
/// Stream and header level failures abort the whole decode; nothing
/// partial is returned alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StarsError {
    // Header level
    NoFileHeaderFound { found: u8 },
    HeaderTooShort { len: usize },
    BadMagic { magic: [u8; 4] },
    UnsupportedVersion { major: u8, minor: u8 },

    // Stream level
    TruncatedBlockHeader { offset: usize },
    BlockOverrun {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    // Encode side
    PayloadTooLarge { kind: BlockType, len: usize },
    CoordinateOutOfRange { index: usize, x: u16, previous: u16 },
    PlanetCountMismatch { count: u16, planets: usize },
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    // Configuration
    Config(String),
}

impl fmt::Display for StarsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StarsError::NoFileHeaderFound { found } => {
                write!(f, "No file header found: first block has type {}", found)
            }
            StarsError::HeaderTooShort { len } => {
                write!(f, "File header too short: {} bytes, need 16", len)
            }
            StarsError::BadMagic { magic } => {
                write!(
                    f,
                    "Not a Stars! file: magic {:02x?} is not \"J3J3\"",
                    magic
                )
            }
            StarsError::UnsupportedVersion { major, minor } => {
                write!(f, "Unsupported file format version {}.{}", major, minor)
            }
            StarsError::TruncatedBlockHeader { offset } => {
                write!(f, "Truncated block header at offset {:#06x}", offset)
            }
            StarsError::BlockOverrun {
                offset,
                declared,
                remaining,
            } => {
                write!(
                    f,
                    "Block at offset {:#06x} declares {} bytes but only {} remain",
                    offset, declared, remaining
                )
            }
            StarsError::PayloadTooLarge { kind, len } => {
                write!(
                    f,
                    "{:?} payload of {} bytes does not fit a 10-bit block size",
                    kind, len
                )
            }
            StarsError::CoordinateOutOfRange { index, x, previous } => {
                write!(
                    f,
                    "Planet {} at x={} cannot be delta-packed after x={}",
                    index, x, previous
                )
            }
            StarsError::PlanetCountMismatch { count, planets } => {
                write!(
                    f,
                    "Universe declares {} planets but has {} coordinates",
                    count, planets
                )
            }
            StarsError::OutOfBounds { offset, width, len } => {
                write!(
                    f,
                    "Access of {} bytes at offset {} exceeds buffer of {} bytes",
                    width, offset, len
                )
            }
            StarsError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StarsError {}

/// Record-level decode problems. These never escape the dispatcher: a
/// failing record is kept as opaque bytes instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    Truncated { needed: usize, len: usize },
    Invalid(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordError::Truncated { needed, len } => {
                write!(f, "record needs {} bytes, has {}", needed, len)
            }
            RecordError::Invalid(msg) => write!(f, "invalid record: {}", msg),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<StarsError> for RecordError {
    fn from(e: StarsError) -> Self {
        match e {
            StarsError::OutOfBounds { offset, width, len } => RecordError::Truncated {
                needed: offset + width,
                len,
            },
            other => RecordError::Invalid(other.to_string()),
        }
    }
}
