//! File footer (type 0): a 2-byte checksum, or nothing in host files.

use serde::Serialize;

use super::RecordCodec;
use crate::bits::Cursor;
use crate::block::BlockType;
use crate::error::RecordError;

/// Last block of a file. History files carry no checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileFooter {
    pub checksum: Option<u16>,
}

impl RecordCodec for FileFooter {
    const MIN_LEN: usize = 0;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        match data.len() {
            0 => Ok(FileFooter { checksum: None }),
            2 => Ok(FileFooter {
                checksum: Some(Cursor::new(data).u16()?),
            }),
            n => Err(RecordError::Invalid(format!("footer of {} bytes", n))),
        }
    }

    fn encode(&self) -> Vec<u8> {
        match self.checksum {
            Some(sum) => sum.to_le_bytes().to_vec(),
            None => Vec::new(),
        }
    }
}
