//! Block stream framing: split a file into blocks, decrypt them in order,
//! dispatch each payload to its record codec, and write everything back.
//!
//! Stream layout:
//!
//! ```text
//! [word: type << 10 | size][size bytes payload]   (repeated to end of file)
//! ```
//!
//! The first block must be the 16-byte plaintext file header; it seeds the
//! keystream used for every later block except the footer. The Planets
//! block is followed by `planet count * 4` unencrypted coordinate bytes
//! that its size field does not cover.

use indexmap::IndexMap;
use log::debug;

use crate::bits::{push16, read16};
use crate::block::{BlockHeader, BlockType, RawBlock, MAX_PAYLOAD};
use crate::crypt::{CipherSeed, Keystream};
use crate::error::{Result, StarsError};
use crate::header::FileHeader;
use crate::records::universe::{Universe, COORD_LEN};
use crate::records::{decode_record, BattleRecording, Record};

/// A framed block with its decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub raw: RawBlock,
    pub record: Record,
    /// Original payload length when the record was decoded zero-padded
    pub truncated_len: Option<usize>,
}

impl Block {
    pub fn kind(&self) -> BlockType {
        self.raw.kind
    }

    /// Plaintext payload as it will be written.
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = self.record.encode();
        if let Some(len) = self.truncated_len {
            payload.truncate(len);
        }
        payload
    }

    /// Unencrypted bytes written after the payload.
    pub fn trailer(&self) -> Result<Vec<u8>> {
        match &self.record {
            Record::Universe(_) => self.record.encode_trailer(),
            _ => Ok(self.raw.trailer.clone()),
        }
    }
}

/// One undecoded frame read from the stream.
struct Frame<'a> {
    header: BlockHeader,
    offset: usize,
    payload: &'a [u8],
}

/// Walks block headers through a byte stream.
struct FrameReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        FrameReader { bytes, offset: 0 }
    }

    fn at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn next_frame(&mut self) -> Result<Frame<'a>> {
        let offset = self.offset;
        if self.remaining() < 2 {
            return Err(StarsError::TruncatedBlockHeader { offset });
        }
        let header = BlockHeader::from_word(read16(self.bytes, offset)?);
        self.offset += 2;
        let payload = self.take(header.size, offset)?;
        Ok(Frame {
            header,
            offset,
            payload,
        })
    }

    /// Consume `len` bytes belonging to the block at `block_offset`.
    fn take(&mut self, len: usize, block_offset: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(StarsError::BlockOverrun {
                offset: block_offset,
                declared: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }
}

/// A whole decoded save file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarsFile {
    pub blocks: Vec<Block>,
}

impl StarsFile {
    /// Decode a complete file. Any framing or header problem aborts the
    /// decode; record level problems leave the record opaque.
    pub fn parse<K: Keystream + ?Sized>(bytes: &[u8], keystream: &mut K) -> Result<StarsFile> {
        if bytes.is_empty() {
            return Err(StarsError::HeaderTooShort { len: 0 });
        }

        let mut reader = FrameReader::new(bytes);
        let mut blocks: Vec<Block> = Vec::new();

        while !reader.at_end() {
            let frame = reader.next_frame()?;
            let kind = frame.header.kind();

            let block = if blocks.is_empty() {
                if kind != BlockType::FileHeader {
                    return Err(StarsError::NoFileHeaderFound {
                        found: frame.header.type_id,
                    });
                }
                let header = FileHeader::decode(frame.payload)?;
                debug!(
                    "File header: game {:#010x}, turn {}, player {}, salt {:#05x}",
                    header.game_id, header.turn, header.player_index, header.salt
                );
                keystream.init(&CipherSeed::from_header(&header));
                Block {
                    raw: RawBlock {
                        kind,
                        offset: frame.offset,
                        ciphertext: frame.payload.to_vec(),
                        plaintext: frame.payload.to_vec(),
                        trailer: Vec::new(),
                    },
                    record: Record::FileHeader(header),
                    truncated_len: None,
                }
            } else {
                let plaintext = if kind.is_encrypted() {
                    keystream.decrypt(frame.payload)
                } else {
                    frame.payload.to_vec()
                };

                let trailer = if kind == BlockType::Planets {
                    let count = Universe::planet_count_of(&plaintext).unwrap_or(0);
                    reader
                        .take(count * COORD_LEN, frame.offset)?
                        .to_vec()
                } else {
                    Vec::new()
                };

                let decoded = decode_record(kind, &plaintext, &trailer);
                Block {
                    raw: RawBlock {
                        kind,
                        offset: frame.offset,
                        ciphertext: frame.payload.to_vec(),
                        plaintext,
                        trailer,
                    },
                    record: decoded.record,
                    truncated_len: decoded.truncated_len,
                }
            };

            debug!(
                "Block {:?} ({}) at {:#06x}: {} bytes{}{}",
                kind,
                frame.header.type_id,
                frame.offset,
                frame.header.size,
                if block.raw.trailer.is_empty() {
                    String::new()
                } else {
                    format!(" + {} trailer", block.raw.trailer.len())
                },
                if block.record.is_opaque() { ", opaque" } else { "" }
            );
            blocks.push(block);
        }

        Ok(StarsFile { blocks })
    }

    /// Re-frame and re-encrypt every block. The keystream is seeded from
    /// the header record, so an edited header changes the cipher.
    pub fn to_bytes<K: Keystream + ?Sized>(&self, keystream: &mut K) -> Result<Vec<u8>> {
        match self.blocks.first() {
            Some(Block {
                record: Record::FileHeader(_),
                ..
            }) => {}
            Some(block) => {
                return Err(StarsError::NoFileHeaderFound {
                    found: block.kind().id(),
                })
            }
            None => return Err(StarsError::HeaderTooShort { len: 0 }),
        }

        let mut out = Vec::new();

        for (index, block) in self.blocks.iter().enumerate() {
            let kind = block.kind();
            let payload = block.payload();
            if payload.len() > MAX_PAYLOAD {
                return Err(StarsError::PayloadTooLarge {
                    kind,
                    len: payload.len(),
                });
            }

            let body = if let (0, Record::FileHeader(header)) = (index, &block.record) {
                keystream.init(&CipherSeed::from_header(header));
                payload
            } else if kind.is_encrypted() {
                keystream.encrypt(&payload)
            } else {
                payload
            };

            let word = BlockHeader {
                type_id: kind.id(),
                size: body.len(),
            }
            .to_word();
            push16(&mut out, word);
            out.extend_from_slice(&body);
            out.extend_from_slice(&block.trailer()?);
        }

        Ok(out)
    }

    pub fn header(&self) -> Option<&FileHeader> {
        match self.blocks.first().map(|b| &b.record) {
            Some(Record::FileHeader(header)) => Some(header),
            _ => None,
        }
    }

    pub fn records_of(&self, kind: BlockType) -> impl Iterator<Item = &Record> + '_ {
        self.blocks
            .iter()
            .filter(move |b| b.kind() == kind)
            .map(|b| &b.record)
    }

    /// Number of blocks per type, in order of first appearance.
    pub fn block_counts(&self) -> IndexMap<BlockType, usize> {
        let mut counts = IndexMap::new();
        for block in &self.blocks {
            *counts.entry(block.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Battles with their continuation blocks appended. A Battle block kept
    /// as raw bytes is skipped along with its continuations.
    pub fn battles(&self) -> Vec<BattleRecording> {
        let mut battles: Vec<BattleRecording> = Vec::new();
        let mut current: Option<usize> = None;
        for block in &self.blocks {
            match (block.kind(), &block.record) {
                (BlockType::Battle, Record::Battle(battle)) => {
                    battles.push(BattleRecording::new(battle.clone()));
                    current = Some(battles.len() - 1);
                }
                (BlockType::Battle, _) => {
                    debug!("Undecoded battle at {:#06x} skipped", block.raw.offset);
                    current = None;
                }
                (BlockType::BattleContinuation, _) => {
                    match current.and_then(|i| battles.get_mut(i)) {
                        Some(recording) => recording.append_continuation(&block.raw.plaintext),
                        None => debug!(
                            "Battle continuation at {:#06x} without a battle",
                            block.raw.offset
                        ),
                    }
                }
                _ => {}
            }
        }
        battles
    }

    /// Blocks whose bytes could not be given a typed record.
    pub fn opaque_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.record.is_opaque()).count()
    }
}
