// Helpers for building synthetic save files in tests

use crate::bits::push16;
use crate::block::{BlockHeader, BlockType};
use crate::crypt::{CipherSeed, Keystream};
use crate::header::{FileHeader, FileType, FLAG_SUBMITTED, MAGIC};

pub fn sample_header() -> FileHeader {
    FileHeader {
        magic: MAGIC,
        game_id: 0x2b4c_7e19,
        version_major: 2,
        version_minor: 83,
        version_increment: 0,
        turn: 17,
        salt: 0x3c6,
        player_index: 1,
        file_type: FileType::Turn,
        flags: FLAG_SUBMITTED,
        trailing: Vec::new(),
    }
}

/// Frame one already-encrypted payload.
pub fn frame(kind: BlockType, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + payload.len());
    let word = BlockHeader {
        type_id: kind.id(),
        size: payload.len(),
    }
    .to_word();
    push16(&mut out, word);
    out.extend_from_slice(payload);
    out
}

/// Builds a file block by block from plaintext payloads, encrypting them
/// the way the game does.
pub struct FileBuilder {
    header: FileHeader,
    blocks: Vec<(BlockType, Vec<u8>, Vec<u8>)>,
}

impl FileBuilder {
    pub fn new(header: FileHeader) -> Self {
        FileBuilder {
            header,
            blocks: Vec::new(),
        }
    }

    pub fn block(mut self, kind: BlockType, plaintext: &[u8]) -> Self {
        self.blocks.push((kind, plaintext.to_vec(), Vec::new()));
        self
    }

    /// Planets block followed by its unencrypted coordinate table.
    pub fn planets(mut self, plaintext: &[u8], coordinates: &[u8]) -> Self {
        self.blocks
            .push((BlockType::Planets, plaintext.to_vec(), coordinates.to_vec()));
        self
    }

    pub fn footer(self, checksum: u16) -> Self {
        self.block(BlockType::FileFooter, &checksum.to_le_bytes())
    }

    pub fn build<K: Keystream + ?Sized>(&self, keystream: &mut K) -> Vec<u8> {
        let mut out = frame(BlockType::FileHeader, &self.header.encode());
        keystream.init(&CipherSeed::from_header(&self.header));
        for (kind, plaintext, trailer) in &self.blocks {
            let payload = if kind.is_encrypted() {
                keystream.encrypt(plaintext)
            } else {
                plaintext.clone()
            };
            out.extend(frame(*kind, &payload));
            out.extend_from_slice(trailer);
        }
        out
    }
}
