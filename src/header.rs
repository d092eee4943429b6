use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use serde::Serialize;

use crate::bits::{extract_bits, pack_bits, push16, push32, Cursor};
use crate::error::{Result, StarsError};

pub const MAGIC: [u8; 4] = *b"J3J3";
pub const HEADER_LEN: usize = 16;

/// Highest major format version this codec understands.
pub const MAX_MAJOR_VERSION: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileType {
    Universe,
    Log,
    Host,
    Turn,
    History,
    Race,
    Other(u8),
}

impl FileType {
    pub fn from_byte(b: u8) -> FileType {
        match b {
            0 => FileType::Universe,
            1 => FileType::Log,
            2 => FileType::Host,
            3 => FileType::Turn,
            4 => FileType::History,
            5 => FileType::Race,
            other => FileType::Other(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            FileType::Universe => 0,
            FileType::Log => 1,
            FileType::Host => 2,
            FileType::Turn => 3,
            FileType::History => 4,
            FileType::Race => 5,
            FileType::Other(b) => b,
        }
    }

    /// Conventional file extension (`xy`, `x1`, `hst`, `m1`, `h1`, `r1`)
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Universe => "xy",
            FileType::Log => "x",
            FileType::Host => "hst",
            FileType::Turn => "m",
            FileType::History => "h",
            FileType::Race => "r",
            FileType::Other(_) => "?",
        }
    }
}

pub const FLAG_SUBMITTED: u8 = 0x01;
pub const FLAG_HOST_USING: u8 = 0x02;
pub const FLAG_MULTI_TURN: u8 = 0x04;
pub const FLAG_GAME_OVER: u8 = 0x08;
pub const FLAG_SHAREWARE: u8 = 0x10;

/// The unencrypted first block of every file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub game_id: u32,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_increment: u8,
    pub turn: u16,
    /// 11-bit keystream salt
    pub salt: u16,
    /// 5-bit player index
    pub player_index: u8,
    pub file_type: FileType,
    pub flags: u8,
    /// Bytes past the fixed 16, kept verbatim
    pub trailing: Vec<u8>,
}

impl FileHeader {
    pub fn decode(data: &[u8]) -> Result<FileHeader> {
        if data.len() < HEADER_LEN {
            return Err(StarsError::HeaderTooShort { len: data.len() });
        }
        let mut c = Cursor::new(data);
        let magic = c.array::<4>()?;
        if magic != MAGIC {
            return Err(StarsError::BadMagic { magic });
        }
        let game_id = c.u32()?;
        let version = c.u16()? as u32;
        let turn = c.u16()?;
        let player_word = c.u16()? as u32;
        let file_type = FileType::from_byte(c.u8()?);
        let flags = c.u8()?;

        let header = FileHeader {
            magic,
            game_id,
            version_major: extract_bits(version, 12, 4) as u8,
            version_minor: extract_bits(version, 5, 7) as u8,
            version_increment: extract_bits(version, 0, 5) as u8,
            turn,
            salt: extract_bits(player_word, 5, 11) as u16,
            player_index: extract_bits(player_word, 0, 5) as u8,
            file_type,
            flags,
            trailing: c.rest(),
        };
        if header.version_major > MAX_MAJOR_VERSION {
            return Err(StarsError::UnsupportedVersion {
                major: header.version_major,
                minor: header.version_minor,
            });
        }
        Ok(header)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.extend_from_slice(&self.magic);
        push32(&mut out, self.game_id);
        push16(&mut out, self.version_word());
        push16(&mut out, self.turn);
        let player_word = pack_bits(
            pack_bits(0, 5, 11, self.salt as u32),
            0,
            5,
            self.player_index as u32,
        );
        push16(&mut out, player_word as u16);
        out.push(self.file_type.to_byte());
        out.push(self.flags);
        out.extend_from_slice(&self.trailing);
        out
    }

    pub fn version_word(&self) -> u16 {
        let word = pack_bits(0, 12, 4, self.version_major as u32);
        let word = pack_bits(word, 5, 7, self.version_minor as u32);
        pack_bits(word, 0, 5, self.version_increment as u32) as u16
    }

    pub fn year(&self) -> u32 {
        2400 + self.turn as u32
    }

    pub fn is_submitted(&self) -> bool {
        self.flags & FLAG_SUBMITTED != 0
    }

    pub fn is_host_using(&self) -> bool {
        self.flags & FLAG_HOST_USING != 0
    }

    pub fn is_multi_turn(&self) -> bool {
        self.flags & FLAG_MULTI_TURN != 0
    }

    pub fn is_game_over(&self) -> bool {
        self.flags & FLAG_GAME_OVER != 0
    }

    pub fn is_shareware(&self) -> bool {
        self.flags & FLAG_SHAREWARE != 0
    }
}

impl Display for FileHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), Error> {
        write!(
            f,
            "
Game id:                  {:#010x}
Format version:           {}.{}.{}
Turn:                     {} (year {})
Player:                   {}
Salt:                     {:#05x}
File type:                {:?} (.{})
Submitted:                {}
Host using:               {}
Multiple turns:           {}
Game over:                {}
Shareware:                {}
",
            self.game_id,
            self.version_major,
            self.version_minor,
            self.version_increment,
            self.turn,
            self.year(),
            self.player_index + 1,
            self.salt,
            self.file_type,
            self.file_type.extension(),
            self.is_submitted(),
            self.is_host_using(),
            self.is_multi_turn(),
            self.is_game_over(),
            self.is_shareware(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileHeader {
        FileHeader {
            magic: MAGIC,
            game_id: 0x5f3a_9c21,
            version_major: 2,
            version_minor: 83,
            version_increment: 0,
            turn: 42,
            salt: 0x5a5,
            player_index: 3,
            file_type: FileType::Turn,
            flags: FLAG_SUBMITTED | FLAG_SHAREWARE,
            trailing: Vec::new(),
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample().encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(&bytes[0..4], b"J3J3");
        assert_eq!(&bytes[4..8], &[0x21, 0x9c, 0x3a, 0x5f]);
        // 2 << 12 | 83 << 5 | 0
        assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 0x2000 | (83 << 5));
        assert_eq!(u16::from_le_bytes([bytes[10], bytes[11]]), 42);
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), (0x5a5 << 5) | 3);
        assert_eq!(bytes[14], 3);
        assert_eq!(bytes[15], 0x11);

        let back = FileHeader::decode(&bytes).unwrap();
        assert_eq!(back, sample());
        assert_eq!(back.year(), 2442);
        assert!(back.is_submitted());
        assert!(back.is_shareware());
        assert!(!back.is_game_over());
    }

    #[test]
    fn test_header_errors() {
        assert_eq!(
            FileHeader::decode(&[0u8; 10]),
            Err(StarsError::HeaderTooShort { len: 10 })
        );

        let mut bytes = sample().encode();
        bytes[0] = b'X';
        assert!(matches!(
            FileHeader::decode(&bytes),
            Err(StarsError::BadMagic { .. })
        ));

        let mut future = sample();
        future.version_major = 3;
        assert_eq!(
            FileHeader::decode(&future.encode()),
            Err(StarsError::UnsupportedVersion { major: 3, minor: 83 })
        );
    }
}
