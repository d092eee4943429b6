//! Nibble-packed game strings.
//!
//! The most common characters take a single nibble, the rest of the
//! printable set takes two, and anything else is escaped as a raw byte:
//!
//! - `0x0..=0xA`: `" aehilnorst"`
//! - `0xB x` .. `0xE x`: one of four 16-character tables
//! - `0xF lo hi`: raw byte `hi << 4 | lo`
//!
//! Nibbles are read high nibble first. An odd number of nibbles is padded
//! with one `0xF` nibble, which therefore also marks the end of the string.

use std::collections::HashMap;
use std::fmt;

use bitreader::BitReader;
use lazy_static::lazy_static;
use log::{debug, trace};
use serde::Serialize;

use crate::bits::Cursor;
use crate::error::RecordError;

const ONE_NIBBLE: &[u8] = b" aehilnorst";

const TWO_NIBBLE: [&[u8]; 4] = [
    b"ABCDEFGHIJKLMNOP",
    b"QRSTUVWXYZ012345",
    b"6789bcdfgjkmpquv",
    b"wxyz+-,!.?:;'*%$",
];

const ESCAPE: u8 = 0xF;

/// Length prefix bit marking a raw (unpacked) body.
pub const RAW_FLAG: u8 = 0x80;

/// Longest body a one-byte prefix can describe.
pub const MAX_BODY: usize = 0x7F;

lazy_static! {
    static ref NIBBLE_CODES: HashMap<char, Vec<u8>> = {
        let mut m = HashMap::new();
        for (i, &c) in ONE_NIBBLE.iter().enumerate() {
            m.insert(c as char, vec![i as u8]);
        }
        for (table, chars) in TWO_NIBBLE.iter().enumerate() {
            for (i, &c) in chars.iter().enumerate() {
                m.insert(c as char, vec![0xB + table as u8, i as u8]);
            }
        }
        m
    };
}

fn next_nibble(reader: &mut BitReader) -> Result<u8, RecordError> {
    reader
        .read_u8(4)
        .map_err(|e| RecordError::Invalid(format!("string ends inside a code: {}", e)))
}

/// Decode a packed body into text.
pub fn unpack_text(body: &[u8]) -> Result<String, RecordError> {
    let mut reader = BitReader::new(body);
    let mut text = String::new();

    while reader.remaining() >= 4 {
        let nibble = next_nibble(&mut reader)?;
        match nibble {
            0x0..=0xA => text.push(ONE_NIBBLE[nibble as usize] as char),
            0xB..=0xE => {
                let index = next_nibble(&mut reader)?;
                text.push(TWO_NIBBLE[(nibble - 0xB) as usize][index as usize] as char);
            }
            _ => {
                if reader.remaining() == 0 {
                    // pad nibble
                    break;
                }
                let lo = next_nibble(&mut reader)?;
                let hi = next_nibble(&mut reader)?;
                text.push(((hi << 4) | lo) as char);
            }
        }
    }

    trace!("unpacked {} bytes into {:?}", body.len(), text);
    Ok(text)
}

/// Encode text into a packed body, padding an odd nibble count.
///
/// Characters outside Latin-1 cannot be stored and are written as `?`.
pub fn pack_text(text: &str) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(text.len() * 2);
    for c in text.chars() {
        if let Some(codes) = NIBBLE_CODES.get(&c) {
            nibbles.extend_from_slice(codes);
            continue;
        }
        let byte = if (c as u32) <= 0xFF {
            c as u32 as u8
        } else {
            debug!("character {:?} has no single-byte form, storing '?'", c);
            b'?'
        };
        nibbles.extend_from_slice(&[ESCAPE, byte & 0x0F, byte >> 4]);
    }
    if nibbles.len() % 2 == 1 {
        nibbles.push(ESCAPE);
    }
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect()
}

/// A string as stored in a record, remembering whether it was packed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameString {
    pub text: String,
    pub raw: bool,
}

impl GameString {
    pub fn new(text: impl Into<String>) -> Self {
        GameString {
            text: text.into(),
            raw: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Read a length-prefixed string: prefix bit 7 clear gives the packed
    /// body length, bit 7 set gives a raw Latin-1 body of `prefix & 0x7F`.
    pub fn read(cursor: &mut Cursor) -> Result<GameString, RecordError> {
        let prefix = cursor.u8()?;
        let len = (prefix & !RAW_FLAG) as usize;
        let body = cursor.bytes(len)?;
        if prefix & RAW_FLAG != 0 {
            Ok(GameString {
                text: body.iter().map(|&b| b as char).collect(),
                raw: true,
            })
        } else {
            Ok(GameString {
                text: unpack_text(body)?,
                raw: false,
            })
        }
    }

    /// Append prefix and body. Over-long text is cut to fit the prefix.
    pub fn write(&self, out: &mut Vec<u8>) {
        let body = if self.raw {
            self.text
                .chars()
                .map(|c| if (c as u32) <= 0xFF { c as u32 as u8 } else { b'?' })
                .take(MAX_BODY)
                .collect::<Vec<u8>>()
        } else {
            let mut text = self.text.clone();
            let mut body = pack_text(&text);
            while body.len() > MAX_BODY {
                text.pop();
                body = pack_text(&text);
            }
            body
        };
        let flag = if self.raw { RAW_FLAG } else { 0 };
        out.push(flag | body.len() as u8);
        out.extend_from_slice(&body);
    }

    /// Number of bytes `write` will produce.
    pub fn encoded_len(&self) -> usize {
        let mut out = Vec::new();
        self.write(&mut out);
        out.len()
    }
}

impl fmt::Display for GameString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for GameString {
    fn from(s: &str) -> Self {
        GameString::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_one_nibble_characters() {
        // "hi" = 3, 4 -> 0x34
        assert_eq!(pack_text("hi"), vec![0x34]);
        assert_eq!(unpack_text(&[0x34]).unwrap(), "hi");
        // "a" alone is padded: 1, F
        assert_eq!(pack_text("a"), vec![0x1F]);
        assert_eq!(unpack_text(&[0x1F]).unwrap(), "a");
    }

    #[test]
    fn test_two_nibble_characters() {
        // 'H' = B7, 'u' = DE
        assert_eq!(pack_text("Hu"), vec![0xB7, 0xDE]);
        assert_eq!(unpack_text(&[0xB7, 0xDE]).unwrap(), "Hu");
        // 'Z' = C9 followed by 'e' = 2 then pad
        assert_eq!(pack_text("Ze"), vec![0xC9, 0x2F]);
        assert_eq!(unpack_text(&[0xC9, 0x2F]).unwrap(), "Ze");
    }

    #[test]
    fn test_escaped_byte() {
        // '#' = 0x23 is in no table: F, 3, 2 then pad
        assert_eq!(pack_text("#"), vec![0xF3, 0x2F]);
        assert_eq!(unpack_text(&[0xF3, 0x2F]).unwrap(), "#");
        // Latin-1 survives
        let packed = pack_text("é");
        assert_eq!(unpack_text(&packed).unwrap(), "é");
        // Outside Latin-1 is replaced
        assert_eq!(unpack_text(&pack_text("€")).unwrap(), "?");
    }

    #[test]
    fn test_empty_string() {
        assert!(pack_text("").is_empty());
        assert_eq!(unpack_text(&[]).unwrap(), "");

        let s = GameString::read(&mut Cursor::new(&[0x00])).unwrap();
        assert!(s.is_empty());
        assert!(!s.raw);
        let mut out = Vec::new();
        s.write(&mut out);
        assert_eq!(out, vec![0x00]);
    }

    #[test]
    fn test_truncated_code_is_an_error() {
        // 'B' prefix with nothing after it is impossible to pad, since the
        // second nibble would be the pad itself: B then F means 'P'.
        assert_eq!(unpack_text(&[0xBF]).unwrap(), "P");
        // An escape needs two more nibbles
        assert!(unpack_text(&[0xF1]).is_err());
    }

    #[test]
    fn test_length_prefixed_forms() {
        let packed = GameString::new("Humanoid");
        let mut out = Vec::new();
        packed.write(&mut out);
        assert_eq!(out[0] as usize, out.len() - 1);
        assert_eq!(out[0] & RAW_FLAG, 0);
        assert_eq!(GameString::read(&mut Cursor::new(&out)).unwrap(), packed);

        let raw = GameString {
            text: "Raw#1".to_string(),
            raw: true,
        };
        let mut out = Vec::new();
        raw.write(&mut out);
        assert_eq!(out, b"\x85Raw#1".to_vec());
        assert_eq!(GameString::read(&mut Cursor::new(&out)).unwrap(), raw);
        assert_eq!(raw.encoded_len(), 6);
    }

    #[test]
    fn test_overlong_text_is_cut() {
        let s = GameString::new("Q".repeat(200));
        let mut out = Vec::new();
        s.write(&mut out);
        assert!(out.len() - 1 <= MAX_BODY);
        let back = GameString::read(&mut Cursor::new(&out)).unwrap();
        assert!(s.text.starts_with(&back.text));
    }

    #[test]
    fn test_random_strings_round_trip() {
        let alphabet: Vec<char> = " aehilnorstABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789bcdfgjkmpquvwxyz+-,!.?:;'*%$#&()@"
            .chars()
            .collect();
        let mut rng = StdRng::seed_from_u64(0x5747);
        for _ in 0..500 {
            let len = rng.gen_range(0..40);
            let text: String = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            let packed = pack_text(&text);
            assert_eq!(unpack_text(&packed).unwrap(), text);
            assert_eq!(pack_text(&unpack_text(&packed).unwrap()), packed);
        }
    }
}
