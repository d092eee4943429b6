//! Fixed-width field access and bit packing shared by every record codec.
//!
//! All multi-byte values in the save files are little-endian. Readers fail
//! with `OutOfBounds` instead of panicking so that record decoders can turn
//! a short payload into a recoverable condition.

use bitvec::prelude::*;

use crate::error::{Result, StarsError};

fn check(buf_len: usize, offset: usize, width: usize) -> Result<()> {
    if offset.checked_add(width).map_or(true, |end| end > buf_len) {
        return Err(StarsError::OutOfBounds {
            offset,
            width,
            len: buf_len,
        });
    }
    Ok(())
}

pub fn read8(buf: &[u8], offset: usize) -> Result<u8> {
    check(buf.len(), offset, 1)?;
    Ok(buf[offset])
}

pub fn read16(buf: &[u8], offset: usize) -> Result<u16> {
    check(buf.len(), offset, 2)?;
    Ok(u16::from_le_bytes([buf[offset], buf[offset + 1]]))
}

pub fn read32(buf: &[u8], offset: usize) -> Result<u32> {
    check(buf.len(), offset, 4)?;
    Ok(u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]))
}

pub fn write16(buf: &mut [u8], offset: usize, value: u16) -> Result<()> {
    check(buf.len(), offset, 2)?;
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

pub fn write32(buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
    check(buf.len(), offset, 4)?;
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Append a little-endian word to an encoder buffer
pub fn push16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Append a little-endian double word to an encoder buffer
pub fn push32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Extract `count` bits starting at bit `start` (bit 0 = least significant).
pub fn extract_bits(word: u32, start: u32, count: u32) -> u32 {
    debug_assert!(start + count <= 32);
    if count == 0 {
        return 0;
    }
    (word >> start) & mask(count)
}

/// Return `word` with bits `start..start+count` replaced by `value`.
/// Bits of `value` above `count` are discarded.
pub fn pack_bits(word: u32, start: u32, count: u32, value: u32) -> u32 {
    debug_assert!(start + count <= 32);
    if count == 0 {
        return word;
    }
    let m = mask(count) << start;
    (word & !m) | ((value << start) & m)
}

fn mask(count: u32) -> u32 {
    if count >= 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    }
}

/// Reinterpret a stored byte as a signed movement delta.
pub fn signed_delta(byte: u8) -> i8 {
    byte as i8
}

pub fn delta_byte(delta: i8) -> u8 {
    delta as u8
}

/// Indexes of the set bits of a 16-bit slot mask, lowest slot first.
///
/// Fleets store one count per set bit of their ship-type mask, in slot order.
pub fn set_slots(mask: u16) -> Vec<usize> {
    mask.view_bits::<Lsb0>().iter_ones().collect()
}

/// Build a slot mask from slot indexes (0..16).
pub fn slots_mask(slots: impl IntoIterator<Item = usize>) -> u16 {
    let mut mask = 0u16;
    {
        let bits = mask.view_bits_mut::<Lsb0>();
        for slot in slots {
            bits.set(slot, true);
        }
    }
    mask
}

/// Sequential reader over a record payload.
///
/// Record layouts are mostly "read the next field", with optional sections
/// switched on by flag bits; the cursor keeps the offset bookkeeping out of
/// the codecs.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Cursor { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn u8(&mut self) -> Result<u8> {
        let v = read8(self.data, self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let v = read16(self.data, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn u32(&mut self) -> Result<u32> {
        let v = read32(self.data, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        check(self.data.len(), self.pos, n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    /// Everything not consumed yet. Used to preserve unknown trailing bytes.
    pub fn rest(&mut self) -> Vec<u8> {
        let start = self.pos.min(self.data.len());
        self.pos = self.data.len();
        self.data[start..].to_vec()
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        check(self.data.len(), self.pos, n)?;
        self.pos += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_access() {
        let mut buf = vec![0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(read16(&buf, 0).unwrap(), 0x1234);
        assert_eq!(read32(&buf, 2).unwrap(), 0x1234_5678);

        write16(&mut buf, 4, 0xbeef).unwrap();
        assert_eq!(&buf[4..], &[0xef, 0xbe]);
        write32(&mut buf, 0, 0xdead_beef).unwrap();
        assert_eq!(&buf[..4], &[0xef, 0xbe, 0xad, 0xde]);
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let buf = [0u8; 3];
        assert_eq!(
            read16(&buf, 2),
            Err(StarsError::OutOfBounds {
                offset: 2,
                width: 2,
                len: 3
            })
        );
        assert!(read32(&buf, 0).is_err());
        assert!(read8(&buf, 3).is_err());
        let mut buf = [0u8; 3];
        assert!(write32(&mut buf, 0, 1).is_err());
        assert!(write16(&mut buf, usize::MAX, 1).is_err());
    }

    #[test]
    fn test_extract_and_pack_bits() {
        // Production item word: 6-bit id over a 10-bit count
        let word = 0b000011_0000000101u32;
        assert_eq!(extract_bits(word, 10, 6), 3);
        assert_eq!(extract_bits(word, 0, 10), 5);

        let packed = pack_bits(pack_bits(0, 10, 6, 3), 0, 10, 5);
        assert_eq!(packed, word);

        // Oversized values are clipped to the field
        assert_eq!(pack_bits(0, 0, 4, 0x1f), 0x0f);
        assert_eq!(extract_bits(0xffff_ffff, 0, 32), 0xffff_ffff);
        assert_eq!(extract_bits(0xffff_ffff, 4, 0), 0);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(0xff), -1);
        assert_eq!(signed_delta(0x7f), 127);
        assert_eq!(signed_delta(0x80), -128);
        assert_eq!(delta_byte(-3), 0xfd);
    }

    #[test]
    fn test_slot_masks() {
        assert_eq!(set_slots(0), Vec::<usize>::new());
        assert_eq!(set_slots(0b1000_0000_0000_0101), vec![0, 2, 15]);
        assert_eq!(slots_mask([0, 2, 15]), 0b1000_0000_0000_0101);
    }

    #[test]
    fn test_cursor() {
        let data = [1u8, 2, 0, 3, 0, 0, 0, 9, 9];
        let mut c = Cursor::new(&data);
        assert_eq!(c.u8().unwrap(), 1);
        assert_eq!(c.u16().unwrap(), 2);
        assert_eq!(c.u32().unwrap(), 3);
        assert_eq!(c.remaining(), 2);
        assert!(c.u32().is_err());
        assert_eq!(c.position(), 7);
        assert_eq!(c.rest(), vec![9, 9]);
        assert!(c.is_empty());
    }
}
