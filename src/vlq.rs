//! Selector-prefixed variable-length quantities.
//!
//! Cargo and mineral amounts are stored as a header of 2-bit width
//! selectors followed by each value in the selected width:
//!
//! | selector | bytes | meaning                  |
//! |----------|-------|--------------------------|
//! | 0        | 0     | value is zero            |
//! | 1        | 1     | u8                       |
//! | 2        | 2     | u16 little-endian        |
//! | 3        | 4     | u32 little-endian        |
//!
//! Fleets pack five selectors (ironium, boranium, germanium, population,
//! fuel) into the low 10 bits of a 16-bit header word; planet surface
//! minerals pack four into a single byte.

use serde::Serialize;

use crate::bits::{extract_bits, pack_bits, push16, push32, Cursor};
use crate::error::Result;

/// Byte width a selector stands for.
pub fn width_of(selector: u8) -> usize {
    match selector & 0x03 {
        0 => 0,
        1 => 1,
        2 => 2,
        _ => 4,
    }
}

/// Smallest selector able to hold `value`; zero needs no bytes at all.
pub fn selector_for(value: u32) -> u8 {
    match value {
        0 => 0,
        1..=0xff => 1,
        0x100..=0xffff => 2,
        _ => 3,
    }
}

/// Read `count` values whose selectors sit in `header`, two bits each,
/// lowest field first.
pub fn read_fields(cursor: &mut Cursor, header: u32, count: usize) -> Result<Vec<u32>> {
    let mut values = Vec::with_capacity(count);
    for field in 0..count {
        let selector = extract_bits(header, (field * 2) as u32, 2) as u8;
        let value = match width_of(selector) {
            0 => 0,
            1 => cursor.u8()? as u32,
            2 => cursor.u16()? as u32,
            _ => cursor.u32()?,
        };
        values.push(value);
    }
    Ok(values)
}

/// Selector header for `values`, merged over the bits of `base` that are
/// not selector bits.
pub fn header_for(values: &[u32], base: u32) -> u32 {
    values.iter().enumerate().fold(base, |header, (field, &v)| {
        pack_bits(header, (field * 2) as u32, 2, selector_for(v) as u32)
    })
}

/// Append each value in the width its selector promises.
pub fn write_fields(out: &mut Vec<u8>, values: &[u32]) {
    for &value in values {
        match width_of(selector_for(value)) {
            0 => {}
            1 => out.push(value as u8),
            2 => push16(out, value as u16),
            _ => push32(out, value),
        }
    }
}

/// Fleet cargo with its 10-bit selector header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Cargo {
    pub ironium: u32,
    pub boranium: u32,
    pub germanium: u32,
    pub population: u32,
    pub fuel: u32,
    /// Header bits 10..16, carried verbatim
    pub header_spare: u8,
}

impl Cargo {
    pub const FIELDS: usize = 5;

    pub fn decode(cursor: &mut Cursor) -> Result<Cargo> {
        let header = cursor.u16()? as u32;
        let v = read_fields(cursor, header, Self::FIELDS)?;
        Ok(Cargo {
            ironium: v[0],
            boranium: v[1],
            germanium: v[2],
            population: v[3],
            fuel: v[4],
            header_spare: extract_bits(header, 10, 6) as u8,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let values = self.values();
        let base = pack_bits(0, 10, 6, self.header_spare as u32);
        push16(out, header_for(&values, base) as u16);
        write_fields(out, &values);
    }

    pub fn values(&self) -> [u32; 5] {
        [
            self.ironium,
            self.boranium,
            self.germanium,
            self.population,
            self.fuel,
        ]
    }
}

/// Planet surface minerals and population with an 8-bit selector header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SurfaceMinerals {
    pub ironium: u32,
    pub boranium: u32,
    pub germanium: u32,
    pub population: u32,
}

impl SurfaceMinerals {
    pub const FIELDS: usize = 4;

    pub fn decode(cursor: &mut Cursor) -> Result<SurfaceMinerals> {
        let header = cursor.u8()? as u32;
        let v = read_fields(cursor, header, Self::FIELDS)?;
        Ok(SurfaceMinerals {
            ironium: v[0],
            boranium: v[1],
            germanium: v[2],
            population: v[3],
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let values = [self.ironium, self.boranium, self.germanium, self.population];
        out.push(header_for(&values, 0) as u8);
        write_fields(out, &values);
    }
}
