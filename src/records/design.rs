//! Ship and starbase designs (type 26) and design change orders (type 27).
//!
//! A full design lists its slots; a partial design, as seen for other
//! players, carries only the mass.

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{extract_bits, pack_bits, push16, push32, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;
use crate::text::GameString;

const FLAG_FULL: u8 = 0x04;
const STARBASE_BIT: u8 = 0x40;

/// One hull slot: which component category, item and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DesignSlot {
    pub category: u16,
    pub item_id: u8,
    pub count: u8,
}

impl DesignSlot {
    pub const LEN: usize = 4;

    pub fn category_name(&self) -> &'static str {
        match self.category {
            0x0000 => "Empty",
            0x0001 => "Engine",
            0x0002 => "Scanner",
            0x0004 => "Shield",
            0x0008 => "Armor",
            0x0010 => "Beam Weapon",
            0x0020 => "Torpedo",
            0x0040 => "Bomb",
            0x0080 => "Mining Robot",
            0x0100 => "Mine Layer",
            0x0200 => "Orbital",
            0x0400 => "Planetary",
            0x0800 => "Electrical",
            0x1000 => "Mechanical",
            _ => "Mixed",
        }
    }
}

/// Details only the owner sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullDesign {
    pub armor: u16,
    pub turn_designed: u16,
    pub total_built: u32,
    pub total_remaining: u32,
    pub slots: Vec<DesignSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DesignDetail {
    Full(FullDesign),
    /// Other players only learn the mass.
    Partial { mass: u16 },
}

/// A ship or starbase design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Design {
    /// Byte 0; bit 2 selects the full layout
    pub flags: u8,
    pub design_number: u8,
    pub is_starbase: bool,
    /// Bits of byte 1 outside the number and starbase flag
    pub spare: u8,
    pub hull_id: u8,
    pub picture: u8,
    pub detail: DesignDetail,
    pub name: GameString,
    pub trailing: Vec<u8>,
}

impl Design {
    pub fn is_full(&self) -> bool {
        matches!(self.detail, DesignDetail::Full(_))
    }

    pub fn slots(&self) -> &[DesignSlot] {
        match &self.detail {
            DesignDetail::Full(full) => &full.slots,
            DesignDetail::Partial { .. } => &[],
        }
    }

    pub(crate) fn decode_from(c: &mut Cursor) -> Result<Design, RecordError> {
        let flags = c.u8()?;
        let id_byte = c.u8()?;
        let hull_id = c.u8()?;
        let picture = c.u8()?;

        let detail = if flags & FLAG_FULL != 0 {
            let armor = c.u16()?;
            let slot_count = c.u8()? as usize;
            let turn_designed = c.u16()?;
            let total_built = c.u32()?;
            let total_remaining = c.u32()?;
            let mut slots = Vec::with_capacity(slot_count);
            for _ in 0..slot_count {
                slots.push(DesignSlot {
                    category: c.u16()?,
                    item_id: c.u8()?,
                    count: c.u8()?,
                });
            }
            DesignDetail::Full(FullDesign {
                armor,
                turn_designed,
                total_built,
                total_remaining,
                slots,
            })
        } else {
            DesignDetail::Partial { mass: c.u16()? }
        };

        let name = GameString::read(c)?;
        Ok(Design {
            flags,
            design_number: extract_bits(id_byte as u32, 2, 4) as u8,
            is_starbase: id_byte & STARBASE_BIT != 0,
            spare: id_byte & !(STARBASE_BIT | 0x3C),
            hull_id,
            picture,
            detail,
            name,
            trailing: c.rest(),
        })
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        // The flag byte has to agree with the layout that follows
        let flags = if self.is_full() {
            self.flags | FLAG_FULL
        } else {
            self.flags & !FLAG_FULL
        };
        out.push(flags);
        let mut id_byte = pack_bits(self.spare as u32, 2, 4, self.design_number as u32) as u8;
        if self.is_starbase {
            id_byte |= STARBASE_BIT;
        }
        out.push(id_byte);
        out.push(self.hull_id);
        out.push(self.picture);

        match &self.detail {
            DesignDetail::Full(full) => {
                push16(out, full.armor);
                out.push(full.slots.len() as u8);
                push16(out, full.turn_designed);
                push32(out, full.total_built);
                push32(out, full.total_remaining);
                for slot in &full.slots {
                    push16(out, slot.category);
                    out.push(slot.item_id);
                    out.push(slot.count);
                }
            }
            DesignDetail::Partial { mass } => push16(out, *mass),
        }
        self.name.write(out);
        out.extend_from_slice(&self.trailing);
    }
}

impl RecordCodec for Design {
    const MIN_LEN: usize = 7;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        Design::decode_from(&mut Cursor::new(data))
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

/// Order that deletes a design slot or replaces it with a new design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignChange {
    /// Byte 0; a zero low nibble means delete
    pub op: u8,
    pub design_number: u8,
    pub is_starbase: bool,
    pub spare: u8,
    pub design: Option<Design>,
    /// Bytes after a delete order
    pub trailing: Vec<u8>,
}

impl DesignChange {
    pub fn is_delete(&self) -> bool {
        self.op & 0x0F == 0
    }
}

impl RecordCodec for DesignChange {
    const MIN_LEN: usize = 2;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let op = c.u8()?;
        let target = c.u8()?;
        let (design, trailing) = if op & 0x0F == 0 {
            (None, c.rest())
        } else {
            (Some(Design::decode_from(&mut c)?), Vec::new())
        };
        Ok(DesignChange {
            op,
            design_number: target & 0x0F,
            is_starbase: target & 0x10 != 0,
            spare: target & 0xE0,
            design,
            trailing,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.op];
        let mut target = (self.design_number & 0x0F) | (self.spare & 0xE0);
        if self.is_starbase {
            target |= 0x10;
        }
        out.push(target);
        match &self.design {
            Some(design) => design.encode_into(&mut out),
            None => out.extend_from_slice(&self.trailing),
        }
        out
    }
}
