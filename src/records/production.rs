//! Production queues (type 28) and queue change orders (type 29).

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{extract_bits, pack_bits, push16, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;

/// Item type nibble values seen in queues.
pub const ITEM_TYPE_STANDARD: u8 = 2;
pub const ITEM_TYPE_CUSTOM_DESIGN: u8 = 4;

/// One 4-byte queue entry.
///
/// ```text
/// chunk1: item id (6 bits, high) | count (10 bits)
/// chunk2: complete percent (12 bits, high) | item type (4 bits)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductionItem {
    pub item_id: u8,
    pub count: u16,
    /// Raw progress, 4095 = 100%
    pub complete_raw: u16,
    pub item_type: u8,
}

impl ProductionItem {
    pub const LEN: usize = 4;

    pub fn decode(c: &mut Cursor) -> Result<Self, RecordError> {
        let chunk1 = c.u16()? as u32;
        let chunk2 = c.u16()? as u32;
        Ok(ProductionItem {
            item_id: extract_bits(chunk1, 10, 6) as u8,
            count: extract_bits(chunk1, 0, 10) as u16,
            complete_raw: extract_bits(chunk2, 4, 12) as u16,
            item_type: extract_bits(chunk2, 0, 4) as u8,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let chunk1 = pack_bits(pack_bits(0, 10, 6, self.item_id as u32), 0, 10, self.count as u32);
        let chunk2 = pack_bits(
            pack_bits(0, 4, 12, self.complete_raw as u32),
            0,
            4,
            self.item_type as u32,
        );
        push16(out, chunk1 as u16);
        push16(out, chunk2 as u16);
    }

    /// Percentage as the game displays it.
    pub fn complete_percent(&self) -> f64 {
        self.complete_raw as f64 / 40.95
    }

    /// Name of the standard (non-design) items.
    pub fn standard_item_name(&self) -> Option<&'static str> {
        if self.item_type != ITEM_TYPE_STANDARD {
            return None;
        }
        let name = match self.item_id {
            0 => "Auto Mines",
            1 => "Auto Factories",
            2 => "Auto Defenses",
            3 => "Auto Alchemy",
            4 => "Auto Min Terraform",
            5 => "Auto Max Terraform",
            6 => "Auto Mineral Packets",
            7 => "Factory",
            8 => "Mine",
            9 => "Defense",
            11 => "Mineral Alchemy",
            14 => "Planetary Scanner",
            27 => "Ironium Packet",
            28 => "Boranium Packet",
            29 => "Germanium Packet",
            30 => "Mixed Packet",
            _ => return None,
        };
        Some(name)
    }
}

fn decode_items(c: &mut Cursor) -> Result<(Vec<ProductionItem>, Vec<u8>), RecordError> {
    let mut items = Vec::with_capacity(c.remaining() / ProductionItem::LEN);
    while c.remaining() >= ProductionItem::LEN {
        items.push(ProductionItem::decode(c)?);
    }
    Ok((items, c.rest()))
}

/// A planet's queue as stored in the turn file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductionQueue {
    pub items: Vec<ProductionItem>,
    /// Fewer than 4 leftover bytes
    pub trailing: Vec<u8>,
}

impl RecordCodec for ProductionQueue {
    const MIN_LEN: usize = 0;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let (items, trailing) = decode_items(&mut Cursor::new(data))?;
        Ok(ProductionQueue { items, trailing })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.items.len() * ProductionItem::LEN);
        for item in &self.items {
            item.encode(&mut out);
        }
        out.extend_from_slice(&self.trailing);
        out
    }
}

/// Order replacing a planet's queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductionQueueChange {
    /// 11-bit planet id
    pub planet_id: u16,
    /// Upper 5 bits of the planet word
    pub spare: u8,
    pub items: Vec<ProductionItem>,
    pub trailing: Vec<u8>,
}

impl RecordCodec for ProductionQueueChange {
    const MIN_LEN: usize = 2;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let word = c.u16()? as u32;
        let (items, trailing) = decode_items(&mut c)?;
        Ok(ProductionQueueChange {
            planet_id: extract_bits(word, 0, 11) as u16,
            spare: extract_bits(word, 11, 5) as u8,
            items,
            trailing,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let word = pack_bits(pack_bits(0, 0, 11, self.planet_id as u32), 11, 5, self.spare as u32);
        push16(&mut out, word as u16);
        for item in &self.items {
            item.encode(&mut out);
        }
        out.extend_from_slice(&self.trailing);
        out
    }
}
