//! Fleets (types 16 and 17). The kind byte, not the block type, decides
//! between the full and the partial layout.

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{delta_byte, extract_bits, pack_bits, push16, push32, set_slots, signed_delta, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;
use crate::vlq::Cargo;

pub const KIND_PARTIAL: u8 = 3;
pub const KIND_FULL: u8 = 7;

/// Ship counts are 16-bit words when set, bytes otherwise.
const FLAG_WIDE_COUNTS: u8 = 0x08;

/// One ship type present in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShipCount {
    /// Design slot, 0..16
    pub slot: usize,
    pub count: u16,
}

/// Owner's view: cargo, damage and orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullFleet {
    pub cargo: Cargo,
    pub damaged_mask: u16,
    /// One raw damage word per set bit of `damaged_mask`
    pub damage: Vec<u16>,
    pub battle_plan: u8,
    pub waypoint_count: u8,
}

/// What other players see of a fleet in motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartialFleetInfo {
    pub dx: i8,
    pub dy: i8,
    pub warp: u8,
    /// High nibble of the warp byte
    pub warp_spare: u8,
    pub spare: u8,
    pub mass: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FleetDetail {
    Full(FullFleet),
    Partial(PartialFleetInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fleet {
    /// 9-bit fleet number, zero-based
    pub fleet_number: u16,
    pub owner: u8,
    pub spare_word: u16,
    pub flags: u8,
    pub position_object: u16,
    pub x: u16,
    pub y: u16,
    pub ship_types: u16,
    pub ships: Vec<ShipCount>,
    pub detail: FleetDetail,
    pub trailing: Vec<u8>,
}

impl Fleet {
    pub fn is_full(&self) -> bool {
        matches!(self.detail, FleetDetail::Full(_))
    }

    pub fn kind_byte(&self) -> u8 {
        if self.is_full() {
            KIND_FULL
        } else {
            KIND_PARTIAL
        }
    }

    pub fn ship_total(&self) -> u32 {
        self.ships.iter().map(|s| s.count as u32).sum()
    }

    pub fn cargo(&self) -> Option<&Cargo> {
        match &self.detail {
            FleetDetail::Full(full) => Some(&full.cargo),
            FleetDetail::Partial(_) => None,
        }
    }

    fn wide_counts(&self) -> bool {
        self.flags & FLAG_WIDE_COUNTS != 0
    }
}

impl RecordCodec for Fleet {
    const MIN_LEN: usize = 14;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let identity = c.u16()? as u32;
        let spare_word = c.u16()?;
        let kind = c.u8()?;
        if kind != KIND_FULL && kind != KIND_PARTIAL {
            return Err(RecordError::Invalid(format!("fleet kind byte {}", kind)));
        }
        let flags = c.u8()?;
        let position_object = c.u16()?;
        let x = c.u16()?;
        let y = c.u16()?;
        let ship_types = c.u16()?;

        let mut ships = Vec::new();
        for slot in set_slots(ship_types) {
            let count = if flags & FLAG_WIDE_COUNTS != 0 {
                c.u16()?
            } else {
                c.u8()? as u16
            };
            ships.push(ShipCount { slot, count });
        }

        let detail = if kind == KIND_FULL {
            let cargo = Cargo::decode(&mut c)?;
            let damaged_mask = c.u16()?;
            let mut damage = Vec::new();
            for _ in set_slots(damaged_mask) {
                damage.push(c.u16()?);
            }
            FleetDetail::Full(FullFleet {
                cargo,
                damaged_mask,
                damage,
                battle_plan: c.u8()?,
                waypoint_count: c.u8()?,
            })
        } else {
            let dx = signed_delta(c.u8()?);
            let dy = signed_delta(c.u8()?);
            let warp_byte = c.u8()? as u32;
            FleetDetail::Partial(PartialFleetInfo {
                dx,
                dy,
                warp: extract_bits(warp_byte, 0, 4) as u8,
                warp_spare: extract_bits(warp_byte, 4, 4) as u8,
                spare: c.u8()?,
                mass: c.u32()?,
            })
        };

        Ok(Fleet {
            fleet_number: extract_bits(identity, 0, 9) as u16,
            owner: extract_bits(identity, 9, 7) as u8,
            spare_word,
            flags,
            position_object,
            x,
            y,
            ship_types,
            ships,
            detail,
            trailing: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let identity = pack_bits(pack_bits(0, 0, 9, self.fleet_number as u32), 9, 7, self.owner as u32);
        push16(&mut out, identity as u16);
        push16(&mut out, self.spare_word);
        out.push(self.kind_byte());
        out.push(self.flags);
        push16(&mut out, self.position_object);
        push16(&mut out, self.x);
        push16(&mut out, self.y);
        push16(&mut out, self.ship_types);
        for ship in &self.ships {
            if self.wide_counts() {
                push16(&mut out, ship.count);
            } else {
                out.push(ship.count as u8);
            }
        }

        match &self.detail {
            FleetDetail::Full(full) => {
                full.cargo.encode(&mut out);
                push16(&mut out, full.damaged_mask);
                for &word in &full.damage {
                    push16(&mut out, word);
                }
                out.push(full.battle_plan);
                out.push(full.waypoint_count);
            }
            FleetDetail::Partial(p) => {
                out.push(delta_byte(p.dx));
                out.push(delta_byte(p.dy));
                out.push(pack_bits(p.warp as u32, 4, 4, p.warp_spare as u32) as u8);
                out.push(p.spare);
                push32(&mut out, p.mass);
            }
        }
        out.extend_from_slice(&self.trailing);
        out
    }
}
