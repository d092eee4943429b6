//! Waypoints (type 20) and the orders that add, change or delete them
//! (types 3, 4, 5 and 19).

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{extract_bits, pack_bits, push16, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;

const TASKS: [&str; 10] = [
    "None",
    "Transport",
    "Colonize",
    "Remote Mining",
    "Merge with Fleet",
    "Scrap Fleet",
    "Lay Mine Field",
    "Patrol",
    "Route",
    "Transfer Fleet",
];

pub const TARGET_PLANET: u8 = 0x01;
pub const TARGET_FLEET: u8 = 0x02;
pub const TARGET_DEEP_SPACE: u8 = 0x04;
pub const TARGET_OBJECT: u8 = 0x08;

/// A fleet destination with its task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Waypoint {
    pub x: u16,
    pub y: u16,
    pub target_id: u16,
    pub warp: u8,
    pub task: u8,
    pub target_type: u8,
    /// Task-specific orders (transport amounts, merge target ...)
    pub task_data: Vec<u8>,
}

impl Waypoint {
    pub const LEN: usize = 8;

    fn decode_body(c: &mut Cursor) -> Result<Self, RecordError> {
        let x = c.u16()?;
        let y = c.u16()?;
        let target_id = c.u16()?;
        let warp_task = c.u8()? as u32;
        let target_type = c.u8()?;
        Ok(Waypoint {
            x,
            y,
            target_id,
            warp: extract_bits(warp_task, 4, 4) as u8,
            task: extract_bits(warp_task, 0, 4) as u8,
            target_type,
            task_data: c.rest(),
        })
    }

    fn encode_body(&self, out: &mut Vec<u8>) {
        push16(out, self.x);
        push16(out, self.y);
        push16(out, self.target_id);
        out.push(pack_bits(pack_bits(0, 4, 4, self.warp as u32), 0, 4, self.task as u32) as u8);
        out.push(self.target_type);
        out.extend_from_slice(&self.task_data);
    }

    pub fn task_name(&self) -> &'static str {
        TASKS.get(self.task as usize).copied().unwrap_or("Unknown")
    }

    pub fn targets_planet(&self) -> bool {
        self.target_type & TARGET_PLANET != 0
    }

    pub fn targets_fleet(&self) -> bool {
        self.target_type & TARGET_FLEET != 0
    }

    pub fn in_deep_space(&self) -> bool {
        self.target_type & TARGET_DEEP_SPACE != 0
    }
}

impl RecordCodec for Waypoint {
    const MIN_LEN: usize = Waypoint::LEN;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        Waypoint::decode_body(&mut Cursor::new(data))
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN + self.task_data.len());
        self.encode_body(&mut out);
        out
    }
}

fn split_fleet_word(word: u16) -> (u16, u16) {
    (
        extract_bits(word as u32, 0, 9) as u16,
        extract_bits(word as u32, 9, 7) as u16,
    )
}

fn join_fleet_word(number: u16, spare: u16) -> u16 {
    pack_bits(pack_bits(0, 0, 9, number as u32), 9, 7, spare as u32) as u16
}

/// Waypoint order addressed to a fleet: add, change, or a task listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaypointTask {
    pub kind: BlockType,
    /// 9-bit fleet number, zero-based
    pub fleet_number: u16,
    pub fleet_spare: u16,
    pub waypoint_index: u16,
    pub waypoint: Waypoint,
}

impl RecordCodec for WaypointTask {
    const MIN_LEN: usize = 4 + Waypoint::LEN;

    fn decode(kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let (fleet_number, fleet_spare) = split_fleet_word(c.u16()?);
        let waypoint_index = c.u16()?;
        let waypoint = Waypoint::decode_body(&mut c)?;
        Ok(WaypointTask {
            kind,
            fleet_number,
            fleet_spare,
            waypoint_index,
            waypoint,
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push16(&mut out, join_fleet_word(self.fleet_number, self.fleet_spare));
        push16(&mut out, self.waypoint_index);
        self.waypoint.encode_body(&mut out);
        out
    }
}

/// Order removing one waypoint from a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaypointDelete {
    pub fleet_number: u16,
    pub fleet_spare: u16,
    pub waypoint_index: u8,
    pub trailing: Vec<u8>,
}

impl RecordCodec for WaypointDelete {
    const MIN_LEN: usize = 3;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let (fleet_number, fleet_spare) = split_fleet_word(c.u16()?);
        Ok(WaypointDelete {
            fleet_number,
            fleet_spare,
            waypoint_index: c.u8()?,
            trailing: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        push16(&mut out, join_fleet_word(self.fleet_number, self.fleet_spare));
        out.push(self.waypoint_index);
        out.extend_from_slice(&self.trailing);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoint_layout() {
        let bytes = [0xE8, 0x03, 0x10, 0x04, 0x2A, 0x00, 0x61, 0x01];
        let w = Waypoint::decode(BlockType::Waypoint, &bytes).unwrap();
        assert_eq!(w.x, 1000);
        assert_eq!(w.y, 1040);
        assert_eq!(w.target_id, 42);
        assert_eq!(w.warp, 6);
        assert_eq!(w.task, 1);
        assert_eq!(w.task_name(), "Transport");
        assert!(w.targets_planet());
        assert!(!w.in_deep_space());
        assert!(w.task_data.is_empty());
        assert_eq!(w.encode(), bytes.to_vec());
    }

    #[test]
    fn test_waypoint_task_with_orders() {
        let bytes = [
            0x05, 0x03, // fleet 0x105 with spare bit
            0x02, 0x00, // waypoint 2
            0x20, 0x04, 0x30, 0x04, 0xFF, 0xFF, 0x98, 0x04, // deep space, warp 9, route
            0x10, 0x20, 0x30, // task data
        ];
        let t = WaypointTask::decode(BlockType::WaypointChangeTask, &bytes).unwrap();
        assert_eq!(t.fleet_number, 0x105);
        assert_eq!(t.fleet_spare, 1);
        assert_eq!(t.waypoint_index, 2);
        assert_eq!(t.waypoint.warp, 9);
        assert_eq!(t.waypoint.task_name(), "Route");
        assert!(t.waypoint.in_deep_space());
        assert_eq!(t.waypoint.task_data, vec![0x10, 0x20, 0x30]);
        assert_eq!(t.encode(), bytes.to_vec());
    }

    #[test]
    fn test_waypoint_delete() {
        let bytes = [0x07, 0x00, 0x03];
        let d = WaypointDelete::decode(BlockType::WaypointDelete, &bytes).unwrap();
        assert_eq!(d.fleet_number, 7);
        assert_eq!(d.waypoint_index, 3);
        assert_eq!(d.encode(), bytes.to_vec());
    }
}
