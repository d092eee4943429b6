//! Map objects (type 43): minefields, packets, salvage, wormholes and the
//! mystery trader, or a bare object count.

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{extract_bits, pack_bits, push16, push32, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;

pub const TYPE_MINEFIELD: u8 = 0;
pub const TYPE_PACKET: u8 = 1;
pub const TYPE_WORMHOLE: u8 = 2;
pub const TYPE_TRADER: u8 = 3;

const TAIL_LEN: usize = 12;
/// Destination high byte marking salvage rather than a mineral packet
const SALVAGE_MARK: u16 = 0xFF00;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Minefield {
    pub mine_count: u32,
    pub spare1: u16,
    pub mine_type: u8,
    pub detonating: u8,
    pub spare2: u16,
    pub turn: u16,
}

impl Minefield {
    pub fn type_name(&self) -> &'static str {
        match self.mine_type {
            0 => "Standard",
            1 => "Heavy",
            2 => "Speed Bump",
            _ => "Unknown",
        }
    }
}

/// Mineral packet or salvage; they share a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Packet {
    pub destination: u16,
    pub ironium: u16,
    pub boranium: u16,
    pub germanium: u16,
    pub warp: u8,
    pub spare1: u8,
    pub spare2: u16,
}

impl Packet {
    pub fn is_salvage(&self) -> bool {
        self.destination & SALVAGE_MARK == SALVAGE_MARK
    }

    /// Target planet id; salvage has none.
    pub fn destination_planet(&self) -> Option<u16> {
        if self.is_salvage() {
            None
        } else {
            Some(self.destination)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Wormhole {
    pub flags: u16,
    /// One bit per player that has travelled through
    pub been_through: u16,
    pub target_id: u16,
    pub spare: [u8; 6],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trader {
    pub x_dest: u16,
    pub y_dest: u16,
    pub warp: u8,
    pub spare: u8,
    /// One bit per player that has met the trader
    pub met: u16,
    pub items: u16,
    pub turn: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ObjectBody {
    /// Two-byte payload: number of objects that follow
    Count(u16),
    Minefield(Minefield),
    Packet(Packet),
    Salvage(Packet),
    Wormhole(Wormhole),
    Trader(Trader),
    /// Object types 4..8; everything after the position
    Other(Vec<u8>),
}

/// A map object. For `ObjectBody::Count` the identity and position fields
/// are zero and not encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRecord {
    pub object_type: u8,
    pub owner: u8,
    pub number: u16,
    pub x: u16,
    pub y: u16,
    pub body: ObjectBody,
    pub trailing: Vec<u8>,
}

impl ObjectRecord {
    pub fn count(count: u16) -> Self {
        ObjectRecord {
            object_type: 0,
            owner: 0,
            number: 0,
            x: 0,
            y: 0,
            body: ObjectBody::Count(count),
            trailing: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.body {
            ObjectBody::Count(_) => "Object count",
            ObjectBody::Minefield(_) => "Minefield",
            ObjectBody::Packet(_) => "Mineral packet",
            ObjectBody::Salvage(_) => "Salvage",
            ObjectBody::Wormhole(_) => "Wormhole",
            ObjectBody::Trader(_) => "Mystery trader",
            ObjectBody::Other(_) => "Unknown object",
        }
    }

    pub fn summary(&self) -> String {
        match &self.body {
            ObjectBody::Count(n) => format!("{} objects", n),
            ObjectBody::Minefield(m) => format!(
                "{} minefield #{} owner {} at ({}, {}), {} mines",
                m.type_name(),
                self.number,
                self.owner,
                self.x,
                self.y,
                m.mine_count
            ),
            ObjectBody::Packet(p) | ObjectBody::Salvage(p) => format!(
                "{} #{} at ({}, {}) carrying {}/{}/{}",
                self.type_name(),
                self.number,
                self.x,
                self.y,
                p.ironium,
                p.boranium,
                p.germanium
            ),
            ObjectBody::Wormhole(w) => format!(
                "wormhole #{} at ({}, {}) -> #{}",
                self.number, self.x, self.y, w.target_id
            ),
            ObjectBody::Trader(t) => format!(
                "mystery trader at ({}, {}) heading to ({}, {})",
                self.x, self.y, t.x_dest, t.y_dest
            ),
            ObjectBody::Other(bytes) => format!(
                "object type {} at ({}, {}), {} bytes",
                self.object_type,
                self.x,
                self.y,
                bytes.len()
            ),
        }
    }
}

fn decode_body(object_type: u8, c: &mut Cursor) -> Result<ObjectBody, RecordError> {
    if object_type > TYPE_TRADER {
        return Ok(ObjectBody::Other(c.rest()));
    }
    if c.remaining() < TAIL_LEN {
        return Err(RecordError::Truncated {
            needed: c.position() + TAIL_LEN,
            len: c.position() + c.remaining(),
        });
    }
    let body = match object_type {
        TYPE_MINEFIELD => ObjectBody::Minefield(Minefield {
            mine_count: c.u32()?,
            spare1: c.u16()?,
            mine_type: c.u8()?,
            detonating: c.u8()?,
            spare2: c.u16()?,
            turn: c.u16()?,
        }),
        TYPE_PACKET => {
            let packet = Packet {
                destination: c.u16()?,
                ironium: c.u16()?,
                boranium: c.u16()?,
                germanium: c.u16()?,
                warp: c.u8()?,
                spare1: c.u8()?,
                spare2: c.u16()?,
            };
            if packet.is_salvage() {
                ObjectBody::Salvage(packet)
            } else {
                ObjectBody::Packet(packet)
            }
        }
        TYPE_WORMHOLE => ObjectBody::Wormhole(Wormhole {
            flags: c.u16()?,
            been_through: c.u16()?,
            target_id: c.u16()?,
            spare: c.array::<6>()?,
        }),
        _ => ObjectBody::Trader(Trader {
            x_dest: c.u16()?,
            y_dest: c.u16()?,
            warp: c.u8()?,
            spare: c.u8()?,
            met: c.u16()?,
            items: c.u16()?,
            turn: c.u16()?,
        }),
    };
    Ok(body)
}

fn encode_packet(out: &mut Vec<u8>, p: &Packet) {
    push16(out, p.destination);
    push16(out, p.ironium);
    push16(out, p.boranium);
    push16(out, p.germanium);
    out.push(p.warp);
    out.push(p.spare1);
    push16(out, p.spare2);
}

impl RecordCodec for ObjectRecord {
    const MIN_LEN: usize = 2;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let word = c.u16()? as u32;
        if c.is_empty() {
            return Ok(ObjectRecord::count(word as u16));
        }
        let object_type = extract_bits(word, 13, 3) as u8;
        let x = c.u16()?;
        let y = c.u16()?;
        let body = decode_body(object_type, &mut c)?;
        Ok(ObjectRecord {
            object_type,
            owner: extract_bits(word, 9, 4) as u8,
            number: extract_bits(word, 0, 9) as u16,
            x,
            y,
            body,
            trailing: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if let ObjectBody::Count(n) = self.body {
            push16(&mut out, n);
            return out;
        }

        let mut word = pack_bits(0, 13, 3, self.object_type as u32);
        word = pack_bits(word, 9, 4, self.owner as u32);
        word = pack_bits(word, 0, 9, self.number as u32);
        push16(&mut out, word as u16);
        push16(&mut out, self.x);
        push16(&mut out, self.y);

        match &self.body {
            ObjectBody::Count(_) => {}
            ObjectBody::Minefield(m) => {
                push32(&mut out, m.mine_count);
                push16(&mut out, m.spare1);
                out.push(m.mine_type);
                out.push(m.detonating);
                push16(&mut out, m.spare2);
                push16(&mut out, m.turn);
            }
            ObjectBody::Packet(p) | ObjectBody::Salvage(p) => encode_packet(&mut out, p),
            ObjectBody::Wormhole(w) => {
                push16(&mut out, w.flags);
                push16(&mut out, w.been_through);
                push16(&mut out, w.target_id);
                out.extend_from_slice(&w.spare);
            }
            ObjectBody::Trader(t) => {
                push16(&mut out, t.x_dest);
                push16(&mut out, t.y_dest);
                out.push(t.warp);
                out.push(t.spare);
                push16(&mut out, t.met);
                push16(&mut out, t.items);
                push16(&mut out, t.turn);
            }
            ObjectBody::Other(bytes) => out.extend_from_slice(bytes),
        }
        out.extend_from_slice(&self.trailing);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> ObjectRecord {
        let o = ObjectRecord::decode(BlockType::Object, bytes).unwrap();
        assert_eq!(o.encode(), bytes.to_vec());
        o
    }

    #[test]
    fn test_object_count() {
        let o = decode(&[0x2C, 0x01]);
        assert_eq!(o.body, ObjectBody::Count(300));
        assert_eq!(o.summary(), "300 objects");
    }

    #[test]
    fn test_minefield() {
        // type 0, owner 3, number 17
        let o = decode(&[
            0x11, 0x06, 0xE8, 0x03, 0xD0, 0x07, //
            0xC4, 0x09, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x0C, 0x00,
        ]);
        assert_eq!(o.owner, 3);
        assert_eq!(o.number, 17);
        assert_eq!((o.x, o.y), (1000, 2000));
        match o.body {
            ObjectBody::Minefield(m) => {
                assert_eq!(m.mine_count, 2500);
                assert_eq!(m.type_name(), "Heavy");
                assert_eq!(m.turn, 12);
            }
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_packet_and_salvage() {
        let packet = decode(&[
            0x02, 0x20, 0x10, 0x04, 0x20, 0x04, //
            0x07, 0x00, 0x64, 0x00, 0x00, 0x00, 0x32, 0x00, 0x0A, 0x00, 0x00, 0x00,
        ]);
        match packet.body {
            ObjectBody::Packet(p) => {
                assert_eq!(p.destination_planet(), Some(7));
                assert_eq!(p.ironium, 100);
                assert_eq!(p.germanium, 50);
                assert_eq!(p.warp, 10);
            }
            ref other => panic!("unexpected {:?}", other),
        }

        let salvage = decode(&[
            0x03, 0x20, 0x10, 0x04, 0x20, 0x04, //
            0x00, 0xFF, 0x05, 0x00, 0x05, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);
        assert_eq!(salvage.type_name(), "Salvage");
        match salvage.body {
            ObjectBody::Salvage(p) => assert_eq!(p.destination_planet(), None),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wormhole_and_trader() {
        let wormhole = decode(&[
            0x04, 0x40, 0x00, 0x05, 0x00, 0x06, //
            0x03, 0x00, 0x05, 0x00, 0x09, 0x00, 1, 2, 3, 4, 5, 6, 0xAA,
        ]);
        match wormhole.body {
            ObjectBody::Wormhole(w) => {
                assert_eq!(w.been_through, 0b101);
                assert_eq!(w.target_id, 9);
            }
            ref other => panic!("unexpected {:?}", other),
        }
        assert_eq!(wormhole.trailing, vec![0xAA]);

        let trader = decode(&[
            0x00, 0x60, 0x00, 0x05, 0x00, 0x06, //
            0x10, 0x04, 0x20, 0x04, 0x05, 0x00, 0x01, 0x00, 0x80, 0x00, 0x14, 0x00,
        ]);
        assert_eq!(trader.object_type, TYPE_TRADER);
        match trader.body {
            ObjectBody::Trader(t) => {
                assert_eq!((t.x_dest, t.y_dest), (1040, 1056));
                assert_eq!(t.warp, 5);
                assert_eq!(t.items, 0x80);
                assert_eq!(t.turn, 20);
            }
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_short_tail_is_an_error() {
        assert!(ObjectRecord::decode(BlockType::Object, &[0x11, 0x06, 0, 0, 0, 0, 1, 2]).is_err());
    }
}
