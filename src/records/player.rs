//! Player records (type 6).

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{extract_bits, pack_bits, push16, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;
use crate::text::GameString;

pub const FULL_DATA_LEN: usize = 0x68;
const FLAG_FULL_DATA: u8 = 0x04;

pub const TECH_FIELDS: [&str; 6] = [
    "Energy",
    "Weapons",
    "Propulsion",
    "Construction",
    "Electronics",
    "Biotechnology",
];

/// Race settings only the player's own files carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerDetails {
    /// The whole 0x68-byte block; accessors decode the known parts
    pub data: Vec<u8>,
    /// One relation byte per player (0 neutral, 1 friend, 2 enemy)
    pub relations: Vec<u8>,
}

impl PlayerDetails {
    /// Byte at `index`, zero past the end of a short block.
    fn byte(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }

    fn triple(&self, start: usize) -> [u8; 3] {
        [self.byte(start), self.byte(start + 1), self.byte(start + 2)]
    }

    /// Gravity, temperature and radiation centres.
    pub fn hab_centre(&self) -> [u8; 3] {
        self.triple(0)
    }

    pub fn hab_low(&self) -> [u8; 3] {
        self.triple(3)
    }

    pub fn hab_high(&self) -> [u8; 3] {
        self.triple(6)
    }

    /// Maximum population growth rate in percent.
    pub fn growth_rate(&self) -> u8 {
        self.byte(9)
    }

    /// Levels in the order of `TECH_FIELDS`.
    pub fn tech_levels(&self) -> [u8; 6] {
        let mut levels = [0u8; 6];
        for (i, level) in levels.iter_mut().enumerate() {
            *level = self.byte(10 + i);
        }
        levels
    }

    pub fn relation_to(&self, player: usize) -> Option<u8> {
        self.relations.get(player).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub player_number: u8,
    pub ship_design_count: u8,
    /// 10-bit count
    pub planet_count: u16,
    pub planet_spare: u8,
    /// 10-bit count
    pub fleet_count: u16,
    /// Bits 10 and 11 of the fleet word
    pub fleet_spare: u8,
    pub starbase_design_count: u8,
    pub logo: u8,
    /// Low two bits of byte 6
    pub flag_spare: u8,
    pub byte7: u8,
    pub details: Option<PlayerDetails>,
    pub singular_name: GameString,
    pub plural_name: GameString,
    pub trailing: Vec<u8>,
}

impl RecordCodec for Player {
    const MIN_LEN: usize = 8;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let player_number = c.u8()?;
        let ship_design_count = c.u8()?;
        let planets = c.u16()? as u32;
        let fleets = c.u16()? as u32;
        let byte6 = c.u8()?;
        let byte7 = c.u8()?;

        let details = if byte6 & FLAG_FULL_DATA != 0 {
            let data = c.bytes(FULL_DATA_LEN)?.to_vec();
            let relation_count = c.u8()? as usize;
            let relations = c.bytes(relation_count)?.to_vec();
            Some(PlayerDetails { data, relations })
        } else {
            None
        };

        let singular_name = GameString::read(&mut c)?;
        let plural_name = GameString::read(&mut c)?;

        Ok(Player {
            player_number,
            ship_design_count,
            planet_count: extract_bits(planets, 0, 10) as u16,
            planet_spare: extract_bits(planets, 10, 6) as u8,
            fleet_count: extract_bits(fleets, 0, 10) as u16,
            fleet_spare: extract_bits(fleets, 10, 2) as u8,
            starbase_design_count: extract_bits(fleets, 12, 4) as u8,
            logo: byte6 >> 3,
            flag_spare: byte6 & 0x03,
            byte7,
            details,
            singular_name,
            plural_name,
            trailing: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.player_number, self.ship_design_count];
        let planets = pack_bits(pack_bits(0, 0, 10, self.planet_count as u32), 10, 6, self.planet_spare as u32);
        push16(&mut out, planets as u16);
        let mut fleets = pack_bits(0, 0, 10, self.fleet_count as u32);
        fleets = pack_bits(fleets, 10, 2, self.fleet_spare as u32);
        fleets = pack_bits(fleets, 12, 4, self.starbase_design_count as u32);
        push16(&mut out, fleets as u16);

        let mut byte6 = (self.logo << 3) | (self.flag_spare & 0x03);
        if self.details.is_some() {
            byte6 |= FLAG_FULL_DATA;
        }
        out.push(byte6);
        out.push(self.byte7);

        if let Some(details) = &self.details {
            let mut data = details.data.clone();
            data.resize(FULL_DATA_LEN, 0);
            out.extend_from_slice(&data);
            out.push(details.relations.len() as u8);
            out.extend_from_slice(&details.relations);
        }
        self.singular_name.write(&mut out);
        self.plural_name.write(&mut out);
        out.extend_from_slice(&self.trailing);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_details_read_as_zero() {
        let details = PlayerDetails {
            data: vec![40, 50, 60, 10],
            relations: vec![2],
        };
        assert_eq!(details.hab_centre(), [40, 50, 60]);
        assert_eq!(details.hab_low(), [10, 0, 0]);
        assert_eq!(details.growth_rate(), 0);
        assert_eq!(details.tech_levels(), [0; 6]);
        assert_eq!(details.relation_to(0), Some(2));
        assert_eq!(details.relation_to(1), None);
    }

    #[test]
    fn test_other_player() {
        let mut bytes = vec![0x01, 0x03, 0x05, 0x00, 0x0A, 0x20, 0x38, 0x00];
        GameString::new("Humanoid").write(&mut bytes);
        GameString::new("Humanoids").write(&mut bytes);

        let p = Player::decode(BlockType::Player, &bytes).unwrap();
        assert_eq!(p.player_number, 1);
        assert_eq!(p.ship_design_count, 3);
        assert_eq!(p.planet_count, 5);
        assert_eq!(p.fleet_count, 10);
        assert_eq!(p.starbase_design_count, 2);
        assert_eq!(p.logo, 7);
        assert!(p.details.is_none());
        assert_eq!(p.singular_name.text, "Humanoid");
        assert_eq!(p.plural_name.text, "Humanoids");
        assert_eq!(p.encode(), bytes);
    }

    #[test]
    fn test_own_player_full_data() {
        let mut bytes = vec![0x00, 0x01, 0x01, 0x00, 0x01, 0x00, 0x3C, 0x00];
        let mut data = vec![0u8; FULL_DATA_LEN];
        data[..9].copy_from_slice(&[50, 50, 50, 15, 15, 15, 85, 85, 85]);
        data[9] = 15;
        data[10..16].copy_from_slice(&[3, 3, 3, 3, 3, 3]);
        data[0x50] = 0xAB;
        bytes.extend_from_slice(&data);
        bytes.extend_from_slice(&[2, 0, 2]);
        GameString::new("Rabbitoid").write(&mut bytes);
        GameString::new("Rabbitoids").write(&mut bytes);

        let p = Player::decode(BlockType::Player, &bytes).unwrap();
        assert_eq!(p.logo, 7);
        let details = p.details.as_ref().unwrap();
        assert_eq!(details.hab_centre(), [50, 50, 50]);
        assert_eq!(details.hab_low(), [15, 15, 15]);
        assert_eq!(details.hab_high(), [85, 85, 85]);
        assert_eq!(details.growth_rate(), 15);
        assert_eq!(details.tech_levels(), [3; 6]);
        assert_eq!(details.relation_to(1), Some(2));
        assert_eq!(details.relation_to(5), None);
        assert_eq!(p.plural_name.text, "Rabbitoids");
        assert_eq!(p.encode(), bytes);
    }
}
