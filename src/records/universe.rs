//! Universe definition (the Planets block) and its planet coordinate table.
//!
//! The coordinate table is not part of the block payload: it follows the
//! declared size, unencrypted, one 32-bit word per planet:
//!
//! ```text
//! bits 22..32  name id
//! bits 10..22  y
//! bits  0..10  x minus the previous planet's x (first planet: minus 1000)
//! ```

use serde::Serialize;

use crate::bits::{extract_bits, pack_bits, push16, push32, read16, Cursor};
use crate::error::{RecordError, Result, StarsError};

pub const FIXED_LEN: usize = 64;
pub const NAME_LEN: usize = 32;
pub const COORD_LEN: usize = 4;
/// x of the implicit planet before the first one
pub const X_ORIGIN: u16 = 1000;

const PLANET_COUNT_OFFSET: usize = 10;
const MAX_X_DELTA: u16 = 0x3FF;

pub const SETTING_MAX_MINERALS: u16 = 0x0001;
pub const SETTING_SLOW_TECH: u16 = 0x0002;
pub const SETTING_SINGLE_PLAYER: u16 = 0x0004;
pub const SETTING_COMPUTER_ALLIANCES: u16 = 0x0010;
pub const SETTING_PUBLIC_SCORES: u16 = 0x0020;
pub const SETTING_ACCELERATED_BBS: u16 = 0x0040;
pub const SETTING_NO_RANDOM_EVENTS: u16 = 0x0080;
pub const SETTING_GALAXY_CLUMPING: u16 = 0x0100;

const VICTORY_NAMES: [&str; 10] = [
    "Owns % of all planets",
    "Attains tech level",
    "In number of tech fields",
    "Exceeds score of",
    "Exceeds second place score by %",
    "Has production capacity of (thousands)",
    "Owns capital ships",
    "Has highest score after years",
    "Number of criteria that must be met",
    "Minimum years before a winner is declared",
];

/// One planet's position in the universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanetCoord {
    pub planet_id: u16,
    pub name_id: u16,
    pub x: u16,
    pub y: u16,
}

/// A victory condition byte decoded into its game value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VictoryCondition {
    pub name: &'static str,
    pub enabled: bool,
    /// 7-bit option index as the setup dialog stores it
    pub index: u8,
    pub value: u32,
}

impl VictoryCondition {
    pub fn from_byte(condition: usize, byte: u8) -> Option<VictoryCondition> {
        let name = *VICTORY_NAMES.get(condition)?;
        let index = byte & 0x7F;
        let i = index as u32;
        let value = match condition {
            0 => i * 5 + 20,
            1 => i + 8,
            2 => i + 2,
            3 => i * 1000 + 1000,
            4 => i * 10 + 20,
            5 | 6 => i * 10 + 10,
            7 => i * 10 + 30,
            8 => i,
            _ => i * 10 + 30,
        };
        Some(VictoryCondition {
            name,
            enabled: byte & 0x80 != 0,
            index,
            value,
        })
    }
}

/// Universe-wide settings from the Planets block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Universe {
    pub game_id: u32,
    pub universe_size: u16,
    pub density: u16,
    pub player_count: u16,
    pub planet_count: u16,
    pub starting_distance: u32,
    pub settings: u16,
    pub turn: u16,
    pub victory: [u8; 12],
    pub name: String,
    /// Name field bytes from the first NUL on
    pub name_padding: Vec<u8>,
    pub trailing: Vec<u8>,
    pub planets: Vec<PlanetCoord>,
}

impl Universe {
    /// Planet count of an undecoded payload, so the framer knows how many
    /// coordinate bytes follow the block.
    pub fn planet_count_of(plaintext: &[u8]) -> Result<usize> {
        Ok(read16(plaintext, PLANET_COUNT_OFFSET)? as usize)
    }

    pub fn decode_with_planets(
        plaintext: &[u8],
        trailer: &[u8],
    ) -> std::result::Result<Universe, RecordError> {
        let mut c = Cursor::new(plaintext);
        let game_id = c.u32()?;
        let universe_size = c.u16()?;
        let density = c.u16()?;
        let player_count = c.u16()?;
        let planet_count = c.u16()?;
        let starting_distance = c.u32()?;
        let settings = c.u16()?;
        let turn = c.u16()?;
        let victory = c.array::<12>()?;
        let name_field = c.bytes(NAME_LEN)?;
        let nul = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let name = name_field[..nul].iter().map(|&b| b as char).collect();
        let name_padding = name_field[nul..].to_vec();
        let trailing = c.rest();

        if trailer.len() != planet_count as usize * COORD_LEN {
            return Err(RecordError::Invalid(format!(
                "{} planets need {} coordinate bytes, found {}",
                planet_count,
                planet_count as usize * COORD_LEN,
                trailer.len()
            )));
        }
        let mut planets = Vec::with_capacity(planet_count as usize);
        let mut x = X_ORIGIN;
        let mut coords = Cursor::new(trailer);
        for planet_id in 0..planet_count {
            let word = coords.u32()?;
            x = x.wrapping_add(extract_bits(word, 0, 10) as u16);
            planets.push(PlanetCoord {
                planet_id,
                name_id: extract_bits(word, 22, 10) as u16,
                x,
                y: extract_bits(word, 10, 12) as u16,
            });
        }

        Ok(Universe {
            game_id,
            universe_size,
            density,
            player_count,
            planet_count,
            starting_distance,
            settings,
            turn,
            victory,
            name,
            name_padding,
            trailing,
            planets,
        })
    }

    /// The block payload, without coordinates.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_LEN + self.trailing.len());
        push32(&mut out, self.game_id);
        push16(&mut out, self.universe_size);
        push16(&mut out, self.density);
        push16(&mut out, self.player_count);
        push16(&mut out, self.planet_count);
        push32(&mut out, self.starting_distance);
        push16(&mut out, self.settings);
        push16(&mut out, self.turn);
        out.extend_from_slice(&self.victory);

        let mut name: Vec<u8> = self
            .name
            .chars()
            .map(|c| if (c as u32) <= 0xFF { c as u32 as u8 } else { b'?' })
            .collect();
        name.extend_from_slice(&self.name_padding);
        name.resize(NAME_LEN, 0);
        out.extend_from_slice(&name);
        out.extend_from_slice(&self.trailing);
        out
    }

    /// The coordinate table written after the block.
    /// The reader frames this table by `planet_count`, so the two must agree.
    pub fn encode_planets(&self) -> Result<Vec<u8>> {
        if self.planets.len() != self.planet_count as usize {
            return Err(StarsError::PlanetCountMismatch {
                count: self.planet_count,
                planets: self.planets.len(),
            });
        }
        let mut out = Vec::with_capacity(self.planets.len() * COORD_LEN);
        let mut previous = X_ORIGIN;
        for (index, planet) in self.planets.iter().enumerate() {
            let delta = planet.x.wrapping_sub(previous);
            if planet.x < previous || delta > MAX_X_DELTA {
                return Err(StarsError::CoordinateOutOfRange {
                    index,
                    x: planet.x,
                    previous,
                });
            }
            let mut word = pack_bits(0, 22, 10, planet.name_id as u32);
            word = pack_bits(word, 10, 12, planet.y as u32);
            word = pack_bits(word, 0, 10, delta as u32);
            push32(&mut out, word);
            previous = planet.x;
        }
        Ok(out)
    }

    pub fn size_name(&self) -> &'static str {
        match self.universe_size {
            0 => "Tiny",
            1 => "Small",
            2 => "Medium",
            3 => "Large",
            4 => "Huge",
            _ => "Unknown",
        }
    }

    pub fn density_name(&self) -> &'static str {
        match self.density {
            0 => "Sparse",
            1 => "Normal",
            2 => "Dense",
            3 => "Packed",
            _ => "Unknown",
        }
    }

    pub fn starting_distance_name(&self) -> &'static str {
        match self.starting_distance {
            0 => "Close",
            1 => "Moderate",
            2 => "Farther",
            3 => "Distant",
            _ => "Unknown",
        }
    }

    pub fn has_setting(&self, setting: u16) -> bool {
        self.settings & setting != 0
    }

    pub fn victory_conditions(&self) -> Vec<VictoryCondition> {
        self.victory
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| VictoryCondition::from_byte(i, b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(planet_count: u16) -> Vec<u8> {
        let mut out = Vec::new();
        push32(&mut out, 0x1234_5678);
        push16(&mut out, 2); // medium
        push16(&mut out, 1); // normal
        push16(&mut out, 4);
        push16(&mut out, planet_count);
        push32(&mut out, 1);
        push16(&mut out, SETTING_PUBLIC_SCORES | SETTING_SLOW_TECH);
        push16(&mut out, 0);
        out.extend_from_slice(&[0x83, 0x02, 0x81, 0x00, 0, 0, 0, 0, 0, 0x05, 0x00, 0x00]);
        let mut name = b"A Barefoot Jaywalk".to_vec();
        name.resize(NAME_LEN, 0);
        out.extend_from_slice(&name);
        out
    }

    fn coords(entries: &[(u16, u16, u16)]) -> Vec<u8> {
        let mut out = Vec::new();
        for &(name_id, y, dx) in entries {
            push32(&mut out, (name_id as u32) << 22 | (y as u32) << 10 | dx as u32);
        }
        out
    }

    #[test]
    fn test_universe_with_planets() {
        let plaintext = payload(3);
        let trailer = coords(&[(7, 1100, 12), (300, 2047, 0), (1023, 1000, 1023)]);
        assert_eq!(Universe::planet_count_of(&plaintext).unwrap(), 3);

        let u = Universe::decode_with_planets(&plaintext, &trailer).unwrap();
        assert_eq!(u.game_id, 0x1234_5678);
        assert_eq!(u.size_name(), "Medium");
        assert_eq!(u.density_name(), "Normal");
        assert_eq!(u.starting_distance_name(), "Moderate");
        assert_eq!(u.player_count, 4);
        assert!(u.has_setting(SETTING_PUBLIC_SCORES));
        assert!(!u.has_setting(SETTING_MAX_MINERALS));
        assert_eq!(u.name, "A Barefoot Jaywalk");

        assert_eq!(
            u.planets,
            vec![
                PlanetCoord { planet_id: 0, name_id: 7, x: 1012, y: 1100 },
                PlanetCoord { planet_id: 1, name_id: 300, x: 1012, y: 2047 },
                PlanetCoord { planet_id: 2, name_id: 1023, x: 2035, y: 1000 },
            ]
        );
        assert_eq!(u.encode(), plaintext);
        assert_eq!(u.encode_planets().unwrap(), trailer);
    }

    #[test]
    fn test_victory_values() {
        let u = Universe::decode_with_planets(&payload(0), &[]).unwrap();
        let v = u.victory_conditions();
        assert_eq!(v.len(), 10);
        assert!(v[0].enabled);
        assert_eq!(v[0].value, 35); // 3 * 5 + 20
        assert!(!v[1].enabled);
        assert_eq!(v[1].value, 10);
        assert_eq!(v[2].value, 3);
        assert_eq!(v[3].value, 1000);
        assert_eq!(v[9].value, 80);
    }

    #[test]
    fn test_coordinate_count_mismatch() {
        assert!(Universe::decode_with_planets(&payload(2), &coords(&[(0, 0, 0)])).is_err());
    }

    #[test]
    fn test_planet_list_must_match_count() {
        let mut u = Universe::decode_with_planets(&payload(1), &coords(&[(3, 1200, 20)])).unwrap();
        u.planets.push(PlanetCoord { planet_id: 1, name_id: 4, x: 1030, y: 1300 });
        assert_eq!(
            u.encode_planets(),
            Err(StarsError::PlanetCountMismatch { count: 1, planets: 2 })
        );

        u.planet_count = 2;
        assert_eq!(u.encode_planets().map(|t| t.len()), Ok(2 * COORD_LEN));
    }

    #[test]
    fn test_unpackable_coordinates() {
        let mut u = Universe::decode_with_planets(&payload(2), &coords(&[(0, 5, 5), (1, 5, 5)])).unwrap();
        u.planets[1].x = u.planets[0].x - 1;
        assert!(matches!(
            u.encode_planets(),
            Err(StarsError::CoordinateOutOfRange { index: 1, .. })
        ));
        u.planets[1].x = u.planets[0].x + 1024;
        assert!(u.encode_planets().is_err());
    }
}
