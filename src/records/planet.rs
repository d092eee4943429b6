//! Planets (types 13 and 14). A flag word selects which optional sections
//! follow the identity word.

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{extract_bits, pack_bits, push16, read16, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;
use crate::vlq::SurfaceMinerals;

pub const NO_OWNER: u8 = 31;

pub const FLAG_ENVIRONMENT: u16 = 0x0002;
pub const FLAG_IN_USE: u16 = 0x0004;
pub const FLAG_HOMEWORLD: u16 = 0x0080;
pub const FLAG_STARBASE: u16 = 0x0200;
pub const FLAG_TERRAFORMED: u16 = 0x0400;
pub const FLAG_INSTALLATIONS: u16 = 0x0800;
pub const FLAG_ARTIFACT: u16 = 0x1000;
pub const FLAG_SURFACE_MINERALS: u16 = 0x2000;
pub const FLAG_ROUTE: u16 = 0x4000;
pub const FLAG_WEIRD: u16 = 0x8000;

/// Mineral concentrations and habitability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    /// Length byte plus the bytes it announces, kept verbatim
    pub pre_environment: Vec<u8>,
    pub concentrations: [u8; 3],
    /// Gravity, temperature, radiation clicks
    pub values: [u8; 3],
    /// Values before terraforming
    pub original: Option<[u8; 3]>,
    /// Owner's population estimate bytes
    pub estimates: Option<[u8; 2]>,
}

impl Environment {
    fn pre_environment_len(length_byte: u8) -> usize {
        let b = length_byte as u32;
        1 + (extract_bits(b, 2, 2) + extract_bits(b, 4, 2) + extract_bits(b, 6, 2)) as usize
    }

    pub fn gravity(&self) -> u8 {
        self.values[0]
    }

    pub fn temperature(&self) -> u8 {
        self.values[1]
    }

    pub fn radiation(&self) -> u8 {
        self.values[2]
    }
}

/// Planet or partial planet (what other players last scanned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Planet {
    /// 11-bit planet id
    pub planet_id: u16,
    /// 5-bit owner, 31 when unowned
    pub owner_id: u8,
    pub flags: u16,
    /// Set for type 13, clear for partial planets
    pub full: bool,
    pub environment: Option<Environment>,
    pub surface: Option<SurfaceMinerals>,
    pub installations: Option<[u8; 8]>,
    pub starbase: Option<Vec<u8>>,
    pub route: Option<u16>,
    pub trailing: Vec<u8>,
}

impl Planet {
    pub fn owner(&self) -> Option<u8> {
        if self.owner_id == NO_OWNER {
            None
        } else {
            Some(self.owner_id)
        }
    }

    fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    pub fn is_homeworld(&self) -> bool {
        self.has(FLAG_HOMEWORLD)
    }

    pub fn is_terraformed(&self) -> bool {
        self.has(FLAG_TERRAFORMED)
    }

    pub fn has_artifact(&self) -> bool {
        self.has(FLAG_ARTIFACT)
    }

    fn installation_word(&self) -> Option<u32> {
        self.installations
            .map(|i| u32::from_le_bytes([i[1], i[2], i[3], 0]))
    }

    pub fn mines(&self) -> Option<u16> {
        self.installation_word()
            .map(|w| extract_bits(w, 0, 12) as u16)
    }

    pub fn factories(&self) -> Option<u16> {
        self.installation_word()
            .map(|w| extract_bits(w, 12, 12) as u16)
    }

    pub fn defenses(&self) -> Option<u16> {
        self.installations
            .and_then(|i| read16(&i, 4).ok())
            .map(|w| extract_bits(w as u32, 0, 12) as u16)
    }

    /// Design number of the orbiting starbase.
    pub fn starbase_design(&self) -> Option<u8> {
        self.starbase
            .as_ref()
            .and_then(|s| s.first())
            .map(|b| b & 0x0F)
    }

    fn starbase_len(&self) -> usize {
        if self.full {
            4
        } else {
            1
        }
    }
}

impl RecordCodec for Planet {
    const MIN_LEN: usize = 4;

    fn decode(kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let word = c.u16()? as u32;
        let flags = c.u16()?;
        let owner_id = extract_bits(word, 11, 5) as u8;
        let full = kind == BlockType::Planet;

        let environment = if flags & FLAG_ENVIRONMENT != 0 {
            let length_byte = c.u8()?;
            let mut pre_environment = vec![length_byte];
            pre_environment.extend_from_slice(
                c.bytes(Environment::pre_environment_len(length_byte) - 1)?,
            );
            let concentrations = c.array::<3>()?;
            let values = c.array::<3>()?;
            let original = if flags & FLAG_TERRAFORMED != 0 {
                Some(c.array::<3>()?)
            } else {
                None
            };
            let estimates = if owner_id != NO_OWNER {
                Some(c.array::<2>()?)
            } else {
                None
            };
            Some(Environment {
                pre_environment,
                concentrations,
                values,
                original,
                estimates,
            })
        } else {
            None
        };

        let surface = if flags & FLAG_SURFACE_MINERALS != 0 {
            Some(SurfaceMinerals::decode(&mut c)?)
        } else {
            None
        };
        let installations = if flags & FLAG_INSTALLATIONS != 0 {
            Some(c.array::<8>()?)
        } else {
            None
        };
        let starbase = if flags & FLAG_STARBASE != 0 {
            Some(c.bytes(if full { 4 } else { 1 })?.to_vec())
        } else {
            None
        };
        let route = if full && flags & FLAG_ROUTE != 0 {
            Some(c.u16()?)
        } else {
            None
        };

        Ok(Planet {
            planet_id: extract_bits(word, 0, 11) as u16,
            owner_id,
            flags,
            full,
            environment,
            surface,
            installations,
            starbase,
            route,
            trailing: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let word = pack_bits(pack_bits(0, 0, 11, self.planet_id as u32), 11, 5, self.owner_id as u32);
        push16(&mut out, word as u16);
        push16(&mut out, self.flags);

        if let Some(env) = &self.environment {
            out.extend_from_slice(&env.pre_environment);
            out.extend_from_slice(&env.concentrations);
            out.extend_from_slice(&env.values);
            if let Some(original) = env.original {
                out.extend_from_slice(&original);
            }
            if let Some(estimates) = env.estimates {
                out.extend_from_slice(&estimates);
            }
        }
        if let Some(surface) = &self.surface {
            surface.encode(&mut out);
        }
        if let Some(installations) = &self.installations {
            out.extend_from_slice(installations);
        }
        if let Some(starbase) = &self.starbase {
            let mut bytes = starbase.clone();
            bytes.resize(self.starbase_len(), 0);
            out.extend_from_slice(&bytes);
        }
        if let Some(route) = self.route {
            push16(&mut out, route);
        }
        out.extend_from_slice(&self.trailing);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_planet() {
        let bytes = vec![
            0x11, 0x10, // planet 17, owner 2
            0x86, 0x2A, // env, in use, homeworld, starbase, installations, surface
            0x04, 0x99, // pre-environment: one extra byte
            50, 60, 70, // concentrations
            40, 50, 60, // grav, temp, rad
            0x11, 0x22, // estimates
            0x86, 0xE8, 0x03, 0x14, 0x2C, 0x01, // surface minerals
            0x00, 0x64, 0x80, 0x0C, 0x32, 0x00, 0x00, 0x00, // installations
            0x03, 0x00, 0x00, 0x00, // starbase
        ];
        let p = Planet::decode(BlockType::Planet, &bytes).unwrap();
        assert_eq!(p.planet_id, 17);
        assert_eq!(p.owner(), Some(2));
        assert!(p.is_homeworld());
        assert!(!p.is_terraformed());
        let env = p.environment.as_ref().unwrap();
        assert_eq!(env.pre_environment, vec![0x04, 0x99]);
        assert_eq!(env.concentrations, [50, 60, 70]);
        assert_eq!(env.temperature(), 50);
        assert_eq!(env.estimates, Some([0x11, 0x22]));
        let surface = p.surface.unwrap();
        assert_eq!(surface.ironium, 1000);
        assert_eq!(surface.boranium, 20);
        assert_eq!(surface.germanium, 0);
        assert_eq!(surface.population, 300);
        assert_eq!(p.mines(), Some(100));
        assert_eq!(p.factories(), Some(200));
        assert_eq!(p.defenses(), Some(50));
        assert_eq!(p.starbase_design(), Some(3));
        assert_eq!(p.route, None);
        assert_eq!(p.encode(), bytes);
    }

    #[test]
    fn test_partial_unowned_planet() {
        let bytes = vec![
            0x05, 0xF8, // planet 5, no owner
            0x02, 0x06, // env, starbase, terraformed
            0x00, // no extra pre-environment bytes
            1, 2, 3, 4, 5, 6, 7, 8, 9, // concentrations, values, original
            0x05, // starbase design
            0xEE,
        ];
        let p = Planet::decode(BlockType::PartialPlanet, &bytes).unwrap();
        assert_eq!(p.planet_id, 5);
        assert_eq!(p.owner(), None);
        assert!(!p.full);
        let env = p.environment.as_ref().unwrap();
        assert_eq!(env.original, Some([7, 8, 9]));
        assert_eq!(env.estimates, None);
        assert_eq!(p.starbase, Some(vec![0x05]));
        assert_eq!(p.mines(), None);
        assert_eq!(p.trailing, vec![0xEE]);
        assert_eq!(p.encode(), bytes);
    }

    #[test]
    fn test_pre_environment_length() {
        assert_eq!(Environment::pre_environment_len(0x00), 1);
        assert_eq!(Environment::pre_environment_len(0xFC), 10);
        // Bits 0..2 do not count
        assert_eq!(Environment::pre_environment_len(0x03), 1);
    }
}
