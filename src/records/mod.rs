//! Typed record codecs and the dispatcher that picks one per block type.
//!
//! Every typed record must re-encode to exactly the plaintext it was decoded
//! from. The dispatcher checks this on every decode: a record that fails to
//! decode, or decodes to something that would not re-encode identically, is
//! kept as `Record::Opaque` so its bytes still survive a round trip.

pub mod battle;
pub mod battle_plan;
pub mod design;
pub mod fleet;
pub mod footer;
pub mod message;
pub mod object;
pub mod planet;
pub mod player;
pub mod production;
pub mod universe;
pub mod waypoint;

use log::{debug, warn};
use serde::Serialize;

use crate::block::BlockType;
use crate::error::{self, RecordError};
use crate::header::FileHeader;

pub use battle::{Battle, BattleRecording, BattleStack};
pub use battle_plan::BattlePlan;
pub use design::{Design, DesignChange, DesignSlot};
pub use fleet::Fleet;
pub use footer::FileFooter;
pub use message::Message;
pub use object::{ObjectBody, ObjectRecord};
pub use planet::Planet;
pub use player::Player;
pub use production::{ProductionItem, ProductionQueue, ProductionQueueChange};
pub use universe::{PlanetCoord, Universe, VictoryCondition};
pub use waypoint::{Waypoint, WaypointDelete, WaypointTask};

/// Decode/encode pair for one record layout.
pub trait RecordCodec: Sized {
    /// Payloads shorter than this are decoded from a zero-padded copy.
    const MIN_LEN: usize;

    fn decode(kind: BlockType, data: &[u8]) -> Result<Self, RecordError>;

    fn encode(&self) -> Vec<u8>;
}

/// One decoded block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Record {
    FileHeader(FileHeader),
    FileFooter(FileFooter),
    Player(Player),
    Universe(Universe),
    Planet(Planet),
    Fleet(Fleet),
    Waypoint(Waypoint),
    WaypointTask(WaypointTask),
    WaypointDelete(WaypointDelete),
    Design(Design),
    DesignChange(DesignChange),
    ProductionQueue(ProductionQueue),
    ProductionQueueChange(ProductionQueueChange),
    BattlePlan(BattlePlan),
    Battle(Battle),
    Message(Message),
    Object(ObjectRecord),
    /// Layout unknown or not decodable; bytes are re-emitted unchanged.
    Opaque { kind: BlockType, bytes: Vec<u8> },
}

impl Record {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Record::FileHeader(r) => r.encode(),
            Record::FileFooter(r) => r.encode(),
            Record::Player(r) => r.encode(),
            Record::Universe(r) => r.encode(),
            Record::Planet(r) => r.encode(),
            Record::Fleet(r) => r.encode(),
            Record::Waypoint(r) => r.encode(),
            Record::WaypointTask(r) => r.encode(),
            Record::WaypointDelete(r) => r.encode(),
            Record::Design(r) => r.encode(),
            Record::DesignChange(r) => r.encode(),
            Record::ProductionQueue(r) => r.encode(),
            Record::ProductionQueueChange(r) => r.encode(),
            Record::BattlePlan(r) => r.encode(),
            Record::Battle(r) => r.encode(),
            Record::Message(r) => r.encode(),
            Record::Object(r) => r.encode(),
            Record::Opaque { bytes, .. } => bytes.clone(),
        }
    }

    /// Bytes written after the payload outside the declared size.
    pub fn encode_trailer(&self) -> error::Result<Vec<u8>> {
        match self {
            Record::Universe(u) => u.encode_planets(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Record::Opaque { .. })
    }

    /// Short description for listings.
    pub fn summary(&self) -> String {
        match self {
            Record::FileHeader(h) => format!(
                "game {:#010x} turn {} player {}",
                h.game_id,
                h.turn,
                h.player_index + 1
            ),
            Record::FileFooter(f) => match f.checksum {
                Some(sum) => format!("checksum {:#06x}", sum),
                None => "no checksum".to_string(),
            },
            Record::Player(p) => format!(
                "player {} \"{}\" ({} planets, {} fleets)",
                p.player_number + 1,
                p.plural_name,
                p.planet_count,
                p.fleet_count
            ),
            Record::Universe(u) => format!(
                "\"{}\" {} players, {} planets",
                u.name, u.player_count, u.planet_count
            ),
            Record::Planet(p) => format!("planet #{} owner {:?}", p.planet_id, p.owner()),
            Record::Fleet(f) => format!(
                "fleet #{} owner {} at ({}, {}), {} ships",
                f.fleet_number + 1,
                f.owner,
                f.x,
                f.y,
                f.ship_total()
            ),
            Record::Waypoint(w) => format!("waypoint ({}, {}) warp {}", w.x, w.y, w.warp),
            Record::WaypointTask(t) => format!(
                "fleet #{} waypoint {} -> ({}, {})",
                t.fleet_number + 1,
                t.waypoint_index,
                t.waypoint.x,
                t.waypoint.y
            ),
            Record::WaypointDelete(d) => {
                format!("fleet #{} delete waypoint {}", d.fleet_number + 1, d.waypoint_index)
            }
            Record::Design(d) => format!("design {} \"{}\" hull {}", d.design_number, d.name, d.hull_id),
            Record::DesignChange(c) => match &c.design {
                Some(d) => format!("design {} set to \"{}\"", c.design_number, d.name),
                None => format!("design {} deleted", c.design_number),
            },
            Record::ProductionQueue(q) => format!("{} queue items", q.items.len()),
            Record::ProductionQueueChange(q) => {
                format!("planet #{} queue, {} items", q.planet_id, q.items.len())
            }
            Record::BattlePlan(b) => {
                if b.is_deleted() {
                    format!("battle plan {} deleted", b.plan_id)
                } else {
                    format!("battle plan {} \"{}\"", b.plan_id, b.name)
                }
            }
            Record::Battle(b) => format!(
                "battle {} at ({}, {}), {} rounds, {} stacks",
                b.battle_id,
                b.x,
                b.y,
                b.rounds,
                b.stacks.len()
            ),
            Record::Message(m) => format!("message from {} to {}: {}", m.sender, m.recipient, m.text),
            Record::Object(o) => o.summary(),
            Record::Opaque { kind, bytes } => format!("{:?}, {} bytes", kind, bytes.len()),
        }
    }
}

/// Result of dispatching one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub record: Record,
    /// Set when the payload was shorter than the layout; encoding cuts the
    /// output back to this length.
    pub truncated_len: Option<usize>,
}

impl Decoded {
    fn opaque(kind: BlockType, data: &[u8]) -> Self {
        Decoded {
            record: Record::Opaque {
                kind,
                bytes: data.to_vec(),
            },
            truncated_len: None,
        }
    }
}

fn decode_typed<T: RecordCodec>(
    kind: BlockType,
    data: &[u8],
    wrap: fn(T) -> Record,
) -> Decoded {
    let truncated = data.len() < T::MIN_LEN;
    let mut input = data.to_vec();
    if truncated {
        debug!(
            "{:?} payload of {} bytes is shorter than {}, decoding zero-padded",
            kind,
            data.len(),
            T::MIN_LEN
        );
        input.resize(T::MIN_LEN, 0);
    }

    match T::decode(kind, &input) {
        Ok(record) => {
            if record.encode() != input {
                warn!(
                    "{:?} record does not re-encode identically, keeping {} raw bytes",
                    kind,
                    data.len()
                );
                return Decoded::opaque(kind, data);
            }
            Decoded {
                record: wrap(record),
                truncated_len: if truncated { Some(data.len()) } else { None },
            }
        }
        Err(e) => {
            debug!("{:?} record kept raw: {}", kind, e);
            Decoded::opaque(kind, data)
        }
    }
}

/// Decode a plaintext payload of the given kind. Total over block types.
///
/// `trailer` carries the planet coordinate region of a Planets block and is
/// empty for every other kind. The file header is decoded by the framer.
pub fn decode_record(kind: BlockType, plaintext: &[u8], trailer: &[u8]) -> Decoded {
    match kind {
        BlockType::FileFooter => decode_typed(kind, plaintext, Record::FileFooter),
        BlockType::Player => decode_typed(kind, plaintext, Record::Player),
        BlockType::Planets => decode_universe(plaintext, trailer),
        BlockType::Planet | BlockType::PartialPlanet => {
            decode_typed(kind, plaintext, Record::Planet)
        }
        BlockType::Fleet | BlockType::PartialFleet => decode_typed(kind, plaintext, Record::Fleet),
        BlockType::Waypoint => decode_typed(kind, plaintext, Record::Waypoint),
        BlockType::WaypointAdd | BlockType::WaypointChangeTask | BlockType::WaypointTask => {
            decode_typed(kind, plaintext, Record::WaypointTask)
        }
        BlockType::WaypointDelete => decode_typed(kind, plaintext, Record::WaypointDelete),
        BlockType::Design => decode_typed(kind, plaintext, Record::Design),
        BlockType::DesignChange => decode_typed(kind, plaintext, Record::DesignChange),
        BlockType::ProductionQueue => decode_typed(kind, plaintext, Record::ProductionQueue),
        BlockType::ProductionQueueChange => {
            decode_typed(kind, plaintext, Record::ProductionQueueChange)
        }
        BlockType::BattlePlan => decode_typed(kind, plaintext, Record::BattlePlan),
        BlockType::Battle => decode_typed(kind, plaintext, Record::Battle),
        BlockType::Message => decode_typed(kind, plaintext, Record::Message),
        BlockType::Object => decode_typed(kind, plaintext, Record::Object),
        _ => Decoded::opaque(kind, plaintext),
    }
}

fn decode_universe(plaintext: &[u8], trailer: &[u8]) -> Decoded {
    let kind = BlockType::Planets;
    match Universe::decode_with_planets(plaintext, trailer) {
        Ok(universe) => {
            let planets = universe.encode_planets().ok();
            if universe.encode() != plaintext || planets.as_deref() != Some(trailer) {
                warn!("Planets block does not re-encode identically, keeping raw bytes");
                // The trailer stays with the raw block; only the payload is opaque
                return Decoded::opaque(kind, plaintext);
            }
            Decoded {
                record: Record::Universe(universe),
                truncated_len: None,
            }
        }
        Err(e) => {
            debug!("Planets block kept raw: {}", e);
            Decoded::opaque(kind, plaintext)
        }
    }
}
