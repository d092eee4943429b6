//! Block identifiers and the raw framed form of a block.

use serde::Serialize;

use crate::bits::{extract_bits, pack_bits};

/// Largest payload a 10-bit size field can declare.
pub const MAX_PAYLOAD: usize = 0x3FF;

/// Block type identifiers (the top 6 bits of a block header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BlockType {
    FileFooter,
    ManualSmallLoadUnloadTask,
    ManualMediumLoadUnloadTask,
    WaypointDelete,
    WaypointAdd,
    WaypointChangeTask,
    Player,
    Planets,
    FileHeader,
    FileHash,
    WaypointRepeatOrders,
    Events,
    Planet,
    PartialPlanet,
    Fleet,
    PartialFleet,
    WaypointTask,
    Waypoint,
    FleetName,
    MoveShips,
    FleetSplit,
    ManualLargeLoadUnloadTask,
    Design,
    DesignChange,
    ProductionQueue,
    ProductionQueueChange,
    BattlePlan,
    Battle,
    Counters,
    MessagesFilter,
    ResearchChange,
    PlanetChange,
    ChangePassword,
    FleetsMerge,
    PlayersRelationChange,
    BattleContinuation,
    Message,
    AiHFileRecord,
    SetFleetBattlePlan,
    Object,
    RenameFleet,
    PlayerScores,
    SaveAndSubmit,
    Unknown(u8),
}

impl BlockType {
    pub fn from_id(id: u8) -> BlockType {
        match id {
            0 => BlockType::FileFooter,
            1 => BlockType::ManualSmallLoadUnloadTask,
            2 => BlockType::ManualMediumLoadUnloadTask,
            3 => BlockType::WaypointDelete,
            4 => BlockType::WaypointAdd,
            5 => BlockType::WaypointChangeTask,
            6 => BlockType::Player,
            7 => BlockType::Planets,
            8 => BlockType::FileHeader,
            9 => BlockType::FileHash,
            10 => BlockType::WaypointRepeatOrders,
            12 => BlockType::Events,
            13 => BlockType::Planet,
            14 => BlockType::PartialPlanet,
            16 => BlockType::Fleet,
            17 => BlockType::PartialFleet,
            19 => BlockType::WaypointTask,
            20 => BlockType::Waypoint,
            21 => BlockType::FleetName,
            23 => BlockType::MoveShips,
            24 => BlockType::FleetSplit,
            25 => BlockType::ManualLargeLoadUnloadTask,
            26 => BlockType::Design,
            27 => BlockType::DesignChange,
            28 => BlockType::ProductionQueue,
            29 => BlockType::ProductionQueueChange,
            30 => BlockType::BattlePlan,
            31 => BlockType::Battle,
            32 => BlockType::Counters,
            33 => BlockType::MessagesFilter,
            34 => BlockType::ResearchChange,
            35 => BlockType::PlanetChange,
            36 => BlockType::ChangePassword,
            37 => BlockType::FleetsMerge,
            38 => BlockType::PlayersRelationChange,
            39 => BlockType::BattleContinuation,
            40 => BlockType::Message,
            41 => BlockType::AiHFileRecord,
            42 => BlockType::SetFleetBattlePlan,
            43 => BlockType::Object,
            44 => BlockType::RenameFleet,
            45 => BlockType::PlayerScores,
            46 => BlockType::SaveAndSubmit,
            other => BlockType::Unknown(other),
        }
    }

    pub fn id(self) -> u8 {
        match self {
            BlockType::FileFooter => 0,
            BlockType::ManualSmallLoadUnloadTask => 1,
            BlockType::ManualMediumLoadUnloadTask => 2,
            BlockType::WaypointDelete => 3,
            BlockType::WaypointAdd => 4,
            BlockType::WaypointChangeTask => 5,
            BlockType::Player => 6,
            BlockType::Planets => 7,
            BlockType::FileHeader => 8,
            BlockType::FileHash => 9,
            BlockType::WaypointRepeatOrders => 10,
            BlockType::Events => 12,
            BlockType::Planet => 13,
            BlockType::PartialPlanet => 14,
            BlockType::Fleet => 16,
            BlockType::PartialFleet => 17,
            BlockType::WaypointTask => 19,
            BlockType::Waypoint => 20,
            BlockType::FleetName => 21,
            BlockType::MoveShips => 23,
            BlockType::FleetSplit => 24,
            BlockType::ManualLargeLoadUnloadTask => 25,
            BlockType::Design => 26,
            BlockType::DesignChange => 27,
            BlockType::ProductionQueue => 28,
            BlockType::ProductionQueueChange => 29,
            BlockType::BattlePlan => 30,
            BlockType::Battle => 31,
            BlockType::Counters => 32,
            BlockType::MessagesFilter => 33,
            BlockType::ResearchChange => 34,
            BlockType::PlanetChange => 35,
            BlockType::ChangePassword => 36,
            BlockType::FleetsMerge => 37,
            BlockType::PlayersRelationChange => 38,
            BlockType::BattleContinuation => 39,
            BlockType::Message => 40,
            BlockType::AiHFileRecord => 41,
            BlockType::SetFleetBattlePlan => 42,
            BlockType::Object => 43,
            BlockType::RenameFleet => 44,
            BlockType::PlayerScores => 45,
            BlockType::SaveAndSubmit => 46,
            BlockType::Unknown(id) => id,
        }
    }

    /// Header and footer travel in the clear; everything else is encrypted.
    pub fn is_encrypted(self) -> bool {
        !matches!(self, BlockType::FileHeader | BlockType::FileFooter)
    }
}

/// The 16-bit word in front of every block: `type << 10 | size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub type_id: u8,
    pub size: usize,
}

impl BlockHeader {
    pub fn from_word(word: u16) -> Self {
        BlockHeader {
            type_id: extract_bits(word as u32, 10, 6) as u8,
            size: extract_bits(word as u32, 0, 10) as usize,
        }
    }

    pub fn to_word(self) -> u16 {
        let word = pack_bits(0, 10, 6, self.type_id as u32);
        pack_bits(word, 0, 10, self.size as u32) as u16
    }

    pub fn kind(self) -> BlockType {
        BlockType::from_id(self.type_id)
    }
}

/// A block as framed in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub kind: BlockType,
    /// File offset of the block header
    pub offset: usize,
    pub ciphertext: Vec<u8>,
    pub plaintext: Vec<u8>,
    /// Unencrypted bytes past the declared size (planet coordinates)
    pub trailer: Vec<u8>,
}

impl RawBlock {
    pub fn declared_size(&self) -> usize {
        self.ciphertext.len()
    }

    /// Bytes this block occupies in the stream, header word included.
    pub fn framed_len(&self) -> usize {
        2 + self.ciphertext.len() + self.trailer.len()
    }
}
