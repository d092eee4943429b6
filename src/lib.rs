#![crate_name = "starsfile"]

pub mod battle;
pub mod bits;
pub mod block;
pub mod config;
pub mod crypt;
pub mod error;
pub mod framer;
pub mod header;
pub mod records;
pub mod test_utils;
pub mod text;
pub mod vlq;

pub use battle::{BattleReplay, ReplaySummary};
pub use block::BlockType;
pub use config::ScanConfig;
pub use crypt::{Keystream, PlainKeystream, StarsKeystream};
pub use error::{RecordError, StarsError};
pub use framer::{Block, StarsFile};
pub use header::FileHeader;
pub use records::Record;

/*
Layout of a typical turn file

        0000    FileHeader      plaintext, seeds the cipher
        0012    Player          own race, full detail
        ....    Player          other races, partial
        ....    Planets         universe settings
                                + planet count * 4 coordinate bytes
        ....    Planet          own planets, full
        ....    PartialPlanet   scanned planets
        ....    Fleet           own fleets
        ....    PartialFleet    scanned fleets
        ....    Waypoint        per own fleet
        ....    Design          own and seen designs
        ....    BattlePlan
        ....    Battle          + BattleContinuation
        ....    Message
        ....    Object          minefields, packets, wormholes
        ....    FileFooter      plaintext checksum
*/
