//! Battle record (type 31): header, stack table and the first action bytes.

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{push16, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;

pub const HEADER_LEN: usize = 16;

/// One stack of identical ships taking part in a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BattleStack {
    pub owner: u8,
    pub design: u8,
    pub fleet: u16,
    pub ship_count: u16,
    pub side: u8,
    /// Grid byte, 0x40 + y * 10 + x
    pub initial_position: u8,
    pub armor: u16,
    pub shields: u16,
    pub spare: u16,
}

impl BattleStack {
    pub const LEN: usize = 14;

    fn decode(c: &mut Cursor) -> Result<Self, RecordError> {
        Ok(BattleStack {
            owner: c.u8()?,
            design: c.u8()?,
            fleet: c.u16()?,
            ship_count: c.u16()?,
            side: c.u8()?,
            initial_position: c.u8()?,
            armor: c.u16()?,
            shields: c.u16()?,
            spare: c.u16()?,
        })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.owner);
        out.push(self.design);
        push16(out, self.fleet);
        push16(out, self.ship_count);
        out.push(self.side);
        out.push(self.initial_position);
        push16(out, self.armor);
        push16(out, self.shields);
        push16(out, self.spare);
    }
}

/// Battle recording head: where, who, and the first slice of actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Battle {
    pub battle_id: u8,
    pub rounds: u8,
    pub side1_stacks: u8,
    pub side2_stacks: u8,
    pub recording_size: u16,
    pub location: u16,
    pub x: u16,
    pub y: u16,
    pub spare: [u16; 2],
    pub stacks: Vec<BattleStack>,
    /// Action bytes stored in this block; more follow in continuation blocks
    pub actions: Vec<u8>,
}

impl Battle {
    pub fn stack_count(&self) -> usize {
        self.side1_stacks as usize + self.side2_stacks as usize
    }
}

impl RecordCodec for Battle {
    const MIN_LEN: usize = HEADER_LEN;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let battle_id = c.u8()?;
        let rounds = c.u8()?;
        let side1_stacks = c.u8()?;
        let side2_stacks = c.u8()?;
        let recording_size = c.u16()?;
        let location = c.u16()?;
        let x = c.u16()?;
        let y = c.u16()?;
        let spare = [c.u16()?, c.u16()?];

        let count = side1_stacks as usize + side2_stacks as usize;
        if c.remaining() < count * BattleStack::LEN {
            return Err(RecordError::Truncated {
                needed: HEADER_LEN + count * BattleStack::LEN,
                len: data.len(),
            });
        }
        let mut stacks = Vec::with_capacity(count);
        for _ in 0..count {
            stacks.push(BattleStack::decode(&mut c)?);
        }

        Ok(Battle {
            battle_id,
            rounds,
            side1_stacks,
            side2_stacks,
            recording_size,
            location,
            x,
            y,
            spare,
            stacks,
            actions: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            HEADER_LEN + self.stacks.len() * BattleStack::LEN + self.actions.len(),
        );
        out.push(self.battle_id);
        out.push(self.rounds);
        out.push(self.side1_stacks);
        out.push(self.side2_stacks);
        push16(&mut out, self.recording_size);
        push16(&mut out, self.location);
        push16(&mut out, self.x);
        push16(&mut out, self.y);
        push16(&mut out, self.spare[0]);
        push16(&mut out, self.spare[1]);
        for stack in &self.stacks {
            stack.encode(&mut out);
        }
        out.extend_from_slice(&self.actions);
        out
    }
}

/// A battle joined with the action bytes of its continuation blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleRecording {
    pub battle: Battle,
    pub actions: Vec<u8>,
    pub continuation_blocks: usize,
}

impl BattleRecording {
    pub fn new(battle: Battle) -> Self {
        let actions = battle.actions.clone();
        BattleRecording {
            battle,
            actions,
            continuation_blocks: 0,
        }
    }

    pub fn append_continuation(&mut self, bytes: &[u8]) {
        self.actions.extend_from_slice(bytes);
        self.continuation_blocks += 1;
    }
}
