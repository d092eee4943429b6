//! Battle plans (type 30).

use serde::Serialize;

use super::RecordCodec;
use crate::bits::{extract_bits, pack_bits, push16, Cursor};
use crate::block::BlockType;
use crate::error::RecordError;
use crate::text::GameString;

const TACTICS: [&str; 6] = [
    "Disengage",
    "Disengage if challenged",
    "Minimize damage to self",
    "Maximize net damage",
    "Maximize damage ratio",
    "Maximize damage",
];

const TARGETS: [&str; 8] = [
    "None/Disengage",
    "Any",
    "Starbase",
    "Armed ships",
    "Bombers/Freighters",
    "Unarmed ships",
    "Fuel transports",
    "Freighters",
];

/// A player's battle orders. A 4-byte payload is a deleted plan slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattlePlan {
    pub owner: u8,
    pub plan_id: u8,
    pub tactic: u8,
    /// Bits 12..15 of the first word
    pub spare: u8,
    pub dump_cargo: bool,
    pub primary_target: u8,
    pub secondary_target: u8,
    pub attack_who: u8,
    pub name: GameString,
    deleted: bool,
    pub trailing: Vec<u8>,
}

impl BattlePlan {
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Turn this plan into a deleted slot; only the first word is kept.
    pub fn delete(&mut self) {
        self.deleted = true;
        self.name = GameString::default();
        self.trailing.clear();
    }

    pub fn tactic_name(&self) -> &'static str {
        TACTICS.get(self.tactic as usize).copied().unwrap_or("Unknown")
    }

    pub fn primary_target_name(&self) -> &'static str {
        TARGETS.get(self.primary_target as usize).copied().unwrap_or("Unknown")
    }

    pub fn secondary_target_name(&self) -> &'static str {
        TARGETS.get(self.secondary_target as usize).copied().unwrap_or("Unknown")
    }

    /// Who the plan attacks; values from 4 name a single player.
    pub fn attack_who_name(&self) -> String {
        match self.attack_who {
            0 => "Nobody".to_string(),
            1 => "Enemies".to_string(),
            2 => "Neutrals & Enemies".to_string(),
            3 => "Everyone".to_string(),
            n => format!("Player {}", n - 3),
        }
    }
}

impl RecordCodec for BattlePlan {
    const MIN_LEN: usize = 4;

    fn decode(_kind: BlockType, data: &[u8]) -> Result<Self, RecordError> {
        let mut c = Cursor::new(data);
        let word = c.u16()? as u32;
        let targets = c.u8()? as u32;
        let attack_who = c.u8()?;
        let deleted = c.is_empty();
        let name = if deleted {
            GameString::default()
        } else {
            GameString::read(&mut c)?
        };

        Ok(BattlePlan {
            owner: extract_bits(word, 0, 4) as u8,
            plan_id: extract_bits(word, 4, 4) as u8,
            tactic: extract_bits(word, 8, 4) as u8,
            spare: extract_bits(word, 12, 3) as u8,
            dump_cargo: extract_bits(word, 15, 1) == 1,
            primary_target: extract_bits(targets, 0, 4) as u8,
            secondary_target: extract_bits(targets, 4, 4) as u8,
            attack_who,
            name,
            deleted,
            trailing: c.rest(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut word = pack_bits(0, 0, 4, self.owner as u32);
        word = pack_bits(word, 4, 4, self.plan_id as u32);
        word = pack_bits(word, 8, 4, self.tactic as u32);
        word = pack_bits(word, 12, 3, self.spare as u32);
        word = pack_bits(word, 15, 1, self.dump_cargo as u32);
        let targets = pack_bits(self.primary_target as u32, 4, 4, self.secondary_target as u32);

        let mut out = Vec::new();
        push16(&mut out, word as u16);
        out.push(targets as u8);
        out.push(self.attack_who);
        if !self.deleted {
            self.name.write(&mut out);
            out.extend_from_slice(&self.trailing);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::pack_text;

    #[test]
    fn test_deleted_plan_round_trip() {
        let bytes = [0x31, 0x84, 0x00, 0x00];
        let plan = BattlePlan::decode(BlockType::BattlePlan, &bytes).unwrap();
        assert!(plan.is_deleted());
        assert_eq!(plan.owner, 1);
        assert_eq!(plan.plan_id, 3);
        assert_eq!(plan.tactic, 4);
        assert!(plan.dump_cargo);
        assert_eq!(plan.encode(), bytes.to_vec());
    }

    #[test]
    fn test_named_plan() {
        let mut bytes = vec![0x12, 0x05, 0x31, 0x01];
        let name = pack_text("Kill Starbase");
        bytes.push(name.len() as u8);
        bytes.extend_from_slice(&name);

        let plan = BattlePlan::decode(BlockType::BattlePlan, &bytes).unwrap();
        assert!(!plan.is_deleted());
        assert_eq!(plan.owner, 2);
        assert_eq!(plan.plan_id, 1);
        assert_eq!(plan.tactic_name(), "Maximize damage");
        assert!(!plan.dump_cargo);
        assert_eq!(plan.primary_target_name(), "Any");
        assert_eq!(plan.secondary_target_name(), "Armed ships");
        assert_eq!(plan.attack_who_name(), "Enemies");
        assert_eq!(plan.name.text, "Kill Starbase");
        assert_eq!(plan.encode(), bytes);
    }

    #[test]
    fn test_delete_keeps_first_word() {
        let mut bytes = vec![0x12, 0x05, 0x31, 0x01];
        GameString::new("Default").write(&mut bytes);
        let mut plan = BattlePlan::decode(BlockType::BattlePlan, &bytes).unwrap();
        plan.delete();
        assert_eq!(plan.encode(), vec![0x12, 0x05, 0x31, 0x01]);
    }
}
