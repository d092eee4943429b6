//! Low-level event scan over battle action bytes.
//!
//! The action stream has no documented framing, so events are recovered by
//! trying a fixed list of byte patterns at each offset, in priority order:
//!
//! ```text
//! (a) [round][actor][target][0x04|0xC4]   move / fire marker, 4 bytes
//! (b) [0x64|0xE4][damage][target][pos]    damage at a board square, 4 bytes
//! (c) [stack][pos]                        position update, 2 bytes
//! ```
//!
//! When nothing matches the scan moves on by one byte.

use log::trace;
use serde::Serialize;

use super::grid::{is_grid_byte, pos_to_grid, GridPos};
use crate::config::ScanConfig;

pub const ACTION_MOVE: u8 = 0x04;
pub const ACTION_FIRE: u8 = 0xC4;
pub const DAMAGE_MARKERS: [u8; 2] = [0x64, 0xE4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    Move,
    Fire,
}

impl ActionKind {
    pub fn from_byte(byte: u8) -> Option<ActionKind> {
        match byte {
            ACTION_MOVE => Some(ActionKind::Move),
            ACTION_FIRE => Some(ActionKind::Fire),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Action {
        action: ActionKind,
        actor: u8,
        target: u8,
    },
    Damage {
        marker: u8,
        damage: u8,
        target: u8,
        position: Option<GridPos>,
    },
    Position {
        stack: u8,
        position: Option<GridPos>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BattleEvent {
    /// Offset into the joined action bytes
    pub offset: usize,
    /// Round of the last action marker seen
    pub round: u8,
    pub kind: EventKind,
}

struct Match {
    kind: EventKind,
    round: Option<u8>,
    len: usize,
}

type Matcher = fn(&[u8], &ScanConfig) -> Option<Match>;

const MATCHERS: [Matcher; 3] = [match_action, match_damage, match_position];

/// `[round][actor][target][action]` at the start of `bytes`.
pub(crate) fn action_marker(bytes: &[u8], config: &ScanConfig) -> Option<(u8, u8, u8, ActionKind)> {
    match *bytes {
        [round, actor, target, action, ..]
            if config.is_round(round) && config.is_stack(actor) && config.is_stack(target) =>
        {
            ActionKind::from_byte(action).map(|a| (round, actor, target, a))
        }
        _ => None,
    }
}

/// `[marker][damage][target]`; the position byte is not required.
pub(crate) fn damage_marker(bytes: &[u8], config: &ScanConfig) -> Option<(u8, u8, u8)> {
    match *bytes {
        [marker, damage, target, ..] if DAMAGE_MARKERS.contains(&marker) && config.is_stack(target) => {
            Some((marker, damage, target))
        }
        _ => None,
    }
}

fn match_action(bytes: &[u8], config: &ScanConfig) -> Option<Match> {
    let (round, actor, target, action) = action_marker(bytes, config)?;
    Some(Match {
        kind: EventKind::Action {
            action,
            actor,
            target,
        },
        round: Some(round),
        len: 4,
    })
}

fn match_damage(bytes: &[u8], config: &ScanConfig) -> Option<Match> {
    let (marker, damage, target) = damage_marker(bytes, config)?;
    let pos = *bytes.get(3)?;
    if !is_grid_byte(pos) {
        return None;
    }
    Some(Match {
        kind: EventKind::Damage {
            marker,
            damage,
            target,
            position: pos_to_grid(pos),
        },
        round: None,
        len: 4,
    })
}

fn match_position(bytes: &[u8], config: &ScanConfig) -> Option<Match> {
    match *bytes {
        [stack, pos, ..] if config.is_stack(stack) && is_grid_byte(pos) => Some(Match {
            kind: EventKind::Position {
                stack,
                position: pos_to_grid(pos),
            },
            round: None,
            len: 2,
        }),
        _ => None,
    }
}

/// Scan the whole action stream. Always terminates; never fails.
pub fn decode_action_events(actions: &[u8], config: &ScanConfig) -> Vec<BattleEvent> {
    let mut events = Vec::new();
    let mut round = 0u8;
    let mut offset = 0usize;

    while offset < actions.len() {
        let rest = &actions[offset..];
        match MATCHERS.iter().find_map(|m| m(rest, config)) {
            Some(found) => {
                if let Some(r) = found.round {
                    round = r;
                }
                trace!("{:#06x}: round {} {:?}", offset, round, found.kind);
                events.push(BattleEvent {
                    offset,
                    round,
                    kind: found.kind,
                });
                offset += found.len;
            }
            None => offset += 1,
        }
    }
    events
}
