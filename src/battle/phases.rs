//! Phase reconstruction: one entry per acting stack's turn.
//!
//! Each accepted action marker opens a phase. The bytes right after the
//! marker are searched for the actor's new square and for damage markers.
//! Markers that start too close to the previous accepted one are taken to
//! be payload bytes of that phase and skipped.

use indexmap::IndexMap;
use log::trace;
use serde::Serialize;

use super::events::{action_marker, damage_marker, ActionKind};
use super::grid::{is_grid_byte, pos_to_grid, GridPos};
use crate::config::ScanConfig;
use crate::records::BattleStack;

/// Where a phase's position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionSource {
    /// `[actor][square]` seen right after the marker
    Observed,
    /// Carried over from an earlier phase or the stack table
    LastKnown,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hit {
    pub offset: usize,
    pub marker: u8,
    pub damage: u8,
    pub target: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    /// 1-based, in scan order
    pub number: usize,
    pub offset: usize,
    pub round: u8,
    pub actor: u8,
    pub target: u8,
    pub action: ActionKind,
    pub position: Option<GridPos>,
    pub position_source: PositionSource,
    /// Sum of every hit in the lookahead window
    pub damage: u32,
    pub hits: Vec<Hit>,
}

/// Initial squares from the stack table, keyed by stack index.
pub fn initial_positions(stacks: &[BattleStack]) -> IndexMap<u8, GridPos> {
    stacks
        .iter()
        .enumerate()
        .filter_map(|(i, s)| pos_to_grid(s.initial_position).map(|g| (i as u8, g)))
        .collect()
}

fn find_position(window: &[u8], actor: u8) -> Option<GridPos> {
    window
        .windows(2)
        .find(|pair| pair[0] == actor && is_grid_byte(pair[1]))
        .and_then(|pair| pos_to_grid(pair[1]))
}

fn find_hits(window: &[u8], window_offset: usize, config: &ScanConfig) -> Vec<Hit> {
    (0..window.len())
        .filter_map(|i| {
            damage_marker(&window[i..], config).map(|(marker, damage, target)| Hit {
                offset: window_offset + i,
                marker,
                damage,
                target,
            })
        })
        .collect()
}

pub fn decode_phases(actions: &[u8], stacks: &[BattleStack], config: &ScanConfig) -> Vec<Phase> {
    let mut last_known = initial_positions(stacks);
    let mut phases: Vec<Phase> = Vec::new();
    let mut last_marker: Option<usize> = None;
    let mut offset = 0usize;

    while offset < actions.len() {
        let marker = match action_marker(&actions[offset..], config) {
            Some(m) => m,
            None => {
                offset += 1;
                continue;
            }
        };
        if let Some(previous) = last_marker {
            if offset < previous.saturating_add(config.min_marker_gap) {
                trace!("{:#06x}: marker too close to {:#06x}, skipped", offset, previous);
                offset += 1;
                continue;
            }
        }

        let (round, actor, target, action) = marker;
        let window_start = (offset + 4).min(actions.len());
        let window_end = window_start.saturating_add(config.lookahead).min(actions.len());
        let window = &actions[window_start..window_end];

        let (position, position_source) = match find_position(window, actor) {
            Some(pos) => {
                last_known.insert(actor, pos);
                (Some(pos), PositionSource::Observed)
            }
            None => match last_known.get(&actor) {
                Some(&pos) => (Some(pos), PositionSource::LastKnown),
                None => (None, PositionSource::Unknown),
            },
        };

        let hits = find_hits(window, window_start, config);
        let damage = hits.iter().map(|h| h.damage as u32).sum();

        let phase = Phase {
            number: phases.len() + 1,
            offset,
            round,
            actor,
            target,
            action,
            position,
            position_source,
            damage,
            hits,
        };
        trace!(
            "phase {} at {:#06x}: round {} stack {} {:?} -> {}, {} damage",
            phase.number,
            offset,
            round,
            actor,
            action,
            target,
            phase.damage
        );
        phases.push(phase);
        last_marker = Some(offset);
        offset += 1;
    }
    phases
}
