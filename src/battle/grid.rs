//! Battle board squares. The board is 10 wide; a square is stored as one
//! byte, `0x40 + y * 10 + x`.

use std::fmt;

use serde::Serialize;

/// Lowest and highest byte that encode a battle board square.
pub const GRID_FIRST: u8 = 0x40;
pub const GRID_LAST: u8 = 0x99;
pub const GRID_WIDTH: u8 = 10;

/// A square on the battle board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridPos {
    pub x: u8,
    pub y: u8,
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

pub fn is_grid_byte(pos: u8) -> bool {
    (GRID_FIRST..=GRID_LAST).contains(&pos)
}

/// Decode a position byte (`0x40 + y * 10 + x`). Bytes outside the board
/// range give `None`.
pub fn pos_to_grid(pos: u8) -> Option<GridPos> {
    if !is_grid_byte(pos) {
        return None;
    }
    let cell = pos - GRID_FIRST;
    Some(GridPos {
        x: cell % GRID_WIDTH,
        y: cell / GRID_WIDTH,
    })
}

pub fn grid_to_pos(grid: GridPos) -> Option<u8> {
    let pos = GRID_FIRST as u32 + grid.y as u32 * GRID_WIDTH as u32 + grid.x as u32;
    if grid.x < GRID_WIDTH && pos <= GRID_LAST as u32 {
        Some(pos as u8)
    } else {
        None
    }
}
