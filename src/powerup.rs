//! Blitz-only power-ups and the hit-chaining rule.
//!
//! Every player may use each power-up once per session. Using one is the
//! whole action for that turn.

use serde::{Deserialize, Serialize};

use crate::common::{GameMode, ShotResult};
use crate::config::BOARD_SIZE;

const LAST: u8 = BOARD_SIZE - 1;

/// The closed set of power-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUp {
    Cannons,
    Scan,
    Protect,
}

/// A power-up as requested by a client, with its target where it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpRequest {
    /// Fire at the 2×2 block anchored at (row, col).
    Cannons { row: u8, col: u8 },
    /// Count ships in the 3×3 block centred on (row, col).
    Scan { row: u8, col: u8 },
    /// Deny the opponent's next hit its bonus turn.
    Protect,
}

impl PowerUpRequest {
    pub fn kind(&self) -> PowerUp {
        match self {
            PowerUpRequest::Cannons { .. } => PowerUp::Cannons,
            PowerUpRequest::Scan { .. } => PowerUp::Scan,
            PowerUpRequest::Protect => PowerUp::Protect,
        }
    }
}

/// Per-player record of spent power-ups. Flags only ever go from false to true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpUsage {
    pub cannons: bool,
    pub scan: bool,
    pub protect: bool,
}

impl PowerUpUsage {
    pub fn is_used(&self, power_up: PowerUp) -> bool {
        match power_up {
            PowerUp::Cannons => self.cannons,
            PowerUp::Scan => self.scan,
            PowerUp::Protect => self.protect,
        }
    }

    pub fn mark_used(&mut self, power_up: PowerUp) {
        match power_up {
            PowerUp::Cannons => self.cannons = true,
            PowerUp::Scan => self.scan = true,
            PowerUp::Protect => self.protect = true,
        }
    }
}

/// Clamp a requested coordinate pair onto the board.
pub fn clamp_target(row: u8, col: u8) -> (usize, usize) {
    (row.min(LAST) as usize, col.min(LAST) as usize)
}

/// Cells covered by a cannons volley anchored at (row, col), clipped to the
/// board, in firing order.
pub fn cannon_cells(row: usize, col: usize) -> Vec<(usize, usize)> {
    let size = BOARD_SIZE as usize;
    [(row, col), (row + 1, col), (row, col + 1), (row + 1, col + 1)]
        .into_iter()
        .filter(|&(r, c)| r < size && c < size)
        .collect()
}

/// What happens to the turn once the mover's action has resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnChange {
    /// Same player moves again.
    Keep,
    /// Turn passes to the opponent.
    Pass,
}

/// Decide the next turn after a shot (or a cannons volley, evaluated once for
/// the composite result).
///
/// Classic always passes. Blitz keeps the turn on an unprotected hit. Any
/// blitz shot that passes the turn uses up the defender's protection.
pub fn chain_turn(mode: GameMode, any_hit: bool, defender_protected: &mut bool) -> TurnChange {
    match mode {
        GameMode::Classic => TurnChange::Pass,
        GameMode::Blitz if any_hit && !*defender_protected => TurnChange::Keep,
        GameMode::Blitz => {
            *defender_protected = false;
            TurnChange::Pass
        }
    }
}

/// True if any resolved shot in a volley hit a ship.
pub fn any_hit(shots: &[(usize, usize, ShotResult)]) -> bool {
    shots.iter().any(|&(_, _, result)| result == ShotResult::Hit)
}
