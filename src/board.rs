//! The 10×10 game grid and its cell-state transitions.
//!
//! A board is three bitboards: ship occupancy, hits and misses. A cell is
//! `Hit` once it is in `hits`, `Miss` once it is in `misses`, otherwise
//! `Ship` or `Water` depending on occupancy. Resolved cells never revert.

use core::fmt;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoard;
use crate::common::{BoardError, ShotResult};
use crate::config::{BOARD_SIZE, FLEET};
use crate::ship::Orientation;

type BB = BitBoard<u128, { BOARD_SIZE as usize }>;

const GRID: usize = BOARD_SIZE as usize;

/// State of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Water,
    Ship,
    Hit,
    Miss,
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    ships: BB,
    hits: BB,
    misses: BB,
}

impl Board {
    /// Create an empty board (all water).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from a client-submitted row-major layout.
    ///
    /// The layout must be exactly `BOARD_SIZE`×`BOARD_SIZE`, contain only
    /// `Water`/`Ship` cells and at least one ship cell.
    pub fn from_rows(rows: &[Vec<Cell>]) -> Result<Self, BoardError> {
        if rows.len() != GRID {
            let cols = rows.first().map(Vec::len).unwrap_or(0);
            return Err(BoardError::InvalidDimensions {
                rows: rows.len(),
                cols,
            });
        }
        let mut ships = BB::new();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != GRID {
                return Err(BoardError::InvalidDimensions {
                    rows: rows.len(),
                    cols: row.len(),
                });
            }
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Water => {}
                    Cell::Ship => ships.set(r, c)?,
                    Cell::Hit | Cell::Miss => {
                        return Err(BoardError::UnexpectedCell { row: r, col: c })
                    }
                }
            }
        }
        if ships.is_empty() {
            return Err(BoardError::EmptyFleet);
        }
        Ok(Self {
            ships,
            ..Self::default()
        })
    }

    /// Build a board with ships on exactly the given cells.
    pub fn from_ship_cells<I>(cells: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let ships = BB::from_iter(cells)?;
        if ships.is_empty() {
            return Err(BoardError::EmptyFleet);
        }
        Ok(Self {
            ships,
            ..Self::default()
        })
    }

    /// Lay out the standard fleet at random, non-overlapping positions.
    pub fn random_fleet<R: Rng + ?Sized>(rng: &mut R) -> Result<Self, BoardError> {
        let mut ships = BB::new();
        for def in FLEET.iter() {
            let mut placed = false;
            for _ in 0..100 {
                let orient = if rng.random() {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                let max_r = if orient == Orientation::Vertical {
                    GRID - def.length()
                } else {
                    GRID - 1
                };
                let max_c = if orient == Orientation::Horizontal {
                    GRID - def.length()
                } else {
                    GRID - 1
                };
                let r = rng.random_range(0..=max_r);
                let c = rng.random_range(0..=max_c);
                let mask: BB = def.mask(orient, r, c)?;
                if (ships & mask).is_empty() {
                    ships |= mask;
                    placed = true;
                    break;
                }
            }
            if !placed {
                return Err(BoardError::UnableToPlaceShip);
            }
        }
        Ok(Self {
            ships,
            ..Self::default()
        })
    }

    /// Current state of the cell at (row, col).
    pub fn cell(&self, row: usize, col: usize) -> Result<Cell, BoardError> {
        if self.hits.get(row, col)? {
            Ok(Cell::Hit)
        } else if self.misses.get(row, col)? {
            Ok(Cell::Miss)
        } else if self.ships.get(row, col)? {
            Ok(Cell::Ship)
        } else {
            Ok(Cell::Water)
        }
    }

    /// Returns `true` if the cell was already fired at.
    pub fn is_resolved(&self, row: usize, col: usize) -> Result<bool, BoardError> {
        Ok(self.hits.get(row, col)? || self.misses.get(row, col)?)
    }

    /// Resolve a shot at (row, col): `Ship` becomes `Hit`, `Water` becomes `Miss`.
    pub fn fire(&mut self, row: usize, col: usize) -> Result<ShotResult, BoardError> {
        if self.is_resolved(row, col)? {
            return Err(BoardError::AlreadyResolved);
        }
        if self.ships.get(row, col)? {
            self.hits.set(row, col)?;
            Ok(ShotResult::Hit)
        } else {
            self.misses.set(row, col)?;
            Ok(ShotResult::Miss)
        }
    }

    /// Number of ship cells not yet hit.
    pub fn remaining_ship_cells(&self) -> usize {
        (self.ships & !self.hits).count_ones()
    }

    /// A board is defeated once it holds no `Ship` cells.
    pub fn is_defeated(&self) -> bool {
        (self.ships & !self.hits).is_empty()
    }

    /// Count `Ship` cells in the 3×3 neighbourhood centred on (row, col),
    /// clipped to the board. Does not mutate anything.
    pub fn ships_around(&self, row: usize, col: usize) -> usize {
        let mut count = 0;
        for r in row.saturating_sub(1)..=(row + 1).min(GRID - 1) {
            for c in col.saturating_sub(1)..=(col + 1).min(GRID - 1) {
                if matches!(self.cell(r, c), Ok(Cell::Ship)) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Row-major view of every cell.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        (0..GRID)
            .map(|r| {
                (0..GRID)
                    .map(|c| self.cell(r, c).unwrap_or(Cell::Water))
                    .collect()
            })
            .collect()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        for row in self.rows() {
            write!(f, "  ")?;
            for cell in row {
                let glyph = match cell {
                    Cell::Water => '~',
                    Cell::Ship => 'S',
                    Cell::Hit => 'X',
                    Cell::Miss => 'o',
                };
                write!(f, "{} ", glyph)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
