// Probability-based targeting for the bot client.

use rand::Rng;

use crate::{
    bitboard::BitBoard,
    common::ShotResult,
    config::{BOARD_SIZE, FLEET, NUM_SHIPS},
    ship::Orientation,
};

type BB = BitBoard<u128, { BOARD_SIZE as usize }>;

const GRID_SIZE: usize = BOARD_SIZE as usize;

/// Placements covering more observed hits get exponentially more weight so
/// squares next to confirmed hits stand out.
const HIT_BIAS: f64 = 10.0;

/// Lower temperature biases sampling towards the most likely cells.
const TEMPERATURE: f64 = 0.5;

/// Compute a probability density over all unguessed squares given the sets of
/// known hits and misses and the lengths of the enemy ships. Each entry sums
/// the relative likelihood of a ship segment occupying that coordinate.
pub fn calc_pdf(
    hits: &BB,
    misses: &BB,
    lengths: &[usize; NUM_SHIPS],
) -> [[f64; GRID_SIZE]; GRID_SIZE] {
    let mut matrix = [[0.0f64; GRID_SIZE]; GRID_SIZE];

    for &len in lengths.iter().filter(|&&len| len > 0 && len <= GRID_SIZE) {
        for orient in [Orientation::Horizontal, Orientation::Vertical] {
            let (dr, dc) = match orient {
                Orientation::Horizontal => (0, 1),
                Orientation::Vertical => (1, 0),
            };
            let max_row = GRID_SIZE - dr * (len - 1);
            let max_col = GRID_SIZE - dc * (len - 1);
            for r in 0..max_row {
                for c in 0..max_col {
                    let cells = (0..len).map(|k| (r + dr * k, c + dc * k));
                    if cells.clone().any(|(rr, cc)| misses.get(rr, cc).unwrap_or(false)) {
                        continue;
                    }
                    let n_hits = cells
                        .clone()
                        .filter(|&(rr, cc)| hits.get(rr, cc).unwrap_or(false))
                        .count();
                    let weight = HIT_BIAS.powi(n_hits as i32);
                    for (rr, cc) in cells {
                        if !hits.get(rr, cc).unwrap_or(false) {
                            matrix[rr][cc] += weight;
                        }
                    }
                }
            }
        }
    }

    normalize(matrix)
}

fn normalize(mut matrix: [[f64; GRID_SIZE]; GRID_SIZE]) -> [[f64; GRID_SIZE]; GRID_SIZE] {
    let total: f64 = matrix.iter().flatten().sum();
    if total == 0.0 {
        return matrix;
    }
    for v in matrix.iter_mut().flatten() {
        *v /= total;
    }
    matrix
}

/// Sample a coordinate from a probability matrix using a temperature
/// parameter. Returns `None` when the matrix carries no weight at all.
pub fn sample_pdf<R: Rng + ?Sized>(
    pdf: &[[f64; GRID_SIZE]; GRID_SIZE],
    temperature: f64,
    rng: &mut R,
) -> Option<(usize, usize)> {
    let mut adjusted = [[0.0f64; GRID_SIZE]; GRID_SIZE];
    let mut total = 0.0;
    for r in 0..GRID_SIZE {
        for c in 0..GRID_SIZE {
            let v = pdf[r][c].powf(1.0 / temperature);
            adjusted[r][c] = v;
            total += v;
        }
    }
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let threshold: f64 = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last = None;
    for r in 0..GRID_SIZE {
        for c in 0..GRID_SIZE {
            if adjusted[r][c] <= 0.0 {
                continue;
            }
            cumulative += adjusted[r][c];
            last = Some((r, c));
            if threshold < cumulative {
                return last;
            }
        }
    }
    last
}

/// What a client has learned about the opponent's board from its own shots.
#[derive(Debug, Clone, Default)]
pub struct Targeting {
    hits: BB,
    misses: BB,
}

impl Targeting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, row: usize, col: usize, result: ShotResult) {
        let grid = match result {
            ShotResult::Hit => &mut self.hits,
            ShotResult::Miss => &mut self.misses,
        };
        if grid.set(row, col).is_err() {
            log::debug!("ignoring out-of-range shot ({},{})", row, col);
        }
    }

    pub fn is_resolved(&self, row: usize, col: usize) -> bool {
        self.hits.get(row, col).unwrap_or(true) || self.misses.get(row, col).unwrap_or(true)
    }

    pub fn hits(&self) -> usize {
        self.hits.count_ones()
    }

    /// Pick the next cell to fire at, never one already resolved.
    pub fn next_shot<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, usize)> {
        let lengths = FLEET.map(|ship| ship.length());
        let pdf = calc_pdf(&self.hits, &self.misses, &lengths);
        if let Some(cell) = sample_pdf(&pdf, TEMPERATURE, rng) {
            if !self.is_resolved(cell.0, cell.1) {
                return Some(cell);
            }
        }
        let unresolved = !(self.hits | self.misses);
        let open: Vec<(usize, usize)> = unresolved.iter_set_bits().collect();
        if open.is_empty() {
            None
        } else {
            Some(open[rng.random_range(0..open.len())])
        }
    }
}
