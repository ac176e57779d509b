use battleship_arena::{Board, BoardError, Cell, BOARD_SIZE};
use proptest::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

const N: usize = BOARD_SIZE as usize;

fn random_board(seed: u64) -> Board {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut board = Board::random_fleet(&mut rng).unwrap();
    let shots = rng.random_range(0..N * N);
    for _ in 0..shots {
        let r = rng.random_range(0..N);
        let c = rng.random_range(0..N);
        let _ = board.fire(r, c);
    }
    board
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resolved_cells_never_change(seed in any::<u64>(), row in 0..N, col in 0..N) {
        let mut board = random_board(seed);
        let _ = board.fire(row, col);
        let after = board.rows();
        prop_assert_eq!(board.fire(row, col).unwrap_err(), BoardError::AlreadyResolved);
        prop_assert_eq!(board.rows(), after);
    }

    #[test]
    fn fire_only_moves_water_to_miss_and_ship_to_hit(seed in any::<u64>(), row in 0..N, col in 0..N) {
        let mut board = random_board(seed);
        let before = board.cell(row, col).unwrap();
        let result = board.fire(row, col);
        let after = board.cell(row, col).unwrap();
        match before {
            Cell::Water => prop_assert_eq!(after, Cell::Miss),
            Cell::Ship => prop_assert_eq!(after, Cell::Hit),
            Cell::Hit | Cell::Miss => {
                prop_assert!(result.is_err());
                prop_assert_eq!(after, before);
            }
        }
    }

    #[test]
    fn defeated_iff_no_ship_cells(seed in any::<u64>()) {
        let board = random_board(seed);
        let ship_cells = board
            .rows()
            .iter()
            .flatten()
            .filter(|&&c| c == Cell::Ship)
            .count();
        prop_assert_eq!(board.remaining_ship_cells(), ship_cells);
        prop_assert_eq!(board.is_defeated(), ship_cells == 0);
    }

    #[test]
    fn scan_count_fits_neighbourhood(seed in any::<u64>(), row in 0..N, col in 0..N) {
        let board = random_board(seed);
        let count = board.ships_around(row, col);
        let rows = (row.saturating_sub(1)..=(row + 1).min(N - 1)).count();
        let cols = (col.saturating_sub(1)..=(col + 1).min(N - 1)).count();
        prop_assert!(count <= rows * cols);
    }
}
