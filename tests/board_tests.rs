use battleship_arena::{Board, BoardError, Cell, ShotResult, BOARD_SIZE, FLEET};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const N: usize = BOARD_SIZE as usize;

fn water_rows() -> Vec<Vec<Cell>> {
    vec![vec![Cell::Water; N]; N]
}

#[test]
fn test_from_rows_accepts_water_and_ships() {
    let mut rows = water_rows();
    rows[0][0] = Cell::Ship;
    rows[0][1] = Cell::Ship;
    let board = Board::from_rows(&rows).unwrap();
    assert_eq!(board.cell(0, 0).unwrap(), Cell::Ship);
    assert_eq!(board.cell(5, 5).unwrap(), Cell::Water);
    assert_eq!(board.remaining_ship_cells(), 2);
    assert_eq!(board.rows(), rows);
}

#[test]
fn test_from_rows_rejects_bad_layouts() {
    assert_eq!(
        Board::from_rows(&water_rows()).unwrap_err(),
        BoardError::EmptyFleet
    );

    let mut short = water_rows();
    short.pop();
    assert!(matches!(
        Board::from_rows(&short),
        Err(BoardError::InvalidDimensions { rows: 9, .. })
    ));

    let mut ragged = water_rows();
    ragged[3].push(Cell::Ship);
    assert!(matches!(
        Board::from_rows(&ragged),
        Err(BoardError::InvalidDimensions { cols: 11, .. })
    ));

    let mut resolved = water_rows();
    resolved[1][1] = Cell::Ship;
    resolved[2][4] = Cell::Hit;
    assert_eq!(
        Board::from_rows(&resolved).unwrap_err(),
        BoardError::UnexpectedCell { row: 2, col: 4 }
    );
}

#[test]
fn test_fire_transitions_once() {
    let mut board = Board::from_ship_cells([(4, 4)]).unwrap();

    assert_eq!(board.fire(0, 0).unwrap(), ShotResult::Miss);
    assert_eq!(board.cell(0, 0).unwrap(), Cell::Miss);
    assert_eq!(board.fire(0, 0).unwrap_err(), BoardError::AlreadyResolved);
    assert_eq!(board.cell(0, 0).unwrap(), Cell::Miss);

    assert!(!board.is_defeated());
    assert_eq!(board.fire(4, 4).unwrap(), ShotResult::Hit);
    assert_eq!(board.cell(4, 4).unwrap(), Cell::Hit);
    assert!(board.is_defeated());
    assert_eq!(board.fire(4, 4).unwrap_err(), BoardError::AlreadyResolved);
}

#[test]
fn test_fire_out_of_bounds() {
    let mut board = Board::from_ship_cells([(0, 0)]).unwrap();
    assert!(matches!(
        board.fire(N, 0),
        Err(BoardError::BitBoardError(_))
    ));
}

#[test]
fn test_ships_around_clips_to_board() {
    let board = Board::from_ship_cells([(0, 0), (0, 1), (1, 0), (2, 2), (9, 9)]).unwrap();
    assert_eq!(board.ships_around(0, 0), 3);
    assert_eq!(board.ships_around(1, 1), 4);
    assert_eq!(board.ships_around(9, 9), 1);
    assert_eq!(board.ships_around(5, 5), 0);
}

#[test]
fn test_ships_around_ignores_hits() {
    let mut board = Board::from_ship_cells([(0, 0), (0, 1)]).unwrap();
    board.fire(0, 0).unwrap();
    assert_eq!(board.ships_around(0, 0), 1);
}

#[test]
fn test_random_fleet_places_whole_fleet() {
    let mut rng = SmallRng::seed_from_u64(42);
    let board = Board::random_fleet(&mut rng).unwrap();
    let expected: usize = FLEET.iter().map(|s| s.length()).sum();
    assert_eq!(board.remaining_ship_cells(), expected);
    // layout survives the trip a client makes with it
    assert_eq!(Board::from_rows(&board.rows()).unwrap(), board);
}
