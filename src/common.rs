//! Shared identifiers, board errors and intent rejections.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoardError;

/// Identifier of a connected client. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Identifier of a game session. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-{}", self.0)
    }
}

/// Rule variant of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Classic,
    Blitz,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Classic => write!(f, "classic"),
            GameMode::Blitz => write!(f, "blitz"),
        }
    }
}

/// Result of a single resolved shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotResult {
    Hit,
    Miss,
}

/// Errors returned by Board operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Underlying bitboard error (e.g., invalid size or index).
    BitBoardError(BitBoardError),
    /// Cell was already resolved as a hit or a miss.
    AlreadyResolved,
    /// Submitted layout is not a `BOARD_SIZE`×`BOARD_SIZE` grid.
    InvalidDimensions { rows: usize, cols: usize },
    /// Submitted layout contains a cell other than water or ship.
    UnexpectedCell { row: usize, col: usize },
    /// Submitted layout has no ship cells at all.
    EmptyFleet,
    // Ship out of bounds
    ShipOutOfBounds,
    /// Random placement gave up.
    UnableToPlaceShip,
}

impl From<BitBoardError> for BoardError {
    fn from(err: BitBoardError) -> Self {
        BoardError::BitBoardError(err)
    }
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::BitBoardError(e) => write!(f, "BitBoard error: {}", e),
            BoardError::AlreadyResolved => write!(f, "Cell was already fired at"),
            BoardError::InvalidDimensions { rows, cols } => {
                write!(f, "Board must be 10x10, got {}x{}", rows, cols)
            }
            BoardError::UnexpectedCell { row, col } => {
                write!(f, "Layout cell ({}, {}) must be water or ship", row, col)
            }
            BoardError::EmptyFleet => write!(f, "Layout contains no ships"),
            BoardError::ShipOutOfBounds => write!(f, "Ship placement is out of bounds"),
            BoardError::UnableToPlaceShip => write!(f, "Unable to place ship"),
        }
    }
}

impl std::error::Error for BoardError {}

/// Reason an intent was dropped without changing any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Joining a queue before choosing a nickname.
    NicknameRequired,
    InvalidNickname,
    AlreadyInGame,
    NotInGame,
    NotQueued,
    /// The session vanished, usually racing a disconnect.
    SessionUnavailable,
    InvalidFleet,
    AlreadyReady,
    NotActive,
    GamePaused,
    NotPaused,
    NotYourTurn,
    OutOfBounds,
    AlreadyResolved,
    NotBlitzMode,
    PowerUpSpent,
    ChatUnavailable,
    InvalidChatMessage,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::NicknameRequired => "a nickname is required first",
            Rejection::InvalidNickname => "nickname is empty or too long",
            Rejection::AlreadyInGame => "already in a game",
            Rejection::NotInGame => "not in a game",
            Rejection::NotQueued => "not waiting in a queue",
            Rejection::SessionUnavailable => "game is no longer available",
            Rejection::InvalidFleet => "fleet layout is invalid",
            Rejection::AlreadyReady => "fleet already placed",
            Rejection::NotActive => "game is not in progress",
            Rejection::GamePaused => "game is paused",
            Rejection::NotPaused => "game is not paused",
            Rejection::NotYourTurn => "not your turn",
            Rejection::OutOfBounds => "target is off the board",
            Rejection::AlreadyResolved => "cell was already fired at",
            Rejection::NotBlitzMode => "power-ups are blitz-only",
            Rejection::PowerUpSpent => "power-up already used",
            Rejection::ChatUnavailable => "chat is blitz-only",
            Rejection::InvalidChatMessage => "chat message is empty or too long",
        };
        f.write_str(text)
    }
}
