//! Wire messages exchanged between clients and the engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::Cell;
use crate::common::{ClientId, GameMode, Rejection, SessionId, ShotResult};
use crate::powerup::PowerUpRequest;

pub const PROTOCOL_VERSION: u16 = 1;

/// Top-level frame payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// First frame a client sends.
    Handshake { version: u16 },
    /// Server reply to a matching handshake.
    HandshakeAck { version: u16, client_id: ClientId },
    Intent(ClientIntent),
    Event(ServerEvent),
}

/// Everything a client can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientIntent {
    SetNickname { nickname: String },
    JoinQueue { mode: GameMode },
    LeaveQueue,
    /// Row-major `BOARD_SIZE`×`BOARD_SIZE` layout of water and ship cells.
    PlaceFleet { rows: Vec<Vec<Cell>> },
    Fire { row: u8, col: u8 },
    UsePowerUp(PowerUpRequest),
    Pause,
    Resume,
    Forfeit,
    SendChatMessage { text: String },
}

/// Public profile of a player as shown at game start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: ClientId,
    pub nickname: String,
    pub score: u32,
    pub head_to_head: HashMap<ClientId, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    FleetDestroyed,
    Forfeit,
    OpponentDisconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub game_id: SessionId,
    pub player_id: ClientId,
    pub player_name: String,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Notifications pushed from the engine to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerEvent {
    NicknameSet {
        nickname: String,
        client_id: ClientId,
    },
    Waiting {
        mode: GameMode,
    },
    GameStart {
        game_id: SessionId,
        /// In turn order: the first entry moves first.
        players: Vec<PlayerSummary>,
        first_player: ClientId,
        mode: GameMode,
        turn_seconds: u32,
    },
    OpponentReady,
    AllPlayersReady,
    YourTurn,
    OpponentTurn,
    FireResult {
        row: u8,
        col: u8,
        result: ShotResult,
        /// True when the shot landed on the receiver's own board.
        is_own_grid: bool,
    },
    ScanResult {
        row: u8,
        col: u8,
        count: u8,
    },
    GameOver {
        result: GameResult,
        reason: GameOverReason,
    },
    TimerUpdate {
        seconds: u32,
    },
    GamePaused {
        by: ClientId,
    },
    ResumeVoteUpdate {
        resume_ready_ids: Vec<ClientId>,
    },
    GameResumed {
        by: ClientId,
    },
    OpponentDisconnected,
    ChatMessage(ChatMessage),
    ActionRejected {
        reason: Rejection,
    },
}
