//! Per-match state machine.
//!
//! `WaitingForShips → Active ⇄ Paused → Over`. The session owns both boards,
//! the turn order, power-up and protection state, the pause votes and the
//! token of its live countdown. It never talks to clients itself: every
//! operation returns what happened and the engine turns that into
//! notifications.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::common::{ClientId, GameMode, Rejection, SessionId, ShotResult};
use crate::config::BOARD_SIZE;
use crate::pause::{PauseCoordinator, ResumeVote};
use crate::powerup::{self, PowerUp, PowerUpRequest, PowerUpUsage, TurnChange};
use crate::timer::TimerToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    WaitingForShips,
    Active,
    Paused,
    Over,
}

/// Result of submitting a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The opponent has not placed yet.
    Waiting,
    /// Both fleets are down; the session just became active.
    AllReady,
}

/// Resolved shots of one action against the opponent's board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volley {
    pub shots: Vec<(usize, usize, ShotResult)>,
    /// The opponent has no ship cells left.
    pub defeated: bool,
    /// How the turn moved on; `None` once the game is decided.
    pub turn: Option<TurnChange>,
}

/// Result of a power-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerUpOutcome {
    Scan { row: usize, col: usize, count: usize },
    Protect,
    Cannons(Volley),
}

#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    mode: GameMode,
    /// `players[0]` moves first.
    players: [ClientId; 2],
    boards: [Option<Board>; 2],
    mover: usize,
    status: SessionStatus,
    seconds_remaining: u32,
    power_ups: [PowerUpUsage; 2],
    protect_armed: [bool; 2],
    pause: PauseCoordinator,
    timer: Option<TimerToken>,
}

impl GameSession {
    pub fn new(
        id: SessionId,
        mode: GameMode,
        first: ClientId,
        second: ClientId,
        turn_seconds: u32,
    ) -> Self {
        Self {
            id,
            mode,
            players: [first, second],
            boards: [None, None],
            mover: 0,
            status: SessionStatus::WaitingForShips,
            seconds_remaining: turn_seconds,
            power_ups: [PowerUpUsage::default(); 2],
            protect_armed: [false; 2],
            pause: PauseCoordinator::new(),
            timer: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn players(&self) -> &[ClientId; 2] {
        &self.players
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Index of the player whose turn it is.
    pub fn mover(&self) -> usize {
        self.mover
    }

    pub fn current_turn_player_id(&self) -> ClientId {
        self.players[self.mover]
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn power_ups(&self, index: usize) -> PowerUpUsage {
        self.power_ups[index]
    }

    pub fn is_protected(&self, index: usize) -> bool {
        self.protect_armed[index]
    }

    pub fn board(&self, index: usize) -> Option<&Board> {
        self.boards[index].as_ref()
    }

    pub fn resume_votes(&self) -> &[ClientId] {
        self.pause.votes()
    }

    pub fn timer(&self) -> Option<TimerToken> {
        self.timer
    }

    pub fn index_of(&self, client: ClientId) -> Option<usize> {
        self.players.iter().position(|&p| p == client)
    }

    pub fn opponent_of(index: usize) -> usize {
        1 - index
    }

    /// Store `board` as player `index`'s fleet.
    pub fn place_fleet(&mut self, index: usize, board: Board) -> Result<Placement, Rejection> {
        if self.status != SessionStatus::WaitingForShips {
            return Err(Rejection::NotActive);
        }
        if self.boards[index].is_some() {
            return Err(Rejection::AlreadyReady);
        }
        self.boards[index] = Some(board);
        if self.boards.iter().all(Option::is_some) {
            self.status = SessionStatus::Active;
            Ok(Placement::AllReady)
        } else {
            Ok(Placement::Waiting)
        }
    }

    fn ensure_can_act(&self, index: usize) -> Result<(), Rejection> {
        match self.status {
            SessionStatus::Active => {}
            SessionStatus::Paused => return Err(Rejection::GamePaused),
            _ => return Err(Rejection::NotActive),
        }
        if self.mover != index {
            return Err(Rejection::NotYourTurn);
        }
        Ok(())
    }

    fn defender_board(&mut self, index: usize) -> Result<&mut Board, Rejection> {
        self.boards[Self::opponent_of(index)]
            .as_mut()
            .ok_or(Rejection::SessionUnavailable)
    }

    /// Resolve a single shot by player `index` at (row, col).
    pub fn fire(&mut self, index: usize, row: u8, col: u8) -> Result<Volley, Rejection> {
        self.ensure_can_act(index)?;
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(Rejection::OutOfBounds);
        }
        let (r, c) = (row as usize, col as usize);
        let board = self.defender_board(index)?;
        if board.is_resolved(r, c).map_err(|_| Rejection::OutOfBounds)? {
            return Err(Rejection::AlreadyResolved);
        }
        let result = board.fire(r, c).map_err(|_| Rejection::AlreadyResolved)?;
        let defeated = board.is_defeated();
        Ok(self.settle(index, vec![(r, c, result)], defeated))
    }

    /// Apply a blitz power-up for player `index`.
    pub fn use_power_up(
        &mut self,
        index: usize,
        request: PowerUpRequest,
    ) -> Result<PowerUpOutcome, Rejection> {
        if self.mode != GameMode::Blitz {
            return Err(Rejection::NotBlitzMode);
        }
        self.ensure_can_act(index)?;
        let kind = request.kind();
        if self.power_ups[index].is_used(kind) {
            return Err(Rejection::PowerUpSpent);
        }

        let outcome = match request {
            PowerUpRequest::Scan { row, col } => {
                let (row, col) = powerup::clamp_target(row, col);
                let count = self.defender_board(index)?.ships_around(row, col);
                self.mover = Self::opponent_of(index);
                PowerUpOutcome::Scan { row, col, count }
            }
            PowerUpRequest::Protect => {
                self.protect_armed[index] = true;
                self.mover = Self::opponent_of(index);
                PowerUpOutcome::Protect
            }
            PowerUpRequest::Cannons { row, col } => {
                let (row, col) = powerup::clamp_target(row, col);
                let board = self.defender_board(index)?;
                let mut shots = Vec::with_capacity(4);
                for (r, c) in powerup::cannon_cells(row, col) {
                    // already fired here; skip
                    if let Ok(result) = board.fire(r, c) {
                        shots.push((r, c, result));
                    }
                }
                let defeated = board.is_defeated();
                PowerUpOutcome::Cannons(self.settle(index, shots, defeated))
            }
        };
        self.power_ups[index].mark_used(kind);
        Ok(outcome)
    }

    /// Work out the turn after player `index`'s shots have landed.
    fn settle(
        &mut self,
        index: usize,
        shots: Vec<(usize, usize, ShotResult)>,
        defeated: bool,
    ) -> Volley {
        if defeated {
            return Volley {
                shots,
                defeated,
                turn: None,
            };
        }
        let defender = Self::opponent_of(index);
        let turn = powerup::chain_turn(
            self.mode,
            powerup::any_hit(&shots),
            &mut self.protect_armed[defender],
        );
        if turn == TurnChange::Pass {
            self.mover = defender;
        }
        Volley {
            shots,
            defeated,
            turn: Some(turn),
        }
    }

    /// The mover ran out of time: hand the turn over without a shot.
    pub fn expire_turn(&mut self) -> usize {
        self.mover = Self::opponent_of(self.mover);
        self.mover
    }

    pub fn pause(&mut self) -> Result<(), Rejection> {
        self.pause.pause(&mut self.status)
    }

    pub fn resume(&mut self, voter: ClientId) -> Result<ResumeVote, Rejection> {
        self.pause.resume(&mut self.status, voter, &self.players)
    }

    /// Record a freshly started countdown.
    pub fn arm_timer(&mut self, token: TimerToken, seconds: u32) {
        self.timer = Some(token);
        self.seconds_remaining = seconds;
    }

    /// Forget the live countdown; returns whether one was armed.
    pub fn disarm_timer(&mut self) -> bool {
        self.timer.take().is_some()
    }

    /// Accept a tick if it belongs to the live countdown of an active session.
    pub fn accept_tick(&mut self, token: TimerToken, remaining: u32) -> bool {
        if self.status != SessionStatus::Active || self.timer != Some(token) {
            return false;
        }
        self.seconds_remaining = remaining;
        true
    }

    pub fn finish(&mut self) {
        self.status = SessionStatus::Over;
        self.timer = None;
    }

    /// Whether `kind` was already spent by player `index`.
    pub fn has_used(&self, index: usize, kind: PowerUp) -> bool {
        self.power_ups[index].is_used(kind)
    }
}
