//! Two independent FIFO queues, one per game mode.

use std::collections::VecDeque;

use rand::Rng;

use crate::common::{ClientId, GameMode};
use crate::registry::Client;

/// Result of asking to be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// The oldest waiting client of the same mode was popped.
    Paired(ClientId),
    /// Nobody was waiting; the requester now is.
    Waiting,
}

#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    classic: VecDeque<ClientId>,
    blitz: VecDeque<ClientId>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_mut(&mut self, mode: GameMode) -> &mut VecDeque<ClientId> {
        match mode {
            GameMode::Classic => &mut self.classic,
            GameMode::Blitz => &mut self.blitz,
        }
    }

    fn queue(&self, mode: GameMode) -> &VecDeque<ClientId> {
        match mode {
            GameMode::Classic => &self.classic,
            GameMode::Blitz => &self.blitz,
        }
    }

    /// Pair `client` with the oldest waiting client of `mode`, or append it.
    ///
    /// Any earlier membership of `client` in either queue is abandoned first,
    /// so a client can never sit in both queues or be paired with itself.
    pub fn enqueue(&mut self, client: ClientId, mode: GameMode) -> QueueOutcome {
        self.remove(client);
        let queue = self.queue_mut(mode);
        match queue.pop_front() {
            Some(waiting) => QueueOutcome::Paired(waiting),
            None => {
                queue.push_back(client);
                QueueOutcome::Waiting
            }
        }
    }

    /// Remove `client` from whichever queue holds it.
    pub fn remove(&mut self, client: ClientId) -> Option<GameMode> {
        for mode in [GameMode::Classic, GameMode::Blitz] {
            let queue = self.queue_mut(mode);
            if let Some(pos) = queue.iter().position(|&id| id == client) {
                queue.remove(pos);
                return Some(mode);
            }
        }
        None
    }

    pub fn mode_of(&self, client: ClientId) -> Option<GameMode> {
        [GameMode::Classic, GameMode::Blitz]
            .into_iter()
            .find(|&mode| self.queue(mode).contains(&client))
    }

    pub fn len(&self, mode: GameMode) -> usize {
        self.queue(mode).len()
    }

    /// Total number of clients waiting across both queues.
    pub fn waiting_count(&self) -> usize {
        self.classic.len() + self.blitz.len()
    }

    /// Waiting clients of `mode`, oldest first.
    pub fn waiting(&self, mode: GameMode) -> impl Iterator<Item = &ClientId> {
        self.queue(mode).iter()
    }
}

/// Pick who moves first in a new `mode` game between `a` and `b`.
///
/// A same-mode rematch of the pair's immediately preceding game lets that
/// game's winner start; anything else is a fair coin flip.
pub fn choose_first_mover<R: Rng + ?Sized>(
    a: &Client,
    b: &Client,
    mode: GameMode,
    rng: &mut R,
) -> ClientId {
    let rematch = a.last_opponent == Some(b.id)
        && b.last_opponent == Some(a.id)
        && a.last_mode == Some(mode)
        && b.last_mode == Some(mode);
    if rematch {
        let winner = a.last_winner.or(b.last_winner);
        if let Some(winner) = winner.filter(|&w| w == a.id || w == b.id) {
            return winner;
        }
    }
    if rng.random_bool(0.5) {
        a.id
    } else {
        b.id
    }
}
