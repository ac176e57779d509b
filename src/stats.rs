//! Read-only projections of engine state for observers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::common::{ClientId, GameMode, SessionId};
use crate::matchmaking::MatchmakingQueue;
use crate::registry::{ClientRegistry, ClientStatus};
use crate::session::{GameSession, SessionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: ClientId,
    pub nickname: String,
    pub score: u32,
    pub head_to_head: HashMap<ClientId, u32>,
    pub status: ClientStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: SessionId,
    pub mode: GameMode,
    pub status: SessionStatus,
    pub players: [ClientId; 2],
    pub current_turn: ClientId,
    pub seconds_remaining: u32,
}

/// Everything an observer may see, sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub client_count: usize,
    pub connected_clients: Vec<ClientSummary>,
    pub active_game_count: usize,
    pub waiting_count: usize,
    pub games: Vec<GameSummary>,
}

impl StatsSnapshot {
    pub fn capture<'a>(
        registry: &ClientRegistry,
        queue: &MatchmakingQueue,
        sessions: impl Iterator<Item = &'a GameSession>,
    ) -> Self {
        let mut connected_clients: Vec<ClientSummary> = registry
            .iter()
            .map(|c| ClientSummary {
                id: c.id,
                nickname: c.nickname.clone(),
                score: c.score,
                head_to_head: c.head_to_head.clone(),
                status: c.status,
            })
            .collect();
        connected_clients.sort_by_key(|c| c.id);

        let mut games: Vec<GameSummary> = sessions
            .map(|s| GameSummary {
                id: s.id(),
                mode: s.mode(),
                status: s.status(),
                players: *s.players(),
                current_turn: s.current_turn_player_id(),
                seconds_remaining: s.seconds_remaining(),
            })
            .collect();
        games.sort_by_key(|g| g.id);

        Self {
            client_count: connected_clients.len(),
            connected_clients,
            active_game_count: games.len(),
            waiting_count: queue.waiting_count(),
            games,
        }
    }
}

/// Publishes snapshots to any number of observers, skipping unchanged ones.
#[derive(Debug)]
pub struct StatsBroadcaster {
    tx: watch::Sender<StatsSnapshot>,
}

impl StatsBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(StatsSnapshot::default());
        Self { tx }
    }

    /// Returns true when the snapshot differed from the last published one.
    pub fn publish(&self, snapshot: StatsSnapshot) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<StatsSnapshot> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> StatsSnapshot {
        self.tx.borrow().clone()
    }
}

impl Default for StatsBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
