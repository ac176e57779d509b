//! Registry of connected clients.
//!
//! The registry is the only owner of client records. Sessions refer to
//! clients by id and reach their connection through [`ClientRegistry::notify`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::common::{ClientId, GameMode, SessionId};
use crate::protocol::{PlayerSummary, ServerEvent};

/// Outbound notification channel of one client.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStatus {
    Connected,
    Lobby,
    Waiting,
    InGame,
}

/// One connected participant.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub nickname: String,
    pub score: u32,
    pub head_to_head: HashMap<ClientId, u32>,
    pub status: ClientStatus,
    pub session: Option<SessionId>,
    pub player_index: Option<usize>,
    pub is_ready: bool,
    /// Rematch hint: opponent of the most recent finished match.
    pub last_opponent: Option<ClientId>,
    /// Rematch hint: winner of the most recent finished match.
    pub last_winner: Option<ClientId>,
    /// Rematch hint: mode of the most recent finished match.
    pub last_mode: Option<GameMode>,
    /// Mode of the queue or game the client is currently in.
    pub queue_mode: Option<GameMode>,
    outbox: Outbox,
}

impl Client {
    fn new(id: ClientId, outbox: Outbox) -> Self {
        Self {
            id,
            nickname: String::new(),
            score: 0,
            head_to_head: HashMap::new(),
            status: ClientStatus::Connected,
            session: None,
            player_index: None,
            is_ready: false,
            last_opponent: None,
            last_winner: None,
            last_mode: None,
            queue_mode: None,
            outbox,
        }
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            nickname: self.nickname.clone(),
            score: self.score,
            head_to_head: self.head_to_head.clone(),
        }
    }

    /// Drop every pointer into a session and go back to the lobby.
    pub fn return_to_lobby(&mut self) {
        self.status = ClientStatus::Lobby;
        self.session = None;
        self.player_index = None;
        self.is_ready = false;
        self.queue_mode = None;
    }

    pub fn clear_rematch_hint(&mut self) {
        self.last_opponent = None;
        self.last_winner = None;
        self.last_mode = None;
    }
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<ClientId, Client>,
    next_id: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected client.
    pub fn register(&mut self, outbox: Outbox) -> ClientId {
        self.next_id += 1;
        let id = ClientId(self.next_id);
        self.clients.insert(id, Client::new(id, outbox));
        id
    }

    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Fire-and-forget delivery; a closed outbox means the connection is
    /// already going away and its disconnect will follow.
    pub fn notify(&self, id: ClientId, event: ServerEvent) {
        if let Some(client) = self.clients.get(&id) {
            if client.outbox.send(event).is_err() {
                log::debug!("{} outbox closed, dropping notification", id);
            }
        }
    }
}
