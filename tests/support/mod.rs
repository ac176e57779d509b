#![allow(dead_code)]

use std::collections::HashMap;

use battleship_arena::{
    Board, Cell, ClientId, ClientIntent, Engine, EngineConfig, GameMode, GameSession,
    ManualTimers, Rejection, ServerEvent, SessionId, BOARD_SIZE,
};
use tokio::sync::mpsc;

pub const N: usize = BOARD_SIZE as usize;

/// Fleet layout with ships on exactly `cells`.
pub fn fleet(cells: &[(usize, usize)]) -> Vec<Vec<Cell>> {
    let mut rows = vec![vec![Cell::Water; N]; N];
    for &(r, c) in cells {
        rows[r][c] = Cell::Ship;
    }
    rows
}

pub fn board(cells: &[(usize, usize)]) -> Board {
    Board::from_rows(&fleet(cells)).unwrap()
}

/// Engine driven by hand: manual timers and one inbox per client.
pub struct Harness {
    pub engine: Engine<ManualTimers>,
    inboxes: HashMap<ClientId, mpsc::UnboundedReceiver<ServerEvent>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig {
            seed: Some(7),
            ..EngineConfig::default()
        })
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(config, ManualTimers::new()),
            inboxes: HashMap::new(),
        }
    }

    /// Connect without a nickname.
    pub fn connect_anonymous(&mut self) -> ClientId {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.engine.connect(tx);
        self.inboxes.insert(id, rx);
        id
    }

    /// Connect and pick a nickname; the confirmation is drained.
    pub fn connect(&mut self, nickname: &str) -> ClientId {
        let id = self.connect_anonymous();
        self.send(
            id,
            ClientIntent::SetNickname {
                nickname: nickname.to_string(),
            },
        );
        self.drain(id);
        id
    }

    pub fn send(&mut self, client: ClientId, intent: ClientIntent) {
        self.engine.handle(client, intent);
    }

    pub fn drain(&mut self, client: ClientId) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        if let Some(rx) = self.inboxes.get_mut(&client) {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }

    pub fn drain_all(&mut self) {
        let ids: Vec<ClientId> = self.inboxes.keys().copied().collect();
        for id in ids {
            self.drain(id);
        }
    }

    /// Rejections `client` received since the last drain.
    pub fn rejections(&mut self, client: ClientId) -> Vec<Rejection> {
        self.drain(client)
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::ActionRejected { reason } => Some(reason),
                _ => None,
            })
            .collect()
    }

    pub fn session(&self, id: SessionId) -> &GameSession {
        self.engine.session(id).unwrap()
    }

    pub fn session_of(&self, client: ClientId) -> &GameSession {
        self.engine.session_of(client).unwrap()
    }

    /// Pair two fresh clients in `mode` and return `(first mover, second, session)`.
    /// No fleets are placed yet.
    pub fn pair(&mut self, mode: GameMode) -> (ClientId, ClientId, SessionId) {
        let a = self.connect("alice");
        let b = self.connect("bob");
        self.send(a, ClientIntent::JoinQueue { mode });
        self.send(b, ClientIntent::JoinQueue { mode });
        let session = self.session_of(a);
        let [first, second] = *session.players();
        let sid = session.id();
        self.drain_all();
        (first, second, sid)
    }

    /// Pair two clients and place fleets so the game is active.
    pub fn start(
        &mut self,
        mode: GameMode,
        first_ships: &[(usize, usize)],
        second_ships: &[(usize, usize)],
    ) -> (ClientId, ClientId, SessionId) {
        let (first, second, sid) = self.pair(mode);
        self.send(first, ClientIntent::PlaceFleet { rows: fleet(first_ships) });
        self.send(second, ClientIntent::PlaceFleet { rows: fleet(second_ships) });
        self.drain_all();
        (first, second, sid)
    }

    pub fn fire(&mut self, client: ClientId, row: u8, col: u8) {
        self.send(client, ClientIntent::Fire { row, col });
    }
}

/// Both test fleets keep plenty of ship cells away from the corners used as
/// "water" targets.
pub const FIRST_SHIPS: &[(usize, usize)] = &[(5, 5), (5, 6), (5, 7)];
pub const SECOND_SHIPS: &[(usize, usize)] = &[(2, 2), (2, 3), (2, 4)];
