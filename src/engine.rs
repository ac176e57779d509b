//! The game-session engine.
//!
//! [`Engine`] is the explicit application state: client registry, the two
//! matchmaking queues, live sessions, the timer driver and the RNG used for
//! first-mover coin flips. It is a plain synchronous state machine; the
//! server actor owns it and feeds it one command at a time, which is what
//! serializes every mutation of a session.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::board::{Board, Cell};
use crate::common::{ClientId, GameMode, Rejection, SessionId};
use crate::config::{EngineConfig, NICKNAME_MAX_CHARS};
use crate::matchmaking::{choose_first_mover, MatchmakingQueue, QueueOutcome};
use crate::powerup::PowerUpRequest;
use crate::protocol::{
    ChatMessage, ClientIntent, GameOverReason, GameResult, ServerEvent,
};
use crate::registry::{ClientRegistry, ClientStatus, Outbox};
use crate::session::{GameSession, Placement, PowerUpOutcome, Volley};
use crate::stats::StatsSnapshot;
use crate::timer::{TimerDriver, TimerEvent, TimerToken};

pub struct Engine<D: TimerDriver> {
    config: EngineConfig,
    registry: ClientRegistry,
    queue: MatchmakingQueue,
    sessions: HashMap<SessionId, GameSession>,
    timers: D,
    rng: SmallRng,
    next_session: u64,
    next_token: u64,
    next_chat_id: u64,
}

impl<D: TimerDriver> Engine<D> {
    pub fn new(config: EngineConfig, timers: D) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let mut seed_rng = rand::rng();
                SmallRng::from_rng(&mut seed_rng)
            }
        };
        Self {
            config,
            registry: ClientRegistry::new(),
            queue: MatchmakingQueue::new(),
            sessions: HashMap::new(),
            timers,
            rng,
            next_session: 0,
            next_token: 0,
            next_chat_id: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &MatchmakingQueue {
        &self.queue
    }

    pub fn timers(&self) -> &D {
        &self.timers
    }

    pub fn session(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &GameSession> {
        self.sessions.values()
    }

    /// The session `client` is seated in, if any.
    pub fn session_of(&self, client: ClientId) -> Option<&GameSession> {
        self.registry
            .get(client)
            .and_then(|c| c.session)
            .and_then(|id| self.sessions.get(&id))
    }

    /// Read-only projection for observers.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::capture(&self.registry, &self.queue, self.sessions.values())
    }

    /// Register a new connection.
    pub fn connect(&mut self, outbox: Outbox) -> ClientId {
        let id = self.registry.register(outbox);
        log::info!("{} connected ({} online)", id, self.registry.len());
        id
    }

    /// Tear down everything `client` took part in and purge it.
    pub fn disconnect(&mut self, client: ClientId) {
        self.queue.remove(client);
        let Some(departed) = self.registry.remove(client) else {
            return;
        };
        log::info!(
            "{} ({}) disconnected ({} online)",
            client,
            departed.nickname,
            self.registry.len()
        );
        let Some(sid) = departed.session else {
            return;
        };
        let opponent = self.sessions.get(&sid).and_then(|s| {
            s.index_of(client)
                .map(|idx| s.players()[GameSession::opponent_of(idx)])
        });
        if let Some(opponent) = opponent {
            self.registry
                .notify(opponent, ServerEvent::OpponentDisconnected);
            self.end_session(sid, opponent, GameOverReason::OpponentDisconnected);
        }
    }

    /// Apply one client intent. Dropped intents change nothing and are
    /// answered with `ActionRejected`.
    pub fn handle(&mut self, client: ClientId, intent: ClientIntent) {
        let result = match intent {
            ClientIntent::SetNickname { nickname } => self.set_nickname(client, &nickname),
            ClientIntent::JoinQueue { mode } => self.join_queue(client, mode),
            ClientIntent::LeaveQueue => self.leave_queue(client),
            ClientIntent::PlaceFleet { rows } => self.place_fleet(client, &rows),
            ClientIntent::Fire { row, col } => self.fire(client, row, col),
            ClientIntent::UsePowerUp(request) => self.use_power_up(client, request),
            ClientIntent::Pause => self.pause(client),
            ClientIntent::Resume => self.resume(client),
            ClientIntent::Forfeit => self.forfeit(client),
            ClientIntent::SendChatMessage { text } => self.chat(client, &text),
        };
        if let Err(reason) = result {
            log::debug!("rejected intent from {}: {}", client, reason);
            self.registry
                .notify(client, ServerEvent::ActionRejected { reason });
        }
    }

    /// Apply one countdown tick. Ticks for removed sessions, stale tokens or
    /// non-active sessions are ignored.
    pub fn on_timer(&mut self, event: TimerEvent) {
        let Some(session) = self.sessions.get_mut(&event.session) else {
            log::debug!("timer tick for vanished {}", event.session);
            return;
        };
        if !session.accept_tick(event.token, event.remaining) {
            log::debug!("stale timer tick {:?} for {}", event.token, event.session);
            return;
        }
        self.broadcast(
            event.session,
            ServerEvent::TimerUpdate {
                seconds: event.remaining,
            },
        );
        if event.remaining == 0 {
            if let Some(session) = self.sessions.get_mut(&event.session) {
                let mover = session.expire_turn();
                log::debug!(
                    "{}: turn timed out, {} to move",
                    event.session,
                    session.players()[mover]
                );
            }
            self.announce_turn(event.session);
            self.restart_timer(event.session);
        }
    }

    fn set_nickname(&mut self, client: ClientId, nickname: &str) -> Result<(), Rejection> {
        let name = nickname.trim();
        if name.is_empty() || name.chars().count() > NICKNAME_MAX_CHARS {
            return Err(Rejection::InvalidNickname);
        }
        let entry = self
            .registry
            .get_mut(client)
            .ok_or(Rejection::SessionUnavailable)?;
        entry.nickname = name.to_string();
        if entry.status == ClientStatus::Connected {
            entry.status = ClientStatus::Lobby;
        }
        log::info!("{} set nickname: {}", client, name);
        self.registry.notify(
            client,
            ServerEvent::NicknameSet {
                nickname: name.to_string(),
                client_id: client,
            },
        );
        Ok(())
    }

    fn join_queue(&mut self, client: ClientId, mode: GameMode) -> Result<(), Rejection> {
        let entry = self
            .registry
            .get(client)
            .ok_or(Rejection::SessionUnavailable)?;
        if entry.nickname.is_empty() {
            return Err(Rejection::NicknameRequired);
        }
        if entry.session.is_some() {
            return Err(Rejection::AlreadyInGame);
        }
        loop {
            match self.queue.enqueue(client, mode) {
                QueueOutcome::Paired(waiting) if self.registry.get(waiting).is_none() => {
                    log::warn!("dropping unregistered {} from {} queue", waiting, mode);
                    continue;
                }
                QueueOutcome::Paired(waiting) => {
                    self.start_session(client, waiting, mode);
                    return Ok(());
                }
                QueueOutcome::Waiting => {
                    if let Some(entry) = self.registry.get_mut(client) {
                        entry.status = ClientStatus::Waiting;
                        entry.queue_mode = Some(mode);
                        log::info!("{} is waiting for a {} opponent", entry.nickname, mode);
                    }
                    self.registry.notify(client, ServerEvent::Waiting { mode });
                    return Ok(());
                }
            }
        }
    }

    fn leave_queue(&mut self, client: ClientId) -> Result<(), Rejection> {
        self.queue.remove(client).ok_or(Rejection::NotQueued)?;
        if let Some(entry) = self.registry.get_mut(client) {
            entry.status = ClientStatus::Lobby;
            entry.queue_mode = None;
        }
        Ok(())
    }

    fn start_session(&mut self, requester: ClientId, waiting: ClientId, mode: GameMode) {
        let first = match (self.registry.get(requester), self.registry.get(waiting)) {
            (Some(a), Some(b)) => choose_first_mover(a, b, mode, &mut self.rng),
            _ => return,
        };
        let second = if first == requester { waiting } else { requester };

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let session = GameSession::new(id, mode, first, second, self.config.turn_seconds);

        let mut players = Vec::with_capacity(2);
        for (index, player) in [first, second].into_iter().enumerate() {
            if let Some(entry) = self.registry.get_mut(player) {
                entry.clear_rematch_hint();
                entry.status = ClientStatus::InGame;
                entry.session = Some(id);
                entry.player_index = Some(index);
                entry.is_ready = false;
                entry.queue_mode = Some(mode);
                players.push(entry.summary());
            }
        }
        self.sessions.insert(id, session);

        log::info!(
            "{} ({}) started: {} vs {}, {} goes first",
            id,
            mode,
            players[0].nickname,
            players[1].nickname,
            players[0].nickname
        );
        self.broadcast(
            id,
            ServerEvent::GameStart {
                game_id: id,
                players,
                first_player: first,
                mode,
                turn_seconds: self.config.turn_seconds,
            },
        );
    }

    /// Locate the session and seat index of `client`.
    fn seat_of(&self, client: ClientId) -> Result<(SessionId, usize), Rejection> {
        let sid = self
            .registry
            .get(client)
            .and_then(|c| c.session)
            .ok_or(Rejection::NotInGame)?;
        let index = self
            .sessions
            .get(&sid)
            .and_then(|s| s.index_of(client))
            .ok_or(Rejection::SessionUnavailable)?;
        Ok((sid, index))
    }

    fn session_mut(&mut self, sid: SessionId) -> Result<&mut GameSession, Rejection> {
        self.sessions
            .get_mut(&sid)
            .ok_or(Rejection::SessionUnavailable)
    }

    fn place_fleet(&mut self, client: ClientId, rows: &[Vec<Cell>]) -> Result<(), Rejection> {
        let (sid, index) = self.seat_of(client)?;
        let board = Board::from_rows(rows).map_err(|e| {
            log::debug!("{} submitted an invalid fleet: {}", client, e);
            Rejection::InvalidFleet
        })?;
        let session = self.session_mut(sid)?;
        let placement = session.place_fleet(index, board)?;
        let opponent = session.players()[GameSession::opponent_of(index)];

        if let Some(entry) = self.registry.get_mut(client) {
            entry.is_ready = true;
            log::info!("{} placed ships in {}", entry.nickname, sid);
        }
        self.registry.notify(opponent, ServerEvent::OpponentReady);

        if placement == Placement::AllReady {
            log::info!("{} is now active", sid);
            self.broadcast(sid, ServerEvent::AllPlayersReady);
            self.announce_turn(sid);
            self.restart_timer(sid);
        }
        Ok(())
    }

    fn fire(&mut self, client: ClientId, row: u8, col: u8) -> Result<(), Rejection> {
        let (sid, index) = self.seat_of(client)?;
        let volley = self.session_mut(sid)?.fire(index, row, col)?;
        self.resolve_volley(sid, index, volley);
        Ok(())
    }

    fn use_power_up(&mut self, client: ClientId, request: PowerUpRequest) -> Result<(), Rejection> {
        let (sid, index) = self.seat_of(client)?;
        let outcome = self.session_mut(sid)?.use_power_up(index, request)?;
        log::info!("{} used {:?} in {}", client, request.kind(), sid);
        match outcome {
            PowerUpOutcome::Scan { row, col, count } => {
                self.registry.notify(
                    client,
                    ServerEvent::ScanResult {
                        row: row as u8,
                        col: col as u8,
                        count: count as u8,
                    },
                );
                self.announce_turn(sid);
                self.restart_timer(sid);
            }
            PowerUpOutcome::Protect => {
                self.announce_turn(sid);
                self.restart_timer(sid);
            }
            PowerUpOutcome::Cannons(volley) => self.resolve_volley(sid, index, volley),
        }
        Ok(())
    }

    /// Report every shot of `volley` to both sides, then either end the game
    /// or hand out the next turn.
    fn resolve_volley(&mut self, sid: SessionId, shooter_index: usize, volley: Volley) {
        let Some(players) = self.sessions.get(&sid).map(|s| *s.players()) else {
            return;
        };
        let shooter = players[shooter_index];
        let defender = players[GameSession::opponent_of(shooter_index)];
        for &(row, col, result) in &volley.shots {
            log::debug!("{}: {} fired at ({},{}): {:?}", sid, shooter, row, col, result);
            let (row, col) = (row as u8, col as u8);
            self.registry.notify(
                shooter,
                ServerEvent::FireResult {
                    row,
                    col,
                    result,
                    is_own_grid: false,
                },
            );
            self.registry.notify(
                defender,
                ServerEvent::FireResult {
                    row,
                    col,
                    result,
                    is_own_grid: true,
                },
            );
        }
        if volley.defeated {
            self.end_session(sid, shooter, GameOverReason::FleetDestroyed);
        } else {
            self.announce_turn(sid);
            self.restart_timer(sid);
        }
    }

    fn pause(&mut self, client: ClientId) -> Result<(), Rejection> {
        let (sid, _) = self.seat_of(client)?;
        self.session_mut(sid)?.pause()?;
        self.stop_timer(sid);
        log::info!("{} paused by {}", sid, client);
        self.broadcast(sid, ServerEvent::GamePaused { by: client });
        Ok(())
    }

    fn resume(&mut self, client: ClientId) -> Result<(), Rejection> {
        let (sid, _) = self.seat_of(client)?;
        let vote = self.session_mut(sid)?.resume(client)?;
        self.broadcast(
            sid,
            ServerEvent::ResumeVoteUpdate {
                resume_ready_ids: vote.ready_ids,
            },
        );
        if vote.resumed {
            log::info!("{} resumed after both players confirmed", sid);
            self.broadcast(sid, ServerEvent::GameResumed { by: client });
            self.restart_timer(sid);
        }
        Ok(())
    }

    fn forfeit(&mut self, client: ClientId) -> Result<(), Rejection> {
        let (sid, index) = self.seat_of(client)?;
        let winner = self
            .sessions
            .get(&sid)
            .map(|s| s.players()[GameSession::opponent_of(index)])
            .ok_or(Rejection::SessionUnavailable)?;
        log::info!("{}: {} resigned", sid, client);
        self.end_session(sid, winner, GameOverReason::Forfeit);
        Ok(())
    }

    fn chat(&mut self, client: ClientId, text: &str) -> Result<(), Rejection> {
        let (sid, _) = self.seat_of(client)?;
        let mode = self
            .sessions
            .get(&sid)
            .map(GameSession::mode)
            .ok_or(Rejection::SessionUnavailable)?;
        if mode != GameMode::Blitz {
            return Err(Rejection::ChatUnavailable);
        }
        let message = text.trim();
        if message.is_empty() || message.chars().count() > self.config.chat_max_chars {
            return Err(Rejection::InvalidChatMessage);
        }
        let player_name = match self.registry.get(client) {
            Some(entry) if !entry.nickname.is_empty() => entry.nickname.clone(),
            _ => "Player".to_string(),
        };
        self.next_chat_id += 1;
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.broadcast(
            sid,
            ServerEvent::ChatMessage(ChatMessage {
                id: self.next_chat_id,
                game_id: sid,
                player_id: client,
                player_name,
                message: message.to_string(),
                timestamp_ms,
            }),
        );
        Ok(())
    }

    /// Declare `winner`, settle scores and rematch hints, and remove the
    /// session. The countdown is cancelled before the record goes away.
    fn end_session(&mut self, sid: SessionId, winner: ClientId, reason: GameOverReason) {
        self.timers.cancel(sid);
        let Some(mut session) = self.sessions.remove(&sid) else {
            return;
        };
        session.finish();
        let mode = session.mode();
        let players = *session.players();
        let loser = if players[0] == winner {
            players[1]
        } else {
            players[0]
        };

        if let Some(entry) = self.registry.get_mut(winner) {
            entry.score += 1;
            *entry.head_to_head.entry(loser).or_insert(0) += 1;
            entry.last_opponent = Some(loser);
            entry.last_winner = Some(winner);
            entry.last_mode = Some(mode);
        }
        if let Some(entry) = self.registry.get_mut(loser) {
            entry.last_opponent = Some(winner);
            entry.last_winner = Some(winner);
            entry.last_mode = Some(mode);
        }

        self.registry.notify(
            winner,
            ServerEvent::GameOver {
                result: GameResult::Win,
                reason,
            },
        );
        self.registry.notify(
            loser,
            ServerEvent::GameOver {
                result: GameResult::Loss,
                reason,
            },
        );
        for player in players {
            if let Some(entry) = self.registry.get_mut(player) {
                entry.return_to_lobby();
            }
        }
        log::info!("{} over ({:?}): {} wins", sid, reason, winner);
    }

    /// Tell the mover it is their turn and the other side that it is not.
    fn announce_turn(&self, sid: SessionId) {
        if let Some(session) = self.sessions.get(&sid) {
            let mover = session.mover();
            let players = session.players();
            self.registry.notify(players[mover], ServerEvent::YourTurn);
            self.registry.notify(
                players[GameSession::opponent_of(mover)],
                ServerEvent::OpponentTurn,
            );
        }
    }

    /// Replace any running countdown of `sid` with a fresh full-length one.
    fn restart_timer(&mut self, sid: SessionId) {
        let seconds = self.config.turn_seconds.max(1);
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        let Some(session) = self.sessions.get_mut(&sid) else {
            return;
        };
        session.arm_timer(token, seconds);
        self.timers.start(sid, token, seconds);
        self.broadcast(sid, ServerEvent::TimerUpdate { seconds });
    }

    fn stop_timer(&mut self, sid: SessionId) {
        if let Some(session) = self.sessions.get_mut(&sid) {
            session.disarm_timer();
        }
        self.timers.cancel(sid);
    }

    fn broadcast(&self, sid: SessionId, event: ServerEvent) {
        if let Some(session) = self.sessions.get(&sid) {
            for &player in session.players() {
                self.registry.notify(player, event.clone());
            }
        }
    }
}
