//! Automated client: queues up, places a random fleet and fires where the
//! probability density says ships most likely are.

use anyhow::{bail, Context};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::ai::Targeting;
use crate::board::Board;
use crate::common::{ClientId, GameMode, Rejection};
use crate::powerup::PowerUpRequest;
use crate::protocol::{ClientIntent, GameResult, Message, ServerEvent, PROTOCOL_VERSION};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub nickname: String,
    pub mode: GameMode,
    /// Number of games to play before returning.
    pub games: u32,
    pub seed: Option<u64>,
}

/// Tally of a finished bot run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotSummary {
    pub client_id: Option<ClientId>,
    pub wins: u32,
    pub losses: u32,
}

impl BotSummary {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }
}

pub struct BotPlayer<T: Transport> {
    transport: T,
    config: BotConfig,
    rng: SmallRng,
}

impl<T: Transport> BotPlayer<T> {
    pub fn new(transport: T, config: BotConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let mut seed_rng = rand::rng();
                SmallRng::from_rng(&mut seed_rng)
            }
        };
        Self {
            transport,
            config,
            rng,
        }
    }

    /// Play the configured number of games. The connection stays open
    /// afterwards until the bot is dropped.
    pub async fn run(&mut self) -> anyhow::Result<BotSummary> {
        let client_id = self.handshake().await?;
        let mut summary = BotSummary {
            client_id: Some(client_id),
            ..BotSummary::default()
        };

        self.send(ClientIntent::SetNickname {
            nickname: self.config.nickname.clone(),
        })
        .await?;
        loop {
            match self.next_event().await? {
                ServerEvent::NicknameSet { .. } => break,
                ServerEvent::ActionRejected { reason } => {
                    bail!("nickname {:?} rejected: {}", self.config.nickname, reason)
                }
                _ => {}
            }
        }

        for game in 1..=self.config.games {
            match self.play_one().await? {
                GameResult::Win => summary.wins += 1,
                GameResult::Loss => summary.losses += 1,
            }
            log::info!(
                "{}: game {} done ({} won, {} lost)",
                self.config.nickname,
                game,
                summary.wins,
                summary.losses
            );
        }
        Ok(summary)
    }

    async fn handshake(&mut self) -> anyhow::Result<ClientId> {
        self.transport
            .send(Message::Handshake {
                version: PROTOCOL_VERSION,
            })
            .await?;
        match self.transport.recv().await.context("waiting for handshake ack")? {
            Message::HandshakeAck { version, client_id } if version == PROTOCOL_VERSION => {
                Ok(client_id)
            }
            other => bail!("unexpected handshake reply: {:?}", other),
        }
    }

    async fn send(&mut self, intent: ClientIntent) -> anyhow::Result<()> {
        self.transport.send(Message::Intent(intent)).await
    }

    async fn next_event(&mut self) -> anyhow::Result<ServerEvent> {
        match self.transport.recv().await? {
            Message::Event(event) => Ok(event),
            other => bail!("expected an event, got {:?}", other),
        }
    }

    async fn play_one(&mut self) -> anyhow::Result<GameResult> {
        self.send(ClientIntent::JoinQueue {
            mode: self.config.mode,
        })
        .await?;
        let mut targeting = Targeting::new();
        let mut mode = self.config.mode;
        let mut cannons_left = false;

        loop {
            match self.next_event().await? {
                ServerEvent::GameStart {
                    game_id, mode: m, ..
                } => {
                    log::debug!("{}: joined {}", self.config.nickname, game_id);
                    mode = m;
                    cannons_left = mode == GameMode::Blitz;
                    let board = Board::random_fleet(&mut self.rng)?;
                    self.send(ClientIntent::PlaceFleet { rows: board.rows() })
                        .await?;
                }
                ServerEvent::YourTurn => {
                    let Some((row, col)) = targeting.next_shot(&mut self.rng) else {
                        continue;
                    };
                    let (row, col) = (row as u8, col as u8);
                    let intent = if cannons_left {
                        cannons_left = false;
                        ClientIntent::UsePowerUp(PowerUpRequest::Cannons { row, col })
                    } else {
                        ClientIntent::Fire { row, col }
                    };
                    self.send(intent).await?;
                }
                ServerEvent::FireResult {
                    row,
                    col,
                    result,
                    is_own_grid: false,
                } => targeting.record(row as usize, col as usize, result),
                ServerEvent::GameOver { result, reason } => {
                    log::debug!("{}: {:?} ({:?})", self.config.nickname, result, reason);
                    return Ok(result);
                }
                ServerEvent::ActionRejected {
                    reason: reason @ (Rejection::NotYourTurn | Rejection::AlreadyResolved),
                } => log::debug!("{}: shot rejected: {}", self.config.nickname, reason),
                ServerEvent::ActionRejected { reason } => {
                    bail!("{}: {} rejected in {} game", self.config.nickname, reason, mode)
                }
                _ => {}
            }
        }
    }
}
