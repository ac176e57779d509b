pub mod ai;
mod bitboard;
pub mod board;
pub mod bot;
mod common;
pub mod config;
pub mod engine;
mod logging;
pub mod matchmaking;
pub mod pause;
pub mod powerup;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
mod ship;
pub mod stats;
pub mod timer;
pub mod transport;

pub use ai::Targeting;
pub use bitboard::{BitBoard, BitBoardError};
pub use board::{Board, Cell};
pub use bot::{BotConfig, BotPlayer, BotSummary};
pub use common::*;
pub use config::*;
pub use engine::Engine;
pub use logging::{init_logging, parse_level};
pub use matchmaking::{MatchmakingQueue, QueueOutcome};
pub use pause::{PauseCoordinator, ResumeVote};
pub use powerup::{PowerUp, PowerUpRequest, PowerUpUsage, TurnChange};
pub use protocol::*;
pub use registry::{Client, ClientRegistry, ClientStatus, Outbox};
pub use server::{serve, serve_client, spawn_engine, EngineHandle};
pub use session::{GameSession, Placement, PowerUpOutcome, SessionStatus, Volley};
pub use ship::{Orientation, ShipType};
pub use stats::{StatsBroadcaster, StatsSnapshot};
pub use timer::{ManualTimers, TimerDriver, TimerEvent, TimerToken, TokioTimers};
pub use transport::tcp::TcpTransport;
pub use transport::Transport;
