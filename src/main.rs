use battleship_arena::{
    init_logging, serve, spawn_engine, BotConfig, BotPlayer, EngineConfig, GameMode,
    TcpTransport, DEFAULT_TURN_SECONDS,
};

use clap::{Parser, ValueEnum};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Classic,
    Blitz,
}

impl From<Mode> for GameMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Classic => GameMode::Classic,
            Mode::Blitz => GameMode::Blitz,
        }
    }
}

#[derive(Parser)]
enum Commands {
    /// Run the game server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:3001")]
        bind: String,
        #[arg(
            long,
            default_value_t = DEFAULT_TURN_SECONDS,
            value_parser = clap::value_parser!(u32).range(1..),
            help = "Seconds per turn before it passes to the opponent"
        )]
        turn_seconds: u32,
        #[arg(long, help = "Fix RNG seed for reproducible first-mover picks (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
    /// Connect an automated player to a server.
    Bot {
        #[arg(long, default_value = "127.0.0.1:3001")]
        connect: String,
        #[arg(long, value_enum, default_value_t = Mode::Classic)]
        mode: Mode,
        #[arg(long, default_value = "bot")]
        nickname: String,
        #[arg(long, default_value_t = 1)]
        games: u32,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            turn_seconds,
            seed,
        } => {
            let config = EngineConfig {
                turn_seconds,
                seed,
                ..EngineConfig::default()
            };
            let listener = TcpListener::bind(&bind).await?;
            let (engine, _stats, _task) = spawn_engine(config);
            tokio::select! {
                result = serve(listener, engine) => result?,
                _ = tokio::signal::ctrl_c() => log::info!("shutting down"),
            }
        }
        Commands::Bot {
            connect,
            mode,
            nickname,
            games,
            seed,
        } => {
            let transport = TcpTransport::connect(&connect).await?;
            let mut bot = BotPlayer::new(
                transport,
                BotConfig {
                    nickname,
                    mode: mode.into(),
                    games,
                    seed,
                },
            );
            let summary = bot.run().await?;
            println!(
                "Played {} games: {} won, {} lost",
                summary.games_played(),
                summary.wins,
                summary.losses
            );
        }
    }
    Ok(())
}
