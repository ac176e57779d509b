use crate::ship::ShipType;

pub const BOARD_SIZE: u8 = 10;

/// Seconds a mover has before the turn auto-passes.
pub const DEFAULT_TURN_SECONDS: u32 = 10;

pub const CHAT_MAX_CHARS: usize = 200;
pub const NICKNAME_MAX_CHARS: usize = 32;

/// Upper bound on a single wire frame (1 MiB).
pub const MAX_FRAME_SIZE: u32 = 1 << 20;

pub const NUM_SHIPS: usize = 5;
pub const FLEET: [ShipType; NUM_SHIPS] = [
    ShipType::new("Carrier", 5),
    ShipType::new("Battleship", 4),
    ShipType::new("Cruiser", 3),
    ShipType::new("Submarine", 3),
    ShipType::new("Destroyer", 2),
];

/// Tunables for a running engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Length of every per-turn countdown.
    pub turn_seconds: u32,
    /// Maximum length of a chat message after trimming.
    pub chat_max_chars: usize,
    /// Fixed seed for the first-mover coin flip; random when `None`.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            turn_seconds: DEFAULT_TURN_SECONDS,
            chat_max_chars: CHAT_MAX_CHARS,
            seed: None,
        }
    }
}
