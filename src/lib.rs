//! # Tilebound
//!
//! A top-down, tile-based action/adventure game built around persistent rooms.
//!
//! ## Architecture Overview
//!
//! The core of the crate is the tile/room runtime. Everything else consumes it
//! through a handful of narrow interfaces:
//!
//! - **Tiles**: grid cells with visuals, solidity, metadata and optional
//!   interaction hooks drawn from a closed set of behaviors
//! - **Tilemap**: the per-room container of tiles, decor, world items and
//!   enemies, answering the spatial queries every entity relies on
//! - **GameManager**: the room graph plus durable per-tile and per-room
//!   metadata that survives room transitions and restarts
//! - **Physics**: axis-separated collision resolution shared by the player,
//!   enemies and projectiles
//! - **Interactions**: dispatch of active (interact key) and passive (touch)
//!   behaviors with the acting entity as context
//!
//! Rendering, input and the frame loop are thin macroquad adapters around
//! this core.

pub mod config;
pub mod game;
pub mod input;
pub mod rendering;
pub mod scenes;
pub mod utils;

// Core module re-exports
pub use config::GameConfig;
pub use game::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

pub use scenes::{SceneManager, SceneType};

/// Core error type for the Tilebound runtime.
#[derive(thiserror::Error, Debug)]
pub enum TileboundError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A room file could not be loaded
    #[error("Failed to load room '{room}': {source}")]
    RoomLoad {
        room: String,
        #[source]
        source: Box<TileboundError>,
    },

    /// A catalog lookup failed
    #[error("Unknown {kind} asset '{id}'")]
    UnknownAsset { kind: &'static str, id: String },

    /// A position key could not be parsed or is not a grid key
    #[error("Invalid position key '{0}'")]
    InvalidKey(String),

    /// The current room has no door with this id
    #[error("Room {room} has no door '{door}'")]
    UnknownDoor { room: RoomId, door: DoorId },

    /// A door points at a room that does not exist
    #[error("Door '{door}' in room {room} leads to missing room {target}")]
    DanglingDoor {
        room: RoomId,
        door: DoorId,
        target: RoomId,
    },

    /// A room id is not part of the room graph
    #[error("Unknown room {0}")]
    UnknownRoom(RoomId),

    /// A behavior expected metadata that is not present
    #[error("Missing metadata '{key}' on {owner}")]
    MissingMeta { owner: String, key: String },

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

impl TileboundError {
    /// Wraps an error with the name of the room being loaded.
    pub fn in_room(self, room: impl Into<String>) -> Self {
        match self {
            err @ TileboundError::RoomLoad { .. } => err,
            other => TileboundError::RoomLoad {
                room: room.into(),
                source: Box::new(other),
            },
        }
    }
}

/// Result type used throughout the Tilebound codebase.
pub type TileboundResult<T> = Result<T, TileboundError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
