//! # Game Configuration
//!
//! Compile-time defaults plus the runtime [`GameConfig`], which can be read
//! from a JSON settings file and overridden from the command line.

use crate::TileboundResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default grid cell edge length in pixels
pub const DEFAULT_TILE_SIZE: f32 = 16.0;

/// Frames per second target for the game loop
pub const TARGET_FPS: u64 = 60;

/// Movement multiplier applied to the player's frame movement
pub const PLAYER_SPEED: f32 = 2.0;

/// Default player starting health
pub const DEFAULT_PLAYER_HEALTH: i32 = 100;

/// Ticks of damage immunity after the player is hit
pub const DEFAULT_IMMUNITY_FRAMES: u32 = 30;

/// Number of inventory slots
pub const INVENTORY_SLOTS: usize = 20;

/// The first slots of the inventory form the item bar
pub const ITEMBAR_SLOTS: usize = 5;

/// Maximum number of equipped accessories
pub const ACCESSORY_SLOTS: usize = 3;

/// Room the game starts in and respawns to
pub const START_ROOM: u32 = 0;

/// Name of the room index inside the save directory
pub const ROOM_INDEX_FILE: &str = "rooms.json";

/// Per-tick decay applied to residual (knockback) velocity
pub const VELOCITY_DECAY: f32 = 0.8;

/// Runtime configuration for a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Grid cell edge length in pixels
    pub tile_size: f32,
    /// Directory holding `rooms.json`
    pub save_dir: PathBuf,
    /// Directory room files are resolved against
    pub rooms_dir: PathBuf,
    /// Directory textures are loaded from
    pub assets_dir: PathBuf,
    /// Seed for enemy wandering
    pub seed: u64,
    /// Player movement multiplier
    pub player_speed: f32,
    /// Player maximum health
    pub player_health: i32,
    /// Player immunity frames after a hit
    pub immunity_frames: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            save_dir: PathBuf::from("data/save"),
            rooms_dir: PathBuf::from("data/rooms"),
            assets_dir: PathBuf::from("data/images"),
            seed: 42,
            player_speed: PLAYER_SPEED,
            player_health: DEFAULT_PLAYER_HEALTH,
            immunity_frames: DEFAULT_IMMUNITY_FRAMES,
        }
    }
}

impl GameConfig {
    /// Reads a settings file. Missing fields keep their defaults.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tilebound::GameConfig;
    ///
    /// let config = GameConfig::load_from_file("data/settings.json").unwrap();
    /// assert!(config.tile_size > 0.0);
    /// ```
    pub fn load_from_file(path: impl AsRef<Path>) -> TileboundResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Path of the room index file.
    pub fn room_index_path(&self) -> PathBuf {
        self.save_dir.join(ROOM_INDEX_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"tile_size": 32.0}"#).unwrap();
        assert_eq!(config.tile_size, 32.0);
        assert_eq!(config.player_health, DEFAULT_PLAYER_HEALTH);
        assert_eq!(config.room_index_path(), PathBuf::from("data/save/rooms.json"));
    }
}
