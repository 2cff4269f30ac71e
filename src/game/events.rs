//! # Game Events
//!
//! Side effects of a tick that the outer layers (HUD, message log, audio)
//! react to. Behaviors never return values; everything they want the player
//! to see is reported here.

use crate::{EntityId, GridPos, RoomId};
use serde::{Deserialize, Serialize};

/// How prominently a message should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageImportance {
    Info,
    Warning,
    Critical,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A one-line message for the log
    Message {
        text: String,
        importance: MessageImportance,
    },
    /// A closable text box, e.g. from reading a note
    TextBox { lines: Vec<String> },
    /// Items entered the player's inventory
    ItemPickedUp { item_id: String, count: u32 },
    /// Items were deposited into a bin tile
    Deposited {
        tile: GridPos,
        item_id: String,
        count: u32,
    },
    /// The active room changed
    RoomChanged { from: RoomId, to: RoomId },
    /// Every enemy in the room has been defeated
    RoomCleared { room: RoomId },
    /// An entity lost health
    EntityDamaged { target: DamageTarget, amount: i32 },
    /// An entity died
    EntityDied { target: DamageTarget },
    /// The player fired a projectile
    ProjectileFired { id: EntityId, kind: String },
}

/// Which entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageTarget {
    Player,
    Enemy(EntityId),
}

impl GameEvent {
    /// Shorthand for an informational message.
    pub fn info(text: impl Into<String>) -> Self {
        GameEvent::Message {
            text: text.into(),
            importance: MessageImportance::Info,
        }
    }

    /// Shorthand for a warning message.
    pub fn warning(text: impl Into<String>) -> Self {
        GameEvent::Message {
            text: text.into(),
            importance: MessageImportance::Warning,
        }
    }

    /// The text shown in the message log, if this event produces one.
    pub fn log_text(&self) -> Option<String> {
        match self {
            GameEvent::Message { text, .. } => Some(text.clone()),
            GameEvent::ItemPickedUp { item_id, count } => {
                Some(format!("Picked up {} x{}", item_id, count))
            }
            GameEvent::RoomCleared { .. } => Some("The room falls silent.".to_string()),
            GameEvent::EntityDied {
                target: DamageTarget::Player,
            } => Some("You died!".to_string()),
            _ => None,
        }
    }
}
