//! # Game Module
//!
//! The tile/room runtime: tiles and tile groups, the per-room tilemap, room
//! persistence, physics, interaction dispatch and the entities that use them.
//!
//! This module also holds the small value types shared by all of them: grid
//! positions, movement states, position-key parsing and metadata access.

pub mod catalog;
pub mod enemies;
pub mod entities;
pub mod events;
pub mod interactions;
pub mod items;
pub mod manager;
pub mod physics;
pub mod state;
pub mod tile;
pub mod tilemap;

pub use catalog::*;
pub use enemies::*;
pub use entities::*;
pub use events::*;
pub use interactions::*;
pub use items::*;
pub use manager::*;
pub use physics::*;
pub use state::*;
pub use tile::*;
pub use tilemap::*;

use crate::{TileboundError, TileboundResult};
use macroquad::math::{vec2, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Free-form metadata attached to tiles, tile groups, items and rooms.
pub type Metadata = serde_json::Map<String, Value>;

/// Identifier of a room in the room graph.
pub type RoomId = u32;

/// Door identifier, scoped to the room the door is in.
pub type DoorId = String;

/// Unique identifier for transient combat entities.
pub type EntityId = Uuid;

/// Creates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}

/// Offsets of the 3×3 neighborhood, in the order every neighborhood query
/// reports them: NW, N, NE, W, centre, E, SW, S, SE.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Index of the centre cell inside a neighborhood array.
pub const NEIGHBOR_CENTER: usize = 4;

/// A cell coordinate on the room grid.
///
/// # Examples
///
/// ```
/// use tilebound::GridPos;
/// use macroquad::math::vec2;
///
/// let pos = GridPos::from_pixel(vec2(40.0, 17.0), 16.0);
/// assert_eq!(pos, GridPos::new(2, 1));
/// assert_eq!(pos.to_string(), "2;1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    /// Creates a new grid position.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a pixel position to the cell containing it.
    pub fn from_pixel(pixel: Vec2, tile_size: f32) -> Self {
        Self::new(
            (pixel.x / tile_size).floor() as i32,
            (pixel.y / tile_size).floor() as i32,
        )
    }

    /// Top-left corner of this cell in pixels.
    pub fn to_pixel(self, tile_size: f32) -> Vec2 {
        vec2(self.x as f32 * tile_size, self.y as f32 * tile_size)
    }

    /// Centre of this cell in pixels.
    pub fn center_pixel(self, tile_size: f32) -> Vec2 {
        self.to_pixel(tile_size) + vec2(tile_size / 2.0, tile_size / 2.0)
    }

    /// The 3×3 block around this cell in [`NEIGHBOR_OFFSETS`] order.
    pub fn neighborhood(self) -> [GridPos; 9] {
        NEIGHBOR_OFFSETS.map(|(dx, dy)| GridPos::new(self.x + dx, self.y + dy))
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.x, self.y)
    }
}

impl FromStr for GridPos {
    type Err = TileboundError;

    /// Parses an integer `"x;y"` key. Fractional components are rejected.
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let (x, y) = split_key(key)?;
        let x = x
            .parse::<i32>()
            .map_err(|_| TileboundError::InvalidKey(key.to_string()))?;
        let y = y
            .parse::<i32>()
            .map_err(|_| TileboundError::InvalidKey(key.to_string()))?;
        Ok(GridPos::new(x, y))
    }
}

/// Parses a float-capable `"x.x;y.y"` key into a position in tile units.
pub fn parse_float_key(key: &str) -> TileboundResult<Vec2> {
    let (x, y) = split_key(key)?;
    let x = x
        .parse::<f32>()
        .map_err(|_| TileboundError::InvalidKey(key.to_string()))?;
    let y = y
        .parse::<f32>()
        .map_err(|_| TileboundError::InvalidKey(key.to_string()))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(TileboundError::InvalidKey(key.to_string()));
    }
    Ok(vec2(x, y))
}

fn split_key(key: &str) -> TileboundResult<(&str, &str)> {
    let mut parts = key.split(';');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => Ok((x.trim(), y.trim())),
        _ => Err(TileboundError::InvalidKey(key.to_string())),
    }
}

/// Canonical key of a world item, derived from its position in tile units.
///
/// Keys produced from `"1.0;2.50"` and `"1;2.5"` are identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey(String);

impl ItemKey {
    /// Builds the key for a position in tile units.
    pub fn from_tile_pos(pos: Vec2) -> Self {
        // -0.0 prints as "-0"
        let unsigned_zero = |v: f32| if v == 0.0 { 0.0 } else { v };
        ItemKey(format!("{};{}", unsigned_zero(pos.x), unsigned_zero(pos.y)))
    }

    /// Parses and canonicalizes a room-file item key.
    pub fn parse(key: &str) -> TileboundResult<Self> {
        parse_float_key(key).map(Self::from_tile_pos)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Movement state of a physics entity, derived fresh every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveState {
    #[default]
    Idle,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl MoveState {
    /// Derives the state from the signs of a frame movement.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::MoveState;
    /// use macroquad::math::vec2;
    ///
    /// assert_eq!(MoveState::from_movement(vec2(-3.0, 2.0)), MoveState::DownLeft);
    /// assert_eq!(MoveState::from_movement(vec2(0.0, 0.0)), MoveState::Idle);
    /// ```
    pub fn from_movement(movement: Vec2) -> Self {
        let horizontal = sign(movement.x);
        let vertical = sign(movement.y);
        match (horizontal, vertical) {
            (0, 0) => MoveState::Idle,
            (0, -1) => MoveState::Up,
            (0, 1) => MoveState::Down,
            (-1, 0) => MoveState::Left,
            (1, 0) => MoveState::Right,
            (-1, -1) => MoveState::UpLeft,
            (1, -1) => MoveState::UpRight,
            (-1, 1) => MoveState::DownLeft,
            _ => MoveState::DownRight,
        }
    }

    /// Unit-length direction of this state; zero for idle.
    pub fn direction(self) -> Vec2 {
        let raw = match self {
            MoveState::Idle => Vec2::ZERO,
            MoveState::Up => vec2(0.0, -1.0),
            MoveState::Down => vec2(0.0, 1.0),
            MoveState::Left => vec2(-1.0, 0.0),
            MoveState::Right => vec2(1.0, 0.0),
            MoveState::UpLeft => vec2(-1.0, -1.0),
            MoveState::UpRight => vec2(1.0, -1.0),
            MoveState::DownLeft => vec2(-1.0, 1.0),
            MoveState::DownRight => vec2(1.0, 1.0),
        };
        raw.normalize_or_zero()
    }

    /// Animation key for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            MoveState::Idle => "idle",
            MoveState::Up => "up",
            MoveState::Down => "down",
            MoveState::Left => "left",
            MoveState::Right => "right",
            MoveState::UpLeft => "up-left",
            MoveState::UpRight => "up-right",
            MoveState::DownLeft => "down-left",
            MoveState::DownRight => "down-right",
        }
    }
}

fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Typed access to [`Metadata`] maps.
pub trait MetaExt {
    /// Boolean value, `false` when absent or not a boolean.
    fn flag(&self, key: &str) -> bool;
    /// Integer value; floats are truncated and numeric strings parsed.
    fn int(&self, key: &str) -> Option<i64>;
    /// Float value; numeric strings are parsed.
    fn float(&self, key: &str) -> Option<f64>;
    /// String value; numbers are rendered as text.
    fn text(&self, key: &str) -> Option<String>;
    /// A list of strings, or a single string as one line.
    fn lines(&self, key: &str) -> Vec<String>;
    /// Shallow union with `patch`, last write wins per field.
    fn merge(&mut self, patch: &Metadata);
}

impl MetaExt for Metadata {
    fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn lines(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    fn merge(&mut self, patch: &Metadata) {
        for (key, value) in patch {
            self.insert(key.clone(), value.clone());
        }
    }
}

/// Builds a [`Metadata`] map from a `serde_json::json!` object literal.
///
/// Non-object values produce an empty map.
pub fn meta_from(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}
