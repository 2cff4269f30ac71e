//! # Game Manager
//!
//! The room graph and the durable metadata store.
//!
//! The save file (`rooms.json`) maps room ids to a room file, a door table and
//! a flat `meta` object. Inside `meta`, integer `"x;y"` keys hold per-tile
//! state, `group:<id>` keys hold tile group state, `item:<x;y>` keys hold world
//! item state and anything else is a room-level flag such as `completed`.

use crate::config::{ROOM_INDEX_FILE, START_ROOM};
use crate::{
    parse_float_key, AssetCatalog, DoorId, GridPos, ItemKey, MetaExt, MetaProvider, Metadata,
    RenderHook, RoomId, Tilemap, TileboundError, TileboundResult,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const GROUP_PREFIX: &str = "group:";
const ITEM_PREFIX: &str = "item:";

/// Durable metadata of one room, split by what it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Metadata", into = "Metadata")]
pub struct RoomMeta {
    pub tiles: BTreeMap<GridPos, Metadata>,
    pub groups: BTreeMap<String, Metadata>,
    pub items: BTreeMap<ItemKey, Metadata>,
    /// Room-level flags, e.g. `completed`
    pub flags: Metadata,
}

impl TryFrom<Metadata> for RoomMeta {
    type Error = TileboundError;

    fn try_from(raw: Metadata) -> Result<Self, Self::Error> {
        let mut meta = RoomMeta::default();
        for (key, value) in raw {
            if let Some(group) = key.strip_prefix(GROUP_PREFIX) {
                meta.groups.insert(group.to_string(), object(&key, value)?);
            } else if let Some(item) = key.strip_prefix(ITEM_PREFIX) {
                meta.items.insert(ItemKey::parse(item)?, object(&key, value)?);
            } else if let Some(pos) = tile_key(&key) {
                meta.tiles.insert(pos, object(&key, value)?);
            } else {
                if parse_float_key(&key).is_ok() {
                    warn!("Metadata key '{}' is not a grid cell, keeping it as a room flag", key);
                } else {
                    debug!("Room flag '{}'", key);
                }
                meta.flags.insert(key, value);
            }
        }
        Ok(meta)
    }
}

/// Grid cell named by a persisted key. Whole-number float keys such as
/// `"1.0;2.0"` name the same cell as `"1;2"`.
fn tile_key(key: &str) -> Option<GridPos> {
    key.parse::<GridPos>().ok().or_else(|| {
        let pos = parse_float_key(key).ok()?;
        let whole = |v: f32| v.fract() == 0.0 && v.abs() <= i32::MAX as f32;
        (whole(pos.x) && whole(pos.y)).then(|| GridPos::new(pos.x as i32, pos.y as i32))
    })
}

impl From<RoomMeta> for Metadata {
    fn from(meta: RoomMeta) -> Self {
        let mut raw = meta.flags;
        for (pos, value) in meta.tiles {
            raw.insert(pos.to_string(), Value::Object(value));
        }
        for (group, value) in meta.groups {
            raw.insert(format!("{}{}", GROUP_PREFIX, group), Value::Object(value));
        }
        for (item, value) in meta.items {
            raw.insert(format!("{}{}", ITEM_PREFIX, item), Value::Object(value));
        }
        raw
    }
}

fn object(key: &str, value: Value) -> TileboundResult<Metadata> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(TileboundError::InvalidState(format!(
            "metadata '{}' must be an object, found {}",
            key, other
        ))),
    }
}

impl MetaProvider for RoomMeta {
    fn tile_meta(&self, pos: GridPos) -> Option<&Metadata> {
        self.tiles.get(&pos)
    }

    fn group_meta(&self, id: &str) -> Option<&Metadata> {
        self.groups.get(id)
    }

    fn item_meta(&self, key: &ItemKey) -> Option<&Metadata> {
        self.items.get(key)
    }

    fn room_flags(&self) -> Option<&Metadata> {
        Some(&self.flags)
    }
}

/// Address of a durable metadata entry within a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaKey {
    Tile(GridPos),
    Group(String),
    Item(ItemKey),
    /// The room-level flags
    Room,
}

impl RoomMeta {
    pub fn get(&self, key: &MetaKey) -> Option<&Metadata> {
        match key {
            MetaKey::Tile(pos) => self.tiles.get(pos),
            MetaKey::Group(id) => self.groups.get(id),
            MetaKey::Item(item) => self.items.get(item),
            MetaKey::Room => Some(&self.flags),
        }
    }

    /// Shallow-merges `patch` into the entry, creating it if needed.
    pub fn merge(&mut self, key: &MetaKey, patch: &Metadata) {
        let entry = match key {
            MetaKey::Tile(pos) => self.tiles.entry(*pos).or_default(),
            MetaKey::Group(id) => self.groups.entry(id.clone()).or_default(),
            MetaKey::Item(item) => self.items.entry(item.clone()).or_default(),
            MetaKey::Room => &mut self.flags,
        };
        entry.merge(patch);
    }
}

/// One room in the save file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Room file name, relative to the rooms directory
    pub room: String,
    #[serde(default)]
    pub doors: BTreeMap<DoorId, RoomId>,
    #[serde(default)]
    pub meta: RoomMeta,
}

/// The rooms and the doors between them.
///
/// Construction checks that the start room exists and that every door leads
/// to a room in the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RoomGraph {
    rooms: BTreeMap<RoomId, RoomRecord>,
}

impl RoomGraph {
    /// Builds and validates a graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::RoomGraph;
    ///
    /// let graph = RoomGraph::from_json(r#"{
    ///     "0": { "room": "hall.json", "doors": { "0": 1 }, "meta": {} },
    ///     "1": { "room": "vault.json", "doors": { "0": 0 }, "meta": {} }
    /// }"#).unwrap();
    /// assert_eq!(graph.destination(0, "0").unwrap(), 1);
    /// assert!(graph.destination(1, "7").is_err());
    ///
    /// assert!(RoomGraph::from_json(r#"{ "0": { "room": "a.json", "doors": { "0": 5 } } }"#).is_err());
    /// ```
    pub fn new(rooms: BTreeMap<RoomId, RoomRecord>) -> TileboundResult<Self> {
        if !rooms.contains_key(&START_ROOM) {
            return Err(TileboundError::UnknownRoom(START_ROOM));
        }
        for (&room, record) in &rooms {
            for (door, &target) in &record.doors {
                if !rooms.contains_key(&target) {
                    return Err(TileboundError::DanglingDoor {
                        room,
                        door: door.clone(),
                        target,
                    });
                }
            }
        }
        Ok(Self { rooms })
    }

    pub fn from_json(text: &str) -> TileboundResult<Self> {
        let rooms: BTreeMap<RoomId, RoomRecord> = serde_json::from_str(text)?;
        Self::new(rooms)
    }

    pub fn load(path: &Path) -> TileboundResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> TileboundResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, room: RoomId) -> TileboundResult<&RoomRecord> {
        self.rooms.get(&room).ok_or(TileboundError::UnknownRoom(room))
    }

    fn get_mut(&mut self, room: RoomId) -> TileboundResult<&mut RoomRecord> {
        self.rooms
            .get_mut(&room)
            .ok_or(TileboundError::UnknownRoom(room))
    }

    /// Where `door` in `room` leads.
    pub fn destination(&self, room: RoomId, door: &str) -> TileboundResult<RoomId> {
        self.get(room)?
            .doors
            .get(door)
            .copied()
            .ok_or_else(|| TileboundError::UnknownDoor {
                room,
                door: door.to_string(),
            })
    }

    pub fn room_ids(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Owns the active room and the durable metadata of every room.
#[derive(Debug)]
pub struct GameManager {
    /// The active room
    pub tilemap: Tilemap,
    graph: RoomGraph,
    catalog: AssetCatalog,
    current: RoomId,
    save_path: PathBuf,
    rooms_dir: PathBuf,
    tile_size: f32,
    generation: u64,
    dirty: bool,
}

impl GameManager {
    /// Opens the save in `save_dir` and loads the start room.
    pub fn open(
        save_dir: &Path,
        rooms_dir: &Path,
        catalog: AssetCatalog,
        tile_size: f32,
    ) -> TileboundResult<Self> {
        let save_path = save_dir.join(ROOM_INDEX_FILE);
        let graph = RoomGraph::load(&save_path)?;
        info!(
            "Opened {} with {} rooms",
            save_path.display(),
            graph.len()
        );
        Self::with_graph(graph, save_path, rooms_dir, catalog, tile_size)
    }

    /// Builds a manager for an existing graph and loads the start room.
    pub fn with_graph(
        graph: RoomGraph,
        save_path: PathBuf,
        rooms_dir: &Path,
        catalog: AssetCatalog,
        tile_size: f32,
    ) -> TileboundResult<Self> {
        let mut manager = Self {
            tilemap: Tilemap::new(tile_size),
            graph,
            catalog,
            current: START_ROOM,
            save_path,
            rooms_dir: rooms_dir.to_path_buf(),
            tile_size,
            generation: 0,
            dirty: false,
        };
        manager.tilemap = manager.build_room(START_ROOM)?;
        Ok(manager)
    }

    fn build_room(&self, room: RoomId) -> TileboundResult<Tilemap> {
        let record = self.graph.get(room)?;
        Tilemap::load_file(
            &self.rooms_dir.join(&record.room),
            &self.catalog,
            &record.meta,
            self.tile_size,
        )
    }

    pub fn current_room(&self) -> RoomId {
        self.current
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn graph(&self) -> &RoomGraph {
        &self.graph
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Incremented on every room swap; lets dispatch loops notice that the
    /// tilemap they were iterating was replaced.
    pub fn room_generation(&self) -> u64 {
        self.generation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Switches directly to `room`.
    ///
    /// The new tilemap is built before anything changes, so a failed load
    /// leaves the current room in place.
    pub fn set_room(&mut self, room: RoomId) -> TileboundResult<()> {
        if let Err(err) = self.flush() {
            warn!("Could not save before leaving room {}: {}", self.current, err);
        }
        let tilemap = self.build_room(room)?;
        info!("Entering room {} ({})", room, tilemap.name);
        self.tilemap = tilemap;
        self.current = room;
        self.generation += 1;
        Ok(())
    }

    /// Takes `door` out of the current room and returns the room entered.
    ///
    /// An unknown door is logged and leaves the player where they are.
    pub fn set_room_from_id(&mut self, door: &str) -> TileboundResult<RoomId> {
        let target = self
            .graph
            .destination(self.current, door)
            .map_err(|err| {
                warn!("{}", err);
                err
            })?;
        self.set_room(target)?;
        Ok(target)
    }

    /// Durable metadata of the current room.
    pub fn get_meta(&self, key: &MetaKey) -> Option<&Metadata> {
        self.graph.get(self.current).ok()?.meta.get(key)
    }

    /// Durable metadata of any room.
    pub fn get_room_meta(&self, room: RoomId, key: &MetaKey) -> Option<&Metadata> {
        self.graph.get(room).ok()?.meta.get(key)
    }

    /// Shallow-merges `patch` into the current room's durable metadata.
    pub fn add_meta(&mut self, key: MetaKey, patch: Metadata) -> TileboundResult<()> {
        let current = self.current;
        self.graph.get_mut(current)?.meta.merge(&key, &patch);
        self.dirty = true;
        debug!("Room {} meta {:?} += {:?}", current, key, patch);
        Ok(())
    }

    /// Whether the current room has been cleared.
    pub fn room_completed(&self) -> bool {
        self.get_meta(&MetaKey::Room)
            .is_some_and(|flags| flags.flag("completed"))
    }

    /// Marks the current room as cleared and reveals its concealed tiles.
    ///
    /// Returns false if the room was already completed.
    pub fn complete_room(&mut self) -> TileboundResult<bool> {
        if self.room_completed() {
            return Ok(false);
        }
        let completed = flag_patch("completed");
        self.tilemap.meta.merge(&completed);
        self.add_meta(MetaKey::Room, completed)?;

        let concealed: Vec<GridPos> = self
            .tilemap
            .tiles()
            .filter(|tile| tile.render_override == Some(RenderHook::Concealed))
            .map(|tile| tile.grid_pos)
            .collect();
        for pos in concealed {
            let revealed = flag_patch("revealed");
            if let Some(tile) = self.tilemap.get_tile_mut(pos) {
                tile.meta.merge(&revealed);
            }
            self.add_meta(MetaKey::Tile(pos), revealed)?;
        }
        info!("Room {} completed", self.current);
        Ok(true)
    }

    /// Writes the whole save file through a temporary file.
    pub fn save(&mut self) -> TileboundResult<()> {
        let json = self.graph.to_json()?;
        if let Some(parent) = self.save_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = self.save_path.with_extension("json.tmp");
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.save_path)?;
        self.dirty = false;
        debug!("Saved {}", self.save_path.display());
        Ok(())
    }

    /// Saves only if something changed since the last save.
    pub fn flush(&mut self) -> TileboundResult<()> {
        if self.dirty {
            self.save()?;
        }
        Ok(())
    }
}

fn flag_patch(key: &str) -> Metadata {
    let mut patch = Metadata::new();
    patch.insert(key.to_string(), Value::Bool(true));
    patch
}
