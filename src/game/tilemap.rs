//! # Tilemap
//!
//! The per-room container: the tile grid, decor, world items, tile groups and
//! the room's enemies, plus the spatial queries every entity relies on.
//!
//! A tilemap is always built whole by [`Tilemap::load`]. Switching rooms builds
//! a new one and swaps it in; nothing about the container carries over from
//! the previous room except the durable metadata merged in at load time.

use crate::{
    parse_float_key, rect_center, rects_overlap, AssetCatalog, EnemyManager, GridPos, ImageRef,
    ItemKey, MetaExt, Metadata, RenderTarget, Tile, TileGroup, TileboundError, TileboundResult,
    WorldItem, PLACEHOLDER_TILE,
};
use log::{debug, warn};
use macroquad::math::{vec2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A tile entry in a room file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSpec {
    pub id: Option<String>,
    pub variant: Option<usize>,
    pub meta: Metadata,
}

/// A tile group entry in a room file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    pub meta: Metadata,
    pub tiles: BTreeMap<String, TileSpec>,
}

/// A decor entry: either a bare catalog id or `{ "id": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecorSpec {
    Id(String),
    Entry { id: String },
}

impl DecorSpec {
    pub fn id(&self) -> &str {
        match self {
            DecorSpec::Id(id) | DecorSpec::Entry { id } => id,
        }
    }
}

/// A world item entry in a room file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub id: String,
    #[serde(default)]
    pub meta: Metadata,
}

/// An enemy entry in a room file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub id: String,
}

/// The on-disk description of a room.
///
/// ```json
/// {
///     "tilemap": { "2;2": { "id": "chest", "meta": { "item": "paper-cup" } } },
///     "tile-groups": {},
///     "decor": { "1.5;1": "rug" },
///     "items": { "3;1.5": { "id": "crushed-can" } },
///     "entities": { "3;3": { "id": "skeleton" } },
///     "meta": {}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomDefinition {
    pub tilemap: BTreeMap<String, TileSpec>,
    #[serde(rename = "tile-groups")]
    pub tile_groups: BTreeMap<String, GroupSpec>,
    pub decor: BTreeMap<String, DecorSpec>,
    pub items: BTreeMap<String, ItemSpec>,
    pub entities: BTreeMap<String, EntitySpec>,
    pub meta: Metadata,
}

impl RoomDefinition {
    pub fn from_json(text: &str) -> TileboundResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Non-colliding dressing at a fractional tile position.
#[derive(Debug, Clone, PartialEq)]
pub struct Decor {
    pub id: String,
    /// Position in tile units
    pub pos: Vec2,
    pub image: ImageRef,
}

/// Source of durable metadata merged into a room while it loads.
pub trait MetaProvider {
    fn tile_meta(&self, pos: GridPos) -> Option<&Metadata>;
    fn group_meta(&self, id: &str) -> Option<&Metadata>;
    fn item_meta(&self, key: &ItemKey) -> Option<&Metadata>;
    fn room_flags(&self) -> Option<&Metadata>;
}

/// Result of [`Tilemap::closest_interactable`].
///
/// The derived ordering (tiles before items, then by position or key) is the
/// tie-break between candidates at equal distance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interactable {
    Tile(GridPos),
    Item(ItemKey),
}

/// Tiles, decor, items and enemies of the active room.
#[derive(Debug, Clone)]
pub struct Tilemap {
    /// Room file name this map was loaded from
    pub name: String,
    /// Grid cell edge length in pixels
    pub tile_size: f32,
    /// Maximum occupied tile coordinate per axis
    pub size: GridPos,
    /// Room-level flags from the room file and the save
    pub meta: Metadata,
    pub decor: Vec<Decor>,
    pub enemies: EnemyManager,
    tiles: BTreeMap<GridPos, Tile>,
    items: BTreeMap<ItemKey, WorldItem>,
    tile_groups: BTreeMap<String, TileGroup>,
}

impl Tilemap {
    /// Creates an empty, unnamed tilemap.
    pub fn new(tile_size: f32) -> Self {
        Self {
            name: String::new(),
            tile_size,
            size: GridPos::new(0, 0),
            meta: Metadata::new(),
            decor: Vec::new(),
            enemies: EnemyManager::default(),
            tiles: BTreeMap::new(),
            items: BTreeMap::new(),
            tile_groups: BTreeMap::new(),
        }
    }

    /// Reads and loads a room file.
    pub fn load_file(
        path: &Path,
        catalog: &AssetCatalog,
        persisted: &dyn MetaProvider,
        tile_size: f32,
    ) -> TileboundResult<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let parsed = fs::read_to_string(path)
            .map_err(TileboundError::from)
            .and_then(|text| RoomDefinition::from_json(&text))
            .map_err(|err| err.in_room(name.as_str()))?;
        Self::load(&parsed, &name, catalog, persisted, tile_size)
    }

    /// Builds a tilemap for a room definition.
    ///
    /// Metadata is layered as catalog defaults, then the room file, then the
    /// tile's group, then anything persisted for that position. Rooms flagged
    /// `completed` spawn no enemies and items persisted as `taken` are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::{AssetCatalog, GridPos, RoomDefinition, RoomMeta, Tilemap};
    ///
    /// let def = RoomDefinition::from_json(r#"{
    ///     "tilemap": { "0;0": { "id": "wall" }, "1;0": { "id": "floor" } }
    /// }"#).unwrap();
    /// let map = Tilemap::load(&def, "hall.json", &AssetCatalog::builtin(), &RoomMeta::default(), 16.0)
    ///     .unwrap();
    /// assert!(map.get_tile(GridPos::new(0, 0)).unwrap().solid);
    /// assert_eq!(map.size, GridPos::new(1, 0));
    /// ```
    pub fn load(
        def: &RoomDefinition,
        name: &str,
        catalog: &AssetCatalog,
        persisted: &dyn MetaProvider,
        tile_size: f32,
    ) -> TileboundResult<Self> {
        let mut map = Tilemap::new(tile_size);
        map.name = name.to_string();
        map.populate(def, catalog, persisted)
            .map_err(|err| err.in_room(name))?;
        debug!(
            "Loaded room '{}': {} tiles, {} items, {} enemies",
            name,
            map.tiles.len(),
            map.items.len(),
            map.enemies.len()
        );
        Ok(map)
    }

    fn populate(
        &mut self,
        def: &RoomDefinition,
        catalog: &AssetCatalog,
        persisted: &dyn MetaProvider,
    ) -> TileboundResult<()> {
        for (key, spec) in &def.tilemap {
            let pos: GridPos = key.parse()?;
            let tile = instantiate_tile(catalog, spec, pos, None, persisted)?;
            self.add_tile(pos, tile);
        }

        for (group_id, group_spec) in &def.tile_groups {
            let mut group_meta = group_spec.meta.clone();
            if let Some(saved) = persisted.group_meta(group_id) {
                group_meta.merge(saved);
            }
            let mut group = TileGroup::new(group_id.as_str(), group_meta);
            for (key, spec) in &group_spec.tiles {
                let pos: GridPos = key.parse()?;
                let mut tile = instantiate_tile(catalog, spec, pos, Some(&group), persisted)?;
                tile.group = Some(group_id.clone());
                self.add_tile(pos, tile);
                group.add(pos);
            }
            self.tile_groups.insert(group_id.clone(), group);
        }

        for (key, spec) in &def.decor {
            let pos = parse_float_key(key)?;
            let image = catalog.decor(spec.id())?.clone();
            self.decor.push(Decor {
                id: spec.id().to_string(),
                pos,
                image,
            });
        }

        for (key, spec) in &def.items {
            let pos = parse_float_key(key)?;
            let item_key = ItemKey::from_tile_pos(pos);
            if persisted.item_meta(&item_key).is_some_and(|m| m.flag("taken")) {
                continue;
            }
            let mut item = catalog.item(&spec.id)?;
            item.meta.merge(&spec.meta);
            self.add_item(WorldItem {
                key: item_key,
                pos,
                item,
            });
        }

        self.meta = def.meta.clone();
        if let Some(flags) = persisted.room_flags() {
            self.meta.merge(flags);
        }

        if self.meta.flag("completed") {
            debug!("Room '{}' is completed, not spawning enemies", self.name);
        } else {
            for (key, spec) in &def.entities {
                let pos: GridPos = key.parse()?;
                let blueprint = catalog.enemy(&spec.id)?;
                self.enemies
                    .add(blueprint.spawn(pos.to_pixel(self.tile_size), self.tile_size));
            }
        }
        Ok(())
    }

    /// Exact grid lookup.
    pub fn get_tile(&self, pos: GridPos) -> Option<&Tile> {
        self.tiles.get(&pos)
    }

    pub fn get_tile_mut(&mut self, pos: GridPos) -> Option<&mut Tile> {
        self.tiles.get_mut(&pos)
    }

    /// All tiles in grid order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// The 3×3 neighborhood around the cell containing `pixel`, in
    /// [`NEIGHBOR_OFFSETS`](crate::NEIGHBOR_OFFSETS) order. Empty cells are `None`.
    pub fn get_tiles_around(&self, pixel: Vec2) -> [Option<&Tile>; 9] {
        GridPos::from_pixel(pixel, self.tile_size)
            .neighborhood()
            .map(|pos| self.tiles.get(&pos))
    }

    /// Cell rectangles of the solid tiles around `pixel`.
    pub fn get_solid_rects_around(&self, pixel: Vec2) -> Vec<Rect> {
        self.get_tiles_around(pixel)
            .into_iter()
            .flatten()
            .filter(|tile| tile.solid)
            .map(|tile| tile.rect(self.tile_size))
            .collect()
    }

    fn positions_around(&self, pixel: Vec2, keep: impl Fn(&Tile) -> bool) -> Vec<GridPos> {
        self.get_tiles_around(pixel)
            .into_iter()
            .flatten()
            .filter(|tile| keep(*tile))
            .map(|tile| tile.grid_pos)
            .collect()
    }

    /// Positions of every interactable tile (either channel) around `pixel`.
    pub fn get_interactable_tiles_around(&self, pixel: Vec2) -> Vec<GridPos> {
        self.positions_around(pixel, Tile::is_interactable_tile)
    }

    /// Tiles that respond to the interact control but not to touch.
    pub fn get_interactable_only_tiles_around(&self, pixel: Vec2) -> Vec<GridPos> {
        self.positions_around(pixel, |tile| {
            tile.is_interactable() && !tile.is_collision_interactable()
        })
    }

    /// Tiles that respond to touch but not to the interact control.
    pub fn get_collide_only_tiles_around(&self, pixel: Vec2) -> Vec<GridPos> {
        self.positions_around(pixel, |tile| {
            tile.is_collision_interactable() && !tile.is_interactable()
        })
    }

    /// The nearest thing the interact control would act on from `pixel`.
    ///
    /// Candidates are interactable tiles in the neighborhood, measured to
    /// their centres, and world items with an interaction whose icon overlaps
    /// a tile-sized box centred on `pixel`. Ties go to tiles before items,
    /// then to the lowest `(x, y)` position or item key.
    pub fn closest_interactable(&self, pixel: Vec2) -> Option<Interactable> {
        let ts = self.tile_size;
        let tiles = self
            .get_tiles_around(pixel)
            .into_iter()
            .flatten()
            .filter(|tile| tile.is_interactable())
            .map(|tile| {
                let distance = pixel.distance(tile.grid_pos.center_pixel(ts));
                (distance, Interactable::Tile(tile.grid_pos))
            });

        let reach = Rect::new(pixel.x - ts / 2.0, pixel.y - ts / 2.0, ts, ts);
        let items = self
            .items
            .values()
            .filter(|world_item| world_item.item.interaction.is_some())
            .filter(|world_item| rects_overlap(&world_item.icon_rect(ts), &reach))
            .map(|world_item| {
                let distance = pixel.distance(rect_center(&world_item.icon_rect(ts)));
                (distance, Interactable::Item(world_item.key.clone()))
            });

        tiles
            .chain(items)
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, candidate)| candidate)
    }

    /// Touch-reactive tiles whose cell overlaps `rect`, as a snapshot.
    pub fn collided_tiles(&self, rect: &Rect) -> Vec<GridPos> {
        self.get_tiles_around(rect_center(rect))
            .into_iter()
            .flatten()
            .filter(|tile| tile.collision_action().is_some())
            .filter(|tile| rects_overlap(&tile.rect(self.tile_size), rect))
            .map(|tile| tile.grid_pos)
            .collect()
    }

    /// World items whose icon overlaps `rect`.
    pub fn get_collided_items(&self, rect: &Rect) -> Vec<ItemKey> {
        self.items
            .values()
            .filter(|world_item| rects_overlap(&world_item.icon_rect(self.tile_size), rect))
            .map(|world_item| world_item.key.clone())
            .collect()
    }

    /// Places `tile` at `pos`, replacing and returning any previous tile.
    pub fn add_tile(&mut self, pos: GridPos, mut tile: Tile) -> Option<Tile> {
        tile.grid_pos = pos;
        self.size = GridPos::new(self.size.x.max(pos.x), self.size.y.max(pos.y));
        self.tiles.insert(pos, tile)
    }

    /// Places `tile` at an `"x;y"` key. Non-integer keys are rejected.
    pub fn add_tile_at(&mut self, key: &str, tile: Tile) -> TileboundResult<Option<Tile>> {
        let pos: GridPos = key.parse()?;
        Ok(self.add_tile(pos, tile))
    }

    pub fn add_decor(&mut self, decor: Decor) {
        self.decor.push(decor);
    }

    /// Places a world item, replacing and returning any item with the same key.
    pub fn add_item(&mut self, item: WorldItem) -> Option<WorldItem> {
        self.items.insert(item.key.clone(), item)
    }

    pub fn remove_item(&mut self, key: &ItemKey) -> Option<WorldItem> {
        self.items.remove(key)
    }

    pub fn get_item(&self, key: &ItemKey) -> Option<&WorldItem> {
        self.items.get(key)
    }

    pub fn items(&self) -> impl Iterator<Item = &WorldItem> {
        self.items.values()
    }

    pub fn group(&self, id: &str) -> Option<&TileGroup> {
        self.tile_groups.get(id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut TileGroup> {
        self.tile_groups.get_mut(id)
    }

    /// Pixel centre of the middle cell, where the player enters the room.
    pub fn spawn_point(&self) -> Vec2 {
        GridPos::new(self.size.x / 2, self.size.y / 2).center_pixel(self.tile_size)
    }

    /// Pixel extent of the room.
    pub fn pixel_size(&self) -> Vec2 {
        vec2(
            (self.size.x + 1) as f32 * self.tile_size,
            (self.size.y + 1) as f32 * self.tile_size,
        )
    }

    /// Runs every tile's per-tick hook.
    pub fn update(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.update();
        }
    }

    /// Draws decor, tiles, world items and enemies.
    pub fn render(&self, target: &mut dyn RenderTarget, offset: Vec2) {
        let ts = self.tile_size;
        for decor in &self.decor {
            target.draw_image(&decor.image, decor.pos * ts - offset, vec2(ts, ts));
        }
        for tile in self.tiles.values() {
            tile.render(target, offset, ts);
        }
        for world_item in self.items.values() {
            target.draw_image(&world_item.item.icon, world_item.pos * ts - offset, vec2(ts, ts));
        }
        self.enemies.render(target, offset);
    }
}

fn instantiate_tile(
    catalog: &AssetCatalog,
    spec: &TileSpec,
    pos: GridPos,
    group: Option<&TileGroup>,
    persisted: &dyn MetaProvider,
) -> TileboundResult<Tile> {
    let id = match spec.id.as_deref() {
        Some(id) => id,
        None => {
            warn!("Tile at {} has no id, using placeholder '{}'", pos, PLACEHOLDER_TILE);
            PLACEHOLDER_TILE
        }
    };
    let mut tile = catalog.tile(id)?;
    if let Some(variant) = spec.variant {
        tile.variant = variant;
    }
    tile.meta.merge(&spec.meta);
    if let Some(group) = group {
        tile.meta.merge(&group.meta);
    }
    if let Some(saved) = persisted.tile_meta(pos) {
        tile.meta.merge(saved);
    }
    tile.grid_pos = pos;
    tile.sync_state();
    Ok(tile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{meta_from, RoomMeta, NEIGHBOR_CENTER};
    use proptest::prelude::*;
    use serde_json::json;

    fn load(def: serde_json::Value) -> Tilemap {
        let def: RoomDefinition = serde_json::from_value(def).unwrap();
        Tilemap::load(&def, "test.json", &AssetCatalog::builtin(), &RoomMeta::default(), 16.0)
            .unwrap()
    }

    #[test]
    fn test_load_room_definition() {
        let map = load(json!({
            "tilemap": {
                "0;0": {"id": "wall", "variant": 1},
                "1;0": {"id": "floor"},
                "2;1": {"id": "chest", "meta": {"item": "paper-cup", "opened": true}},
            },
            "tile-groups": {
                "bank": {"meta": {"state": true}, "tiles": {"3;0": {"id": "switch"}}}
            },
            "decor": {"0.5;1.5": "rug"},
            "items": {"1.0;1.50": {"id": "crushed-can"}},
            "entities": {"1;1": {"id": "skeleton"}},
            "meta": {"text": ["hello"]},
        }));

        assert_eq!(map.tile_count(), 4);
        assert_eq!(map.size, GridPos::new(3, 1));
        assert_eq!(map.get_tile(GridPos::new(0, 0)).unwrap().variant, 1);
        assert_eq!(map.get_tile(GridPos::new(2, 1)).unwrap().variant, 1);

        let switch = map.get_tile(GridPos::new(3, 0)).unwrap();
        assert_eq!(switch.group.as_deref(), Some("bank"));
        assert_eq!(switch.variant, 1);
        assert!(map.group("bank").unwrap().contains(GridPos::new(3, 0)));

        assert_eq!(map.decor[0].pos, vec2(0.5, 1.5));
        assert!(map.get_item(&ItemKey::parse("1;1.5").unwrap()).is_some());
        assert_eq!(map.enemies.len(), 1);
        assert_eq!(map.meta.lines("text"), vec!["hello"]);
    }

    #[test]
    fn test_missing_id_uses_placeholder() {
        let map = load(json!({"tilemap": {"0;0": {"variant": 2}}}));
        assert_eq!(map.get_tile(GridPos::new(0, 0)).unwrap().id, PLACEHOLDER_TILE);
    }

    #[test]
    fn test_load_errors_name_the_room() {
        let def = RoomDefinition::from_json(r#"{"tilemap": {"0;0": {"id": "lava"}}}"#).unwrap();
        let err = Tilemap::load(&def, "cave.json", &AssetCatalog::builtin(), &RoomMeta::default(), 16.0)
            .unwrap_err();
        assert!(err.to_string().contains("cave.json"));
        assert!(err.to_string().contains("lava"));

        let def = RoomDefinition::from_json(r#"{"tilemap": {"0.5;0": {"id": "wall"}}}"#).unwrap();
        assert!(Tilemap::load(&def, "cave.json", &AssetCatalog::builtin(), &RoomMeta::default(), 16.0)
            .is_err());
    }

    #[test]
    fn test_persisted_meta_is_merged() {
        let def: RoomDefinition = serde_json::from_value(json!({
            "tilemap": {"2;2": {"id": "chest", "meta": {"item": "bucket"}}},
            "items": {"1;1": {"id": "bucket"}},
            "entities": {"1;2": {"id": "skeleton"}},
        }))
        .unwrap();
        let saved: RoomMeta = serde_json::from_value(json!({
            "2;2": {"opened": true},
            "item:1;1": {"taken": true},
            "completed": true,
        }))
        .unwrap();

        let map = Tilemap::load(&def, "r.json", &AssetCatalog::builtin(), &saved, 16.0).unwrap();
        let chest = map.get_tile(GridPos::new(2, 2)).unwrap();
        assert!(chest.meta.flag("opened"));
        assert_eq!(chest.meta.text("item").as_deref(), Some("bucket"));
        assert_eq!(chest.variant, 1);
        assert_eq!(map.items().count(), 0);
        assert!(map.enemies.is_empty());
    }

    #[test]
    fn test_tiles_around_keeps_positions() {
        let mut map = Tilemap::new(16.0);
        let wall = AssetCatalog::builtin().tile("wall").unwrap();
        map.add_tile(GridPos::new(1, 1), wall.clone());
        map.add_tile(GridPos::new(3, 3), wall);

        let around = map.get_tiles_around(vec2(40.0, 40.0));
        assert_eq!(around.len(), 9);
        assert_eq!(around[0].map(|t| t.grid_pos), Some(GridPos::new(1, 1)));
        assert!(around[NEIGHBOR_CENTER].is_none());
        assert_eq!(around[8].map(|t| t.grid_pos), Some(GridPos::new(3, 3)));

        let rects = map.get_solid_rects_around(vec2(40.0, 40.0));
        assert_eq!(rects, vec![Rect::new(16.0, 16.0, 16.0, 16.0), Rect::new(48.0, 48.0, 16.0, 16.0)]);
    }

    #[test]
    fn test_interaction_views() {
        let map = load(json!({"tilemap": {
            "0;0": {"id": "chest"},
            "1;0": {"id": "spikes"},
            "2;0": {"id": "floor"},
        }}));
        let at = vec2(24.0, 8.0);
        assert_eq!(map.get_interactable_tiles_around(at).len(), 2);
        assert_eq!(map.get_interactable_only_tiles_around(at), vec![GridPos::new(0, 0)]);
        assert_eq!(map.get_collide_only_tiles_around(at), vec![GridPos::new(1, 0)]);
    }

    #[test]
    fn test_closest_interactable_tie_break() {
        let map = load(json!({
            "tilemap": {"1;0": {"id": "chest"}, "1;2": {"id": "chest"}},
            "items": {"1;1": {"id": "bucket"}},
        }));
        // Equidistant chests above and below; the bucket sits right on the query point.
        let center = GridPos::new(1, 1).center_pixel(16.0);
        assert_eq!(
            map.closest_interactable(center),
            Some(Interactable::Item(ItemKey::parse("1;1").unwrap()))
        );

        let map = load(json!({"tilemap": {"1;0": {"id": "chest"}, "1;2": {"id": "chest"}, "0;1": {"id": "chest"}}}));
        for _ in 0..5 {
            assert_eq!(
                map.closest_interactable(center),
                Some(Interactable::Tile(GridPos::new(0, 1)))
            );
        }
    }

    #[test]
    fn test_tile_wins_tie_with_item() {
        let mut map = load(json!({"tilemap": {"0;0": {"id": "chest"}}}));
        let bucket = AssetCatalog::builtin().item("bucket").unwrap();
        map.add_item(WorldItem {
            key: ItemKey::from_tile_pos(vec2(1.0, 0.0)),
            pos: vec2(1.0, 0.0),
            item: bucket,
        });
        let between = vec2(16.0, 8.0);
        assert_eq!(
            map.closest_interactable(between),
            Some(Interactable::Tile(GridPos::new(0, 0)))
        );
    }

    #[test]
    fn test_closest_interactable_none() {
        let map = load(json!({"tilemap": {"0;0": {"id": "wall"}, "1;0": {"id": "door"}}}));
        assert_eq!(map.closest_interactable(vec2(8.0, 8.0)), None);
    }

    #[test]
    fn test_collided_tiles_is_strict() {
        let map = load(json!({"tilemap": {"1;1": {"id": "spikes"}}}));
        assert!(map.collided_tiles(&Rect::new(0.0, 16.0, 16.0, 16.0)).is_empty());
        assert_eq!(
            map.collided_tiles(&Rect::new(1.0, 16.0, 16.0, 16.0)),
            vec![GridPos::new(1, 1)]
        );
    }

    #[test]
    fn test_add_tile_at_rejects_float_keys() {
        let mut map = Tilemap::new(16.0);
        let wall = AssetCatalog::builtin().tile("wall").unwrap();
        assert!(matches!(
            map.add_tile_at("1.5;2", wall.clone()),
            Err(TileboundError::InvalidKey(_))
        ));
        assert!(map.add_tile_at("4;2", wall).unwrap().is_none());
        assert_eq!(map.get_tile(GridPos::new(4, 2)).unwrap().grid_pos, GridPos::new(4, 2));
        assert_eq!(map.spawn_point(), vec2(40.0, 24.0));
    }

    #[test]
    fn test_collided_items() {
        let mut map = Tilemap::new(16.0);
        map.add_item(WorldItem {
            key: ItemKey::from_tile_pos(vec2(2.5, 0.0)),
            pos: vec2(2.5, 0.0),
            item: AssetCatalog::builtin().item("bucket").unwrap(),
        });
        assert_eq!(map.get_collided_items(&Rect::new(30.0, 0.0, 16.0, 16.0)).len(), 1);
        assert!(map.get_collided_items(&Rect::new(0.0, 0.0, 40.0, 16.0)).is_empty());
    }

    #[test]
    fn test_group_meta_reaches_tiles() {
        let map = load(json!({"tile-groups": {
            "gate": {"meta": {"state": true}, "tiles": {"0;0": {"id": "switch"}, "1;0": {"id": "switch"}}}
        }}));
        assert_eq!(map.group("gate").unwrap().len(), 2);
        assert!(map.tiles().all(|tile| tile.meta.flag("state") && tile.variant == 1));
        assert_eq!(map.group("gate").unwrap().meta, meta_from(json!({"state": true})));
    }

    proptest! {
        #[test]
        fn prop_neighborhood_completeness(
            x in -20i32..20,
            y in -20i32..20,
            occupied in proptest::collection::btree_set(0usize..9, 1..9),
        ) {
            let center = GridPos::new(x, y);
            let cells = center.neighborhood();
            let mut map = Tilemap::new(16.0);
            let wall = AssetCatalog::builtin().tile("wall").unwrap();
            for &index in &occupied {
                map.add_tile(cells[index], wall.clone());
            }

            let around = map.get_tiles_around(center.center_pixel(16.0));
            prop_assert_eq!(around.len(), 9);
            for (index, slot) in around.iter().enumerate() {
                match slot {
                    Some(tile) => {
                        prop_assert!(occupied.contains(&index));
                        prop_assert_eq!(tile.grid_pos, cells[index]);
                    }
                    None => prop_assert!(!occupied.contains(&index)),
                }
            }
        }
    }
}
