//! # Asset Catalog
//!
//! Immutable blueprints for everything a room file can name: tiles, items,
//! enemies, projectiles and decor. Rooms never share state with the catalog;
//! every instantiation hands out a fresh owned value.

use crate::{
    meta_from, new_entity_id, Attribute, Enemy, Health, ImageRef, InteractionHooks, Item,
    ItemAction, PhysicsBody, Projectile, RenderHook, Tile, TileAction, TileHook, TileVisual,
    TileboundError, TileboundResult,
};
use macroquad::math::{vec2, Vec2};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Catalog id of the "not a tile" placeholder.
pub const PLACEHOLDER_TILE: &str = "NaT";

/// Catalog id of the "not an item" placeholder.
pub const PLACEHOLDER_ITEM: &str = "NaI";

/// Blueprint for spawning an enemy. Sizes are in tile units.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyBlueprint {
    pub kind: String,
    pub size: Vec2,
    pub hitbox: Vec2,
    pub hitbox_on_bottom: bool,
    pub speed: f32,
    pub health: i32,
    pub immunity_frames: u32,
    pub contact_damage: i32,
    /// Chase radius in tiles
    pub sight_range: f32,
    pub knockback: f32,
}

impl EnemyBlueprint {
    /// Creates a new enemy with its sprite's top-left corner at `pos`.
    pub fn spawn(&self, pos: Vec2, tile_size: f32) -> Enemy {
        let body = PhysicsBody::new(pos, self.size * tile_size, self.speed)
            .with_hitbox(self.hitbox * tile_size, self.hitbox_on_bottom);
        Enemy {
            id: new_entity_id(),
            kind: self.kind.clone(),
            body,
            health: Health::new(self.health, self.immunity_frames),
            contact_damage: self.contact_damage,
            sight_range: self.sight_range * tile_size,
            knockback: self.knockback,
            wander: Vec2::ZERO,
            wander_ticks: 0,
        }
    }
}

/// Blueprint for launching a projectile. Size is in tile units.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileBlueprint {
    pub kind: String,
    pub image: ImageRef,
    pub size: Vec2,
    pub speed: f32,
    pub damage: i32,
    pub knockback: f32,
    pub lifetime: u32,
}

impl ProjectileBlueprint {
    /// Creates a projectile centred on `center` flying along `direction`.
    pub fn launch(&self, center: Vec2, direction: Vec2, damage: i32, tile_size: f32) -> Projectile {
        let size = self.size * tile_size;
        Projectile {
            id: new_entity_id(),
            kind: self.kind.clone(),
            image: self.image.clone(),
            pos: center - size / 2.0,
            size,
            direction: direction.normalize_or_zero(),
            speed: self.speed,
            damage,
            knockback: self.knockback,
            lifetime: self.lifetime,
        }
    }
}

/// Registry of blueprints keyed by catalog id.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    tiles: BTreeMap<String, Tile>,
    items: BTreeMap<String, Item>,
    enemies: BTreeMap<String, EnemyBlueprint>,
    projectiles: BTreeMap<String, ProjectileBlueprint>,
    decor: BTreeMap<String, ImageRef>,
}

impl AssetCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with the game.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::AssetCatalog;
    ///
    /// let catalog = AssetCatalog::builtin();
    /// let chest = catalog.tile("chest").unwrap();
    /// assert!(chest.is_interactable());
    /// assert!(catalog.tile("lava").is_err());
    /// ```
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register_builtin_tiles();
        catalog.register_builtin_items();

        catalog.register_enemy(EnemyBlueprint {
            kind: "skeleton".to_string(),
            size: vec2(1.0, 1.0),
            hitbox: vec2(0.75, 0.5),
            hitbox_on_bottom: true,
            speed: 1.0,
            health: 20,
            immunity_frames: 10,
            contact_damage: 10,
            sight_range: 5.0,
            knockback: 1.5,
        });
        catalog.register_projectile(ProjectileBlueprint {
            kind: "arrow".to_string(),
            image: ImageRef::new("entities/arrows/wooden_arrow"),
            size: vec2(0.5, 0.5),
            speed: 5.0,
            damage: 7,
            knockback: 1.0,
            lifetime: 120,
        });

        for (id, image) in [
            ("rug", "decor/rug"),
            ("skull", "decor/skull"),
            ("large-rug", "decor/large_rug"),
            ("bookshelf", "decor/bookshelf"),
            ("cobweb", "decor/cobweb"),
            ("danger", "decor/danger"),
        ] {
            catalog.register_decor(id, ImageRef::new(image));
        }
        catalog
    }

    fn register_builtin_tiles(&mut self) {
        self.register_tile(Tile::new(
            PLACEHOLDER_TILE,
            TileVisual::Single(ImageRef::new("tiles/not_a_tile")),
            false,
        ));
        self.register_tile(Tile::new("wall", variants("tiles/walls", 11), true));
        self.register_tile(Tile::new("floor", variants("tiles/floors", 4), false));
        self.register_tile(
            Tile::new("note-wall", variants("tiles/note_walls", 2), true)
                .with_meta(meta_from(json!({"text": []})))
                .with_hooks(InteractionHooks::interact(TileAction::ShowText)),
        );
        self.register_tile(
            Tile::new("door", variants("tiles/doors", 4), false)
                .with_hooks(InteractionHooks::collide(TileAction::Door)),
        );

        let mut chest = Tile::new("chest", chest_visual(), true)
            .with_meta(meta_from(json!({"item": PLACEHOLDER_ITEM, "amount": 1, "opened": false})))
            .with_hooks(InteractionHooks::interact(TileAction::OpenChest));
        chest.on_update = Some(TileHook::ChestState);
        self.register_tile(chest);

        let mut spikes = Tile::new("spikes", variants("tiles/spikes", 2), false)
            .with_meta(meta_from(json!({
                "tick": 0,
                "cooldown": 60,
                "spike-time": 30,
                "damage": 10,
                "offset": 0,
            })))
            .with_hooks(InteractionHooks::collide(TileAction::SpikeDamage));
        spikes.on_update = Some(TileHook::SpikeCycle);
        self.register_tile(spikes);

        let mut switch = Tile::new(
            "switch",
            TileVisual::Variants(vec![
                ImageRef::new("tiles/switch/off"),
                ImageRef::new("tiles/switch/on"),
            ]),
            true,
        )
        .with_meta(meta_from(json!({"state": false})))
        .with_hooks(InteractionHooks::interact(TileAction::ToggleSwitch));
        switch.on_update = Some(TileHook::SwitchState);
        self.register_tile(switch);

        for (id, image, action) in [
            ("trash-can", "tiles/bins/trash_can", TileAction::DepositTrash),
            ("recycle-bin", "tiles/bins/recycle_bin", TileAction::DepositRecyclable),
        ] {
            let mut bin = Tile::new(id, TileVisual::Single(ImageRef::new(image)), true)
                .with_meta(meta_from(json!({"collected": 0})))
                .with_hooks(InteractionHooks::interact(action));
            bin.on_render = Some(RenderHook::Counter);
            self.register_tile(bin);
        }

        let mut objective = Tile::new("objective-chest", chest_visual(), false)
            .with_meta(meta_from(json!({
                "item": PLACEHOLDER_ITEM,
                "amount": 1,
                "opened": false,
                "revealed": false,
            })))
            .with_hooks(InteractionHooks::interact(TileAction::ClaimObjective));
        objective.on_update = Some(TileHook::ChestState);
        objective.render_override = Some(RenderHook::Concealed);
        self.register_tile(objective);
    }

    fn register_builtin_items(&mut self) {
        self.register_item(Item::new(
            PLACEHOLDER_ITEM,
            "Not an Item",
            1,
            ImageRef::new("items/not_a_item"),
        ));

        let junk: [(&str, &str, u32, &str, Attribute); 5] = [
            ("bucket", "Bucket", 4, "items/bucket", Attribute::Trash),
            ("crushed-can", "Crushed Can", 64, "items/crushed_can", Attribute::Recyclable),
            ("crumbled-paper", "Crumbled Paper", 64, "items/crumpled_paper", Attribute::Recyclable),
            ("paper-cup", "Paper Cup", 64, "items/paper_cup", Attribute::Trash),
            ("rotton-apple", "Rotton Apple", 64, "items/rotton_apple", Attribute::Trash),
        ];
        for (id, name, stack, icon, tag) in junk {
            self.register_item(
                Item::new(id, name, stack, ImageRef::new(icon))
                    .with_interaction(ItemAction::Pickup)
                    .with_attributes([tag]),
            );
        }

        for (id, name, icon, cooldown) in [
            ("wooden-bow", "Wooden Bow", "items/bows/wooden_bow", 100),
            ("emerald-bow", "Emerald Bow", "items/bows/emerald_bow", 20),
        ] {
            self.register_item(
                Item::new(id, name, 1, ImageRef::new(icon))
                    .with_interaction(ItemAction::Pickup)
                    .with_left_click(ItemAction::FireArrow)
                    .with_meta(meta_from(json!({
                        "cooldown": cooldown,
                        "tick": 0,
                        "projectile": "arrow",
                    })))
                    .with_attributes([Attribute::Cooldown]),
            );
        }

        self.register_item(
            Item::new("pink-spoon", "Pink Spoon", 1, ImageRef::new("items/pink_spoon"))
                .with_interaction(ItemAction::Pickup),
        );

        let accessories: [(&str, &str, Vec<Attribute>); 6] = [
            ("heart-sigil", "Heart Sigil (+10 Health)", vec![Attribute::HealthBoost(10)]),
            (
                "anklet-of-the-wind",
                "Anklet of the Wind (+20% Speed)",
                vec![Attribute::SpeedBoost(1.2)],
            ),
            (
                "ninja-gear",
                "Ninja Gear (+3 Immunity Frames)",
                vec![Attribute::IFrameBoost(3)],
            ),
            (
                "armor-plate",
                "Armor Plate (-8% Damage Taken)",
                vec![Attribute::DefenseBoost(0.92)],
            ),
            (
                "steel-gauntlet",
                "Steel Gauntlet (+5% Damage)",
                vec![Attribute::DamageBoost(1.05)],
            ),
            (
                "glass-cannon",
                "Glass Cannon (+60% Damage Taken, +45% Damage)",
                vec![Attribute::DamageBoost(1.45), Attribute::DefenseBoost(1.6)],
            ),
        ];
        for (id, name, attributes) in accessories {
            self.register_item(
                Item::new(id, name, 1, ImageRef::new("items/not_a_item"))
                    .with_interaction(ItemAction::Pickup)
                    .with_attributes(attributes)
                    .with_attributes([Attribute::Accessory]),
            );
        }
    }

    /// Registers a tile blueprint under its id, replacing any previous one.
    pub fn register_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.id.clone(), tile);
    }

    pub fn register_item(&mut self, item: Item) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn register_enemy(&mut self, blueprint: EnemyBlueprint) {
        self.enemies.insert(blueprint.kind.clone(), blueprint);
    }

    pub fn register_projectile(&mut self, blueprint: ProjectileBlueprint) {
        self.projectiles.insert(blueprint.kind.clone(), blueprint);
    }

    pub fn register_decor(&mut self, id: impl Into<String>, image: ImageRef) {
        self.decor.insert(id.into(), image);
    }

    /// A new tile instance built from the blueprint `id`.
    pub fn tile(&self, id: &str) -> TileboundResult<Tile> {
        self.tiles.get(id).cloned().ok_or_else(|| unknown("tile", id))
    }

    /// A new item instance built from the blueprint `id`.
    pub fn item(&self, id: &str) -> TileboundResult<Item> {
        self.items.get(id).cloned().ok_or_else(|| unknown("item", id))
    }

    pub fn enemy(&self, id: &str) -> TileboundResult<&EnemyBlueprint> {
        self.enemies.get(id).ok_or_else(|| unknown("entity", id))
    }

    pub fn projectile(&self, id: &str) -> TileboundResult<&ProjectileBlueprint> {
        self.projectiles.get(id).ok_or_else(|| unknown("projectile", id))
    }

    pub fn decor(&self, id: &str) -> TileboundResult<&ImageRef> {
        self.decor.get(id).ok_or_else(|| unknown("decor", id))
    }

    /// Every image any blueprint can draw, for preloading textures.
    pub fn image_refs(&self) -> BTreeSet<ImageRef> {
        let mut images = BTreeSet::new();
        for tile in self.tiles.values() {
            for variant in 0..tile.visual.variant_count() {
                if let Some(image) = tile.visual.image(variant) {
                    images.insert(image.clone());
                }
            }
        }
        images.extend(self.items.values().map(|item| item.icon.clone()));
        images.extend(self.projectiles.values().map(|p| p.image.clone()));
        images.extend(self.decor.values().cloned());
        let states = [
            "idle", "up", "down", "left", "right", "up-left", "up-right", "down-left",
            "down-right",
        ];
        for kind in self.enemies.keys().map(String::as_str).chain(["player"]) {
            for state in states {
                images.insert(ImageRef::new(format!("entities/{}/{}", kind, state)));
            }
        }
        images
    }
}

fn unknown(kind: &'static str, id: &str) -> TileboundError {
    TileboundError::UnknownAsset {
        kind,
        id: id.to_string(),
    }
}

fn variants(dir: &str, count: usize) -> TileVisual {
    TileVisual::Variants(
        (0..count)
            .map(|i| ImageRef::new(format!("{}/{:02}", dir, i)))
            .collect(),
    )
}

fn chest_visual() -> TileVisual {
    TileVisual::Variants(vec![
        ImageRef::new("tiles/chest/chest"),
        ImageRef::new("tiles/chest/open_chest"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetaExt;

    #[test]
    fn test_instances_do_not_alias_blueprints() {
        let catalog = AssetCatalog::builtin();
        let mut first = catalog.tile("chest").unwrap();
        first.meta.insert("opened".to_string(), json!(true));

        let second = catalog.tile("chest").unwrap();
        assert!(!second.meta.flag("opened"));
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let catalog = AssetCatalog::builtin();
        assert!(matches!(
            catalog.item("golden-spoon"),
            Err(TileboundError::UnknownAsset { kind: "item", .. })
        ));
        assert!(catalog.enemy("dragon").is_err());
        assert!(catalog.decor("skull").is_ok());
    }

    #[test]
    fn test_enemy_spawn_scales_to_tiles() {
        let catalog = AssetCatalog::builtin();
        let a = catalog.enemy("skeleton").unwrap().spawn(vec2(32.0, 16.0), 16.0);
        let b = catalog.enemy("skeleton").unwrap().spawn(vec2(32.0, 16.0), 16.0);
        assert_ne!(a.id, b.id);
        assert_eq!(a.body.size, vec2(16.0, 16.0));
        assert_eq!(a.body.hitbox.size, vec2(12.0, 8.0));
        assert_eq!(a.sight_range, 80.0);
    }

    #[test]
    fn test_projectile_launch_is_centred() {
        let catalog = AssetCatalog::builtin();
        let arrow = catalog
            .projectile("arrow")
            .unwrap()
            .launch(vec2(50.0, 50.0), vec2(0.0, -3.0), 7, 16.0);
        assert_eq!(arrow.center(), vec2(50.0, 50.0));
        assert_eq!(arrow.direction, vec2(0.0, -1.0));
    }

    #[test]
    fn test_builtin_accessories_and_junk() {
        let catalog = AssetCatalog::builtin();
        assert!(catalog.item("glass-cannon").unwrap().is_accessory());
        assert!(catalog.item("paper-cup").unwrap().is_trash());
        assert!(catalog.item("crushed-can").unwrap().is_recyclable());
        assert!(catalog.image_refs().contains(&ImageRef::new("tiles/walls/10")));
    }
}
