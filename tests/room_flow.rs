//! End-to-end sessions over real room files: interactions, doors, room
//! completion and persistence across restarts.

use macroquad::math::{vec2, Vec2};
use serde_json::{json, Map, Value};
use std::fs;
use tempfile::TempDir;
use tilebound::{
    DamageTarget, GameConfig, GameEvent, GameState, GridPos, MetaExt, MetaKey, TickInput,
    TileboundResult,
};

/// A save directory holding two rooms joined by door "0".
struct Sandbox {
    dir: TempDir,
    config: GameConfig,
}

impl Sandbox {
    fn new(room_a: Value, room_b: Value) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), room_a.to_string()).unwrap();
        fs::write(dir.path().join("b.json"), room_b.to_string()).unwrap();
        fs::write(
            dir.path().join("rooms.json"),
            json!({
                "0": {"room": "a.json", "doors": {"0": 1}, "meta": {}},
                "1": {"room": "b.json", "doors": {"0": 0}, "meta": {}},
            })
            .to_string(),
        )
        .unwrap();
        let config = GameConfig {
            save_dir: dir.path().to_path_buf(),
            rooms_dir: dir.path().to_path_buf(),
            ..GameConfig::default()
        };
        Self { dir, config }
    }

    fn open(&self) -> TileboundResult<GameState> {
        GameState::open(self.config.clone())
    }

    fn saved(&self) -> Value {
        let text = fs::read_to_string(self.dir.path().join("rooms.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

/// A `w`×`h` room: solid walls on the border, floor inside.
fn walled(w: i32, h: i32) -> Map<String, Value> {
    let mut tiles = Map::new();
    for x in 0..w {
        for y in 0..h {
            let id = if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                "wall"
            } else {
                "floor"
            };
            tiles.insert(format!("{};{}", x, y), json!({"id": id}));
        }
    }
    tiles
}

fn with(mut tiles: Map<String, Value>, key: &str, tile: Value) -> Map<String, Value> {
    tiles.insert(key.to_string(), tile);
    tiles
}

fn press() -> TickInput {
    TickInput {
        interact: true,
        ..TickInput::default()
    }
}

fn walk(direction: Vec2) -> TickInput {
    TickInput {
        movement: direction,
        ..TickInput::default()
    }
}

#[test]
fn test_chest_opens_once() -> TileboundResult<()> {
    let chest = json!({"id": "chest", "meta": {"item": "pink-spoon", "amount": 1}});
    let sandbox = Sandbox::new(json!({"tilemap": with(walled(5, 5), "2;1", chest)}), json!({}));
    let mut state = sandbox.open()?;
    assert_eq!(state.player.body.center(), vec2(40.0, 40.0));

    let events = state.tick(&press());
    assert!(events.contains(&GameEvent::ItemPickedUp {
        item_id: "pink-spoon".to_string(),
        count: 1
    }));
    assert_eq!(state.player.inventory.count_of("pink-spoon"), 1);
    assert_eq!(
        state.world.tilemap.get_tile(GridPos::new(2, 1)).unwrap().variant,
        1
    );

    let events = state.tick(&press());
    assert_eq!(events, vec![GameEvent::info("The chest is empty.")]);
    assert_eq!(state.player.inventory.count_of("pink-spoon"), 1);
    Ok(())
}

#[test]
fn test_walk_up_to_chest_and_open_it() -> TileboundResult<()> {
    let chest = json!({"id": "chest", "meta": {"item": "pink-spoon", "opened": false}});
    let sandbox = Sandbox::new(json!({"tilemap": with(walled(5, 5), "2;2", chest)}), json!({}));
    let mut state = sandbox.open()?;
    state.player.body.set_center(GridPos::new(1, 1).center_pixel(16.0));

    for _ in 0..3 {
        assert!(state.tick(&walk(vec2(1.0, 1.0))).is_empty());
    }
    assert!(state.player.body.collisions.down);
    let rect = state.player.body.rect();
    assert_eq!(rect.y + rect.h, 32.0);

    let events = state.tick(&press());
    assert!(events.contains(&GameEvent::ItemPickedUp {
        item_id: "pink-spoon".to_string(),
        count: 1
    }));
    assert_eq!(state.player.inventory.count_of("pink-spoon"), 1);
    let tile = state.world.tilemap.get_tile(GridPos::new(2, 2)).unwrap();
    assert!(tile.meta.flag("opened"));
    assert_eq!(tile.variant, 1);

    let events = state.tick(&press());
    assert_eq!(events, vec![GameEvent::info("The chest is empty.")]);
    assert_eq!(state.player.inventory.count_of("pink-spoon"), 1);
    Ok(())
}

#[test]
fn test_opened_chest_survives_restart() -> TileboundResult<()> {
    let chest = json!({"id": "chest", "meta": {"item": "pink-spoon"}});
    let sandbox = Sandbox::new(json!({"tilemap": with(walled(5, 5), "2;1", chest)}), json!({}));

    let mut state = sandbox.open()?;
    state.tick(&press());
    state.save()?;
    drop(state);

    assert_eq!(sandbox.saved()["0"]["meta"]["2;1"]["opened"], json!(true));

    let mut state = sandbox.open()?;
    assert!(state
        .world
        .tilemap
        .get_tile(GridPos::new(2, 1))
        .unwrap()
        .meta
        .flag("opened"));
    let events = state.tick(&press());
    assert_eq!(events, vec![GameEvent::info("The chest is empty.")]);
    assert_eq!(state.player.inventory.count_of("pink-spoon"), 0);
    Ok(())
}

#[test]
fn test_walking_through_a_door() -> TileboundResult<()> {
    let door = json!({"id": "door", "meta": {"id": "0"}});
    let sandbox = Sandbox::new(
        json!({"tilemap": with(walled(5, 5), "3;2", door)}),
        json!({"tilemap": walled(7, 5)}),
    );
    let mut state = sandbox.open()?;

    let first = state.tick(&walk(vec2(1.0, 0.0)));
    assert!(first.is_empty());
    let second = state.tick(&walk(vec2(1.0, 0.0)));
    assert_eq!(second, vec![GameEvent::RoomChanged { from: 0, to: 1 }]);

    assert_eq!(state.world.current_room(), 1);
    assert_eq!(state.player.room, 1);
    assert_eq!(state.player.body.center(), vec2(56.0, 40.0));
    assert_eq!(state.player.body.velocity, Vec2::ZERO);
    assert_eq!(state.world.tilemap.name, "b.json");
    Ok(())
}

#[test]
fn test_door_traversal_is_deterministic() -> TileboundResult<()> {
    let run = || -> TileboundResult<Vec<(u32, Vec2)>> {
        let sandbox = Sandbox::new(
            json!({"tilemap": with(walled(5, 5), "3;2", json!({"id": "door", "meta": {"id": "0"}}))}),
            json!({"tilemap": with(walled(5, 5), "1;2", json!({"id": "door", "meta": {"id": "0"}}))}),
        );
        let mut state = sandbox.open()?;
        let mut trace = Vec::new();
        for tick in 0..40 {
            let direction = if tick < 20 { 1.0 } else { -1.0 };
            state.tick(&walk(vec2(direction, 0.0)));
            trace.push((state.world.current_room(), state.player.body.center()));
        }
        Ok(trace)
    };
    let first = run()?;
    assert_eq!(first, run()?);
    assert!(first.iter().any(|(room, _)| *room == 1));
    Ok(())
}

#[test]
fn test_standing_on_spikes_hurts_every_tick() -> TileboundResult<()> {
    let spikes = json!({"id": "spikes", "meta": {"cooldown": 0, "spike-time": 1, "damage": 3}});
    let mut sandbox = Sandbox::new(json!({"tilemap": with(walled(5, 5), "2;2", spikes)}), json!({}));
    sandbox.config.immunity_frames = 0;
    let mut state = sandbox.open()?;

    let mut hits = 0;
    for _ in 0..5 {
        hits += state
            .tick(&TickInput::default())
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    GameEvent::EntityDamaged {
                        target: DamageTarget::Player,
                        amount: 3
                    }
                )
            })
            .count();
    }
    assert_eq!(hits, 5);
    assert_eq!(state.player.health.current, state.player.health.max - 15);
    Ok(())
}

#[test]
fn test_immunity_debounces_spikes() -> TileboundResult<()> {
    let spikes = json!({"id": "spikes", "meta": {"cooldown": 0, "spike-time": 1, "damage": 3}});
    let mut sandbox = Sandbox::new(json!({"tilemap": with(walled(5, 5), "2;2", spikes)}), json!({}));
    sandbox.config.immunity_frames = 4;
    let mut state = sandbox.open()?;

    // Hits land on ticks 1, 5 and 9
    for _ in 0..10 {
        state.tick(&TickInput::default());
    }
    assert_eq!(state.player.health.current, state.player.health.max - 9);
    Ok(())
}

#[test]
fn test_equidistant_chests_resolve_to_lowest_position() -> TileboundResult<()> {
    let chest = |item: &str| json!({"id": "chest", "meta": {"item": item}});
    let tiles = with(walled(5, 5), "1;2", chest("pink-spoon"));
    let tiles = with(tiles, "3;2", chest("bucket"));
    let sandbox = Sandbox::new(json!({"tilemap": tiles}), json!({}));
    let mut state = sandbox.open()?;

    state.tick(&press());
    assert_eq!(state.player.inventory.count_of("pink-spoon"), 1);
    assert_eq!(state.player.inventory.count_of("bucket"), 0);

    let events = state.tick(&press());
    assert_eq!(events, vec![GameEvent::info("The chest is empty.")]);
    assert!(!state
        .world
        .get_meta(&MetaKey::Tile(GridPos::new(3, 2)))
        .is_some_and(|meta| meta.flag("opened")));
    Ok(())
}

#[test]
fn test_clearing_a_room_reveals_the_objective() -> TileboundResult<()> {
    let objective = json!({"id": "objective-chest", "meta": {"item": "heart-sigil"}});
    let sandbox = Sandbox::new(
        json!({
            "tilemap": with(walled(9, 5), "4;1", objective),
            "entities": {"7;3": {"id": "skeleton"}},
        }),
        json!({}),
    );
    let mut state = sandbox.open()?;
    assert!(state
        .world
        .tilemap
        .get_tile(GridPos::new(4, 1))
        .unwrap()
        .is_concealed());
    assert!(state.tick(&press()).is_empty());

    let rect = state.world.tilemap.enemies.iter().next().unwrap().rect();
    state.world.tilemap.enemies.damage_in(&rect, 50, Vec2::ZERO, 0.0);
    let events = state.tick(&TickInput::default());
    assert!(events.contains(&GameEvent::RoomCleared { room: 0 }));

    let events = state.tick(&press());
    assert!(events.contains(&GameEvent::ItemPickedUp {
        item_id: "heart-sigil".to_string(),
        count: 1
    }));
    state.save()?;
    drop(state);

    let saved = sandbox.saved();
    assert_eq!(saved["0"]["meta"]["completed"], json!(true));
    assert_eq!(saved["0"]["meta"]["4;1"]["revealed"], json!(true));
    assert_eq!(saved["0"]["meta"]["4;1"]["opened"], json!(true));

    let state = sandbox.open()?;
    assert!(state.world.tilemap.enemies.is_empty());
    assert!(!state
        .world
        .tilemap
        .get_tile(GridPos::new(4, 1))
        .unwrap()
        .is_concealed());
    Ok(())
}

#[test]
fn test_arrow_flies_hits_and_disappears() -> TileboundResult<()> {
    let sandbox = Sandbox::new(
        json!({
            "tilemap": walled(11, 5),
            "entities": {"8;2": {"id": "skeleton"}},
        }),
        json!({}),
    );
    let mut state = sandbox.open()?;
    let bow = state.world.catalog().item("wooden-bow")?;
    state.player.inventory.add(bow, 1);
    if let Some(stack) = state.player.inventory.selected_stack_mut() {
        stack.item.meta.insert("tick".to_string(), json!(100));
    }
    state.tick(&walk(vec2(1.0, 0.0)));

    let events = state.tick(&TickInput {
        use_item: true,
        ..TickInput::default()
    });
    assert!(events
        .iter()
        .any(|event| matches!(event, GameEvent::ProjectileFired { kind, .. } if kind == "arrow")));
    assert_eq!(state.projectiles.len(), 1);

    let mut hit = None;
    for _ in 0..30 {
        for event in state.tick(&TickInput::default()) {
            if let GameEvent::EntityDamaged {
                target: DamageTarget::Enemy(id),
                amount,
            } = event
            {
                hit = Some((id, amount));
            }
        }
        if hit.is_some() {
            break;
        }
    }
    let (id, amount) = hit.expect("arrow never hit the skeleton");
    assert_eq!(amount, 7);
    assert!(state.projectiles.is_empty());
    assert_eq!(state.world.tilemap.enemies.get(id).unwrap().health.current, 13);
    Ok(())
}

#[test]
fn test_broken_room_file_names_the_room() {
    let sandbox = Sandbox::new(json!({"tilemap": {"0;0": {"id": "lava"}}}), json!({}));
    let err = sandbox.open().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("a.json"), "{}", message);
    assert!(message.contains("lava"), "{}", message);
}
