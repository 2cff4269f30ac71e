//! # Game State Module
//!
//! Central coordination of one play session.
//!
//! [`GameState`] owns the room manager, the player and the projectiles in
//! flight, and advances them one fixed tick at a time. A tick consumes a
//! [`TickInput`] snapshot and returns the [`GameEvent`]s it produced; it never
//! reads devices or draws anything itself.

use crate::config::{START_ROOM, VELOCITY_DECAY};
use crate::{
    check_collisions, interact, update_projectiles, use_selected_item, Actor, AssetCatalog,
    DamageTarget, GameConfig, GameEvent, GameManager, InteractionContext, Player, Projectile,
    RenderTarget, TileboundResult,
};
use log::{debug, info, warn};
use macroquad::math::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Number of lines kept in the message log
pub const MESSAGE_LOG_SIZE: usize = 6;

/// Player input sampled for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Movement direction, each axis in -1..=1
    pub movement: Vec2,
    /// Interact key pressed this tick
    pub interact: bool,
    /// Use the selected item (left click)
    pub use_item: bool,
    /// Item bar slot chosen this tick
    pub select_slot: Option<usize>,
    /// Equip the selected accessory
    pub equip: bool,
    /// Return an equipped accessory to the inventory
    pub unequip: Option<usize>,
}

/// Whether the session is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionState {
    Playing,
    PlayerDied,
}

/// One play session.
#[derive(Debug)]
pub struct GameState {
    pub world: GameManager,
    pub player: Player,
    /// Projectiles in flight in the active room
    pub projectiles: Vec<Projectile>,
    /// Most recent log lines, oldest first
    pub messages: Vec<String>,
    /// Open text box; gameplay is paused while it is shown
    pub text_box: Option<Vec<String>>,
    pub completion: CompletionState,
    pub tick_count: u64,
    rng: StdRng,
    config: GameConfig,
}

impl GameState {
    /// Starts a session in the manager's current room.
    pub fn new(world: GameManager, config: GameConfig) -> Self {
        let mut player = Player::new(&config, world.tilemap.spawn_point());
        player.room = world.current_room();
        Self {
            world,
            player,
            projectiles: Vec::new(),
            messages: Vec::new(),
            text_box: None,
            completion: CompletionState::Playing,
            tick_count: 0,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    /// Opens the save and room files named by `config` with the built-in
    /// asset catalog.
    pub fn open(config: GameConfig) -> TileboundResult<Self> {
        let world = GameManager::open(
            &config.save_dir,
            &config.rooms_dir,
            AssetCatalog::builtin(),
            config.tile_size,
        )?;
        Ok(Self::new(world, config))
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_game_over(&self) -> bool {
        self.completion != CompletionState::Playing
    }

    /// Advances the session by one tick.
    ///
    /// Order within a tick: inventory commands, player movement, passive tile
    /// collisions, the interact key, item use, projectiles, enemies, room
    /// completion, tile hooks and finally the death check.
    pub fn tick(&mut self, input: &TickInput) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.is_game_over() {
            return events;
        }
        if self.text_box.is_some() {
            if input.interact {
                self.text_box = None;
            }
            return events;
        }
        self.tick_count += 1;

        self.apply_inventory_commands(input, &mut events);
        self.player.health.tick();
        self.player.inventory.update();

        self.player.body.step(&self.world.tilemap, input.movement);
        self.player.body.decay_velocity(VELOCITY_DECAY);
        self.player.update_facing();

        let generation = self.world.room_generation();
        let mut spawned = Vec::new();
        {
            let rect = self.player.body.rect();
            let mut ctx = InteractionContext::new(
                &mut self.world,
                Actor::Player(&mut self.player),
                &mut spawned,
                &mut events,
            );
            check_collisions(&mut ctx, &rect);
            if input.interact {
                interact(&mut ctx);
            }
            if input.use_item {
                if let Err(err) = use_selected_item(&mut ctx) {
                    debug!("Item use failed: {}", err);
                }
            }
        }
        if self.world.room_generation() != generation {
            self.projectiles.clear();
        }
        self.projectiles.append(&mut spawned);

        update_projectiles(&mut self.projectiles, &mut self.world, &mut events);
        self.update_enemies(&mut events);

        if self.world.tilemap.enemies.is_cleared() && !self.world.room_completed() {
            match self.world.complete_room() {
                Ok(true) => events.push(GameEvent::RoomCleared {
                    room: self.world.current_room(),
                }),
                Ok(false) => {}
                Err(err) => warn!("Could not mark room {} cleared: {}", self.world.current_room(), err),
            }
        }

        self.world.tilemap.update();

        if self.player.health.is_dead() {
            info!("Player died in room {}", self.world.current_room());
            self.completion = CompletionState::PlayerDied;
            events.push(GameEvent::EntityDied {
                target: DamageTarget::Player,
            });
        }

        self.record(&events);
        events
    }

    fn apply_inventory_commands(&mut self, input: &TickInput, events: &mut Vec<GameEvent>) {
        if let Some(slot) = input.select_slot {
            self.player.inventory.select(slot);
        }
        let mut changed = false;
        if input.equip {
            match self.player.inventory.equip_selected() {
                Ok(()) => changed = true,
                Err(err) => events.push(GameEvent::warning(err.to_string())),
            }
        }
        if let Some(index) = input.unequip {
            match self.player.inventory.unequip(index) {
                Ok(()) => changed = true,
                Err(err) => events.push(GameEvent::warning(err.to_string())),
            }
        }
        if changed {
            self.player.refresh_stats();
        }
    }

    /// Updates the room's enemies with the manager moved out of the tilemap.
    fn update_enemies(&mut self, events: &mut Vec<GameEvent>) {
        let generation = self.world.room_generation();
        let mut enemies = std::mem::take(&mut self.world.tilemap.enemies);
        let mut spawned = Vec::new();
        enemies.update(
            &mut self.world,
            &mut self.player,
            &mut self.rng,
            &mut spawned,
            events,
        );
        if self.world.room_generation() == generation {
            self.world.tilemap.enemies = enemies;
            self.projectiles.append(&mut spawned);
        } else {
            debug!("Room changed during enemy update, dropping old enemies");
            self.projectiles.clear();
        }
    }

    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::TextBox { lines } = event {
                self.text_box = Some(lines.clone());
            }
            if let GameEvent::RoomChanged { to, .. } = event {
                self.player.room = *to;
            }
            if let Some(text) = event.log_text() {
                info!("{}", text);
                self.messages.push(text);
            }
        }
        let excess = self.messages.len().saturating_sub(MESSAGE_LOG_SIZE);
        self.messages.drain(..excess);
    }

    /// Returns the player to the start room at full health.
    pub fn respawn(&mut self) -> TileboundResult<()> {
        self.world.set_room(START_ROOM)?;
        self.player.reset(self.world.tilemap.spawn_point());
        self.projectiles.clear();
        self.text_box = None;
        self.completion = CompletionState::Playing;
        info!("Respawned in room {}", START_ROOM);
        Ok(())
    }

    /// Writes room metadata to disk.
    pub fn save(&mut self) -> TileboundResult<()> {
        self.world.save()
    }

    /// Top-left corner of a view of `view` pixels centred on the player.
    pub fn camera_offset(&self, view: Vec2) -> Vec2 {
        (self.player.body.center() - view / 2.0).round()
    }

    /// Draws the room, its entities and the player.
    pub fn render(&self, target: &mut dyn RenderTarget, offset: Vec2) {
        self.world.tilemap.render(target, offset);
        for projectile in &self.projectiles {
            projectile.render(target, offset);
        }
        self.player.render(target, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetaExt, MetaKey};
    use macroquad::math::vec2;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn session(room_a: serde_json::Value, room_b: serde_json::Value) -> (TempDir, GameState) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), room_a.to_string()).unwrap();
        fs::write(dir.path().join("b.json"), room_b.to_string()).unwrap();
        fs::write(
            dir.path().join("rooms.json"),
            r#"{"0": {"room": "a.json", "doors": {"0": 1}}, "1": {"room": "b.json", "doors": {"0": 0}}}"#,
        )
        .unwrap();
        let config = GameConfig {
            save_dir: dir.path().to_path_buf(),
            rooms_dir: dir.path().to_path_buf(),
            ..GameConfig::default()
        };
        let state = GameState::open(config).unwrap();
        (dir, state)
    }

    fn floor(w: i32, h: i32) -> serde_json::Map<String, serde_json::Value> {
        let mut tiles = serde_json::Map::new();
        for x in 0..w {
            for y in 0..h {
                tiles.insert(format!("{};{}", x, y), json!({"id": "floor"}));
            }
        }
        tiles
    }

    #[test]
    fn test_player_starts_at_room_centre() {
        let (_dir, state) = session(json!({"tilemap": floor(5, 5)}), json!({}));
        assert_eq!(state.player.body.center(), vec2(40.0, 40.0));
        assert_eq!(state.completion, CompletionState::Playing);
    }

    #[test]
    fn test_movement_and_facing() {
        let (_dir, mut state) = session(json!({"tilemap": floor(5, 5)}), json!({}));
        let input = TickInput {
            movement: vec2(1.0, 0.0),
            ..TickInput::default()
        };
        state.tick(&input);
        assert_eq!(state.player.body.center(), vec2(42.0, 40.0));
        state.tick(&TickInput::default());
        assert_eq!(state.player.facing, crate::MoveState::Right);
        assert_eq!(state.tick_count, 2);
    }

    #[test]
    fn test_text_box_pauses_until_closed() {
        let mut tiles = floor(5, 5);
        tiles.insert(
            "2;1".to_string(),
            json!({"id": "note-wall", "meta": {"text": ["Hello"]}}),
        );
        let (_dir, mut state) = session(json!({"tilemap": tiles}), json!({}));
        let press = TickInput {
            interact: true,
            ..TickInput::default()
        };

        let events = state.tick(&press);
        assert!(events.contains(&GameEvent::TextBox {
            lines: vec!["Hello".to_string()]
        }));
        assert_eq!(state.text_box, Some(vec!["Hello".to_string()]));

        let walk = TickInput {
            movement: vec2(1.0, 0.0),
            ..TickInput::default()
        };
        let before = state.player.body.pos;
        state.tick(&walk);
        assert_eq!(state.player.body.pos, before);

        state.tick(&press);
        assert!(state.text_box.is_none());
    }

    #[test]
    fn test_death_and_respawn() {
        let (_dir, mut state) = session(json!({"tilemap": floor(5, 5)}), json!({}));
        state.player.health.current = 0;
        let events = state.tick(&TickInput::default());
        assert!(events.contains(&GameEvent::EntityDied {
            target: DamageTarget::Player
        }));
        assert!(state.is_game_over());
        assert!(state.tick(&TickInput::default()).is_empty());
        assert_eq!(state.messages.last().map(String::as_str), Some("You died!"));

        state.respawn().unwrap();
        assert_eq!(state.completion, CompletionState::Playing);
        assert_eq!(state.player.health.current, state.player.health.max);
    }

    #[test]
    fn test_killing_last_enemy_clears_room_once() {
        let (_dir, mut state) = session(
            json!({"tilemap": floor(5, 5), "entities": {"4;4": {"id": "skeleton"}}}),
            json!({}),
        );
        let enemy = state.world.tilemap.enemies.iter().next().unwrap().rect();
        state
            .world
            .tilemap
            .enemies
            .damage_in(&enemy, 100, Vec2::ZERO, 0.0)
            .unwrap();

        let events = state.tick(&TickInput::default());
        let cleared = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RoomCleared { room: 0 }))
            .count();
        assert_eq!(cleared, 1);
        assert!(state.world.room_completed());
        assert!(state
            .world
            .get_meta(&MetaKey::Room)
            .is_some_and(|meta| meta.flag("completed")));

        let events = state.tick(&TickInput::default());
        assert!(!events.iter().any(|e| matches!(e, GameEvent::RoomCleared { .. })));
    }

    #[test]
    fn test_message_log_is_bounded() {
        let (_dir, mut state) = session(json!({"tilemap": floor(3, 3)}), json!({}));
        let events: Vec<GameEvent> = (0..10).map(|i| GameEvent::info(format!("line {}", i))).collect();
        state.record(&events);
        assert_eq!(state.messages.len(), MESSAGE_LOG_SIZE);
        assert_eq!(state.messages[0], "line 4");
    }
}
