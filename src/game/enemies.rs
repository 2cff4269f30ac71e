//! # Enemy Manager and Projectiles
//!
//! Per-tick updates of the transient combat entities. Enemies live in the
//! active room's [`Tilemap`](crate::Tilemap); projectiles live in the game
//! state and are dropped whenever the room changes.

use crate::config::VELOCITY_DECAY;
use crate::{
    check_collisions, direction_to, rects_overlap, Actor, DamageTarget, Enemy, EntityId,
    GameEvent, GameManager, InteractionContext, Player, Projectile, RenderTarget,
};
use log::debug;
use macroquad::math::{vec2, Rect, Vec2};
use rand::rngs::StdRng;
use rand::Rng;

/// Idle directions an enemy may wander in, including standing still.
const WANDER_DIRECTIONS: [(f32, f32); 5] = [(0.0, 0.0), (1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];

/// Ticks an enemy holds still after landing a contact hit.
const CONTACT_RECOVERY_TICKS: u32 = 20;

/// Live enemies of a room, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EnemyManager {
    enemies: Vec<Enemy>,
    /// Number of enemies ever added; a room with none never counts as cleared
    spawned: usize,
}

impl EnemyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, enemy: Enemy) {
        self.enemies.push(enemy);
        self.spawned += 1;
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    pub fn get(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    /// Whether enemies were spawned here and all of them are gone.
    pub fn is_cleared(&self) -> bool {
        self.spawned > 0 && self.enemies.is_empty()
    }

    /// Removes dead enemies, returning their ids in insertion order.
    pub fn remove_dead(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.is_dead())
            .map(|enemy| enemy.id)
            .collect();
        self.enemies.retain(|enemy| !enemy.is_dead());
        dead
    }

    /// Damages the first enemy (in insertion order) whose hitbox overlaps
    /// `rect` and knocks it away from `source`.
    ///
    /// Returns the enemy hit and the damage dealt; an immune enemy still
    /// counts as hit with zero damage.
    pub fn damage_in(
        &mut self,
        rect: &Rect,
        damage: i32,
        source: Vec2,
        knockback: f32,
    ) -> Option<(EntityId, i32)> {
        let enemy = self.enemies.iter_mut().find(|enemy| enemy.touches(rect))?;
        let dealt = enemy.health.damage(damage).unwrap_or(0);
        if dealt > 0 {
            enemy.body.knock_back(source, knockback);
        }
        Some((enemy.id, dealt))
    }

    /// Moves every enemy, runs their tile collisions and contact damage, then
    /// removes the dead.
    ///
    /// Call with the manager taken out of the tilemap. If a collision behavior
    /// swaps the room, the loop stops and the caller should discard this
    /// manager.
    pub fn update(
        &mut self,
        world: &mut GameManager,
        player: &mut Player,
        rng: &mut StdRng,
        spawned: &mut Vec<Projectile>,
        events: &mut Vec<GameEvent>,
    ) {
        let generation = world.room_generation();
        let target = player.body.center();

        for enemy in &mut self.enemies {
            enemy.health.tick();
            let input = steer(enemy, target, rng);
            enemy.body.step(&world.tilemap, input);
            enemy.body.decay_velocity(VELOCITY_DECAY);

            let rect = enemy.body.rect();
            let mut ctx = InteractionContext::new(world, Actor::Enemy(&mut *enemy), spawned, events);
            check_collisions(&mut ctx, &rect);
            if world.room_generation() != generation {
                debug!("Room changed while updating enemies");
                return;
            }

            if rects_overlap(&enemy.body.rect(), &player.body.rect()) {
                if let Some(dealt) = player.take_damage(enemy.contact_damage) {
                    player.body.knock_back(enemy.body.center(), enemy.knockback);
                    enemy.body.stun(CONTACT_RECOVERY_TICKS);
                    events.push(GameEvent::EntityDamaged {
                        target: DamageTarget::Player,
                        amount: dealt,
                    });
                }
            }
        }

        for id in self.remove_dead() {
            events.push(GameEvent::EntityDied {
                target: DamageTarget::Enemy(id),
            });
        }
    }

    pub fn render(&self, target: &mut dyn RenderTarget, offset: Vec2) {
        for enemy in &self.enemies {
            enemy.render(target, offset);
        }
    }
}

/// Chases the target within sight range, otherwise wanders.
fn steer(enemy: &mut Enemy, target: Vec2, rng: &mut StdRng) -> Vec2 {
    let center = enemy.body.center();
    if center.distance(target) <= enemy.sight_range {
        enemy.wander_ticks = 0;
        return direction_to(center, target);
    }
    if enemy.wander_ticks == 0 {
        let (x, y) = WANDER_DIRECTIONS[rng.gen_range(0..WANDER_DIRECTIONS.len())];
        enemy.wander = vec2(x, y);
        enemy.wander_ticks = rng.gen_range(30..90);
    }
    enemy.wander_ticks -= 1;
    enemy.wander * 0.5
}

/// Advances projectiles and resolves what they hit.
///
/// A projectile disappears when its lifetime runs out, when it overlaps a
/// solid tile, or after hitting the first enemy in its path.
pub fn update_projectiles(
    projectiles: &mut Vec<Projectile>,
    world: &mut GameManager,
    events: &mut Vec<GameEvent>,
) {
    let tilemap = &mut world.tilemap;
    projectiles.retain_mut(|projectile| {
        projectile.advance();
        if projectile.expired() {
            return false;
        }
        let rect = projectile.rect();
        if tilemap
            .get_solid_rects_around(projectile.center())
            .iter()
            .any(|solid| rects_overlap(solid, &rect))
        {
            return false;
        }
        let source = projectile.center() - projectile.direction;
        match tilemap
            .enemies
            .damage_in(&rect, projectile.damage, source, projectile.knockback)
        {
            Some((id, amount)) => {
                if amount > 0 {
                    events.push(GameEvent::EntityDamaged {
                        target: DamageTarget::Enemy(id),
                        amount,
                    });
                }
                false
            }
            None => true,
        }
    });

    for id in tilemap.enemies.remove_dead() {
        events.push(GameEvent::EntityDied {
            target: DamageTarget::Enemy(id),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetCatalog, GameConfig, GridPos, RoomGraph};
    use rand::SeedableRng;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn world(room: serde_json::Value) -> (TempDir, GameManager) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), room.to_string()).unwrap();
        let graph = RoomGraph::from_json(r#"{"0": {"room": "a.json"}}"#).unwrap();
        let world = GameManager::with_graph(
            graph,
            dir.path().join("rooms.json"),
            dir.path(),
            AssetCatalog::builtin(),
            16.0,
        )
        .unwrap();
        (dir, world)
    }

    fn arrow(pos: Vec2, direction: Vec2) -> Projectile {
        AssetCatalog::builtin()
            .projectile("arrow")
            .unwrap()
            .launch(pos, direction, 7, 16.0)
    }

    #[test]
    fn test_remove_dead_keeps_insertion_order() {
        let catalog = AssetCatalog::builtin();
        let skeleton = catalog.enemy("skeleton").unwrap();
        let mut manager = EnemyManager::new();
        for x in 0..4 {
            manager.add(skeleton.spawn(vec2(x as f32 * 16.0, 0.0), 16.0));
        }
        let ids: Vec<EntityId> = manager.iter().map(|enemy| enemy.id).collect();
        manager.enemies[1].health.current = 0;
        manager.enemies[3].health.current = -5;

        assert_eq!(manager.remove_dead(), vec![ids[1], ids[3]]);
        let left: Vec<EntityId> = manager.iter().map(|enemy| enemy.id).collect();
        assert_eq!(left, vec![ids[0], ids[2]]);
        assert!(!manager.is_cleared());
    }

    #[test]
    fn test_empty_room_is_not_cleared() {
        assert!(!EnemyManager::new().is_cleared());
    }

    #[test]
    fn test_enemy_chases_player_in_sight() {
        let (_dir, mut world) = world(json!({
            "tilemap": {"0;0": {"id": "floor"}, "9;9": {"id": "floor"}},
            "entities": {"1;1": {"id": "skeleton"}},
        }));
        let mut player = Player::new(&GameConfig::default(), vec2(72.0, 28.0));
        let mut enemies = std::mem::take(&mut world.tilemap.enemies);
        let start = enemies.enemies[0].body.center();
        let mut rng = StdRng::seed_from_u64(7);
        let mut spawned = Vec::new();
        let mut events = Vec::new();

        enemies.update(&mut world, &mut player, &mut rng, &mut spawned, &mut events);
        let moved = enemies.enemies[0].body.center();
        assert!(moved.x > start.x);
        assert_eq!(enemies.enemies[0].body.state, crate::MoveState::Right);
    }

    #[test]
    fn test_contact_damage_respects_immunity() {
        let (_dir, mut world) = world(json!({"entities": {"1;1": {"id": "skeleton"}}}));
        let mut enemies = std::mem::take(&mut world.tilemap.enemies);
        let center = enemies.enemies[0].body.center();
        let mut player = Player::new(&GameConfig::default(), center);
        let mut rng = StdRng::seed_from_u64(1);
        let mut spawned = Vec::new();
        let mut events = Vec::new();

        for _ in 0..3 {
            enemies.update(&mut world, &mut player, &mut rng, &mut spawned, &mut events);
        }
        let hits = events
            .iter()
            .filter(|e| matches!(e, GameEvent::EntityDamaged { target: DamageTarget::Player, .. }))
            .count();
        assert_eq!(hits, 1);
        assert_eq!(player.health.current, GameConfig::default().player_health - 10);
    }

    #[test]
    fn test_enemy_holds_still_after_contact_hit() {
        let (_dir, mut world) = world(json!({"entities": {"1;1": {"id": "skeleton"}}}));
        let mut enemies = std::mem::take(&mut world.tilemap.enemies);
        let center = enemies.enemies[0].body.center();
        let mut player = Player::new(&GameConfig::default(), center);
        let mut rng = StdRng::seed_from_u64(1);
        let mut spawned = Vec::new();
        let mut events = Vec::new();

        enemies.update(&mut world, &mut player, &mut rng, &mut spawned, &mut events);
        let landed = enemies.enemies[0].body.pos;
        assert!(enemies.enemies[0].body.stunned > 0);

        // Move the player out of reach; the enemy would chase if it could
        player.body.set_center(center + vec2(40.0, 0.0));
        enemies.update(&mut world, &mut player, &mut rng, &mut spawned, &mut events);
        assert_eq!(enemies.enemies[0].body.pos, landed);
    }

    #[test]
    fn test_projectile_hits_first_enemy_and_dies() {
        let (_dir, mut world) = world(json!({"entities": {"3;0": {"id": "skeleton"}, "3;1": {"id": "skeleton"}}}));
        let first = world.tilemap.enemies.enemies[0].id;
        let mut projectiles = vec![arrow(vec2(44.0, 12.0), vec2(1.0, 0.0))];
        let mut events = Vec::new();

        update_projectiles(&mut projectiles, &mut world, &mut events);
        assert!(projectiles.is_empty());
        assert_eq!(
            events,
            vec![GameEvent::EntityDamaged {
                target: DamageTarget::Enemy(first),
                amount: 7
            }]
        );
        assert_eq!(world.tilemap.enemies.get(first).unwrap().health.current, 13);
    }

    #[test]
    fn test_projectile_stops_at_walls_and_expires() {
        let (_dir, mut world) = world(json!({"tilemap": {"4;0": {"id": "wall"}}}));
        let mut projectiles = vec![
            arrow(vec2(56.0, 8.0), vec2(1.0, 0.0)),
            arrow(vec2(8.0, 40.0), vec2(0.0, 1.0)),
        ];
        projectiles[1].lifetime = 2;
        let mut events = Vec::new();

        update_projectiles(&mut projectiles, &mut world, &mut events);
        assert_eq!(projectiles.len(), 1);
        update_projectiles(&mut projectiles, &mut world, &mut events);
        assert!(projectiles.is_empty());
        assert!(events.is_empty());
        assert!(world.tilemap.get_tile(GridPos::new(4, 0)).is_some());
    }

    #[test]
    fn test_killing_blow_reports_death() {
        let (_dir, mut world) = world(json!({"entities": {"1;0": {"id": "skeleton"}}}));
        let id = world.tilemap.enemies.enemies[0].id;
        world.tilemap.enemies.enemies[0].health.current = 5;
        let mut projectiles = vec![arrow(vec2(12.0, 12.0), vec2(1.0, 0.0))];
        let mut events = Vec::new();

        update_projectiles(&mut projectiles, &mut world, &mut events);
        assert!(events.contains(&GameEvent::EntityDied {
            target: DamageTarget::Enemy(id)
        }));
        assert!(world.tilemap.enemies.is_cleared());
    }
}
