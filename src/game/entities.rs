//! # Entities
//!
//! The small closed set of things that move: the player, enemies and
//! projectiles. Each is a plain struct composed of a [`PhysicsBody`] and, where
//! it can be hurt, a [`Health`] component.

use crate::config::START_ROOM;
use crate::{
    rects_overlap, Attribute, EntityId, GameConfig, ImageRef, Inventory, Item, MoveState,
    PhysicsBody, RenderTarget,
};
use macroquad::math::{vec2, Rect, Vec2};

/// Hit points plus the immunity window that debounces repeated damage.
#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    pub current: i32,
    pub max: i32,
    /// Length of the immunity window started by a hit
    pub immunity_frames: u32,
    /// Ticks left in the current immunity window
    pub immunity_timer: u32,
}

impl Health {
    pub fn new(max: i32, immunity_frames: u32) -> Self {
        let max = max.max(1);
        Self {
            current: max,
            max,
            immunity_frames,
            immunity_timer: 0,
        }
    }

    pub fn is_immune(&self) -> bool {
        self.immunity_timer > 0
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    /// Applies damage unless the entity is immune or already dead.
    ///
    /// Returns the damage actually dealt.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::Health;
    ///
    /// let mut health = Health::new(20, 2);
    /// assert_eq!(health.damage(5), Some(5));
    /// assert_eq!(health.damage(5), None);
    /// health.tick();
    /// health.tick();
    /// assert_eq!(health.damage(5), Some(5));
    /// assert_eq!(health.current, 10);
    /// ```
    pub fn damage(&mut self, amount: i32) -> Option<i32> {
        if amount <= 0 || self.is_immune() || self.is_dead() {
            return None;
        }
        self.current -= amount;
        self.immunity_timer = self.immunity_frames;
        Some(amount)
    }

    pub fn heal(&mut self, amount: i32) {
        self.current = (self.current + amount.max(0)).min(self.max);
    }

    /// Changes the maximum, keeping current health within it.
    pub fn set_max(&mut self, max: i32) {
        self.max = max.max(1);
        self.current = self.current.min(self.max);
    }

    /// Refills health and clears immunity.
    pub fn restore(&mut self) {
        self.current = self.max;
        self.immunity_timer = 0;
    }

    /// Counts down the immunity window.
    pub fn tick(&mut self) {
        self.immunity_timer = self.immunity_timer.saturating_sub(1);
    }

    /// Fraction of health left, for health bars.
    pub fn fraction(&self) -> f32 {
        (self.current.max(0) as f32 / self.max as f32).clamp(0.0, 1.0)
    }
}

/// Modifiers the player gets from equipped accessories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStats {
    pub health_bonus: i32,
    pub immunity_bonus: u32,
    /// Multiplier on outgoing damage
    pub damage: f32,
    /// Multiplier on incoming damage
    pub defense: f32,
    /// Multiplier on movement speed
    pub speed: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            health_bonus: 0,
            immunity_bonus: 0,
            damage: 1.0,
            defense: 1.0,
            speed: 1.0,
        }
    }
}

impl PlayerStats {
    /// Folds the stat attributes of every equipped accessory together.
    pub fn from_accessories(accessories: &[Item]) -> Self {
        let mut stats = Self::default();
        for attribute in accessories.iter().flat_map(|item| &item.attributes) {
            match *attribute {
                Attribute::HealthBoost(amount) => stats.health_bonus += amount,
                Attribute::IFrameBoost(frames) => stats.immunity_bonus += frames,
                Attribute::DamageBoost(factor) => stats.damage *= factor,
                Attribute::DefenseBoost(factor) => stats.defense *= factor,
                Attribute::SpeedBoost(factor) => stats.speed *= factor,
                Attribute::Cooldown
                | Attribute::Accessory
                | Attribute::Trash
                | Attribute::Recyclable => {}
            }
        }
        stats
    }
}

/// The player character.
#[derive(Debug, Clone)]
pub struct Player {
    pub body: PhysicsBody,
    pub health: Health,
    pub inventory: Inventory,
    pub stats: PlayerStats,
    /// Last non-idle movement state; projectiles fly this way
    pub facing: MoveState,
    /// Room the player is in, kept for the HUD
    pub room: u32,
    base_health: i32,
    base_immunity: u32,
    base_speed: f32,
}

impl Player {
    /// Creates a player with its hitbox centred on `center`.
    pub fn new(config: &GameConfig, center: Vec2) -> Self {
        let ts = config.tile_size;
        let mut body = PhysicsBody::new(Vec2::ZERO, vec2(ts, ts), config.player_speed)
            .with_hitbox(vec2(ts * 0.75, ts * 0.5), true);
        body.set_center(center);

        Self {
            body,
            health: Health::new(config.player_health, config.immunity_frames),
            inventory: Inventory::default(),
            stats: PlayerStats::default(),
            facing: MoveState::Down,
            room: START_ROOM,
            base_health: config.player_health,
            base_immunity: config.immunity_frames,
            base_speed: config.player_speed,
        }
    }

    /// Re-derives stats after the equipped accessories changed.
    pub fn refresh_stats(&mut self) {
        self.stats = PlayerStats::from_accessories(self.inventory.accessories());
        self.health.set_max(self.base_health + self.stats.health_bonus);
        self.health.immunity_frames = self.base_immunity + self.stats.immunity_bonus;
        self.body.speed = self.base_speed * self.stats.speed;
    }

    /// Applies incoming damage scaled by defense.
    pub fn take_damage(&mut self, amount: i32) -> Option<i32> {
        let scaled = (amount as f32 * self.stats.defense).round() as i32;
        self.health.damage(scaled)
    }

    /// Damage dealt by the player for a base amount.
    pub fn outgoing_damage(&self, base: i32) -> i32 {
        (base as f32 * self.stats.damage).round() as i32
    }

    /// Keeps `facing` on the last direction actually moved in.
    pub fn update_facing(&mut self) {
        if self.body.state != MoveState::Idle {
            self.facing = self.body.state;
        }
    }

    /// Puts the player back at full health at `center`.
    pub fn reset(&mut self, center: Vec2) {
        self.health.restore();
        self.body.velocity = Vec2::ZERO;
        self.body.stunned = 0;
        self.body.set_center(center);
        self.facing = MoveState::Down;
        self.room = START_ROOM;
    }

    pub fn image(&self) -> ImageRef {
        ImageRef::new(format!("entities/player/{}", self.body.state.as_str()))
    }

    pub fn render(&self, target: &mut dyn RenderTarget, offset: Vec2) {
        target.draw_image(&self.image(), self.body.pos - offset, self.body.size);
    }
}

/// A hostile entity.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    /// Catalog id, also the sprite directory
    pub kind: String,
    pub body: PhysicsBody,
    pub health: Health,
    pub contact_damage: i32,
    /// Chase radius in pixels
    pub sight_range: f32,
    /// Knockback applied to the player on contact
    pub knockback: f32,
    /// Current idle wander direction
    pub wander: Vec2,
    /// Ticks left before a new wander direction is picked
    pub wander_ticks: u32,
}

impl Enemy {
    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    pub fn touches(&self, rect: &Rect) -> bool {
        rects_overlap(&self.body.rect(), rect)
    }

    pub fn image(&self) -> ImageRef {
        ImageRef::new(format!("entities/{}/{}", self.kind, self.body.state.as_str()))
    }

    pub fn render(&self, target: &mut dyn RenderTarget, offset: Vec2) {
        target.draw_image(&self.image(), self.body.pos - offset, self.body.size);
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: EntityId,
    pub kind: String,
    pub image: ImageRef,
    /// Top-left corner in pixels
    pub pos: Vec2,
    pub size: Vec2,
    /// Unit direction of travel
    pub direction: Vec2,
    /// Pixels per tick
    pub speed: f32,
    pub damage: i32,
    pub knockback: f32,
    /// Ticks left before the projectile disappears
    pub lifetime: u32,
}

impl Projectile {
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Moves one tick along the direction of travel.
    pub fn advance(&mut self) {
        self.pos += self.direction * self.speed;
        self.lifetime = self.lifetime.saturating_sub(1);
    }

    pub fn expired(&self) -> bool {
        self.lifetime == 0
    }

    pub fn render(&self, target: &mut dyn RenderTarget, offset: Vec2) {
        target.draw_image(&self.image, self.pos - offset, self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accessory(attributes: Vec<Attribute>) -> Item {
        Item::new("trinket", "Trinket", 1, ImageRef::new("items/trinket"))
            .with_attributes(attributes)
            .with_attributes([Attribute::Accessory])
    }

    #[test]
    fn test_immunity_frames_debounce_damage() {
        let mut health = Health::new(100, 3);
        let dealt: Vec<_> = (0..6)
            .map(|_| {
                let hit = health.damage(10);
                health.tick();
                hit
            })
            .collect();
        assert_eq!(dealt, vec![Some(10), None, None, Some(10), None, None]);
        assert_eq!(health.current, 80);
    }

    #[test]
    fn test_dead_entities_take_no_damage() {
        let mut health = Health::new(5, 0);
        assert_eq!(health.damage(5), Some(5));
        assert!(health.is_dead());
        assert_eq!(health.damage(5), None);
        assert_eq!(health.fraction(), 0.0);
    }

    #[test]
    fn test_stats_from_accessories() {
        let items = vec![
            accessory(vec![Attribute::HealthBoost(10), Attribute::SpeedBoost(1.2)]),
            accessory(vec![Attribute::DamageBoost(1.45), Attribute::DefenseBoost(1.6)]),
            accessory(vec![Attribute::IFrameBoost(3)]),
        ];
        let stats = PlayerStats::from_accessories(&items);
        assert_eq!(stats.health_bonus, 10);
        assert_eq!(stats.immunity_bonus, 3);
        assert!((stats.speed - 1.2).abs() < f32::EPSILON);
        assert!((stats.damage - 1.45).abs() < f32::EPSILON);
        assert!((stats.defense - 1.6).abs() < f32::EPSILON);
    }

    #[test]
    fn test_player_refresh_stats_and_defense() {
        let config = GameConfig::default();
        let mut player = Player::new(&config, vec2(40.0, 40.0));
        player.inventory.add(
            accessory(vec![Attribute::HealthBoost(10), Attribute::DefenseBoost(0.5)]),
            1,
        );
        player.inventory.equip_selected().unwrap();
        player.refresh_stats();

        assert_eq!(player.health.max, config.player_health + 10);
        assert_eq!(player.take_damage(10), Some(5));
        assert_eq!(player.outgoing_damage(7), 7);
    }

    #[test]
    fn test_player_centred_on_spawn() {
        let config = GameConfig::default();
        let player = Player::new(&config, vec2(40.0, 40.0));
        assert_eq!(player.body.center(), vec2(40.0, 40.0));
        assert_eq!(player.facing, MoveState::Down);
    }

    #[test]
    fn test_projectile_lifetime() {
        let mut arrow = Projectile {
            id: crate::new_entity_id(),
            kind: "arrow".to_string(),
            image: ImageRef::new("entities/arrows/wooden_arrow"),
            pos: Vec2::ZERO,
            size: vec2(4.0, 4.0),
            direction: vec2(1.0, 0.0),
            speed: 5.0,
            damage: 7,
            knockback: 1.0,
            lifetime: 2,
        };
        arrow.advance();
        assert_eq!(arrow.pos, vec2(5.0, 0.0));
        assert!(!arrow.expired());
        arrow.advance();
        assert!(arrow.expired());
    }
}
