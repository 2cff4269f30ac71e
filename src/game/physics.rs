//! # Physics
//!
//! Axis-separated collision resolution against solid tiles, shared by every
//! moving entity.
//!
//! Each tick the X movement is applied and resolved first, then the Y
//! movement against a freshly queried neighborhood. Resolving the axes one at
//! a time keeps the math to rectangle clamps and stops diagonal movement from
//! slipping through inside corners.

use crate::{rect_center, rects_overlap, MoveState, Tilemap};
use macroquad::math::{vec2, Rect, Vec2};

/// Which sides of the hitbox hit something during the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collisions {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Collisions {
    pub fn vertical(&self) -> bool {
        self.up || self.down
    }

    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    pub fn any(&self) -> bool {
        self.vertical() || self.horizontal()
    }
}

/// Collision box of an entity, possibly smaller than its sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub size: Vec2,
    /// Anchor the hitbox to the bottom of the sprite instead of its centre
    pub on_bottom: bool,
}

/// Position, velocity and collision state of a moving entity.
///
/// `pos` is the sprite's top-left corner; collision happens in hitbox space
/// and is converted back through [`PhysicsBody::hitbox_offset`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    pub pos: Vec2,
    /// Sprite size in pixels
    pub size: Vec2,
    pub hitbox: Hitbox,
    /// Residual velocity, e.g. knockback
    pub velocity: Vec2,
    /// Multiplier applied to input plus velocity
    pub speed: f32,
    /// Ticks left during which the body cannot move
    pub stunned: u32,
    pub collisions: Collisions,
    pub state: MoveState,
}

impl PhysicsBody {
    /// Creates a body whose hitbox covers the whole sprite.
    pub fn new(pos: Vec2, size: Vec2, speed: f32) -> Self {
        Self {
            pos,
            size,
            hitbox: Hitbox {
                size,
                on_bottom: false,
            },
            velocity: Vec2::ZERO,
            speed,
            stunned: 0,
            collisions: Collisions::default(),
            state: MoveState::Idle,
        }
    }

    /// Shrinks the hitbox, optionally anchoring it to the sprite's bottom.
    pub fn with_hitbox(mut self, size: Vec2, on_bottom: bool) -> Self {
        self.hitbox = Hitbox { size, on_bottom };
        self
    }

    /// Offset from the sprite's top-left corner to the hitbox's.
    pub fn hitbox_offset(&self) -> Vec2 {
        let x = (self.size.x - self.hitbox.size.x) / 2.0;
        let y = if self.hitbox.on_bottom {
            self.size.y - self.hitbox.size.y
        } else {
            (self.size.y - self.hitbox.size.y) / 2.0
        };
        vec2(x, y)
    }

    /// Hitbox rectangle in pixel space.
    pub fn rect(&self) -> Rect {
        let origin = self.pos + self.hitbox_offset();
        Rect::new(origin.x, origin.y, self.hitbox.size.x, self.hitbox.size.y)
    }

    /// Sprite rectangle in pixel space.
    pub fn sprite_rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    /// Centre of the hitbox.
    pub fn center(&self) -> Vec2 {
        rect_center(&self.rect())
    }

    /// Moves the body so its hitbox's top-left corner lands on `origin`.
    pub fn set_hitbox_origin(&mut self, origin: Vec2) {
        self.pos = origin - self.hitbox_offset();
    }

    /// Moves the body so its hitbox is centred on `center`.
    pub fn set_center(&mut self, center: Vec2) {
        self.set_hitbox_origin(center - self.hitbox.size / 2.0);
    }

    /// Movement this tick for the given input.
    pub fn frame_movement(&self, input: Vec2) -> Vec2 {
        if self.stunned > 0 {
            Vec2::ZERO
        } else {
            (input + self.velocity) * self.speed
        }
    }

    /// Runs one physics tick and returns the frame movement that was applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::{PhysicsBody, Tilemap};
    /// use macroquad::math::vec2;
    ///
    /// let tilemap = Tilemap::new(16.0);
    /// let mut body = PhysicsBody::new(vec2(0.0, 0.0), vec2(8.0, 8.0), 2.0);
    /// body.step(&tilemap, vec2(1.0, 0.0));
    /// assert_eq!(body.pos, vec2(2.0, 0.0));
    /// ```
    pub fn step(&mut self, tilemap: &Tilemap, input: Vec2) -> Vec2 {
        self.collisions = Collisions::default();
        let movement = self.frame_movement(input);
        if self.stunned > 0 {
            self.stunned -= 1;
        }

        let mut rect = self.rect();
        rect.x += movement.x;
        for obstacle in tilemap.get_solid_rects_around(rect_center(&rect)) {
            if !rects_overlap(&rect, &obstacle) {
                continue;
            }
            if movement.x > 0.0 {
                rect.x = obstacle.x - rect.w;
                self.collisions.right = true;
            } else if movement.x < 0.0 {
                rect.x = obstacle.x + obstacle.w;
                self.collisions.left = true;
            }
        }
        self.set_hitbox_origin(rect.point());

        let mut rect = self.rect();
        rect.y += movement.y;
        for obstacle in tilemap.get_solid_rects_around(rect_center(&rect)) {
            if !rects_overlap(&rect, &obstacle) {
                continue;
            }
            if movement.y > 0.0 {
                rect.y = obstacle.y - rect.h;
                self.collisions.down = true;
            } else if movement.y < 0.0 {
                rect.y = obstacle.y + obstacle.h;
                self.collisions.up = true;
            }
        }
        self.set_hitbox_origin(rect.point());

        if self.collisions.vertical() {
            self.velocity.x = 0.0;
        }
        if self.collisions.horizontal() {
            self.velocity.y = 0.0;
        }

        self.state = MoveState::from_movement(movement);
        movement
    }

    /// Shrinks residual velocity by `factor`, snapping tiny values to zero.
    pub fn decay_velocity(&mut self, factor: f32) {
        self.velocity *= factor;
        if self.velocity.x.abs() < 0.1 {
            self.velocity.x = 0.0;
        }
        if self.velocity.y.abs() < 0.1 {
            self.velocity.y = 0.0;
        }
    }

    /// Freezes movement for at least `ticks` physics steps.
    pub fn stun(&mut self, ticks: u32) {
        self.stunned = self.stunned.max(ticks);
    }

    /// Pushes the body away from `source` with the given strength.
    pub fn knock_back(&mut self, source: Vec2, strength: f32) {
        let away = (self.center() - source).normalize_or_zero();
        self.velocity = away * strength;
    }
}
