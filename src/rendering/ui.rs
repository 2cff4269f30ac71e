//! # User Interface Elements
//!
//! The heads-up display drawn over the room: health bar, item bar, equipped
//! accessories, the message log, the text box and the game over screen.
//!
//! Everything is drawn through [`RenderTarget`] in view pixels, so the layout
//! can be checked with a [`DrawRecorder`](crate::DrawRecorder).

use crate::config::ITEMBAR_SLOTS;
use crate::{GameState, Health, Inventory, RenderTarget};
use macroquad::color::Color;
use macroquad::math::{vec2, Vec2};

const PANEL: Color = Color::new(0.08, 0.08, 0.1, 0.85);
const HEALTH_BACK: Color = Color::new(0.35, 0.05, 0.05, 1.0);
const HEALTH_FILL: Color = Color::new(0.85, 0.15, 0.15, 1.0);
const SLOT: Color = Color::new(0.2, 0.2, 0.24, 0.9);
const SLOT_SELECTED: Color = Color::new(0.85, 0.75, 0.3, 0.9);

const MARGIN: f32 = 6.0;
const FONT_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 11.0;

/// Heads-up display laid out for a fixed view size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    /// View size in pixels
    pub view: Vec2,
    /// Item bar slot edge length in pixels
    pub slot_size: f32,
}

impl Hud {
    pub fn new(view: Vec2, tile_size: f32) -> Self {
        Self {
            view,
            slot_size: tile_size + 4.0,
        }
    }

    /// Draws the whole HUD for a running session.
    pub fn render(&self, state: &GameState, target: &mut dyn RenderTarget) {
        self.health_bar(&state.player.health, target);
        self.item_bar(&state.player.inventory, target);
        self.accessories(&state.player.inventory, target);
        self.messages(&state.messages, target);
        if let Some(lines) = &state.text_box {
            self.text_box(lines, target);
        }
    }

    pub fn health_bar(&self, health: &Health, target: &mut dyn RenderTarget) {
        let pos = vec2(MARGIN, MARGIN);
        let size = vec2(80.0, 6.0);
        target.draw_rect(pos, size, HEALTH_BACK);
        target.draw_rect(pos, vec2(size.x * health.fraction(), size.y), HEALTH_FILL);
        target.draw_text(
            &format!("{}/{}", health.current.max(0), health.max),
            vec2(pos.x + size.x + 4.0, pos.y + size.y),
            FONT_SIZE,
        );
    }

    /// Item bar slots centred along the bottom edge.
    pub fn item_bar(&self, inventory: &Inventory, target: &mut dyn RenderTarget) {
        let slots = ITEMBAR_SLOTS.min(inventory.slots().len());
        let width = slots as f32 * self.slot_size;
        let origin = vec2(
            (self.view.x - width) / 2.0,
            self.view.y - self.slot_size - MARGIN,
        );
        let inset = vec2(2.0, 2.0);
        let icon = vec2(self.slot_size, self.slot_size) - inset * 2.0;

        for (index, slot) in inventory.slots().iter().take(slots).enumerate() {
            let pos = origin + vec2(index as f32 * self.slot_size, 0.0);
            let color = if index == inventory.selected() {
                SLOT_SELECTED
            } else {
                SLOT
            };
            target.draw_rect(pos, vec2(self.slot_size, self.slot_size) - vec2(1.0, 1.0), color);
            if let Some(stack) = slot {
                target.draw_image(&stack.item.icon, pos + inset, icon);
                if stack.count > 1 {
                    target.draw_text(
                        &stack.count.to_string(),
                        pos + vec2(inset.x, self.slot_size - inset.y),
                        FONT_SIZE,
                    );
                }
            }
        }
    }

    /// Equipped accessories stacked down the right edge.
    pub fn accessories(&self, inventory: &Inventory, target: &mut dyn RenderTarget) {
        let size = vec2(self.slot_size, self.slot_size);
        for (index, item) in inventory.accessories().iter().enumerate() {
            let pos = vec2(
                self.view.x - self.slot_size - MARGIN,
                MARGIN + index as f32 * self.slot_size,
            );
            target.draw_rect(pos, size - vec2(1.0, 1.0), SLOT);
            target.draw_image(&item.icon, pos + vec2(2.0, 2.0), size - vec2(4.0, 4.0));
        }
    }

    /// Message log above the item bar, newest last.
    pub fn messages(&self, messages: &[String], target: &mut dyn RenderTarget) {
        let bottom = self.view.y - self.slot_size - MARGIN * 2.0;
        for (index, text) in messages.iter().rev().enumerate() {
            let pos = vec2(MARGIN, bottom - index as f32 * LINE_HEIGHT);
            target.draw_text(text, pos, FONT_SIZE);
        }
    }

    /// A centred panel showing `lines`.
    pub fn text_box(&self, lines: &[String], target: &mut dyn RenderTarget) {
        let size = vec2(
            self.view.x * 0.6,
            LINE_HEIGHT * (lines.len() as f32 + 2.0),
        );
        let pos = (self.view - size) / 2.0;
        target.draw_rect(pos, size, PANEL);
        for (index, line) in lines.iter().enumerate() {
            let baseline = pos + vec2(MARGIN, LINE_HEIGHT * (index as f32 + 1.5));
            target.draw_text(line, baseline, FONT_SIZE);
        }
    }

    pub fn game_over(&self, target: &mut dyn RenderTarget) {
        target.draw_rect(Vec2::ZERO, self.view, PANEL);
        let center = self.view / 2.0;
        target.draw_text("You died!", center - vec2(24.0, 8.0), FONT_SIZE * 2.0);
        target.draw_text(
            "Press R to respawn or ESC to quit",
            center - vec2(80.0, -12.0),
            FONT_SIZE,
        );
    }
}
