//! # Input Module
//!
//! Keyboard and mouse sampling. The handler turns the device state of one
//! frame into a [`TickInput`] for the simulation plus the occasional
//! [`PlayerCommand`] for the frame loop.

use crate::config::ITEMBAR_SLOTS;
use crate::TickInput;
use macroquad::prelude::*;

/// Key bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Keybinds {
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub interact: KeyCode,
    pub use_item: KeyCode,
    pub equip: KeyCode,
    pub unequip: KeyCode,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self {
            up: vec![KeyCode::W, KeyCode::Up],
            down: vec![KeyCode::S, KeyCode::Down],
            left: vec![KeyCode::A, KeyCode::Left],
            right: vec![KeyCode::D, KeyCode::Right],
            interact: KeyCode::E,
            use_item: KeyCode::Space,
            equip: KeyCode::Q,
            unequip: KeyCode::X,
        }
    }
}

/// Requests handled by the frame loop rather than the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Quit,
    Save,
    Respawn,
}

/// Input handler for processing player controls.
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
    pub keybinds: Keybinds,
}

impl InputHandler {
    /// Creates a handler with the default bindings.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::InputHandler;
    /// use macroquad::input::KeyCode;
    ///
    /// let handler = InputHandler::new();
    /// assert_eq!(handler.keybinds.interact, KeyCode::E);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples the controls for one simulation tick.
    pub fn tick_input(&self) -> TickInput {
        let held = |keys: &[KeyCode]| keys.iter().any(|key| is_key_down(*key));
        let binds = &self.keybinds;

        TickInput {
            movement: movement(
                held(&binds.up),
                held(&binds.down),
                held(&binds.left),
                held(&binds.right),
            ),
            interact: is_key_pressed(binds.interact),
            use_item: is_key_pressed(binds.use_item)
                || is_mouse_button_pressed(MouseButton::Left),
            select_slot: slot_keys()
                .iter()
                .position(|key| is_key_pressed(*key)),
            equip: is_key_pressed(binds.equip),
            unequip: is_key_pressed(binds.unequip).then_some(0),
        }
    }

    /// Frame-loop command pressed this frame, if any.
    pub fn command(&self) -> Option<PlayerCommand> {
        if is_key_pressed(KeyCode::Escape) {
            Some(PlayerCommand::Quit)
        } else if is_key_pressed(KeyCode::F5) {
            Some(PlayerCommand::Save)
        } else if is_key_pressed(KeyCode::R) {
            Some(PlayerCommand::Respawn)
        } else {
            None
        }
    }
}

/// Number keys selecting item bar slots, in slot order.
fn slot_keys() -> &'static [KeyCode] {
    static KEYS: [KeyCode; 9] = [
        KeyCode::Key1,
        KeyCode::Key2,
        KeyCode::Key3,
        KeyCode::Key4,
        KeyCode::Key5,
        KeyCode::Key6,
        KeyCode::Key7,
        KeyCode::Key8,
        KeyCode::Key9,
    ];
    &KEYS[..ITEMBAR_SLOTS.min(KEYS.len())]
}

/// Movement vector for the held direction keys. Opposite keys cancel.
pub fn movement(up: bool, down: bool, left: bool, right: bool) -> Vec2 {
    let axis = |negative: bool, positive: bool| positive as i32 as f32 - negative as i32 as f32;
    vec2(axis(left, right), axis(up, down))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_axes() {
        assert_eq!(movement(false, false, false, true), vec2(1.0, 0.0));
        assert_eq!(movement(true, false, true, false), vec2(-1.0, -1.0));
        assert_eq!(movement(true, true, false, false), Vec2::ZERO);
    }

    #[test]
    fn test_slot_keys_match_item_bar() {
        assert_eq!(slot_keys().len(), ITEMBAR_SLOTS);
        assert_eq!(slot_keys()[0], KeyCode::Key1);
    }
}
