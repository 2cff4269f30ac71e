//! # Scene Management System
//!
//! Drives the frame loop: samples input, advances the simulation at a fixed
//! tick rate and switches between the playing and game over scenes.

use crate::config::TARGET_FPS;
use crate::{GameState, InputHandler, MacroquadDisplay, PlayerCommand, TickInput, TileboundResult};
use log::{info, warn};
use macroquad::prelude::*;

/// Longest frame time fed to the tick accumulator, in seconds
const MAX_FRAME_TIME: f32 = 0.25;

/// Represents the current scene in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneType {
    /// Normal gameplay
    Playing,
    /// The player died
    GameOver,
}

/// The main scene manager that coordinates all game scenes
pub struct SceneManager {
    current_scene: SceneType,
    game_state: GameState,
    display: MacroquadDisplay,
    input_handler: InputHandler,
    /// Unsimulated time carried between frames
    accumulator: f32,
    /// Presses sampled on frames that ran no tick
    pending: TickInput,
}

impl SceneManager {
    pub fn new(game_state: GameState, display: MacroquadDisplay, input_handler: InputHandler) -> Self {
        Self {
            current_scene: SceneType::Playing,
            game_state,
            display,
            input_handler,
            accumulator: 0.0,
            pending: TickInput::default(),
        }
    }

    pub fn current_scene(&self) -> SceneType {
        self.current_scene
    }

    /// Runs the scene loop until the player quits, then saves.
    pub async fn run(&mut self) -> TileboundResult<()> {
        loop {
            let quit = match self.current_scene {
                SceneType::Playing => self.update_playing_scene(),
                SceneType::GameOver => self.update_game_over_scene(),
            };
            if quit {
                break;
            }
            next_frame().await;
        }
        info!("Saving before exit");
        self.game_state.save()
    }

    /// Updates the playing scene, returns true if exit is requested
    fn update_playing_scene(&mut self) -> bool {
        match self.input_handler.command() {
            Some(PlayerCommand::Quit) => return true,
            Some(PlayerCommand::Save) => match self.game_state.save() {
                Ok(()) => info!("Game saved"),
                Err(err) => warn!("Save failed: {}", err),
            },
            Some(PlayerCommand::Respawn) | None => {}
        }

        let step = 1.0 / TARGET_FPS as f32;
        self.accumulator += get_frame_time().min(MAX_FRAME_TIME);
        let sampled = self.input_handler.tick_input();
        self.pending = TickInput {
            movement: sampled.movement,
            interact: self.pending.interact || sampled.interact,
            use_item: self.pending.use_item || sampled.use_item,
            select_slot: sampled.select_slot.or(self.pending.select_slot),
            equip: self.pending.equip || sampled.equip,
            unequip: sampled.unequip.or(self.pending.unequip),
        };
        while self.accumulator >= step {
            self.game_state.tick(&self.pending);
            // Presses are consumed by the first tick; held movement carries on
            self.pending = TickInput {
                movement: self.pending.movement,
                ..TickInput::default()
            };
            self.accumulator -= step;
        }

        if self.game_state.is_game_over() {
            self.current_scene = SceneType::GameOver;
        }
        self.display.render_game(&self.game_state);
        false
    }

    /// Updates the game over scene, returns true if exit is requested
    fn update_game_over_scene(&mut self) -> bool {
        self.display.render_game_over();
        match self.input_handler.command() {
            Some(PlayerCommand::Quit) => true,
            Some(PlayerCommand::Respawn) => {
                match self.game_state.respawn() {
                    Ok(()) => {
                        self.accumulator = 0.0;
                        self.pending = TickInput::default();
                        self.current_scene = SceneType::Playing;
                    }
                    Err(err) => warn!("Respawn failed: {}", err),
                }
                false
            }
            Some(PlayerCommand::Save) | None => false,
        }
    }
}
