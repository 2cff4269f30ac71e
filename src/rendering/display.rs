//! # Display Management
//!
//! Screen management and 2D texture rendering using macroquad.
//!
//! The game draws into a fixed 640×360 view that is scaled to the largest
//! 16:9 area fitting the window and centred in it.

use crate::rendering::Hud;
use crate::{GameState, ImageRef, RenderTarget, TileboundResult};
use log::{debug, warn};
use macroquad::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Logical view size in game pixels
pub const VIEW_SIZE: Vec2 = Vec2::new(640.0, 360.0);

/// Macroquad display manager for the game.
///
/// Owns every loaded texture and maps view pixels onto the window.
pub struct MacroquadDisplay {
    /// Directory textures are loaded from
    pub assets_dir: PathBuf,
    /// Window pixels per view pixel
    pub scale: f32,
    /// Window position of the view's top-left corner
    pub origin: Vec2,
    /// Loaded textures by image key
    textures: HashMap<String, Texture2D>,
    /// Drawn for image keys that failed to load
    fallback: Texture2D,
    hud: Hud,
}

impl MacroquadDisplay {
    /// Creates a display and loads the texture for every key in `images`.
    ///
    /// Images are looked up as `<assets_dir>/<key>.png`. Missing files are
    /// logged and drawn with a placeholder.
    pub async fn new(
        assets_dir: &Path,
        images: &BTreeSet<ImageRef>,
        tile_size: f32,
    ) -> TileboundResult<Self> {
        let fallback = Texture2D::from_rgba8(1, 1, &[255, 0, 255, 255]);
        fallback.set_filter(FilterMode::Nearest);

        let mut display = Self {
            assets_dir: assets_dir.to_path_buf(),
            scale: 1.0,
            origin: Vec2::ZERO,
            textures: HashMap::new(),
            fallback,
            hud: Hud::new(VIEW_SIZE, tile_size),
        };
        display.load_textures(images).await;
        display.fit_to_screen();
        Ok(display)
    }

    async fn load_textures(&mut self, images: &BTreeSet<ImageRef>) {
        let mut missing = 0;
        for image in images {
            let path = self.assets_dir.join(format!("{}.png", image.key()));
            match load_texture(&path.to_string_lossy()).await {
                Ok(texture) => {
                    texture.set_filter(FilterMode::Nearest);
                    self.textures.insert(image.key().to_string(), texture);
                }
                Err(err) => {
                    missing += 1;
                    debug!("Could not load {}: {}", path.display(), err);
                }
            }
        }
        if missing > 0 {
            warn!(
                "{} of {} textures missing under {}",
                missing,
                images.len(),
                self.assets_dir.display()
            );
        }
    }

    /// Recomputes the scale and letterbox for the current window size.
    pub fn fit_to_screen(&mut self) {
        let window = vec2(screen_width(), screen_height());
        let (scale, origin) = letterbox(window, VIEW_SIZE);
        self.scale = scale;
        self.origin = origin;
    }

    /// Renders the room, entities and HUD for one frame.
    pub fn render_game(&mut self, state: &GameState) {
        self.fit_to_screen();
        clear_background(Color::new(0.08, 0.08, 0.08, 1.0));
        draw_rectangle(
            self.origin.x,
            self.origin.y,
            VIEW_SIZE.x * self.scale,
            VIEW_SIZE.y * self.scale,
            Color::new(0.12, 0.12, 0.12, 1.0),
        );

        let offset = state.camera_offset(VIEW_SIZE);
        state.render(self, offset);
        let hud = self.hud;
        hud.render(state, self);
    }

    /// Renders the game over screen.
    pub fn render_game_over(&mut self) {
        self.fit_to_screen();
        clear_background(BLACK);
        let hud = self.hud;
        hud.game_over(self);
    }

    fn to_screen(&self, pos: Vec2) -> Vec2 {
        self.origin + pos * self.scale
    }
}

impl RenderTarget for MacroquadDisplay {
    fn draw_image(&mut self, image: &ImageRef, pos: Vec2, size: Vec2) {
        let texture = self.textures.get(image.key()).unwrap_or(&self.fallback);
        let screen = self.to_screen(pos);
        draw_texture_ex(
            texture,
            screen.x,
            screen.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(size * self.scale),
                ..Default::default()
            },
        );
    }

    fn draw_text(&mut self, text: &str, pos: Vec2, font_size: f32) {
        let screen = self.to_screen(pos);
        macroquad::text::draw_text(text, screen.x, screen.y, font_size * self.scale, WHITE);
    }

    fn draw_rect(&mut self, pos: Vec2, size: Vec2, color: Color) {
        let screen = self.to_screen(pos);
        draw_rectangle(screen.x, screen.y, size.x * self.scale, size.y * self.scale, color);
    }
}

/// Largest scale at which `view` fits in `window`, and the top-left corner
/// that centres it.
///
/// # Examples
///
/// ```
/// use tilebound::rendering::letterbox;
/// use macroquad::math::vec2;
///
/// let (scale, origin) = letterbox(vec2(1920.0, 1200.0), vec2(640.0, 360.0));
/// assert_eq!(scale, 3.0);
/// assert_eq!(origin, vec2(0.0, 60.0));
/// ```
pub fn letterbox(window: Vec2, view: Vec2) -> (f32, Vec2) {
    let scale = (window.x / view.x).min(window.y / view.y).max(f32::EPSILON);
    let origin = ((window - view * scale) / 2.0).floor();
    (scale, origin)
}
