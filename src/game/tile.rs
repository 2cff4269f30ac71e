//! # Tiles and Tile Groups
//!
//! A [`Tile`] is one occupied grid cell. Tiles that respond to the player or
//! to being touched carry [`InteractionHooks`]; behavior is always one of the
//! closed [`TileAction`] / [`TileHook`] / [`RenderHook`] variants, resolved from
//! the catalog blueprint the tile was built from.

use crate::{GridPos, ImageRef, MetaExt, Metadata, RenderTarget};
use macroquad::math::{vec2, Rect, Vec2};
use serde_json::Value;
use std::collections::BTreeSet;

/// What a tile looks like.
#[derive(Debug, Clone, PartialEq)]
pub enum TileVisual {
    /// One image regardless of variant
    Single(ImageRef),
    /// Variant images, selected by [`Tile::variant`]
    Variants(Vec<ImageRef>),
}

impl TileVisual {
    /// Image for a variant. Out-of-range variants fall back to the first image.
    pub fn image(&self, variant: usize) -> Option<&ImageRef> {
        match self {
            TileVisual::Single(image) => Some(image),
            TileVisual::Variants(images) => images.get(variant).or_else(|| images.first()),
        }
    }

    /// Number of selectable variants.
    pub fn variant_count(&self) -> usize {
        match self {
            TileVisual::Single(_) => 1,
            TileVisual::Variants(images) => images.len(),
        }
    }
}

/// Behaviors a tile can run when interacted with or touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileAction {
    /// Show the `text` metadata in a text box
    ShowText,
    /// Hand out the chest's item once, then report it empty
    OpenChest,
    /// Take the door whose id is in the `id` metadata
    Door,
    /// Hurt the toucher while the spikes are raised
    SpikeDamage,
    /// Flip the shared state of the tile's group
    ToggleSwitch,
    /// Accept items tagged as trash
    DepositTrash,
    /// Accept items tagged as recyclable
    DepositRecyclable,
    /// Hand out the room reward once the room is cleared
    ClaimObjective,
}

/// Per-tick state update, also applied once after a tile is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileHook {
    /// Variant follows the `opened` flag
    ChestState,
    /// Variant follows the `state` flag
    SwitchState,
    /// Raises and lowers spikes on a `cooldown`/`spike-time` cycle
    SpikeCycle,
}

/// Extra drawing attached to a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderHook {
    /// Draw the `collected` counter over the tile
    Counter,
    /// Draw the tile only once `revealed` is set
    Concealed,
}

/// Interaction state of an InteractableTile.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionHooks {
    /// Responds to the interact control
    pub interactable: bool,
    /// Responds to being touched
    pub collision_interactable: bool,
    /// Action for repeat interactions
    pub interaction: Option<TileAction>,
    /// Action for the very first interaction; falls back to `interaction`
    pub first_interaction: Option<TileAction>,
    /// Action run every tick something overlaps the tile
    pub on_collision: Option<TileAction>,
    /// Number of interactions so far
    pub times_interacted: u32,
}

impl InteractionHooks {
    /// Hooks for a tile that only reacts to the interact control.
    pub fn interact(action: TileAction) -> Self {
        Self {
            interactable: true,
            collision_interactable: false,
            interaction: Some(action),
            first_interaction: None,
            on_collision: None,
            times_interacted: 0,
        }
    }

    /// Hooks for a tile that only reacts to being touched.
    pub fn collide(action: TileAction) -> Self {
        Self {
            interactable: false,
            collision_interactable: true,
            interaction: None,
            first_interaction: None,
            on_collision: Some(action),
            times_interacted: 0,
        }
    }

    pub fn with_first_interaction(mut self, action: TileAction) -> Self {
        self.first_interaction = Some(action);
        self
    }
}

/// One occupied grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Catalog id this tile was built from
    pub id: String,
    pub visual: TileVisual,
    /// Active variant index into [`TileVisual::Variants`]
    pub variant: usize,
    pub solid: bool,
    pub meta: Metadata,
    /// Set by the loader, or by explicit replacement
    pub grid_pos: GridPos,
    /// Tile group this cell belongs to
    pub group: Option<String>,
    pub on_update: Option<TileHook>,
    pub on_render: Option<RenderHook>,
    pub render_override: Option<RenderHook>,
    /// Present iff this is an InteractableTile
    pub hooks: Option<InteractionHooks>,
}

impl Tile {
    /// Creates a plain tile at the origin.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::{ImageRef, Tile, TileVisual};
    ///
    /// let wall = Tile::new("wall", TileVisual::Single(ImageRef::new("tiles/wall")), true);
    /// assert!(wall.solid);
    /// assert!(!wall.is_interactable());
    /// ```
    pub fn new(id: impl Into<String>, visual: TileVisual, solid: bool) -> Self {
        Self {
            id: id.into(),
            visual,
            variant: 0,
            solid,
            meta: Metadata::new(),
            grid_pos: GridPos::new(0, 0),
            group: None,
            on_update: None,
            on_render: None,
            render_override: None,
            hooks: None,
        }
    }

    pub fn with_hooks(mut self, hooks: InteractionHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_variant(mut self, variant: usize) -> Self {
        self.variant = variant;
        self
    }

    pub fn at(mut self, grid_pos: GridPos) -> Self {
        self.grid_pos = grid_pos;
        self
    }

    /// Whether this tile carries interaction hooks at all.
    pub fn is_interactable_tile(&self) -> bool {
        self.hooks.is_some()
    }

    /// Whether the interact control does anything here. Concealed tiles are
    /// not interactable until revealed.
    pub fn is_interactable(&self) -> bool {
        !self.is_concealed() && self.hooks.as_ref().is_some_and(|h| h.interactable)
    }

    /// Whether the tile is drawn as [`RenderHook::Concealed`] and not yet revealed.
    pub fn is_concealed(&self) -> bool {
        self.render_override == Some(RenderHook::Concealed) && !self.meta.flag("revealed")
    }

    /// Whether touching this tile does anything.
    pub fn is_collision_interactable(&self) -> bool {
        self.hooks.as_ref().is_some_and(|h| h.collision_interactable)
    }

    /// Interactions performed on this tile so far.
    pub fn times_interacted(&self) -> u32 {
        self.hooks.as_ref().map_or(0, |h| h.times_interacted)
    }

    /// Registers one interaction and returns the action to run.
    ///
    /// The first call picks `first_interaction` (or `interaction` when unset),
    /// later calls pick `interaction`. Returns `None` without counting when
    /// the tile is not interactable.
    pub fn begin_interaction(&mut self) -> Option<TileAction> {
        if self.is_concealed() {
            return None;
        }
        let hooks = self.hooks.as_mut().filter(|h| h.interactable)?;
        let action = if hooks.times_interacted < 1 {
            hooks.first_interaction.or(hooks.interaction)
        } else {
            hooks.interaction
        };
        hooks.times_interacted += 1;
        action
    }

    /// The action to run while something overlaps this tile.
    pub fn collision_action(&self) -> Option<TileAction> {
        self.hooks
            .as_ref()
            .filter(|h| h.collision_interactable)
            .and_then(|h| h.on_collision)
    }

    /// Whether either interaction slot runs `action`.
    pub fn runs(&self, action: TileAction) -> bool {
        self.hooks.as_ref().is_some_and(|h| {
            h.interaction == Some(action)
                || h.first_interaction == Some(action)
                || h.on_collision == Some(action)
        })
    }

    /// Advances the tile's per-tick hook.
    pub fn update(&mut self) {
        if self.on_update == Some(TileHook::SpikeCycle) {
            let tick = self.meta.int("tick").unwrap_or(0) + 1;
            self.meta.insert("tick".to_string(), Value::from(tick));
        }
        self.sync_state();
    }

    /// Derives the visible variant from metadata without advancing time.
    pub fn sync_state(&mut self) {
        match self.on_update {
            Some(TileHook::ChestState) => {
                self.variant = usize::from(self.meta.flag("opened"));
            }
            Some(TileHook::SwitchState) => {
                self.variant = usize::from(self.meta.flag("state"));
            }
            Some(TileHook::SpikeCycle) => {
                let raised = spikes_raised(&self.meta);
                self.meta.insert("raised".to_string(), Value::Bool(raised));
                self.variant = usize::from(raised);
            }
            None => {}
        }
    }

    /// Image for the active variant.
    pub fn image(&self) -> Option<&ImageRef> {
        self.visual.image(self.variant)
    }

    /// Pixel rectangle covered by this cell.
    pub fn rect(&self, tile_size: f32) -> Rect {
        let origin = self.grid_pos.to_pixel(tile_size);
        Rect::new(origin.x, origin.y, tile_size, tile_size)
    }

    /// Draws the tile at `grid_pos * tile_size - offset`.
    pub fn render(&self, target: &mut dyn RenderTarget, offset: Vec2, tile_size: f32) {
        let screen = self.grid_pos.to_pixel(tile_size) - offset;
        if let Some(hook) = self.render_override {
            self.run_render_hook(hook, target, screen, tile_size);
            return;
        }
        self.draw_image(target, screen, tile_size);
        if let Some(hook) = self.on_render {
            self.run_render_hook(hook, target, screen, tile_size);
        }
    }

    fn draw_image(&self, target: &mut dyn RenderTarget, screen: Vec2, tile_size: f32) {
        if let Some(image) = self.image() {
            target.draw_image(image, screen, vec2(tile_size, tile_size));
        }
    }

    fn run_render_hook(
        &self,
        hook: RenderHook,
        target: &mut dyn RenderTarget,
        screen: Vec2,
        tile_size: f32,
    ) {
        match hook {
            RenderHook::Counter => {
                let collected = self.meta.int("collected").unwrap_or(0);
                target.draw_text(
                    &collected.to_string(),
                    screen + vec2(tile_size * 0.25, tile_size * 0.75),
                    tile_size * 0.5,
                );
            }
            RenderHook::Concealed => {
                if self.meta.flag("revealed") {
                    self.draw_image(target, screen, tile_size);
                }
            }
        }
    }
}

/// Spikes are raised for the last `spike-time` ticks of each
/// `cooldown + spike-time` cycle, shifted by `offset`.
fn spikes_raised(meta: &Metadata) -> bool {
    let cooldown = meta.int("cooldown").unwrap_or(0).max(0);
    let up_time = meta.int("spike-time").unwrap_or(0).max(0);
    let period = cooldown + up_time;
    if period == 0 {
        return true;
    }
    let tick = meta.int("tick").unwrap_or(0);
    let offset = meta.int("offset").unwrap_or(0);
    (tick + offset).rem_euclid(period) >= cooldown
}

/// Named set of tile positions sharing metadata, e.g. a bank of switches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileGroup {
    pub id: String,
    pub meta: Metadata,
    pub positions: BTreeSet<GridPos>,
}

impl TileGroup {
    pub fn new(id: impl Into<String>, meta: Metadata) -> Self {
        Self {
            id: id.into(),
            meta,
            positions: BTreeSet::new(),
        }
    }

    /// Adds a member position. Returns false if it was already present.
    pub fn add(&mut self, pos: GridPos) -> bool {
        self.positions.insert(pos)
    }

    /// Removes a member position. Returns false if it was not present.
    pub fn remove(&mut self, pos: GridPos) -> bool {
        self.positions.remove(&pos)
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.positions.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
