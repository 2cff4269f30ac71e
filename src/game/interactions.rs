//! # Interactions
//!
//! Dispatch of tile and item behaviors.
//!
//! There are two independent channels. The active channel runs when the player
//! presses interact and acts on [`Tilemap::closest_interactable`]. The passive
//! channel runs every tick for every tile an entity's hitbox overlaps; tiles
//! keep no contact state, so repeated effects such as damage are debounced by
//! the receiver's immunity frames.
//!
//! Positions are always collected before any behavior runs, and
//! [`GameManager::room_generation`] is checked between behaviors so a door
//! that swaps the tilemap mid-dispatch stops the loop instead of touching
//! tiles of the old room.
//!
//! [`Tilemap::closest_interactable`]: crate::Tilemap::closest_interactable

use crate::{
    DamageTarget, Enemy, GameEvent, GameManager, GridPos, Interactable, ItemAction, ItemKey,
    MetaExt, MetaKey, Metadata, Player, Projectile, TileAction, TileboundError, TileboundResult,
};
use log::{debug, warn};
use macroquad::math::{vec2, Rect, Vec2};
use serde_json::Value;

/// The entity a behavior acts on behalf of.
#[derive(Debug)]
pub enum Actor<'a> {
    Player(&'a mut Player),
    Enemy(&'a mut Enemy),
    Projectile(&'a mut Projectile),
}

impl Actor<'_> {
    /// Hitbox centre in pixels.
    pub fn center(&self) -> Vec2 {
        match self {
            Actor::Player(player) => player.body.center(),
            Actor::Enemy(enemy) => enemy.body.center(),
            Actor::Projectile(projectile) => projectile.center(),
        }
    }

    pub fn rect(&self) -> Rect {
        match self {
            Actor::Player(player) => player.body.rect(),
            Actor::Enemy(enemy) => enemy.body.rect(),
            Actor::Projectile(projectile) => projectile.rect(),
        }
    }

    /// Applies damage through the actor's health component, if it has one.
    pub fn take_damage(&mut self, amount: i32) -> Option<(DamageTarget, i32)> {
        match self {
            Actor::Player(player) => player
                .take_damage(amount)
                .map(|dealt| (DamageTarget::Player, dealt)),
            Actor::Enemy(enemy) => enemy
                .health
                .damage(amount)
                .map(|dealt| (DamageTarget::Enemy(enemy.id), dealt)),
            Actor::Projectile(_) => None,
        }
    }

    pub fn player(&mut self) -> Option<&mut Player> {
        match self {
            Actor::Player(player) => Some(&mut **player),
            Actor::Enemy(_) | Actor::Projectile(_) => None,
        }
    }
}

/// Everything a behavior may touch while it runs.
pub struct InteractionContext<'a> {
    pub world: &'a mut GameManager,
    pub actor: Actor<'a>,
    /// Projectiles created by behaviors this tick
    pub spawned: &'a mut Vec<Projectile>,
    pub events: &'a mut Vec<GameEvent>,
}

impl<'a> InteractionContext<'a> {
    pub fn new(
        world: &'a mut GameManager,
        actor: Actor<'a>,
        spawned: &'a mut Vec<Projectile>,
        events: &'a mut Vec<GameEvent>,
    ) -> Self {
        Self {
            world,
            actor,
            spawned,
            events,
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

/// Interacts with whatever is closest to the actor.
///
/// Returns the target that was acted on. Behavior failures are logged, not
/// returned.
pub fn interact(ctx: &mut InteractionContext<'_>) -> Option<Interactable> {
    let target = ctx.world.tilemap.closest_interactable(ctx.actor.center())?;
    let result = match &target {
        Interactable::Tile(pos) => interact_tile(ctx, *pos),
        Interactable::Item(key) => interact_item(ctx, key),
    };
    if let Err(err) = result {
        warn!("Interaction with {:?} failed: {}", target, err);
    }
    Some(target)
}

/// Runs the interact behavior of the tile at `pos`.
pub fn interact_tile(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    let action = ctx
        .world
        .tilemap
        .get_tile_mut(pos)
        .and_then(|tile| tile.begin_interaction());
    match action {
        Some(action) => run_tile_action(ctx, pos, action),
        None => Ok(()),
    }
}

/// Runs the touch behavior of the tile at `pos`.
pub fn collide_tile(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    let action = ctx
        .world
        .tilemap
        .get_tile(pos)
        .and_then(|tile| tile.collision_action());
    match action {
        Some(action) => run_tile_action(ctx, pos, action),
        None => Ok(()),
    }
}

/// Runs the touch behavior of every tile `rect` overlaps.
///
/// Each failure is logged and the remaining tiles still run. Stops early if a
/// behavior switched rooms.
pub fn check_collisions(ctx: &mut InteractionContext<'_>, rect: &Rect) {
    let touched = ctx.world.tilemap.collided_tiles(rect);
    let generation = ctx.world.room_generation();
    for pos in touched {
        if ctx.world.room_generation() != generation {
            debug!("Room changed during collision dispatch, dropping stale tiles");
            break;
        }
        if let Err(err) = collide_tile(ctx, pos) {
            warn!("Collision with tile {} failed: {}", pos, err);
        }
    }
}

/// Runs the world interaction of the item at `key`.
pub fn interact_item(ctx: &mut InteractionContext<'_>, key: &ItemKey) -> TileboundResult<()> {
    let action = ctx
        .world
        .tilemap
        .get_item(key)
        .and_then(|world_item| world_item.item.interaction);
    match action {
        Some(ItemAction::Pickup) => pickup_item(ctx, key),
        Some(ItemAction::FireArrow) => fire_arrow(ctx),
        None => Ok(()),
    }
}

/// Runs the left-click action of the player's selected item.
pub fn use_selected_item(ctx: &mut InteractionContext<'_>) -> TileboundResult<()> {
    let action = ctx
        .actor
        .player()
        .and_then(|player| player.inventory.selected_stack())
        .and_then(|stack| stack.item.left_click);
    match action {
        Some(ItemAction::FireArrow) => fire_arrow(ctx),
        Some(ItemAction::Pickup) => Err(TileboundError::InvalidAction(
            "That item is already carried".to_string(),
        )),
        None => Ok(()),
    }
}

/// Runs a tile behavior for the tile at `pos`.
pub fn run_tile_action(
    ctx: &mut InteractionContext<'_>,
    pos: GridPos,
    action: TileAction,
) -> TileboundResult<()> {
    match action {
        TileAction::ShowText => show_text(ctx, pos),
        TileAction::OpenChest => open_chest(ctx, pos),
        TileAction::Door => take_door(ctx, pos),
        TileAction::SpikeDamage => spike_damage(ctx, pos),
        TileAction::ToggleSwitch => toggle_switch(ctx, pos),
        TileAction::DepositTrash => deposit(ctx, pos, Bin::Trash),
        TileAction::DepositRecyclable => deposit(ctx, pos, Bin::Recycling),
        TileAction::ClaimObjective => claim_objective(ctx, pos),
    }
}

fn tile_meta(ctx: &InteractionContext<'_>, pos: GridPos) -> TileboundResult<Metadata> {
    ctx.world
        .tilemap
        .get_tile(pos)
        .map(|tile| tile.meta.clone())
        .ok_or_else(|| TileboundError::InvalidState(format!("No tile at {}", pos)))
}

fn missing(pos: GridPos, key: &str) -> TileboundError {
    TileboundError::MissingMeta {
        owner: format!("tile {}", pos),
        key: key.to_string(),
    }
}

/// Integer metadata field narrowed to `T`. Values that do not fit are an
/// error rather than being truncated.
fn meta_number<T: TryFrom<i64>>(
    meta: &Metadata,
    pos: GridPos,
    key: &str,
) -> TileboundResult<Option<T>> {
    match meta.int(key) {
        None => Ok(None),
        Some(value) => T::try_from(value).map(Some).map_err(|_| {
            TileboundError::InvalidState(format!(
                "Metadata '{}' on tile {} is out of range: {}",
                key, pos, value
            ))
        }),
    }
}

/// Sets fields on the live tile and persists them for the current room.
fn persist_tile(
    ctx: &mut InteractionContext<'_>,
    pos: GridPos,
    patch: Metadata,
) -> TileboundResult<()> {
    if let Some(tile) = ctx.world.tilemap.get_tile_mut(pos) {
        tile.meta.merge(&patch);
        tile.sync_state();
    }
    ctx.world.add_meta(MetaKey::Tile(pos), patch)
}

fn patch(key: &str, value: impl Into<Value>) -> Metadata {
    let mut patch = Metadata::new();
    patch.insert(key.to_string(), value.into());
    patch
}

fn show_text(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    let lines = tile_meta(ctx, pos)?.lines("text");
    if lines.is_empty() {
        return Err(missing(pos, "text"));
    }
    ctx.emit(GameEvent::TextBox { lines });
    persist_tile(ctx, pos, patch("read", true))
}

fn open_chest(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    if ctx.actor.player().is_none() {
        return Ok(());
    }
    let meta = tile_meta(ctx, pos)?;
    if meta.flag("opened") {
        ctx.emit(GameEvent::info("The chest is empty."));
        return Ok(());
    }
    grant_contents(ctx, pos, &meta)
}

/// Hands the player the `item` × `amount` stored on a chest tile and marks it
/// opened. A full inventory leaves the chest closed.
fn grant_contents(
    ctx: &mut InteractionContext<'_>,
    pos: GridPos,
    meta: &Metadata,
) -> TileboundResult<()> {
    let item_id = meta.text("item").ok_or_else(|| missing(pos, "item"))?;
    let amount = meta_number::<u32>(meta, pos, "amount")?.unwrap_or(1).max(1);
    let item = ctx.world.catalog().item(&item_id)?;

    let Some(player) = ctx.actor.player() else {
        return Ok(());
    };
    if !player.inventory.can_fit(&item, amount) {
        ctx.emit(GameEvent::warning("Your inventory is full."));
        return Ok(());
    }
    player.inventory.add(item, amount);
    ctx.emit(GameEvent::ItemPickedUp {
        item_id,
        count: amount,
    });
    persist_tile(ctx, pos, patch("opened", true))
}

fn take_door(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    if ctx.actor.player().is_none() {
        return Ok(());
    }
    let door = tile_meta(ctx, pos)?
        .text("id")
        .ok_or_else(|| missing(pos, "id"))?;
    let from = ctx.world.current_room();
    let to = ctx.world.set_room_from_id(&door)?;

    let spawn = ctx.world.tilemap.spawn_point();
    if let Some(player) = ctx.actor.player() {
        player.body.set_center(spawn);
        player.body.velocity = Vec2::ZERO;
        player.room = to;
    }
    ctx.emit(GameEvent::RoomChanged { from, to });
    Ok(())
}

fn spike_damage(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    let meta = tile_meta(ctx, pos)?;
    if !meta.flag("raised") {
        return Ok(());
    }
    let damage =
        meta_number::<i32>(&meta, pos, "damage")?.ok_or_else(|| missing(pos, "damage"))?;
    if let Some((target, amount)) = ctx.actor.take_damage(damage) {
        ctx.emit(GameEvent::EntityDamaged { target, amount });
    }
    Ok(())
}

fn toggle_switch(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    let group_id = ctx
        .world
        .tilemap
        .get_tile(pos)
        .and_then(|tile| tile.group.clone());

    let Some(group_id) = group_id else {
        let state = !tile_meta(ctx, pos)?.flag("state");
        return persist_tile(ctx, pos, patch("state", state));
    };

    let group = ctx
        .world
        .tilemap
        .group_mut(&group_id)
        .ok_or_else(|| TileboundError::InvalidState(format!("Unknown tile group '{}'", group_id)))?;
    let state = !group.meta.flag("state");
    let update = patch("state", state);
    group.meta.merge(&update);
    let members: Vec<GridPos> = group.positions.iter().copied().collect();

    for member in members {
        if let Some(tile) = ctx.world.tilemap.get_tile_mut(member) {
            tile.meta.merge(&update);
            tile.sync_state();
        }
    }
    debug!("Group '{}' switched to {}", group_id, state);
    ctx.world.add_meta(MetaKey::Group(group_id), update)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bin {
    Trash,
    Recycling,
}

fn deposit(ctx: &mut InteractionContext<'_>, pos: GridPos, bin: Bin) -> TileboundResult<()> {
    let collected = tile_meta(ctx, pos)?.int("collected").unwrap_or(0);
    let Some(player) = ctx.actor.player() else {
        return Ok(());
    };

    let (is_trash, is_recyclable) = match player.inventory.selected_stack() {
        Some(stack) => (stack.item.is_trash(), stack.item.is_recyclable()),
        None => {
            ctx.emit(GameEvent::info("You have nothing to throw away."));
            return Ok(());
        }
    };
    let accepted = match bin {
        Bin::Trash => is_trash,
        Bin::Recycling => is_recyclable,
    };
    if !accepted {
        let message = match (bin, is_trash, is_recyclable) {
            (Bin::Trash, _, true) => "I cannot put recyclables in the trash!",
            (Bin::Recycling, true, _) => "I cannot put trash in the recyclables!",
            _ => "That doesn't belong in here.",
        };
        ctx.emit(GameEvent::info(message));
        return Ok(());
    }

    let Some(stack) = player.inventory.take_selected() else {
        return Ok(());
    };
    let total = collected + i64::from(stack.count);
    ctx.emit(GameEvent::Deposited {
        tile: pos,
        item_id: stack.item.id,
        count: stack.count,
    });
    persist_tile(ctx, pos, patch("collected", total))
}

fn claim_objective(ctx: &mut InteractionContext<'_>, pos: GridPos) -> TileboundResult<()> {
    if ctx.actor.player().is_none() {
        return Ok(());
    }
    if !ctx.world.room_completed() {
        ctx.emit(GameEvent::info("It won't budge."));
        return Ok(());
    }
    let meta = tile_meta(ctx, pos)?;
    if meta.flag("opened") {
        ctx.emit(GameEvent::info("The chest is empty."));
        return Ok(());
    }
    grant_contents(ctx, pos, &meta)
}

fn pickup_item(ctx: &mut InteractionContext<'_>, key: &ItemKey) -> TileboundResult<()> {
    let Some(item) = ctx
        .world
        .tilemap
        .get_item(key)
        .map(|world_item| world_item.item.clone())
    else {
        return Ok(());
    };
    let Some(player) = ctx.actor.player() else {
        return Ok(());
    };
    if !player.inventory.can_fit(&item, 1) {
        ctx.emit(GameEvent::warning("Your inventory is full."));
        return Ok(());
    }
    let item_id = item.id.clone();
    player.inventory.add(item, 1);
    ctx.world.tilemap.remove_item(key);
    ctx.world
        .add_meta(MetaKey::Item(key.clone()), patch("taken", true))?;
    ctx.emit(GameEvent::ItemPickedUp { item_id, count: 1 });
    Ok(())
}

fn fire_arrow(ctx: &mut InteractionContext<'_>) -> TileboundResult<()> {
    let tile_size = ctx.world.tile_size();
    let Some(player) = ctx.actor.player() else {
        return Ok(());
    };
    let center = player.body.center();
    let mut direction = player.facing.direction();
    if direction == Vec2::ZERO {
        direction = vec2(0.0, 1.0);
    }
    let Some(stack) = player.inventory.selected_stack() else {
        return Ok(());
    };
    if !stack.item.is_ready() {
        return Ok(());
    }
    let kind = stack
        .item
        .meta
        .text("projectile")
        .unwrap_or_else(|| "arrow".to_string());
    let blueprint = ctx.world.catalog().projectile(&kind)?;
    let damage = player.outgoing_damage(blueprint.damage);
    let projectile = blueprint.launch(center, direction, damage, tile_size);
    if let Some(stack) = player.inventory.selected_stack_mut() {
        stack.item.reset_cooldown();
    }

    ctx.events.push(GameEvent::ProjectileFired {
        id: projectile.id,
        kind,
    });
    ctx.spawned.push(projectile);
    Ok(())
}
