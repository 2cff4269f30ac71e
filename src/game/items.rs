//! # Items
//!
//! Items in the world, in the inventory, and the attributes that modify them.

use crate::config::{ACCESSORY_SLOTS, INVENTORY_SLOTS, ITEMBAR_SLOTS};
use crate::{ImageRef, ItemKey, MetaExt, Metadata, TileboundError, TileboundResult};
use macroquad::math::{Rect, Vec2};
use serde_json::Value;

/// Behaviors an item can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemAction {
    /// Move the item from the world into the inventory
    Pickup,
    /// Fire the projectile named in the `projectile` metadata
    FireArrow,
}

/// Modifiers attached to an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Attribute {
    /// Counts `tick` up to `cooldown`; the item is ready when they meet
    Cooldown,
    /// Can be equipped in an accessory slot
    Accessory,
    /// Belongs in the trash
    Trash,
    /// Belongs in the recycling
    Recyclable,
    /// Adds to maximum health while equipped
    HealthBoost(i32),
    /// Adds immunity frames while equipped
    IFrameBoost(u32),
    /// Multiplies outgoing damage while equipped
    DamageBoost(f32),
    /// Multiplies incoming damage while equipped
    DefenseBoost(f32),
    /// Multiplies movement speed while equipped
    SpeedBoost(f32),
}

impl Attribute {
    /// Advances per-tick state stored in the owning item's metadata.
    pub fn update(&self, meta: &mut Metadata) {
        if let Attribute::Cooldown = self {
            let cooldown = meta.int("cooldown").unwrap_or(0);
            let tick = meta.int("tick").unwrap_or(0);
            if tick < cooldown {
                meta.insert("tick".to_string(), Value::from(tick + 1));
            }
        }
    }
}

/// A game item.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Catalog id
    pub id: String,
    pub display_name: String,
    pub max_stack: u32,
    pub icon: ImageRef,
    /// Runs when the player interacts with the item in the world
    pub interaction: Option<ItemAction>,
    pub left_click: Option<ItemAction>,
    pub right_click: Option<ItemAction>,
    pub meta: Metadata,
    pub attributes: Vec<Attribute>,
}

impl Item {
    /// Creates an item without behaviors.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::{ImageRef, Item};
    ///
    /// let cup = Item::new("paper-cup", "Paper Cup", 64, ImageRef::new("items/paper_cup"));
    /// assert_eq!(cup.max_stack, 64);
    /// ```
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        max_stack: u32,
        icon: ImageRef,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            max_stack: max_stack.max(1),
            icon,
            interaction: None,
            left_click: None,
            right_click: None,
            meta: Metadata::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_interaction(mut self, action: ItemAction) -> Self {
        self.interaction = Some(action);
        self
    }

    pub fn with_left_click(mut self, action: ItemAction) -> Self {
        self.left_click = Some(action);
        self
    }

    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn is_trash(&self) -> bool {
        self.attributes.contains(&Attribute::Trash)
    }

    pub fn is_recyclable(&self) -> bool {
        self.attributes.contains(&Attribute::Recyclable)
    }

    pub fn is_accessory(&self) -> bool {
        self.attributes.contains(&Attribute::Accessory)
    }

    /// Whether a cooldown item may be used. Items without one are always ready.
    pub fn is_ready(&self) -> bool {
        if !self.attributes.contains(&Attribute::Cooldown) {
            return true;
        }
        self.meta.int("tick").unwrap_or(0) >= self.meta.int("cooldown").unwrap_or(0)
    }

    /// Restarts the cooldown after a use.
    pub fn reset_cooldown(&mut self) {
        self.meta.insert("tick".to_string(), Value::from(0));
    }

    /// Runs every attribute's per-tick update.
    pub fn update(&mut self) {
        for attribute in &self.attributes {
            attribute.update(&mut self.meta);
        }
    }
}

/// A number of identical items in one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub item: Item,
    pub count: u32,
}

/// An item lying in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldItem {
    pub key: ItemKey,
    /// Position in tile units; may be fractional
    pub pos: Vec2,
    pub item: Item,
}

impl WorldItem {
    /// Pixel rectangle of the item's icon.
    pub fn icon_rect(&self, tile_size: f32) -> Rect {
        Rect::new(
            self.pos.x * tile_size,
            self.pos.y * tile_size,
            tile_size,
            tile_size,
        )
    }
}

/// The player's items: a slot grid whose first slots are the item bar, plus
/// equipped accessories.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    selected: usize,
    accessories: Vec<Item>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(INVENTORY_SLOTS)
    }
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            selected: 0,
            accessories: Vec::new(),
        }
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    pub fn accessories(&self) -> &[Item] {
        &self.accessories
    }

    /// Adds `count` copies of `item`, topping up existing stacks first.
    /// Returns how many did not fit.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebound::{ImageRef, Inventory, Item};
    ///
    /// let mut inventory = Inventory::new(1);
    /// let bucket = Item::new("bucket", "Bucket", 4, ImageRef::new("items/bucket"));
    /// assert_eq!(inventory.add(bucket.clone(), 3), 0);
    /// assert_eq!(inventory.add(bucket, 3), 2);
    /// assert_eq!(inventory.count_of("bucket"), 4);
    /// ```
    pub fn add(&mut self, item: Item, mut count: u32) -> u32 {
        for stack in self.slots.iter_mut().flatten() {
            if count == 0 {
                return 0;
            }
            if stack.item.id == item.id && stack.count < stack.item.max_stack {
                let moved = (stack.item.max_stack - stack.count).min(count);
                stack.count += moved;
                count -= moved;
            }
        }
        for slot in self.slots.iter_mut().filter(|slot| slot.is_none()) {
            if count == 0 {
                break;
            }
            let moved = item.max_stack.min(count);
            *slot = Some(ItemStack {
                item: item.clone(),
                count: moved,
            });
            count -= moved;
        }
        count
    }

    /// Whether `count` copies of `item` would fit completely.
    pub fn can_fit(&self, item: &Item, count: u32) -> bool {
        let room: u32 = self
            .slots
            .iter()
            .map(|slot| match slot {
                None => item.max_stack,
                Some(stack) if stack.item.id == item.id => {
                    stack.item.max_stack.saturating_sub(stack.count)
                }
                Some(_) => 0,
            })
            .sum();
        room >= count
    }

    /// Total number of items with this id.
    pub fn count_of(&self, id: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|stack| stack.item.id == id)
            .map(|stack| stack.count)
            .sum()
    }

    /// Index of the selected item bar slot.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Selects an item bar slot, clamped to the bar.
    pub fn select(&mut self, slot: usize) {
        let bar = ITEMBAR_SLOTS.min(self.slots.len());
        self.selected = slot.min(bar - 1);
    }

    pub fn selected_stack(&self) -> Option<&ItemStack> {
        self.slots.get(self.selected).and_then(Option::as_ref)
    }

    pub fn selected_stack_mut(&mut self) -> Option<&mut ItemStack> {
        self.slots.get_mut(self.selected).and_then(Option::as_mut)
    }

    /// Empties the selected slot and returns its contents.
    pub fn take_selected(&mut self) -> Option<ItemStack> {
        self.slots.get_mut(self.selected).and_then(Option::take)
    }

    /// Moves one accessory out of the selected slot into an accessory slot.
    pub fn equip_selected(&mut self) -> TileboundResult<()> {
        if self.accessories.len() >= ACCESSORY_SLOTS {
            return Err(TileboundError::InvalidAction(
                "All accessory slots are full".to_string(),
            ));
        }
        let slot = self
            .slots
            .get_mut(self.selected)
            .ok_or_else(|| TileboundError::InvalidAction("No slot selected".to_string()))?;
        let stack = slot
            .as_mut()
            .filter(|stack| stack.item.is_accessory())
            .ok_or_else(|| TileboundError::InvalidAction("That cannot be equipped".to_string()))?;

        let item = stack.item.clone();
        stack.count -= 1;
        if stack.count == 0 {
            *slot = None;
        }
        self.accessories.push(item);
        Ok(())
    }

    /// Returns an equipped accessory to the inventory.
    pub fn unequip(&mut self, index: usize) -> TileboundResult<()> {
        let item = self
            .accessories
            .get(index)
            .cloned()
            .ok_or_else(|| TileboundError::InvalidAction("No accessory in that slot".to_string()))?;
        if !self.can_fit(&item, 1) {
            return Err(TileboundError::InvalidAction("Inventory full".to_string()));
        }
        self.accessories.remove(index);
        self.add(item, 1);
        Ok(())
    }

    /// Ticks attributes of every carried and equipped item.
    pub fn update(&mut self) {
        for stack in self.slots.iter_mut().flatten() {
            stack.item.update();
        }
        for item in &mut self.accessories {
            item.update();
        }
    }
}
