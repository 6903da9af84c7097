use crate::fixed::Ticks;
use crate::id::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// A quantity of one item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory (the player's stockpile)
// ---------------------------------------------------------------------------

/// Shared stockpile read by placement checks and credited by refunds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    counts: BTreeMap<ItemTypeId, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit items. Saturates at `u32::MAX` per type.
    pub fn add_item(&mut self, item_type: ItemTypeId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let count = self.counts.entry(item_type).or_insert(0);
        *count = count.saturating_add(quantity);
    }

    /// Remove items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove_item(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        let Some(count) = self.counts.get_mut(&item_type) else {
            return 0;
        };
        let removed = quantity.min(*count);
        *count -= removed;
        if *count == 0 {
            self.counts.remove(&item_type);
        }
        removed
    }

    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.counts.get(&item_type).copied().unwrap_or(0)
    }

    /// True if every stack is covered. Stacks naming the same item add up.
    pub fn has_items(&self, requirements: &[ItemStack]) -> bool {
        let mut needed: BTreeMap<ItemTypeId, u64> = BTreeMap::new();
        for stack in requirements {
            *needed.entry(stack.item_type).or_insert(0) += stack.quantity as u64;
        }
        needed
            .iter()
            .all(|(&item, &amount)| self.quantity(item) as u64 >= amount)
    }

    /// Remove every stack if all are present; otherwise leave the inventory untouched.
    pub fn take_items(&mut self, requirements: &[ItemStack]) -> bool {
        if !self.has_items(requirements) {
            return false;
        }
        for stack in requirements {
            let _ = self.remove_item(stack.item_type, stack.quantity);
        }
        true
    }

    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemStack> + '_ {
        self.counts
            .iter()
            .map(|(&item_type, &quantity)| ItemStack::new(item_type, quantity))
    }
}

// ---------------------------------------------------------------------------
// Per-cell item buffers
// ---------------------------------------------------------------------------

/// An item sitting in a buffer, stamped with the tick it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferedItem {
    pub item_type: ItemTypeId,
    pub arrived: Ticks,
}

/// FIFO buffer for movers such as conveyors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQueue {
    items: VecDeque<BufferedItem>,
    capacity: u32,
}

impl ItemQueue {
    pub fn new(capacity: u32) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    pub fn has_space(&self) -> bool {
        (self.items.len() as u64) < self.capacity as u64
    }

    /// Append an item. Returns false (and drops nothing) when full.
    pub fn push(&mut self, item_type: ItemTypeId, arrived: Ticks) -> bool {
        if !self.has_space() {
            return false;
        }
        self.items.push_back(BufferedItem { item_type, arrived });
        true
    }

    pub fn front(&self) -> Option<&BufferedItem> {
        self.items.front()
    }

    pub fn pop(&mut self) -> Option<BufferedItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &BufferedItem> {
        self.items.iter()
    }
}

/// Counted container for storage-like blocks. `None` capacity is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStore {
    stacks: Vec<ItemStack>,
    capacity: Option<u32>,
}

impl ItemStore {
    pub fn new(capacity: Option<u32>) -> Self {
        Self {
            stacks: Vec::new(),
            capacity,
        }
    }

    /// Total items across all types.
    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.quantity).sum()
    }

    /// Check if the store has room for a specific quantity.
    pub fn has_space_for(&self, quantity: u32) -> bool {
        match self.capacity {
            Some(capacity) => self.total().saturating_add(quantity) <= capacity,
            None => self.total().checked_add(quantity).is_some(),
        }
    }

    /// Add items. Returns the amount that didn't fit.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn add(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        let space = match self.capacity {
            Some(capacity) => capacity.saturating_sub(self.total()),
            None => u32::MAX - self.total(),
        };
        let to_add = quantity.min(space);
        if to_add > 0 {
            if let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) {
                stack.quantity += to_add;
            } else {
                self.stacks.push(ItemStack::new(item_type, to_add));
            }
        }
        quantity - to_add
    }

    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }
}
