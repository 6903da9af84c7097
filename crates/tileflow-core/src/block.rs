//! Block types: the capability set every block kind exposes to placement
//! and item routing.
//!
//! A [`BlockDef`] carries the static traits (size, solidity, replacement
//! rules, drops, recipe). Per-cell behavior is dispatched on [`BlockKind`]
//! by the transfer functions in [`crate::transfer`].

use crate::cell::{CellState, RouterState};
use crate::id::{ItemTypeId, TechId};
use crate::item::{ItemQueue, ItemStack, ItemStore};
use crate::routing::SorterState;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BlockKind
// ---------------------------------------------------------------------------

/// The behavior variant of a block type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// The empty block.
    Air,
    /// Static obstacle. Accepts no items.
    Wall,
    /// Moves items toward the cell it faces. Refuses items coming from that cell.
    Conveyor { capacity: u32 },
    /// Holds one item and passes it to its neighbors in rotation.
    Router,
    /// Directional filter: matching items pass straight, others turn aside.
    Sorter,
    /// Bounded container.
    Storage { capacity: u32 },
    /// The protected structure. Unbounded container.
    Core,
}

impl BlockKind {
    /// Fresh per-cell state for a newly installed block of this kind.
    pub fn new_state(&self, default_filter: ItemTypeId) -> CellState {
        match self {
            BlockKind::Air | BlockKind::Wall => CellState::Empty,
            BlockKind::Conveyor { capacity } => CellState::Queue(ItemQueue::new(*capacity)),
            BlockKind::Router => CellState::Router(RouterState::default()),
            BlockKind::Sorter => CellState::Sorter(SorterState::new(default_filter)),
            BlockKind::Storage { capacity } => CellState::Store(ItemStore::new(Some(*capacity))),
            BlockKind::Core => CellState::Store(ItemStore::new(None)),
        }
    }

    /// Whether this kind may overwrite a block of kind `other` in place.
    pub fn can_replace(&self, other: &BlockKind) -> bool {
        match self {
            BlockKind::Conveyor { .. } => matches!(other, BlockKind::Conveyor { .. }),
            BlockKind::Router => matches!(other, BlockKind::Conveyor { .. }),
            BlockKind::Sorter => {
                matches!(other, BlockKind::Conveyor { .. } | BlockKind::Router)
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// What it costs to build a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub requirements: Vec<ItemStack>,
    /// Research that must be unlocked first. `None` is always available.
    pub research: Option<TechId>,
}

// ---------------------------------------------------------------------------
// BlockDef
// ---------------------------------------------------------------------------

/// A block type definition in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDef {
    pub name: String,
    pub kind: BlockKind,
    /// Footprint edge length in cells. Footprint is `size x size`.
    pub size: u32,
    pub solid: bool,
    /// Becomes solid once built; treated like `solid` by placement.
    pub solidifies: bool,
    /// Any placement may overwrite this block.
    pub always_replace: bool,
    /// Hands items on within the same transfer (zero latency).
    pub instant_transfer: bool,
    pub breakable: bool,
    /// Intrinsic item refunded when broken, on top of the recipe refund.
    pub drops: Option<ItemStack>,
    /// Recipe producing this block. Blocks without one cannot be placed.
    pub recipe: Option<Recipe>,
}

impl BlockDef {
    /// A 1x1 definition with the traits conventional for `kind`.
    pub fn new(name: &str, kind: BlockKind) -> Self {
        let solid = matches!(
            kind,
            BlockKind::Wall
                | BlockKind::Router
                | BlockKind::Sorter
                | BlockKind::Storage { .. }
                | BlockKind::Core
        );
        Self {
            name: name.to_string(),
            instant_transfer: kind == BlockKind::Sorter,
            breakable: !matches!(kind, BlockKind::Air | BlockKind::Core),
            kind,
            size: 1,
            solid,
            solidifies: false,
            always_replace: false,
            drops: None,
            recipe: None,
        }
    }

    pub fn air() -> Self {
        Self::new("air", BlockKind::Air)
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_recipe(mut self, requirements: Vec<ItemStack>, research: Option<TechId>) -> Self {
        self.recipe = Some(Recipe {
            requirements,
            research,
        });
        self
    }

    pub fn with_drops(mut self, drops: ItemStack) -> Self {
        self.drops = Some(drops);
        self
    }

    pub fn always_replace(mut self) -> Self {
        self.always_replace = true;
        self
    }

    pub fn is_multi_cell(&self) -> bool {
        self.size > 1
    }

    /// Solid now or once built.
    pub fn blocks_movement(&self) -> bool {
        self.solid || self.solidifies
    }

    /// Offset from the primary cell to the footprint's low corner, per axis.
    pub fn footprint_offset(&self) -> i32 {
        -((self.size as i32 - 1) / 2)
    }

    /// World-space shift from the primary cell centre to the footprint centre.
    /// Even sizes extend one extra cell toward +x/+y.
    pub fn place_offset(&self, tile_size: f32) -> (f32, f32) {
        let shift = if self.size % 2 == 0 {
            tile_size / 2.0
        } else {
            0.0
        };
        (shift, shift)
    }

    pub fn can_replace(&self, other: &BlockDef) -> bool {
        self.kind.can_replace(&other.kind)
    }
}
