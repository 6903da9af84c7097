//! A single grid position and the block-specific state it owns.

use crate::block::BlockKind;
use crate::fixed::Ticks;
use crate::id::{BlockTypeId, ItemTypeId};
use crate::item::{Inventory, ItemQueue, ItemStore};
use crate::routing::SorterState;
use crate::spatial::{Direction, GridPosition};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-cell state
// ---------------------------------------------------------------------------

/// An item held by a router together with the cell it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldItem {
    pub item_type: ItemTypeId,
    pub from: GridPosition,
    pub arrived: Ticks,
}

/// Router state: one held item and the next direction to try.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterState {
    pub held: Option<HeldItem>,
    pub cursor: u8,
}

/// Block-specific payload owned by a cell. Its variant always matches the
/// installed block's kind; linked cells carry `Empty`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Empty,
    Queue(ItemQueue),
    Store(ItemStore),
    Router(RouterState),
    Sorter(SorterState),
}

impl CellState {
    /// Credit every buffered item to `inventory`. Returns the number refunded.
    pub fn drain_into(&self, inventory: &mut Inventory) -> u64 {
        let mut refunded = 0u64;
        match self {
            CellState::Queue(queue) => {
                for item in queue.iter() {
                    inventory.add_item(item.item_type, 1);
                    refunded += 1;
                }
            }
            CellState::Store(store) => {
                for stack in store.stacks() {
                    inventory.add_item(stack.item_type, stack.quantity);
                    refunded += stack.quantity as u64;
                }
            }
            CellState::Router(router) => {
                if let Some(held) = router.held {
                    inventory.add_item(held.item_type, 1);
                    refunded += 1;
                }
            }
            CellState::Empty | CellState::Sorter(_) => {}
        }
        refunded
    }
}

// ---------------------------------------------------------------------------
// LinkOffset
// ---------------------------------------------------------------------------

/// Signed offset from a linked cell to the primary cell of its structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkOffset {
    pub dx: i32,
    pub dy: i32,
}

impl LinkOffset {
    /// Offset that leads from `from` to `primary`.
    pub fn toward(from: GridPosition, primary: GridPosition) -> Self {
        Self {
            dx: primary.x - from.x,
            dy: primary.y - from.y,
        }
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One grid position. Mutated only through the grid's placement entry points
/// and the routing configuration calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    position: GridPosition,
    block: BlockTypeId,
    rotation: u8,
    link: Option<LinkOffset>,
    dump: u8,
    state: CellState,
}

impl Cell {
    pub(crate) fn new(position: GridPosition) -> Self {
        Self {
            position,
            block: BlockTypeId::AIR,
            rotation: 0,
            link: None,
            dump: 0,
            state: CellState::Empty,
        }
    }

    pub fn position(&self) -> GridPosition {
        self.position
    }

    pub fn block(&self) -> BlockTypeId {
        self.block
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Direction the installed block faces.
    pub fn facing(&self) -> Direction {
        Direction::from_index(self.rotation)
    }

    pub fn link(&self) -> Option<LinkOffset> {
        self.link
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// Position of the primary cell this one belongs to (itself when unlinked).
    pub fn primary_position(&self) -> GridPosition {
        match self.link {
            Some(link) => self.position.translate(link.dx, link.dy),
            None => self.position,
        }
    }

    pub fn dump(&self) -> u8 {
        self.dump
    }

    pub fn state(&self) -> &CellState {
        &self.state
    }

    /// Install a block as a self-owning cell. Block, rotation and state are
    /// replaced together; any link is dropped.
    pub(crate) fn set_block(
        &mut self,
        block: BlockTypeId,
        kind: &BlockKind,
        rotation: u8,
        default_filter: ItemTypeId,
    ) {
        self.block = block;
        self.rotation = rotation % 4;
        self.link = None;
        self.dump = 0;
        self.state = kind.new_state(default_filter);
    }

    /// Make this cell a non-primary member of the structure at `primary`.
    pub(crate) fn set_linked(&mut self, block: BlockTypeId, primary: GridPosition) {
        self.block = block;
        self.rotation = 0;
        self.link = Some(LinkOffset::toward(self.position, primary));
        self.dump = 0;
        self.state = CellState::Empty;
    }

    /// Reset to air.
    pub(crate) fn clear(&mut self) {
        self.set_block(BlockTypeId::AIR, &BlockKind::Air, 0, ItemTypeId(0));
    }

    pub(crate) fn set_dump(&mut self, dump: u8) {
        self.dump = dump;
    }

    pub(crate) fn state_mut(&mut self) -> &mut CellState {
        &mut self.state
    }
}
