//! Tick stepping for buffered item movers, and state hashing.
//!
//! One step visits every cell of a grid in row-major order. Conveyors offer
//! their oldest item to the cell they face; routers offer their held item to
//! each neighbor in turn, starting at their cursor and skipping the cell the
//! item came from. Every move goes through
//! [`try_transfer`](crate::transfer::try_transfer), so the accept/handle
//! discipline holds for the simulation as for any other caller.
//!
//! Items are stamped with the tick they arrive on and only move on a later
//! tick, so an item advances at most one cell per step regardless of scan
//! order.

use crate::cell::CellState;
use crate::fixed::Ticks;
use crate::grid::{Grid, World};
use crate::registry::BlockRegistry;
use crate::spatial::{Direction, GridPosition};
use crate::transfer::try_transfer;

// ---------------------------------------------------------------------------
// Stepping
// ---------------------------------------------------------------------------

/// Advance one grid by a tick. Returns the number of items moved.
pub fn step_grid(grid: &mut Grid, registry: &BlockRegistry) -> u32 {
    grid.advance_tick();
    let tick = grid.tick();
    let mut moved = 0;

    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let pos = GridPosition::new(x, y);
            let Some(cell) = grid.cell(pos) else {
                continue;
            };
            let facing = cell.facing();
            match cell.state() {
                CellState::Queue(queue) => {
                    let Some(front) = queue.front().copied() else {
                        continue;
                    };
                    if front.arrived >= tick {
                        continue;
                    }
                    if try_transfer(grid, registry, front.item_type, pos.step(facing), pos) {
                        if let Some(CellState::Queue(queue)) =
                            grid.cell_mut(pos).map(|c| c.state_mut())
                        {
                            queue.pop();
                        }
                        moved += 1;
                    }
                }
                CellState::Router(router) => {
                    let (Some(held), cursor) = (router.held, router.cursor) else {
                        continue;
                    };
                    if held.arrived >= tick {
                        continue;
                    }
                    for turn in 0..4u8 {
                        let target = pos.step(Direction::from_index(cursor.wrapping_add(turn)));
                        if target == held.from {
                            continue;
                        }
                        if try_transfer(grid, registry, held.item_type, target, pos) {
                            if let Some(CellState::Router(router)) =
                                grid.cell_mut(pos).map(|c| c.state_mut())
                            {
                                router.held = None;
                                router.cursor = (cursor.wrapping_add(turn) + 1) % 4;
                            }
                            moved += 1;
                            break;
                        }
                    }
                }
                CellState::Empty | CellState::Store(_) | CellState::Sorter(_) => {}
            }
        }
    }

    log::trace!("tick {tick}: moved {moved} item(s)");
    moved
}

/// Advance every dimension by one tick. Returns the total items moved.
pub fn step(world: &mut World, registry: &BlockRegistry) -> u32 {
    world.grids_mut().map(|grid| step_grid(grid, registry)).sum()
}

/// Run `ticks` steps. Returns the total items moved.
pub fn run(world: &mut World, registry: &BlockRegistry, ticks: Ticks) -> u64 {
    (0..ticks).map(|_| step(world, registry) as u64).sum()
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A deterministic hash of world state for comparing two runs.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }

    /// Hash every grid: tick, then each cell's block, rotation, dump bit,
    /// link and buffered contents.
    pub fn of_world(world: &World) -> u64 {
        let mut hash = Self::new();
        for grid in world.grids() {
            hash.write_u64(grid.tick());
            for cell in grid.cells() {
                hash.write_u32(cell.block().0);
                hash.write(&[cell.rotation(), cell.dump()]);
                if let Some(link) = cell.link() {
                    hash.write(&link.dx.to_le_bytes());
                    hash.write(&link.dy.to_le_bytes());
                }
                match cell.state() {
                    CellState::Empty => hash.write(&[0]),
                    CellState::Queue(queue) => {
                        hash.write(&[1]);
                        for item in queue.iter() {
                            hash.write_u32(item.item_type.0);
                        }
                    }
                    CellState::Store(store) => {
                        hash.write(&[2]);
                        for stack in store.stacks() {
                            hash.write_u32(stack.item_type.0);
                            hash.write_u32(stack.quantity);
                        }
                    }
                    CellState::Router(router) => {
                        hash.write(&[3, router.cursor]);
                        if let Some(held) = router.held {
                            hash.write_u32(held.item_type.0);
                        }
                    }
                    CellState::Sorter(sorter) => {
                        hash.write(&[4]);
                        hash.write(&sorter.write_config());
                    }
                }
            }
        }
        hash.finish()
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
