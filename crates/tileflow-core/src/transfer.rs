//! The two-phase item hand-off shared by every block kind.
//!
//! [`accept_item`] is a pure feasibility check. [`handle_item`] commits the
//! transfer and must only follow a successful `accept_item` with identical
//! arguments and no intervening mutation. Debug builds assert this.
//!
//! Both resolve `dest` to its primary cell first, so items offered to any
//! cell of a multi-cell structure land in the structure's own state.

use crate::block::BlockKind;
use crate::cell::{CellState, HeldItem};
use crate::grid::Grid;
use crate::id::ItemTypeId;
use crate::registry::BlockRegistry;
use crate::routing;
use crate::spatial::GridPosition;

/// Would a transfer of `item` from `source` into `dest` succeed right now?
pub fn accept_item(
    grid: &Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) -> bool {
    let Some(primary) = grid.resolve(dest) else {
        return false;
    };
    let Some(cell) = grid.cell(primary) else {
        return false;
    };

    match (&registry.def(cell.block()).kind, cell.state()) {
        (BlockKind::Conveyor { .. }, CellState::Queue(queue)) => {
            queue.has_space() && primary.step(cell.facing()) != source
        }
        (BlockKind::Router, CellState::Router(router)) => router.held.is_none(),
        (BlockKind::Sorter, CellState::Sorter(_)) => {
            routing::accept(grid, registry, item, primary, source)
        }
        (BlockKind::Storage { .. } | BlockKind::Core, CellState::Store(store)) => {
            store.has_space_for(1)
        }
        _ => false,
    }
}

/// Commit a transfer previously confirmed by [`accept_item`].
pub fn handle_item(
    grid: &mut Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) {
    debug_assert!(
        accept_item(grid, registry, item, dest, source),
        "handle_item without a successful accept_item: {item:?} into ({}, {}) from ({}, {})",
        dest.x,
        dest.y,
        source.x,
        source.y
    );

    let Some(primary) = grid.resolve(dest) else {
        return;
    };
    let tick = grid.tick();
    let Some(block) = grid.cell(primary).map(|c| c.block()) else {
        return;
    };

    if registry.def(block).kind == BlockKind::Sorter {
        routing::handle(grid, registry, item, primary, source);
        return;
    }

    let Some(cell) = grid.cell_mut(primary) else {
        return;
    };
    match cell.state_mut() {
        CellState::Queue(queue) => {
            let pushed = queue.push(item, tick);
            debug_assert!(pushed, "conveyor at ({}, {}) dropped {item:?}", primary.x, primary.y);
        }
        CellState::Router(router) => {
            router.held = Some(HeldItem {
                item_type: item,
                from: source,
                arrived: tick,
            });
        }
        CellState::Store(store) => {
            let overflow = store.add(item, 1);
            debug_assert_eq!(overflow, 0, "storage at ({}, {}) dropped {item:?}", primary.x, primary.y);
        }
        CellState::Empty | CellState::Sorter(_) => {}
    }
}

/// Propose then commit in one call. Returns whether the item moved.
pub fn try_transfer(
    grid: &mut Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) -> bool {
    if !accept_item(grid, registry, item, dest, source) {
        return false;
    }
    handle_item(grid, registry, item, dest, source);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn air_and_walls_refuse() {
        let mut bed = TestBed::new();
        bed.place(wall(), 3, 3, 0);
        assert!(!accept_item(bed.grid(), &bed.registry, iron(), pos(3, 3), pos(3, 2)));
        assert!(!accept_item(bed.grid(), &bed.registry, iron(), pos(4, 4), pos(4, 3)));
        assert!(!accept_item(bed.grid(), &bed.registry, iron(), pos(-1, 0), pos(0, 0)));
    }

    #[test]
    fn conveyor_refuses_items_from_its_front() {
        let mut bed = TestBed::new();
        // Facing east: its front is (4,3).
        bed.place(conveyor(), 3, 3, 1);
        assert!(accept_item(bed.grid(), &bed.registry, iron(), pos(3, 3), pos(2, 3)));
        assert!(accept_item(bed.grid(), &bed.registry, iron(), pos(3, 3), pos(3, 2)));
        assert!(!accept_item(bed.grid(), &bed.registry, iron(), pos(3, 3), pos(4, 3)));
    }

    #[test]
    fn conveyor_fills_up() {
        let mut bed = TestBed::new();
        bed.place(conveyor(), 3, 3, 1);
        let mut moved = 0;
        while try_transfer(grid_mut(&mut bed.world), &bed.registry, iron(), pos(3, 3), pos(2, 3)) {
            moved += 1;
        }
        assert_eq!(moved, CONVEYOR_CAPACITY);
        assert_eq!(queue_len(bed.grid(), pos(3, 3)), CONVEYOR_CAPACITY as usize);
    }

    #[test]
    fn router_holds_one_item() {
        let mut bed = TestBed::new();
        bed.place(router(), 3, 3, 0);
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, copper(), pos(3, 3), pos(2, 3)));
        assert!(!accept_item(bed.grid(), &bed.registry, copper(), pos(3, 3), pos(2, 3)));
        match bed.grid().cell(pos(3, 3)).unwrap().state() {
            CellState::Router(router) => {
                let held = router.held.unwrap();
                assert_eq!(held.item_type, copper());
                assert_eq!(held.from, pos(2, 3));
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn linked_cells_forward_to_primary() {
        let mut bed = TestBed::new();
        bed.place(vault(), 10, 10, 0);
        // (9, 11) is a linked corner of the vault.
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, iron(), pos(9, 11), pos(8, 11)));
        assert_eq!(stored(bed.grid(), pos(10, 10), iron()), 1);
        assert_eq!(bed.grid().cell(pos(9, 11)).unwrap().state(), &CellState::Empty);
    }

    #[test]
    fn sorter_forwards_on_commit() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(storage(), 5, 6, 0);
        bed.place(storage(), 4, 5, 0);
        bed.place(storage(), 6, 5, 0);

        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, iron(), sorter, pos(5, 4)));
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, copper(), sorter, pos(5, 4)));
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, copper(), sorter, pos(5, 4)));

        assert_eq!(stored(bed.grid(), pos(5, 6), iron()), 1);
        assert_eq!(stored(bed.grid(), pos(4, 5), copper()), 1);
        assert_eq!(stored(bed.grid(), pos(6, 5), copper()), 1);
    }

    #[test]
    fn sorter_refuses_when_target_is_full() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(storage(), 5, 6, 0);
        for _ in 0..STORAGE_CAPACITY {
            assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, iron(), sorter, pos(5, 4)));
        }
        assert!(!accept_item(bed.grid(), &bed.registry, iron(), sorter, pos(5, 4)));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "handle_item without a successful accept_item")]
    fn handle_without_accept_panics_in_debug() {
        let mut bed = TestBed::new();
        bed.place(wall(), 3, 3, 0);
        handle_item(grid_mut(&mut bed.world), &bed.registry, iron(), pos(3, 3), pos(3, 2));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn handle_into_a_full_conveyor_panics_in_debug() {
        let mut bed = TestBed::new();
        bed.place(conveyor(), 3, 3, 1);
        while try_transfer(grid_mut(&mut bed.world), &bed.registry, iron(), pos(3, 3), pos(2, 3)) {}
        handle_item(grid_mut(&mut bed.world), &bed.registry, iron(), pos(3, 3), pos(2, 3));
    }

    #[test]
    fn far_away_sources_are_refused() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(storage(), 5, 6, 0);
        let far = pos(i32::MIN, 5);
        assert!(!accept_item(bed.grid(), &bed.registry, iron(), sorter, far));
        assert_eq!(routing::probe_target(bed.grid(), &bed.registry, iron(), sorter, far), None);
    }
}
