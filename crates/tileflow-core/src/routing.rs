//! Directional sorting: per-item target resolution for the sorter block.
//!
//! A sorter passes items matching its filter straight through and turns
//! everything else aside to one of the two perpendicular neighbors. When
//! both sides can take the item, the cell's dump bit picks one and the
//! commit path flips it, so successive commits alternate sides.
//!
//! Resolution is split into [`probe_target`] (shared borrow, never mutates)
//! and [`commit_target`] (flips the dump bit on a tie). Probe and commit are
//! evaluated independently: if neighbor state changes between the two, the
//! commit may pick a different target than the probe did.

use crate::cell::CellState;
use crate::grid::Grid;
use crate::id::ItemTypeId;
use crate::registry::BlockRegistry;
use crate::spatial::{Direction, GridPosition};
use crate::transfer;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sorter state and its persisted form
// ---------------------------------------------------------------------------

/// Filter configuration of one sorter cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorterState {
    pub sort_item: ItemTypeId,
    pub inverted: bool,
}

impl SorterState {
    pub fn new(sort_item: ItemTypeId) -> Self {
        Self {
            sort_item,
            inverted: false,
        }
    }

    /// True when `item` takes the straight-through path.
    pub fn passes(&self, item: ItemTypeId) -> bool {
        (item == self.sort_item) != self.inverted
    }

    /// Persisted form: item id byte, then 1 if inverted else 0.
    pub fn write_config(&self) -> [u8; 2] {
        [self.sort_item.0 as u8, u8::from(self.inverted)]
    }

    /// Inverse of [`write_config`](Self::write_config). An item id the
    /// registry does not know is fatal: it is never clamped.
    pub fn read_config(bytes: &[u8], registry: &BlockRegistry) -> Result<Self, ConfigError> {
        let [item, flag, ..] = bytes else {
            return Err(ConfigError::Truncated {
                expected: 2,
                found: bytes.len(),
            });
        };
        let sort_item = ItemTypeId(*item as u32);
        if !registry.contains_item(sort_item) {
            return Err(ConfigError::UnknownItem(*item));
        }
        Ok(Self {
            sort_item,
            inverted: *flag == 1,
        })
    }
}

/// Errors from reading or changing block configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("unknown item id {0} in config")]
    UnknownItem(u8),
    #[error("item {0:?} is not registered")]
    UnregisteredItem(ItemTypeId),
    #[error("no sorter at ({}, {})", .0.x, .0.y)]
    NotASorter(GridPosition),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn sorter_mut(grid: &mut Grid, pos: GridPosition) -> Result<&mut SorterState, ConfigError> {
    let primary = grid.resolve(pos).ok_or(ConfigError::NotASorter(pos))?;
    match grid.cell_mut(primary).map(|c| c.state_mut()) {
        Some(CellState::Sorter(state)) => Ok(state),
        _ => Err(ConfigError::NotASorter(pos)),
    }
}

/// The sorter configuration at `pos`, if a sorter is installed there.
pub fn sorter_at(grid: &Grid, pos: GridPosition) -> Option<SorterState> {
    match grid.primary(pos)?.state() {
        CellState::Sorter(state) => Some(*state),
        _ => None,
    }
}

/// Select the item the sorter at `pos` passes straight through.
pub fn set_filter(
    grid: &mut Grid,
    registry: &BlockRegistry,
    pos: GridPosition,
    item: ItemTypeId,
) -> Result<(), ConfigError> {
    if !registry.contains_item(item) {
        return Err(ConfigError::UnregisteredItem(item));
    }
    sorter_mut(grid, pos)?.sort_item = item;
    Ok(())
}

/// Swap which items go straight and which turn.
pub fn set_inverted(grid: &mut Grid, pos: GridPosition, inverted: bool) -> Result<(), ConfigError> {
    sorter_mut(grid, pos)?.inverted = inverted;
    Ok(())
}

/// Apply a persisted two-byte config to the sorter at `pos`.
pub fn load_config(
    grid: &mut Grid,
    registry: &BlockRegistry,
    pos: GridPosition,
    bytes: &[u8],
) -> Result<(), ConfigError> {
    let loaded = SorterState::read_config(bytes, registry)?;
    *sorter_mut(grid, pos)? = loaded;
    Ok(())
}

// ---------------------------------------------------------------------------
// Target resolution
// ---------------------------------------------------------------------------

/// Outcome of resolution before the dump bit is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// Exactly one target: straight ahead, or the only viable side.
    Single(GridPosition),
    /// Both sides viable; `a` is counter-clockwise of travel, `b` clockwise.
    Tie { a: GridPosition, b: GridPosition },
}

fn route(
    grid: &Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) -> Option<Route> {
    let state = sorter_at(grid, dest)?;
    let dir = Direction::between(source, dest)?;

    if state.passes(item) {
        let ahead = dest.step(dir);
        return grid.in_bounds(ahead).then_some(Route::Single(ahead));
    }

    let source_instant = grid
        .primary(source)
        .is_some_and(|c| registry.def(c.block()).instant_transfer);
    let viable = |candidate: GridPosition| {
        let Some(cell) = grid.primary(candidate) else {
            return false;
        };
        // Two zero-latency movers facing each other would bounce an item forever.
        if registry.def(cell.block()).instant_transfer && source_instant {
            return false;
        }
        transfer::accept_item(grid, registry, item, candidate, dest)
    };

    let a = dest.step(dir.rotate_ccw());
    let b = dest.step(dir.rotate_cw());
    match (viable(a), viable(b)) {
        (true, false) => Some(Route::Single(a)),
        (false, true) => Some(Route::Single(b)),
        (true, true) => Some(Route::Tie { a, b }),
        (false, false) => None,
    }
}

/// Where an item from `source` entering the sorter at `dest` would go.
/// Never mutates.
pub fn probe_target(
    grid: &Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) -> Option<GridPosition> {
    match route(grid, registry, item, dest, source)? {
        Route::Single(target) => Some(target),
        Route::Tie { a, b } => {
            let dump = grid.cell(dest).map(|c| c.dump()).unwrap_or(0);
            Some(if dump == 0 { a } else { b })
        }
    }
}

/// Like [`probe_target`], but a tie flips the sorter's dump bit.
pub fn commit_target(
    grid: &mut Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) -> Option<GridPosition> {
    match route(grid, registry, item, dest, source)? {
        Route::Single(target) => Some(target),
        Route::Tie { a, b } => {
            let cell = grid.cell_mut(dest)?;
            let (target, next) = if cell.dump() == 0 { (a, 1) } else { (b, 0) };
            cell.set_dump(next);
            log::trace!(
                "sorter ({}, {}) split {:?} to ({}, {}), dump -> {next}",
                dest.x,
                dest.y,
                item,
                target.x,
                target.y
            );
            Some(target)
        }
    }
}

/// Resolve with an explicit commit flag. `committing == false` is [`probe_target`].
pub fn resolve_target(
    grid: &mut Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
    committing: bool,
) -> Option<GridPosition> {
    if committing {
        commit_target(grid, registry, item, dest, source)
    } else {
        probe_target(grid, registry, item, dest, source)
    }
}

/// Sorter acceptance: a target resolves and that target accepts the item.
pub(crate) fn accept(
    grid: &Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) -> bool {
    probe_target(grid, registry, item, dest, source)
        .is_some_and(|to| transfer::accept_item(grid, registry, item, to, dest))
}

/// Sorter commit: re-resolve (flipping on a tie) and forward the item.
pub(crate) fn handle(
    grid: &mut Grid,
    registry: &BlockRegistry,
    item: ItemTypeId,
    dest: GridPosition,
    source: GridPosition,
) {
    match commit_target(grid, registry, item, dest, source) {
        Some(to) => transfer::handle_item(grid, registry, item, to, dest),
        None => debug_assert!(false, "sorter commit resolved no target"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn passes_truth_table() {
        let state = SorterState::new(iron());
        assert!(state.passes(iron()));
        assert!(!state.passes(copper()));
        let inverted = SorterState {
            inverted: true,
            ..state
        };
        assert!(!inverted.passes(iron()));
        assert!(inverted.passes(copper()));
    }

    #[test]
    fn config_is_two_bytes() {
        let state = SorterState {
            sort_item: copper(),
            inverted: true,
        };
        assert_eq!(state.write_config(), [1, 1]);
        assert_eq!(SorterState::new(iron()).write_config(), [0, 0]);
    }

    #[test]
    fn read_config_round_trips_and_rejects_unknown_items() {
        let registry = standard_registry();
        let state = SorterState::read_config(&[1, 1], &registry).unwrap();
        assert_eq!(state.sort_item, copper());
        assert!(state.inverted);
        assert!(!SorterState::read_config(&[1, 7], &registry).unwrap().inverted);

        assert_eq!(
            SorterState::read_config(&[200, 0], &registry),
            Err(ConfigError::UnknownItem(200))
        );
        assert_eq!(
            SorterState::read_config(&[1], &registry),
            Err(ConfigError::Truncated {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn matching_item_goes_straight() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(conveyor(), 5, 4, 0);
        bed.place(storage(), 5, 6, 0);

        let target = probe_target(bed.grid(), &bed.registry, iron(), sorter, pos(5, 4));
        assert_eq!(target, Some(pos(5, 6)));
    }

    #[test]
    fn straight_target_off_grid_fails() {
        let mut bed = TestBed::new();
        let top = bed.grid().height() as i32 - 1;
        let sorter = bed.place_sorter(5, top, iron());
        let target = probe_target(bed.grid(), &bed.registry, iron(), sorter, pos(5, top - 1));
        assert_eq!(target, None);
    }

    #[test]
    fn non_adjacent_source_fails() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(storage(), 5, 6, 0);
        assert_eq!(
            probe_target(bed.grid(), &bed.registry, iron(), sorter, pos(4, 4)),
            None
        );
        assert_eq!(
            probe_target(bed.grid(), &bed.registry, iron(), sorter, sorter),
            None
        );
    }

    #[test]
    fn single_viable_side_is_chosen() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(storage(), 6, 5, 0);

        let target = probe_target(bed.grid(), &bed.registry, copper(), sorter, pos(5, 4));
        assert_eq!(target, Some(pos(6, 5)));

        let before = bed.grid().cell(sorter).unwrap().dump();
        let committed = commit_target(grid_mut(&mut bed.world), &bed.registry, copper(), sorter, pos(5, 4));
        assert_eq!(committed, Some(pos(6, 5)));
        assert_eq!(bed.grid().cell(sorter).unwrap().dump(), before);
    }

    #[test]
    fn no_viable_side_fails() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(wall(), 4, 5, 0);
        assert_eq!(
            probe_target(bed.grid(), &bed.registry, copper(), sorter, pos(5, 4)),
            None
        );
    }

    #[test]
    fn tie_alternates_only_on_commit() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        bed.place(storage(), 4, 5, 0);
        bed.place(storage(), 6, 5, 0);

        for _ in 0..3 {
            let probed = probe_target(bed.grid(), &bed.registry, copper(), sorter, pos(5, 4));
            assert_eq!(probed, Some(pos(4, 5)));
        }
        assert_eq!(bed.grid().cell(sorter).unwrap().dump(), 0);

        let first = resolve_target(grid_mut(&mut bed.world), &bed.registry, copper(), sorter, pos(5, 4), true);
        assert_eq!(first, Some(pos(4, 5)));
        assert_eq!(bed.grid().cell(sorter).unwrap().dump(), 1);

        let probed = resolve_target(grid_mut(&mut bed.world), &bed.registry, copper(), sorter, pos(5, 4), false);
        assert_eq!(probed, Some(pos(6, 5)));
        assert_eq!(bed.grid().cell(sorter).unwrap().dump(), 1);

        let second = commit_target(grid_mut(&mut bed.world), &bed.registry, copper(), sorter, pos(5, 4));
        assert_eq!(second, Some(pos(6, 5)));
        assert_eq!(bed.grid().cell(sorter).unwrap().dump(), 0);
    }

    #[test]
    fn inverted_sorter_turns_the_filtered_item() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        set_inverted(grid_mut(&mut bed.world), sorter, true).unwrap();
        bed.place(storage(), 4, 5, 0);
        bed.place(storage(), 5, 6, 0);

        assert_eq!(
            probe_target(bed.grid(), &bed.registry, iron(), sorter, pos(5, 4)),
            Some(pos(4, 5))
        );
        assert_eq!(
            probe_target(bed.grid(), &bed.registry, copper(), sorter, pos(5, 4)),
            Some(pos(5, 6))
        );
    }

    #[test]
    fn instant_neighbors_are_skipped_for_instant_sources() {
        let mut bed = TestBed::new();
        // Sorter chain: source sorter at (5,4) feeds the sorter at (5,5).
        bed.place_sorter(5, 4, iron());
        let sorter = bed.place_sorter(5, 5, iron());
        // West side is another sorter that could pass copper on; east is storage.
        bed.place_sorter(4, 5, copper());
        bed.place(storage(), 3, 5, 0);
        bed.place(storage(), 6, 5, 0);

        let target = probe_target(bed.grid(), &bed.registry, copper(), sorter, pos(5, 4));
        assert_eq!(target, Some(pos(6, 5)));

        // From a non-instant source the west sorter is viable again: tie, dump 0 -> west.
        bed.place(conveyor(), 5, 4, 0);
        let target = probe_target(bed.grid(), &bed.registry, copper(), sorter, pos(5, 4));
        assert_eq!(target, Some(pos(4, 5)));
    }

    #[test]
    fn configuration_calls() {
        let mut bed = TestBed::new();
        let sorter = bed.place_sorter(5, 5, iron());
        set_filter(grid_mut(&mut bed.world), &bed.registry, sorter, copper()).unwrap();
        assert_eq!(sorter_at(bed.grid(), sorter).map(|s| s.sort_item), Some(copper()));

        assert_eq!(
            set_filter(grid_mut(&mut bed.world), &bed.registry, sorter, ItemTypeId(99)),
            Err(ConfigError::UnregisteredItem(ItemTypeId(99)))
        );
        assert_eq!(
            set_inverted(grid_mut(&mut bed.world), pos(1, 1), true),
            Err(ConfigError::NotASorter(pos(1, 1)))
        );

        load_config(grid_mut(&mut bed.world), &bed.registry, sorter, &[0, 1]).unwrap();
        assert_eq!(
            sorter_at(bed.grid(), sorter),
            Some(SorterState {
                sort_item: iron(),
                inverted: true
            })
        );
        assert!(load_config(grid_mut(&mut bed.world), &bed.registry, sorter, &[250, 0]).is_err());
        assert_eq!(sorter_at(bed.grid(), sorter).map(|s| s.inverted), Some(true));
    }
}
