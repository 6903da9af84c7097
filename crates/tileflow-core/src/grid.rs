//! Dense cell grids, one per dimension.
//!
//! A [`Grid`] exclusively owns its cells in a row-major `Vec`. Multi-cell
//! structures are tracked by [`LinkOffset`](crate::cell::LinkOffset)s stored
//! in the non-primary cells, never by references between cells.

use crate::block::BlockDef;
use crate::cell::Cell;
use crate::fixed::Ticks;
use crate::id::{BlockTypeId, DimensionId, ItemTypeId};
use crate::spatial::{Direction, GridPosition};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A bounded 2D array of cells with its spawn points and core position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    spawns: Vec<GridPosition>,
    core: GridPosition,
    /// Simulation tick this grid has advanced to.
    tick: Ticks,
}

impl Grid {
    /// An all-air grid. `core` marks where the protected structure lives.
    pub fn new(width: u32, height: u32, core: GridPosition) -> Self {
        let cells = (0..height as i32)
            .flat_map(|y| (0..width as i32).map(move |x| Cell::new(GridPosition::new(x, y))))
            .collect();
        Self {
            width,
            height,
            cells,
            spawns: Vec::new(),
            core,
            tick: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    // -- Spawns and core --

    pub fn add_spawn(&mut self, pos: GridPosition) {
        self.spawns.push(pos);
    }

    /// Enemy spawn points, read by placement validation.
    pub fn spawn_points(&self) -> &[GridPosition] {
        &self.spawns
    }

    /// Position of the protected core structure.
    pub fn core_position(&self) -> GridPosition {
        self.core
    }

    /// The cell in front of the core where players appear. Solid blocks may not go here.
    pub fn player_spawn_cell(&self) -> GridPosition {
        self.core.translate(0, -2)
    }

    pub fn is_player_spawn(&self, pos: GridPosition) -> bool {
        pos == self.player_spawn_cell()
    }

    // -- Lookup --

    fn index(&self, pos: GridPosition) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i32 || pos.y >= self.height as i32 {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        self.index(pos).is_some()
    }

    /// Bounds-checked lookup. Out of bounds is `None`, not an error.
    pub fn cell(&self, pos: GridPosition) -> Option<&Cell> {
        self.cells.get(self.index(pos)?)
    }

    pub fn cell_at(&self, x: i32, y: i32) -> Option<&Cell> {
        self.cell(GridPosition::new(x, y))
    }

    pub(crate) fn cell_mut(&mut self, pos: GridPosition) -> Option<&mut Cell> {
        let index = self.index(pos)?;
        self.cells.get_mut(index)
    }

    /// The neighbor of `pos` in `dir`.
    pub fn nearby(&self, pos: GridPosition, dir: Direction) -> Option<&Cell> {
        self.cell(pos.step(dir))
    }

    /// Position of the primary cell owning `pos`, following its link if any.
    pub fn resolve(&self, pos: GridPosition) -> Option<GridPosition> {
        let primary = self.cell(pos)?.primary_position();
        self.in_bounds(primary).then_some(primary)
    }

    /// The primary cell owning `pos`.
    pub fn primary(&self, pos: GridPosition) -> Option<&Cell> {
        self.cell(self.resolve(pos)?)
    }

    /// Row-major iterator over every cell.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    // -- Footprints --

    /// Every position of a `def`-sized footprint whose primary is `primary`,
    /// including positions outside the grid.
    pub fn footprint(primary: GridPosition, def: &BlockDef) -> impl Iterator<Item = GridPosition> {
        let size = def.size as i32;
        let offset = def.footprint_offset();
        (0..size).flat_map(move |dx| {
            (0..size).map(move |dy| primary.translate(dx + offset, dy + offset))
        })
    }

    /// The existing cells of the structure at `primary`.
    pub fn linked_cells(&self, primary: GridPosition, def: &BlockDef) -> Vec<GridPosition> {
        Self::footprint(primary, def)
            .filter(|&p| self.in_bounds(p))
            .collect()
    }

    // -- Mutation (crate-internal; see `placement`) --

    pub(crate) fn install(
        &mut self,
        pos: GridPosition,
        block: BlockTypeId,
        def: &BlockDef,
        rotation: u8,
        default_filter: ItemTypeId,
    ) -> bool {
        match self.cell_mut(pos) {
            Some(cell) => {
                cell.set_block(block, &def.kind, rotation, default_filter);
                true
            }
            None => false,
        }
    }

    pub(crate) fn link(&mut self, pos: GridPosition, block: BlockTypeId, primary: GridPosition) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.set_linked(block, primary);
        }
    }

    pub(crate) fn clear(&mut self, pos: GridPosition) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// All dimensions. Each [`DimensionId`] selects one independent grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    grids: Vec<Grid>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grid as a new dimension. Returns its ID.
    pub fn add_dimension(&mut self, grid: Grid) -> DimensionId {
        let id = DimensionId(self.grids.len() as u32);
        self.grids.push(grid);
        id
    }

    pub fn grid(&self, dim: DimensionId) -> Option<&Grid> {
        self.grids.get(dim.0 as usize)
    }

    pub fn grid_mut(&mut self, dim: DimensionId) -> Option<&mut Grid> {
        self.grids.get_mut(dim.0 as usize)
    }

    pub fn grids(&self) -> impl Iterator<Item = &Grid> {
        self.grids.iter()
    }

    pub fn grids_mut(&mut self) -> impl Iterator<Item = &mut Grid> {
        self.grids.iter_mut()
    }

    pub fn dimension_count(&self) -> usize {
        self.grids.len()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = DimensionId> {
        (0..self.grids.len() as u32).map(DimensionId)
    }

    /// Bounds-checked lookup scoped to a dimension.
    pub fn cell_at(&self, dim: DimensionId, x: i32, y: i32) -> Option<&Cell> {
        self.grid(dim)?.cell_at(x, y)
    }

    /// Spawn points of a dimension; empty for unknown dimensions.
    pub fn spawn_points(&self, dim: DimensionId) -> &[GridPosition] {
        self.grid(dim).map(Grid::spawn_points).unwrap_or(&[])
    }

    pub fn core_position(&self, dim: DimensionId) -> Option<GridPosition> {
        self.grid(dim).map(Grid::core_position)
    }
}
