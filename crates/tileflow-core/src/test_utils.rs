//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::block::{BlockDef, BlockKind};
use crate::cell::CellState;
use crate::effects::EffectLog;
use crate::grid::{Grid, World};
use crate::id::*;
use crate::item::{Inventory, ItemStack};
use crate::occupancy::{OccupancyIndex, SharedOccupancy};
use crate::placement::{Cues, Placement};
use crate::registry::{BlockRegistry, RegistryBuilder};
use crate::research::ResearchTree;
use crate::routing;
use crate::rules::Rules;
use crate::spatial::GridPosition;

// ===========================================================================
// Item constructors
// ===========================================================================

pub fn iron() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn copper() -> ItemTypeId {
    ItemTypeId(1)
}
pub fn lead() -> ItemTypeId {
    ItemTypeId(2)
}
pub fn coal() -> ItemTypeId {
    ItemTypeId(3)
}

// ===========================================================================
// Block constructors (ids in the standard registry)
// ===========================================================================

pub fn wall() -> BlockTypeId {
    BlockTypeId(1)
}
pub fn conveyor() -> BlockTypeId {
    BlockTypeId(2)
}
pub fn router() -> BlockTypeId {
    BlockTypeId(3)
}
pub fn sorter() -> BlockTypeId {
    BlockTypeId(4)
}
/// 1x1 storage holding [`STORAGE_CAPACITY`] items.
pub fn storage() -> BlockTypeId {
    BlockTypeId(5)
}
/// 2x2 storage.
pub fn container() -> BlockTypeId {
    BlockTypeId(6)
}
/// 3x3 storage. Recipe: 50 copper, 20 iron, gated on the "vaults" research.
pub fn vault() -> BlockTypeId {
    BlockTypeId(7)
}
/// 3x3 core.
pub fn core_block() -> BlockTypeId {
    BlockTypeId(8)
}
/// Replaceable debris with no recipe that drops 2 coal.
pub fn scrap_wall() -> BlockTypeId {
    BlockTypeId(9)
}

pub const CONVEYOR_CAPACITY: u32 = 4;
pub const STORAGE_CAPACITY: u32 = 10;

// ===========================================================================
// Registry
// ===========================================================================

/// Items iron, copper, lead, coal and the blocks above, in id order.
pub fn standard_registry() -> BlockRegistry {
    let mut b = RegistryBuilder::new();
    for name in ["iron", "copper", "lead", "coal"] {
        b.register_item(name).unwrap();
    }
    let vaults = TechId(0);

    let defs = [
        BlockDef::new("wall", BlockKind::Wall).with_recipe(vec![ItemStack::new(copper(), 6)], None),
        BlockDef::new(
            "conveyor",
            BlockKind::Conveyor {
                capacity: CONVEYOR_CAPACITY,
            },
        )
        .with_recipe(vec![ItemStack::new(copper(), 1)], None),
        BlockDef::new("router", BlockKind::Router)
            .with_recipe(vec![ItemStack::new(copper(), 3)], None),
        BlockDef::new("sorter", BlockKind::Sorter).with_recipe(
            vec![ItemStack::new(lead(), 2), ItemStack::new(copper(), 2)],
            None,
        ),
        BlockDef::new(
            "storage",
            BlockKind::Storage {
                capacity: STORAGE_CAPACITY,
            },
        )
        .with_recipe(
            vec![ItemStack::new(copper(), 10), ItemStack::new(iron(), 5)],
            None,
        ),
        BlockDef::new("container", BlockKind::Storage { capacity: 100 })
            .with_size(2)
            .with_recipe(
                vec![ItemStack::new(copper(), 20), ItemStack::new(iron(), 10)],
                None,
            ),
        BlockDef::new("vault", BlockKind::Storage { capacity: 300 })
            .with_size(3)
            .with_recipe(
                vec![ItemStack::new(copper(), 50), ItemStack::new(iron(), 20)],
                Some(vaults),
            ),
        BlockDef::new("core", BlockKind::Core).with_size(3),
        BlockDef::new("scrap_wall", BlockKind::Wall)
            .always_replace()
            .with_drops(ItemStack::new(coal(), 2)),
    ];
    for def in defs {
        b.register_block(def).unwrap();
    }
    b.build().unwrap()
}

/// A research tree whose "vaults" node (id 0) is completed.
pub fn unlocked_research() -> ResearchTree {
    let mut tree = ResearchTree::new();
    let vaults = tree.register("vaults", vec![], vec![]).unwrap();
    tree.complete(vaults).unwrap();
    tree
}

// ===========================================================================
// Grid helpers
// ===========================================================================

pub const DIM: DimensionId = DimensionId(0);
pub const GRID_SIZE: u32 = 40;
pub const CORE: GridPosition = GridPosition { x: 30, y: 30 };
pub const SPAWN: GridPosition = GridPosition { x: 36, y: 4 };

pub fn pos(x: i32, y: i32) -> GridPosition {
    GridPosition::new(x, y)
}

/// The test dimension's grid. A free function so callers can borrow
/// `bed.world` mutably next to `&bed.registry`.
pub fn grid_mut(world: &mut World) -> &mut Grid {
    world.grid_mut(DIM).unwrap()
}

/// Items buffered in the queue at `at`, or 0 if it has none.
pub fn queue_len(grid: &Grid, at: GridPosition) -> usize {
    match grid.primary(at).map(|c| c.state()) {
        Some(CellState::Queue(queue)) => queue.len(),
        _ => 0,
    }
}

/// Quantity of `item` in the store at `at`, or 0 if it has none.
pub fn stored(grid: &Grid, at: GridPosition, item: ItemTypeId) -> u32 {
    match grid.primary(at).map(|c| c.state()) {
        Some(CellState::Store(store)) => store.quantity(item),
        _ => 0,
    }
}

// ===========================================================================
// TestBed
// ===========================================================================

/// One 40x40 dimension with the core at [`CORE`], an enemy spawn at
/// [`SPAWN`], a well-stocked inventory and vault research done.
pub struct TestBed {
    pub world: World,
    pub inventory: Inventory,
    pub registry: BlockRegistry,
    pub rules: Rules,
    pub research: ResearchTree,
    pub occupancy: SharedOccupancy,
    pub effects: EffectLog,
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBed {
    pub fn new() -> Self {
        let mut grid = Grid::new(GRID_SIZE, GRID_SIZE, CORE);
        grid.add_spawn(SPAWN);
        let mut world = World::new();
        world.add_dimension(grid);

        let mut inventory = Inventory::new();
        for item in [iron(), copper(), lead(), coal()] {
            inventory.add_item(item, 1000);
        }

        let mut bed = Self {
            world,
            inventory,
            registry: standard_registry(),
            rules: Rules::default(),
            research: unlocked_research(),
            occupancy: OccupancyIndex::shared(),
            effects: EffectLog::new(),
        };
        bed.place(core_block(), CORE.x, CORE.y, 0);
        bed
    }

    pub fn placement(&mut self) -> Placement<'_> {
        Placement {
            world: &mut self.world,
            inventory: &mut self.inventory,
            registry: &self.registry,
            rules: &self.rules,
            research: &self.research,
            occupancy: &self.occupancy,
            sink: &mut self.effects,
        }
    }

    pub fn grid(&self) -> &Grid {
        self.world.grid(DIM).unwrap()
    }

    /// Install a block without validation or cues.
    pub fn place(&mut self, block: BlockTypeId, x: i32, y: i32, rotation: u8) {
        assert!(self.placement().place_block(DIM, x, y, block, rotation, Cues::NONE));
    }

    /// Install a sorter filtering `filter`. Returns its position.
    pub fn place_sorter(&mut self, x: i32, y: i32, filter: ItemTypeId) -> GridPosition {
        self.place(sorter(), x, y, 0);
        let at = pos(x, y);
        let registry = &self.registry;
        let grid = self.world.grid_mut(DIM).unwrap();
        routing::set_filter(grid, registry, at, filter).unwrap();
        at
    }
}
