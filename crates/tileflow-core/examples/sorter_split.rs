//! Sorter example: a conveyor feeding a sorter with a storage on each side.
//!
//! Registers a handful of items and blocks, builds the layout through the
//! placement protocol, feeds a mixed stream of items and steps the grid.
//! Matching items go straight through; the rest alternate left and right.
//!
//! Run with: `cargo run -p tileflow-core --example sorter_split`

use tileflow_core::block::{BlockDef, BlockKind};
use tileflow_core::cell::CellState;
use tileflow_core::effects::NoEffects;
use tileflow_core::grid::{Grid, World};
use tileflow_core::item::{Inventory, ItemStack};
use tileflow_core::occupancy::OccupancyIndex;
use tileflow_core::placement::{Cues, Placement};
use tileflow_core::registry::RegistryBuilder;
use tileflow_core::research::AllUnlocked;
use tileflow_core::routing::set_filter;
use tileflow_core::rules::Rules;
use tileflow_core::sim::step;
use tileflow_core::spatial::GridPosition;
use tileflow_core::transfer::try_transfer;

fn main() {
    // --- Step 1: Register items and blocks ---

    let mut builder = RegistryBuilder::new();
    let copper = builder.register_item("copper").unwrap();
    let lead = builder.register_item("lead").unwrap();
    let conveyor = builder
        .register_block(
            BlockDef::new("conveyor", BlockKind::Conveyor { capacity: 4 })
                .with_recipe(vec![ItemStack::new(copper, 1)], None),
        )
        .unwrap();
    let sorter = builder
        .register_block(
            BlockDef::new("sorter", BlockKind::Sorter)
                .with_recipe(vec![ItemStack::new(lead, 2), ItemStack::new(copper, 2)], None),
        )
        .unwrap();
    let bin = builder
        .register_block(
            BlockDef::new("bin", BlockKind::Storage { capacity: 50 })
                .with_recipe(vec![ItemStack::new(copper, 5)], None),
        )
        .unwrap();
    let registry = builder.build().unwrap();

    // --- Step 2: One 16x16 dimension, core far away from the layout ---

    let mut world = World::new();
    let dim = world.add_dimension(Grid::new(16, 16, GridPosition::new(14, 14)));
    let mut inventory = Inventory::new();
    inventory.add_item(copper, 100);
    inventory.add_item(lead, 100);
    let rules = Rules::default();
    let occupancy = OccupancyIndex::shared();
    let mut sink = NoEffects;

    // --- Step 3: Build through the placement protocol ---

    {
        let mut placement = Placement {
            world: &mut world,
            inventory: &mut inventory,
            registry: &registry,
            rules: &rules,
            research: &AllUnlocked,
            occupancy: &occupancy,
            sink: &mut sink,
        };
        let layout = [
            (conveyor, 4, 3),
            (sorter, 4, 4),
            (bin, 3, 4),
            (bin, 5, 4),
            (bin, 4, 5),
        ];
        for (block, x, y) in layout {
            assert!(placement.valid_place(x, y, dim, block));
            placement.place_block(dim, x, y, block, 0, Cues::NONE);
        }
    }

    let grid = world.grid_mut(dim).unwrap();
    set_filter(grid, &registry, GridPosition::new(4, 4), lead).unwrap();

    // --- Step 4: Feed and step ---

    for item in [copper, lead, copper, copper] {
        try_transfer(grid, &registry, item, GridPosition::new(4, 3), GridPosition::new(4, 2));
    }
    for tick in 1..=6 {
        let moved = step(&mut world, &registry);
        println!("tick {tick}: moved {moved}");
    }

    // --- Step 5: Report ---

    let grid = world.grid(dim).unwrap();
    for (label, x, y) in [("west", 3, 4), ("east", 5, 4), ("north", 4, 5)] {
        let Some(CellState::Store(store)) = grid.cell(GridPosition::new(x, y)).map(|c| c.state())
        else {
            continue;
        };
        let contents: Vec<String> = store
            .stacks()
            .iter()
            .filter_map(|s| Some(format!("{} x{}", registry.get_item(s.item_type)?.name, s.quantity)))
            .collect();
        println!("{label}: [{}]", contents.join(", "));
    }
}
