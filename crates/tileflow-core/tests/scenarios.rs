//! End-to-end scenarios through the public API: build a layout with the
//! placement protocol, feed items, and check where they end up.

use tileflow_core::effects::{BREAK_SOUND, EffectKind, PLACE_SOUND};
use tileflow_core::grid::World;
use tileflow_core::id::{BlockTypeId, ItemTypeId};
use tileflow_core::occupancy::Occupant;
use tileflow_core::placement::Cues;
use tileflow_core::routing::{commit_target, probe_target, set_filter, set_inverted, sorter_at};
use tileflow_core::sim::{StateHash, run};
use tileflow_core::spatial::GridPosition;
use tileflow_core::test_utils::*;
use tileflow_core::transfer::{accept_item, handle_item, try_transfer};

/// Build through the protocol: validate, then place with cues.
fn build(bed: &mut TestBed, block: BlockTypeId, x: i32, y: i32, rotation: u8) {
    let mut placement = bed.placement();
    assert!(placement.valid_place(x, y, DIM, block), "({x}, {y}) rejected");
    assert!(placement.place_block(DIM, x, y, block, rotation, Cues::ALL));
}

// ===========================================================================
// Sorter
// ===========================================================================

#[test]
fn sorter_splits_non_matching_items_between_its_sides() {
    let mut bed = TestBed::new();
    let sorter = bed.place_sorter(5, 5, copper());
    bed.place(storage(), 4, 5, 0);
    bed.place(storage(), 6, 5, 0);
    bed.place(storage(), 5, 6, 0);
    let source = pos(5, 4);

    // Matching items go straight through.
    assert_eq!(probe_target(bed.grid(), &bed.registry, copper(), sorter, source), Some(pos(5, 6)));

    // Non-matching items alternate, starting on the counter-clockwise side.
    let mut seen = Vec::new();
    for _ in 0..4 {
        let grid = grid_mut(&mut bed.world);
        assert!(accept_item(grid, &bed.registry, iron(), sorter, source));
        seen.push(probe_target(grid, &bed.registry, iron(), sorter, source));
        handle_item(grid, &bed.registry, iron(), sorter, source);
    }
    assert_eq!(
        seen,
        vec![Some(pos(4, 5)), Some(pos(6, 5)), Some(pos(4, 5)), Some(pos(6, 5))]
    );
    assert_eq!(stored(bed.grid(), pos(4, 5), iron()), 2);
    assert_eq!(stored(bed.grid(), pos(6, 5), iron()), 2);
    assert_eq!(stored(bed.grid(), pos(5, 6), iron()), 0);
}

#[test]
fn inverted_sorter_swaps_straight_and_sides() {
    let mut bed = TestBed::new();
    let sorter = bed.place_sorter(5, 5, copper());
    set_inverted(grid_mut(&mut bed.world), sorter, true).unwrap();
    bed.place(storage(), 4, 5, 0);
    bed.place(storage(), 6, 5, 0);
    bed.place(storage(), 5, 6, 0);

    assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, iron(), sorter, pos(5, 4)));
    assert_eq!(stored(bed.grid(), pos(5, 6), iron()), 1);
    assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, copper(), sorter, pos(5, 4)));
    assert_eq!(stored(bed.grid(), pos(4, 5), copper()), 1);
}

#[test]
fn blocked_side_takes_no_tie() {
    let mut bed = TestBed::new();
    let sorter = bed.place_sorter(5, 5, copper());
    bed.place(wall(), 4, 5, 0);
    bed.place(storage(), 6, 5, 0);

    for _ in 0..3 {
        let grid = grid_mut(&mut bed.world);
        assert_eq!(commit_target(grid, &bed.registry, iron(), sorter, pos(5, 4)), Some(pos(6, 5)));
    }
    assert_eq!(bed.grid().cell(sorter).unwrap().dump(), 0);
}

#[test]
fn matching_items_pass_straight_through_a_sorter_chain() {
    let mut bed = TestBed::new();
    let first = bed.place_sorter(5, 5, copper());
    bed.place_sorter(5, 6, copper());
    bed.place(storage(), 5, 7, 0);

    assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, copper(), first, pos(5, 4)));
    assert_eq!(stored(bed.grid(), pos(5, 7), copper()), 1);
}

#[test]
fn sorter_fed_by_a_sorter_skips_sorter_sides() {
    let mut bed = TestBed::new();
    bed.place_sorter(5, 4, copper());
    let sorter = bed.place_sorter(5, 5, copper());
    bed.place_sorter(4, 5, iron());
    bed.place(storage(), 3, 5, 0);
    bed.place(storage(), 6, 5, 0);

    // The west side would accept iron, but two sorters never hand off sideways.
    assert!(accept_item(bed.grid(), &bed.registry, iron(), pos(4, 5), sorter));
    for _ in 0..2 {
        let grid = grid_mut(&mut bed.world);
        assert_eq!(commit_target(grid, &bed.registry, iron(), sorter, pos(5, 4)), Some(pos(6, 5)));
    }
    assert_eq!(bed.grid().cell(sorter).unwrap().dump(), 0);
}

#[test]
fn sorter_config_survives_a_snapshot() {
    let mut bed = TestBed::new();
    let sorter = bed.place_sorter(5, 5, lead());
    set_inverted(grid_mut(&mut bed.world), sorter, true).unwrap();

    let bytes = bed.world.serialize().unwrap();
    let restored = World::deserialize(&bytes, &bed.registry).unwrap();
    let state = sorter_at(restored.grid(DIM).unwrap(), sorter).unwrap();
    assert_eq!(state.sort_item, lead());
    assert!(state.inverted);
}

// ===========================================================================
// Placement protocol
// ===========================================================================

#[test]
fn building_a_line_charges_nothing_and_plays_cues() {
    let mut bed = TestBed::new();
    let before = bed.inventory.clone();
    for x in 3..6 {
        build(&mut bed, conveyor(), x, 12, 1);
    }
    assert_eq!(bed.inventory, before);
    assert_eq!(bed.effects.count(EffectKind::Place), 3);
    assert!(bed.effects.sounds.iter().all(|s| s.name == PLACE_SOUND));
    assert_eq!(bed.effects.sounds.len(), 3);
}

#[test]
fn vault_refunds_exactly_once_through_any_member() {
    let mut bed = TestBed::new();
    build(&mut bed, vault(), 10, 10, 0);
    let copper_before = bed.inventory.quantity(copper());
    let iron_before = bed.inventory.quantity(iron());

    let mut placement = bed.placement();
    assert!(placement.valid_break(DIM, 11, 9));
    assert_eq!(placement.break_block(DIM, 11, 9, Cues::ALL), Some(vault()));
    assert!(!placement.valid_break(DIM, 10, 10));

    assert_eq!(bed.inventory.quantity(copper()), copper_before + 25);
    assert_eq!(bed.inventory.quantity(iron()), iron_before + 10);
    assert_eq!(bed.effects.count(EffectKind::Break), 9);
    assert_eq!(
        bed.effects.sounds.iter().filter(|s| s.name == BREAK_SOUND).count(),
        1
    );
    for x in 9..=11 {
        for y in 9..=11 {
            let cell = bed.grid().cell(pos(x, y)).unwrap();
            assert!(cell.block().is_air());
            assert!(!cell.is_linked());
        }
    }
}

#[test]
fn multi_cell_check_only_covers_the_diagonal() {
    let mut bed = TestBed::new();
    build(&mut bed, vault(), 10, 10, 0);

    // The second vault's diagonal (11,7) (12,8) (13,9) is empty, so it is
    // accepted even though its corner (11,9) belongs to the first vault.
    build(&mut bed, vault(), 12, 8, 0);
    assert_eq!(bed.grid().resolve(pos(11, 9)), Some(pos(12, 8)));
    assert_eq!(bed.grid().resolve(pos(11, 10)), Some(pos(10, 10)));
    assert_eq!(bed.grid().resolve(pos(9, 9)), Some(pos(10, 10)));

    // Breaking the first vault clears its whole footprint, clipped cell included.
    assert_eq!(bed.placement().break_block(DIM, 10, 10, Cues::NONE), Some(vault()));
    let clipped = bed.grid().cell(pos(11, 9)).unwrap();
    assert!(clipped.block().is_air());
    assert!(!clipped.is_linked());
    assert_eq!(bed.grid().cell(pos(12, 8)).unwrap().block(), vault());
    assert_eq!(bed.grid().resolve(pos(13, 7)), Some(pos(12, 8)));
}

#[test]
fn multi_cell_placement_can_claim_a_core_corner() {
    let mut bed = TestBed::new();
    // Core occupies (29..=31, 29..=31); this vault's off-diagonal covers (31,29).
    build(&mut bed, vault(), 32, 28, 0);
    assert_eq!(bed.grid().resolve(pos(31, 29)), Some(pos(32, 28)));
    assert_eq!(bed.grid().resolve(pos(30, 30)), Some(CORE));
    assert!(bed.placement().valid_break(DIM, 31, 29));
    assert!(!bed.placement().valid_break(DIM, 30, 30));
}

#[test]
fn stored_items_return_to_the_inventory_on_break() {
    let mut bed = TestBed::new();
    build(&mut bed, storage(), 8, 12, 0);
    for _ in 0..4 {
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, lead(), pos(8, 12), pos(8, 11)));
    }
    let lead_before = bed.inventory.quantity(lead());
    bed.placement().break_block(DIM, 8, 12, Cues::NONE);
    assert_eq!(bed.inventory.quantity(lead()), lead_before + 4);
}

#[test]
fn hostile_in_the_footprint_blocks_placement_until_it_leaves() {
    let mut bed = TestBed::new();
    let (wx, wy) = pos(12, 12).to_world(bed.rules.tile_size);
    let id = bed.occupancy.lock().insert(Occupant::hostile(DIM, wx, wy, 6.0));

    assert!(!bed.placement().valid_place(12, 12, DIM, wall()));
    assert!(bed.occupancy.lock().move_to(id, wx + 80.0, wy));
    assert!(bed.placement().valid_place(12, 12, DIM, wall()));
}

#[test]
fn core_cannot_be_broken() {
    let mut bed = TestBed::new();
    for (x, y) in [(29, 29), (30, 30), (31, 31), (29, 31)] {
        assert!(!bed.placement().valid_break(DIM, x, y));
    }
}

// ===========================================================================
// Simulation
// ===========================================================================

#[test]
fn conveyor_into_sorter_distributes_over_time() {
    let mut bed = TestBed::new();
    build(&mut bed, conveyor(), 5, 14, 0);
    build(&mut bed, sorter(), 5, 15, 0);
    routing_filter(&mut bed, pos(5, 15), iron());
    build(&mut bed, storage(), 4, 15, 0);
    build(&mut bed, storage(), 6, 15, 0);
    build(&mut bed, storage(), 5, 16, 0);

    let feed = [iron(), copper(), copper(), iron()];
    for item in feed {
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, item, pos(5, 14), pos(5, 13)));
    }
    let moved = run(&mut bed.world, &bed.registry, 10);
    assert_eq!(moved, 4);
    assert_eq!(stored(bed.grid(), pos(5, 16), iron()), 2);
    assert_eq!(stored(bed.grid(), pos(4, 15), copper()), 1);
    assert_eq!(stored(bed.grid(), pos(6, 15), copper()), 1);
}

#[test]
fn replaying_a_layout_is_deterministic() {
    let play = || {
        let mut bed = TestBed::new();
        bed.place(router(), 10, 10, 0);
        for (x, y) in [(10, 11), (11, 10), (9, 10)] {
            bed.place(storage(), x, y, 0);
        }
        for item in [iron(), copper(), lead(), coal(), iron()] {
            try_transfer(grid_mut(&mut bed.world), &bed.registry, item, pos(10, 10), pos(10, 9));
            run(&mut bed.world, &bed.registry, 2);
        }
        StateHash::of_world(&bed.world)
    };
    assert_eq!(play(), play());
}

fn routing_filter(bed: &mut TestBed, at: GridPosition, item: ItemTypeId) {
    set_filter(grid_mut(&mut bed.world), &bed.registry, at, item).unwrap();
}
