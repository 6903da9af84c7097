//! Save/load example: snapshot round-trip.
//!
//! Builds a small conveyor line, runs 5 ticks, serializes the world to bytes,
//! deserializes it against the same registry, and verifies the state hash
//! matches.
//!
//! Run with: `cargo run -p tileflow-core --example save_load --features test-utils`

use tileflow_core::grid::World;
use tileflow_core::sim::{StateHash, run};
use tileflow_core::test_utils::*;
use tileflow_core::transfer::try_transfer;

fn main() {
    let mut bed = TestBed::new();
    for x in 2..8 {
        bed.place(conveyor(), x, 10, 1);
    }
    bed.place(storage(), 8, 10, 0);
    for item in [iron(), copper(), lead()] {
        try_transfer(grid_mut(&mut bed.world), &bed.registry, item, pos(2, 10), pos(1, 10));
    }
    run(&mut bed.world, &bed.registry, 5);

    let bytes = bed.world.serialize().unwrap();
    println!("snapshot: {} bytes", bytes.len());

    let restored = World::deserialize(&bytes, &bed.registry).unwrap();
    let before = StateHash::of_world(&bed.world);
    let after = StateHash::of_world(&restored);
    println!("hash before: {before:#018x}");
    println!("hash after:  {after:#018x}");
    assert_eq!(before, after);
}
