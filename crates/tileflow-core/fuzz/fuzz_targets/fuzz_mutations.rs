#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tileflow_core::id::ItemTypeId;
use tileflow_core::placement::Cues;
use tileflow_core::sim::step;
use tileflow_core::test_utils::*;
use tileflow_core::transfer::try_transfer;

/// A structured grid operation for fuzzing.
#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Place { block: u8, x: u8, y: u8, rotation: u8 },
    Break { x: u8, y: u8 },
    Feed { item: u8, x: u8, y: u8 },
    Step,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    ops: Vec<FuzzOp>,
}

fuzz_target!(|input: FuzzInput| {
    let mut bed = TestBed::new();
    let max_ops = input.ops.len().min(200);
    let block_count = bed.registry.block_count() as u8;

    for op in &input.ops[..max_ops] {
        match *op {
            FuzzOp::Place { block, x, y, rotation } => {
                let block = tileflow_core::id::BlockTypeId((block % block_count) as u32);
                let (x, y) = (x as i32 % 44 - 2, y as i32 % 44 - 2);
                let mut placement = bed.placement();
                if placement.valid_place(x, y, DIM, block) {
                    placement.place_block(DIM, x, y, block, rotation % 4, Cues::ALL);
                }
            }
            FuzzOp::Break { x, y } => {
                let (x, y) = (x as i32 % 44 - 2, y as i32 % 44 - 2);
                let mut placement = bed.placement();
                if placement.valid_break(DIM, x, y) {
                    placement.break_block(DIM, x, y, Cues::ALL);
                }
            }
            FuzzOp::Feed { item, x, y } => {
                let item = ItemTypeId((item % 4) as u32);
                let at = pos(x as i32 % 40, y as i32 % 40);
                let from = pos(at.x, at.y - 1);
                try_transfer(grid_mut(&mut bed.world), &bed.registry, item, at, from);
            }
            FuzzOp::Step => {
                step(&mut bed.world, &bed.registry);
            }
        }
    }

    // Multi-cell placement only checks its diagonal, so footprints can clip
    // each other and leave stale links; loading must reject them cleanly
    // rather than panic.
    if let Ok(bytes) = bed.world.serialize() {
        let _ = tileflow_core::grid::World::deserialize(&bytes, &bed.registry);
    }
});
