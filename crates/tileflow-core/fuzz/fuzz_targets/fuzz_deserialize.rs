#![no_main]
use libfuzzer_sys::fuzz_target;
use tileflow_core::grid::World;
use tileflow_core::test_utils::standard_registry;

fuzz_target!(|data: &[u8]| {
    // Arbitrary snapshot bytes must decode or fail cleanly, never panic.
    let registry = standard_registry();
    let _ = World::deserialize(data, &registry);
});
