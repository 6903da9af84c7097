//! Binary world snapshots via `bitcode` with a versioned header.
//!
//! A snapshot carries every grid with its cells, links, per-cell state and
//! tick. Decoding checks the header first, then [`World::validate`] checks
//! the decoded world against a registry: an id the registry never issued is
//! a fatal load error, never clamped.

use crate::cell::CellState;
use crate::grid::World;
use crate::id::{BlockTypeId, DimensionId, ItemTypeId};
use crate::registry::BlockRegistry;
use crate::spatial::GridPosition;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a tileflow world snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x711E_F10A;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("unknown block {block:?} at ({}, {}) in {dim:?}", .pos.x, .pos.y)]
    UnknownBlock {
        dim: DimensionId,
        pos: GridPosition,
        block: BlockTypeId,
    },
    #[error("unknown item {item:?} at ({}, {}) in {dim:?}", .pos.x, .pos.y)]
    UnknownItem {
        dim: DimensionId,
        pos: GridPosition,
        item: ItemTypeId,
    },
    #[error("cell ({}, {}) in {dim:?} links to an invalid primary", .pos.x, .pos.y)]
    BrokenLink { dim: DimensionId, pos: GridPosition },
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every snapshot for format detection and version checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    pub dimensions: u32,
}

impl SnapshotHeader {
    pub fn new(dimensions: u32) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            dimensions,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct WorldSnapshot {
    header: SnapshotHeader,
    world: World,
}

// ---------------------------------------------------------------------------
// World serialization
// ---------------------------------------------------------------------------

impl World {
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = WorldSnapshot {
            header: SnapshotHeader::new(self.dimension_count() as u32),
            world: self.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode a snapshot and validate it against `registry`.
    pub fn deserialize(data: &[u8], registry: &BlockRegistry) -> Result<Self, DeserializeError> {
        let snapshot: WorldSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        snapshot.world.validate(registry)?;
        log::debug!(
            "loaded world snapshot: {} dimension(s)",
            snapshot.world.dimension_count()
        );
        Ok(snapshot.world)
    }

    /// Check every block and item id against `registry` and every link
    /// against its primary.
    pub fn validate(&self, registry: &BlockRegistry) -> Result<(), DeserializeError> {
        for (dim, grid) in self.dimensions().zip(self.grids()) {
            for cell in grid.cells() {
                let pos = cell.position();
                let block = cell.block();
                if registry.get_block(block).is_none() {
                    return Err(DeserializeError::UnknownBlock { dim, pos, block });
                }

                if cell.is_linked() {
                    let primary = grid.cell(cell.primary_position());
                    let consistent = primary.is_some_and(|p| !p.is_linked() && p.block() == block);
                    if !consistent {
                        return Err(DeserializeError::BrokenLink { dim, pos });
                    }
                }

                let unknown = |item: ItemTypeId| {
                    (!registry.contains_item(item))
                        .then_some(DeserializeError::UnknownItem { dim, pos, item })
                };
                let found = match cell.state() {
                    CellState::Empty => None,
                    CellState::Queue(queue) => queue.iter().find_map(|i| unknown(i.item_type)),
                    CellState::Store(store) => store.stacks().iter().find_map(|s| unknown(s.item_type)),
                    CellState::Router(router) => router.held.and_then(|h| unknown(h.item_type)),
                    CellState::Sorter(sorter) => unknown(sorter.sort_item),
                };
                if let Some(err) = found {
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockDef, BlockKind};
    use crate::grid::Grid;
    use crate::test_utils::*;
    use crate::transfer::try_transfer;

    #[test]
    fn world_round_trips() {
        let mut bed = TestBed::new();
        bed.place(vault(), 10, 10, 0);
        let sorter = bed.place_sorter(5, 5, copper());
        bed.place(conveyor(), 5, 4, 0);
        bed.place(storage(), 4, 5, 0);
        bed.place(storage(), 6, 5, 0);
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, iron(), sorter, pos(5, 4)));
        assert!(try_transfer(grid_mut(&mut bed.world), &bed.registry, lead(), pos(5, 4), pos(5, 3)));

        let bytes = bed.world.serialize().unwrap();
        let restored = World::deserialize(&bytes, &bed.registry).unwrap();
        assert_eq!(restored, bed.world);
        assert_eq!(restored.cell_at(DIM, 5, 5).unwrap().dump(), 1);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let registry = standard_registry();
        assert!(matches!(
            World::deserialize(&[1, 2, 3], &registry),
            Err(DeserializeError::Decode(_))
        ));
    }

    #[test]
    fn header_versions_are_checked() {
        let mut header = SnapshotHeader::new(1);
        assert!(header.validate().is_ok());
        header.version = FORMAT_VERSION + 1;
        assert_eq!(header.validate(), Err(DeserializeError::FutureVersion(FORMAT_VERSION + 1)));
        header.version = 0;
        assert_eq!(header.validate(), Err(DeserializeError::UnsupportedVersion(0)));
        header.magic = 0;
        assert_eq!(header.validate(), Err(DeserializeError::InvalidMagic(0)));
    }

    #[test]
    fn unknown_block_ids_are_fatal() {
        let mut bed = TestBed::new();
        bed.place(wall(), 3, 3, 0);
        let bytes = bed.world.serialize().unwrap();

        let mut smaller = crate::registry::RegistryBuilder::new();
        smaller.register_item("iron").unwrap();
        let smaller = smaller.build().unwrap();
        assert!(matches!(
            World::deserialize(&bytes, &smaller),
            Err(DeserializeError::UnknownBlock { .. })
        ));
    }

    #[test]
    fn unknown_sorter_filter_is_fatal() {
        let mut bed = TestBed::new();
        bed.place_sorter(5, 5, coal());
        let bytes = bed.world.serialize().unwrap();

        let mut builder = crate::registry::RegistryBuilder::new();
        builder.register_item("iron").unwrap();
        // Same block ids as the standard registry, up to the sorter.
        builder.register_block(BlockDef::new("wall", BlockKind::Wall)).unwrap();
        builder
            .register_block(BlockDef::new("conveyor", BlockKind::Conveyor { capacity: 4 }))
            .unwrap();
        builder.register_block(BlockDef::new("router", BlockKind::Router)).unwrap();
        builder.register_block(BlockDef::new("sorter", BlockKind::Sorter)).unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(
            World::deserialize(&bytes, &registry),
            Err(DeserializeError::UnknownItem {
                dim: DIM,
                pos: pos(5, 5),
                item: coal()
            })
        );
    }

    #[test]
    fn broken_links_are_detected() {
        let registry = standard_registry();
        let mut world = World::new();
        let mut grid = Grid::new(8, 8, pos(4, 4));
        grid.link(pos(2, 2), vault(), pos(3, 3));
        world.add_dimension(grid);
        assert_eq!(
            world.validate(&registry),
            Err(DeserializeError::BrokenLink {
                dim: DIM,
                pos: pos(2, 2)
            })
        );
    }
}
