//! Tunable constants read by placement and removal.

use crate::fixed::{Fixed64, f64_to_fixed64};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TILE_SIZE: f32 = 8.0;

/// Game rules. Every field falls back to its default when absent from a
/// content file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// World units per grid cell.
    pub tile_size: f32,
    /// No block may be placed within this world distance of an enemy spawn.
    pub enemy_spawn_space: f32,
    /// Fraction of a recipe refunded when a block is broken.
    pub break_drop_amount: Fixed64,
    /// Half-width of the square searched for hostiles around a placement.
    pub hostile_query_radius: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            enemy_spawn_space: DEFAULT_TILE_SIZE * 8.0 + 1.0,
            break_drop_amount: f64_to_fixed64(0.5),
            hostile_query_radius: DEFAULT_TILE_SIZE * 2.0,
        }
    }
}
