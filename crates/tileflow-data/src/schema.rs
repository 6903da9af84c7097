//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for items, blocks, research and
//! rules. They are deserialized from RON, JSON, or TOML data files and then
//! resolved into core types by the loader. Every cross-reference is by name.

use serde::Deserialize;
use tileflow_core::block::BlockKind;
use tileflow_core::fixed::f64_to_fixed64;
use tileflow_core::rules::Rules;

// ===========================================================================
// Items
// ===========================================================================

/// An item type definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

// ===========================================================================
// Blocks
// ===========================================================================

/// A block definition in a data file.
///
/// Traits left out take the conventional value for the block's kind.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockData {
    pub name: String,
    pub kind: BlockKindData,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub solidifies: bool,
    #[serde(default)]
    pub always_replace: bool,
    #[serde(default)]
    pub breakable: Option<bool>,
    /// Intrinsic drop granted when the block is broken: `("item", quantity)`.
    #[serde(default)]
    pub drops: Option<(String, u32)>,
    /// Blocks without a recipe cannot be built by players.
    #[serde(default)]
    pub recipe: Option<RecipeData>,
}

fn default_size() -> u32 {
    1
}

/// The behavior variant of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BlockKindData {
    Wall,
    Conveyor { capacity: u32 },
    Router,
    Sorter,
    Storage { capacity: u32 },
    Core,
}

impl From<BlockKindData> for BlockKind {
    fn from(kind: BlockKindData) -> Self {
        match kind {
            BlockKindData::Wall => BlockKind::Wall,
            BlockKindData::Conveyor { capacity } => BlockKind::Conveyor { capacity },
            BlockKindData::Router => BlockKind::Router,
            BlockKindData::Sorter => BlockKind::Sorter,
            BlockKindData::Storage { capacity } => BlockKind::Storage { capacity },
            BlockKindData::Core => BlockKind::Core,
        }
    }
}

/// The build cost of a block and the research gating it.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub requirements: Vec<(String, u32)>,
    #[serde(default)]
    pub research: Option<String>,
}

// ===========================================================================
// Research
// ===========================================================================

/// A technology definition in a data file. Prerequisites must be defined
/// earlier in the same file.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchData {
    pub name: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub cost: Vec<(String, u32)>,
    /// Already researched when the content loads.
    #[serde(default)]
    pub completed: bool,
}

// ===========================================================================
// Rules
// ===========================================================================

/// Rule overrides. Absent fields keep the [`Rules`] defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesData {
    #[serde(default)]
    pub tile_size: Option<f32>,
    #[serde(default)]
    pub enemy_spawn_space: Option<f32>,
    #[serde(default)]
    pub break_drop_amount: Option<f64>,
    #[serde(default)]
    pub hostile_query_radius: Option<f32>,
}

impl RulesData {
    pub fn into_rules(self) -> Rules {
        let defaults = Rules::default();
        Rules {
            tile_size: self.tile_size.unwrap_or(defaults.tile_size),
            enemy_spawn_space: self.enemy_spawn_space.unwrap_or(defaults.enemy_spawn_space),
            break_drop_amount: self
                .break_drop_amount
                .map_or(defaults.break_drop_amount, f64_to_fixed64),
            hostile_query_radius: self
                .hostile_query_radius
                .unwrap_or(defaults.hostile_query_radius),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
