//! Data-driven content for tileflow: items, blocks, research and rules read
//! from RON, JSON or TOML files and resolved into core types.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, GameData, load_game_data};
