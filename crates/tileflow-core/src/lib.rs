//! Tileflow Core -- grid mutation and item routing for tile-based factory games.
//!
//! This crate owns the world grid, the protocol that places and removes
//! (possibly multi-cell) blocks on it, and the propose/commit hand-off every
//! block uses to pass items to its neighbors.
//!
//! # Placement protocol
//!
//! All grid mutation goes through a [`placement::Placement`], which bundles
//! explicit handles to the world, inventory, registry, rules, research status,
//! entity occupancy and effect sink:
//!
//! ```rust,ignore
//! if placement.valid_place(x, y, dim, sorter) {
//!     placement.place_block(dim, x, y, sorter, rotation, Cues::ALL);
//! }
//! let broken = placement.break_block(dim, x, y, Cues::ALL);
//! ```
//!
//! # Item hand-off
//!
//! Every transfer is two-phase: [`transfer::accept_item`] is a pure check,
//! [`transfer::handle_item`] commits and must only follow a successful check
//! with the same arguments. The sorter in [`routing`] is the reference
//! implementation: it resolves one downstream neighbor per item, breaking
//! ties between its two sides with the cell's dump bit.
//!
//! # Key Types
//!
//! - [`grid::World`] / [`grid::Grid`] -- One dense cell grid per dimension.
//! - [`cell::Cell`] -- Block, rotation, link offset, dump bit and state.
//! - [`registry::BlockRegistry`] -- Immutable item and block definitions
//!   (frozen at startup).
//! - [`routing::SorterState`] -- Sorter filter with its two-byte config form.
//! - [`occupancy::OccupancyIndex`] -- Dynamic entities queried under a lock.
//! - [`sim`] -- Tick stepping for conveyors and routers.
//! - [`serialize`] -- Versioned world snapshots via bitcode.

pub mod block;
pub mod cell;
pub mod effects;
pub mod fixed;
pub mod grid;
pub mod id;
pub mod item;
pub mod occupancy;
pub mod placement;
pub mod registry;
pub mod research;
pub mod routing;
pub mod rules;
pub mod serialize;
pub mod sim;
pub mod spatial;
pub mod transfer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
