//! Positions and hitboxes of dynamic entities, queried by placement.
//!
//! The index is owned by the entity subsystem and shared with placement as a
//! [`SharedOccupancy`]. Placement holds the lock only for its overlap query.

use crate::id::{DimensionId, EntityId};
use crate::spatial::Rect;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::sync::Arc;

/// The occupancy index behind the lock shared by the entity subsystem and placement.
pub type SharedOccupancy = Arc<Mutex<OccupancyIndex>>;

/// What kind of entity occupies space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupantKind {
    Hostile,
    /// Airborne players fly over blocks and never obstruct placement.
    Player { airborne: bool },
}

/// A dynamic entity with an axis-aligned hitbox centred on its position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub dimension: DimensionId,
    pub kind: OccupantKind,
    pub x: f32,
    pub y: f32,
    pub hitbox_width: f32,
    pub hitbox_height: f32,
}

impl Occupant {
    pub fn hostile(dimension: DimensionId, x: f32, y: f32, size: f32) -> Self {
        Self {
            dimension,
            kind: OccupantKind::Hostile,
            x,
            y,
            hitbox_width: size,
            hitbox_height: size,
        }
    }

    pub fn player(dimension: DimensionId, x: f32, y: f32, size: f32, airborne: bool) -> Self {
        Self {
            dimension,
            kind: OccupantKind::Player { airborne },
            x,
            y,
            hitbox_width: size,
            hitbox_height: size,
        }
    }

    pub fn hitbox(&self) -> Rect {
        Rect::centered(self.x, self.y, self.hitbox_width, self.hitbox_height)
    }

    pub fn is_grounded_player(&self) -> bool {
        matches!(self.kind, OccupantKind::Player { airborne: false })
    }
}

/// All dynamic entities, keyed by [`EntityId`].
#[derive(Debug, Default)]
pub struct OccupancyIndex {
    entities: SlotMap<EntityId, Occupant>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh index for sharing.
    pub fn shared() -> SharedOccupancy {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn insert(&mut self, occupant: Occupant) -> EntityId {
        self.entities.insert(occupant)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Occupant> {
        self.entities.remove(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Occupant> {
        self.entities.get(id)
    }

    /// Move an entity. Returns false if it no longer exists.
    pub fn move_to(&mut self, id: EntityId, x: f32, y: f32) -> bool {
        match self.entities.get_mut(id) {
            Some(occupant) => {
                occupant.x = x;
                occupant.y = y;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Hostiles in `dim` whose position lies within the square of half-width
    /// `radius` around `(x, y)`.
    pub fn nearby_hostiles(
        &self,
        dim: DimensionId,
        x: f32,
        y: f32,
        radius: f32,
    ) -> impl Iterator<Item = &Occupant> {
        self.entities.values().filter(move |o| {
            o.dimension == dim
                && o.kind == OccupantKind::Hostile
                && (o.x - x).abs() <= radius
                && (o.y - y).abs() <= radius
        })
    }

    /// Every player in `dim`, airborne or not.
    pub fn players(&self, dim: DimensionId) -> impl Iterator<Item = &Occupant> {
        self.entities
            .values()
            .filter(move |o| o.dimension == dim && matches!(o.kind, OccupantKind::Player { .. }))
    }
}
