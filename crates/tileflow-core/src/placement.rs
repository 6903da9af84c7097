//! The placement and removal protocol: the only path that installs or
//! clears blocks on a grid.
//!
//! A [`Placement`] bundles explicit handles to everything the protocol reads
//! or writes. It runs in the input context, outside the simulation tick; the
//! occupancy lock is taken only for the entity overlap query inside
//! [`Placement::valid_place`].

use crate::block::BlockKind;
use crate::effects::{BREAK_SOUND, EffectKind, EffectSink, PLACE_SOUND};
use crate::fixed::scale_quantity;
use crate::grid::World;
use crate::id::{BlockTypeId, DimensionId};
use crate::item::Inventory;
use crate::occupancy::OccupancyIndex;
use crate::registry::BlockRegistry;
use crate::research::ResearchStatus;
use crate::rules::Rules;
use crate::spatial::{GridPosition, Rect};
use parking_lot::Mutex;

/// Which cues a mutation should raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cues {
    /// One visual effect per affected cell.
    pub effects: bool,
    /// One sound per operation. Placement only plays it alongside effects.
    pub sound: bool,
}

impl Cues {
    pub const NONE: Cues = Cues {
        effects: false,
        sound: false,
    };
    pub const ALL: Cues = Cues {
        effects: true,
        sound: true,
    };
}

/// Handles to the shared state the protocol works on.
pub struct Placement<'a> {
    pub world: &'a mut World,
    pub inventory: &'a mut Inventory,
    pub registry: &'a BlockRegistry,
    pub rules: &'a Rules,
    pub research: &'a dyn ResearchStatus,
    pub occupancy: &'a Mutex<OccupancyIndex>,
    pub sink: &'a mut dyn EffectSink,
}

impl Placement<'_> {
    // -- Placement --

    /// Whether `block` may be placed with its primary cell at `(x, y)`.
    ///
    /// Checks run in a fixed order and stop at the first failure: spawn
    /// clearance, recipe and research, entity overlap, the target cell
    /// itself, then occupancy of the footprint. Never mutates anything.
    pub fn valid_place(&self, x: i32, y: i32, dim: DimensionId, block: BlockTypeId) -> bool {
        let pos = GridPosition::new(x, y);
        let tile_size = self.rules.tile_size;
        let (wx, wy) = pos.to_world(tile_size);

        for spawn in self.world.spawn_points(dim) {
            let (sx, sy) = spawn.to_world(tile_size);
            if (wx - sx).hypot(wy - sy) < self.rules.enemy_spawn_space {
                log::trace!("place ({x}, {y}) rejected: too close to spawn ({}, {})", spawn.x, spawn.y);
                return false;
            }
        }

        let Some(recipe) = self.registry.recipe_for(block) else {
            return false;
        };
        if !self.inventory.has_items(&recipe.requirements) {
            return false;
        }
        if recipe.research.is_some_and(|tech| !self.research.is_unlocked(tech)) {
            return false;
        }

        let def = self.registry.def(block);
        let extent = def.size as f32 * tile_size;
        let (ox, oy) = def.place_offset(tile_size);
        let footprint = Rect::centered(wx + ox, wy + oy, extent, extent);
        {
            let occupancy = self.occupancy.lock();
            let radius = self.rules.hostile_query_radius;
            if occupancy
                .nearby_hostiles(dim, wx, wy, radius)
                .any(|e| footprint.overlaps(&e.hitbox()))
            {
                return false;
            }
            if def.blocks_movement()
                && occupancy
                    .players(dim)
                    .any(|p| p.is_grounded_player() && footprint.overlaps(&p.hitbox()))
            {
                return false;
            }
        }

        let Some(grid) = self.world.grid(dim) else {
            return false;
        };
        let Some(cell) = grid.cell(pos) else {
            return false;
        };
        if grid.is_player_spawn(pos) && def.blocks_movement() {
            return false;
        }

        if def.is_multi_cell() {
            // Only the diagonal of the footprint is inspected.
            let offset = def.footprint_offset();
            return (0..def.size as i32).all(|d| {
                let other = pos.translate(d + offset, d + offset);
                grid.cell(other).is_some_and(|c| {
                    (c.block().is_air() || self.registry.def(c.block()).always_replace)
                        && !grid.is_player_spawn(other)
                })
            });
        }

        let occupant = cell.block();
        let occupant_def = self.registry.def(occupant);
        (occupant != block
            && (def.can_replace(occupant_def) || occupant_def.always_replace)
            && occupant_def.is_multi_cell() == def.is_multi_cell())
            || occupant.is_air()
    }

    /// Install `block` with its primary cell at `(x, y)`, linking the rest of
    /// its footprint. Does not validate; call [`valid_place`](Self::valid_place)
    /// first. Returns false if the primary cell does not exist.
    pub fn place_block(
        &mut self,
        dim: DimensionId,
        x: i32,
        y: i32,
        block: BlockTypeId,
        rotation: u8,
        cues: Cues,
    ) -> bool {
        let pos = GridPosition::new(x, y);
        let tile_size = self.rules.tile_size;
        let def = self.registry.def(block);
        let Some(grid) = self.world.grid_mut(dim) else {
            log::warn!("place {} into unknown dimension {dim:?}", def.name);
            return false;
        };
        if !grid.install(pos, block, def, rotation, self.registry.default_filter()) {
            log::warn!("place {} outside dimension {dim:?} at ({x}, {y})", def.name);
            return false;
        }

        let affected = if def.is_multi_cell() {
            let cells = grid.linked_cells(pos, def);
            for &member in cells.iter().filter(|&&p| p != pos) {
                grid.link(member, block, pos);
            }
            cells
        } else {
            vec![pos]
        };

        if cues.effects {
            for member in &affected {
                let (ex, ey) = member.to_world(tile_size);
                self.sink.play_effect(EffectKind::Place, ex, ey, dim);
            }
            if cues.sound {
                let (sx, sy) = pos.to_world(tile_size);
                self.sink.play_sound(PLACE_SOUND, sx, sy);
            }
        }

        log::debug!(
            "placed {} at ({x}, {y}) in {dim:?}, {} cell(s)",
            def.name,
            affected.len()
        );
        true
    }

    // -- Removal --

    /// Whether the cell at `(x, y)` may be broken. The core structure and
    /// unbreakable blocks are protected, through links as well.
    pub fn valid_break(&self, dim: DimensionId, x: i32, y: i32) -> bool {
        let Some(grid) = self.world.grid(dim) else {
            return false;
        };
        let pos = GridPosition::new(x, y);
        let Some(cell) = grid.cell(pos) else {
            return false;
        };
        if self.registry.def(cell.block()).kind == BlockKind::Core {
            return false;
        }
        let Some(primary) = grid.primary(pos) else {
            return false;
        };
        let def = self.registry.def(primary.block());
        def.kind != BlockKind::Core && def.breakable
    }

    /// Break the structure owning `(x, y)`: refund its buffered items, its
    /// scaled recipe and its intrinsic drop exactly once, then clear its whole
    /// footprint to air. Returns the broken block, or `None` if there is no
    /// cell at `(x, y)`.
    pub fn break_block(&mut self, dim: DimensionId, x: i32, y: i32, cues: Cues) -> Option<BlockTypeId> {
        let pos = GridPosition::new(x, y);
        let tile_size = self.rules.tile_size;
        let grid = self.world.grid_mut(dim)?;
        let cell = grid.cell(pos)?;
        let linked = cell.is_linked();
        let primary = grid.resolve(pos).unwrap_or(pos);
        let acting = grid.cell(primary)?;
        let block = acting.block();
        let def = self.registry.def(block);

        let buffered = acting.state().drain_into(self.inventory);
        if let Some(recipe) = self.registry.recipe_for(block) {
            for stack in &recipe.requirements {
                let refund = scale_quantity(stack.quantity, self.rules.break_drop_amount);
                self.inventory.add_item(stack.item_type, refund);
            }
        }
        if let Some(drops) = def.drops {
            self.inventory.add_item(drops.item_type, drops.quantity);
        }
        if buffered > 0 {
            log::debug!("{} returned {buffered} buffered item(s)", def.name);
        }

        if cues.sound {
            let (sx, sy) = pos.to_world(tile_size);
            self.sink.play_sound(BREAK_SOUND, sx, sy);
        }

        let cleared = if !def.is_multi_cell() && !linked {
            vec![pos]
        } else {
            grid.linked_cells(primary, def)
        };
        for &member in &cleared {
            grid.clear(member);
        }
        if cues.effects {
            for member in &cleared {
                let (ex, ey) = member.to_world(tile_size);
                self.sink.play_effect(EffectKind::Break, ex, ey, dim);
            }
        }

        log::debug!(
            "broke {} at ({x}, {y}) in {dim:?}, {} cell(s)",
            def.name,
            cleared.len()
        );
        Some(block)
    }
}
