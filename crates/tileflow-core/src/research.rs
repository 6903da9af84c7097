//! Research gating for recipes.
//!
//! Placement only ever asks [`ResearchStatus::is_unlocked`]. [`ResearchTree`]
//! is the bundled implementation: technologies with prerequisites and an
//! item cost, completed explicitly by the caller.

use crate::id::TechId;
use crate::item::{Inventory, ItemStack};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Read-only view of which research nodes are unlocked.
pub trait ResearchStatus {
    fn is_unlocked(&self, tech: TechId) -> bool;
}

/// Everything is unlocked. Useful for sandbox modes and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllUnlocked;

impl ResearchStatus for AllUnlocked {
    fn is_unlocked(&self, _tech: TechId) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResearchError {
    #[error("technology not found: {0:?}")]
    UnknownTech(TechId),

    #[error("prerequisite not met: {0:?} requires {1:?}")]
    PrerequisiteNotMet(TechId, TechId),

    #[error("duplicate technology name: {0}")]
    DuplicateName(String),

    #[error("prerequisite {prereq:?} for technology {name} does not exist")]
    InvalidPrerequisite { name: String, prereq: TechId },

    #[error("not enough items to research {0:?}")]
    InsufficientItems(TechId),
}

// ---------------------------------------------------------------------------
// ResearchTree
// ---------------------------------------------------------------------------

/// A research node definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub prerequisites: Vec<TechId>,
    /// Items consumed when the research completes.
    pub cost: Vec<ItemStack>,
}

/// Technology definitions plus the set completed so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchTree {
    technologies: Vec<Technology>,
    names: HashMap<String, TechId>,
    completed: BTreeSet<TechId>,
}

impl ResearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a technology. Prerequisites must already be registered, so
    /// the graph is acyclic by construction.
    pub fn register(
        &mut self,
        name: &str,
        prerequisites: Vec<TechId>,
        cost: Vec<ItemStack>,
    ) -> Result<TechId, ResearchError> {
        if self.names.contains_key(name) {
            return Err(ResearchError::DuplicateName(name.to_string()));
        }
        if let Some(&prereq) = prerequisites
            .iter()
            .find(|p| p.0 as usize >= self.technologies.len())
        {
            return Err(ResearchError::InvalidPrerequisite {
                name: name.to_string(),
                prereq,
            });
        }
        let id = TechId(self.technologies.len() as u32);
        self.technologies.push(Technology {
            name: name.to_string(),
            prerequisites,
            cost,
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn tech_id(&self, name: &str) -> Option<TechId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: TechId) -> Option<&Technology> {
        self.technologies.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    pub fn is_completed(&self, id: TechId) -> bool {
        self.completed.contains(&id)
    }

    /// Mark a technology completed without charging its cost.
    pub fn complete(&mut self, id: TechId) -> Result<(), ResearchError> {
        let tech = self
            .technologies
            .get(id.0 as usize)
            .ok_or(ResearchError::UnknownTech(id))?;
        if let Some(&missing) = tech.prerequisites.iter().find(|p| !self.completed.contains(*p)) {
            return Err(ResearchError::PrerequisiteNotMet(id, missing));
        }
        if self.completed.insert(id) {
            log::debug!("research completed: {}", tech.name);
        }
        Ok(())
    }

    /// Complete a technology, taking its cost from `inventory`. Nothing is
    /// taken unless the whole cost is available and every prerequisite is done.
    pub fn research(&mut self, id: TechId, inventory: &mut Inventory) -> Result<(), ResearchError> {
        if self.is_completed(id) {
            return Ok(());
        }
        let tech = self.get(id).ok_or(ResearchError::UnknownTech(id))?;
        if let Some(&missing) = tech.prerequisites.iter().find(|p| !self.is_completed(**p)) {
            return Err(ResearchError::PrerequisiteNotMet(id, missing));
        }
        if !inventory.take_items(&tech.cost) {
            return Err(ResearchError::InsufficientItems(id));
        }
        self.complete(id)
    }
}

impl ResearchStatus for ResearchTree {
    fn is_unlocked(&self, tech: TechId) -> bool {
        self.is_completed(tech)
    }
}
