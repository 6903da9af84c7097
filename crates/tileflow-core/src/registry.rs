use crate::block::{BlockDef, BlockKind, Recipe};
use crate::id::*;
use std::collections::HashMap;

/// Item ids are persisted as a single byte, so at most this many exist.
pub const MAX_ITEM_TYPES: usize = 256;

/// An item type definition in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTypeDef {
    pub name: String,
}

/// Errors raised while building a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemTypeId),
    #[error("too many item types: {0} (max {MAX_ITEM_TYPES})")]
    TooManyItems(usize),
    #[error("block '{0}' has size 0")]
    ZeroSize(String),
    #[error("block '{0}' needs at least one registered item")]
    NoItems(String),
}

/// Builder for constructing an immutable [`BlockRegistry`].
/// Two-phase lifecycle: registration -> finalization.
/// Air is registered as block 0 on construction.
#[derive(Debug)]
pub struct RegistryBuilder {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    blocks: Vec<BlockDef>,
    block_name_to_id: HashMap<String, BlockTypeId>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        let air = BlockDef::air();
        let mut block_name_to_id = HashMap::new();
        block_name_to_id.insert(air.name.clone(), BlockTypeId::AIR);
        Self {
            items: Vec::new(),
            item_name_to_id: HashMap::new(),
            blocks: vec![air],
            block_name_to_id,
        }
    }

    /// Register an item type. Returns its ID.
    pub fn register_item(&mut self, name: &str) -> Result<ItemTypeId, RegistryError> {
        if self.item_name_to_id.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let id = ItemTypeId(self.items.len() as u32);
        self.items.push(ItemTypeDef {
            name: name.to_string(),
        });
        self.item_name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register a block type. Returns its ID.
    pub fn register_block(&mut self, def: BlockDef) -> Result<BlockTypeId, RegistryError> {
        if self.block_name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        let id = BlockTypeId(self.blocks.len() as u32);
        self.block_name_to_id.insert(def.name.clone(), id);
        self.blocks.push(def);
        Ok(id)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn block_id(&self, name: &str) -> Option<BlockTypeId> {
        self.block_name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable registry.
    pub fn build(self) -> Result<BlockRegistry, RegistryError> {
        if self.items.len() > MAX_ITEM_TYPES {
            return Err(RegistryError::TooManyItems(self.items.len()));
        }

        let item_exists = |id: ItemTypeId| (id.0 as usize) < self.items.len();
        for block in &self.blocks {
            if block.size == 0 {
                return Err(RegistryError::ZeroSize(block.name.clone()));
            }
            if block.kind == BlockKind::Sorter && self.items.is_empty() {
                return Err(RegistryError::NoItems(block.name.clone()));
            }
            let recipe_items = block
                .recipe
                .iter()
                .flat_map(|r| r.requirements.iter());
            for stack in recipe_items.chain(block.drops.iter()) {
                if !item_exists(stack.item_type) {
                    return Err(RegistryError::InvalidItemRef(stack.item_type));
                }
            }
        }

        Ok(BlockRegistry {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            blocks: self.blocks,
            block_name_to_id: self.block_name_to_id,
        })
    }
}

/// Immutable registry of items and blocks. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct BlockRegistry {
    items: Vec<ItemTypeDef>,
    item_name_to_id: HashMap<String, ItemTypeId>,
    blocks: Vec<BlockDef>,
    block_name_to_id: HashMap<String, BlockTypeId>,
}

impl BlockRegistry {
    pub fn get_item(&self, id: ItemTypeId) -> Option<&ItemTypeDef> {
        self.items.get(id.0 as usize)
    }

    pub fn get_block(&self, id: BlockTypeId) -> Option<&BlockDef> {
        self.blocks.get(id.0 as usize)
    }

    /// Definition for `id`, falling back to air for ids this registry never issued.
    pub fn def(&self, id: BlockTypeId) -> &BlockDef {
        self.blocks
            .get(id.0 as usize)
            .unwrap_or(&self.blocks[BlockTypeId::AIR.0 as usize])
    }

    pub fn item_id(&self, name: &str) -> Option<ItemTypeId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn block_id(&self, name: &str) -> Option<BlockTypeId> {
        self.block_name_to_id.get(name).copied()
    }

    pub fn contains_item(&self, id: ItemTypeId) -> bool {
        (id.0 as usize) < self.items.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The recipe that produces `block`, if any.
    pub fn recipe_for(&self, block: BlockTypeId) -> Option<&Recipe> {
        self.get_block(block)?.recipe.as_ref()
    }

    /// Filter a freshly placed sorter starts with: the first registered item.
    pub fn default_filter(&self) -> ItemTypeId {
        ItemTypeId(0)
    }
}
