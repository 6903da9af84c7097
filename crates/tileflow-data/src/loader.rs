//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the block registry, the research tree and the rules.
//!
//! A content directory holds `items` and `blocks` lists, plus optional
//! `research` and `rules` files. Each may be RON, JSON or TOML, detected by
//! extension.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tileflow_core::block::{BlockDef, BlockKind};
use tileflow_core::id::{ItemTypeId, TechId};
use tileflow_core::item::ItemStack;
use tileflow_core::registry::{BlockRegistry, RegistryBuilder, RegistryError};
use tileflow_core::research::{ResearchError, ResearchTree};
use tileflow_core::rules::Rules;

use crate::schema::{BlockData, ItemData, ResearchData, RulesData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved content was rejected by the registry builder.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The research graph is inconsistent.
    #[error(transparent)]
    Research(#[from] ResearchError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Every format, in the order a directory is searched.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Detect the format of a file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|f| Some(f.extension()) == ext)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// The single file named `{base_name}.{ron,toml,json}` in `dir`, if any.
/// Two formats of the same base name are a conflict.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .iter()
        .map(|f| dir.join(format!("{base_name}.{}", f.extension())))
        .filter(|candidate| candidate.exists());
    let found = present.next();
    if let (Some(a), Some(b)) = (&found, present.next()) {
        return Err(DataLoadError::ConflictingFormats { a: a.clone(), b });
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path) -> impl FnOnce(String) -> DataLoadError + '_ {
    move |detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    }
}

/// Read a file and deserialize it in the format its extension names.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    format.parse(&content).map_err(parse_error(path))
}

/// Deserialize a list. RON and JSON files hold the list at top level; TOML
/// cannot, so its list lives under `toml_key`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    if format != Format::Toml {
        return format.parse(&content).map_err(parse_error(path));
    }

    let mut table: toml::Table = format.parse(&content).map_err(parse_error(path))?;
    let list = table
        .remove(toml_key)
        .ok_or_else(|| format!("missing key '{toml_key}'"))
        .map_err(parse_error(path))?;
    list.try_into()
        .map_err(|e: toml::de::Error| e.to_string())
        .map_err(parse_error(path))
}

// ===========================================================================
// Name resolution
// ===========================================================================

/// Look up a name, failing with [`DataLoadError::UnresolvedRef`].
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Fail with [`DataLoadError::DuplicateName`] if `name` is already taken.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    match map.contains_key(name) {
        true => Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        }),
        false => Ok(()),
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything a content directory resolves to.
#[derive(Debug)]
pub struct GameData {
    pub registry: BlockRegistry,
    pub rules: Rules,
    pub research: ResearchTree,
}

/// Load and resolve every content file in `dir`.
///
/// Items are registered first, then research (whose costs name items), then
/// blocks (whose recipes name items and research). Rules fall back to their
/// defaults when no `rules` file exists.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    let mut builder = RegistryBuilder::new();
    let mut item_ids: HashMap<String, ItemTypeId> = HashMap::new();
    for item in &items {
        check_duplicate(&item_ids, &item.name, &items_path)?;
        let id = builder.register_item(&item.name)?;
        item_ids.insert(item.name.clone(), id);
    }

    let mut research = ResearchTree::new();
    let mut tech_ids: HashMap<String, TechId> = HashMap::new();
    if let Some(path) = find_data_file(dir, "research")? {
        let techs: Vec<ResearchData> = deserialize_list(&path, "research")?;
        for tech in &techs {
            check_duplicate(&tech_ids, &tech.name, &path)?;
            let prerequisites = tech
                .prerequisites
                .iter()
                .map(|name| resolve_name(&tech_ids, name, &path, "technology").copied())
                .collect::<Result<Vec<_>, _>>()?;
            let cost = resolve_stacks(&item_ids, &tech.cost, &path)?;
            let id = research.register(&tech.name, prerequisites, cost)?;
            tech_ids.insert(tech.name.clone(), id);
        }
        for tech in techs.iter().filter(|t| t.completed) {
            research.complete(tech_ids[&tech.name])?;
        }
    }

    let blocks_path = require_data_file(dir, "blocks")?;
    let blocks: Vec<BlockData> = deserialize_list(&blocks_path, "blocks")?;
    for block in blocks {
        if builder.block_id(&block.name).is_some() {
            return Err(DataLoadError::DuplicateName {
                file: blocks_path.clone(),
                name: block.name,
            });
        }
        let def = resolve_block(block, &item_ids, &tech_ids, &blocks_path)?;
        builder.register_block(def)?;
    }
    let registry = builder.build()?;

    let rules = match find_data_file(dir, "rules")? {
        Some(path) => deserialize_file::<RulesData>(&path)?.into_rules(),
        None => Rules::default(),
    };

    log::debug!(
        "loaded content from {}: {} item(s), {} block(s), {} technolog(ies)",
        dir.display(),
        registry.item_count(),
        registry.block_count(),
        research.len()
    );
    Ok(GameData {
        registry,
        rules,
        research,
    })
}

fn resolve_stacks(
    item_ids: &HashMap<String, ItemTypeId>,
    stacks: &[(String, u32)],
    file: &Path,
) -> Result<Vec<ItemStack>, DataLoadError> {
    stacks
        .iter()
        .map(|(name, quantity)| {
            let item = resolve_name(item_ids, name, file, "item")?;
            Ok(ItemStack::new(*item, *quantity))
        })
        .collect()
}

fn resolve_block(
    data: BlockData,
    item_ids: &HashMap<String, ItemTypeId>,
    tech_ids: &HashMap<String, TechId>,
    file: &Path,
) -> Result<BlockDef, DataLoadError> {
    let kind = BlockKind::from(data.kind);
    let mut def = BlockDef::new(&data.name, kind).with_size(data.size);
    if let Some(solid) = data.solid {
        def.solid = solid;
    }
    if let Some(breakable) = data.breakable {
        def.breakable = breakable;
    }
    def.solidifies = data.solidifies;
    def.always_replace = data.always_replace;

    if let Some((name, quantity)) = &data.drops {
        let item = resolve_name(item_ids, name, file, "item")?;
        def = def.with_drops(ItemStack::new(*item, *quantity));
    }
    if let Some(recipe) = &data.recipe {
        let requirements = resolve_stacks(item_ids, &recipe.requirements, file)?;
        let research = recipe
            .research
            .as_deref()
            .map(|name| resolve_name(tech_ids, name, file, "technology").copied())
            .transpose()?;
        def = def.with_recipe(requirements, research);
    }
    Ok(def)
}

// ===========================================================================
// Tests
// ===========================================================================
