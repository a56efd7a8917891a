use crate::config::LootConfig;
use crate::entities::item::TemplateId;
use crate::error::{LootError, Result};
use crate::world::catalog::{Catalog, CatalogItem};
use crate::world::location::{
    AmmoTables, LocationLootData, LooseLoot, StaticContainerSet, StaticLootDistribution,
};
use crate::world::presets::{Preset, PresetIndex};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "loot.yaml";

#[derive(Debug, Default)]
pub struct AssetSummary {
    pub catalog_files: usize,
    pub location_dirs: usize,
    pub has_config: bool,
}

pub fn scan(root: &Path) -> Result<AssetSummary> {
    Ok(AssetSummary {
        catalog_files: count_dir(root.join("catalog"))?,
        location_dirs: count_dir(root.join("locations"))?,
        has_config: root.join(CONFIG_FILE).is_file(),
    })
}

fn count_dir(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let entries = fs::read_dir(path).map_err(|source| LootError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut count = 0usize;
    for entry in entries {
        if entry.is_ok() {
            count += 1;
        }
    }

    Ok(count)
}

pub fn load_catalog(root: &Path) -> Result<Catalog> {
    let items: HashMap<String, CatalogItem> = read_json(&root.join("catalog").join("items.json"))?;
    let mut catalog = Catalog::default();
    for (key, item) in items {
        if key != item.id.as_str() {
            return Err(LootError::Config(format!(
                "catalog key {key} does not match template id {}",
                item.id
            )));
        }
        catalog.insert(item)?;
    }
    debug!(templates = catalog.len(), "catalog loaded");
    Ok(catalog)
}

pub fn load_presets(root: &Path) -> Result<PresetIndex> {
    let path = root.join("catalog").join("presets.json");
    let presets: HashMap<String, Preset> = read_optional_json(&path)?.unwrap_or_default();
    let index = PresetIndex::from_presets(presets.into_values());
    debug!(presets = index.len(), "presets loaded");
    Ok(index)
}

pub fn load_config(root: &Path) -> Result<LootConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        debug!(path = %path.display(), "no loot config, using defaults");
        return Ok(LootConfig::default());
    }
    LootConfig::load(&path)
}

pub fn list_locations(root: &Path) -> Result<Vec<String>> {
    let dir = root.join("locations");
    let entries = fs::read_dir(&dir).map_err(|source| LootError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LootError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

pub fn load_location(root: &Path, name: &str) -> Result<LocationLootData> {
    let dir = location_dir(root, name);
    if !dir.is_dir() {
        return Err(LootError::UnknownLocation(name.to_string()));
    }
    let static_loot: HashMap<TemplateId, StaticLootDistribution> =
        read_optional_json(&dir.join("static_loot.json"))?.unwrap_or_default();
    let static_containers: Option<StaticContainerSet> =
        read_optional_json(&dir.join("static_containers.json"))?;
    let static_ammo: AmmoTables = read_optional_json(&dir.join("static_ammo.json"))?.unwrap_or_default();
    let loose_loot: Option<LooseLoot> = read_optional_json(&dir.join("loose_loot.json"))?;
    Ok(LocationLootData {
        name: name.to_string(),
        static_loot,
        static_containers,
        static_ammo,
        loose_loot,
    })
}

fn location_dir(root: &Path, name: &str) -> PathBuf {
    root.join("locations").join(name)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| LootError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LootError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    read_json(path).map(Some)
}
