use crate::entities::item::TemplateId;
use crate::error::{LootError, Result};
use crate::loot::compose::{default_caliber_corrections, CaliberCorrection, MagazineFill};
use crate::loot::pool::PoolLootOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const POOL_TARGET_PREFIX: &str = "pool:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Location(String),
    RewardPool(String),
}

impl Target {
    pub fn parse(value: &str) -> Self {
        match value.strip_prefix(POOL_TARGET_PREFIX) {
            Some(pool) => Target::RewardPool(pool.to_string()),
            None => Target::Location(value.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub target: Target,
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self> {
        if args.len() < 3 {
            return Err(LootError::Config(
                "usage: raidloot <data-root> <location|pool:NAME> [seed]".to_string(),
            ));
        }

        let root = Path::new(&args[1]).to_path_buf();
        let target = Target::parse(args[2].trim());
        let seed = if args.len() > 3 {
            Some(parse_seed(&args[3])?)
        } else {
            std::env::var("RAIDLOOT_SEED")
                .ok()
                .and_then(|value| {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .map(|value| parse_seed(&value))
                .transpose()?
        };
        Ok(Self { root, target, seed })
    }
}

fn parse_seed(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| LootError::Config(format!("invalid seed '{value}': {err}")))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalFilter {
    pub active: bool,
    pub blacklist: Vec<TemplateId>,
}

impl SeasonalFilter {
    pub fn is_blocked(&self, tpl: &TemplateId) -> bool {
        !self.active && self.blacklist.contains(tpl)
    }
}

/// Engine tuning read from `loot.yaml`. Every field has a default so an
/// empty or missing file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    pub fit_attempts: u32,
    pub static_loot_multiplier: HashMap<String, f64>,
    pub loose_loot_multiplier: HashMap<String, f64>,
    pub magazine_ammo_chance_percent: u32,
    pub min_fill_static_magazine_percent: u32,
    pub min_fill_loose_magazine_percent: u32,
    pub container_randomisation: bool,
    pub allow_duplicate_items_in_static_containers: bool,
    pub forced_loot_single_spawn_by_id: HashMap<String, Vec<TemplateId>>,
    pub loose_loot_blacklist: HashMap<String, Vec<TemplateId>>,
    pub item_blacklist: Vec<TemplateId>,
    pub seasonal: SeasonalFilter,
    pub caliber_corrections: Vec<CaliberCorrection>,
    pub reward_pools: HashMap<String, PoolLootOptions>,
    pub log_level: String,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            fit_attempts: 3,
            static_loot_multiplier: HashMap::new(),
            loose_loot_multiplier: HashMap::new(),
            magazine_ammo_chance_percent: 100,
            min_fill_static_magazine_percent: 25,
            min_fill_loose_magazine_percent: 25,
            container_randomisation: true,
            allow_duplicate_items_in_static_containers: true,
            forced_loot_single_spawn_by_id: HashMap::new(),
            loose_loot_blacklist: HashMap::new(),
            item_blacklist: Vec::new(),
            seasonal: SeasonalFilter::default(),
            caliber_corrections: default_caliber_corrections(),
            reward_pools: HashMap::new(),
            log_level: "info".to_string(),
        }
    }
}

impl LootConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| LootError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    pub fn from_yaml(text: &str, path: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text).map_err(|source| LootError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fit_attempts == 0 {
            return Err(LootError::Config(
                "fit_attempts must be at least 1".to_string(),
            ));
        }
        for (name, table) in [
            ("static_loot_multiplier", &self.static_loot_multiplier),
            ("loose_loot_multiplier", &self.loose_loot_multiplier),
        ] {
            if let Some((map, value)) = table.iter().find(|(_, value)| value.is_nan() || **value < 0.0) {
                return Err(LootError::Config(format!(
                    "{name} for {map} must be non-negative, got {value}"
                )));
            }
        }
        for (name, percent) in [
            ("magazine_ammo_chance_percent", self.magazine_ammo_chance_percent),
            ("min_fill_static_magazine_percent", self.min_fill_static_magazine_percent),
            ("min_fill_loose_magazine_percent", self.min_fill_loose_magazine_percent),
        ] {
            if percent > 100 {
                return Err(LootError::Config(format!(
                    "{name} must be at most 100, got {percent}"
                )));
            }
        }
        for (name, pool) in &self.reward_pools {
            pool.validate()
                .map_err(|err| LootError::Config(format!("reward pool {name}: {err}")))?;
        }
        Ok(())
    }

    pub fn static_multiplier(&self, location: &str) -> f64 {
        self.static_loot_multiplier
            .get(location)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn loose_multiplier(&self, location: &str) -> f64 {
        self.loose_loot_multiplier
            .get(location)
            .copied()
            .unwrap_or(1.0)
    }

    pub fn static_magazine_fill(&self) -> MagazineFill {
        MagazineFill {
            chance_percent: self.magazine_ammo_chance_percent,
            min_fill: f64::from(self.min_fill_static_magazine_percent) / 100.0,
        }
    }

    pub fn loose_magazine_fill(&self) -> MagazineFill {
        MagazineFill {
            chance_percent: self.magazine_ammo_chance_percent,
            min_fill: f64::from(self.min_fill_loose_magazine_percent) / 100.0,
        }
    }

    pub fn single_spawn_templates(&self, location: &str) -> &[TemplateId] {
        self.forced_loot_single_spawn_by_id
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn loose_blacklist(&self, location: &str) -> &[TemplateId] {
        self.loose_loot_blacklist
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reward_pool(&self, name: &str) -> Result<&PoolLootOptions> {
        self.reward_pools
            .get(name)
            .ok_or_else(|| LootError::UnknownRewardPool(name.to_string()))
    }
}
