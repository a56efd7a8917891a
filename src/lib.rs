pub mod assets;
pub mod config;
pub mod entities;
pub mod error;
pub mod loot;
pub mod telemetry;
pub mod world;

use config::Target;
use tracing::info;

pub use config::{AppConfig, LootConfig, SeasonalFilter};
pub use entities::item::{ItemId, ItemLocation, PlacedItem, TemplateId};
pub use error::{LootError, Result};
pub use loot::compose::{ComposedItem, ItemComposer, MagazineFill};
pub use loot::location::{GeneratedLoot, GenerationStats, LocationLootGenerator};
pub use loot::packer::{ContainerGrid, Placement};
pub use loot::pool::{BoundedPoolGenerator, PoolLootOptions, RewardItem};
pub use loot::rng::LootRng;
pub use loot::sampler::WeightedPool;
pub use loot::validate::{validate_location, LocationValidationReport};
pub use world::catalog::Catalog;
pub use world::location::LocationLootData;
pub use world::presets::PresetIndex;

pub fn run(args: &[String]) -> Result<()> {
    let config = AppConfig::from_args(args)?;
    let loot_config = assets::load_config(&config.root)?;
    telemetry::logging::init(&config.root, &loot_config.log_level)?;
    let summary = assets::scan(&config.root)?;
    info!(
        root = %config.root.display(),
        catalog_files = summary.catalog_files,
        location_dirs = summary.location_dirs,
        has_config = summary.has_config,
        "asset scan"
    );
    eprintln!("raidloot: asset scan");
    eprintln!("- root: {}", config.root.display());
    eprintln!("- catalog files: {}", summary.catalog_files);
    eprintln!("- location dirs: {}", summary.location_dirs);

    let catalog = assets::load_catalog(&config.root)?;
    let presets = assets::load_presets(&config.root)?;
    eprintln!("- templates: {}", catalog.len());
    eprintln!("- presets: {}", presets.len());

    let mut rng = match config.seed {
        Some(seed) => LootRng::from_seed(seed),
        None => LootRng::from_entropy(),
    };

    let output = match &config.target {
        Target::Location(name) => {
            let location = assets::load_location(&config.root, name)?;
            let loot = LocationLootGenerator::new(&catalog, &presets, &loot_config).generate(
                &location,
                &loot_config.seasonal,
                &mut rng,
            )?;
            eprintln!(
                "- {}: {} spawns, {} container items, {} loose, {} skipped",
                loot.location,
                loot.spawns.len(),
                loot.stats.container_items,
                loot.stats.loose_spawns,
                loot.stats.skipped_items
            );
            serde_json::to_string_pretty(&loot)
        }
        Target::RewardPool(name) => {
            let mut options = loot_config.reward_pool(name)?.clone();
            options
                .item_blacklist
                .extend(loot_config.item_blacklist.iter().cloned());
            let rewards = BoundedPoolGenerator::new(&catalog, &presets).generate(
                &options,
                &loot_config.seasonal,
                &mut rng,
            );
            eprintln!("- pool {}: {} rewards", name, rewards.len());
            serde_json::to_string_pretty(&rewards)
        }
    }
    .map_err(|source| LootError::Json {
        path: "<stdout>".to_string(),
        source,
    })?;
    println!("{output}");
    Ok(())
}
