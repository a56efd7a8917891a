use crate::config::SeasonalFilter;
use crate::entities::item::{ItemId, TemplateId};
use crate::loot::rng::LootRng;
use crate::loot::sampler::WeightedPool;
use crate::world::catalog::{base_class, Catalog, CatalogItem, ItemKind};
use crate::world::presets::{Preset, PresetIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

const REJECTIONS_PER_ITEM: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: u32,
    pub max: u32,
}

impl MinMax {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolLootOptions {
    pub item_count: MinMax,
    pub weapon_preset_count: MinMax,
    pub armor_preset_count: MinMax,
    pub item_type_whitelist: Vec<TemplateId>,
    pub item_blacklist: Vec<TemplateId>,
    pub item_limits: HashMap<TemplateId, u32>,
    pub item_weights: HashMap<TemplateId, f64>,
    pub armor_levels: Vec<u32>,
}

impl Default for PoolLootOptions {
    fn default() -> Self {
        Self {
            item_count: MinMax::new(5, 10),
            weapon_preset_count: MinMax::default(),
            armor_preset_count: MinMax::default(),
            item_type_whitelist: Vec::new(),
            item_blacklist: Vec::new(),
            item_limits: HashMap::new(),
            item_weights: HashMap::new(),
            armor_levels: Vec::new(),
        }
    }
}

impl PoolLootOptions {
    pub fn validate(&self) -> Result<(), String> {
        for (name, range) in [
            ("item_count", self.item_count),
            ("weapon_preset_count", self.weapon_preset_count),
            ("armor_preset_count", self.armor_preset_count),
        ] {
            if range.min > range.max {
                return Err(format!("{name} min {} exceeds max {}", range.min, range.max));
            }
        }
        if let Some((tpl, weight)) = self
            .item_weights
            .iter()
            .find(|(_, weight)| weight.is_nan() || **weight < 0.0)
        {
            return Err(format!("weight for {tpl} must be non-negative, got {weight}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    pub id: ItemId,
    pub tpl: TemplateId,
    pub stack_count: u32,
    pub is_preset: bool,
}

pub struct BoundedPoolGenerator<'a> {
    catalog: &'a Catalog,
    presets: &'a PresetIndex,
}

impl<'a> BoundedPoolGenerator<'a> {
    pub fn new(catalog: &'a Catalog, presets: &'a PresetIndex) -> Self {
        Self { catalog, presets }
    }

    pub fn generate(
        &self,
        options: &PoolLootOptions,
        seasonal: &SeasonalFilter,
        rng: &mut LootRng,
    ) -> Vec<RewardItem> {
        let mut rewards = self.draw_items(options, seasonal, rng);

        let weapons: Vec<&Preset> = self
            .presets
            .defaults()
            .filter(|preset| {
                self.preset_allowed(preset, options, seasonal)
                    && preset
                        .root_tpl()
                        .is_some_and(|tpl| self.catalog.is_of_base_class(tpl, base_class::WEAPON))
            })
            .collect();
        rewards.extend(self.draw_presets(&weapons, options.weapon_preset_count, rng));

        let armor: Vec<&Preset> = self
            .presets
            .defaults()
            .filter(|preset| {
                self.preset_allowed(preset, options, seasonal)
                    && preset.root_tpl().is_some_and(|tpl| {
                        self.catalog.is_of_any_base_class(tpl, &base_class::ARMORED)
                            && self
                                .catalog
                                .get(tpl)
                                .is_some_and(|item| armor_level_allowed(item, options))
                    })
            })
            .collect();
        rewards.extend(self.draw_presets(&armor, options.armor_preset_count, rng));

        info!(rewards = rewards.len(), "generated reward pool");
        rewards
    }

    pub fn eligible_items(
        &self,
        options: &PoolLootOptions,
        seasonal: &SeasonalFilter,
    ) -> Vec<&'a CatalogItem> {
        let catalog = self.catalog;
        let mut eligible: Vec<&'a CatalogItem> = catalog
            .iter()
            .filter(|item| item.kind == ItemKind::Item)
            .filter(|item| !item.props.quest_item)
            .filter(|item| !options.item_blacklist.contains(&item.id))
            .filter(|item| !seasonal.is_blocked(&item.id))
            .filter(|item| {
                options.item_type_whitelist.is_empty()
                    || options
                        .item_type_whitelist
                        .iter()
                        .any(|class| catalog.is_of_base_class(&item.id, class.as_str()))
            })
            .filter(|item| {
                !catalog.is_of_any_base_class(&item.id, &base_class::ARMORED)
                    || armor_level_allowed(item, options)
            })
            .collect();
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        eligible
    }

    fn draw_items(
        &self,
        options: &PoolLootOptions,
        seasonal: &SeasonalFilter,
        rng: &mut LootRng,
    ) -> Vec<RewardItem> {
        let eligible = self.eligible_items(options, seasonal);
        let mut pool = WeightedPool::from_pairs(eligible.iter().map(|item| {
            let weight = options.item_weights.get(&item.id).copied().unwrap_or(1.0);
            (item.id.clone(), weight)
        }));
        let locked: Vec<TemplateId> = eligible
            .iter()
            .filter(|item| self.catalog.is_of_base_class(&item.id, base_class::MONEY))
            .map(|item| item.id.clone())
            .collect();

        let target = rng.roll_range(options.item_count.min, options.item_count.max) as usize;
        let max_rejections = target * REJECTIONS_PER_ITEM;
        let mut rejections = 0;
        let mut class_counts: HashMap<&TemplateId, u32> = HashMap::new();
        let mut rewards = Vec::with_capacity(target);

        while rewards.len() < target {
            let Some(tpl) = pool.take(rng, &locked) else {
                debug!(drawn = rewards.len(), target, "reward pool exhausted");
                break;
            };
            let limited: Vec<&TemplateId> = options
                .item_limits
                .keys()
                .filter(|class| self.catalog.is_of_base_class(&tpl, class.as_str()))
                .collect();
            let over_limit = limited.iter().any(|class| {
                class_counts.get(*class).copied().unwrap_or(0)
                    >= options.item_limits.get(*class).copied().unwrap_or(u32::MAX)
            });
            if over_limit {
                rejections += 1;
                if rejections >= max_rejections {
                    debug!(drawn = rewards.len(), target, "reward draw attempts exhausted");
                    break;
                }
                continue;
            }
            for class in limited {
                *class_counts.entry(class).or_insert(0) += 1;
            }
            let stack_count = self.stack_count(&tpl, rng);
            rewards.push(RewardItem {
                id: ItemId::next(),
                tpl,
                stack_count,
                is_preset: false,
            });
        }
        rewards
    }

    fn stack_count(&self, tpl: &TemplateId, rng: &mut LootRng) -> u32 {
        if !self
            .catalog
            .is_of_any_base_class(tpl, &base_class::STACKABLE_LOOT)
        {
            return 1;
        }
        self.catalog
            .get(tpl)
            .map(|item| {
                rng.roll_range(item.props.stack_min_random, item.props.stack_max_random)
                    .max(1)
            })
            .unwrap_or(1)
    }

    fn preset_allowed(
        &self,
        preset: &Preset,
        options: &PoolLootOptions,
        seasonal: &SeasonalFilter,
    ) -> bool {
        preset.root_tpl().is_some_and(|tpl| {
            !options.item_blacklist.contains(tpl) && !seasonal.is_blocked(tpl)
        })
    }

    fn draw_presets(&self, candidates: &[&Preset], count: MinMax, rng: &mut LootRng) -> Vec<RewardItem> {
        let wanted = rng.roll_range(count.min, count.max) as usize;
        if wanted == 0 {
            return Vec::new();
        }
        let pool = WeightedPool::from_pairs(candidates.iter().enumerate().map(|(index, _)| (index, 1.0)));
        pool.draw(rng, wanted, false, &[])
            .into_iter()
            .filter_map(|index| candidates.get(index))
            .filter_map(|preset| {
                Some(RewardItem {
                    id: ItemId::next(),
                    tpl: preset.root_tpl()?.clone(),
                    stack_count: 1,
                    is_preset: true,
                })
            })
            .collect()
    }
}

fn armor_level_allowed(item: &CatalogItem, options: &PoolLootOptions) -> bool {
    options.armor_levels.is_empty()
        || item
            .props
            .armor_class
            .is_some_and(|class| options.armor_levels.contains(&class))
}
