use crate::config::{LootConfig, SeasonalFilter};
use crate::entities::item::{ItemId, ItemLocation, PlacedItem, TemplateId};
use crate::error::{LootError, Result};
use crate::loot::compose::{reparent, ItemComposer, MagazineFill};
use crate::loot::packer::ContainerGrid;
use crate::loot::rng::LootRng;
use crate::loot::sampler::WeightedPool;
use crate::world::catalog::{base_class, Catalog};
use crate::world::location::{
    AmmoTables, LocationLootData, LooseLoot, SpawnTemplate, Spawnpoint, StaticContainer,
    StaticContainerSet, StaticLootDistribution,
};
use crate::world::presets::PresetIndex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const CONTAINER_GRID_SLOT: &str = "main";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub static_weapons: usize,
    pub containers: usize,
    pub container_items: usize,
    pub loose_spawns: usize,
    pub skipped_items: usize,
    pub placement_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedLoot {
    pub location: String,
    pub spawns: Vec<SpawnTemplate>,
    pub stats: GenerationStats,
}

enum PlaceOutcome {
    Placed,
    NoRoom,
    Skipped,
}

struct CandidateFilter<'a> {
    seasonal: &'a SeasonalFilter,
    blocked: Vec<&'a [TemplateId]>,
}

impl CandidateFilter<'_> {
    fn allows(&self, tpl: &TemplateId) -> bool {
        !self.seasonal.is_blocked(tpl) && !self.blocked.iter().any(|list| list.contains(tpl))
    }
}

pub struct LocationLootGenerator<'a> {
    catalog: &'a Catalog,
    presets: &'a PresetIndex,
    config: &'a LootConfig,
}

impl<'a> LocationLootGenerator<'a> {
    pub fn new(catalog: &'a Catalog, presets: &'a PresetIndex, config: &'a LootConfig) -> Self {
        Self {
            catalog,
            presets,
            config,
        }
    }

    /// Builds the spawn list for one pass over `location`. Only a location
    /// missing its container set or loose-loot definition fails; item-level
    /// problems are logged and skipped.
    pub fn generate(
        &self,
        location: &LocationLootData,
        seasonal: &SeasonalFilter,
        rng: &mut LootRng,
    ) -> Result<GeneratedLoot> {
        let containers =
            location
                .static_containers
                .as_ref()
                .ok_or_else(|| LootError::CorruptLocation {
                    location: location.name.clone(),
                    missing: "static container",
                })?;
        let loose = location
            .loose_loot
            .as_ref()
            .ok_or_else(|| LootError::CorruptLocation {
                location: location.name.clone(),
                missing: "loose loot",
            })?;

        let composer = ItemComposer::new(self.catalog, self.presets)
            .with_corrections(&self.config.caliber_corrections);
        let mut stats = GenerationStats::default();
        let mut spawns = Vec::new();

        for weapon in &containers.static_weapons {
            match respawn(weapon) {
                Some(spawn) => {
                    spawns.push(spawn);
                    stats.static_weapons += 1;
                }
                None => warn!(spawn = %weapon.id, "static weapon has no root item"),
            }
        }

        let filter = CandidateFilter {
            seasonal,
            blocked: vec![self.config.item_blacklist.as_slice()],
        };
        for container in self.select_containers(containers, rng) {
            if let Some(spawn) =
                self.fill_container(&composer, location, container, &filter, rng, &mut stats)?
            {
                spawns.push(spawn);
                stats.containers += 1;
            }
        }

        self.generate_loose(&composer, location, loose, seasonal, rng, &mut stats, &mut spawns)?;

        info!(
            location = %location.name,
            static_weapons = stats.static_weapons,
            containers = stats.containers,
            container_items = stats.container_items,
            loose_spawns = stats.loose_spawns,
            skipped = stats.skipped_items,
            "generated location loot"
        );
        Ok(GeneratedLoot {
            location: location.name.clone(),
            spawns,
            stats,
        })
    }

    fn select_containers<'s>(
        &self,
        set: &'s StaticContainerSet,
        rng: &mut LootRng,
    ) -> Vec<&'s StaticContainer> {
        if !self.config.container_randomisation {
            return set.static_containers.iter().collect();
        }

        let mut keep = vec![false; set.static_containers.len()];
        let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
        for (index, container) in set.static_containers.iter().enumerate() {
            if container.template.is_always_spawn {
                keep[index] = true;
                continue;
            }
            let group_id = set
                .container_links
                .get(&container.template.id)
                .map(|link| link.group_id.as_str())
                .filter(|group_id| set.container_groups.contains_key(*group_id));
            match group_id {
                Some(group_id) => match groups.iter_mut().find(|(id, _)| *id == group_id) {
                    Some((_, members)) => members.push(index),
                    None => groups.push((group_id, vec![index])),
                },
                None => keep[index] = rng.roll_chance(container.probability),
            }
        }

        for (group_id, members) in &groups {
            let Some(group) = set.container_groups.get(*group_id) else {
                continue;
            };
            let wanted = rng.roll_range(group.min_containers, group.max_containers) as usize;
            let pool = WeightedPool::from_pairs(members.iter().map(|index| {
                let probability = set
                    .static_containers
                    .get(*index)
                    .map_or(0.0, |container| container.probability);
                (*index, probability)
            }));
            let drawn = pool.draw(rng, wanted, false, &[]);
            debug!(group = %group_id, wanted, drawn = drawn.len(), "container group drawn");
            for index in drawn {
                keep[index] = true;
            }
        }

        set.static_containers
            .iter()
            .zip(keep)
            .filter_map(|(container, keep)| keep.then_some(container))
            .collect()
    }

    fn fill_container(
        &self,
        composer: &ItemComposer<'_>,
        location: &LocationLootData,
        container: &StaticContainer,
        filter: &CandidateFilter<'_>,
        rng: &mut LootRng,
        stats: &mut GenerationStats,
    ) -> Result<Option<SpawnTemplate>> {
        let Some(mut spawn) = respawn(&container.template) else {
            warn!(container = %container.template.id, "static container has no root item");
            return Ok(None);
        };
        let Some((root_id, container_tpl)) = spawn
            .items
            .first()
            .map(|root| (root.id.clone(), root.tpl.clone()))
        else {
            return Ok(None);
        };
        let Some(template) = self.catalog.get(&container_tpl) else {
            warn!(container = %container.template.id, tpl = %container_tpl, "container template missing from catalog");
            stats.skipped_items += 1;
            return Ok(None);
        };
        let Some(mut grid) = ContainerGrid::from_template(template) else {
            debug!(container = %container.template.id, "container has no grid, leaving it empty");
            return Ok(Some(spawn));
        };
        let ammo = &location.static_ammo;
        let fill = self.config.static_magazine_fill();

        for tpl in location.forced_for_container(&container.template.id) {
            let outcome = self.place_item(
                composer, tpl, ammo, fill, &root_id, &mut grid, &mut spawn.items, rng, stats,
            )?;
            if let PlaceOutcome::NoRoom = outcome {
                warn!(container = %container.template.id, %tpl, "no room for forced item");
                stats.placement_failures += 1;
            }
        }

        let Some(distribution) = location.static_loot.get(&container_tpl) else {
            debug!(tpl = %container_tpl, "no static loot distribution for container");
            return Ok(Some(spawn));
        };
        let count = self.item_count(distribution, &location.name, rng);
        let candidates = WeightedPool::from_pairs(
            distribution
                .items
                .iter()
                .filter(|entry| filter.allows(&entry.tpl))
                .map(|entry| (entry.tpl.clone(), entry.weight)),
        );
        let locked: Vec<TemplateId> = candidates
            .keys()
            .filter(|tpl| {
                self.catalog
                    .is_of_any_base_class(tpl, &base_class::STACKABLE_LOOT)
            })
            .cloned()
            .collect();
        let chosen = candidates.draw(
            rng,
            count,
            self.config.allow_duplicate_items_in_static_containers,
            &locked,
        );

        let mut failures = 0;
        for tpl in &chosen {
            let outcome = self.place_item(
                composer, tpl, ammo, fill, &root_id, &mut grid, &mut spawn.items, rng, stats,
            )?;
            if let PlaceOutcome::NoRoom = outcome {
                stats.placement_failures += 1;
                failures += 1;
                if failures >= self.config.fit_attempts {
                    debug!(
                        container = %container.template.id,
                        failures,
                        "container full, stopped filling"
                    );
                    break;
                }
            }
        }
        Ok(Some(spawn))
    }

    fn item_count(&self, distribution: &StaticLootDistribution, location: &str, rng: &mut LootRng) -> usize {
        let counts = WeightedPool::from_pairs(
            distribution
                .item_count
                .iter()
                .map(|entry| (entry.count, entry.weight)),
        );
        let drawn = counts
            .draw(rng, 1, false, &[])
            .into_iter()
            .next()
            .unwrap_or(0);
        let scaled = (f64::from(drawn) * self.config.static_multiplier(location)).round();
        if scaled.is_nan() || scaled <= 0.0 {
            0
        } else {
            scaled as usize
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_item(
        &self,
        composer: &ItemComposer<'_>,
        tpl: &TemplateId,
        ammo: &AmmoTables,
        fill: MagazineFill,
        container_id: &ItemId,
        grid: &mut ContainerGrid,
        items: &mut Vec<PlacedItem>,
        rng: &mut LootRng,
        stats: &mut GenerationStats,
    ) -> Result<PlaceOutcome> {
        let mut composed = match composer.compose(tpl, ammo, fill, rng) {
            Ok(composed) => composed,
            Err(err) if err.is_item_local() => {
                warn!(%tpl, error = %err, "skipping container item");
                stats.skipped_items += 1;
                return Ok(PlaceOutcome::Skipped);
            }
            Err(err) => return Err(err),
        };
        let Some(placement) = grid.place(composed.width, composed.height) else {
            return Ok(PlaceOutcome::NoRoom);
        };
        if let Some(root) = composed.root_mut() {
            root.parent_id = Some(container_id.clone());
            root.slot_id = Some(CONTAINER_GRID_SLOT.to_string());
            root.location = Some(ItemLocation::Grid(placement.location()));
        }
        items.extend(composed.items);
        stats.container_items += 1;
        Ok(PlaceOutcome::Placed)
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_loose(
        &self,
        composer: &ItemComposer<'_>,
        location: &LocationLootData,
        loose: &LooseLoot,
        seasonal: &SeasonalFilter,
        rng: &mut LootRng,
        stats: &mut GenerationStats,
        spawns: &mut Vec<SpawnTemplate>,
    ) -> Result<()> {
        let single_spawn = self.config.single_spawn_templates(&location.name);
        let fill = self.config.loose_magazine_fill();
        let ammo = &location.static_ammo;
        let mut used_positions: HashSet<&str> = HashSet::new();

        let mut forced: Vec<&Spawnpoint> = loose.forced.iter().collect();
        let mut chosen_forced: Vec<&Spawnpoint> = Vec::with_capacity(forced.len());
        for tpl in single_spawn {
            let group: Vec<&Spawnpoint> = forced
                .iter()
                .copied()
                .filter(|spawnpoint| spawn_root_tpl(spawnpoint) == Some(tpl))
                .collect();
            forced.retain(|spawnpoint| spawn_root_tpl(spawnpoint) != Some(tpl));
            match pick_single_spawn(&group, rng) {
                Some(chosen) => chosen_forced.push(chosen),
                None => debug!(%tpl, "single-spawn item has no forced positions"),
            }
        }
        chosen_forced.extend(forced);

        for spawnpoint in chosen_forced {
            let Some(key) = spawnpoint.template.root_item().map(|item| item.id.clone()) else {
                warn!(spawn = %spawnpoint.template.id, "forced spawn point has no items");
                continue;
            };
            if let Some(spawn) =
                self.compose_at(composer, spawnpoint, &key, ammo, fill, rng, stats)?
            {
                used_positions.insert(spawnpoint.location_id.as_str());
                spawns.push(spawn);
            }
        }

        let filter = CandidateFilter {
            seasonal,
            blocked: vec![
                self.config.item_blacklist.as_slice(),
                self.config.loose_blacklist(&location.name),
                single_spawn,
            ],
        };

        let (always, weighted): (Vec<&Spawnpoint>, Vec<&Spawnpoint>) = loose
            .spawnpoints
            .iter()
            .partition(|spawnpoint| spawnpoint.template.is_always_spawn);
        for spawnpoint in always {
            if !used_positions.insert(spawnpoint.location_id.as_str()) {
                continue;
            }
            if let Some(spawn) = self.spawn_loose(composer, spawnpoint, ammo, fill, &filter, rng, stats)? {
                spawns.push(spawn);
            }
        }

        let count = loose.spawnpoint_count;
        let desired = (self.config.loose_multiplier(&location.name) * rng.normal(count.mean, count.std)).round();
        let desired = if desired.is_nan() || desired <= 0.0 {
            0
        } else {
            desired as usize
        };

        let pool = WeightedPool::from_pairs(
            weighted
                .iter()
                .enumerate()
                .map(|(index, spawnpoint)| (index, spawnpoint.probability)),
        );
        let mut chosen: Vec<&Spawnpoint> = Vec::with_capacity(desired);
        if desired > 0 {
            for index in pool.draw(rng, pool.len(), false, &[]) {
                if chosen.len() >= desired {
                    break;
                }
                let Some(spawnpoint) = weighted.get(index).copied() else {
                    continue;
                };
                if used_positions.insert(spawnpoint.location_id.as_str()) {
                    chosen.push(spawnpoint);
                }
            }
        }
        if chosen.len() < desired {
            info!(
                location = %location.name,
                desired,
                available = chosen.len(),
                "fewer distinct loose spawn points than requested"
            );
        }

        for spawnpoint in chosen {
            if let Some(spawn) = self.spawn_loose(composer, spawnpoint, ammo, fill, &filter, rng, stats)? {
                spawns.push(spawn);
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_loose(
        &self,
        composer: &ItemComposer<'_>,
        spawnpoint: &Spawnpoint,
        ammo: &AmmoTables,
        fill: MagazineFill,
        filter: &CandidateFilter<'_>,
        rng: &mut LootRng,
        stats: &mut GenerationStats,
    ) -> Result<Option<SpawnTemplate>> {
        let candidates = WeightedPool::from_pairs(
            spawnpoint
                .item_distribution
                .iter()
                .filter(|entry| {
                    spawnpoint
                        .template
                        .items
                        .iter()
                        .find(|item| item.id == entry.composed_key.key)
                        .map_or(true, |item| filter.allows(&item.tpl))
                })
                .map(|entry| (entry.composed_key.key.clone(), entry.weight)),
        );
        let Some(key) = candidates.draw(rng, 1, false, &[]).into_iter().next() else {
            debug!(spawn = %spawnpoint.template.id, "no eligible item for spawn point");
            return Ok(None);
        };
        self.compose_at(composer, spawnpoint, &key, ammo, fill, rng, stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn compose_at(
        &self,
        composer: &ItemComposer<'_>,
        spawnpoint: &Spawnpoint,
        key: &ItemId,
        ammo: &AmmoTables,
        fill: MagazineFill,
        rng: &mut LootRng,
        stats: &mut GenerationStats,
    ) -> Result<Option<SpawnTemplate>> {
        let composed = match composer.compose_spawn_item(&spawnpoint.template, key, ammo, fill, rng) {
            Ok(composed) => composed,
            Err(err) if err.is_item_local() => {
                warn!(spawn = %spawnpoint.template.id, error = %err, "skipping loose item");
                stats.skipped_items += 1;
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let mut spawn = spawnpoint.template.clone();
        spawn.root = Some(composed.root_id);
        spawn.items = composed.items;
        stats.loose_spawns += 1;
        Ok(Some(spawn))
    }
}

fn spawn_root_tpl(spawnpoint: &Spawnpoint) -> Option<&TemplateId> {
    spawnpoint.template.root_item().map(|item| &item.tpl)
}

fn pick_single_spawn<'s>(group: &[&'s Spawnpoint], rng: &mut LootRng) -> Option<&'s Spawnpoint> {
    let weighted = WeightedPool::from_pairs(
        group
            .iter()
            .enumerate()
            .map(|(index, spawnpoint)| (index, spawnpoint.probability)),
    );
    let pool = if weighted.total_weight() > 0.0 {
        weighted
    } else {
        WeightedPool::from_pairs((0..group.len()).map(|index| (index, 1.0)))
    };
    let index = pool.draw(rng, 1, false, &[]).into_iter().next()?;
    group.get(index).copied()
}

fn respawn(template: &SpawnTemplate) -> Option<SpawnTemplate> {
    let root = template.root_item()?;
    let items = reparent(&template.items, &root.id);
    let root_id = items.first()?.id.clone();
    Some(SpawnTemplate {
        root: Some(root_id),
        items,
        ..template.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::item::GridLocation;
    use crate::loot::test_support::*;
    use crate::world::location::{
        ComposedKey, ContainerGroup, ContainerGroupLink, CountWeight, ItemDistribution,
        ItemWeight, SpawnpointCount, StaticForced, Vec3,
    };
    use std::collections::HashMap;

    fn spawn_template(id: &str, items: Vec<PlacedItem>, always: bool) -> SpawnTemplate {
        SpawnTemplate {
            id: id.to_string(),
            is_container: false,
            use_gravity: false,
            random_rotation: false,
            position: Vec3::default(),
            rotation: Vec3::default(),
            is_always_spawn: always,
            root: items.first().map(|item| item.id.clone()),
            items,
        }
    }

    fn container(id: &str, container_tpl: &str, probability: f64, always: bool) -> StaticContainer {
        let root_id = format!("{id}_root");
        let mut template = spawn_template(id, vec![placed(&root_id, container_tpl, None, None)], always);
        template.is_container = true;
        StaticContainer {
            probability,
            template,
        }
    }

    fn distribution(counts: &[(u32, f64)], items: &[(&str, f64)]) -> StaticLootDistribution {
        StaticLootDistribution {
            item_count: counts
                .iter()
                .map(|(count, weight)| CountWeight {
                    count: *count,
                    weight: *weight,
                })
                .collect(),
            items: items
                .iter()
                .map(|(id, weight)| ItemWeight {
                    tpl: tpl(id),
                    weight: *weight,
                })
                .collect(),
        }
    }

    fn spawnpoint(location_id: &str, probability: f64, items: &[(&str, &str, f64)], always: bool) -> Spawnpoint {
        let placed_items: Vec<PlacedItem> = items
            .iter()
            .map(|(key, tpl_id, _)| placed(key, tpl_id, None, None))
            .collect();
        Spawnpoint {
            location_id: location_id.to_string(),
            probability,
            template: spawn_template(&format!("sp_{location_id}"), placed_items, always),
            item_distribution: items
                .iter()
                .map(|(key, _, weight)| ItemDistribution {
                    composed_key: ComposedKey {
                        key: ItemId::from(*key),
                    },
                    weight: *weight,
                })
                .collect(),
        }
    }

    fn location(
        containers: Vec<StaticContainer>,
        static_loot: Vec<(&str, StaticLootDistribution)>,
        loose: LooseLoot,
    ) -> LocationLootData {
        LocationLootData {
            name: "testmap".to_string(),
            static_loot: static_loot
                .into_iter()
                .map(|(container_tpl, dist)| (tpl(container_tpl), dist))
                .collect(),
            static_containers: Some(StaticContainerSet {
                static_containers: containers,
                ..StaticContainerSet::default()
            }),
            static_ammo: ammo_tables(),
            loose_loot: Some(loose),
        }
    }

    fn grid_children<'s>(spawn: &'s SpawnTemplate) -> Vec<&'s PlacedItem> {
        let Some(root) = spawn.root.as_ref() else {
            return Vec::new();
        };
        spawn
            .items
            .iter()
            .filter(|item| item.is_child_of(root) && item.slot_id.as_deref() == Some(CONTAINER_GRID_SLOT))
            .collect()
    }

    fn grid_location(item: &PlacedItem) -> Option<GridLocation> {
        match item.location {
            Some(ItemLocation::Grid(grid)) => Some(grid),
            _ => None,
        }
    }

    fn run(location: &LocationLootData, config: &LootConfig, seed: u64) -> Result<GeneratedLoot> {
        let catalog = catalog();
        let presets = presets();
        let generator = LocationLootGenerator::new(&catalog, &presets, config);
        let mut rng = LootRng::from_seed(seed);
        generator.generate(location, &SeasonalFilter::default(), &mut rng)
    }

    #[test]
    fn two_by_two_container_holds_two_single_cell_items() {
        let map = location(
            vec![container("crate_a", CRATE, 1.0, true)],
            vec![(CRATE, distribution(&[(2, 1.0)], &[(BOLTS, 1.0)]))],
            LooseLoot::default(),
        );
        let loot = run(&map, &LootConfig::default(), 1).expect("generate");
        assert_eq!(loot.spawns.len(), 1);
        let children = grid_children(&loot.spawns[0]);
        assert_eq!(children.len(), 2);
        let cells: Vec<(u32, u32)> = children
            .iter()
            .filter_map(|item| grid_location(item))
            .map(|grid| (grid.x, grid.y))
            .collect();
        assert_eq!(cells, vec![(0, 0), (1, 0)]);
        assert_eq!(loot.stats.container_items, 2);
        assert_eq!(loot.stats.containers, 1);
    }

    #[test]
    fn distinct_draws_only_repeat_locked_templates() {
        let config = LootConfig {
            allow_duplicate_items_in_static_containers: false,
            ..LootConfig::default()
        };
        let bolts = location(
            vec![container("crate_a", CRATE, 1.0, true)],
            vec![(CRATE, distribution(&[(2, 1.0)], &[(BOLTS, 1.0)]))],
            LooseLoot::default(),
        );
        let loot = run(&bolts, &config, 1).expect("generate");
        assert_eq!(grid_children(&loot.spawns[0]).len(), 1);

        let money = location(
            vec![container("crate_a", CRATE, 1.0, true)],
            vec![(CRATE, distribution(&[(2, 1.0)], &[(ROUBLES, 1.0)]))],
            LooseLoot::default(),
        );
        let loot = run(&money, &config, 1).expect("generate");
        assert_eq!(grid_children(&loot.spawns[0]).len(), 2);
    }

    #[test]
    fn fit_budget_stops_a_full_container() {
        let map = location(
            vec![container("box_a", TINY_BOX, 1.0, true)],
            vec![(TINY_BOX, distribution(&[(8, 1.0)], &[(BOLTS, 1.0)]))],
            LooseLoot::default(),
        );
        let loot = run(&map, &LootConfig::default(), 3).expect("generate");
        assert_eq!(grid_children(&loot.spawns[0]).len(), 1);
        assert_eq!(loot.stats.placement_failures, 3);
    }

    #[test]
    fn forced_items_are_placed_first() {
        let mut map = location(
            vec![container("crate_a", CRATE, 1.0, true)],
            vec![(CRATE, distribution(&[(1, 1.0)], &[(BOLTS, 1.0)]))],
            LooseLoot::default(),
        );
        if let Some(set) = map.static_containers.as_mut() {
            set.static_forced.push(StaticForced {
                container_id: "crate_a".to_string(),
                item_tpl: tpl(KEY),
            });
        }
        let loot = run(&map, &LootConfig::default(), 5).expect("generate");
        let children = grid_children(&loot.spawns[0]);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tpl.as_str(), KEY);
        assert_eq!(grid_location(children[0]).map(|grid| (grid.x, grid.y)), Some((0, 0)));
    }

    #[test]
    fn rotated_items_record_rotation() {
        let map = location(
            vec![container("shelf_a", SHELF, 1.0, true)],
            vec![(SHELF, distribution(&[(1, 1.0)], &[(WIDE, 1.0)]))],
            LooseLoot::default(),
        );
        let loot = run(&map, &LootConfig::default(), 2).expect("generate");
        let children = grid_children(&loot.spawns[0]);
        assert_eq!(children.len(), 1);
        let grid = grid_location(children[0]).expect("grid location");
        assert_eq!((grid.x, grid.y), (0, 0));
        assert!(grid.is_rotated());
    }

    #[test]
    fn missing_templates_are_skipped() {
        let map = location(
            vec![container("crate_a", BIG_CRATE, 1.0, true)],
            vec![(BIG_CRATE, distribution(&[(3, 1.0)], &[("ghost", 1.0)]))],
            LooseLoot::default(),
        );
        let loot = run(&map, &LootConfig::default(), 5).expect("generate");
        assert!(grid_children(&loot.spawns[0]).is_empty());
        assert_eq!(loot.stats.skipped_items, 3);
    }

    #[test]
    fn composite_items_are_packed_with_children() {
        let map = location(
            vec![container("crate_a", BIG_CRATE, 1.0, true)],
            vec![(BIG_CRATE, distribution(&[(1, 1.0)], &[(RIFLE, 1.0)]))],
            LooseLoot::default(),
        );
        let loot = run(&map, &LootConfig::default(), 9).expect("generate");
        let spawn = &loot.spawns[0];
        let children = grid_children(spawn);
        assert_eq!(children.len(), 1);
        let rifle = children[0];
        assert_eq!(rifle.tpl.as_str(), RIFLE);
        assert!(spawn.items.iter().any(|item| item.is_child_of(&rifle.id)));
    }

    #[test]
    fn same_seed_same_loot() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 3.0, std: 1.0 },
            forced: Vec::new(),
            spawnpoints: vec![
                spawnpoint("a", 0.5, &[("a1", BOLTS, 1.0), ("a2", M855, 2.0)], false),
                spawnpoint("b", 0.3, &[("b1", ROUBLES, 1.0)], false),
                spawnpoint("c", 0.9, &[("c1", MAG30, 1.0)], false),
                spawnpoint("d", 0.1, &[("d1", MEDKIT, 1.0)], false),
            ],
        };
        let map = location(
            vec![
                container("crate_a", BIG_CRATE, 0.5, false),
                container("crate_b", BIG_CRATE, 0.5, false),
            ],
            vec![(
                BIG_CRATE,
                distribution(
                    &[(2, 1.0), (4, 2.0)],
                    &[(RIFLE, 1.0), (AMMO_BOX, 2.0), (ROUBLES, 3.0), (BOLTS, 1.0)],
                ),
            )],
            loose,
        );
        let shape = |loot: GeneratedLoot| {
            loot.spawns
                .into_iter()
                .map(|spawn| {
                    let items: Vec<(String, Option<ItemLocation>, u32)> = spawn
                        .items
                        .iter()
                        .map(|item| (item.tpl.0.clone(), item.location, item.stack_count()))
                        .collect();
                    (spawn.id, items)
                })
                .collect::<Vec<_>>()
        };
        let first = shape(run(&map, &LootConfig::default(), 77).expect("generate"));
        let second = shape(run(&map, &LootConfig::default(), 77).expect("generate"));
        assert_eq!(first, second);
    }

    #[test]
    fn every_pass_mints_fresh_ids() {
        let map = location(
            vec![container("crate_a", BIG_CRATE, 1.0, true)],
            vec![(BIG_CRATE, distribution(&[(3, 1.0)], &[(AMMO_BOX, 1.0)]))],
            LooseLoot::default(),
        );
        let first = run(&map, &LootConfig::default(), 4).expect("generate");
        let second = run(&map, &LootConfig::default(), 4).expect("generate");
        let mut ids = HashSet::new();
        for spawn in first.spawns.iter().chain(second.spawns.iter()) {
            for item in &spawn.items {
                assert!(ids.insert(item.id.clone()), "duplicate id {}", item.id);
                assert_ne!(item.id.as_str(), "crate_a_root");
            }
        }
    }

    #[test]
    fn container_groups_limit_members() {
        let mut map = location(
            vec![
                container("g1", CRATE, 1.0, false),
                container("g2", CRATE, 1.0, false),
                container("g3", CRATE, 1.0, false),
                container("solo", CRATE, 0.0, false),
            ],
            Vec::new(),
            LooseLoot::default(),
        );
        if let Some(set) = map.static_containers.as_mut() {
            set.container_groups.insert(
                "shelf".to_string(),
                ContainerGroup {
                    min_containers: 1,
                    max_containers: 1,
                },
            );
            for id in ["g1", "g2", "g3"] {
                set.container_links.insert(
                    id.to_string(),
                    ContainerGroupLink {
                        group_id: "shelf".to_string(),
                    },
                );
            }
        }
        for seed in 0..10 {
            let loot = run(&map, &LootConfig::default(), seed).expect("generate");
            assert_eq!(loot.stats.containers, 1);
            assert_ne!(loot.spawns[0].id, "solo");
        }

        let config = LootConfig {
            container_randomisation: false,
            ..LootConfig::default()
        };
        let loot = run(&map, &config, 1).expect("generate");
        let ids: Vec<&str> = loot.spawns.iter().map(|spawn| spawn.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3", "solo"]);
    }

    #[test]
    fn static_weapons_are_cloned_with_new_ids() {
        let mut map = location(Vec::new(), Vec::new(), LooseLoot::default());
        if let Some(set) = map.static_containers.as_mut() {
            set.static_weapons.push(spawn_template(
                "mounted",
                vec![
                    placed("w_root", RIFLE, None, None),
                    placed("w_stock", STOCK, Some("w_root"), Some("mod_stock")),
                ],
                true,
            ));
        }
        let loot = run(&map, &LootConfig::default(), 1).expect("generate");
        assert_eq!(loot.stats.static_weapons, 1);
        let spawn = &loot.spawns[0];
        assert_eq!(spawn.items.len(), 2);
        let root = spawn.root.as_ref().expect("root");
        assert_ne!(root.as_str(), "w_root");
        assert!(spawn.items[1].is_child_of(root));
    }

    #[test]
    fn forced_single_spawn_lands_at_exactly_one_position() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 5.0, std: 0.0 },
            forced: vec![
                spawnpoint("A", 1.0, &[("fa", KEY, 1.0)], false),
                spawnpoint("B", 2.0, &[("fb", KEY, 1.0)], false),
                spawnpoint("C", 3.0, &[("fc", KEY, 1.0)], false),
                spawnpoint("D", 1.0, &[("fd", BOLTS, 1.0)], false),
            ],
            spawnpoints: vec![
                spawnpoint("E", 1.0, &[("e1", KEY, 5.0), ("e2", BOLTS, 1.0)], false),
                spawnpoint("F", 1.0, &[("f1", KEY, 1.0)], false),
            ],
        };
        let map = location(Vec::new(), Vec::new(), loose);
        let mut config = LootConfig::default();
        config
            .forced_loot_single_spawn_by_id
            .insert("testmap".to_string(), vec![tpl(KEY)]);

        let mut positions = HashSet::new();
        for seed in 0..30 {
            let loot = run(&map, &config, seed).expect("generate");
            let keyed: Vec<&SpawnTemplate> = loot
                .spawns
                .iter()
                .filter(|spawn| spawn.root_item().is_some_and(|item| item.tpl.as_str() == KEY))
                .collect();
            assert_eq!(keyed.len(), 1, "seed {seed}");
            positions.insert(keyed[0].id.clone());
            assert!(loot.spawns.iter().any(|spawn| spawn.id == "sp_D"));
        }
        assert!(positions.iter().all(|id| ["sp_A", "sp_B", "sp_C"].contains(&id.as_str())));
        assert!(positions.len() > 1);
    }

    #[test]
    fn forced_loose_items_are_composed() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 0.0, std: 0.0 },
            forced: vec![
                spawnpoint("mag", 1.0, &[("fm", MAG30, 1.0)], false),
                spawnpoint("cash", 1.0, &[("fr", ROUBLES, 1.0)], false),
            ],
            spawnpoints: Vec::new(),
        };
        let map = location(Vec::new(), Vec::new(), loose);
        for seed in 0..10 {
            let loot = run(&map, &LootConfig::default(), seed).expect("generate");
            assert_eq!(loot.stats.loose_spawns, 2);

            let magazine = loot.spawns.iter().find(|spawn| spawn.id == "sp_mag").expect("magazine spawn");
            let root = magazine.root.as_ref().expect("root");
            assert_ne!(root.as_str(), "fm");
            let loaded: u32 = magazine
                .items
                .iter()
                .filter(|item| item.is_child_of(root))
                .map(PlacedItem::stack_count)
                .sum();
            assert!((8..=30).contains(&loaded), "seed {seed}: {loaded} cartridges");

            let cash = loot.spawns.iter().find(|spawn| spawn.id == "sp_cash").expect("cash spawn");
            let stack = cash.root_item().expect("root").stack_count();
            assert!((500..=5000).contains(&stack), "seed {seed}: stack {stack}");
        }
    }

    #[test]
    fn seasonal_and_blacklisted_items_never_spawn() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 4.0, std: 0.0 },
            forced: Vec::new(),
            spawnpoints: vec![
                spawnpoint("a", 1.0, &[("a1", CANDY, 10.0), ("a2", BOLTS, 1.0)], false),
                spawnpoint("b", 1.0, &[("b1", CANDY, 1.0)], false),
                spawnpoint("c", 1.0, &[("c1", KEY, 1.0), ("c2", BOLTS, 1.0)], false),
                spawnpoint("d", 1.0, &[("d1", BOLTS, 1.0)], false),
            ],
        };
        let map = location(
            vec![container("crate_a", BIG_CRATE, 1.0, true)],
            vec![(BIG_CRATE, distribution(&[(6, 1.0)], &[(CANDY, 5.0), (BOLTS, 1.0)]))],
            loose,
        );
        let mut config = LootConfig::default();
        config
            .loose_loot_blacklist
            .insert("testmap".to_string(), vec![tpl(KEY)]);
        let seasonal = SeasonalFilter {
            active: false,
            blacklist: vec![tpl(CANDY)],
        };
        let catalog = catalog();
        let presets = presets();
        let generator = LocationLootGenerator::new(&catalog, &presets, &config);
        for seed in 0..10 {
            let mut rng = LootRng::from_seed(seed);
            let loot = generator.generate(&map, &seasonal, &mut rng).expect("generate");
            for spawn in &loot.spawns {
                for item in &spawn.items {
                    assert_ne!(item.tpl.as_str(), CANDY);
                    assert_ne!(item.tpl.as_str(), KEY);
                }
            }
        }
    }

    #[test]
    fn loose_spawns_are_capped_by_distinct_positions() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 10.0, std: 0.0 },
            forced: Vec::new(),
            spawnpoints: vec![
                spawnpoint("x", 1.0, &[("x1", BOLTS, 1.0)], false),
                spawnpoint("x", 1.0, &[("x2", BOLTS, 1.0)], false),
                spawnpoint("y", 1.0, &[("y1", BOLTS, 1.0)], false),
            ],
        };
        let map = location(Vec::new(), Vec::new(), loose);
        let loot = run(&map, &LootConfig::default(), 8).expect("generate");
        assert_eq!(loot.stats.loose_spawns, 2);
        let positions: HashSet<&str> = loot.spawns.iter().map(|spawn| spawn.id.as_str()).collect();
        assert!(positions.contains("sp_y"));
    }

    #[test]
    fn always_spawn_points_skip_the_budget() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 0.0, std: 0.0 },
            forced: Vec::new(),
            spawnpoints: vec![
                spawnpoint("fixed", 0.0, &[("k", KEY, 1.0)], true),
                spawnpoint("random", 1.0, &[("r", BOLTS, 1.0)], false),
            ],
        };
        let map = location(Vec::new(), Vec::new(), loose);
        let loot = run(&map, &LootConfig::default(), 8).expect("generate");
        assert_eq!(loot.stats.loose_spawns, 1);
        assert_eq!(loot.spawns[0].id, "sp_fixed");
    }

    #[test]
    fn loose_multiplier_scales_the_target() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 2.0, std: 0.0 },
            forced: Vec::new(),
            spawnpoints: (0..6)
                .map(|index| {
                    let position = format!("p{index}");
                    spawnpoint(&position, 1.0, &[("k", BOLTS, 1.0)], false)
                })
                .collect(),
        };
        let map = location(Vec::new(), Vec::new(), loose);
        let mut multipliers = HashMap::new();
        multipliers.insert("testmap".to_string(), 2.0);
        let config = LootConfig {
            loose_loot_multiplier: multipliers,
            ..LootConfig::default()
        };
        let loot = run(&map, &config, 8).expect("generate");
        assert_eq!(loot.stats.loose_spawns, 4);
    }

    #[test]
    fn loose_items_are_composed_from_their_key() {
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 1.0, std: 0.0 },
            forced: Vec::new(),
            spawnpoints: vec![spawnpoint("m", 1.0, &[("m1", MAG30, 1.0)], false)],
        };
        let map = location(Vec::new(), Vec::new(), loose);
        let loot = run(&map, &LootConfig::default(), 8).expect("generate");
        let spawn = &loot.spawns[0];
        let root = spawn.root.as_ref().expect("root");
        assert_ne!(root.as_str(), "m1");
        let loaded: u32 = spawn
            .items
            .iter()
            .filter(|item| item.is_child_of(root))
            .map(|item| item.stack_count())
            .sum();
        assert!((8..=30).contains(&loaded));
    }

    #[test]
    fn missing_spawn_keys_are_skipped() {
        let mut point = spawnpoint("m", 1.0, &[("m1", BOLTS, 1.0)], false);
        point.template.items.clear();
        let loose = LooseLoot {
            spawnpoint_count: SpawnpointCount { mean: 1.0, std: 0.0 },
            forced: Vec::new(),
            spawnpoints: vec![point],
        };
        let map = location(Vec::new(), Vec::new(), loose);
        let loot = run(&map, &LootConfig::default(), 8).expect("generate");
        assert!(loot.spawns.is_empty());
        assert_eq!(loot.stats.skipped_items, 1);
    }

    #[test]
    fn corrupt_locations_are_rejected() {
        let mut map = location(Vec::new(), Vec::new(), LooseLoot::default());
        map.loose_loot = None;
        let err = run(&map, &LootConfig::default(), 1).expect_err("corrupt");
        assert!(matches!(err, LootError::CorruptLocation { missing: "loose loot", .. }));

        let mut map = location(Vec::new(), Vec::new(), LooseLoot::default());
        map.static_containers = None;
        let err = run(&map, &LootConfig::default(), 1).expect_err("corrupt");
        assert!(matches!(err, LootError::CorruptLocation { missing: "static container", .. }));
    }
}
