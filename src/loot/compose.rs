use crate::entities::item::{
    subtree, FoodDrinkState, ItemId, ItemLocation, ItemUpd, MedKitState, PlacedItem, TemplateId,
};
use crate::error::{LootError, Result};
use crate::loot::rng::LootRng;
use crate::loot::sampler::WeightedPool;
use crate::world::catalog::{base_class, Catalog, CatalogItem, SlotDef};
use crate::world::location::{AmmoTables, SpawnTemplate};
use crate::world::presets::PresetIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const CARTRIDGE_SLOT: &str = "cartridges";
pub const MAGAZINE_SLOT: &str = "mod_magazine";
pub const DEFAULT_MIN_FILL: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct ComposedItem {
    pub root_id: ItemId,
    pub items: Vec<PlacedItem>,
    pub width: u32,
    pub height: u32,
}

impl ComposedItem {
    pub fn root(&self) -> Option<&PlacedItem> {
        self.items.iter().find(|item| item.id == self.root_id)
    }

    pub fn root_mut(&mut self) -> Option<&mut PlacedItem> {
        let root_id = self.root_id.clone();
        self.items.iter_mut().find(|item| item.id == root_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaliberCorrection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magazine: Option<TemplateId>,
    pub from: String,
    pub to: String,
}

pub fn default_caliber_corrections() -> Vec<CaliberCorrection> {
    vec![CaliberCorrection {
        magazine: None,
        from: "Caliber9x18PMM".to_string(),
        to: "Caliber9x18PM".to_string(),
    }]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagazineFill {
    pub chance_percent: u32,
    pub min_fill: f64,
}

impl Default for MagazineFill {
    fn default() -> Self {
        Self {
            chance_percent: 100,
            min_fill: DEFAULT_MIN_FILL,
        }
    }
}

pub struct ItemComposer<'a> {
    catalog: &'a Catalog,
    presets: &'a PresetIndex,
    corrections: &'a [CaliberCorrection],
}

impl<'a> ItemComposer<'a> {
    pub fn new(catalog: &'a Catalog, presets: &'a PresetIndex) -> Self {
        Self {
            catalog,
            presets,
            corrections: &[],
        }
    }

    pub fn with_corrections(mut self, corrections: &'a [CaliberCorrection]) -> Self {
        self.corrections = corrections;
        self
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Builds a fresh item tree for `tpl`. Fails only when a template the
    /// tree needs is missing from the catalog.
    pub fn compose(
        &self,
        tpl: &TemplateId,
        ammo: &AmmoTables,
        fill: MagazineFill,
        rng: &mut LootRng,
    ) -> Result<ComposedItem> {
        let template = self.catalog.require(tpl)?;
        let items = if self.catalog.is_of_base_class(tpl, base_class::WEAPON)
            || self.catalog.is_of_any_base_class(tpl, &base_class::ARMORED)
        {
            self.compose_preset(template, ammo, fill, rng)?
        } else {
            self.compose_single(PlacedItem::new(tpl.clone()), template, ammo, fill, rng)?
        };
        self.finish(items)
    }

    /// Builds the item a loose-loot spawn point offers under `key`. Stackable
    /// loot, ammo boxes and magazines are rebuilt from their template; any
    /// other item keeps the attachments listed in the spawn template.
    pub fn compose_spawn_item(
        &self,
        spawn: &SpawnTemplate,
        key: &ItemId,
        ammo: &AmmoTables,
        fill: MagazineFill,
        rng: &mut LootRng,
    ) -> Result<ComposedItem> {
        let chosen = spawn
            .items
            .iter()
            .find(|item| &item.id == key)
            .ok_or_else(|| LootError::MissingSpawnItem {
                spawn_point: spawn.id.clone(),
                key: key.clone(),
            })?;
        let template = self.catalog.require(&chosen.tpl)?;
        let rebuilt = self.catalog.is_of_any_base_class(&chosen.tpl, &base_class::STACKABLE_LOOT)
            || self.catalog.is_of_base_class(&chosen.tpl, base_class::AMMO_BOX)
            || self.catalog.is_of_base_class(&chosen.tpl, base_class::MAGAZINE);
        let items = if rebuilt {
            self.compose_single(PlacedItem::new(chosen.tpl.clone()), template, ammo, fill, rng)?
        } else {
            let mut items = reparent(&spawn.items, key);
            if let Some(root) = items.first_mut() {
                apply_resource(self.catalog, root, template);
            }
            items
        };
        self.finish(items)
    }

    fn finish(&self, items: Vec<PlacedItem>) -> Result<ComposedItem> {
        let root_id = items
            .first()
            .map(|item| item.id.clone())
            .ok_or_else(|| LootError::Config("composed an empty item tree".to_string()))?;
        let (width, height) = item_size(self.catalog, &items, &root_id)?;
        Ok(ComposedItem {
            root_id,
            items,
            width,
            height,
        })
    }

    fn compose_single(
        &self,
        mut root: PlacedItem,
        template: &CatalogItem,
        ammo: &AmmoTables,
        fill: MagazineFill,
        rng: &mut LootRng,
    ) -> Result<Vec<PlacedItem>> {
        let tpl = &template.id;
        if self.catalog.is_of_any_base_class(tpl, &base_class::STACKABLE_LOOT) {
            let count = rng
                .roll_range(template.props.stack_min_random, template.props.stack_max_random)
                .max(1);
            root.set_stack_count(count);
            return Ok(vec![root]);
        }
        if self.catalog.is_of_base_class(tpl, base_class::AMMO_BOX) {
            let cartridges = self.ammo_box_cartridges(&root.id, template)?;
            let mut items = vec![root];
            items.extend(cartridges);
            return Ok(items);
        }
        if self.catalog.is_of_base_class(tpl, base_class::MAGAZINE) {
            let mut items = vec![root];
            if rng.roll_percent(fill.chance_percent) {
                let cartridges = self.magazine_cartridges(&items[0], None, ammo, fill.min_fill, rng)?;
                items.extend(cartridges);
            }
            return Ok(items);
        }
        apply_resource(self.catalog, &mut root, template);
        Ok(vec![root])
    }

    fn compose_preset(
        &self,
        template: &CatalogItem,
        ammo: &AmmoTables,
        fill: MagazineFill,
        rng: &mut LootRng,
    ) -> Result<Vec<PlacedItem>> {
        let Some(preset) = self.presets.default_for(&template.id) else {
            warn!(tpl = %template.id, "no default preset, composing root item only");
            return Ok(vec![PlacedItem::new(template.id.clone())]);
        };
        let mut items = reparent(&preset.items, &preset.parent);
        if items.is_empty() {
            warn!(tpl = %template.id, preset = %preset.id, "default preset has no root item");
            return Ok(vec![PlacedItem::new(template.id.clone())]);
        }

        if !self.catalog.is_of_base_class(&template.id, base_class::WEAPON) {
            return Ok(items);
        }
        let Some(magazine_index) = items.iter().skip(1).position(|item| {
            item.slot_id.as_deref() == Some(MAGAZINE_SLOT)
                || self.catalog.is_of_base_class(&item.tpl, base_class::MAGAZINE)
        }) else {
            debug!(tpl = %template.id, "weapon preset has no magazine");
            return Ok(items);
        };
        let magazine_index = magazine_index + 1;
        if !rng.roll_percent(fill.chance_percent) {
            return Ok(items);
        }

        let magazine_id = items[magazine_index].id.clone();
        items.retain(|item| {
            !(item.is_child_of(&magazine_id) && item.slot_id.as_deref() == Some(CARTRIDGE_SLOT))
        });
        let Some(magazine_index) = items.iter().position(|item| item.id == magazine_id) else {
            return Ok(items);
        };
        let cartridges = self.magazine_cartridges(
            &items[magazine_index],
            template.props.ammo_caliber.clone(),
            ammo,
            fill.min_fill,
            rng,
        )?;
        let insert_at = magazine_index + 1;
        items.splice(insert_at..insert_at, cartridges);
        Ok(items)
    }

    pub fn magazine_cartridges(
        &self,
        magazine: &PlacedItem,
        caliber: Option<String>,
        ammo: &AmmoTables,
        min_fill: f64,
        rng: &mut LootRng,
    ) -> Result<Vec<PlacedItem>> {
        let template = self.catalog.require(&magazine.tpl)?;
        let Some(slot) = template.props.cartridges.first() else {
            return Ok(Vec::new());
        };
        let caliber = match caliber {
            Some(caliber) => Some(caliber),
            None => {
                let calibers = self.catalog.magazine_calibers(template);
                rng.pick(&calibers).cloned()
            }
        };
        let Some(caliber) = caliber else {
            debug!(tpl = %magazine.tpl, "magazine accepts no known caliber");
            return Ok(Vec::new());
        };
        let caliber = self.correct_caliber(&template.id, caliber);
        let Some(cartridge_tpl) = self.draw_cartridge(&caliber, slot, ammo, rng) else {
            warn!(tpl = %magazine.tpl, %caliber, "no cartridge available for magazine");
            return Ok(Vec::new());
        };
        let cartridge = self.catalog.require(&cartridge_tpl)?;

        let capacity = slot.max_count;
        if capacity == 0 {
            return Ok(Vec::new());
        }
        let min_fill = if min_fill.is_nan() { 0.0 } else { min_fill.clamp(0.0, 1.0) };
        let minimum = ((min_fill * f64::from(capacity)).round() as u32).min(capacity);
        let desired = rng.roll_range(minimum, capacity);
        Ok(split_stacks(&magazine.id, &cartridge_tpl, desired, cartridge.max_stack()))
    }

    fn ammo_box_cartridges(&self, box_id: &ItemId, template: &CatalogItem) -> Result<Vec<PlacedItem>> {
        let Some(slot) = template.props.stack_slots.first() else {
            return Ok(Vec::new());
        };
        let Some(cartridge_tpl) = slot.allowed().first() else {
            return Ok(Vec::new());
        };
        let cartridge = self.catalog.require(cartridge_tpl)?;
        Ok(split_stacks(box_id, cartridge_tpl, slot.max_count, cartridge.max_stack()))
    }

    fn correct_caliber(&self, magazine: &TemplateId, caliber: String) -> String {
        self.corrections
            .iter()
            .find(|correction| {
                correction.from == caliber
                    && correction
                        .magazine
                        .as_ref()
                        .map_or(true, |tpl| tpl == magazine)
            })
            .map(|correction| correction.to.clone())
            .unwrap_or(caliber)
    }

    fn draw_cartridge(
        &self,
        caliber: &str,
        slot: &SlotDef,
        ammo: &AmmoTables,
        rng: &mut LootRng,
    ) -> Option<TemplateId> {
        if let Some(table) = ammo.get(caliber) {
            let pool = WeightedPool::from_pairs(table.iter().map(|entry| (entry.tpl.clone(), entry.weight)));
            if let Some(tpl) = pool.draw(rng, 1, false, &[]).into_iter().next() {
                return Some(tpl);
            }
        }
        warn!(%caliber, "no ammo distribution for caliber, using magazine default");
        slot.allowed()
            .iter()
            .find(|tpl| {
                self.catalog
                    .get(tpl)
                    .and_then(|cartridge| cartridge.props.caliber.as_deref())
                    == Some(caliber)
            })
            .or_else(|| slot.allowed().first())
            .cloned()
    }
}

pub fn reparent(items: &[PlacedItem], root: &ItemId) -> Vec<PlacedItem> {
    let tree = subtree(items, root);
    let renamed: HashMap<&ItemId, ItemId> = tree
        .iter()
        .map(|item| (&item.id, ItemId::next()))
        .collect();
    tree.iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let mut clone = (*item).clone();
            clone.id = renamed.get(&item.id)?.clone();
            if index == 0 {
                clone.parent_id = None;
                clone.slot_id = None;
                clone.location = None;
            } else {
                clone.parent_id = item
                    .parent_id
                    .as_ref()
                    .and_then(|parent| renamed.get(parent))
                    .cloned();
            }
            Some(clone)
        })
        .collect()
}

fn split_stacks(parent: &ItemId, tpl: &TemplateId, total: u32, stack_size: u32) -> Vec<PlacedItem> {
    let stack_size = stack_size.max(1);
    let mut stacks = Vec::new();
    let mut remaining = total;
    let mut index = 0;
    while remaining > 0 {
        let count = remaining.min(stack_size);
        let mut cartridge = PlacedItem::child_of(tpl.clone(), parent, CARTRIDGE_SLOT);
        cartridge.location = Some(ItemLocation::Index(index));
        cartridge.set_stack_count(count);
        stacks.push(cartridge);
        remaining -= count;
        index += 1;
    }
    stacks
}

fn apply_resource(catalog: &Catalog, item: &mut PlacedItem, template: &CatalogItem) {
    if catalog.is_of_base_class(&template.id, base_class::MEDKIT) {
        if let Some(hp_resource) = template.props.max_hp_resource {
            let upd = item.upd.get_or_insert_with(ItemUpd::default);
            upd.med_kit.get_or_insert(MedKitState { hp_resource });
        }
    } else if catalog.is_of_base_class(&template.id, base_class::FOOD_DRINK) {
        if let Some(hp_percent) = template.props.max_resource {
            let upd = item.upd.get_or_insert_with(ItemUpd::default);
            upd.food_drink.get_or_insert(FoodDrinkState { hp_percent });
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Extension {
    left: u32,
    right: u32,
    up: u32,
    down: u32,
}

/// Footprint of the tree under `root`. Children flagged force-add extend the
/// item cumulatively; every other child only counts when it sticks out
/// further than the largest one seen in that direction.
pub fn item_size(catalog: &Catalog, items: &[PlacedItem], root: &ItemId) -> Result<(u32, u32)> {
    let tree = subtree(items, root);
    let Some(root_item) = tree.first() else {
        return Ok((1, 1));
    };
    let (width, height) = catalog.require(&root_item.tpl)?.footprint();

    let mut largest = Extension::default();
    let mut forced = Extension::default();
    for child in tree.iter().skip(1) {
        let Some(template) = catalog.get(&child.tpl) else {
            continue;
        };
        let props = &template.props;
        if props.extra_size_force_add {
            forced.left += props.extra_size_left;
            forced.right += props.extra_size_right;
            forced.up += props.extra_size_up;
            forced.down += props.extra_size_down;
        } else {
            largest.left = largest.left.max(props.extra_size_left);
            largest.right = largest.right.max(props.extra_size_right);
            largest.up = largest.up.max(props.extra_size_up);
            largest.down = largest.down.max(props.extra_size_down);
        }
    }

    Ok((
        width + largest.left + largest.right + forced.left + forced.right,
        height + largest.up + largest.down + forced.up + forced.down,
    ))
}
