use crate::entities::item::TemplateId;
use crate::error::{LootError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod base_class {
    pub const ITEM: &str = "54009119af1c881c07000029";
    pub const WEAPON: &str = "5422acb9af1c889c16000029";
    pub const MAGAZINE: &str = "5448bc234bdc2d3c308b4569";
    pub const AMMO: &str = "5485a8684bdc2da71d8b4567";
    pub const AMMO_BOX: &str = "543be5cb4bdc2deb348b4568";
    pub const MONEY: &str = "543be5dd4bdc2deb348b4569";
    pub const ARMOR: &str = "5448e54d4bdc2dcc718b4568";
    pub const VEST: &str = "5448e5284bdc2dcb718b4567";
    pub const HEADWEAR: &str = "5a341c4086f77401f2541505";
    pub const MEDKIT: &str = "5448f39d4bdc2d0a728b4568";
    pub const FOOD_DRINK: &str = "543be6674bdc2df1348b4569";
    pub const KEY: &str = "543be5e94bdc2df1348b4568";

    pub const ARMORED: [&str; 3] = [ARMOR, VEST, HEADWEAR];
    pub const STACKABLE_LOOT: [&str; 2] = [MONEY, AMMO];
}

const MAX_LINEAGE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    #[default]
    Item,
    Node,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFilter {
    #[serde(rename = "Filter", default)]
    pub filter: Vec<TemplateId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotProps {
    #[serde(default)]
    pub filters: Vec<SlotFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDef {
    #[serde(rename = "_name", default)]
    pub name: String,
    #[serde(rename = "_max_count", default)]
    pub max_count: u32,
    #[serde(rename = "_required", default)]
    pub required: bool,
    #[serde(rename = "_props", default)]
    pub props: SlotProps,
}

impl SlotDef {
    pub fn allowed(&self) -> &[TemplateId] {
        self.props
            .filters
            .first()
            .map(|filter| filter.filter.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridProps {
    #[serde(rename = "cellsH", default)]
    pub cells_h: u32,
    #[serde(rename = "cellsV", default)]
    pub cells_v: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDef {
    #[serde(rename = "_name", default)]
    pub name: String,
    #[serde(rename = "_props", default)]
    pub props: GridProps,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemProps {
    pub width: u32,
    pub height: u32,
    pub extra_size_left: u32,
    pub extra_size_right: u32,
    pub extra_size_up: u32,
    pub extra_size_down: u32,
    pub extra_size_force_add: bool,
    pub stack_min_random: u32,
    pub stack_max_random: u32,
    pub stack_max_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caliber: Option<String>,
    #[serde(rename = "ammoCaliber", skip_serializing_if = "Option::is_none")]
    pub ammo_caliber: Option<String>,
    #[serde(rename = "armorClass", skip_serializing_if = "Option::is_none")]
    pub armor_class: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hp_resource: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_resource: Option<f64>,
    pub quest_item: bool,
    pub grids: Vec<GridDef>,
    pub slots: Vec<SlotDef>,
    pub cartridges: Vec<SlotDef>,
    pub stack_slots: Vec<SlotDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "_id")]
    pub id: TemplateId,
    #[serde(rename = "_name", default)]
    pub name: String,
    #[serde(rename = "_parent", default)]
    pub parent: Option<TemplateId>,
    #[serde(rename = "_type", default)]
    pub kind: ItemKind,
    #[serde(rename = "_props", default)]
    pub props: ItemProps,
}

impl CatalogItem {
    pub fn parent(&self) -> Option<&TemplateId> {
        self.parent.as_ref().filter(|parent| !parent.0.is_empty())
    }

    pub fn footprint(&self) -> (u32, u32) {
        (self.props.width.max(1), self.props.height.max(1))
    }

    pub fn max_stack(&self) -> u32 {
        self.props.stack_max_size.max(1)
    }

    pub fn first_grid(&self) -> Option<&GridDef> {
        self.props.grids.first()
    }
}

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    items: HashMap<TemplateId, CatalogItem>,
}

impl Catalog {
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect(),
        }
    }

    pub fn get(&self, id: &TemplateId) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    pub fn require(&self, id: &TemplateId) -> Result<&CatalogItem> {
        self.items
            .get(id)
            .ok_or_else(|| LootError::MissingTemplate(id.clone()))
    }

    pub fn insert(&mut self, item: CatalogItem) -> Result<()> {
        if self.items.contains_key(&item.id) {
            return Err(LootError::Config(format!(
                "template {} already exists",
                item.id
            )));
        }
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    pub fn is_of_base_class(&self, id: &TemplateId, base: &str) -> bool {
        let mut current = self.items.get(id);
        for _ in 0..MAX_LINEAGE_DEPTH {
            let Some(item) = current else {
                return false;
            };
            if item.id.as_str() == base {
                return true;
            }
            current = item.parent().and_then(|parent| self.items.get(parent));
        }
        false
    }

    pub fn is_of_any_base_class(&self, id: &TemplateId, bases: &[&str]) -> bool {
        bases.iter().any(|base| self.is_of_base_class(id, base))
    }

    pub fn magazine_calibers(&self, magazine: &CatalogItem) -> Vec<String> {
        let mut calibers: Vec<String> = Vec::new();
        let Some(slot) = magazine.props.cartridges.first() else {
            return calibers;
        };
        for tpl in slot.allowed() {
            let Some(caliber) = self
                .items
                .get(tpl)
                .and_then(|cartridge| cartridge.props.caliber.clone())
            else {
                continue;
            };
            if !calibers.contains(&caliber) {
                calibers.push(caliber);
            }
        }
        calibers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: &str) -> CatalogItem {
        CatalogItem {
            id: TemplateId::from(id),
            name: id.to_string(),
            parent: Some(TemplateId::from(parent)),
            kind: ItemKind::Node,
            props: ItemProps::default(),
        }
    }

    #[test]
    fn base_class_lineage_walks_parents() {
        let mut rifle = node("rifle", base_class::WEAPON);
        rifle.kind = ItemKind::Item;
        let catalog = Catalog::from_items([
            node(base_class::ITEM, ""),
            node(base_class::WEAPON, base_class::ITEM),
            rifle,
        ]);
        let rifle_id = TemplateId::from("rifle");
        assert!(catalog.is_of_base_class(&rifle_id, base_class::WEAPON));
        assert!(catalog.is_of_base_class(&rifle_id, base_class::ITEM));
        assert!(!catalog.is_of_base_class(&rifle_id, base_class::MAGAZINE));
        assert!(!catalog.is_of_base_class(&TemplateId::from("ghost"), base_class::ITEM));
    }

    #[test]
    fn lineage_cycle_terminates() {
        let catalog = Catalog::from_items([node("a", "b"), node("b", "a")]);
        assert!(!catalog.is_of_base_class(&TemplateId::from("a"), base_class::ITEM));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut catalog = Catalog::default();
        catalog.insert(node("a", "")).expect("first insert");
        assert!(catalog.insert(node("a", "")).is_err());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn magazine_calibers_are_deduplicated() {
        let mut ps = node("ps", base_class::AMMO);
        ps.props.caliber = Some("Caliber545x39".to_string());
        let mut bp = node("bp", base_class::AMMO);
        bp.props.caliber = Some("Caliber545x39".to_string());
        let mut mag = node("mag", base_class::MAGAZINE);
        mag.props.cartridges = vec![SlotDef {
            name: "cartridges".to_string(),
            max_count: 30,
            required: false,
            props: SlotProps {
                filters: vec![SlotFilter {
                    filter: vec![
                        TemplateId::from("ps"),
                        TemplateId::from("missing"),
                        TemplateId::from("bp"),
                    ],
                }],
            },
        }];
        let catalog = Catalog::from_items([ps, bp, mag.clone()]);
        assert_eq!(catalog.magazine_calibers(&mag), vec!["Caliber545x39".to_string()]);
    }

    #[test]
    fn catalog_item_parses_native_shape() {
        let json = r#"{
            "_id": "box",
            "_name": "crate",
            "_parent": "",
            "_type": "Item",
            "_props": {
                "Width": 2,
                "Height": 1,
                "ExtraSizeForceAdd": true,
                "Grids": [{"_name": "main", "_props": {"cellsH": 4, "cellsV": 3}}]
            }
        }"#;
        let item: CatalogItem = serde_json::from_str(json).expect("parse");
        assert!(item.parent().is_none());
        assert_eq!(item.footprint(), (2, 1));
        assert!(item.props.extra_size_force_add);
        let grid = item.first_grid().expect("grid");
        assert_eq!((grid.props.cells_h, grid.props.cells_v), (4, 3));
    }
}
