use crate::entities::item::{ItemId, PlacedItem, TemplateId};
use crate::world::catalog::{
    base_class, Catalog, CatalogItem, GridDef, GridProps, ItemKind, ItemProps, SlotDef,
    SlotFilter, SlotProps,
};
use crate::world::location::{AmmoTables, AmmoWeight};
use crate::world::presets::{Preset, PresetIndex};

pub const RIFLE: &str = "rifle";
pub const PISTOL: &str = "pistol";
pub const MAG30: &str = "mag30";
pub const KLIN_MAG: &str = "klin_mag";
pub const M855: &str = "m855";
pub const M995: &str = "m995";
pub const PM_AMMO: &str = "pm_ammo";
pub const PMM_AMMO: &str = "pmm_ammo";
pub const AMMO_BOX: &str = "ammo_box";
pub const ROUBLES: &str = "roubles";
pub const MEDKIT: &str = "afak";
pub const ARMOR_VEST: &str = "armor_vest";
pub const ARMOR_PLATE: &str = "armor_plate";
pub const KEY: &str = "key_lab";
pub const BOLTS: &str = "bolts";
pub const WIDE: &str = "wide";
pub const STOCK: &str = "stock";
pub const SUPPRESSOR: &str = "suppressor";
pub const FOREGRIP: &str = "foregrip";
pub const CRATE: &str = "crate";
pub const BIG_CRATE: &str = "big_crate";
pub const TINY_BOX: &str = "tiny_box";
pub const SHELF: &str = "shelf";
pub const CANDY: &str = "candy";

pub fn tpl(id: &str) -> TemplateId {
    TemplateId::from(id)
}

fn node(id: &str, parent: &str) -> CatalogItem {
    CatalogItem {
        id: tpl(id),
        name: id.to_string(),
        parent: Some(tpl(parent)),
        kind: ItemKind::Node,
        props: ItemProps::default(),
    }
}

fn item(id: &str, parent: &str, edit: impl FnOnce(&mut ItemProps)) -> CatalogItem {
    let mut props = ItemProps {
        width: 1,
        height: 1,
        stack_max_size: 1,
        ..ItemProps::default()
    };
    edit(&mut props);
    CatalogItem {
        id: tpl(id),
        name: id.to_string(),
        parent: Some(tpl(parent)),
        kind: ItemKind::Item,
        props,
    }
}

pub fn slot(name: &str, max_count: u32, allowed: &[&str]) -> SlotDef {
    SlotDef {
        name: name.to_string(),
        max_count,
        required: false,
        props: SlotProps {
            filters: vec![SlotFilter {
                filter: allowed.iter().map(|id| tpl(id)).collect(),
            }],
        },
    }
}

pub fn grid(cells_h: u32, cells_v: u32) -> Vec<GridDef> {
    vec![GridDef {
        name: "main".to_string(),
        props: GridProps { cells_h, cells_v },
    }]
}

pub fn catalog() -> Catalog {
    Catalog::from_items([
        node(base_class::ITEM, ""),
        node(base_class::WEAPON, base_class::ITEM),
        node(base_class::MAGAZINE, base_class::ITEM),
        node(base_class::AMMO, base_class::ITEM),
        node(base_class::AMMO_BOX, base_class::ITEM),
        node(base_class::MONEY, base_class::ITEM),
        node(base_class::ARMOR, base_class::ITEM),
        node(base_class::MEDKIT, base_class::ITEM),
        node(base_class::KEY, base_class::ITEM),
        item(RIFLE, base_class::WEAPON, |p| {
            p.width = 4;
            p.height = 1;
            p.ammo_caliber = Some("Caliber556x45NATO".to_string());
        }),
        item(PISTOL, base_class::WEAPON, |p| {
            p.width = 2;
            p.height = 1;
        }),
        item(MAG30, base_class::MAGAZINE, |p| {
            p.height = 2;
            p.cartridges = vec![slot("cartridges", 30, &[M855, M995])];
        }),
        item(KLIN_MAG, base_class::MAGAZINE, |p| {
            p.cartridges = vec![slot("cartridges", 20, &[PMM_AMMO])];
        }),
        item(M855, base_class::AMMO, |p| {
            p.caliber = Some("Caliber556x45NATO".to_string());
            p.stack_max_size = 30;
            p.stack_min_random = 10;
            p.stack_max_random = 30;
        }),
        item(M995, base_class::AMMO, |p| {
            p.caliber = Some("Caliber556x45NATO".to_string());
            p.stack_max_size = 30;
            p.stack_min_random = 10;
            p.stack_max_random = 30;
        }),
        item(PM_AMMO, base_class::AMMO, |p| {
            p.caliber = Some("Caliber9x18PM".to_string());
            p.stack_max_size = 50;
        }),
        item(PMM_AMMO, base_class::AMMO, |p| {
            p.caliber = Some("Caliber9x18PMM".to_string());
            p.stack_max_size = 50;
        }),
        item(AMMO_BOX, base_class::AMMO_BOX, |p| {
            p.stack_slots = vec![slot("cartridges", 70, &[M855])];
        }),
        item(ROUBLES, base_class::MONEY, |p| {
            p.stack_min_random = 500;
            p.stack_max_random = 5000;
            p.stack_max_size = 500_000;
        }),
        item(MEDKIT, base_class::MEDKIT, |p| {
            p.max_hp_resource = Some(400.0);
        }),
        item(ARMOR_VEST, base_class::ARMOR, |p| {
            p.width = 3;
            p.height = 3;
            p.armor_class = Some(4);
        }),
        item(ARMOR_PLATE, base_class::ITEM, |_| {}),
        item(KEY, base_class::KEY, |_| {}),
        item(BOLTS, base_class::ITEM, |_| {}),
        item(CANDY, base_class::ITEM, |_| {}),
        item(WIDE, base_class::ITEM, |p| {
            p.width = 2;
        }),
        item(STOCK, base_class::ITEM, |p| {
            p.extra_size_right = 1;
        }),
        item(SUPPRESSOR, base_class::ITEM, |p| {
            p.extra_size_right = 1;
            p.extra_size_force_add = true;
        }),
        item(FOREGRIP, base_class::ITEM, |p| {
            p.extra_size_down = 1;
        }),
        item(CRATE, base_class::ITEM, |p| {
            p.grids = grid(2, 2);
        }),
        item(BIG_CRATE, base_class::ITEM, |p| {
            p.grids = grid(10, 10);
        }),
        item(TINY_BOX, base_class::ITEM, |p| {
            p.grids = grid(1, 1);
        }),
        item(SHELF, base_class::ITEM, |p| {
            p.grids = grid(1, 2);
        }),
    ])
}

pub fn placed(id: &str, tpl_id: &str, parent: Option<&str>, slot_id: Option<&str>) -> PlacedItem {
    PlacedItem {
        id: ItemId::from(id),
        tpl: tpl(tpl_id),
        parent_id: parent.map(ItemId::from),
        slot_id: slot_id.map(str::to_string),
        location: None,
        upd: None,
    }
}

pub fn rifle_preset() -> Preset {
    Preset {
        id: "rifle_default".to_string(),
        name: "rifle default".to_string(),
        parent: ItemId::from("p_root"),
        items: vec![
            placed("p_root", RIFLE, None, None),
            placed("p_stock", STOCK, Some("p_root"), Some("mod_stock")),
            placed("p_mag", MAG30, Some("p_root"), Some("mod_magazine")),
            placed("p_muzzle", SUPPRESSOR, Some("p_root"), Some("mod_muzzle")),
        ],
        encyclopedia: Some(tpl(RIFLE)),
    }
}

pub fn armor_preset() -> Preset {
    Preset {
        id: "armor_default".to_string(),
        name: "armor default".to_string(),
        parent: ItemId::from("a_root"),
        items: vec![
            placed("a_root", ARMOR_VEST, None, None),
            placed("a_front", ARMOR_PLATE, Some("a_root"), Some("Front_plate")),
            placed("a_back", ARMOR_PLATE, Some("a_root"), Some("Back_plate")),
        ],
        encyclopedia: Some(tpl(ARMOR_VEST)),
    }
}

pub fn presets() -> PresetIndex {
    PresetIndex::from_presets([rifle_preset(), armor_preset()])
}

pub fn ammo_tables() -> AmmoTables {
    let mut tables = AmmoTables::new();
    tables.insert(
        "Caliber556x45NATO".to_string(),
        vec![
            AmmoWeight {
                tpl: tpl(M855),
                weight: 3.0,
            },
            AmmoWeight {
                tpl: tpl(M995),
                weight: 1.0,
            },
        ],
    );
    tables.insert(
        "Caliber9x18PM".to_string(),
        vec![AmmoWeight {
            tpl: tpl(PM_AMMO),
            weight: 1.0,
        }],
    );
    tables
}
