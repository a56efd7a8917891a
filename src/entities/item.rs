use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);
static ID_EPOCH: OnceLock<u32> = OnceLock::new();

impl ItemId {
    pub fn next() -> Self {
        let epoch = *ID_EPOCH.get_or_init(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(0)
        });
        let counter = NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed);
        ItemId(format!("{epoch:08x}{counter:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub String);

impl TemplateId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        TemplateId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLocation {
    pub x: u32,
    pub y: u32,
    pub r: u8,
}

impl GridLocation {
    pub fn is_rotated(self) -> bool {
        self.r != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemLocation {
    Grid(GridLocation),
    Index(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MedKitState {
    #[serde(rename = "HpResource")]
    pub hp_resource: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodDrinkState {
    #[serde(rename = "HpPercent")]
    pub hp_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpd {
    #[serde(
        rename = "StackObjectsCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stack_count: Option<u32>,
    #[serde(rename = "MedKit", default, skip_serializing_if = "Option::is_none")]
    pub med_kit: Option<MedKitState>,
    #[serde(rename = "FoodDrink", default, skip_serializing_if = "Option::is_none")]
    pub food_drink: Option<FoodDrinkState>,
}

impl ItemUpd {
    pub fn stack(count: u32) -> Self {
        Self {
            stack_count: Some(count),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    #[serde(rename = "_tpl")]
    pub tpl: TemplateId,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
    #[serde(rename = "slotId", default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ItemLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upd: Option<ItemUpd>,
}

impl PlacedItem {
    pub fn new(tpl: TemplateId) -> Self {
        Self {
            id: ItemId::next(),
            tpl,
            parent_id: None,
            slot_id: None,
            location: None,
            upd: None,
        }
    }

    pub fn child_of(tpl: TemplateId, parent: &ItemId, slot: &str) -> Self {
        Self {
            parent_id: Some(parent.clone()),
            slot_id: Some(slot.to_string()),
            ..Self::new(tpl)
        }
    }

    pub fn stack_count(&self) -> u32 {
        self.upd
            .as_ref()
            .and_then(|upd| upd.stack_count)
            .unwrap_or(1)
    }

    pub fn set_stack_count(&mut self, count: u32) {
        self.upd.get_or_insert_with(ItemUpd::default).stack_count = Some(count);
    }

    pub fn is_child_of(&self, parent: &ItemId) -> bool {
        self.parent_id.as_ref() == Some(parent)
    }
}

pub fn subtree<'a>(items: &'a [PlacedItem], root: &ItemId) -> Vec<&'a PlacedItem> {
    let Some(root_item) = items.iter().find(|item| &item.id == root) else {
        return Vec::new();
    };
    let mut tree = vec![root_item];
    let mut cursor = 0;
    while cursor < tree.len() {
        let parent = &tree[cursor].id;
        let children: Vec<&PlacedItem> = items
            .iter()
            .filter(|item| item.is_child_of(parent) && item.id != *root)
            .collect();
        for child in children {
            if !tree.iter().any(|seen| seen.id == child.id) {
                tree.push(child);
            }
        }
        cursor += 1;
    }
    tree
}
