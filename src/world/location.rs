use crate::entities::item::{ItemId, PlacedItem, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTemplate {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "IsContainer", default)]
    pub is_container: bool,
    #[serde(rename = "useGravity", default)]
    pub use_gravity: bool,
    #[serde(rename = "randomRotation", default)]
    pub random_rotation: bool,
    #[serde(rename = "Position", default)]
    pub position: Vec3,
    #[serde(rename = "Rotation", default)]
    pub rotation: Vec3,
    #[serde(rename = "IsAlwaysSpawn", default)]
    pub is_always_spawn: bool,
    #[serde(rename = "Root", default, skip_serializing_if = "Option::is_none")]
    pub root: Option<ItemId>,
    #[serde(rename = "Items", default)]
    pub items: Vec<PlacedItem>,
}

impl SpawnTemplate {
    pub fn root_item(&self) -> Option<&PlacedItem> {
        match self.root.as_ref() {
            Some(root) => self.items.iter().find(|item| &item.id == root),
            None => self.items.first(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountWeight {
    pub count: u32,
    #[serde(rename = "relativeProbability")]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWeight {
    pub tpl: TemplateId,
    #[serde(rename = "relativeProbability")]
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticLootDistribution {
    #[serde(rename = "itemcountDistribution", default)]
    pub item_count: Vec<CountWeight>,
    #[serde(rename = "itemDistribution", default)]
    pub items: Vec<ItemWeight>,
}

fn default_probability() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticContainer {
    #[serde(default = "default_probability")]
    pub probability: f64,
    pub template: SpawnTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticForced {
    #[serde(rename = "containerId")]
    pub container_id: String,
    #[serde(rename = "itemTpl")]
    pub item_tpl: TemplateId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerGroup {
    #[serde(rename = "minContainers", default)]
    pub min_containers: u32,
    #[serde(rename = "maxContainers", default)]
    pub max_containers: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerGroupLink {
    #[serde(rename = "groupId")]
    pub group_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticContainerSet {
    #[serde(rename = "staticWeapons", default)]
    pub static_weapons: Vec<SpawnTemplate>,
    #[serde(rename = "staticContainers", default)]
    pub static_containers: Vec<StaticContainer>,
    #[serde(rename = "staticForced", default)]
    pub static_forced: Vec<StaticForced>,
    #[serde(rename = "containersGroups", default)]
    pub container_groups: HashMap<String, ContainerGroup>,
    #[serde(rename = "containers", default)]
    pub container_links: HashMap<String, ContainerGroupLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoWeight {
    pub tpl: TemplateId,
    #[serde(rename = "relativeProbability")]
    pub weight: f64,
}

pub type AmmoTables = HashMap<String, Vec<AmmoWeight>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnpointCount {
    pub mean: f64,
    #[serde(default)]
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedKey {
    pub key: ItemId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDistribution {
    #[serde(rename = "composedKey")]
    pub composed_key: ComposedKey,
    #[serde(rename = "relativeProbability")]
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawnpoint {
    #[serde(rename = "locationId")]
    pub location_id: String,
    #[serde(default)]
    pub probability: f64,
    pub template: SpawnTemplate,
    #[serde(rename = "itemDistribution", default)]
    pub item_distribution: Vec<ItemDistribution>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LooseLoot {
    #[serde(rename = "spawnpointCount", default)]
    pub spawnpoint_count: SpawnpointCount,
    #[serde(rename = "spawnpointsForced", default)]
    pub forced: Vec<Spawnpoint>,
    #[serde(default)]
    pub spawnpoints: Vec<Spawnpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationLootData {
    pub name: String,
    #[serde(default)]
    pub static_loot: HashMap<TemplateId, StaticLootDistribution>,
    #[serde(default)]
    pub static_containers: Option<StaticContainerSet>,
    #[serde(default)]
    pub static_ammo: AmmoTables,
    #[serde(default)]
    pub loose_loot: Option<LooseLoot>,
}

impl LocationLootData {
    pub fn forced_for_container<'a>(
        &'a self,
        container_id: &'a str,
    ) -> impl Iterator<Item = &'a TemplateId> + 'a {
        self.static_containers
            .iter()
            .flat_map(|set| set.static_forced.iter())
            .filter(move |forced| forced.container_id == container_id)
            .map(|forced| &forced.item_tpl)
    }
}
