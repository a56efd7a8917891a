use crate::entities::item::{ItemId, PlacedItem, TemplateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_name", default)]
    pub name: String,
    #[serde(rename = "_parent")]
    pub parent: ItemId,
    #[serde(rename = "_items", default)]
    pub items: Vec<PlacedItem>,
    #[serde(rename = "_encyclopedia", default, skip_serializing_if = "Option::is_none")]
    pub encyclopedia: Option<TemplateId>,
}

impl Preset {
    pub fn root(&self) -> Option<&PlacedItem> {
        self.items.iter().find(|item| item.id == self.parent)
    }

    pub fn root_tpl(&self) -> Option<&TemplateId> {
        self.root().map(|item| &item.tpl)
    }
}

#[derive(Debug, Default, Clone)]
pub struct PresetIndex {
    presets: Vec<Preset>,
    defaults: HashMap<TemplateId, usize>,
}

impl PresetIndex {
    pub fn from_presets(presets: impl IntoIterator<Item = Preset>) -> Self {
        let mut presets: Vec<Preset> = presets.into_iter().collect();
        presets.sort_by(|a, b| a.id.cmp(&b.id));
        let mut defaults = HashMap::new();
        for (index, preset) in presets.iter().enumerate() {
            let Some(encyclopedia) = preset.encyclopedia.as_ref() else {
                continue;
            };
            if preset.root_tpl() != Some(encyclopedia) {
                continue;
            }
            defaults.entry(encyclopedia.clone()).or_insert(index);
        }
        Self { presets, defaults }
    }

    pub fn default_for(&self, tpl: &TemplateId) -> Option<&Preset> {
        self.defaults
            .get(tpl)
            .and_then(|index| self.presets.get(*index))
    }

    pub fn defaults(&self) -> impl Iterator<Item = &Preset> {
        self.presets
            .iter()
            .enumerate()
            .filter(|(index, preset)| {
                preset
                    .encyclopedia
                    .as_ref()
                    .and_then(|tpl| self.defaults.get(tpl))
                    == Some(index)
            })
            .map(|(_, preset)| preset)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
