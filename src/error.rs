use crate::entities::item::{ItemId, TemplateId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LootError {
    #[error("template {0} not found in catalog")]
    MissingTemplate(TemplateId),

    #[error("spawn point {spawn_point} has no template item {key}")]
    MissingSpawnItem { spawn_point: String, key: ItemId },

    #[error("location {location} is missing its {missing} definition")]
    CorruptLocation { location: String, missing: &'static str },

    #[error("unknown location: {0}")]
    UnknownLocation(String),

    #[error("unknown reward pool: {0}")]
    UnknownRewardPool(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl LootError {
    pub fn is_item_local(&self) -> bool {
        matches!(
            self,
            LootError::MissingTemplate(_) | LootError::MissingSpawnItem { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LootError>;
