use std::fs;
use std::path::Path;

use anyhow::Context;
use kin_index::FieldSelectors;
use serde::{Deserialize, Serialize};

/// Contents of a `kin` TOML config file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinConfig {
    /// Field names used to read ids from records.
    pub fields: FieldSelectors,
}

impl KinConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply command-line overrides on top of the file values.
    pub fn with_overrides(mut self, id: Option<String>, parent_id: Option<String>) -> Self {
        if let Some(id) = id {
            self.fields.id = id;
        }
        if let Some(parent_id) = parent_id {
            self.fields.parent_id = parent_id;
        }
        self
    }
}
