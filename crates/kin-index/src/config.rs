use serde::{Deserialize, Serialize};

/// Which record fields hold a node's id and its parent's id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSelectors {
    /// Field used as the unique key.
    pub id: String,
    /// Field used to resolve the direct parent.
    pub parent_id: String,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            id: "id".into(),
            parent_id: "parentId".into(),
        }
    }
}

impl FieldSelectors {
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
        }
    }
}
