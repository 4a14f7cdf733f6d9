//! Building an index from untyped JSON records.

use serde_json::Value;

use crate::config::FieldSelectors;
use crate::error::{IndexError, IndexResult};
use crate::index::AncestryIndex;
use crate::key::NodeKey;

/// An index over raw JSON objects.
pub type JsonIndex = AncestryIndex<NodeKey, Value>;

impl AncestryIndex<NodeKey, Value> {
    /// Build from a list of JSON objects, reading ids through `fields`.
    ///
    /// Every record must carry a non-null id. A missing or `null` parent
    /// field makes the record a root.
    pub fn from_json(records: Vec<Value>, fields: &FieldSelectors) -> IndexResult<Self> {
        if let Some(pos) = records.iter().position(|r| !r.is_object()) {
            return Err(IndexError::InvalidRecord(format!(
                "record {pos} is not a JSON object"
            )));
        }

        Self::try_build(
            records,
            |record| {
                let value = &record[fields.id.as_str()];
                NodeKey::from_json(&fields.id, value)?.ok_or_else(|| IndexError::InvalidKey {
                    field: fields.id.clone(),
                    value: value.to_string(),
                })
            },
            |record| match record.get(&fields.parent_id) {
                Some(value) => NodeKey::from_json(&fields.parent_id, value),
                None => Ok(None),
            },
        )
    }

    /// Map text typed by a user to the key it names in this index.
    ///
    /// Integer-looking text prefers [`NodeKey::Int`], but falls back to the
    /// string key when only that one is present, so a record with id `"007"`
    /// stays reachable.
    pub fn resolve_key(&self, raw: &str) -> NodeKey {
        let parsed = NodeKey::parse_lossy(raw);
        if matches!(parsed, NodeKey::Str(_)) || self.ancestry_of(&parsed).is_some() {
            return parsed;
        }
        let text = NodeKey::from(raw);
        if self.ancestry_of(&text).is_some() {
            text
        } else {
            parsed
        }
    }

    /// Parse `input` as a JSON array of objects and build from it.
    pub fn from_json_str(input: &str, fields: &FieldSelectors) -> IndexResult<Self> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| IndexError::InvalidRecord(e.to_string()))?;
        match value {
            Value::Array(records) => Self::from_json(records, fields),
            _ => Err(IndexError::InvalidRecord(
                "expected a JSON array of records".into(),
            )),
        }
    }
}
