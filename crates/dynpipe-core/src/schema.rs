//! Pipe schemas: the ordered `(name, type)` field list inferred from a
//! `PipeIn`'s connected inputs and pushed to every associated `PipeOut`.
//!
//! Field names are unique within one schema (inference suffixes `_2`, `_3`,
//! ... onto repeated base names) and field order equals connected-input order
//! at inference time. A schema is only ever overwritten, never deleted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::TypeTag;

/// One pipe field: an identifier-safe name plus the raw declared link type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeTag,
}

/// An ordered list of pipe fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn push(&mut self, name: impl Into<String>, ty: TypeTag) {
        self.fields.push(SchemaField {
            name: name.into(),
            ty,
        });
    }

    pub fn field(&self, index: usize) -> Option<&SchemaField> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decodes a schema from a persisted JSON value, tolerating malformed
    /// entries the way a hand-edited or version-skewed document requires:
    /// non-object entries are skipped, a missing name defaults to `"any"`,
    /// a missing type defaults to the wildcard. Never errors.
    pub fn from_value(value: &Value) -> Schema {
        let mut schema = Schema::new();
        let Some(entries) = value.as_array() else {
            return schema;
        };
        for entry in entries {
            let Some(obj) = entry.as_object() else {
                continue;
            };
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .unwrap_or("any");
            let ty = obj
                .get("type")
                .and_then(Value::as_str)
                .map(TypeTag::new)
                .unwrap_or_else(TypeTag::wildcard);
            schema.push(name, ty);
        }
        schema
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a SchemaField;
    type IntoIter = std::slice::Iter<'a, SchemaField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
