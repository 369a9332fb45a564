//! Declarative reshaping of configuration entries.
//!
//! Fragments describe entries in one canonical, profile-agnostic schema
//! (a launch descriptor with `type`, `command`, `args`, `env`, ...). Each
//! profile may need that entry in a different shape. An [`EntryTransform`]
//! describes the difference as data so it can come from settings as well
//! as from the built-in table.
//!
//! Steps run in a fixed order: discriminator rename, field collapse, field
//! rename, injection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Default name of the discriminator field.
const DEFAULT_TYPE_FIELD: &str = "type";

/// Merge several sibling fields into one ordered list.
///
/// `{"command": "run", "args": ["x"]}` with `fields = ["command", "args"]`
/// and `into = "command"` becomes `{"command": ["run", "x"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldCollapse {
    /// Source fields, in output order
    pub fields: Vec<String>,
    /// Field receiving the combined list
    pub into: String,
}

/// Per-profile entry transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntryTransform {
    /// Discriminator field name (defaults to `type`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_field: Option<String>,

    /// Discriminator value renames, e.g. `stdio -> local`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rename_types: BTreeMap<String, String>,

    /// Collapse sibling fields into one list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<FieldCollapse>,

    /// Field renames, e.g. `env -> environment`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rename_fields: BTreeMap<String, String>,

    /// Fields added when the entry does not already define them
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inject: BTreeMap<String, Value>,
}

impl EntryTransform {
    /// The transform that leaves entries untouched.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Whether applying this transform is a no-op.
    pub fn is_identity(&self) -> bool {
        self.rename_types.is_empty()
            && self.collapse.is_none()
            && self.rename_fields.is_empty()
            && self.inject.is_empty()
    }

    /// Builder: rename a discriminator value.
    pub fn rename_type(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename_types.insert(from.into(), to.into());
        self
    }

    /// Builder: collapse `fields` into `into`.
    pub fn collapse<S: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = S>,
        into: impl Into<String>,
    ) -> Self {
        self.collapse = Some(FieldCollapse {
            fields: fields.into_iter().map(Into::into).collect(),
            into: into.into(),
        });
        self
    }

    /// Builder: rename a field.
    pub fn rename_field(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename_fields.insert(from.into(), to.into());
        self
    }

    /// Builder: inject a field when absent.
    pub fn inject(mut self, field: impl Into<String>, value: Value) -> Self {
        self.inject.insert(field.into(), value);
        self
    }

    fn type_field(&self) -> &str {
        self.type_field.as_deref().unwrap_or(DEFAULT_TYPE_FIELD)
    }

    /// Reshape one entry. Non-object entries are returned unchanged.
    pub fn apply(&self, entry: &Value) -> Value {
        let Value::Object(source) = entry else {
            return entry.clone();
        };
        let mut obj = source.clone();

        self.rename_discriminator(&mut obj);
        if let Some(collapse) = &self.collapse {
            collapse_fields(&mut obj, collapse);
        }
        for (from, to) in &self.rename_fields {
            if let Some(value) = obj.remove(from) {
                obj.insert(to.clone(), value);
            }
        }
        for (field, value) in &self.inject {
            obj.entry(field.clone()).or_insert_with(|| value.clone());
        }

        Value::Object(obj)
    }

    fn rename_discriminator(&self, obj: &mut Map<String, Value>) {
        let field = self.type_field();
        let renamed = obj
            .get(field)
            .and_then(Value::as_str)
            .and_then(|current| self.rename_types.get(current))
            .cloned();
        if let Some(new_value) = renamed {
            obj.insert(field.to_string(), Value::String(new_value));
        }
    }
}

fn collapse_fields(obj: &mut Map<String, Value>, collapse: &FieldCollapse) {
    let mut combined = Vec::new();
    let mut found = false;

    for field in &collapse.fields {
        match obj.remove(field) {
            Some(Value::Array(items)) => {
                found = true;
                combined.extend(items);
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                found = true;
                combined.push(other);
            }
        }
    }

    if found {
        obj.insert(collapse.into.clone(), Value::Array(combined));
    }
}
