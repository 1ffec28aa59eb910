// ABOUTME: Field-level patches used as update input and as insert drafts.
// ABOUTME: Applies shallow merges onto typed records while protecting id and created_at.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ids::{new_id, now};
use crate::record::{PROTECTED_FIELDS, Record};

/// Errors raised when a patch or draft does not fit a record shape.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("unknown field for {collection}: {field}")]
    UnknownField {
        collection: &'static str,
        field: String,
    },

    #[error("value does not fit {collection} record: {source}")]
    InvalidRecord {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("patch must be a JSON object")]
    NotAnObject,
}

/// An ordered mapping of field name to new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Map<String, Value>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Merge this patch into `record`, returning the patched copy.
    ///
    /// Fields absent from the patch are untouched. `id` and `created_at`
    /// are skipped silently. Fails without side effects if the patch names
    /// a field the record does not have or a value of the wrong type.
    pub fn apply_to<R: Record>(&self, record: &R) -> Result<R, PatchError> {
        let collection = R::COLLECTION.name();
        self.check_fields::<R>()?;
        let mut fields = record_fields(record)?;

        for (field, value) in &self.0 {
            if PROTECTED_FIELDS.contains(&field.as_str()) {
                tracing::debug!(collection, field = %field, "ignoring protected field in patch");
                continue;
            }
            fields.insert(field.clone(), value.clone());
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|source| PatchError::InvalidRecord { collection, source })
    }

    /// Build a new record from this draft, synthesizing `id` and
    /// `created_at` when the draft does not supply them.
    pub fn into_record<R: Record>(self) -> Result<R, PatchError> {
        let collection = R::COLLECTION.name();
        self.check_fields::<R>()?;
        let mut fields = Map::new();
        if !self.0.contains_key("id") {
            fields.insert("id".to_string(), Value::String(new_id()));
        }
        if !self.0.contains_key("created_at") {
            fields.insert("created_at".to_string(), Value::String(now().to_string()));
        }
        fields.extend(self.0);

        serde_json::from_value(Value::Object(fields))
            .map_err(|source| PatchError::InvalidRecord { collection, source })
    }

    /// Fail if any patched field is not declared by `R`.
    pub fn check_fields<R: Record>(&self) -> Result<(), PatchError> {
        match self.0.keys().find(|f| !R::FIELDS.contains(&f.as_str())) {
            Some(field) => Err(PatchError::UnknownField {
                collection: R::COLLECTION.name(),
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl From<Map<String, Value>> for Patch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Patch {
    type Error = PatchError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(PatchError::NotAnObject),
        }
    }
}

/// Serialize a record into its field map. Every declared field is present,
/// with unset optional fields as null.
pub fn record_fields<R: Record>(record: &R) -> Result<Map<String, Value>, PatchError> {
    let collection = R::COLLECTION.name();
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(PatchError::NotAnObject),
        Err(source) => Err(PatchError::InvalidRecord { collection, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Lead, LeadStage, Property, Task};
    use serde_json::json;

    fn lead() -> Lead {
        serde_json::from_value(json!({
            "id": "L1",
            "created_at": "2026-01-01T00:00:00Z",
            "name": "Ana",
            "stage": "Nuevo",
            "budget_max": 2000,
        }))
        .unwrap()
    }

    #[test]
    fn apply_overwrites_only_named_fields() {
        let patched = Patch::new()
            .set("stage", "Contactado")
            .apply_to(&lead())
            .unwrap();

        assert_eq!(patched.stage, LeadStage::Contactado);
        assert_eq!(patched.name, "Ana");
        assert_eq!(patched.budget_max, Some(2000.0));
    }

    #[test]
    fn apply_ignores_protected_fields() {
        let original = lead();
        let patched = Patch::new()
            .set("id", "x")
            .set("created_at", "2030-01-01T00:00:00Z")
            .set("stage", "Oferta")
            .apply_to(&original)
            .unwrap();

        assert_eq!(patched.id, "L1");
        assert_eq!(patched.created_at, original.created_at);
        assert_eq!(patched.stage, LeadStage::Oferta);
    }

    #[test]
    fn apply_can_clear_optional_fields() {
        let patched = Patch::new()
            .set("budget_max", Value::Null)
            .apply_to(&lead())
            .unwrap();
        assert!(patched.budget_max.is_none());
    }

    #[test]
    fn apply_rejects_unknown_field() {
        let err = Patch::new().set("color", "red").apply_to(&lead()).unwrap_err();
        assert!(matches!(err, PatchError::UnknownField { ref field, .. } if field == "color"));
    }

    #[test]
    fn apply_rejects_ill_typed_value() {
        let err = Patch::new().set("stage", 42).apply_to(&lead()).unwrap_err();
        assert!(matches!(err, PatchError::InvalidRecord { collection: "leads", .. }));
    }

    #[test]
    fn draft_synthesizes_id_and_created_at() {
        let task: Task = Patch::new().set("title", "Llamar").into_record().unwrap();
        assert_eq!(task.id.len(), 26);
        assert_eq!(task.title, "Llamar");
    }

    #[test]
    fn draft_keeps_supplied_id_and_created_at() {
        let property: Property = Patch::new()
            .set("id", "P9")
            .set("created_at", "2025-05-05T05:05:05Z")
            .set("title", "Casa")
            .set("operation", "rent")
            .into_record()
            .unwrap();

        assert_eq!(property.id, "P9");
        assert_eq!(property.created_at.as_str(), "2025-05-05T05:05:05Z");
    }

    #[test]
    fn draft_missing_required_field_is_rejected() {
        let result: Result<Lead, _> = Patch::new().set("email", "a@b.com").into_record();
        assert!(matches!(result, Err(PatchError::InvalidRecord { .. })));
    }

    #[test]
    fn draft_with_unknown_field_is_rejected() {
        let result: Result<Lead, _> = Patch::new()
            .set("name", "Ana")
            .set("favourite_colour", "blue")
            .into_record();
        assert!(matches!(result, Err(PatchError::UnknownField { .. })));
    }

    #[test]
    fn patch_from_json_object_only() {
        assert!(Patch::try_from(json!({"stage": "Cierre"})).is_ok());
        assert!(matches!(
            Patch::try_from(json!(["stage"])),
            Err(PatchError::NotAnObject)
        ));
    }
}
