// ABOUTME: Record types for the four fixed collections (leads, properties, visits, tasks).
// ABOUTME: Each record is a typed struct with an immutable id and created_at plus optional fields.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::Timestamp;
use crate::tables::Tables;

/// Field names that no mutation may overwrite once a record exists.
pub const PROTECTED_FIELDS: [&str; 2] = ["id", "created_at"];

/// The fixed set of named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Leads,
    Properties,
    Visits,
    Tasks,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Leads,
        Collection::Properties,
        Collection::Visits,
        Collection::Tasks,
    ];

    /// The collection's name as it appears in snapshots and query entry points.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Leads => "leads",
            Collection::Properties => "properties",
            Collection::Visits => "visits",
            Collection::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a collection name is outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collection: {0}")]
pub struct ParseCollectionError(pub String);

impl FromStr for Collection {
    type Err = ParseCollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ParseCollectionError(s.to_string()))
    }
}

/// Common behaviour of every stored record kind.
pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// The collection this record kind lives in.
    const COLLECTION: Collection;

    /// Every declared field name, in serialization order.
    const FIELDS: &'static [&'static str];

    fn id(&self) -> &str;

    /// This kind's rows within the store.
    fn rows(tables: &Tables) -> &Vec<Self>;

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self>;
}

macro_rules! impl_record {
    ($ty:ty, $collection:expr, $field:ident, [$($name:literal),+ $(,)?]) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;
            const FIELDS: &'static [&'static str] = &[$($name),+];

            fn id(&self) -> &str {
                &self.id
            }

            fn rows(tables: &Tables) -> &Vec<Self> {
                &tables.$field
            }

            fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
                &mut tables.$field
            }
        }
    };
}

/// Pipeline stage of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeadStage {
    #[default]
    Nuevo,
    Contactado,
    Calificado,
    Visita,
    Oferta,
    Cierre,
    Perdido,
}

impl LeadStage {
    /// Board column order, left to right.
    pub const PIPELINE: [LeadStage; 7] = [
        LeadStage::Nuevo,
        LeadStage::Contactado,
        LeadStage::Calificado,
        LeadStage::Visita,
        LeadStage::Oferta,
        LeadStage::Cierre,
        LeadStage::Perdido,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStage::Nuevo => "Nuevo",
            LeadStage::Contactado => "Contactado",
            LeadStage::Calificado => "Calificado",
            LeadStage::Visita => "Visita",
            LeadStage::Oferta => "Oferta",
            LeadStage::Cierre => "Cierre",
            LeadStage::Perdido => "Perdido",
        }
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Sale,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PropertyStatus {
    #[default]
    Active,
    Pending,
    Sold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    #[default]
    Programada,
    Completada,
    Cancelada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedType {
    Lead,
    Deal,
}

/// A prospective buyer or tenant moving through the sales pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub org_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub stage: LeadStage,
    #[serde(default)]
    pub budget_min: Option<f64>,
    #[serde(default)]
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub last_contacted_at: Option<Timestamp>,
}

/// A listing offered for sale or rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub org_id: Option<String>,
    pub title: String,
    pub operation: Operation,
    #[serde(default)]
    pub price_sale: Option<f64>,
    #[serde(default)]
    pub price_rent: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub area_sqm: Option<f64>,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A scheduled showing of a property to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub org_id: Option<String>,
    pub lead_id: String,
    #[serde(default)]
    pub property_id: Option<String>,
    pub scheduled_for: Timestamp,
    #[serde(default)]
    pub status: VisitStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A to-do item, optionally tied to a lead or deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub org_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub related_type: Option<RelatedType>,
    #[serde(default)]
    pub related_id: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

impl_record!(
    Lead,
    Collection::Leads,
    leads,
    [
        "id",
        "created_at",
        "org_id",
        "name",
        "email",
        "phone",
        "source",
        "stage",
        "budget_min",
        "budget_max",
        "location",
        "assigned_to",
        "last_contacted_at",
    ]
);
impl_record!(
    Property,
    Collection::Properties,
    properties,
    [
        "id",
        "created_at",
        "org_id",
        "title",
        "operation",
        "price_sale",
        "price_rent",
        "location",
        "address",
        "property_type",
        "bedrooms",
        "bathrooms",
        "area_sqm",
        "status",
        "description",
        "amenities",
        "image_url",
    ]
);
impl_record!(
    Visit,
    Collection::Visits,
    visits,
    [
        "id",
        "created_at",
        "org_id",
        "lead_id",
        "property_id",
        "scheduled_for",
        "status",
        "notes",
    ]
);
impl_record!(
    Task,
    Collection::Tasks,
    tasks,
    [
        "id",
        "created_at",
        "org_id",
        "title",
        "due_date",
        "status",
        "related_type",
        "related_id",
        "assignee_id",
    ]
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_names_round_trip_through_from_str() {
        for collection in Collection::ALL {
            assert_eq!(collection.name().parse::<Collection>().unwrap(), collection);
        }
    }

    #[test]
    fn unknown_collection_name_is_rejected() {
        let err = "deals".parse::<Collection>().unwrap_err();
        assert_eq!(err.to_string(), "unknown collection: deals");
    }

    #[test]
    fn lead_optional_fields_default_to_null() {
        let lead: Lead = serde_json::from_value(json!({
            "id": "L1",
            "created_at": "2026-01-01T00:00:00Z",
            "name": "Ana",
        }))
        .unwrap();

        assert_eq!(lead.stage, LeadStage::Nuevo);
        assert!(lead.email.is_none());
        assert!(lead.budget_max.is_none());

        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["email"], json!(null));
        assert_eq!(value["stage"], json!("Nuevo"));
    }

    #[test]
    fn enum_wire_spellings_match_stored_documents() {
        assert_eq!(serde_json::to_value(Operation::Sale).unwrap(), json!("sale"));
        assert_eq!(
            serde_json::to_value(PropertyStatus::Sold).unwrap(),
            json!("Sold")
        );
        assert_eq!(
            serde_json::to_value(VisitStatus::Completada).unwrap(),
            json!("completada")
        );
        assert_eq!(
            serde_json::to_value(TaskStatus::Completed).unwrap(),
            json!("completed")
        );
        assert_eq!(serde_json::to_value(RelatedType::Deal).unwrap(), json!("deal"));
    }

    #[test]
    fn unknown_stage_is_a_decode_error() {
        let result = serde_json::from_value::<Lead>(json!({
            "id": "L1",
            "created_at": "2026-01-01T00:00:00Z",
            "name": "Ana",
            "stage": "Ganado",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn task_due_date_is_a_calendar_date() {
        let task: Task = serde_json::from_value(json!({
            "id": "T1",
            "created_at": "2026-01-01T00:00:00Z",
            "title": "Llamar",
            "due_date": "2026-02-14",
        }))
        .unwrap();
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2026, 2, 14));
        assert_eq!(task.status, TaskStatus::Pending);
    }

    fn assert_fields_match<R: Record>() {
        let seed = crate::seed::seed_tables(crate::ids::now());
        let row = R::rows(&seed).first().expect("seed has a row");
        let value = serde_json::to_value(row).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, R::FIELDS, "{}", R::COLLECTION);
    }

    #[test]
    fn declared_fields_match_serialized_keys() {
        assert_fields_match::<Lead>();
        assert_fields_match::<Property>();
        assert_fields_match::<Visit>();
        assert_fields_match::<Task>();
    }

    #[test]
    fn pipeline_lists_every_stage_once() {
        let unique: std::collections::HashSet<_> = LeadStage::PIPELINE.iter().collect();
        assert_eq!(unique.len(), 7);
        assert_eq!(LeadStage::PIPELINE[0].to_string(), "Nuevo");
    }
}
