// ABOUTME: Core library for lgcrm, containing record types, filters, patches, and seed data.
// ABOUTME: This crate defines the shared data model used by the store and the CLI.

pub mod filter;
pub mod ids;
pub mod money;
pub mod patch;
pub mod record;
pub mod seed;
pub mod session;
pub mod tables;

pub use filter::{Filter, NotInValues, parse_tuple_literal};
pub use ids::{Timestamp, new_id, now};
pub use patch::{Patch, PatchError};
pub use record::{
    Collection, Lead, LeadStage, Operation, ParseCollectionError, Property, PropertyStatus,
    Record, RelatedType, Task, TaskStatus, Visit, VisitStatus,
};
pub use seed::seed_tables;
pub use session::Session;
pub use tables::Tables;
