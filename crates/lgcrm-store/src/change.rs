// ABOUTME: Change notifications broadcast by the engine after each successful mutation.
// ABOUTME: Lets in-process views refresh without polling the store.

use lgcrm_core::Collection;
use serde::Serialize;

/// A mutation that has been applied and persisted (or had its write
/// failure logged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Change {
    Inserted {
        collection: Collection,
        ids: Vec<String>,
    },
    Updated {
        collection: Collection,
        ids: Vec<String>,
    },
    Deleted {
        collection: Collection,
        ids: Vec<String>,
    },
    SessionChanged {
        signed_in: bool,
    },
    /// The whole store was cleared and reseeded.
    Reset,
}

impl Change {
    /// The collection this change touched, if it touched one.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            Change::Inserted { collection, .. }
            | Change::Updated { collection, .. }
            | Change::Deleted { collection, .. } => Some(*collection),
            Change::SessionChanged { .. } | Change::Reset => None,
        }
    }
}
