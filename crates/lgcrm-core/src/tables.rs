// ABOUTME: The in-memory record store: one ordered row list per fixed collection.
// ABOUTME: Serializes as the single snapshot document { leads, properties, visits, tasks }.

use serde::{Deserialize, Serialize};

use crate::record::{Collection, Lead, Property, Record, Task, Visit};

/// Authoritative state of every collection. Row order is stored order:
/// most recently inserted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub leads: Vec<Lead>,
    pub properties: Vec<Property>,
    pub visits: Vec<Visit>,
    pub tasks: Vec<Task>,
}

impl Tables {
    /// The live rows of one collection, in stored order.
    pub fn get_all<R: Record>(&self) -> &[R] {
        R::rows(self)
    }

    /// Swap a collection's contents wholesale. No validation happens here;
    /// callers are responsible for keeping ids unique.
    pub fn replace<R: Record>(&mut self, rows: Vec<R>) -> Vec<R> {
        std::mem::replace(R::rows_mut(self), rows)
    }

    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Leads => self.leads.len(),
            Collection::Properties => self.properties.len(),
            Collection::Visits => self.visits.len(),
            Collection::Tasks => self.tasks.len(),
        }
    }

    /// True when every collection is empty.
    pub fn is_empty(&self) -> bool {
        Collection::ALL.iter().all(|c| self.len(*c) == 0)
    }

    /// Whether a row with `id` exists in `R`'s collection.
    pub fn contains_id<R: Record>(&self, id: &str) -> bool {
        R::rows(self).iter().any(|row| row.id() == id)
    }
}
