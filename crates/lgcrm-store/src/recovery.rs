// ABOUTME: Startup recovery: rebuild the in-memory store from the durable medium's last snapshot.
// ABOUTME: Missing state is seeded exactly once; corrupt state is discarded and reseeded.

use lgcrm_core::{Session, Tables, now, seed_tables};
use serde::Serialize;

use crate::medium::DurableMedium;

/// How the store's initial contents were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bootstrap {
    /// An existing snapshot was loaded.
    Loaded,
    /// No snapshot existed; the demo dataset was generated and persisted.
    Seeded,
    /// A snapshot existed but could not be read or decoded; it was replaced
    /// by a fresh seed.
    Reseeded,
}

/// Load the store snapshot, seeding (and persisting the seed) when none
/// is usable. Never fails: a broken medium still yields a working store.
pub fn load_or_seed(medium: &dyn DurableMedium) -> (Tables, Bootstrap) {
    let bootstrap = match medium.load_tables() {
        Ok(Some(tables)) => {
            tracing::info!(
                medium = medium.kind(),
                leads = tables.leads.len(),
                properties = tables.properties.len(),
                visits = tables.visits.len(),
                tasks = tables.tasks.len(),
                "loaded store snapshot"
            );
            return (tables, Bootstrap::Loaded);
        }
        Ok(None) => {
            tracing::info!(medium = medium.kind(), "no store snapshot found, seeding");
            Bootstrap::Seeded
        }
        Err(e) => {
            tracing::warn!(medium = medium.kind(), "discarding unusable store snapshot: {}", e);
            Bootstrap::Reseeded
        }
    };

    let tables = seed_tables(now());
    if let Err(e) = medium.save_tables(&tables) {
        tracing::warn!(medium = medium.kind(), "failed to persist seed data: {}", e);
    }
    (tables, bootstrap)
}

/// Load the persisted session. An unreadable session document is treated
/// as signed out.
pub fn load_session(medium: &dyn DurableMedium) -> Option<Session> {
    match medium.load_session() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(medium = medium.kind(), "discarding unusable session: {}", e);
            None
        }
    }
}
