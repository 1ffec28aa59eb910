// ABOUTME: The engine handle owning the in-memory store, the session slot, and the durable medium.
// ABOUTME: Serializes every mutation behind one write lock and persists a full snapshot before releasing it.

use std::sync::Arc;

use lgcrm_core::{Record, Session, Tables, now, seed_tables};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, broadcast};

use crate::auth::Auth;
use crate::change::Change;
use crate::medium::{DurableMedium, MediumError, StorageMode, open_medium};
use crate::query::Query;
use crate::recovery::{Bootstrap, load_or_seed, load_session};

/// Everything guarded by the engine lock: all collections plus the
/// session slot.
#[derive(Debug)]
pub(crate) struct StoreState {
    pub(crate) tables: Tables,
    pub(crate) session: Option<Session>,
}

struct EngineInner {
    state: RwLock<StoreState>,
    medium: Arc<dyn DurableMedium>,
    changes: broadcast::Sender<Change>,
    bootstrap: Bootstrap,
}

/// Cloneable handle onto one engine instance. Clones share the same store,
/// lock, and medium.
///
/// Every operation first reloads the persisted snapshot and session, so
/// handles opened separately on one medium observe each other's writes.
/// Mutations hold the lock exclusively from that reload through the
/// snapshot write, so persisted snapshots follow a single serialized
/// history per engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Build an engine over `medium`, loading its snapshot or seeding it.
    pub fn open(medium: Arc<dyn DurableMedium>) -> Self {
        let (tables, bootstrap) = load_or_seed(medium.as_ref());
        let session = load_session(medium.as_ref());
        let (changes, _) = broadcast::channel(256);

        Self {
            inner: Arc::new(EngineInner {
                state: RwLock::new(StoreState { tables, session }),
                medium,
                changes,
                bootstrap,
            }),
        }
    }

    /// Open the medium selected by `mode` and build an engine over it.
    pub fn open_mode(mode: &StorageMode) -> Result<Self, MediumError> {
        Ok(Self::open(open_medium(mode)?))
    }

    /// Start a query against `R`'s collection.
    pub fn collection<R: Record>(&self) -> Query<R> {
        Query::new(self.clone())
    }

    /// Session emulation bound to this engine.
    pub fn auth(&self) -> Auth {
        Auth::new(self.clone())
    }

    /// How this engine's store was initialized.
    pub fn bootstrap(&self) -> Bootstrap {
        self.inner.bootstrap
    }

    pub fn medium_kind(&self) -> &'static str {
        self.inner.medium.kind()
    }

    /// Receive a `Change` for every mutation applied after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.inner.changes.subscribe()
    }

    /// A copy of every collection as of now.
    pub async fn snapshot(&self) -> Tables {
        self.read().await.tables.clone()
    }

    /// Discard all records and replace them with a fresh seed. The session
    /// slot is left as is.
    pub async fn reset(&self) {
        let mut state = self.write().await;
        state.tables = seed_tables(now());
        self.persist_tables(&state.tables);
        tracing::info!("store reset to seed data");
        self.publish(Change::Reset);
    }

    /// Shared access to the store as currently persisted.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        RwLockWriteGuard::downgrade(self.write().await)
    }

    /// Exclusive access to the store, resynchronized with the medium so
    /// that writes made through other handles on the same medium are
    /// applied on top of, not over.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        let mut state = self.inner.state.write().await;
        self.sync_from_medium(&mut state);
        state
    }

    fn sync_from_medium(&self, state: &mut StoreState) {
        let medium = self.inner.medium.as_ref();
        match medium.load_tables() {
            Ok(Some(tables)) => state.tables = tables,
            // Nothing readable on the medium: the in-memory copy is all there is.
            Ok(None) => {}
            Err(e) => tracing::warn!(
                medium = medium.kind(),
                "store snapshot unreadable, using in-memory state: {}",
                e
            ),
        }
        state.session = load_session(medium);
    }

    /// Write the whole-store snapshot. Failures are logged; the in-memory
    /// mutation that preceded the write stands.
    pub(crate) fn persist_tables(&self, tables: &Tables) {
        if let Err(e) = self.inner.medium.save_tables(tables) {
            tracing::warn!(
                medium = self.inner.medium.kind(),
                "failed to persist store snapshot, keeping in-memory state: {}",
                e
            );
        }
    }

    pub(crate) fn persist_session(&self, session: Option<&Session>) {
        if let Err(e) = self.inner.medium.save_session(session) {
            tracing::warn!(
                medium = self.inner.medium.kind(),
                "failed to persist session, keeping in-memory state: {}",
                e
            );
        }
    }

    pub(crate) fn publish(&self, change: Change) {
        // No subscribers is fine.
        let _ = self.inner.changes.send(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::STORE_KEY;
    use crate::transient::TransientMedium;
    use lgcrm_core::{Lead, Patch, new_id};
    use tempfile::TempDir;

    fn transient_engine() -> (Engine, TransientMedium) {
        let medium = TransientMedium::new(new_id());
        (Engine::open(Arc::new(medium.clone())), medium)
    }

    #[tokio::test]
    async fn open_seeds_empty_medium() {
        let (engine, medium) = transient_engine();

        assert_eq!(engine.bootstrap(), Bootstrap::Seeded);
        assert_eq!(engine.medium_kind(), "transient");
        assert_eq!(medium.load_tables().unwrap(), Some(engine.snapshot().await));
    }

    #[tokio::test]
    async fn second_engine_reads_what_first_seeded() {
        let dir = TempDir::new().unwrap();
        let mode = StorageMode::File {
            dir: dir.path().to_path_buf(),
        };

        let first = Engine::open_mode(&mode).unwrap();
        let blob = std::fs::read_to_string(dir.path().join(format!("{STORE_KEY}.json"))).unwrap();
        drop(first);

        let second = Engine::open_mode(&mode).unwrap();
        let blob_again =
            std::fs::read_to_string(dir.path().join(format!("{STORE_KEY}.json"))).unwrap();

        assert_eq!(second.bootstrap(), Bootstrap::Loaded);
        assert_eq!(blob, blob_again);
        assert_eq!(serde_json::to_string(&second.snapshot().await).unwrap(), blob);
    }

    #[tokio::test]
    async fn clones_share_one_store() {
        let (engine, _medium) = transient_engine();
        let other = engine.clone();

        other.collection::<Lead>().delete().await;

        assert!(engine.snapshot().await.leads.is_empty());
    }

    #[tokio::test]
    async fn reset_restores_seed_and_persists() {
        let (engine, medium) = transient_engine();
        let mut changes = engine.subscribe();
        engine.collection::<Lead>().delete().await;
        let _ = changes.recv().await;

        engine.reset().await;

        let tables = engine.snapshot().await;
        assert_eq!(tables.leads.len(), 2);
        assert_eq!(medium.load_tables().unwrap(), Some(tables));
        assert_eq!(changes.recv().await.unwrap(), Change::Reset);
    }

    #[tokio::test]
    async fn handles_on_one_namespace_see_each_others_writes() {
        let namespace = new_id();
        let a = Engine::open(Arc::new(TransientMedium::new(namespace.clone())));
        let b = Engine::open(Arc::new(TransientMedium::new(namespace.clone())));

        let session = a.auth().sign_in("a@b.com", "x").await.unwrap();
        assert_eq!(b.auth().get_session().await, Some(session));

        a.collection::<Lead>()
            .insert_one(Patch::new().set("name", "FromA"))
            .await
            .unwrap();
        b.collection::<Lead>()
            .insert_one(Patch::new().set("name", "FromB"))
            .await
            .unwrap();

        let names = |tables: Tables| -> Vec<String> {
            tables.leads.into_iter().map(|l| l.name).collect()
        };
        let expected = vec!["FromB", "FromA", "Juan Perez", "María García"];
        assert_eq!(names(a.snapshot().await), expected);

        let reopened = Engine::open(Arc::new(TransientMedium::new(namespace)));
        assert_eq!(names(reopened.snapshot().await), expected);

        b.auth().sign_out().await;
        assert!(a.auth().get_session().await.is_none());
    }

    #[tokio::test]
    async fn unreadable_snapshot_mid_run_keeps_in_memory_state() {
        let (engine, medium) = transient_engine();
        let before = engine.snapshot().await;

        medium.write(STORE_KEY, "{ truncated").unwrap();

        assert_eq!(engine.snapshot().await, before);
        engine.collection::<Lead>().delete().await;
        assert_eq!(medium.load_tables().unwrap().map(|t| t.leads.len()), Some(0));
    }
}
