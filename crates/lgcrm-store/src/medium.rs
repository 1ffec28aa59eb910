// ABOUTME: The durable medium abstraction: where snapshot blobs live between process runs.
// ABOUTME: Backends store opaque blobs under fixed keys; this trait layers snapshot encoding on top.

use std::path::PathBuf;
use std::sync::Arc;

use lgcrm_core::{Session, Tables};
use thiserror::Error;

use crate::file::FileMedium;
use crate::sqlite::SqliteMedium;
use crate::transient::TransientMedium;

/// Key holding the whole-store snapshot `{ leads, properties, visits, tasks }`.
pub const STORE_KEY: &str = "lg_crm_mock_v1";

/// Key holding the session document.
pub const SESSION_KEY: &str = "lg_crm_session_v1";

/// Errors that can occur while reading or writing a durable medium.
#[derive(Debug, Error)]
pub enum MediumError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt blob under {key}: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Which durable medium to use, decided once at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// One JSON file per key inside `dir`.
    File { dir: PathBuf },
    /// A key/value table inside the SQLite database at `path`.
    Sqlite { path: PathBuf },
    /// Process-wide memory, shared by every handle on the same namespace.
    Transient { namespace: String },
}

impl StorageMode {
    /// Whether data written through this mode outlives the process.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, StorageMode::Transient { .. })
    }
}

/// Open the medium selected by `mode`.
pub fn open_medium(mode: &StorageMode) -> Result<Arc<dyn DurableMedium>, MediumError> {
    let medium: Arc<dyn DurableMedium> = match mode {
        StorageMode::File { dir } => Arc::new(FileMedium::open(dir)?),
        StorageMode::Sqlite { path } => Arc::new(SqliteMedium::open(path)?),
        StorageMode::Transient { namespace } => Arc::new(TransientMedium::new(namespace)),
    };
    tracing::info!(medium = medium.kind(), "opened durable medium");
    Ok(medium)
}

/// A host key/value medium holding serialized blobs.
///
/// Backends implement `read`/`write`/`remove`; snapshot encoding and
/// decoding are provided on top so every backend treats corrupt payloads
/// the same way.
pub trait DurableMedium: Send + Sync {
    /// Short name for logs.
    fn kind(&self) -> &'static str;

    /// Fetch the blob stored under `key`, or `None` if the key is absent.
    fn read(&self, key: &str) -> Result<Option<String>, MediumError>;

    /// Store `blob` under `key`, replacing any previous value.
    fn write(&self, key: &str, blob: &str) -> Result<(), MediumError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), MediumError>;

    /// Load the whole-store snapshot. `Ok(None)` means no snapshot exists;
    /// an undecodable blob is `MediumError::Corrupt`.
    fn load_tables(&self) -> Result<Option<Tables>, MediumError> {
        decode(STORE_KEY, self.read(STORE_KEY)?)
    }

    /// Persist every collection as one unit under `STORE_KEY`.
    fn save_tables(&self, tables: &Tables) -> Result<(), MediumError> {
        let blob = serde_json::to_string(tables)?;
        self.write(STORE_KEY, &blob)
    }

    fn load_session(&self) -> Result<Option<Session>, MediumError> {
        Ok(decode::<Option<Session>>(SESSION_KEY, self.read(SESSION_KEY)?)?.flatten())
    }

    /// Persist the session slot; `None` clears it.
    fn save_session(&self, session: Option<&Session>) -> Result<(), MediumError> {
        match session {
            Some(session) => {
                let blob = serde_json::to_string(session)?;
                self.write(SESSION_KEY, &blob)
            }
            None => self.remove(SESSION_KEY),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    key: &'static str,
    blob: Option<String>,
) -> Result<Option<T>, MediumError> {
    match blob {
        Some(blob) => serde_json::from_str(&blob)
            .map(Some)
            .map_err(|source| MediumError::Corrupt { key, source }),
        None => Ok(None),
    }
}
