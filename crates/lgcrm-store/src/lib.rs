// ABOUTME: Persistence and query layer for lgcrm, owning the store, its durable medium, and sessions.
// ABOUTME: Provides the engine handle, query builder, session emulation, and snapshot recovery.

pub mod auth;
pub mod change;
pub mod config;
pub mod engine;
pub mod file;
pub mod medium;
pub mod query;
pub mod recovery;
pub mod sqlite;
pub mod transient;

pub use auth::{Auth, AuthError};
pub use change::Change;
pub use config::{ConfigError, CrmConfig, StorageKind};
pub use engine::Engine;
pub use file::FileMedium;
pub use medium::{DurableMedium, MediumError, SESSION_KEY, STORE_KEY, StorageMode, open_medium};
pub use query::{CountMode, Query, QueryError, SelectOptions, SelectResult};
pub use recovery::{Bootstrap, load_or_seed, load_session};
pub use sqlite::SqliteMedium;
pub use transient::TransientMedium;
