// ABOUTME: Configuration loading for lgcrm from environment variables.
// ABOUTME: Resolves the data directory and which durable medium the engine should open.

use std::path::PathBuf;

use thiserror::Error;

use crate::medium::StorageMode;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("LGCRM_STORAGE must be one of file, sqlite, transient; got {0:?}")]
    InvalidStorage(String),
}

/// Which medium family `LGCRM_STORAGE` selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    File,
    Sqlite,
    Transient,
}

impl std::str::FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "sqlite" => Ok(StorageKind::Sqlite),
            "transient" | "memory" => Ok(StorageKind::Transient),
            _ => Err(ConfigError::InvalidStorage(s.to_string())),
        }
    }
}

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CrmConfig {
    pub home: PathBuf,
    pub storage: StorageKind,
    pub namespace: String,
}

impl CrmConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - LGCRM_HOME: data directory (default: ~/.lgcrm)
    /// - LGCRM_STORAGE: file, sqlite, or transient (default: file)
    /// - LGCRM_NAMESPACE: transient namespace (default: lg_crm)
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = std::env::var("LGCRM_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".lgcrm")
            });

        let storage = match std::env::var("LGCRM_STORAGE") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => StorageKind::File,
        };

        let namespace = std::env::var("LGCRM_NAMESPACE")
            .ok()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "lg_crm".to_string());

        Ok(Self {
            home,
            storage,
            namespace,
        })
    }

    /// The storage mode this configuration selects.
    pub fn storage_mode(&self) -> StorageMode {
        match self.storage {
            StorageKind::File => StorageMode::File {
                dir: self.home.clone(),
            },
            StorageKind::Sqlite => StorageMode::Sqlite {
                path: self.home.join("lgcrm.db"),
            },
            StorageKind::Transient => StorageMode::Transient {
                namespace: self.namespace.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both cases live in one test so they never race on the process env.
    #[test]
    fn config_from_env() {
        // SAFETY: test-only code, no other test in this crate touches these vars
        unsafe {
            std::env::remove_var("LGCRM_HOME");
            std::env::remove_var("LGCRM_STORAGE");
            std::env::remove_var("LGCRM_NAMESPACE");
        }

        let config = CrmConfig::from_env().unwrap();
        assert_eq!(config.storage, StorageKind::File);
        assert_eq!(config.namespace, "lg_crm");
        assert!(config.home.to_string_lossy().contains(".lgcrm"));
        assert_eq!(
            config.storage_mode(),
            StorageMode::File {
                dir: config.home.clone()
            }
        );

        // SAFETY: as above
        unsafe {
            std::env::set_var("LGCRM_HOME", "/srv/crm");
            std::env::set_var("LGCRM_STORAGE", "SQLite");
        }
        let config = CrmConfig::from_env().unwrap();
        assert_eq!(
            config.storage_mode(),
            StorageMode::Sqlite {
                path: PathBuf::from("/srv/crm/lgcrm.db")
            }
        );

        // SAFETY: as above
        unsafe {
            std::env::set_var("LGCRM_STORAGE", "cloud");
        }
        let result = CrmConfig::from_env();

        // SAFETY: as above
        unsafe {
            std::env::remove_var("LGCRM_HOME");
            std::env::remove_var("LGCRM_STORAGE");
        }

        let err = result.unwrap_err();
        assert!(err.to_string().contains("cloud"), "error should name the value: {}", err);
    }

    #[test]
    fn storage_kind_parsing() {
        assert_eq!("transient".parse::<StorageKind>().unwrap(), StorageKind::Transient);
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Transient);
        assert!("".parse::<StorageKind>().is_err());
    }
}
