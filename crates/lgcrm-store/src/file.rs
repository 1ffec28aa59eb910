// ABOUTME: File-backed durable medium storing each key as one JSON file in a directory.
// ABOUTME: Writes are atomic (write to .tmp, fsync, rename) so a crash never leaves a torn blob.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::medium::{DurableMedium, MediumError};

/// A persistent medium rooted at a directory on the host filesystem.
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Open the medium, creating the directory if it does not exist.
    pub fn open(dir: &Path) -> Result<Self, MediumError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DurableMedium for FileMedium {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn read(&self, key: &str) -> Result<Option<String>, MediumError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), MediumError> {
        let tmp_path = self.dir.join(format!("{key}.tmp"));
        let final_path = self.path_for(key);

        let mut file = File::create(&tmp_path)?;
        file.write_all(blob.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &final_path)?;

        // Best-effort: make the rename itself durable.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::STORE_KEY;
    use tempfile::TempDir;

    #[test]
    fn open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("nested");

        FileMedium::open(&nested).unwrap();

        assert!(nested.is_dir());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let medium = FileMedium::open(dir.path()).unwrap();

        medium.write(STORE_KEY, "{\"a\":1}").unwrap();

        assert_eq!(medium.read(STORE_KEY).unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(dir.path().join("lg_crm_mock_v1.json").exists());
    }

    #[test]
    fn write_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let medium = FileMedium::open(dir.path()).unwrap();

        medium.write("k", "first").unwrap();
        medium.write("k", "second").unwrap();

        assert_eq!(medium.read("k").unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join("k.tmp").exists());
    }

    #[test]
    fn separate_handles_share_the_directory() {
        let dir = TempDir::new().unwrap();
        FileMedium::open(dir.path()).unwrap().write("k", "v").unwrap();

        let reopened = FileMedium::open(dir.path()).unwrap();
        assert_eq!(reopened.read("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn remove_missing_key_is_ok() {
        let dir = TempDir::new().unwrap();
        let medium = FileMedium::open(dir.path()).unwrap();

        medium.remove("never-written").unwrap();
        assert!(medium.read("never-written").unwrap().is_none());
    }
}
