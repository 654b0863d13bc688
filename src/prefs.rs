//! File-backed local key/value storage.
//!
//! Holds the persisted session snapshot and the cached display name, one
//! JSON file per key under a data directory. This is plain local storage,
//! not a database; unreadable or corrupt files read back as absent.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const KEY_USER_DATA: &str = "user_data";
pub const KEY_USER_NAME: &str = "user_name";

fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub struct Prefs {
    dir: PathBuf,
}

impl Prefs {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create prefs directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_filename(key)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = std::fs::read(self.key_path(key)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.key_path(key);
        let bytes = serde_json::to_vec(value)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write pref {}", path.display()))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.key_path(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_get_remove_round_trip() {
        let tmp = tempdir().unwrap();
        let prefs = Prefs::open(tmp.path()).unwrap();
        prefs.set(KEY_USER_NAME, &"Ana".to_string()).unwrap();
        assert_eq!(prefs.get::<String>(KEY_USER_NAME), Some("Ana".to_string()));
        prefs.remove(KEY_USER_NAME);
        assert_eq!(prefs.get::<String>(KEY_USER_NAME), None);
    }

    #[test]
    fn missing_and_corrupt_keys_read_as_absent() {
        let tmp = tempdir().unwrap();
        let prefs = Prefs::open(tmp.path()).unwrap();
        assert_eq!(prefs.get::<String>("nope"), None);
        std::fs::write(tmp.path().join("bad.json"), b"{not json").unwrap();
        assert_eq!(prefs.get::<String>("bad"), None);
    }

    #[test]
    fn keys_are_sanitized_to_safe_filenames() {
        let tmp = tempdir().unwrap();
        let prefs = Prefs::open(tmp.path()).unwrap();
        prefs.set("week/end plans", &1u32).unwrap();
        assert_eq!(prefs.get::<u32>("week/end plans"), Some(1));
        assert!(tmp.path().join("week_end_plans.json").exists());
    }
}
