//! Point-in-time serialization of the full working state.
//!
//! The snapshot is rewritten exactly once per process lifetime, at startup,
//! after the previous run's journal has been replayed on top of the previous
//! snapshot. Saving goes through a sibling temp file and an atomic rename so
//! a crash mid-save never leaves a torn snapshot visible to the next load.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::Result;
use crate::domain::FeedDescriptor;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub fingerprints: Vec<u64>,
    #[serde(default)]
    pub feeds: Vec<FeedDescriptor>,
    #[serde(default)]
    pub destinations: Vec<i64>,
}

/// Load the snapshot, if any.
///
/// Absence means first run. An unreadable or corrupt snapshot file is treated
/// the same way, with a warning: prior state is then whatever the journal can
/// reconstruct.
pub fn load(path: &Path) -> Option<PersistedState> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot unreadable, starting from journal only");
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snapshot corrupt, starting from journal only");
            None
        }
    }
}

/// Atomically replace the snapshot file with the serialized state.
///
/// Failure here is fatal to startup: the process must not serve traffic with
/// state it cannot durably reconstruct.
pub fn save(path: &Path, state: &PersistedState) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let data = serde_json::to_vec(state)?;

    let mut file = File::create(&tmp)?;
    file.write_all(&data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("snapshot.json")).is_none());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let state = PersistedState {
            fingerprints: vec![1, 2, 3],
            feeds: vec![FeedDescriptor::new("https://example.com/feed.xml".into())],
            destinations: vec![42, -100],
        };
        save(&path, &state).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.fingerprints, vec![1, 2, 3]);
        assert_eq!(loaded.feeds.len(), 1);
        assert_eq!(loaded.feeds[0].url, "https://example.com/feed.xml");
        assert_eq!(loaded.destinations, vec![42, -100]);
    }

    #[test]
    fn test_corrupt_snapshot_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load(&path).is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        save(&path, &PersistedState::default()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, r#"{"fingerprints":[9]}"#).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.fingerprints, vec![9]);
        assert!(loaded.feeds.is_empty());
        assert!(loaded.destinations.is_empty());
    }
}
