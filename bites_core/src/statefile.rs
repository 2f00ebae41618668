//! JSON state-file persistence with file locking.
//!
//! Shared by the award ledger and the allergen override store: shared-lock
//! reads, atomic writes (temp file + rename), and a load-modify-save helper
//! serialized through a sidecar lock file so writers observe each other's
//! committed state.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Load state from a file with shared locking.
///
/// Returns default state if the file doesn't exist. If the file is
/// corrupted or unreadable, logs a warning and returns default state.
pub fn load<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!("No state file at {:?}, using default", path);
        return Ok(T::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open state file {:?}: {}. Using defaults.", path, e);
            return Ok(T::default());
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock state file {:?}: {}. Using defaults.", path, e);
        return Ok(T::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read state file {:?}: {}. Using defaults.", path, e);
        return Ok(T::default());
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!("Failed to parse state file {:?}: {}. Using defaults.", path, e);
            Ok(T::default())
        }
    }
}

/// Save state to a file.
///
/// Atomically writes by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
///
/// Last write wins; callers that need read-modify-write go through
/// [`update`], which holds the sidecar lock across the whole cycle.
pub fn save<T>(state: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
    })?)?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(state)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved state to {:?}", path);
    Ok(())
}

/// Path of the sidecar lock file guarding read-modify-write cycles.
///
/// The state file itself is replaced by rename on every save, so locking it
/// directly would leave each writer locking a different inode. The sidecar
/// is never renamed, so every writer contends on the same lock.
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Load state, modify it, and save it back.
///
/// The whole cycle runs under an exclusive lock on the sidecar lock file,
/// so concurrent writers are serialized and each closure runs against the
/// previous writer's committed state. An idempotent closure therefore makes
/// concurrent invocation safe.
pub fn update<T, F>(path: &Path, f: F) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .open(lock_path(path))?;
    lock.lock_exclusive()?;

    let result = (|| {
        let mut state: T = load(path)?;
        f(&mut state)?;
        save(&state, path)?;
        Ok(state)
    })();

    let _ = lock.unlock();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
    struct TestState {
        items: Vec<String>,
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("state.json");

        let state = TestState {
            items: vec!["one".into(), "two".into()],
        };
        save(&state, &path).unwrap();

        let loaded: TestState = load(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.json");

        let loaded: TestState = load(&path).unwrap();
        assert!(loaded.items.is_empty());
    }

    #[test]
    fn test_corrupted_file_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json }").unwrap();

        let loaded: TestState = load(&path).unwrap();
        assert!(loaded.items.is_empty());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("state.json");

        update::<TestState, _>(&path, |state| {
            state.items.push("added".into());
            Ok(())
        })
        .unwrap();

        let loaded: TestState = load(&path).unwrap();
        assert_eq!(loaded.items, vec!["added".to_string()]);
    }

    #[test]
    fn test_update_serializes_concurrent_writers() {
        use std::sync::{Arc, Barrier};

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("state.json");
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    update::<TestState, _>(&path, |state| {
                        state.items.push(format!("writer_{}", i));
                        Ok(())
                    })
                    .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every writer's item survives; no last-rename-wins clobbering
        let loaded: TestState = load(&path).unwrap();
        assert_eq!(loaded.items.len(), 4);
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("state.json");

        save(&TestState::default(), &path).unwrap();

        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json")
            .collect();
        assert!(extras.is_empty(), "unexpected extra files: {:?}", extras);
    }
}
