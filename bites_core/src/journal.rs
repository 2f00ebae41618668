//! Append-only event journal.
//!
//! Feeding events are appended to a JSONL (JSON Lines) file with file
//! locking to ensure safe concurrent access from multiple processes.

use crate::types::FeedingEvent;
use crate::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Event sink trait for persisting feeding events
pub trait EventSink {
    fn append(&mut self, event: &FeedingEvent) -> Result<()>;
}

/// JSONL-based event sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl EventSink for JsonlSink {
    fn append(&mut self, event: &FeedingEvent) -> Result<()> {
        self.ensure_parent_dir()?;

        let line = serde_json::to_string(event)?;

        // A rollup can archive the journal by rename between our open and
        // lock, in which case the locked file is the archived copy and a
        // write to it would bypass the CSV. Reopen the live path and retry.
        loop {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;

            file.lock_exclusive()?;

            if !path_is_same_file(&file, &self.path)? {
                file.unlock()?;
                continue;
            }

            let mut writer = std::io::BufWriter::new(&file);
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;

            file.unlock()?;
            break;
        }

        tracing::debug!("Appended event {} to journal", event.id);
        Ok(())
    }
}

/// Whether `path` still names the file we have open and locked.
#[cfg(unix)]
fn path_is_same_file(file: &File, path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let open_meta = file.metadata()?;
    let path_meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    Ok(open_meta.dev() == path_meta.dev() && open_meta.ino() == path_meta.ino())
}

#[cfg(not(unix))]
fn path_is_same_file(_file: &File, _path: &Path) -> Result<bool> {
    Ok(true)
}

/// Read all events from a journal file.
///
/// Malformed lines are skipped with a warning so one corrupt entry never
/// takes down the whole log.
pub fn read_events(path: &Path) -> Result<Vec<FeedingEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let events = read_locked(&file)?;

    file.unlock()?;
    tracing::debug!("Read {} events from journal", events.len());
    Ok(events)
}

/// Read events from an already-opened, already-locked journal file.
pub(crate) fn read_locked(file: &File) -> Result<Vec<FeedingEvent>> {
    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<FeedingEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!("Failed to parse event at line {}: {}", line_num + 1, e);
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Response, ServingMethod};
    use chrono::Utc;
    use uuid::Uuid;

    fn create_test_event(subject: &str, food: &str) -> FeedingEvent {
        FeedingEvent {
            id: Uuid::new_v4(),
            subject_id: subject.into(),
            food_id: Some(food.into()),
            custom_food_name: None,
            logged_date: Utc::now().date_naive(),
            meal_slot: None,
            serving_methods: vec![ServingMethod::Mashed],
            response: Response::Loved,
            is_first_time: true,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_read_single_event() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("events.jsonl");

        let event = create_test_event("a", "apple");
        let event_id = event.id;

        let mut sink = JsonlSink::new(&path);
        sink.append(&event).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, event_id);
    }

    #[test]
    fn test_append_multiple_events() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("events.jsonl");

        let mut sink = JsonlSink::new(&path);
        for i in 0..5 {
            sink.append(&create_test_event("a", &format!("food_{}", i)))
                .unwrap();
        }

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_read_missing_journal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent.jsonl");

        let events = read_events(&path).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_corrupt_line_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("events.jsonl");

        let mut sink = JsonlSink::new(&path);
        sink.append(&create_test_event("a", "apple")).unwrap();

        // Inject a corrupt line, then a valid one
        {
            use std::io::Write as _;
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(f, "{{ truncated garbage").unwrap();
        }
        sink.append(&create_test_event("a", "banana")).unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 2);
    }
}
