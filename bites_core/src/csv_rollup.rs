//! CSV rollup functionality for archiving journal events.
//!
//! This module implements atomic journal-to-CSV conversion with proper
//! error handling to prevent data loss.

use crate::types::FeedingEvent;
use crate::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    subject_id: String,
    food_id: Option<String>,
    custom_food_name: Option<String>,
    logged_date: String,
    meal_slot: Option<String>,
    serving_methods: String,
    response: String,
    is_first_time: bool,
    notes: Option<String>,
    created_at: String,
}

impl From<&FeedingEvent> for CsvRow {
    fn from(event: &FeedingEvent) -> Self {
        CsvRow {
            id: event.id.to_string(),
            subject_id: event.subject_id.clone(),
            food_id: event.food_id.clone(),
            custom_food_name: event.custom_food_name.clone(),
            logged_date: event.logged_date.format("%Y-%m-%d").to_string(),
            meal_slot: event.meal_slot.map(|m| m.as_str().to_string()),
            serving_methods: event
                .serving_methods
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(";"),
            response: event.response.as_str().to_string(),
            is_first_time: event.is_first_time,
            notes: event.notes.clone(),
            created_at: event.created_at.to_rfc3339(),
        }
    }
}

/// Roll up journal events into CSV and archive the journal atomically
///
/// This function:
/// 1. Takes an exclusive lock on the journal
/// 2. Reads all events from it
/// 3. Appends them to the CSV file (creates with headers if needed)
/// 4. Syncs the CSV to disk
/// 5. Renames the journal to .processed, then releases the lock
/// 6. Returns the number of events processed
///
/// # Safety
/// - The journal lock is held from read through rename, so no appender can
///   slip an event in after the snapshot; an appender that locked the
///   renamed inode detects the rename and reopens the live path
/// - CSV is fsynced before the journal is renamed
/// - Journal is renamed (not deleted) to allow manual recovery if needed
/// - Processed journal files can be cleaned up later
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let journal = match File::open(journal_path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No journal at {:?} to roll up", journal_path);
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };
    journal.lock_exclusive()?;

    let events = crate::journal::read_locked(&journal)?;

    if events.is_empty() {
        journal.unlock()?;
        tracing::info!("No events in journal to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only when the file is brand new; checking size after opening
    // avoids an extra stat() syscall
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for event in &events {
        let row = CsvRow::from(event);
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} events to CSV", events.len());

    // Atomically archive the journal by renaming it, then release the lock
    let processed_path = journal_path.with_extension("jsonl.processed");
    std::fs::rename(journal_path, &processed_path)?;
    journal.unlock()?;

    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(events.len())
}

/// Clean up old processed journal files
///
/// This removes all .jsonl.processed files in the given directory.
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed journal: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journal files", count);
    }

    Ok(count)
}
