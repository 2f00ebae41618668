//! Event history loading.
//!
//! This module merges the live journal with archived CSV events to
//! reconstruct the full feeding history for snapshot building.

use crate::types::{FeedingEvent, MealSlot, Response, ServingMethod};
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived events
#[derive(Debug, Deserialize)]
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

impl TryFrom<CsvRow> for FeedingEvent {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let logged_date = NaiveDate::parse_from_str(&row.logged_date, "%Y-%m-%d")
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?;

        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| crate::Error::Other(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let response = Response::parse(&row.response)
            .ok_or_else(|| crate::Error::Other(format!("Invalid response: {}", row.response)))?;

        let meal_slot = match row.meal_slot.as_deref() {
            Some(s) if !s.is_empty() => MealSlot::parse(s),
            _ => None,
        };

        let serving_methods = row
            .serving_methods
            .split(';')
            .filter(|s| !s.is_empty())
            .filter_map(ServingMethod::parse)
            .collect();

        Ok(FeedingEvent {
            id,
            subject_id: row.subject_id,
            food_id: row.food_id.filter(|s| !s.is_empty()),
            custom_food_name: row.custom_food_name.filter(|s| !s.is_empty()),
            logged_date,
            meal_slot,
            serving_methods,
            response,
            is_first_time: row.is_first_time,
            notes: row.notes.filter(|s| !s.is_empty()),
            created_at,
        })
    }
}

/// Load all events from both the journal and the CSV archive.
///
/// Journal events win on duplicate ids. The result is unsorted; callers
/// pass it through `EventLog::new` which establishes chronological order.
pub fn load_events(journal_path: &Path, csv_path: &Path) -> Result<Vec<FeedingEvent>> {
    let mut events = Vec::new();
    let mut seen_ids = HashSet::new();

    if journal_path.exists() {
        let journal_events = crate::journal::read_events(journal_path)?;
        for event in journal_events {
            seen_ids.insert(event.id);
            events.push(event);
        }
        tracing::debug!("Loaded {} events from journal", events.len());
    }

    if csv_path.exists() {
        let csv_events = load_events_from_csv(csv_path)?;
        let mut csv_count = 0;
        for event in csv_events {
            if !seen_ids.contains(&event.id) {
                seen_ids.insert(event.id);
                events.push(event);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} events from CSV archive", csv_count);
    }

    tracing::info!("Loaded {} total events", events.len());

    Ok(events)
}

/// Load all events from a CSV archive file
fn load_events_from_csv(path: &Path) -> Result<Vec<FeedingEvent>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut events = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match FeedingEvent::try_from(row) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::EventSink;

    fn create_test_event(food: &str, date: &str) -> FeedingEvent {
        FeedingEvent {
            id: Uuid::new_v4(),
            subject_id: "a".into(),
            food_id: Some(food.into()),
            custom_food_name: None,
            logged_date: date.parse().unwrap(),
            meal_slot: Some(MealSlot::Breakfast),
            serving_methods: vec![ServingMethod::Mashed],
            response: Response::Loved,
            is_first_time: true,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_events_from_journal_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("events.jsonl");
        let csv_path = temp_dir.path().join("events.csv");

        let mut sink = crate::journal::JsonlSink::new(&journal_path);
        sink.append(&create_test_event("apple", "2024-01-01")).unwrap();
        sink.append(&create_test_event("banana", "2024-01-02")).unwrap();

        let events = load_events(&journal_path, &csv_path).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_round_trip_through_csv_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("events.jsonl");
        let csv_path = temp_dir.path().join("events.csv");

        let event = create_test_event("salmon", "2024-03-05");
        let event_id = event.id;
        let mut sink = crate::journal::JsonlSink::new(&journal_path);
        sink.append(&event).unwrap();

        crate::csv_rollup::journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();

        let events = load_events(&journal_path, &csv_path).unwrap();
        assert_eq!(events.len(), 1);

        let loaded = &events[0];
        assert_eq!(loaded.id, event_id);
        assert_eq!(loaded.food_id.as_deref(), Some("salmon"));
        assert_eq!(loaded.logged_date, "2024-03-05".parse::<NaiveDate>().unwrap());
        assert_eq!(loaded.meal_slot, Some(MealSlot::Breakfast));
        assert_eq!(loaded.serving_methods, vec![ServingMethod::Mashed]);
        assert!(loaded.is_first_time);
    }

    #[test]
    fn test_deduplication_across_journal_and_csv() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("events.jsonl");
        let csv_path = temp_dir.path().join("events.csv");

        let event = create_test_event("apple", "2024-01-01");
        let event_id = event.id;
        let mut sink = crate::journal::JsonlSink::new(&journal_path);
        sink.append(&event).unwrap();

        crate::csv_rollup::journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();

        // Re-append the same event to a fresh journal, simulating a
        // rollup that raced a writer
        let mut sink = crate::journal::JsonlSink::new(&journal_path);
        sink.append(&event).unwrap();

        let events = load_events(&journal_path, &csv_path).unwrap();
        let count = events.iter().filter(|e| e.id == event_id).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_malformed_csv_row_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("events.jsonl");
        let csv_path = temp_dir.path().join("events.csv");

        let mut sink = crate::journal::JsonlSink::new(&journal_path);
        sink.append(&create_test_event("apple", "2024-01-01")).unwrap();
        crate::csv_rollup::journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();

        // Append a row with a garbage date
        {
            use std::io::Write as _;
            let mut f = std::fs::OpenOptions::new()
                .append(true)
                .open(&csv_path)
                .unwrap();
            writeln!(
                f,
                "{},b,banana,,not-a-date,,puree,loved,true,,2024-01-01T00:00:00Z",
                Uuid::new_v4()
            )
            .unwrap();
        }

        let events = load_events(&journal_path, &csv_path).unwrap();
        assert_eq!(events.len(), 1);
    }
}
