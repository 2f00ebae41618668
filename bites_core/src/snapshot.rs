//! Immutable event-log snapshot.
//!
//! The engine never owns live log state: each computation takes an
//! `EventLog` snapshot built from whatever the caller loaded (journal, CSV
//! archive, sync layer) and derives everything from it. A newer snapshot
//! simply supersedes an older one.

use crate::types::{FeedingEvent, MealSlot, Response, ServingMethod, SyncEvent};
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Input for creating a new feeding event. `is_first_time` is not part of
/// the input: it is computed against the snapshot and frozen on the event.
#[derive(Clone, Debug)]
pub struct NewEvent {
    pub subject_id: String,
    pub food_id: Option<String>,
    pub custom_food_name: Option<String>,
    pub logged_date: Option<NaiveDate>,
    pub meal_slot: Option<MealSlot>,
    pub serving_methods: Vec<ServingMethod>,
    pub response: Response,
    pub notes: Option<String>,
}

/// Whitelisted edits to an existing event. Fields left `None` are
/// unchanged. `is_first_time` and `logged_date` are deliberately not
/// editable: first-ness reflects log state at insertion time only.
#[derive(Clone, Debug, Default)]
pub struct EventEdit {
    pub response: Option<Response>,
    pub serving_methods: Option<Vec<ServingMethod>>,
    pub meal_slot: Option<MealSlot>,
    pub notes: Option<String>,
}

/// An ordered, read-only snapshot of feeding events across all subjects.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<FeedingEvent>,
}

impl EventLog {
    /// Build a snapshot. Events are sorted ascending by logged date with
    /// creation time as tiebreak, which is the order the evaluator's
    /// chronological scans rely on.
    pub fn new(mut events: Vec<FeedingEvent>) -> Self {
        events.sort_by(|a, b| {
            a.logged_date
                .cmp(&b.logged_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Self { events }
    }

    pub fn events(&self) -> &[FeedingEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// All events for one subject, in chronological order.
    pub fn subject_events(&self, subject_id: &str) -> Vec<FeedingEvent> {
        self.events
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect()
    }

    /// Distinct logged dates for one subject, ascending.
    pub fn subject_dates(&self, subject_id: &str) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self
            .events
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .map(|e| e.logged_date)
            .collect();
        dates.into_iter().collect()
    }

    /// Whether no prior event for this subject references the same food id
    /// or, case-insensitively, the same custom food name.
    pub fn is_first_time(
        &self,
        subject_id: &str,
        food_id: Option<&str>,
        custom_food_name: Option<&str>,
    ) -> bool {
        if food_id.is_none() && custom_food_name.is_none() {
            return false;
        }
        let custom_lower = custom_food_name.map(str::to_lowercase);

        !self.events.iter().any(|e| {
            if e.subject_id != subject_id {
                return false;
            }
            if let (Some(id), Some(ref existing)) = (food_id, &e.food_id) {
                if *existing == id {
                    return true;
                }
            }
            if let (Some(ref wanted), Some(ref existing)) = (&custom_lower, &e.custom_food_name) {
                if existing.to_lowercase() == *wanted {
                    return true;
                }
            }
            false
        })
    }

    /// Create a new event from input, computing and freezing
    /// `is_first_time` against this snapshot. Does not mutate the snapshot;
    /// the caller appends the returned event to its store and rebuilds.
    pub fn create_event(&self, input: NewEvent) -> Result<FeedingEvent> {
        if input.food_id.is_none() && input.custom_food_name.is_none() {
            return Err(Error::InvalidEvent(
                "event needs a food id or a custom food name".into(),
            ));
        }

        let now = Utc::now();
        let is_first_time = self.is_first_time(
            &input.subject_id,
            input.food_id.as_deref(),
            input.custom_food_name.as_deref(),
        );

        Ok(FeedingEvent {
            id: Uuid::new_v4(),
            subject_id: input.subject_id,
            food_id: input.food_id,
            custom_food_name: input.custom_food_name,
            logged_date: input.logged_date.unwrap_or_else(|| now.date_naive()),
            meal_slot: input.meal_slot,
            serving_methods: input.serving_methods,
            response: input.response,
            is_first_time,
            notes: input.notes,
            created_at: now,
        })
    }

    /// Apply a whitelisted edit, returning the updated event. Frozen fields
    /// (`is_first_time`, `logged_date`, food reference, timestamps) carry
    /// over untouched.
    pub fn apply_edit(event: &FeedingEvent, edit: &EventEdit) -> FeedingEvent {
        let mut updated = event.clone();
        if let Some(response) = edit.response {
            updated.response = response;
        }
        if let Some(ref methods) = edit.serving_methods {
            updated.serving_methods = methods.clone();
        }
        if let Some(meal_slot) = edit.meal_slot {
            updated.meal_slot = Some(meal_slot);
        }
        if let Some(ref notes) = edit.notes {
            updated.notes = Some(notes.clone());
        }
        updated
    }

    /// Cross-subject correlation: group first-time events with a food
    /// reference by (date, food id); groups with two or more distinct
    /// subjects are sync events.
    pub fn sync_events(&self) -> Vec<SyncEvent> {
        let mut groups: HashMap<(NaiveDate, &str), BTreeSet<&str>> = HashMap::new();

        for event in &self.events {
            if !event.is_first_time {
                continue;
            }
            let Some(ref food_id) = event.food_id else {
                continue;
            };
            groups
                .entry((event.logged_date, food_id.as_str()))
                .or_default()
                .insert(event.subject_id.as_str());
        }

        let mut syncs: Vec<SyncEvent> = groups
            .into_iter()
            .filter(|(_, subjects)| subjects.len() >= 2)
            .map(|((date, food_id), subjects)| SyncEvent {
                date,
                food_id: food_id.to_string(),
                subject_ids: subjects.into_iter().map(String::from).collect(),
            })
            .collect();

        syncs.sort_by(|a, b| a.date.cmp(&b.date).then(a.food_id.cmp(&b.food_id)));
        syncs
    }

    /// Sync events this subject took part in. Sync badges are earned by
    /// the participants, not by every subject in the log.
    pub fn subject_sync_events(&self, subject_id: &str) -> Vec<SyncEvent> {
        self.sync_events()
            .into_iter()
            .filter(|s| s.subject_ids.iter().any(|id| id == subject_id))
            .collect()
    }
}
