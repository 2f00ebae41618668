//! Allergen maintenance tracking.
//!
//! Combines exposure history (derived purely from the event log) with the
//! explicit per-(subject, allergen) override record to produce a status and
//! a re-exposure urgency. The override store is the only persisted piece;
//! statuses are recomputed on every read.

use crate::types::*;
use crate::{statefile, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Re-exposure schedule: allergens should be re-served every few days to
/// maintain tolerance.
pub const MAINTENANCE_DAYS_WARNING: i64 = 5;
pub const MAINTENANCE_DAYS_MAX: i64 = 7;

/// Day thresholds for maintenance urgency
#[derive(Clone, Copy, Debug)]
pub struct MaintenanceWindow {
    pub soon_days: i64,
    pub overdue_days: i64,
}

impl Default for MaintenanceWindow {
    fn default() -> Self {
        Self {
            soon_days: MAINTENANCE_DAYS_WARNING,
            overdue_days: MAINTENANCE_DAYS_MAX,
        }
    }
}

/// Persisted override records, one live record per (subject, allergen type)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OverrideStore {
    pub overrides: Vec<AllergenOverride>,
}

impl OverrideStore {
    pub fn find(&self, subject_id: &str, allergen: AllergenType) -> Option<&AllergenOverride> {
        self.overrides
            .iter()
            .find(|o| o.subject_id == subject_id && o.allergen_type == allergen)
    }

    fn find_or_insert(&mut self, subject_id: &str, allergen: AllergenType) -> &mut AllergenOverride {
        let idx = self
            .overrides
            .iter()
            .position(|o| o.subject_id == subject_id && o.allergen_type == allergen);
        let idx = match idx {
            Some(i) => i,
            None => {
                self.overrides.push(AllergenOverride {
                    id: Uuid::new_v4(),
                    subject_id: subject_id.to_string(),
                    allergen_type: allergen,
                    had_reaction: false,
                    reaction_severity: None,
                    reaction_notes: None,
                    is_cleared: false,
                });
                self.overrides.len() - 1
            }
        };
        &mut self.overrides[idx]
    }

    /// Record an allergic reaction. Clears any "cleared" flag; the two
    /// states are mutually exclusive.
    pub fn record_reaction(
        &mut self,
        subject_id: &str,
        allergen: AllergenType,
        severity: ReactionSeverity,
        notes: Option<String>,
    ) -> &AllergenOverride {
        let record = self.find_or_insert(subject_id, allergen);
        record.had_reaction = true;
        record.reaction_severity = Some(severity);
        record.reaction_notes = notes;
        record.is_cleared = false;
        tracing::info!(
            "Recorded {:?} reaction to {} for subject {}",
            severity,
            allergen.as_str(),
            subject_id
        );
        record
    }

    /// Mark an allergen as cleared (tolerated after repeated exposures).
    /// Removes any reaction record.
    pub fn mark_cleared(&mut self, subject_id: &str, allergen: AllergenType) -> &AllergenOverride {
        let record = self.find_or_insert(subject_id, allergen);
        record.is_cleared = true;
        record.had_reaction = false;
        record.reaction_severity = None;
        record.reaction_notes = None;
        record
    }

    /// Remove a reaction flag (false alarm), returning the allergen to the
    /// introduced state. Does not set "cleared".
    pub fn clear_reaction(&mut self, subject_id: &str, allergen: AllergenType) {
        if let Some(record) = self
            .overrides
            .iter_mut()
            .find(|o| o.subject_id == subject_id && o.allergen_type == allergen)
        {
            record.had_reaction = false;
            record.reaction_severity = None;
            record.reaction_notes = None;
        }
    }

    /// Load the override store from a file, defaulting when absent or
    /// unreadable.
    pub fn load(path: &Path) -> Result<Self> {
        statefile::load(path)
    }

    /// Save the override store atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        statefile::save(self, path)
    }

    /// Load, modify, and save back atomically.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut OverrideStore) -> Result<()>,
    {
        statefile::update(path, f)
    }
}

/// Derive the allergen status for one (subject, allergen type).
///
/// `events` is the subject's full event list; exposures are the events
/// whose referenced catalog food carries this allergen type. The override
/// record layers reaction/cleared on top of exposure-derived state.
pub fn allergen_status(
    subject_id: &str,
    allergen: AllergenType,
    events: &[FeedingEvent],
    foods: &FoodCatalog,
    overrides: &OverrideStore,
    today: NaiveDate,
    window: MaintenanceWindow,
) -> AllergenStatus {
    let exposure_dates: Vec<NaiveDate> = events
        .iter()
        .filter(|e| {
            e.food_id
                .as_deref()
                .and_then(|id| foods.get(id))
                .map(|f| f.allergen_type == Some(allergen))
                .unwrap_or(false)
        })
        .map(|e| e.logged_date)
        .collect();

    let exposure_count = exposure_dates.len() as u32;
    let last_exposure_date = exposure_dates.iter().copied().max();
    let days_since_exposure = last_exposure_date.map(|last| (today - last).num_days());

    let record = overrides.find(subject_id, allergen);

    let state = match record {
        Some(r) if r.had_reaction => AllergenState::Reaction,
        Some(r) if r.is_cleared => AllergenState::Cleared,
        _ if exposure_count > 0 => AllergenState::Introduced,
        _ => AllergenState::NotIntroduced,
    };

    // Urgency only applies while actively maintaining tolerance
    let urgency = match (state, days_since_exposure) {
        (AllergenState::Introduced | AllergenState::Cleared, Some(days)) => {
            if days >= window.overdue_days {
                MaintenanceUrgency::Overdue
            } else if days >= window.soon_days {
                MaintenanceUrgency::Soon
            } else {
                MaintenanceUrgency::Ok
            }
        }
        _ => MaintenanceUrgency::Ok,
    };

    AllergenStatus {
        allergen_type: allergen,
        state,
        last_exposure_date,
        days_since_exposure,
        exposure_count,
        urgency,
        reaction_severity: record.and_then(|r| r.reaction_severity),
        reaction_notes: record.and_then(|r| r.reaction_notes.clone()),
    }
}

/// Status for every major allergen type
pub fn all_statuses(
    subject_id: &str,
    events: &[FeedingEvent],
    foods: &FoodCatalog,
    overrides: &OverrideStore,
    today: NaiveDate,
    window: MaintenanceWindow,
) -> Vec<AllergenStatus> {
    TOP_ALLERGENS
        .iter()
        .map(|&a| allergen_status(subject_id, a, events, foods, overrides, today, window))
        .collect()
}

/// Allergens due for re-exposure: urgency past `ok`, excluding any with a
/// recorded reaction.
pub fn maintenance_reminders(
    subject_id: &str,
    events: &[FeedingEvent],
    foods: &FoodCatalog,
    overrides: &OverrideStore,
    today: NaiveDate,
    window: MaintenanceWindow,
) -> Vec<AllergenStatus> {
    all_statuses(subject_id, events, foods, overrides, today, window)
        .into_iter()
        .filter(|s| s.urgency != MaintenanceUrgency::Ok && s.state != AllergenState::Reaction)
        .collect()
}

/// Summary counts across all major allergens
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllergenStats {
    pub introduced: usize,
    pub cleared: usize,
    pub reactions: usize,
    pub not_introduced: usize,
    pub needing_maintenance: usize,
    pub total: usize,
}

pub fn allergen_stats(statuses: &[AllergenStatus]) -> AllergenStats {
    AllergenStats {
        introduced: statuses
            .iter()
            .filter(|s| s.state == AllergenState::Introduced)
            .count(),
        cleared: statuses
            .iter()
            .filter(|s| s.state == AllergenState::Cleared)
            .count(),
        reactions: statuses
            .iter()
            .filter(|s| s.state == AllergenState::Reaction)
            .count(),
        not_introduced: statuses
            .iter()
            .filter(|s| s.state == AllergenState::NotIntroduced)
            .count(),
        needing_maintenance: statuses
            .iter()
            .filter(|s| s.urgency != MaintenanceUrgency::Ok)
            .count(),
        total: statuses.len(),
    }
}
