//! Award ledger: at-most-one award per (subject, badge).
//!
//! `record_award` is an idempotent no-op when an award already exists,
//! which is what makes concurrent recomputation triggers safe: the second
//! writer for the same pair observes the first writer's award and performs
//! no write.

use crate::types::Award;
use crate::{statefile, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Persisted collection of earned awards
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AwardLedger {
    pub awards: Vec<Award>,
}

impl AwardLedger {
    pub fn has_award(&self, subject_id: &str, badge_id: &str) -> bool {
        self.award_for(subject_id, badge_id).is_some()
    }

    pub fn award_for(&self, subject_id: &str, badge_id: &str) -> Option<&Award> {
        self.awards
            .iter()
            .find(|a| a.subject_id == subject_id && a.badge_id == badge_id)
    }

    pub fn awards_for_subject(&self, subject_id: &str) -> Vec<&Award> {
        self.awards
            .iter()
            .filter(|a| a.subject_id == subject_id)
            .collect()
    }

    /// Record an award. Returns `None` without writing if an award already
    /// exists for this (subject, badge) pair.
    pub fn record_award(
        &mut self,
        subject_id: &str,
        badge_id: &str,
        triggering_event_id: Option<Uuid>,
    ) -> Option<Award> {
        if self.has_award(subject_id, badge_id) {
            tracing::debug!(
                "Award for ({}, {}) already exists, skipping",
                subject_id,
                badge_id
            );
            return None;
        }

        let award = Award {
            id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            badge_id: badge_id.to_string(),
            earned_at: Utc::now(),
            triggering_event_id,
        };
        self.awards.push(award.clone());
        tracing::info!("Recorded award '{}' for subject {}", badge_id, subject_id);
        Some(award)
    }

    /// Load the ledger from a file, defaulting when absent or unreadable.
    pub fn load(path: &Path) -> Result<Self> {
        statefile::load(path)
    }

    /// Save the ledger atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        statefile::save(self, path)
    }

    /// Record an award against the on-disk ledger.
    ///
    /// Runs inside `statefile::update`, which holds an exclusive lock
    /// across the reload, the award check, and the save. A writer that
    /// lost a race for the same (subject, badge) pair reloads the winner's
    /// award and returns `None` without writing; winners for different
    /// pairs are serialized, so neither award is lost. A transient failure
    /// leaves the ledger untouched, so the next reconciliation pass retries
    /// the same candidate.
    pub fn record(
        path: &Path,
        subject_id: &str,
        badge_id: &str,
        triggering_event_id: Option<Uuid>,
    ) -> Result<Option<Award>> {
        let mut recorded = None;
        statefile::update::<AwardLedger, _>(path, |ledger| {
            recorded = ledger.record_award(subject_id, badge_id, triggering_event_id);
            Ok(())
        })?;
        Ok(recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_award_once() {
        let mut ledger = AwardLedger::default();

        let first = ledger.record_award("a", "first_bite", None);
        assert!(first.is_some());
        assert!(ledger.has_award("a", "first_bite"));

        // Second attempt is a no-op, not an error
        let second = ledger.record_award("a", "first_bite", None);
        assert!(second.is_none());
        assert_eq!(ledger.awards.len(), 1);
    }

    #[test]
    fn test_awards_keyed_per_subject() {
        let mut ledger = AwardLedger::default();
        ledger.record_award("a", "first_bite", None);

        assert!(!ledger.has_award("b", "first_bite"));
        assert!(ledger.record_award("b", "first_bite", None).is_some());
        assert_eq!(ledger.awards.len(), 2);
    }

    #[test]
    fn test_award_stickiness_survives_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("awards.json");

        let award =
            AwardLedger::record(&path, "a", "week_one_wonder", Some(Uuid::new_v4())).unwrap();
        assert!(award.is_some());

        let loaded = AwardLedger::load(&path).unwrap();
        assert!(loaded.has_award("a", "week_one_wonder"));
        assert!(loaded
            .award_for("a", "week_one_wonder")
            .unwrap()
            .triggering_event_id
            .is_some());
    }

    #[test]
    fn test_record_against_disk_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("awards.json");

        // N writers for the same pair produce exactly one award
        let mut created = 0;
        for _ in 0..5 {
            if AwardLedger::record(&path, "a", "first_bite", None)
                .unwrap()
                .is_some()
            {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        let loaded = AwardLedger::load(&path).unwrap();
        assert_eq!(loaded.awards.len(), 1);
    }

    #[test]
    fn test_concurrent_recorders_same_pair_award_once() {
        use std::sync::{Arc, Barrier};

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("awards.json");
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    AwardLedger::record(&path, "a", "first_bite", None).unwrap()
                })
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(Option::is_some)
            .count();

        // Exactly one recorder reports a fresh award, the rest no-op
        assert_eq!(created, 1);
        let loaded = AwardLedger::load(&path).unwrap();
        assert_eq!(loaded.awards.len(), 1);
    }

    #[test]
    fn test_concurrent_recorders_different_badges_keep_both() {
        use std::sync::{Arc, Barrier};

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("awards.json");
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["first_bite", "week_one_wonder"]
            .into_iter()
            .map(|badge| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    AwardLedger::record(&path, "a", badge, None).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_some());
        }

        let loaded = AwardLedger::load(&path).unwrap();
        assert!(loaded.has_award("a", "first_bite"));
        assert!(loaded.has_award("a", "week_one_wonder"));
    }

    #[test]
    fn test_awards_for_subject() {
        let mut ledger = AwardLedger::default();
        ledger.record_award("a", "first_bite", None);
        ledger.record_award("a", "week_one_wonder", None);
        ledger.record_award("b", "first_bite", None);

        assert_eq!(ledger.awards_for_subject("a").len(), 2);
        assert_eq!(ledger.awards_for_subject("b").len(), 1);
    }
}
