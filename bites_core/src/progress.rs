//! Progress aggregation across the badge catalog.
//!
//! Maps every badge through the evaluator for one subject and merges in
//! ledger state. Awards are sticky: once the ledger has an award, the
//! badge stays reported as earned even if later data would no longer
//! satisfy its criterion.

use crate::evaluator::{evaluate, EvalContext};
use crate::ledger::AwardLedger;
use crate::types::BadgeCatalog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress report for one badge
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub badge_id: String,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
    pub current: u32,
    pub target: u32,
    pub progress_pct: f64,
}

/// Evaluate every badge in catalog order for one subject.
pub fn badge_progress(
    catalog: &BadgeCatalog,
    ctx: &EvalContext<'_>,
    ledger: &AwardLedger,
    subject_id: &str,
) -> Vec<BadgeProgress> {
    catalog
        .badges
        .iter()
        .map(|badge| {
            let result = evaluate(&badge.criterion, ctx);
            let award = ledger.award_for(subject_id, &badge.id);

            BadgeProgress {
                badge_id: badge.id.clone(),
                earned: award.is_some() || result.earned,
                earned_at: award.map(|a| a.earned_at),
                current: result.current.min(result.target),
                target: result.target,
                progress_pct: result.progress_pct(),
            }
        })
        .collect()
}

/// Summary statistics over a progress report
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BadgeStats {
    pub earned_count: usize,
    pub total_count: usize,
    pub completion_pct: u32,
    /// First unearned badge with some progress, in catalog order
    pub next_badge_id: Option<String>,
}

pub fn badge_stats(progress: &[BadgeProgress]) -> BadgeStats {
    let earned_count = progress.iter().filter(|p| p.earned).count();
    let total_count = progress.len();
    let completion_pct = if total_count == 0 {
        0
    } else {
        ((earned_count as f64 / total_count as f64) * 100.0).round() as u32
    };
    let next_badge_id = progress
        .iter()
        .find(|p| !p.earned && p.progress_pct > 0.0)
        .map(|p| p.badge_id.clone());

    BadgeStats {
        earned_count,
        total_count,
        completion_pct,
        next_badge_id,
    }
}
