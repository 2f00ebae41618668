#![forbid(unsafe_code)]

//! Core domain model and business logic for the First Bites system.
//!
//! This crate provides:
//! - Domain types (foods, feeding events, badges, allergens)
//! - Catalog management
//! - Badge criteria evaluation and progress aggregation
//! - Award ledger and reconciler
//! - Streak and allergen maintenance tracking
//! - Persistence (journal, CSV, state files)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod journal;
pub mod csv_rollup;
pub mod statefile;
pub mod history;
pub mod snapshot;
pub mod evaluator;
pub mod progress;
pub mod ledger;
pub mod reconciler;
pub mod streak;
pub mod allergen;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_badge_catalog, get_default_food_catalog};
pub use config::Config;
pub use journal::{EventSink, JsonlSink};
pub use history::load_events;
pub use snapshot::{EventEdit, EventLog, NewEvent};
pub use evaluator::{evaluate, CriterionProgress, EvalContext};
pub use progress::{badge_progress, badge_stats, BadgeProgress, BadgeStats};
pub use ledger::AwardLedger;
pub use reconciler::{reconcile, Reconciliation};
pub use streak::compute_streak;
pub use allergen::{all_statuses, maintenance_reminders, MaintenanceWindow, OverrideStore};
