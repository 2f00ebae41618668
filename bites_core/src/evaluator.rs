//! Criteria evaluator: one pure function per badge criterion kind.
//!
//! Every evaluator scans an immutable per-subject event slice (plus the
//! precomputed cross-subject sync events for the two twin criteria) and
//! returns `{earned, current, target}`. Events whose food id is missing
//! from the catalog still count for catalog-independent criteria
//! (`total_logs` and friends) but are silently excluded from
//! category/nutrient/allergen ones.

use crate::types::*;
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};

/// Evaluator output for one criterion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CriterionProgress {
    pub earned: bool,
    pub current: u32,
    pub target: u32,
}

impl CriterionProgress {
    fn counted(current: u32, target: u32) -> Self {
        Self {
            earned: current >= target,
            current,
            target,
        }
    }

    fn boolean(earned: bool) -> Self {
        Self {
            earned,
            current: if earned { 1 } else { 0 },
            target: 1,
        }
    }

    /// Progress percentage, clamped to [0, 100]
    pub fn progress_pct(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        (self.current as f64 / self.target as f64).min(1.0) * 100.0
    }
}

/// Inputs shared by all evaluators for one subject
pub struct EvalContext<'a> {
    /// The subject's events, chronological (logged date, then creation time)
    pub events: &'a [FeedingEvent],
    /// Cross-subject sync events involving this subject, precomputed from
    /// the full snapshot
    pub sync_events: &'a [SyncEvent],
    pub foods: &'a FoodCatalog,
    pub today: NaiveDate,
}

impl<'a> EvalContext<'a> {
    /// Catalog lookup for an event's food reference, if any
    fn food_for(&self, event: &FeedingEvent) -> Option<&'a Food> {
        event.food_id.as_deref().and_then(|id| self.foods.get(id))
    }
}

/// Evaluate one criterion against the context
pub fn evaluate(criterion: &CriterionKind, ctx: &EvalContext<'_>) -> CriterionProgress {
    match criterion {
        CriterionKind::TotalLogs { target } => {
            CriterionProgress::counted(ctx.events.len() as u32, *target)
        }

        CriterionKind::UniqueDaysLogged { target } => {
            let days: HashSet<NaiveDate> = ctx.events.iter().map(|e| e.logged_date).collect();
            CriterionProgress::counted(days.len() as u32, *target)
        }

        CriterionKind::ColorsIn7Days { target } => {
            let cutoff = ctx.today - Duration::days(7);
            let colors: HashSet<&str> = ctx
                .events
                .iter()
                .filter(|e| e.logged_date >= cutoff)
                .filter_map(|e| ctx.food_for(e))
                .filter_map(|f| f.color.as_deref())
                .collect();
            CriterionProgress::counted(colors.len() as u32, *target)
        }

        CriterionKind::ConsecutiveDaysWithTag { levels, target } => {
            let dates: HashSet<NaiveDate> = ctx
                .events
                .iter()
                .filter(|e| {
                    ctx.food_for(e)
                        .map(|f| levels.contains(&f.iron_content))
                        .unwrap_or(false)
                })
                .map(|e| e.logged_date)
                .collect();
            CriterionProgress::counted(longest_consecutive_run(&dates), *target)
        }

        CriterionKind::AllergensIntroduced { target } => {
            let types: HashSet<AllergenType> = ctx
                .events
                .iter()
                .filter_map(|e| ctx.food_for(e))
                .filter(|f| f.is_allergen)
                .filter_map(|f| f.allergen_type)
                .collect();
            CriterionProgress::counted(types.len() as u32, *target)
        }

        CriterionKind::SameFirstFoodSameDay => {
            CriterionProgress::boolean(!ctx.sync_events.is_empty())
        }

        CriterionKind::SameFirstFoodSameDayCount { target } => {
            CriterionProgress::counted(ctx.sync_events.len() as u32, *target)
        }

        CriterionKind::UniqueFoodsInCategory { category, target } => {
            let foods: HashSet<&str> = ctx
                .events
                .iter()
                .filter_map(|e| ctx.food_for(e))
                .filter(|f| f.category == *category)
                .map(|f| f.id.as_str())
                .collect();
            CriterionProgress::counted(foods.len() as u32, *target)
        }

        CriterionKind::UniqueFoods { target } => {
            let keys: HashSet<String> = ctx.events.iter().filter_map(|e| e.food_key()).collect();
            CriterionProgress::counted(keys.len() as u32, *target)
        }

        CriterionKind::UniqueCulturalTags { target } => {
            let tags: HashSet<&str> = ctx
                .events
                .iter()
                .filter_map(|e| ctx.food_for(e))
                .flat_map(|f| f.cultural_tags.iter().map(String::as_str))
                .collect();
            CriterionProgress::counted(tags.len() as u32, *target)
        }

        CriterionKind::ResponseCount { response, target } => {
            let count = ctx.events.iter().filter(|e| e.response == *response).count();
            CriterionProgress::counted(count as u32, *target)
        }

        CriterionKind::FoodRetrySuccess => {
            CriterionProgress::boolean(has_retry_success(ctx.events))
        }

        CriterionKind::FirstServingMethod { method } => {
            let found = ctx
                .events
                .iter()
                .any(|e| e.serving_methods.contains(method));
            CriterionProgress::boolean(found)
        }

        CriterionKind::FoodsWithTag { tag, target } => {
            let foods: HashSet<&str> = ctx
                .events
                .iter()
                .filter_map(|e| ctx.food_for(e))
                .filter(|f| match tag {
                    NutrientTag::Omega3Rich => f.omega_3_rich,
                    NutrientTag::VitaminCRich => f.vitamin_c_rich,
                })
                .map(|f| f.id.as_str())
                .collect();
            CriterionProgress::counted(foods.len() as u32, *target)
        }

        CriterionKind::AllergenTypeVariety {
            allergen_types,
            target,
        } => {
            let foods: HashSet<&str> = ctx
                .events
                .iter()
                .filter_map(|e| ctx.food_for(e))
                .filter(|f| {
                    f.is_allergen
                        && f.allergen_type
                            .map(|t| allergen_types.contains(&t))
                            .unwrap_or(false)
                })
                .map(|f| f.id.as_str())
                .collect();
            CriterionProgress::counted(foods.len() as u32, *target)
        }

        CriterionKind::UniqueServingMethods { target } => {
            let mut methods: HashSet<ServingMethod> = ctx
                .events
                .iter()
                .flat_map(|e| e.serving_methods.iter().copied())
                .collect();
            // The catch-all doesn't count as a distinct texture
            methods.remove(&ServingMethod::Other);
            CriterionProgress::counted(methods.len() as u32, *target)
        }

        CriterionKind::SameFoodLovedCount { target } => {
            let mut loved: HashMap<String, u32> = HashMap::new();
            for event in ctx.events.iter().filter(|e| e.response == Response::Loved) {
                if let Some(key) = event.food_key() {
                    *loved.entry(key).or_insert(0) += 1;
                }
            }
            let max = loved.values().copied().max().unwrap_or(0);
            CriterionProgress::counted(max, *target)
        }

        CriterionKind::DaysSinceFirstLog { target } => {
            let current = ctx
                .events
                .iter()
                .map(|e| e.logged_date)
                .min()
                .map(|first| (ctx.today - first).num_days().max(0) as u32)
                .unwrap_or(0);
            CriterionProgress::counted(current, *target)
        }

        // Catalogs may carry criterion types newer than this code; fail to
        // the non-earned default rather than erroring.
        CriterionKind::Unknown => {
            tracing::warn!("Unknown criterion type, returning default progress");
            CriterionProgress {
                earned: false,
                current: 0,
                target: 1,
            }
        }
    }
}

/// Length of the longest run of dates where each is exactly one calendar
/// day after the previous. A gap of two or more days resets the run.
fn longest_consecutive_run(dates: &HashSet<NaiveDate>) -> u32 {
    let mut sorted: Vec<NaiveDate> = dates.iter().copied().collect();
    sorted.sort();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for date in sorted {
        run = match prev {
            Some(p) if (date - p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }

    longest
}

/// Chronological scan for a food that was refused or disliked and later
/// logged as loved or meh. Events must already be in log order.
fn has_retry_success(events: &[FeedingEvent]) -> bool {
    let mut responses: HashMap<String, Vec<Response>> = HashMap::new();

    for event in events {
        let Some(key) = event.food_key() else {
            continue;
        };
        let seen = responses.entry(key).or_default();

        let was_refused = seen
            .iter()
            .any(|r| matches!(r, Response::Refused | Response::Disliked));
        let now_better = matches!(event.response, Response::Loved | Response::Meh);

        if was_refused && now_better {
            return true;
        }
        seen.push(event.response);
    }

    false
}
