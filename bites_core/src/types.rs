//! Core domain types for the First Bites engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Feeding events and their enums (responses, serving methods, meal slots)
//! - Food catalog entries and allergen classification
//! - Badges and their criterion kinds
//! - Awards, allergen overrides, and derived status types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Feeding Event Types
// ============================================================================

/// How the subject responded to a food
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Loved,
    Meh,
    Disliked,
    Gagged,
    Refused,
    PossibleReaction,
}

impl Response {
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Loved => "loved",
            Response::Meh => "meh",
            Response::Disliked => "disliked",
            Response::Gagged => "gagged",
            Response::Refused => "refused",
            Response::PossibleReaction => "possible_reaction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "loved" => Some(Response::Loved),
            "meh" => Some(Response::Meh),
            "disliked" => Some(Response::Disliked),
            "gagged" => Some(Response::Gagged),
            "refused" => Some(Response::Refused),
            "possible_reaction" => Some(Response::PossibleReaction),
            _ => None,
        }
    }
}

/// How a food was served
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServingMethod {
    Stick,
    Mashed,
    BiteSized,
    PreloadedSpoon,
    Whole,
    Other,
}

impl ServingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServingMethod::Stick => "stick",
            ServingMethod::Mashed => "mashed",
            ServingMethod::BiteSized => "bite_sized",
            ServingMethod::PreloadedSpoon => "preloaded_spoon",
            ServingMethod::Whole => "whole",
            ServingMethod::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stick" => Some(ServingMethod::Stick),
            "mashed" => Some(ServingMethod::Mashed),
            "bite_sized" => Some(ServingMethod::BiteSized),
            "preloaded_spoon" => Some(ServingMethod::PreloadedSpoon),
            "whole" => Some(ServingMethod::Whole),
            "other" => Some(ServingMethod::Other),
            _ => None,
        }
    }
}

/// Which meal the event belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "breakfast" => Some(MealSlot::Breakfast),
            "lunch" => Some(MealSlot::Lunch),
            "dinner" => Some(MealSlot::Dinner),
            "snack" => Some(MealSlot::Snack),
            _ => None,
        }
    }
}

/// One immutable feeding-log entry.
///
/// `is_first_time` is computed against the log snapshot when the event is
/// created and frozen; it is never recomputed when earlier events are
/// edited or deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedingEvent {
    pub id: Uuid,
    pub subject_id: String,
    pub food_id: Option<String>,
    pub custom_food_name: Option<String>,
    pub logged_date: NaiveDate,
    pub meal_slot: Option<MealSlot>,
    pub serving_methods: Vec<ServingMethod>,
    pub response: Response,
    pub is_first_time: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedingEvent {
    /// Canonical key identifying the food behind this event.
    ///
    /// Catalog foods key by id; custom foods key by lower-cased name so
    /// "Mango" and "mango" dedup to the same food.
    pub fn food_key(&self) -> Option<String> {
        if let Some(ref id) = self.food_id {
            Some(id.clone())
        } else {
            self.custom_food_name
                .as_ref()
                .map(|name| format!("custom:{}", name.to_lowercase()))
        }
    }
}

// ============================================================================
// Food Catalog Types
// ============================================================================

/// Food category in the static catalog
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FoodCategory {
    Fruit,
    Vegetable,
    Protein,
    Grain,
    Dairy,
    Legume,
    Other,
}

/// The nine major allergen types
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AllergenType {
    Peanut,
    TreeNut,
    Egg,
    Dairy,
    Wheat,
    Soy,
    Fish,
    Shellfish,
    Sesame,
}

impl AllergenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllergenType::Peanut => "peanut",
            AllergenType::TreeNut => "tree_nut",
            AllergenType::Egg => "egg",
            AllergenType::Dairy => "dairy",
            AllergenType::Wheat => "wheat",
            AllergenType::Soy => "soy",
            AllergenType::Fish => "fish",
            AllergenType::Shellfish => "shellfish",
            AllergenType::Sesame => "sesame",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "peanut" => Some(AllergenType::Peanut),
            "tree_nut" => Some(AllergenType::TreeNut),
            "egg" => Some(AllergenType::Egg),
            "dairy" => Some(AllergenType::Dairy),
            "wheat" => Some(AllergenType::Wheat),
            "soy" => Some(AllergenType::Soy),
            "fish" => Some(AllergenType::Fish),
            "shellfish" => Some(AllergenType::Shellfish),
            "sesame" => Some(AllergenType::Sesame),
            _ => None,
        }
    }
}

/// All nine major allergens, in introduction-guide order
pub const TOP_ALLERGENS: [AllergenType; 9] = [
    AllergenType::Peanut,
    AllergenType::TreeNut,
    AllergenType::Egg,
    AllergenType::Dairy,
    AllergenType::Wheat,
    AllergenType::Soy,
    AllergenType::Fish,
    AllergenType::Shellfish,
    AllergenType::Sesame,
];

/// Iron content classification for catalog foods
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IronContent {
    High,
    Medium,
    Low,
    None,
}

/// Nutrient flags a badge criterion can key on
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NutrientTag {
    Omega3Rich,
    VitaminCRich,
}

/// A food definition from the static catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Food {
    pub id: String,
    pub name: String,
    pub category: FoodCategory,
    pub is_allergen: bool,
    pub allergen_type: Option<AllergenType>,
    pub iron_content: IronContent,
    pub color: Option<String>,
    pub cultural_tags: Vec<String>,
    pub omega_3_rich: bool,
    pub vitamin_c_rich: bool,
}

// ============================================================================
// Badge and Criterion Types
// ============================================================================

/// Declarative achievement rule selecting one evaluator.
///
/// A closed tagged enum so the evaluator match is exhaustive and checked at
/// compile time. Criterion catalogs may evolve ahead of this code, so an
/// unrecognized tag deserializes to `Unknown`, which evaluates to the safe
/// non-earned default instead of erroring.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CriterionKind {
    /// Count of all events for the subject
    TotalLogs { target: u32 },
    /// Distinct logged dates
    UniqueDaysLogged { target: u32 },
    /// Distinct food colors eaten within the trailing 7-day window
    ColorsIn7Days { target: u32 },
    /// Longest run of consecutive days with a food at one of the given
    /// iron levels
    ConsecutiveDaysWithTag {
        levels: Vec<IronContent>,
        target: u32,
    },
    /// Distinct allergen types introduced
    AllergensIntroduced { target: u32 },
    /// Two subjects tried the same new food on the same day (boolean)
    SameFirstFoodSameDay,
    /// Number of such sync events
    SameFirstFoodSameDayCount { target: u32 },
    /// Distinct catalog foods within one category
    UniqueFoodsInCategory {
        category: FoodCategory,
        target: u32,
    },
    /// Distinct foods overall (catalog ids plus case-folded custom names)
    UniqueFoods { target: u32 },
    /// Distinct cultural tags across all referenced foods
    UniqueCulturalTags { target: u32 },
    /// Events with a specific response
    ResponseCount { response: Response, target: u32 },
    /// A refused/disliked food later logged as loved/meh (boolean)
    FoodRetrySuccess,
    /// Any event served with the given method (boolean)
    FirstServingMethod { method: ServingMethod },
    /// Distinct foods carrying a nutrient flag
    FoodsWithTag { tag: NutrientTag, target: u32 },
    /// Distinct foods whose allergen type is in the given list
    AllergenTypeVariety {
        allergen_types: Vec<AllergenType>,
        target: u32,
    },
    /// Distinct serving methods used, excluding the catch-all `other`
    UniqueServingMethods { target: u32 },
    /// Max count of `loved` responses for any single food
    SameFoodLovedCount { target: u32 },
    /// Calendar days elapsed since the earliest logged date
    DaysSinceFirstLog { target: u32 },
    /// Unrecognized criterion tag from a newer catalog
    #[serde(other)]
    Unknown,
}

impl CriterionKind {
    /// The numeric target for this criterion (1 for boolean criteria)
    pub fn target(&self) -> u32 {
        match self {
            CriterionKind::TotalLogs { target }
            | CriterionKind::UniqueDaysLogged { target }
            | CriterionKind::ColorsIn7Days { target }
            | CriterionKind::ConsecutiveDaysWithTag { target, .. }
            | CriterionKind::AllergensIntroduced { target }
            | CriterionKind::SameFirstFoodSameDayCount { target }
            | CriterionKind::UniqueFoodsInCategory { target, .. }
            | CriterionKind::UniqueFoods { target }
            | CriterionKind::UniqueCulturalTags { target }
            | CriterionKind::ResponseCount { target, .. }
            | CriterionKind::FoodsWithTag { target, .. }
            | CriterionKind::AllergenTypeVariety { target, .. }
            | CriterionKind::UniqueServingMethods { target }
            | CriterionKind::SameFoodLovedCount { target }
            | CriterionKind::DaysSinceFirstLog { target } => *target,
            CriterionKind::SameFirstFoodSameDay
            | CriterionKind::FoodRetrySuccess
            | CriterionKind::FirstServingMethod { .. }
            | CriterionKind::Unknown => 1,
        }
    }
}

/// A badge definition: display metadata plus its criterion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub celebration_message: String,
    pub criterion: CriterionKind,
}

/// A persisted record that a subject earned a badge.
///
/// At most one Award exists per (subject, badge) pair; the ledger enforces
/// this regardless of how many times progress is recomputed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Award {
    pub id: Uuid,
    pub subject_id: String,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
    pub triggering_event_id: Option<Uuid>,
}

// ============================================================================
// Allergen Tracking Types
// ============================================================================

/// Severity of a recorded allergic reaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReactionSeverity {
    Mild,
    Moderate,
    Severe,
}

impl ReactionSeverity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mild" => Some(ReactionSeverity::Mild),
            "moderate" => Some(ReactionSeverity::Moderate),
            "severe" => Some(ReactionSeverity::Severe),
            _ => None,
        }
    }
}

/// Explicit per-(subject, allergen) record layered over exposure history.
///
/// `had_reaction` and `is_cleared` are mutually exclusive; setting one
/// clears the other.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllergenOverride {
    pub id: Uuid,
    pub subject_id: String,
    pub allergen_type: AllergenType,
    pub had_reaction: bool,
    pub reaction_severity: Option<ReactionSeverity>,
    pub reaction_notes: Option<String>,
    pub is_cleared: bool,
}

/// Allergen state derived from exposures and the override record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllergenState {
    NotIntroduced,
    Introduced,
    Cleared,
    Reaction,
}

/// How urgently the allergen needs re-exposure
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceUrgency {
    Ok,
    Soon,
    Overdue,
}

/// Derived allergen status for one (subject, allergen type).
///
/// Never persisted; recomputed from the event log and override store on
/// every read.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllergenStatus {
    pub allergen_type: AllergenType,
    pub state: AllergenState,
    pub last_exposure_date: Option<NaiveDate>,
    pub days_since_exposure: Option<i64>,
    pub exposure_count: u32,
    pub urgency: MaintenanceUrgency,
    pub reaction_severity: Option<ReactionSeverity>,
    pub reaction_notes: Option<String>,
}

// ============================================================================
// Derived Report Types
// ============================================================================

/// Day-based streak statistics for one subject
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreakData {
    pub current: u32,
    pub longest: u32,
    pub last_active_date: Option<NaiveDate>,
    pub is_active_today: bool,
}

/// Two or more subjects logging the same food for the first time on the
/// same calendar date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SyncEvent {
    pub date: NaiveDate,
    pub food_id: String,
    pub subject_ids: Vec<String>,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// The static food reference catalog
#[derive(Clone, Debug)]
pub struct FoodCatalog {
    pub foods: HashMap<String, Food>,
}

impl FoodCatalog {
    pub fn get(&self, food_id: &str) -> Option<&Food> {
        self.foods.get(food_id)
    }
}

/// The badge catalog. Order matters: the reconciler awards the first
/// newly-eligible badge in catalog order.
#[derive(Clone, Debug)]
pub struct BadgeCatalog {
    pub badges: Vec<Badge>,
}
