use bites_core::*;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "firstbites")]
#[command(about = "Baby food introduction tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a feeding event (and check for newly earned badges)
    Log {
        /// Subject (baby) to log for; repeat for twins trying the same food
        #[arg(long = "subject", required = true)]
        subjects: Vec<String>,

        /// Catalog food id
        #[arg(long, conflicts_with = "custom")]
        food: Option<String>,

        /// Custom food name (for foods not in the catalog)
        #[arg(long, conflicts_with = "food")]
        custom: Option<String>,

        /// Response: loved, meh, disliked, gagged, refused, possible_reaction
        #[arg(long, default_value = "meh")]
        response: String,

        /// Serving method: stick, mashed, bite_sized, preloaded_spoon, whole, other
        #[arg(long = "method")]
        methods: Vec<String>,

        /// Meal slot: breakfast, lunch, dinner, snack
        #[arg(long)]
        meal: Option<String>,

        /// Logged date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show badge progress for a subject
    Progress {
        #[arg(long)]
        subject: String,
    },

    /// Show the logging streak for a subject
    Streak {
        #[arg(long)]
        subject: String,
    },

    /// Show allergen introduction status for a subject
    Allergens {
        #[arg(long)]
        subject: String,
    },

    /// Show allergens due for re-exposure
    Reminders {
        #[arg(long)]
        subject: String,
    },

    /// Record an allergic reaction
    Reaction {
        #[arg(long)]
        subject: String,

        /// Allergen type: peanut, tree_nut, egg, dairy, wheat, soy, fish, shellfish, sesame
        #[arg(long)]
        allergen: String,

        /// Severity: mild, moderate, severe
        #[arg(long)]
        severity: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark an allergen as cleared (tolerated)
    Cleared {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        allergen: String,
    },

    /// Remove a reaction flag (false alarm)
    ClearReaction {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        allergen: String,
    },

    /// Roll up journal events to CSV
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

fn main() -> Result<()> {
    bites_core::logging::init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    match cli.command {
        Commands::Log {
            subjects,
            food,
            custom,
            response,
            methods,
            meal,
            date,
            notes,
        } => cmd_log(
            &config, subjects, food, custom, response, methods, meal, date, notes,
        ),
        Commands::Progress { subject } => cmd_progress(&config, &subject),
        Commands::Streak { subject } => cmd_streak(&config, &subject),
        Commands::Allergens { subject } => cmd_allergens(&config, &subject),
        Commands::Reminders { subject } => cmd_reminders(&config, &subject),
        Commands::Reaction {
            subject,
            allergen,
            severity,
            notes,
        } => cmd_reaction(&config, &subject, &allergen, &severity, notes),
        Commands::Cleared { subject, allergen } => cmd_cleared(&config, &subject, &allergen),
        Commands::ClearReaction { subject, allergen } => {
            cmd_clear_reaction(&config, &subject, &allergen)
        }
        Commands::Rollup { cleanup } => cmd_rollup(&config, cleanup),
    }
}

fn parse_allergen(s: &str) -> Result<AllergenType> {
    AllergenType::parse(&s.to_lowercase())
        .ok_or_else(|| Error::Other(format!("Unknown allergen type: {}", s)))
}

fn validated_catalogs() -> Result<(&'static FoodCatalog, &'static BadgeCatalog)> {
    let foods = get_default_food_catalog();
    let badges = get_default_badge_catalog();

    let mut errors = foods.validate();
    errors.extend(badges.validate());
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    Ok((foods, badges))
}

fn load_snapshot(config: &Config) -> Result<EventLog> {
    let events = load_events(&config.journal_path(), &config.csv_path())?;
    Ok(EventLog::new(events))
}

#[allow(clippy::too_many_arguments)]
fn cmd_log(
    config: &Config,
    subjects: Vec<String>,
    food: Option<String>,
    custom: Option<String>,
    response: String,
    methods: Vec<String>,
    meal: Option<String>,
    date: Option<NaiveDate>,
    notes: Option<String>,
) -> Result<()> {
    let (foods, badges) = validated_catalogs()?;

    let response = Response::parse(&response.to_lowercase())
        .ok_or_else(|| Error::Other(format!("Unknown response: {}", response)))?;

    let serving_methods: Vec<ServingMethod> = methods
        .iter()
        .map(|m| {
            ServingMethod::parse(&m.to_lowercase())
                .ok_or_else(|| Error::Other(format!("Unknown serving method: {}", m)))
        })
        .collect::<Result<_>>()?;

    let meal_slot = meal
        .map(|m| {
            MealSlot::parse(&m.to_lowercase())
                .ok_or_else(|| Error::Other(format!("Unknown meal slot: {}", m)))
        })
        .transpose()?;

    if let Some(ref id) = food {
        if foods.get(id).is_none() {
            eprintln!("Note: '{}' is not in the food catalog; allergen and nutrient badges will not count it.", id);
        }
    }

    let snapshot = load_snapshot(config)?;

    // All events are created against the same pre-log snapshot so twins
    // trying a food together are both firsts
    let mut new_events = Vec::new();
    for subject in &subjects {
        let event = snapshot.create_event(NewEvent {
            subject_id: subject.clone(),
            food_id: food.clone(),
            custom_food_name: custom.clone(),
            logged_date: date,
            meal_slot,
            serving_methods: serving_methods.clone(),
            response,
            notes: notes.clone(),
        })?;
        new_events.push(event);
    }

    let mut sink = JsonlSink::new(config.journal_path());
    for event in &new_events {
        sink.append(event)?;
    }

    let food_label = new_events[0]
        .food_id
        .clone()
        .or_else(|| new_events[0].custom_food_name.clone())
        .unwrap_or_default();
    for event in &new_events {
        let first = if event.is_first_time {
            " (first time!)"
        } else {
            ""
        };
        println!("✓ Logged {} for {}{}", food_label, event.subject_id, first);
    }

    // Recompute derived state from a fresh snapshot including the new events
    let mut all_events = snapshot.events().to_vec();
    all_events.extend(new_events.iter().cloned());
    let snapshot = EventLog::new(all_events);
    let today = chrono::Utc::now().date_naive();

    let ledger_path = config.ledger_path();
    for event in &new_events {
        let subject_events = snapshot.subject_events(&event.subject_id);
        let sync_events = snapshot.subject_sync_events(&event.subject_id);
        let ctx = EvalContext {
            events: &subject_events,
            sync_events: &sync_events,
            foods,
            today,
        };

        let ledger = AwardLedger::load(&ledger_path)?;
        let progress = badge_progress(badges, &ctx, &ledger, &event.subject_id);

        if let Some(won) = reconcile(
            &ledger_path,
            badges,
            &progress,
            &ledger,
            &event.subject_id,
            Some(event.id),
        )? {
            println!();
            println!("  {} {} earned: {}", won.badge.emoji, event.subject_id, won.badge.name);
            println!("  {}", won.badge.celebration_message);
        }
    }

    Ok(())
}

fn cmd_progress(config: &Config, subject: &str) -> Result<()> {
    let (foods, badges) = validated_catalogs()?;
    let snapshot = load_snapshot(config)?;
    let sync_events = snapshot.subject_sync_events(subject);
    let subject_events = snapshot.subject_events(subject);
    let ctx = EvalContext {
        events: &subject_events,
        sync_events: &sync_events,
        foods,
        today: chrono::Utc::now().date_naive(),
    };

    let ledger = AwardLedger::load(&config.ledger_path())?;
    let progress = badge_progress(badges, &ctx, &ledger, subject);
    let stats = badge_stats(&progress);

    println!("Badge progress for {}:", subject);
    println!();
    for p in &progress {
        let badge = match badges.get(&p.badge_id) {
            Some(b) => b,
            None => continue,
        };
        let marker = if p.earned { "✓" } else { " " };
        println!(
            "  [{}] {} {} - {}/{} ({:.0}%)",
            marker, badge.emoji, badge.name, p.current, p.target, p.progress_pct
        );
    }
    println!();
    println!(
        "  {}/{} badges earned ({}%)",
        stats.earned_count, stats.total_count, stats.completion_pct
    );
    if let Some(ref next_id) = stats.next_badge_id {
        if let Some(next) = badges.get(next_id) {
            println!("  Next up: {} {}", next.emoji, next.name);
        }
    }

    Ok(())
}

fn cmd_streak(config: &Config, subject: &str) -> Result<()> {
    let snapshot = load_snapshot(config)?;
    let dates = snapshot.subject_dates(subject);
    let streak = compute_streak(&dates, chrono::Utc::now().date_naive());

    println!("Streak for {}:", subject);
    println!("  Current: {} days", streak.current);
    println!("  Longest: {} days", streak.longest);
    if streak.is_active_today {
        println!("  Logged today ✓");
    } else if streak.current > 0 {
        println!("  Log today to keep the streak going!");
    }

    Ok(())
}

fn cmd_allergens(config: &Config, subject: &str) -> Result<()> {
    let (foods, _) = validated_catalogs()?;
    let snapshot = load_snapshot(config)?;
    let subject_events = snapshot.subject_events(subject);
    let overrides = OverrideStore::load(&config.overrides_path())?;

    let statuses = all_statuses(
        subject,
        &subject_events,
        foods,
        &overrides,
        chrono::Utc::now().date_naive(),
        config.maintenance.window(),
    );

    println!("Allergen status for {}:", subject);
    println!();
    for s in &statuses {
        let state = match s.state {
            AllergenState::NotIntroduced => "not introduced".to_string(),
            AllergenState::Introduced => format!("introduced ({} exposures)", s.exposure_count),
            AllergenState::Cleared => "cleared".to_string(),
            AllergenState::Reaction => match s.reaction_severity {
                Some(sev) => format!("REACTION ({:?})", sev).to_lowercase(),
                None => "reaction".to_string(),
            },
        };
        let urgency = match s.urgency {
            MaintenanceUrgency::Ok => "",
            MaintenanceUrgency::Soon => "  ⚠ re-expose soon",
            MaintenanceUrgency::Overdue => "  ⚠ overdue",
        };
        println!("  {:<10} {}{}", s.allergen_type.as_str(), state, urgency);
    }

    let stats = bites_core::allergen::allergen_stats(&statuses);
    println!();
    println!(
        "  {} of {} major allergens introduced, {} cleared",
        stats.introduced + stats.cleared + stats.reactions,
        stats.total,
        stats.cleared
    );

    Ok(())
}

fn cmd_reminders(config: &Config, subject: &str) -> Result<()> {
    let (foods, _) = validated_catalogs()?;
    let snapshot = load_snapshot(config)?;
    let subject_events = snapshot.subject_events(subject);
    let overrides = OverrideStore::load(&config.overrides_path())?;

    let reminders = maintenance_reminders(
        subject,
        &subject_events,
        foods,
        &overrides,
        chrono::Utc::now().date_naive(),
        config.maintenance.window(),
    );

    if reminders.is_empty() {
        println!("No allergens due for re-exposure. Nice work!");
        return Ok(());
    }

    println!("Allergens due for re-exposure for {}:", subject);
    for r in &reminders {
        let days = r.days_since_exposure.unwrap_or(0);
        let urgency = match r.urgency {
            MaintenanceUrgency::Overdue => "overdue",
            _ => "due soon",
        };
        println!(
            "  {:<10} last served {} days ago ({})",
            r.allergen_type.as_str(),
            days,
            urgency
        );
    }

    Ok(())
}

fn cmd_reaction(
    config: &Config,
    subject: &str,
    allergen: &str,
    severity: &str,
    notes: Option<String>,
) -> Result<()> {
    let allergen = parse_allergen(allergen)?;
    let severity = ReactionSeverity::parse(&severity.to_lowercase())
        .ok_or_else(|| Error::Other(format!("Unknown severity: {}", severity)))?;

    OverrideStore::update(&config.overrides_path(), |store| {
        store.record_reaction(subject, allergen, severity, notes);
        Ok(())
    })?;

    println!(
        "✓ Recorded {:?} reaction to {} for {}",
        severity,
        allergen.as_str(),
        subject
    );
    println!("  Maintenance reminders for this allergen are paused.");

    Ok(())
}

fn cmd_cleared(config: &Config, subject: &str, allergen: &str) -> Result<()> {
    let allergen = parse_allergen(allergen)?;

    OverrideStore::update(&config.overrides_path(), |store| {
        store.mark_cleared(subject, allergen);
        Ok(())
    })?;

    println!("✓ Marked {} as cleared for {}", allergen.as_str(), subject);

    Ok(())
}

fn cmd_clear_reaction(config: &Config, subject: &str, allergen: &str) -> Result<()> {
    let allergen = parse_allergen(allergen)?;

    OverrideStore::update(&config.overrides_path(), |store| {
        store.clear_reaction(subject, allergen);
        Ok(())
    })?;

    println!(
        "✓ Removed reaction flag for {} for {}",
        allergen.as_str(),
        subject
    );

    Ok(())
}

fn cmd_rollup(config: &Config, cleanup: bool) -> Result<()> {
    let journal_path = config.journal_path();
    let csv_path = config.csv_path();

    if !journal_path.exists() {
        println!("No journal file found - nothing to roll up.");
        return Ok(());
    }

    let count = bites_core::csv_rollup::journal_to_csv_and_archive(&journal_path, &csv_path)?;

    println!("✓ Rolled up {} events to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let journal_dir = journal_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data.data_dir.clone());
        let cleaned = bites_core::csv_rollup::cleanup_processed_journals(&journal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}
