//! The work behind each subcommand, kept apart from argument parsing so it
//! can be driven from tests.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use bizstruct_core::{Comparator, TaxRules, sanitize_inputs, validate_inputs};
use bizstruct_data::{ProfileLoader, RateTableLoader};
use tracing::{debug, info};

use crate::config::{load_profile, load_rules_file};
use crate::render::{BATCH_HEADER, BatchLine, ComparisonReport, RulesReport, ValidationReport};

/// Builds the active rules: YA2025, then the TOML overrides, then CSV rate
/// tables.
pub fn load_rules(
    rules_file: Option<&Path>,
    rate_tables: Option<&Path>,
) -> Result<TaxRules> {
    let mut rules = match rules_file {
        Some(path) => load_rules_file(path)
            .with_context(|| format!("Failed to load rules: {}", path.display()))?,
        None => TaxRules::ya2025(),
    };

    if let Some(path) = rate_tables {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let tables = RateTableLoader::load(file, &mut rules)
            .with_context(|| format!("Failed to load rate tables: {}", path.display()))?;
        info!(path = %path.display(), tables = tables.len(), "rate tables applied");
    }

    Ok(rules)
}

/// Compares one TOML profile and returns the printed report.
pub fn compare(
    rules: &TaxRules,
    profile: &Path,
    show_waterfalls: bool,
) -> Result<String> {
    let raw = load_profile(profile)
        .with_context(|| format!("Failed to load profile: {}", profile.display()))?;
    let name = profile
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".to_string());

    let errors = validate_inputs(&raw);
    if !errors.is_empty() {
        bail!(
            "{}",
            ValidationReport {
                name: &name,
                errors: &errors,
            }
        );
    }

    let result = Comparator::new(rules)
        .compare(&sanitize_inputs(&raw))
        .context("Comparison failed")?;

    Ok(ComparisonReport {
        name: &name,
        result: &result,
        show_waterfalls,
    }
    .to_string())
}

/// Output of a batch run.
#[derive(Debug, Default, PartialEq)]
pub struct BatchOutcome {
    /// CSV summary, header first.
    pub summary: String,
    /// One validation report per rejected profile.
    pub rejected: Vec<String>,
}

/// Compares every profile in a CSV file with a single comparator, so
/// profiles differing only in profit share break-even searches.
pub fn batch(
    rules: &TaxRules,
    profiles: &Path,
) -> Result<BatchOutcome> {
    let rows = ProfileLoader::load_from_file(profiles)
        .with_context(|| format!("Failed to load profiles: {}", profiles.display()))?;
    let comparator = Comparator::new(rules);

    let mut outcome = BatchOutcome {
        summary: format!("{BATCH_HEADER}\n"),
        rejected: Vec::new(),
    };
    for row in &rows {
        let errors = validate_inputs(&row.inputs);
        if !errors.is_empty() {
            outcome.rejected.push(
                ValidationReport {
                    name: &row.name,
                    errors: &errors,
                }
                .to_string(),
            );
            continue;
        }

        let result = comparator
            .compare(&sanitize_inputs(&row.inputs))
            .with_context(|| format!("Comparison failed for {}", row.name))?;
        outcome.summary.push_str(
            &BatchLine {
                name: &row.name,
                result: &result,
            }
            .to_string(),
        );
        outcome.summary.push('\n');
    }

    debug!(
        profiles = rows.len(),
        rejected = outcome.rejected.len(),
        cached_crossovers = comparator.cached_crossovers(),
        "batch complete"
    );
    Ok(outcome)
}

pub fn rules_report(rules: &TaxRules) -> String {
    RulesReport(rules).to_string()
}
