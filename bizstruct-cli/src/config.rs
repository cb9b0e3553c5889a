//! TOML configuration: rule overrides and comparison profiles.
//!
//! A rules file only needs the values it changes; everything else keeps the
//! YA2025 defaults.
//!
//! ```toml
//! year_of_assessment = 2026
//!
//! [zakat]
//! nisab = 25000
//!
//! [relief_caps]
//! lifestyle = 3000
//!
//! [[corporate_standard_brackets]]
//! min = 0
//! rate = 0.24
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bizstruct_core::{
    ContributionSchedule, ContributionTier, RawInputs, ReliefCategory, RulesError, TaxBracket,
    TaxRules,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown relief category '{0}'")]
    UnknownRelief(String),

    #[error("invalid rules: {0}")]
    Rules(#[from] RulesError),
}

/// Partial override of [`TaxRules`] read from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    pub year_of_assessment: Option<i32>,
    pub personal_brackets: Option<Vec<TaxBracket>>,
    pub corporate_sme_brackets: Option<Vec<TaxBracket>>,
    pub corporate_standard_brackets: Option<Vec<TaxBracket>>,
    /// Keyed by relief category name, e.g. `lifestyle`.
    pub relief_caps: BTreeMap<String, Decimal>,
    pub contributions: ContributionsConfig,
    pub zakat: ZakatConfig,
    pub dividend: DividendConfig,
    pub audit_exemption: AuditExemptionConfig,
    pub sme: SmeConfig,
    pub comparison: ComparisonConfig,
    pub crossover: CrossoverConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContributionsConfig {
    pub employer_epf: Option<Vec<ContributionTier>>,
    pub employee_epf: Option<Vec<ContributionTier>>,
    pub employer_socso: Option<Vec<ContributionTier>>,
    pub employee_socso: Option<Vec<ContributionTier>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZakatConfig {
    pub rate: Option<Decimal>,
    pub nisab: Option<Decimal>,
    pub company_deduction_cap_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DividendConfig {
    pub surcharge_threshold: Option<Decimal>,
    pub surcharge_rate: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditExemptionConfig {
    pub max_revenue: Option<Decimal>,
    pub max_total_assets: Option<Decimal>,
    pub max_employees: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmeConfig {
    pub max_revenue: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonConfig {
    pub similarity_threshold: Option<Decimal>,
    pub tight_margin_ratio: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrossoverConfig {
    pub lower_bound: Option<Decimal>,
    pub upper_bound: Option<Decimal>,
    pub tolerance: Option<Decimal>,
    pub max_iterations: Option<u32>,
    pub early_exit_threshold: Option<Decimal>,
    pub cache_capacity: Option<usize>,
    pub target_tolerance: Option<Decimal>,
}

fn set<T>(
    target: &mut T,
    value: Option<T>,
) {
    if let Some(value) = value {
        *target = value;
    }
}

fn set_schedule(
    target: &mut ContributionSchedule,
    tiers: Option<Vec<ContributionTier>>,
) {
    if let Some(tiers) = tiers {
        *target = ContributionSchedule::new(tiers);
    }
}

impl RulesConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies the overrides to `rules` and validates the result.
    ///
    /// `rules` is unchanged when an error is returned.
    pub fn apply(
        self,
        rules: &mut TaxRules,
    ) -> Result<(), ConfigError> {
        let mut updated = rules.clone();

        set(&mut updated.year_of_assessment, self.year_of_assessment);
        set(&mut updated.personal_brackets, self.personal_brackets);
        set(&mut updated.corporate_sme_brackets, self.corporate_sme_brackets);
        set(&mut updated.corporate_standard_brackets, self.corporate_standard_brackets);

        for (name, cap) in self.relief_caps {
            let category =
                ReliefCategory::parse(&name).ok_or_else(|| ConfigError::UnknownRelief(name.clone()))?;
            updated.relief_caps.insert(category, cap);
        }

        let contributions = &mut updated.contributions;
        set_schedule(&mut contributions.employer_epf, self.contributions.employer_epf);
        set_schedule(&mut contributions.employee_epf, self.contributions.employee_epf);
        set_schedule(&mut contributions.employer_socso, self.contributions.employer_socso);
        set_schedule(&mut contributions.employee_socso, self.contributions.employee_socso);

        set(&mut updated.zakat.rate, self.zakat.rate);
        set(&mut updated.zakat.nisab, self.zakat.nisab);
        set(
            &mut updated.zakat.company_deduction_cap_rate,
            self.zakat.company_deduction_cap_rate,
        );

        set(&mut updated.dividend.surcharge_threshold, self.dividend.surcharge_threshold);
        set(&mut updated.dividend.surcharge_rate, self.dividend.surcharge_rate);

        let audit = &mut updated.audit_exemption;
        set(&mut audit.max_revenue, self.audit_exemption.max_revenue);
        set(&mut audit.max_total_assets, self.audit_exemption.max_total_assets);
        set(&mut audit.max_employees, self.audit_exemption.max_employees);

        set(&mut updated.sme.max_revenue, self.sme.max_revenue);

        set(
            &mut updated.comparison.similarity_threshold,
            self.comparison.similarity_threshold,
        );
        set(&mut updated.comparison.tight_margin_ratio, self.comparison.tight_margin_ratio);

        let crossover = &mut updated.crossover;
        set(&mut crossover.lower_bound, self.crossover.lower_bound);
        set(&mut crossover.upper_bound, self.crossover.upper_bound);
        set(&mut crossover.tolerance, self.crossover.tolerance);
        set(&mut crossover.max_iterations, self.crossover.max_iterations);
        set(&mut crossover.early_exit_threshold, self.crossover.early_exit_threshold);
        set(&mut crossover.cache_capacity, self.crossover.cache_capacity);
        set(&mut crossover.target_tolerance, self.crossover.target_tolerance);

        updated.validate()?;
        *rules = updated;
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// YA2025 rules with the overrides from `path` applied.
pub fn load_rules_file(path: &Path) -> Result<TaxRules, ConfigError> {
    let mut rules = TaxRules::ya2025();
    RulesConfig::from_toml(&read(path)?)?.apply(&mut rules)?;
    debug!(path = %path.display(), year = rules.year_of_assessment, "loaded rules file");
    Ok(rules)
}

/// Parses a comparison profile. Field names match [`RawInputs`].
pub fn parse_profile(text: &str) -> Result<RawInputs, ConfigError> {
    Ok(toml::from_str(text)?)
}

pub fn load_profile(path: &Path) -> Result<RawInputs, ConfigError> {
    parse_profile(&read(path)?)
}
