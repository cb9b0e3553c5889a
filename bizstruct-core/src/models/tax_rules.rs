//! Statutory parameters for one year of assessment.
//!
//! Every rate, threshold and table used by the calculators lives here so a
//! new year of assessment is a data change rather than a code change.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contribution::{ContributionSchedule, ContributionTier};
use super::reliefs::{INDIVIDUAL_RELIEF, ReliefCaps, ReliefCategory};
use super::tax_bracket::TaxBracket;

/// Errors raised when a rule set is malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    /// A bracket table has no rows.
    #[error("{0} bracket table is empty")]
    EmptyBracketTable(&'static str),

    /// The first bracket of a table does not start at zero.
    #[error("{table} brackets must start at 0, got {min}")]
    BracketsNotFromZero { table: &'static str, min: Decimal },

    /// Two consecutive brackets leave a gap or overlap.
    #[error("{table} brackets are not contiguous at {at}")]
    BracketsNotContiguous { table: &'static str, at: Decimal },

    /// The last bracket is bounded, or a bounded bracket is empty.
    #[error("{table} brackets must end with an open-ended tier")]
    BracketsNotOpenEnded { table: &'static str },

    /// A rate lies outside [0, 1].
    #[error("{name} rate must be between 0 and 1, got {rate}")]
    InvalidRate { name: &'static str, rate: Decimal },

    /// Contribution tier thresholds are not strictly ascending.
    #[error("{0} contribution tiers must have ascending wage thresholds")]
    UnorderedContributionTiers(&'static str),

    /// A threshold or amount that must be non-negative is negative.
    #[error("{name} must be non-negative, got {value}")]
    NegativeThreshold { name: &'static str, value: Decimal },

    /// The crossover search range or tolerance is unusable.
    #[error("crossover search range [{lower}, {upper}] with tolerance {tolerance} is invalid")]
    InvalidSearchRange {
        lower: Decimal,
        upper: Decimal,
        tolerance: Decimal,
    },
}

/// Employer and employee statutory contribution tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRules {
    pub employer_epf: ContributionSchedule,
    pub employee_epf: ContributionSchedule,
    pub employer_socso: ContributionSchedule,
    pub employee_socso: ContributionSchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZakatRules {
    /// Rate applied to the zakat base when zakat is auto-calculated.
    pub rate: Decimal,
    /// Wealth threshold below which zakat is not obligatory.
    pub nisab: Decimal,
    /// Share of company aggregate income deductible as business zakat.
    pub company_deduction_cap_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRules {
    pub surcharge_threshold: Decimal,
    pub surcharge_rate: Decimal,
}

/// Thresholds a company must stay within to skip the statutory audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditExemptionRules {
    pub max_revenue: Decimal,
    pub max_total_assets: Decimal,
    pub max_employees: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmeRules {
    /// Gross revenue above which SME rates are lost.
    pub max_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRules {
    /// Net cash difference below which both structures are called similar.
    pub similarity_threshold: Decimal,
    /// Salary cost share of profit above which a tight-margin warning is raised.
    pub tight_margin_ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverRules {
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
    pub tolerance: Decimal,
    pub max_iterations: u32,
    /// Difference at the current profit below which the current profit is
    /// reported as the crossover without searching.
    pub early_exit_threshold: Decimal,
    pub cache_capacity: usize,
    /// Precision of the target-mode profit search.
    pub target_tolerance: Decimal,
}

/// The complete rule set consumed by every calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRules {
    pub year_of_assessment: i32,
    pub personal_brackets: Vec<TaxBracket>,
    pub corporate_sme_brackets: Vec<TaxBracket>,
    pub corporate_standard_brackets: Vec<TaxBracket>,
    pub relief_caps: ReliefCaps,
    pub contributions: ContributionRules,
    pub zakat: ZakatRules,
    pub dividend: DividendRules,
    pub audit_exemption: AuditExemptionRules,
    pub sme: SmeRules,
    pub comparison: ComparisonRules,
    pub crossover: CrossoverRules,
}

impl Default for TaxRules {
    fn default() -> Self {
        Self::ya2025()
    }
}

impl TaxRules {
    /// Rules for years of assessment 2024 and 2025.
    pub fn ya2025() -> Self {
        Self {
            year_of_assessment: 2025,
            personal_brackets: vec![
                TaxBracket::new(dec!(0), Some(dec!(5000)), dec!(0)),
                TaxBracket::new(dec!(5000), Some(dec!(20000)), dec!(0.01)),
                TaxBracket::new(dec!(20000), Some(dec!(35000)), dec!(0.03)),
                TaxBracket::new(dec!(35000), Some(dec!(50000)), dec!(0.06)),
                TaxBracket::new(dec!(50000), Some(dec!(70000)), dec!(0.11)),
                TaxBracket::new(dec!(70000), Some(dec!(100000)), dec!(0.19)),
                TaxBracket::new(dec!(100000), Some(dec!(250000)), dec!(0.25)),
                TaxBracket::new(dec!(250000), Some(dec!(600000)), dec!(0.26)),
                TaxBracket::new(dec!(600000), Some(dec!(2000000)), dec!(0.28)),
                TaxBracket::new(dec!(2000000), None, dec!(0.30)),
            ],
            corporate_sme_brackets: vec![
                TaxBracket::new(dec!(0), Some(dec!(150000)), dec!(0.15)),
                TaxBracket::new(dec!(150000), Some(dec!(600000)), dec!(0.17)),
                TaxBracket::new(dec!(600000), None, dec!(0.24)),
            ],
            corporate_standard_brackets: vec![TaxBracket::new(dec!(0), None, dec!(0.24))],
            relief_caps: ReliefCaps::from([
                (ReliefCategory::Individual, INDIVIDUAL_RELIEF),
                (ReliefCategory::Spouse, dec!(4000)),
                (ReliefCategory::EpfAndLifeInsurance, dec!(7000)),
                (ReliefCategory::EducationAndMedicalInsurance, dec!(3000)),
                (ReliefCategory::MedicalExpenses, dec!(10000)),
                (ReliefCategory::ParentsMedical, dec!(8000)),
                (ReliefCategory::Lifestyle, dec!(2500)),
                (ReliefCategory::Sports, dec!(1000)),
                (ReliefCategory::EducationFees, dec!(7000)),
                (ReliefCategory::Sspn, dec!(8000)),
                (ReliefCategory::PrivateRetirementScheme, dec!(3000)),
                (ReliefCategory::SocsoEis, dec!(350)),
            ]),
            contributions: ContributionRules {
                employer_epf: ContributionSchedule::new(vec![
                    ContributionTier::up_to(dec!(5000), dec!(0.13)),
                    ContributionTier::above(dec!(0.12)),
                ]),
                employee_epf: ContributionSchedule::flat(dec!(0.11)),
                employer_socso: ContributionSchedule::new(vec![
                    ContributionTier::up_to(dec!(6000), dec!(0.0175)),
                    ContributionTier::above(dec!(0)),
                ]),
                employee_socso: ContributionSchedule::new(vec![
                    ContributionTier::up_to(dec!(6000), dec!(0.005)),
                    ContributionTier::above(dec!(0)),
                ]),
            },
            zakat: ZakatRules {
                rate: dec!(0.025),
                nisab: dec!(24000),
                company_deduction_cap_rate: dec!(0.025),
            },
            dividend: DividendRules {
                surcharge_threshold: dec!(100000),
                surcharge_rate: dec!(0.02),
            },
            audit_exemption: AuditExemptionRules {
                max_revenue: dec!(100000),
                max_total_assets: dec!(300000),
                max_employees: 5,
            },
            sme: SmeRules {
                max_revenue: dec!(50000000),
            },
            comparison: ComparisonRules {
                similarity_threshold: dec!(3000),
                tight_margin_ratio: dec!(0.8),
            },
            crossover: CrossoverRules {
                lower_bound: dec!(0),
                upper_bound: dec!(2000000),
                tolerance: dec!(100),
                max_iterations: 50,
                early_exit_threshold: dec!(100),
                cache_capacity: 50,
                target_tolerance: dec!(1),
            },
        }
    }

    /// Corporate table for a company with or without SME status.
    pub fn corporate_brackets(
        &self,
        sme: bool,
    ) -> &[TaxBracket] {
        if sme {
            &self.corporate_sme_brackets
        } else {
            &self.corporate_standard_brackets
        }
    }

    /// Validates table shapes and rate ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`RulesError`] found.
    pub fn validate(&self) -> Result<(), RulesError> {
        validate_brackets("personal", &self.personal_brackets)?;
        validate_brackets("corporate SME", &self.corporate_sme_brackets)?;
        validate_brackets("corporate standard", &self.corporate_standard_brackets)?;

        validate_schedule("employer EPF", &self.contributions.employer_epf)?;
        validate_schedule("employee EPF", &self.contributions.employee_epf)?;
        validate_schedule("employer SOCSO", &self.contributions.employer_socso)?;
        validate_schedule("employee SOCSO", &self.contributions.employee_socso)?;

        validate_rate("zakat", self.zakat.rate)?;
        validate_rate("zakat deduction cap", self.zakat.company_deduction_cap_rate)?;
        validate_rate("dividend surcharge", self.dividend.surcharge_rate)?;
        validate_rate("tight margin", self.comparison.tight_margin_ratio)?;

        for (name, value) in [
            ("nisab", self.zakat.nisab),
            ("dividend surcharge threshold", self.dividend.surcharge_threshold),
            ("audit exemption revenue", self.audit_exemption.max_revenue),
            ("audit exemption assets", self.audit_exemption.max_total_assets),
            ("SME revenue limit", self.sme.max_revenue),
            ("similarity threshold", self.comparison.similarity_threshold),
            ("early exit threshold", self.crossover.early_exit_threshold),
        ] {
            if value < Decimal::ZERO {
                return Err(RulesError::NegativeThreshold { name, value });
            }
        }
        for (name, cap) in &self.relief_caps {
            if *cap < Decimal::ZERO {
                return Err(RulesError::NegativeThreshold {
                    name: name.as_str(),
                    value: *cap,
                });
            }
        }

        let crossover = &self.crossover;
        if crossover.lower_bound < Decimal::ZERO
            || crossover.upper_bound <= crossover.lower_bound
            || crossover.tolerance <= Decimal::ZERO
            || crossover.target_tolerance <= Decimal::ZERO
        {
            return Err(RulesError::InvalidSearchRange {
                lower: crossover.lower_bound,
                upper: crossover.upper_bound,
                tolerance: crossover.tolerance,
            });
        }

        Ok(())
    }
}

fn validate_rate(
    name: &'static str,
    rate: Decimal,
) -> Result<(), RulesError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(RulesError::InvalidRate { name, rate });
    }
    Ok(())
}

fn validate_brackets(
    table: &'static str,
    brackets: &[TaxBracket],
) -> Result<(), RulesError> {
    let first = brackets
        .first()
        .ok_or(RulesError::EmptyBracketTable(table))?;
    if first.min != Decimal::ZERO {
        return Err(RulesError::BracketsNotFromZero {
            table,
            min: first.min,
        });
    }

    for bracket in brackets {
        validate_rate(table, bracket.rate)?;
    }

    for pair in brackets.windows(2) {
        match pair[0].max {
            Some(max) if max == pair[1].min && max > pair[0].min => {}
            Some(max) => return Err(RulesError::BracketsNotContiguous { table, at: max }),
            None => return Err(RulesError::BracketsNotOpenEnded { table }),
        }
    }

    match brackets.last().map(|b| b.max) {
        Some(None) => Ok(()),
        _ => Err(RulesError::BracketsNotOpenEnded { table }),
    }
}

fn validate_schedule(
    name: &'static str,
    schedule: &ContributionSchedule,
) -> Result<(), RulesError> {
    for tier in schedule.tiers() {
        validate_rate(name, tier.rate)?;
    }
    let thresholds: Vec<Decimal> = schedule.breakpoints().collect();
    if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(RulesError::UnorderedContributionTiers(name));
    }
    // An open-ended row may only appear last.
    let open_rows = schedule
        .tiers()
        .iter()
        .position(|tier| tier.max_monthly_wage.is_none());
    if let Some(position) = open_rows {
        if position + 1 != schedule.tiers().len() {
            return Err(RulesError::UnorderedContributionTiers(name));
        }
    }
    Ok(())
}
