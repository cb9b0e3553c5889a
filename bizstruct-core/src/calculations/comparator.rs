//! Side-by-side comparison of the two structures.
//!
//! The comparator runs both scenario calculators on the same inputs, decides
//! which leaves the owner with more cash, raises warnings that a bare net cash
//! figure would hide, and locates the crossover profit.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use bizstruct_core::{Structure, TaxCalculationInputs, TaxRules};
//! use bizstruct_core::calculations::Comparator;
//!
//! let rules = TaxRules::ya2025();
//! let inputs = TaxCalculationInputs {
//!     monthly_salary: dec!(10000),
//!     compliance_costs: dec!(10000),
//!     ..TaxCalculationInputs::with_profit(dec!(1000000))
//! };
//!
//! let result = Comparator::new(&rules).compare(&inputs).unwrap();
//!
//! assert_eq!(result.which_is_better, Structure::SdnBhd);
//! assert_eq!(result.difference, dec!(36636.00));
//! ```

use std::sync::PoisonError;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::{format_ringgit, round_whole};
use crate::calculations::crossover::{CrossoverSearch, SharedCrossoverCache, shared_cache};
use crate::calculations::error::CalculationError;
use crate::calculations::sdn_bhd::SdnBhdCalculator;
use crate::calculations::sole_prop::SolePropCalculator;
use crate::calculations::target::TargetSolver;
use crate::models::{
    ComparisonResult, ComparisonWarning, InputMode, SdnBhdScenarioResult, Structure,
    TaxCalculationInputs, TaxRules, WarningKind,
};

/// Compares the two structures and memoizes crossover searches.
///
/// Each comparator owns a crossover cache. Pass the same cache to several
/// comparators with [`Comparator::with_cache`] to share results between them.
#[derive(Debug, Clone)]
pub struct Comparator<'a> {
    rules: &'a TaxRules,
    cache: SharedCrossoverCache,
}

impl<'a> Comparator<'a> {
    /// Creates a comparator with a fresh cache sized from the rules.
    pub fn new(rules: &'a TaxRules) -> Self {
        Self {
            rules,
            cache: shared_cache(&rules.crossover),
        }
    }

    pub fn with_cache(
        rules: &'a TaxRules,
        cache: SharedCrossoverCache,
    ) -> Self {
        Self { rules, cache }
    }

    pub fn cache(&self) -> &SharedCrossoverCache {
        &self.cache
    }

    /// Number of memoized crossover points.
    pub fn cached_crossovers(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Runs both scenarios and compares them.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the rules are malformed or a scenario
    /// rejects the inputs.
    pub fn compare(
        &self,
        inputs: &TaxCalculationInputs,
    ) -> Result<ComparisonResult, CalculationError> {
        self.rules.validate()?;

        let sole_prop = SolePropCalculator::new(self.rules).calculate(inputs)?;
        let sdn_bhd = SdnBhdCalculator::new(self.rules).calculate(inputs)?;

        let difference = sdn_bhd.net_cash - sole_prop.net_cash;
        let savings_if_switch = difference.abs();
        let mut which_is_better = self.preferred(difference);

        let mut warnings = Vec::new();

        let has_affordability_issue = sdn_bhd.affordability.company_would_be_insolvent;
        if has_affordability_issue {
            warnings.push(affordability_warning(inputs, &sdn_bhd));
            if which_is_better == Structure::SdnBhd {
                which_is_better = Structure::SoleProp;
            }
        }

        if let Some(warning) = self.tight_margin_warning(inputs, &sdn_bhd) {
            warnings.push(warning);
        }

        let has_sme_qualification_issue = self.sme_disqualified(inputs);
        if has_sme_qualification_issue {
            warn!(
                foreign_ownership = inputs.has_foreign_ownership,
                "company may not qualify for SME corporate tax rates"
            );
            warnings.push(ComparisonWarning {
                kind: WarningKind::SmeQualification,
                message: "The company may not qualify for the 15%/17% SME rates (foreign \
                          ownership or revenue above RM50 million). A flat 24% corporate tax \
                          may apply instead."
                    .to_string(),
            });
        }

        let crossover_point_profit = CrossoverSearch::new(self.rules).find(
            inputs,
            difference,
            &self.cache,
        )?;

        let target_analysis = match inputs.input_mode {
            InputMode::Profit => None,
            InputMode::Target { target_net_income } => {
                Some(TargetSolver::new(self.rules).analyse(inputs, target_net_income)?)
            }
        };

        let recommendation = if has_affordability_issue {
            format!(
                "The company cannot afford the requested salary. Stay a sole proprietorship, \
                 or reduce the director salary to at most {} a month before incorporating.",
                format_ringgit(sdn_bhd.affordability.max_affordable_monthly_salary)
            )
        } else {
            recommendation(which_is_better, savings_if_switch, self.rules.comparison.similarity_threshold)
        };

        debug!(
            which_is_better = %which_is_better,
            difference = %difference,
            crossover = ?crossover_point_profit,
            warnings = warnings.len(),
            "comparison complete"
        );

        Ok(ComparisonResult {
            which_is_better,
            difference,
            savings_if_switch,
            crossover_point_profit,
            recommendation,
            sole_prop,
            sdn_bhd,
            has_affordability_issue,
            has_sme_qualification_issue,
            warnings,
            target_analysis,
        })
    }

    fn preferred(
        &self,
        difference: Decimal,
    ) -> Structure {
        if difference.abs() < self.rules.comparison.similarity_threshold {
            Structure::Similar
        } else if difference > Decimal::ZERO {
            Structure::SdnBhd
        } else {
            Structure::SoleProp
        }
    }

    fn tight_margin_warning(
        &self,
        inputs: &TaxCalculationInputs,
        sdn_bhd: &SdnBhdScenarioResult,
    ) -> Option<ComparisonWarning> {
        let profit = inputs.business_profit;
        if profit <= Decimal::ZERO {
            return None;
        }

        let company = &sdn_bhd.company;
        let salary_cost = company.annual_salary + company.employer_epf + company.employer_socso;
        let share = salary_cost / profit;
        if share <= self.rules.comparison.tight_margin_ratio {
            return None;
        }

        Some(ComparisonWarning {
            kind: WarningKind::TightMargin,
            message: format!(
                "Salary and contributions use {}% of profit, leaving little room for dividends \
                 or reinvestment.",
                round_whole(share * Decimal::ONE_HUNDRED)
            ),
        })
    }

    fn sme_disqualified(
        &self,
        inputs: &TaxCalculationInputs,
    ) -> bool {
        let revenue_too_high = inputs
            .audit_criteria
            .as_ref()
            .is_some_and(|c| c.revenue > self.rules.sme.max_revenue);
        inputs.has_foreign_ownership || revenue_too_high
    }
}

fn affordability_warning(
    inputs: &TaxCalculationInputs,
    sdn_bhd: &SdnBhdScenarioResult,
) -> ComparisonWarning {
    ComparisonWarning {
        kind: WarningKind::Affordability,
        message: format!(
            "A salary of {} a month costs {} more than the business earns. The company can \
             afford at most {} a month.",
            format_ringgit(inputs.monthly_salary),
            format_ringgit(sdn_bhd.affordability.shortfall),
            format_ringgit(sdn_bhd.affordability.max_affordable_monthly_salary)
        ),
    }
}

fn recommendation(
    which_is_better: Structure,
    savings: Decimal,
    similarity_threshold: Decimal,
) -> String {
    match which_is_better {
        Structure::SdnBhd => format!(
            "Incorporating as a Sdn Bhd leaves you {} more each year, along with limited \
             liability and EPF savings.",
            format_ringgit(savings)
        ),
        Structure::SoleProp => format!(
            "Staying a sole proprietorship leaves you {} more each year with far less \
             paperwork.",
            format_ringgit(savings)
        ),
        Structure::Similar => format!(
            "Both structures leave you within {} of each other. Decide on liability \
             protection and compliance effort rather than tax.",
            format_ringgit(similarity_threshold)
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::AuditCriteria;

    fn compare(inputs: &TaxCalculationInputs) -> ComparisonResult {
        let rules = TaxRules::ya2025();
        Comparator::new(&rules).compare(inputs).unwrap()
    }

    // =========================================================================
    // verdict tests
    // =========================================================================

    #[test]
    fn one_million_profit_favours_sdn_bhd() {
        let result = compare(&TaxCalculationInputs {
            monthly_salary: dec!(10000),
            compliance_costs: dec!(10000),
            ..TaxCalculationInputs::with_profit(dec!(1000000))
        });

        assert_eq!(result.which_is_better, Structure::SdnBhd);
        assert_eq!(result.sole_prop.net_cash, dec!(752620.00));
        assert_eq!(result.sdn_bhd.net_cash, dec!(789256.00));
        assert_eq!(result.difference, dec!(36636.00));
        assert_eq!(result.savings_if_switch, dec!(36636.00));
        assert!(result.warnings.is_empty());
        assert!(result.recommendation.contains("RM36,636.00"));
    }

    #[test]
    fn modest_profit_favours_sole_prop() {
        let result = compare(&TaxCalculationInputs {
            compliance_costs: dec!(5000),
            ..TaxCalculationInputs::with_profit(dec!(100000))
        });

        assert_eq!(result.which_is_better, Structure::SoleProp);
        assert_eq!(result.difference, dec!(-12310.00));
        assert_eq!(result.savings_if_switch, dec!(12310.00));
    }

    #[test]
    fn small_difference_is_similar() {
        // Break-even is at 248,125 and the gap moves 8 sen per ringgit around it.
        for profit in [dec!(230000), dec!(248125), dec!(265000)] {
            let result = compare(&TaxCalculationInputs {
                compliance_costs: dec!(5000),
                ..TaxCalculationInputs::with_profit(profit)
            });

            assert!(result.difference.abs() < dec!(3000), "difference {}", result.difference);
            assert_eq!(result.which_is_better, Structure::Similar);
        }
    }

    // =========================================================================
    // warning tests
    // =========================================================================

    #[test]
    fn unaffordable_salary_forces_sole_prop() {
        let result = compare(&TaxCalculationInputs {
            monthly_salary: dec!(10000),
            ..TaxCalculationInputs::with_profit(dec!(100000))
        });

        // The Sdn Bhd figure looks better because the salary is paid from
        // money the company does not have.
        assert!(result.difference > dec!(3000));
        assert!(result.has_affordability_issue);
        assert_eq!(result.which_is_better, Structure::SoleProp);
        assert!(result.recommendation.contains("cannot afford"));
        assert!(result.recommendation.contains("RM7,440.47"));

        let kinds: Vec<_> = result.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::Affordability, WarningKind::TightMargin]);
    }

    #[test]
    fn tight_margin_warns_without_changing_verdict() {
        // RM6,000 a month is past the 13% EPF tier but still pays SOCSO:
        // 72,000 + 8,640 + 1,260 = 81,900.
        let result = compare(&TaxCalculationInputs {
            monthly_salary: dec!(6000),
            ..TaxCalculationInputs::with_profit(dec!(100000))
        });

        assert!(!result.has_affordability_issue);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::TightMargin);
        assert!(result.warnings[0].message.contains("82%"));
    }

    #[test]
    fn no_tight_margin_warning_without_profit() {
        let result = compare(&TaxCalculationInputs::with_profit(dec!(0)));

        assert!(result.warnings.is_empty());
    }

    #[test]
    fn foreign_ownership_flags_sme_issue_only() {
        let local = compare(&TaxCalculationInputs::with_profit(dec!(500000)));
        let foreign = compare(&TaxCalculationInputs {
            has_foreign_ownership: true,
            ..TaxCalculationInputs::with_profit(dec!(500000))
        });

        assert!(foreign.has_sme_qualification_issue);
        assert_eq!(foreign.warnings[0].kind, WarningKind::SmeQualification);
        assert_eq!(foreign.sdn_bhd.net_cash, local.sdn_bhd.net_cash);
    }

    #[test]
    fn large_revenue_flags_sme_issue() {
        let result = compare(&TaxCalculationInputs {
            audit_criteria: Some(AuditCriteria {
                revenue: dec!(50000001),
                total_assets: dec!(1000000),
                employees: 40,
            }),
            ..TaxCalculationInputs::with_profit(dec!(500000))
        });

        assert!(result.has_sme_qualification_issue);
    }

    // =========================================================================
    // crossover and cache tests
    // =========================================================================

    #[test]
    fn crossover_is_found_for_profile() {
        let result = compare(&TaxCalculationInputs {
            compliance_costs: dec!(5000),
            ..TaxCalculationInputs::with_profit(dec!(100000))
        });

        let point = result.crossover_point_profit.unwrap();
        assert!((point - dec!(248125)).abs() <= dec!(100));
    }

    #[test]
    fn shared_cache_is_filled_by_every_comparator() {
        let rules = TaxRules::ya2025();
        let cache = shared_cache(&rules.crossover);
        let first = Comparator::with_cache(&rules, Arc::clone(&cache));
        let second = Comparator::with_cache(&rules, Arc::clone(&cache));

        first
            .compare(&TaxCalculationInputs {
                compliance_costs: dec!(5000),
                ..TaxCalculationInputs::with_profit(dec!(100000))
            })
            .unwrap();
        second
            .compare(&TaxCalculationInputs {
                compliance_costs: dec!(6000),
                ..TaxCalculationInputs::with_profit(dec!(100000))
            })
            .unwrap();

        assert_eq!(first.cached_crossovers(), 2);
        assert_eq!(second.cached_crossovers(), 2);
    }

    #[test]
    fn separate_comparators_do_not_share_state() {
        let rules = TaxRules::ya2025();
        let first = Comparator::new(&rules);
        let second = Comparator::new(&rules);

        first
            .compare(&TaxCalculationInputs {
                compliance_costs: dec!(5000),
                ..TaxCalculationInputs::with_profit(dec!(100000))
            })
            .unwrap();

        assert_eq!(first.cached_crossovers(), 1);
        assert_eq!(second.cached_crossovers(), 0);
    }

    // =========================================================================
    // target mode tests
    // =========================================================================

    #[test]
    fn target_mode_reports_required_profit() {
        let result = compare(&TaxCalculationInputs {
            input_mode: InputMode::Target {
                target_net_income: dec!(92310),
            },
            ..TaxCalculationInputs::with_profit(dec!(50000))
        });

        let analysis = result.target_analysis.unwrap();
        assert_eq!(analysis.sole_prop_required_profit, Some(dec!(100000)));
    }

    #[test]
    fn profit_mode_has_no_target_analysis() {
        let result = compare(&TaxCalculationInputs::with_profit(dec!(50000)));

        assert_eq!(result.target_analysis, None);
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let mut rules = TaxRules::ya2025();
        rules.personal_brackets.clear();

        let result = Comparator::new(&rules).compare(&TaxCalculationInputs::with_profit(dec!(1)));

        assert!(matches!(result, Err(CalculationError::InvalidRules(_))));
    }
}
