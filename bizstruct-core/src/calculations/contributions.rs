//! Statutory employment contributions (EPF and SOCSO) and salary
//! affordability.
//!
//! Contribution rates are step functions of the monthly wage, so the cost of
//! a salary to the company is piecewise linear. The largest affordable salary
//! is solved in closed form on each linear piece and the best piece wins.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{max, round_half_up};
use crate::calculations::error::{CalculationError, ensure_non_negative};
use crate::models::{ContributionRules, SalaryAffordability};

const MONTHS: Decimal = Decimal::from_parts(12, 0, 0, false, 0);
const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Contributions owed on one director salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentCost {
    pub annual_salary: Decimal,
    pub employer_epf: Decimal,
    pub employer_socso: Decimal,
    pub employee_epf: Decimal,
    pub employee_socso: Decimal,
}

impl EmploymentCost {
    /// Salary plus the employer's share of contributions.
    pub fn employer_total(&self) -> Decimal {
        self.annual_salary + self.employer_epf + self.employer_socso
    }

    /// Salary less the employee's share of contributions.
    pub fn take_home_salary(&self) -> Decimal {
        self.annual_salary - self.employee_epf - self.employee_socso
    }
}

/// Calculator for contribution amounts under a set of contribution tables.
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::TaxRules;
/// use bizstruct_core::calculations::ContributionCalculator;
///
/// let rules = TaxRules::ya2025();
/// let cost = ContributionCalculator::new(&rules.contributions)
///     .calculate(dec!(10000))
///     .unwrap();
///
/// assert_eq!(cost.annual_salary, dec!(120000));
/// assert_eq!(cost.employer_epf, dec!(14400.00));
/// assert_eq!(cost.employer_socso, dec!(0.00));
/// ```
#[derive(Debug, Clone)]
pub struct ContributionCalculator<'a> {
    rules: &'a ContributionRules,
}

impl<'a> ContributionCalculator<'a> {
    /// Creates a calculator over the given EPF and SOCSO tables.
    pub fn new(rules: &'a ContributionRules) -> Self {
        Self { rules }
    }

    /// Calculates contributions on a monthly salary paid for twelve months.
    ///
    /// Each rate is chosen by the monthly wage, then applied to the annual
    /// salary and rounded to the sen.
    ///
    /// # Arguments
    ///
    /// * `monthly_salary` - The director's gross monthly salary
    ///
    /// # Returns
    ///
    /// An [`EmploymentCost`] with the annual salary and both sides' EPF and
    /// SOCSO contributions.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if `monthly_salary` is negative.
    pub fn calculate(
        &self,
        monthly_salary: Decimal,
    ) -> Result<EmploymentCost, CalculationError> {
        let monthly_salary = ensure_non_negative("monthly salary", monthly_salary)?;
        let annual_salary = monthly_salary * MONTHS;

        Ok(EmploymentCost {
            annual_salary,
            employer_epf: self.contribution(annual_salary, |r| r.employer_epf.rate_for(monthly_salary)),
            employer_socso: self
                .contribution(annual_salary, |r| r.employer_socso.rate_for(monthly_salary)),
            employee_epf: self.contribution(annual_salary, |r| r.employee_epf.rate_for(monthly_salary)),
            employee_socso: self
                .contribution(annual_salary, |r| r.employee_socso.rate_for(monthly_salary)),
        })
    }

    fn contribution(
        &self,
        annual_salary: Decimal,
        rate: impl Fn(&ContributionRules) -> Decimal,
    ) -> Decimal {
        round_half_up(annual_salary * rate(self.rules))
    }

    /// Salary plus employer contributions for an annual salary.
    ///
    /// # Arguments
    ///
    /// * `annual_salary` - Salary for the year; rates are looked up on one
    ///   twelfth of it
    ///
    /// # Returns
    ///
    /// What the company pays in total, salary included.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use bizstruct_core::TaxRules;
    /// use bizstruct_core::calculations::ContributionCalculator;
    ///
    /// let rules = TaxRules::ya2025();
    /// let calculator = ContributionCalculator::new(&rules.contributions);
    ///
    /// // 12% employer EPF above RM5,000 a month, no SOCSO above RM6,000.
    /// assert_eq!(calculator.employer_cost(dec!(120000)), dec!(134400.00));
    /// ```
    pub fn employer_cost(
        &self,
        annual_salary: Decimal,
    ) -> Decimal {
        let monthly = annual_salary / MONTHS;
        annual_salary
            + round_half_up(annual_salary * self.rules.employer_epf.rate_for(monthly))
            + round_half_up(annual_salary * self.rules.employer_socso.rate_for(monthly))
    }

    /// Largest annual salary (to the cent) whose employer cost fits within
    /// `budget`.
    ///
    /// Wage bands are delimited by every employer-side breakpoint. Within a
    /// band the cost is `salary × (1 + epf + socso)`, so the band's best
    /// salary is `budget / factor` clipped to the band's upper edge; it is
    /// usable only if it lies above the band's lower edge.
    ///
    /// # Arguments
    ///
    /// * `budget` - Profit available to pay the salary and its contributions
    ///
    /// # Returns
    ///
    /// The annual salary, or zero for a budget of zero or less.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use bizstruct_core::TaxRules;
    /// use bizstruct_core::calculations::ContributionCalculator;
    ///
    /// let rules = TaxRules::ya2025();
    /// let calculator = ContributionCalculator::new(&rules.contributions);
    ///
    /// assert_eq!(calculator.max_affordable_salary(dec!(100000)), dec!(89285.71));
    /// assert_eq!(calculator.max_affordable_salary(dec!(0)), dec!(0));
    /// ```
    pub fn max_affordable_salary(
        &self,
        budget: Decimal,
    ) -> Decimal {
        if budget <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let mut best = Decimal::ZERO;
        for (lower, upper) in self.wage_bands() {
            let probe = match upper {
                Some(upper) => upper,
                None => lower + Decimal::ONE,
            };
            let factor = Decimal::ONE
                + self.rules.employer_epf.rate_for(probe)
                + self.rules.employer_socso.rate_for(probe);

            let mut candidate = (budget / factor).round_dp_with_strategy(2, RoundingStrategy::ToZero);
            if let Some(upper) = upper {
                candidate = candidate.min(upper * MONTHS);
            }
            // Per-component rounding can overshoot the budget by a cent.
            while candidate > Decimal::ZERO && self.employer_cost(candidate) > budget {
                candidate -= CENT;
            }

            let lower_annual = lower * MONTHS;
            let in_band = if lower.is_zero() {
                candidate >= Decimal::ZERO
            } else {
                candidate > lower_annual
            };
            if in_band {
                best = max(best, candidate);
            }
        }
        best
    }

    /// Monthly wage bands `(lower, upper]` over which employer rates are
    /// constant. The first band starts at zero inclusive.
    fn wage_bands(&self) -> Vec<(Decimal, Option<Decimal>)> {
        let mut breakpoints: Vec<Decimal> = self
            .rules
            .employer_epf
            .breakpoints()
            .chain(self.rules.employer_socso.breakpoints())
            .collect();
        breakpoints.sort();
        breakpoints.dedup();

        let mut bands = Vec::with_capacity(breakpoints.len() + 1);
        let mut lower = Decimal::ZERO;
        for point in breakpoints {
            bands.push((lower, Some(point)));
            lower = point;
        }
        bands.push((lower, None));
        bands
    }

    /// Checks whether `business_profit` covers the employment cost.
    ///
    /// # Arguments
    ///
    /// * `cost` - Contributions from [`ContributionCalculator::calculate`]
    /// * `business_profit` - Profit before the salary is paid
    ///
    /// # Returns
    ///
    /// A [`SalaryAffordability`] with the shortfall, if any, and the largest
    /// salary the profit could carry, annual and monthly. The monthly figure
    /// is truncated to the sen so it never exceeds the budget.
    pub fn affordability(
        &self,
        cost: &EmploymentCost,
        business_profit: Decimal,
    ) -> SalaryAffordability {
        let total_cost = cost.employer_total();
        let max_affordable_salary = self.max_affordable_salary(business_profit);
        let is_affordable = total_cost <= business_profit;
        let shortfall = max(total_cost - business_profit, Decimal::ZERO);

        if is_affordable {
            debug!(
                total_cost = %total_cost,
                business_profit = %business_profit,
                "salary affordable"
            );
        } else {
            warn!(
                total_cost = %total_cost,
                business_profit = %business_profit,
                shortfall = %shortfall,
                "salary exceeds what the company can pay"
            );
        }

        SalaryAffordability {
            max_affordable_salary,
            max_affordable_monthly_salary: (max_affordable_salary / MONTHS)
                .round_dp_with_strategy(2, RoundingStrategy::ToZero),
            is_affordable,
            shortfall,
            company_would_be_insolvent: !is_affordable,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TaxRules;

    fn rules() -> TaxRules {
        TaxRules::ya2025()
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn low_salary_pays_thirteen_percent_epf_and_socso() {
        let rules = rules();
        let cost = ContributionCalculator::new(&rules.contributions)
            .calculate(dec!(4000))
            .unwrap();

        assert_eq!(cost.annual_salary, dec!(48000));
        assert_eq!(cost.employer_epf, dec!(6240.00));
        assert_eq!(cost.employer_socso, dec!(840.00));
        assert_eq!(cost.employee_epf, dec!(5280.00));
        assert_eq!(cost.employee_socso, dec!(240.00));
        assert_eq!(cost.employer_total(), dec!(55080.00));
        assert_eq!(cost.take_home_salary(), dec!(42480.00));
    }

    #[test]
    fn epf_rate_drops_above_five_thousand() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);

        assert_eq!(calculator.calculate(dec!(5000)).unwrap().employer_epf, dec!(7800.00));
        assert_eq!(calculator.calculate(dec!(5000.01)).unwrap().employer_epf, dec!(7200.01));
    }

    #[test]
    fn socso_stops_above_six_thousand() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);

        assert_eq!(calculator.calculate(dec!(6000)).unwrap().employer_socso, dec!(1260.00));
        assert_eq!(calculator.calculate(dec!(6000.01)).unwrap().employer_socso, dec!(0));
        assert_eq!(calculator.calculate(dec!(6000.01)).unwrap().employee_socso, dec!(0));
    }

    #[test]
    fn zero_salary_has_no_contributions() {
        let rules = rules();
        let cost = ContributionCalculator::new(&rules.contributions)
            .calculate(dec!(0))
            .unwrap();

        assert_eq!(cost.employer_total(), Decimal::ZERO);
    }

    #[test]
    fn negative_salary_is_rejected() {
        let rules = rules();
        let result = ContributionCalculator::new(&rules.contributions).calculate(dec!(-1));

        assert!(result.is_err());
    }

    // =========================================================================
    // max_affordable_salary tests
    // =========================================================================

    #[test]
    fn max_affordable_salary_on_100000_profit() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);

        // Above RM6,000/month only the 12% EPF applies: 100,000 / 1.12.
        assert_eq!(calculator.max_affordable_salary(dec!(100000)), dec!(89285.71));
    }

    #[test]
    fn max_affordable_salary_is_zero_without_profit() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);

        assert_eq!(calculator.max_affordable_salary(dec!(0)), Decimal::ZERO);
        assert_eq!(calculator.max_affordable_salary(dec!(-10)), Decimal::ZERO);
    }

    #[test]
    fn max_affordable_salary_jumps_the_epf_breakpoint() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);

        // 68,300 / 1.1475 stays under RM60,000 but 68,300 / 1.1375 clears it,
        // and the cheaper 12% band then admits a larger salary.
        let salary = calculator.max_affordable_salary(dec!(68300));

        assert_eq!(salary, dec!(60043.95));
        assert!(calculator.employer_cost(salary) <= dec!(68300));
    }

    /// Largest whole-ringgit salary that fits, by exhaustive search.
    fn brute_force_max(
        calculator: &ContributionCalculator<'_>,
        budget: Decimal,
    ) -> Decimal {
        let mut best = Decimal::ZERO;
        let mut salary = Decimal::ZERO;
        while salary <= budget {
            if calculator.employer_cost(salary) <= budget {
                best = salary;
            }
            salary += Decimal::ONE;
        }
        best
    }

    #[test]
    fn max_affordable_salary_agrees_with_brute_force_at_breakpoints() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);

        // Budgets straddling the RM5,000 (annual 60,000) and RM6,000
        // (annual 72,000) monthly cutoffs.
        for budget in [
            dec!(68850),
            dec!(68849),
            dec!(68200),
            dec!(68300),
            dec!(81900),
            dec!(81899),
            dec!(80640),
            dec!(80700),
            dec!(82000),
        ] {
            let closed_form = calculator.max_affordable_salary(budget);
            let brute = brute_force_max(&calculator, budget);

            assert!(
                calculator.employer_cost(closed_form) <= budget,
                "closed form {closed_form} over budget {budget}"
            );
            assert!(
                closed_form >= brute && closed_form - brute < Decimal::ONE,
                "budget {budget}: closed form {closed_form}, brute force {brute}"
            );
        }
    }

    // =========================================================================
    // affordability tests
    // =========================================================================

    #[test]
    fn ten_thousand_a_month_on_100000_profit_is_insolvent() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);
        let cost = calculator.calculate(dec!(10000)).unwrap();

        let result = calculator.affordability(&cost, dec!(100000));

        assert!(!result.is_affordable);
        assert!(result.company_would_be_insolvent);
        assert_eq!(result.shortfall, dec!(34400.00));
        assert_eq!(result.max_affordable_monthly_salary, dec!(7440.47));
    }

    #[test]
    fn salary_within_profit_is_affordable() {
        let rules = rules();
        let calculator = ContributionCalculator::new(&rules.contributions);
        let cost = calculator.calculate(dec!(5000)).unwrap();

        let result = calculator.affordability(&cost, dec!(100000));

        assert!(result.is_affordable);
        assert_eq!(result.shortfall, Decimal::ZERO);
    }
}
