//! Reverse calculation: the business profit each structure needs to reach a
//! desired net cash.

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::error::{CalculationError, ensure_non_negative};
use crate::calculations::sdn_bhd::SdnBhdCalculator;
use crate::calculations::sole_prop::SolePropCalculator;
use crate::models::{TargetAnalysis, TaxCalculationInputs, TaxRules};

/// Finds the smallest whole-ringgit profit whose net cash reaches a target.
///
/// Net cash is treated as non-decreasing in profit. The search covers the
/// crossover range; a target beyond the net cash at its upper bound is
/// reported as unreachable.
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::{TaxCalculationInputs, TaxRules};
/// use bizstruct_core::calculations::TargetSolver;
///
/// let rules = TaxRules::ya2025();
/// let solver = TargetSolver::new(&rules);
/// let inputs = TaxCalculationInputs::default();
///
/// let profit = solver.sole_prop_required_profit(&inputs, dec!(92310)).unwrap();
///
/// assert_eq!(profit, Some(dec!(100000)));
/// ```
#[derive(Debug, Clone)]
pub struct TargetSolver<'a> {
    rules: &'a TaxRules,
}

impl<'a> TargetSolver<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Required profit for both structures.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the target is negative or a scenario
    /// evaluation fails.
    pub fn analyse(
        &self,
        inputs: &TaxCalculationInputs,
        target_net_income: Decimal,
    ) -> Result<TargetAnalysis, CalculationError> {
        Ok(TargetAnalysis {
            target_net_income,
            sole_prop_required_profit: self.sole_prop_required_profit(inputs, target_net_income)?,
            sdn_bhd_required_profit: self.sdn_bhd_required_profit(inputs, target_net_income)?,
        })
    }

    /// # Errors
    ///
    /// See [`TargetSolver::analyse`].
    pub fn sole_prop_required_profit(
        &self,
        inputs: &TaxCalculationInputs,
        target_net_income: Decimal,
    ) -> Result<Option<Decimal>, CalculationError> {
        let calculator = SolePropCalculator::new(self.rules);
        self.solve(target_net_income, |profit| {
            Ok(calculator.calculate(&inputs.at_profit(profit))?.net_cash)
        })
    }

    /// # Errors
    ///
    /// See [`TargetSolver::analyse`].
    pub fn sdn_bhd_required_profit(
        &self,
        inputs: &TaxCalculationInputs,
        target_net_income: Decimal,
    ) -> Result<Option<Decimal>, CalculationError> {
        let calculator = SdnBhdCalculator::new(self.rules);
        self.solve(target_net_income, |profit| {
            Ok(calculator.calculate(&inputs.at_profit(profit))?.net_cash)
        })
    }

    fn solve(
        &self,
        target: Decimal,
        net_cash_at: impl Fn(Decimal) -> Result<Decimal, CalculationError>,
    ) -> Result<Option<Decimal>, CalculationError> {
        let target = ensure_non_negative("target net income", target)?;
        let params = &self.rules.crossover;
        let mut low = params.lower_bound;
        let mut high = params.upper_bound;

        if net_cash_at(low)? >= target {
            return Ok(Some(low));
        }
        if net_cash_at(high)? < target {
            debug!(target = %target, upper_bound = %high, "target net income unreachable");
            return Ok(None);
        }

        // low always misses the target, high always reaches it.
        for _ in 0..params.max_iterations {
            if high - low <= params.target_tolerance {
                break;
            }
            let mid = (low + high) / Decimal::TWO;
            if net_cash_at(mid)? >= target {
                high = mid;
            } else {
                low = mid;
            }
        }

        let mut profit = high.ceil();
        if profit - Decimal::ONE > low && net_cash_at(profit - Decimal::ONE)? >= target {
            profit -= Decimal::ONE;
        }
        Ok(Some(profit))
    }
}
