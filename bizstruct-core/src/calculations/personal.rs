//! Resident individual income tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::BracketEngine;
use crate::calculations::common::{max, ratio, round_half_up};
use crate::calculations::error::{CalculationError, ensure_non_negative};
use crate::models::{TaxBracket, TaxBracketBreakdown};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalTaxResult {
    pub total_income: Decimal,
    pub total_reliefs: Decimal,
    pub chargeable_income: Decimal,
    pub tax: Decimal,
    pub breakdown: Vec<TaxBracketBreakdown>,
    /// Tax over total income, four decimal places.
    pub effective_rate: Decimal,
}

/// Calculator for personal income tax after reliefs.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::TaxRules;
/// use bizstruct_core::calculations::PersonalTaxCalculator;
///
/// let rules = TaxRules::ya2025();
/// let calculator = PersonalTaxCalculator::new(&rules.personal_brackets);
/// let result = calculator.calculate(dec!(100000), dec!(9000)).unwrap();
///
/// assert_eq!(result.chargeable_income, dec!(91000));
/// assert_eq!(result.tax, dec!(7690.00));
/// ```
#[derive(Debug, Clone)]
pub struct PersonalTaxCalculator<'a> {
    brackets: &'a [TaxBracket],
}

impl<'a> PersonalTaxCalculator<'a> {
    pub fn new(brackets: &'a [TaxBracket]) -> Self {
        Self { brackets }
    }

    /// Calculates tax on `total_income` less `total_reliefs`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if either amount is negative or no
    /// brackets were provided.
    pub fn calculate(
        &self,
        total_income: Decimal,
        total_reliefs: Decimal,
    ) -> Result<PersonalTaxResult, CalculationError> {
        let total_income = ensure_non_negative("total income", total_income)?;
        let total_reliefs = ensure_non_negative("total reliefs", total_reliefs)?;

        let chargeable_income = self.chargeable_income(total_income, total_reliefs);
        let bracket_tax = BracketEngine::new(self.brackets).calculate(chargeable_income)?;

        debug!(
            total_income = %total_income,
            chargeable_income = %chargeable_income,
            tax = %bracket_tax.tax,
            "personal tax calculated"
        );

        Ok(PersonalTaxResult {
            total_income,
            total_reliefs,
            chargeable_income,
            tax: bracket_tax.tax,
            breakdown: bracket_tax.breakdown,
            effective_rate: ratio(bracket_tax.tax, total_income),
        })
    }

    fn chargeable_income(
        &self,
        total_income: Decimal,
        total_reliefs: Decimal,
    ) -> Decimal {
        max(round_half_up(total_income - total_reliefs), Decimal::ZERO)
    }
}
