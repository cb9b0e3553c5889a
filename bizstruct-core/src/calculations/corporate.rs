//! Company income tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::brackets::BracketEngine;
use crate::calculations::error::{CalculationError, ensure_non_negative};
use crate::models::{TaxBracket, TaxBracketBreakdown};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateTaxResult {
    pub taxable_profit: Decimal,
    pub tax: Decimal,
    pub breakdown: Vec<TaxBracketBreakdown>,
}

/// Calculator for corporate tax on chargeable profit.
///
/// Whether the SME or the standard table applies is decided by the caller
/// (see [`crate::TaxRules::corporate_brackets`]).
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::TaxRules;
/// use bizstruct_core::calculations::CorporateTaxCalculator;
///
/// let rules = TaxRules::ya2025();
/// let calculator = CorporateTaxCalculator::new(rules.corporate_brackets(true));
///
/// assert_eq!(calculator.calculate(dec!(150000)).unwrap().tax, dec!(22500.00));
/// ```
#[derive(Debug, Clone)]
pub struct CorporateTaxCalculator<'a> {
    brackets: &'a [TaxBracket],
}

impl<'a> CorporateTaxCalculator<'a> {
    pub fn new(brackets: &'a [TaxBracket]) -> Self {
        Self { brackets }
    }

    /// # Errors
    ///
    /// Returns [`CalculationError`] if `taxable_profit` is negative or no
    /// brackets were provided.
    pub fn calculate(
        &self,
        taxable_profit: Decimal,
    ) -> Result<CorporateTaxResult, CalculationError> {
        let taxable_profit = ensure_non_negative("taxable profit", taxable_profit)?;
        let bracket_tax = BracketEngine::new(self.brackets).calculate(taxable_profit)?;

        debug!(
            taxable_profit = %taxable_profit,
            tax = %bracket_tax.tax,
            "corporate tax calculated"
        );

        Ok(CorporateTaxResult {
            taxable_profit,
            tax: bracket_tax.tax,
            breakdown: bracket_tax.breakdown,
        })
    }
}
