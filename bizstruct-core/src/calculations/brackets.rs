//! Progressive bracket evaluation shared by the personal and corporate
//! calculators.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use bizstruct_core::TaxRules;
//! use bizstruct_core::calculations::BracketEngine;
//!
//! let rules = TaxRules::ya2025();
//! let engine = BracketEngine::new(&rules.corporate_sme_brackets);
//! let result = engine.calculate(dec!(600000)).unwrap();
//!
//! assert_eq!(result.tax, dec!(99000.00));
//! assert_eq!(result.breakdown.len(), 2);
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::calculations::error::{CalculationError, ensure_non_negative};
use crate::models::{TaxBracket, TaxBracketBreakdown};

/// Tax on an amount together with the per-bracket attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTax {
    pub taxable_amount: Decimal,
    pub tax: Decimal,
    /// Only brackets the amount actually reaches.
    pub breakdown: Vec<TaxBracketBreakdown>,
}

/// Evaluator over an ordered, contiguous bracket table.
#[derive(Debug, Clone)]
pub struct BracketEngine<'a> {
    brackets: &'a [TaxBracket],
}

impl<'a> BracketEngine<'a> {
    /// Brackets should be sorted by `min` and cover `[0, ∞)`; see
    /// [`crate::TaxRules::validate`].
    pub fn new(brackets: &'a [TaxBracket]) -> Self {
        Self { brackets }
    }

    /// Calculates progressive tax on `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if `amount` is negative or the table is
    /// empty.
    pub fn calculate(
        &self,
        amount: Decimal,
    ) -> Result<BracketTax, CalculationError> {
        let amount = ensure_non_negative("taxable amount", amount)?;
        if self.brackets.is_empty() {
            return Err(CalculationError::NoTaxBrackets);
        }
        if amount.is_zero() {
            return Ok(BracketTax {
                taxable_amount: amount,
                tax: Decimal::ZERO,
                breakdown: Vec::new(),
            });
        }

        let mut raw_tax = Decimal::ZERO;
        let mut breakdown = Vec::new();
        for bracket in self.brackets {
            let in_bracket = bracket.overlap(amount);
            if in_bracket.is_zero() {
                continue;
            }
            let bracket_tax = in_bracket * bracket.rate;
            raw_tax += bracket_tax;
            breakdown.push(TaxBracketBreakdown {
                bracket_min: bracket.min,
                bracket_max: bracket.max,
                rate: bracket.rate,
                amount_in_bracket: in_bracket,
                tax_for_bracket: round_half_up(bracket_tax),
            });
        }

        Ok(BracketTax {
            taxable_amount: amount,
            tax: round_half_up(raw_tax),
            breakdown,
        })
    }
}
