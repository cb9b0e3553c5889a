use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::RulesError;

/// Errors that can occur during scenario calculations.
///
/// These are contract violations: inputs that went through
/// [`crate::validation::sanitize_inputs`] never produce them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    /// A required amount was negative.
    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    /// No tax brackets were provided for the calculation.
    #[error("no tax brackets provided")]
    NoTaxBrackets,

    /// The rule set failed validation.
    #[error("invalid tax rules: {0}")]
    InvalidRules(#[from] RulesError),
}

/// Returns `value` unchanged, or an error naming `field` when it is negative.
pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, CalculationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CalculationError::NegativeAmount { field, value });
    }
    Ok(value)
}
