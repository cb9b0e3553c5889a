//! Input validation and sanitization.
//!
//! [`validate_inputs`] reports every problem with a set of [`RawInputs`] so a
//! form can show them all at once. [`sanitize_inputs`] never fails: it clamps
//! and defaults whatever it is given into [`TaxCalculationInputs`] that the
//! calculators accept.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::calculations::common::round_half_up;
use crate::models::{
    AuditCriteria, INDIVIDUAL_RELIEF, InputMode, InputModeKind, RawAuditCriteria, RawInputs,
    RawZakat, ReliefCategory, Reliefs, TaxCalculationInputs, ZakatSettings,
};

/// Largest amount accepted for any monetary field, in ringgit.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// A problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Checks raw inputs and returns every problem found.
///
/// An empty list means [`sanitize_inputs`] will not need to alter any value.
///
/// ```
/// use bizstruct_core::RawInputs;
/// use bizstruct_core::validation::validate_inputs;
///
/// let raw = RawInputs {
///     business_profit: Some(-5.0),
///     other_income: Some(0.0),
///     dividend_distribution_percent: Some(120.0),
///     ..Default::default()
/// };
///
/// let errors = validate_inputs(&raw);
///
/// assert_eq!(errors.len(), 2);
/// assert_eq!(errors[0].field, "business_profit");
/// ```
pub fn validate_inputs(raw: &RawInputs) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_required_amount(&mut errors, "business_profit", raw.business_profit);
    check_required_amount(&mut errors, "other_income", raw.other_income);
    check_amount(&mut errors, "monthly_salary", raw.monthly_salary);
    check_amount(&mut errors, "compliance_costs", raw.compliance_costs);
    check_amount(&mut errors, "audit_cost", raw.audit_cost);

    if let Some(criteria) = &raw.audit_criteria {
        check_amount(&mut errors, "audit_criteria.revenue", criteria.revenue);
        check_amount(&mut errors, "audit_criteria.total_assets", criteria.total_assets);
        check_amount(&mut errors, "audit_criteria.employees", criteria.employees);
    }

    if let Some(reliefs) = &raw.reliefs {
        for (category, amount) in reliefs {
            check_amount(&mut errors, &format!("reliefs.{}", category.as_str()), Some(*amount));
        }
    }

    if let Some(percent) = raw.dividend_distribution_percent {
        if !(0.0..=100.0).contains(&percent) {
            errors.push(ValidationError::new(
                "dividend_distribution_percent",
                "must be between 0 and 100",
            ));
        }
    }

    if raw.input_mode == Some(InputModeKind::Target) {
        check_required_amount(&mut errors, "target_net_income", raw.target_net_income);
    }

    let zakat_enabled = raw.zakat.as_ref().is_some_and(|z| z.enabled == Some(true));
    if zakat_enabled {
        check_amount(
            &mut errors,
            "zakat.amount_paid",
            raw.zakat.as_ref().and_then(|z| z.amount_paid),
        );
    }

    errors
}

fn check_required_amount(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: Option<f64>,
) {
    if value.is_none() {
        errors.push(ValidationError::new(field, "is required"));
        return;
    }
    check_amount(errors, field, value);
}

fn check_amount(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: Option<f64>,
) {
    let Some(value) = value else {
        return;
    };
    let message = if !value.is_finite() {
        "must be a valid number"
    } else if value < 0.0 {
        "cannot be negative"
    } else if value > MAX_AMOUNT {
        "exceeds the maximum of RM1,000,000,000"
    } else {
        return;
    };
    errors.push(ValidationError::new(field, message));
}

/// Resolves raw inputs into calculation inputs.
///
/// Missing or non-finite amounts become zero, negative amounts are clamped to
/// zero, amounts above [`MAX_AMOUNT`] are clamped to it, percentages are
/// clamped to `[0, 100]`, and employee counts are rounded to the nearest
/// whole person. The individual relief is always included.
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::RawInputs;
/// use bizstruct_core::validation::sanitize_inputs;
///
/// let raw = RawInputs {
///     business_profit: Some(120000.456),
///     other_income: Some(-50.0),
///     dividend_distribution_percent: Some(150.0),
///     ..Default::default()
/// };
///
/// let inputs = sanitize_inputs(&raw);
///
/// assert_eq!(inputs.business_profit, dec!(120000.46));
/// assert_eq!(inputs.other_income, dec!(0));
/// assert_eq!(inputs.dividend_distribution_percent, dec!(100));
/// ```
pub fn sanitize_inputs(raw: &RawInputs) -> TaxCalculationInputs {
    TaxCalculationInputs {
        business_profit: sanitize_amount("business_profit", raw.business_profit),
        other_income: sanitize_amount("other_income", raw.other_income),
        monthly_salary: sanitize_amount("monthly_salary", raw.monthly_salary),
        compliance_costs: sanitize_amount("compliance_costs", raw.compliance_costs),
        audit_cost: sanitize_amount("audit_cost", raw.audit_cost),
        audit_criteria: raw.audit_criteria.as_ref().map(sanitize_audit_criteria),
        reliefs: sanitize_reliefs(raw),
        apply_ya2025_dividend_surcharge: raw.apply_ya2025_dividend_surcharge.unwrap_or(false),
        dividend_distribution_percent: sanitize_percent(raw.dividend_distribution_percent),
        has_foreign_ownership: raw.has_foreign_ownership.unwrap_or(false),
        input_mode: match raw.input_mode.unwrap_or_default() {
            InputModeKind::Profit => InputMode::Profit,
            InputModeKind::Target => InputMode::Target {
                target_net_income: sanitize_amount("target_net_income", raw.target_net_income),
            },
        },
        zakat: raw.zakat.as_ref().map_or(ZakatSettings::Disabled, sanitize_zakat),
    }
}

fn sanitize_amount(
    field: &str,
    value: Option<f64>,
) -> Decimal {
    let Some(value) = value else {
        return Decimal::ZERO;
    };
    let clamped = if !value.is_finite() {
        warn!(field, "non-finite amount replaced with zero");
        0.0
    } else if value < 0.0 {
        warn!(field, value, "negative amount clamped to zero");
        0.0
    } else if value > MAX_AMOUNT {
        warn!(field, value, "amount clamped to maximum");
        MAX_AMOUNT
    } else {
        value
    };
    round_half_up(Decimal::from_f64(clamped).unwrap_or(Decimal::ZERO))
}

fn sanitize_percent(value: Option<f64>) -> Decimal {
    let percent = match value {
        None => 100.0,
        Some(v) if v.is_nan() => {
            warn!("non-numeric dividend distribution percent replaced with 100");
            100.0
        }
        Some(v) => v.clamp(0.0, 100.0),
    };
    Decimal::from_f64(percent).unwrap_or(Decimal::ONE_HUNDRED)
}

fn sanitize_audit_criteria(raw: &RawAuditCriteria) -> AuditCriteria {
    let employees = match raw.employees {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u32,
        _ => 0,
    };
    AuditCriteria {
        revenue: sanitize_amount("audit_criteria.revenue", raw.revenue),
        total_assets: sanitize_amount("audit_criteria.total_assets", raw.total_assets),
        employees,
    }
}

fn sanitize_reliefs(raw: &RawInputs) -> Reliefs {
    let Some(claimed) = &raw.reliefs else {
        return Reliefs::default();
    };

    let mut reliefs = Reliefs::none().with(ReliefCategory::Individual, INDIVIDUAL_RELIEF);
    for (category, amount) in claimed {
        if *category == ReliefCategory::Individual {
            continue;
        }
        reliefs.set(*category, sanitize_amount(category.as_str(), Some(*amount)));
    }
    reliefs
}

/// An explicit amount wins over auto-calculation. Enabled zakat with neither
/// counts as nothing paid.
fn sanitize_zakat(raw: &RawZakat) -> ZakatSettings {
    if raw.enabled != Some(true) {
        return ZakatSettings::Disabled;
    }
    match (raw.amount_paid, raw.auto_calculate) {
        (Some(amount), _) => ZakatSettings::Paid(sanitize_amount("zakat.amount_paid", Some(amount))),
        (None, Some(true)) => ZakatSettings::AutoCalculated(raw.method.unwrap_or_default()),
        (None, _) => ZakatSettings::Paid(Decimal::ZERO),
    }
}
