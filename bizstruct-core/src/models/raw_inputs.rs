use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::inputs::ZakatMethod;
use super::reliefs::ReliefCategory;

/// Calculation inputs as submitted by a form or file, before validation.
///
/// Every field is optional and numbers are plain `f64`, so values may be
/// missing, negative, or non-finite. Run [`crate::validation::validate_inputs`]
/// to report problems and [`crate::validation::sanitize_inputs`] to obtain
/// [`super::TaxCalculationInputs`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInputs {
    pub business_profit: Option<f64>,
    pub other_income: Option<f64>,
    pub monthly_salary: Option<f64>,
    pub compliance_costs: Option<f64>,
    pub audit_cost: Option<f64>,
    pub audit_criteria: Option<RawAuditCriteria>,
    pub reliefs: Option<BTreeMap<ReliefCategory, f64>>,
    pub apply_ya2025_dividend_surcharge: Option<bool>,
    pub dividend_distribution_percent: Option<f64>,
    pub has_foreign_ownership: Option<bool>,
    pub input_mode: Option<InputModeKind>,
    pub target_net_income: Option<f64>,
    pub zakat: Option<RawZakat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAuditCriteria {
    pub revenue: Option<f64>,
    pub total_assets: Option<f64>,
    pub employees: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawZakat {
    pub enabled: Option<bool>,
    pub amount_paid: Option<f64>,
    pub auto_calculate: Option<bool>,
    pub method: Option<ZakatMethod>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputModeKind {
    #[default]
    Profit,
    Target,
}
