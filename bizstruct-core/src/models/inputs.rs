use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::reliefs::Reliefs;

/// Size tests that decide whether a company may skip its statutory audit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditCriteria {
    pub revenue: Decimal,
    pub total_assets: Decimal,
    pub employees: u32,
}

/// Base used when zakat is auto-calculated for an individual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZakatMethod {
    /// Rate applied to total income.
    #[default]
    Gross,
    /// Rate applied to chargeable income (income after reliefs).
    Net,
}

/// How zakat enters a calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZakatSettings {
    #[default]
    Disabled,
    /// A known amount was (or will be) paid.
    Paid(Decimal),
    /// Zakat is derived from income at the statutory rate.
    AutoCalculated(ZakatMethod),
}

impl ZakatSettings {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Whether the caller supplied a profit or a desired take-home amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum InputMode {
    #[default]
    Profit,
    Target { target_net_income: Decimal },
}

/// Fully resolved calculation inputs.
///
/// Produced by [`crate::validation::sanitize_inputs`]; every optional field
/// already carries its default so calculators never branch on presence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxCalculationInputs {
    pub business_profit: Decimal,
    pub other_income: Decimal,
    pub monthly_salary: Decimal,
    pub compliance_costs: Decimal,
    pub audit_cost: Decimal,
    /// `None` when the company's size is unknown; the audit exemption is
    /// then not claimed.
    pub audit_criteria: Option<AuditCriteria>,
    pub reliefs: Reliefs,
    pub apply_ya2025_dividend_surcharge: bool,
    /// Share of post-tax profit paid out, 0–100.
    pub dividend_distribution_percent: Decimal,
    pub has_foreign_ownership: bool,
    pub input_mode: InputMode,
    pub zakat: ZakatSettings,
}

impl Default for TaxCalculationInputs {
    fn default() -> Self {
        Self {
            business_profit: Decimal::ZERO,
            other_income: Decimal::ZERO,
            monthly_salary: Decimal::ZERO,
            compliance_costs: Decimal::ZERO,
            audit_cost: Decimal::ZERO,
            audit_criteria: None,
            reliefs: Reliefs::default(),
            apply_ya2025_dividend_surcharge: false,
            dividend_distribution_percent: dec!(100),
            has_foreign_ownership: false,
            input_mode: InputMode::Profit,
            zakat: ZakatSettings::Disabled,
        }
    }
}

impl TaxCalculationInputs {
    /// Inputs for the given profit with every other field at its default.
    pub fn with_profit(business_profit: Decimal) -> Self {
        Self {
            business_profit,
            ..Default::default()
        }
    }

    pub fn annual_salary(&self) -> Decimal {
        self.monthly_salary * Decimal::from(12)
    }

    /// Copy of these inputs at a different business profit.
    pub fn at_profit(
        &self,
        business_profit: Decimal,
    ) -> Self {
        Self {
            business_profit,
            ..self.clone()
        }
    }
}
