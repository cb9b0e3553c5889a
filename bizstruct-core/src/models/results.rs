use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tax_bracket::TaxBracketBreakdown;
use super::waterfall::WaterfallStep;

/// Zakat outcome for one scenario.
///
/// For an individual `tax_benefit` is the rebate against income tax; for a
/// company it is the corporate tax saved by the zakat deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZakatResult {
    pub enabled: bool,
    pub zakat_amount: Decimal,
    pub meets_nisab: bool,
    pub tax_benefit: Decimal,
    /// Zakat paid beyond what earned a tax benefit. Never refunded.
    pub excess_zakat: Decimal,
}

impl ZakatResult {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            zakat_amount: Decimal::ZERO,
            meets_nisab: false,
            tax_benefit: Decimal::ZERO,
            excess_zakat: Decimal::ZERO,
        }
    }
}

/// Whether the company can carry the requested director salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryAffordability {
    /// Largest annual salary whose total employment cost fits in profit.
    pub max_affordable_salary: Decimal,
    pub max_affordable_monthly_salary: Decimal,
    pub is_affordable: bool,
    pub shortfall: Decimal,
    pub company_would_be_insolvent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolePropScenarioResult {
    pub business_profit: Decimal,
    pub other_income: Decimal,
    pub total_income: Decimal,
    pub total_reliefs: Decimal,
    pub chargeable_income: Decimal,
    pub tax_before_zakat: Decimal,
    pub zakat_rebate: Decimal,
    /// Income tax payable after the zakat rebate.
    pub personal_tax: Decimal,
    pub tax_breakdown: Vec<TaxBracketBreakdown>,
    pub zakat: ZakatResult,
    pub net_cash: Decimal,
    pub effective_tax_rate: Decimal,
    pub waterfall: Vec<WaterfallStep>,
    pub insights: Vec<String>,
}

/// Company-level figures of the Sdn Bhd scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLayer {
    pub business_profit: Decimal,
    pub annual_salary: Decimal,
    pub employer_epf: Decimal,
    pub employer_socso: Decimal,
    /// May be negative when the salary exceeds what the company earns.
    pub taxable_profit_before_zakat: Decimal,
    pub zakat_deduction: Decimal,
    pub taxable_profit: Decimal,
    pub corporate_tax: Decimal,
    pub corporate_tax_breakdown: Vec<TaxBracketBreakdown>,
    pub post_tax_profit: Decimal,
    pub dividends: Decimal,
    pub retained_earnings: Decimal,
    pub dividend_tax: Decimal,
}

/// Owner-level figures of the Sdn Bhd scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalLayer {
    pub annual_salary: Decimal,
    pub employee_epf: Decimal,
    pub employee_socso: Decimal,
    pub salary_after_epf: Decimal,
    pub other_income: Decimal,
    pub epf_relief: Decimal,
    pub total_reliefs: Decimal,
    pub chargeable_income: Decimal,
    pub personal_tax: Decimal,
    pub personal_tax_breakdown: Vec<TaxBracketBreakdown>,
    pub total_cash_from_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCosts {
    pub base: Decimal,
    pub audit: Decimal,
    pub audit_exempt: bool,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdnBhdScenarioResult {
    pub company: CompanyLayer,
    pub personal: PersonalLayer,
    pub affordability: SalaryAffordability,
    pub compliance: ComplianceCosts,
    pub zakat: ZakatResult,
    pub net_cash: Decimal,
    pub epf_savings: Decimal,
    /// Corporate, personal and dividend tax combined.
    pub total_tax: Decimal,
    pub effective_tax_rate: Decimal,
    pub company_waterfall: Vec<WaterfallStep>,
    pub personal_waterfall: Vec<WaterfallStep>,
    pub insights: Vec<String>,
}
