//! Sole proprietorship ("Enterprise") scenario.
//!
//! Business profit is the owner's personal income, so there is a single tax
//! layer:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Gross income = business profit + other income |
//! | 2    | Chargeable income = gross income − capped reliefs |
//! | 3    | Income tax on chargeable income |
//! | 4    | Zakat rebate = min(zakat, tax) |
//! | 5    | Net tax = tax − rebate |
//! | 6    | Net cash = gross income − net tax − zakat paid |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use bizstruct_core::{TaxCalculationInputs, TaxRules};
//! use bizstruct_core::calculations::SolePropCalculator;
//!
//! let rules = TaxRules::ya2025();
//! let inputs = TaxCalculationInputs::with_profit(dec!(100000));
//!
//! let result = SolePropCalculator::new(&rules).calculate(&inputs).unwrap();
//!
//! assert_eq!(result.personal_tax, dec!(7690.00));
//! assert_eq!(result.net_cash, dec!(92310.00));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{format_ringgit, max, ratio, round_half_up};
use crate::calculations::error::{CalculationError, ensure_non_negative};
use crate::calculations::personal::PersonalTaxCalculator;
use crate::calculations::zakat::individual_zakat;
use crate::models::{SolePropScenarioResult, TaxCalculationInputs, TaxRules, WaterfallStep, ZakatResult};

/// Calculator for the sole proprietorship scenario.
#[derive(Debug, Clone)]
pub struct SolePropCalculator<'a> {
    rules: &'a TaxRules,
}

impl<'a> SolePropCalculator<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Calculates the owner's net cash when trading as a sole proprietor.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if the profit or other income is negative.
    pub fn calculate(
        &self,
        inputs: &TaxCalculationInputs,
    ) -> Result<SolePropScenarioResult, CalculationError> {
        let business_profit = ensure_non_negative("business profit", inputs.business_profit)?;
        let other_income = ensure_non_negative("other income", inputs.other_income)?;

        let total_income = business_profit + other_income;
        let total_reliefs = inputs.reliefs.total(&self.rules.relief_caps);

        let personal = PersonalTaxCalculator::new(&self.rules.personal_brackets)
            .calculate(total_income, total_reliefs)?;

        let zakat = individual_zakat(
            &inputs.zakat,
            &self.rules.zakat,
            total_income,
            personal.chargeable_income,
            personal.tax,
        );

        let personal_tax = max(personal.tax - zakat.rebate, Decimal::ZERO);
        let net_cash = round_half_up(total_income - personal_tax - zakat.result.zakat_amount);

        debug!(
            total_income = %total_income,
            personal_tax = %personal_tax,
            zakat = %zakat.result.zakat_amount,
            net_cash = %net_cash,
            "sole proprietorship scenario calculated"
        );

        let mut result = SolePropScenarioResult {
            business_profit,
            other_income,
            total_income,
            total_reliefs,
            chargeable_income: personal.chargeable_income,
            tax_before_zakat: personal.tax,
            zakat_rebate: zakat.rebate,
            personal_tax,
            tax_breakdown: personal.breakdown,
            zakat: zakat.result,
            net_cash,
            effective_tax_rate: ratio(personal_tax, total_income),
            waterfall: Vec::new(),
            insights: Vec::new(),
        };
        result.waterfall = self.waterfall(&result);
        result.insights = self.insights(&result.zakat);

        Ok(result)
    }

    fn waterfall(
        &self,
        result: &SolePropScenarioResult,
    ) -> Vec<WaterfallStep> {
        let mut steps = vec![
            WaterfallStep::add("Business Profit", result.business_profit),
            WaterfallStep::add("Other Income", result.other_income),
            WaterfallStep::equals("Gross Income", result.total_income),
            WaterfallStep::subtract("Tax Reliefs", result.total_reliefs).indented(),
            WaterfallStep::equals("Chargeable Income", result.chargeable_income).indented(),
        ];

        if result.zakat.enabled {
            steps.push(WaterfallStep::subtract("Income Tax", result.tax_before_zakat).indented());
            steps.push(WaterfallStep::add("Zakat Rebate", result.zakat_rebate).indented());
            steps.push(WaterfallStep::subtract("Net Income Tax", result.personal_tax));
            steps.push(WaterfallStep::subtract("Zakat Paid", result.zakat.zakat_amount));
        } else {
            steps.push(WaterfallStep::subtract("Income Tax", result.personal_tax));
        }

        steps.push(WaterfallStep::total("Net Cash", result.net_cash));
        steps
    }

    fn insights(
        &self,
        zakat: &ZakatResult,
    ) -> Vec<String> {
        let mut insights = vec![
            "No liability protection: personal assets are exposed to business debts and claims."
                .to_string(),
            "No mandatory EPF: retirement savings depend on voluntary contributions.".to_string(),
            "Minimal compliance cost: only business registration renewal and the annual Form B are required."
                .to_string(),
        ];

        if zakat.enabled {
            insights.push(format!(
                "Zakat of {} reduces income tax by {} through the 100% rebate.",
                format_ringgit(zakat.zakat_amount),
                format_ringgit(zakat.tax_benefit)
            ));
            if zakat.excess_zakat > Decimal::ZERO {
                insights.push(format!(
                    "{} of zakat exceeds the income tax payable and earns no rebate.",
                    format_ringgit(zakat.excess_zakat)
                ));
            }
        }

        insights
    }
}
