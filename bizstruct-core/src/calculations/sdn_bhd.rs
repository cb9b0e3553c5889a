//! Private limited company ("Sdn Bhd") scenario.
//!
//! Profit is taxed twice over two layers:
//!
//! - **Company**: salary and employer contributions are deducted, business
//!   zakat is deducted up to its cap, corporate tax is charged at SME rates,
//!   and the remainder is split between dividends and retained earnings.
//! - **Owner**: the director salary is taxed as personal income after
//!   employee contributions. Dividends arrive tax-free apart from the optional
//!   YA2025 surcharge on the part above RM100,000.
//!
//! The owner's net cash is salary take-home plus dividends, less dividend
//! tax, compliance costs and zakat paid.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::{format_ringgit, max, percent_of, ratio, round_half_up};
use crate::calculations::contributions::{ContributionCalculator, EmploymentCost};
use crate::calculations::corporate::{CorporateTaxCalculator, CorporateTaxResult};
use crate::calculations::error::{CalculationError, ensure_non_negative};
use crate::calculations::personal::PersonalTaxCalculator;
use crate::calculations::zakat::company_zakat;
use crate::models::{
    AuditCriteria, CompanyLayer, ComplianceCosts, PersonalLayer, ReliefCategory,
    SdnBhdScenarioResult, TaxCalculationInputs, TaxRules, WaterfallStep, ZakatResult,
};

/// Calculator for the Sdn Bhd scenario.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use bizstruct_core::{TaxCalculationInputs, TaxRules};
/// use bizstruct_core::calculations::SdnBhdCalculator;
///
/// let rules = TaxRules::ya2025();
/// let inputs = TaxCalculationInputs {
///     monthly_salary: dec!(10000),
///     compliance_costs: dec!(10000),
///     ..TaxCalculationInputs::with_profit(dec!(1000000))
/// };
///
/// let result = SdnBhdCalculator::new(&rules).calculate(&inputs).unwrap();
///
/// assert_eq!(result.company.corporate_tax, dec!(162744.00));
/// assert_eq!(result.personal.personal_tax, dec!(10400.00));
/// assert_eq!(result.net_cash, dec!(789256.00));
/// ```
#[derive(Debug, Clone)]
pub struct SdnBhdCalculator<'a> {
    rules: &'a TaxRules,
}

impl<'a> SdnBhdCalculator<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Calculates both layers of the company scenario.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if any monetary input is negative.
    pub fn calculate(
        &self,
        inputs: &TaxCalculationInputs,
    ) -> Result<SdnBhdScenarioResult, CalculationError> {
        let business_profit = ensure_non_negative("business profit", inputs.business_profit)?;
        let other_income = ensure_non_negative("other income", inputs.other_income)?;
        let compliance_costs = ensure_non_negative("compliance costs", inputs.compliance_costs)?;
        let audit_cost = ensure_non_negative("audit cost", inputs.audit_cost)?;

        let contributions = ContributionCalculator::new(&self.rules.contributions);
        let employment = contributions.calculate(inputs.monthly_salary)?;

        let (company, zakat) = self.company_layer(inputs, business_profit, &employment)?;
        let personal = self.personal_layer(inputs, other_income, &employment)?;
        let affordability = contributions.affordability(&employment, business_profit);
        let compliance = self.compliance(compliance_costs, audit_cost, inputs.audit_criteria.as_ref());

        let net_cash = round_half_up(
            personal.total_cash_from_income + company.dividends
                - company.dividend_tax
                - compliance.total
                - zakat.zakat_amount,
        );
        let total_tax = company.corporate_tax + personal.personal_tax + company.dividend_tax;

        debug!(
            corporate_tax = %company.corporate_tax,
            personal_tax = %personal.personal_tax,
            dividends = %company.dividends,
            net_cash = %net_cash,
            "sdn bhd scenario calculated"
        );

        let mut result = SdnBhdScenarioResult {
            epf_savings: employment.employer_epf + employment.employee_epf,
            effective_tax_rate: ratio(total_tax, business_profit + other_income),
            total_tax,
            net_cash,
            company,
            personal,
            affordability,
            compliance,
            zakat,
            company_waterfall: Vec::new(),
            personal_waterfall: Vec::new(),
            insights: Vec::new(),
        };
        result.company_waterfall = company_waterfall(&result);
        result.personal_waterfall = personal_waterfall(&result);
        result.insights = insights(&result);

        Ok(result)
    }

    fn company_layer(
        &self,
        inputs: &TaxCalculationInputs,
        business_profit: Decimal,
        employment: &EmploymentCost,
    ) -> Result<(CompanyLayer, ZakatResult), CalculationError> {
        let profit_before_zakat = business_profit - employment.employer_total();
        if profit_before_zakat < Decimal::ZERO {
            warn!(
                business_profit = %business_profit,
                employment_cost = %employment.employer_total(),
                "company makes a loss after director salary"
            );
        }

        let zakat = company_zakat(&inputs.zakat, &self.rules.zakat, profit_before_zakat);
        let taxable_profit = max(profit_before_zakat - zakat.deduction, Decimal::ZERO);

        let corporate = self.corporate_tax(taxable_profit)?;
        let tax_saved = if zakat.deduction > Decimal::ZERO {
            self.corporate_tax(max(profit_before_zakat, Decimal::ZERO))?.tax - corporate.tax
        } else {
            Decimal::ZERO
        };

        let post_tax_profit = max(taxable_profit - corporate.tax, Decimal::ZERO);
        let percent = inputs
            .dividend_distribution_percent
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        let dividends = round_half_up(percent_of(post_tax_profit, percent));

        let company = CompanyLayer {
            business_profit,
            annual_salary: employment.annual_salary,
            employer_epf: employment.employer_epf,
            employer_socso: employment.employer_socso,
            taxable_profit_before_zakat: profit_before_zakat,
            zakat_deduction: zakat.deduction,
            taxable_profit,
            corporate_tax: corporate.tax,
            corporate_tax_breakdown: corporate.breakdown,
            post_tax_profit,
            dividends,
            retained_earnings: post_tax_profit - dividends,
            dividend_tax: self.dividend_tax(dividends, inputs.apply_ya2025_dividend_surcharge),
        };

        Ok((company, zakat.into_result(tax_saved)))
    }

    fn corporate_tax(
        &self,
        taxable_profit: Decimal,
    ) -> Result<CorporateTaxResult, CalculationError> {
        CorporateTaxCalculator::new(&self.rules.corporate_sme_brackets).calculate(taxable_profit)
    }

    fn dividend_tax(
        &self,
        dividends: Decimal,
        surcharge_applies: bool,
    ) -> Decimal {
        let threshold = self.rules.dividend.surcharge_threshold;
        if !surcharge_applies || dividends <= threshold {
            return Decimal::ZERO;
        }
        round_half_up((dividends - threshold) * self.rules.dividend.surcharge_rate)
    }

    fn personal_layer(
        &self,
        inputs: &TaxCalculationInputs,
        other_income: Decimal,
        employment: &EmploymentCost,
    ) -> Result<PersonalLayer, CalculationError> {
        let caps = &self.rules.relief_caps;
        let epf_relief = match caps.get(&ReliefCategory::EpfAndLifeInsurance) {
            Some(cap) => employment.employee_epf.min(*cap),
            None => employment.employee_epf,
        };
        let reliefs = inputs
            .reliefs
            .clone()
            .with(ReliefCategory::EpfAndLifeInsurance, epf_relief);
        let total_reliefs = reliefs.total(caps);

        let personal = PersonalTaxCalculator::new(&self.rules.personal_brackets)
            .calculate(employment.annual_salary + other_income, total_reliefs)?;

        let salary_after_epf = employment.take_home_salary();

        Ok(PersonalLayer {
            annual_salary: employment.annual_salary,
            employee_epf: employment.employee_epf,
            employee_socso: employment.employee_socso,
            salary_after_epf,
            other_income,
            epf_relief,
            total_reliefs,
            chargeable_income: personal.chargeable_income,
            personal_tax: personal.tax,
            personal_tax_breakdown: personal.breakdown,
            total_cash_from_income: salary_after_epf + other_income - personal.tax,
        })
    }

    fn compliance(
        &self,
        base: Decimal,
        audit_cost: Decimal,
        criteria: Option<&AuditCriteria>,
    ) -> ComplianceCosts {
        let audit_exempt = criteria.is_some_and(|c| self.is_audit_exempt(c));
        let audit = if audit_exempt { Decimal::ZERO } else { audit_cost };

        ComplianceCosts {
            base,
            audit,
            audit_exempt,
            total: base + audit,
        }
    }

    /// A company is exempt only when every size test passes.
    fn is_audit_exempt(
        &self,
        criteria: &AuditCriteria,
    ) -> bool {
        let limits = &self.rules.audit_exemption;
        criteria.revenue <= limits.max_revenue
            && criteria.total_assets <= limits.max_total_assets
            && criteria.employees <= limits.max_employees
    }
}

fn company_waterfall(result: &SdnBhdScenarioResult) -> Vec<WaterfallStep> {
    let company = &result.company;
    let mut steps = vec![
        WaterfallStep::add("Business Profit", company.business_profit),
        WaterfallStep::subtract("Director Salary", company.annual_salary),
        WaterfallStep::subtract("Employer EPF", company.employer_epf),
        WaterfallStep::subtract("Employer SOCSO", company.employer_socso),
        WaterfallStep::equals("Profit Before Zakat", company.taxable_profit_before_zakat),
    ];

    if result.zakat.enabled {
        steps.push(WaterfallStep::subtract("Zakat Deduction", company.zakat_deduction));
    }

    let unabsorbed =
        company.taxable_profit - (company.taxable_profit_before_zakat - company.zakat_deduction);
    if unabsorbed > Decimal::ZERO {
        steps.push(WaterfallStep::add("Loss Carried Forward", unabsorbed));
    }

    steps.extend([
        WaterfallStep::equals("Chargeable Profit", company.taxable_profit),
        WaterfallStep::subtract("Corporate Tax", company.corporate_tax),
        WaterfallStep::equals("Post-Tax Profit", company.post_tax_profit),
        WaterfallStep::subtract("Dividends Paid", company.dividends),
        WaterfallStep::total("Retained Earnings", company.retained_earnings),
    ]);
    steps
}

fn personal_waterfall(result: &SdnBhdScenarioResult) -> Vec<WaterfallStep> {
    let personal = &result.personal;
    let mut steps = vec![
        WaterfallStep::add("Director Salary", personal.annual_salary),
        WaterfallStep::subtract("Employee EPF", personal.employee_epf),
        WaterfallStep::subtract("Employee SOCSO", personal.employee_socso),
        WaterfallStep::add("Other Income", personal.other_income),
        WaterfallStep::equals("Chargeable Income", personal.chargeable_income).indented(),
        WaterfallStep::subtract("Personal Tax", personal.personal_tax),
        WaterfallStep::add("Dividends Received", result.company.dividends),
    ];

    if result.company.dividend_tax > Decimal::ZERO {
        steps.push(WaterfallStep::subtract("Dividend Tax", result.company.dividend_tax));
    }
    steps.push(WaterfallStep::subtract("Compliance Costs", result.compliance.total));
    if result.zakat.enabled {
        steps.push(WaterfallStep::subtract("Zakat Paid", result.zakat.zakat_amount));
    }

    steps.push(WaterfallStep::total("Net Cash", result.net_cash));
    steps
}

fn insights(result: &SdnBhdScenarioResult) -> Vec<String> {
    let mut insights = Vec::new();

    if result.epf_savings > Decimal::ZERO {
        insights.push(format!(
            "{} a year builds up in EPF retirement savings ({} employer, {} employee).",
            format_ringgit(result.epf_savings),
            format_ringgit(result.company.employer_epf),
            format_ringgit(result.personal.employee_epf)
        ));
    } else {
        insights.push("No director salary is paid, so no EPF savings build up.".to_string());
    }

    if result.company.retained_earnings > Decimal::ZERO {
        insights.push(format!(
            "{} stays in the company as retained earnings for reinvestment.",
            format_ringgit(result.company.retained_earnings)
        ));
    }

    insights.push("Limited liability: personal assets are protected from company debts.".to_string());

    if result.compliance.audit_exempt {
        insights.push(format!(
            "The company qualifies for audit exemption; compliance costs are {} a year.",
            format_ringgit(result.compliance.total)
        ));
    } else {
        insights.push(format!(
            "Company secretary, audit and annual filings cost {} a year.",
            format_ringgit(result.compliance.total)
        ));
    }

    if result.zakat.enabled {
        insights.push(format!(
            "Business zakat of {} saves {} in corporate tax as a deduction.",
            format_ringgit(result.zakat.zakat_amount),
            format_ringgit(result.zakat.tax_benefit)
        ));
        if result.zakat.excess_zakat > Decimal::ZERO {
            insights.push(format!(
                "{} of zakat exceeds the 2.5% deduction cap and earns no tax relief.",
                format_ringgit(result.zakat.excess_zakat)
            ));
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::waterfall::{final_total, net_movement};
    use crate::models::{Reliefs, ZakatMethod, ZakatSettings};

    fn calculate(inputs: &TaxCalculationInputs) -> SdnBhdScenarioResult {
        let rules = TaxRules::ya2025();
        SdnBhdCalculator::new(&rules).calculate(inputs).unwrap()
    }

    fn million_with_salary() -> TaxCalculationInputs {
        TaxCalculationInputs {
            monthly_salary: dec!(10000),
            compliance_costs: dec!(10000),
            ..TaxCalculationInputs::with_profit(dec!(1000000))
        }
    }

    // =========================================================================
    // company layer tests
    // =========================================================================

    #[test]
    fn company_layer_for_one_million_profit() {
        let result = calculate(&million_with_salary());
        let company = &result.company;

        assert_eq!(company.annual_salary, dec!(120000));
        assert_eq!(company.employer_epf, dec!(14400.00));
        assert_eq!(company.employer_socso, dec!(0));
        assert_eq!(company.taxable_profit_before_zakat, dec!(865600.00));
        assert_eq!(company.corporate_tax, dec!(162744.00));
        assert_eq!(company.post_tax_profit, dec!(702856.00));
        assert_eq!(company.dividends, dec!(702856.00));
        assert_eq!(company.retained_earnings, Decimal::ZERO);
    }

    #[test]
    fn partial_distribution_retains_the_rest() {
        let inputs = TaxCalculationInputs {
            dividend_distribution_percent: dec!(50),
            ..TaxCalculationInputs::with_profit(dec!(500000))
        };

        let result = calculate(&inputs);

        // 22,500 + 17% of 350,000.
        assert_eq!(result.company.corporate_tax, dec!(82000.00));
        assert_eq!(result.company.dividends, dec!(209000.00));
        assert_eq!(result.company.retained_earnings, dec!(209000.00));
        assert_eq!(result.net_cash, dec!(209000.00));
    }

    #[test]
    fn dividend_surcharge_applies_above_threshold() {
        let inputs = TaxCalculationInputs {
            apply_ya2025_dividend_surcharge: true,
            ..TaxCalculationInputs::with_profit(dec!(500000))
        };

        let result = calculate(&inputs);

        assert_eq!(result.company.dividends, dec!(418000.00));
        assert_eq!(result.company.dividend_tax, dec!(6360.00));
        assert_eq!(result.net_cash, dec!(411640.00));
    }

    #[test]
    fn dividend_surcharge_ignored_without_flag() {
        let result = calculate(&TaxCalculationInputs::with_profit(dec!(500000)));

        assert_eq!(result.company.dividend_tax, Decimal::ZERO);
    }

    #[test]
    fn salary_above_profit_leaves_nothing_taxable() {
        let inputs = TaxCalculationInputs {
            monthly_salary: dec!(10000),
            ..TaxCalculationInputs::with_profit(dec!(100000))
        };

        let result = calculate(&inputs);

        assert_eq!(result.company.taxable_profit_before_zakat, dec!(-34400.00));
        assert_eq!(result.company.taxable_profit, Decimal::ZERO);
        assert_eq!(result.company.corporate_tax, Decimal::ZERO);
        assert_eq!(result.company.dividends, Decimal::ZERO);
        assert!(result.affordability.company_would_be_insolvent);
        assert_eq!(result.affordability.shortfall, dec!(34400.00));
    }

    // =========================================================================
    // personal layer tests
    // =========================================================================

    #[test]
    fn personal_layer_uses_capped_epf_relief() {
        let result = calculate(&million_with_salary());
        let personal = &result.personal;

        assert_eq!(personal.employee_epf, dec!(13200.00));
        assert_eq!(personal.epf_relief, dec!(7000));
        assert_eq!(personal.total_reliefs, dec!(16000));
        assert_eq!(personal.chargeable_income, dec!(104000.00));
        assert_eq!(personal.personal_tax, dec!(10400.00));
        assert_eq!(personal.salary_after_epf, dec!(106800.00));
        assert_eq!(personal.total_cash_from_income, dec!(96400.00));
    }

    #[test]
    fn user_epf_relief_is_replaced_by_employee_epf() {
        let inputs = TaxCalculationInputs {
            monthly_salary: dec!(3000),
            reliefs: Reliefs::default().with(ReliefCategory::EpfAndLifeInsurance, dec!(7000)),
            ..TaxCalculationInputs::with_profit(dec!(200000))
        };

        let result = calculate(&inputs);

        // 11% of 36,000.
        assert_eq!(result.personal.epf_relief, dec!(3960.00));
        assert_eq!(result.personal.total_reliefs, dec!(12960.00));
    }

    #[test]
    fn low_salary_pays_socso_on_both_sides() {
        let inputs = TaxCalculationInputs {
            monthly_salary: dec!(4000),
            ..TaxCalculationInputs::with_profit(dec!(200000))
        };

        let result = calculate(&inputs);

        assert_eq!(result.company.employer_epf, dec!(6240.00));
        assert_eq!(result.company.employer_socso, dec!(840.00));
        assert_eq!(result.personal.employee_socso, dec!(240.00));
        assert_eq!(result.epf_savings, dec!(11520.00));
    }

    // =========================================================================
    // net cash tests
    // =========================================================================

    #[test]
    fn net_cash_for_one_million_profit() {
        let result = calculate(&million_with_salary());

        assert_eq!(result.compliance.total, dec!(10000));
        assert_eq!(result.net_cash, dec!(789256.00));
        assert_eq!(result.total_tax, dec!(173144.00));
        assert_eq!(result.effective_tax_rate, dec!(0.1731));
    }

    #[test]
    fn audit_cost_waived_for_small_companies() {
        let small = AuditCriteria {
            revenue: dec!(80000),
            total_assets: dec!(200000),
            employees: 3,
        };
        let inputs = TaxCalculationInputs {
            compliance_costs: dec!(3000),
            audit_cost: dec!(5000),
            audit_criteria: Some(small.clone()),
            ..TaxCalculationInputs::with_profit(dec!(90000))
        };

        let exempt = calculate(&inputs);
        let too_many_staff = calculate(&TaxCalculationInputs {
            audit_criteria: Some(AuditCriteria { employees: 6, ..small }),
            ..inputs.clone()
        });
        let unknown = calculate(&TaxCalculationInputs {
            audit_criteria: None,
            ..inputs
        });

        assert!(exempt.compliance.audit_exempt);
        assert_eq!(exempt.compliance.total, dec!(3000));
        assert_eq!(too_many_staff.compliance.total, dec!(8000));
        assert_eq!(unknown.compliance.total, dec!(8000));
    }

    #[test]
    fn negative_compliance_cost_is_rejected() {
        let rules = TaxRules::ya2025();
        let inputs = TaxCalculationInputs {
            compliance_costs: dec!(-1),
            ..TaxCalculationInputs::with_profit(dec!(100000))
        };

        let result = SdnBhdCalculator::new(&rules).calculate(&inputs);

        assert!(matches!(
            result,
            Err(CalculationError::NegativeAmount { field: "compliance costs", .. })
        ));
    }

    // =========================================================================
    // zakat tests
    // =========================================================================

    #[test]
    fn auto_zakat_is_deducted_and_paid() {
        let inputs = TaxCalculationInputs {
            zakat: ZakatSettings::AutoCalculated(ZakatMethod::Gross),
            ..TaxCalculationInputs::with_profit(dec!(1000000))
        };

        let result = calculate(&inputs);

        assert_eq!(result.zakat.zakat_amount, dec!(25000.00));
        assert_eq!(result.company.zakat_deduction, dec!(25000.00));
        assert_eq!(result.company.corporate_tax, dec!(189000.00));
        assert_eq!(result.zakat.tax_benefit, dec!(6000.00));
        assert_eq!(result.net_cash, dec!(761000.00));
    }

    #[test]
    fn zakat_above_cap_is_excess() {
        let inputs = TaxCalculationInputs {
            zakat: ZakatSettings::Paid(dec!(30000)),
            ..TaxCalculationInputs::with_profit(dec!(1000000))
        };

        let result = calculate(&inputs);

        assert_eq!(result.company.zakat_deduction, dec!(25000.00));
        assert_eq!(result.zakat.excess_zakat, dec!(5000.00));
        assert_eq!(result.net_cash, dec!(756000.00));
        assert!(result.insights.iter().any(|i| i.contains("deduction cap")));
    }

    // =========================================================================
    // waterfall tests
    // =========================================================================

    #[test]
    fn waterfalls_net_to_their_totals() {
        let cases = [
            million_with_salary(),
            TaxCalculationInputs {
                monthly_salary: dec!(10000),
                ..TaxCalculationInputs::with_profit(dec!(100000))
            },
            TaxCalculationInputs {
                monthly_salary: dec!(4500),
                other_income: dec!(15000),
                dividend_distribution_percent: dec!(40),
                apply_ya2025_dividend_surcharge: true,
                zakat: ZakatSettings::Paid(dec!(9000)),
                ..TaxCalculationInputs::with_profit(dec!(750000))
            },
        ];

        for inputs in cases {
            let result = calculate(&inputs);

            assert_eq!(net_movement(&result.company_waterfall), result.company.retained_earnings);
            assert_eq!(
                final_total(&result.company_waterfall),
                Some(result.company.retained_earnings)
            );
            assert_eq!(net_movement(&result.personal_waterfall), result.net_cash);
            assert_eq!(final_total(&result.personal_waterfall), Some(result.net_cash));
        }
    }

    #[test]
    fn loss_is_carried_forward_in_company_waterfall() {
        let result = calculate(&TaxCalculationInputs {
            monthly_salary: dec!(10000),
            ..TaxCalculationInputs::with_profit(dec!(100000))
        });

        let step = result
            .company_waterfall
            .iter()
            .find(|s| s.label == "Loss Carried Forward")
            .unwrap();
        assert_eq!(step.amount, dec!(34400.00));
    }

    #[test]
    fn insights_mention_epf_and_liability() {
        let result = calculate(&million_with_salary());

        assert!(result.insights[0].contains("EPF"));
        assert!(result.insights.iter().any(|i| i.contains("Limited liability")));
    }
}
