//! Zakat treatment for individuals (rebate) and companies (deduction).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{max, round_half_up};
use crate::models::{ZakatMethod, ZakatResult, ZakatRules, ZakatSettings};

/// Individual zakat outcome against income tax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualZakat {
    pub result: ZakatResult,
    /// Income tax rebated; also `result.tax_benefit`.
    pub rebate: Decimal,
}

/// Company zakat before its corporate tax effect is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyZakat {
    pub enabled: bool,
    pub zakat_amount: Decimal,
    pub meets_nisab: bool,
    pub deduction: Decimal,
    pub excess_zakat: Decimal,
}

impl CompanyZakat {
    /// Final result once the corporate tax saved by the deduction is known.
    pub fn into_result(
        self,
        tax_saved: Decimal,
    ) -> ZakatResult {
        if !self.enabled {
            return ZakatResult::disabled();
        }
        ZakatResult {
            enabled: true,
            zakat_amount: self.zakat_amount,
            meets_nisab: self.meets_nisab,
            tax_benefit: tax_saved,
            excess_zakat: self.excess_zakat,
        }
    }
}

/// Applies zakat paid by an individual as a rebate, capped at the tax payable.
///
/// The whole zakat amount still leaves the payer's cash; the part above the
/// tax payable is tracked as `excess_zakat`.
pub fn individual_zakat(
    settings: &ZakatSettings,
    rules: &ZakatRules,
    total_income: Decimal,
    chargeable_income: Decimal,
    tax_before_zakat: Decimal,
) -> IndividualZakat {
    let (zakat_amount, base) = match settings {
        ZakatSettings::Disabled => {
            return IndividualZakat {
                result: ZakatResult::disabled(),
                rebate: Decimal::ZERO,
            };
        }
        ZakatSettings::Paid(amount) => (*amount, total_income),
        ZakatSettings::AutoCalculated(method) => {
            let base = match method {
                ZakatMethod::Gross => total_income,
                ZakatMethod::Net => chargeable_income,
            };
            (round_half_up(base * rules.rate), base)
        }
    };

    let rebate = zakat_amount.min(tax_before_zakat).max(Decimal::ZERO);

    IndividualZakat {
        result: ZakatResult {
            enabled: true,
            zakat_amount,
            meets_nisab: base >= rules.nisab,
            tax_benefit: rebate,
            excess_zakat: zakat_amount - rebate,
        },
        rebate,
    }
}

/// Applies business zakat as a deduction from company income, capped at the
/// statutory share of aggregate income.
pub fn company_zakat(
    settings: &ZakatSettings,
    rules: &ZakatRules,
    profit_before_zakat: Decimal,
) -> CompanyZakat {
    let aggregate_income = max(profit_before_zakat, Decimal::ZERO);
    let zakat_amount = match settings {
        ZakatSettings::Disabled => {
            return CompanyZakat {
                enabled: false,
                zakat_amount: Decimal::ZERO,
                meets_nisab: false,
                deduction: Decimal::ZERO,
                excess_zakat: Decimal::ZERO,
            };
        }
        ZakatSettings::Paid(amount) => *amount,
        ZakatSettings::AutoCalculated(_) => round_half_up(aggregate_income * rules.rate),
    };

    let cap = round_half_up(aggregate_income * rules.company_deduction_cap_rate);
    let deduction = zakat_amount.min(cap);

    CompanyZakat {
        enabled: true,
        zakat_amount,
        meets_nisab: aggregate_income >= rules.nisab,
        deduction,
        excess_zakat: zakat_amount - deduction,
    }
}
