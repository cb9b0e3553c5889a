//! End-to-end tests: raw inputs through validation, sanitization and the
//! comparator.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bizstruct_core::calculations::{Comparator, CrossoverSearch};
use bizstruct_core::models::waterfall::net_movement;
use bizstruct_core::{
    ComparisonResult, RawInputs, RawZakat, ReliefCategory, Structure, TaxCalculationInputs,
    TaxRules, ZakatMethod, sanitize_inputs, validate_inputs,
};

fn compare_raw(raw: &RawInputs) -> ComparisonResult {
    assert_eq!(validate_inputs(raw), vec![]);
    let rules = TaxRules::ya2025();
    Comparator::new(&rules)
        .compare(&sanitize_inputs(raw))
        .expect("sanitized inputs should compare")
}

fn full_reliefs() -> BTreeMap<ReliefCategory, f64> {
    BTreeMap::from([
        (ReliefCategory::EpfAndLifeInsurance, 7000.0),
        (ReliefCategory::EducationAndMedicalInsurance, 3000.0),
        (ReliefCategory::Lifestyle, 2500.0),
        (ReliefCategory::Sspn, 2500.0),
    ])
}

#[test]
fn test_three_hundred_thousand_with_full_reliefs() {
    let result = compare_raw(&RawInputs {
        business_profit: Some(300000.0),
        other_income: Some(0.0),
        reliefs: Some(full_reliefs()),
        ..Default::default()
    });

    assert_eq!(result.sole_prop.total_reliefs, dec!(24000));
    assert_eq!(result.sole_prop.personal_tax, dec!(53660.00));
    assert_eq!(result.sole_prop.net_cash, dec!(246340.00));
}

#[test]
fn test_one_million_with_salary_favours_sdn_bhd() {
    let result = compare_raw(&RawInputs {
        business_profit: Some(1000000.0),
        other_income: Some(0.0),
        monthly_salary: Some(10000.0),
        compliance_costs: Some(10000.0),
        ..Default::default()
    });

    assert_eq!(result.which_is_better, Structure::SdnBhd);
    assert!(result.difference > Decimal::ZERO);
    assert!(result.savings_if_switch > dec!(10000));
    assert!(!result.has_affordability_issue);
}

#[test]
fn test_unaffordable_salary_is_flagged() {
    let result = compare_raw(&RawInputs {
        business_profit: Some(100000.0),
        other_income: Some(0.0),
        monthly_salary: Some(10000.0),
        ..Default::default()
    });

    assert!(result.sdn_bhd.affordability.company_would_be_insolvent);
    assert!(result.sdn_bhd.affordability.shortfall > Decimal::ZERO);
    assert!(result.has_affordability_issue);
    assert_ne!(result.which_is_better, Structure::SdnBhd);
}

#[test]
fn test_zakat_flows_through_both_scenarios() {
    let result = compare_raw(&RawInputs {
        business_profit: Some(400000.0),
        other_income: Some(0.0),
        zakat: Some(RawZakat {
            enabled: Some(true),
            auto_calculate: Some(true),
            method: Some(ZakatMethod::Gross),
            ..Default::default()
        }),
        ..Default::default()
    });

    assert_eq!(result.sole_prop.zakat.zakat_amount, dec!(10000.00));
    assert_eq!(result.sole_prop.zakat_rebate, dec!(10000.00));
    assert_eq!(result.sdn_bhd.company.zakat_deduction, dec!(10000.00));
    assert!(result.sdn_bhd.zakat.tax_benefit > Decimal::ZERO);
    assert!(result.sole_prop.zakat.excess_zakat >= Decimal::ZERO);
    assert!(result.sdn_bhd.zakat.excess_zakat >= Decimal::ZERO);
}

#[test]
fn test_break_even_without_fixed_costs_is_interior() {
    let rules = TaxRules::ya2025();
    let search = CrossoverSearch::new(&rules);

    for profit in [dec!(50000), dec!(300000), dec!(1500000)] {
        let inputs = TaxCalculationInputs::with_profit(profit);

        let result = Comparator::new(&rules).compare(&inputs).unwrap();
        let point = result
            .crossover_point_profit
            .unwrap_or_else(|| panic!("no break-even for profit {profit}"));

        assert!(point > Decimal::ZERO && point < dec!(2000000), "got {point}");
        assert!(search.difference_at(&inputs, point - dec!(500)).unwrap() < Decimal::ZERO);
        assert!(search.difference_at(&inputs, point + dec!(500)).unwrap() > Decimal::ZERO);
    }
}

#[test]
fn test_comparison_properties_hold_across_profiles() {
    let rules = TaxRules::ya2025();
    let comparator = Comparator::new(&rules);

    for profit in [dec!(0), dec!(30000), dec!(120000), dec!(250000), dec!(800000), dec!(3000000)] {
        for salary in [dec!(0), dec!(3000), dec!(5500), dec!(15000)] {
            let inputs = TaxCalculationInputs {
                monthly_salary: salary,
                compliance_costs: dec!(6000),
                audit_cost: dec!(2500),
                ..TaxCalculationInputs::with_profit(profit)
            };

            let result = comparator.compare(&inputs).unwrap();

            assert_eq!(result.savings_if_switch, result.difference.abs());
            assert_eq!(
                result.which_is_better == Structure::Similar,
                result.difference.abs() < dec!(3000),
                "profit {profit}, salary {salary}"
            );
            if result.has_affordability_issue {
                assert_ne!(result.which_is_better, Structure::SdnBhd);
            }
            if let Some(point) = result.crossover_point_profit {
                assert_eq!(point, point.trunc());
                assert!(point >= Decimal::ZERO && point <= dec!(2000000));
            }
            assert_eq!(net_movement(&result.sole_prop.waterfall), result.sole_prop.net_cash);
            assert_eq!(
                net_movement(&result.sdn_bhd.personal_waterfall),
                result.sdn_bhd.net_cash
            );
        }
    }
}
