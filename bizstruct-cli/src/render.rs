//! Plain-text reports for the terminal.
//!
//! Each report is a [`fmt::Display`] wrapper, so callers can `println!` it or
//! call `to_string()` in tests.

use std::fmt;

use bizstruct_core::calculations::common::format_ringgit;
use bizstruct_core::{
    ComparisonResult, ContributionSchedule, StepKind, TaxBracket, TaxRules, ValidationError,
    WarningKind, WaterfallStep,
};
use rust_decimal::Decimal;

const LABEL_WIDTH: usize = 30;
const AMOUNT_WIDTH: usize = 18;

fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).round_dp(2).normalize())
}

fn optional_ringgit(amount: Option<Decimal>) -> String {
    amount.map_or_else(|| "n/a".to_string(), format_ringgit)
}

/// A cash-flow waterfall as an indented ledger.
pub struct WaterfallTable<'a> {
    pub title: &'a str,
    pub steps: &'a [WaterfallStep],
}

impl fmt::Display for WaterfallTable<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for step in self.steps {
            let sign = match step.kind {
                StepKind::Add => '+',
                StepKind::Subtract => '-',
                StepKind::Equals | StepKind::Total => '=',
            };
            if step.kind == StepKind::Total {
                writeln!(f, "  {}", "-".repeat(LABEL_WIDTH + AMOUNT_WIDTH + 2))?;
            }
            let label = format!("{}{sign} {}", "  ".repeat(usize::from(step.indent)), step.label);
            writeln!(
                f,
                "  {label:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}",
                format_ringgit(step.amount)
            )?;
        }
        Ok(())
    }
}

/// Full report for one comparison.
pub struct ComparisonReport<'a> {
    pub name: &'a str,
    pub result: &'a ComparisonResult,
    pub show_waterfalls: bool,
}

impl fmt::Display for ComparisonReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let result = self.result;
        let sole_prop = &result.sole_prop;
        let sdn_bhd = &result.sdn_bhd;

        writeln!(f, "== {} ==", self.name)?;
        writeln!(f, "Better structure: {}", result.which_is_better)?;
        writeln!(f, "Sdn Bhd minus sole proprietorship: {}", format_ringgit(result.difference))?;
        writeln!(f, "{}", result.recommendation)?;
        writeln!(f)?;

        writeln!(
            f,
            "  {:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}{:>AMOUNT_WIDTH$}",
            "", "Sole Prop", "Sdn Bhd"
        )?;
        for (label, left, right) in [
            ("Net cash", format_ringgit(sole_prop.net_cash), format_ringgit(sdn_bhd.net_cash)),
            ("Total tax", format_ringgit(sole_prop.personal_tax), format_ringgit(sdn_bhd.total_tax)),
            (
                "Effective tax rate",
                percent(sole_prop.effective_tax_rate),
                percent(sdn_bhd.effective_tax_rate),
            ),
            (
                "Zakat paid",
                format_ringgit(sole_prop.zakat.zakat_amount),
                format_ringgit(sdn_bhd.zakat.zakat_amount),
            ),
        ] {
            writeln!(f, "  {label:<LABEL_WIDTH$}{left:>AMOUNT_WIDTH$}{right:>AMOUNT_WIDTH$}")?;
        }
        writeln!(f)?;

        match result.crossover_point_profit {
            Some(profit) => writeln!(f, "Break-even profit: {}", format_ringgit(profit))?,
            None => writeln!(f, "Break-even profit: none within the search range")?,
        }

        if let Some(target) = &result.target_analysis {
            writeln!(f, "Profit needed for {} net cash:", format_ringgit(target.target_net_income))?;
            writeln!(f, "  Sole proprietorship: {}", optional_ringgit(target.sole_prop_required_profit))?;
            writeln!(f, "  Sdn Bhd:             {}", optional_ringgit(target.sdn_bhd_required_profit))?;
        }

        if !result.warnings.is_empty() {
            writeln!(f, "Warnings:")?;
            for warning in &result.warnings {
                writeln!(f, "  ! {warning}")?;
            }
        }

        for (title, insights) in [
            ("Sole proprietorship", &sole_prop.insights),
            ("Sdn Bhd", &sdn_bhd.insights),
        ] {
            if !insights.is_empty() {
                writeln!(f, "{title}:")?;
                for insight in insights {
                    writeln!(f, "  - {insight}")?;
                }
            }
        }

        if self.show_waterfalls {
            writeln!(f)?;
            write!(
                f,
                "{}",
                WaterfallTable {
                    title: "Sole proprietorship cash flow",
                    steps: &sole_prop.waterfall,
                }
            )?;
            write!(
                f,
                "{}",
                WaterfallTable {
                    title: "Sdn Bhd company",
                    steps: &sdn_bhd.company_waterfall,
                }
            )?;
            write!(
                f,
                "{}",
                WaterfallTable {
                    title: "Sdn Bhd owner cash flow",
                    steps: &sdn_bhd.personal_waterfall,
                }
            )?;
        }
        Ok(())
    }
}

/// Column headings matching [`BatchLine`].
pub const BATCH_HEADER: &str =
    "name,business_profit,sole_prop_net_cash,sdn_bhd_net_cash,difference,better,break_even_profit,warnings";

/// One comma-separated summary line of a batch run. Amounts are in ringgit
/// without trailing zeros.
pub struct BatchLine<'a> {
    pub name: &'a str,
    pub result: &'a ComparisonResult,
}

impl fmt::Display for BatchLine<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let result = self.result;
        let warnings: Vec<&str> = result.warnings.iter().map(|w| warning_code(w.kind)).collect();
        write!(
            f,
            "{},{},{},{},{},{},{},{}",
            csv_cell(self.name),
            result.sole_prop.business_profit.normalize(),
            result.sole_prop.net_cash.normalize(),
            result.sdn_bhd.net_cash.normalize(),
            result.difference.normalize(),
            result.which_is_better.as_str(),
            result
                .crossover_point_profit
                .map(|p| p.normalize().to_string())
                .unwrap_or_default(),
            warnings.join(";")
        )
    }
}

fn warning_code(kind: WarningKind) -> &'static str {
    match kind {
        WarningKind::Affordability => "affordability",
        WarningKind::TightMargin => "tight_margin",
        WarningKind::SmeQualification => "sme_qualification",
    }
}

fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Input problems for one profile.
pub struct ValidationReport<'a> {
    pub name: &'a str,
    pub errors: &'a [ValidationError],
}

impl fmt::Display for ValidationReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "{}: {} invalid input(s)", self.name, self.errors.len())?;
        for error in self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}

/// The statutory tables in effect.
pub struct RulesReport<'a>(pub &'a TaxRules);

fn write_brackets(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    brackets: &[TaxBracket],
) -> fmt::Result {
    writeln!(f, "{title}")?;
    for bracket in brackets {
        let band = match bracket.max {
            Some(max) => format!("{} to {}", format_ringgit(bracket.min), format_ringgit(max)),
            None => format!("{} and above", format_ringgit(bracket.min)),
        };
        writeln!(f, "  {band:<36}{:>8}", percent(bracket.rate))?;
    }
    Ok(())
}

fn write_schedule(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    schedule: &ContributionSchedule,
) -> fmt::Result {
    writeln!(f, "{title}")?;
    let mut previous: Option<Decimal> = None;
    for tier in schedule.tiers() {
        let band = match (previous, tier.max_monthly_wage) {
            (None, Some(max)) => format!("wages up to {}", format_ringgit(max)),
            (Some(min), Some(max)) => format!("wages above {} up to {}", format_ringgit(min), format_ringgit(max)),
            (Some(min), None) => format!("wages above {}", format_ringgit(min)),
            (None, None) => "all wages".to_string(),
        };
        writeln!(f, "  {band:<36}{:>8}", percent(tier.rate))?;
        previous = tier.max_monthly_wage;
    }
    Ok(())
}

impl fmt::Display for RulesReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let rules = self.0;
        writeln!(f, "Year of assessment {}", rules.year_of_assessment)?;
        write_brackets(f, "Personal income tax", &rules.personal_brackets)?;
        write_brackets(f, "Corporate tax (SME)", &rules.corporate_sme_brackets)?;
        write_brackets(f, "Corporate tax (non-SME)", &rules.corporate_standard_brackets)?;

        let contributions = &rules.contributions;
        write_schedule(f, "Employer EPF", &contributions.employer_epf)?;
        write_schedule(f, "Employee EPF", &contributions.employee_epf)?;
        write_schedule(f, "Employer SOCSO", &contributions.employer_socso)?;
        write_schedule(f, "Employee SOCSO", &contributions.employee_socso)?;

        writeln!(f, "Relief caps")?;
        for (category, cap) in &rules.relief_caps {
            writeln!(f, "  {:<36}{:>16}", category.as_str(), format_ringgit(*cap))?;
        }

        writeln!(
            f,
            "Zakat: {} above a nisab of {}, company deduction capped at {} of income",
            percent(rules.zakat.rate),
            format_ringgit(rules.zakat.nisab),
            percent(rules.zakat.company_deduction_cap_rate)
        )?;
        writeln!(
            f,
            "Dividend surcharge: {} above {}",
            percent(rules.dividend.surcharge_rate),
            format_ringgit(rules.dividend.surcharge_threshold)
        )?;
        writeln!(
            f,
            "Audit exemption: revenue up to {}, assets up to {}, at most {} employees",
            format_ringgit(rules.audit_exemption.max_revenue),
            format_ringgit(rules.audit_exemption.max_total_assets),
            rules.audit_exemption.max_employees
        )?;
        writeln!(f, "SME revenue limit: {}", format_ringgit(rules.sme.max_revenue))?;
        writeln!(
            f,
            "Break-even search: {} to {}",
            format_ringgit(rules.crossover.lower_bound),
            format_ringgit(rules.crossover.upper_bound)
        )
    }
}
