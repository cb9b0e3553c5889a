use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of a statutory contribution table.
///
/// Applies to monthly wages up to and including `max_monthly_wage`; `None`
/// marks the open-ended last row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContributionTier {
    pub max_monthly_wage: Option<Decimal>,
    pub rate: Decimal,
}

impl ContributionTier {
    pub fn up_to(
        max_monthly_wage: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            max_monthly_wage: Some(max_monthly_wage),
            rate,
        }
    }

    pub fn above(rate: Decimal) -> Self {
        Self {
            max_monthly_wage: None,
            rate,
        }
    }
}

/// Ordered threshold table mapping a monthly wage to a contribution rate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionSchedule {
    tiers: Vec<ContributionTier>,
}

impl ContributionSchedule {
    pub fn new(tiers: Vec<ContributionTier>) -> Self {
        Self { tiers }
    }

    /// A schedule charging the same rate on every wage.
    pub fn flat(rate: Decimal) -> Self {
        Self::new(vec![ContributionTier::above(rate)])
    }

    pub fn tiers(&self) -> &[ContributionTier] {
        &self.tiers
    }

    /// Rate applicable to the given monthly wage.
    ///
    /// Wages above every bounded tier of a table without an open-ended row
    /// attract no contribution.
    pub fn rate_for(
        &self,
        monthly_wage: Decimal,
    ) -> Decimal {
        self.tiers
            .iter()
            .find(|tier| match tier.max_monthly_wage {
                Some(max) => monthly_wage <= max,
                None => true,
            })
            .map(|tier| tier.rate)
            .unwrap_or(Decimal::ZERO)
    }

    /// Monthly wage breakpoints, ascending.
    pub fn breakpoints(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.tiers.iter().filter_map(|tier| tier.max_monthly_wage)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn employer_epf() -> ContributionSchedule {
        ContributionSchedule::new(vec![
            ContributionTier::up_to(dec!(5000), dec!(0.13)),
            ContributionTier::above(dec!(0.12)),
        ])
    }

    #[test]
    fn rate_for_includes_the_tier_boundary() {
        let schedule = employer_epf();

        assert_eq!(schedule.rate_for(dec!(5000)), dec!(0.13));
        assert_eq!(schedule.rate_for(dec!(5000.01)), dec!(0.12));
        assert_eq!(schedule.rate_for(dec!(0)), dec!(0.13));
    }

    #[test]
    fn rate_for_is_zero_past_a_closed_table() {
        let schedule = ContributionSchedule::new(vec![ContributionTier::up_to(
            dec!(6000),
            dec!(0.0175),
        )]);

        assert_eq!(schedule.rate_for(dec!(6000)), dec!(0.0175));
        assert_eq!(schedule.rate_for(dec!(6000.01)), Decimal::ZERO);
    }

    #[test]
    fn flat_schedule_has_no_breakpoints() {
        let schedule = ContributionSchedule::flat(dec!(0.11));

        assert_eq!(schedule.breakpoints().count(), 0);
        assert_eq!(schedule.rate_for(dec!(123456)), dec!(0.11));
    }
}
