use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Automatic relief every resident individual receives.
pub const INDIVIDUAL_RELIEF: Decimal = dec!(9000);

/// Personal income tax relief categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliefCategory {
    Individual,
    Spouse,
    Children,
    EpfAndLifeInsurance,
    EducationAndMedicalInsurance,
    MedicalExpenses,
    ParentsMedical,
    Lifestyle,
    Sports,
    EducationFees,
    Sspn,
    PrivateRetirementScheme,
    SocsoEis,
}

impl ReliefCategory {
    pub const ALL: [ReliefCategory; 13] = [
        Self::Individual,
        Self::Spouse,
        Self::Children,
        Self::EpfAndLifeInsurance,
        Self::EducationAndMedicalInsurance,
        Self::MedicalExpenses,
        Self::ParentsMedical,
        Self::Lifestyle,
        Self::Sports,
        Self::EducationFees,
        Self::Sspn,
        Self::PrivateRetirementScheme,
        Self::SocsoEis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Spouse => "spouse",
            Self::Children => "children",
            Self::EpfAndLifeInsurance => "epf_and_life_insurance",
            Self::EducationAndMedicalInsurance => "education_and_medical_insurance",
            Self::MedicalExpenses => "medical_expenses",
            Self::ParentsMedical => "parents_medical",
            Self::Lifestyle => "lifestyle",
            Self::Sports => "sports",
            Self::EducationFees => "education_fees",
            Self::Sspn => "sspn",
            Self::PrivateRetirementScheme => "private_retirement_scheme",
            Self::SocsoEis => "socso_eis",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == s)
    }
}

/// Statutory maximum per relief category. Categories without an entry are
/// uncapped.
pub type ReliefCaps = BTreeMap<ReliefCategory, Decimal>;

/// Relief amounts claimed by an individual.
///
/// The default profile claims only the automatic individual relief.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reliefs {
    amounts: BTreeMap<ReliefCategory, Decimal>,
}

impl Default for Reliefs {
    fn default() -> Self {
        Self::none().with(ReliefCategory::Individual, INDIVIDUAL_RELIEF)
    }
}

impl Reliefs {
    /// A profile with no reliefs at all, not even the individual relief.
    pub fn none() -> Self {
        Self {
            amounts: BTreeMap::new(),
        }
    }

    pub fn with(
        mut self,
        category: ReliefCategory,
        amount: Decimal,
    ) -> Self {
        self.set(category, amount);
        self
    }

    pub fn set(
        &mut self,
        category: ReliefCategory,
        amount: Decimal,
    ) {
        self.amounts.insert(category, amount);
    }

    /// Claimed amount before capping.
    pub fn get(
        &self,
        category: ReliefCategory,
    ) -> Decimal {
        self.amounts
            .get(&category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Claimed amount limited to the statutory cap.
    pub fn capped(
        &self,
        category: ReliefCategory,
        caps: &ReliefCaps,
    ) -> Decimal {
        let claimed = self.get(category).max(Decimal::ZERO);
        match caps.get(&category) {
            Some(cap) => claimed.min(*cap),
            None => claimed,
        }
    }

    /// Sum of all claimed reliefs after capping.
    pub fn total(
        &self,
        caps: &ReliefCaps,
    ) -> Decimal {
        self.amounts
            .keys()
            .map(|category| self.capped(*category, caps))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReliefCategory, Decimal)> + '_ {
        self.amounts.iter().map(|(category, amount)| (*category, *amount))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn caps() -> ReliefCaps {
        ReliefCaps::from([
            (ReliefCategory::Individual, dec!(9000)),
            (ReliefCategory::EpfAndLifeInsurance, dec!(7000)),
            (ReliefCategory::Lifestyle, dec!(2500)),
        ])
    }

    #[test]
    fn default_profile_claims_individual_relief() {
        let reliefs = Reliefs::default();

        assert_eq!(reliefs.get(ReliefCategory::Individual), dec!(9000));
        assert_eq!(reliefs.total(&caps()), dec!(9000));
    }

    #[test]
    fn total_applies_caps_per_category() {
        let reliefs = Reliefs::default()
            .with(ReliefCategory::EpfAndLifeInsurance, dec!(12000))
            .with(ReliefCategory::Lifestyle, dec!(1000));

        assert_eq!(reliefs.capped(ReliefCategory::EpfAndLifeInsurance, &caps()), dec!(7000));
        assert_eq!(reliefs.total(&caps()), dec!(17000));
    }

    #[test]
    fn uncapped_categories_count_in_full() {
        let reliefs = Reliefs::none().with(ReliefCategory::Children, dec!(8000));

        assert_eq!(reliefs.total(&caps()), dec!(8000));
    }

    #[test]
    fn negative_claims_count_as_zero() {
        let reliefs = Reliefs::none().with(ReliefCategory::Lifestyle, dec!(-500));

        assert_eq!(reliefs.total(&caps()), Decimal::ZERO);
    }

    #[test]
    fn parse_round_trips_every_category() {
        for category in ReliefCategory::ALL {
            assert_eq!(ReliefCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(ReliefCategory::parse("unknown"), None);
    }
}
