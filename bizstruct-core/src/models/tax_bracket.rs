use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One marginal tier of a progressive rate table.
///
/// `max` is `None` for the open-ended top tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min: Decimal,
        max: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self { min, max, rate }
    }

    /// Portion of `amount` that falls inside this tier.
    pub fn overlap(
        &self,
        amount: Decimal,
    ) -> Decimal {
        let upper = match self.max {
            Some(max) => amount.min(max),
            None => amount,
        };
        (upper - self.min).max(Decimal::ZERO)
    }
}

/// Tax attributed to a single tier for a given taxable amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracketBreakdown {
    pub bracket_min: Decimal,
    pub bracket_max: Option<Decimal>,
    pub rate: Decimal,
    pub amount_in_bracket: Decimal,
    pub tax_for_bracket: Decimal,
}
