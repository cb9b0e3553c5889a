//! Crossover search: the business profit at which both structures leave the
//! owner with the same net cash.
//!
//! The search bisects on the sign of `sdn_bhd.net_cash − sole_prop.net_cash`
//! over the configured profit range. Results are memoized per input profile,
//! since the answer does not depend on the profit the caller started from.

use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::calculations::cache::BoundedCache;
use crate::calculations::common::round_whole;
use crate::calculations::error::CalculationError;
use crate::calculations::sdn_bhd::SdnBhdCalculator;
use crate::calculations::sole_prop::SolePropCalculator;
use crate::models::{CrossoverRules, TaxCalculationInputs, TaxRules};

/// Memo of crossover points keyed by inputs with the profit zeroed.
pub type CrossoverCache = BoundedCache<TaxCalculationInputs, Option<Decimal>>;

/// A crossover cache that comparators can share.
pub type SharedCrossoverCache = Arc<Mutex<CrossoverCache>>;

/// Creates an empty shared cache sized from the rules.
pub fn shared_cache(rules: &CrossoverRules) -> SharedCrossoverCache {
    Arc::new(Mutex::new(BoundedCache::new(rules.cache_capacity)))
}

#[derive(Debug, Clone)]
pub struct CrossoverSearch<'a> {
    rules: &'a TaxRules,
}

impl<'a> CrossoverSearch<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Cache key for `inputs`: every field except the business profit.
    pub fn cache_key(inputs: &TaxCalculationInputs) -> TaxCalculationInputs {
        inputs.at_profit(Decimal::ZERO)
    }

    /// Net cash difference (Sdn Bhd minus sole proprietorship) at `profit`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if either scenario rejects the inputs.
    pub fn difference_at(
        &self,
        inputs: &TaxCalculationInputs,
        profit: Decimal,
    ) -> Result<Decimal, CalculationError> {
        let inputs = inputs.at_profit(profit);
        let sole_prop = SolePropCalculator::new(self.rules).calculate(&inputs)?;
        let sdn_bhd = SdnBhdCalculator::new(self.rules).calculate(&inputs)?;
        Ok(sdn_bhd.net_cash - sole_prop.net_cash)
    }

    /// Finds the crossover profit, consulting and filling `cache`.
    ///
    /// `current_difference` is the difference at `inputs.business_profit`;
    /// when it is already within the early-exit threshold that profit is the
    /// answer and neither the cache nor the search is touched.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if a scenario evaluation fails.
    pub fn find(
        &self,
        inputs: &TaxCalculationInputs,
        current_difference: Decimal,
        cache: &Mutex<CrossoverCache>,
    ) -> Result<Option<Decimal>, CalculationError> {
        if current_difference.abs() < self.rules.crossover.early_exit_threshold {
            return Ok(Some(round_whole(inputs.business_profit)));
        }

        let key = Self::cache_key(inputs);
        let cached = cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied();
        if let Some(point) = cached {
            trace!(crossover = ?point, "crossover cache hit");
            return Ok(point);
        }

        let point = self.search(inputs)?;
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, point);

        Ok(point)
    }

    /// Bisects the configured profit range without consulting any cache.
    ///
    /// Each probe is classified by whether Sdn Bhd comes out strictly ahead,
    /// so an exact tie counts with the sole proprietorship side. A profile
    /// that nets nothing under either structure at zero profit therefore
    /// still reaches the interior point where the lead changes hands.
    ///
    /// Returns `None` when both ends of the range fall on the same side, or
    /// when the iteration limit is reached first.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError`] if a scenario evaluation fails.
    pub fn search(
        &self,
        inputs: &TaxCalculationInputs,
    ) -> Result<Option<Decimal>, CalculationError> {
        let params = &self.rules.crossover;
        let mut low = params.lower_bound;
        let mut high = params.upper_bound;

        let low_difference = self.difference_at(inputs, low)?;
        let high_difference = self.difference_at(inputs, high)?;

        let low_favours_sdn_bhd = low_difference > Decimal::ZERO;
        if low_favours_sdn_bhd == (high_difference > Decimal::ZERO) {
            debug!(
                low_difference = %low_difference,
                high_difference = %high_difference,
                "no crossover in search range"
            );
            return Ok(None);
        }

        let two = Decimal::TWO;
        for iteration in 0..params.max_iterations {
            if high - low <= params.tolerance {
                break;
            }

            let mid = (low + high) / two;
            let difference = self.difference_at(inputs, mid)?;
            trace!(iteration, low = %low, high = %high, difference = %difference, "bisection step");

            if (difference > Decimal::ZERO) == low_favours_sdn_bhd {
                low = mid;
            } else {
                high = mid;
            }
        }

        if high - low > params.tolerance {
            debug!(
                iterations = params.max_iterations,
                width = %(high - low),
                "crossover search did not converge"
            );
            return Ok(None);
        }

        let point = round_whole((low + high) / two);
        debug!(crossover = %point, "crossover found");
        Ok(Some(point))
    }
}
