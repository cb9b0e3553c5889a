//! Tax and cash flow calculations for both business structures.

mod brackets;
mod cache;
pub mod common;
mod comparator;
mod contributions;
mod corporate;
mod crossover;
mod error;
mod personal;
mod sdn_bhd;
mod sole_prop;
mod target;
mod zakat;

pub use brackets::{BracketEngine, BracketTax};
pub use cache::BoundedCache;
pub use comparator::Comparator;
pub use contributions::{ContributionCalculator, EmploymentCost};
pub use corporate::{CorporateTaxCalculator, CorporateTaxResult};
pub use crossover::{CrossoverCache, CrossoverSearch, SharedCrossoverCache, shared_cache};
pub use error::CalculationError;
pub use personal::{PersonalTaxCalculator, PersonalTaxResult};
pub use sdn_bhd::SdnBhdCalculator;
pub use sole_prop::SolePropCalculator;
pub use target::TargetSolver;
pub use zakat::{CompanyZakat, IndividualZakat, company_zakat, individual_zakat};
