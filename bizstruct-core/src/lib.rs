pub mod calculations;
pub mod models;
pub mod validation;

pub use calculations::{
    CalculationError, Comparator, SdnBhdCalculator, SolePropCalculator, TargetSolver,
};
pub use models::*;
pub use validation::{ValidationError, sanitize_inputs, validate_inputs};
