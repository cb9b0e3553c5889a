//! CSV loaders for statutory rate tables and batch comparison profiles.

mod loader;
mod profiles;

pub use loader::{RateTable, RateTableLoader, RateTableLoaderError, RateTableRecord};
pub use profiles::{ProfileLoadError, ProfileLoader, ProfileRow};
