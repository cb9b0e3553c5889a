mod comparison;
mod contribution;
mod inputs;
mod raw_inputs;
mod reliefs;
mod results;
mod tax_bracket;
mod tax_rules;
pub mod waterfall;

pub use comparison::{ComparisonResult, ComparisonWarning, Structure, TargetAnalysis, WarningKind};
pub use contribution::{ContributionSchedule, ContributionTier};
pub use inputs::{AuditCriteria, InputMode, TaxCalculationInputs, ZakatMethod, ZakatSettings};
pub use raw_inputs::{InputModeKind, RawAuditCriteria, RawInputs, RawZakat};
pub use reliefs::{INDIVIDUAL_RELIEF, ReliefCaps, ReliefCategory, Reliefs};
pub use results::{
    CompanyLayer, ComplianceCosts, PersonalLayer, SalaryAffordability, SdnBhdScenarioResult,
    SolePropScenarioResult, ZakatResult,
};
pub use tax_bracket::{TaxBracket, TaxBracketBreakdown};
pub use tax_rules::{
    AuditExemptionRules, ComparisonRules, ContributionRules, CrossoverRules, DividendRules,
    RulesError, SmeRules, TaxRules, ZakatRules,
};
pub use waterfall::{StepKind, WaterfallStep};
