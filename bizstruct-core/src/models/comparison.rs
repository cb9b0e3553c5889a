use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::results::{SdnBhdScenarioResult, SolePropScenarioResult};

/// The structure a comparison favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Structure {
    SoleProp,
    SdnBhd,
    Similar,
}

impl Structure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoleProp => "soleProp",
            Self::SdnBhd => "sdnBhd",
            Self::Similar => "similar",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "soleProp" => Some(Self::SoleProp),
            "sdnBhd" => Some(Self::SdnBhd),
            "similar" => Some(Self::Similar),
            _ => None,
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::SoleProp => "Sole Proprietorship",
            Self::SdnBhd => "Sdn Bhd",
            Self::Similar => "Either structure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The company cannot pay the requested salary.
    Affordability,
    /// Salary costs leave little profit for dividends.
    TightMargin,
    /// SME corporate rates may not be available.
    SmeQualification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl fmt::Display for ComparisonWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Profit each structure needs to reach a desired take-home amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAnalysis {
    pub target_net_income: Decimal,
    /// `None` when the target is out of reach within the search range.
    pub sole_prop_required_profit: Option<Decimal>,
    pub sdn_bhd_required_profit: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub which_is_better: Structure,
    /// Sdn Bhd net cash minus sole proprietorship net cash.
    pub difference: Decimal,
    pub savings_if_switch: Decimal,
    /// Profit at which both structures yield the same net cash, in whole
    /// ringgit.
    pub crossover_point_profit: Option<Decimal>,
    pub recommendation: String,
    pub sole_prop: SolePropScenarioResult,
    pub sdn_bhd: SdnBhdScenarioResult,
    pub has_affordability_issue: bool,
    pub has_sme_qualification_issue: bool,
    pub warnings: Vec<ComparisonWarning>,
    pub target_analysis: Option<TargetAnalysis>,
}
