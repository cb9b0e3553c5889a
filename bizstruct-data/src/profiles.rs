//! CSV loader for batch comparison profiles.
//!
//! ## CSV Format
//!
//! One profile per row. Headers are matched by name, so column order does
//! not matter and every column except `business_profit` and `other_income`
//! may be left out. Cells are trimmed; an empty cell means "not supplied".
//!
//! | Column | Type | Notes |
//! |----------------------------------|---------|----------------------------------------|
//! | `name` | string | Label used in reports |
//! | `business_profit` | number | |
//! | `other_income` | number | |
//! | `monthly_salary` | number | Director salary under Sdn Bhd |
//! | `compliance_costs` | number | |
//! | `audit_cost` | number | |
//! | `audit_revenue` | number | Audit exemption criteria |
//! | `audit_total_assets` | number | |
//! | `audit_employees` | number | |
//! | `dividend_distribution_percent` | number | 0 to 100 |
//! | `apply_ya2025_dividend_surcharge`| bool | `true`/`false`, `yes`/`no`, `1`/`0` |
//! | `has_foreign_ownership` | bool | |
//! | `input_mode` | string | `profit` or `target` |
//! | `target_net_income` | number | Required in target mode |
//! | `zakat_enabled` | bool | |
//! | `zakat_amount_paid` | number | |
//! | `zakat_auto_calculate` | bool | |
//! | `zakat_method` | string | `gross` or `net` |
//! | `relief_<category>` | number | e.g. `relief_lifestyle` |
//!
//! Numeric cells that do not parse are kept as NaN so that
//! [`bizstruct_core::validate_inputs`] reports them against the row instead
//! of failing the whole file.
//!
//! ### Example
//!
//! ```csv
//! name,business_profit,other_income,monthly_salary,relief_lifestyle
//! cafe,180000,0,5000,2500
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use bizstruct_core::{
    InputModeKind, RawAuditCriteria, RawInputs, RawZakat, ReliefCategory, ZakatMethod,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const RELIEF_PREFIX: &str = "relief_";

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    name: Option<String>,
    business_profit: Option<String>,
    other_income: Option<String>,
    monthly_salary: Option<String>,
    compliance_costs: Option<String>,
    audit_cost: Option<String>,
    audit_revenue: Option<String>,
    audit_total_assets: Option<String>,
    audit_employees: Option<String>,
    dividend_distribution_percent: Option<String>,
    apply_ya2025_dividend_surcharge: Option<String>,
    has_foreign_ownership: Option<String>,
    input_mode: Option<String>,
    target_net_income: Option<String>,
    zakat_enabled: Option<String>,
    zakat_amount_paid: Option<String>,
    zakat_auto_calculate: Option<String>,
    zakat_method: Option<String>,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading profiles.
#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("cannot read profiles: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not well-formed CSV.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    /// A boolean or enumerated cell holds a value outside its vocabulary.
    /// `row` is 1-based, excluding the header.
    #[error("invalid {column} '{value}' on row {row}")]
    InvalidValue {
        column: String,
        value: String,
        row: usize,
    },

    /// A `relief_` column names no known relief category.
    #[error("unknown relief column '{0}'")]
    UnknownRelief(String),
}

/// One profile read from a batch file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    /// The `name` cell, or `row N` when the column is absent or empty.
    pub name: String,
    pub inputs: RawInputs,
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

pub struct ProfileLoader;

impl ProfileLoader {
    /// Read profiles from CSV text. Rows are returned in file order.
    pub fn load_from_str(input: &str) -> Result<Vec<ProfileRow>, ProfileLoadError> {
        Self::load_from_reader(input.as_bytes())
    }

    /// Read a profiles file from disk.
    pub fn load_from_file(path: &Path) -> Result<Vec<ProfileRow>, ProfileLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_reader<R: Read>(reader: R) -> Result<Vec<ProfileRow>, ProfileLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let relief_columns = relief_columns(&headers)?;

        let mut profiles = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = idx + 1;
            let row: CsvRow = record.deserialize(Some(&headers))?;

            let mut reliefs = BTreeMap::new();
            for (position, category) in &relief_columns {
                if let Some(amount) = parse_amount(record.get(*position).map(str::to_string)) {
                    reliefs.insert(*category, amount);
                }
            }

            profiles.push(convert_row(row, reliefs, row_number)?);
        }

        debug!(profiles = profiles.len(), "loaded batch profiles");
        Ok(profiles)
    }
}

fn relief_columns(
    headers: &csv::StringRecord
) -> Result<Vec<(usize, ReliefCategory)>, ProfileLoadError> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(position, header)| {
            header
                .strip_prefix(RELIEF_PREFIX)
                .map(|category| (position, header, category))
        })
        .map(|(position, header, category)| {
            ReliefCategory::parse(category)
                .map(|category| (position, category))
                .ok_or_else(|| ProfileLoadError::UnknownRelief(header.to_string()))
        })
        .collect()
}

fn convert_row(
    row: CsvRow,
    reliefs: BTreeMap<ReliefCategory, f64>,
    row_number: usize,
) -> Result<ProfileRow, ProfileLoadError> {
    let audit_criteria = RawAuditCriteria {
        revenue: parse_amount(row.audit_revenue),
        total_assets: parse_amount(row.audit_total_assets),
        employees: parse_amount(row.audit_employees),
    };
    let zakat = RawZakat {
        enabled: parse_bool("zakat_enabled", row.zakat_enabled, row_number)?,
        amount_paid: parse_amount(row.zakat_amount_paid),
        auto_calculate: parse_bool("zakat_auto_calculate", row.zakat_auto_calculate, row_number)?,
        method: parse_choice("zakat_method", row.zakat_method, row_number, |s| match s {
            "gross" => Some(ZakatMethod::Gross),
            "net" => Some(ZakatMethod::Net),
            _ => None,
        })?,
    };

    let inputs = RawInputs {
        business_profit: parse_amount(row.business_profit),
        other_income: parse_amount(row.other_income),
        monthly_salary: parse_amount(row.monthly_salary),
        compliance_costs: parse_amount(row.compliance_costs),
        audit_cost: parse_amount(row.audit_cost),
        audit_criteria: (audit_criteria != RawAuditCriteria::default()).then_some(audit_criteria),
        reliefs: (!reliefs.is_empty()).then_some(reliefs),
        apply_ya2025_dividend_surcharge: parse_bool(
            "apply_ya2025_dividend_surcharge",
            row.apply_ya2025_dividend_surcharge,
            row_number,
        )?,
        dividend_distribution_percent: parse_amount(row.dividend_distribution_percent),
        has_foreign_ownership: parse_bool(
            "has_foreign_ownership",
            row.has_foreign_ownership,
            row_number,
        )?,
        input_mode: parse_choice("input_mode", row.input_mode, row_number, |s| match s {
            "profit" => Some(InputModeKind::Profit),
            "target" => Some(InputModeKind::Target),
            _ => None,
        })?,
        target_net_income: parse_amount(row.target_net_income),
        zakat: (zakat != RawZakat::default()).then_some(zakat),
    };

    let name = row
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("row {row_number}"));

    Ok(ProfileRow { name, inputs })
}

/// Empty cells are `None`; unparseable ones become NaN for validation to flag.
fn parse_amount(cell: Option<String>) -> Option<f64> {
    let cell = cell.filter(|s| !s.is_empty())?;
    Some(cell.replace(',', "").parse::<f64>().unwrap_or(f64::NAN))
}

fn parse_bool(
    column: &str,
    cell: Option<String>,
    row: usize,
) -> Result<Option<bool>, ProfileLoadError> {
    parse_choice(column, cell, row, |s| match s {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    })
}

fn parse_choice<T>(
    column: &str,
    cell: Option<String>,
    row: usize,
    choose: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ProfileLoadError> {
    let Some(value) = cell.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    choose(&value.to_lowercase())
        .map(Some)
        .ok_or_else(|| ProfileLoadError::InvalidValue {
            column: column.to_string(),
            value,
            row,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
