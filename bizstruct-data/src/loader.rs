use std::fmt;
use std::io::Read;

use bizstruct_core::{ContributionSchedule, ContributionTier, RulesError, TaxBracket, TaxRules};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading rate tables.
#[derive(Debug, Error)]
pub enum RateTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown rate table: {0}")]
    UnknownTable(String),

    #[error("Row {row} of the {table} table has no min")]
    MissingMin { table: RateTable, row: usize },

    #[error("Loaded tables are invalid: {0}")]
    Rules(#[from] RulesError),
}

impl From<csv::Error> for RateTableLoaderError {
    fn from(err: csv::Error) -> Self {
        RateTableLoaderError::CsvParse(err.to_string())
    }
}

/// The rule tables a CSV file may replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateTable {
    Personal,
    CorporateSme,
    CorporateStandard,
    EmployerEpf,
    EmployeeEpf,
    EmployerSocso,
    EmployeeSocso,
}

impl RateTable {
    pub const ALL: [RateTable; 7] = [
        Self::Personal,
        Self::CorporateSme,
        Self::CorporateStandard,
        Self::EmployerEpf,
        Self::EmployeeEpf,
        Self::EmployerSocso,
        Self::EmployeeSocso,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::CorporateSme => "corporate_sme",
            Self::CorporateStandard => "corporate_standard",
            Self::EmployerEpf => "employer_epf",
            Self::EmployeeEpf => "employee_epf",
            Self::EmployerSocso => "employer_socso",
            Self::EmployeeSocso => "employee_socso",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.as_str() == s)
    }

    /// Whether rows of this table are income brackets rather than
    /// contribution tiers.
    pub fn is_bracket_table(&self) -> bool {
        matches!(
            self,
            Self::Personal | Self::CorporateSme | Self::CorporateStandard
        )
    }
}

impl fmt::Display for RateTable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of a rate table CSV file.
///
/// - `table`: one of the [`RateTable`] names (e.g. `personal`, `employer_epf`)
/// - `min`: lower bound of an income bracket; leave empty for contribution tiers
/// - `max`: upper bound of the bracket, or the highest monthly wage the tier
///   covers (empty for the open-ended last row)
/// - `rate`: the rate as a decimal (e.g. 0.13 for 13%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RateTableRecord {
    pub table: String,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub min: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for statutory rate tables from CSV files.
///
/// Each table named in the file replaces the matching table of a
/// [`TaxRules`] wholesale; tables the file does not mention keep their
/// current rows.
pub struct RateTableLoader;

impl RateTableLoader {
    /// Parse rate table records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RateTableRecord>, RateTableLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: RateTableRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Replace the tables named in `records` and validate the result.
    ///
    /// Rows keep their file order within a table. `rules` is left untouched
    /// when any row is rejected or the resulting rule set fails validation.
    ///
    /// Returns the replaced tables in order of first appearance.
    pub fn apply(
        records: &[RateTableRecord],
        rules: &mut TaxRules,
    ) -> Result<Vec<RateTable>, RateTableLoaderError> {
        let mut groups: Vec<(RateTable, Vec<(usize, &RateTableRecord)>)> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let table = RateTable::parse(&record.table)
                .ok_or_else(|| RateTableLoaderError::UnknownTable(record.table.clone()))?;
            match groups.iter_mut().find(|(existing, _)| *existing == table) {
                Some((_, rows)) => rows.push((index + 1, record)),
                None => groups.push((table, vec![(index + 1, record)])),
            }
        }

        let mut updated = rules.clone();
        for (table, rows) in &groups {
            if table.is_bracket_table() {
                let brackets = rows
                    .iter()
                    .map(|(row, record)| -> Result<TaxBracket, RateTableLoaderError> {
                        let min = record.min.ok_or(RateTableLoaderError::MissingMin {
                            table: *table,
                            row: *row,
                        })?;
                        Ok(TaxBracket::new(min, record.max, record.rate))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                *bracket_table(&mut updated, *table) = brackets;
            } else {
                let tiers = rows
                    .iter()
                    .map(|(_, record)| ContributionTier {
                        max_monthly_wage: record.max,
                        rate: record.rate,
                    })
                    .collect();
                *contribution_table(&mut updated, *table) = ContributionSchedule::new(tiers);
            }
            debug!(table = %table, rows = rows.len(), "replaced rate table");
        }

        updated.validate()?;
        *rules = updated;

        let tables: Vec<RateTable> = groups.into_iter().map(|(table, _)| table).collect();
        info!(tables = tables.len(), "loaded rate tables");
        Ok(tables)
    }

    /// Parse and apply in one step.
    pub fn load<R: Read>(
        reader: R,
        rules: &mut TaxRules,
    ) -> Result<Vec<RateTable>, RateTableLoaderError> {
        let records = Self::parse(reader)?;
        Self::apply(&records, rules)
    }
}

fn bracket_table(
    rules: &mut TaxRules,
    table: RateTable,
) -> &mut Vec<TaxBracket> {
    match table {
        RateTable::CorporateSme => &mut rules.corporate_sme_brackets,
        RateTable::CorporateStandard => &mut rules.corporate_standard_brackets,
        _ => &mut rules.personal_brackets,
    }
}

fn contribution_table(
    rules: &mut TaxRules,
    table: RateTable,
) -> &mut ContributionSchedule {
    let contributions = &mut rules.contributions;
    match table {
        RateTable::EmployeeEpf => &mut contributions.employee_epf,
        RateTable::EmployerSocso => &mut contributions.employer_socso,
        RateTable::EmployeeSocso => &mut contributions.employee_socso,
        _ => &mut contributions.employer_epf,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = r#"table,min,max,rate
corporate_sme,0,150000,0.15
corporate_sme,150000,600000,0.17
corporate_sme,600000,,0.24
employer_epf,,5000,0.13
employer_epf,,,0.12
"#;

    // =========================================================================
    // parse tests
    // =========================================================================

    #[test]
    fn test_parse_csv_bracket_rows() {
        let records = RateTableLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 5);
        assert_eq!(
            records[0],
            RateTableRecord {
                table: "corporate_sme".to_string(),
                min: Some(dec!(0)),
                max: Some(dec!(150000)),
                rate: dec!(0.15),
            }
        );
        assert_eq!(records[2].max, None);
    }

    #[test]
    fn test_parse_csv_contribution_rows_have_no_min() {
        let records = RateTableLoader::parse(TEST_CSV.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[3].min, None);
        assert_eq!(records[3].max, Some(dec!(5000)));
        assert_eq!(records[4].max, None);
        assert_eq!(records[4].rate, dec!(0.12));
    }

    #[test]
    fn test_parse_invalid_csv_missing_column() {
        let csv = "table,min,max\npersonal,0,5000";

        let err = RateTableLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");
        let RateTableLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "Expected 'missing field' in error, got: {}", msg);
    }

    #[test]
    fn test_parse_invalid_csv_bad_decimal() {
        let csv = "table,min,max,rate\npersonal,abc,5000,0";

        let err = RateTableLoader::parse(csv.as_bytes()).expect_err("Should fail for invalid decimal");
        assert!(matches!(err, RateTableLoaderError::CsvParse(_)));
    }

    #[test]
    fn test_parse_empty_csv() {
        let records = RateTableLoader::parse("table,min,max,rate\n".as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    // =========================================================================
    // apply tests
    // =========================================================================

    #[test]
    fn test_apply_replaces_only_named_tables() {
        let mut rules = TaxRules::ya2025();
        rules.corporate_sme_brackets.clear();
        let personal = rules.personal_brackets.clone();

        let tables = RateTableLoader::load(TEST_CSV.as_bytes(), &mut rules).expect("Failed to load tables");

        assert_eq!(tables, vec![RateTable::CorporateSme, RateTable::EmployerEpf]);
        assert_eq!(rules.corporate_sme_brackets, TaxRules::ya2025().corporate_sme_brackets);
        assert_eq!(rules.contributions.employer_epf.rate_for(dec!(5000)), dec!(0.13));
        assert_eq!(rules.contributions.employer_epf.rate_for(dec!(5001)), dec!(0.12));
        assert_eq!(rules.personal_brackets, personal);
    }

    #[test]
    fn test_apply_flat_employee_epf() {
        let mut rules = TaxRules::ya2025();
        let csv = "table,min,max,rate\nemployee_epf,,,0.09\n";

        RateTableLoader::load(csv.as_bytes(), &mut rules).expect("Failed to load tables");

        assert_eq!(rules.contributions.employee_epf, ContributionSchedule::flat(dec!(0.09)));
    }

    #[test]
    fn test_apply_unknown_table() {
        let mut rules = TaxRules::ya2025();
        let csv = "table,min,max,rate\nwithholding,0,,0.1\n";

        let err = RateTableLoader::load(csv.as_bytes(), &mut rules).expect_err("Should reject table");
        let RateTableLoaderError::UnknownTable(name) = err else {
            panic!("Expected UnknownTable error, got: {:?}", err);
        };
        assert_eq!(name, "withholding");
    }

    #[test]
    fn test_apply_bracket_row_without_min() {
        let mut rules = TaxRules::ya2025();
        let csv = "table,min,max,rate\ncorporate_standard,0,100000,0.2\ncorporate_standard,,,0.24\n";

        let err = RateTableLoader::load(csv.as_bytes(), &mut rules).expect_err("Should reject row");

        assert!(matches!(
            err,
            RateTableLoaderError::MissingMin {
                table: RateTable::CorporateStandard,
                row: 2,
            }
        ));
    }

    #[test]
    fn test_apply_invalid_table_leaves_rules_untouched() {
        let mut rules = TaxRules::ya2025();
        let csv = "table,min,max,rate\npersonal,0,5000,0\npersonal,6000,,0.3\n";

        let err = RateTableLoader::load(csv.as_bytes(), &mut rules).expect_err("Should reject gap");

        assert!(matches!(
            err,
            RateTableLoaderError::Rules(RulesError::BracketsNotContiguous { .. })
        ));
        assert_eq!(rules, TaxRules::ya2025());
    }

    #[test]
    fn test_rate_table_names_round_trip() {
        for table in RateTable::ALL {
            assert_eq!(RateTable::parse(table.as_str()), Some(table));
        }
        assert_eq!(RateTable::parse("dividend"), None);
    }
}
