use crate::core::models::atom::Element;
use crate::core::models::topology::BondOrder;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Number of columns in a bond-length row: atom A, atom B, bond order, length, count.
pub const TABULAR_COLUMNS: usize = 5;

/// One unparsed row of bond-length data, as read from a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRow {
    /// 1-based line number in the source, or 0 for in-memory rows.
    pub line: u64,
    pub atom_a: String,
    pub atom_b: String,
    pub bond_order: String,
    pub length: String,
    pub count: String,
}

/// A validated bond-length observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthObservation {
    pub element_a: Element,
    pub element_b: Element,
    pub order: BondOrder,
    pub length: f64,
    pub count: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedRowError {
    #[error("line {line}: expected 5 fields, found {found}")]
    FieldCount { line: u64, found: usize },

    #[error("line {line}: unknown element '{token}'")]
    UnknownElement { line: u64, token: String },

    #[error("line {line}: invalid bond order '{token}'")]
    InvalidBondOrder { line: u64, token: String },

    #[error("line {line}: invalid length '{token}'")]
    InvalidLength { line: u64, token: String },

    #[error("line {line}: invalid observation count '{token}'")]
    InvalidCount { line: u64, token: String },

    #[error("line {line}: unreadable record: {reason}")]
    Unreadable { line: u64, reason: String },
}

#[derive(Debug, Error)]
pub enum TabularLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV reading error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Tail mass must lie in [0, 1), got {0}")]
    InvalidTailMass(f64),
}

/// Summary of one tabular load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularLoadReport {
    pub rows_read: usize,
    pub distributions_built: usize,
    /// Keys whose rows all carried a zero count.
    pub empty_keys: usize,
    pub skipped: Vec<MalformedRowError>,
}

impl TryFrom<&TabularRow> for LengthObservation {
    type Error = MalformedRowError;

    fn try_from(row: &TabularRow) -> Result<Self, Self::Error> {
        let line = row.line;
        let element = |token: &str| {
            Element::from_str(token).map_err(|_| MalformedRowError::UnknownElement {
                line,
                token: token.to_string(),
            })
        };
        let element_a = element(&row.atom_a)?;
        let element_b = element(&row.atom_b)?;

        let order = BondOrder::from_str(&row.bond_order).map_err(|_| {
            MalformedRowError::InvalidBondOrder {
                line,
                token: row.bond_order.clone(),
            }
        })?;

        let length = row
            .length
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|l| l.is_finite() && *l >= 0.0)
            .ok_or_else(|| MalformedRowError::InvalidLength {
                line,
                token: row.length.clone(),
            })?;

        let count = row
            .count
            .trim()
            .parse::<u64>()
            .map_err(|_| MalformedRowError::InvalidCount {
                line,
                token: row.count.clone(),
            })?;

        Ok(Self {
            element_a,
            element_b,
            order,
            length,
            count,
        })
    }
}

/// Reads every record of a bond-length CSV file (with a header line).
///
/// Records the CSV reader cannot decode, or with the wrong number of fields, come
/// back as `MalformedRowError`s next to the good rows. Only failures to open or read
/// the file are returned as errors.
pub fn read_csv_rows(
    path: &Path,
) -> Result<(Vec<TabularRow>, Vec<MalformedRowError>), TabularLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| to_load_error(path, e))?;

    let mut rows = Vec::new();
    let mut malformed = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(to_load_error(path, e)),
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                malformed.push(MalformedRowError::Unreadable {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let line = record.position().map_or(0, |p| p.line());
        if record.len() != TABULAR_COLUMNS {
            malformed.push(MalformedRowError::FieldCount {
                line,
                found: record.len(),
            });
            continue;
        }

        rows.push(TabularRow {
            line,
            atom_a: record[0].to_string(),
            atom_b: record[1].to_string(),
            bond_order: record[2].to_string(),
            length: record[3].to_string(),
            count: record[4].to_string(),
        });
    }

    Ok((rows, malformed))
}

fn to_load_error(path: &Path, e: csv::Error) -> TabularLoadError {
    let path = path.to_string_lossy().to_string();
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(source) => TabularLoadError::Io { path, source },
            other => TabularLoadError::Csv {
                path,
                source: csv::Error::from(std::io::Error::other(format!("{:?}", other))),
            },
        }
    } else {
        TabularLoadError::Csv { path, source: e }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distributions::registry::DistributionRegistry;
    use std::fs;
    use tempfile::tempdir;

    fn row(a: &str, b: &str, order: &str, length: &str, count: &str) -> TabularRow {
        TabularRow {
            line: 7,
            atom_a: a.to_string(),
            atom_b: b.to_string(),
            bond_order: order.to_string(),
            length: length.to_string(),
            count: count.to_string(),
        }
    }

    #[test]
    fn observation_parses_valid_row() {
        let obs = LengthObservation::try_from(&row("C", "o", "2", "1.213", "42")).unwrap();
        assert_eq!(obs.element_a, Element::C);
        assert_eq!(obs.element_b, Element::O);
        assert_eq!(obs.order, BondOrder::Double);
        assert_eq!(obs.length, 1.213);
        assert_eq!(obs.count, 42);
    }

    #[test]
    fn observation_rejects_each_bad_field() {
        assert_eq!(
            LengthObservation::try_from(&row("Zz", "C", "1", "1.5", "1")),
            Err(MalformedRowError::UnknownElement {
                line: 7,
                token: "Zz".to_string()
            })
        );
        assert!(matches!(
            LengthObservation::try_from(&row("C", "C", "5", "1.5", "1")),
            Err(MalformedRowError::InvalidBondOrder { .. })
        ));
        assert!(matches!(
            LengthObservation::try_from(&row("C", "C", "1", "NaN", "1")),
            Err(MalformedRowError::InvalidLength { .. })
        ));
        assert!(matches!(
            LengthObservation::try_from(&row("C", "C", "1", "1.5", "1.5")),
            Err(MalformedRowError::InvalidCount { .. })
        ));
    }

    #[test]
    fn read_csv_rows_separates_good_and_malformed_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lengths.csv");
        fs::write(
            &path,
            "atom_a,atom_b,bond_order,length,count\n\
             C,C,1,1.530,10\n\
             C,C,1\n\
             N,N,2,1.220,3\n",
        )
        .unwrap();

        let (rows, malformed) = read_csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(malformed.len(), 1);
        assert!(matches!(
            malformed[0],
            MalformedRowError::FieldCount { found: 3, .. }
        ));
        assert_eq!(rows[1].atom_a, "N");
    }

    #[test]
    fn registry_loads_csv_file_and_skips_bad_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lengths.csv");
        fs::write(
            &path,
            "atom_a,atom_b,bond_order,length,count\n\
             C,C,1,1.530,10\n\
             C,C,1,1.540,10\n\
             X,C,1,1.540,10\n\
             C,C,2,1.340,5\n",
        )
        .unwrap();

        let mut registry = DistributionRegistry::new();
        let report = registry.add_from_csv_file(&path, 0.9, 3).unwrap();
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.distributions_built, 2);
        assert!(
            registry
                .lookup(Element::C, Element::C, BondOrder::Single)
                .admits(1.535, 0.0)
        );
    }

    #[test]
    fn missing_file_is_fatal_io_error() {
        let dir = tempdir().unwrap();
        let mut registry = DistributionRegistry::new();
        let result = registry.add_from_csv_file(&dir.path().join("absent.csv"), 0.9, 3);
        assert!(matches!(result, Err(TabularLoadError::Io { .. })));
    }
}
