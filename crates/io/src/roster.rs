//! HR roster: `hr/Associates_List.{xlsx,csv}`.

use std::path::{Path, PathBuf};

use tracing::info;
use ttrack_compliance::schema::{check_columns, TableKind};
use ttrack_compliance::{Employee, TrackerError};

use crate::sheet::{read_table, RawTable};

pub const ROSTER_DIR: &str = "hr";
pub const ROSTER_STEM: &str = "Associates_List";

/// Locate the roster file, preferring the workbook over a CSV export.
pub fn roster_path(input_dir: &Path) -> Result<PathBuf, TrackerError> {
    let dir = input_dir.join(ROSTER_DIR);
    for ext in ["xlsx", "xls", "csv"] {
        let path = dir.join(format!("{ROSTER_STEM}.{ext}"));
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(TrackerError::NoInputFiles {
        table: TableKind::Roster,
        dir,
    })
}

pub fn load_roster(input_dir: &Path) -> Result<Vec<Employee>, TrackerError> {
    let path = roster_path(input_dir)?;
    let roster = roster_from_table(read_table(&path)?)?;
    info!(file = %path.display(), employees = roster.len(), "roster loaded");
    Ok(roster)
}

pub fn roster_from_table(mut table: RawTable) -> Result<Vec<Employee>, TrackerError> {
    table.rename_header("Org Unit Abbr", "Organization Description");
    table.normalize_headers();
    table.rename_header("organization", "org_code");
    table.rename_header("organization_description", "org_desc");
    check_columns(TableKind::Roster, &table.headers)?;

    let col = |name: &str| table.column(name).ok_or_else(|| missing(name));
    let (name, job, code, desc, head) = (
        col("full_name")?,
        col("job_title")?,
        col("org_code")?,
        col("org_desc")?,
        col("head_of_department")?,
    );

    Ok(table
        .rows
        .iter()
        .map(|row| Employee {
            full_name: table.cell(row, name).trim().to_string(),
            job_title: table.cell(row, job).trim().to_string(),
            org_code: table.cell(row, code).trim().to_string(),
            org_desc: table.cell(row, desc).trim().to_string(),
            head_of_department: table.cell(row, head).trim().to_string(),
        })
        .collect())
}

fn missing(column: &str) -> TrackerError {
    TrackerError::MissingColumns {
        table: TableKind::Roster,
        missing: vec![column.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            source: PathBuf::from("Associates_List.csv"),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        }
    }

    #[test]
    fn maps_source_headers_to_canonical_fields() {
        let t = table(
            &["Full Name", "Job Title", "Organization", "Org Unit Abbr", "Head of Department"],
            &[&[" SANTANA MENDOZA JORGE ", "Operator", "ABC", " BG1 ", "Boss"]],
        );
        let roster = roster_from_table(t).unwrap();
        assert_eq!(
            roster,
            vec![Employee {
                full_name: "SANTANA MENDOZA JORGE".into(),
                job_title: "Operator".into(),
                org_code: "ABC".into(),
                org_desc: "BG1".into(),
                head_of_department: "Boss".into(),
            }]
        );
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let t = table(&["Full Name", "Organization"], &[]);
        match roster_from_table(t) {
            Err(TrackerError::MissingColumns { table, missing }) => {
                assert_eq!(table, TableKind::Roster);
                assert_eq!(missing, vec!["head_of_department", "job_title", "org_desc"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }
}
