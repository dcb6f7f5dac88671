//! Training status feed: `organizations/<org>/Status/*`.

use std::path::Path;

use tracing::info;
use ttrack_compliance::schema::{check_columns, TableKind};
use ttrack_compliance::{StatusRecord, TrackerError};

use crate::roles::ORGANIZATIONS_DIR;
use crate::sheet::{list_dirs, list_table_files, read_table, RawTable};

pub const STATUS_DIR: &str = "Status";

/// Column spellings seen in older exports, mapped to the canonical name.
/// Applied only when the canonical column is absent.
const ALIASES: &[(&str, &str)] = &[
    ("cirriculum_id", "curriculum_id"),
    ("completion_status", "curriculum_complete"),
    ("curriculum_completed", "curriculum_complete"),
    ("day_remaining", "days_remaining"),
];

pub fn load_status(input_dir: &Path) -> Result<Vec<StatusRecord>, TrackerError> {
    let org_root = input_dir.join(ORGANIZATIONS_DIR);
    let no_files = || TrackerError::NoInputFiles {
        table: TableKind::Status,
        dir: org_root.clone(),
    };
    if !org_root.is_dir() {
        return Err(no_files());
    }

    let mut files_read = 0usize;
    let mut records = Vec::new();
    for org_dir in list_dirs(&org_root)? {
        let status_dir = org_dir.join(STATUS_DIR);
        if !status_dir.is_dir() {
            continue;
        }
        for path in list_table_files(&status_dir)? {
            files_read += 1;
            records.extend(status_from_table(read_table(&path)?)?);
        }
    }

    if files_read == 0 {
        return Err(no_files());
    }
    info!(files = files_read, records = records.len(), "status loaded");
    Ok(records)
}

pub fn status_from_table(mut table: RawTable) -> Result<Vec<StatusRecord>, TrackerError> {
    table.rename_header("Organization", "Organization Description");
    table.normalize_headers();
    for (alias, canonical) in ALIASES {
        if !table.has_column(canonical) {
            table.rename_header(alias, canonical);
        }
    }
    table.rename_header("organization_description", "org_desc");
    check_columns(TableKind::Status, &table.headers)?;

    let col = |name: &str| {
        table.column(name).ok_or_else(|| TrackerError::MissingColumns {
            table: TableKind::Status,
            missing: vec![name.to_string()],
        })
    };
    let (user, desc, id, title, complete, days) = (
        col("user_name")?,
        col("org_desc")?,
        col("curriculum_id")?,
        col("curriculum_title")?,
        col("curriculum_complete")?,
        col("days_remaining")?,
    );

    Ok(table
        .rows
        .iter()
        .map(|row| StatusRecord {
            user_name: table.cell(row, user).trim().to_string(),
            org_desc: table.cell(row, desc).trim().to_string(),
            curriculum_id: table.cell(row, id).trim().to_string(),
            curriculum_title: table.cell(row, title).trim().to_string(),
            curriculum_complete: table.cell(row, complete).trim().to_string(),
            days_remaining: parse_days(table.cell(row, days)),
        })
        .collect())
}

/// Lenient numeric parse; blanks and junk become `None`.
pub fn parse_days(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|d| d.is_finite())
}
