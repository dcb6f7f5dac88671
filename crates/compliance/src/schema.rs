//! Input table contracts: which canonical columns each loader must provide.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Roster,
    Requirements,
    Status,
}

impl TableKind {
    /// Canonical column names the engine relies on, after loader renaming.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Roster => &["full_name", "job_title", "org_code", "org_desc", "head_of_department"],
            Self::Requirements => &["org_code", "org_desc", "job_title", "curriculum_id", "curriculum_title"],
            Self::Status => &[
                "user_name",
                "org_desc",
                "curriculum_id",
                "curriculum_title",
                "curriculum_complete",
                "days_remaining",
            ],
        }
    }

    /// Issue code used when this table is missing columns.
    pub fn missing_columns_code(&self) -> &'static str {
        match self {
            Self::Roster => "HR_MISSING_COLUMNS",
            Self::Requirements => "ROLES_MISSING_COLUMNS",
            Self::Status => "STATUS_MISSING_COLUMNS",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Roster => write!(f, "HR"),
            Self::Requirements => write!(f, "Roles"),
            Self::Status => write!(f, "Status"),
        }
    }
}

/// Required columns absent from `headers`, sorted.
pub fn missing_columns<S: AsRef<str>>(table: TableKind, headers: &[S]) -> Vec<String> {
    let present: BTreeSet<&str> = headers.iter().map(|h| h.as_ref()).collect();
    let mut missing: Vec<String> = table
        .required_columns()
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    missing.sort();
    missing
}

/// Fail with [`TrackerError::MissingColumns`] unless every required column is present.
pub fn check_columns<S: AsRef<str>>(table: TableKind, headers: &[S]) -> Result<(), TrackerError> {
    let missing = missing_columns(table, headers);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TrackerError::MissingColumns { table, missing })
    }
}
