use std::path::PathBuf;

use thiserror::Error;

use crate::schema::TableKind;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Required input columns are absent. Fatal: nothing is computed.
    #[error("{table}: missing expected columns: {}", missing.join(", "))]
    MissingColumns { table: TableKind, missing: Vec<String> },

    /// A requirement row carries a `Required` value outside the accepted set.
    #[error("{}: unknown 'Required' values [{}]", source_file.display(), values.join(", "))]
    UnknownRequiredType { source_file: PathBuf, values: Vec<String> },

    /// No input files were found for a table.
    #[error("{table}: no input files found under {}", dir.display())]
    NoInputFiles { table: TableKind, dir: PathBuf },

    /// Spreadsheet or CSV could not be decoded.
    #[error("{}: {message}", source_file.display())]
    Read { source_file: PathBuf, message: String },

    /// Output could not be written.
    #[error("cannot write {}: {message}", target.display())]
    Write { target: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackerError {
    /// True for errors caused by the shape of the input tables.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::MissingColumns { .. } | Self::UnknownRequiredType { .. })
    }
}
