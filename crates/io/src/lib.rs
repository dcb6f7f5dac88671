//! Spreadsheet loaders and exporters for ttrack.
//!
//! Input layout under the input directory:
//!
//! ```text
//! hr/Associates_List.xlsx
//! organizations/<org>/Roles/*.xlsx
//! organizations/<org>/Status/*.xlsx
//! ```
//!
//! CSV files are accepted anywhere a workbook is.

use std::path::Path;

use ttrack_compliance::{TrackerError, TrackerInput};

pub mod export;
pub mod roles;
pub mod roster;
pub mod sheet;
pub mod status;

pub use export::{export_issues_csv, export_workbook, ExportResult};
pub use roles::load_requirements;
pub use roster::load_roster;
pub use status::load_status;

/// Load all three input tables.
pub fn load_input(input_dir: &Path) -> Result<TrackerInput, TrackerError> {
    Ok(TrackerInput {
        roster: load_roster(input_dir)?,
        requirements: load_requirements(input_dir)?,
        status: load_status(input_dir)?,
    })
}
