//! Role requirements: `organizations/<org>/Roles/*`.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};
use ttrack_compliance::schema::{check_columns, TableKind};
use ttrack_compliance::{RequiredType, Requirement, TrackerError};

use crate::sheet::{list_dirs, list_table_files, read_table, RawTable};

pub const ORGANIZATIONS_DIR: &str = "organizations";
pub const ROLES_DIR: &str = "Roles";

/// Load and merge every Roles table. Rows marked not applicable are
/// dropped and exact duplicates across files are removed.
pub fn load_requirements(input_dir: &Path) -> Result<Vec<Requirement>, TrackerError> {
    let org_root = input_dir.join(ORGANIZATIONS_DIR);
    if !org_root.is_dir() {
        return Err(TrackerError::NoInputFiles {
            table: TableKind::Requirements,
            dir: org_root,
        });
    }

    let mut files_read = 0usize;
    let mut requirements = Vec::new();
    let mut seen = HashSet::new();
    for org_dir in list_dirs(&org_root)? {
        let roles_dir = org_dir.join(ROLES_DIR);
        if !roles_dir.is_dir() {
            continue;
        }
        let folder = org_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for path in list_table_files(&roles_dir)? {
            files_read += 1;
            let rows = requirements_from_table(read_table(&path)?, &folder)?;
            if rows.is_empty() {
                warn!(file = %path.display(), "roles file has no applicable requirements");
            }
            for req in rows {
                if seen.insert(req.clone()) {
                    requirements.push(req);
                }
            }
        }
    }

    if files_read == 0 {
        return Err(TrackerError::NoInputFiles {
            table: TableKind::Requirements,
            dir: org_root,
        });
    }
    info!(files = files_read, requirements = requirements.len(), "requirements loaded");
    Ok(requirements)
}

/// Parse one Roles table. `folder` is the organization folder name, used as
/// org_code when the table has no organization column.
pub fn requirements_from_table(mut table: RawTable, folder: &str) -> Result<Vec<Requirement>, TrackerError> {
    table.normalize_headers();

    let curriculum_id = table.column("curriculum_id").ok_or_else(|| TrackerError::MissingColumns {
        table: TableKind::Requirements,
        missing: vec!["curriculum_id".into()],
    })?;
    let org_code = table.column("organization").or_else(|| table.column("organization_name"));
    let org_desc = table.column("organization_description");
    let required = table.column("required");

    let mut present: Vec<&str> = table.headers.iter().map(|h| h.as_str()).collect();
    present.extend(["org_code", "org_desc"]);
    check_columns(TableKind::Requirements, &present)?;
    let job_title = table.column("job_title").unwrap_or_default();
    let curriculum_title = table.column("curriculum_title").unwrap_or_default();

    let mut unknown = BTreeSet::new();
    let mut out = Vec::new();
    for row in &table.rows {
        let required_type = match required {
            None => RequiredType::Mandatory,
            Some(col) => {
                let raw = table.cell(row, col);
                if RequiredType::is_not_applicable(raw) {
                    continue;
                }
                match RequiredType::parse(raw) {
                    Some(t) => t,
                    None => {
                        unknown.insert(raw.trim().to_lowercase());
                        continue;
                    }
                }
            }
        };

        out.push(Requirement {
            org_code: match org_code {
                Some(col) => table.cell(row, col).trim().to_string(),
                None => folder.to_string(),
            },
            org_desc: org_desc.map(|col| table.cell(row, col).trim().to_string()).unwrap_or_default(),
            job_title: table.cell(row, job_title).trim().to_string(),
            curriculum_id: table.cell(row, curriculum_id).trim().to_string(),
            curriculum_title: table.cell(row, curriculum_title).trim().to_string(),
            required_type,
        });
    }

    if !unknown.is_empty() {
        return Err(TrackerError::UnknownRequiredType {
            source_file: table.source.clone(),
            values: unknown.into_iter().collect(),
        });
    }
    debug!(file = %table.source.display(), rows = out.len(), "roles table parsed");
    Ok(out)
}
