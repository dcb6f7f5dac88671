//! Input validation: findings returned alongside results, never instead of them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::completion::{attribute_status, Attribution};
use crate::error::TrackerError;
use crate::identity::{EmployeeKey, IdentityIndex};
use crate::model::TrackerInput;
use crate::normalize::normalize_text;
use crate::requirements::{roles_without_requirements, RequirementIndex};
use crate::schema::TableKind;

/// Max entries listed in an issue's `details` sample.
pub const SAMPLE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueLevel {
    Error,
    Warning,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub code: String,
    pub message: String,
    pub details: Value,
}

impl ValidationIssue {
    pub fn error(code: &str, message: impl Into<String>, details: Value) -> Self {
        Self {
            level: IssueLevel::Error,
            code: code.to_string(),
            message: message.into(),
            details,
        }
    }

    pub fn warning(code: &str, message: impl Into<String>, details: Value) -> Self {
        Self {
            level: IssueLevel::Warning,
            code: code.to_string(),
            message: message.into(),
            details,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }

    pub fn missing_columns(table: TableKind, missing: &[String]) -> Self {
        Self::error(
            table.missing_columns_code(),
            format!("{table}: missing expected columns: {missing:?}"),
            json!({ "missing": missing }),
        )
    }

    /// Issue form of a schema error, for reports written when loading aborts.
    pub fn from_error(err: &TrackerError) -> Option<Self> {
        match err {
            TrackerError::MissingColumns { table, missing } => Some(Self::missing_columns(*table, missing)),
            TrackerError::UnknownRequiredType { source_file, values } => Some(Self::error(
                "ROLES_UNKNOWN_REQUIRED_TYPE",
                err.to_string(),
                json!({ "file": source_file.display().to_string(), "values": values }),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.code, self.message)
    }
}

/// Run every cross-table check. Column presence is enforced by the loaders
/// before a [`TrackerInput`] exists, so it is not repeated here.
pub fn validate(input: &TrackerInput) -> Vec<ValidationIssue> {
    let index = IdentityIndex::build(&input.roster);
    let attribution = attribute_status(&index, &input.status);
    validate_attributed(input, &attribution)
}

/// [`validate`] for callers that already attributed the status rows of `input`.
pub fn validate_attributed(input: &TrackerInput, attribution: &Attribution<'_>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    issues.extend(check_duplicate_employee_keys(input));
    issues.extend(check_roles_without_requirements(input));
    issues.extend(check_status_units(input));
    issues.extend(check_ambiguous_status(attribution));
    issues
}

fn check_duplicate_employee_keys(input: &TrackerInput) -> Option<ValidationIssue> {
    let mut counts: BTreeMap<EmployeeKey, usize> = BTreeMap::new();
    let mut order = Vec::new();
    for e in &input.roster {
        let key = EmployeeKey::from_employee(e);
        let n = counts.entry(key.clone()).or_insert(0);
        *n += 1;
        if *n == 2 {
            order.push(key);
        }
    }
    if order.is_empty() {
        return None;
    }

    let sample: Vec<&str> = order.iter().take(SAMPLE_LIMIT).map(|k| k.as_str()).collect();
    Some(ValidationIssue::error(
        "HR_DUPLICATE_EMPLOYEE_KEY",
        "HR: duplicate employees detected (same Full Name + Organization + Organization \
         Description + Job Title); training records cannot be attributed unambiguously.",
        json!({ "duplicate_keys_sample": sample, "count": order.len() }),
    ))
}

fn check_roles_without_requirements(input: &TrackerInput) -> Option<ValidationIssue> {
    let index = RequirementIndex::build(&input.requirements);
    let missing = roles_without_requirements(&input.roster, &index);
    if missing.is_empty() {
        return None;
    }

    let sample: Vec<Value> = missing
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|k| json!({ "org_code": k.org_code, "org_desc": k.org_desc, "job_title": k.job_title }))
        .collect();
    Some(ValidationIssue::warning(
        "HR_EMPLOYEE_WITHOUT_ROLE_REQUIREMENTS",
        format!(
            "{} (org_code, org_desc, job_title) combinations in HR have no requirements in Roles. \
             These employees will report mandatory_count=0.",
            missing.len()
        ),
        json!({ "sample": sample, "count": missing.len() }),
    ))
}

fn check_status_units(input: &TrackerInput) -> Option<ValidationIssue> {
    let known: BTreeSet<String> = input.roster.iter().map(|e| normalize_text(&e.org_desc)).collect();
    let unknown: Vec<_> = input
        .status
        .iter()
        .filter(|s| !known.contains(&normalize_text(&s.org_desc)))
        .collect();
    if unknown.is_empty() {
        return None;
    }

    let sample: Vec<Value> = unknown
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|s| json!({ "user_name": s.user_name, "org_desc": s.org_desc }))
        .collect();
    Some(ValidationIssue::warning(
        "STATUS_ORG_DESC_NOT_IN_HR",
        format!(
            "{} Status rows have an Organization Description that does not exist in HR. \
             They probably cannot be attributed to an employee.",
            unknown.len()
        ),
        json!({ "sample": sample, "count": unknown.len() }),
    ))
}

fn check_ambiguous_status(attribution: &Attribution<'_>) -> Option<ValidationIssue> {
    if attribution.ambiguous.is_empty() {
        return None;
    }

    let sample: Vec<Value> = attribution
        .ambiguous
        .iter()
        .take(SAMPLE_LIMIT)
        .map(|a| {
            json!({
                "user_name": a.record.user_name,
                "org_desc": a.record.org_desc,
                "curriculum_id": a.record.curriculum_id,
                "candidates": a.candidates.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();
    Some(ValidationIssue::warning(
        "STATUS_AMBIGUOUS_EMPLOYEE_MATCH",
        format!(
            "{} Status rows match more than one HR employee in the same unit and were \
             excluded from the KPIs.",
            attribution.ambiguous.len()
        ),
        json!({ "sample": sample, "count": attribution.ambiguous.len() }),
    ))
}
