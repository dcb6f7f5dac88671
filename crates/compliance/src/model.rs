use serde::Serialize;

use crate::identity::EmployeeKey;
use crate::normalize::is_affirmative;
use crate::validation::ValidationIssue;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One roster row. Values are trimmed but otherwise as loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Employee {
    pub full_name: String,
    pub job_title: String,
    pub org_code: String,
    pub org_desc: String,
    pub head_of_department: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RequiredType {
    Mandatory,
    Optional,
}

impl RequiredType {
    /// Parse a `Required` cell. Accepts `mandatory`, `obligatorio` and `optional`
    /// in any case, surrounding whitespace ignored. Returns `None` for anything
    /// else, blanks included.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "mandatory" | "obligatorio" => Some(Self::Mandatory),
            "optional" => Some(Self::Optional),
            _ => None,
        }
    }

    /// Cells that mean "not applicable" and are dropped rather than rejected.
    pub fn is_not_applicable(raw: &str) -> bool {
        let key = raw.trim().to_lowercase();
        matches!(key.as_str(), "" | "na" | "n/a" | "nan")
    }

    pub fn is_mandatory(&self) -> bool {
        matches!(self, Self::Mandatory)
    }
}

impl std::fmt::Display for RequiredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mandatory => write!(f, "Mandatory"),
            Self::Optional => write!(f, "Optional"),
        }
    }
}

/// Role-based curriculum requirement for an (org_code, org_desc, job_title) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Requirement {
    pub org_code: String,
    pub org_desc: String,
    pub job_title: String,
    pub curriculum_id: String,
    pub curriculum_title: String,
    pub required_type: RequiredType,
}

/// One row of the training status feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRecord {
    pub user_name: String,
    pub org_desc: String,
    pub curriculum_id: String,
    pub curriculum_title: String,
    pub curriculum_complete: String,
    /// Signed; negative means overdue. Usually empty once completed.
    pub days_remaining: Option<f64>,
}

impl StatusRecord {
    pub fn is_completed(&self) -> bool {
        is_affirmative(&self.curriculum_complete)
    }
}

/// Pre-loaded tables for one run.
#[derive(Debug, Clone, Default)]
pub struct TrackerInput {
    pub roster: Vec<Employee>,
    pub requirements: Vec<Requirement>,
    pub status: Vec<StatusRecord>,
}

// ---------------------------------------------------------------------------
// Derived: per employee x curriculum
// ---------------------------------------------------------------------------

/// Status of one required curriculum for one roster row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementStatus {
    #[serde(skip)]
    pub employee_key: EmployeeKey,
    #[serde(flatten)]
    pub employee: Employee,
    pub curriculum_id: String,
    pub curriculum_title: String,
    #[serde(skip)]
    pub required_type: RequiredType,
    pub is_assigned: bool,
    pub is_completed: bool,
    pub days_remaining: Option<f64>,
    pub is_done: bool,
}

/// A completed training attributed to an employee but outside their requirement set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraCompletion {
    #[serde(skip)]
    pub employee_key: EmployeeKey,
    #[serde(flatten)]
    pub employee: Employee,
    pub curriculum_id: String,
    pub curriculum_title: String,
}

// ---------------------------------------------------------------------------
// Derived: per employee
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeKpi {
    #[serde(skip)]
    pub employee_key: EmployeeKey,
    #[serde(flatten)]
    pub employee: Employee,
    pub mandatory_count: usize,
    pub mandatory_completed_count: usize,
    pub mandatory_done_count: usize,
    pub mandatory_missing_count: usize,
    pub unassigned_mandatory_count: usize,
    pub has_requirements: bool,
    pub completion_pct: Option<f64>,
    pub full_compliance_flag: bool,
    pub full_done_flag: bool,
    pub optional_completed_count: usize,
    pub extra_completed_count: usize,
}

// ---------------------------------------------------------------------------
// Derived: roll-ups
// ---------------------------------------------------------------------------

/// Completion histogram bucket. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CompletionSegment {
    #[serde(rename = "<70%")]
    BelowSeventy,
    #[serde(rename = "70–89%")]
    SeventyToEightyNine,
    #[serde(rename = ">=90%")]
    NinetyPlus,
}

impl CompletionSegment {
    pub fn from_pct(pct: Option<f64>) -> Option<Self> {
        let pct = pct.filter(|p| !p.is_nan())?;
        Some(if pct >= 90.0 {
            Self::NinetyPlus
        } else if pct >= 70.0 {
            Self::SeventyToEightyNine
        } else {
            Self::BelowSeventy
        })
    }
}

/// Counters shared by the department and organization roll-ups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupStats {
    pub employees_count: usize,
    pub employees_with_requirements: usize,
    pub employees_full_compliance: usize,
    pub avg_completion_pct: Option<f64>,
    #[serde(rename = "70–89%")]
    pub segment_70_89: usize,
    #[serde(rename = "<70%")]
    pub segment_below_70: usize,
    #[serde(rename = ">=90%")]
    pub segment_90_plus: usize,
}

impl GroupStats {
    pub fn full_compliance_rate(&self) -> Option<f64> {
        ratio(self.employees_full_compliance, self.employees_with_requirements)
    }

    pub fn segment_total(&self) -> usize {
        self.segment_70_89 + self.segment_below_70 + self.segment_90_plus
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentKpi {
    pub org_code: String,
    pub org_desc: String,
    #[serde(flatten)]
    pub stats: GroupStats,
    pub dept_full_compliance_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationKpi {
    pub org_code: String,
    #[serde(flatten)]
    pub stats: GroupStats,
    pub org_full_compliance_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompanyKpi {
    pub total_employees: usize,
    pub employees_with_requirements: usize,
    pub employees_full_compliance: usize,
    pub avg_completion_pct: Option<f64>,
    pub company_full_compliance_rate: Option<f64>,
    pub total_mandatory_curricula: usize,
    pub total_completed_mandatory: usize,
    pub mandatory_curricula_completion_rate: Option<f64>,
    pub total_done_mandatory: usize,
    pub mandatory_curricula_done_rate: Option<f64>,
}

/// `num / den`, or `None` when the denominator is zero.
pub(crate) fn ratio(num: usize, den: usize) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// How the status feed was attributed to roster rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub status_rows: usize,
    pub resolved: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub employee_kpis: Vec<EmployeeKpi>,
    pub mandatory_detail: Vec<RequirementStatus>,
    pub optional_detail: Vec<RequirementStatus>,
    pub extra_detail: Vec<ExtraCompletion>,
    pub department_kpis: Vec<DepartmentKpi>,
    pub organization_kpis: Vec<OrganizationKpi>,
    pub company_kpis: CompanyKpi,
    pub resolution: ResolutionSummary,
    pub issues: Vec<ValidationIssue>,
}

impl ComplianceReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.is_error())
    }
}
