//! Role-based requirement expansion: roster rows x requirement rows on
//! (org_code, org_desc, job_title).

use std::collections::{BTreeMap, BTreeSet};

use crate::identity::EmployeeKey;
use crate::model::{Employee, Requirement};

/// Join key shared by roster and requirement rows. Values are trimmed, not normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleKey {
    pub org_code: String,
    pub org_desc: String,
    pub job_title: String,
}

impl RoleKey {
    pub fn new(org_code: &str, org_desc: &str, job_title: &str) -> Self {
        Self {
            org_code: org_code.trim().to_string(),
            org_desc: org_desc.trim().to_string(),
            job_title: job_title.trim().to_string(),
        }
    }

    pub fn of_employee(e: &Employee) -> Self {
        Self::new(&e.org_code, &e.org_desc, &e.job_title)
    }

    pub fn of_requirement(r: &Requirement) -> Self {
        Self::new(&r.org_code, &r.org_desc, &r.job_title)
    }
}

/// Requirement rows grouped by role, preserving input order within a role.
#[derive(Debug, Default)]
pub struct RequirementIndex<'a> {
    by_role: BTreeMap<RoleKey, Vec<&'a Requirement>>,
}

impl<'a> RequirementIndex<'a> {
    pub fn build(requirements: &'a [Requirement]) -> Self {
        let mut by_role: BTreeMap<RoleKey, Vec<&'a Requirement>> = BTreeMap::new();
        for req in requirements {
            by_role.entry(RoleKey::of_requirement(req)).or_default().push(req);
        }
        Self { by_role }
    }

    pub fn for_employee(&self, employee: &Employee) -> &[&'a Requirement] {
        self.by_role
            .get(&RoleKey::of_employee(employee))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_role(&self, key: &RoleKey) -> bool {
        self.by_role.contains_key(key)
    }
}

/// One (roster row, requirement row) pairing.
#[derive(Debug, Clone)]
pub struct RequiredCurriculum<'a> {
    /// Position of the employee in the roster.
    pub roster_row: usize,
    pub employee: &'a Employee,
    pub employee_key: EmployeeKey,
    pub requirement: &'a Requirement,
}

/// Expand every roster row into its required curricula.
///
/// Output order is roster order, then requirement order. Employees without
/// a matching role produce no rows here but are still reported downstream.
pub fn join_requirements<'a>(
    roster: &'a [Employee],
    index: &RequirementIndex<'a>,
) -> Vec<RequiredCurriculum<'a>> {
    let mut out = Vec::new();
    for (roster_row, employee) in roster.iter().enumerate() {
        let reqs = index.for_employee(employee);
        if reqs.is_empty() {
            continue;
        }
        let employee_key = EmployeeKey::from_employee(employee);
        for requirement in reqs {
            out.push(RequiredCurriculum {
                roster_row,
                employee,
                employee_key: employee_key.clone(),
                requirement,
            });
        }
    }
    out
}

/// Distinct roster role combinations with no requirement rows, in first-seen order.
pub fn roles_without_requirements(roster: &[Employee], index: &RequirementIndex<'_>) -> Vec<RoleKey> {
    let mut seen = BTreeSet::new();
    roster
        .iter()
        .map(RoleKey::of_employee)
        .filter(|key| !index.contains_role(key))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
