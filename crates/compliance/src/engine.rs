use tracing::{debug, info};

use crate::aggregate::{company_kpis, department_kpis, organization_kpis};
use crate::completion::{
    aggregate_status, attribute_status, derive_requirement_status, employee_kpis, find_extra_completions,
};
use crate::identity::IdentityIndex;
use crate::model::{ComplianceReport, RequirementStatus, TrackerInput};
use crate::requirements::{join_requirements, RequirementIndex};
use crate::validation::validate_attributed;

/// Derive every compliance table from the three input tables.
///
/// Never fails: findings that a caller may treat as fatal (duplicate
/// employee keys, for instance) are returned in `issues`.
pub fn run(input: &TrackerInput) -> ComplianceReport {
    // Identity
    let identity = IdentityIndex::build(&input.roster);
    let attribution = attribute_status(&identity, &input.status);
    let issues = validate_attributed(input, &attribution);
    let status_by_pair = aggregate_status(&attribution.resolved);
    debug!(buckets = identity.bucket_count(), pairs = status_by_pair.len(), "identity index built");

    // Requirements x status
    let requirement_index = RequirementIndex::build(&input.requirements);
    let required = join_requirements(&input.roster, &requirement_index);
    let detail = derive_requirement_status(&required, &status_by_pair);
    let extra_detail = find_extra_completions(&input.roster, &detail, &attribution.resolved);

    // Per employee
    let employee_kpis = employee_kpis(&input.roster, &detail, &extra_detail);
    let (mandatory_detail, optional_detail): (Vec<RequirementStatus>, Vec<RequirementStatus>) =
        detail.into_iter().partition(|d| d.required_type.is_mandatory());

    // Roll-ups
    let department_kpis = department_kpis(&employee_kpis);
    let organization_kpis = organization_kpis(&employee_kpis);
    let company_kpis = company_kpis(&employee_kpis, &mandatory_detail);

    info!(
        employees = employee_kpis.len(),
        mandatory_rows = mandatory_detail.len(),
        optional_rows = optional_detail.len(),
        extra_rows = extra_detail.len(),
        departments = department_kpis.len(),
        issues = issues.len(),
        "compliance computed"
    );

    ComplianceReport {
        employee_kpis,
        mandatory_detail,
        optional_detail,
        extra_detail,
        department_kpis,
        organization_kpis,
        company_kpis,
        resolution: attribution.summary,
        issues,
    }
}
