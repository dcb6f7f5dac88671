//! Completion derivation: requirement rows x attributed status rows.
//!
//! State policy per (employee, curriculum):
//!
//! | assigned | completed | days_remaining | is_done |
//! |----------|-----------|----------------|---------|
//! | no       | -         | null           | false   |
//! | yes      | yes       | null           | true    |
//! | yes      | no        | >= 0           | true    |
//! | yes      | no        | < 0 or null    | false   |

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::identity::{EmployeeKey, IdentityIndex, Resolution};
use crate::model::{
    Employee, EmployeeKpi, ExtraCompletion, RequirementStatus, ResolutionSummary, StatusRecord,
};
use crate::requirements::RequiredCurriculum;

// ---------------------------------------------------------------------------
// Attribution
// ---------------------------------------------------------------------------

/// A status row attributed to exactly one employee.
#[derive(Debug, Clone)]
pub struct ResolvedStatus<'a> {
    pub employee_key: EmployeeKey,
    pub record: &'a StatusRecord,
}

/// A status row whose bucket held several employees.
#[derive(Debug, Clone)]
pub struct AmbiguousStatus<'a> {
    pub record: &'a StatusRecord,
    pub candidates: Vec<EmployeeKey>,
}

#[derive(Debug, Default)]
pub struct Attribution<'a> {
    pub resolved: Vec<ResolvedStatus<'a>>,
    pub ambiguous: Vec<AmbiguousStatus<'a>>,
    pub summary: ResolutionSummary,
}

/// Resolve every status row against the roster index. Unmatched and
/// ambiguous rows are kept out of `resolved`.
pub fn attribute_status<'a>(index: &IdentityIndex, status: &'a [StatusRecord]) -> Attribution<'a> {
    let mut out = Attribution {
        summary: ResolutionSummary {
            status_rows: status.len(),
            ..Default::default()
        },
        ..Default::default()
    };

    for record in status {
        match index.resolve(&record.user_name, &record.org_desc) {
            Resolution::Resolved(employee_key) => {
                out.summary.resolved += 1;
                out.resolved.push(ResolvedStatus { employee_key, record });
            }
            Resolution::Unmatched => out.summary.unmatched += 1,
            Resolution::Ambiguous(candidates) => {
                out.summary.ambiguous += 1;
                out.ambiguous.push(AmbiguousStatus { record, candidates });
            }
        }
    }

    debug!(
        rows = out.summary.status_rows,
        resolved = out.summary.resolved,
        unmatched = out.summary.unmatched,
        ambiguous = out.summary.ambiguous,
        "status rows attributed"
    );
    out
}

// ---------------------------------------------------------------------------
// Status aggregation
// ---------------------------------------------------------------------------

/// All status rows for one (employee, curriculum), merged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusAggregate {
    /// Any row completed.
    pub completed: bool,
    /// Most overdue value among rows that carry one.
    pub days_remaining: Option<f64>,
    pub record_count: usize,
}

pub type PairKey = (EmployeeKey, String);

pub fn aggregate_status(resolved: &[ResolvedStatus<'_>]) -> BTreeMap<PairKey, StatusAggregate> {
    let mut groups: BTreeMap<PairKey, StatusAggregate> = BTreeMap::new();

    for r in resolved {
        let key = (r.employee_key.clone(), r.record.curriculum_id.trim().to_string());
        let entry = groups.entry(key).or_default();
        entry.completed |= r.record.is_completed();
        entry.record_count += 1;
        if let Some(days) = r.record.days_remaining.filter(|d| !d.is_nan()) {
            entry.days_remaining = Some(match entry.days_remaining {
                Some(current) => current.min(days),
                None => days,
            });
        }
    }

    groups
}

// ---------------------------------------------------------------------------
// Requirement status
// ---------------------------------------------------------------------------

/// Apply the state policy to one required curriculum.
pub fn derive_status(required: &RequiredCurriculum<'_>, status: Option<&StatusAggregate>) -> RequirementStatus {
    let is_assigned = status.is_some();
    let is_completed = status.is_some_and(|s| s.completed);
    let days_remaining = if is_assigned && !is_completed {
        status.and_then(|s| s.days_remaining)
    } else {
        None
    };
    let is_done = is_completed || (is_assigned && days_remaining.is_some_and(|d| d >= 0.0));

    RequirementStatus {
        employee_key: required.employee_key.clone(),
        employee: required.employee.clone(),
        curriculum_id: required.requirement.curriculum_id.clone(),
        curriculum_title: required.requirement.curriculum_title.clone(),
        required_type: required.requirement.required_type,
        is_assigned,
        is_completed,
        days_remaining,
        is_done,
    }
}

pub fn derive_requirement_status(
    required: &[RequiredCurriculum<'_>],
    status: &BTreeMap<PairKey, StatusAggregate>,
) -> Vec<RequirementStatus> {
    required
        .iter()
        .map(|r| {
            let key = (r.employee_key.clone(), r.requirement.curriculum_id.trim().to_string());
            derive_status(r, status.get(&key))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Extra completions
// ---------------------------------------------------------------------------

/// Completed, attributed trainings outside the employee's requirement set.
///
/// The requirement set is mandatory and optional together, so a completed
/// optional curriculum is never extra. One row per (employee, curriculum),
/// ordered by employee key then curriculum id.
pub fn find_extra_completions(
    roster: &[Employee],
    detail: &[RequirementStatus],
    resolved: &[ResolvedStatus<'_>],
) -> Vec<ExtraCompletion> {
    let required: BTreeSet<(&EmployeeKey, &str)> = detail
        .iter()
        .map(|d| (&d.employee_key, d.curriculum_id.trim()))
        .collect();

    let mut extras: BTreeMap<(&EmployeeKey, &str), &StatusRecord> = BTreeMap::new();
    for r in resolved.iter().filter(|r| r.record.is_completed()) {
        let key = (&r.employee_key, r.record.curriculum_id.trim());
        if !required.contains(&key) {
            extras.entry(key).or_insert(r.record);
        }
    }

    if extras.is_empty() {
        return Vec::new();
    }

    let employees = first_employee_by_key(roster);
    extras
        .into_iter()
        .filter_map(|((key, curriculum_id), record)| {
            let employee = employees.get(key)?;
            Some(ExtraCompletion {
                employee_key: key.clone(),
                employee: (*employee).clone(),
                curriculum_id: curriculum_id.to_string(),
                curriculum_title: record.curriculum_title.clone(),
            })
        })
        .collect()
}

fn first_employee_by_key(roster: &[Employee]) -> BTreeMap<EmployeeKey, &Employee> {
    let mut map = BTreeMap::new();
    for e in roster {
        map.entry(EmployeeKey::from_employee(e)).or_insert(e);
    }
    map
}

// ---------------------------------------------------------------------------
// Employee KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct CurriculumFlags {
    assigned: bool,
    completed: bool,
    done: bool,
}

#[derive(Debug, Default)]
struct EmployeeRollup<'a> {
    mandatory: BTreeMap<&'a str, CurriculumFlags>,
    optional_completed: BTreeMap<&'a str, bool>,
    extra: usize,
}

/// One KPI row per roster row, in roster order.
///
/// Counts are over distinct curriculum ids per employee key, so a curriculum
/// listed twice for the same role counts once, with flags OR-ed.
pub fn employee_kpis(
    roster: &[Employee],
    detail: &[RequirementStatus],
    extras: &[ExtraCompletion],
) -> Vec<EmployeeKpi> {
    let mut rollups: BTreeMap<&EmployeeKey, EmployeeRollup<'_>> = BTreeMap::new();

    for d in detail {
        let rollup = rollups.entry(&d.employee_key).or_default();
        let curriculum = d.curriculum_id.trim();
        if d.required_type.is_mandatory() {
            let flags = rollup.mandatory.entry(curriculum).or_default();
            flags.assigned |= d.is_assigned;
            flags.completed |= d.is_completed;
            flags.done |= d.is_done;
        } else {
            *rollup.optional_completed.entry(curriculum).or_default() |= d.is_completed;
        }
    }
    for x in extras {
        rollups.entry(&x.employee_key).or_default().extra += 1;
    }

    let empty = EmployeeRollup::default();
    roster
        .iter()
        .map(|employee| {
            let employee_key = EmployeeKey::from_employee(employee);
            let rollup = rollups.get(&employee_key).unwrap_or(&empty);
            build_kpi(employee_key, employee, rollup)
        })
        .collect()
}

fn build_kpi(employee_key: EmployeeKey, employee: &Employee, rollup: &EmployeeRollup<'_>) -> EmployeeKpi {
    let flags = rollup.mandatory.values();
    let mandatory_count = rollup.mandatory.len();
    let mandatory_completed_count = flags.clone().filter(|f| f.completed).count();
    let mandatory_done_count = flags.clone().filter(|f| f.done).count();
    let unassigned_mandatory_count = flags.filter(|f| !f.assigned).count();
    let optional_completed_count = rollup.optional_completed.values().filter(|c| **c).count();

    let mandatory_missing_count = mandatory_count - mandatory_completed_count;
    let has_requirements = mandatory_count > 0;
    let completion_pct = if has_requirements {
        Some(100.0 * mandatory_completed_count as f64 / mandatory_count as f64)
    } else {
        None
    };

    EmployeeKpi {
        employee_key,
        employee: employee.clone(),
        mandatory_count,
        mandatory_completed_count,
        mandatory_done_count,
        mandatory_missing_count,
        unassigned_mandatory_count,
        has_requirements,
        completion_pct,
        full_compliance_flag: has_requirements && mandatory_missing_count == 0,
        full_done_flag: has_requirements && mandatory_done_count == mandatory_count,
        optional_completed_count,
        extra_completed_count: rollup.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RequiredType, Requirement};

    fn employee() -> Employee {
        Employee {
            full_name: "SANTANA MENDOZA JORGE".into(),
            job_title: "J".into(),
            org_code: "A".into(),
            org_desc: "U".into(),
            head_of_department: "H".into(),
        }
    }

    fn requirement(id: &str, kind: RequiredType) -> Requirement {
        Requirement {
            org_code: "A".into(),
            org_desc: "U".into(),
            job_title: "J".into(),
            curriculum_id: id.into(),
            curriculum_title: format!("T{id}"),
            required_type: kind,
        }
    }

    fn status(id: &str, complete: &str, days: Option<f64>) -> StatusRecord {
        StatusRecord {
            user_name: "JORGE, SANTANA MENDOZA".into(),
            org_desc: "U".into(),
            curriculum_id: id.into(),
            curriculum_title: format!("T{id}"),
            curriculum_complete: complete.into(),
            days_remaining: days,
        }
    }

    fn required<'a>(e: &'a Employee, r: &'a Requirement) -> RequiredCurriculum<'a> {
        RequiredCurriculum {
            roster_row: 0,
            employee: e,
            employee_key: EmployeeKey::from_employee(e),
            requirement: r,
        }
    }

    fn aggregate(completed: bool, days: Option<f64>) -> StatusAggregate {
        StatusAggregate {
            completed,
            days_remaining: days,
            record_count: 1,
        }
    }

    #[test]
    fn zero_days_remaining_is_on_time() {
        let e = employee();
        let r = requirement("c1", RequiredType::Mandatory);
        let s = derive_status(&required(&e, &r), Some(&aggregate(false, Some(0.0))));
        assert!(s.is_assigned);
        assert!(!s.is_completed);
        assert_eq!(s.days_remaining, Some(0.0));
        assert!(s.is_done);
    }

    #[test]
    fn negative_days_remaining_is_overdue() {
        let e = employee();
        let r = requirement("c1", RequiredType::Mandatory);
        let s = derive_status(&required(&e, &r), Some(&aggregate(false, Some(-1.0))));
        assert_eq!(s.days_remaining, Some(-1.0));
        assert!(!s.is_done);
    }

    #[test]
    fn pending_without_days_is_not_done() {
        let e = employee();
        let r = requirement("c1", RequiredType::Mandatory);
        let s = derive_status(&required(&e, &r), Some(&aggregate(false, None)));
        assert!(s.is_assigned);
        assert!(!s.is_done);
    }

    #[test]
    fn completion_clears_days_remaining() {
        let e = employee();
        let r = requirement("c1", RequiredType::Mandatory);
        for days in [Some(-30.0), Some(5.0), None] {
            let s = derive_status(&required(&e, &r), Some(&aggregate(true, days)));
            assert!(s.is_completed);
            assert_eq!(s.days_remaining, None);
            assert!(s.is_done);
        }
    }

    #[test]
    fn unassigned_requirement() {
        let e = employee();
        let r = requirement("c1", RequiredType::Mandatory);
        let s = derive_status(&required(&e, &r), None);
        assert!(!s.is_assigned);
        assert!(!s.is_completed);
        assert_eq!(s.days_remaining, None);
        assert!(!s.is_done);
    }

    #[test]
    fn aggregation_takes_any_completed_and_min_days() {
        let roster = vec![employee()];
        let index = IdentityIndex::build(&roster);
        let rows = vec![
            status("c1", "No", Some(10.0)),
            status("c1", "No", Some(-4.0)),
            status("c1", "No", None),
            status("c2", "No", Some(3.0)),
            status("c2", "Yes", None),
        ];
        let attribution = attribute_status(&index, &rows);
        let agg = aggregate_status(&attribution.resolved);
        let key = EmployeeKey::from_employee(&roster[0]);

        let c1 = agg[&(key.clone(), "c1".to_string())];
        assert!(!c1.completed);
        assert_eq!(c1.days_remaining, Some(-4.0));
        assert_eq!(c1.record_count, 3);

        let c2 = agg[&(key, "c2".to_string())];
        assert!(c2.completed);
    }

    #[test]
    fn attribution_counts_outcomes() {
        let roster = vec![employee()];
        let index = IdentityIndex::build(&roster);
        let mut stranger = status("c1", "Yes", None);
        stranger.user_name = "NOBODY, HERE".into();
        let rows = vec![status("c1", "Yes", None), stranger];

        let attribution = attribute_status(&index, &rows);
        assert_eq!(attribution.summary.status_rows, 2);
        assert_eq!(attribution.summary.resolved, 1);
        assert_eq!(attribution.summary.unmatched, 1);
        assert_eq!(attribution.summary.ambiguous, 0);
    }

    #[test]
    fn kpis_count_distinct_mandatory_curricula() {
        let roster = vec![employee()];
        let reqs = vec![
            requirement("c1", RequiredType::Mandatory),
            requirement("c1", RequiredType::Mandatory),
            requirement("c2", RequiredType::Mandatory),
            requirement("o1", RequiredType::Optional),
        ];
        let e = &roster[0];
        let joined: Vec<_> = reqs.iter().map(|r| required(e, r)).collect();
        let key = EmployeeKey::from_employee(e);
        let mut agg = BTreeMap::new();
        agg.insert((key.clone(), "c1".to_string()), aggregate(true, None));
        agg.insert((key, "o1".to_string()), aggregate(true, None));

        let detail = derive_requirement_status(&joined, &agg);
        let kpis = employee_kpis(&roster, &detail, &[]);
        let k = &kpis[0];

        assert_eq!(k.mandatory_count, 2);
        assert_eq!(k.mandatory_completed_count, 1);
        assert_eq!(k.mandatory_done_count, 1);
        assert_eq!(k.mandatory_missing_count, 1);
        assert_eq!(k.unassigned_mandatory_count, 1);
        assert_eq!(k.completion_pct, Some(50.0));
        assert!(!k.full_compliance_flag);
        assert!(!k.full_done_flag);
        assert_eq!(k.optional_completed_count, 1);
    }

    #[test]
    fn employee_without_requirements_has_undefined_pct() {
        let roster = vec![employee()];
        let kpis = employee_kpis(&roster, &[], &[]);
        assert_eq!(kpis.len(), 1);
        assert!(!kpis[0].has_requirements);
        assert_eq!(kpis[0].completion_pct, None);
        assert!(!kpis[0].full_compliance_flag);
        assert!(!kpis[0].full_done_flag);
    }

    #[test]
    fn optional_only_employee_has_no_requirements() {
        let roster = vec![employee()];
        let r = requirement("o1", RequiredType::Optional);
        let joined = vec![required(&roster[0], &r)];
        let detail = derive_requirement_status(&joined, &BTreeMap::new());
        let kpis = employee_kpis(&roster, &detail, &[]);
        assert_eq!(kpis[0].mandatory_count, 0);
        assert!(!kpis[0].has_requirements);
        assert_eq!(kpis[0].completion_pct, None);
    }

    #[test]
    fn extras_exclude_required_and_pending_records() {
        let roster = vec![employee()];
        let reqs = vec![
            requirement("c1", RequiredType::Mandatory),
            requirement("o1", RequiredType::Optional),
        ];
        let joined: Vec<_> = reqs.iter().map(|r| required(&roster[0], r)).collect();
        let detail = derive_requirement_status(&joined, &BTreeMap::new());

        let rows = vec![
            status("c1", "Yes", None),
            status("o1", "Yes", None),
            status("x1", "Yes", None),
            status("x1", "Yes", None),
            status("x2", "No", Some(5.0)),
        ];
        let index = IdentityIndex::build(&roster);
        let attribution = attribute_status(&index, &rows);
        let extras = find_extra_completions(&roster, &detail, &attribution.resolved);

        assert_eq!(extras.len(), 1);
        assert_eq!(extras[0].curriculum_id, "x1");
        assert_eq!(extras[0].curriculum_title, "Tx1");

        let kpis = employee_kpis(&roster, &detail, &extras);
        assert_eq!(kpis[0].extra_completed_count, 1);
        assert_eq!(kpis[0].mandatory_completed_count, 0);
    }
}
