//! Department, organization and company roll-ups of employee KPIs.

use std::collections::BTreeMap;

use crate::model::{
    ratio, CompanyKpi, CompletionSegment, DepartmentKpi, EmployeeKpi, GroupStats, OrganizationKpi,
    RequirementStatus,
};

/// Accumulates [`GroupStats`] with a null-safe completion mean.
#[derive(Debug, Default)]
struct StatsBuilder {
    stats: GroupStats,
    pct_sum: f64,
    pct_count: usize,
}

impl StatsBuilder {
    fn push(&mut self, kpi: &EmployeeKpi) {
        let s = &mut self.stats;
        s.employees_count += 1;
        s.employees_with_requirements += usize::from(kpi.has_requirements);
        s.employees_full_compliance += usize::from(kpi.full_compliance_flag);

        if let Some(pct) = kpi.completion_pct.filter(|p| !p.is_nan()) {
            self.pct_sum += pct;
            self.pct_count += 1;
        }

        match CompletionSegment::from_pct(kpi.completion_pct) {
            Some(CompletionSegment::BelowSeventy) => s.segment_below_70 += 1,
            Some(CompletionSegment::SeventyToEightyNine) => s.segment_70_89 += 1,
            Some(CompletionSegment::NinetyPlus) => s.segment_90_plus += 1,
            None => {}
        }
    }

    fn finish(mut self) -> GroupStats {
        self.stats.avg_completion_pct = mean(self.pct_sum, self.pct_count);
        self.stats
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Group by (org_code, org_desc), ordered by key.
pub fn department_kpis(employees: &[EmployeeKpi]) -> Vec<DepartmentKpi> {
    let mut groups: BTreeMap<(&str, &str), StatsBuilder> = BTreeMap::new();
    for kpi in employees {
        let key = (kpi.employee.org_code.as_str(), kpi.employee.org_desc.as_str());
        groups.entry(key).or_default().push(kpi);
    }

    groups
        .into_iter()
        .map(|((org_code, org_desc), builder)| {
            let stats = builder.finish();
            DepartmentKpi {
                org_code: org_code.to_string(),
                org_desc: org_desc.to_string(),
                dept_full_compliance_rate: stats.full_compliance_rate(),
                stats,
            }
        })
        .collect()
}

/// Group by org_code, ordered by key.
pub fn organization_kpis(employees: &[EmployeeKpi]) -> Vec<OrganizationKpi> {
    let mut groups: BTreeMap<&str, StatsBuilder> = BTreeMap::new();
    for kpi in employees {
        groups.entry(kpi.employee.org_code.as_str()).or_default().push(kpi);
    }

    groups
        .into_iter()
        .map(|(org_code, builder)| {
            let stats = builder.finish();
            OrganizationKpi {
                org_code: org_code.to_string(),
                org_full_compliance_rate: stats.full_compliance_rate(),
                stats,
            }
        })
        .collect()
}

/// Company totals. Curricula rates come from the mandatory detail rows
/// directly, independent of the per-employee average.
pub fn company_kpis(employees: &[EmployeeKpi], mandatory_detail: &[RequirementStatus]) -> CompanyKpi {
    let mut builder = StatsBuilder::default();
    for kpi in employees {
        builder.push(kpi);
    }
    let stats = builder.finish();

    let total_mandatory_curricula = mandatory_detail.len();
    let total_completed_mandatory = mandatory_detail.iter().filter(|d| d.is_completed).count();
    let total_done_mandatory = mandatory_detail.iter().filter(|d| d.is_done).count();

    CompanyKpi {
        total_employees: stats.employees_count,
        employees_with_requirements: stats.employees_with_requirements,
        employees_full_compliance: stats.employees_full_compliance,
        avg_completion_pct: stats.avg_completion_pct,
        company_full_compliance_rate: stats.full_compliance_rate(),
        total_mandatory_curricula,
        total_completed_mandatory,
        mandatory_curricula_completion_rate: ratio(total_completed_mandatory, total_mandatory_curricula),
        total_done_mandatory,
        mandatory_curricula_done_rate: ratio(total_done_mandatory, total_mandatory_curricula),
    }
}
