// ttrack build-outputs

use std::path::{Path, PathBuf};

use serde::Serialize;
use ttrack_compliance::model::{CompanyKpi, ResolutionSummary};
use ttrack_compliance::{run, ValidationIssue};
use ttrack_config::Settings;
use ttrack_io::{export_issues_csv, export_workbook};

use crate::validate::{count_levels, print_issues, print_json};
use crate::{load_input, CliError};

#[derive(Serialize)]
struct BuildSummary<'a> {
    status: &'static str,
    output_dir: &'a Path,
    workbook: Option<PathBuf>,
    issues_csv: Option<PathBuf>,
    reference_year: i32,
    allowed_completion_status: &'a [String],
    resolution: Option<&'a ResolutionSummary>,
    company_kpis: Option<&'a CompanyKpi>,
    issues: &'a [ValidationIssue],
}

pub fn cmd_build_outputs(settings: &Settings, json: bool) -> Result<(), CliError> {
    let output_dir = settings.output_dir.as_path();

    let input = match load_input(&settings.input_dir) {
        Ok(input) => input,
        Err((err, issue)) => {
            let issues: Vec<ValidationIssue> = issue.into_iter().collect();
            let issues_csv = if issues.is_empty() {
                None
            } else {
                Some(write_issues(output_dir, &issues)?)
            };
            if json {
                print_json(&BuildSummary {
                    issues_csv,
                    ..summary(settings, "input_error", &issues)
                })?;
            } else if let Some(path) = issues_csv {
                eprintln!("wrote {}", path.display());
            }
            return Err(err);
        }
    };

    let report = run(&input);
    let (errors, _) = count_levels(&report.issues);
    if errors > 0 {
        let path = write_issues(output_dir, &report.issues)?;
        if json {
            print_json(&BuildSummary {
                issues_csv: Some(path.clone()),
                ..summary(settings, "validation_failed", &report.issues)
            })?;
        } else {
            print_issues(&report.issues);
        }
        return Err(CliError::validation(format!("{errors} ERROR-level validation issue(s); outputs not built"))
            .with_hint(format!("details in {}; run `ttrack validate` after fixing the inputs", path.display())));
    }

    let result = export_workbook(output_dir, &report, &report.issues).map_err(|e| CliError::output(e.to_string()))?;

    if json {
        print_json(&BuildSummary {
            workbook: Some(result.path.clone()),
            resolution: Some(&report.resolution),
            company_kpis: Some(&report.company_kpis),
            ..summary(settings, "ok", &report.issues)
        })?;
    } else {
        print_issues(&report.issues);
        let company = &report.company_kpis;
        eprintln!("wrote {} ({} sheets)", result.path.display(), result.sheets_exported);
        eprintln!(
            "{} employees, {} fully compliant ({}), mandatory curricula completed {}/{} ({}); \
             status rows: {} resolved, {} unmatched, {} ambiguous",
            company.total_employees,
            company.employees_full_compliance,
            percent(company.company_full_compliance_rate),
            company.total_completed_mandatory,
            company.total_mandatory_curricula,
            percent(company.mandatory_curricula_completion_rate),
            report.resolution.resolved,
            report.resolution.unmatched,
            report.resolution.ambiguous,
        );
    }
    Ok(())
}

fn summary<'a>(settings: &'a Settings, status: &'static str, issues: &'a [ValidationIssue]) -> BuildSummary<'a> {
    BuildSummary {
        status,
        output_dir: &settings.output_dir,
        workbook: None,
        issues_csv: None,
        reference_year: settings.reference_year,
        allowed_completion_status: &settings.allowed_completion_status,
        resolution: None,
        company_kpis: None,
        issues,
    }
}

fn write_issues(output_dir: &Path, issues: &[ValidationIssue]) -> Result<PathBuf, CliError> {
    export_issues_csv(output_dir, issues).map_err(|e| CliError::output(e.to_string()))
}

fn percent(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formats_undefined_rates() {
        assert_eq!(percent(Some(0.4)), "40.0%");
        assert_eq!(percent(Some(1.0)), "100.0%");
        assert_eq!(percent(None), "n/a");
    }
}
