//! Output workbook and issue CSV.
//!
//! Each sheet's column list is fixed here; rows are serialized through
//! serde and looked up by column name, so a field rename that is not
//! reflected here shows up as an empty column (and fails the tests below).

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;
use ttrack_compliance::{ComplianceReport, TrackerError, ValidationIssue};

pub const WORKBOOK_FILE: &str = "training_tracker_outputs.xlsx";
pub const ISSUES_FILE: &str = "validation_issues.csv";

pub const EMPLOYEE_KPI_COLUMNS: &[&str] = &[
    "full_name",
    "job_title",
    "org_code",
    "org_desc",
    "head_of_department",
    "mandatory_count",
    "mandatory_completed_count",
    "mandatory_done_count",
    "mandatory_missing_count",
    "unassigned_mandatory_count",
    "has_requirements",
    "completion_pct",
    "full_compliance_flag",
    "full_done_flag",
    "optional_completed_count",
    "extra_completed_count",
];

pub const DETAIL_COLUMNS: &[&str] = &[
    "full_name",
    "job_title",
    "org_code",
    "org_desc",
    "head_of_department",
    "curriculum_id",
    "curriculum_title",
    "is_assigned",
    "is_completed",
    "days_remaining",
    "is_done",
];

pub const EXTRA_COLUMNS: &[&str] = &[
    "full_name",
    "job_title",
    "org_code",
    "org_desc",
    "head_of_department",
    "curriculum_id",
    "curriculum_title",
];

const GROUP_STATS: &[&str] = &[
    "employees_count",
    "employees_with_requirements",
    "employees_full_compliance",
    "avg_completion_pct",
    "70–89%",
    "<70%",
    ">=90%",
];

pub const COMPANY_COLUMNS: &[&str] = &[
    "total_employees",
    "employees_with_requirements",
    "employees_full_compliance",
    "avg_completion_pct",
    "company_full_compliance_rate",
    "total_mandatory_curricula",
    "total_completed_mandatory",
    "mandatory_curricula_completion_rate",
    "total_done_mandatory",
    "mandatory_curricula_done_rate",
];

pub const ISSUE_COLUMNS: &[&str] = &["level", "code", "message", "details"];

fn department_columns() -> Vec<&'static str> {
    let mut cols = vec!["org_code", "org_desc"];
    cols.extend_from_slice(GROUP_STATS);
    cols.push("dept_full_compliance_rate");
    cols
}

fn organization_columns() -> Vec<&'static str> {
    let mut cols = vec!["org_code"];
    cols.extend_from_slice(GROUP_STATS);
    cols.push("org_full_compliance_rate");
    cols
}

/// One output sheet: name, header and JSON-shaped rows.
#[derive(Debug)]
pub struct SheetData {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Map<String, Value>>,
}

impl SheetData {
    fn new<T: Serialize>(name: &'static str, columns: Vec<&'static str>, rows: &[T]) -> Result<Self, TrackerError> {
        let rows = rows.iter().map(to_object).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, columns, rows })
    }
}

fn to_object<T: Serialize>(row: &T) -> Result<Map<String, Value>, TrackerError> {
    match serde_json::to_value(row) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(TrackerError::Write {
            target: PathBuf::from(WORKBOOK_FILE),
            message: format!("row did not serialize to an object: {other}"),
        }),
        Err(e) => Err(TrackerError::Write {
            target: PathBuf::from(WORKBOOK_FILE),
            message: e.to_string(),
        }),
    }
}

/// Sheets in workbook order. `validation_issues` only when there are issues.
pub fn report_sheets(report: &ComplianceReport, issues: &[ValidationIssue]) -> Result<Vec<SheetData>, TrackerError> {
    let mut sheets = vec![
        SheetData::new("employee_kpis", EMPLOYEE_KPI_COLUMNS.to_vec(), &report.employee_kpis)?,
        SheetData::new("employee_mandatory_detail", DETAIL_COLUMNS.to_vec(), &report.mandatory_detail)?,
        SheetData::new("employee_optional_detail", DETAIL_COLUMNS.to_vec(), &report.optional_detail)?,
        SheetData::new("employee_extra_detail", EXTRA_COLUMNS.to_vec(), &report.extra_detail)?,
        SheetData::new("department_kpis", department_columns(), &report.department_kpis)?,
        SheetData::new("organization_kpis", organization_columns(), &report.organization_kpis)?,
        SheetData::new("company_kpis", COMPANY_COLUMNS.to_vec(), std::slice::from_ref(&report.company_kpis))?,
    ];
    if !issues.is_empty() {
        sheets.push(SheetData::new("validation_issues", ISSUE_COLUMNS.to_vec(), issues)?);
    }
    Ok(sheets)
}

#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub path: PathBuf,
    pub sheets_exported: usize,
    pub rows_exported: usize,
}

/// Write `training_tracker_outputs.xlsx` into `output_dir`, creating it if needed.
pub fn export_workbook(
    output_dir: &Path,
    report: &ComplianceReport,
    issues: &[ValidationIssue],
) -> Result<ExportResult, TrackerError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(WORKBOOK_FILE);
    let write_err = |e: rust_xlsxwriter::XlsxError| TrackerError::Write {
        target: path.clone(),
        message: e.to_string(),
    };

    let mut result = ExportResult {
        path: path.clone(),
        ..Default::default()
    };
    let header_format = Format::new().set_bold();
    let mut workbook = Workbook::new();

    for sheet in report_sheets(report, issues)? {
        let worksheet = workbook.add_worksheet().set_name(sheet.name).map_err(write_err)?;
        write_sheet(worksheet, &sheet, &header_format).map_err(write_err)?;
        result.sheets_exported += 1;
        result.rows_exported += sheet.rows.len();
    }

    workbook.save(&path).map_err(write_err)?;
    info!(file = %path.display(), sheets = result.sheets_exported, rows = result.rows_exported, "workbook written");
    Ok(result)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SheetData, header: &Format) -> Result<(), rust_xlsxwriter::XlsxError> {
    for (c, name) in sheet.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, *name, header)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (r, row) in sheet.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, name) in sheet.columns.iter().enumerate() {
            let c = c as u16;
            match row.get(*name) {
                None | Some(Value::Null) => {}
                Some(Value::Bool(b)) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                Some(Value::Number(n)) => {
                    if let Some(f) = n.as_f64() {
                        worksheet.write_number(r, c, f)?;
                    }
                }
                Some(Value::String(s)) => {
                    worksheet.write_string(r, c, s)?;
                }
                Some(other) => {
                    worksheet.write_string(r, c, other.to_string())?;
                }
            }
        }
    }
    Ok(())
}

/// Write `validation_issues.csv` into `output_dir`. `details` is compact JSON.
pub fn export_issues_csv(output_dir: &Path, issues: &[ValidationIssue]) -> Result<PathBuf, TrackerError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(ISSUES_FILE);
    let write_err = |e: csv::Error| TrackerError::Write {
        target: path.clone(),
        message: e.to_string(),
    };

    let mut writer = csv::Writer::from_path(&path).map_err(write_err)?;
    writer.write_record(ISSUE_COLUMNS).map_err(write_err)?;
    for issue in issues {
        let level = issue.level.to_string();
        let details = issue.details.to_string();
        writer
            .write_record([level.as_str(), issue.code.as_str(), issue.message.as_str(), details.as_str()])
            .map_err(write_err)?;
    }
    writer.flush()?;
    info!(file = %path.display(), issues = issues.len(), "issues written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ttrack_compliance::model::{CompanyKpi, ExtraCompletion};
    use ttrack_compliance::{run, Employee, EmployeeKey, RequiredType, Requirement, StatusRecord, TrackerInput};

    fn sample_report() -> ComplianceReport {
        let roster = vec![Employee {
            full_name: "SANTANA MENDOZA JORGE".into(),
            job_title: "Operator".into(),
            org_code: "ABC".into(),
            org_desc: "BG1".into(),
            head_of_department: "Boss".into(),
        }];
        let requirement = |id: &str, t: RequiredType| Requirement {
            org_code: "ABC".into(),
            org_desc: "BG1".into(),
            job_title: "Operator".into(),
            curriculum_id: id.into(),
            curriculum_title: id.to_uppercase(),
            required_type: t,
        };
        let status = |id: &str| StatusRecord {
            user_name: "JORGE, SANTANA MENDOZA".into(),
            org_desc: "BG1".into(),
            curriculum_id: id.into(),
            curriculum_title: id.to_uppercase(),
            curriculum_complete: "Yes".into(),
            days_remaining: None,
        };
        run(&TrackerInput {
            roster,
            requirements: vec![requirement("c1", RequiredType::Mandatory), requirement("c2", RequiredType::Optional)],
            status: vec![status("c1"), status("c9")],
        })
    }

    const EMPLOYEE: &[&str] = &["full_name", "job_title", "org_code", "org_desc", "head_of_department"];

    fn keys(map: &Map<String, Value>) -> Vec<&str> {
        map.keys().map(|k| k.as_str()).collect()
    }

    #[test]
    fn column_lists_match_serialized_rows() {
        let report = sample_report();
        let sheets = report_sheets(&report, &[]).unwrap();
        for sheet in &sheets {
            let first = sheet.rows.first().unwrap_or_else(|| panic!("{} is empty", sheet.name));
            assert_eq!(keys(first), sheet.columns, "sheet {}", sheet.name);
        }
    }

    #[test]
    fn sheet_order_and_optional_issue_sheet() {
        let report = sample_report();
        let names: Vec<_> = report_sheets(&report, &[]).unwrap().iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "employee_kpis",
                "employee_mandatory_detail",
                "employee_optional_detail",
                "employee_extra_detail",
                "department_kpis",
                "organization_kpis",
                "company_kpis",
            ]
        );

        let issue = ValidationIssue::warning("X", "m", json!({ "count": 1 }));
        let sheets = report_sheets(&report, &[issue]).unwrap();
        let last = sheets.last().unwrap();
        assert_eq!(last.name, "validation_issues");
        assert_eq!(keys(&last.rows[0]), ISSUE_COLUMNS);
    }

    #[test]
    fn extra_rows_keep_employee_columns_first() {
        let employee = Employee {
            full_name: "A".into(),
            job_title: "B".into(),
            org_code: "C".into(),
            org_desc: "D".into(),
            head_of_department: "E".into(),
        };
        let row = ExtraCompletion {
            employee_key: EmployeeKey::from_employee(&employee),
            employee,
            curriculum_id: "c".into(),
            curriculum_title: "t".into(),
        };
        let obj = to_object(&row).unwrap();
        assert_eq!(&keys(&obj)[..EMPLOYEE.len()], EMPLOYEE);
    }

    #[test]
    fn empty_company_row_still_has_every_column() {
        let obj = to_object(&CompanyKpi::default()).unwrap();
        assert_eq!(keys(&obj), COMPANY_COLUMNS);
        assert_eq!(obj["avg_completion_pct"], Value::Null);
    }
}
