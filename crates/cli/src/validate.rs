// ttrack validate

use std::path::Path;

use serde::Serialize;
use ttrack_compliance::{validate, TrackerInput, ValidationIssue};
use ttrack_config::Settings;

use crate::{load_input, CliError};

#[derive(Serialize)]
struct RowCounts {
    roster: usize,
    requirements: usize,
    status: usize,
}

impl RowCounts {
    fn of(input: &TrackerInput) -> Self {
        Self {
            roster: input.roster.len(),
            requirements: input.requirements.len(),
            status: input.status.len(),
        }
    }
}

#[derive(Serialize)]
struct ValidateSummary<'a> {
    input_dir: &'a Path,
    rows: Option<RowCounts>,
    errors: usize,
    warnings: usize,
    issues: &'a [ValidationIssue],
}

pub fn cmd_validate(settings: &Settings, json: bool) -> Result<(), CliError> {
    let input = match load_input(&settings.input_dir) {
        Ok(input) => input,
        Err((err, issue)) => {
            let issues: Vec<ValidationIssue> = issue.into_iter().collect();
            if json {
                print_summary(&settings.input_dir, None, &issues)?;
            } else {
                print_issues(&issues);
            }
            return Err(err);
        }
    };

    let issues = validate(&input);
    if json {
        print_summary(&settings.input_dir, Some(RowCounts::of(&input)), &issues)?;
    } else if issues.is_empty() {
        eprintln!(
            "no validation issues ({} employees, {} requirements, {} status rows)",
            input.roster.len(),
            input.requirements.len(),
            input.status.len()
        );
    } else {
        print_issues(&issues);
    }

    let (errors, _) = count_levels(&issues);
    if errors > 0 {
        return Err(CliError::validation(format!("{errors} ERROR-level validation issue(s)")));
    }
    Ok(())
}

fn print_summary(input_dir: &Path, rows: Option<RowCounts>, issues: &[ValidationIssue]) -> Result<(), CliError> {
    let (errors, warnings) = count_levels(issues);
    let summary = ValidateSummary {
        input_dir,
        rows,
        errors,
        warnings,
        issues,
    };
    print_json(&summary)
}

/// `- [LEVEL] CODE: message` per issue on stdout, counts on stderr.
pub fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        println!("- {issue}");
    }
    let (errors, warnings) = count_levels(issues);
    if !issues.is_empty() {
        eprintln!("{} issue(s): {errors} error(s), {warnings} warning(s)", issues.len());
    }
}

/// (errors, warnings)
pub fn count_levels(issues: &[ValidationIssue]) -> (usize, usize) {
    let errors = issues.iter().filter(|i| i.is_error()).count();
    (errors, issues.len() - errors)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::output(format!("cannot serialize JSON output: {e}")))?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn levels_are_counted() {
        let issues = vec![
            ValidationIssue::error("A", "a", Value::Null),
            ValidationIssue::warning("B", "b", Value::Null),
            ValidationIssue::warning("C", "c", Value::Null),
        ];
        assert_eq!(count_levels(&issues), (1, 2));
        assert_eq!(count_levels(&[]), (0, 0));
    }
}
