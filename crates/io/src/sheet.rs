// Raw table reading: first worksheet of an Excel file, or a CSV.

use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;
use ttrack_compliance::TrackerError;

/// Extensions accepted as input tables.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv"];

/// A header row plus text cells. Fully blank rows are dropped on read.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Rename a header matched after trimming. No-op when absent.
    pub fn rename_header(&mut self, from: &str, to: &str) {
        for h in self.headers.iter_mut().filter(|h| h.trim() == from) {
            *h = to.to_string();
        }
    }

    /// `Job Title ` -> `job_title`.
    pub fn normalize_headers(&mut self) {
        for h in &mut self.headers {
            *h = normalize_column_name(h);
        }
    }

    /// Cell text for `row` at `col`; short rows read as empty.
    pub fn cell<'a>(&self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(|s| s.as_str()).unwrap_or("")
    }
}

/// `strip().lower()` with spaces turned into underscores.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub fn read_table(path: &Path) -> Result<RawTable, TrackerError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = if ext == "csv" {
        read_csv(path)?
    } else {
        read_workbook(path)?
    };
    debug!(file = %path.display(), rows = table.rows.len(), columns = table.headers.len(), "table read");
    Ok(table)
}

/// Input files in `dir` with a supported extension, sorted by name.
/// Office lock files (`~$...`) are skipped.
pub fn list_table_files(dir: &Path) -> Result<Vec<PathBuf>, TrackerError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_lock = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("~$"));
        if is_lock {
            continue;
        }
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if supported {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Subdirectories of `dir`, sorted by name.
pub fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>, TrackerError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path) -> Result<RawTable, TrackerError> {
    let read_err = |message: String| TrackerError::Read {
        source_file: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| read_err(format!("cannot open workbook: {e}")))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| read_err("workbook contains no sheets".into()))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| read_err(format!("cannot read sheet '{first}': {e}")))?;

    let mut rows = range.rows().map(|r| r.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok(RawTable {
        source: path.to_path_buf(),
        headers,
        rows: rows.filter(|r| !is_blank(r)).collect(),
    })
}

/// Render a cell as text. Integral floats lose their fraction so that ids
/// and codes typed as numbers compare equal to their text form.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => format_number(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        // Serial number, 1900 date system.
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable, TrackerError> {
    let content = read_file_as_utf8(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = sniff_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| TrackerError::Read {
            source_file: path.to_path_buf(),
            message: format!("line {}: {e}", line + 1),
        })?;
        records.push(record.iter().map(|f| f.to_string()).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let headers = records.next().unwrap_or_default();
    Ok(RawTable {
        source: path.to_path_buf(),
        headers,
        rows: records.filter(|r| !is_blank(r)).collect(),
    })
}

/// Pick the delimiter that yields the most consistent field count (>1)
/// across the first lines.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b',', b';', b'\t', b'|'];
    let sample: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;
    for &delim in candidates {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }
    best
}

/// Read a file as UTF-8, falling back to Windows-1252 (Excel-exported CSVs).
fn read_file_as_utf8(path: &Path) -> Result<String, TrackerError> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)?.read_to_end(&mut bytes)?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn column_names_are_snake_cased() {
        assert_eq!(normalize_column_name(" Full Name "), "full_name");
        assert_eq!(normalize_column_name("Organization Description"), "organization_description");
        assert_eq!(normalize_column_name("Curriculum ID"), "curriculum_id");
    }

    #[test]
    fn numbers_render_without_spurious_fraction() {
        assert_eq!(cell_text(&Data::Float(12.0)), "12");
        assert_eq!(cell_text(&Data::Float(-3.0)), "-3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn semicolon_csv_is_sniffed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "Full Name;Job Title\nPEREZ ANA;Clerk\n;\nRUIZ LUIS;Operator\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Full Name", "Job Title"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], "Operator");
    }

    #[test]
    fn latin1_csv_is_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.csv");
        // "Núñez" in Windows-1252
        fs::write(&path, b"name,unit\nN\xfa\xf1ez,U\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.rows[0][0], "Núñez");
    }

    #[test]
    fn short_rows_read_as_empty() {
        let table = RawTable {
            source: PathBuf::new(),
            headers: vec!["a".into(), "b".into()],
            rows: vec![vec!["x".into()]],
        };
        let col = table.column("b").unwrap();
        assert_eq!(table.cell(&table.rows[0], col), "");
    }

    #[test]
    fn rename_then_normalize() {
        let mut table = RawTable {
            source: PathBuf::new(),
            headers: vec!["Org Unit Abbr ".into(), "Full Name".into()],
            rows: vec![],
        };
        table.rename_header("Org Unit Abbr", "Organization Description");
        table.normalize_headers();
        assert_eq!(table.headers, vec!["organization_description", "full_name"]);
    }

    #[test]
    fn lists_supported_files_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.xlsx", "a.csv", "notes.txt", "~$a.xlsx"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = list_table_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.xlsx"]);
    }
}
