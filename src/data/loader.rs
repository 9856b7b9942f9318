use std::path::Path;

use crate::data::datetime::{self, TimestampEncoding};
use crate::error::IngestionError;

/// How many leading rows are searched for the header line.
const HEADER_SEARCH_ROWS: usize = 50;

/// Raw tabular contents of one source: column names and column data as strings.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub column_data: Vec<Vec<String>>, // column-major: column_data[col_idx][row_idx]
    pub row_count: usize,
}

impl Table {
    /// Build a table from row-major cells, using `header_row` as column names.
    fn from_rows(all_rows: Vec<Vec<String>>, header_row: usize) -> Self {
        let columns: Vec<String> = all_rows[header_row]
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        let data_rows = &all_rows[header_row + 1..];
        let mut column_data: Vec<Vec<String>> = vec![Vec::with_capacity(data_rows.len()); columns.len()];
        for row in data_rows {
            for (col_idx, col_data) in column_data.iter_mut().enumerate() {
                col_data.push(row.get(col_idx).cloned().unwrap_or_default());
            }
        }

        Self {
            columns,
            column_data,
            row_count: data_rows.len(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| self.column_data[idx].as_slice())
    }
}

/// A cleaned `(time, value)` sequence: ascending, duplicate-free, null-free.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanSeries {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
    pub encoding: TimestampEncoding,
    /// Rows dropped for missing/invalid cells or duplicate timestamps.
    pub dropped_rows: usize,
}

/// Load a CSV or Excel source, locating the header row that carries both
/// configured columns.
pub fn load_table(
    name: &str,
    path: &Path,
    time_column: &str,
    value_column: &str,
) -> Result<Table, IngestionError> {
    if !path.exists() {
        return Err(IngestionError::MissingSource {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_csv_rows(path),
        "xls" | "xlsx" => read_excel_rows(path),
        _ => {
            return Err(IngestionError::UnsupportedFormat {
                name: name.to_string(),
                extension: ext,
            })
        }
    }
    .map_err(|reason| IngestionError::Unreadable {
        name: name.to_string(),
        path: path.to_path_buf(),
        reason,
    })?;

    let header_row = find_header_row(&rows, &[time_column, value_column]).ok_or_else(|| {
        let first = rows.first().cloned().unwrap_or_default();
        let missing = [time_column, value_column]
            .into_iter()
            .find(|col| !first.iter().any(|c| c.trim() == *col))
            .unwrap_or(time_column);
        IngestionError::MissingColumn {
            name: name.to_string(),
            column: missing.to_string(),
        }
    })?;

    Ok(Table::from_rows(rows, header_row))
}

fn find_header_row(rows: &[Vec<String>], required: &[&str]) -> Option<usize> {
    rows.iter().take(HEADER_SEARCH_ROWS).position(|row| {
        required
            .iter()
            .all(|col| row.iter().any(|cell| cell.trim() == *col))
    })
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let content = std::fs::read(path).map_err(|e| format!("Cannot read file: {e}"))?;
    // Fallback: treat as latin1 (each byte maps to same Unicode code point)
    let text = match String::from_utf8(content) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let rows: Vec<Vec<String>> = reader
        .records()
        .filter_map(Result::ok)
        .map(|record| record.iter().map(|s| s.to_string()).collect())
        .collect();

    if rows.is_empty() {
        return Err("No data found in file".to_string());
    }
    Ok(rows)
}

/// Text form of one Excel cell. Native date cells are written as naive
/// ISO 8601 so they go through the strict timestamp pass.
fn excel_cell(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S%.f").to_string())
            .unwrap_or_default(),
        Data::Error(e) => format!("{e:?}"),
    }
}

fn read_excel_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("Cannot open Excel file: {e}"))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .ok_or("No sheets found")?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Cannot read sheet: {e}"))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(excel_cell).collect())
        .collect();

    if rows.is_empty() {
        return Err("No data in sheet".to_string());
    }
    Ok(rows)
}

/// Parse one numeric cell. Thousands separators (`101,325.5`) are accepted.
pub fn parse_value(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', "").parse::<f64>().ok())?;
    parsed.is_finite().then_some(parsed)
}

/// Turn the configured time/value columns of a table into a clean series.
pub fn extract_series(
    name: &str,
    table: &Table,
    time_column: &str,
    value_column: &str,
) -> Result<CleanSeries, IngestionError> {
    let missing = |column: &str| IngestionError::MissingColumn {
        name: name.to_string(),
        column: column.to_string(),
    };
    let time_cells = table.column(time_column).ok_or_else(|| missing(time_column))?;
    let value_cells = table.column(value_column).ok_or_else(|| missing(value_column))?;

    let (timestamps, encoding) = datetime::parse_column(time_cells);

    let mut rows: Vec<(f64, f64)> = timestamps
        .iter()
        .zip(value_cells)
        .filter_map(|(ts, cell)| Some(((*ts)?, parse_value(cell)?)))
        .collect();

    // Stable sort keeps the first of any duplicated timestamp in front.
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    rows.dedup_by(|later, earlier| later.0 == earlier.0);

    if rows.is_empty() {
        return Err(IngestionError::Empty {
            name: name.to_string(),
        });
    }

    let dropped_rows = table.row_count - rows.len();
    let (times, values) = rows.into_iter().unzip();
    Ok(CleanSeries {
        times,
        values,
        encoding,
        dropped_rows,
    })
}
