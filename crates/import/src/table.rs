use std::io::Read;

use crate::error::ImportError;

/// A normalized tabular document: one header row plus string-cell data rows.
/// Both CSV and PDF extraction funnel into this shape so the parser set can
/// be selected on headers alone.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    /// Lowercased, trimmed headers — the shape capability predicates match on.
    pub fn normalized_headers(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.normalized_headers()
            .iter()
            .position(|h| h == name)
    }

    /// First column whose header contains the given fragment.
    pub fn column_containing(&self, fragment: &str) -> Option<usize> {
        self.normalized_headers()
            .iter()
            .position(|h| h.contains(fragment))
    }
}

/// Rows may legitimately be one cell short (trailing empty field) but a
/// spread wider than this marks the file as not tabular at all.
const MAX_WIDTH_SPREAD: usize = 3;

/// Read a delimited byte stream into a `RawTable`.
///
/// Leading non-tabular banner lines (short rows before the real header, as
/// emitted by some brokerage exports) are skipped by looking for the widest
/// early row and treating it as the header.
pub fn read_csv<R: Read>(data: R) -> Result<RawTable, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells: Vec<String> = record.iter().map(|s| s.trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        records.push(cells);
    }

    if records.is_empty() {
        return Err(ImportError::InvalidTabularData("no rows".to_string()));
    }

    // Locate the header: the first of the early rows with the maximum width.
    let scan = records.len().min(8);
    let max_width = records[..scan].iter().map(Vec::len).max().unwrap_or(0);
    let header_idx = records[..scan]
        .iter()
        .position(|r| r.len() == max_width)
        .unwrap_or(0);

    let headers = records[header_idx].clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::InvalidTabularData("empty header row".to_string()));
    }

    let rows: Vec<Vec<String>> = records.split_off(header_idx + 1);

    // Reject wildly inconsistent column counts — a sign this is not a table.
    let inconsistent = rows
        .iter()
        .filter(|r| r.len() + MAX_WIDTH_SPREAD < headers.len() || r.len() > headers.len() + MAX_WIDTH_SPREAD)
        .count();
    if !rows.is_empty() && inconsistent * 2 > rows.len() {
        return Err(ImportError::InvalidTabularData(format!(
            "{inconsistent} of {} rows do not fit a {}-column header",
            rows.len(),
            headers.len()
        )));
    }

    Ok(RawTable { headers, rows })
}
