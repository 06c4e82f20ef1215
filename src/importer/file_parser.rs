// ==========================================
// Framecraft catalog - upload file parser
// ==========================================
// Stage 0 of the import pipeline: raw bytes -> ordered ParsedRow
// sequence. Supports CSV and Excel (.xlsx/.xls) uploads, chosen by
// content sniffing since the web layer hands us bytes, not paths.
//
// Structural errors (undecodable bytes, missing required header
// columns, zero data rows) fail the whole parse. A data row whose field
// count disagrees with the header is a per-row problem: it is carried on
// the row and surfaced by the validator, the parse continues.
// ==========================================

use crate::importer::error::ParseError;
use crate::importer::schema::{self, ColumnId};
use calamine::{Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Cursor;

// XLSX is a ZIP container; legacy XLS is an OLE compound file.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

// ==========================================
// ParsedRow - one header-mapped data row
// ==========================================
// values is keyed by canonical column id, not by whatever header casing
// the supplier used. Row numbering is 1-based; the header is row 0 in
// user-facing messages.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub row_number: usize,
    pub values: HashMap<ColumnId, String>,
    pub structural_error: Option<String>,
}

pub trait FileParser: Send + Sync {
    fn parse_rows(&self, bytes: &[u8]) -> Result<Vec<ParsedRow>, ParseError>;
}

// ==========================================
// header resolution (shared by both parsers)
// ==========================================
// Maps each file column index to a canonical column, case-insensitively
// and order-free. Extra columns resolve to None and are dropped.
fn resolve_headers(raw_headers: &[String]) -> Result<Vec<Option<ColumnId>>, ParseError> {
    let resolved: Vec<Option<ColumnId>> = raw_headers
        .iter()
        .map(|h| schema::match_header(h))
        .collect();

    let missing: Vec<&str> = schema::REQUIRED_COLUMNS
        .iter()
        .filter(|required| !resolved.iter().any(|r| r.as_ref() == Some(*required)))
        .map(|c| c.header())
        .collect();

    if !missing.is_empty() {
        return Err(ParseError::MissingColumns(missing.join(", ")));
    }
    Ok(resolved)
}

/// Assemble one ParsedRow from positional cells. `cell_count` is the raw
/// field count of the row before header mapping.
fn build_row(
    row_number: usize,
    resolved: &[Option<ColumnId>],
    cells: Vec<String>,
) -> Option<ParsedRow> {
    let structural_error = if cells.len() != resolved.len() {
        Some(format!(
            "row has {} fields, header has {}",
            cells.len(),
            resolved.len()
        ))
    } else {
        None
    };

    let mut values = HashMap::new();
    for (idx, cell) in cells.iter().enumerate() {
        if let Some(Some(column)) = resolved.get(idx) {
            values.insert(*column, cell.trim().to_string());
        }
    }

    // skip fully blank rows (trailing spreadsheet junk)
    if structural_error.is_none() && values.values().all(|v| v.is_empty()) {
        return None;
    }

    Some(ParsedRow {
        row_number,
        values,
        structural_error,
    })
}

// ==========================================
// CSV parser
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_rows(&self, bytes: &[u8]) -> Result<Vec<ParsedRow>, ParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ParseError::UnreadableEncoding(e.to_string()))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // tolerate ragged rows; surfaced per-row
            .from_reader(text.as_bytes());

        let raw_headers: Vec<String> = reader
            .headers()
            .map_err(ParseError::from)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let resolved = resolve_headers(&raw_headers)?;

        let mut rows = Vec::new();
        let mut row_number = 0usize;
        for result in reader.records() {
            let record = result.map_err(ParseError::from)?;
            row_number += 1;
            let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            if let Some(row) = build_row(row_number, &resolved, cells) {
                rows.push(row);
            }
        }

        if rows.is_empty() {
            return Err(ParseError::EmptyFile);
        }
        Ok(rows)
    }
}

// ==========================================
// Excel parser
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn parse_range(range: calamine::Range<calamine::Data>) -> Result<Vec<ParsedRow>, ParseError> {
        let mut range_rows = range.rows();
        let header_row = range_rows.next().ok_or(ParseError::EmptyFile)?;

        let raw_headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();
        let resolved = resolve_headers(&raw_headers)?;

        let mut rows = Vec::new();
        let mut row_number = 0usize;
        for data_row in range_rows {
            row_number += 1;
            let cells: Vec<String> = data_row.iter().map(|cell| cell.to_string()).collect();
            if let Some(row) = build_row(row_number, &resolved, cells) {
                rows.push(row);
            }
        }

        if rows.is_empty() {
            return Err(ParseError::EmptyFile);
        }
        Ok(rows)
    }
}

impl FileParser for ExcelParser {
    fn parse_rows(&self, bytes: &[u8]) -> Result<Vec<ParsedRow>, ParseError> {
        let cursor = Cursor::new(bytes.to_vec());

        let range = if bytes.starts_with(OLE_MAGIC) {
            let mut workbook = Xls::new(cursor)
                .map_err(|e: calamine::XlsError| ParseError::Workbook(e.to_string()))?;
            let sheet_name = workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ParseError::Workbook("workbook has no sheets".to_string()))?;
            workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| ParseError::Workbook(e.to_string()))?
        } else {
            let mut workbook: Xlsx<_> = Xlsx::new(cursor).map_err(ParseError::from)?;
            let sheet_name = workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ParseError::Workbook("workbook has no sheets".to_string()))?;
            workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| ParseError::Workbook(e.to_string()))?
        };

        Self::parse_range(range)
    }
}

// ==========================================
// Upload parser (content-sniffing dispatch)
// ==========================================
pub struct UploadParser;

impl FileParser for UploadParser {
    fn parse_rows(&self, bytes: &[u8]) -> Result<Vec<ParsedRow>, ParseError> {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            ExcelParser.parse_rows(bytes)
        } else {
            CsvParser.parse_rows(bytes)
        }
    }
}
