//! Delimited-text reading: encoding checks, header probe and sample records.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use super::{ScanError, ScanResult};

/// Values treated as missing.
pub const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NULL", "null", "NaN", "nan", "None"];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub fn is_missing(value: &str) -> bool {
    MISSING_TOKENS.contains(&value.trim())
}

/// Reject encodings other than UTF-8 by their byte-order mark.
pub fn validate_encoding(path: &Path) -> ScanResult<()> {
    let mut file = File::open(path).map_err(|e| ScanError::file_read(path, e))?;
    let mut buffer = [0u8; 2];
    let read = file
        .read(&mut buffer)
        .map_err(|e| ScanError::file_read(path, e))?;

    if read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(ScanError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: encoding.to_string(),
            });
        }
    }
    Ok(())
}

/// Open a CSV record reader positioned after any UTF-8 BOM.
///
/// The header is returned as the first record.
pub fn open_records(path: &Path) -> ScanResult<csv::Reader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| ScanError::file_read(path, e))?;
    let mut reader = BufReader::new(file);
    let has_bom = reader
        .fill_buf()
        .map_err(|e| ScanError::file_read(path, e))?
        .starts_with(UTF8_BOM);
    if has_bom {
        reader.consume(UTF8_BOM.len());
    }

    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader))
}

/// Map a csv error, turning UTF-8 failures into encoding errors.
pub fn csv_error(path: &Path, error: csv::Error) -> ScanError {
    if matches!(error.kind(), csv::ErrorKind::Utf8 { .. }) {
        return ScanError::UnsupportedEncoding {
            path: path.to_path_buf(),
            encoding: "invalid UTF-8".to_string(),
        };
    }
    ScanError::Csv {
        path: path.to_path_buf(),
        source: error,
    }
}

/// Trim names, name blanks `Unnamed: {i}`, and suffix duplicates `.1`, `.2`, ...
pub fn normalize_header<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::new();

    for (i, name) in raw.into_iter().enumerate() {
        let trimmed = name.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {i}")
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        columns.push(candidate);
    }
    columns
}

/// Read the header and up to `probe_rows` records, returning normalized columns.
pub fn probe_header(path: &Path, probe_rows: usize) -> ScanResult<Vec<String>> {
    let mut reader = open_records(path)?;
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| csv_error(path, e))?,
        None => return Err(ScanError::NoHeader(path.to_path_buf())),
    };
    if header.iter().all(|name| name.trim().is_empty()) {
        return Err(ScanError::NoHeader(path.to_path_buf()));
    }

    for record in records.take(probe_rows) {
        record.map_err(|e| csv_error(path, e))?;
    }

    Ok(normalize_header(header.iter()))
}

/// Leading records of a table, aligned to the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSample {
    pub columns: Vec<String>,
    /// Rows padded or truncated to the header width; missing tokens are `None`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawSample {
    /// Values of one column, in row order.
    pub fn column_values(&self, index: usize) -> Vec<Option<&str>> {
        self.rows
            .iter()
            .map(|row| row.get(index).and_then(|v| v.as_deref()))
            .collect()
    }
}

/// Align a record with a header of `width` columns.
pub fn align_record(record: &csv::StringRecord, width: usize) -> Vec<Option<String>> {
    (0..width)
        .map(|i| {
            record
                .get(i)
                .filter(|v| !is_missing(v))
                .map(str::to_string)
        })
        .collect()
}

/// Read the header and the first `max_rows` records.
pub fn read_sample(path: &Path, max_rows: usize) -> ScanResult<RawSample> {
    let mut reader = open_records(path)?;
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| csv_error(path, e))?,
        None => return Err(ScanError::NoHeader(path.to_path_buf())),
    };
    let columns = normalize_header(header.iter());

    let mut rows = Vec::with_capacity(max_rows.min(4096));
    for record in records.take(max_rows) {
        let record = record.map_err(|e| csv_error(path, e))?;
        rows.push(align_record(&record, columns.len()));
    }

    Ok(RawSample { columns, rows })
}

/// Raw type label for a column's sample values.
///
/// Integers with gaps read as `float64`, like a dataframe reader would.
pub fn raw_dtype(values: &[Option<&str>]) -> &'static str {
    let present: Vec<&str> = values.iter().flatten().map(|v| v.trim()).collect();
    if present.is_empty() {
        return "object";
    }
    let has_missing = present.len() < values.len();

    if present.iter().all(|v| v.parse::<i64>().is_ok()) {
        return if has_missing { "float64" } else { "int64" };
    }
    if present.iter().all(|v| v.parse::<f64>().is_ok()) {
        return "float64";
    }
    if present
        .iter()
        .all(|v| matches!(v.to_lowercase().as_str(), "true" | "false"))
    {
        return "bool";
    }
    "object"
}
