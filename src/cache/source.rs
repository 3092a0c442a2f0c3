//! Chunked reading of raw source files into frames.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use super::{CacheError, CacheResult};
use crate::scan::{align_record, csv_error, normalize_header, open_records, ScanError, ScanResult};
use crate::semantic::{suggest_storage_type, StorageType};

/// Raw rows aligned to the header; `None` marks a missing value.
pub type Rows = Vec<Vec<Option<String>>>;

/// Streams a source file in bounded chunks of records.
pub struct ChunkReader {
    path: PathBuf,
    columns: Vec<String>,
    records: csv::StringRecordsIntoIter<BufReader<File>>,
}

impl ChunkReader {
    /// Open `path` and consume its header.
    pub fn open(path: &Path) -> ScanResult<Self> {
        let mut records = open_records(path)?.into_records();
        let header = match records.next() {
            Some(record) => record.map_err(|e| csv_error(path, e))?,
            None => return Err(ScanError::NoHeader(path.to_path_buf())),
        };
        Ok(Self {
            path: path.to_path_buf(),
            columns: normalize_header(header.iter()),
            records,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Next chunk of at most `size` rows, or `None` at end of file.
    pub fn next_chunk(&mut self, size: usize) -> ScanResult<Option<Rows>> {
        let width = self.columns.len();
        let mut rows = Vec::with_capacity(size.min(8192));
        for record in self.records.by_ref().take(size) {
            let record = record.map_err(|e| csv_error(&self.path, e))?;
            rows.push(align_record(&record, width));
        }
        Ok((!rows.is_empty()).then_some(rows))
    }
}

/// Build a frame of string columns from aligned rows.
pub fn rows_to_frame(columns: &[String], rows: &[Vec<Option<String>>]) -> PolarsResult<DataFrame> {
    let series: Vec<Column> = columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|row| row.get(idx).and_then(|v| v.as_deref()))
                .collect();
            Series::new(name.as_str().into(), values).into()
        })
        .collect();
    DataFrame::new(series)
}

/// Stream a whole file into one frame of string columns.
///
/// Any read or frame error is reported as [`CacheError::ConversionFailed`].
pub fn read_full(path: &Path, chunk_size: usize) -> CacheResult<DataFrame> {
    let failed = |e: &dyn std::fmt::Display| CacheError::conversion(path, e);

    let mut reader = ChunkReader::open(path).map_err(|e| failed(&e))?;
    let columns = reader.columns().to_vec();
    let mut frame = rows_to_frame(&columns, &[]).map_err(|e| failed(&e))?;
    let mut chunks = 0usize;

    while let Some(rows) = reader.next_chunk(chunk_size).map_err(|e| failed(&e))? {
        let chunk = rows_to_frame(&columns, &rows).map_err(|e| failed(&e))?;
        frame.vstack_mut(&chunk).map_err(|e| failed(&e))?;
        chunks += 1;
    }
    frame.as_single_chunk_par();

    tracing::debug!(path = %path.display(), chunks, rows = frame.height(), "Source streamed");
    Ok(frame)
}

/// Cast string columns to their suggested numeric storage when that is lossless.
///
/// A column is narrowed only if every present value round-trips: integers
/// must be written canonically (no leading zeros or plus signs) and floats
/// must be plain dot-decimal text with at most [`F64_EXACT_DIGITS`]
/// significant digits. Everything else stays text, so long numeric keys
/// (44-digit invoice keys, 20-digit barcodes) are never rounded.
pub fn narrow_frame(df: &DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(narrow_column)
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

fn narrow_column(column: &Column) -> PolarsResult<Column> {
    let Ok(values) = column.str() else {
        return Ok(column.clone());
    };
    let raw: Vec<Option<&str>> = values.into_iter().collect();
    if raw.iter().all(Option::is_none) {
        return Ok(column.clone());
    }

    let suggestion = suggest_storage_type(&raw);
    let Some(dtype) = suggestion.materialized_dtype() else {
        return Ok(column.clone());
    };

    if suggestion.is_integer() {
        let parsed: Option<Vec<Option<i64>>> = raw
            .iter()
            .map(|v| match v {
                None => Some(None),
                Some(s) => canonical_int(s).map(Some),
            })
            .collect();
        return match parsed {
            Some(ints) => {
                let (min, max) = ints
                    .iter()
                    .flatten()
                    .fold((i64::MAX, i64::MIN), |(lo, hi), n| (lo.min(*n), hi.max(*n)));
                let width = StorageType::integer_for_range(min as i128, max as i128);
                let target = width.materialized_dtype().unwrap_or(dtype);
                Series::new(column.name().clone(), ints)
                    .cast(&target)
                    .map(Column::from)
            }
            None => Ok(column.clone()),
        };
    }

    let parsed: Option<Vec<Option<f64>>> = raw
        .iter()
        .map(|v| match v {
            None => Some(None),
            Some(s) => plain_float(s).map(Some),
        })
        .collect();
    Ok(match parsed {
        Some(floats) => Series::new(column.name().clone(), floats).into(),
        None => column.clone(),
    })
}

fn canonical_int(value: &str) -> Option<i64> {
    let n = value.parse::<i64>().ok()?;
    (n.to_string() == value).then_some(n)
}

/// Significant decimal digits any `f64` reproduces exactly.
pub const F64_EXACT_DIGITS: usize = 15;

fn plain_float(value: &str) -> Option<f64> {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let well_formed = !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit());
    let leading_zero = whole.len() > 1 && whole.starts_with('0');
    if !well_formed || leading_zero {
        return None;
    }

    let fraction = fraction.trim_end_matches('0');
    let significant = if whole.trim_start_matches('0').is_empty() {
        fraction.trim_start_matches('0').len()
    } else {
        whole.trim_start_matches('0').len() + fraction.len()
    };
    if significant > F64_EXACT_DIGITS {
        return None;
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}
