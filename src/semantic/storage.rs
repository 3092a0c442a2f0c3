//! Storage-type suggestion.
//!
//! Picks the narrowest primitive that can hold a column's observed values.
//! Suggestions are advisory: the cache manager only materializes the ones
//! that are lossless for the full column.

use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};

use super::types::{is_boolean_token, parse_number, BOOLEAN_MAX_DISTINCT, CATEGORICAL_MAX_DISTINCT};

/// Share of values that must parse as numbers before a numeric type is suggested.
pub const NUMERIC_PARSE_MIN_RATIO: f64 = 0.90;

/// Share of values that must parse as dates before a datetime is suggested.
pub const DATETIME_PARSE_MIN_RATIO: f64 = 0.70;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Storage-optimised primitive for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Half precision is not available in the columnar engine; materialized as `Float64`.
    Float16,
    Datetime,
    Boolean,
    Categorical,
    Text,
}

impl StorageType {
    /// Narrowest integer type covering `[min, max]`.
    pub fn integer_for_range(min: i128, max: i128) -> Self {
        if min >= 0 {
            if max < 1 << 8 {
                StorageType::UInt8
            } else if max < 1 << 16 {
                StorageType::UInt16
            } else if max < 1 << 32 {
                StorageType::UInt32
            } else {
                StorageType::UInt64
            }
        } else if min >= i8::MIN as i128 && max <= i8::MAX as i128 {
            StorageType::Int8
        } else if min >= i16::MIN as i128 && max <= i16::MAX as i128 {
            StorageType::Int16
        } else if min >= i32::MIN as i128 && max <= i32::MAX as i128 {
            StorageType::Int32
        } else {
            StorageType::Int64
        }
    }

    /// True for the integer widths.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            StorageType::UInt8
                | StorageType::UInt16
                | StorageType::UInt32
                | StorageType::UInt64
                | StorageType::Int8
                | StorageType::Int16
                | StorageType::Int32
                | StorageType::Int64
        )
    }

    /// Column dtype used when the suggestion is materialized.
    ///
    /// Only numeric suggestions are materialized; the rest stay text.
    pub fn materialized_dtype(&self) -> Option<DataType> {
        match self {
            StorageType::UInt8 => Some(DataType::UInt8),
            StorageType::UInt16 => Some(DataType::UInt16),
            StorageType::UInt32 => Some(DataType::UInt32),
            StorageType::UInt64 => Some(DataType::UInt64),
            StorageType::Int8 => Some(DataType::Int8),
            StorageType::Int16 => Some(DataType::Int16),
            StorageType::Int32 => Some(DataType::Int32),
            StorageType::Int64 => Some(DataType::Int64),
            StorageType::Float16 => Some(DataType::Float64),
            StorageType::Datetime
            | StorageType::Boolean
            | StorageType::Categorical
            | StorageType::Text => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::UInt8 => "uint8",
            StorageType::UInt16 => "uint16",
            StorageType::UInt32 => "uint32",
            StorageType::UInt64 => "uint64",
            StorageType::Int8 => "int8",
            StorageType::Int16 => "int16",
            StorageType::Int32 => "int32",
            StorageType::Int64 => "int64",
            StorageType::Float16 => "float16",
            StorageType::Datetime => "datetime",
            StorageType::Boolean => "boolean",
            StorageType::Categorical => "categorical",
            StorageType::Text => "text",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggest a storage type for a column's values. `None` entries are missing.
pub fn suggest_storage_type(values: &[Option<&str>]) -> StorageType {
    let present: Vec<&str> = values
        .iter()
        .flatten()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if present.is_empty() {
        return StorageType::Text;
    }
    let total = present.len() as f64;

    let numbers: Vec<f64> = present.iter().filter_map(|v| parse_number(v)).collect();
    if numbers.len() as f64 / total > NUMERIC_PARSE_MIN_RATIO {
        return numeric_storage(&numbers);
    }

    let dates = present.iter().filter(|v| parses_as_datetime(v)).count();
    if dates as f64 / total >= DATETIME_PARSE_MIN_RATIO {
        return StorageType::Datetime;
    }

    let distinct: HashSet<&str> = present.iter().copied().collect();
    if distinct.len() <= BOOLEAN_MAX_DISTINCT && distinct.iter().all(|v| is_boolean_token(v)) {
        return StorageType::Boolean;
    }
    if distinct.len() < CATEGORICAL_MAX_DISTINCT {
        return StorageType::Categorical;
    }
    StorageType::Text
}

fn numeric_storage(numbers: &[f64]) -> StorageType {
    let all_whole = numbers
        .iter()
        .all(|n| n.fract() == 0.0 && n.abs() <= i64::MAX as f64);
    if !all_whole {
        return StorageType::Float16;
    }
    let min = numbers.iter().fold(f64::INFINITY, |acc, n| acc.min(*n));
    let max = numbers.iter().fold(f64::NEG_INFINITY, |acc, n| acc.max(*n));
    StorageType::integer_for_range(min as i128, max as i128)
}

/// True if the value parses with one of the accepted date or datetime formats.
pub fn parses_as_datetime(value: &str) -> bool {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}
