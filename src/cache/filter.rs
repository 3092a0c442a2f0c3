//! Row predicates applied after a read.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A literal compared against column values.
///
/// Numbers compare numerically (values that do not parse never match);
/// text compares against the string form of the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Inclusive on both ends.
    Range { min: FilterValue, max: FilterValue },
    In(Vec<FilterValue>),
    Eq(FilterValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub predicate: Predicate,
}

impl Filter {
    pub fn range(
        column: impl Into<String>,
        min: impl Into<FilterValue>,
        max: impl Into<FilterValue>,
    ) -> Self {
        Self {
            column: column.into(),
            predicate: Predicate::Range {
                min: min.into(),
                max: max.into(),
            },
        }
    }

    pub fn is_in<V: Into<FilterValue>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            predicate: Predicate::In(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn equal(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            column: column.into(),
            predicate: Predicate::Eq(value.into()),
        }
    }

    fn expr(&self) -> Expr {
        match &self.predicate {
            Predicate::Range { min, max } => match (min, max) {
                (FilterValue::Number(lo), FilterValue::Number(hi)) => {
                    let value = self.as_number();
                    value.clone().gt_eq(lit(*lo)).and(value.lt_eq(lit(*hi)))
                }
                _ => {
                    let value = self.as_text();
                    value
                        .clone()
                        .gt_eq(text_lit(min))
                        .and(value.lt_eq(text_lit(max)))
                }
            },
            Predicate::In(values) => values
                .iter()
                .map(|v| self.matches(v))
                .reduce(|acc, e| acc.or(e))
                .unwrap_or_else(|| lit(false)),
            Predicate::Eq(value) => self.matches(value),
        }
    }

    fn matches(&self, value: &FilterValue) -> Expr {
        match value {
            FilterValue::Number(n) => self.as_number().eq(lit(*n)),
            FilterValue::Text(s) => self.as_text().eq(lit(s.clone())),
        }
    }

    fn as_number(&self) -> Expr {
        col(self.column.as_str()).cast(DataType::Float64)
    }

    fn as_text(&self) -> Expr {
        col(self.column.as_str()).cast(DataType::String)
    }
}

fn text_lit(value: &FilterValue) -> Expr {
    match value {
        FilterValue::Number(n) => lit(n.to_string()),
        FilterValue::Text(s) => lit(s.clone()),
    }
}

/// Keep the rows matching every filter.
///
/// A filter on a column the frame does not have is skipped with a warning.
pub fn apply_filters(df: DataFrame, filters: &[Filter], table: &str) -> PolarsResult<DataFrame> {
    let mut predicate: Option<Expr> = None;
    for filter in filters {
        if df.column(&filter.column).is_err() {
            tracing::warn!(table, column = %filter.column, "Filter column not found, skipping");
            continue;
        }
        let expr = filter.expr();
        predicate = Some(match predicate {
            Some(acc) => acc.and(expr),
            None => expr,
        });
    }

    match predicate {
        Some(expr) => df.lazy().filter(expr).collect(),
        None => Ok(df),
    }
}
