//! Tabular dataset
//!
//! Row-major table of named scalar cells. Assemblers build one per claim;
//! filtering, selection and missing-value dropping return new tables and
//! never mutate the source.

use crate::claim::Literal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single scalar value. `Null` and NaN floats both count as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view; booleans map to 0/1, text and missing have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Float cell, mapping non-finite values to `Null`.
    pub fn float(value: f64) -> Self {
        if value.is_finite() {
            Self::Float(value)
        } else {
            Self::Null
        }
    }

    pub fn opt_float(value: Option<f64>) -> Self {
        value.map(Self::float).unwrap_or(Self::Null)
    }

    pub fn opt_int(value: Option<i64>) -> Self {
        value.map(Self::Int).unwrap_or(Self::Null)
    }

    pub fn opt_bool(value: Option<bool>) -> Self {
        value.map(Self::Bool).unwrap_or(Self::Null)
    }

    pub fn opt_text(value: Option<String>) -> Self {
        value.map(Self::Text).unwrap_or(Self::Null)
    }

    /// Compare against a filter literal. Numbers (including booleans)
    /// compare numerically, text compares lexically, anything else is
    /// incomparable. Missing cells are never comparable.
    pub fn compare_literal(&self, literal: &Literal) -> Option<Ordering> {
        if self.is_missing() {
            return None;
        }
        match (self, literal) {
            (Self::Text(s), Literal::Text(l)) => Some(s.as_str().cmp(l.as_str())),
            (Self::Text(_), _) | (_, Literal::Text(_)) => None,
            _ => {
                let lhs = self.as_f64()?;
                let rhs = literal.as_f64()?;
                lhs.partial_cmp(&rhs)
            }
        }
    }

    pub fn equals_literal(&self, literal: &Literal) -> bool {
        self.compare_literal(literal) == Some(Ordering::Equal)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Row-major table with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Table with a schema but no rows.
    pub fn empty(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with `Null`, long rows truncated,
    /// so every row always matches the schema width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        let mut dataset = Self::empty(columns);
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Names from `wanted` that are not columns of this table, in order.
    pub fn missing_columns(&self, wanted: &[String]) -> Vec<String> {
        wanted
            .iter()
            .filter(|name| !self.has_column(name))
            .cloned()
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Numeric column; `None` entries for missing or non-numeric cells.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_f64()).collect())
    }

    /// Keep rows where `keep(row)` is true.
    pub fn filter_rows<F>(&self, keep: F) -> Self
    where
        F: Fn(&[Cell]) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Keep rows whose cell in `column` satisfies `keep`. Unknown columns
    /// return an unchanged copy.
    pub fn filter_column<F>(&self, column: &str, keep: F) -> Self
    where
        F: Fn(&Cell) -> bool,
    {
        match self.column_index(column) {
            Some(idx) => self.filter_rows(|row| keep(&row[idx])),
            None => self.clone(),
        }
    }

    /// Project onto `names` in the given order. Unknown names are skipped.
    pub fn select(&self, names: &[String]) -> Self {
        let indices: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Drop every row with a missing cell in any column.
    pub fn drop_missing(&self) -> Self {
        self.filter_rows(|row| row.iter().all(|cell| !cell.is_missing()))
    }

    /// Dense numeric matrix (row-major) over `names`. Returns `None` if a
    /// column is absent or any cell is missing or non-numeric.
    pub fn numeric_matrix(&self, names: &[String]) -> Option<Vec<Vec<f64>>> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<Vec<_>>>()?;
        self.rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].as_f64()).collect())
            .collect()
    }
}
