use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, Serializer};

use crate::error::LoadshapeError;

/// Timestamp rendering used by `Display` and JSON output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Value – a single cell in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Composite group keys live in `BTreeMap`s downstream so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(NaiveDateTime),
}

// -- Manual Eq/Ord so composite keys of Value sort deterministically --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Timestamp(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<null>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.collect_str(&ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl Value {
    /// Interpret the value as an `f64` for aggregation and normalization.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The underlying timestamp, if this is a timestamp cell.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Table – column-oriented container over records
// ---------------------------------------------------------------------------

/// An in-memory, column-oriented table: ordered named columns of equal
/// length, rows keyed implicitly by position.
///
/// Beyond plain storage it carries the three operations the loadshape
/// engine needs: multi-key grouping with per-group summation
/// ([`group_sum`](Table::group_sum)), global scalar reductions
/// ([`global_max`](Table::global_max) / [`global_min`](Table::global_min)),
/// and elementwise division ([`div_scalar`](Table::div_scalar)).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<Value>>,
    row_count: usize,
}

impl Table {
    /// An empty table with no columns or rows.
    pub fn new() -> Self {
        Table {
            names: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Append a named column, or overwrite an existing column of the same
    /// name in place. Overwriting keeps the column's position, which makes
    /// repeated group derivation idempotent at the column level.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), LoadshapeError> {
        let name = name.into();
        if self.columns.is_empty() {
            self.row_count = values.len();
        } else if values.len() != self.row_count {
            return Err(LoadshapeError::LengthMismatch {
                expected: self.row_count,
                actual: values.len(),
            });
        }
        match self.names.iter().position(|n| *n == name) {
            Some(idx) => self.columns[idx] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Ordered column names.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// The cells of a named column, or `None` if no such column exists.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.column_index(name).map(|i| self.columns[i].as_slice())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn resolve(&self, names: &[String]) -> Result<Vec<usize>, LoadshapeError> {
        names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| LoadshapeError::ColumnNotFound { name: n.clone() })
            })
            .collect()
    }

    /// Partition rows by the full tuple of `key_cols` values (joint
    /// equality over all key columns at once) and sum each of `value_cols`
    /// per group.
    ///
    /// The result holds one row per *observed* key tuple, in ascending
    /// composite-key order; unobserved combinations are never synthesized.
    /// Rows whose key tuple contains a null are excluded from every group.
    /// Non-numeric cells contribute nothing to the sums.
    pub fn group_sum(
        &self,
        key_cols: &[String],
        value_cols: &[String],
    ) -> Result<Table, LoadshapeError> {
        let key_idx = self.resolve(key_cols)?;
        let val_idx = self.resolve(value_cols)?;

        let mut groups: BTreeMap<Vec<Value>, Vec<f64>> = BTreeMap::new();
        'rows: for row in 0..self.row_count {
            let mut key = Vec::with_capacity(key_idx.len());
            for &k in &key_idx {
                let cell = &self.columns[k][row];
                if cell.is_null() {
                    continue 'rows;
                }
                key.push(cell.clone());
            }
            let sums = groups
                .entry(key)
                .or_insert_with(|| vec![0.0; val_idx.len()]);
            for (slot, &c) in sums.iter_mut().zip(&val_idx) {
                if let Some(x) = self.columns[c][row].as_f64() {
                    *slot += x;
                }
            }
        }

        let mut out = Table::new();
        for (i, name) in key_cols.iter().enumerate() {
            let col: Vec<Value> = groups.keys().map(|k| k[i].clone()).collect();
            out.push_column(name.clone(), col)?;
        }
        for (j, name) in value_cols.iter().enumerate() {
            let col: Vec<Value> = groups.values().map(|s| Value::Float(s[j])).collect();
            out.push_column(name.clone(), col)?;
        }
        Ok(out)
    }

    /// Maximum over *all* numeric cells of the named columns jointly —
    /// one scalar for the whole selection, not one per column.
    /// An empty selection reduces to `-inf`.
    pub fn global_max(&self, cols: &[String]) -> Result<f64, LoadshapeError> {
        let idx = self.resolve(cols)?;
        Ok(self.numeric_cells(&idx).fold(f64::NEG_INFINITY, f64::max))
    }

    /// Minimum over all numeric cells of the named columns jointly.
    /// An empty selection reduces to `+inf`.
    pub fn global_min(&self, cols: &[String]) -> Result<f64, LoadshapeError> {
        let idx = self.resolve(cols)?;
        Ok(self.numeric_cells(&idx).fold(f64::INFINITY, f64::min))
    }

    fn numeric_cells<'a>(&'a self, idx: &'a [usize]) -> impl Iterator<Item = f64> + 'a {
        idx.iter()
            .flat_map(|&i| self.columns[i].iter())
            .filter_map(Value::as_f64)
    }

    /// Divide every numeric cell of the named columns by `denom`.
    /// A zero denominator propagates infinite/NaN cells; that is a
    /// data-quality signal for the caller, not an error.
    pub fn div_scalar(&mut self, cols: &[String], denom: f64) -> Result<(), LoadshapeError> {
        let idx = self.resolve(cols)?;
        for &i in &idx {
            for cell in &mut self.columns[i] {
                if let Some(x) = cell.as_f64() {
                    *cell = Value::Float(x / denom);
                }
            }
        }
        Ok(())
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
