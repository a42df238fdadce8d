use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

use crate::error::{DealError, DealResult};

/// A single cell of a [`Table`]
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Int(i64),
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, `None` for anything that is not a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// short name of the cell kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
        }
    }
}

// Floats are compared by bit pattern so that cells can be used as group keys.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Int(v) => v.hash(state),
            Value::Number(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Null, Value::Number)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map_or(Value::Null, Value::Text)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Option<NaiveDate>> for Value {
    fn from(v: Option<NaiveDate>) -> Self {
        v.map_or(Value::Null, Value::Date)
    }
}

/// Row oriented table with named columns.
///
/// Every row has exactly one cell per column. Tables are never modified by
/// the aggregation functions, which always build a new table for their result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// create an empty table with the given columns
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, the number of cells has to match the number of columns
    pub fn push_row(&mut self, row: Vec<Value>) -> DealResult<()> {
        if row.len() != self.columns.len() {
            return Err(DealError::InvalidArgument(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// builder style variant of [`Table::push_row`]
    pub fn with_row(mut self, row: Vec<Value>) -> DealResult<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// position of a single column
    pub fn column_index(&self, name: &str) -> DealResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DealError::Schema {
                columns: vec![name.to_string()],
            })
    }

    /// Resolve all names at once, so that the error lists every missing column
    pub fn column_indices<S: AsRef<str>>(&self, names: &[S]) -> DealResult<Vec<usize>> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.columns.iter().position(|c| c == name) {
                Some(idx) => found.push(idx),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(DealError::Schema { columns: missing })
        }
    }

    /// all cells of a column, top to bottom
    pub fn column<'a>(&'a self, name: &str) -> DealResult<impl Iterator<Item = &'a Value> + use<'a>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}

/// Read a measure cell as a number. Null counts as a missing value.
pub(crate) fn numeric_cell(value: &Value, column: &str, row: usize) -> DealResult<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Int(_) | Value::Number(_) => Ok(value.as_f64()),
        other => Err(DealError::Type {
            column: column.to_string(),
            row,
            expected: "number",
            found: other.kind().to_string(),
        }),
    }
}

/// Read a date cell. Null means the date is absent.
pub(crate) fn date_cell(value: &Value, column: &str, row: usize) -> DealResult<Option<NaiveDate>> {
    match value {
        Value::Null => Ok(None),
        Value::Date(d) => Ok(Some(*d)),
        other => Err(DealError::Type {
            column: column.to_string(),
            row,
            expected: "date",
            found: other.kind().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// pushing a row with the wrong amount of cells is refused
    fn push_row_checks_arity() {
        let mut table = Table::new(["a", "b"]);
        assert!(table.push_row(vec![Value::Int(1)]).is_err());
        assert!(table.push_row(vec![Value::Int(1), Value::Null]).is_ok());
        assert_eq!(1, table.len());
    }

    #[test]
    fn column_indices_reports_every_missing_column() {
        let table = Table::new(["a", "b"]);
        match table.column_indices(&["a", "x", "y"]) {
            Err(DealError::Schema { columns }) => assert_eq!(vec!["x", "y"], columns),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn float_cells_hash_by_bits() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Value::Number(1.5));
        set.insert(Value::Number(1.5));
        set.insert(Value::Int(1));
        assert_eq!(2, set.len());
        assert_ne!(Value::Int(1), Value::Number(1.0));
    }

    #[test]
    fn text_in_measure_is_a_type_error() {
        let res = numeric_cell(&Value::from("12k"), "productVolume", 3);
        match res {
            Err(DealError::Type { column, row, .. }) => {
                assert_eq!("productVolume", column);
                assert_eq!(3, row);
            }
            other => panic!("expected type error, got {:?}", other),
        }
        assert_eq!(None, numeric_cell(&Value::Null, "productVolume", 0).unwrap());
    }
}
