use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use sha2::Digest as _;

use crate::foundation::error::{VizError, VizResult};

/// One cell of a [`DataTable`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing value (`NA`).
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    Text(String),
}

impl Cell {
    /// Convert a JSON scalar. Nested arrays and objects are rejected.
    pub fn from_json(v: &serde_json::Value) -> VizResult<Self> {
        match v {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| VizError::serde(format!("number {n} is not representable as f64"))),
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(VizError::serde(
                "table cells must be scalars (null, bool, number or string)",
            )),
        }
    }

    /// Return `true` for `NA`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the cell; booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Null | Self::Text(_) => None,
        }
    }

    /// Category label of the cell, `None` for `NA`.
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NA"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Row-oriented in-memory table bound to a named data source.
#[derive(Clone, Debug, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// Create an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> VizResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, c) in columns.iter().enumerate() {
            if index.insert(c.clone(), i).is_some() {
                return Err(VizError::structure(format!("duplicate column '{c}'")));
            }
        }
        Ok(Self {
            columns,
            index,
            rows: Vec::new(),
        })
    }

    /// Append a row; its width must match the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) -> VizResult<()> {
        if row.len() != self.columns.len() {
            return Err(VizError::structure(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder-style [`push_row`](Self::push_row).
    pub fn with_row(mut self, row: Vec<Cell>) -> VizResult<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    /// Build a table from JSON records. Columns appear in first-seen order; absent keys are `NA`.
    pub fn from_records(records: &[serde_json::Map<String, serde_json::Value>]) -> VizResult<Self> {
        let mut columns = Vec::<String>::new();
        for rec in records {
            for k in rec.keys() {
                if !columns.iter().any(|c| c == k) {
                    columns.push(k.clone());
                }
            }
        }
        let mut table = Self::new(columns)?;
        for rec in records {
            let mut row = Vec::with_capacity(table.columns.len());
            for c in &table.columns {
                row.push(match rec.get(c) {
                    Some(v) => Cell::from_json(v)?,
                    None => Cell::Null,
                });
            }
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Parse a JSON array of objects.
    pub fn from_json_str(s: &str) -> VizResult<Self> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(s)?;
        Self::from_records(&records)
    }

    /// Read a JSON array-of-objects file.
    pub fn from_path(path: impl AsRef<Path>) -> VizResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            VizError::data_binding(path.display().to_string(), format!("read failed: {e}"))
        })?;
        Self::from_json_str(&text)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Content signature: SHA-256 (hex) over column names and every cell.
    pub fn signature(&self) -> String {
        let mut h = sha2::Sha256::new();
        h.update((self.columns.len() as u64).to_le_bytes());
        for c in &self.columns {
            h.update((c.len() as u64).to_le_bytes());
            h.update(c.as_bytes());
        }
        h.update((self.rows.len() as u64).to_le_bytes());
        for row in &self.rows {
            for cell in row {
                match cell {
                    Cell::Null => h.update([0u8]),
                    Cell::Bool(b) => h.update([1u8, u8::from(*b)]),
                    Cell::Number(n) => {
                        h.update([2u8]);
                        h.update(n.to_bits().to_le_bytes());
                    }
                    Cell::Text(s) => {
                        h.update([3u8]);
                        h.update((s.len() as u64).to_le_bytes());
                        h.update(s.as_bytes());
                    }
                }
            }
        }
        hex(&h.finalize())
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/data/table.rs"]
mod tests;
