use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse dataset: {0}")]
    Parse(String),
    #[error("serialize dataset: {0}")]
    Serialize(String),
    #[error("unsupported dataset format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),
    #[error("column {0} has a blank header")]
    BlankHeader(usize),
    #[error("duplicate column header: {0}")]
    DuplicateHeader(String),
    #[error("row {row} has {cells} cells but there are only {columns} columns")]
    RaggedRow { row: usize, cells: usize, columns: usize },
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("row {row} out of range (dataset has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },
}

/// Named columns over ordered rows of text cells. Rows with no non-empty
/// cell never make it in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularDataset {
    /// Short rows are padded with empty cells; long rows are an error.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for (i, c) in columns.iter().enumerate() {
            if c.trim().is_empty() {
                return Err(DatasetError::BlankHeader(i));
            }
            if !seen.insert(c.as_str()) {
                return Err(DatasetError::DuplicateHeader(c.clone()));
            }
        }

        let width = columns.len();
        let mut kept = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(DatasetError::RaggedRow { row: i, cells: row.len(), columns: width });
            }
            if row.iter().all(|c| c.is_empty()) {
                continue;
            }
            row.resize(width, String::new());
            kept.push(row);
        }
        Ok(Self { columns, rows: kept })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, DatasetError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DatasetError::UnknownColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: &str) -> Result<&str, DatasetError> {
        let col = self.column_index(column)?;
        let r = self
            .rows
            .get(row)
            .ok_or(DatasetError::RowOutOfRange { row, len: self.rows.len() })?;
        Ok(&r[col])
    }

    /// First row whose `column` cell equals `value`.
    pub fn find_row(&self, column: &str, value: &str) -> Result<Option<&[String]>, DatasetError> {
        let col = self.column_index(column)?;
        Ok(self.rows.iter().find(|r| r[col] == value).map(|r| r.as_slice()))
    }

    pub fn to_document(&self) -> DatasetDocument {
        DatasetDocument {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|r| r.iter().map(|c| Some(Cell::Text(c.clone()))).collect())
                .collect(),
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, DatasetError> {
        serde_json::to_vec_pretty(&self.to_document()).map_err(|e| DatasetError::Serialize(e.to_string()))
    }
}

/// On-disk shape: a header list and positional rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<Cell>>>,
}

/// A scalar cell as written by a spreadsheet export. Everything becomes text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    fn into_text(self) -> String {
        match self {
            Cell::Text(s) => s,
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl TryFrom<DatasetDocument> for TabularDataset {
    type Error = DatasetError;

    fn try_from(doc: DatasetDocument) -> Result<Self, Self::Error> {
        let rows = doc
            .rows
            .into_iter()
            .map(|r| r.into_iter().map(|c| c.map(Cell::into_text).unwrap_or_default()).collect())
            .collect();
        TabularDataset::new(doc.columns, rows)
    }
}

pub fn load_dataset(path: &Path) -> Result<TabularDataset, DatasetError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let s = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: DatasetDocument = match ext.as_str() {
        "json" => serde_json::from_str(&s).map_err(|e| DatasetError::Parse(e.to_string()))?,
        "yaml" | "yml" => serde_yaml::from_str(&s).map_err(|e| DatasetError::Parse(e.to_string()))?,
        other => return Err(DatasetError::UnsupportedFormat(other.to_string())),
    };
    TabularDataset::try_from(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_rows_dropped_and_short_rows_padded() {
        let ds = TabularDataset::new(
            strings(&["id", "name"]),
            vec![strings(&["1", "a"]), strings(&["", ""]), strings(&["2"]), vec![]],
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[1], strings(&["2", ""]));
    }

    #[test]
    fn headers_must_be_unique_and_named() {
        assert!(matches!(
            TabularDataset::new(strings(&["id", "id"]), vec![]),
            Err(DatasetError::DuplicateHeader(_))
        ));
        assert!(matches!(
            TabularDataset::new(strings(&["id", " "]), vec![]),
            Err(DatasetError::BlankHeader(1))
        ));
    }

    #[test]
    fn long_rows_rejected() {
        let err = TabularDataset::new(strings(&["id"]), vec![strings(&["1", "x"])]).unwrap_err();
        assert!(matches!(err, DatasetError::RaggedRow { row: 0, cells: 2, columns: 1 }));
    }

    #[test]
    fn lookups() {
        let ds = TabularDataset::new(strings(&["id", "name"]), vec![strings(&["1", "a"]), strings(&["1", "b"])]).unwrap();
        assert_eq!(ds.cell(1, "name").unwrap(), "b");
        assert_eq!(ds.find_row("id", "1").unwrap(), Some(strings(&["1", "a"]).as_slice()));
        assert_eq!(ds.find_row("id", "9").unwrap(), None);
        assert!(matches!(ds.cell(0, "nope"), Err(DatasetError::UnknownColumn(_))));
        assert!(matches!(ds.cell(5, "id"), Err(DatasetError::RowOutOfRange { row: 5, len: 2 })));
    }

    #[test]
    fn loads_json_and_yaml() {
        let dir = tempdir().unwrap();
        let json = dir.path().join("contacts.json");
        std::fs::write(&json, r#"{"columns":["contactid","age"],"rows":[["a",42],[null,null],["b",null]]}"#).unwrap();
        let ds = load_dataset(&json).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0], strings(&["a", "42"]));
        assert_eq!(ds.rows()[1], strings(&["b", ""]));

        let yaml = dir.path().join("contacts.YML");
        std::fs::write(&yaml, "columns: [contactid, active]\nrows:\n  - [a, true]\n  - ['', '']\n").unwrap();
        let ds = load_dataset(&yaml).unwrap();
        assert_eq!(ds.rows(), &[strings(&["a", "true"])]);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("broken.json");
        std::fs::write(&p, "{\"columns\": [").unwrap();
        let err = load_dataset(&p).unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
        assert!(err.to_string().starts_with("parse dataset:"));
    }

    #[test]
    fn serialize_errors_are_not_reported_as_parse_errors() {
        let err = DatasetError::Serialize("boom".into());
        assert_eq!(err.to_string(), "serialize dataset: boom");
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("book.xlsx");
        std::fs::write(&p, b"PK").unwrap();
        assert!(matches!(load_dataset(&p), Err(DatasetError::UnsupportedFormat(e)) if e == "xlsx"));
    }

    #[test]
    fn document_round_trip_keeps_rows() {
        let ds = TabularDataset::new(strings(&["id"]), vec![strings(&["1"])]).unwrap();
        let doc: DatasetDocument = serde_json::from_slice(&ds.to_json_bytes().unwrap()).unwrap();
        assert_eq!(TabularDataset::try_from(doc).unwrap(), ds);
    }
}
