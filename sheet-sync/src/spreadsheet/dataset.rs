//! Generic tabular data fetched from a spreadsheet export

use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Convert a raw JSON cell value
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Empty,
            serde_json::Value::String(s) => Cell::Text(s.clone()),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Cell::Number)
                .unwrap_or_else(|| Cell::Text(n.to_string())),
            other => Cell::Text(other.to_string()),
        }
    }

    /// Convert a raw CSV field; empty fields become `Empty`
    pub fn from_text(text: &str) -> Self {
        if text.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Ordered rows of named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Build a dataset; short rows are padded with `Empty` and long rows truncated
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().enumerate().map(|(index, cells)| Row {
            index,
            columns: &self.columns,
            cells,
        })
    }
}

/// Borrowed view of one dataset row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: usize,
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    /// Zero-based position of the row in its dataset
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell under the given column header; `Empty` if the column does not exist
    pub fn get(&self, column: &str) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;

        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.cells.get(i))
            .unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Empty.to_string(), "");
        assert_eq!(Cell::Text("Київ".into()).to_string(), "Київ");
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(30.52).to_string(), "30.52");
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(Cell::from_json(&json!(null)), Cell::Empty);
        assert_eq!(Cell::from_json(&json!("x")), Cell::Text("x".into()));
        assert_eq!(Cell::from_json(&json!(2)), Cell::Number(2.0));
        assert_eq!(Cell::from_json(&json!(true)), Cell::Text("true".into()));
    }

    #[test]
    fn test_rows_are_padded() {
        let dataset = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Text("1".into())]],
        );

        let row = dataset.rows().next().unwrap();
        assert_eq!(row.get("a"), &Cell::Text("1".into()));
        assert_eq!(row.get("b"), &Cell::Empty);
        assert_eq!(row.get("zzz"), &Cell::Empty);
    }
}
