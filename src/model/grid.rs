use crate::model::Header;
use serde::{Deserialize, Serialize};

/// The tabular data exchanged with the remote store: the first row holds the headers and every
/// following row holds the cells of one record. Rows may be shorter than the header row, the
/// missing trailing cells read as empty strings.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Creates a `Grid` from anything that looks like `Vec<Vec<String>>`.
    pub fn new<S, R, I>(rows: I) -> Self
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|s| s.into()).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The header row, empty if the grid is empty.
    pub fn headers(&self) -> Vec<Header> {
        self.rows
            .first()
            .map(|row| row.iter().map(Header::from).collect())
            .unwrap_or_default()
    }

    /// Everything after the header row.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// The number of data rows, not counting the header row.
    pub fn len(&self) -> usize {
        self.data_rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_rows().is_empty()
    }

    pub(crate) fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// Reads cell `ix` of `row`, treating a missing cell as empty.
pub(crate) fn cell(row: &[String], ix: usize) -> &str {
    row.get(ix).map(String::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_grid() {
        let grid = Grid::default();
        assert!(grid.headers().is_empty());
        assert!(grid.data_rows().is_empty());
        assert_eq!(grid.len(), 0);
    }

    #[test]
    fn test_header_only() {
        let grid = Grid::new(vec![vec!["Date", "Amount"]]);
        assert_eq!(grid.headers().len(), 2);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_short_rows() {
        let grid = Grid::new(vec![vec!["Date", "Description", "Amount"], vec!["2024-01-01"]]);
        let row = &grid.data_rows()[0];
        assert_eq!(cell(row, 0), "2024-01-01");
        assert_eq!(cell(row, 1), "");
        assert_eq!(cell(row, 2), "");
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let grid = Grid::new(vec![vec!["A"], vec!["1"]]);
        assert_eq!(serde_json::to_string(&grid).unwrap(), r#"[["A"],["1"]]"#);
    }
}
