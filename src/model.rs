use crate::error::{EtlError, Result};

/// A raw rectangular region of spreadsheet cells, all values carried as
/// strings. Rows may be ragged; consumers pad with empty cells.
pub type Grid = Vec<Vec<String>>;

/// A labelled tabular dataset: one header label per column plus the data rows
/// beneath them. This is the uniform shape every source sheet is normalized
/// into before it reaches the staging store, and the shape read back out of
/// the store for export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given header labels and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends another table's rows beneath this one's, failing when the two
    /// column sets disagree. `table_name` only feeds the error message.
    pub fn append(&mut self, other: Table, table_name: &str) -> Result<()> {
        if self.columns != other.columns {
            return Err(EtlError::ColumnMismatch {
                table: table_name.to_string(),
                expected: self.columns.clone(),
                found: other.columns,
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn append_concatenates_rows_when_columns_agree() {
        let mut merged = table(&["product", "amount"], &[&["Chair", "5"]]);
        merged
            .append(table(&["product", "amount"], &[&["Desk", "20"]]), "sales")
            .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.rows[1], vec!["Desk", "20"]);
    }

    #[test]
    fn append_rejects_a_differing_column_set() {
        let mut merged = table(&["product", "amount"], &[&["Chair", "5"]]);
        let error = merged
            .append(table(&["product", "price"], &[&["Desk", "20"]]), "sales")
            .unwrap_err();
        match error {
            EtlError::ColumnMismatch {
                table,
                expected,
                found,
            } => {
                assert_eq!(table, "sales");
                assert_eq!(expected, vec!["product", "amount"]);
                assert_eq!(found, vec!["product", "price"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(merged.len(), 1, "failed append must not change the table");
    }
}
