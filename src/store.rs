use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::model::Table;

/// The relational staging workspace for one pipeline run: tables are written
/// with replace semantics by the loader, mutated by transforms, and read back
/// by exporters. Wraps a single exclusively-owned SQLite connection.
pub struct StagingStore {
    conn: Connection,
}

impl StagingStore {
    /// Opens an ephemeral in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Opens (or creates) a file-backed store.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        register_int_hash(&conn)?;
        Ok(Self { conn })
    }

    /// Drops and recreates `name` with the table's columns, then inserts
    /// every row in one transaction. No stale rows survive. Columns carry no
    /// declared type; cells that parse as integers or reals are stored
    /// numerically so transform statements can compare them as numbers, the
    /// rest stay text.
    pub fn replace_table(&self, name: &str, table: &Table) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))?;

        let column_defs: Vec<String> =
            table.columns.iter().map(|column| quote_ident(column)).collect();
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({})",
            quote_ident(name),
            column_defs.join(", ")
        ))?;

        let placeholders: Vec<String> = (1..=table.columns.len())
            .map(|idx| format!("?{idx}"))
            .collect();
        let insert = format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(name),
            placeholders.join(", ")
        );
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in &table.rows {
                for idx in 0..table.columns.len() {
                    let cell = row.get(idx).map(String::as_str).unwrap_or_default();
                    stmt.raw_bind_parameter(idx + 1, infer_value(cell))?;
                }
                stmt.raw_execute()?;
            }
        }
        tx.commit()?;
        debug!(table = name, rows = table.rows.len(), "table replaced");
        Ok(())
    }

    /// Executes a single statement. A trailing terminator is stripped
    /// defensively; statements that return rows are drained so SELECTs pass
    /// through the same path as DML.
    pub fn execute(&self, statement: &str) -> Result<()> {
        let cleaned = statement.trim().trim_end_matches(';').trim_end();
        let mut stmt = self.conn.prepare(cleaned)?;
        if stmt.column_count() == 0 {
            stmt.raw_execute()?;
        } else {
            let mut rows = stmt.raw_query();
            while rows.next()?.is_some() {}
        }
        Ok(())
    }

    /// Reads the full contents of a table (`SELECT *`), cells rendered back
    /// to strings. A missing table propagates as a store error.
    pub fn read_table(&self, name: &str) -> Result<Table> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();

        let mut rows = stmt.raw_query();
        let mut data = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(value_to_string(row.get_ref(idx)?));
            }
            data.push(cells);
        }

        Ok(Table {
            columns,
            rows: data,
        })
    }

    /// Names of all user tables currently in the store.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Releases the underlying connection. Must run on every exit path of a
    /// pipeline run, success or failure.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, error)| error.into())
    }
}

/// Numeric-looking cells get numeric storage, everything else stays text.
fn infer_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Text(String::new());
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Integer(int);
    }
    if let Ok(real) = cell.parse::<f64>() {
        return Value::Real(real);
    }
    Value::Text(cell.to_string())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Registers the `int_hash(text)` scalar function: sha256 of the UTF-8 text
/// interpreted as a big integer, reduced mod 10^12. Deterministic, so it is
/// usable in generated columns and repeated transforms.
fn register_int_hash(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "int_hash",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: String = ctx.get(0)?;
            Ok(int_hash(&text))
        },
    )?;
    Ok(())
}

fn int_hash(text: &str) -> i64 {
    const MODULUS: u128 = 1_000_000_000_000;
    let digest = Sha256::digest(text.as_bytes());
    let mut acc: u128 = 0;
    for byte in digest {
        acc = (acc * 256 + u128::from(byte)) % MODULUS;
    }
    acc as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn replace_table_keeps_only_the_latest_load() {
        let store = StagingStore::open_in_memory().unwrap();
        let first = table(&["product", "price"], &[&["Computer", "900"], &["Tablet", "300"]]);
        let second = table(&["product", "price"], &[&["Monitor", "450"]]);

        store.replace_table("products", &first).unwrap();
        store.replace_table("products", &second).unwrap();

        let read = store.read_table("products").unwrap();
        assert_eq!(read.columns, vec!["product", "price"]);
        assert_eq!(read.rows, vec![vec!["Monitor", "450"]]);
    }

    #[test]
    fn table_names_reflect_loaded_tables() {
        let store = StagingStore::open_in_memory().unwrap();
        store
            .replace_table("products", &table(&["name"], &[&["x"]]))
            .unwrap();
        assert_eq!(store.table_names().unwrap(), vec!["products"]);
    }

    #[test]
    fn reading_a_missing_table_is_a_store_error() {
        let store = StagingStore::open_in_memory().unwrap();
        assert!(store.read_table("absent").is_err());
    }

    #[test]
    fn execute_tolerates_trailing_terminators_and_selects() {
        let store = StagingStore::open_in_memory().unwrap();
        store
            .replace_table("items", &table(&["amount"], &[&["5"], &["20"]]))
            .unwrap();
        store
            .execute("DELETE FROM items WHERE amount < 10;")
            .unwrap();
        store.execute("SELECT * FROM items;").unwrap();
        assert_eq!(store.read_table("items").unwrap().rows, vec![vec!["20"]]);
    }

    #[test]
    fn int_hash_is_registered_and_deterministic() {
        let store = StagingStore::open_in_memory().unwrap();
        let hashed: i64 = store
            .conn
            .query_row("SELECT int_hash('products')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(hashed, int_hash("products"));
        assert!(hashed >= 0);
        assert!(hashed < 1_000_000_000_000);
        assert_ne!(int_hash("a"), int_hash("b"));
    }

    #[test]
    fn quoted_identifiers_survive_odd_table_names() {
        let store = StagingStore::open_in_memory().unwrap();
        store
            .replace_table("odd name", &table(&["a"], &[&["1"]]))
            .unwrap();
        assert_eq!(store.read_table("odd name").unwrap().rows.len(), 1);
    }
}
