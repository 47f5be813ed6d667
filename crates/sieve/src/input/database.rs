//! SQL query sources.

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::error::FetchError;
use crate::table::{Cell, Table};

/// An open database connection that query sources read from.
///
/// The connection is created by the caller and lent to each
/// [`Source::Query`](super::Source::Query); nothing holds it globally.
pub struct DatabaseConnection {
    url: String,
    conn: Connection,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl DatabaseConnection {
    /// Open a connection from a URL.
    ///
    /// Accepted forms: `sqlite::memory:`, `sqlite://:memory:`,
    /// `sqlite://<path>`, `sqlite:<path>`, or a bare file path.
    pub fn open(url: &str) -> Result<Self, FetchError> {
        let target = if let Some(rest) = url.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = url.strip_prefix("sqlite:") {
            rest
        } else if let Some((scheme, _)) = url.split_once("://") {
            return Err(FetchError::UnsupportedDatabase(format!(
                "'{}' (only sqlite is supported)",
                scheme
            )));
        } else {
            url
        };

        let conn = if target.is_empty() || target == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(target)?
        };

        tracing::debug!(url, "opened database connection");
        Ok(Self {
            url: url.to_string(),
            conn,
        })
    }

    /// Wrap an already open connection.
    pub fn from_connection(url: impl Into<String>, conn: Connection) -> Self {
        Self {
            url: url.into(),
            conn,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Borrow the underlying connection (for setup statements).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run a query and collect the result set into a table.
    pub fn query(&self, sql: &str) -> Result<Table, FetchError> {
        let mut stmt = self.conn.prepare(sql)?;
        let headers: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = headers.len();

        let mut rows = Vec::new();
        let mut result = stmt.query([])?;
        while let Some(row) = result.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(sql_cell(row.get_ref(i)?));
            }
            rows.push(cells);
        }

        Ok(Table::new(headers, rows))
    }
}

fn sql_cell(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(v) => Cell::Number(v as f64),
        ValueRef::Real(v) => Cell::number(v),
        ValueRef::Text(t) | ValueRef::Blob(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
    }
}
