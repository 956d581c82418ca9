//! SQL text for the day-range export.
//!
//! The streaming statement and the header probe share one `WHERE` clause and
//! the same two parameters (`$1` = window start, `$2` = window end), so a
//! `SELECT *` expands to the same column list in both.

use crate::sql::base::error::DbError;

/// Wraps an identifier in PostgreSQL double quotes, doubling embedded quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!(r#""{}""#, ident.replace('"', r#""""#))
}

/// Quotes a possibly schema-qualified name such as `public.orders`.
pub fn quote_qualified(name: &str) -> Result<String, DbError> {
    let parts = name.split('.').map(str::trim).collect::<Vec<_>>();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(DbError::QueryBuildError(format!(
            "Invalid identifier: '{name}'"
        )));
    }
    Ok(parts
        .into_iter()
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join("."))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub table: String,
    pub timestamp_column: String,
    /// Optional stable ordering for the streaming statement.
    pub order_by: Option<String>,
}

impl RangeQuery {
    pub fn new(table: &str, timestamp_column: &str) -> Self {
        RangeQuery {
            table: table.to_string(),
            timestamp_column: timestamp_column.to_string(),
            order_by: None,
        }
    }

    pub fn with_order_by(mut self, column: Option<String>) -> Self {
        self.order_by = column;
        self
    }

    fn base_sql(&self) -> Result<String, DbError> {
        let table = quote_qualified(&self.table)?;
        if self.timestamp_column.trim().is_empty() {
            return Err(DbError::QueryBuildError(
                "Timestamp column must not be empty".into(),
            ));
        }
        let column = quote_identifier(self.timestamp_column.trim());

        Ok(format!(
            "SELECT * FROM {table} WHERE {column} >= $1::timestamp AND {column} < $2::timestamp"
        ))
    }

    /// The statement streamed through the server-side cursor.
    pub fn stream_sql(&self) -> Result<String, DbError> {
        let mut sql = self.base_sql()?;
        if let Some(order_by) = &self.order_by {
            if order_by.trim().is_empty() {
                return Err(DbError::QueryBuildError(
                    "ORDER BY column must not be empty".into(),
                ));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&quote_identifier(order_by.trim()));
        }
        Ok(sql)
    }

    /// Zero-row statement used only to read the column names.
    pub fn probe_sql(&self) -> Result<String, DbError> {
        Ok(format!("{} LIMIT 0", self.base_sql()?))
    }
}
