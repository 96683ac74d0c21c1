use thiserror::Error;

use crate::models::{params::SqlValue, ResultSet};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("No database connection.")]
    NotConnected,
    #[error("Error connecting to the database: {0}")]
    Connection(String),
    #[error("{0}")]
    Statement(String),
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// A relational database as the dashboard sees it: a place to send SQL text.
///
/// Every write commits on success and rolls back on failure; there are no
/// transactions spanning more than one call.
pub trait DatabaseBackend: Send + Sync {
    /// Runs a statement that returns rows.
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, DbError>;

    /// Runs a statement that does not return rows, returning the affected count.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError>;

    /// Calls a stored procedure by name.
    fn call_procedure(&self, name: &str, params: &[SqlValue]) -> Result<(), DbError> {
        let sql = procedure_call_sql(name, params.len())?;
        self.execute(&sql, params).map(|_| ())
    }

    /// Every row of a table.
    fn select_all(&self, table: &str) -> Result<ResultSet, DbError> {
        let sql = format!("SELECT * FROM {}", quote_identifier(table)?);
        self.query(&sql, &[])
    }

    fn is_connected(&self) -> bool;
}

/// Quotes an identifier so it can be spliced into SQL text.
pub fn quote_identifier(name: &str) -> Result<String, DbError> {
    if name.is_empty() || name.contains('\0') {
        return Err(DbError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// `CALL "name"($1, ..., $n)`
pub fn procedure_call_sql(name: &str, arity: usize) -> Result<String, DbError> {
    let placeholders = (1..=arity)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("CALL {}({})", quote_identifier(name)?, placeholders))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("books_for_rent").unwrap(), "\"books_for_rent\"");
        assert_eq!(quote_identifier("we\"ird").unwrap(), "\"we\"\"ird\"");
    }

    #[test]
    fn rejects_empty_identifiers() {
        assert!(matches!(quote_identifier(""), Err(DbError::InvalidIdentifier(_))));
        assert!(quote_identifier("a\0b").is_err());
    }

    #[test]
    fn builds_procedure_calls() {
        assert_eq!(
            procedure_call_sql("transfer_book_stock", 4).unwrap(),
            "CALL \"transfer_book_stock\"($1, $2, $3, $4)"
        );
        assert_eq!(procedure_call_sql("noop", 0).unwrap(), "CALL \"noop\"()");
    }
}
