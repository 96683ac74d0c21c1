//! In-memory fixture backend.
//!
//! There is no SQL engine here: result sets are registered up front against
//! the statement text that should produce them, and every call is recorded so
//! tests can assert on exactly what was sent.

use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use libtech_core::{quote_identifier, DatabaseBackend, DbError, ResultSet, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Execute,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<SqlValue>,
    /// Writes only: false when the statement failed and was rolled back.
    pub committed: bool,
}

struct State {
    connected: bool,
    results: BTreeMap<String, ResultSet>,
    tables: BTreeMap<String, ResultSet>,
    failures: Vec<(String, String)>,
    log: Vec<ExecutedStatement>,
}

pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapses runs of whitespace so registered SQL matches regardless of
/// indentation.
pub fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                connected: true,
                results: BTreeMap::new(),
                tables: BTreeMap::new(),
                failures: Vec::new(),
                log: Vec::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Rows returned whenever `sql` is queried.
    pub fn with_result(self, sql: &str, result: ResultSet) -> Self {
        self.write().results.insert(normalize_sql(sql), result);
        self
    }

    /// Contents of `table` for `SELECT *`.
    pub fn with_table(self, table: &str, rows: ResultSet) -> Self {
        self.write().tables.insert(table.to_string(), rows);
        self
    }

    /// Any statement containing `fragment` fails with `message`.
    pub fn fail_on(self, fragment: &str, message: &str) -> Self {
        self.write()
            .failures
            .push((normalize_sql(fragment), message.to_string()));
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.write().connected = connected;
    }

    pub fn statements(&self) -> Vec<ExecutedStatement> {
        self.read().log.clone()
    }

    pub fn last_statement(&self) -> Option<ExecutedStatement> {
        self.read().log.last().cloned()
    }

    pub fn commits(&self) -> usize {
        self.count_writes(true)
    }

    pub fn rollbacks(&self) -> usize {
        self.count_writes(false)
    }

    fn count_writes(&self, committed: bool) -> usize {
        self.read()
            .log
            .iter()
            .filter(|s| s.kind == StatementKind::Execute && s.committed == committed)
            .count()
    }

    fn check(state: &State, sql: &str) -> Result<(), DbError> {
        if !state.connected {
            return Err(DbError::NotConnected);
        }
        match state.failures.iter().find(|(fragment, _)| sql.contains(fragment.as_str())) {
            Some((_, message)) => Err(DbError::Statement(message.clone())),
            None => Ok(()),
        }
    }
}

impl DatabaseBackend for InMemoryBackend {
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, DbError> {
        let sql = normalize_sql(sql);
        let mut state = self.write();
        state.log.push(ExecutedStatement {
            kind: StatementKind::Query,
            sql: sql.clone(),
            params: params.to_vec(),
            committed: true,
        });
        Self::check(&state, &sql)?;

        let result = state.results.get(&sql).cloned().or_else(|| {
            state
                .tables
                .iter()
                .find(|(table, _)| {
                    quote_identifier(table)
                        .map(|quoted| sql == format!("SELECT * FROM {}", quoted))
                        .unwrap_or(false)
                })
                .map(|(_, rows)| rows.clone())
        });

        tracing::trace!(sql = %sql, found = result.is_some(), "In-memory query");
        Ok(result.unwrap_or_default())
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        let sql = normalize_sql(sql);
        let mut state = self.write();
        let outcome = Self::check(&state, &sql);
        state.log.push(ExecutedStatement {
            kind: StatementKind::Execute,
            sql,
            params: params.to_vec(),
            committed: outcome.is_ok(),
        });
        outcome.map(|_| 1)
    }

    fn is_connected(&self) -> bool {
        self.read().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libtech_core::DataValue;

    fn branches() -> ResultSet {
        ResultSet::new(["branchid"]).with_row(vec!["LIBTECH01".into()])
    }

    #[test]
    fn returns_registered_results_regardless_of_whitespace() {
        let backend = InMemoryBackend::new().with_result("SELECT branchid\n   FROM libraryy;", branches());
        let rs = backend.query("  SELECT branchid FROM libraryy;", &[]).unwrap();
        assert_eq!(rs.first_value(), Some(&DataValue::from("LIBTECH01")));
    }

    #[test]
    fn unknown_queries_return_empty_sets() {
        let backend = InMemoryBackend::new();
        assert!(backend.query("SELECT 1", &[]).unwrap().is_empty());
    }

    #[test]
    fn select_all_reads_registered_tables() {
        let backend = InMemoryBackend::new().with_table("libraryy", branches());
        assert_eq!(backend.select_all("libraryy").unwrap().len(), 1);
        assert_eq!(
            backend.last_statement().unwrap().sql,
            "SELECT * FROM \"libraryy\""
        );
    }

    #[test]
    fn failing_writes_are_rolled_back() {
        let backend = InMemoryBackend::new().fail_on("INSERT INTO staff", "duplicate key");
        assert!(backend.execute("INSERT INTO libraryy VALUES ($1)", &[SqlValue::text("x")]).is_ok());
        let err = backend.execute("INSERT INTO staff VALUES ($1)", &[]).unwrap_err();
        assert_eq!(err.to_string(), "duplicate key");
        assert_eq!(backend.commits(), 1);
        assert_eq!(backend.rollbacks(), 1);
    }

    #[test]
    fn disconnected_backend_refuses_everything() {
        let backend = InMemoryBackend::new();
        backend.set_connected(false);
        assert!(matches!(backend.query("SELECT 1", &[]), Err(DbError::NotConnected)));
        assert!(!backend.is_connected());
    }

    #[test]
    fn procedures_are_issued_as_call_statements() {
        let backend = InMemoryBackend::new();
        backend
            .call_procedure("transfer_book_stock", &[SqlValue::text("A"), SqlValue::Int(2)])
            .unwrap();
        let stmt = backend.last_statement().unwrap();
        assert_eq!(stmt.sql, "CALL \"transfer_book_stock\"($1, $2)");
        assert_eq!(stmt.kind, StatementKind::Execute);
    }
}
