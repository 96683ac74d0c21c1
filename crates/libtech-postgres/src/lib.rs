//! PostgreSQL backend for the LibTech dashboard.
//!
//! Holds one long-lived connection, opened on first use and reopened if the
//! server drops it. Calls are blocking; async callers should run them on a
//! blocking thread.

use std::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};

use libtech_core::{DatabaseBackend, DbError, ResultSet, SqlValue};
use postgres::{types::ToSql, Client, NoTls};

mod value;

pub use value::{load, Value};

pub struct PostgresBackend {
    connection_string: String,
    client: Mutex<Option<Client>>,
}

impl PostgresBackend {
    /// Creates a backend without connecting. The first call opens the connection.
    pub fn new(connection_string: &str) -> Self {
        Self {
            connection_string: connection_string.to_string(),
            client: Mutex::new(None),
        }
    }

    /// Creates a backend and opens its connection immediately.
    pub fn connect(connection_string: &str) -> Result<Self, DbError> {
        let backend = Self::new(connection_string);
        {
            let mut guard = backend.lock();
            backend.ensure_connected(&mut guard)?;
        }
        Ok(backend)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Client>> {
        // A panic while holding the lock leaves the client usable; the next
        // call re-checks `is_closed`.
        self.client.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_connected<'g>(
        &self,
        guard: &'g mut MutexGuard<'_, Option<Client>>,
    ) -> Result<&'g mut Client, DbError> {
        let stale = guard.as_ref().map_or(true, |c| c.is_closed());
        if stale {
            if guard.is_some() {
                tracing::warn!("PostgreSQL connection closed, reconnecting");
            }
            let client = Client::connect(&self.connection_string, NoTls).map_err(|e| {
                tracing::error!(error = %e, "PostgreSQL connection failed");
                DbError::Connection(e.to_string())
            })?;
            tracing::info!("PostgreSQL connection established");
            **guard = Some(client);
        }
        guard.as_mut().ok_or(DbError::NotConnected)
    }
}

fn bind(params: &[SqlValue]) -> Vec<Value<'_>> {
    params.iter().map(Value).collect()
}

fn as_refs<'a>(values: &'a [Value<'a>]) -> Vec<&'a (dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl DatabaseBackend for PostgresBackend {
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, DbError> {
        let started = Instant::now();
        let mut guard = self.lock();
        let client = self.ensure_connected(&mut guard)?;

        let values = bind(params);
        let stmt = client
            .prepare(sql)
            .map_err(|e| DbError::Statement(e.to_string()))?;
        let rows = client
            .query(&stmt, &as_refs(&values))
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let mut result = ResultSet::new(stmt.columns().iter().map(|c| c.name().to_string()));
        for row in &rows {
            let mut cells = Vec::with_capacity(row.len());
            for index in 0..row.len() {
                cells.push(load(row, index).map_err(|e| DbError::Statement(e.to_string()))?);
            }
            result.push_row(cells);
        }

        tracing::debug!(
            rows = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PostgreSQL query completed"
        );
        Ok(result)
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, DbError> {
        let started = Instant::now();
        let mut guard = self.lock();
        let client = self.ensure_connected(&mut guard)?;

        let values = bind(params);
        let mut tx = client
            .transaction()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        match tx.execute(sql, &as_refs(&values)) {
            Ok(affected) => {
                tx.commit().map_err(|e| DbError::Statement(e.to_string()))?;
                tracing::debug!(
                    affected,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "PostgreSQL transaction committed"
                );
                Ok(affected)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::warn!(error = %rollback, "PostgreSQL rollback failed");
                } else {
                    tracing::debug!("PostgreSQL transaction rolled back");
                }
                Err(DbError::Statement(e.to_string()))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.lock().as_ref().map_or(false, |c| !c.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn database_url() -> Option<String> {
        std::env::var("LIBTECH_TEST_DATABASE_URL").ok()
    }

    #[test]
    fn unreachable_server_reports_connection_error() {
        let backend = PostgresBackend::new("host=127.0.0.1 port=1 user=nobody connect_timeout=1");
        assert!(!backend.is_connected());
        let err = backend.query("SELECT 1", &[]).unwrap_err();
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[test]
    #[ignore]
    fn round_trips_typed_parameters() {
        let Some(url) = database_url() else { return };
        let backend = PostgresBackend::connect(&url).unwrap();
        let rs = backend
            .query(
                "SELECT $1::int AS qty, $2::numeric AS price, $3::date AS day, $4::text AS name",
                &[
                    SqlValue::Int(3),
                    SqlValue::Decimal("12.50".parse().unwrap()),
                    SqlValue::Date(date!(2024 - 01 - 05)),
                    SqlValue::text("Dune"),
                ],
            )
            .unwrap();
        assert_eq!(rs.columns, vec!["qty", "price", "day", "name"]);
        assert_eq!(rs.rows[0][0], libtech_core::DataValue::Int(3));
        assert_eq!(rs.rows[0][2], libtech_core::DataValue::Date(date!(2024 - 01 - 05)));
    }

    #[test]
    #[ignore]
    fn failed_write_rolls_back_and_connection_survives() {
        let Some(url) = database_url() else { return };
        let backend = PostgresBackend::connect(&url).unwrap();
        backend
            .execute("CREATE TEMP TABLE IF NOT EXISTS t (id int PRIMARY KEY)", &[])
            .unwrap();
        backend.execute("INSERT INTO t VALUES ($1)", &[SqlValue::Int(1)]).unwrap();
        assert!(backend.execute("INSERT INTO t VALUES ($1)", &[SqlValue::Int(1)]).is_err());
        let rs = backend.query("SELECT count(*) AS n FROM t", &[]).unwrap();
        assert_eq!(rs.first_value(), Some(&libtech_core::DataValue::Int(1)));
    }
}
