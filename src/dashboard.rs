//! Dispatch from a selected report, table or form to the backend.

use std::{collections::BTreeMap, sync::Arc, time::Instant};

use libtech_core::{DataValue, DatabaseBackend, DbError, ResultSet, SqlValue};
use serde::Serialize;
use thiserror::Error;

use crate::{
    catalog::{table_title, Catalog, ParamKind, ReportCategory, ReportDefinition, ReportKind},
    charts::{chart_for, Chart},
    forms::{find_form, standard_forms, FormDefinition, FormError},
};

const NO_DATA: &str = "No data available for the selected query.";

pub type Inputs = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown report: {0}")]
    UnknownReport(String),
    #[error("unknown form: {0}")]
    UnknownForm(String),
    #[error("table {table} is not listed under {category}")]
    TableNotListed { category: String, table: String },
    #[error("Please provide: {}", .0.join(", "))]
    MissingParams(Vec<String>),
    #[error("{label}: {reason}")]
    InvalidParam { label: String, reason: String },
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("{0}")]
    Unavailable(DbError),
    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: DbError,
    },
}

impl DashboardError {
    fn database(context: impl Into<String>, source: DbError) -> Self {
        match source {
            DbError::NotConnected | DbError::Connection(_) => DashboardError::Unavailable(source),
            _ => DashboardError::Database {
                context: context.into(),
                source,
            },
        }
    }

    /// Input problems the user can fix, as opposed to lookup or database failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DashboardError::MissingParams(_)
                | DashboardError::InvalidParam { .. }
                | DashboardError::Form(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportOutcome {
    Table {
        title: String,
        result: ResultSet,
        #[serde(skip_serializing_if = "Option::is_none")]
        chart: Option<Chart>,
    },
    Availability {
        book_title: String,
        branch_id: String,
        available: bool,
    },
    InventoryValue {
        branch_id: String,
        value: DataValue,
    },
    Procedure {
        message: String,
    },
    Empty {
        message: String,
    },
}

impl ReportOutcome {
    fn empty(message: impl Into<String>) -> Self {
        ReportOutcome::Empty {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOutcome {
    pub message: String,
    pub affected: u64,
}

pub struct Dashboard {
    backend: Arc<dyn DatabaseBackend>,
    catalog: Catalog,
    forms: Vec<FormDefinition>,
    encryption_key: String,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn DatabaseBackend>, encryption_key: impl Into<String>) -> Self {
        Self {
            backend,
            catalog: Catalog::standard(),
            forms: standard_forms(),
            encryption_key: encryption_key.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn forms(&self) -> &[FormDefinition] {
        &self.forms
    }

    pub fn form(&self, key: &str) -> Result<&FormDefinition, DashboardError> {
        find_form(&self.forms, key).ok_or_else(|| DashboardError::UnknownForm(key.to_string()))
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    fn category(&self, key: &str) -> Result<&ReportCategory, DashboardError> {
        self.catalog
            .category(key)
            .ok_or_else(|| DashboardError::UnknownCategory(key.to_string()))
    }

    /// Runs the named report of `category` with the given parameter inputs.
    pub fn run_report(
        &self,
        category: &str,
        report: &str,
        inputs: &Inputs,
    ) -> Result<ReportOutcome, DashboardError> {
        let category = self.category(category)?;
        let report = category
            .report(report)
            .ok_or_else(|| DashboardError::UnknownReport(report.to_string()))?;
        let params = bind_params(report, inputs)?;

        let started = Instant::now();
        let outcome = self.dispatch(report, inputs, &params);
        let elapsed = started.elapsed();

        match &outcome {
            Ok(_) => {
                metrics::increment_counter!("libtech_reports_total", "report" => report.slug.clone());
                metrics::histogram!(
                    "libtech_report_duration_seconds",
                    elapsed.as_secs_f64(),
                    "report" => report.slug.clone()
                );
                tracing::info!(
                    category = category.name,
                    report = report.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Report executed"
                );
            }
            Err(e) => {
                metrics::increment_counter!("libtech_report_errors_total", "report" => report.slug.clone());
                tracing::warn!(report = report.name, error = %e, "Report failed");
            }
        }
        outcome
    }

    fn dispatch(
        &self,
        report: &ReportDefinition,
        inputs: &Inputs,
        params: &[SqlValue],
    ) -> Result<ReportOutcome, DashboardError> {
        let input = |key: &str| inputs.get(key).cloned().unwrap_or_default();

        match &report.kind {
            ReportKind::Table => {
                let result = self.query(report, params)?;
                if result.is_empty() {
                    return Ok(ReportOutcome::empty(NO_DATA));
                }
                let chart = chart_for(report.name, &result);
                Ok(ReportOutcome::Table {
                    title: report.name.to_string(),
                    result,
                    chart,
                })
            }
            ReportKind::Availability => {
                let result = self.query(report, params)?;
                Ok(ReportOutcome::Availability {
                    book_title: input("book_title"),
                    branch_id: input("branch_id"),
                    available: result.first_value().map_or(false, DataValue::is_truthy),
                })
            }
            ReportKind::InventoryValue => {
                let result = self.query(report, params)?;
                match result.first_value() {
                    Some(value) => Ok(ReportOutcome::InventoryValue {
                        branch_id: input("branch_id"),
                        value: value.clone(),
                    }),
                    None => Ok(ReportOutcome::empty("No data returned.")),
                }
            }
            ReportKind::Procedure { name } => {
                self.backend
                    .call_procedure(name, params)
                    .map_err(|e| DashboardError::database(format!("Error executing procedure '{}'", name), e))?;
                Ok(ReportOutcome::Procedure {
                    message: format!("Procedure '{}' executed successfully.", name),
                })
            }
            ReportKind::BorrowingChain => {
                let result = self.query(report, params)?;
                if result.is_empty() {
                    return Ok(ReportOutcome::empty(
                        "No borrowing chain data available for the provided Book ID.",
                    ));
                }
                let chart = chart_for(report.name, &result);
                Ok(ReportOutcome::Table {
                    title: format!("Borrowing Chain for Book ID: {}", input("book_id")),
                    result,
                    chart,
                })
            }
        }
    }

    fn query(&self, report: &ReportDefinition, params: &[SqlValue]) -> Result<ResultSet, DashboardError> {
        self.backend
            .query(report.sql, params)
            .map_err(|e| DashboardError::database("Error executing query", e))
    }

    /// Every row of `table`, which must be listed under `category`.
    pub fn view_table(&self, category: &str, table: &str) -> Result<ReportOutcome, DashboardError> {
        let category = self.category(category)?;
        let table = category
            .view_all_tables
            .iter()
            .find(|t| **t == table)
            .ok_or_else(|| DashboardError::TableNotListed {
                category: category.name.to_string(),
                table: table.to_string(),
            })?;
        let title = table_title(table);

        let result = self
            .backend
            .select_all(table)
            .map_err(|e| DashboardError::database(format!("Error fetching data from {}", title), e))?;

        metrics::increment_counter!("libtech_tables_viewed_total", "table" => *table);
        tracing::info!(table, rows = result.len(), "Table viewed");

        if result.is_empty() {
            return Ok(ReportOutcome::empty(format!("No data available in {} table.", title)));
        }
        Ok(ReportOutcome::Table {
            title: format!("All Records from {}", title),
            result,
            chart: None,
        })
    }

    /// Validates and writes one form submission.
    pub fn submit_form(&self, form: &str, inputs: &Inputs) -> Result<FormOutcome, DashboardError> {
        let form = self.form(form)?;
        let stmt = form.prepare(inputs, &self.encryption_key)?;

        let affected = self
            .backend
            .execute(&stmt.sql, &stmt.params)
            .map_err(|e| DashboardError::database("Error executing operation", e))?;

        metrics::increment_counter!("libtech_forms_submitted_total", "form" => form.slug.clone());
        tracing::info!(form = form.name, table = form.table, affected, "Form submitted");

        Ok(FormOutcome {
            message: form.success_message.to_string(),
            affected,
        })
    }
}

fn bind_params(report: &ReportDefinition, inputs: &Inputs) -> Result<Vec<SqlValue>, DashboardError> {
    let missing: Vec<String> = report
        .params
        .iter()
        .filter(|p| inputs.get(p.key).map_or(true, |v| v.is_empty()))
        .map(|p| p.key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::MissingParams(missing));
    }

    report
        .params
        .iter()
        .map(|p| {
            let raw = inputs.get(p.key).map(String::as_str).unwrap_or_default();
            match p.kind {
                ParamKind::Text => Ok(SqlValue::text(raw)),
                ParamKind::Integer { min } => {
                    let invalid = |reason: String| DashboardError::InvalidParam {
                        label: p.label.to_string(),
                        reason,
                    };
                    let value = raw
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| invalid("must be a whole number".to_string()))?;
                    if value < min {
                        return Err(invalid(format!("must be at least {}", min)));
                    }
                    Ok(SqlValue::Int(value))
                }
            }
        })
        .collect()
}
