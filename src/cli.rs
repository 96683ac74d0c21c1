//! Text rendering for the command-line subcommands.

use prettytable::{row, Table};

use crate::{
    catalog::{Catalog, ParamKind},
    config::Command,
    dashboard::{Dashboard, DashboardError, FormOutcome, Inputs, ReportOutcome},
    forms::{FieldKind, FormDefinition},
};

fn inputs(pairs: Vec<(String, String)>) -> Inputs {
    pairs.into_iter().collect()
}

/// Runs a non-serving subcommand and returns what to print.
pub fn execute(command: Command, dashboard: &Dashboard) -> Result<String, DashboardError> {
    match command {
        Command::Serve => Ok(String::new()),
        Command::Reports => Ok(render_catalog(dashboard.catalog())),
        Command::Run { report, params } => {
            let (category, definition) = dashboard
                .catalog()
                .find_report(&report)
                .ok_or_else(|| DashboardError::UnknownReport(report.clone()))?;
            let outcome = dashboard.run_report(category.name, definition.name, &inputs(params))?;
            Ok(render_outcome(&outcome))
        }
        Command::Table { category, table } => {
            let outcome = dashboard.view_table(&category, &table)?;
            Ok(render_outcome(&outcome))
        }
        Command::Forms => Ok(render_forms(dashboard.forms())),
        Command::Submit { form, fields } => {
            let outcome = dashboard.submit_form(&form, &inputs(fields))?;
            Ok(render_form_outcome(&outcome))
        }
    }
}

pub fn render_catalog(catalog: &Catalog) -> String {
    let mut table = Table::new();
    table.set_titles(row!["Category", "Report", "Slug", "Parameters"]);
    for category in &catalog.categories {
        for report in &category.reports {
            let params = report
                .params
                .iter()
                .map(|p| match p.kind {
                    ParamKind::Text => p.key.to_string(),
                    ParamKind::Integer { min } => format!("{} (>= {})", p.key, min),
                })
                .collect::<Vec<_>>()
                .join(", ");
            table.add_row(row![category.name, report.name, report.slug, params]);
        }
        if !category.view_all_tables.is_empty() {
            table.add_row(row![category.name, "View All", "", category.view_all_tables.join(", ")]);
        }
    }
    table.to_string()
}

pub fn render_outcome(outcome: &ReportOutcome) -> String {
    match outcome {
        ReportOutcome::Table { title, result, chart } => {
            let mut out = format!("{}\n{}", title, result);
            if let Some(chart) = chart {
                out.push_str(&format!("Chart: {} ({} points)\n", chart.title, chart.points.len()));
            }
            out
        }
        ReportOutcome::Availability {
            book_title,
            branch_id,
            available,
        } => format!(
            "Book Title: {}\nBranch ID: {}\nAvailability: {}\n",
            book_title,
            branch_id,
            if *available { "Yes" } else { "No" }
        ),
        ReportOutcome::InventoryValue { branch_id, value } => {
            format!("Branch ID: {}\nTotal Inventory Value: {}\n", branch_id, value)
        }
        ReportOutcome::Procedure { message } | ReportOutcome::Empty { message } => format!("{}\n", message),
    }
}

fn describe_kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Text => "text".to_string(),
        FieldKind::TextArea => "text (long)".to_string(),
        FieldKind::Password => "password".to_string(),
        FieldKind::Select { options } => format!("one of {}", options.join("/")),
        FieldKind::Integer { min } => format!("integer >= {}", min),
        FieldKind::Decimal { min, max: Some(max) } => format!("decimal {}..={}", min, max),
        FieldKind::Decimal { min, max: None } => format!("decimal >= {}", min),
        FieldKind::Date => "date (YYYY-MM-DD)".to_string(),
    }
}

pub fn render_forms(forms: &[FormDefinition]) -> String {
    let mut table = Table::new();
    table.set_titles(row!["Form", "Table", "Field", "Kind", "Required"]);
    for form in forms {
        for field in &form.fields {
            table.add_row(row![
                form.name,
                form.table,
                field.column,
                describe_kind(&field.kind),
                if field.required { "yes" } else { "no" }
            ]);
        }
    }
    table.to_string()
}

pub fn render_form_outcome(outcome: &FormOutcome) -> String {
    format!("{} ({} row(s) affected)\n", outcome.message, outcome.affected)
}
