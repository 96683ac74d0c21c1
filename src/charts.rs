//! Chart descriptors attached to report results.
//!
//! Charts are keyed by report name and only produced when the result carries
//! the columns the chart plots. Drawing them is left to the client.

use libtech_core::{DataValue, ResultSet};
use serde::Serialize;

use crate::catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    GroupedBar,
    Pie,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Palette {
    Viridis,
    Blues,
    Reds,
    Greens,
    Oranges,
    Purples,
    RdBu,
    Set1,
    Set2,
    Dark2,
}

impl Palette {
    /// Sequential scales colour by magnitude; qualitative ones by category.
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            Palette::Viridis
                | Palette::Blues
                | Palette::Reds
                | Palette::Greens
                | Palette::Oranges
                | Palette::Purples
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub column: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: DataValue,
    pub y: DataValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<DataValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hover: Vec<DataValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Axis>,
    pub palette: Palette,
    pub continuous_color: bool,
    pub show_legend: bool,
    pub points: Vec<ChartPoint>,
}

struct ChartRule {
    report: &'static str,
    kind: ChartKind,
    title: &'static str,
    x: (&'static str, &'static str),
    y: (&'static str, &'static str),
    color: Option<(&'static str, &'static str)>,
    hover: &'static [&'static str],
    palette: Palette,
    show_legend: bool,
}

impl ChartRule {
    const fn bar(
        report: &'static str,
        title: &'static str,
        x: (&'static str, &'static str),
        y: (&'static str, &'static str),
        palette: Palette,
    ) -> Self {
        Self {
            report,
            kind: ChartKind::Bar,
            title,
            x,
            y,
            color: Some(y),
            hover: &[],
            palette,
            show_legend: false,
        }
    }

    fn required_columns(&self) -> Vec<&'static str> {
        let mut cols = vec![self.x.0, self.y.0];
        if let Some((c, _)) = self.color {
            cols.push(c);
        }
        cols.extend_from_slice(self.hover);
        cols
    }
}

const SEGMENT_COLUMN: &str = "customer_segment";

static RULES: &[ChartRule] = &[
    ChartRule::bar(
        catalog::TOP_BORROWED_BOOKS,
        "Top 5 Borrowed Books in the Last Year",
        ("title", "Book Title"),
        ("borrow_count", "Borrow Count"),
        Palette::Viridis,
    ),
    ChartRule::bar(
        catalog::BUSIEST_BRANCH,
        "Branch with the Highest Number of Rentals",
        ("branchid", "Branch ID"),
        ("rentals_count", "Rentals Count"),
        Palette::Blues,
    ),
    ChartRule::bar(
        catalog::CUSTOMERS_WITH_PENALTIES,
        "Customers With Outstanding Penalties",
        ("username", "Username"),
        ("total_penalty", "Total Penalty"),
        Palette::Reds,
    ),
    ChartRule::bar(
        catalog::TOP_SUPPLIERS,
        "Top 5 Suppliers by Revenue",
        ("supp_name", "Supplier Name"),
        ("total_revenue", "Total Revenue"),
        Palette::Greens,
    ),
    ChartRule::bar(
        catalog::BRANCH_REVENUE,
        "Total Revenue from Book and Item Sales by Library Branch",
        ("branchid", "Branch ID"),
        ("total_revenue", "Total Revenue"),
        Palette::Oranges,
    ),
    ChartRule {
        report: catalog::SUPPLY_SUMMARY,
        kind: ChartKind::GroupedBar,
        title: "Supplier Supply Summary",
        x: ("items_name", "Item Name"),
        y: ("total_supplied", "Total Supplied"),
        color: Some(("supp_name", "Supplier Name")),
        hover: &[],
        palette: Palette::Set1,
        show_legend: true,
    },
    ChartRule::bar(
        catalog::TOP_MANAGER_BY_ITEMS,
        "Staff Managing Libraries with Highest Number of Items",
        ("branchid", "Branch ID"),
        ("total_items", "Total Items"),
        Palette::Purples,
    ),
    ChartRule::bar(
        catalog::LOW_INVENTORY,
        "Library Branches Running Low on Inventory",
        ("branchid", "Branch ID"),
        ("total_items", "Total Items"),
        Palette::Reds,
    ),
    ChartRule {
        report: catalog::BORROWED_AND_BOUGHT,
        kind: ChartKind::Scatter,
        title: "Customers Who Borrowed and Bought the Same Book Title",
        x: ("borrow_date", "Borrow Date"),
        y: ("purchase_date", "Purchase Date"),
        color: Some(("username", "Username")),
        hover: &["title"],
        palette: Palette::Set2,
        show_legend: true,
    },
    ChartRule {
        report: catalog::BUSIEST_LIBRARIANS,
        kind: ChartKind::Bar,
        title: "Librarians Working the Most Hours",
        x: ("first_name", "First Name"),
        y: ("hours", "Hours"),
        color: Some(("branchid", "Branch ID")),
        hover: &[],
        palette: Palette::Dark2,
        show_legend: true,
    },
    ChartRule {
        report: catalog::BORROWING_CHAIN,
        kind: ChartKind::HorizontalBar,
        title: "Borrowing Chain Levels",
        x: ("chain_level", "Chain Level"),
        y: ("username", "Username"),
        color: Some(("chain_level", "Chain Level")),
        hover: &[],
        palette: Palette::Viridis,
        show_legend: false,
    },
];

/// The chart for `report`, if one is mapped and `result` has its columns.
pub fn chart_for(report: &str, result: &ResultSet) -> Option<Chart> {
    if result.is_empty() {
        return None;
    }
    if report == catalog::CUSTOMER_SEGMENTS {
        return segment_pie(result);
    }

    let rule = RULES.iter().find(|r| r.report == report)?;
    if !result.has_columns(&rule.required_columns()) {
        tracing::debug!(report, "Result lacks chart columns, skipping chart");
        return None;
    }

    let index = |name: &str| result.column_index(name);
    let x = index(rule.x.0)?;
    let y = index(rule.y.0)?;
    let color = match rule.color {
        Some((c, _)) => Some(index(c)?),
        None => None,
    };
    let hover: Vec<usize> = rule.hover.iter().filter_map(|h| index(*h)).collect();

    // Short rows read as NULL in the missing cells.
    let points = result
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| row.get(i).cloned().unwrap_or(DataValue::Null);
            ChartPoint {
                x: cell(x),
                y: cell(y),
                color: color.map(cell),
                hover: hover.iter().map(|&h| cell(h)).collect(),
            }
        })
        .collect();

    Some(Chart {
        kind: rule.kind,
        title: rule.title.to_string(),
        x: axis(rule.x),
        y: axis(rule.y),
        color: rule.color.map(axis),
        palette: rule.palette,
        continuous_color: rule.palette.is_continuous(),
        show_legend: rule.show_legend,
        points,
    })
}

fn axis((column, label): (&str, &str)) -> Axis {
    Axis {
        column: column.to_string(),
        label: label.to_string(),
    }
}

fn segment_pie(result: &ResultSet) -> Option<Chart> {
    if !result.has_columns(&[SEGMENT_COLUMN]) {
        return None;
    }
    let points = result
        .value_counts(SEGMENT_COLUMN)
        .into_iter()
        .map(|(segment, count)| {
            let label = DataValue::from(segment.as_str());
            ChartPoint {
                x: label.clone(),
                y: DataValue::Int(count as i64),
                color: Some(label),
                hover: Vec::new(),
            }
        })
        .collect();

    Some(Chart {
        kind: ChartKind::Pie,
        title: "Customer Segments".to_string(),
        x: axis(("Customer Segment", "Customer Segment")),
        y: axis(("Count", "Count")),
        color: Some(axis(("Customer Segment", "Customer Segment"))),
        palette: Palette::RdBu,
        continuous_color: false,
        show_legend: true,
        points,
    })
}
