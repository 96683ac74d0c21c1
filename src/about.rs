use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct About {
    pub title: &'static str,
    pub body: &'static str,
}

pub const ABOUT: About = About {
    title: "LibTech Database Dashboard",
    body: "\
This service provides an interface to the LibTech database through predefined \
queries, views, functions and stored procedures.

Features:
- Book Rentals & Branch Performance: top borrowed books, branch rentals and overdue books.
- Customer Insights: customer spending, segmentation and penalties.
- Supplier & Revenue Analysis: supplier performance and revenue by branch.
- Staff & Inventory Management: staff workload and inventory levels.
- Charts: report results carry chart descriptors with colours and legends.
- View All Tables: complete data from the key tables of each category.
- Advanced Operations: book availability, inventory value, stock transfers between branches and borrowing chains.
- Add Data: insert new records and update borrow status.
- Security: passcodes are stored encrypted.

How to use:
1. List the categories with GET /api/categories (or `libtech reports`).
2. Run a report with POST /api/reports/<category>/<report> (or `libtech run <report>`).
3. View a whole table with GET /api/tables/<category>/<table>.
4. Add data with POST /api/forms/<form> (or `libtech submit <form>`).
",
};
