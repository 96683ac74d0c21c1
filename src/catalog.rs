//! The fixed registry of named reports, grouped by category.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    Text,
    Integer { min: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: ParamKind::Text,
        }
    }

    const fn integer(key: &'static str, label: &'static str, min: i64) -> Self {
        Self {
            key,
            label,
            kind: ParamKind::Integer { min },
        }
    }
}

/// How a report's statement is run and its result presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportKind {
    /// Rows shown as a table, with a chart when one is mapped.
    Table,
    /// Scalar function whose first cell answers yes/no.
    Availability,
    /// Scalar function whose first cell is a value.
    InventoryValue,
    /// Stored procedure call; no rows.
    Procedure { name: &'static str },
    /// Recursive chain query, always charted.
    BorrowingChain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDefinition {
    pub name: &'static str,
    pub slug: String,
    #[serde(skip)]
    pub sql: &'static str,
    pub params: Vec<ParamSpec>,
    pub kind: ReportKind,
}

impl ReportDefinition {
    fn new(name: &'static str, sql: &'static str) -> Self {
        Self {
            name,
            slug: slugify(name),
            sql,
            params: Vec::new(),
            kind: ReportKind::Table,
        }
    }

    /// A stored-procedure report; the `CALL` statement is built from its
    /// name and arity when it runs.
    fn procedure(name: &'static str, procedure: &'static str, params: Vec<ParamSpec>) -> Self {
        Self::new(name, "").with_params(ReportKind::Procedure { name: procedure }, params)
    }

    fn with_params(mut self, kind: ReportKind, params: Vec<ParamSpec>) -> Self {
        self.kind = kind;
        self.params = params;
        self
    }

    pub fn requires_params(&self) -> bool {
        !self.params.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportCategory {
    pub name: &'static str,
    pub slug: String,
    pub reports: Vec<ReportDefinition>,
    pub view_all_tables: Vec<&'static str>,
}

impl ReportCategory {
    fn new(name: &'static str, reports: Vec<ReportDefinition>, view_all_tables: Vec<&'static str>) -> Self {
        Self {
            name,
            slug: slugify(name),
            reports,
            view_all_tables,
        }
    }

    /// Looks a report up by display name or slug.
    pub fn report(&self, key: &str) -> Option<&ReportDefinition> {
        self.reports.iter().find(|r| r.name == key || r.slug == key)
    }

    pub fn allows_table(&self, table: &str) -> bool {
        self.view_all_tables.contains(&table)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub categories: Vec<ReportCategory>,
}

/// Lowercase, with every run of non-alphanumerics collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// `books_for_rent` -> `Books For Rent`
pub fn table_title(table: &str) -> String {
    table
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl Catalog {
    pub fn category(&self, key: &str) -> Option<&ReportCategory> {
        self.categories.iter().find(|c| c.name == key || c.slug == key)
    }

    /// Finds a report by name or slug across every category.
    pub fn find_report(&self, key: &str) -> Option<(&ReportCategory, &ReportDefinition)> {
        self.categories
            .iter()
            .find_map(|c| c.report(key).map(|r| (c, r)))
    }

    pub fn standard() -> Self {
        Self {
            categories: vec![
                ReportCategory::new(
                    "Book Rentals & Branch Performance",
                    vec![
                        ReportDefinition::new(TOP_BORROWED_BOOKS, TOP_BORROWED_BOOKS_SQL),
                        ReportDefinition::new(OVERDUE_BORROWS, OVERDUE_BORROWS_SQL),
                        ReportDefinition::new(BUSIEST_BRANCH, BUSIEST_BRANCH_SQL),
                    ],
                    vec!["authentication_system", "books_for_rent", "libraryy"],
                ),
                ReportCategory::new(
                    "Customer Insights",
                    vec![
                        ReportDefinition::new(CUSTOMER_SPENDING, CUSTOMER_SPENDING_SQL),
                        ReportDefinition::new(CUSTOMER_SEGMENTS, CUSTOMER_SEGMENTS_SQL),
                        ReportDefinition::new(CUSTOMERS_WITH_PENALTIES, CUSTOMERS_WITH_PENALTIES_SQL),
                    ],
                    vec!["customer", "authentication_system"],
                ),
                ReportCategory::new(
                    "Supplier & Revenue Analysis",
                    vec![
                        ReportDefinition::new(TOP_SUPPLIERS, TOP_SUPPLIERS_SQL),
                        ReportDefinition::new(BRANCH_REVENUE, BRANCH_REVENUE_SQL),
                        ReportDefinition::new(SUPPLY_SUMMARY, SUPPLY_SUMMARY_SQL),
                    ],
                    vec!["supplier", "publisher", "items", "books_for_sale"],
                ),
                ReportCategory::new(
                    "Staff & Inventory Management",
                    vec![
                        ReportDefinition::new(TOP_MANAGER_BY_ITEMS, TOP_MANAGER_BY_ITEMS_SQL),
                        ReportDefinition::new(LOW_INVENTORY, LOW_INVENTORY_SQL),
                        ReportDefinition::new(BORROWED_AND_BOUGHT, BORROWED_AND_BOUGHT_SQL),
                        ReportDefinition::new(BUSIEST_LIBRARIANS, BUSIEST_LIBRARIANS_SQL),
                        ReportDefinition::new(BOOK_AVAILABILITY, BOOK_AVAILABILITY_SQL).with_params(
                            ReportKind::Availability,
                            vec![
                                ParamSpec::text("book_title", "Book Title"),
                                ParamSpec::text("branch_id", "Branch ID"),
                            ],
                        ),
                        ReportDefinition::new(INVENTORY_VALUE, INVENTORY_VALUE_SQL).with_params(
                            ReportKind::InventoryValue,
                            vec![ParamSpec::text("branch_id", "Branch ID")],
                        ),
                        ReportDefinition::procedure(
                            TRANSFER_STOCK,
                            "transfer_book_stock",
                            vec![
                                ParamSpec::text("from_branch_id", "From Branch ID"),
                                ParamSpec::text("to_branch_id", "To Branch ID"),
                                ParamSpec::text("book_isbn", "Book ISBN (13 characters)"),
                                ParamSpec::integer("transfer_qty", "Transfer Quantity", 1),
                            ],
                        ),
                        ReportDefinition::new(BORROWING_CHAIN, BORROWING_CHAIN_SQL).with_params(
                            ReportKind::BorrowingChain,
                            vec![ParamSpec::text("book_id", "Book ID (Format: ISBN#ID)")],
                        ),
                    ],
                    vec!["staff", "dependents"],
                ),
            ],
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

pub const TOP_BORROWED_BOOKS: &str = "Top 5 Borrowed Books in the Last Year";
pub const OVERDUE_BORROWS: &str = "Customers with Unreturned Books Past Due Date";
pub const BUSIEST_BRANCH: &str = "Branch with the Highest Number of Rentals";
pub const CUSTOMER_SPENDING: &str = "Total Amount Spent by Each Customer & Favorite Branch";
pub const CUSTOMER_SEGMENTS: &str = "Categorize Customers into Segments";
pub const CUSTOMERS_WITH_PENALTIES: &str = "View Customers With Penalties";
pub const TOP_SUPPLIERS: &str = "Top 5 Suppliers by Revenue";
pub const BRANCH_REVENUE: &str = "Total Revenue from Book and Item Sales by Library Branch";
pub const SUPPLY_SUMMARY: &str = "View Supplier Supply Summary";
pub const TOP_MANAGER_BY_ITEMS: &str = "Staff Managing Libraries with Highest Number of Items";
pub const LOW_INVENTORY: &str = "Library Branches Running Low on Inventory";
pub const BORROWED_AND_BOUGHT: &str = "Customers Who Borrowed and Bought the Same Book Title";
pub const BUSIEST_LIBRARIANS: &str = "Retrieve Librarians Working the Most Hours Across All Branches";
pub const BOOK_AVAILABILITY: &str = "Check Book Availability";
pub const INVENTORY_VALUE: &str = "Calculate Total Inventory Value";
pub const TRANSFER_STOCK: &str = "Transfer Book Stock Between Branches";
pub const BORROWING_CHAIN: &str = "Track Borrowing Chains for a Book";

const TOP_BORROWED_BOOKS_SQL: &str = "
    SELECT br.title, COUNT(b.bookid) AS borrow_count
    FROM borrows b
    JOIN books_for_rent br ON b.bookid = br.bookid
    WHERE b.date_out >= CURRENT_DATE - INTERVAL '1 year'
    GROUP BY br.title
    ORDER BY borrow_count DESC
    LIMIT 5;
";

const OVERDUE_BORROWS_SQL: &str = "
    SELECT
        c.username,
        c.first_name,
        c.last_name,
        b.bookid,
        br.title,
        b.due_date,
        b.penalty,
        (b.penalty + (CURRENT_DATE - b.due_date) * 0.5) AS fine_amount
    FROM borrows b
    JOIN customer c ON b.username = c.username
    JOIN books_for_rent br ON b.bookid = br.bookid
    WHERE b.status = 'Borrowed'
    AND b.due_date < CURRENT_DATE;
";

const BUSIEST_BRANCH_SQL: &str = "
    SELECT b.branchid, COUNT(br.bookid) AS rentals_count
    FROM borrows br
    JOIN books_for_rent b ON br.bookid = b.bookid
    GROUP BY b.branchid
    ORDER BY rentals_count DESC
    LIMIT 1;
";

const CUSTOMER_SPENDING_SQL: &str = "
    SELECT
        c.username,
        c.first_name,
        c.last_name,
        COALESCE(SUM(b.quantity * bs.price), 0) AS total_book_spending,
        COALESCE(SUM(i.quantity * it.price), 0) AS total_item_spending,
        (SELECT branchid
         FROM buys_books b2
         WHERE b2.username = c.username
         GROUP BY branchid
         ORDER BY COUNT(*) DESC
         LIMIT 1) AS favorite_branch
    FROM customer c
    LEFT JOIN buys_books b ON c.username = b.username
    LEFT JOIN books_for_sale bs ON b.isbn = bs.isbn
    LEFT JOIN purchases_items i ON c.username = i.username
    LEFT JOIN items it ON i.barcode = it.barcode
    GROUP BY c.username, c.first_name, c.last_name;
";

const CUSTOMER_SEGMENTS_SQL: &str = "
    WITH customer_spend AS (
        SELECT
            c.username,
            COALESCE(SUM(b.quantity * bs.price), 0) + COALESCE(SUM(i.quantity * it.price), 0) AS total_spending
        FROM customer c
        LEFT JOIN buys_books b ON c.username = b.username
        LEFT JOIN books_for_sale bs ON b.isbn = bs.isbn
        LEFT JOIN purchases_items i ON c.username = i.username
        LEFT JOIN items it ON i.barcode = it.barcode
        GROUP BY c.username
    )
    SELECT
        username,
        CASE
            WHEN total_spending > 500 THEN 'High Spender'
            WHEN total_spending BETWEEN 200 AND 500 THEN 'Medium Spender'
            ELSE 'Low Spender'
        END AS customer_segment
    FROM customer_spend;
";

const CUSTOMERS_WITH_PENALTIES_SQL: &str = "SELECT * FROM Customers_With_Penalties;";

const TOP_SUPPLIERS_SQL: &str = "
    SELECT s.supp_name, SUM(i.price * p.quantity) AS total_revenue
    FROM purchases_items p
    JOIN items i ON p.barcode = i.barcode
    JOIN supplier s ON i.supp_name = s.supp_name
    GROUP BY s.supp_name
    ORDER BY total_revenue DESC
    LIMIT 5;
";

const BRANCH_REVENUE_SQL: &str = "
    SELECT
        l.branchid,
        COALESCE(SUM(bb.quantity * bfs.price), 0) AS book_sales_revenue,
        COALESCE(SUM(pi.quantity * i.price), 0) AS item_sales_revenue,
        COALESCE(SUM(bb.quantity * bfs.price), 0) + COALESCE(SUM(pi.quantity * i.price), 0) AS total_revenue
    FROM libraryy l
    LEFT JOIN buys_books bb ON l.branchid = bb.branchid
    LEFT JOIN books_for_sale bfs ON bb.isbn = bfs.isbn
    LEFT JOIN purchases_items pi ON l.branchid = pi.branchid
    LEFT JOIN items i ON pi.barcode = i.barcode
    GROUP BY l.branchid
    ORDER BY total_revenue DESC;
";

const SUPPLY_SUMMARY_SQL: &str = "SELECT * FROM Supplier_Supply_Summary;";

const TOP_MANAGER_BY_ITEMS_SQL: &str = "
    SELECT s.first_name, s.last_name, s.branchid, SUM(si.qty_stored) AS total_items
    FROM staff s
    JOIN stores_items si ON s.branchid = si.branchid
    WHERE s.post = 'Manager'
    GROUP BY s.first_name, s.last_name, s.branchid
    ORDER BY total_items DESC
    LIMIT 1;
";

const LOW_INVENTORY_SQL: &str = "
    SELECT si.branchid, l.address, SUM(si.qty_stored) AS total_items, SUM(sb.number_of_copies) AS total_books
    FROM stores_items si
    JOIN libraryy l ON si.branchid = l.branchid
    JOIN stores_booksforsale sb ON si.branchid = sb.branchid
    GROUP BY si.branchid, l.address
    HAVING SUM(si.qty_stored) + SUM(sb.number_of_copies) < 40;
";

const BORROWED_AND_BOUGHT_SQL: &str = "
    SELECT DISTINCT
        bo.username,
        bfr.title,
        bb.date_time AS purchase_date,
        bo.date_out AS borrow_date
    FROM borrows bo
    JOIN books_for_rent bfr ON bo.bookid = bfr.bookid
    JOIN buys_books bb ON bo.username = bb.username AND bfr.isbn = bb.isbn;
";

const BUSIEST_LIBRARIANS_SQL: &str = "
    SELECT s.first_name, s.last_name, s.branchid, s.hours
    FROM staff s
    WHERE s.post = 'Librarian'
    ORDER BY s.hours DESC
    LIMIT 5;
";

const BOOK_AVAILABILITY_SQL: &str = "SELECT check_book_availability($1, $2);";

const INVENTORY_VALUE_SQL: &str = "SELECT total_inventory_value($1);";

// Each level is a later borrower of the same copy, taken out after the
// previous level's due date.
const BORROWING_CHAIN_SQL: &str = "
    WITH RECURSIVE Borrowing_Chain AS (
        SELECT
            b.username,
            c.first_name,
            c.last_name,
            b.bookid,
            b.date_out,
            b.due_date,
            b.penalty,
            1 AS chain_level
        FROM borrows b
        JOIN customer c ON b.username = c.username
        WHERE b.bookid = $1

        UNION ALL

        SELECT
            next_borrower.username,
            c.first_name,
            c.last_name,
            next_borrower.bookid,
            next_borrower.date_out,
            next_borrower.due_date,
            next_borrower.penalty,
            bc.chain_level + 1
        FROM borrows next_borrower
        JOIN Borrowing_Chain bc
            ON next_borrower.bookid = bc.bookid
            AND next_borrower.date_out > bc.due_date
        JOIN customer c ON next_borrower.username = c.username
    )
    SELECT username, first_name, last_name, bookid, date_out, due_date, penalty, chain_level
    FROM Borrowing_Chain
    ORDER BY chain_level, date_out;
";
