//! "Add Data" forms: one field per column, one statement per submission.

use std::{collections::BTreeMap, str::FromStr};

use libtech_core::{parse_date, SqlValue};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;
use time::{Date, OffsetDateTime};

use crate::catalog::slugify;

const ALL_FIELDS: &str = "Please fill in all fields.";
const REQUIRED_FIELDS: &str = "Please fill in all required fields.";

const SEX: &[&str] = &["M", "F"];
const BLOOD_TYPES: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
const POSTS: &[&str] = &["Manager", "Librarian", "Assistant"];
const RELATIONSHIPS: &[&str] = &["Spouse", "Child", "Parent", "Other"];
const BORROW_STATUSES: &[&str] = &["Borrowed", "Returned"];

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("{message}")]
    MissingFields {
        message: &'static str,
        fields: Vec<String>,
    },
    #[error("{label}: {reason}")]
    InvalidField { label: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    /// Stored encrypted with the configured symmetric key.
    Password,
    Select { options: &'static [&'static str] },
    Integer { min: i64 },
    Decimal { min: Decimal, max: Option<Decimal> },
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub column: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

fn field(column: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        column,
        label,
        kind,
        required: true,
    }
}

fn optional(column: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        required: false,
        ..field(column, label, kind)
    }
}

fn select(options: &'static [&'static str]) -> FieldKind {
    FieldKind::Select { options }
}

fn int(min: i64) -> FieldKind {
    FieldKind::Integer { min }
}

fn decimal(min: Decimal) -> FieldKind {
    FieldKind::Decimal { min, max: None }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OnConflict {
    Ignore,
    /// Adds the incoming value to the stored one.
    Accumulate { column: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormAction {
    Insert {
        conflict_key: &'static [&'static str],
        on_conflict: OnConflict,
    },
    Update {
        set: &'static [&'static str],
        key: &'static [&'static str],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDefinition {
    pub name: &'static str,
    pub slug: String,
    pub title: &'static str,
    pub table: &'static str,
    pub fields: Vec<FieldSpec>,
    pub action: FormAction,
    #[serde(skip)]
    pub missing_message: &'static str,
    #[serde(skip)]
    pub success_message: &'static str,
}

/// A statement ready to hand to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl FormDefinition {
    fn insert(
        name: &'static str,
        title: &'static str,
        table: &'static str,
        conflict_key: &'static [&'static str],
        fields: Vec<FieldSpec>,
    ) -> Self {
        let missing_message = if fields.iter().all(|f| f.required) {
            ALL_FIELDS
        } else {
            REQUIRED_FIELDS
        };
        Self {
            name,
            slug: slugify(name),
            title,
            table,
            fields,
            action: FormAction::Insert {
                conflict_key,
                on_conflict: OnConflict::Ignore,
            },
            missing_message,
            success_message: "Operation executed successfully.",
        }
    }

    fn accumulating(mut self, column: &'static str) -> Self {
        if let FormAction::Insert { on_conflict, .. } = &mut self.action {
            *on_conflict = OnConflict::Accumulate { column };
        }
        self
    }

    fn missing(mut self, message: &'static str) -> Self {
        self.missing_message = message;
        self
    }

    /// Validates `inputs` (keyed by column) and builds the statement.
    pub fn prepare(
        &self,
        inputs: &BTreeMap<String, String>,
        encryption_key: &str,
    ) -> Result<PreparedStatement, FormError> {
        self.prepare_on(inputs, encryption_key, OffsetDateTime::now_utc().date())
    }

    /// As [`prepare`](Self::prepare), with omitted date fields defaulting to `today`.
    pub fn prepare_on(
        &self,
        inputs: &BTreeMap<String, String>,
        encryption_key: &str,
        today: Date,
    ) -> Result<PreparedStatement, FormError> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.required && inputs.get(f.column).map_or(true, |v| v.is_empty()))
            .map(|f| f.column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(FormError::MissingFields {
                message: self.missing_message,
                fields: missing,
            });
        }

        let mut values = BTreeMap::new();
        for f in &self.fields {
            let raw = inputs.get(f.column).map(String::as_str).unwrap_or("");
            values.insert(f.column, parse_field(f, raw, today)?);
        }

        match &self.action {
            FormAction::Insert {
                conflict_key,
                on_conflict,
            } => Ok(self.insert_statement(values, conflict_key, on_conflict, encryption_key)),
            FormAction::Update { set, key } => Ok(self.update_statement(values, set, key)),
        }
    }

    fn insert_statement(
        &self,
        mut values: BTreeMap<&'static str, SqlValue>,
        conflict_key: &[&str],
        on_conflict: &OnConflict,
        encryption_key: &str,
    ) -> PreparedStatement {
        let mut params = Vec::with_capacity(self.fields.len() + 1);
        let mut placeholders = Vec::with_capacity(self.fields.len());

        for f in &self.fields {
            params.push(values.remove(f.column).unwrap_or(SqlValue::Null));
            let n = params.len();
            if f.kind == FieldKind::Password {
                params.push(SqlValue::text(encryption_key));
                placeholders.push(format!("pgp_sym_encrypt(${}, ${})", n, n + 1));
            } else {
                placeholders.push(format!("${}", n));
            }
        }

        let columns: Vec<&str> = self.fields.iter().map(|f| f.column).collect();
        let resolution = match on_conflict {
            OnConflict::Ignore => "DO NOTHING".to_string(),
            OnConflict::Accumulate { column } => format!(
                "DO UPDATE SET {col} = {table}.{col} + EXCLUDED.{col}",
                col = column,
                table = self.table
            ),
        };

        PreparedStatement {
            sql: format!(
                "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {};",
                self.table,
                columns.join(", "),
                placeholders.join(", "),
                conflict_key.join(", "),
                resolution
            ),
            params,
        }
    }

    fn update_statement(
        &self,
        mut values: BTreeMap<&'static str, SqlValue>,
        set: &[&'static str],
        key: &[&'static str],
    ) -> PreparedStatement {
        let mut params = Vec::with_capacity(set.len() + key.len());
        let mut assignments = Vec::with_capacity(set.len());
        let mut filters = Vec::with_capacity(key.len());

        for column in set {
            params.push(values.remove(column).unwrap_or(SqlValue::Null));
            assignments.push(format!("{} = ${}", column, params.len()));
        }
        for column in key {
            params.push(values.remove(column).unwrap_or(SqlValue::Null));
            filters.push(format!("{} = ${}", column, params.len()));
        }

        PreparedStatement {
            sql: format!(
                "UPDATE {} SET {} WHERE {};",
                self.table,
                assignments.join(", "),
                filters.join(" AND ")
            ),
            params,
        }
    }
}

fn invalid(f: &FieldSpec, reason: impl Into<String>) -> FormError {
    FormError::InvalidField {
        label: f.label.to_string(),
        reason: reason.into(),
    }
}

/// What an untouched input submits: numbers at their minimum, dates as
/// today, and nothing for free text.
fn default_value(kind: &FieldKind, today: Date) -> SqlValue {
    match kind {
        FieldKind::Integer { min } => SqlValue::Int(*min),
        FieldKind::Decimal { min, .. } => SqlValue::Decimal(*min),
        FieldKind::Date => SqlValue::Date(today),
        _ => SqlValue::Null,
    }
}

fn parse_field(f: &FieldSpec, raw: &str, today: Date) -> Result<SqlValue, FormError> {
    if raw.is_empty() {
        return Ok(default_value(&f.kind, today));
    }
    match &f.kind {
        FieldKind::Text | FieldKind::TextArea | FieldKind::Password => Ok(SqlValue::text(raw)),
        FieldKind::Select { options } => {
            if options.contains(&raw) {
                Ok(SqlValue::text(raw))
            } else {
                Err(invalid(f, format!("must be one of {}", options.join(", "))))
            }
        }
        FieldKind::Integer { min } => {
            let value = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(f, "must be a whole number"))?;
            if value < *min {
                return Err(invalid(f, format!("must be at least {}", min)));
            }
            Ok(SqlValue::Int(value))
        }
        FieldKind::Decimal { min, max } => {
            let value = Decimal::from_str(raw.trim()).map_err(|_| invalid(f, "must be a number"))?;
            if value < *min {
                return Err(invalid(f, format!("must be at least {}", min)));
            }
            if let Some(max) = max {
                if value > *max {
                    return Err(invalid(f, format!("must be at most {}", max)));
                }
            }
            Ok(SqlValue::Decimal(value))
        }
        FieldKind::Date => parse_date(raw)
            .map(SqlValue::Date)
            .ok_or_else(|| invalid(f, "must be a date (YYYY-MM-DD)")),
    }
}

/// Every form, in menu order.
pub fn standard_forms() -> Vec<FormDefinition> {
    use FieldKind::{Date, Password, Text, TextArea};

    vec![
        FormDefinition::insert(
            "Authentication_System",
            "Add Authentication System Data",
            "authentication_system",
            &["email"],
            vec![field("email", "Email", Text), field("passcode", "Passcode", Password)],
        ),
        FormDefinition::insert(
            "Customer",
            "Add Customer Data",
            "customer",
            &["username"],
            vec![
                field("username", "Username", Text),
                field("phone_number", "Phone Number (e.g., 12/345678)", Text),
                optional("address", "Address", TextArea),
                field("sex", "Sex", select(SEX)),
                field("first_name", "First Name", Text),
                field("last_name", "Last Name", Text),
                optional("ct_email", "Ct_Email (Authentication_System Email)", Text),
            ],
        ),
        FormDefinition::insert(
            "Libraryy",
            "Add Library Branch Data",
            "libraryy",
            &["branchid"],
            vec![
                field("branchid", "Branch ID (e.g., LIBTECH01)", Text),
                field("address", "Address", TextArea),
                field("phone_number", "Phone Number (e.g., 12/345678)", Text),
            ],
        ),
        FormDefinition::insert(
            "Staff",
            "Add Staff Data",
            "staff",
            &["ssn"],
            vec![
                field("ssn", "SSN", Text),
                field("first_name", "First Name", Text),
                field("last_name", "Last Name", Text),
                optional("dob", "Date of Birth", Date),
                field("blood_type", "Blood Type", select(BLOOD_TYPES)),
                field("address", "Address", TextArea),
                field("salary", "Salary", decimal(dec!(0.01))),
                field("post", "Post", select(POSTS)),
                optional("super_ssn", "Supervisor SSN", Text),
                field("st_email", "Staff Email (Authentication_System Email)", Text),
                field("branchid", "Branch ID", Text),
                field("hours", "Hours Worked", int(0)),
            ],
        ),
        FormDefinition::insert(
            "Dependents",
            "Add Dependents Data",
            "dependents",
            &["ssn", "dep_name"],
            vec![
                field("ssn", "Staff SSN", Text),
                field("dep_name", "Dependent Name", Text),
                field("relationship", "Relationship", select(RELATIONSHIPS)),
                field("sex", "Sex", select(SEX)),
            ],
        ),
        FormDefinition::insert(
            "Supplier",
            "Add Supplier Data",
            "supplier",
            &["supp_name", "address"],
            vec![
                field("supp_name", "Supplier Name", Text),
                field("address", "Address", TextArea),
                field("phone_number", "Phone Number (e.g., 12/345678)", Text),
            ],
        ),
        FormDefinition::insert(
            "Publisher",
            "Add Publisher Data",
            "publisher",
            &["publisher_name"],
            vec![
                field("publisher_name", "Publisher Name", Text),
                field("address", "Address", TextArea),
                field("phone_number", "Phone Number (e.g., 12/345678)", Text),
            ],
        ),
        FormDefinition::insert(
            "Items",
            "Add Items Data",
            "items",
            &["barcode"],
            vec![
                field("barcode", "Barcode", Text),
                field("items_name", "Item Name", Text),
                optional("age_group", "Age Group", Text),
                field("price", "Price", decimal(dec!(0.01))),
                optional("genre", "Genre", Text),
                optional("supp_name", "Supplier Name", Text),
                optional("supp_address", "Supplier Address", Text),
                optional("qty_supplied", "Quantity Supplied", int(0)),
                optional("date_supplied", "Date Supplied", Date),
            ],
        ),
        FormDefinition::insert(
            "Books_for_Sale",
            "Add Books for Sale Data",
            "books_for_sale",
            &["isbn"],
            vec![
                field("isbn", "ISBN (13 characters)", Text),
                field("title", "Title", Text),
                field("genre", "Genre", Text),
                field("price", "Price", decimal(dec!(0.01))),
                optional("translator", "Translator", Text),
                field("edition", "Edition", int(1)),
                field("pages", "Pages", int(1)),
                field("lang", "Language", Text),
                optional("publisher_name", "Publisher Name", Text),
            ],
        ),
        FormDefinition::insert(
            "Books_for_Rent",
            "Add Books for Rent Data",
            "books_for_rent",
            &["bookid"],
            vec![
                field("bookid", "Book ID (Format: ISBN#ID)", Text),
                field("isbn", "ISBN (13 characters)", Text),
                field("title", "Title", Text),
                field("genre", "Genre", Text),
                field("price", "Price", decimal(dec!(0.01))),
                optional("translator", "Translator", Text),
                field("edition", "Edition", int(1)),
                field("pages", "Pages", int(1)),
                field("lang", "Language", Text),
                optional("publisher_name", "Publisher Name", Text),
                field("shelf_no", "Shelf Number", int(1)),
                field("row_no", "Row Number", int(1)),
                field("branchid", "Branch ID", Text),
            ],
        ),
        FormDefinition::insert(
            "Authors_BookSale",
            "Add Authors for Book Sale Data",
            "authors_booksale",
            &["isbn", "author_name"],
            vec![
                field("isbn", "ISBN (13 characters)", Text),
                field("author_name", "Author Name", Text),
            ],
        ),
        FormDefinition::insert(
            "Authors_BookRent",
            "Add Authors for Book Rent Data",
            "authors_bookrent",
            &["bookid", "author_name"],
            vec![
                field("bookid", "Book ID (Format: ISBN#ID)", Text),
                field("author_name", "Author Name", Text),
            ],
        ),
        FormDefinition::insert(
            "Stores_Items",
            "Add Stores Items Data",
            "stores_items",
            &["branchid", "barcode"],
            vec![
                field("branchid", "Branch ID", Text),
                field("barcode", "Barcode", Text),
                field("qty_stored", "Quantity Stored", int(0)),
            ],
        )
        .accumulating("qty_stored"),
        FormDefinition::insert(
            "Stores_Booksforsale",
            "Add Stores Booksforsale Data",
            "stores_booksforsale",
            &["branchid", "isbn"],
            vec![
                field("branchid", "Branch ID", Text),
                field("isbn", "ISBN (13 characters)", Text),
                field("number_of_copies", "Number of Copies", int(0)),
            ],
        )
        .accumulating("number_of_copies"),
        FormDefinition::insert(
            "Buys_Books",
            "Add Buys Books Data",
            "buys_books",
            &["username", "branchid", "isbn", "date_time"],
            vec![
                field("username", "Username", Text),
                field("branchid", "Branch ID", Text),
                field("isbn", "ISBN (13 characters)", Text),
                field("quantity", "Quantity", int(0)),
                field("date_time", "Date and Time", Date),
            ],
        )
        .missing(REQUIRED_FIELDS),
        FormDefinition::insert(
            "Purchases_Items",
            "Add Purchases Items Data",
            "purchases_items",
            &["username", "branchid", "barcode", "date_time"],
            vec![
                field("username", "Username", Text),
                field("branchid", "Branch ID", Text),
                field("barcode", "Barcode", Text),
                field("quantity", "Quantity", int(0)),
                field("date_time", "Date and Time", Date),
            ],
        )
        .missing(REQUIRED_FIELDS),
        FormDefinition::insert(
            "Borrows",
            "Add Borrows Data",
            "borrows",
            &["username", "bookid", "date_out"],
            vec![
                field("username", "Username", Text),
                field("bookid", "Book ID (Format: ISBN#ID)", Text),
                field("date_out", "Date Out", Date),
                field("due_date", "Due Date", Date),
                optional("penalty", "Penalty", decimal(dec!(0.0))),
                field("status", "Status", select(BORROW_STATUSES)),
            ],
        ),
        FormDefinition::insert(
            "Sale_to_Rent",
            "Add Sale to Rent Data",
            "sale_to_rent",
            &["bookid", "isbn"],
            vec![
                field("bookid", "Book ID (Format: ISBN#ID)", Text),
                field("isbn", "ISBN (13 characters)", Text),
                field("date_moved", "Date Moved", Date),
                optional(
                    "discount",
                    "Discount (%)",
                    FieldKind::Decimal {
                        min: dec!(0.0),
                        max: Some(dec!(100.0)),
                    },
                ),
            ],
        ),
        FormDefinition {
            name: "Update Borrows Status",
            slug: slugify("Update Borrows Status"),
            title: "Update Borrows Status",
            table: "borrows",
            fields: vec![
                field("username", "Username", Text),
                field("bookid", "Book ID (Format: ISBN#ID)", Text),
                field("date_out", "Date Out", Date),
                field("status", "New Status", select(BORROW_STATUSES)),
            ],
            action: FormAction::Update {
                set: &["status"],
                key: &["username", "bookid", "date_out"],
            },
            missing_message: REQUIRED_FIELDS,
            success_message: "Borrow status updated successfully.",
        },
    ]
}

/// Looks a form up by name or slug.
pub fn find_form<'a>(forms: &'a [FormDefinition], key: &str) -> Option<&'a FormDefinition> {
    forms.iter().find(|f| f.name == key || f.slug == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn inputs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn form(name: &str) -> FormDefinition {
        find_form(&standard_forms(), name).cloned().unwrap()
    }

    #[test]
    fn nineteen_forms_in_menu_order() {
        let forms = standard_forms();
        assert_eq!(forms.len(), 19);
        assert_eq!(forms[0].name, "Authentication_System");
        assert_eq!(forms[18].name, "Update Borrows Status");
        assert_eq!(forms[8].slug, "books-for-sale");
    }

    #[test]
    fn passcodes_are_encrypted_with_the_configured_key() {
        let stmt = form("Authentication_System")
            .prepare(&inputs(&[("email", "a@b.c"), ("passcode", "hunter2")]), "k3y")
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO authentication_system (email, passcode) VALUES ($1, pgp_sym_encrypt($2, $3)) ON CONFLICT (email) DO NOTHING;"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::text("a@b.c"), SqlValue::text("hunter2"), SqlValue::text("k3y")]
        );
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let err = form("Libraryy")
            .prepare(&inputs(&[("branchid", "LIBTECH09"), ("address", "")]), "k")
            .unwrap_err();
        assert_eq!(
            err,
            FormError::MissingFields {
                message: "Please fill in all fields.",
                fields: vec!["address".to_string(), "phone_number".to_string()],
            }
        );
    }

    #[test]
    fn optional_fields_become_null() {
        let stmt = form("Customer")
            .prepare(
                &inputs(&[
                    ("username", "ana"),
                    ("phone_number", "12/345678"),
                    ("sex", "F"),
                    ("first_name", "Ana"),
                    ("last_name", "Haddad"),
                ]),
                "k",
            )
            .unwrap();
        assert_eq!(stmt.params[2], SqlValue::Null);
        assert_eq!(stmt.params[6], SqlValue::Null);
        assert!(stmt.sql.ends_with("ON CONFLICT (username) DO NOTHING;"));
    }

    #[test]
    fn omitted_numbers_and_dates_take_their_input_defaults() {
        let today = date!(2024 - 05 - 20);
        let stmt = form("Borrows")
            .prepare_on(
                &inputs(&[
                    ("username", "ana"),
                    ("bookid", "X#1"),
                    ("date_out", "2024-05-01"),
                    ("due_date", "2024-05-15"),
                    ("status", "Borrowed"),
                ]),
                "k",
                today,
            )
            .unwrap();
        assert_eq!(stmt.params[4], SqlValue::Decimal(dec!(0)));

        let stmt = form("Items")
            .prepare_on(
                &inputs(&[("barcode", "BC-9"), ("items_name", "Bookmark"), ("price", "1.50")]),
                "k",
                today,
            )
            .unwrap();
        assert_eq!(stmt.params[2], SqlValue::Null);
        assert_eq!(stmt.params[7], SqlValue::Int(0));
        assert_eq!(stmt.params[8], SqlValue::Date(today));
    }

    #[test]
    fn select_fields_reject_unknown_options() {
        let err = form("Customer")
            .prepare(
                &inputs(&[
                    ("username", "ana"),
                    ("phone_number", "1"),
                    ("sex", "X"),
                    ("first_name", "Ana"),
                    ("last_name", "H"),
                ]),
                "k",
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Sex: must be one of M, F");
    }

    #[test]
    fn stock_forms_accumulate_on_conflict() {
        let stmt = form("Stores_Items")
            .prepare(
                &inputs(&[("branchid", "LIBTECH01"), ("barcode", "B1"), ("qty_stored", "5")]),
                "k",
            )
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO stores_items (branchid, barcode, qty_stored) VALUES ($1, $2, $3) ON CONFLICT (branchid, barcode) DO UPDATE SET qty_stored = stores_items.qty_stored + EXCLUDED.qty_stored;"
        );
        assert_eq!(stmt.params[2], SqlValue::Int(5));
    }

    #[test]
    fn numeric_bounds_are_enforced() {
        let err = form("Books_for_Sale")
            .prepare(
                &inputs(&[
                    ("isbn", "9780000000001"),
                    ("title", "Dune"),
                    ("genre", "SciFi"),
                    ("price", "12.5"),
                    ("edition", "0"),
                    ("pages", "400"),
                    ("lang", "EN"),
                ]),
                "k",
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Edition: must be at least 1");

        let err = form("Sale_to_Rent")
            .prepare(
                &inputs(&[
                    ("bookid", "9780000000001#1"),
                    ("isbn", "9780000000001"),
                    ("date_moved", "2024-03-01"),
                    ("discount", "120"),
                ]),
                "k",
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Discount (%): must be at most 100.0");
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let err = form("Borrows")
            .prepare(
                &inputs(&[
                    ("username", "ana"),
                    ("bookid", "X#1"),
                    ("date_out", "01/02/2024"),
                    ("due_date", "2024-02-15"),
                    ("status", "Borrowed"),
                ]),
                "k",
            )
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidField { ref label, .. } if label == "Date Out"));
    }

    #[test]
    fn borrow_status_update_sets_then_filters() {
        let stmt = form("update-borrows-status")
            .prepare(
                &inputs(&[
                    ("username", "ana"),
                    ("bookid", "X#1"),
                    ("date_out", "2024-02-01"),
                    ("status", "Returned"),
                ]),
                "k",
            )
            .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE borrows SET status = $1 WHERE username = $2 AND bookid = $3 AND date_out = $4;"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::text("Returned"),
                SqlValue::text("ana"),
                SqlValue::text("X#1"),
                SqlValue::Date(date!(2024 - 02 - 01)),
            ]
        );
    }

    #[test]
    fn missing_message_depends_on_optional_fields() {
        assert_eq!(form("Items").missing_message, "Please fill in all required fields.");
        assert_eq!(form("Dependents").missing_message, "Please fill in all fields.");
        assert_eq!(form("Buys_Books").missing_message, "Please fill in all required fields.");
    }
}
