use std::fmt::Display;

use rust_decimal::Decimal;
use time::{Date, Month};

/// A bound statement parameter. Backends adapt each variant to the type the
/// database infers for its placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Date(Date),
}

impl SqlValue {
    pub fn text(value: impl Into<String>) -> Self {
        SqlValue::Text(value.into())
    }

    /// Empty strings become `Null`.
    pub fn optional_text(value: &str) -> Self {
        if value.is_empty() {
            SqlValue::Null
        } else {
            SqlValue::Text(value.to_string())
        }
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::Text(s) => write!(f, "'{}'", s),
            SqlValue::Date(d) => write!(f, "{}", d),
        }
    }
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<Date> {
    let mut parts = s.trim().splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}
