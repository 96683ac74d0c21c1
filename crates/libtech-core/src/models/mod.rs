use std::{fmt::Display, sync::Arc};

use prettytable::{Cell, Row, Table};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Serialize, Serializer};
use time::{Date, PrimitiveDateTime};

pub mod params;

/// A single cell of a result set, as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(Arc<str>),
    Date(Date),
    Timestamp(PrimitiveDateTime),
    Bytes(Arc<[u8]>),
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Truthiness of a scalar function result: false, zero, empty and null
    /// are all falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            DataValue::Null => false,
            DataValue::Bool(b) => *b,
            DataValue::Int(i) => *i != 0,
            DataValue::Float(f) => *f != 0.0,
            DataValue::Decimal(d) => !d.is_zero(),
            DataValue::Text(s) => !s.is_empty(),
            DataValue::Date(_) | DataValue::Timestamp(_) => true,
            DataValue::Bytes(b) => !b.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Int(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::Decimal(d) => d.to_f64(),
            DataValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            DataValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(Arc::from(value))
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<Decimal> for DataValue {
    fn from(value: Decimal) -> Self {
        DataValue::Decimal(value)
    }
}

impl From<Date> for DataValue {
    fn from(value: Date) -> Self {
        DataValue::Date(value)
    }
}

fn format_timestamp(ts: &PrimitiveDateTime) -> String {
    format!(
        "{} {:02}:{:02}:{:02}",
        ts.date(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

fn format_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

impl Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Null => f.write_str("null"),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Int(i) => write!(f, "{}", i),
            DataValue::Float(v) => write!(f, "{}", v),
            DataValue::Decimal(d) => write!(f, "{}", d),
            DataValue::Text(s) => f.write_str(s),
            DataValue::Date(d) => write!(f, "{}", d),
            DataValue::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
            DataValue::Bytes(b) => f.write_str(&format_bytes(b)),
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataValue::Null => serializer.serialize_none(),
            DataValue::Bool(b) => serializer.serialize_bool(*b),
            DataValue::Int(i) => serializer.serialize_i64(*i),
            DataValue::Float(v) => serializer.serialize_f64(*v),
            DataValue::Decimal(d) => serializer.collect_str(d),
            DataValue::Text(s) => serializer.serialize_str(s),
            DataValue::Date(d) => serializer.collect_str(d),
            DataValue::Timestamp(ts) => serializer.serialize_str(&format_timestamp(ts)),
            DataValue::Bytes(b) => serializer.serialize_str(&format_bytes(b)),
        }
    }
}

/// A transient tabular result: ordered column names plus rows of cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<DataValue>>,
}

impl ResultSet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<DataValue>) -> Self {
        self.push_row(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<DataValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.column_index(n).is_some())
    }

    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a DataValue> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(move |row| row.get(idx)))
    }

    /// The cell at row 0, column 0.
    pub fn first_value(&self) -> Option<&DataValue> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Occurrences of each distinct non-null value in `name`, most frequent
    /// first. Ties keep first-seen order.
    pub fn value_counts(&self, name: &str) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        if let Some(values) = self.column(name) {
            for value in values.filter(|v| !v.is_null()) {
                let key = value.to_string();
                match counts.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((key, 1)),
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}

impl Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table = Table::new();
        table.set_titles(Row::new(self.columns.iter().map(|c| Cell::new(c)).collect()));
        for row in &self.rows {
            table.add_row(Row::new(
                row.iter().map(|v| Cell::new(&v.to_string())).collect(),
            ));
        }
        write!(f, "\n{}\n({} rows)\n", table, self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn segments() -> ResultSet {
        ResultSet::new(["username", "customer_segment"])
            .with_row(vec!["ana".into(), "Low Spender".into()])
            .with_row(vec!["bo".into(), "High Spender".into()])
            .with_row(vec!["cy".into(), "Low Spender".into()])
            .with_row(vec!["di".into(), DataValue::Null])
    }

    #[test]
    fn value_counts_orders_by_frequency_and_skips_nulls() {
        let counts = segments().value_counts("customer_segment");
        assert_eq!(
            counts,
            vec![("Low Spender".to_string(), 2), ("High Spender".to_string(), 1)]
        );
    }

    #[test]
    fn value_counts_of_missing_column_is_empty() {
        assert!(segments().value_counts("nope").is_empty());
    }

    #[test]
    fn has_columns_requires_every_name() {
        let rs = segments();
        assert!(rs.has_columns(&["username", "customer_segment"]));
        assert!(!rs.has_columns(&["username", "total_penalty"]));
    }

    #[test]
    fn truthiness_follows_scalar_semantics() {
        assert!(DataValue::Bool(true).is_truthy());
        assert!(!DataValue::Bool(false).is_truthy());
        assert!(!DataValue::Null.is_truthy());
        assert!(!DataValue::Int(0).is_truthy());
        assert!(DataValue::Decimal(dec!(0.5)).is_truthy());
        assert!(!DataValue::from("").is_truthy());
    }

    #[test]
    fn serializes_decimals_exactly() {
        let rs = ResultSet::new(["branchid", "total_revenue"])
            .with_row(vec!["LIBTECH01".into(), dec!(120.50).into()])
            .with_row(vec!["LIBTECH02".into(), dec!(12345678901234567890.123456789).into()]);
        let json = serde_json::to_value(&rs).unwrap();
        assert_eq!(json["columns"][1], "total_revenue");
        assert_eq!(json["rows"][0][1], "120.50");
        assert_eq!(json["rows"][1][1], "12345678901234567890.123456789");
    }

    #[test]
    fn bytes_render_as_hex() {
        let v = DataValue::Bytes(Arc::from(&[0xc3u8, 0x0d][..]));
        assert_eq!(v.to_string(), "\\xc30d");
    }

    #[test]
    fn display_renders_a_table() {
        let out = segments().to_string();
        assert!(out.contains("customer_segment"));
        assert!(out.contains("(4 rows)"));
    }
}
