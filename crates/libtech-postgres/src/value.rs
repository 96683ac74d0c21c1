use std::{error::Error, str::FromStr};

use libtech_core::{parse_date, DataValue, SqlValue};
use postgres::{
    types::{private::BytesMut, to_sql_checked, IsNull, Kind, ToSql, Type},
    Row,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

/// Binds a `SqlValue` to whatever type the server inferred for its placeholder.
#[derive(Debug)]
pub struct Value<'a>(pub &'a SqlValue);

impl ToSql for Value<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        match self.0 {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Int(value) => int_to_sql(*value, ty, out),
            SqlValue::Decimal(value) => match *ty {
                Type::NUMERIC => value.to_sql(ty, out),
                Type::FLOAT4 | Type::FLOAT8 => {
                    let f = value
                        .to_f64()
                        .ok_or_else(|| format!("{} does not fit in {}", value, ty))?;
                    if *ty == Type::FLOAT4 {
                        (f as f32).to_sql(ty, out)
                    } else {
                        f.to_sql(ty, out)
                    }
                }
                Type::INT2 | Type::INT4 | Type::INT8 if value.fract().is_zero() => {
                    let i = value
                        .to_i64()
                        .ok_or_else(|| format!("{} does not fit in {}", value, ty))?;
                    int_to_sql(i, ty, out)
                }
                _ if is_text(ty) => value.to_string().to_sql(ty, out),
                _ => Err(format!("cannot bind {} as {}", value, ty).into()),
            },
            SqlValue::Text(value) => text_to_sql(value, ty, out),
            SqlValue::Date(value) => match *ty {
                Type::DATE => value.to_sql(ty, out),
                Type::TIMESTAMP => PrimitiveDateTime::new(*value, Time::MIDNIGHT).to_sql(ty, out),
                Type::TIMESTAMPTZ => PrimitiveDateTime::new(*value, Time::MIDNIGHT)
                    .assume_utc()
                    .to_sql(ty, out),
                _ if is_text(ty) => value.to_string().to_sql(ty, out),
                _ => Err(format!("cannot bind date {} as {}", value, ty).into()),
            },
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_))
            || matches!(
                *ty,
                Type::BOOL
                    | Type::INT2
                    | Type::INT4
                    | Type::INT8
                    | Type::NUMERIC
                    | Type::FLOAT4
                    | Type::FLOAT8
                    | Type::TEXT
                    | Type::VARCHAR
                    | Type::BPCHAR
                    | Type::NAME
                    | Type::UNKNOWN
                    | Type::DATE
                    | Type::TIMESTAMP
                    | Type::TIMESTAMPTZ
            )
    }

    to_sql_checked!();
}

/// Text input coerced the way the server would coerce a quoted literal.
fn text_to_sql(value: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    let mismatch = || -> BoxError { format!("cannot bind text '{}' as {}", value, ty).into() };

    if is_text(ty) {
        return value.to_sql(ty, out);
    }
    if let Kind::Enum(_) = ty.kind() {
        // Enum values travel as their label in both text and binary format.
        out.extend_from_slice(value.as_bytes());
        return Ok(IsNull::No);
    }

    let trimmed = value.trim();
    match *ty {
        Type::BOOL => match trimmed.to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" | "1" => true.to_sql(ty, out),
            "f" | "false" | "n" | "no" | "off" | "0" => false.to_sql(ty, out),
            _ => Err(mismatch()),
        },
        Type::INT2 | Type::INT4 | Type::INT8 => {
            let i = trimmed.parse::<i64>().map_err(|_| mismatch())?;
            int_to_sql(i, ty, out)
        }
        Type::NUMERIC => Decimal::from_str(trimmed).map_err(|_| mismatch())?.to_sql(ty, out),
        Type::FLOAT4 => trimmed.parse::<f32>().map_err(|_| mismatch())?.to_sql(ty, out),
        Type::FLOAT8 => trimmed.parse::<f64>().map_err(|_| mismatch())?.to_sql(ty, out),
        Type::DATE | Type::TIMESTAMP | Type::TIMESTAMPTZ => {
            let date = parse_date(trimmed).ok_or_else(mismatch)?;
            Value(&SqlValue::Date(date)).to_sql(ty, out)
        }
        _ => Err(mismatch()),
    }
}

fn int_to_sql(value: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(value)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(value)?.to_sql(ty, out),
        Type::INT8 => value.to_sql(ty, out),
        Type::NUMERIC => Decimal::from(value).to_sql(ty, out),
        Type::FLOAT4 => (value as f32).to_sql(ty, out),
        Type::FLOAT8 => (value as f64).to_sql(ty, out),
        _ if is_text(ty) => value.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind {} as {}", value, ty).into()),
    }
}

/// Reads column `index` of `row` according to its declared type.
pub fn load(row: &Row, index: usize) -> Result<DataValue, postgres::Error> {
    let ty = row.columns()[index].type_().clone();

    let value = match ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(index)?.map(DataValue::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)?
            .map(|v| DataValue::Int(v.into())),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)?
            .map(|v| DataValue::Int(v.into())),
        Type::INT8 => row.try_get::<_, Option<i64>>(index)?.map(DataValue::Int),
        Type::OID => row
            .try_get::<_, Option<u32>>(index)?
            .map(|v| DataValue::Int(v.into())),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)?
            .map(|v| DataValue::Float(v.into())),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index)?.map(DataValue::Float),
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(index)?
            .map(DataValue::Decimal),
        Type::DATE => row
            .try_get::<_, Option<time::Date>>(index)?
            .map(DataValue::Date),
        Type::TIMESTAMP => row
            .try_get::<_, Option<PrimitiveDateTime>>(index)?
            .map(DataValue::Timestamp),
        Type::TIMESTAMPTZ => row.try_get::<_, Option<OffsetDateTime>>(index)?.map(|v| {
            let utc = v.to_offset(UtcOffset::UTC);
            DataValue::Timestamp(PrimitiveDateTime::new(utc.date(), utc.time()))
        }),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)?
            .map(|v| DataValue::Bytes(v.into())),
        Type::UUID => row
            .try_get::<_, Option<Uuid>>(index)?
            .map(|v| DataValue::Text(v.to_string().into())),
        Type::VOID => None,
        _ => match row.try_get::<_, Option<String>>(index) {
            Ok(v) => v.map(|s| DataValue::Text(s.into())),
            Err(_) => {
                tracing::debug!(column = index, ty = %ty, "Unsupported column type");
                Some(DataValue::Text(format!("<{}>", ty.name()).into()))
            }
        },
    };

    Ok(value.unwrap_or(DataValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::date;

    fn bind(value: &SqlValue, ty: &Type) -> Result<Vec<u8>, BoxError> {
        let mut out = BytesMut::new();
        Value(value).to_sql(ty, &mut out)?;
        Ok(out.to_vec())
    }

    fn encoded<T: ToSql>(value: T, ty: &Type) -> Vec<u8> {
        let mut out = BytesMut::new();
        value.to_sql(ty, &mut out).unwrap();
        out.to_vec()
    }

    fn borrow_status() -> Type {
        Type::new(
            "borrow_status".to_string(),
            90001,
            Kind::Enum(vec!["Borrowed".to_string(), "Returned".to_string()]),
            "public".to_string(),
        )
    }

    #[test]
    fn text_binds_to_integer_placeholders() {
        assert_eq!(bind(&SqlValue::text("3"), &Type::INT4).unwrap(), encoded(3i32, &Type::INT4));
        assert_eq!(bind(&SqlValue::text(" 7 "), &Type::INT2).unwrap(), encoded(7i16, &Type::INT2));
        assert_eq!(bind(&SqlValue::text("42"), &Type::INT8).unwrap(), encoded(42i64, &Type::INT8));
        assert!(bind(&SqlValue::text("LIBTECH01"), &Type::INT4).is_err());
        assert!(bind(&SqlValue::text("70000"), &Type::INT2).is_err());
    }

    #[test]
    fn text_binds_to_numeric_and_float_placeholders() {
        assert_eq!(
            bind(&SqlValue::text("12.50"), &Type::NUMERIC).unwrap(),
            encoded(dec!(12.50), &Type::NUMERIC)
        );
        assert_eq!(bind(&SqlValue::text("1.5"), &Type::FLOAT8).unwrap(), encoded(1.5f64, &Type::FLOAT8));
        assert_eq!(bind(&SqlValue::text("2.25"), &Type::FLOAT4).unwrap(), encoded(2.25f32, &Type::FLOAT4));
    }

    #[test]
    fn text_binds_to_date_and_bool_placeholders() {
        assert_eq!(
            bind(&SqlValue::text("2024-03-01"), &Type::DATE).unwrap(),
            encoded(date!(2024 - 03 - 01), &Type::DATE)
        );
        assert_eq!(bind(&SqlValue::text("true"), &Type::BOOL).unwrap(), vec![1]);
        assert_eq!(bind(&SqlValue::text("f"), &Type::BOOL).unwrap(), vec![0]);
        assert!(bind(&SqlValue::text("maybe"), &Type::BOOL).is_err());
    }

    #[test]
    fn text_binds_to_enum_labels() {
        let ty = borrow_status();
        assert!(<Value<'_> as ToSql>::accepts(&ty));
        assert_eq!(bind(&SqlValue::text("Returned"), &ty).unwrap(), b"Returned".to_vec());
    }

    #[test]
    fn text_passes_through_text_placeholders() {
        assert_eq!(bind(&SqlValue::text("Dune"), &Type::VARCHAR).unwrap(), b"Dune".to_vec());
    }

    #[test]
    fn integers_adapt_to_numeric_placeholders() {
        assert_eq!(bind(&SqlValue::Int(5), &Type::NUMERIC).unwrap(), encoded(dec!(5), &Type::NUMERIC));
        assert!(bind(&SqlValue::Int(5), &Type::DATE).is_err());
    }
}
