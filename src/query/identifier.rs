//! Identifier comparison.
//!
//! A payload identifier is compared in the type of the column it is matched
//! against, the way a SQL literal is: `1`, `1.0` and `"1"` all find the row
//! whose integer key is 1, while `1.5` and `"abc"` find nothing. A value that
//! cannot be represented in the column's type matches no row; it is never an
//! error.
//!
//! [`IdentifierParam`] applies the rule on the Postgres side, encoding itself
//! into whatever type the server infers for the parameter. [`identifier_matches`]
//! applies it in memory, using the stored value's JSON kind as the column type.

use may_postgres::types::private::BytesMut;
use may_postgres::types::{accepts, to_sql_checked, IsNull, ToSql, Type};
use serde_json::Value as JsonValue;
use std::error::Error;
use uuid::Uuid;

/// Integer form of an identifier, if it has one.
pub fn as_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            // i64::MAX as f64 rounds up to 2^63, hence the strict bound
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_float(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_uuid(value: &JsonValue) -> Option<Uuid> {
    value.as_str().and_then(|s| Uuid::parse_str(s).ok())
}

/// Whether a stored value equals `wanted` under column-type coercion.
///
/// `null` matches only unset or null values.
pub fn identifier_matches(stored: Option<&JsonValue>, wanted: &JsonValue) -> bool {
    let stored = match stored {
        None | Some(JsonValue::Null) => return wanted.is_null(),
        Some(stored) => stored,
    };
    match stored {
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => as_integer(wanted) == Some(i),
            None => n.as_f64().is_some() && as_float(wanted) == n.as_f64(),
        },
        JsonValue::String(s) => match (Uuid::parse_str(s), as_uuid(wanted)) {
            (Ok(a), Some(b)) => a == b,
            _ => as_text(wanted).as_deref() == Some(s.as_str()),
        },
        JsonValue::Bool(b) => wanted.as_bool() == Some(*b),
        other => other == wanted,
    }
}

/// Identifier bound as a query parameter.
///
/// Encodes into the parameter type Postgres infers from the compared column.
/// A value with no representation in that type is sent as `NULL`, which
/// matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierParam(JsonValue);

impl IdentifierParam {
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &JsonValue {
        &self.0
    }
}

impl ToSql for IdentifierParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        let value = &self.0;
        let encoded = match *ty {
            Type::BOOL => value.as_bool().map(|b| b.to_sql(ty, out)),
            Type::INT2 => as_integer(value)
                .and_then(|i| i16::try_from(i).ok())
                .map(|i| i.to_sql(ty, out)),
            Type::INT4 => as_integer(value)
                .and_then(|i| i32::try_from(i).ok())
                .map(|i| i.to_sql(ty, out)),
            Type::INT8 => as_integer(value).map(|i| i.to_sql(ty, out)),
            Type::FLOAT4 => as_float(value).map(|f| (f as f32).to_sql(ty, out)),
            Type::FLOAT8 => as_float(value).map(|f| f.to_sql(ty, out)),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                as_text(value).map(|s| s.to_sql(ty, out))
            }
            Type::UUID => as_uuid(value).map(|u| u.to_sql(ty, out)),
            _ => return Err(format!("unsupported identifier column type {}", ty).into()),
        };
        encoded.unwrap_or(Ok(IsNull::Yes))
    }

    accepts!(BOOL, INT2, INT4, INT8, FLOAT4, FLOAT8, TEXT, VARCHAR, BPCHAR, NAME, UUID);
    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(value: JsonValue, ty: &Type) -> Option<Vec<u8>> {
        let mut out = BytesMut::new();
        match IdentifierParam::new(value).to_sql(ty, &mut out).unwrap() {
            IsNull::Yes => None,
            IsNull::No => Some(out.to_vec()),
        }
    }

    #[test]
    fn test_integer_columns_accept_integral_values() {
        let one = Some(1i32.to_be_bytes().to_vec());
        assert_eq!(encode(json!(1), &Type::INT4), one);
        assert_eq!(encode(json!(1.0), &Type::INT4), one);
        assert_eq!(encode(json!("1"), &Type::INT4), one);
        assert_eq!(encode(json!(7), &Type::INT8), Some(7i64.to_be_bytes().to_vec()));
    }

    #[test]
    fn test_unrepresentable_values_bind_null() {
        assert_eq!(encode(json!(1.5), &Type::INT4), None);
        assert_eq!(encode(json!("abc"), &Type::INT8), None);
        assert_eq!(encode(json!(70000), &Type::INT2), None);
        assert_eq!(encode(json!("not-a-uuid"), &Type::UUID), None);
        assert_eq!(encode(json!(true), &Type::TEXT), None);
    }

    #[test]
    fn test_text_and_uuid_columns() {
        assert_eq!(encode(json!("A-1"), &Type::TEXT), Some(b"A-1".to_vec()));
        assert_eq!(encode(json!(42), &Type::VARCHAR), Some(b"42".to_vec()));

        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            encode(json!("67E55044-10B1-426F-9247-BB680E5FE0C8"), &Type::UUID),
            Some(id.as_bytes().to_vec())
        );
    }

    #[test]
    fn test_unsupported_column_type_is_error() {
        let mut out = BytesMut::new();
        assert!(IdentifierParam::new(json!(1)).to_sql(&Type::JSONB, &mut out).is_err());
    }

    #[test]
    fn test_memory_comparison_follows_column_type() {
        let int_key = json!(1);
        assert!(identifier_matches(Some(&int_key), &json!(1)));
        assert!(identifier_matches(Some(&int_key), &json!(1.0)));
        assert!(identifier_matches(Some(&int_key), &json!("1")));
        assert!(!identifier_matches(Some(&int_key), &json!(1.5)));
        assert!(!identifier_matches(Some(&int_key), &json!("abc")));
        assert!(!identifier_matches(Some(&int_key), &JsonValue::Null));

        let text_key = json!("42");
        assert!(identifier_matches(Some(&text_key), &json!(42)));
        assert!(!identifier_matches(Some(&text_key), &json!(42.0)));

        let uuid_key = json!("67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!(identifier_matches(Some(&uuid_key), &json!("67E55044-10B1-426F-9247-BB680E5FE0C8")));

        assert!(identifier_matches(None, &JsonValue::Null));
        assert!(identifier_matches(Some(&JsonValue::Null), &JsonValue::Null));
        assert!(!identifier_matches(None, &json!(1)));
    }

    // Both sides of the rule must agree: a value encodes into an integer
    // column exactly when it matches a stored integer in memory
    #[test]
    fn test_memory_and_postgres_agree_on_integer_keys() {
        let stored = json!(1);
        for wanted in [json!(1), json!(1.0), json!("1"), json!(1.5), json!("abc"), json!(2)] {
            let encoded = encode(wanted.clone(), &Type::INT4);
            let in_postgres = encoded == Some(1i32.to_be_bytes().to_vec());
            assert_eq!(identifier_matches(Some(&stored), &wanted), in_postgres, "{}", wanted);
        }
    }
}
