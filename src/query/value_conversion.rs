//! Value conversion utilities for SeaQuery to may_postgres.
//!
//! Converts SeaQuery `Values` into `ToSql` trait objects. Values are first
//! collected into typed vectors, then borrowed into the parameter slice, so
//! the references stay valid for the closure that runs the query.

use super::IdentifierParam;
use crate::executor::StoreError;
use may_postgres::types::ToSql;
use sea_query::Value;
use serde_json::Value as JsonValue;

/// Convert SeaQuery values to may_postgres parameters and run `f` with them.
///
/// # Errors
///
/// Returns `StoreError::Query` if an unsupported value type is encountered,
/// otherwise whatever `f` returns.
pub fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, StoreError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, StoreError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut doubles: Vec<f64> = Vec::new();
    let mut identifiers: Vec<IdentifierParam> = Vec::new();
    let mut nulls: Vec<Option<String>> = Vec::new();

    // First pass: collect
    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::TinyInt(Some(i)) => ints.push(i32::from(*i)),
            Value::SmallInt(Some(i)) => ints.push(i32::from(*i)),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::Unsigned(Some(u)) => big_ints.push(i64::from(*u)),
            Value::BigUnsigned(Some(u)) => {
                let v = i64::try_from(*u).map_err(|_| {
                    StoreError::Query(format!(
                        "BigUnsigned value {} exceeds i64::MAX ({}), cannot be safely cast to i64",
                        u,
                        i64::MAX
                    ))
                })?;
                big_ints.push(v);
            }
            Value::Double(Some(d)) => doubles.push(*d),
            Value::Float(Some(f)) => doubles.push(f64::from(*f)),
            Value::String(Some(s)) => strings.push(s.clone()),
            // JSON values are payload identifiers compared against a column
            Value::Json(Some(j)) => identifiers.push(IdentifierParam::new(JsonValue::clone(j))),
            Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Double(None)
            | Value::Float(None)
            | Value::String(None)
            | Value::Json(None) => nulls.push(None),
            _ => {
                return Err(StoreError::Query(format!(
                    "Unsupported value type in query: {:?}",
                    value
                )));
            }
        }
    }

    // Second pass: borrow in the original order
    let (mut bool_idx, mut int_idx, mut big_int_idx) = (0, 0, 0);
    let (mut string_idx, mut double_idx, mut null_idx) = (0, 0, 0);
    let mut identifier_idx = 0;
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(values.iter().count());

    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::TinyInt(Some(_)) | Value::SmallInt(Some(_)) | Value::Int(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) | Value::Unsigned(Some(_)) | Value::BigUnsigned(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::Double(Some(_)) | Value::Float(Some(_)) => {
                params.push(&doubles[double_idx] as &dyn ToSql);
                double_idx += 1;
            }
            Value::String(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            Value::Json(Some(_)) => {
                params.push(&identifiers[identifier_idx] as &dyn ToSql);
                identifier_idx += 1;
            }
            _ => {
                params.push(&nulls[null_idx] as &dyn ToSql);
                null_idx += 1;
            }
        }
    }

    f(&params)
}
