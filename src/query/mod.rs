//! SQL for identifying-attribute lookups.
//!
//! [`select_by`] builds the single query the Postgres session issues:
//!
//! ```sql
//! SELECT row_to_json("line_item") FROM "line_item"
//! WHERE "id" = $1 LIMIT 2
//! ```
//!
//! Rows come back as one JSON object each, so hydration needs no per-column
//! type knowledge. The column is left as is so its index applies; the
//! identifier is bound as an [`IdentifierParam`] that takes on the column's
//! type. `LIMIT 2` is enough to tell "one" from "more than one".

pub mod identifier;
pub mod value_conversion;

pub use identifier::{identifier_matches, IdentifierParam};

use sea_query::{Expr, ExprTrait, Iden, Query, SelectStatement};
use serde_json::Value as JsonValue;

/// Rows fetched per lookup; a second row means the filter is ambiguous.
pub const LOOKUP_LIMIT: u64 = 2;

/// Runtime identifier for tables and columns.
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Iden for Name {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

/// SELECT the row of `table` whose `attr` equals `value`, as JSON.
///
/// A `null` value filters with `IS NULL`.
pub fn select_by(table: &str, attr: &str, value: &JsonValue) -> SelectStatement {
    let mut query = Query::select();
    query
        .expr(Expr::cust(format!("row_to_json(\"{}\")", table.replace('"', "\"\""))))
        .from(Name::new(table))
        .limit(LOOKUP_LIMIT);

    if value.is_null() {
        query.and_where(Expr::col(Name::new(attr)).is_null());
    } else {
        query.and_where(Expr::col(Name::new(attr)).eq(Expr::val(value.clone())));
    }
    query
}
