//! Entity instances.
//!
//! A [`Record`] is one mapped entity instance: its column values and its
//! relationship slots. Records are shared through [`ModelRef`] so that an
//! existing row handed out by a session is the same instance that gets
//! updated and attached.

mod error;
mod record;

pub use error::ConstructError;
pub use record::{ModelRef, Record, RelationValue};

/// Keyword arguments or a single related payload.
pub type Payload = serde_json::Map<String, serde_json::Value>;
