//! Session abstraction over the persistent store.
//!
//! The initializer only ever asks one question of the store: "which row of
//! this entity has `attr == value`?". [`Session`] answers it; the caller owns
//! the session and its transaction, and nothing here commits or flushes.

mod memory;
mod postgres;

pub use memory::MemorySession;
pub use postgres::PostgresSession;

use crate::entity::EntityMetadata;
use crate::executor::StoreError;
use crate::model::ModelRef;
use serde_json::Value as JsonValue;

pub trait Session {
    /// Row of `entity` whose `attr` equals `value`.
    ///
    /// The value is compared in the attribute's own type, so `1`, `1.0` and
    /// `"1"` all find an integer key of 1; a value with no such form finds
    /// nothing. A `null` value matches rows where the attribute is null or
    /// unset.
    /// Repeated lookups of the same row return the same instance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::MultipleRows` when more than one row matches, or
    /// the backend's error when the store cannot be queried.
    fn find_one_by(
        &self,
        entity: &dyn EntityMetadata,
        attr: &str,
        value: &JsonValue,
    ) -> Result<Option<ModelRef>, StoreError>;
}

impl<S: Session + ?Sized> Session for &S {
    fn find_one_by(
        &self,
        entity: &dyn EntityMetadata,
        attr: &str,
        value: &JsonValue,
    ) -> Result<Option<ModelRef>, StoreError> {
        (**self).find_one_by(entity, attr, value)
    }
}
