//! Entity metadata.
//!
//! [`EntityMetadata`] is the capability the initializer reads: declared
//! columns, declared relationships, the primary key and an optional
//! identifying-attribute override. [`EntityDef`] implements it for
//! statically registered entity types, collected in a [`Schema`].

mod def;
mod error;
mod schema;

pub use def::{EntityDef, InitFn};
pub use error::MetadataError;
pub use schema::{Schema, SchemaBuilder};

use crate::config::AutoInitConfig;
use crate::relation::RelationshipDescriptor;
use std::collections::{BTreeMap, BTreeSet};

/// Read-only mapping metadata for one entity type.
pub trait EntityMetadata {
    /// Name of the entity (its table name).
    fn entity_name(&self) -> &'static str;

    /// Declared scalar attribute names.
    fn columns(&self) -> BTreeSet<&'static str>;

    /// Declared relationships keyed by attribute name.
    fn relationships(&self) -> BTreeMap<&'static str, RelationshipDescriptor>;

    /// Primary key columns in declaration order.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::NoPrimaryKey` when the type declares none.
    fn primary_key(&self) -> Result<Vec<&'static str>, MetadataError>;

    /// Per-type identifying-attribute override, if any.
    fn config(&self) -> Option<&AutoInitConfig>;

    fn is_column(&self, name: &str) -> bool {
        self.columns().contains(name)
    }

    fn relationship(&self, name: &str) -> Option<RelationshipDescriptor> {
        self.relationships().get(name).copied()
    }

    /// Whether `name` is a declared column or relationship.
    fn has_attribute(&self, name: &str) -> bool {
        self.is_column(name) || self.relationship(name).is_some()
    }
}
