//! Relationship metadata and resolution.
//!
//! - [`types`]: [`RelationKind`] and [`RelationshipDescriptor`]
//! - [`resolver`]: identifying-attribute lookup and list reconciliation

pub mod resolver;
pub mod types;

pub use resolver::{AttrSource, IdentifyingAttr, RelationResolver};
pub use types::{RelationKind, RelationshipDescriptor};
