//! # autoinit
//!
//! Build mapped entities from nested payloads.
//!
//! A caller hands [`AutoInit::build`] the keyword arguments for an entity as a
//! JSON object. Keys naming declared columns are assigned directly; keys naming
//! declared relationships are resolved into related instances: existing rows
//! are looked up through a [`Session`] and updated in place, everything else is
//! constructed new. Which of those happens depends on the relationship's
//! [`RelationKind`] and cardinality.
//!
//! ```no_run
//! use autoinit::{AutoInit, EntityDef, MemorySession, RelationshipDescriptor, Schema};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), autoinit::AutoInitError> {
//! let schema = Schema::builder()
//!     .register(
//!         EntityDef::new("order")
//!             .columns(["id", "reference"])
//!             .primary_key(["id"])
//!             .relationship("items", RelationshipDescriptor::one_to_many("line_item")),
//!     )?
//!     .register(EntityDef::new("line_item").columns(["id", "qty"]).primary_key(["id"]))?
//!     .build()?;
//!
//! let session = MemorySession::new();
//! let kwargs = json!({"reference": "A-1", "items": [{"qty": 3}]});
//! let order = AutoInit::new(&schema).build_kwargs("order", kwargs, Some(&session))?;
//! # let _ = order;
//! # Ok(())
//! # }
//! ```

pub mod auto_init;
pub mod config;
pub mod entity;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod model;
pub mod query;
pub mod relation;
pub mod session;

pub use auto_init::AutoInit;
pub use config::{AutoInitConfig, Settings};
pub use entity::{EntityDef, EntityMetadata, InitFn, MetadataError, Schema, SchemaBuilder};
pub use error::AutoInitError;
pub use executor::{Executor, MayPostgresExecutor, StoreError};
pub use model::{ConstructError, ModelRef, Payload, Record, RelationValue};
pub use relation::{
    AttrSource, IdentifyingAttr, RelationKind, RelationResolver, RelationshipDescriptor,
};
pub use session::{MemorySession, PostgresSession, Session};
