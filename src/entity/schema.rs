//! Registry of entity definitions.

use super::{EntityDef, MetadataError};
use std::collections::BTreeMap;

/// Registered entity types, keyed by name.
///
/// A schema is usually built once and kept in a `static`:
///
/// ```
/// use autoinit::{EntityDef, Schema};
/// use once_cell::sync::Lazy;
///
/// static SCHEMA: Lazy<Schema> = Lazy::new(|| {
///     Schema::builder()
///         .register(EntityDef::new("tag").columns(["name"]).primary_key(["id"]))
///         .and_then(|b| b.build())
///         .unwrap_or_default()
/// });
///
/// assert!(SCHEMA.entity("tag").is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: BTreeMap<&'static str, EntityDef>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// # Errors
    ///
    /// Returns `MetadataError::UnknownEntity` if no entity has that name.
    pub fn entity(&self, name: &str) -> Result<&EntityDef, MetadataError> {
        self.entities
            .get(name)
            .ok_or_else(|| MetadataError::UnknownEntity(name.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entities: BTreeMap<&'static str, EntityDef>,
}

impl SchemaBuilder {
    /// # Errors
    ///
    /// Returns `MetadataError::AlreadyRegistered` if an entity with the same
    /// name was registered before.
    pub fn register(mut self, def: EntityDef) -> Result<Self, MetadataError> {
        let name = def.name();
        if self.entities.contains_key(name) {
            return Err(MetadataError::AlreadyRegistered(name.to_string()));
        }
        self.entities.insert(name, def);
        Ok(self)
    }

    /// Finish registration, checking every relationship target is registered.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::UnknownTarget` for the first dangling target.
    pub fn build(self) -> Result<Schema, MetadataError> {
        for def in self.entities.values() {
            for (relation, descriptor) in def.relationship_entries() {
                if !self.entities.contains_key(descriptor.target) {
                    return Err(MetadataError::UnknownTarget {
                        entity: def.name().to_string(),
                        relation: relation.to_string(),
                        target: descriptor.target.to_string(),
                    });
                }
            }
        }
        Ok(Schema {
            entities: self.entities,
        })
    }
}
