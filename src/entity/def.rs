use super::{EntityMetadata, MetadataError};
use crate::config::AutoInitConfig;
use crate::model::{ConstructError, Payload, Record};
use crate::relation::RelationshipDescriptor;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};

/// Constructor body of an entity type.
///
/// Runs after attributes have been assigned, with the caller's original
/// positional and keyword arguments.
pub type InitFn = fn(&mut Record, &[JsonValue], &Payload) -> Result<(), ConstructError>;

/// Statically declared entity type.
///
/// # Example
///
/// ```
/// use autoinit::{AutoInitConfig, EntityDef, EntityMetadata, RelationshipDescriptor};
///
/// let product = EntityDef::new("product")
///     .columns(["sku", "name", "price"])
///     .primary_key(["sku"])
///     .required(["name"])
///     .relationship("tags", RelationshipDescriptor::many_to_many("tag"))
///     .config(AutoInitConfig::identifying_attr("sku"));
///
/// assert!(product.is_column("price"));
/// assert_eq!(EntityMetadata::primary_key(&product).unwrap(), vec!["sku"]);
/// ```
#[derive(Debug, Clone)]
pub struct EntityDef {
    name: &'static str,
    columns: Vec<&'static str>,
    primary_key: Vec<&'static str>,
    required: Vec<&'static str>,
    relationships: BTreeMap<&'static str, RelationshipDescriptor>,
    config: Option<AutoInitConfig>,
    init: Option<InitFn>,
}

impl EntityDef {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
            required: Vec::new(),
            relationships: BTreeMap::new(),
            config: None,
            init: None,
        }
    }

    pub fn column(mut self, column: &'static str) -> Self {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self
    }

    pub fn columns<I>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        columns.into_iter().fold(self, Self::column)
    }

    /// Primary key columns; each is also declared as a column.
    pub fn primary_key<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.primary_key = columns.into_iter().collect();
        let pk = self.primary_key.clone();
        self.columns(pk)
    }

    /// Columns the constructor refuses to leave unset.
    pub fn required<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.required = columns.into_iter().collect();
        self
    }

    pub fn relationship(mut self, name: &'static str, descriptor: RelationshipDescriptor) -> Self {
        self.relationships.insert(name, descriptor);
        self
    }

    pub fn config(mut self, config: AutoInitConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn init(mut self, init: InitFn) -> Self {
        self.init = Some(init);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn relationship_entries(
        &self,
    ) -> impl Iterator<Item = (&'static str, &RelationshipDescriptor)> {
        self.relationships.iter().map(|(name, desc)| (*name, desc))
    }

    /// Build a new instance from a payload.
    ///
    /// Every key must be a declared column; relationship data is not resolved
    /// here. The constructor hook runs with no positional arguments.
    ///
    /// # Errors
    ///
    /// Returns `ConstructError` for undeclared fields, relationship payloads,
    /// missing required columns, or a rejection from the constructor hook.
    pub fn construct(&self, payload: &Payload) -> Result<Record, ConstructError> {
        let mut record = Record::new(self.name);
        for (key, value) in payload {
            if self.is_column(key) {
                record.set(key.clone(), value.clone());
            } else if self.relationships.contains_key(key.as_str()) {
                return Err(ConstructError::NestedRelationship {
                    entity: self.name.to_string(),
                    relation: key.clone(),
                });
            } else {
                return Err(ConstructError::UnexpectedField {
                    entity: self.name.to_string(),
                    field: key.clone(),
                });
            }
        }
        self.finish(&mut record, &[], payload)?;
        Ok(record)
    }

    /// Run the constructor hook, then check required columns.
    pub(crate) fn finish(
        &self,
        record: &mut Record,
        args: &[JsonValue],
        kwargs: &Payload,
    ) -> Result<(), ConstructError> {
        if let Some(init) = self.init {
            init(record, args, kwargs)?;
        }
        for field in &self.required {
            if record.get(field).map_or(true, JsonValue::is_null) {
                return Err(ConstructError::MissingField {
                    entity: self.name.to_string(),
                    field: (*field).to_string(),
                });
            }
        }
        Ok(())
    }
}

impl EntityMetadata for EntityDef {
    fn entity_name(&self) -> &'static str {
        self.name
    }

    fn columns(&self) -> BTreeSet<&'static str> {
        self.columns.iter().copied().collect()
    }

    fn relationships(&self) -> BTreeMap<&'static str, RelationshipDescriptor> {
        self.relationships.clone()
    }

    fn primary_key(&self) -> Result<Vec<&'static str>, MetadataError> {
        if self.primary_key.is_empty() {
            return Err(MetadataError::NoPrimaryKey(self.name.to_string()));
        }
        Ok(self.primary_key.clone())
    }

    fn config(&self) -> Option<&AutoInitConfig> {
        self.config.as_ref()
    }

    fn is_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| *c == name)
    }

    fn relationship(&self, name: &str) -> Option<RelationshipDescriptor> {
        self.relationships.get(name).copied()
    }
}
