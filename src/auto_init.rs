//! Nested initialization of entities.
//!
//! [`AutoInit`] builds one entity from keyword arguments. Columns are assigned
//! as given; relationship arguments are resolved according to the
//! relationship's kind and cardinality:
//!
//! | kind          | collection | argument               | result                                   |
//! |---------------|------------|------------------------|------------------------------------------|
//! | one-to-many   | yes        | array of objects       | [`reconcile_list`]                       |
//! | one-to-many   | no         | object                 | new instance, no lookup                  |
//! | many-to-one   | no         | object or identifier   | existing row or the empty reference      |
//! | many-to-many  | either     | array of objects       | [`reconcile_list`]                       |
//!
//! Excluded and undeclared keys are ignored. Afterwards the entity's
//! constructor hook runs with the original arguments.
//!
//! [`reconcile_list`]: crate::RelationResolver::reconcile_list

use crate::config::{AutoInitConfig, Settings};
use crate::entity::{EntityDef, EntityMetadata, Schema};
use crate::error::AutoInitError;
use crate::model::{ModelRef, Payload, Record, RelationValue};
use crate::relation::{RelationKind, RelationResolver, RelationshipDescriptor};
use crate::session::Session;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Builder that initializes entities and their related instances.
///
/// # Example
///
/// ```
/// use autoinit::{AutoInit, EntityDef, MemorySession, Record, RelationshipDescriptor, Schema};
/// use serde_json::json;
///
/// let schema = Schema::builder()
///     .register(
///         EntityDef::new("order")
///             .columns(["reference"])
///             .primary_key(["id"])
///             .relationship("customer", RelationshipDescriptor::many_to_one("customer")),
///     )
///     .and_then(|b| b.register(EntityDef::new("customer").columns(["name"]).primary_key(["id"])))
///     .and_then(|b| b.build())
///     .unwrap();
///
/// let session = MemorySession::new();
/// let alice = match json!({"id": 7, "name": "alice"}) {
///     serde_json::Value::Object(row) => session.insert(Record::from_payload("customer", &row)),
///     _ => unreachable!(),
/// };
///
/// let order = AutoInit::new(&schema)
///     .build_kwargs("order", json!({"reference": "A-1", "customer": 7}), Some(&session))
///     .unwrap();
///
/// let order = order.borrow();
/// assert!(order.relation("customer").unwrap().as_one().unwrap().ptr_eq(&alice));
/// ```
#[derive(Debug, Clone)]
pub struct AutoInit<'s> {
    schema: &'s Schema,
    exclude: BTreeSet<String>,
    config: AutoInitConfig,
    settings: Settings,
}

impl<'s> AutoInit<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_settings(schema, Settings::default())
    }

    /// Initializer using `settings` for the fallback attribute, slug key and
    /// default exclusions.
    pub fn with_settings(schema: &'s Schema, settings: Settings) -> Self {
        let mut exclude: BTreeSet<String> = settings.exclude.iter().cloned().collect();
        exclude.insert(settings.fallback_attr.clone());
        Self {
            schema,
            exclude,
            config: AutoInitConfig::default(),
            settings,
        }
    }

    /// Attribute names never auto-populated.
    pub fn exclude<I, T>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.exclude.extend(attrs.into_iter().map(Into::into));
        self
    }

    pub fn config(mut self, config: AutoInitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_excluded(&self, attr: &str) -> bool {
        self.exclude.contains(attr)
    }

    /// [`build`](Self::build) with no positional arguments and keyword
    /// arguments given as a JSON object.
    ///
    /// # Errors
    ///
    /// As for `build`; a non-object `kwargs` is an `InvalidPayload`.
    pub fn build_kwargs<S: Session>(
        &self,
        entity: &str,
        kwargs: JsonValue,
        session: Option<&S>,
    ) -> Result<ModelRef, AutoInitError> {
        match kwargs {
            JsonValue::Object(kwargs) => self.build(entity, &[], &kwargs, session),
            other => Err(AutoInitError::invalid_payload(entity, "object", &other)),
        }
    }

    /// Build a new `entity` instance.
    ///
    /// `args` and `kwargs` are handed unchanged to the entity's constructor
    /// hook once attributes and relationships have been assigned.
    ///
    /// # Errors
    ///
    /// - `MissingSession` if `session` is `None`, whatever the arguments
    /// - `MissingIdentifier` for a many-to-one object without the identifying attribute
    /// - `InvalidPayload` when a relationship value has the wrong shape
    /// - `Store` and `Construction` errors from lookups and related constructors
    pub fn build<S: Session>(
        &self,
        entity: &str,
        args: &[JsonValue],
        kwargs: &Payload,
        session: Option<&S>,
    ) -> Result<ModelRef, AutoInitError> {
        let session = session.ok_or_else(|| AutoInitError::MissingSession {
            entity: entity.to_string(),
        })?;
        let def = self.schema.entity(entity)?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::build_span(def.name()).entered();

        let resolver = RelationResolver::new(session, &self.config, &self.settings);
        let mut record = Record::new(def.name());

        for (key, value) in kwargs {
            if self.is_excluded(key) {
                log::trace!("{}: skipping excluded attribute {}", def.name(), key);
                continue;
            }
            if def.is_column(key) {
                log::trace!("{}: assigning column {}", def.name(), key);
                record.set(key.clone(), value.clone());
                continue;
            }
            match EntityMetadata::relationship(def, key) {
                Some(descriptor) => {
                    self.assign_relation(&resolver, &mut record, key, descriptor, value)?
                }
                None => log::debug!("{}: ignoring undeclared attribute {}", def.name(), key),
            }
        }

        def.finish(&mut record, args, kwargs)?;
        Ok(ModelRef::new(record))
    }

    fn assign_relation(
        &self,
        resolver: &RelationResolver<'_>,
        record: &mut Record,
        key: &str,
        descriptor: RelationshipDescriptor,
        value: &JsonValue,
    ) -> Result<(), AutoInitError> {
        let related: &EntityDef = self.schema.entity(descriptor.target)?;
        let attr = resolver.lookup_attr(related);

        match (descriptor.kind, descriptor.uselist) {
            (RelationKind::OneToMany, true) => {
                let instances = resolver.reconcile_list(&attr.name, related, payload_list(key, value)?)?;
                record.set_relation(key, RelationValue::Many(instances));
            }
            (RelationKind::OneToMany, false) => {
                let payload = value
                    .as_object()
                    .ok_or_else(|| AutoInitError::invalid_payload(key, "object", value))?;
                let instance = ModelRef::new(related.construct(payload)?);
                record.set_relation(key, RelationValue::One(Some(instance)));
            }
            (RelationKind::ManyToOne, false) => {
                if let Some(id) = many_to_one_identifier(key, &attr.name, value)? {
                    let found = resolver.find_existing(related, &attr.name, &id)?;
                    if found.is_none() {
                        log::debug!(
                            "{}: no {} with {} = {}, assigning empty reference",
                            record.entity(),
                            related.entity_name(),
                            attr.name,
                            id
                        );
                    }
                    record.set_relation(key, RelationValue::One(found));
                }
            }
            (RelationKind::ManyToMany, _) => {
                let instances =
                    resolver.handle_many_to_many(&attr.name, related, payload_list(key, value)?)?;
                record.set_relation(key, RelationValue::Many(instances));
            }
            (RelationKind::ManyToOne, true) => {
                log::warn!(
                    "{}: many-to-one relationship {} declared as a collection is not resolved",
                    record.entity(),
                    key
                );
            }
        }
        Ok(())
    }
}

/// Collection argument as payloads.
fn payload_list(relation: &str, value: &JsonValue) -> Result<Vec<Payload>, AutoInitError> {
    const EXPECTED: &str = "array of objects";
    let items = value
        .as_array()
        .ok_or_else(|| AutoInitError::invalid_payload(relation, EXPECTED, value))?;
    items
        .iter()
        .map(|item| {
            item.as_object()
                .cloned()
                .ok_or_else(|| AutoInitError::invalid_payload(relation, EXPECTED, item))
        })
        .collect()
}

/// Identifier for a many-to-one lookup, if the argument carries one.
///
/// Objects must hold a non-null identifying attribute. Strings and integers
/// are identifiers themselves; anything else, fractional numbers included,
/// resolves to no lookup.
fn many_to_one_identifier(
    relation: &str,
    attr: &str,
    value: &JsonValue,
) -> Result<Option<JsonValue>, AutoInitError> {
    let id = match value {
        JsonValue::Object(payload) => match payload.get(attr) {
            Some(id) if !id.is_null() => id,
            _ => {
                return Err(AutoInitError::MissingIdentifier {
                    relation: relation.to_string(),
                    attr: attr.to_string(),
                })
            }
        },
        other => other,
    };
    match id {
        JsonValue::String(_) => Ok(Some(id.clone())),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Ok(Some(id.clone())),
        other => {
            log::debug!("{}: {} is not an identifier, skipping lookup", relation, other);
            Ok(None)
        }
    }
}
