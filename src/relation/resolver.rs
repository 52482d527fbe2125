//! Relation resolution.
//!
//! [`RelationResolver`] answers two questions for a related entity type:
//! which attribute identifies an incoming payload
//! ([`lookup_attr`](RelationResolver::lookup_attr)), and which instances a
//! batch of payloads turns into
//! ([`reconcile_list`](RelationResolver::reconcile_list)).

use crate::config::{AutoInitConfig, Settings};
use crate::entity::{EntityDef, EntityMetadata};
use crate::error::AutoInitError;
use crate::executor::StoreError;
use crate::model::{ModelRef, Payload};
use crate::session::Session;
use serde_json::Value as JsonValue;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Where an identifying attribute came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrSource {
    /// The related type's own config
    Configured,
    /// The config passed to the initializer
    CallConfig,
    /// First primary key column of the related type
    PrimaryKey,
    /// Nothing resolved; the fallback name applies
    Fallback,
}

/// Attribute used to match payloads to existing rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyingAttr {
    pub name: String,
    pub source: AttrSource,
}

impl IdentifyingAttr {
    fn new(name: impl Into<String>, source: AttrSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Resolves related payloads against a session.
pub struct RelationResolver<'a> {
    session: &'a dyn Session,
    config: &'a AutoInitConfig,
    settings: &'a Settings,
}

impl<'a> RelationResolver<'a> {
    pub fn new(session: &'a dyn Session, config: &'a AutoInitConfig, settings: &'a Settings) -> Self {
        Self {
            session,
            config,
            settings,
        }
    }

    /// Identifying attribute for `related`.
    ///
    /// Resolution order: the related type's own override, the initializer's
    /// override, the first primary key column, then the fallback name. Never
    /// fails; unreadable metadata selects the fallback.
    pub fn lookup_attr(&self, related: &dyn EntityMetadata) -> IdentifyingAttr {
        if let Some(attr) = related.config().and_then(|c| c.identifying_attr.as_deref()) {
            return IdentifyingAttr::new(attr, AttrSource::Configured);
        }
        if let Some(attr) = self.config.identifying_attr.as_deref() {
            return IdentifyingAttr::new(attr, AttrSource::CallConfig);
        }
        match related.primary_key() {
            Ok(pk) => match pk.first() {
                Some(column) => IdentifyingAttr::new(*column, AttrSource::PrimaryKey),
                None => IdentifyingAttr::new(self.settings.fallback_attr.as_str(), AttrSource::Fallback),
            },
            Err(e) => {
                log::debug!(
                    "no primary key for {}, using fallback attribute: {}",
                    related.entity_name(),
                    e
                );
                IdentifyingAttr::new(self.settings.fallback_attr.as_str(), AttrSource::Fallback)
            }
        }
    }

    /// Existing row of `related` whose `attr` equals `value`.
    ///
    /// # Errors
    ///
    /// Propagates the session's error, including
    /// `StoreError::MultipleRows` when the filter is ambiguous.
    pub fn find_existing(
        &self,
        related: &dyn EntityMetadata,
        attr: &str,
        value: &JsonValue,
    ) -> Result<Option<ModelRef>, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::lookup_span(related.entity_name(), attr).entered();
        #[cfg(feature = "metrics")]
        METRICS.record_lookup();

        self.session.find_one_by(related, attr, value)
    }

    /// Turn a batch of payloads into the related instances to attach.
    ///
    /// Payloads matching an existing row overwrite that row in place; the
    /// rest are constructed through `related`'s own constructor, minus the
    /// slug key. New instances come first, then updated ones, each group in
    /// input order. A row matched twice is overwritten twice and listed twice.
    ///
    /// # Errors
    ///
    /// Returns `AutoInitError::Store` for store failures and
    /// `AutoInitError::Construction` when `related` rejects a payload.
    ///
    /// Matched rows are overwritten before any new instance is constructed,
    /// and an error does not undo those writes: the caller's entity is never
    /// returned, but matched instances held by the session keep the payload
    /// values. Discard the session (or roll back its transaction) on error.
    pub fn reconcile_list(
        &self,
        attr: &str,
        related: &EntityDef,
        payloads: Vec<Payload>,
    ) -> Result<Vec<ModelRef>, AutoInitError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::reconcile_span(related.name(), attr, payloads.len()).entered();

        let mut to_create: Vec<Payload> = Vec::new();
        let mut updated: Vec<ModelRef> = Vec::new();

        for payload in payloads {
            let id = payload.get(attr).cloned().unwrap_or(JsonValue::Null);
            match self.find_existing(related, attr, &id)? {
                Some(existing) => {
                    existing.borrow_mut().apply(&payload);
                    updated.push(existing);
                }
                None => to_create.push(payload),
            }
        }

        let mut instances = Vec::with_capacity(to_create.len() + updated.len());
        for mut payload in to_create {
            payload.remove(&self.settings.slug_key);
            instances.push(ModelRef::new(related.construct(&payload)?));
        }

        log::debug!(
            "reconciled {}: {} created, {} updated",
            related.name(),
            instances.len(),
            updated.len()
        );
        #[cfg(feature = "metrics")]
        {
            METRICS.record_created(instances.len());
            METRICS.record_updated(updated.len());
        }

        instances.extend(updated);
        Ok(instances)
    }

    /// Many-to-many collections reconcile exactly like one-to-many ones.
    pub fn handle_many_to_many(
        &self,
        attr: &str,
        related: &EntityDef,
        payloads: Vec<Payload>,
    ) -> Result<Vec<ModelRef>, AutoInitError> {
        self.reconcile_list(attr, related, payloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use crate::session::MemorySession;
    use serde_json::json;

    fn payload(value: JsonValue) -> Payload {
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn line_item() -> EntityDef {
        EntityDef::new("line_item").columns(["qty"]).primary_key(["id"])
    }

    #[test]
    fn test_lookup_attr_prefers_type_config() {
        let session = MemorySession::new();
        let config = AutoInitConfig::identifying_attr("code");
        let settings = Settings::default();
        let resolver = RelationResolver::new(&session, &config, &settings);

        let def = line_item().config(AutoInitConfig::identifying_attr("sku"));
        assert_eq!(
            resolver.lookup_attr(&def),
            IdentifyingAttr::new("sku", AttrSource::Configured)
        );
    }

    #[test]
    fn test_lookup_attr_call_config_then_primary_key() {
        let session = MemorySession::new();
        let settings = Settings::default();

        let config = AutoInitConfig::identifying_attr("code");
        let resolver = RelationResolver::new(&session, &config, &settings);
        assert_eq!(resolver.lookup_attr(&line_item()).source, AttrSource::CallConfig);

        let config = AutoInitConfig::new();
        let resolver = RelationResolver::new(&session, &config, &settings);
        let def = EntityDef::new("tag").primary_key(["name", "scope"]);
        assert_eq!(
            resolver.lookup_attr(&def),
            IdentifyingAttr::new("name", AttrSource::PrimaryKey)
        );
    }

    #[test]
    fn test_lookup_attr_falls_back() {
        let session = MemorySession::new();
        let config = AutoInitConfig::new();
        let settings = Settings::default();
        let resolver = RelationResolver::new(&session, &config, &settings);

        let def = EntityDef::new("audit").columns(["message"]);
        assert_eq!(
            resolver.lookup_attr(&def),
            IdentifyingAttr::new("id", AttrSource::Fallback)
        );
    }

    #[test]
    fn test_reconcile_creates_then_updates() {
        let session = MemorySession::new();
        let existing = session.insert(Record::from_payload("line_item", &payload(json!({"id": 1, "qty": 2}))));
        let config = AutoInitConfig::new();
        let settings = Settings::default();
        let resolver = RelationResolver::new(&session, &config, &settings);

        let result = resolver
            .reconcile_list(
                "id",
                &line_item(),
                vec![
                    payload(json!({"id": 1, "qty": 5})),
                    payload(json!({"id": null, "qty": 1})),
                ],
            )
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].get("qty"), Some(json!(1)));
        assert!(result[1].ptr_eq(&existing));
        assert_eq!(existing.get("qty"), Some(json!(5)));
    }

    #[test]
    fn test_reconcile_strips_slug_on_create_only() {
        let session = MemorySession::new();
        let existing = session.insert(Record::from_payload(
            "tag",
            &payload(json!({"id": 7, "name": "old", "slug": "old"})),
        ));
        let config = AutoInitConfig::new();
        let settings = Settings::default();
        let resolver = RelationResolver::new(&session, &config, &settings);
        let tag = EntityDef::new("tag").columns(["name"]).primary_key(["id"]);

        let result = resolver
            .handle_many_to_many(
                "id",
                &tag,
                vec![
                    payload(json!({"name": "new", "slug": "new"})),
                    payload(json!({"id": 7, "name": "renamed", "slug": "renamed"})),
                ],
            )
            .unwrap();

        assert_eq!(result[0].borrow().get("slug"), None);
        assert!(result[1].ptr_eq(&existing));
        assert_eq!(existing.get("slug"), Some(json!("renamed")));
    }

    #[test]
    fn test_reconcile_duplicate_match_not_deduplicated() {
        let session = MemorySession::new();
        let existing = session.insert(Record::from_payload("line_item", &payload(json!({"id": 1, "qty": 2}))));
        let config = AutoInitConfig::new();
        let settings = Settings::default();
        let resolver = RelationResolver::new(&session, &config, &settings);

        let result = resolver
            .reconcile_list(
                "id",
                &line_item(),
                vec![payload(json!({"id": 1, "qty": 3})), payload(json!({"id": 1, "qty": 4}))],
            )
            .unwrap();

        assert_eq!(result.len(), 2);
        assert!(result[0].ptr_eq(&existing) && result[1].ptr_eq(&existing));
        assert_eq!(existing.get("qty"), Some(json!(4)));
    }

    #[test]
    fn test_reconcile_propagates_construction_error() {
        let session = MemorySession::new();
        let config = AutoInitConfig::new();
        let settings = Settings::default();
        let resolver = RelationResolver::new(&session, &config, &settings);

        let err = resolver
            .reconcile_list("id", &line_item(), vec![payload(json!({"qty": 1, "colour": "red"}))])
            .unwrap_err();
        assert!(matches!(err, AutoInitError::Construction(_)));
    }

    #[test]
    fn test_reconcile_error_keeps_earlier_overwrites() {
        let session = MemorySession::new();
        let existing = session.insert(Record::from_payload("line_item", &payload(json!({"id": 1, "qty": 2}))));
        let config = AutoInitConfig::new();
        let settings = Settings::default();
        let resolver = RelationResolver::new(&session, &config, &settings);

        let err = resolver
            .reconcile_list(
                "id",
                &line_item(),
                vec![
                    payload(json!({"id": 1, "qty": 9})),
                    payload(json!({"qty": 1, "colour": "red"})),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, AutoInitError::Construction(_)));
        assert_eq!(existing.get("qty"), Some(json!(9)));
    }
}
