use super::Session;
use crate::entity::EntityMetadata;
use crate::executor::StoreError;
use crate::model::{ModelRef, Record};
use crate::query::identifier_matches;
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// In-process session: rows held as shared instances per entity.
///
/// Rows are stored by reference, so a lookup hands back the very instance
/// that was inserted, and in-place updates are visible to every holder.
/// Identifiers compare the way [`PostgresSession`](super::PostgresSession)
/// compares them, with the stored value standing in for the column type.
#[derive(Debug, Default)]
pub struct MemorySession {
    rows: RefCell<BTreeMap<&'static str, Vec<ModelRef>>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record as an existing row and return its handle.
    pub fn insert(&self, record: Record) -> ModelRef {
        let instance = ModelRef::new(record);
        self.add(instance.clone());
        instance
    }

    /// Store an existing handle as a row.
    pub fn add(&self, instance: ModelRef) {
        let entity = instance.entity();
        self.rows.borrow_mut().entry(entity).or_default().push(instance);
    }

    pub fn rows(&self, entity: &str) -> Vec<ModelRef> {
        self.rows.borrow().get(entity).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Session for MemorySession {
    fn find_one_by(
        &self,
        entity: &dyn EntityMetadata,
        attr: &str,
        value: &JsonValue,
    ) -> Result<Option<ModelRef>, StoreError> {
        let rows = self.rows.borrow();
        let mut found = rows
            .get(entity.entity_name())
            .into_iter()
            .flatten()
            .filter(|row| identifier_matches(row.borrow().get(attr), value));

        let first = found.next().cloned();
        let extra = found.count();
        if extra > 0 {
            return Err(StoreError::MultipleRows {
                entity: entity.entity_name().to_string(),
                attr: attr.to_string(),
                count: extra + 1,
            });
        }
        Ok(first)
    }
}
