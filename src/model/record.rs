use super::Payload;
use serde_json::Value as JsonValue;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Contents of a relationship slot on a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    /// Single-valued relationship; `None` is the empty reference
    One(Option<ModelRef>),
    /// Collection-valued relationship
    Many(Vec<ModelRef>),
}

impl RelationValue {
    pub fn as_one(&self) -> Option<&ModelRef> {
        match self {
            RelationValue::One(one) => one.as_ref(),
            RelationValue::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> &[ModelRef] {
        match self {
            RelationValue::Many(many) => many,
            RelationValue::One(_) => &[],
        }
    }
}

/// One mapped entity instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: &'static str,
    values: BTreeMap<String, JsonValue>,
    relations: BTreeMap<String, RelationValue>,
}

impl Record {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            values: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Record with every payload entry set as a value.
    pub fn from_payload(entity: &'static str, payload: &Payload) -> Self {
        let mut record = Self::new(entity);
        record.apply(payload);
        record
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn get(&self, attr: &str) -> Option<&JsonValue> {
        self.values.get(attr)
    }

    /// Set an attribute, returning the previous value.
    pub fn set(&mut self, attr: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.values.insert(attr.into(), value)
    }

    pub fn take(&mut self, attr: &str) -> Option<JsonValue> {
        self.values.remove(attr)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite every payload entry onto this record.
    pub fn apply(&mut self, payload: &Payload) {
        for (key, value) in payload {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn relation(&self, name: &str) -> Option<&RelationValue> {
        self.relations.get(name)
    }

    pub fn set_relation(&mut self, name: impl Into<String>, value: RelationValue) {
        self.relations.insert(name.into(), value);
    }

    /// JSON view of the record, relationships nested one level per instance.
    pub fn to_json(&self) -> JsonValue {
        let mut object: Payload = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, relation) in &self.relations {
            let value = match relation {
                RelationValue::One(Some(one)) => one.borrow().to_json(),
                RelationValue::One(None) => JsonValue::Null,
                RelationValue::Many(many) => {
                    JsonValue::Array(many.iter().map(|m| m.borrow().to_json()).collect())
                }
            };
            object.insert(name.clone(), value);
        }
        JsonValue::Object(object)
    }
}

/// Shared handle to a [`Record`].
///
/// Clones point at the same instance; use [`ModelRef::ptr_eq`] to test
/// identity. `PartialEq` compares contents.
#[derive(Clone, PartialEq)]
pub struct ModelRef(Rc<RefCell<Record>>);

impl ModelRef {
    pub fn new(record: Record) -> Self {
        Self(Rc::new(RefCell::new(record)))
    }

    pub fn borrow(&self) -> Ref<'_, Record> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Record> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ModelRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn entity(&self) -> &'static str {
        self.0.borrow().entity()
    }

    /// Cloned attribute value.
    pub fn get(&self, attr: &str) -> Option<JsonValue> {
        self.0.borrow().get(attr).cloned()
    }
}

impl From<Record> for ModelRef {
    fn from(record: Record) -> Self {
        Self::new(record)
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.borrow(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: JsonValue) -> Payload {
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_record_apply_overwrites() {
        let mut record = Record::from_payload("line_item", &payload(json!({"id": 1, "qty": 2})));
        record.apply(&payload(json!({"qty": 5, "note": "rush"})));

        assert_eq!(record.get("id"), Some(&json!(1)));
        assert_eq!(record.get("qty"), Some(&json!(5)));
        assert_eq!(record.get("note"), Some(&json!("rush")));
    }

    #[test]
    fn test_record_take_and_set() {
        let mut record = Record::new("customer");
        assert_eq!(record.set("name", json!("x")), None);
        assert_eq!(record.set("name", json!("y")), Some(json!("x")));
        assert_eq!(record.take("name"), Some(json!("y")));
        assert_eq!(record.get("name"), None);
    }

    #[test]
    fn test_model_ref_identity() {
        let a = ModelRef::new(Record::new("customer"));
        let b = a.clone();
        let c = ModelRef::new(Record::new("customer"));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        // Same contents, different instances
        assert_eq!(a, c);

        b.borrow_mut().set("name", json!("shared"));
        assert_eq!(a.get("name"), Some(json!("shared")));
    }

    #[test]
    fn test_to_json_nests_relations() {
        let item = ModelRef::new(Record::from_payload("line_item", &payload(json!({"qty": 1}))));
        let mut order = Record::new("order");
        order.set("reference", json!("A-1"));
        order.set_relation("items", RelationValue::Many(vec![item]));
        order.set_relation("customer", RelationValue::One(None));

        assert_eq!(
            order.to_json(),
            json!({"reference": "A-1", "items": [{"qty": 1}], "customer": null})
        );
    }
}
