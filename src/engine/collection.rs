//! In-memory collection: documents plus the unique-key and field indices over them.

use crate::comparator::Comparator;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Engine-assigned document id, stored alongside document fields in snapshots.
pub const DOC_ID_FIELD: &str = "$id";

const NULL: Value = Value::Null;

/// Uniqueness and index configuration applied when a collection is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Compound unique constraints; each entry is a list of fields whose
    /// combined values must be unique across the collection.
    #[serde(default)]
    pub unique: Vec<Vec<String>>,

    /// Fields with an equality index for O(1) point lookups.
    #[serde(default)]
    pub indices: Vec<String>,
}

impl CollectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unique constraint over the given fields taken together.
    pub fn unique(mut self, fields: &[&str]) -> Self {
        self.unique
            .push(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Add an equality index on a single field.
    pub fn index(mut self, field: &str) -> Self {
        self.indices.push(field.to_string());
        self
    }
}

/// Serialized form of a collection inside an engine snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub options: CollectionOptions,
    pub next_id: u64,
    pub documents: Vec<Value>,
}

/// Named grouping of JSON documents.
pub struct Collection {
    name: String,
    options: CollectionOptions,
    next_id: u64,
    documents: BTreeMap<u64, Map<String, Value>>,
    /// One key map per entry in `options.unique`.
    unique_keys: Vec<HashMap<String, u64>>,
    /// field -> value key -> document ids
    indices: HashMap<String, HashMap<String, Vec<u64>>>,
}

fn value_key(value: &Value) -> String {
    value.to_string()
}

fn compound_key(fields: &[String], doc: &Map<String, Value>) -> String {
    Value::Array(
        fields
            .iter()
            .map(|f| doc.get(f).cloned().unwrap_or(Value::Null))
            .collect(),
    )
    .to_string()
}

impl Collection {
    pub fn new(name: &str, options: CollectionOptions) -> Self {
        let unique_keys = options.unique.iter().map(|_| HashMap::new()).collect();
        let indices = options
            .indices
            .iter()
            .map(|field| (field.clone(), HashMap::new()))
            .collect();
        Self {
            name: name.to_string(),
            options,
            next_id: 1,
            documents: BTreeMap::new(),
            unique_keys,
            indices,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Insert a document, enforcing every unique constraint first.
    ///
    /// Either the document is fully indexed or nothing changes.
    pub fn insert(&mut self, document: Value) -> Result<u64, EngineError> {
        let Value::Object(mut doc) = document else {
            return Err(EngineError::NotAnObject(self.name.clone()));
        };
        doc.remove(DOC_ID_FIELD);
        let id = self.next_id;
        self.insert_with_id(id, doc)?;
        self.next_id = id + 1;
        Ok(id)
    }

    fn insert_with_id(&mut self, id: u64, doc: Map<String, Value>) -> Result<(), EngineError> {
        if self.documents.contains_key(&id) {
            return Err(EngineError::DuplicateDocumentId {
                collection: self.name.clone(),
                id,
            });
        }
        let keys: Vec<String> = self
            .options
            .unique
            .iter()
            .map(|fields| compound_key(fields, &doc))
            .collect();

        for ((fields, key), existing) in self
            .options
            .unique
            .iter()
            .zip(keys.iter())
            .zip(self.unique_keys.iter())
        {
            if existing.contains_key(key) {
                return Err(EngineError::UniqueViolation {
                    collection: self.name.clone(),
                    fields: fields.join(", "),
                    key: key.clone(),
                });
            }
        }

        for (key, map) in keys.into_iter().zip(self.unique_keys.iter_mut()) {
            map.insert(key, id);
        }
        for (field, index) in self.indices.iter_mut() {
            let key = value_key(doc.get(field).unwrap_or(&NULL));
            index.entry(key).or_default().push(id);
        }
        self.documents.insert(id, doc);
        Ok(())
    }

    fn matching_ids(&self, field: &str, value: &Value) -> Vec<u64> {
        if let Some(index) = self.indices.get(field) {
            return index.get(&value_key(value)).cloned().unwrap_or_default();
        }
        self.documents
            .iter()
            .filter(|(_, doc)| doc.get(field).unwrap_or(&NULL) == value)
            .map(|(id, _)| *id)
            .collect()
    }

    /// First document (by insertion order) whose `field` equals `value`.
    pub fn find_one(&self, field: &str, value: &Value) -> Option<Value> {
        self.matching_ids(field, value)
            .into_iter()
            .min()
            .and_then(|id| self.documents.get(&id))
            .map(|doc| Value::Object(doc.clone()))
    }

    /// Every document whose `field` equals `value`, in insertion order.
    pub fn find(&self, field: &str, value: &Value) -> Vec<Value> {
        let mut ids = self.matching_ids(field, value);
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.documents.get(&id))
            .map(|doc| Value::Object(doc.clone()))
            .collect()
    }

    /// All documents ordered by `field`. Ties keep insertion order.
    pub fn sorted_by(&self, field: &str, comparator: &dyn Comparator) -> Vec<Value> {
        let mut docs: Vec<&Map<String, Value>> = self.documents.values().collect();
        docs.sort_by(|a, b| {
            comparator.compare(a.get(field).unwrap_or(&NULL), b.get(field).unwrap_or(&NULL))
        });
        docs.into_iter().map(|doc| Value::Object(doc.clone())).collect()
    }

    /// Remove every document whose `field` equals `value`. Returns the count removed.
    pub fn remove_where(&mut self, field: &str, value: &Value) -> usize {
        let ids = self.matching_ids(field, value);
        for id in &ids {
            let Some(doc) = self.documents.remove(id) else {
                continue;
            };
            for (fields, map) in self.options.unique.iter().zip(self.unique_keys.iter_mut()) {
                map.remove(&compound_key(fields, &doc));
            }
            for (indexed, index) in self.indices.iter_mut() {
                let key = value_key(doc.get(indexed).unwrap_or(&NULL));
                if let Some(bucket) = index.get_mut(&key) {
                    bucket.retain(|existing| existing != id);
                    if bucket.is_empty() {
                        index.remove(&key);
                    }
                }
            }
        }
        ids.len()
    }

    pub fn to_snapshot(&self) -> CollectionSnapshot {
        let documents = self
            .documents
            .iter()
            .map(|(id, doc)| {
                let mut doc = doc.clone();
                doc.insert(DOC_ID_FIELD.to_string(), Value::from(*id));
                Value::Object(doc)
            })
            .collect();
        CollectionSnapshot {
            name: self.name.clone(),
            options: self.options.clone(),
            next_id: self.next_id,
            documents,
        }
    }

    /// Rebuild a collection, re-deriving unique keys and indices from the documents.
    pub fn from_snapshot(snapshot: CollectionSnapshot) -> Result<Self, EngineError> {
        let mut collection = Collection::new(&snapshot.name, snapshot.options);
        let mut next_id = snapshot.next_id.max(1);
        for document in snapshot.documents {
            let Value::Object(mut doc) = document else {
                return Err(EngineError::NotAnObject(collection.name.clone()));
            };
            let id = match doc.remove(DOC_ID_FIELD).and_then(|v| v.as_u64()) {
                Some(id) => id,
                None => next_id,
            };
            collection.insert_with_id(id, doc)?;
            next_id = next_id.max(id + 1);
        }
        collection.next_id = next_id;
        Ok(collection)
    }
}
