//! Collection Registry
//!
//! Routes node types to physical collections and remembers which collection
//! owns each node id. Both lookups go through indexed meta-collections.
//!
//! The registry borrows the engine from the active session; it holds no state
//! of its own and takes no locks. Concurrent first-time registrations of the
//! same type are settled by the type index's unique constraint.

use crate::engine::{CollectionOptions, Engine};
use crate::error::{EngineError, StoreError};
use crate::schema::{
    type_collection_name, FIELD_COLLECTION_NAME, FIELD_ID, FIELD_TYPE, NODE_META, NODE_TYPES,
};
use crate::types::{CollectionName, TypeName};
use serde_json::{json, Value};

/// One routing entry from the type index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub type_name: TypeName,
    pub collection_name: CollectionName,
}

fn collection_name_of(doc: &Value) -> Option<CollectionName> {
    doc.get(FIELD_COLLECTION_NAME)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Registry view over an engine whose meta-collections have been ensured.
#[derive(Debug, Clone, Copy)]
pub struct CollectionRegistry<'a> {
    engine: &'a Engine,
}

impl<'a> CollectionRegistry<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    /// Collection holding nodes of `type_name`, creating the collection and
    /// its type-index entry on first use.
    pub fn resolve_collection_for_type(&self, type_name: &str) -> Result<CollectionName, StoreError> {
        if let Some(existing) = self.lookup_collection_for_type(type_name)? {
            return Ok(existing);
        }
        self.create_type_entry(type_name)
    }

    /// Create the type collection and insert its type-index entry. If another
    /// resolver inserted the entry first, its collection name is returned.
    fn create_type_entry(&self, type_name: &str) -> Result<CollectionName, StoreError> {
        let collection_name = type_collection_name(type_name);
        if self
            .engine
            .add_collection(&collection_name, CollectionOptions::new().index(FIELD_ID))
        {
            tracing::debug!("Created type collection {} for {}", collection_name, type_name);
        }

        let entry = json!({
            FIELD_TYPE: type_name,
            FIELD_COLLECTION_NAME: collection_name,
        });
        match self.engine.insert(NODE_TYPES, entry) {
            Ok(_) => Ok(collection_name),
            Err(EngineError::UniqueViolation { .. }) => {
                // Lost a race with another resolver; its entry wins.
                tracing::debug!("Type {} registered concurrently, reusing entry", type_name);
                self.lookup_collection_for_type(type_name)?.ok_or_else(|| {
                    StoreError::StorageUnavailable(EngineError::CollectionNotFound(
                        NODE_TYPES.to_string(),
                    ))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record that node `id` lives in `collection_name`.
    ///
    /// Re-recording the same mapping is a no-op; mapping an id to a second
    /// collection fails with `DuplicateId`.
    pub fn record_collection_for_id(&self, id: &str, collection_name: &str) -> Result<(), StoreError> {
        let entry = json!({
            FIELD_ID: id,
            FIELD_COLLECTION_NAME: collection_name,
        });
        match self.engine.insert(NODE_META, entry) {
            Ok(_) => Ok(()),
            Err(EngineError::UniqueViolation { .. }) => {
                let existing = self.lookup_collection_for_id(id)?.unwrap_or_default();
                if existing == collection_name {
                    return Ok(());
                }
                Err(StoreError::DuplicateId {
                    id: id.to_string(),
                    existing,
                    requested: collection_name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn lookup_collection_for_id(&self, id: &str) -> Result<Option<CollectionName>, StoreError> {
        let doc = self.engine.find_one(NODE_META, FIELD_ID, &json!(id))?;
        Ok(doc.as_ref().and_then(collection_name_of))
    }

    pub fn lookup_collection_for_type(&self, type_name: &str) -> Result<Option<CollectionName>, StoreError> {
        let doc = self.engine.find_one(NODE_TYPES, FIELD_TYPE, &json!(type_name))?;
        Ok(doc.as_ref().and_then(collection_name_of))
    }

    /// Drop the id-index entry for a deleted node. Returns whether one existed.
    pub fn forget_id(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.engine.remove_where(NODE_META, FIELD_ID, &json!(id))?;
        Ok(removed > 0)
    }

    /// Every registered type, ordered by type name under the engine's comparator.
    pub fn known_types(&self) -> Result<Vec<TypeEntry>, StoreError> {
        let docs = self.engine.find_sorted(NODE_TYPES, FIELD_TYPE)?;
        Ok(docs
            .iter()
            .filter_map(|doc| {
                Some(TypeEntry {
                    type_name: doc.get(FIELD_TYPE)?.as_str()?.to_string(),
                    collection_name: collection_name_of(doc)?,
                })
            })
            .collect())
    }

    /// Convenience for the CRUD layer: resolve the type's collection and record `id` in it.
    pub fn register_node(&self, id: &str, type_name: &str) -> Result<CollectionName, StoreError> {
        let collection_name = self.resolve_collection_for_type(type_name)?;
        self.record_collection_for_id(id, &collection_name)?;
        Ok(collection_name)
    }
}
