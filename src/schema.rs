//! Meta-Collection Schema
//!
//! The two index collections that route nodes to their type collection.

use crate::engine::{CollectionOptions, Engine};
use crate::error::EngineError;

/// Prefix shared by every per-type collection name.
pub const TYPE_COLLECTION_PREFIX: &str = "gatsby:nodeType:";

/// id -> collectionName
pub const NODE_META: &str = "gatsby:nodeMeta";

/// type -> collectionName
pub const NODE_TYPES: &str = "gatsby:nodeTypes";

pub const FIELD_ID: &str = "id";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_COLLECTION_NAME: &str = "collectionName";

/// Static description of one meta-collection.
#[derive(Debug, Clone, Copy)]
pub struct MetaCollection {
    pub name: &'static str,
    pub unique: &'static [&'static str],
    pub index: &'static str,
}

impl MetaCollection {
    pub fn options(&self) -> CollectionOptions {
        CollectionOptions::new().unique(self.unique).index(self.index)
    }
}

pub const ID_INDEX: MetaCollection = MetaCollection {
    name: NODE_META,
    unique: &[FIELD_ID],
    index: FIELD_ID,
};

pub const TYPE_INDEX: MetaCollection = MetaCollection {
    name: NODE_TYPES,
    unique: &[FIELD_TYPE, FIELD_COLLECTION_NAME],
    index: FIELD_TYPE,
};

pub const META_COLLECTIONS: [MetaCollection; 2] = [ID_INDEX, TYPE_INDEX];

/// Physical collection name for a node type. Deterministic; no normalization.
pub fn type_collection_name(type_name: &str) -> String {
    format!("{}{}", TYPE_COLLECTION_PREFIX, type_name)
}

/// Create any meta-collection missing from `engine`. Safe to call repeatedly.
///
/// A meta-collection that already exists (e.g. loaded from a snapshot) must
/// carry exactly the declared options, otherwise its unique guarantees cannot
/// be relied on and `OptionsMismatch` is returned.
pub fn ensure_meta_collections(engine: &Engine) -> Result<(), EngineError> {
    for meta in META_COLLECTIONS {
        let expected = meta.options();
        if engine.add_collection(meta.name, expected.clone()) {
            tracing::debug!("Created meta collection {}", meta.name);
            continue;
        }
        let found = engine
            .collection_options(meta.name)
            .ok_or_else(|| EngineError::CollectionNotFound(meta.name.to_string()))?;
        if found != expected {
            return Err(EngineError::OptionsMismatch {
                collection: meta.name.to_string(),
                expected: format!("{:?}", expected),
                found: format!("{:?}", found),
            });
        }
    }
    Ok(())
}
