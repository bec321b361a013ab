//! Core types for the node collection registry.

/// TypeName: Declared type of a node (e.g. "Post"). Case-sensitive, never normalized.
pub type TypeName = String;

/// CollectionName: Physical collection identifier inside the engine.
pub type CollectionName = String;
