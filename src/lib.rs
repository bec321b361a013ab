//! nodedb: Per-Type Node Collections
//!
//! Routes dynamically-typed nodes into one collection per type inside an
//! embedded document engine, keeps id -> collection and type -> collection
//! indices, and manages the load-or-create / save lifecycle of the store.

pub mod cli;
pub mod comparator;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod registry;
pub mod schema;
pub mod types;

pub use comparator::{Comparator, LegacyComparator};
pub use engine::{CollectionOptions, Engine};
pub use error::{EngineError, StoreError};
pub use lifecycle::{StartOptions, StoreSession};
pub use registry::{CollectionRegistry, TypeEntry};
