//! Integration tests for the node collection registry and store lifecycle

mod cli_commands;
mod lifecycle_roundtrip;
mod registry_concurrency;
