//! CLI Tooling
//!
//! Inspect and edit the routing indices of a saved store from the command line.

use crate::error::StoreError;
use crate::lifecycle::{StartOptions, StoreSession};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use std::path::PathBuf;

/// nodedb - per-type node collections over an embedded document store
#[derive(Parser)]
#[command(name = "nodedb")]
#[command(about = "Inspect and edit node routing indices of a saved store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Snapshot file (overrides config and NODEDB_SAVE_FILE)
    #[arg(long)]
    pub save_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List registered node types and their collections
    Types {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List physical collections with document counts
    Collections,
    /// Show the collection that owns a node id
    LookupId { id: String },
    /// Show the collection for a node type
    LookupType {
        #[arg(value_name = "TYPE")]
        type_name: String,
    },
    /// Route a node type (and optionally an id) and save
    Register {
        #[arg(long = "type", value_name = "TYPE")]
        type_name: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove the id-index entry of a deleted node and save
    Forget { id: String },
}

/// Session-backed command executor.
pub struct CliContext {
    session: StoreSession,
}

impl CliContext {
    pub async fn open(options: StartOptions) -> Result<Self, StoreError> {
        let mut session = StoreSession::new();
        session.start(options).await?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &StoreSession {
        &self.session
    }

    /// Run one command and return its printable output.
    pub async fn execute(&self, command: &Commands) -> Result<String, StoreError> {
        let registry = self.session.registry()?;
        match command {
            Commands::Types { format } => {
                let entries = registry.known_types()?;
                match format.as_str() {
                    "json" => {
                        let rows: Vec<serde_json::Value> = entries
                            .iter()
                            .map(|e| {
                                serde_json::json!({
                                    "type": e.type_name,
                                    "collectionName": e.collection_name,
                                })
                            })
                            .collect();
                        Ok(serde_json::Value::Array(rows).to_string())
                    }
                    "text" => {
                        let mut table = Table::new();
                        table.set_header(vec!["Type", "Collection"]);
                        for entry in &entries {
                            table.add_row(vec![&entry.type_name, &entry.collection_name]);
                        }
                        Ok(table.to_string())
                    }
                    other => Err(StoreError::InvalidArgument(format!(
                        "Unknown format: {} (must be 'text' or 'json')",
                        other
                    ))),
                }
            }
            Commands::Collections => {
                let engine = registry.engine();
                let mut table = Table::new();
                table.set_header(vec!["Collection", "Documents"]);
                for name in engine.collection_names() {
                    let count = engine.count(&name)?;
                    table.add_row(vec![name, count.to_string()]);
                }
                Ok(table.to_string())
            }
            Commands::LookupId { id } => Ok(registry
                .lookup_collection_for_id(id)?
                .unwrap_or_else(|| format!("not found: {}", id))),
            Commands::LookupType { type_name } => Ok(registry
                .lookup_collection_for_type(type_name)?
                .unwrap_or_else(|| format!("not found: {}", type_name))),
            Commands::Register { type_name, id } => {
                self.require_save_file()?;
                let collection = match id {
                    Some(id) => registry.register_node(id, type_name)?,
                    None => registry.resolve_collection_for_type(type_name)?,
                };
                self.session.save().await?;
                Ok(collection)
            }
            Commands::Forget { id } => {
                self.require_save_file()?;
                let removed = registry.forget_id(id)?;
                self.session.save().await?;
                Ok(if removed {
                    format!("forgot {}", id)
                } else {
                    format!("not found: {}", id)
                })
            }
        }
    }

    /// Mutating commands would be lost without a save file, so refuse them up front.
    fn require_save_file(&self) -> Result<(), StoreError> {
        let persistent = self
            .session
            .handle()
            .is_some_and(|engine| engine.filename().is_some());
        if !persistent {
            return Err(StoreError::NoActiveDatabase(
                "in-memory session has no save file",
            ));
        }
        Ok(())
    }
}
