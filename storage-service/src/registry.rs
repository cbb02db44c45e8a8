//! Schema registry.
//!
//! An immutable mapping from logical (camelCase) table names to their
//! definitions, constructed once at startup and shared through application
//! state. Resolution of user-supplied names lives here: direct lookup first,
//! then a snake_case -> camelCase retry.

use std::collections::BTreeMap;

use common::models::{ColumnDefinition, ColumnType, OrderBy, TableDefinition};
use common::utils::snake_to_camel;

/// Immutable registry of table definitions keyed by logical name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableDefinition>,
}

/// Outcome of resolving a user-supplied logical name or alias.
pub enum Resolution<'a> {
    /// The name resolved to a registered definition.
    Found(&'a TableDefinition),
    /// The name is unknown; `suggestion` is the inverse-transform candidate
    /// when that candidate is itself a registry key.
    Miss { suggestion: Option<String> },
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table definition. The logical name must be unique; a duplicate
    /// replaces the earlier definition.
    pub fn register(mut self, def: TableDefinition) -> Self {
        self.tables.insert(def.logical_name.clone(), def);
        self
    }

    /// Registry with the built-in system tables.
    pub fn with_system_tables() -> Self {
        Self::new()
            .register(
                TableDefinition::new("systemConfig")
                    .column(ColumnDefinition::new("id", ColumnType::Integer).primary_key())
                    .column(ColumnDefinition::new("key", ColumnType::Text).not_null())
                    .column(ColumnDefinition::new("value", ColumnType::Text).not_null())
                    .column(ColumnDefinition::new("description", ColumnType::Text))
                    .column(
                        ColumnDefinition::new("created_at", ColumnType::Timestamp)
                            .not_null()
                            .default_sql("CURRENT_TIMESTAMP"),
                    )
                    .column(
                        ColumnDefinition::new("updated_at", ColumnType::Timestamp)
                            .not_null()
                            .default_sql("CURRENT_TIMESTAMP"),
                    ),
            )
            .register(
                TableDefinition::new("systemLog")
                    .column(ColumnDefinition::new("id", ColumnType::Integer).primary_key())
                    .column(ColumnDefinition::new("level", ColumnType::Text).not_null())
                    .column(ColumnDefinition::new("message", ColumnType::Text).not_null())
                    .column(ColumnDefinition::new("context", ColumnType::Text))
                    .column(
                        ColumnDefinition::new("created_at", ColumnType::Timestamp)
                            .not_null()
                            .default_sql("CURRENT_TIMESTAMP"),
                    )
                    .order_by(OrderBy::desc("created_at")),
            )
            .register(
                TableDefinition::new("backupLog")
                    .column(ColumnDefinition::new("id", ColumnType::Integer).primary_key())
                    .column(ColumnDefinition::new("file_name", ColumnType::Text).not_null())
                    .column(
                        ColumnDefinition::new("backup_time", ColumnType::Timestamp)
                            .not_null()
                            .default_sql("CURRENT_TIMESTAMP"),
                    )
                    .column(ColumnDefinition::new("operator", ColumnType::Text))
                    .order_by(OrderBy::desc("backup_time")),
            )
    }

    /// Looks up a definition by its exact logical name.
    pub fn get(&self, logical_name: &str) -> Option<&TableDefinition> {
        self.tables.get(logical_name)
    }

    /// Resolves a user-supplied name: exact logical name first, then the
    /// snake_case -> camelCase transform of it.
    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        if let Some(def) = self.tables.get(name) {
            return Resolution::Found(def);
        }

        let candidate = snake_to_camel(name);
        if candidate != name {
            if let Some(def) = self.tables.get(&candidate) {
                return Resolution::Found(def);
            }
        }

        // Best-effort "did you mean": the transformed candidate, when it
        // names a registered table.
        let suggestion = self.tables.contains_key(&candidate).then_some(candidate);
        Resolution::Miss { suggestion }
    }

    /// All registered logical names, sorted.
    pub fn logical_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Iterates over all definitions in logical-name order.
    pub fn definitions(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table is registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
