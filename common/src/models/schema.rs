//! Schema definition models.
//!
//! Table definitions are built at process startup from static configuration
//! and are immutable afterwards. The physical name is always an explicit
//! field: nothing is guessed at runtime.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::page::OrderBy;
use crate::utils::casing::camel_to_snake;

/// SQLite column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// INTEGER affinity.
    Integer,
    /// TEXT affinity.
    Text,
    /// Timestamp stored with INTEGER affinity.
    Timestamp,
}

impl ColumnType {
    fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Timestamp => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

/// A single column of a table definition.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column name (snake_case, as in the physical table).
    pub name: String,
    /// Column type.
    pub col_type: ColumnType,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// SQL default expression, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_sql: Option<String>,
    /// Whether this is the auto-incrementing primary key.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
}

impl ColumnDefinition {
    /// Creates a nullable column of the given type.
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
            nullable: true,
            default_sql: None,
            primary_key: false,
        }
    }

    /// Marks the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets a SQL default expression.
    pub fn default_sql(mut self, expr: impl Into<String>) -> Self {
        self.default_sql = Some(expr.into());
        self
    }

    /// Marks the column as the auto-increment primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    fn render_ddl(&self) -> String {
        let mut out = format!("`{}` {}", self.name, self.col_type.as_sql());
        if self.primary_key {
            out.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else if !self.nullable {
            out.push_str(" NOT NULL");
        }
        if let Some(expr) = &self.default_sql {
            out.push_str(" DEFAULT ");
            out.push_str(expr);
        }
        out
    }
}

/// Static definition of one table: logical (camelCase) name, physical
/// (snake_case) SQL name, and its ordered columns.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    /// Identifier used in application code and API paths.
    pub logical_name: String,
    /// Identifier used by the relational store.
    pub physical_name: String,
    /// Ordered column definitions.
    pub columns: Vec<ColumnDefinition>,
    /// Default ordering for row scans (set for log-type tables).
    #[serde(skip)]
    pub default_order: Option<OrderBy>,
}

impl TableDefinition {
    /// Creates a definition whose physical name is derived from the logical
    /// name via the camelCase -> snake_case transform.
    pub fn new(logical_name: impl Into<String>) -> Self {
        let logical_name = logical_name.into();
        let physical_name = camel_to_snake(&logical_name);
        Self {
            logical_name,
            physical_name,
            columns: Vec::new(),
            default_order: None,
        }
    }

    /// Overrides the derived physical name with an explicit one.
    pub fn physical(mut self, name: impl Into<String>) -> Self {
        self.physical_name = name.into();
        self
    }

    /// Appends a column.
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the default row-scan ordering.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.default_order = Some(order);
        self
    }

    /// Returns true if the table has a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Renders `CREATE TABLE IF NOT EXISTS` DDL for this definition.
    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| c.render_ddl()).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS `{}` ({})",
            self.physical_name,
            columns.join(", ")
        )
    }
}

/// One logical/physical pair present both in the registry and the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchedTable {
    /// Registry-side logical name.
    pub logical_name: String,
    /// Database-side physical name.
    pub physical_name: String,
}

/// Three-way mapping between the schema registry and live database tables.
///
/// Invariant: every live physical name appears in exactly one of
/// `matched`/`database_only`; every logical name in exactly one of
/// `matched`/`schema_only`.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// Defined in the registry and present in the database.
    pub matched: Vec<MatchedTable>,
    /// Defined in the registry but absent from the database.
    pub schema_only: Vec<String>,
    /// Present in the database with no matching definition.
    pub database_only: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_name_derived_from_logical() {
        let def = TableDefinition::new("systemConfig");
        assert_eq!(def.physical_name, "system_config");
    }

    #[test]
    fn test_explicit_physical_name_wins() {
        let def = TableDefinition::new("systemConfig").physical("cfg");
        assert_eq!(def.physical_name, "cfg");
    }

    #[test]
    fn test_create_table_sql() {
        let def = TableDefinition::new("systemLog")
            .column(ColumnDefinition::new("id", ColumnType::Integer).primary_key())
            .column(ColumnDefinition::new("level", ColumnType::Text).not_null())
            .column(
                ColumnDefinition::new("created_at", ColumnType::Timestamp)
                    .not_null()
                    .default_sql("CURRENT_TIMESTAMP"),
            );

        let sql = def.create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `system_log`"));
        assert!(sql.contains("`id` INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("`level` TEXT NOT NULL"));
        assert!(sql.contains("`created_at` INTEGER NOT NULL DEFAULT CURRENT_TIMESTAMP"));
    }
}
