//! Table reconciliation.
//!
//! Computes the three-way mapping between the schema registry and the live
//! set of table names in the relational store: matched, schema-only and
//! database-only. Reconciliation itself is a pure function; listing the
//! live tables is the only database access.

use std::collections::BTreeSet;

use common::config::AppConfig;
use common::errors::AppResult;
use common::models::{MatchedTable, ReconciliationResult};
use sqlx::{Row, SqlitePool};

use crate::registry::SchemaRegistry;

/// Reconciles registry definitions against live table names.
///
/// Each registry entry is `matched` when its physical name is a member of
/// `live`, otherwise `schema_only`. Live names not claimed by any entry
/// become `database_only`. Empty inputs yield empty result sets.
pub fn reconcile(live: &BTreeSet<String>, registry: &SchemaRegistry) -> ReconciliationResult {
    let mut result = ReconciliationResult::default();
    let mut claimed: BTreeSet<&str> = BTreeSet::new();

    for def in registry.definitions() {
        if live.contains(&def.physical_name) {
            claimed.insert(def.physical_name.as_str());
            result.matched.push(MatchedTable {
                logical_name: def.logical_name.clone(),
                physical_name: def.physical_name.clone(),
            });
        } else {
            result.schema_only.push(def.logical_name.clone());
        }
    }

    result.database_only = live
        .iter()
        .filter(|name| !claimed.contains(name.as_str()))
        .cloned()
        .collect();

    result
}

/// Lists live table names from the relational store.
///
/// Internal system tables are filtered out using the configured exclusion
/// list (name prefixes plus exact names such as the sequence-tracking table).
pub struct TableInspector<'a> {
    pool: &'a SqlitePool,
    config: &'a AppConfig,
}

impl<'a> TableInspector<'a> {
    pub fn new(pool: &'a SqlitePool, config: &'a AppConfig) -> Self {
        Self { pool, config }
    }

    /// Returns the live, non-internal table names.
    pub async fn live_tables(&self) -> AppResult<BTreeSet<String>> {
        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(self.pool)
            .await?;

        let mut names = BTreeSet::new();
        for row in &rows {
            let name: String = row.try_get("name")?;
            if self.is_internal(&name) {
                continue;
            }
            names.insert(name);
        }
        Ok(names)
    }

    fn is_internal(&self, name: &str) -> bool {
        self.config
            .excluded_table_prefixes
            .iter()
            .any(|p| name.starts_with(p.as_str()))
            || self
                .config
                .excluded_table_names
                .iter()
                .any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{ColumnDefinition, ColumnType, TableDefinition};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .register(
                TableDefinition::new("systemConfig")
                    .column(ColumnDefinition::new("id", ColumnType::Integer).primary_key()),
            )
            .register(
                TableDefinition::new("systemLog")
                    .column(ColumnDefinition::new("id", ColumnType::Integer).primary_key()),
            )
    }

    fn live(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_way_partition() {
        let result = reconcile(&live(&["system_config", "backup_log"]), &registry());

        assert_eq!(
            result.matched,
            vec![MatchedTable {
                logical_name: "systemConfig".into(),
                physical_name: "system_config".into(),
            }]
        );
        assert_eq!(result.schema_only, vec!["systemLog".to_string()]);
        assert_eq!(result.database_only, vec!["backup_log".to_string()]);
    }

    #[test]
    fn test_empty_inputs_yield_empty_result() {
        let result = reconcile(&BTreeSet::new(), &SchemaRegistry::new());
        assert!(result.matched.is_empty());
        assert!(result.schema_only.is_empty());
        assert!(result.database_only.is_empty());
    }

    #[test]
    fn test_every_live_name_appears_exactly_once() {
        let live = live(&["system_config", "system_log", "orphan_a", "orphan_b"]);
        let result = reconcile(&live, &registry());

        let mut seen: Vec<String> = result
            .matched
            .iter()
            .map(|m| m.physical_name.clone())
            .chain(result.database_only.iter().cloned())
            .collect();
        seen.sort();
        let mut expected: Vec<String> = live.into_iter().collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_explicit_physical_name_is_honored() {
        let registry = SchemaRegistry::new().register(
            TableDefinition::new("auditTrail")
                .physical("audit_events")
                .column(ColumnDefinition::new("id", ColumnType::Integer).primary_key()),
        );

        let result = reconcile(&live(&["audit_events"]), &registry);
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].physical_name, "audit_events");
        assert!(result.schema_only.is_empty());
        assert!(result.database_only.is_empty());

        // Absent from the live set -> schema_only, regardless of input order.
        let result = reconcile(&live(&["zzz", "aaa"]), &registry);
        assert_eq!(result.schema_only, vec!["auditTrail".to_string()]);
        assert_eq!(result.database_only, vec!["aaa".to_string(), "zzz".to_string()]);
    }
}
