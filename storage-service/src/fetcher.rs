//! Generic row fetcher.
//!
//! Resolves a user-supplied logical name (or snake_case alias) against the
//! schema registry and executes an unfiltered row scan, optionally sliced by
//! a page and ordered by a column. Read-only; the reported count is the
//! number of rows in the returned page, not the table cardinality.

use common::errors::{AppError, AppResult};
use common::models::{OrderBy, PageQuery, TableDefinition};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool};

use crate::registry::{Resolution, SchemaRegistry};

/// A fetched row: column name -> JSON value.
pub type JsonRow = Map<String, Value>;

/// Executes unfiltered row scans against registry-resolved tables.
pub struct RowFetcher<'a> {
    pool: &'a SqlitePool,
    registry: &'a SchemaRegistry,
}

impl<'a> RowFetcher<'a> {
    pub fn new(pool: &'a SqlitePool, registry: &'a SchemaRegistry) -> Self {
        Self { pool, registry }
    }

    /// Resolves `name` and scans the table.
    ///
    /// Ordering precedence: explicit `order`, then the table's default
    /// order, then none. An order column must exist on the definition.
    pub async fn fetch_rows(
        &self,
        name: &str,
        page: Option<&PageQuery>,
        order: Option<&OrderBy>,
    ) -> AppResult<Vec<JsonRow>> {
        let def = self.resolve(name)?;

        let order = order.or(def.default_order.as_ref());
        if let Some(order) = order {
            if !def.has_column(&order.column) {
                return Err(AppError::BadRequest(format!(
                    "table {} has no column {}",
                    def.logical_name, order.column
                )));
            }
        }

        // Identifiers come from the static registry, never from the request.
        let mut sql = format!("SELECT * FROM `{}`", def.physical_name);
        if let Some(order) = order {
            sql.push_str(&format!(" ORDER BY `{}` {}", order.column, order.direction.as_sql()));
        }
        if page.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(page) = page {
            query = query.bind(page.limit as i64).bind(page.offset());
        }

        let rows = query.fetch_all(self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    fn resolve(&self, name: &str) -> AppResult<&'a TableDefinition> {
        match self.registry.resolve(name) {
            Resolution::Found(def) => Ok(def),
            Resolution::Miss { suggestion } => Err(AppError::TableNotFound {
                name: name.to_string(),
                suggestion,
                valid_names: self.registry.logical_names(),
            }),
        }
    }
}

/// Decodes a SQLite row into a JSON object.
///
/// SQLite values are dynamically typed; each column is tried as integer,
/// real, text and blob in turn. Blobs are hex-encoded.
fn row_to_json(row: &SqliteRow) -> JsonRow {
    let mut map = Map::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
            v.map(|b| Value::from(hex::encode(b))).unwrap_or(Value::Null)
        } else {
            Value::Null
        };
        map.insert(column.name().to_string(), value);
    }
    map
}
