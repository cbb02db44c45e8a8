//! Shared data models.

pub mod page;
pub mod schema;

// Re-export commonly used types
pub use page::{Direction, OrderBy, PageQuery};
pub use schema::{ColumnDefinition, ColumnType, MatchedTable, ReconciliationResult, TableDefinition};
