//! Utility functions and helpers.

pub mod casing;

// Re-export commonly used functions
pub use casing::{camel_to_snake, snake_to_camel};
