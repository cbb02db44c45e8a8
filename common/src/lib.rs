//! Shared building blocks for the storage API service.
//!
//! Contains the response envelope, error taxonomy, configuration loader,
//! HTTP middleware, data models and casing utilities.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
