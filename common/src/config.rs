//! Application configuration.
//!
//! Loads configuration from environment variables, with per-deployment-target
//! defaults (dev / preview / prod). A best-effort `.env` loader is provided
//! for local development.

use std::path::PathBuf;

/// Deployment target, selected by the `APP_ENV` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployEnv {
    /// Local development (default).
    Dev,
    /// Preview deployment.
    Preview,
    /// Production deployment.
    Prod,
}

impl DeployEnv {
    fn from_env() -> Self {
        match std::env::var("APP_ENV").unwrap_or_default().as_str() {
            "prod" | "production" => DeployEnv::Prod,
            "preview" => DeployEnv::Preview,
            _ => DeployEnv::Dev,
        }
    }

    /// Short name used for default data paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployEnv::Dev => "dev",
            DeployEnv::Preview => "preview",
            DeployEnv::Prod => "prod",
        }
    }
}

/// Application configuration shared across components.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment target.
    pub env: DeployEnv,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// SQLite connection URL for the relational store.
    pub database_url: String,
    /// Redis connection URL for the key-value store (optional binding).
    pub redis_url: Option<String>,
    /// Root directory of the filesystem blob store.
    pub blob_root: PathBuf,
    /// Live table names starting with any of these prefixes are treated as
    /// internal system tables and excluded from reconciliation.
    pub excluded_table_prefixes: Vec<String>,
    /// Exact table names excluded from reconciliation.
    pub excluded_table_names: Vec<String>,
    /// Maximum SQLite pool connections.
    pub max_connections: u32,
}

impl AppConfig {
    /// Loads configuration from the environment.
    pub fn load() -> Self {
        let env = DeployEnv::from_env();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite:data/{}.db?mode=rwc", env.as_str()));

        let blob_root = std::env::var("BLOB_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(format!("data/blobs-{}", env.as_str())));

        Self {
            env,
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            database_url,
            redis_url: std::env::var("REDIS_URL").ok(),
            blob_root,
            excluded_table_prefixes: csv_env("TABLE_EXCLUDE_PREFIXES", &["_cf_"]),
            excluded_table_names: csv_env("TABLE_EXCLUDE_NAMES", &["sqlite_sequence"]),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }
}

/// Reads a comma-separated list variable, falling back to defaults.
fn csv_env(key: &str, defaults: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(v) => v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => defaults.iter().map(|s| s.to_string()).collect(),
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if env_path.exists() {
        if let Ok(content) = std::fs::read_to_string(env_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim();
                    // Only set if not already set by the environment
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
        }
    }
}
