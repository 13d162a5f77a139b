//! Application configuration module
//!
//! Manages application configuration loaded from config.json.
//! Creates a default config file on first run.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Global configuration instance
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

const CONFIG_FILE: &str = "config.json";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Auction sources and their database files
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Data directory path; auction databases and lot images live under it
    pub data_dir: String,
}

/// One auction house entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source display name, must match a registered adapter
    pub name: String,
    /// Database file path (relative to data_dir)
    pub db_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            sources: default_sources(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8190,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "Adalex".to_string(),
            db_file: "adalex/lots.db".to_string(),
        },
        SourceConfig {
            name: "Aurora".to_string(),
            db_file: "aurora/lots.db".to_string(),
        },
        SourceConfig {
            name: "Redkie Monety".to_string(),
            db_file: "redkie_monety/lots.db".to_string(),
        },
    ]
}

impl AppConfig {
    /// Get the full data directory path
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.database.data_dir)
    }

    /// Resolve a source's database file against the data directory
    pub fn source_db_path(&self, source: &SourceConfig) -> PathBuf {
        self.get_data_dir().join(&source.db_file)
    }
}

/// Load configuration from config.json, creating it with defaults when missing
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = Path::new(CONFIG_FILE);
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)?
    } else {
        let config = AppConfig::default();
        std::fs::write(path, serde_json::to_string_pretty(&config)?)?;
        tracing::info!("Created default config file: {}", CONFIG_FILE);
        config
    };

    CONFIG.get_or_init(|| Arc::new(RwLock::new(config.clone())));
    Ok(config)
}

/// Get a copy of the current configuration
pub fn config() -> AppConfig {
    CONFIG
        .get_or_init(|| Arc::new(RwLock::new(AppConfig::default())))
        .read()
        .clone()
}
