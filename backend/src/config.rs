//! # Configuration
//!
//! Process configuration, resolved once at startup.
//!
//! Values come from an optional YAML file (path in `CASHBOOK_CONFIG`) and are
//! then overridden by individual environment variables:
//!
//! ```yaml
//! db:
//!   type: sqlite            # CASHBOOK_DB_TYPE: "document" or "sqlite"
//!   document:
//!     path: /var/lib/cashbook   # CASHBOOK_DOCUMENT_PATH
//!   sqlite:
//!     url: sqlite://cashbook.db # CASHBOOK_SQLITE_URL
//! storage:
//!   timeout_ms: 5000        # CASHBOOK_STORAGE_TIMEOUT_MS
//! cache:
//!   enabled: true           # CASHBOOK_CACHE_ENABLED
//! server:
//!   port: 3000              # CASHBOOK_PORT
//! log:
//!   filter: info            # RUST_LOG
//! ```
//!
//! Any error here is fatal: the server refuses to start.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE_ENV: &str = "CASHBOOK_CONFIG";
pub const DB_TYPE_ENV: &str = "CASHBOOK_DB_TYPE";
pub const DOCUMENT_PATH_ENV: &str = "CASHBOOK_DOCUMENT_PATH";
pub const SQLITE_URL_ENV: &str = "CASHBOOK_SQLITE_URL";
pub const STORAGE_TIMEOUT_ENV: &str = "CASHBOOK_STORAGE_TIMEOUT_MS";
pub const CACHE_ENABLED_ENV: &str = "CASHBOOK_CACHE_ENABLED";
pub const PORT_ENV: &str = "CASHBOOK_PORT";
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

const DEFAULT_SQLITE_URL: &str = "sqlite://cashbook.db";
const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported storage backend '{0}', expected 'document' or 'sqlite'")]
    UnsupportedStorage(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read config file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    ParseFile {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Storage engine selected by `db.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Document,
    Sqlite,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Document => "document",
            StorageKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(StorageKind::Document),
            "sqlite" => Ok(StorageKind::Sqlite),
            _ => Err(ConfigError::UnsupportedStorage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub document_path: PathBuf,
    pub sqlite_url: String,
    pub timeout_ms: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub cache_enabled: bool,
    pub port: u16,
    pub log_filter: String,
}

// Shape of the YAML file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    db: DbSection,
    storage: StorageSection,
    cache: CacheSection,
    server: ServerSection,
    log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DbSection {
    #[serde(rename = "type")]
    kind: Option<String>,
    document: DocumentSection,
    sqlite: SqliteSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DocumentSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SqliteSection {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageSection {
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CacheSection {
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogSection {
    filter: Option<String>,
}

fn default_document_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("cashbook"))
        .unwrap_or_else(|| PathBuf::from("cashbook-data"))
}

fn parse_value<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

impl AppConfig {
    /// Resolve configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup(CONFIG_FILE_ENV).filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::read_file(Path::new(&path))?,
            None => FileConfig::default(),
        };
        Self::resolve(file, lookup)
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        // An empty file is a valid, empty configuration
        if content.trim().is_empty() {
            return Ok(FileConfig::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match lookup(DB_TYPE_ENV).or(file.db.kind) {
            Some(value) => value.parse::<StorageKind>()?,
            None => StorageKind::Document,
        };

        let document_path = lookup(DOCUMENT_PATH_ENV)
            .map(PathBuf::from)
            .or(file.db.document.path)
            .unwrap_or_else(default_document_path);

        let sqlite_url = lookup(SQLITE_URL_ENV)
            .or(file.db.sqlite.url)
            .unwrap_or_else(|| DEFAULT_SQLITE_URL.to_string());

        let timeout_ms = match lookup(STORAGE_TIMEOUT_ENV) {
            Some(value) => parse_value(STORAGE_TIMEOUT_ENV, value)?,
            None => file.storage.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        };
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: STORAGE_TIMEOUT_ENV,
                value: timeout_ms.to_string(),
            });
        }

        let cache_enabled = match lookup(CACHE_ENABLED_ENV) {
            Some(value) => parse_bool(CACHE_ENABLED_ENV, value)?,
            None => file.cache.enabled.unwrap_or(true),
        };

        let port = match lookup(PORT_ENV) {
            Some(value) => parse_value(PORT_ENV, value)?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };

        let log_filter = lookup(LOG_FILTER_ENV)
            .or(file.log.filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            storage: StorageConfig {
                kind,
                document_path,
                sqlite_url,
                timeout_ms,
            },
            cache_enabled,
            port,
            log_filter,
        })
    }
}
