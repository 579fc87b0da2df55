//! Configuration for the task dashboard binary.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/task-dashboard/config.toml`)
//! 4. Compiled defaults

use std::path::{Path, PathBuf};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    client: ClientFileConfig,
    logging: LoggingFileConfig,
}

/// `[server]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    db_path: Option<PathBuf>,
    static_dir: Option<PathBuf>,
}

/// `[client]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ClientFileConfig {
    api_base: Option<String>,
    cache_dir: Option<PathBuf>,
}

/// `[logging]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LoggingFileConfig {
    level: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// Arguments shared by every subcommand.
#[derive(clap::Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to config file (default: `~/.config/task-dashboard/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Address the backend binds to.
    #[arg(long, global = true, env = "TASKS_BIND")]
    pub bind: Option<String>,

    /// JSON database file used by the backend.
    #[arg(long, global = true, env = "TASKS_DB")]
    pub db: Option<PathBuf>,

    /// Directory of static files served at `/`.
    #[arg(long, global = true)]
    pub static_dir: Option<PathBuf>,

    /// API root the client talks to.
    #[arg(long, global = true, env = "TASKS_API")]
    pub api: Option<String>,

    /// Directory of the local task cache.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error). Default: info.
    #[arg(long, global = true, env = "TASKS_LOG")]
    pub log_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub api_base: String,
    pub cache_dir: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            db_path: PathBuf::from(crate::store::DEFAULT_DB_PATH),
            static_dir: PathBuf::from("static"),
            api_base: "http://127.0.0.1:3000/api".to_string(),
            cache_dir: dirs::cache_dir()
                .map(|d| d.join("task-dashboard"))
                .unwrap_or_else(|| PathBuf::from(".cache/task-dashboard")),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// An explicit `--config` that cannot be read is an error; a missing
    /// file at the default location is treated as empty.
    pub fn load(cli: &GlobalArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI (or env) > file > default.
    fn resolve(cli: &GlobalArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            db_path: cli
                .db
                .clone()
                .or_else(|| file.server.db_path.clone())
                .unwrap_or(defaults.db_path),
            static_dir: cli
                .static_dir
                .clone()
                .or_else(|| file.server.static_dir.clone())
                .unwrap_or(defaults.static_dir),
            api_base: cli
                .api
                .clone()
                .or_else(|| file.client.api_base.clone())
                .unwrap_or(defaults.api_base),
            cache_dir: cli
                .cache_dir
                .clone()
                .or_else(|| file.client.cache_dir.clone())
                .unwrap_or(defaults.cache_dir),
            log_level: cli
                .log_level
                .clone()
                .or_else(|| file.logging.level.clone())
                .unwrap_or(defaults.log_level),
        }
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("task-dashboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
