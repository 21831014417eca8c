//! Configuration management for `errorly`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides (`--db`, `--url`, `--shard`)
//! 2. Environment variables (`ERRORLY_DB`, `ERRORLY_URL`, `ERRORLY_SHARD`, `ERRORLY_LOG`)
//! 3. Config file (`--config`, else `errorly.yaml` in the working directory)
//! 4. Defaults

use crate::error::{ErrorlyError, Result};
use crate::util::id::{IdConfig, IdGenerator, MAX_SHARD};
use crate::webhook::HttpTransport;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "errorly.yaml";
const DEFAULT_DB_FILENAME: &str = "errorly.db";
const DEFAULT_URL: &str = "http://127.0.0.1:8080";

/// Outbound webhook HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("errorly/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL for links in webhook messages, without trailing `/`.
    pub url: String,
    pub database: PathBuf,
    pub ids: IdConfig,
    pub webhooks: WebhookSettings,
    pub logging: LoggingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            database: PathBuf::from(DEFAULT_DB_FILENAME),
            ids: IdConfig::default(),
            webhooks: WebhookSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Config {
    /// Parse a YAML config file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or is not valid YAML.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ErrorlyError::Config(format!("{}: {e}", path.display())))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .map_err(|e| ErrorlyError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply a layer on top of this config.
    pub fn apply(&mut self, layer: &ConfigLayer) {
        if let Some(url) = &layer.url {
            self.url.clone_from(url);
        }
        if let Some(database) = &layer.database {
            self.database.clone_from(database);
        }
        if let Some(shard_id) = layer.shard_id {
            self.ids.shard_id = shard_id;
        }
        if let Some(level) = &layer.log_level {
            self.logging.level.clone_from(level);
        }
    }

    /// Build the id generator for this instance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShard` if the shard id does not fit in 13 bits.
    pub fn id_generator(&self) -> Result<IdGenerator> {
        IdGenerator::new(self.ids)
    }

    /// Build the webhook HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn transport(&self) -> Result<HttpTransport> {
        HttpTransport::new(
            Duration::from_secs(self.webhooks.timeout_secs),
            &self.webhooks.user_agent,
        )
        .map_err(|e| ErrorlyError::Config(format!("webhook client: {e}")))
    }
}

/// Sparse overrides from one configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub url: Option<String>,
    pub database: Option<PathBuf>,
    pub shard_id: Option<u16>,
    pub log_level: Option<String>,
}

impl ConfigLayer {
    /// Build a layer from `ERRORLY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `ERRORLY_SHARD` is not a valid shard id.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a layer from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `ERRORLY_SHARD` is not a valid shard id.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let shard_id = non_empty("ERRORLY_SHARD")
            .map(|raw| parse_shard(&raw))
            .transpose()?;

        Ok(Self {
            url: non_empty("ERRORLY_URL"),
            database: non_empty("ERRORLY_DB").map(PathBuf::from),
            shard_id,
            log_level: non_empty("ERRORLY_LOG"),
        })
    }
}

/// CLI overrides for config loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub url: Option<String>,
    pub shard: Option<u16>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        ConfigLayer {
            url: self.url.clone(),
            database: self.db.clone(),
            shard_id: self.shard,
            log_level: None,
        }
    }
}

/// Load configuration with full precedence.
///
/// An explicit `--config` path must exist; the default `errorly.yaml` is
/// optional.
///
/// # Errors
///
/// Returns `Config` for unreadable or invalid files and invalid environment
/// values.
pub fn load_config(overrides: &CliOverrides) -> Result<Config> {
    load_config_with(overrides, &ConfigLayer::from_env()?, Path::new("."))
}

/// [`load_config`] with an explicit environment layer and working directory.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_with(
    overrides: &CliOverrides,
    env_layer: &ConfigLayer,
    cwd: &Path,
) -> Result<Config> {
    let mut config = match &overrides.config {
        Some(path) => Config::from_yaml(path)?,
        None => {
            let default_path = cwd.join(DEFAULT_CONFIG_FILENAME);
            if default_path.exists() {
                Config::from_yaml(&default_path)?
            } else {
                Config::default()
            }
        }
    };

    config.apply(env_layer);
    config.apply(&overrides.as_layer());
    config.url = config.url.trim_end_matches('/').to_string();

    if config.ids.shard_id > MAX_SHARD {
        return Err(ErrorlyError::InvalidShard {
            shard: config.ids.shard_id,
            max: MAX_SHARD,
        });
    }

    debug!(
        database = %config.database.display(),
        url = %config.url,
        shard_id = config.ids.shard_id,
        "Loaded configuration"
    );
    Ok(config)
}

fn parse_shard(raw: &str) -> Result<u16> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| ErrorlyError::Config(format!("ERRORLY_SHARD: not a shard id: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> ConfigLayer {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ConfigLayer::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config =
            load_config_with(&CliOverrides::default(), &ConfigLayer::default(), dir.path())
                .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_yaml_file_partial_keys() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILENAME),
            "url: https://errorly.example/\nids:\n  shard_id: 12\nwebhooks:\n  timeout_secs: 3\n",
        )
        .unwrap();

        let config =
            load_config_with(&CliOverrides::default(), &ConfigLayer::default(), dir.path())
                .unwrap();
        assert_eq!(config.url, "https://errorly.example");
        assert_eq!(config.ids.shard_id, 12);
        assert_eq!(config.ids.epoch_ms, IdConfig::default().epoch_ms);
        assert_eq!(config.webhooks.timeout_secs, 3);
        assert!(config.webhooks.user_agent.starts_with("errorly/"));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "database: from-file.db\nurl: http://file\n").unwrap();

        let env_layer = env_of(&[("ERRORLY_DB", "from-env.db"), ("ERRORLY_SHARD", "7")]);
        let overrides = CliOverrides {
            config: Some(path),
            db: Some(PathBuf::from("from-cli.db")),
            ..CliOverrides::default()
        };

        let config = load_config_with(&overrides, &env_layer, dir.path()).unwrap();
        assert_eq!(config.database, PathBuf::from("from-cli.db"));
        assert_eq!(config.url, "http://file");
        assert_eq!(config.ids.shard_id, 7);
    }

    #[test]
    fn test_invalid_inputs_are_config_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "ids: [not, a, map\n").unwrap();
        let overrides = CliOverrides {
            config: Some(path),
            ..CliOverrides::default()
        };
        let err = load_config_with(&overrides, &ConfigLayer::default(), dir.path()).unwrap_err();
        assert!(matches!(err, ErrorlyError::Config(_)));

        let err = ConfigLayer::from_lookup(|key| {
            (key == "ERRORLY_SHARD").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ErrorlyError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let overrides = CliOverrides {
            config: Some(dir.path().join("absent.yaml")),
            ..CliOverrides::default()
        };
        assert!(load_config_with(&overrides, &ConfigLayer::default(), dir.path()).is_err());
    }

    #[test]
    fn test_oversized_shard_rejected() {
        let dir = TempDir::new().unwrap();
        let overrides = CliOverrides {
            shard: Some(9000),
            ..CliOverrides::default()
        };
        let err = load_config_with(&overrides, &ConfigLayer::default(), dir.path()).unwrap_err();
        assert!(matches!(err, ErrorlyError::InvalidShard { shard: 9000, .. }));
    }
}
