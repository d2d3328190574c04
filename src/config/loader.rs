use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::basket::BasketRegistry;

use super::IndexVaultConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["index-vault.toml", "config/index-vault.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_config(path: Option<PathBuf>) -> Result<IndexVaultConfig, ConfigError> {
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<PathBuf>>(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            return Ok(config);
        }
    }

    Ok(IndexVaultConfig::default())
}

fn try_load_file(path: &Path) -> Result<Option<IndexVaultConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: IndexVaultConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    validate(&config)?;
    Ok(Some(config))
}

/// 解析成功之后的语义检查：篮子必须能组成合法的注册表。
pub fn validate(config: &IndexVaultConfig) -> Result<(), ConfigError> {
    if let Some(listen) = config.monitoring.prometheus_listen.as_deref() {
        listen.parse::<SocketAddr>().map_err(|err| {
            ConfigError::Invalid(format!("monitoring.prometheus_listen `{listen}`: {err}"))
        })?;
    }
    if config.vault.swap_deadline_secs == 0 {
        return Err(ConfigError::Invalid(
            "vault.swap_deadline_secs must be positive".to_string(),
        ));
    }

    let baskets = config.resolved_baskets()?;
    if !baskets.is_empty() {
        BasketRegistry::new(baskets, Some(config.resolved_endpoint()))
            .map_err(|err| ConfigError::Invalid(format!("baskets: {err}")))?;
    }
    Ok(())
}
