use crate::config::types::{Config, LogFormat, LogOutput};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variables that override configuration file values
pub const ENV_KEYS: &[&str] = &[
    "CRAWLER_REQ_TIMEOUT",
    "CRAWLER_REQ_RETRIES",
    "CRAWLER_REQ_MAX_CONCURRENT",
    "CRAWLER_USER_AGENT",
    "CRAWLER_LOG",
    "CRAWLER_LOG_LEVEL",
    "CRAWLER_LOG_FORMAT",
    "CRAWLER_LOG_OUTPUT",
    "CRAWLER_LOG_FILE",
];

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from a file, with the file's content hash
    File { path: PathBuf, hash: String },

    /// No file was found; built-in defaults were used
    Defaults,
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use hostcrawl::config::load_config;
///
/// let config = load_config(Path::new("hostcrawl.toml")).unwrap();
/// println!("Retries: {}", config.requests.retries);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Builds the effective configuration for a run
///
/// Precedence, highest first: environment variables, the configuration
/// file, built-in defaults. A missing file is not an error; an existing file
/// that fails to parse is.
pub fn load_effective_config(path: &Path) -> Result<(Config, ConfigSource), ConfigError> {
    load_effective_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_effective_config`], reading variables through `lookup`
pub fn load_effective_config_with<F>(
    path: &Path,
    lookup: F,
) -> Result<(Config, ConfigSource), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut config, source) = if path.exists() {
        let (config, hash) = load_config_with_hash(path)?;
        (
            config,
            ConfigSource::File {
                path: path.to_path_buf(),
                hash,
            },
        )
    } else {
        (Config::default(), ConfigSource::Defaults)
    };

    apply_env_overrides(&mut config, lookup)?;
    validate(&config)?;

    Ok((config, source))
}

/// Overrides configuration values with the environment variables in [`ENV_KEYS`]
///
/// Empty variables are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("CRAWLER_REQ_TIMEOUT") {
        config.requests.timeout = parse_env("CRAWLER_REQ_TIMEOUT", &v)?;
    }
    if let Some(v) = get("CRAWLER_REQ_RETRIES") {
        config.requests.retries = parse_env("CRAWLER_REQ_RETRIES", &v)?;
    }
    if let Some(v) = get("CRAWLER_REQ_MAX_CONCURRENT") {
        config.requests.max_concurrent = parse_env("CRAWLER_REQ_MAX_CONCURRENT", &v)?;
    }
    if let Some(v) = get("CRAWLER_USER_AGENT") {
        config.requests.user_agent = v;
    }
    if let Some(v) = get("CRAWLER_LOG") {
        config.logging.enabled = parse_bool("CRAWLER_LOG", &v)?;
    }
    if let Some(v) = get("CRAWLER_LOG_LEVEL") {
        config.logging.level = v.to_ascii_lowercase();
    }
    if let Some(v) = get("CRAWLER_LOG_FORMAT") {
        config.logging.format = parse_env::<LogFormat>("CRAWLER_LOG_FORMAT", &v)?;
    }
    if let Some(v) = get("CRAWLER_LOG_OUTPUT") {
        config.logging.output = parse_env::<LogOutput>("CRAWLER_LOG_OUTPUT", &v)?;
    }
    if let Some(v) = get("CRAWLER_LOG_FILE") {
        config.logging.file = Some(v);
    }

    Ok(())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
