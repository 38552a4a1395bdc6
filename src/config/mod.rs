//! Configuration module for hostcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and layering environment variable overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use hostcrawl::config::load_effective_config;
//! use std::path::Path;
//!
//! let (config, _source) = load_effective_config(Path::new("hostcrawl.toml")).unwrap();
//! println!("Each URL gets {} attempts", config.requests.retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{resolve_user_agent, Config, LogFormat, LogOutput, LoggingConfig, RequestsConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash,
    load_effective_config, load_effective_config_with, ConfigSource, ENV_KEYS,
};
pub use validation::validate;
