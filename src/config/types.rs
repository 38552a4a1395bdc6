use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for hostcrawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub requests: RequestsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-request behaviour of the crawl engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestsConfig {
    /// Timeout for a single request, in seconds (0 disables it)
    pub timeout: u64,

    /// Maximum attempts per URL before it is marked failed
    pub retries: u32,

    /// Maximum number of in-flight fetches (0 means unbounded)
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// User agent preset name (`Crawler`, `Chrome`, `Firefox`) or literal string
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Interval between progress reports and exhaustion checks (milliseconds)
    #[serde(rename = "progress-interval")]
    pub progress_interval: u64,
}

impl RequestsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval)
    }
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            timeout: 20,
            retries: 5,
            max_concurrent: 0,
            user_agent: "Crawler".to_string(),
            progress_interval: 1000,
        }
    }
}

/// Log sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable or disable all logging
    pub enabled: bool,

    /// Base level filter (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,

    /// Output format
    pub format: LogFormat,

    /// Where log lines go
    pub output: LogOutput,

    /// Log file path, used when `output = "file"`
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::Stderr,
            file: None,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Log destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown logging format '{}'", other)),
        }
    }
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            other => Err(format!("unknown logging output '{}'", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Resolves a user agent preset name to the header value sent with requests
///
/// Unknown names are used verbatim.
pub fn resolve_user_agent(name: &str) -> String {
    match name {
        "Crawler" => concat!("hostcrawl/", env!("CARGO_PKG_VERSION")).to_string(),
        "Chrome" => "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/78.0.3904.108 Safari/537.36"
            .to_string(),
        "Firefox" => {
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:70.0) Gecko/20100101 Firefox/70.0"
                .to_string()
        }
        other => other.to_string(),
    }
}
