use crate::types::Role;
use std::env;
use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SIGNALING_URL: &str = "http://localhost:8080/sdp";
pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_SIGNALING_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_ICE_GATHER_TIMEOUT_MS: u64 = 10_000;

const ICE_URL_SCHEMES: [&str; 4] = ["stun:", "stuns:", "turn:", "turns:"];

#[derive(Debug, Clone)]
pub struct Config {
    pub signaling_url: String,
    pub ice_servers: Vec<String>,
    pub signaling_timeout: Duration,
    pub ice_gather_timeout: Duration,
    pub rust_log: String,
}

/// Options only the `sfu-client` binary reads.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: Role,
    pub publisher_key: String,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingVariable(String),
    #[error("SIGNALING_URL must be an http(s) URL (got '{0}')")]
    InvalidUrl(String),
    #[error("STUN_URLS must name at least one ICE server")]
    NoIceServers,
    #[error("STUN_URLS entry must start with stun:, stuns:, turn: or turns: (got '{0}')")]
    InvalidIceServer(String),
    #[error("{0} must be a positive number of milliseconds (got '{1}')")]
    InvalidTimeout(String, String),
    #[error("MODE must be 'publisher' or 'viewer' (got '{0}')")]
    InvalidMode(String),
    #[error("METRICS_PORT must be a valid port number (got '{0}': {1})")]
    InvalidPort(String, ParseIntError),
    #[error("METRICS_PORT must be between 1 and 65535 (got {0})")]
    PortOutOfRange(u16),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            signaling_url: DEFAULT_SIGNALING_URL.to_string(),
            ice_servers: vec![DEFAULT_STUN_URL.to_string()],
            signaling_timeout: Duration::from_millis(DEFAULT_SIGNALING_TIMEOUT_MS),
            ice_gather_timeout: Duration::from_millis(DEFAULT_ICE_GATHER_TIMEOUT_MS),
            rust_log: "info".to_string(),
        }
    }
}

/// Validates environment variables and returns a Config object
/// Returns an error if any variable is present but invalid
pub fn validate_env() -> Result<Config, ConfigError> {
    let signaling_url = env::var("SIGNALING_URL").unwrap_or_else(|_| {
        tracing::warn!("SIGNALING_URL not set, using default: {}", DEFAULT_SIGNALING_URL);
        DEFAULT_SIGNALING_URL.to_string()
    });
    validate_signaling_url(&signaling_url)?;

    let ice_servers = match env::var("STUN_URLS") {
        Ok(raw) => parse_ice_servers(&raw)?,
        Err(_) => vec![DEFAULT_STUN_URL.to_string()],
    };

    let signaling_timeout = timeout_from_env("SIGNALING_TIMEOUT_MS", DEFAULT_SIGNALING_TIMEOUT_MS)?;
    let ice_gather_timeout =
        timeout_from_env("ICE_GATHER_TIMEOUT_MS", DEFAULT_ICE_GATHER_TIMEOUT_MS)?;

    // Optional: RUST_LOG (defaults to "info")
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| {
        tracing::warn!("RUST_LOG not set, using default: info");
        "info".to_string()
    });

    let config = Config {
        signaling_url,
        ice_servers,
        signaling_timeout,
        ice_gather_timeout,
        rust_log,
    };

    tracing::info!(
        signaling_url = %config.signaling_url,
        ice_servers = ?config.ice_servers,
        signaling_timeout_ms = config.signaling_timeout.as_millis() as u64,
        ice_gather_timeout_ms = config.ice_gather_timeout.as_millis() as u64,
        rust_log = %config.rust_log,
        "Configuration"
    );

    Ok(config)
}

/// Reads the binary's run mode, routing key and metrics port.
pub fn validate_run_env() -> Result<RunOptions, ConfigError> {
    let mode_str = env::var("MODE").map_err(|_| ConfigError::MissingVariable("MODE".to_string()))?;
    let mode = mode_str
        .parse::<Role>()
        .map_err(|_| ConfigError::InvalidMode(mode_str.clone()))?;

    let publisher_key = env::var("PUBLISHER_KEY").unwrap_or_default();

    let metrics_port = match env::var("METRICS_PORT") {
        Ok(port_str) => {
            let port: u16 = port_str
                .parse()
                .map_err(|e| ConfigError::InvalidPort(port_str.clone(), e))?;
            if port == 0 {
                return Err(ConfigError::PortOutOfRange(port));
            }
            Some(port)
        }
        Err(_) => None,
    };

    Ok(RunOptions {
        mode,
        publisher_key,
        metrics_port,
    })
}

fn validate_signaling_url(raw: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::InvalidUrl(raw.to_string())),
    }
}

fn parse_ice_servers(raw: &str) -> Result<Vec<String>, ConfigError> {
    let servers: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if servers.is_empty() {
        return Err(ConfigError::NoIceServers);
    }
    if let Some(bad) = servers
        .iter()
        .find(|s| !ICE_URL_SCHEMES.iter().any(|scheme| s.starts_with(scheme)))
    {
        return Err(ConfigError::InvalidIceServer(bad.clone()));
    }
    Ok(servers)
}

fn timeout_from_env(var: &str, default_ms: u64) -> Result<Duration, ConfigError> {
    let raw = match env::var(var) {
        Ok(raw) => raw,
        Err(_) => return Ok(Duration::from_millis(default_ms)),
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout(var.to_string(), raw)),
    }
}
