//! Startup configuration from environment variables.
//!
//! - `BPMCP_PORT`: listen port on 127.0.0.1 (default: 9000)
//! - `BPMCP_ALLOW_WRITES`: initial write-enable flag (default: off)
//! - `BPMCP_DB_PATH`: SQLite file for saved assets (default: in-memory)

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 9000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub allow_writes: bool,
    pub db_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            allow_writes: false,
            db_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(raw) = lookup("BPMCP_PORT") {
            config.port = parse_port(&raw)?;
        }
        if let Some(raw) = lookup("BPMCP_ALLOW_WRITES") {
            config.allow_writes = parse_flag("BPMCP_ALLOW_WRITES", &raw)?;
        }
        config.db_path = lookup("BPMCP_DB_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(config)
    }
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        var: "BPMCP_PORT",
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    match raw.trim().parse::<u16>() {
        Ok(0) => Err(invalid("port must be between 1 and 65535")),
        Ok(port) => Ok(port),
        Err(_) => Err(invalid("not a port number")),
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
