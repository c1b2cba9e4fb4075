//! Relay configuration: defaults, then an optional TOML file, then env overrides.

use std::{path::Path, time::Duration};

use common::utils::consts::{HOST, RELAY_PORT};
use serde::Deserialize;

use super::{
    consts::{
        HANDSHAKE_TIMEOUT, RELAY_HANDSHAKE_TIMEOUT_ENV, RELAY_HOST_ENV, RELAY_PORT_ENV,
        RELAY_REQUEST_TIMEOUT_ENV,
    },
    error::RelayError,
};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Time a new connection has to identify itself
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Unmatched requests go back to idle after this long. Off when unset.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_host() -> String {
    HOST.to_string()
}
fn default_port() -> u16 {
    RELAY_PORT
}
fn default_handshake_timeout_ms() -> u64 {
    HANDSHAKE_TIMEOUT.as_millis() as u64
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            request_timeout_ms: None,
        }
    }
}

impl RelayConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

pub fn load(path: Option<&Path>) -> Result<RelayConfig, RelayError> {
    let config = match path {
        Some(p) => load_file(p)?,
        None => RelayConfig::default(),
    };

    apply_overrides(config, |key| std::env::var(key).ok())
}

fn load_file(path: &Path) -> Result<RelayConfig, RelayError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| RelayError::Config(format!("{}: {}", path.display(), e)))?;

    parse(&raw)
}

pub fn parse(raw: &str) -> Result<RelayConfig, RelayError> {
    toml::from_str(raw).map_err(|e| RelayError::Config(e.to_string()))
}

/// `lookup` maps an env var name to its value.
pub fn apply_overrides<F>(mut c: RelayConfig, lookup: F) -> Result<RelayConfig, RelayError>
where
    F: Fn(&str) -> Option<String>,
{
    fn number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, RelayError> {
        value
            .parse::<N>()
            .map_err(|_| RelayError::Config(format!("{}={} is not a valid number", key, value)))
    }

    if let Some(host) = lookup(RELAY_HOST_ENV) {
        c.host = host;
    }
    if let Some(s) = lookup(RELAY_PORT_ENV) {
        c.port = number(RELAY_PORT_ENV, &s)?;
    }
    if let Some(s) = lookup(RELAY_HANDSHAKE_TIMEOUT_ENV) {
        c.handshake_timeout_ms = number(RELAY_HANDSHAKE_TIMEOUT_ENV, &s)?;
    }
    if let Some(s) = lookup(RELAY_REQUEST_TIMEOUT_ENV) {
        c.request_timeout_ms = match number::<u64>(RELAY_REQUEST_TIMEOUT_ENV, &s)? {
            0 => None,
            ms => Some(ms),
        };
    }

    Ok(c)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse("").unwrap(), RelayConfig::default());
        assert_eq!(RelayConfig::default().request_timeout(), None);
    }

    #[test]
    fn file_values_are_read() {
        let c = parse("host = \"127.0.0.1\"\nport = 4000\nrequest_timeout_ms = 30000\n").unwrap();

        assert_eq!(c.addr(), "127.0.0.1:4000");
        assert_eq!(c.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(c.handshake_timeout(), HANDSHAKE_TIMEOUT);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(parse("prot = 1"), Err(RelayError::Config(_))));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (RELAY_PORT_ENV, "5000"),
            (RELAY_REQUEST_TIMEOUT_ENV, "1500"),
        ]
        .into_iter()
        .collect();

        let c = apply_overrides(RelayConfig::default(), |k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(c.port, 5000);
        assert_eq!(c.request_timeout_ms, Some(1500));
        assert_eq!(c.host, HOST);
    }

    #[test]
    fn zero_request_timeout_disables_it() {
        let c = apply_overrides(
            RelayConfig {
                request_timeout_ms: Some(10),
                ..RelayConfig::default()
            },
            |k| (k == RELAY_REQUEST_TIMEOUT_ENV).then(|| "0".to_string()),
        )
        .unwrap();

        assert_eq!(c.request_timeout(), None);
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        let err = apply_overrides(RelayConfig::default(), |k| {
            (k == RELAY_PORT_ENV).then(|| "http".to_string())
        })
        .unwrap_err();

        assert!(matches!(err, RelayError::Config(_)));
    }
}
