use std::time::Duration;

pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5000);

pub const RELAY_HOST_ENV: &str = "RELAY_HOST";
pub const RELAY_PORT_ENV: &str = "RELAY_PORT";
pub const RELAY_HANDSHAKE_TIMEOUT_ENV: &str = "RELAY_HANDSHAKE_TIMEOUT_MS";
pub const RELAY_REQUEST_TIMEOUT_ENV: &str = "RELAY_REQUEST_TIMEOUT_MS";
