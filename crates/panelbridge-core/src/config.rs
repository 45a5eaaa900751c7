//! Runtime configuration: defaults, environment variable names and URL helpers.

use std::time::Duration;

/// Default values used when neither the environment nor the command line
/// provides one.
pub mod defaults {
    pub const XPLANE_HOST: &str = "localhost";
    pub const XPLANE_PORT: u16 = 8086;
    pub const BAUD_RATE: u32 = 9600;
    pub const RECONNECT_DELAY_MS: u64 = 5000;
    pub const AIRCRAFT: &str = "zibo_737";
}

/// Environment variable names.
pub mod env_vars {
    pub const XPLANE_HOST: &str = "XPLANE_HOST";
    pub const XPLANE_PORT: &str = "XPLANE_PORT";
    pub const ARDUINO_BAUD: &str = "ARDUINO_BAUD";
    pub const SERIAL_PORT: &str = "SERIAL_PORT";
    pub const ACTIVE_PLANE: &str = "ACTIVE_PLANE";
    pub const RECONNECT_DELAY_MS: &str = "RECONNECT_DELAY_MS";
    pub const LOG_JSON: &str = "PANELBRIDGE_LOG_JSON";
}

/// Connection settings for both sides of the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub xplane_host: String,
    pub xplane_port: u16,
    pub baud_rate: u32,
    /// Explicit serial device path; autodiscovered when `None`.
    pub serial_port: Option<String>,
    pub reconnect_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            xplane_host: defaults::XPLANE_HOST.to_string(),
            xplane_port: defaults::XPLANE_PORT,
            baud_rate: defaults::BAUD_RATE,
            serial_port: None,
            reconnect_delay: Duration::from_millis(defaults::RECONNECT_DELAY_MS),
        }
    }
}

impl BridgeConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let fallback = Self::default();
        Self {
            xplane_host: std::env::var(env_vars::XPLANE_HOST).unwrap_or(fallback.xplane_host),
            xplane_port: env_parse(env_vars::XPLANE_PORT).unwrap_or(fallback.xplane_port),
            baud_rate: env_parse(env_vars::ARDUINO_BAUD).unwrap_or(fallback.baud_rate),
            serial_port: std::env::var(env_vars::SERIAL_PORT)
                .ok()
                .filter(|s| !s.is_empty()),
            reconnect_delay: env_parse(env_vars::RECONNECT_DELAY_MS)
                .map(Duration::from_millis)
                .unwrap_or(fallback.reconnect_delay),
        }
    }

    /// Base URL of the simulator REST API.
    pub fn rest_url(&self) -> String {
        format!("http://{}:{}/api/v2", self.xplane_host, self.xplane_port)
    }

    /// URL of the simulator WebSocket endpoint.
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}/api/v2", self.xplane_host, self.xplane_port)
    }
}

/// Aircraft profile id from the environment, or the default.
pub fn active_plane() -> String {
    std::env::var(env_vars::ACTIVE_PLANE).unwrap_or_else(|_| defaults::AIRCRAFT.to_string())
}

/// Whether JSON log output was requested.
pub fn json_logging() -> bool {
    env_parse(env_vars::LOG_JSON).unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
