use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use crate::error::{Error, Result};

/// Port the sensor firmware asks for its name on.
pub const DEFAULT_HTTP_PORT: u16 = 1234;
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_TOPIC_ROOT: &str = "sensors";

/// Upper bound on readings retained per sensor.
pub const MAX_HISTORY_DEPTH: usize = 100_000;

#[derive(Clone, Debug)]
pub struct Config {
    /// Address the query API listens on
    pub http_addr: SocketAddr,

    /// Broker connection settings
    pub mqtt: MqttConfig,

    /// Reconnect delays after a transport error
    pub backoff: BackoffConfig,

    /// Readings retained per sensor, 0 keeps none
    pub history_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_HTTP_PORT)),
            mqtt: MqttConfig::default(),
            backoff: BackoffConfig::default(),
            history_depth: 1,
        }
    }
}

impl Config {
    /// Check values that would otherwise fail later at runtime.
    pub fn validate(&self) -> Result<()> {
        self.mqtt.validate()?;
        self.backoff.validate()?;

        if self.history_depth > MAX_HISTORY_DEPTH {
            return Err(Error::config(format!(
                "history depth {} exceeds the maximum of {MAX_HISTORY_DEPTH}",
                self.history_depth
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,

    /// First topic level; sensors publish to `<topic_root>/<name>`
    pub topic_root: String,

    pub keep_alive: Duration,

    /// Capacity of the request channel between client and event loop
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_MQTT_PORT,
            client_id: "sensorum".to_string(),
            topic_root: DEFAULT_TOPIC_ROOT.to_string(),
            keep_alive: Duration::from_secs(30),
            channel_capacity: 64,
        }
    }
}

impl MqttConfig {
    fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::config("MQTT client id must not be empty"));
        }

        let root = self.topic_root.trim_end_matches('/');
        if root.is_empty() || root.contains(['+', '#']) {
            return Err(Error::config(format!(
                "topic root '{}' must be non-empty and free of wildcards",
                self.topic_root
            )));
        }

        if self.channel_capacity == 0 {
            return Err(Error::config("MQTT channel capacity must be positive"));
        }

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffConfig {
    fn validate(&self) -> Result<()> {
        if self.initial.is_zero() || self.initial > self.max {
            return Err(Error::config(format!(
                "backoff must satisfy 0 < initial ({:?}) <= max ({:?})",
                self.initial, self.max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_addr.port(), 1234);
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.topic_root, "sensors");
    }

    #[test]
    fn test_wildcard_root_rejected() {
        let mut config = Config::default();
        config.mqtt.topic_root = "sensors/#".to_string();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_inverted_backoff_rejected() {
        let mut config = Config::default();
        config.backoff.initial = Duration::from_secs(60);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_depth_bounded() {
        let mut config = Config::default();
        config.history_depth = MAX_HISTORY_DEPTH;
        assert!(config.validate().is_ok());

        config.history_depth = usize::MAX;
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }
}
