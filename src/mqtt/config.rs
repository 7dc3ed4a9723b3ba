use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Broker connection parameters and session tunables.
///
/// Only `broker_address` and `broker_port` normally come from the host's
/// configuration file; the remaining fields default to the values the
/// announcer has always used (clean session, automatic reconnect, 10 second
/// connect timeout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker_address: String,
    pub broker_port: u16,
    pub connection_timeout_secs: u64,
    pub keep_alive_secs: u64,
    pub clean_session: bool,
    pub auto_reconnect: bool,
    pub reconnect_delay_secs: u64,
    /// Capacity of the client's outbound request queue
    pub request_capacity: usize,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Let the broker publish a retained `OFFLINE` on the availability topic
    /// when the session dies without a clean disconnect
    pub last_will: bool,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_address: "localhost".to_string(),
            broker_port: 1883,
            connection_timeout_secs: 10,
            keep_alive_secs: 60,
            clean_session: true,
            auto_reconnect: true,
            reconnect_delay_secs: 5,
            request_capacity: 10,
            username: None,
            password: None,
            last_will: false,
        }
    }
}

impl MqttConfig {
    pub fn new(broker_address: impl Into<String>, broker_port: u16) -> Self {
        Self {
            broker_address: broker_address.into(),
            broker_port,
            ..Self::default()
        }
    }

    pub fn broker_url(&self) -> String {
        format!("tcp://{}:{}", self.broker_address, self.broker_port)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn keep_alive(&self) -> Duration {
        // rumqttc rejects keep alive intervals below one second
        Duration::from_secs(self.keep_alive_secs.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl fmt::Display for MqttConfig {
    /// Formats as "user@tcp://host:port", the password is never shown.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.username {
            Some(user) => write!(f, "{}@{}", user, self.broker_url()),
            None => f.write_str(&self.broker_url()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_announcer_session() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_url(), "tcp://localhost:1883");
        assert_eq!(config.connection_timeout(), Duration::from_secs(10));
        assert!(config.clean_session);
        assert!(config.auto_reconnect);
        assert!(!config.last_will);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: MqttConfig =
            toml::from_str("broker_address = \"mqtt.lan\"\nbroker_port = 8883\n").unwrap();
        assert_eq!(config.broker_url(), "tcp://mqtt.lan:8883");
        assert_eq!(config.connection_timeout_secs, 10);
        assert_eq!(config.request_capacity, 10);
    }

    #[test]
    fn display_hides_the_password() {
        let mut config = MqttConfig::new("broker", 1883);
        config.username = Some("ha".to_string());
        config.password = Some("secret".to_string());
        assert_eq!(config.to_string(), "ha@tcp://broker:1883");
    }
}
