//! # Device Announcer
//!
//! Owns the single MQTT session of the process and announces the Guests Today
//! switch to Home Assistant.
//!
//! ## Lifecycle
//!
//! ```text
//! connect() ── CONNACK ──> config topic (discovery document, retained)
//!                      └─> availability topic "ONLINE" (retained)
//! update_state(b) ───────> state topic "ON" / "OFF" (retained)
//! send_message(t, m) ────> t, m (retained)
//! ```
//!
//! ## Error Handling Strategy
//!
//! The announcement is telemetry and must never block or crash the host. Every
//! transport failure is logged where it happens and swallowed; the public
//! operations return `()`. Internally each publish goes through
//! [`DeviceAnnouncer::try_send`], which returns an [`AnnounceError`].

use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::MqttConfig;
use super::discovery::SwitchDiscovery;
use super::message_manager::OutboundMessage;
use super::mqtt_handler::MqttStatus;
use super::publisher::{MqttPublisher, Publish};
use super::topics::{SwitchState, SwitchTopic, PAYLOAD_OFFLINE, PAYLOAD_ONLINE};
use crate::error::AnnounceError;

pub struct DeviceAnnouncer<P: Publish = MqttPublisher> {
    client_id: String,
    publisher: P,
}

impl DeviceAnnouncer<MqttPublisher> {
    /// Opens the session and announces the device.
    ///
    /// Waits at most the configured connect timeout. A broker that cannot be
    /// reached is logged, and the returned announcer then drops every publish
    /// with a logged error.
    pub async fn connect(config: &MqttConfig) -> Self {
        let client_id = Uuid::new_v4().to_string();
        info!("Connecting to MQTT broker {} as {}", config, client_id);

        let publisher = MqttPublisher::start(config, &client_id);
        Self::with_publisher(client_id, publisher, config.connection_timeout()).await
    }

    pub fn status(&self) -> MqttStatus {
        self.publisher.status()
    }
}

impl<P: Publish> DeviceAnnouncer<P> {
    pub async fn with_publisher(client_id: impl Into<String>, publisher: P, timeout: Duration) -> Self {
        let announcer = DeviceAnnouncer {
            client_id: client_id.into(),
            publisher,
        };

        match announcer.publisher.wait_connected(timeout).await {
            Ok(()) => announcer.announce().await,
            Err(e) => error!(
                "MQTT client {} could not connect, device not announced: {}",
                announcer.client_id, e
            ),
        }
        announcer
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Publishes `ON` when there are guests today, `OFF` otherwise.
    pub async fn update_state(&self, guests_today: bool) {
        let state = SwitchState::from(guests_today);
        self.send_message(SwitchTopic::State.path(), state.payload()).await;
    }

    /// Publishes `message` to `topic`, retained, QoS 0.
    pub async fn send_message(&self, topic: &str, message: &str) {
        if let Err(e) = self.try_send(topic, message).await {
            error!("Failed to publish to {}: {}", topic, e);
        }
    }

    /// Optionally marks the device `OFFLINE`, then ends the session cleanly.
    ///
    /// Dropping the announcer without calling this leaves the retained
    /// availability at `ONLINE`.
    pub async fn shutdown(self, mark_offline: bool) {
        if mark_offline {
            self.send_message(SwitchTopic::Availability.path(), PAYLOAD_OFFLINE).await;
        }
        match self.publisher.disconnect().await {
            Ok(()) => info!("MQTT client {} disconnected", self.client_id),
            Err(e) => warn!("MQTT client {} did not disconnect cleanly: {}", self.client_id, e),
        }
    }

    async fn announce(&self) {
        match self.try_send_discovery().await {
            Ok(()) => info!("Announced device on {}", SwitchTopic::Config),
            Err(e) => error!("Failed to announce device on {}: {}", SwitchTopic::Config, e),
        }
        self.send_message(SwitchTopic::Availability.path(), PAYLOAD_ONLINE).await;
    }

    async fn try_send_discovery(&self) -> Result<(), AnnounceError> {
        let document = SwitchDiscovery::guests_today().to_payload()?;
        self.try_send(SwitchTopic::Config.path(), &document).await
    }

    async fn try_send(&self, topic: &str, message: &str) -> Result<(), AnnounceError> {
        let message = OutboundMessage::retained(topic, message);
        self.publisher.publish(&message).await?;
        debug!("Published {}", message);
        Ok(())
    }
}
