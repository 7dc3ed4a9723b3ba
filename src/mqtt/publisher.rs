//! Publish seam between the announcer and the MQTT client crate.

use std::time::Duration;

use rumqttc::{AsyncClient, LastWill, MqttOptions, NetworkOptions, QoS};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::MqttConfig;
use super::message_manager::OutboundMessage;
use super::mqtt_handler::{ConnectionDriver, ConnectionState, MqttStatus};
use super::topics::{SwitchTopic, PAYLOAD_OFFLINE};
use crate::error::AnnounceError;

/// How long a clean disconnect may take before the driver is cancelled.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Minimal publish interface the announcer is written against.
#[allow(async_fn_in_trait)]
pub trait Publish {
    /// Resolves once the session is established, fails if it cannot be.
    async fn wait_connected(&self, timeout: Duration) -> Result<(), AnnounceError>;

    async fn publish(&self, message: &OutboundMessage) -> Result<(), AnnounceError>;

    /// Clean session end, the broker discards the last will.
    async fn disconnect(&self) -> Result<(), AnnounceError>;
}

/// rumqttc backed publisher.
///
/// Holds the `AsyncClient` half of the session; the `EventLoop` half lives in a
/// [`ConnectionDriver`] task spawned by [`MqttPublisher::start`]. Dropping the
/// publisher cancels the driver.
pub struct MqttPublisher {
    client: AsyncClient,
    status: watch::Receiver<MqttStatus>,
    cancel: CancellationToken,
}

impl MqttPublisher {
    /// Builds the session and spawns its driver. Must run inside a tokio runtime.
    pub fn start(config: &MqttConfig, client_id: &str) -> Self {
        let mut options = MqttOptions::new(
            client_id,
            config.broker_address.as_str(),
            config.broker_port,
        );
        options
            .set_keep_alive(config.keep_alive())
            .set_clean_session(config.clean_session);

        if let Some(user) = &config.username {
            options.set_credentials(user.as_str(), config.password.as_deref().unwrap_or_default());
        }
        if config.last_will {
            options.set_last_will(LastWill::new(
                SwitchTopic::Availability.path(),
                PAYLOAD_OFFLINE,
                QoS::AtMostOnce,
                true,
            ));
        }

        let (client, mut eventloop) = AsyncClient::new(options, config.request_capacity.max(1));
        let mut network = NetworkOptions::new();
        network.set_connection_timeout(config.connection_timeout_secs);
        eventloop.set_network_options(network);

        let (status_tx, status_rx) = watch::channel(MqttStatus::default());
        let cancel = CancellationToken::new();
        let driver = ConnectionDriver::new(eventloop, status_tx, config, cancel.clone());
        tokio::spawn(driver.run());

        MqttPublisher {
            client,
            status: status_rx,
            cancel,
        }
    }

    pub fn status(&self) -> MqttStatus {
        self.status.borrow().clone()
    }
}

impl Publish for MqttPublisher {
    /// A session that does not come up in time is abandoned: the driver is
    /// cancelled, so a late CONNACK can never revive an unannounced session.
    async fn wait_connected(&self, timeout: Duration) -> Result<(), AnnounceError> {
        let mut status = self.status.clone();
        let settled = tokio::time::timeout(timeout, status.wait_for(MqttStatus::is_settled)).await;

        let result = match settled {
            Err(_) => Err(AnnounceError::ConnectTimeout(timeout)),
            Ok(Err(_)) => Err(AnnounceError::DriverStopped),
            Ok(Ok(status)) if status.connections > 0 => Ok(()),
            Ok(Ok(status)) => Err(AnnounceError::ConnectFailed(
                status
                    .last_error()
                    .unwrap_or("connection refused")
                    .to_string(),
            )),
        };
        if result.is_err() {
            self.cancel.cancel();
        }
        result
    }

    /// Enqueues without waiting. A full request queue (broker unreachable)
    /// is reported as an error instead of suspending the caller.
    async fn publish(&self, message: &OutboundMessage) -> Result<(), AnnounceError> {
        debug!(
            "mqtt: publishing to topic='{}' len={} qos={:?} retain={}",
            message.topic,
            message.payload.len(),
            message.qos,
            message.retain
        );
        self.client.try_publish(
            message.topic.as_str(),
            message.qos,
            message.retain,
            message.payload_bytes().to_vec(),
        )?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AnnounceError> {
        let result = self.client.try_disconnect();
        if result.is_ok() {
            let mut status = self.status.clone();
            let closed =
                tokio::time::timeout(DISCONNECT_GRACE, status.wait_for(MqttStatus::is_closed)).await;
            if closed.is_err() {
                warn!(
                    "Session did not close within {:?}, dropping the connection",
                    DISCONNECT_GRACE
                );
            }
        }
        self.cancel.cancel();
        result.map_err(AnnounceError::from)
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
