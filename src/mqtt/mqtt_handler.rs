use std::time::Duration;

use chrono::{DateTime, Local};
use rumqttc::{Event, EventLoop, Incoming, Outgoing};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::MqttConfig;

const MAX_ERROR_MESSAGES: usize = 16;

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
    Reconnecting,
}

#[derive(Clone, Debug, Default)]
pub struct MqttStatus {
    pub connection_state: ConnectionState,
    /// Successful CONNACKs, reconnects included
    pub connections: usize,
    /// Most recent transport errors, oldest first
    pub error_messages: Vec<String>,
    /// Publishes written to the socket
    pub messages_sent: usize,
    pub last_activity: Option<DateTime<Local>>,
}

impl MqttStatus {
    pub fn last_error(&self) -> Option<&str> {
        self.error_messages.last().map(String::as_str)
    }

    /// Initial connect attempt has finished, one way or the other.
    ///
    /// Counts CONNACKs rather than looking at the state alone, a session that
    /// drops right after coming up may never be observed as `Connected`.
    pub fn is_settled(&self) -> bool {
        self.connections > 0 || self.connection_state == ConnectionState::Failed
    }

    /// The session is gone for good.
    pub fn is_closed(&self) -> bool {
        matches!(
            self.connection_state,
            ConnectionState::Disconnected | ConnectionState::Failed
        )
    }

    fn record_error(&mut self, message: String) {
        self.error_messages.push(message);
        if self.error_messages.len() > MAX_ERROR_MESSAGES {
            self.error_messages.remove(0);
        }
        self.last_activity = Some(Local::now());
    }

    fn touch(&mut self) {
        self.last_activity = Some(Local::now());
    }
}

/// Owns the rumqttc event loop and drives the session.
///
/// Every publish issued through the `AsyncClient` only reaches the broker while
/// this loop is being polled, so the driver runs on its own task for the whole
/// lifetime of the announcer. Progress is mirrored into a watch channel.
///
/// Reconnect policy: once the first CONNACK arrived, poll errors are retried
/// after `reconnect_delay` (rumqttc reconnects on the next poll). An error before
/// the first CONNACK, or any error with `auto_reconnect` disabled, ends the driver
/// and leaves the state at `Failed`.
pub struct ConnectionDriver {
    eventloop: EventLoop,
    status: watch::Sender<MqttStatus>,
    broker: String,
    auto_reconnect: bool,
    reconnect_delay: Duration,
    cancel: CancellationToken,
}

impl ConnectionDriver {
    pub fn new(
        eventloop: EventLoop,
        status: watch::Sender<MqttStatus>,
        config: &MqttConfig,
        cancel: CancellationToken,
    ) -> Self {
        ConnectionDriver {
            eventloop,
            status,
            broker: config.broker_url(),
            auto_reconnect: config.auto_reconnect,
            reconnect_delay: config.reconnect_delay(),
            cancel,
        }
    }

    pub async fn run(mut self) {
        debug!("Connecting to {}", self.broker);
        self.set_state(ConnectionState::Connecting);
        let mut established = false;

        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("Connection driver for {} cancelled", self.broker);
                    if !self.status.borrow().is_closed() {
                        self.set_state(ConnectionState::Disconnected);
                    }
                    break;
                }
                event = self.eventloop.poll() => event,
            };

            match event {
                Ok(Event::Incoming(Incoming::ConnAck(ack))) => {
                    if established {
                        info!("Reconnected to {}", self.broker);
                    } else {
                        info!(
                            "Connected to {} (session present: {})",
                            self.broker, ack.session_present
                        );
                    }
                    established = true;
                    self.status.send_modify(|status| {
                        status.connections += 1;
                        status.connection_state = ConnectionState::Connected;
                        status.touch();
                    });
                }
                Ok(Event::Outgoing(Outgoing::Publish(_))) => {
                    self.status.send_modify(|status| {
                        status.messages_sent += 1;
                        status.touch();
                    });
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    info!("Disconnected from {}", self.broker);
                    self.set_state(ConnectionState::Disconnected);
                    break;
                }
                Ok(Event::Incoming(Incoming::Disconnect)) => {
                    warn!("Broker {} closed the session", self.broker);
                }
                Ok(_) => {}
                Err(e) => {
                    let message = e.to_string();
                    self.status.send_modify(|status| status.record_error(message));

                    if !established {
                        error!("Connection to {} failed: {}", self.broker, e);
                        self.set_state(ConnectionState::Failed);
                        break;
                    }
                    if !self.auto_reconnect {
                        error!("Connection to {} lost: {}", self.broker, e);
                        self.set_state(ConnectionState::Failed);
                        break;
                    }

                    warn!(
                        "Connection to {} lost: {}; reconnecting in {:?}",
                        self.broker, e, self.reconnect_delay
                    );
                    self.set_state(ConnectionState::Reconnecting);
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            self.set_state(ConnectionState::Disconnected);
                            break;
                        }
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                }
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.status.send_modify(|status| {
            status.connection_state = state;
            status.touch();
        });
    }
}
