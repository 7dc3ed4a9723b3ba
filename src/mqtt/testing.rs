//! Test doubles: an in-memory publisher and a minimal TCP broker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::MqttConfig;
use super::message_manager::OutboundMessage;
use super::mqtt_handler::MqttStatus;
use super::publisher::Publish;
use crate::error::AnnounceError;

pub(crate) type SentLog = Arc<Mutex<Vec<OutboundMessage>>>;

#[derive(Default)]
pub(crate) struct RecordingPublisher {
    pub refuse_connect: bool,
    pub fail_publish: bool,
    sent: SentLog,
    disconnected: Arc<AtomicBool>,
}

impl RecordingPublisher {
    pub fn new() -> (Self, SentLog) {
        let publisher = Self::default();
        let sent = publisher.sent.clone();
        (publisher, sent)
    }

    pub fn disconnected_flag(&self) -> Arc<AtomicBool> {
        self.disconnected.clone()
    }
}

impl Publish for RecordingPublisher {
    async fn wait_connected(&self, _timeout: Duration) -> Result<(), AnnounceError> {
        if self.refuse_connect {
            Err(AnnounceError::ConnectFailed("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<(), AnnounceError> {
        if self.fail_publish {
            return Err(AnnounceError::DriverStopped);
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AnnounceError> {
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn topics_and_payloads(sent: &SentLog) -> Vec<(String, String)> {
    sent.lock()
        .unwrap()
        .iter()
        .map(|m| (m.topic.clone(), m.payload.clone()))
        .collect()
}

/// A PUBLISH packet as decoded by [`FakeBroker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReceivedPublish {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: u8,
    pub retain: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum BrokerBehaviour {
    /// CONNACK right away, then decode publishes until DISCONNECT
    Serve,
    /// CONNACK, then close the socket and stop listening
    DropAfterConnAck,
    /// Wait before sending CONNACK, then serve
    ConnAckAfter(Duration),
}

/// Single-connection MQTT 3.1.1 broker on an ephemeral localhost port.
pub(crate) struct FakeBroker {
    pub port: u16,
    pub publishes: mpsc::UnboundedReceiver<ReceivedPublish>,
    task: JoinHandle<()>,
}

impl FakeBroker {
    pub async fn start(behaviour: BrokerBehaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, publishes) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            if behaviour_is_drop(behaviour) {
                drop(listener);
            }
            if !matches!(read_packet(&mut stream).await, Ok(Some((0x10, _)))) {
                return;
            }
            if let BrokerBehaviour::ConnAckAfter(delay) = behaviour {
                tokio::time::sleep(delay).await;
            }
            if stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await.is_err() {
                return;
            }
            if behaviour_is_drop(behaviour) {
                let _ = stream.shutdown().await;
                return;
            }

            while let Ok(Some((header, body))) = read_packet(&mut stream).await {
                match header >> 4 {
                    3 => {
                        if let Some(publish) = decode_publish(header, &body) {
                            let _ = tx.send(publish);
                        }
                    }
                    12 => {
                        let _ = stream.write_all(&[0xD0, 0x00]).await;
                    }
                    14 => break,
                    _ => {}
                }
            }
        });

        FakeBroker {
            port,
            publishes,
            task,
        }
    }

    pub fn config(&self) -> MqttConfig {
        MqttConfig {
            connection_timeout_secs: 2,
            reconnect_delay_secs: 1,
            ..MqttConfig::new("127.0.0.1", self.port)
        }
    }

    /// Next decoded publish, `None` if nothing arrives within `wait`.
    pub async fn next_publish(&mut self, wait: Duration) -> Option<ReceivedPublish> {
        tokio::time::timeout(wait, self.publishes.recv())
            .await
            .ok()
            .flatten()
    }
}

impl Drop for FakeBroker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn behaviour_is_drop(behaviour: BrokerBehaviour) -> bool {
    matches!(behaviour, BrokerBehaviour::DropAfterConnAck)
}

async fn read_packet(stream: &mut TcpStream) -> std::io::Result<Option<(u8, Vec<u8>)>> {
    let mut header = [0u8; 1];
    if stream.read(&mut header).await? == 0 {
        return Ok(None);
    }

    let mut remaining = 0usize;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await?;
        remaining |= ((byte & 0x7F) as usize) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    let mut body = vec![0u8; remaining];
    stream.read_exact(&mut body).await?;
    Ok(Some((header[0], body)))
}

fn decode_publish(header: u8, body: &[u8]) -> Option<ReceivedPublish> {
    let qos = (header >> 1) & 0x03;
    let retain = header & 0x01 == 1;
    let topic_len = u16::from_be_bytes([*body.first()?, *body.get(1)?]) as usize;
    let topic = std::str::from_utf8(body.get(2..2 + topic_len)?).ok()?.to_string();
    let mut offset = 2 + topic_len;
    if qos > 0 {
        offset += 2;
    }
    Some(ReceivedPublish {
        topic,
        payload: body.get(offset..)?.to_vec(),
        qos,
        retain,
    })
}

/// Polls `status` until `accept` holds, `false` after `wait`.
pub(crate) async fn eventually(
    wait: Duration,
    mut status: impl FnMut() -> MqttStatus,
    accept: impl Fn(&MqttStatus) -> bool,
) -> bool {
    let deadline = tokio::time::Instant::now() + wait;
    while tokio::time::Instant::now() < deadline {
        if accept(&status()) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    accept(&status())
}
