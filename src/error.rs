//! Error definitions for the announcer

use std::time::Duration;
use thiserror::Error;

/// Transport failures raised inside the announcer.
///
/// These never cross the public `update_state` / `send_message` surface;
/// they are logged at the point of failure and dropped there.
#[derive(Debug, Error)]
pub enum AnnounceError {
    /// The broker could not be reached or refused the session
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// No CONNACK arrived within the connect timeout
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The client rejected a publish or disconnect request
    #[error("Publish failed: {0}")]
    Publish(#[from] rumqttc::ClientError),

    /// The connection driver is gone, the session can no longer be observed
    #[error("Connection driver stopped")]
    DriverStopped,

    /// The registration document could not be rendered
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors while parsing a host command line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: send <topic> <message>")]
    MissingTopic,
}
