pub mod command;
pub mod config;
pub mod error;
pub mod mqtt;

pub use error::AnnounceError;
pub use mqtt::announcer::DeviceAnnouncer;
pub use mqtt::config::MqttConfig;
