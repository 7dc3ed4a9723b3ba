//! # MQTT Integration Module
//!
//! Announces the Book-it-now "Guests Today" switch to Home Assistant over MQTT
//! and keeps its state topic current.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── announcer.rs        - DeviceAnnouncer: announce, update state, send messages
//! ├── config.rs           - Broker parameters and session tunables
//! ├── discovery.rs        - Home Assistant discovery document
//! ├── message_manager.rs  - Outbound message representation
//! ├── mqtt_handler.rs     - Connection driver task and status reporting
//! ├── publisher.rs        - Publish trait and the rumqttc implementation
//! └── topics.rs           - Fixed topic table and payload literals
//! ```
//!
//! ## Design Philosophy
//!
//! - **Fire and forget**: a broker that is down never blocks or fails the host;
//!   problems are only visible in the logs.
//! - **One session per process**: the announcer exclusively owns its client and
//!   the event loop driving it.
//! - **Retained everything**: late subscribers (a restarted Home Assistant)
//!   immediately see the device, its availability and its last state.

pub mod announcer;
pub mod config;
pub mod discovery;
pub mod message_manager;
pub mod mqtt_handler;
pub mod publisher;
pub mod topics;

#[cfg(test)]
pub(crate) mod testing;
