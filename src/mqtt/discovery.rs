//! Home Assistant MQTT discovery document for the Guests Today switch.
//!
//! The hub listens on `homeassistant/<component>/<node>/config` and creates an
//! entity bound to the state, command and availability topics referenced in the
//! document. The document is published once, retained, when the announcer
//! connects.

use serde::{Deserialize, Serialize};

use super::topics::{SwitchTopic, PAYLOAD_OFF, PAYLOAD_OFFLINE, PAYLOAD_ON, PAYLOAD_ONLINE};

/// Device block shared by every entity of the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub model: String,
    pub identifiers: String,
    pub name: String,
    pub manufacturer: String,
    pub via_device: String,
}

/// One availability source of the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub topic: String,
    pub payload_not_available: String,
    pub payload_available: String,
}

/// Discovery document of a switch entity.
///
/// Field order is the wire order of the rendered JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchDiscovery {
    pub name: String,
    pub unique_id: String,
    pub command_topic: String,
    pub state_topic: String,
    pub state_on: String,
    pub state_off: String,
    pub device: DeviceInfo,
    pub availability: Vec<Availability>,
}

impl SwitchDiscovery {
    /// The fixed descriptor announced by Book-it-now.
    pub fn guests_today() -> Self {
        Self {
            name: "Guests Today".to_string(),
            unique_id: "guests_today_01".to_string(),
            command_topic: SwitchTopic::Command.path().to_string(),
            state_topic: SwitchTopic::State.path().to_string(),
            state_on: PAYLOAD_ON.to_string(),
            state_off: PAYLOAD_OFF.to_string(),
            device: DeviceInfo {
                model: "1.0.0".to_string(),
                identifiers: "bookitnow".to_string(),
                name: "Book-it-now".to_string(),
                manufacturer: "Allen Archer".to_string(),
                via_device: "bookitnow".to_string(),
            },
            availability: vec![Availability {
                topic: SwitchTopic::Availability.path().to_string(),
                payload_not_available: PAYLOAD_OFFLINE.to_string(),
                payload_available: PAYLOAD_ONLINE.to_string(),
            }],
        }
    }

    /// Renders the document as two-space indented JSON.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
