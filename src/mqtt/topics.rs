//! Fixed topic table and payload literals of the Guests Today switch.

use std::fmt;

pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";
pub const PAYLOAD_ONLINE: &str = "ONLINE";
pub const PAYLOAD_OFFLINE: &str = "OFFLINE";

/// Well-known topics of the switch entity, all below
/// `homeassistant/switch/bookitnow/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchTopic {
    /// Discovery document, consumed by the hub to create the entity
    Config,
    /// `ONLINE` / `OFFLINE`
    Availability,
    /// `ON` / `OFF`
    State,
    /// Referenced by the discovery document, never subscribed to here
    Command,
}

impl SwitchTopic {
    pub const ALL: [SwitchTopic; 4] = [
        SwitchTopic::Config,
        SwitchTopic::Availability,
        SwitchTopic::State,
        SwitchTopic::Command,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            SwitchTopic::Config => "homeassistant/switch/bookitnow/config",
            SwitchTopic::Availability => "homeassistant/switch/bookitnow/available",
            SwitchTopic::State => "homeassistant/switch/bookitnow/state",
            SwitchTopic::Command => "homeassistant/switch/bookitnow/set",
        }
    }
}

impl fmt::Display for SwitchTopic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Two-valued state of the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub const fn payload(self) -> &'static str {
        match self {
            SwitchState::On => PAYLOAD_ON,
            SwitchState::Off => PAYLOAD_OFF,
        }
    }
}

impl From<bool> for SwitchState {
    fn from(guests_today: bool) -> Self {
        if guests_today {
            SwitchState::On
        } else {
            SwitchState::Off
        }
    }
}
