use chrono::NaiveDateTime;
use rumqttc::QoS;
use std::fmt;

const PREVIEW_CHARS: usize = 10;

/// A single outbound publish as handed to a [`Publish`](super::publisher::Publish) implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let preview: String = self.payload.chars().take(PREVIEW_CHARS).collect();
        if self.payload.chars().count() > PREVIEW_CHARS {
            write!(f, "{} - {}: {}...", self.timestamp, self.topic, preview)
        } else {
            write!(f, "{} - {}: {}", self.timestamp, self.topic, preview)
        }
    }
}

impl OutboundMessage {
    /// Retained, QoS 0 message. Every message of the announcer is built this way.
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        OutboundMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtMostOnce,
            retain: true,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    /// UTF-8 bytes of the payload, unmodified.
    pub fn payload_bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retained_messages_use_qos_zero() {
        let msg = OutboundMessage::retained("a/b", "ONLINE");
        assert_eq!(msg.qos, QoS::AtMostOnce);
        assert!(msg.retain);
        assert_eq!(msg.payload_bytes(), b"ONLINE");
    }

    #[test]
    fn display_truncates_long_payloads_on_char_boundaries() {
        let msg = OutboundMessage::retained("t", "äöüäöüäöüäöüäöü");
        let shown = msg.to_string();
        assert!(shown.ends_with("t: äöüäöüäöüä..."));

        let short = OutboundMessage::retained("t", "ON");
        assert!(short.to_string().ends_with("t: ON"));
    }
}
