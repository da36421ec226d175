//! Platform events consumed by the runtime's event loop.
//!
//! The event source delivers these in the order the platform produced them.
//! Events serialize with a `type` tag so a transport can forward them as JSON:
//!
//! ```json
//! {"type": "message", "channel": "Cgeneral", "user": "U1", "text": "hi", "timestamp": "1.0"}
//! {"type": "latency_report", "latency_ms": 120}
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::message::{Msg, Timestamp};

/// An event delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The session connected (or reconnected) to the platform.
    Connected,
    /// A message was posted, changed or deleted.
    Message(MessageEvent),
    /// The transport measured the round trip latency.
    LatencyReport {
        /// Latency in milliseconds.
        latency_ms: u64,
    },
    /// The transport reported an error.
    TransportError {
        /// Platform error code.
        code: i32,
        /// Error message.
        message: String,
    },
    /// The platform rejected the session credentials.
    InvalidCredentials,
    /// The owner asked the loop to stop.
    Termination,
}

impl Event {
    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Message(_) => "message",
            Self::LatencyReport { .. } => "latency_report",
            Self::TransportError { .. } => "transport_error",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Termination => "termination",
        }
    }
}

/// Message sub-events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSubtype {
    /// An existing message was edited. `message` carries the new text and the
    /// original message's timestamp.
    MessageChanged {
        /// The edited message.
        message: Msg,
    },
    /// A message was deleted.
    MessageDeleted {
        /// Timestamp of the deleted message.
        deleted_timestamp: Timestamp,
    },
}

/// A message event as delivered by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Channel of the event.
    #[serde(default)]
    pub channel: String,
    /// Author of the event.
    #[serde(default)]
    pub user: String,
    /// Text of the event.
    #[serde(default)]
    pub text: String,
    /// Timestamp of the event itself.
    #[serde(default)]
    pub timestamp: Timestamp,
    /// Non-zero when the event is the platform's echo of one of our own
    /// outgoing messages.
    #[serde(default)]
    pub reply_to: u64,
    /// Present for edits and deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<MessageSubtype>,
}

impl MessageEvent {
    /// A freshly posted message.
    pub fn posted(msg: Msg) -> Self {
        Self {
            channel: msg.channel,
            user: msg.user,
            text: msg.text,
            timestamp: msg.timestamp,
            reply_to: 0,
            subtype: None,
        }
    }

    /// An edit of the message identified by `edited.timestamp` in `channel`.
    pub fn changed(
        channel: impl Into<String>,
        timestamp: impl Into<Timestamp>,
        mut edited: Msg,
    ) -> Self {
        let channel = channel.into();
        edited.channel.clone_from(&channel);
        Self {
            channel,
            timestamp: timestamp.into(),
            subtype: Some(MessageSubtype::MessageChanged { message: edited }),
            ..Default::default()
        }
    }

    /// The deletion of the message identified by `deleted` in `channel`.
    pub fn deleted(
        channel: impl Into<String>,
        timestamp: impl Into<Timestamp>,
        deleted: impl Into<Timestamp>,
    ) -> Self {
        Self {
            channel: channel.into(),
            timestamp: timestamp.into(),
            subtype: Some(MessageSubtype::MessageDeleted {
                deleted_timestamp: deleted.into(),
            }),
            ..Default::default()
        }
    }

    /// Returns `true` if this is the echo of one of our own messages.
    pub fn is_reply_echo(&self) -> bool {
        self.reply_to != 0
    }

    /// Returns the event as a plain message.
    pub fn as_msg(&self) -> Msg {
        Msg {
            channel: self.channel.clone(),
            user: self.user.clone(),
            text: self.text.clone(),
            timestamp: self.timestamp.clone(),
        }
    }
}

impl From<MessageEvent> for Event {
    fn from(event: MessageEvent) -> Self {
        Self::Message(event)
    }
}

/// Convenience for building latency reports from a [`Duration`].
impl From<Duration> for Event {
    fn from(latency: Duration) -> Self {
        Self::LatencyReport {
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event_from_json() {
        let json = r#"{"type":"message","channel":"Cgeneral","user":"U1","text":"blue jays","timestamp":"1546833210.036900"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        let Event::Message(msg) = event else {
            panic!("expected a message event");
        };
        assert_eq!(msg.channel, "Cgeneral");
        assert_eq!(msg.timestamp.as_str(), "1546833210.036900");
        assert!(msg.subtype.is_none());
        assert!(!msg.is_reply_echo());
    }

    #[test]
    fn test_changed_message_from_json() {
        let json = r#"{
            "type": "message",
            "channel": "Cgeneral",
            "timestamp": "2.0",
            "subtype": {"message_changed": {"message": {"user": "U1", "text": "edited", "timestamp": "1.0"}}}
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        let Event::Message(MessageEvent {
            subtype: Some(MessageSubtype::MessageChanged { message }),
            ..
        }) = event
        else {
            panic!("expected a changed message");
        };
        assert_eq!(message.text, "edited");
        assert_eq!(message.timestamp.as_str(), "1.0");
    }

    #[test]
    fn test_lifecycle_events_from_json() {
        let event: Event = serde_json::from_str(r#"{"type":"latency_report","latency_ms":120}"#).unwrap();
        assert_eq!(event, Event::LatencyReport { latency_ms: 120 });

        let event: Event = serde_json::from_str(r#"{"type":"invalid_credentials"}"#).unwrap();
        assert_eq!(event.name(), "invalid_credentials");
    }

    #[test]
    fn test_changed_constructor_carries_channel() {
        let event = MessageEvent::changed("Cgeneral", "2.0", Msg::new("", "U1", "edited", "1.0"));
        let Some(MessageSubtype::MessageChanged { message }) = event.subtype else {
            panic!("expected a changed message");
        };
        assert_eq!(message.channel, "Cgeneral");
    }
}
