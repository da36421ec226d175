//! Message model: platform messages, the normalized envelope handed to
//! actions, and the identities involved in a conversation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of direct message channel identifiers.
const DIRECT_CHANNEL_PREFIX: char = 'D';

/// A platform-assigned message timestamp.
///
/// Timestamps are unique within a channel and increase monotonically per
/// channel, so `(channel, timestamp)` identifies a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Wraps a raw platform timestamp.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw timestamp.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Timestamp {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Timestamp {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A chat message as delivered by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    /// Channel the message was posted in.
    #[serde(default)]
    pub channel: String,
    /// Author of the message.
    #[serde(default)]
    pub user: String,
    /// Raw message text.
    #[serde(default)]
    pub text: String,
    /// Platform timestamp of the message.
    pub timestamp: Timestamp,
}

impl Msg {
    /// Creates a message.
    pub fn new(
        channel: impl Into<String>,
        user: impl Into<String>,
        text: impl Into<String>,
        timestamp: impl Into<Timestamp>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user: user.into(),
            text: text.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// The runtime's own identity on the platform.
///
/// Unknown until the session connects; immutable for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIdentity {
    /// The runtime's user identifier.
    pub id: String,
    /// The runtime's display name.
    pub name: String,
}

impl SelfIdentity {
    /// Creates a self identity.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Returns the mention markup addressing this identity (`<@ID>`).
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// Resolved information about a platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identifier.
    pub id: String,
    /// Account name.
    pub name: String,
    /// Full name, when the user has set one.
    #[serde(default)]
    pub real_name: Option<String>,
}

impl UserInfo {
    /// Returns the name to show when talking about this user.
    pub fn display_name(&self) -> &str {
        match self.real_name.as_deref() {
            Some(real) if !real.is_empty() => real,
            _ => &self.name,
        }
    }
}

/// The normalized view of an incoming message that actions evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    /// Channel the message was posted in.
    pub channel: String,
    /// Author of the message.
    pub user: String,
    /// Raw message text.
    pub text: String,
    /// Platform timestamp of the message.
    pub timestamp: Timestamp,
    /// Whether the message is a direct message or starts with a mention of
    /// the runtime.
    pub addressed: bool,
    /// Text with the leading self mention removed and whitespace trimmed.
    body: String,
}

impl MessageEnvelope {
    /// Normalizes a platform message from the point of view of `me`.
    pub fn new(msg: &Msg, me: &SelfIdentity) -> Self {
        let trimmed = msg.text.trim();
        let mention = me.mention();
        let (mentioned, body) = match trimmed.strip_prefix(mention.as_str()) {
            Some(rest) => (true, rest.trim_start().trim_start_matches(':').trim()),
            None => (false, trimmed),
        };

        Self {
            channel: msg.channel.clone(),
            user: msg.user.clone(),
            text: msg.text.clone(),
            timestamp: msg.timestamp.clone(),
            addressed: mentioned || is_direct_channel(&msg.channel),
            body: body.to_string(),
        }
    }

    /// Returns the text rules match against.
    ///
    /// For addressed messages this is the text following the mention; for
    /// everything else it is the trimmed raw text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns `true` if this message arrived on a direct message channel.
    pub fn is_direct(&self) -> bool {
        is_direct_channel(&self.channel)
    }
}

/// Returns `true` if `channel` identifies a direct message conversation.
pub fn is_direct_channel(channel: &str) -> bool {
    channel.starts_with(DIRECT_CHANNEL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> SelfIdentity {
        SelfIdentity::new("BotUserID", "Daniel Quinn")
    }

    #[test]
    fn test_unaddressed_channel_message() {
        let env = MessageEnvelope::new(&Msg::new("Cgeneral", "U1", " blue jays ", "1.0"), &me());
        assert!(!env.addressed);
        assert_eq!(env.body(), "blue jays");
        assert_eq!(env.text, " blue jays ");
    }

    #[test]
    fn test_mention_prefix_is_stripped() {
        let env = MessageEnvelope::new(
            &Msg::new("Cgeneral", "U1", "<@BotUserID> make me laugh", "1.0"),
            &me(),
        );
        assert!(env.addressed);
        assert_eq!(env.body(), "make me laugh");
    }

    #[test]
    fn test_mention_of_someone_else_is_not_addressed() {
        let env = MessageEnvelope::new(&Msg::new("Cgeneral", "U1", "<@U999> make", "1.0"), &me());
        assert!(!env.addressed);
        assert_eq!(env.body(), "<@U999> make");
    }

    #[test]
    fn test_direct_message_is_addressed() {
        let env = MessageEnvelope::new(&Msg::new("DFromUser", "U1", "make me happy", "1.0"), &me());
        assert!(env.addressed);
        assert!(env.is_direct());
        assert_eq!(env.body(), "make me happy");
    }

    #[test]
    fn test_display_name_prefers_real_name() {
        let mut user = UserInfo {
            id: "U1".into(),
            name: "bernard".into(),
            real_name: Some("Bernard Tremblay".into()),
        };
        assert_eq!(user.display_name(), "Bernard Tremblay");
        user.real_name = Some(String::new());
        assert_eq!(user.display_name(), "bernard");
    }
}
