//! Answers produced by actions, the messages rendered from them, and the
//! records kept for replies the platform accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Timestamp;

/// Per-answer overrides of the runtime's threading configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptions {
    /// Forces (or prevents) a threaded reply.
    #[serde(default)]
    pub threaded: Option<bool>,
    /// Forces (or prevents) broadcasting a threaded reply to the channel.
    #[serde(default)]
    pub broadcast: Option<bool>,
}

/// The reply an action renders for a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Reply text.
    pub text: String,
    /// Optional structured content blocks, passed through to the platform.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Value>,
    /// Threading overrides.
    #[serde(default)]
    pub options: AnswerOptions,
}

impl Answer {
    /// A plain text answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attaches structured content blocks.
    pub fn with_blocks(mut self, blocks: Vec<Value>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Overrides whether this answer is posted in the source message's thread.
    pub fn in_thread(mut self, threaded: bool) -> Self {
        self.options.threaded = Some(threaded);
        self
    }

    /// Overrides whether a threaded answer is also broadcast to the channel.
    pub fn broadcast(mut self, broadcast: bool) -> Self {
        self.options.broadcast = Some(broadcast);
        self
    }

    /// Returns `true` if there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.blocks.is_empty()
    }
}

impl From<&str> for Answer {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for Answer {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

/// Where a threaded reply is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadTarget {
    /// Timestamp of the thread's parent (the source message).
    pub timestamp: Timestamp,
    /// Also post the reply to the channel.
    pub broadcast: bool,
}

/// A message about to be sent or updated through the chat driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Message text.
    pub text: String,
    /// Structured content blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Value>,
    /// Thread to attach the message to. Never set on updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadTarget>,
}

impl OutgoingMessage {
    /// A plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// What the platform returned after accepting a send or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    /// Channel the message lives in.
    pub channel: String,
    /// Timestamp assigned by the platform.
    pub timestamp: Timestamp,
    /// Text as rendered by the platform.
    pub text: String,
}

/// One reply the runtime sent for a source message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRecord {
    /// Channel of the reply.
    pub channel: String,
    /// Timestamp of the reply, used to update or delete it.
    pub timestamp: Timestamp,
    /// Rendered content of the reply.
    pub text: String,
}

impl From<MessageReceipt> for ReplyRecord {
    fn from(receipt: MessageReceipt) -> Self {
        Self {
            channel: receipt.channel,
            timestamp: receipt.timestamp,
            text: receipt.text,
        }
    }
}
