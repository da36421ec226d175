//! Test doubles for bots built on perch.
//!
//! Enabled by the `testing` feature.
//!
//! - [`InMemoryChatDriver`] records every send, update and delete and hands
//!   out increasing timestamps.
//! - [`StaticUserInfoFinder`] and [`StaticSelfInfoFinder`] answer identity
//!   lookups from fixed data.
//! - [`PluginHarness`] evaluates a plugin the way the runtime would and
//!   returns the answers without sending anything.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use perch_core::{
    Answer, ApiError, ApiResult, ChatDriver, MessageEnvelope, MessageReceipt, Msg, OutgoingMessage,
    SelfIdentity, SelfInfoFinder, Timestamp, UserInfo, UserInfoFinder,
};

use crate::dispatcher::{Route, render, route};
use crate::plugin::Plugin;
use crate::registry::ActionRegistry;

const FIRST_TIMESTAMP: u64 = 1_547_785_956;
const TIMESTAMP_STEP: u64 = 10;

/// A message passed to [`ChatDriver::send_message`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    /// Target channel.
    pub channel: String,
    /// The message.
    pub message: OutgoingMessage,
    /// Timestamp handed back to the caller.
    pub timestamp: Timestamp,
}

/// A call to [`ChatDriver::update_message`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedMessage {
    /// Channel of the updated message.
    pub channel: String,
    /// Timestamp of the updated message.
    pub timestamp: Timestamp,
    /// The new content.
    pub message: OutgoingMessage,
}

/// A call to [`ChatDriver::delete_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedMessage {
    /// Channel of the deleted message.
    pub channel: String,
    /// Timestamp of the deleted message.
    pub timestamp: Timestamp,
}

#[derive(Debug)]
struct DriverState {
    next_timestamp: u64,
    sent: Vec<SentMessage>,
    updated: Vec<UpdatedMessage>,
    deleted: Vec<DeletedMessage>,
    failing: bool,
}

/// A [`ChatDriver`] that keeps everything in memory.
#[derive(Debug)]
pub struct InMemoryChatDriver {
    state: Mutex<DriverState>,
}

impl Default for InMemoryChatDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChatDriver {
    /// Creates a driver with nothing recorded.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DriverState {
                next_timestamp: FIRST_TIMESTAMP,
                sent: Vec::new(),
                updated: Vec::new(),
                deleted: Vec::new(),
                failing: false,
            }),
        }
    }

    /// Makes every following call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Returns the successful sends, oldest first.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().sent.clone()
    }

    /// Returns the successful updates, oldest first.
    pub fn updated(&self) -> Vec<UpdatedMessage> {
        self.state.lock().updated.clone()
    }

    /// Returns the successful deletes, oldest first.
    pub fn deleted(&self) -> Vec<DeletedMessage> {
        self.state.lock().deleted.clone()
    }

    /// Returns the number of successful calls of any kind.
    pub fn call_count(&self) -> usize {
        let state = self.state.lock();
        state.sent.len() + state.updated.len() + state.deleted.len()
    }
}

fn unavailable() -> ApiError {
    ApiError::transport("in-memory driver set to fail")
}

#[async_trait]
impl ChatDriver for InMemoryChatDriver {
    async fn send_message(&self, channel: &str, message: &OutgoingMessage) -> ApiResult<MessageReceipt> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(unavailable());
        }

        let timestamp = Timestamp::new(format!("{}.000000", state.next_timestamp));
        state.next_timestamp += TIMESTAMP_STEP;
        state.sent.push(SentMessage {
            channel: channel.to_string(),
            message: message.clone(),
            timestamp: timestamp.clone(),
        });

        Ok(MessageReceipt {
            channel: channel.to_string(),
            timestamp,
            text: message.text.clone(),
        })
    }

    async fn update_message(
        &self,
        channel: &str,
        timestamp: &Timestamp,
        message: &OutgoingMessage,
    ) -> ApiResult<MessageReceipt> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(unavailable());
        }

        state.updated.push(UpdatedMessage {
            channel: channel.to_string(),
            timestamp: timestamp.clone(),
            message: message.clone(),
        });

        Ok(MessageReceipt {
            channel: channel.to_string(),
            timestamp: timestamp.clone(),
            text: message.text.clone(),
        })
    }

    async fn delete_message(&self, channel: &str, timestamp: &Timestamp) -> ApiResult<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(unavailable());
        }

        state.deleted.push(DeletedMessage {
            channel: channel.to_string(),
            timestamp: timestamp.clone(),
        });
        Ok(())
    }
}

/// A [`UserInfoFinder`] backed by a fixed table. Counts its lookups.
#[derive(Debug, Default)]
pub struct StaticUserInfoFinder {
    users: HashMap<String, UserInfo>,
    calls: AtomicUsize,
}

impl StaticUserInfoFinder {
    /// Creates a finder knowing no user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user.
    pub fn with_user(mut self, user: UserInfo) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    /// Returns how many lookups were made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserInfoFinder for StaticUserInfoFinder {
    async fn user_info(&self, user_id: &str) -> ApiResult<UserInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))
    }
}

/// A [`SelfInfoFinder`] returning a fixed identity, or failing.
#[derive(Debug, Clone)]
pub struct StaticSelfInfoFinder {
    identity: Option<SelfIdentity>,
}

impl StaticSelfInfoFinder {
    /// Always returns `identity`.
    pub fn new(identity: SelfIdentity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// Always fails with [`ApiError::NotConnected`].
    pub fn unavailable() -> Self {
        Self { identity: None }
    }
}

#[async_trait]
impl SelfInfoFinder for StaticSelfInfoFinder {
    async fn self_info(&self) -> ApiResult<SelfIdentity> {
        self.identity.clone().ok_or(ApiError::NotConnected)
    }
}

/// Evaluates a single plugin against messages.
///
/// ```rust,ignore
/// let harness = PluginHarness::new(maker_plugin());
/// let answers = harness.answers("DFromAlphonse", "Alphonse", "make me a sandwich").await;
/// assert_eq!(answers[0].text, "Make it yourself, <@Alphonse>");
/// ```
#[derive(Debug)]
pub struct PluginHarness {
    registry: ActionRegistry,
    me: SelfIdentity,
}

impl PluginHarness {
    /// Wraps `plugin`. The runtime's identity defaults to `BotUserID`.
    pub fn new(plugin: Plugin) -> Self {
        let mut registry = ActionRegistry::new();
        registry.register(plugin);
        Self {
            registry,
            me: SelfIdentity::new("BotUserID", "perch"),
        }
    }

    /// Overrides the runtime's identity.
    pub fn with_identity(mut self, me: SelfIdentity) -> Self {
        self.me = me;
        self
    }

    /// Returns the mention addressing the runtime, for building messages.
    pub fn mention(&self) -> String {
        self.me.mention()
    }

    /// Returns the answers the plugin produces for a message. Unmatched
    /// addressed messages produce no answer here.
    pub async fn answers(&self, channel: &str, user: &str, text: &str) -> Vec<Answer> {
        let env = Arc::new(MessageEnvelope::new(
            &Msg::new(channel, user, text, "1.0"),
            &self.me,
        ));
        let route = route(&self.registry, &env);
        if matches!(route, Route::Unmatched) {
            return Vec::new();
        }
        render(&route, &env).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionDefinition;

    #[tokio::test]
    async fn test_driver_hands_out_increasing_timestamps() {
        let driver = InMemoryChatDriver::new();
        let first = driver
            .send_message("C", &OutgoingMessage::text("a"))
            .await
            .unwrap();
        let second = driver
            .send_message("C", &OutgoingMessage::text("b"))
            .await
            .unwrap();

        assert_eq!(first.timestamp.as_str(), "1547785956.000000");
        assert_eq!(second.timestamp.as_str(), "1547785966.000000");
    }

    #[tokio::test]
    async fn test_failing_driver_records_nothing() {
        let driver = InMemoryChatDriver::new();
        driver.set_failing(true);
        assert!(driver.send_message("C", &OutgoingMessage::text("a")).await.is_err());
        assert!(driver.delete_message("C", &Timestamp::from("1.0")).await.is_err());
        assert_eq!(driver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_harness_respects_addressing() {
        let harness = PluginHarness::new(
            Plugin::new("maker").action(
                ActionDefinition::command("make")
                    .matches(|text, _| text.starts_with("make"))
                    .answer_sync(|env| Some(Answer::text(format!("Make it yourself, <@{}>", env.user)))),
            ),
        );

        let direct = harness.answers("DFromAlphonse", "Alphonse", "make me a sandwich").await;
        assert_eq!(direct[0].text, "Make it yourself, <@Alphonse>");

        let mentioned = format!("{} make coffee", harness.mention());
        assert_eq!(harness.answers("Cgeneral", "Alphonse", &mentioned).await.len(), 1);
        assert!(harness.answers("Cgeneral", "Alphonse", "make coffee").await.is_empty());
    }

    #[tokio::test]
    async fn test_static_finders() {
        let users = StaticUserInfoFinder::new().with_user(UserInfo {
            id: "U1".into(),
            name: "alphonse".into(),
            real_name: None,
        });
        assert!(users.user_info("U1").await.is_ok());
        assert!(matches!(users.user_info("U2").await, Err(ApiError::UserNotFound(_))));
        assert_eq!(users.calls(), 2);

        assert!(StaticSelfInfoFinder::unavailable().self_info().await.is_err());
    }
}
