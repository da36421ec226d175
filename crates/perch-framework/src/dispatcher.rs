//! Message dispatch and reply correlation.
//!
//! The [`Dispatcher`] evaluates incoming messages against the
//! [`ActionRegistry`], posts the answers through the chat driver and keeps the
//! [`ResponseCache`] in sync so that edits and deletions of a source message
//! are mirrored onto its replies.
//!
//! # Routing
//!
//! 1. Addressed messages (direct messages or messages starting with the
//!    runtime's mention) are evaluated against commands in registration order.
//!    The first match answers; when nothing matches the dispatcher answers with
//!    [`FALLBACK_ANSWER`].
//! 2. Unaddressed messages are evaluated against every hear action. All
//!    matches answer, in registration order.
//!
//! # Edits
//!
//! | Tracked replies | New answers | Effect |
//! |---|---|---|
//! | none | none | nothing |
//! | none | some | send them, track them |
//! | some | none | delete every tracked reply, forget the entry |
//! | n | n | update each reply in place, positionally |
//! | n | m != n | delete every tracked reply, send the new ones |
//!
//! The dispatcher is driven by the event loop only, which makes it the single
//! writer of the response cache.

use std::sync::Arc;

use tracing::{Instrument, Level, debug, error, span, trace};

use perch_core::{
    Answer, BoxedChatDriver, MessageEnvelope, OutgoingMessage, ReplyRecord, ThreadTarget, Timestamp,
};

use crate::action::ActionDefinition;
use crate::cache::{MessageKey, ResponseCache};
use crate::registry::{ActionRegistry, Registered};

/// Answer sent when an addressed message matches no command.
pub const FALLBACK_ANSWER: &str =
    "I don't understand, ask me for `help` to see what I can do.";

/// Global threading settings applied to every answer unless the answer
/// overrides them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplySettings {
    /// Attach replies to the source message's thread.
    pub threaded_replies: bool,
    /// Also post threaded replies to the channel.
    pub broadcast_threaded_replies: bool,
}

/// Which actions matched a message.
#[derive(Debug)]
pub enum Route<'a> {
    /// An addressed message matched this command.
    Command(&'a Registered<ActionDefinition>),
    /// An addressed message matched no command.
    Unmatched,
    /// An unaddressed message matched these hear actions, possibly none.
    Hear(Vec<&'a Registered<ActionDefinition>>),
}

impl Route<'_> {
    fn actions(&self) -> Vec<&Registered<ActionDefinition>> {
        match self {
            Self::Command(action) => vec![*action],
            Self::Unmatched => Vec::new(),
            Self::Hear(actions) => actions.clone(),
        }
    }
}

/// Finds the actions matching `env`.
pub fn route<'a>(registry: &'a ActionRegistry, env: &MessageEnvelope) -> Route<'a> {
    if env.addressed {
        return registry
            .commands()
            .iter()
            .find(|r| r.action.is_match(env))
            .map_or(Route::Unmatched, Route::Command);
    }

    Route::Hear(
        registry
            .hear_actions()
            .iter()
            .filter(|r| r.action.is_match(env))
            .collect(),
    )
}

/// Renders the answers of the matched actions, dropping empty ones.
pub async fn render(route: &Route<'_>, env: &Arc<MessageEnvelope>) -> Vec<Answer> {
    let mut answers = Vec::new();
    for matched in route.actions() {
        match matched.action.render(Arc::clone(env)).await {
            Some(answer) if !answer.is_empty() => {
                debug!(
                    plugin = %matched.plugin,
                    action = matched.action.usage(),
                    kind = %matched.action.kind(),
                    "Action answered"
                );
                answers.push(answer);
            }
            _ => trace!(
                plugin = %matched.plugin,
                action = matched.action.usage(),
                "Action matched without answering"
            ),
        }
    }
    answers
}

/// Routes incoming messages to actions and mirrors edits and deletions onto
/// the replies.
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    driver: BoxedChatDriver,
    responses: ResponseCache,
    settings: ReplySettings,
}

impl Dispatcher {
    /// Creates a dispatcher over a frozen registry.
    pub fn new(
        registry: Arc<ActionRegistry>,
        driver: BoxedChatDriver,
        responses: ResponseCache,
        settings: ReplySettings,
    ) -> Self {
        Self {
            registry,
            driver,
            responses,
            settings,
        }
    }

    /// Returns the response cache.
    pub fn responses(&self) -> &ResponseCache {
        &self.responses
    }

    /// Returns the threading settings.
    pub fn settings(&self) -> ReplySettings {
        self.settings
    }

    /// Computes the answers for `env`, including the fallback answer for
    /// unmatched addressed messages.
    pub async fn answers_for(&self, env: &Arc<MessageEnvelope>) -> Vec<Answer> {
        let route = route(&self.registry, env);
        if matches!(route, Route::Unmatched) {
            debug!("No command matched addressed message, sending fallback");
            return vec![Answer::text(FALLBACK_ANSWER)];
        }
        render(&route, env).await
    }

    /// Handles a newly posted message.
    pub async fn handle_new_message(&mut self, env: MessageEnvelope) {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            kind = "new",
            channel = %env.channel,
            timestamp = %env.timestamp
        );
        async move {
            let env = Arc::new(env);
            let answers = self.answers_for(&env).await;
            let replies = self.send_all(&env, answers).await;
            self.responses
                .put(MessageKey::new(env.channel.as_str(), env.timestamp.clone()), replies);
        }
        .instrument(span)
        .await
    }

    /// Handles an edit of a previously posted message.
    ///
    /// `env` carries the edited text and the original message's timestamp.
    pub async fn handle_edited_message(&mut self, env: MessageEnvelope) {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            kind = "edited",
            channel = %env.channel,
            timestamp = %env.timestamp
        );
        async move {
            if !self.responses.is_enabled() {
                debug!("Response cache disabled, ignoring edit");
                return;
            }

            let env = Arc::new(env);
            let key = MessageKey::new(env.channel.as_str(), env.timestamp.clone());
            let answers = self.answers_for(&env).await;

            let replies = match self.responses.get(&key) {
                None if answers.is_empty() => return,
                None => self.send_all(&env, answers).await,
                Some(previous) if answers.is_empty() => {
                    self.delete_all(&previous).await;
                    Vec::new()
                }
                Some(previous) if previous.len() == answers.len() => {
                    self.update_all(previous, answers).await
                }
                Some(previous) => {
                    debug!(
                        previous = previous.len(),
                        current = answers.len(),
                        "Reply count changed, replacing replies"
                    );
                    self.delete_all(&previous).await;
                    self.send_all(&env, answers).await
                }
            };
            self.responses.put(key, replies);
        }
        .instrument(span)
        .await
    }

    /// Handles the deletion of a message by deleting its tracked replies.
    pub async fn handle_deleted_message(&mut self, channel: &str, timestamp: &Timestamp) {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            kind = "deleted",
            channel = channel,
            timestamp = %timestamp
        );
        async move {
            let key = MessageKey::new(channel, timestamp.clone());
            match self.responses.remove(&key) {
                Some(replies) => self.delete_all(&replies).await,
                None => trace!("No tracked replies for deleted message"),
            }
        }
        .instrument(span)
        .await
    }

    fn outgoing(&self, answer: Answer, source: Option<&Timestamp>) -> OutgoingMessage {
        let threaded = answer.options.threaded.unwrap_or(self.settings.threaded_replies);
        let broadcast = answer
            .options
            .broadcast
            .unwrap_or(self.settings.broadcast_threaded_replies);

        OutgoingMessage {
            text: answer.text,
            blocks: answer.blocks,
            thread: source.filter(|_| threaded).map(|ts| ThreadTarget {
                timestamp: ts.clone(),
                broadcast,
            }),
        }
    }

    async fn send_all(&self, env: &MessageEnvelope, answers: Vec<Answer>) -> Vec<ReplyRecord> {
        let mut replies = Vec::with_capacity(answers.len());
        for answer in answers {
            let message = self.outgoing(answer, Some(&env.timestamp));
            match self.driver.send_message(&env.channel, &message).await {
                Ok(receipt) => {
                    debug!(reply = %receipt.timestamp, "Sent reply");
                    replies.push(ReplyRecord::from(receipt));
                }
                Err(e) => error!(channel = %env.channel, error = %e, "Failed to send reply"),
            }
        }
        replies
    }

    async fn update_all(&self, previous: Vec<ReplyRecord>, answers: Vec<Answer>) -> Vec<ReplyRecord> {
        let mut replies = Vec::with_capacity(previous.len());
        for (old, answer) in previous.into_iter().zip(answers) {
            let message = self.outgoing(answer, None);
            match self
                .driver
                .update_message(&old.channel, &old.timestamp, &message)
                .await
            {
                Ok(receipt) => {
                    debug!(reply = %old.timestamp, "Updated reply");
                    replies.push(ReplyRecord {
                        text: receipt.text,
                        ..old
                    });
                }
                Err(e) => {
                    error!(channel = %old.channel, reply = %old.timestamp, error = %e, "Failed to update reply");
                    replies.push(old);
                }
            }
        }
        replies
    }

    async fn delete_all(&self, replies: &[ReplyRecord]) {
        for reply in replies {
            match self.driver.delete_message(&reply.channel, &reply.timestamp).await {
                Ok(()) => debug!(reply = %reply.timestamp, "Deleted reply"),
                Err(e) => error!(
                    channel = %reply.channel,
                    reply = %reply.timestamp,
                    error = %e,
                    "Failed to delete reply"
                ),
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("responses", &self.responses)
            .field("settings", &self.settings)
            .finish()
    }
}
