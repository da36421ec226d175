//! Action definitions: the rules plugins contribute.
//!
//! An [`ActionDefinition`] pairs a pure match predicate with an answer
//! function. Actions are plain data: the registry stores them in order and the
//! dispatcher iterates them for every incoming message.
//!
//! # Kinds
//!
//! - [`ActionKind::Command`]: only evaluated for messages addressed to the
//!   runtime (direct messages or messages starting with its mention). The first
//!   matching command wins.
//! - [`ActionKind::Hear`]: evaluated for every unaddressed message. All
//!   matching hear actions answer.
//! - [`ActionKind::Scheduled`]: time-triggered, see [`ScheduledAction`].
//!
//! # Example
//!
//! ```rust,ignore
//! use perch_framework::ActionDefinition;
//! use perch_core::Answer;
//!
//! let blue_jays = ActionDefinition::hear("talk about blue jays")
//!     .description("Reply when someone mentions blue jays")
//!     .matches(|text, _| text.contains("blue jays"))
//!     .answer_sync(|_| Some(Answer::text("I heard you say something about blue jays?")));
//! ```
//!
//! [`ScheduledAction`]: crate::schedule::ScheduledAction

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::trace;

use perch_core::{Answer, MessageEnvelope};

/// A match predicate over the message body and its envelope.
pub type MatchFn = Arc<dyn Fn(&str, &MessageEnvelope) -> bool + Send + Sync>;

/// An answer function rendering the reply for a matched message.
pub type AnswerFn =
    Arc<dyn Fn(Arc<MessageEnvelope>) -> BoxFuture<'static, Option<Answer>> + Send + Sync>;

/// The kind of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Requires the message to be addressed to the runtime.
    Command,
    /// Listens to unaddressed messages.
    Hear,
    /// Runs on a schedule.
    Scheduled,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Hear => f.write_str("hear"),
            Self::Scheduled => f.write_str("scheduled"),
        }
    }
}

/// What triggers a message-triggered action.
///
/// Scheduled actions are time-triggered and are built as
/// [`ScheduledAction`](crate::schedule::ScheduledAction) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// A message addressed to the runtime.
    Command,
    /// Any unaddressed message.
    Hear,
}

impl From<Trigger> for ActionKind {
    fn from(trigger: Trigger) -> Self {
        match trigger {
            Trigger::Command => Self::Command,
            Trigger::Hear => Self::Hear,
        }
    }
}

#[derive(Clone)]
struct ActionInner {
    trigger: Trigger,
    usage: String,
    description: String,
    hidden: bool,
    match_fn: Option<MatchFn>,
    answer_fn: Option<AnswerFn>,
}

/// A message-triggered rule contributed by a plugin.
///
/// Cloning is cheap: the definition is shared behind an `Arc`.
#[derive(Clone)]
pub struct ActionDefinition {
    inner: Arc<ActionInner>,
}

impl ActionDefinition {
    fn new(trigger: Trigger, usage: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ActionInner {
                trigger,
                usage: usage.into(),
                description: String::new(),
                hidden: false,
                match_fn: None,
                answer_fn: None,
            }),
        }
    }

    /// Starts a command definition with its usage string.
    pub fn command(usage: impl Into<String>) -> Self {
        Self::new(Trigger::Command, usage)
    }

    /// Starts a hear definition with its usage string.
    pub fn hear(usage: impl Into<String>) -> Self {
        Self::new(Trigger::Hear, usage)
    }

    fn inner_mut(&mut self) -> &mut ActionInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Sets the description shown by help.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.inner_mut().description = description.into();
        self
    }

    /// Hides the action from help listings. Matching is unaffected.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.inner_mut().hidden = hidden;
        self
    }

    /// Sets the match predicate.
    ///
    /// The predicate receives the message body (the text following the
    /// runtime's mention for addressed messages) and the envelope. It must be
    /// free of side effects. An action without a predicate never matches.
    pub fn matches<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &MessageEnvelope) -> bool + Send + Sync + 'static,
    {
        self.inner_mut().match_fn = Some(Arc::new(f));
        self
    }

    /// Sets an asynchronous answer function.
    pub fn answer<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<MessageEnvelope>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Answer>> + Send + 'static,
    {
        self.inner_mut().answer_fn = Some(Arc::new(move |env| f(env).boxed()));
        self
    }

    /// Sets a synchronous answer function.
    pub fn answer_sync<F>(self, f: F) -> Self
    where
        F: Fn(&MessageEnvelope) -> Option<Answer> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.answer(move |env| {
            let f = Arc::clone(&f);
            async move { f(env.as_ref()) }
        })
    }

    /// Returns what triggers this action.
    pub fn trigger(&self) -> Trigger {
        self.inner.trigger
    }

    /// Returns the kind of this action, never [`ActionKind::Scheduled`].
    pub fn kind(&self) -> ActionKind {
        self.inner.trigger.into()
    }

    /// Returns the usage string.
    pub fn usage(&self) -> &str {
        &self.inner.usage
    }

    /// Returns the description.
    pub fn get_description(&self) -> &str {
        &self.inner.description
    }

    /// Returns `true` if the action is hidden from help.
    pub fn is_hidden(&self) -> bool {
        self.inner.hidden
    }

    /// Evaluates the match predicate against an envelope.
    pub fn is_match(&self, env: &MessageEnvelope) -> bool {
        match &self.inner.match_fn {
            Some(f) => f(env.body(), env),
            None => false,
        }
    }

    /// Renders the answer for a matched message.
    ///
    /// Returns `None` when the action has no answer function or decided not to
    /// reply.
    pub async fn render(&self, env: Arc<MessageEnvelope>) -> Option<Answer> {
        let Some(f) = &self.inner.answer_fn else {
            trace!(usage = %self.inner.usage, "Action has no answer function");
            return None;
        };
        f(env).await
    }
}

impl fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("trigger", &self.inner.trigger)
            .field("usage", &self.inner.usage)
            .field("hidden", &self.inner.hidden)
            .finish()
    }
}

/// Help-facing metadata about a registered action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInfo {
    /// Name of the contributing plugin.
    pub plugin: String,
    /// Kind of the action.
    pub kind: ActionKind,
    /// Usage string.
    pub usage: String,
    /// Description.
    pub description: String,
    /// Whether the action is hidden from help.
    pub hidden: bool,
}
