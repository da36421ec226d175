//! Plugins: named bundles of actions.
//!
//! A [`Plugin`] is the unit a bot author registers with the runtime. It
//! groups commands, hear actions and scheduled actions under a name that shows
//! up in logs and help listings.
//!
//! ```rust,ignore
//! use perch_framework::{ActionDefinition, Plugin};
//! use perch_core::Answer;
//!
//! let maker = Plugin::new("maker")
//!     .action(
//!         ActionDefinition::command("make `<something>`")
//!             .description("Have the bot make something for you")
//!             .matches(|text, _| text.starts_with("make"))
//!             .answer_sync(|env| Some(Answer::text(format!("Make it yourself, <@{}>", env.user)))),
//!     );
//! ```

pub mod builtin;

use std::borrow::Cow;

use crate::action::{ActionDefinition, Trigger};
use crate::schedule::ScheduledAction;

/// A named bundle of actions.
#[derive(Debug, Clone)]
pub struct Plugin {
    name: Cow<'static, str>,
    commands: Vec<ActionDefinition>,
    hear_actions: Vec<ActionDefinition>,
    scheduled_actions: Vec<ScheduledAction>,
}

impl Plugin {
    /// Creates an empty plugin.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            hear_actions: Vec::new(),
            scheduled_actions: Vec::new(),
        }
    }

    /// Adds a message-triggered action, filed by its kind.
    ///
    /// Actions keep the order they are added in.
    pub fn action(mut self, action: ActionDefinition) -> Self {
        match action.trigger() {
            Trigger::Command => self.commands.push(action),
            Trigger::Hear => self.hear_actions.push(action),
        }
        self
    }

    /// Adds several message-triggered actions.
    pub fn actions(self, actions: impl IntoIterator<Item = ActionDefinition>) -> Self {
        actions.into_iter().fold(self, Self::action)
    }

    /// Adds a scheduled action.
    pub fn scheduled(mut self, action: ScheduledAction) -> Self {
        self.scheduled_actions.push(action);
        self
    }

    /// Returns the plugin's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the plugin's commands in registration order.
    pub fn commands(&self) -> &[ActionDefinition] {
        &self.commands
    }

    /// Returns the plugin's hear actions in registration order.
    pub fn hear_actions(&self) -> &[ActionDefinition] {
        &self.hear_actions
    }

    /// Returns the plugin's scheduled actions.
    pub fn scheduled_actions(&self) -> &[ScheduledAction] {
        &self.scheduled_actions
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Cow<'static, str>,
        Vec<ActionDefinition>,
        Vec<ActionDefinition>,
        Vec<ScheduledAction>,
    ) {
        (
            self.name,
            self.commands,
            self.hear_actions,
            self.scheduled_actions,
        )
    }
}
