//! The action registry.
//!
//! Plugins are registered before the event loop starts; the runtime then
//! wraps the registry in an `Arc` and only reads from it. Registration order
//! is preserved and is the evaluation order of commands and hear actions.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::action::{ActionDefinition, ActionInfo, ActionKind};
use crate::plugin::Plugin;
use crate::schedule::ScheduledAction;

/// An action together with the plugin that contributed it.
#[derive(Debug, Clone)]
pub struct Registered<T> {
    /// Name of the contributing plugin.
    pub plugin: Arc<str>,
    /// The action.
    pub action: T,
}

/// Ordered table of every registered action.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    plugins: Vec<Arc<str>>,
    commands: Vec<Registered<ActionDefinition>>,
    hear_actions: Vec<Registered<ActionDefinition>>,
    scheduled_actions: Vec<Registered<ScheduledAction>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plugin's actions to the registry.
    pub fn register(&mut self, plugin: Plugin) {
        let (name, commands, hear_actions, scheduled_actions) = plugin.into_parts();
        let name: Arc<str> = Arc::from(name.as_ref());

        if self.plugins.contains(&name) {
            warn!(plugin = %name, "Plugin registered more than once");
        }

        debug!(
            plugin = %name,
            commands = commands.len(),
            hear_actions = hear_actions.len(),
            scheduled_actions = scheduled_actions.len(),
            "Registered plugin"
        );

        let wrap = |action| Registered {
            plugin: Arc::clone(&name),
            action,
        };
        self.commands.extend(commands.into_iter().map(wrap));
        self.hear_actions.extend(hear_actions.into_iter().map(wrap));
        self.scheduled_actions
            .extend(scheduled_actions.into_iter().map(|action| Registered {
                plugin: Arc::clone(&name),
                action,
            }));
        self.plugins.push(name);
    }

    /// Returns the registered plugin names in registration order.
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(AsRef::as_ref)
    }

    /// Returns the commands in evaluation order.
    pub fn commands(&self) -> &[Registered<ActionDefinition>] {
        &self.commands
    }

    /// Returns the hear actions in evaluation order.
    pub fn hear_actions(&self) -> &[Registered<ActionDefinition>] {
        &self.hear_actions
    }

    /// Returns the scheduled actions.
    pub fn scheduled_actions(&self) -> &[Registered<ScheduledAction>] {
        &self.scheduled_actions
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.hear_actions.is_empty() && self.scheduled_actions.is_empty()
    }

    /// Returns help metadata for every action: hear actions, then commands,
    /// then scheduled actions.
    pub fn infos(&self) -> Vec<ActionInfo> {
        let message_info = |r: &Registered<ActionDefinition>| ActionInfo {
            plugin: r.plugin.to_string(),
            kind: r.action.kind(),
            usage: r.action.usage().to_string(),
            description: r.action.get_description().to_string(),
            hidden: r.action.is_hidden(),
        };

        self.hear_actions
            .iter()
            .map(message_info)
            .chain(self.commands.iter().map(message_info))
            .chain(self.scheduled_actions.iter().map(|r| ActionInfo {
                plugin: r.plugin.to_string(),
                kind: ActionKind::Scheduled,
                usage: r.action.schedule().to_string(),
                description: r.action.get_description().to_string(),
                hidden: r.action.is_hidden(),
            }))
            .collect()
    }
}
