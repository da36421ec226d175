//! # Perch Framework
//!
//! The bot-facing layer of perch:
//! - [`ActionDefinition`]s and [`ScheduledAction`]s, grouped into [`Plugin`]s
//! - the [`ActionRegistry`] holding them in registration order
//! - the [`Dispatcher`], which routes messages to actions and keeps replies in
//!   sync with edits and deletions through the [`ResponseCache`]
//! - the [`UserInfoCache`] in front of the platform's user lookups
//! - the built-in help plugin
//!
//! With the `testing` feature, [`testing`] provides in-memory collaborators and
//! a plugin harness.

pub mod action;
pub mod cache;
pub mod dispatcher;
pub mod plugin;
pub mod registry;
pub mod schedule;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use action::{ActionDefinition, ActionInfo, ActionKind, AnswerFn, MatchFn, Trigger};
pub use cache::{MessageKey, ResponseCache, UserInfoCache};
pub use dispatcher::{Dispatcher, FALLBACK_ANSWER, ReplySettings, Route};
pub use plugin::Plugin;
pub use plugin::builtin::{HELP_PLUGIN_NAME, help_plugin};
pub use registry::{ActionRegistry, Registered};
pub use schedule::{Schedule, ScheduledAction, ScheduledFn};
