//! # Perch
//!
//! A chat bot runtime that matches incoming messages against plugin actions,
//! posts the answers and keeps those answers in sync when the source message
//! is edited or deleted.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  Event  ┌────────────┐  envelope  ┌────────────┐  send/update/delete  ┌────────────┐
//! │ transport │───────▶│ event loop │──────────▶│ dispatcher │─────────────────────▶│ ChatDriver │
//! └───────────┘ (mpsc)  └────────────┘            └────────────┘                      └────────────┘
//!                                                   │        │
//!                                        ActionRegistry    ResponseCache
//! ```
//!
//! - **core**: platform events, messages, answers and the collaborator traits
//! - **framework**: actions, plugins, the registry, the dispatcher and caches
//! - **runtime**: configuration, logging, the event loop and the scheduler
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use perch::prelude::*;
//!
//! let birds = Plugin::new("birds").action(
//!     ActionDefinition::hear("blue jays")
//!         .matches(|text, _| text.contains("blue jays"))
//!         .answer_sync(|_| Some(Answer::text("I heard you say something about blue jays?"))),
//! );
//!
//! let mut runtime = PerchRuntime::new()?;
//! runtime.register_plugin(birds);
//! runtime.run(session).await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): load `perch.toml`
//! - `yaml-config`: load `perch.yaml` / `perch.yml`
//! - `json-log`: JSON log lines
//! - `testing`: in-memory chat driver and plugin harness

pub use perch_core as core;
pub use perch_framework as framework;
pub use perch_runtime as runtime;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use perch::prelude::*;
/// ```
pub mod prelude {
    pub use perch_runtime::{
        PerchConfig, PerchRuntime, RuntimeError, RuntimeResult, Session, Shutdown, event_channel,
        spawn_signal_forwarder,
    };

    pub use perch_framework::{
        ActionDefinition, ActionKind, Plugin, Schedule, ScheduledAction,
    };

    pub use perch_core::{
        Answer, ApiError, ApiResult, BoxedChatDriver, ChatDriver, Event, MessageEnvelope,
        MessageEvent, MessageReceipt, Msg, OutgoingMessage, SelfIdentity, SelfInfoFinder,
        Timestamp, UserInfo, UserInfoFinder,
    };

    pub use perch_runtime::prelude::*;
}
