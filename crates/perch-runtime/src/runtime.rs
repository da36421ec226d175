//! The event loop.
//!
//! [`PerchRuntime`] owns the configuration and the action registry. Calling
//! [`PerchRuntime::run`] with a [`Session`] freezes the registry, starts the
//! scheduler and handles the session's events one at a time, in arrival
//! order, until a termination event, an authentication failure or the end of
//! the event stream.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use perch_runtime::{PerchRuntime, Session, event_channel, spawn_signal_forwarder};
//!
//! let mut runtime = PerchRuntime::builder().config_file("perch.toml").build()?;
//! runtime.register_plugin(my_plugin());
//!
//! let (events_tx, events) = event_channel(256);
//! spawn_signal_forwarder(events_tx.clone());
//! // hand `events_tx` to the transport, then:
//! let shutdown = runtime.run(Session { driver, users, me, events }).await?;
//! ```

use std::fmt;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use perch_core::{
    BoxedChatDriver, BoxedSelfInfoFinder, BoxedUserInfoFinder, Event, MessageEnvelope,
    MessageEvent, MessageSubtype, SelfIdentity,
};
use perch_framework::{
    ActionRegistry, Dispatcher, Plugin, ResponseCache, UserInfoCache, help_plugin,
};

use crate::config::{ConfigLoader, PerchConfig, validate_config};
use crate::config::validation::cache_capacity;
use crate::error::{ConfigResult, RuntimeError, RuntimeResult};
use crate::logging;
use crate::scheduler::IntervalScheduler;
use crate::state::LoopState;

/// Creates the ordered channel a transport pushes events into.
pub fn event_channel(capacity: usize) -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(capacity)
}

/// Forwards Ctrl+C (and SIGTERM on unix) as an [`Event::Termination`].
pub fn spawn_signal_forwarder(events: mpsc::Sender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if wait_for_signal().await {
            let _ = events.send(Event::Termination).await;
        }
    })
}

async fn wait_for_signal() -> bool {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = signal::ctrl_c() => return log_ctrl_c(result),
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                        return true;
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    log_ctrl_c(signal::ctrl_c().await)
}

fn log_ctrl_c(result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!("Received Ctrl+C, shutting down");
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            false
        }
    }
}

/// Why the event loop stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// A termination event was received.
    Terminated,
    /// Every event sender was dropped.
    EventSourceClosed,
}

/// The platform collaborators of one connected session.
pub struct Session {
    /// Sends, updates and deletes messages.
    pub driver: BoxedChatDriver,
    /// Resolves user identifiers.
    pub users: BoxedUserInfoFinder,
    /// Resolves the runtime's own identity once connected.
    pub me: BoxedSelfInfoFinder,
    /// The ordered event stream.
    pub events: mpsc::Receiver<Event>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// The chat bot runtime.
pub struct PerchRuntime {
    config: PerchConfig,
    registry: ActionRegistry,
    response_cache_size: usize,
    user_info_cache_size: usize,
}

impl PerchRuntime {
    /// Loads the configuration from the default locations and builds a
    /// runtime from it.
    pub fn new() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Validates `config`, initializes logging and creates the runtime.
    pub fn from_config(config: PerchConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging)?;

        let response_cache_size = cache_capacity("response_cache_size", config.response_cache_size)?;
        let user_info_cache_size =
            cache_capacity("user_info_cache_size", config.user_info_cache_size)?;

        info!(
            name = %config.name,
            response_cache_size,
            user_info_cache_size,
            threaded_replies = config.threaded_replies,
            "Runtime initialized from configuration"
        );

        Ok(Self {
            config,
            registry: ActionRegistry::new(),
            response_cache_size,
            user_info_cache_size,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PerchConfig {
        &self.config
    }

    /// Returns the actions registered so far.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Registers a plugin. Its actions are evaluated after those of every
    /// plugin registered before it.
    pub fn register_plugin(&mut self, plugin: Plugin) {
        info!(plugin = plugin.name(), "Registering plugin");
        self.registry.register(plugin);
    }

    /// Registers several plugins at once.
    pub fn register_plugins(&mut self, plugins: impl IntoIterator<Item = Plugin>) {
        for plugin in plugins {
            self.register_plugin(plugin);
        }
    }

    /// Runs the event loop over `session` until it stops.
    ///
    /// Returns [`RuntimeError::InvalidCredentials`] when the platform rejects
    /// the session.
    pub async fn run(self, session: Session) -> RuntimeResult<Shutdown> {
        let Self {
            config,
            mut registry,
            response_cache_size,
            user_info_cache_size,
        } = self;
        let Session {
            driver,
            users,
            me,
            mut events,
        } = session;

        let users: BoxedUserInfoFinder = UserInfoCache::shared(users, user_info_cache_size);
        if config.help_enabled {
            let help = help_plugin(config.name.clone(), registry.infos(), Arc::clone(&users));
            registry.register(help);
        }

        let registry = Arc::new(registry);
        let scheduler = IntervalScheduler::start(registry.scheduled_actions(), Arc::clone(&driver));
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            driver,
            ResponseCache::new(response_cache_size),
            config.reply_settings(),
        );
        let mut event_loop = EventLoop::new(dispatcher, me);

        info!(
            commands = registry.commands().len(),
            hear_actions = registry.hear_actions().len(),
            scheduled_actions = scheduler.len(),
            "Event loop started"
        );

        let outcome = loop {
            let Some(event) = events.recv().await else {
                info!("Event source closed, shutting down");
                break Ok(Shutdown::EventSourceClosed);
            };
            if let ControlFlow::Break(outcome) = event_loop.handle(event).await {
                break outcome;
            }
        };

        scheduler.shutdown().await;
        info!(state = %event_loop.state, "Event loop stopped");
        outcome
    }
}

/// Single-writer state of a running session.
struct EventLoop {
    state: LoopState,
    me: Option<SelfIdentity>,
    connections: u64,
    self_info: BoxedSelfInfoFinder,
    dispatcher: Dispatcher,
}

impl EventLoop {
    fn new(dispatcher: Dispatcher, self_info: BoxedSelfInfoFinder) -> Self {
        Self {
            state: LoopState::Disconnected,
            me: None,
            connections: 0,
            self_info,
            dispatcher,
        }
    }

    async fn handle(&mut self, event: Event) -> ControlFlow<RuntimeResult<Shutdown>> {
        trace!(event = event.name(), state = %self.state, "Handling event");

        match event {
            Event::Connected => self.on_connected().await,
            Event::Message(message) => self.on_message(message).await,
            Event::LatencyReport { latency_ms } => {
                info!("Current latency: {:?}", Duration::from_millis(latency_ms));
            }
            Event::TransportError { code, message } => {
                error!("Error: Code {code} - {message}");
            }
            Event::InvalidCredentials => {
                error!("Invalid credentials");
                self.state = LoopState::Terminated;
                return ControlFlow::Break(Err(RuntimeError::InvalidCredentials));
            }
            Event::Termination => {
                info!("Termination requested");
                self.state = LoopState::Terminated;
                return ControlFlow::Break(Ok(Shutdown::Terminated));
            }
        }
        ControlFlow::Continue(())
    }

    async fn on_connected(&mut self) {
        self.connections += 1;
        info!("Connection counter: {}", self.connections);

        if let Some(me) = &self.me {
            debug!(id = %me.id, "Reconnected, keeping self identity");
            return;
        }

        match self.self_info.self_info().await {
            Ok(me) => {
                info!(id = %me.id, name = %me.name, "Connected");
                self.me = Some(me);
                self.state = self.state.connected();
            }
            Err(e) => error!(error = %e, "Failed to resolve self identity"),
        }
    }

    async fn on_message(&mut self, message: MessageEvent) {
        let Some(me) = self.me.as_ref().filter(|_| self.state.accepts_messages()) else {
            warn!(channel = %message.channel, "Dropping message received before connecting");
            return;
        };

        if message.is_reply_echo() {
            trace!(reply_to = message.reply_to, "Ignoring echo of own message");
            return;
        }

        match &message.subtype {
            None => {
                if message.user == me.id {
                    trace!("Ignoring own message");
                    return;
                }
                let env = MessageEnvelope::new(&message.as_msg(), me);
                self.state = self.state.processing();
                self.dispatcher.handle_new_message(env).await;
            }
            Some(MessageSubtype::MessageChanged { message: edited }) => {
                if edited.user == me.id {
                    trace!("Ignoring edit of own message");
                    return;
                }
                let mut edited = edited.clone();
                if edited.channel.is_empty() {
                    edited.channel.clone_from(&message.channel);
                }
                let env = MessageEnvelope::new(&edited, me);
                self.state = self.state.processing();
                self.dispatcher.handle_edited_message(env).await;
            }
            Some(MessageSubtype::MessageDeleted { deleted_timestamp }) => {
                self.state = self.state.processing();
                self.dispatcher
                    .handle_deleted_message(&message.channel, deleted_timestamp)
                    .await;
            }
        }
    }
}

/// Builder for creating a [`PerchRuntime`] from layered configuration.
///
/// ```rust,ignore
/// let runtime = PerchRuntime::builder()
///     .config_file("config/perch.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a builder searching the default locations.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a configuration over the built-in defaults.
    pub fn merge(mut self, config: PerchConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration without building the runtime.
    pub fn load_config(self) -> ConfigResult<PerchConfig> {
        self.config_loader.load()
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<PerchRuntime> {
        PerchRuntime::from_config(self.load_config()?)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_core::{Answer, Msg, Timestamp, UserInfo};
    use perch_framework::ActionDefinition;
    use perch_framework::testing::{InMemoryChatDriver, StaticSelfInfoFinder, StaticUserInfoFinder};

    const BOT_ID: &str = "BotUserID";

    fn birds() -> Plugin {
        Plugin::new("birds")
            .action(
                ActionDefinition::hear("blue jays")
                    .description("Reply when someone mentions blue jays")
                    .matches(|text, _| text.contains("blue jays"))
                    .answer_sync(|_| Some(Answer::text("I heard you say something about blue jays?"))),
            )
            .action(
                ActionDefinition::hear("make")
                    .hidden(true)
                    .matches(|text, _| text.contains("make"))
                    .answer_sync(|_| Some(Answer::text("Did someone say make?"))),
            )
            .action(
                ActionDefinition::command("make `<something>`")
                    .matches(|text, _| text.starts_with("make"))
                    .answer_sync(|env| Some(Answer::text(format!("Make it yourself, <@{}>", env.user)))),
            )
    }

    fn config() -> PerchConfig {
        PerchConfig {
            response_cache_size: 10,
            ..Default::default()
        }
    }

    fn posted(channel: &str, user: &str, text: &str, ts: &str) -> Event {
        MessageEvent::posted(Msg::new(channel, user, text, ts)).into()
    }

    fn edited(channel: &str, text: &str, original_ts: &str) -> Event {
        MessageEvent::changed(channel, "99.0", Msg::new("", "Alphonse", text, original_ts)).into()
    }

    fn deleted(channel: &str, original_ts: &str) -> Event {
        MessageEvent::deleted(channel, "99.0", original_ts).into()
    }

    struct Outcome {
        driver: Arc<InMemoryChatDriver>,
        users: Arc<StaticUserInfoFinder>,
        result: RuntimeResult<Shutdown>,
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn run_with_events(config: PerchConfig, events: Vec<Event>) -> Outcome {
        run_session(config, StaticSelfInfoFinder::new(SelfIdentity::new(BOT_ID, "perch")), events).await
    }

    async fn run_session(config: PerchConfig, me: StaticSelfInfoFinder, events: Vec<Event>) -> Outcome {
        let driver = Arc::new(InMemoryChatDriver::new());
        let users = Arc::new(StaticUserInfoFinder::new().with_user(UserInfo {
            id: "Alphonse".into(),
            name: "alphonse".into(),
            real_name: Some("Alphonse Desjardins".into()),
        }));

        let mut runtime = PerchRuntime::from_config(config).unwrap();
        runtime.register_plugin(birds());

        let (tx, rx) = event_channel(events.len() + 1);
        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx);

        let result = runtime
            .run(Session {
                driver: driver.clone(),
                users: users.clone(),
                me: Arc::new(me),
                events: rx,
            })
            .await;

        Outcome {
            driver,
            users,
            result,
        }
    }

    #[tokio::test]
    async fn test_edit_still_matching_updates_reply() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "1546833210.036900"),
                edited("Cgeneral", "blue jays eat acorn", "1546833210.036900"),
            ],
        )
        .await;

        assert_eq!(out.result.unwrap(), Shutdown::EventSourceClosed);
        let sent = out.driver.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, "Cgeneral");

        let updated = out.driver.updated();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].channel, "Cgeneral");
        assert_eq!(updated[0].timestamp, sent[0].timestamp);
        assert!(out.driver.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_edit_no_longer_matching_deletes_reply() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
                edited("Cgeneral", "never mind", "1.0"),
            ],
        )
        .await;

        let sent = out.driver.sent();
        assert_eq!(sent.len(), 1);
        assert!(out.driver.updated().is_empty());
        let deleted = out.driver.deleted();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].timestamp, sent[0].timestamp);
    }

    #[tokio::test]
    async fn test_edit_newly_matching_sends_without_deleting() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "hello", "1.0"),
                edited("Cgeneral", "blue jays", "1.0"),
            ],
        )
        .await;

        assert_eq!(out.driver.sent().len(), 1);
        assert!(out.driver.deleted().is_empty());
        assert!(out.driver.updated().is_empty());
    }

    #[tokio::test]
    async fn test_direct_message_command_wins() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("DFromAlphonse", "Alphonse", "make me happy", "1.0"),
            ],
        )
        .await;

        let sent = out.driver.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, "DFromAlphonse");
        assert_eq!(sent[0].message.text, "Make it yourself, <@Alphonse>");
    }

    #[tokio::test]
    async fn test_unmatched_message_sends_nothing() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "just chatting", "1.0"),
                deleted("Cgeneral", "1.0"),
            ],
        )
        .await;

        assert_eq!(out.driver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deleting_source_deletes_its_replies() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
                posted("Cgeneral", "Alphonse", "blue jays too", "2.0"),
                deleted("Cgeneral", "1.0"),
                deleted("Cgeneral", "1.0"),
            ],
        )
        .await;

        let sent = out.driver.sent();
        let deleted = out.driver.deleted();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].timestamp, sent[0].timestamp);
    }

    #[tokio::test]
    async fn test_own_messages_and_echoes_are_ignored() {
        let mut echo = MessageEvent::posted(Msg::new("Cgeneral", "Alphonse", "blue jays", "3.0"));
        echo.reply_to = 42;

        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", BOT_ID, "blue jays", "1.0"),
                MessageEvent::changed("Cgeneral", "2.0", Msg::new("", BOT_ID, "blue jays", "1.0")).into(),
                echo.into(),
            ],
        )
        .await;

        assert_eq!(out.driver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_disabled_response_cache_never_updates_or_deletes() {
        let out = run_with_events(
            PerchConfig {
                response_cache_size: 0,
                ..Default::default()
            },
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
                edited("Cgeneral", "blue jays again", "1.0"),
                posted("Cgeneral", "Alphonse", "blue jays", "2.0"),
                deleted("Cgeneral", "2.0"),
            ],
        )
        .await;

        assert_eq!(out.driver.sent().len(), 2);
        assert!(out.driver.updated().is_empty());
        assert!(out.driver.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_replies_follow_arrival_order() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("C1", "Alphonse", "blue jays", "1.0"),
                posted("DFromAlphonse", "Alphonse", "make tea", "1.0"),
                posted("C2", "Alphonse", "blue jays", "1.0"),
            ],
        )
        .await;

        let channels: Vec<_> = out.driver.sent().into_iter().map(|s| s.channel).collect();
        assert_eq!(channels, ["C1", "DFromAlphonse", "C2"]);
    }

    #[tokio::test]
    async fn test_threaded_replies() {
        let out = run_with_events(
            PerchConfig {
                threaded_replies: true,
                ..config()
            },
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
            ],
        )
        .await;

        let thread = out.driver.sent()[0].message.thread.clone().unwrap();
        assert_eq!(thread.timestamp, Timestamp::from("1.0"));
        assert!(!thread.broadcast);
    }

    #[tokio::test]
    async fn test_termination_stops_the_loop() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                Event::Termination,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
            ],
        )
        .await;

        assert_eq!(out.result.unwrap(), Shutdown::Terminated);
        assert_eq!(out.driver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_credentials_is_fatal() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                Event::TransportError {
                    code: 500,
                    message: "oops".into(),
                },
                Event::LatencyReport { latency_ms: 120 },
                Event::InvalidCredentials,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
            ],
        )
        .await;

        assert!(matches!(out.result, Err(RuntimeError::InvalidCredentials)));
        assert_eq!(out.driver.call_count(), 0);
    }

    #[tokio::test]
    async fn test_observability_events_are_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                Event::Connected,
                Event::LatencyReport { latency_ms: 120 },
                Event::TransportError {
                    code: 500,
                    message: "oops".into(),
                },
                Event::InvalidCredentials,
            ],
        )
        .await;
        assert!(matches!(out.result, Err(RuntimeError::InvalidCredentials)));

        let logs = logs.contents();
        assert!(logs.contains("Connection counter: 1"), "{logs}");
        assert!(logs.contains("Connection counter: 2"), "{logs}");
        assert!(!logs.contains("Connection counter: 0"), "{logs}");
        assert!(logs.contains("Current latency: 120ms"), "{logs}");
        assert!(logs.contains("Error: Code 500 - oops"), "{logs}");
        assert!(logs.contains("Invalid credentials"), "{logs}");
    }

    #[tokio::test]
    async fn test_edit_in_other_channel_is_a_new_message() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
                edited("Cother", "blue jays", "1.0"),
            ],
        )
        .await;

        let channels: Vec<_> = out.driver.sent().into_iter().map(|s| s.channel).collect();
        assert_eq!(channels, ["Cgeneral", "Cother"]);
        assert!(out.driver.updated().is_empty());
        assert!(out.driver.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_messages_before_connecting_are_dropped() {
        let out = run_with_events(
            config(),
            vec![
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
                Event::Connected,
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "2.0"),
            ],
        )
        .await;

        assert_eq!(out.driver.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_identity_stays_disconnected() {
        let out = run_session(
            config(),
            StaticSelfInfoFinder::unavailable(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", "blue jays", "1.0"),
            ],
        )
        .await;

        assert_eq!(out.driver.call_count(), 0);
    }

    async fn help_in_channel_and_direct_message(user_info_cache_size: i64) -> Outcome {
        run_with_events(
            PerchConfig {
                user_info_cache_size,
                ..config()
            },
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", &format!("<@{BOT_ID}> help"), "1.0"),
                posted("DFromAlphonse", "Alphonse", "help", "1.0"),
            ],
        )
        .await
    }

    #[tokio::test]
    async fn test_help_with_user_info_cache() {
        let out = help_in_channel_and_direct_message(10).await;

        let sent = out.driver.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].channel, "Cgeneral");
        assert_eq!(sent[1].channel, "DFromAlphonse");
        assert!(sent[0].message.text.starts_with("Hi, Alphonse Desjardins!"));
        assert!(sent[0].message.text.contains("make `<something>`"));
        assert!(sent[0].message.text.contains("blue jays"));
        assert!(!sent[0].message.text.contains("Did someone say make"));
        assert_eq!(out.users.calls(), 1);
    }

    #[tokio::test]
    async fn test_help_without_user_info_cache() {
        let out = help_in_channel_and_direct_message(0).await;

        assert_eq!(out.driver.sent().len(), 2);
        assert_eq!(out.users.calls(), 2);
    }

    #[tokio::test]
    async fn test_addressed_message_without_command_gets_fallback() {
        let out = run_with_events(
            config(),
            vec![
                Event::Connected,
                posted("Cgeneral", "Alphonse", &format!("<@{BOT_ID}> blue jays"), "1.0"),
            ],
        )
        .await;

        let sent = out.driver.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.text, perch_framework::FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_help_can_be_disabled() {
        let out = run_with_events(
            PerchConfig {
                help_enabled: false,
                ..config()
            },
            vec![Event::Connected, posted("DFromAlphonse", "Alphonse", "help", "1.0")],
        )
        .await;

        assert_eq!(out.driver.sent()[0].message.text, perch_framework::FALLBACK_ANSWER);
    }

    #[test]
    fn test_negative_cache_size_fails_fast() {
        let result = PerchRuntime::from_config(PerchConfig {
            user_info_cache_size: -1,
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(RuntimeError::Config(crate::config::ConfigError::InvalidCacheSize { .. }))
        ));
    }
}
