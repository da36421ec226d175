//! Perch Runtime - the event loop and process plumbing of perch.
//!
//! This crate provides:
//! - the event loop state machine ([`PerchRuntime`], [`LoopState`])
//! - layered configuration with figment ([`config`])
//! - logging setup ([`logging`])
//! - the interval scheduler for scheduled actions ([`IntervalScheduler`])
//!
//! ```ignore
//! use perch_runtime::{PerchRuntime, Session, event_channel, spawn_signal_forwarder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = PerchRuntime::new()?;
//!     runtime.register_plugin(birds_plugin());
//!
//!     let (events_tx, events) = event_channel(256);
//!     spawn_signal_forwarder(events_tx.clone());
//!     let transport = MyTransport::connect(events_tx).await?;
//!
//!     runtime
//!         .run(Session {
//!             driver: transport.driver(),
//!             users: transport.users(),
//!             me: transport.self_info(),
//!             events,
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod scheduler;
pub mod state;

pub use config::{ConfigError, ConfigLoader, ConfigResult, PerchConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, SpanEvents};
pub use runtime::{
    PerchRuntime, RuntimeBuilder, Session, Shutdown, event_channel, spawn_signal_forwarder,
};
pub use scheduler::IntervalScheduler;
pub use state::LoopState;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for plugin code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
