//! Console Bot Demo
//!
//! Drives the perch runtime from the terminal. Each plain line typed on stdin
//! becomes a message posted in the `Cconsole` channel; a line starting with `{`
//! is parsed as a JSON [`Event`], which is how edits and deletions are played:
//!
//! ```text
//! blue jays
//! {"type":"message","channel":"Cconsole","subtype":{"message_changed":{"message":{"user":"Uconsole","text":"never mind","timestamp":"1.000000"}}}}
//! {"type":"message","channel":"Cconsole","subtype":{"message_deleted":{"deleted_timestamp":"1.000000"}}}
//! ```
//!
//! Replies, updates and deletions are printed to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --threaded --response-cache-size 100
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use perch::prelude::*;
use perch::runtime::RuntimeBuilder;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const CONSOLE_CHANNEL: &str = "Cconsole";
const CONSOLE_USER: &str = "Uconsole";
const BOT_ID: &str = "UPERCH";

#[derive(Debug, Parser)]
#[command(name = "console-bot", about = "Chat with a perch bot from the terminal")]
struct Args {
    /// Configuration file (defaults to perch.toml in the current directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reply in threads.
    #[arg(long)]
    threaded: bool,

    /// Number of messages whose replies follow edits and deletions.
    #[arg(long)]
    response_cache_size: Option<i64>,
}

/// Hands out console timestamps, shared by typed messages and replies.
#[derive(Debug, Default)]
struct Clock(AtomicU64);

impl Clock {
    fn next(&self) -> Timestamp {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Timestamp::new(format!("{n}.000000"))
    }
}

/// Prints outgoing messages instead of sending them anywhere.
struct ConsoleDriver {
    clock: Arc<Clock>,
}

#[async_trait]
impl ChatDriver for ConsoleDriver {
    async fn send_message(&self, channel: &str, message: &OutgoingMessage) -> ApiResult<MessageReceipt> {
        let timestamp = self.clock.next();
        match &message.thread {
            Some(thread) => println!("[{channel} {timestamp} thread:{}] {}", thread.timestamp, message.text),
            None => println!("[{channel} {timestamp}] {}", message.text),
        }
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
        println!("[{channel} {timestamp} edited] {}", message.text);
        Ok(MessageReceipt {
            channel: channel.to_string(),
            timestamp: timestamp.clone(),
            text: message.text.clone(),
        })
    }

    async fn delete_message(&self, channel: &str, timestamp: &Timestamp) -> ApiResult<()> {
        println!("[{channel} {timestamp} deleted]");
        Ok(())
    }
}

/// Every console user is named after their identifier.
struct ConsoleUsers;

#[async_trait]
impl UserInfoFinder for ConsoleUsers {
    async fn user_info(&self, user_id: &str) -> ApiResult<UserInfo> {
        Ok(UserInfo {
            id: user_id.to_string(),
            name: user_id.trim_start_matches('U').to_lowercase(),
            real_name: None,
        })
    }
}

struct ConsoleSelf {
    name: String,
}

#[async_trait]
impl SelfInfoFinder for ConsoleSelf {
    async fn self_info(&self) -> ApiResult<SelfIdentity> {
        Ok(SelfIdentity::new(BOT_ID, self.name.clone()))
    }
}

fn birds_plugin() -> Plugin {
    Plugin::new("birds")
        .action(
            ActionDefinition::hear("blue jays")
                .description("Reply when someone mentions blue jays")
                .matches(|text, _| text.to_lowercase().contains("blue jays"))
                .answer_sync(|_| Some(Answer::text("I heard you say something about blue jays?"))),
        )
        .scheduled(
            ScheduledAction::new(Schedule::Every(Duration::from_secs(3_600)), |driver| async move {
                if let Err(e) = driver
                    .send_message(CONSOLE_CHANNEL, &OutgoingMessage::text("Chirp!"))
                    .await
                {
                    warn!(error = %e, "Failed to chirp");
                }
            })
            .description("Chirp in the console channel"),
        )
}

fn maker_plugin() -> Plugin {
    Plugin::new("maker").action(
        ActionDefinition::command("make `<something>`")
            .description("Have the bot make something for you")
            .matches(|text, _| text.starts_with("make"))
            .answer_sync(|env| Some(Answer::text(format!("Make it yourself, <@{}>", env.user)))),
    )
}

/// Turns stdin lines into events until EOF.
async fn read_console(events: mpsc::Sender<Event>, clock: Arc<Clock>) -> Result<()> {
    events.send(Event::Connected).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = if line.starts_with('{') {
            match serde_json::from_str::<Event>(line) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed event");
                    continue;
                }
            }
        } else {
            let timestamp = clock.next();
            println!("({timestamp})");
            MessageEvent::posted(Msg::new(CONSOLE_CHANNEL, CONSOLE_USER, line, timestamp)).into()
        };

        if events.send(event).await.is_err() {
            return Ok(());
        }
    }

    info!("End of input");
    let _ = events.send(Event::Termination).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = RuntimeBuilder::new();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    let mut config = builder.load_config().context("Failed to load configuration")?;
    config.threaded_replies |= args.threaded;
    if let Some(size) = args.response_cache_size {
        config.response_cache_size = size;
    }

    let name = config.name.clone();
    let mut runtime = PerchRuntime::from_config(config)?;
    runtime.register_plugins([birds_plugin(), maker_plugin()]);

    let clock = Arc::new(Clock::default());
    let (events_tx, events) = event_channel(64);
    spawn_signal_forwarder(events_tx.clone());
    let reader = tokio::spawn(read_console(events_tx, Arc::clone(&clock)));

    println!("Talking to {name} in #{CONSOLE_CHANNEL}. Mention it with <@{BOT_ID}>. Ctrl+D quits.");

    let shutdown = runtime
        .run(Session {
            driver: Arc::new(ConsoleDriver { clock }),
            users: Arc::new(ConsoleUsers),
            me: Arc::new(ConsoleSelf { name }),
            events,
        })
        .await?;
    info!(?shutdown, "Bot stopped");

    reader.abort();
    Ok(())
}
