//! The help plugin.
//!
//! Answers `help` (addressed, case-insensitive) with a greeting and the list
//! of visible actions. The requesting user's name is looked up through the
//! given [`UserInfoFinder`], which the runtime backs with the user info cache.

use std::fmt::Write as _;
use std::sync::Arc;

use perch_core::{Answer, BoxedUserInfoFinder, MessageEnvelope};
use tracing::debug;

use crate::action::{ActionDefinition, ActionInfo, ActionKind};
use crate::plugin::Plugin;

/// Name under which the help plugin registers.
pub const HELP_PLUGIN_NAME: &str = "help";

/// Builds the help plugin for `bot_name`, listing `infos`.
pub fn help_plugin(
    bot_name: impl Into<String>,
    infos: Vec<ActionInfo>,
    users: BoxedUserInfoFinder,
) -> Plugin {
    let listing: Arc<str> = Arc::from(render_listing(&bot_name.into(), &infos));

    let help = ActionDefinition::command("help")
        .description("Reply with usage instructions")
        .matches(|text, _| text.trim().eq_ignore_ascii_case("help"))
        .answer(move |env: Arc<MessageEnvelope>| {
            let listing = Arc::clone(&listing);
            let users = Arc::clone(&users);
            async move {
                let greeting = match users.user_info(&env.user).await {
                    Ok(info) => info.display_name().to_string(),
                    Err(e) => {
                        debug!(user = %env.user, error = %e, "User lookup failed, greeting by mention");
                        format!("<@{}>", env.user)
                    }
                };
                Some(Answer::text(format!("Hi, {greeting}! {listing}")))
            }
        });

    Plugin::new(HELP_PLUGIN_NAME).action(help)
}

fn render_listing(bot_name: &str, infos: &[ActionInfo]) -> String {
    let mut out = format!("I'm `{bot_name}` and I listen to the chat to help out.\n");

    let section = |out: &mut String, title: &str, kind: ActionKind| {
        let mut visible = infos.iter().filter(|i| i.kind == kind && !i.hidden).peekable();
        if visible.peek().is_none() {
            return;
        }
        let _ = write!(out, "\n{title}\n");
        for info in visible {
            if info.description.is_empty() {
                let _ = writeln!(out, "\t• `{}`", info.usage);
            } else {
                let _ = writeln!(out, "\t• `{}` - {}", info.usage, info.description);
            }
        }
    };

    section(
        &mut out,
        &format!("I currently support the following commands (address me with `@{bot_name}` or in a direct message):"),
        ActionKind::Command,
    );
    section(&mut out, "And I listen for the following:", ActionKind::Hear);
    section(&mut out, "And I do these on a schedule:", ActionKind::Scheduled);

    out.push_str("\nType `help` in a direct message to see this again.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use perch_core::{ApiError, ApiResult, Msg, SelfIdentity, UserInfo, UserInfoFinder};

    struct Finder(Option<UserInfo>);

    #[async_trait]
    impl UserInfoFinder for Finder {
        async fn user_info(&self, id: &str) -> ApiResult<UserInfo> {
            self.0.clone().ok_or_else(|| ApiError::UserNotFound(id.to_string()))
        }
    }

    fn info(kind: ActionKind, usage: &str, hidden: bool) -> ActionInfo {
        ActionInfo {
            plugin: "p".to_string(),
            kind,
            usage: usage.to_string(),
            description: format!("does {usage}"),
            hidden,
        }
    }

    fn envelope(text: &str) -> Arc<MessageEnvelope> {
        Arc::new(MessageEnvelope::new(
            &Msg::new("DAlphonse", "U1", text, "1.0"),
            &SelfIdentity::new("BOT", "perch"),
        ))
    }

    #[test]
    fn test_listing_skips_hidden_actions() {
        let listing = render_listing(
            "perch",
            &[
                info(ActionKind::Command, "make", false),
                info(ActionKind::Hear, "blue jays", false),
                info(ActionKind::Hear, "secret", true),
            ],
        );
        assert!(listing.contains("`make` - does make"));
        assert!(listing.contains("`blue jays`"));
        assert!(!listing.contains("secret"));
        assert!(!listing.contains("on a schedule"));
    }

    #[tokio::test]
    async fn test_help_greets_by_name() {
        let users: BoxedUserInfoFinder = Arc::new(Finder(Some(UserInfo {
            id: "U1".to_string(),
            name: "alphonse".to_string(),
            real_name: Some("Alphonse".to_string()),
        })));
        let plugin = help_plugin("perch", vec![], users);
        let action = &plugin.commands()[0];

        let env = envelope("Help");
        assert!(action.is_match(&env));
        let answer = action.render(env).await.expect("answer");
        assert!(answer.text.starts_with("Hi, Alphonse!"));
    }

    #[tokio::test]
    async fn test_help_falls_back_to_mention() {
        let plugin = help_plugin("perch", vec![], Arc::new(Finder(None)));
        let action = &plugin.commands()[0];

        let answer = action.render(envelope("help")).await.expect("answer");
        assert!(answer.text.starts_with("Hi, <@U1>!"));
        assert!(!action.is_match(&envelope("help me")));
    }
}
