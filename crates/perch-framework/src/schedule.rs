//! Scheduled actions.
//!
//! Scheduled actions are registered through plugins like any other action but
//! are triggered by time rather than by messages. The registry only stores
//! them; the runtime hands them to a scheduler once the event loop starts.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use perch_core::BoxedChatDriver;

/// When a scheduled action runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Runs repeatedly with a fixed period, the first run one period after
    /// the loop starts.
    Every(Duration),
}

impl Schedule {
    /// Returns the period between two runs.
    pub fn period(&self) -> Duration {
        match self {
            Self::Every(period) => *period,
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self::Every(period) = self;
        let secs = period.as_secs();
        if secs == 0 {
            write!(f, "every {}ms", period.as_millis())
        } else if secs % 86_400 == 0 {
            write!(f, "every {}d", secs / 86_400)
        } else if secs % 3_600 == 0 {
            write!(f, "every {}h", secs / 3_600)
        } else if secs % 60 == 0 {
            write!(f, "every {}m", secs / 60)
        } else {
            write!(f, "every {secs}s")
        }
    }
}

/// The body of a scheduled action. It receives the chat driver to post with.
pub type ScheduledFn = Arc<dyn Fn(BoxedChatDriver) -> BoxFuture<'static, ()> + Send + Sync>;

/// A time-triggered rule contributed by a plugin.
#[derive(Clone)]
pub struct ScheduledAction {
    schedule: Schedule,
    description: String,
    hidden: bool,
    action: ScheduledFn,
}

impl ScheduledAction {
    /// Creates a scheduled action.
    pub fn new<F, Fut>(schedule: Schedule, f: F) -> Self
    where
        F: Fn(BoxedChatDriver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            schedule,
            description: String::new(),
            hidden: false,
            action: Arc::new(move |driver| f(driver).boxed()),
        }
    }

    /// Sets the description shown by help.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Hides the action from help listings.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Returns the schedule.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Returns the description.
    pub fn get_description(&self) -> &str {
        &self.description
    }

    /// Returns `true` if the action is hidden from help.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Runs the action once.
    pub async fn run(&self, driver: BoxedChatDriver) {
        (self.action)(driver).await;
    }
}

impl fmt::Debug for ScheduledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledAction")
            .field("schedule", &self.schedule)
            .field("description", &self.description)
            .field("hidden", &self.hidden)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_display() {
        assert_eq!(Schedule::Every(Duration::from_secs(3_600)).to_string(), "every 1h");
        assert_eq!(Schedule::Every(Duration::from_secs(120)).to_string(), "every 2m");
        assert_eq!(Schedule::Every(Duration::from_secs(90)).to_string(), "every 90s");
        assert_eq!(Schedule::Every(Duration::from_secs(172_800)).to_string(), "every 2d");
        assert_eq!(Schedule::Every(Duration::from_millis(250)).to_string(), "every 250ms");
    }

    #[test]
    fn test_run_hands_over_the_driver() {
        use crate::testing::InMemoryChatDriver;
        use perch_core::OutgoingMessage;

        let driver = Arc::new(InMemoryChatDriver::new());
        let action = ScheduledAction::new(Schedule::Every(Duration::from_secs(60)), |driver| async move {
            let _ = driver
                .send_message("Cgeneral", &OutgoingMessage::text("chirp"))
                .await;
        });

        tokio_test::block_on(action.run(driver.clone()));
        tokio_test::block_on(action.run(driver.clone()));

        assert_eq!(driver.sent().len(), 2);
        assert_eq!(driver.sent()[1].message.text, "chirp");
    }
}
