//! Runs scheduled actions on tokio intervals.
//!
//! Each scheduled action gets its own task. The first run happens one period
//! after the scheduler starts. All tasks stop when the scheduler is shut down
//! or dropped.

use std::mem;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, span, warn};

use perch_core::BoxedChatDriver;
use perch_framework::{Registered, ScheduledAction};

/// Owns the tasks running scheduled actions.
#[derive(Debug)]
pub struct IntervalScheduler {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl IntervalScheduler {
    /// Spawns one task per scheduled action. Must be called from within a
    /// tokio runtime.
    pub fn start(actions: &[Registered<ScheduledAction>], driver: BoxedChatDriver) -> Self {
        let token = CancellationToken::new();
        let mut tasks = Vec::with_capacity(actions.len());

        for registered in actions {
            let period = registered.action.schedule().period();
            if period.is_zero() {
                warn!(plugin = %registered.plugin, "Skipping scheduled action with a zero period");
                continue;
            }

            let action = registered.action.clone();
            let driver = driver.clone();
            let token = token.child_token();
            let span = span!(
                Level::DEBUG,
                "scheduled",
                plugin = %registered.plugin,
                schedule = %action.schedule()
            );

            tasks.push(tokio::spawn(
                async move {
                    let mut ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = ticker.tick() => {
                                debug!("Running scheduled action");
                                action.run(driver.clone()).await;
                            }
                        }
                    }
                }
                .instrument(span),
            ));
        }

        debug!(tasks = tasks.len(), "Scheduler started");
        Self { token, tasks }
    }

    /// Returns the number of running tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no action is scheduled.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stops every task and waits for them to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        for task in mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "Scheduled action task failed");
            }
        }
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
