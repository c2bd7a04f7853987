use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::task::JoinHandle;

use crate::registry::SharedPoll;
use crate::voting::{PollResults, calculate_results};

const SECONDS_PER_MINUTE: u64 = 60;

/// Told when a poll closes because its time ran out.
#[async_trait]
pub trait CloseNotifier: Send + Sync {
    async fn poll_closed(&self, channel_id: &str, results: PollResults);
}

/// Spawn the one-shot task that closes `poll` after `minutes`.
///
/// The close goes through `Poll::expire`, so a poll that was already closed by hand stays
/// as it is and nobody is notified.
pub fn schedule_close(
    poll: SharedPoll,
    minutes: u64,
    notifier: Arc<dyn CloseNotifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(StdDuration::from_secs(minutes.saturating_mul(SECONDS_PER_MINUTE))).await;

        let closed = {
            let mut guard = poll.lock();
            if guard.expire() {
                info!("Poll {} timed out after {} minute(s)", guard.id, minutes);
                let results = calculate_results(&guard, false);
                debug!(
                    "Final tallies for poll {}: {}",
                    guard.id,
                    serde_json::to_string(&results.tallies).unwrap_or_default()
                );
                Some((guard.channel_id.clone(), results))
            } else {
                debug!("Timer for poll {} fired after it was already closed", guard.id);
                None
            }
        };

        if let Some((channel_id, results)) = closed {
            notifier.poll_closed(&channel_id, results).await;
        }
    })
}
