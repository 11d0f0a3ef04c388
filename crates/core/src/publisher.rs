// crates/core/src/publisher.rs
//! Streaming status publisher.
//!
//! One publisher loop runs per subscriber connection: advance the tick
//! counter while a job is running, take a snapshot, push it down the channel,
//! wait out the cadence, repeat. The loop ends when the subscriber side drops
//! its receiver; nothing here can fail into the controller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::controller::JobController;
use crate::types::StatusView;

/// Cadence of the push channel.
pub const PUBLISH_PERIOD: Duration = Duration::from_secs(1);

/// Publish snapshots to `tx` every `period` until the receiver is dropped.
///
/// The first snapshot goes out immediately on subscribe. Snapshots taken here
/// carry the usual side effect: a passed deadline stops the job.
pub async fn publish_status(
    controller: Arc<JobController>,
    tx: mpsc::Sender<StatusView>,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        controller.tick();
        let view = controller.snapshot();
        if tx.send(view).await.is_err() {
            tracing::debug!("status subscriber gone, publisher exiting");
            break;
        }
    }
}
