//! Clock task that turns wall time into simulation ticks.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use super::simulation::Command;

/// Sends one `Advance` per interval until the simulation worker goes away.
///
/// Holds only a weak sender so it never keeps the worker alive on its own.
pub struct ClockWorker {
    command_tx: mpsc::WeakSender<Command>,
    interval: Duration,
}

impl ClockWorker {
    pub fn new(command_tx: mpsc::WeakSender<Command>, interval: Duration) -> Self {
        Self {
            command_tx,
            interval,
        }
    }

    pub async fn run(self) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            let Some(command_tx) = self.command_tx.upgrade() else {
                break;
            };
            let advance = Command::Advance {
                ticks: 1,
                reply: None,
            };
            if command_tx.send(advance).await.is_err() {
                break;
            }
        }
        debug!("ClockWorker stopped");
    }
}
