//! Periodic deadline sweep

use crate::config::SchedulerConfig;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use workflow_engine::{DeadlineSweep, SweepOutcome};

/// Runs the deadline sweep on an interval until stopped
pub struct Scheduler {
    config: SchedulerConfig,
    sweep: Arc<DeadlineSweep>,
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, sweep: Arc<DeadlineSweep>) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            config,
            sweep,
            shutdown_tx,
        })
    }

    /// Spawn the sweep loop; `None` when the sweep is disabled
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.deadline_sweep_enabled {
            tracing::info!("Deadline sweep disabled");
            return None;
        }

        let scheduler = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = Duration::from_secs(self.config.deadline_sweep_interval_secs.max(1));

        tracing::info!(
            interval_secs = period.as_secs(),
            window_days = self.config.deadline_window_days,
            "Scheduler started"
        );

        Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => scheduler.sweep_once().await,
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Scheduler stopped");
        }))
    }

    /// Signal the loop to stop after the current pass
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    async fn sweep_once(&self) {
        match self.sweep.run().await {
            Ok(SweepOutcome::Completed(report)) => {
                tracing::debug!(notified = report.notified, "Scheduled deadline sweep done");
            }
            Ok(SweepOutcome::Skipped) => {
                tracing::debug!("Scheduled deadline sweep skipped, another run in progress");
            }
            Err(e) => tracing::error!(error = %e, "Deadline sweep failed"),
        }
    }
}
