use anyhow::Result;
use tokio::sync::mpsc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::events::{ControllerInput, RefetchTrigger};

pub struct SchedulerConfig {
    pub cron_expression: String,
}

impl SchedulerConfig {
    pub fn new(cron: String) -> Self {
        Self {
            cron_expression: cron,
        }
    }
}

/// Send a scheduled refetch into the controller on every cron tick,
/// until Ctrl+C, then shut the controller down.
pub async fn run_scheduled_refetch(
    config: SchedulerConfig,
    inputs: mpsc::Sender<ControllerInput>,
) -> Result<()> {
    let mut scheduler = JobScheduler::new().await?;

    info!("⏰ Scheduler initialized with cron: {}", config.cron_expression);

    let tick_inputs = inputs.clone();
    let job = Job::new_async(config.cron_expression.as_str(), move |_uuid, _l| {
        let inputs = tick_inputs.clone();
        Box::pin(async move {
            info!("🔄 Scheduled refetch triggered");
            if inputs
                .send(ControllerInput::Refetch(RefetchTrigger::Scheduled))
                .await
                .is_err()
            {
                warn!("⚠️  Controller stopped, scheduled refetch dropped");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("🔄 Watching for changes. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutting down scheduler...");

    scheduler.shutdown().await?;
    // The controller may already be gone if every other sender dropped
    let _ = inputs.send(ControllerInput::Shutdown).await;
    Ok(())
}
