//! Recurring full-pipeline runs on a cron schedule.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use vibetrend_core::Run;

use crate::pipeline::Pipeline;

/// Run the full pipeline on `cron` until interrupted with ctrl-c.
///
/// Each tick is an independent run dated by the tick's UTC day. A failed tick
/// is logged and the scheduler keeps going.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be built or started, `cron` is
/// not a valid expression, or the ctrl-c handler cannot be installed.
pub async fn run_scheduled(pipeline: Arc<Pipeline>, cron: &str) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new().await?;
    register_pipeline_job(&scheduler, pipeline, cron).await?;
    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    scheduler.shutdown().await?;
    Ok(())
}

async fn register_pipeline_job(
    scheduler: &JobScheduler,
    pipeline: Arc<Pipeline>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pipeline = Arc::clone(&pipeline);

        Box::pin(async move {
            let run = Run::new(Utc::now().date_naive(), &[], false);
            tracing::info!(date = %run.run_date, "scheduler: starting pipeline run");
            match pipeline.run(&run).await {
                Ok(summary) => {
                    println!("{summary}");
                    tracing::info!(date = %run.run_date, "scheduler: pipeline run complete");
                }
                Err(e) => {
                    tracing::error!(date = %run.run_date, error = %e, "scheduler: pipeline run failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered pipeline job");
    Ok(())
}
