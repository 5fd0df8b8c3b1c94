use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{
    config::Settings,
    error::{Error, Result},
    info,
    radar::ChronJob,
};

/// Fires the Release Radar job on the configured cron expression, forever.
pub async fn schedule(settings: &Settings, run_now: bool) {
    if let Err(e) = start_scheduler(settings, run_now).await {
        crate::error!("Scheduler stopped. Err: {}", e);
    }
}

async fn start_scheduler(settings: &Settings, run_now: bool) -> Result<()> {
    let job = Arc::new(ChronJob::from_settings(settings).await?);

    if run_now {
        run_logged(&job).await;
    }

    let sched = JobScheduler::new().await.map_err(scheduler_error)?;

    let scheduled = Arc::clone(&job);
    let cron = Job::new_async(settings.schedule.as_str(), move |_uuid, _l| {
        let job = Arc::clone(&scheduled);
        Box::pin(async move {
            run_logged(&job).await;
        })
    })
    .map_err(scheduler_error)?;

    sched.add(cron).await.map_err(scheduler_error)?;
    sched.start().await.map_err(scheduler_error)?;
    info!("Scheduler started with '{}'", settings.schedule);

    // the scheduler runs on its own tasks
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}

async fn run_logged<U, K, F>(job: &ChronJob<U, K, F>)
where
    U: crate::management::UserStore,
    K: crate::spotify::auth::CredentialStore,
    F: crate::spotify::CatalogFactory,
{
    match job.run().await {
        Ok(summary) => tracing::info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "scheduled run finished"
        ),
        Err(e) => tracing::error!(error = %e, "scheduled run failed"),
    }
}

fn scheduler_error(e: tokio_cron_scheduler::JobSchedulerError) -> Error {
    Error::Scheduler(e.to_string())
}
