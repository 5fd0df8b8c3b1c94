use chrono::NaiveDate;

use crate::{config::Settings, error, radar::ChronJob, success, types::JobSummary, warning};

/// Runs the Release Radar job once and prints the summary.
///
/// `today` overrides the reference date of the recency window.
pub async fn run(settings: &Settings, today: Option<NaiveDate>, json: bool) {
    let job = match ChronJob::from_settings(settings).await {
        Ok(job) => job,
        Err(e) => error!("Cannot set up release radar job. Err: {}", e),
    };

    let result = match today {
        Some(today) => job.run_on(today).await,
        None => job.run().await,
    };

    match result {
        Ok(summary) => print_summary(&summary, json),
        Err(e) => error!("Release radar run failed. Err: {}", e),
    }
}

pub fn print_summary(summary: &JobSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(out) => println!("{}", out),
            Err(e) => error!("Cannot serialize summary. Err: {}", e),
        }
        return;
    }

    for email in &summary.succeeded {
        success!("{}", email);
    }
    for failure in &summary.failed {
        warning!("{}: {}", failure.email, failure.error);
    }

    if summary.succeeded.is_empty() && summary.failed.is_empty() {
        warning!("No active users found.");
    } else {
        success!(
            "Release radar updated for {} of {} users.",
            summary.succeeded.len(),
            summary.succeeded.len() + summary.failed.len()
        );
    }
}
