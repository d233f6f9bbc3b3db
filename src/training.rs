use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::api::TrainingApi;
use crate::error::{Error, Result};
use crate::models::{Iteration, TrainingStatus};
use crate::progress::Progress;

/// How often and how long to wait for a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(1),
            max_attempts: 900,
        }
    }
}

/// Start training and poll until the iteration leaves `Training`.
///
/// Each re-check happens only after `policy.interval`. Running out of
/// attempts while still training is an error; any other status ends the
/// loop and is returned as is.
#[instrument(skip(api, policy, progress))]
pub async fn train_and_wait<T>(
    api: &T,
    project_id: &str,
    policy: PollPolicy,
    progress: &dyn Progress,
) -> Result<Iteration>
where
    T: TrainingApi + ?Sized,
{
    let mut iteration = api.train_project(project_id).await?;
    info!(iteration_id = %iteration.id, status = %iteration.status, "training started");
    progress.training_status(&iteration.status);

    let mut attempts = 0;
    while iteration.status.is_in_progress() {
        if attempts >= policy.max_attempts {
            warn!(attempts, "giving up on training");
            return Err(Error::TrainingTimeout { attempts });
        }
        sleep(policy.interval).await;
        iteration = api.get_iteration(project_id, &iteration.id).await?;
        attempts += 1;
        debug!(attempts, status = %iteration.status, "polled training status");
        progress.training_status(&iteration.status);
    }

    progress.training_finished(&iteration.status);
    info!(iteration_id = %iteration.id, status = %iteration.status, attempts, "training ended");
    Ok(iteration)
}

/// Make a finished iteration the project's default. Only `Completed`
/// iterations are promoted; the update is sent once.
#[instrument(skip(api, iteration), fields(iteration_id = %iteration.id))]
pub async fn promote_iteration<T>(
    api: &T,
    project_id: &str,
    mut iteration: Iteration,
) -> Result<Iteration>
where
    T: TrainingApi + ?Sized,
{
    match &iteration.status {
        TrainingStatus::Completed => {}
        TrainingStatus::Failed => {
            return Err(Error::TrainingFailed {
                iteration_id: iteration.id,
            })
        }
        other => {
            return Err(Error::UnexpectedStatus {
                iteration_id: iteration.id.clone(),
                status: other.to_string(),
            })
        }
    }

    iteration.is_default = true;
    let updated = api.update_iteration(project_id, &iteration).await?;
    info!(is_default = updated.is_default, "iteration promoted to default");
    Ok(updated)
}
